use strum::{AsRefStr, Display};

#[derive(Clone, Copy, PartialEq, Eq, Default, Debug, AsRefStr, Display)]
#[strum(serialize_all = "snake_case")]
pub enum ClStatus {
    Synced,
    #[default]
    NotSynced,
}

#[derive(Clone, Copy, PartialEq, Eq, Default, Debug, AsRefStr, Display)]
#[strum(serialize_all = "snake_case")]
pub enum ElStatus {
    Synced,
    NotSynced,
    #[default]
    Disconnected,
}

#[derive(Clone, Copy, PartialEq, Eq, Default, Debug)]
pub struct SyncStatus {
    pub cl_status: ClStatus,
    pub el_status: ElStatus,
    /// Consecutive positive consensus layer signals seen while not synced.
    pub cl_synced_signals: u64,
}

impl SyncStatus {
    #[must_use]
    pub const fn is_healthy(self) -> bool {
        matches!(self.cl_status, ClStatus::Synced) && matches!(self.el_status, ElStatus::Synced)
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test]
    fn initial_status_is_unhealthy() {
        let status = SyncStatus::default();

        assert_eq!(status.cl_status, ClStatus::NotSynced);
        assert_eq!(status.el_status, ElStatus::Disconnected);
        assert_eq!(status.cl_synced_signals, 0);
        assert!(!status.is_healthy());
    }

    #[test_case(ClStatus::Synced, ElStatus::Synced => true)]
    #[test_case(ClStatus::Synced, ElStatus::NotSynced => false)]
    #[test_case(ClStatus::Synced, ElStatus::Disconnected => false)]
    #[test_case(ClStatus::NotSynced, ElStatus::Synced => false)]
    fn healthy_only_when_both_layers_are_synced(cl_status: ClStatus, el_status: ElStatus) -> bool {
        SyncStatus {
            cl_status,
            el_status,
            cl_synced_signals: 0,
        }
        .is_healthy()
    }
}
