pub use crate::{
    monitor::{SyncMonitorConfig, SyncStatusMonitor, DEFAULT_SYNC_THRESHOLD},
    status::{ClStatus, ElStatus, SyncStatus},
};

mod monitor;
mod status;
