use derive_more::{Display, From, Into};
use serde::{Deserialize, Serialize};

pub use ethereum_types::{H256, H64};

pub type ExecutionBlockHash = H256;
pub type ExecutionBlockNumber = u64;
pub type Gas = u64;
pub type Slot = u64;
pub type UnixSeconds = u64;
pub type ValidatorIndex = u64;

/// Opaque handle returned by the execution engine for a block-building job.
#[derive(
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Debug,
    Display,
    From,
    Into,
    Deserialize,
    Serialize,
)]
#[display("{_0:?}")]
#[serde(transparent)]
pub struct PayloadId(H64);

impl PayloadId {
    #[must_use]
    pub const fn new(bytes: [u8; 8]) -> Self {
        Self(H64(bytes))
    }

    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 8] {
        &self.0 .0
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

#[cfg(test)]
mod tests {
    use hex_literal::hex;

    use super::*;

    #[test]
    fn payload_id_is_displayed_as_prefixed_hex() {
        let payload_id = PayloadId::new(hex!("0102030405060708"));

        assert_eq!(payload_id.to_string(), "0x0102030405060708");
    }

    #[test]
    fn default_payload_id_is_zero() {
        assert!(PayloadId::default().is_zero());
        assert!(!PayloadId::new([1; 8]).is_zero());
    }

    #[test]
    fn payload_id_deserializes_from_engine_api_json() -> Result<(), serde_json::Error> {
        let payload_id = serde_json::from_str::<PayloadId>(r#""0xa247243752eb10b4""#)?;

        assert_eq!(payload_id, PayloadId::new(hex!("a247243752eb10b4")));

        Ok(())
    }
}
