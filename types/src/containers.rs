use serde::{Deserialize, Serialize};

use crate::primitives::{
    ExecutionBlockHash, ExecutionBlockNumber, Gas, Slot, UnixSeconds, ValidatorIndex, H256,
};

/// Execution block header as returned by `eth_getBlockByNumber` and `eth_getBlockByHash`.
///
/// Only the fields the consensus side looks at are kept.
#[derive(Clone, PartialEq, Eq, Default, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionHeader {
    pub hash: ExecutionBlockHash,
    pub parent_hash: ExecutionBlockHash,
    pub number: ExecutionBlockNumber,
    pub timestamp: UnixSeconds,
    pub state_root: H256,
    pub gas_limit: Gas,
    pub gas_used: Gas,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_fee_per_gas: Option<u64>,
}

/// Header of the beacon block whose execution payload is being finalized.
///
/// It is not interpreted here and is only passed through to the execution engine caller.
#[derive(Clone, Copy, PartialEq, Eq, Default, Debug, Deserialize, Serialize)]
pub struct BeaconBlockInfo {
    pub slot: Slot,
    pub proposer_index: ValidatorIndex,
    pub parent_root: H256,
    pub state_root: H256,
    pub body_root: H256,
    pub block_root: H256,
}
