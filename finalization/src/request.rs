use derive_more::Constructor;
use types::{containers::BeaconBlockInfo, primitives::ExecutionBlockHash};

#[derive(Clone, Copy, PartialEq, Eq, Debug, Constructor)]
pub struct FinalizationRequest {
    pub block_hash: ExecutionBlockHash,
    pub beacon_block_info: BeaconBlockInfo,
}
