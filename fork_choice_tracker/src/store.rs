use anyhow::Result;
use serde::{Deserialize, Serialize};
use types::primitives::{ExecutionBlockHash, H256};

#[derive(Clone, Copy, PartialEq, Eq, Default, Debug, Deserialize, Serialize)]
pub struct ForkChoiceState {
    pub last_seen_beacon_block: H256,
    pub safe_execution_hash: ExecutionBlockHash,
    pub finalized_execution_hash: ExecutionBlockHash,
    pub genesis_execution_hash: ExecutionBlockHash,
}

/// Durable storage behind [`ForkChoiceTracker`](crate::ForkChoiceTracker).
///
/// Implementations are cheap handles to shared storage.
/// Getters cannot fail. Errors from reads are the implementation's problem.
pub trait ForkChoiceStore: Clone + Send + Sync + 'static {
    /// Request-scoped data a handle can be bound to, such as the block being processed.
    type Context;

    fn set_safe_execution_hash(&self, hash: ExecutionBlockHash) -> Result<()>;

    fn safe_execution_hash(&self) -> ExecutionBlockHash;

    fn set_finalized_execution_hash(&self, hash: ExecutionBlockHash) -> Result<()>;

    fn finalized_execution_hash(&self) -> ExecutionBlockHash;

    fn set_last_seen_beacon_block(&self, block_root: H256) -> Result<()>;

    fn last_seen_beacon_block(&self) -> H256;

    fn set_genesis_execution_hash(&self, hash: ExecutionBlockHash) -> Result<()>;

    fn genesis_execution_hash(&self) -> ExecutionBlockHash;

    #[must_use]
    fn with_context(&self, context: Self::Context) -> Self;
}
