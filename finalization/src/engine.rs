use anyhow::{Error as AnyhowError, Result};
use async_trait::async_trait;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use types::{containers::BeaconBlockInfo, primitives::ExecutionBlockHash};

use crate::request::FinalizationRequest;

/// Client for the execution engine call that finalizes a block.
#[async_trait]
pub trait EngineCaller: Send + Sync + 'static {
    /// Implementations must return promptly once `token` is cancelled,
    /// preferably with [`FinalizationError::Cancelled`].
    async fn finalize_block(
        &self,
        token: &CancellationToken,
        beacon_block_info: &BeaconBlockInfo,
        block_hash: ExecutionBlockHash,
    ) -> Result<()>;
}

/// Receives errors that the coordinator does not propagate.
pub trait FinalizationObserver: Send + Sync {
    fn finalization_failed(&self, request: &FinalizationRequest, error: &AnyhowError);
}

#[derive(Debug, Error)]
pub enum FinalizationError {
    #[error("finalization of execution block {block_hash:?} was cancelled")]
    Cancelled { block_hash: ExecutionBlockHash },
}
