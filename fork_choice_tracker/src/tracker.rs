use anyhow::Result;
use log::debug;
use types::primitives::{ExecutionBlockHash, H256};

use crate::store::{ForkChoiceState, ForkChoiceStore};

/// The node's view of execution chain finality.
///
/// There is no locking here. The tracker is a thin layer over its store and the finalization
/// coordinator is the only component expected to write finality through it.
///
/// Under single slot finality there is no separate justified state, so a block that is inserted
/// becomes both safe and finalized.
#[derive(Clone)]
pub struct ForkChoiceTracker<S> {
    store: S,
}

impl<S: ForkChoiceStore> ForkChoiceTracker<S> {
    #[must_use]
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Marks `hash` as both safe and finalized.
    ///
    /// If the store fails to write the finalized hash, the safe hash has already been updated.
    pub fn insert_node(&self, hash: ExecutionBlockHash) -> Result<()> {
        self.store.set_safe_execution_hash(hash)?;
        self.store.set_finalized_execution_hash(hash)?;

        debug!("execution block {hash:?} is now safe and finalized");

        Ok(())
    }

    #[must_use]
    pub fn head_beacon_block(&self) -> H256 {
        self.store.last_seen_beacon_block()
    }

    pub fn update_head_beacon_block(&self, block_root: H256) -> Result<()> {
        self.store.set_last_seen_beacon_block(block_root)
    }

    /// Returns the safe execution block hash.
    #[must_use]
    pub fn justified_checkpoint(&self) -> ExecutionBlockHash {
        self.store.safe_execution_hash()
    }

    #[must_use]
    pub fn finalized_checkpoint(&self) -> ExecutionBlockHash {
        self.store.finalized_execution_hash()
    }

    #[must_use]
    pub fn genesis_execution_hash(&self) -> ExecutionBlockHash {
        self.store.genesis_execution_hash()
    }

    pub fn set_genesis_execution_hash(&self, hash: ExecutionBlockHash) -> Result<()> {
        self.store.set_genesis_execution_hash(hash)
    }

    #[must_use]
    pub fn with_context(&self, context: S::Context) -> Self {
        Self::new(self.store.with_context(context))
    }

    #[must_use]
    pub fn state(&self) -> ForkChoiceState {
        ForkChoiceState {
            last_seen_beacon_block: self.head_beacon_block(),
            safe_execution_hash: self.justified_checkpoint(),
            finalized_execution_hash: self.finalized_checkpoint(),
            genesis_execution_hash: self.genesis_execution_hash(),
        }
    }
}
