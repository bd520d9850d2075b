use core::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{ensure, Result};
use parking_lot::RwLock;
use types::primitives::{ExecutionBlockHash, Slot, H256};

use crate::{
    error::StoreError,
    store::{ForkChoiceState, ForkChoiceStore},
};

/// [`ForkChoiceStore`] that keeps the state in memory.
///
/// Handles produced by [`Clone`] and [`ForkChoiceStore::with_context`] share the same state.
/// The context is the slot of the block the handle was bound to.
#[derive(Clone, Default)]
pub struct InMemoryForkChoiceStore {
    state: Arc<RwLock<ForkChoiceState>>,
    sealed: Arc<AtomicBool>,
    bound_slot: Option<Slot>,
}

impl InMemoryForkChoiceStore {
    #[must_use]
    pub fn new(genesis_execution_hash: ExecutionBlockHash) -> Self {
        let state = ForkChoiceState {
            genesis_execution_hash,
            ..ForkChoiceState::default()
        };

        Self {
            state: Arc::new(RwLock::new(state)),
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn bound_slot(&self) -> Option<Slot> {
        self.bound_slot
    }

    #[must_use]
    pub fn state(&self) -> ForkChoiceState {
        *self.state.read()
    }

    /// Makes every handle sharing this state reject further writes.
    pub fn seal(&self) {
        self.sealed.store(true, Ordering::SeqCst);
    }

    fn update(&self, update: impl FnOnce(&mut ForkChoiceState)) -> Result<()> {
        ensure!(
            !self.sealed.load(Ordering::SeqCst),
            StoreError::Sealed {
                bound_slot: self.bound_slot,
            },
        );

        update(&mut self.state.write());

        Ok(())
    }
}

impl ForkChoiceStore for InMemoryForkChoiceStore {
    type Context = Slot;

    fn set_safe_execution_hash(&self, hash: ExecutionBlockHash) -> Result<()> {
        self.update(|state| state.safe_execution_hash = hash)
    }

    fn safe_execution_hash(&self) -> ExecutionBlockHash {
        self.state.read().safe_execution_hash
    }

    fn set_finalized_execution_hash(&self, hash: ExecutionBlockHash) -> Result<()> {
        self.update(|state| state.finalized_execution_hash = hash)
    }

    fn finalized_execution_hash(&self) -> ExecutionBlockHash {
        self.state.read().finalized_execution_hash
    }

    fn set_last_seen_beacon_block(&self, block_root: H256) -> Result<()> {
        self.update(|state| state.last_seen_beacon_block = block_root)
    }

    fn last_seen_beacon_block(&self) -> H256 {
        self.state.read().last_seen_beacon_block
    }

    fn set_genesis_execution_hash(&self, hash: ExecutionBlockHash) -> Result<()> {
        self.update(|state| state.genesis_execution_hash = hash)
    }

    fn genesis_execution_hash(&self) -> ExecutionBlockHash {
        self.state.read().genesis_execution_hash
    }

    fn with_context(&self, context: Self::Context) -> Self {
        Self {
            bound_slot: Some(context),
            ..self.clone()
        }
    }
}
