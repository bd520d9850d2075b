use thiserror::Error;
use types::primitives::Slot;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("fork choice store is sealed and rejects writes (bound slot: {bound_slot:?})")]
    Sealed { bound_slot: Option<Slot> },
}
