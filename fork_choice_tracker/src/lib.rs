pub use crate::{
    error::StoreError,
    in_memory_store::InMemoryForkChoiceStore,
    store::{ForkChoiceState, ForkChoiceStore},
    tracker::ForkChoiceTracker,
};

mod error;
mod in_memory_store;
mod store;
mod tracker;
