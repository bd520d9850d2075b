pub use crate::{
    coordinator::FinalizationCoordinator,
    engine::{EngineCaller, FinalizationError, FinalizationObserver},
    request::FinalizationRequest,
};

mod coordinator;
mod engine;
mod request;
