pub mod containers;
pub mod events;
pub mod primitives;
