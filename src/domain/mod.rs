//! Domain layer types and invariants.

pub mod error;
pub mod geo;
pub mod places;
pub mod weather;
