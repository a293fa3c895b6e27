//! Module containing all algorithms implementations for WebGraph

pub mod hits;

/// Traits used to interact with the implemented algorithms.
pub mod traits {
    use super::*;

    pub use hits::{Emitter, Partitioner};
}
