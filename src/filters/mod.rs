//! Filters Module
//!
//! Filter sets, their stable cache keys, and their composition into mission
//! requests.

pub mod filter_set;
pub mod geo;
mod request;

pub use filter_set::{FilterSet, FilterValue};
pub use request::{compose, MissionRequest, Predicate};
