//! Product catalog module.
//!
//! Contains the category spec schema that drives category-specific filter
//! controls.

mod specs;

pub use specs::{CategorySpec, CategorySpecs, SpecField, SpecFieldKind};
