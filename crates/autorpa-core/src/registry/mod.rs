//! Registries for step types and shared base storage.

mod base;
mod step_types;

pub use base::{BaseRegistry, Registerable};
pub use step_types::StepTypeRegistry;
