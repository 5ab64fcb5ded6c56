//! Error types for the AutoRPA protocol layer.

mod provider;
mod registry;
mod session;
mod step;

pub use provider::*;
pub use registry::*;
pub use session::*;
pub use step::*;
