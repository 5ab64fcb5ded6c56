//! Step protocol definitions.
//!
//! A step type is a declarative catalog entry; a step instance binds concrete
//! parameter values to one of those types.

mod definition;
mod instance;
mod result;

pub use definition::*;
pub use instance::*;
pub use result::*;
