//! Capability provider protocol.
//!
//! The executor never talks to a browser directly. It goes through a
//! [`CapabilityProvider`], a session-oriented interface covering launch,
//! navigation, DOM queries and input. A live implementation drives Playwright;
//! a mock implementation returns canned results for headless testing.

mod traits;
mod types;

pub use traits::*;
pub use types::*;
