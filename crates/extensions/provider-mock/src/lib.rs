//! # AutoRPA Mock Provider
//!
//! A [`CapabilityProvider`](autorpa_protocols::CapabilityProvider) that
//! never leaves the process. Every call returns canned data and is recorded,
//! so workflow logic can be tested headless and deterministically.
//!
//! Behavior is scripted up front with the `with_*` builders:
//!
//! ```
//! use autorpa_provider_mock::MockProvider;
//!
//! let provider = MockProvider::new()
//!     .with_text("h1", "Welcome")
//!     .with_selector_available_after("#late", 3);
//! ```

mod element;
mod provider;
mod state;

pub use element::MockElement;
pub use provider::MockProvider;
pub use state::MockCall;
