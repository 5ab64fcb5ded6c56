//! Live browser automation for AutoRPA.
//!
//! Implements [`CapabilityProvider`](autorpa_protocols::CapabilityProvider)
//! on top of Playwright, running in a Node.js child process.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐   JSON lines   ┌──────────────────┐
//! │  Rust Backend   │ ◄────────────► │ Node.js Bridge   │
//! │  (this crate)   │  stdin/stdout  │ (playwright)     │
//! └─────────────────┘                └──────────────────┘
//!                                           │
//!                                    ┌──────────────────┐
//!                                    │     Browser      │
//!                                    └──────────────────┘
//! ```
//!
//! ## Setup
//!
//! Node.js >= 18 on `PATH` (or `playwright.node_path`) and a Playwright
//! install the script can `require`:
//!
//! ```bash
//! npm install -g playwright
//! npx playwright install
//! ```
//!
//! The bridge is started lazily by the first browser operation and restarted
//! if it exits.

mod bridge;
mod bridge_script;
mod error;
mod external;
mod provider;

pub use bridge::{BridgeEvent, EventHandler, PlaywrightBridge, PlaywrightBridgeConfig};
pub use error::{PlaywrightError, RemoteErrorKind};
pub use external::open_with_default_handler;
pub use provider::PlaywrightProvider;
