//! Session registry.
//!
//! Owns every live browser session. Step execution and asynchronous
//! page-close notifications both retire sessions through the same entry
//! point, so a session is never listed after its browser is gone and the
//! `session-closed` event fires exactly once per session.

mod entry;
mod registry;

pub use entry::{Session, SessionInfo, SessionRequest};
pub use registry::SessionRegistry;
