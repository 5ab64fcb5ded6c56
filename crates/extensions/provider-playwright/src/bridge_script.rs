//! Embedded Node.js side of the bridge.

/// Script run by the bridge process. Speaks JSON lines on stdin/stdout.
pub(crate) const BRIDGE_SCRIPT: &str = include_str!("bridge_script.js");
