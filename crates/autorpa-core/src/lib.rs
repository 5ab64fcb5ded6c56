//! # AutoRPA Core
//!
//! Catalog, construction and session bookkeeping for the AutoRPA workflow
//! engine.
//!
//! ## Components
//!
//! - [`StepTypeRegistry`] - Authoritative catalog of step types
//! - [`NodeFactory`] - Builds validated step instances and editor nodes
//! - [`SessionRegistry`] - Live browser sessions, reuse and auto-close
//! - [`Workflow`] - Node graph documents and their execution order

pub mod catalog;
pub mod events;
pub mod factory;
pub mod registry;
pub mod session;
pub mod workflow;

pub use events::{CloseReason, SessionEvent};
pub use factory::{EditorNode, EditorNodeData, EditorNodeOptions, EditorParam, NodeFactory};
pub use registry::{BaseRegistry, Registerable, StepTypeRegistry};
pub use session::{Session, SessionInfo, SessionRequest, SessionRegistry};
pub use workflow::{Edge, Workflow, WorkflowError};
