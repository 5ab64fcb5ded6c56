//! # AutoRPA Runtime
//!
//! Step execution and workflow runs for the AutoRPA engine.
//!
//! - [`Engine`] - Host-facing facade: run steps and workflows, manage sessions
//! - [`StepExecutor`] - Validates, resolves and runs one step
//! - [`WorkflowRunner`] - Runs a workflow graph with cancellation
//! - [`Step`] - One variant per executable step type

pub mod backend;
pub mod context;
pub mod engine;
pub mod executor;
pub mod retry;
pub mod runner;
pub mod settings;
pub mod steps;
pub mod variables;

pub use backend::{Backend, BackendError, build_provider};
pub use context::ExecutionContext;
pub use engine::{Engine, EngineError, SessionClosed, SessionCreated};
pub use executor::StepExecutor;
pub use retry::RetryPolicy;
pub use runner::{RunError, RunReport, RunState, StepReport, WorkflowRunner};
pub use settings::ExecutorSettings;
pub use steps::{Executable, Step};
pub use variables::Variables;
