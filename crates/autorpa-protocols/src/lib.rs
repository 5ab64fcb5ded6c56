//! # AutoRPA Protocols
//!
//! Core protocol definitions for the AutoRPA workflow engine.
//! Contains interface definitions and plain data types only.
//!
//! ## Core Traits
//!
//! - [`CapabilityProvider`] - Session-oriented browser automation backend
//! - [`LogSink`] - Per-step execution log consumer
//!
//! ## Core Types
//!
//! - [`StepTypeDefinition`] - Catalog entry describing an executable step type
//! - [`StepInstance`] - Parameter-bound step placed in a workflow graph
//! - [`ExecutionResult`] - Structured outcome of running one step

pub mod capability;
pub mod error;
pub mod log;
pub mod step;

pub use capability::{
    BoundingBox, BrowserHandle, CapabilityProvider, ClickOptions, ContextHandle, ContextOptions,
    ElementHandle, EngineKind, EngineSelection, ExtractKind, GotoOptions, LaunchOptions,
    PageClosedCallback, PageHandle, Viewport, WaitUntil, WindowState,
};
pub use error::{ProviderError, RegistryError, SessionError, StepError};
pub use log::{LogEntry, LogLevel, LogSink, MemoryLogSink, TracingLogSink};
pub use step::{
    ExecutionResult, ParamDescriptor, ParamKind, ParamValues, Position, SideEffects,
    StepCategory, StepInstance, StepTypeDefinition, ValidationResult,
};
