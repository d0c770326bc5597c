//! Workflow execution runtime
//!
//! This crate provides the parallel executor, the function registry used to
//! restore saved workflows, and a runtime facade tying them to an event bus.

mod executor;
mod registry;
mod runtime;

pub use executor::ThreadPoolExecutor;
pub use registry::OperationRegistry;
pub use runtime::{ExecutorKind, FlowRuntime, RuntimeConfig, UnknownExecutor};
