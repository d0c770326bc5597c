//! Core abstractions for operation plugins and workflows
//!
//! Functions are wrapped into validated [`OperationPlugin`]s, wired into a
//! [`Workflow`] by named outputs and inputs, and executed through a pluggable
//! [`Executor`].

mod error;
mod events;
mod executor;
mod function;
mod hints;
pub mod metadata;
mod operation;
mod presentation;
mod resource;
mod schedule;
mod signature;
mod value;
mod workflow;

pub use error::{ExecutionError, FlowError, LinkError, OperationError, ValidationError};
pub use events::{EventBus, ExecutionEvent, ExecutionId};
pub use executor::{Executor, LocalExecutor};
pub use function::{Function, Returns};
pub use hints::PlotHint;
pub use metadata::{Annotation, OperationMetadata, Opts};
pub use operation::{NodeId, OperationOverrides, OperationPlugin, Outputs, ReducedOperation};
pub use presentation::{ParameterRecord, PresentableTypes};
pub use resource::{DataResource, DataResourceModel, ListResource, ResourceFlags};
pub use signature::{Arguments, Parameter, Signature, ValueType};
pub use value::Value;
pub use workflow::{Link, LinkSpec, NodeEntry, Workflow, WorkflowSpec};

/// Result type for flow operations
pub type Result<T> = std::result::Result<T, FlowError>;
