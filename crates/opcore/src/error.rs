use crate::NodeId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FlowError {
    #[error("Operation error: {0}")]
    Operation(#[from] OperationError),

    #[error("Link error: {0}")]
    Link(#[from] LinkError),

    #[error("Execution error: {0}")]
    Execution(#[from] ExecutionError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Construction-time consistency failure for an operation.
///
/// Every offending entry found during a single validation pass is collected
/// into `problems`, so one error reports all of them.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Validation failed for operation \"{operation}\": {}", problems.join("; "))]
pub struct ValidationError {
    pub operation: String,
    pub problems: Vec<String>,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum OperationError {
    #[error("The provided operation is unnamed")]
    Unnamed,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Operation \"{operation}\" is missing required input \"{input}\"")]
    MissingArgument { operation: String, input: String },

    #[error("Operation \"{operation}\" got an unexpected input \"{input}\"")]
    UnexpectedArgument { operation: String, input: String },

    #[error("Invalid input type for '{field}': expected {expected}, got {actual}")]
    InvalidArgumentType {
        field: String,
        expected: String,
        actual: String,
    },

    #[error("Input \"{input}\" of operation \"{operation}\" is fixed")]
    FixedInput { operation: String, input: String },

    #[error("Operation \"{0}\" wraps an anonymous function and cannot be reduced")]
    Anonymous(String),

    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    #[error("Execution failed: {0}")]
    ExecutionFailed(String),

    #[error("Timeout after {millis}ms")]
    Timeout { millis: u64 },

    #[error("Cancelled")]
    Cancelled,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LinkError {
    #[error("Operation {0} is already part of the workflow")]
    DuplicateOperation(NodeId),

    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("Operation \"{operation}\" has no output named \"{output}\"")]
    UnknownOutput { operation: String, output: String },

    #[error("Operation \"{operation}\" has no input named \"{input}\"")]
    UnknownInput { operation: String, input: String },

    #[error("Input \"{input}\" of operation \"{operation}\" already has an incoming link")]
    InputAlreadyLinked { operation: String, input: String },

    #[error("Node index {index} is out of range ({len} nodes)")]
    InvalidIndex { index: usize, len: usize },
}

#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("Cyclic dependency detected between: {}", nodes.join(", "))]
    Cycle { nodes: Vec<String> },

    #[error("Operation \"{operation}\" ({node}) has no value for input \"{input}\"")]
    MissingInput {
        node: NodeId,
        operation: String,
        input: String,
    },

    #[error("Operation \"{operation}\" ({node}) failed: {source}")]
    Operation {
        node: NodeId,
        operation: String,
        #[source]
        source: OperationError,
    },

    #[error("Synchronous execution was requested from inside an async runtime; use execute instead")]
    InsideRuntime,

    #[error("Could not start runtime: {0}")]
    Runtime(#[from] std::io::Error),
}
