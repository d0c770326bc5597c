use crate::{OperationError, OperationPlugin, Returns, Value};
use async_trait::async_trait;
use std::collections::HashMap;

/// Strategy for running a single operation.
///
/// The workflow decides what runs and in which order; an executor only
/// performs the leaf call with inputs that are already resolved. Every
/// implementation must return exactly what `OperationPlugin::call` would.
#[async_trait]
pub trait Executor: Send + Sync {
    /// Short identifier used in logs (e.g. "local", "threads").
    fn name(&self) -> &str;

    /// How many independent operations the workflow may hand out at once.
    fn max_parallel(&self) -> usize {
        1
    }

    async fn call(
        &self,
        operation: OperationPlugin,
        kwargs: HashMap<String, Value>,
    ) -> Result<Returns, OperationError>;
}

/// Runs each operation inline on the caller's task, one at a time.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalExecutor;

impl LocalExecutor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Executor for LocalExecutor {
    fn name(&self) -> &str {
        "local"
    }

    async fn call(
        &self,
        operation: OperationPlugin,
        kwargs: HashMap<String, Value>,
    ) -> Result<Returns, OperationError> {
        operation.call(kwargs)
    }
}
