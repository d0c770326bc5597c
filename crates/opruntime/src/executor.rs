use async_trait::async_trait;
use opcore::{Executor, OperationError, OperationPlugin, Returns, Value};
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

/// Runs operations on tokio's blocking thread pool.
///
/// The workflow hands out up to `max_parallel` independent operations at a
/// time; each one runs on its own blocking thread. Cancellation and the
/// optional per-call timeout are handled here, not by the workflow.
#[derive(Debug, Clone)]
pub struct ThreadPoolExecutor {
    max_parallel: usize,
    call_timeout: Option<Duration>,
    cancellation: CancellationToken,
}

impl ThreadPoolExecutor {
    pub fn new(max_parallel: usize) -> Self {
        Self {
            max_parallel: max_parallel.max(1),
            call_timeout: None,
            cancellation: CancellationToken::new(),
        }
    }

    pub fn with_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = Some(call_timeout);
        self
    }

    /// Token that cancels every pending and future call of this executor.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation.clone()
    }

    pub fn cancel(&self) {
        self.cancellation.cancel();
    }

    async fn run_blocking(
        operation: OperationPlugin,
        kwargs: HashMap<String, Value>,
    ) -> Result<Returns, OperationError> {
        let task = tokio::task::spawn_blocking(move || operation.call(kwargs));
        match task.await {
            Ok(result) => result,
            Err(e) => Err(OperationError::ExecutionFailed(format!("Task join error: {}", e))),
        }
    }
}

impl Default for ThreadPoolExecutor {
    fn default() -> Self {
        Self::new(10)
    }
}

#[async_trait]
impl Executor for ThreadPoolExecutor {
    fn name(&self) -> &str {
        "threads"
    }

    fn max_parallel(&self) -> usize {
        self.max_parallel
    }

    async fn call(
        &self,
        operation: OperationPlugin,
        kwargs: HashMap<String, Value>,
    ) -> Result<Returns, OperationError> {
        if self.cancellation.is_cancelled() {
            return Err(OperationError::Cancelled);
        }

        let name = operation.name().to_string();
        let task = Self::run_blocking(operation, kwargs);

        let bounded = async {
            match self.call_timeout {
                Some(limit) => match timeout(limit, task).await {
                    Ok(result) => result,
                    Err(_) => {
                        tracing::warn!("Operation \"{}\" timed out after {:?}", name, limit);
                        Err(OperationError::Timeout {
                            millis: limit.as_millis() as u64,
                        })
                    }
                },
                None => task.await,
            }
        };

        tokio::select! {
            _ = self.cancellation.cancelled() => {
                tracing::warn!("Operation \"{}\" cancelled", name);
                Err(OperationError::Cancelled)
            }
            result = bounded => result,
        }
    }
}
