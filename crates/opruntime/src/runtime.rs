use crate::{OperationRegistry, ThreadPoolExecutor};
use opcore::{
    EventBus, ExecutionEvent, Executor, FlowError, LocalExecutor, Outputs, Workflow, WorkflowSpec,
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Main runtime for executing workflows
pub struct FlowRuntime {
    registry: Arc<OperationRegistry>,
    executor: Arc<dyn Executor>,
    event_bus: Arc<EventBus>,
    config: RuntimeConfig,
}

impl FlowRuntime {
    /// Create a new runtime with default settings
    pub fn new() -> Self {
        Self::with_config(RuntimeConfig::default())
    }

    /// Create a new runtime with custom configuration
    pub fn with_config(config: RuntimeConfig) -> Self {
        Self::with_registry(Arc::new(OperationRegistry::new()), config)
    }

    /// Create a new runtime with a pre-configured registry
    pub fn with_registry(registry: Arc<OperationRegistry>, config: RuntimeConfig) -> Self {
        let executor = config.build_executor();
        let event_bus = Arc::new(EventBus::new(config.event_buffer_size));
        tracing::debug!(
            "Runtime using {} executor (max_parallel = {})",
            executor.name(),
            executor.max_parallel()
        );

        Self {
            registry,
            executor,
            event_bus,
            config,
        }
    }

    pub fn registry(&self) -> &Arc<OperationRegistry> {
        &self.registry
    }

    pub fn executor(&self) -> &Arc<dyn Executor> {
        &self.executor
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Rebuild a workflow from its wiring using the registry's functions
    pub fn load_workflow(&self, spec: WorkflowSpec) -> Result<Workflow, FlowError> {
        self.registry.load_workflow(spec)
    }

    /// Execute a workflow with the configured executor, publishing events
    pub async fn execute(&self, workflow: &mut Workflow) -> Result<Vec<Outputs>, FlowError> {
        Ok(workflow
            .execute_with_events(self.executor.as_ref(), &self.event_bus)
            .await?)
    }

    /// Subscribe to execution events
    pub fn subscribe_events(&self) -> tokio::sync::broadcast::Receiver<ExecutionEvent> {
        self.event_bus.subscribe()
    }

    pub fn event_bus(&self) -> &Arc<EventBus> {
        &self.event_bus
    }
}

impl Default for FlowRuntime {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutorKind {
    /// One operation at a time on the calling task.
    Local,
    /// Independent operations in parallel on the blocking pool.
    Threads,
}

#[derive(Debug, Error)]
#[error("Unknown executor \"{0}\" (expected \"local\" or \"threads\")")]
pub struct UnknownExecutor(pub String);

impl FromStr for ExecutorKind {
    type Err = UnknownExecutor;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" | "sync" => Ok(ExecutorKind::Local),
            "threads" | "parallel" => Ok(ExecutorKind::Threads),
            other => Err(UnknownExecutor(other.to_string())),
        }
    }
}

/// Configuration for the runtime
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    pub executor: ExecutorKind,
    pub max_parallel_nodes: usize,
    pub event_buffer_size: usize,
    /// Per-operation limit for the threaded executor.
    pub node_timeout_ms: Option<u64>,
}

impl RuntimeConfig {
    pub fn build_executor(&self) -> Arc<dyn Executor> {
        match self.executor {
            ExecutorKind::Local => Arc::new(LocalExecutor::new()),
            ExecutorKind::Threads => {
                let mut executor = ThreadPoolExecutor::new(self.max_parallel_nodes);
                if let Some(ms) = self.node_timeout_ms {
                    executor = executor.with_timeout(Duration::from_millis(ms));
                }
                Arc::new(executor)
            }
        }
    }
}

impl Default for RuntimeConfig {
    /// Defaults, overridable through `OPFLOW_*` environment variables
    fn default() -> Self {
        Self {
            executor: std::env::var("OPFLOW_EXECUTOR")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(ExecutorKind::Local),
            max_parallel_nodes: env_number("OPFLOW_MAX_PARALLEL").unwrap_or(10),
            event_buffer_size: env_number("OPFLOW_EVENT_BUFFER").unwrap_or(1000),
            node_timeout_ms: env_number("OPFLOW_NODE_TIMEOUT_MS"),
        }
    }
}

fn env_number<T: FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.parse().ok())
}
