//! Dependency-ordered execution of a [`Workflow`].

use crate::{
    EventBus, ExecutionError, ExecutionEvent, ExecutionId, Executor, NodeId, OperationPlugin,
    Outputs, Value, Workflow,
};
use chrono::Utc;
use futures::stream::{FuturesUnordered, StreamExt};
use std::collections::{HashMap, HashSet};
use std::time::Instant;

impl Workflow {
    /// Run every enabled operation in dependency order and return the
    /// outputs of the terminal operations, in registration order.
    pub async fn execute(&mut self, executor: &dyn Executor) -> Result<Vec<Outputs>, ExecutionError> {
        self.run(executor, None).await
    }

    /// Same as [`execute`](Self::execute), publishing progress on `events`.
    pub async fn execute_with_events(
        &mut self,
        executor: &dyn Executor,
        events: &EventBus,
    ) -> Result<Vec<Outputs>, ExecutionError> {
        self.run(executor, Some(events)).await
    }

    /// Blocking entry point for callers outside an async context.
    ///
    /// Fails with [`ExecutionError::InsideRuntime`] when called from a tokio
    /// runtime; use [`execute`](Self::execute) there.
    pub fn execute_synchronous(
        &mut self,
        executor: &dyn Executor,
    ) -> Result<Vec<Outputs>, ExecutionError> {
        if tokio::runtime::Handle::try_current().is_ok() {
            return Err(ExecutionError::InsideRuntime);
        }
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        runtime.block_on(self.execute(executor))
    }

    async fn run(
        &mut self,
        executor: &dyn Executor,
        events: Option<&EventBus>,
    ) -> Result<Vec<Outputs>, ExecutionError> {
        let execution_id = ExecutionId::new_v4();
        let start_time = Instant::now();
        self.last_results.clear();

        emit(events, || ExecutionEvent::WorkflowStarted {
            execution_id,
            workflow: self.name.clone(),
            timestamp: Utc::now(),
        });
        tracing::info!(
            "Starting workflow \"{}\" with {} executor",
            self.name,
            executor.name()
        );

        let result = self.execute_dag(executor, events, execution_id).await;

        let duration_ms = start_time.elapsed().as_millis() as u64;
        let success = result.is_ok();
        emit(events, || ExecutionEvent::WorkflowCompleted {
            execution_id,
            success,
            duration_ms,
            timestamp: Utc::now(),
        });
        if success {
            tracing::info!("Workflow \"{}\" completed in {}ms", self.name, duration_ms);
        }

        result
    }

    async fn execute_dag(
        &mut self,
        executor: &dyn Executor,
        events: Option<&EventBus>,
        execution_id: ExecutionId,
    ) -> Result<Vec<Outputs>, ExecutionError> {
        // Nothing runs if the graph has a cycle.
        self.validate()?;

        for operation in self.operations().iter().filter(|op| op.is_disabled()) {
            tracing::debug!("Skipping disabled operation \"{}\"", operation.name());
            emit(events, || ExecutionEvent::OperationSkipped {
                execution_id,
                node_id: operation.id(),
                operation: operation.name().to_string(),
                timestamp: Utc::now(),
            });
        }

        let max_parallel = executor.max_parallel().max(1);
        let mut completed: HashSet<NodeId> = HashSet::new();
        let mut dispatched: HashSet<NodeId> = HashSet::new();
        let mut running = FuturesUnordered::new();
        // First error seen. Once set, nothing new is dispatched and the calls
        // already in flight are drained so their results are still recorded.
        let mut failure: Option<ExecutionError> = None;

        loop {
            let ready: Vec<OperationPlugin> = if failure.is_none() {
                self.ready_nodes(&completed)
                    .into_iter()
                    .filter(|id| !dispatched.contains(id))
                    .filter_map(|id| self.operation(id).cloned())
                    .collect()
            } else {
                Vec::new()
            };

            for operation in ready {
                if running.len() >= max_parallel {
                    break;
                }
                let node_id = operation.id();
                let kwargs = match self.collect_inputs(&operation) {
                    Ok(kwargs) => kwargs,
                    Err(e) => {
                        emit(events, || ExecutionEvent::OperationFailed {
                            execution_id,
                            node_id,
                            error: e.to_string(),
                            timestamp: Utc::now(),
                        });
                        failure = Some(e);
                        break;
                    }
                };

                emit(events, || ExecutionEvent::OperationStarted {
                    execution_id,
                    node_id,
                    operation: operation.name().to_string(),
                    timestamp: Utc::now(),
                });
                tracing::debug!("Dispatching operation \"{}\"", operation.name());

                dispatched.insert(node_id);
                running.push(async move {
                    let start = Instant::now();
                    let result = executor.call(operation.clone(), kwargs).await;
                    let duration_ms = start.elapsed().as_millis() as u64;
                    (operation, result, duration_ms)
                });
            }

            // Nothing running and nothing dispatchable: done.
            let Some((operation, result, duration_ms)) = running.next().await else {
                break;
            };
            let node_id = operation.id();

            match result {
                Ok(returns) => {
                    let outputs = operation.name_outputs(returns);
                    tracing::info!(
                        "Operation \"{}\" completed in {}ms",
                        operation.name(),
                        duration_ms
                    );
                    emit(events, || ExecutionEvent::OperationCompleted {
                        execution_id,
                        node_id,
                        outputs: outputs.clone(),
                        duration_ms,
                        timestamp: Utc::now(),
                    });
                    self.last_results.insert(node_id, outputs);
                    completed.insert(node_id);
                }
                Err(source) => {
                    tracing::error!("Operation \"{}\" failed: {}", operation.name(), source);
                    emit(events, || ExecutionEvent::OperationFailed {
                        execution_id,
                        node_id,
                        error: source.to_string(),
                        timestamp: Utc::now(),
                    });
                    if failure.is_none() {
                        failure = Some(ExecutionError::Operation {
                            node: node_id,
                            operation: operation.name().to_string(),
                            source,
                        });
                    }
                }
            }
        }

        if let Some(e) = failure {
            return Err(e);
        }

        Ok(self
            .terminal_nodes()
            .into_iter()
            .map(|id| self.last_results.get(&id).cloned().unwrap_or_default())
            .collect())
    }

    /// Resolve the keyword inputs for `operation`.
    ///
    /// A linked input takes the producer's output when the producer ran and
    /// produced it; otherwise the operation's filled value or signature
    /// default is used when `OperationPlugin::call` binds arguments.
    fn collect_inputs(
        &self,
        operation: &OperationPlugin,
    ) -> Result<HashMap<String, Value>, ExecutionError> {
        let mut inputs = HashMap::new();

        for input in operation.input_names() {
            let linked = self.incoming(operation.id(), input).and_then(|link| {
                self.last_results
                    .get(&link.source)?
                    .get(&link.source_output)
            });

            match linked {
                Some(value) => {
                    inputs.insert(input.clone(), value.clone());
                }
                None if operation.has_fallback(input) => {}
                None => {
                    tracing::error!(
                        "Operation \"{}\" has no value for input \"{}\"",
                        operation.name(),
                        input
                    );
                    return Err(ExecutionError::MissingInput {
                        node: operation.id(),
                        operation: operation.name().to_string(),
                        input: input.clone(),
                    });
                }
            }
        }

        Ok(inputs)
    }
}

fn emit(events: Option<&EventBus>, event: impl FnOnce() -> ExecutionEvent) {
    if let Some(bus) = events {
        bus.emit(event());
    }
}
