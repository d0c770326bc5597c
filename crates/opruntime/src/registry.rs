use opcore::{
    FlowError, Function, OperationError, OperationPlugin, ReducedOperation, Workflow,
    WorkflowSpec,
};
use std::collections::HashMap;
use std::sync::Arc;

/// Registry of named functions that operations can be built from.
///
/// Functions are keyed by their own name, which is also the key a
/// [`ReducedOperation`] stores, so reduced operations and saved workflows
/// can be restored through the registry.
pub struct OperationRegistry {
    functions: HashMap<String, Arc<Function>>,
}

impl OperationRegistry {
    pub fn new() -> Self {
        Self {
            functions: HashMap::new(),
        }
    }

    /// Register a function; a later function with the same name replaces it.
    pub fn register(&mut self, function: Function) -> Result<(), OperationError> {
        let name = function
            .name()
            .ok_or_else(|| {
                OperationError::Anonymous(
                    function
                        .metadata()
                        .display_name
                        .clone()
                        .unwrap_or_default(),
                )
            })?
            .to_string();
        tracing::info!("Registering function: {}", name);
        self.functions.insert(name, Arc::new(function));
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Arc<Function>> {
        self.functions.get(name).cloned()
    }

    /// Build a fresh operation from a registered function.
    pub fn create(&self, name: &str) -> Result<OperationPlugin, OperationError> {
        let function = self
            .get(name)
            .ok_or_else(|| OperationError::UnknownFunction(name.to_string()))?;
        OperationPlugin::new(function)
    }

    pub fn restore(&self, reduced: ReducedOperation) -> Result<OperationPlugin, OperationError> {
        let function = self
            .get(&reduced.function)
            .ok_or_else(|| OperationError::UnknownFunction(reduced.function.clone()))?;
        OperationPlugin::restore(function, reduced)
    }

    pub fn load_workflow(&self, spec: WorkflowSpec) -> Result<Workflow, FlowError> {
        Workflow::from_spec(spec, |reduced| self.restore(reduced))
    }

    /// Registered function names, sorted.
    pub fn list_functions(&self) -> Vec<String> {
        let mut names: Vec<String> = self.functions.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

impl Default for OperationRegistry {
    fn default() -> Self {
        Self::new()
    }
}
