use crate::{
    Function, OperationError, Opts, PlotHint, Returns, ValidationError, Value, ValueType,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

pub type NodeId = Uuid;

/// Named outputs of a single operation run.
pub type Outputs = HashMap<String, Value>;

/// Explicit constructor overrides.
///
/// A field left as `None` falls back to whatever the function's annotations
/// attached, then to an empty default. A `Some` always wins, even when empty.
#[derive(Debug, Clone, Default)]
pub struct OperationOverrides {
    pub filled_values: Option<HashMap<String, Value>>,
    pub input_names: Option<Vec<String>>,
    pub output_names: Option<Vec<String>>,
    pub output_shape: Option<HashMap<String, Vec<usize>>>,
    pub limits: Option<HashMap<String, Vec<Value>>>,
    pub units: Option<HashMap<String, String>>,
    pub fixed: Option<HashMap<String, bool>>,
    pub fixable: Option<HashMap<String, bool>>,
    pub visible: Option<HashMap<String, bool>>,
    pub opts: Option<HashMap<String, Opts>>,
}

impl OperationOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_filled_value(mut self, input: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filled_values
            .get_or_insert_with(HashMap::new)
            .insert(input.into(), value.into());
        self
    }

    pub fn with_input_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.input_names = Some(names.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_output_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.output_names = Some(names.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_limits<I, V>(mut self, input: impl Into<String>, limits: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.limits
            .get_or_insert_with(HashMap::new)
            .insert(input.into(), limits.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_units(mut self, input: impl Into<String>, unit: impl Into<String>) -> Self {
        self.units
            .get_or_insert_with(HashMap::new)
            .insert(input.into(), unit.into());
        self
    }

    pub fn with_fixed(mut self, input: impl Into<String>, fixed: bool) -> Self {
        self.fixed
            .get_or_insert_with(HashMap::new)
            .insert(input.into(), fixed);
        self
    }

    pub fn with_visible(mut self, input: impl Into<String>, visible: bool) -> Self {
        self.visible
            .get_or_insert_with(HashMap::new)
            .insert(input.into(), visible);
        self
    }

    pub fn with_fixable(mut self, input: impl Into<String>, fixable: bool) -> Self {
        self.fixable
            .get_or_insert_with(HashMap::new)
            .insert(input.into(), fixable);
        self
    }

    /// Replaces the whole options record for `input`.
    pub fn with_opts<I, K, V>(mut self, input: impl Into<String>, options: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<serde_json::Value>,
    {
        let options: Opts = options
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self.opts
            .get_or_insert_with(HashMap::new)
            .insert(input.into(), options);
        self
    }

    pub fn with_output_shape(
        mut self,
        output: impl Into<String>,
        shape: impl IntoIterator<Item = usize>,
    ) -> Self {
        self.output_shape
            .get_or_insert_with(HashMap::new)
            .insert(output.into(), shape.into_iter().collect());
        self
    }
}

/// Minimal state needed to rebuild an equivalent operation.
///
/// Only the function reference, the filled values and the output names
/// survive. Everything else is re-derived from the function's annotations
/// on restore, so explicit constructor overrides other than these are lost.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReducedOperation {
    pub function: String,
    #[serde(default)]
    pub filled_values: HashMap<String, Value>,
    #[serde(default)]
    pub output_names: Vec<String>,
}

/// A validated, introspectable wrapper around a [`Function`]; one graph node.
#[derive(Debug, Clone)]
pub struct OperationPlugin {
    id: NodeId,
    function: Arc<Function>,
    name: String,
    input_names: Vec<String>,
    output_names: Vec<String>,
    output_shape: HashMap<String, Vec<usize>>,
    filled_values: HashMap<String, Value>,
    limits: HashMap<String, Vec<Value>>,
    units: HashMap<String, String>,
    fixed: HashMap<String, bool>,
    fixable: HashMap<String, bool>,
    visible: HashMap<String, bool>,
    opts: HashMap<String, Opts>,
    hints: Vec<PlotHint>,
    disabled: bool,
}

impl OperationPlugin {
    pub fn new(function: impl Into<Arc<Function>>) -> Result<Self, OperationError> {
        Self::with_overrides(function, OperationOverrides::default())
    }

    pub fn with_overrides(
        function: impl Into<Arc<Function>>,
        overrides: OperationOverrides,
    ) -> Result<Self, OperationError> {
        let function = function.into();
        let metadata = function.metadata().clone();

        let name = metadata
            .display_name
            .or_else(|| function.name().map(str::to_string))
            .filter(|name| !name.is_empty())
            .ok_or(OperationError::Unnamed)?;

        let input_names = overrides
            .input_names
            .or(metadata.input_names)
            .unwrap_or_else(|| function.signature().parameter_names());

        let operation = Self {
            id: Uuid::new_v4(),
            name,
            input_names,
            output_names: overrides
                .output_names
                .or(metadata.output_names)
                .unwrap_or_default(),
            output_shape: overrides.output_shape.unwrap_or(metadata.output_shape),
            filled_values: overrides.filled_values.unwrap_or_default(),
            limits: overrides.limits.unwrap_or(metadata.limits),
            units: overrides.units.unwrap_or(metadata.units),
            fixed: overrides.fixed.unwrap_or(metadata.fixed),
            fixable: overrides.fixable.unwrap_or(metadata.fixable),
            visible: overrides.visible.unwrap_or(metadata.visible),
            opts: overrides.opts.unwrap_or(metadata.opts),
            hints: metadata.hints,
            disabled: false,
            function,
        };

        operation.validate()?;
        Ok(operation)
    }

    /// Rebuild an operation from its reduced form.
    pub fn restore(
        function: impl Into<Arc<Function>>,
        reduced: ReducedOperation,
    ) -> Result<Self, OperationError> {
        let function = function.into();
        if function.name() != Some(reduced.function.as_str()) {
            return Err(OperationError::UnknownFunction(reduced.function));
        }

        let overrides = OperationOverrides {
            filled_values: Some(reduced.filled_values),
            output_names: Some(reduced.output_names),
            ..OperationOverrides::default()
        };
        Self::with_overrides(function, overrides)
    }

    pub fn reduce(&self) -> Result<ReducedOperation, OperationError> {
        let function = self
            .function
            .name()
            .ok_or_else(|| OperationError::Anonymous(self.name.clone()))?;

        Ok(ReducedOperation {
            function: function.to_string(),
            filled_values: self.filled_values.clone(),
            output_names: self.output_names.clone(),
        })
    }

    fn validate(&self) -> Result<(), ValidationError> {
        let mut problems = Vec::new();

        let num_names = self.input_names.len();
        let num_args = self.function.signature().arity();
        if num_names != num_args {
            problems.push(format!(
                "number of input_names given ({}) must match number of inputs for the operation ({})",
                num_names, num_args
            ));
        }

        for (index, name) in self.input_names.iter().enumerate() {
            if self.input_names[..index].contains(name) {
                problems.push(format!("input name \"{}\" is declared more than once", name));
            }
        }

        let input_properties = [
            ("fixable", sorted_keys(&self.fixable)),
            ("fixed", sorted_keys(&self.fixed)),
            ("limits", sorted_keys(&self.limits)),
            ("opts", sorted_keys(&self.opts)),
            ("units", sorted_keys(&self.units)),
            ("visible", sorted_keys(&self.visible)),
        ];
        for (property, keys) in input_properties {
            for key in keys {
                if !self.input_names.contains(key) {
                    problems.push(format!("\"{}\" is not a valid input for \"{}\"", key, property));
                }
            }
        }

        if self.output_names.is_empty() {
            tracing::warn!(
                "No output_names have been specified for operation \"{}\"; \
                 its outputs cannot be linked to any other operation",
                self.name
            );
        }

        for key in sorted_keys(&self.output_shape) {
            if !self.output_names.contains(key) {
                problems.push(format!("\"{}\" is not a valid output for \"output_shape\"", key));
            }
        }

        if problems.is_empty() {
            tracing::debug!("All args for operation \"{}\" are valid", self.name);
            Ok(())
        } else {
            Err(ValidationError {
                operation: self.name.clone(),
                problems,
            })
        }
    }

    /// Invoke the function with keyword arguments.
    ///
    /// Filled values act as defaults and are overridden key by key by
    /// `kwargs`; anything still unbound takes the signature default.
    pub fn call(&self, kwargs: HashMap<String, Value>) -> Result<Returns, OperationError> {
        let mut effective = self.filled_values.clone();
        effective.extend(kwargs);

        let mut unexpected: Vec<&String> = effective
            .keys()
            .filter(|key| !self.input_names.contains(key))
            .collect();
        unexpected.sort();
        if let Some(input) = unexpected.first() {
            return Err(OperationError::UnexpectedArgument {
                operation: self.name.clone(),
                input: input.to_string(),
            });
        }

        let mut bound = HashMap::with_capacity(self.input_names.len());
        for (input, parameter) in self
            .input_names
            .iter()
            .zip(self.function.signature().parameters())
        {
            let value = match effective.remove(input) {
                Some(value) => value,
                None => parameter.default.clone().ok_or_else(|| {
                    OperationError::MissingArgument {
                        operation: self.name.clone(),
                        input: input.clone(),
                    }
                })?,
            };
            bound.insert(parameter.name.clone(), value);
        }

        self.function.invoke(&crate::Arguments::new(bound))
    }

    /// Like [`call`](Self::call), with the returned values keyed by output name.
    pub fn call_named(&self, kwargs: HashMap<String, Value>) -> Result<Outputs, OperationError> {
        let returns = self.call(kwargs)?;
        Ok(self.name_outputs(returns))
    }

    /// Pair returned values with output names positionally.
    pub fn name_outputs(&self, returns: Returns) -> Outputs {
        if returns.len() != self.output_names.len() {
            tracing::warn!(
                "Operation \"{}\" returned {} value(s) for {} output name(s)",
                self.name,
                returns.len(),
                self.output_names.len()
            );
        }
        self.output_names.iter().cloned().zip(returns).collect()
    }

    /// Whether `input` can be bound without an incoming link.
    pub fn has_fallback(&self, input: &str) -> bool {
        if self.filled_values.contains_key(input) {
            return true;
        }
        self.input_names
            .iter()
            .position(|name| name == input)
            .and_then(|index| self.function.signature().parameters().get(index))
            .map_or(false, |parameter| parameter.default.is_some())
    }

    pub fn set_filled_value(
        &mut self,
        input: impl Into<String>,
        value: impl Into<Value>,
    ) -> Result<(), OperationError> {
        let input = input.into();
        if !self.input_names.contains(&input) {
            return Err(OperationError::UnexpectedArgument {
                operation: self.name.clone(),
                input,
            });
        }
        if self.is_fixed(&input) {
            return Err(OperationError::FixedInput {
                operation: self.name.clone(),
                input,
            });
        }
        self.filled_values.insert(input, value.into());
        Ok(())
    }

    pub fn clear_filled_value(&mut self, input: &str) -> Option<Value> {
        self.filled_values.remove(input)
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn function(&self) -> &Arc<Function> {
        &self.function
    }

    pub fn input_names(&self) -> &[String] {
        &self.input_names
    }

    pub fn output_names(&self) -> &[String] {
        &self.output_names
    }

    pub fn has_input(&self, input: &str) -> bool {
        self.input_names.iter().any(|name| name == input)
    }

    pub fn has_output(&self, output: &str) -> bool {
        self.output_names.iter().any(|name| name == output)
    }

    /// Input name → declared type, in declaration order.
    pub fn input_types(&self) -> Vec<(&str, Option<&ValueType>)> {
        self.input_names
            .iter()
            .zip(self.function.signature().parameters())
            .map(|(name, parameter)| (name.as_str(), parameter.ty.as_ref()))
            .collect()
    }

    /// Output name → declared return type, paired positionally.
    pub fn output_types(&self) -> Vec<(&str, &ValueType)> {
        self.output_names
            .iter()
            .map(String::as_str)
            .zip(self.function.signature().returns_types())
            .collect()
    }

    pub fn output_shape(&self) -> &HashMap<String, Vec<usize>> {
        &self.output_shape
    }

    pub fn filled_values(&self) -> &HashMap<String, Value> {
        &self.filled_values
    }

    pub fn limits(&self) -> &HashMap<String, Vec<Value>> {
        &self.limits
    }

    pub fn units(&self) -> &HashMap<String, String> {
        &self.units
    }

    pub fn fixed(&self) -> &HashMap<String, bool> {
        &self.fixed
    }

    pub fn fixable(&self) -> &HashMap<String, bool> {
        &self.fixable
    }

    pub fn visible(&self) -> &HashMap<String, bool> {
        &self.visible
    }

    pub fn opts(&self) -> &HashMap<String, Opts> {
        &self.opts
    }

    pub fn hints(&self) -> &[PlotHint] {
        &self.hints
    }

    pub fn is_fixed(&self, input: &str) -> bool {
        self.fixed.get(input).copied().unwrap_or(false)
    }

    /// Unset inputs are visible.
    pub fn is_visible(&self, input: &str) -> bool {
        self.visible.get(input).copied().unwrap_or(true)
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    pub fn set_disabled(&mut self, disabled: bool) {
        self.disabled = disabled;
    }
}

impl fmt::Display for OperationPlugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OperationPlugin named {}", self.name)
    }
}

fn sorted_keys<V>(map: &HashMap<String, V>) -> Vec<&String> {
    let mut keys: Vec<&String> = map.keys().collect();
    keys.sort();
    keys
}
