//! Explicit parameter schema for operation functions.
//!
//! A [`Signature`] is built once when a function is declared and plays the
//! role of the function's introspectable shape: parameter names in
//! declaration order, an optional declared type and an optional default for
//! each, plus the declared return types.

use crate::{OperationError, Value};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Declared type of a parameter or return value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValueType {
    Int,
    Float,
    Bool,
    Str,
    Array,
    Object,
    /// A closed set of named choices.
    Enum { name: String, variants: Vec<String> },
    /// Any other type, identified by name only.
    Named { name: String },
}

impl ValueType {
    pub fn enumeration<I, S>(name: impl Into<String>, variants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ValueType::Enum {
            name: name.into(),
            variants: variants.into_iter().map(Into::into).collect(),
        }
    }

    pub fn named(name: impl Into<String>) -> Self {
        ValueType::Named { name: name.into() }
    }

    /// Type identifier as seen by presentation consumers.
    pub fn type_name(&self) -> &str {
        match self {
            ValueType::Int => "int",
            ValueType::Float => "float",
            ValueType::Bool => "bool",
            ValueType::Str => "str",
            ValueType::Array => "ndarray",
            ValueType::Object => "dict",
            ValueType::Enum { name, .. } => name,
            ValueType::Named { name } => name,
        }
    }

    pub fn is_enum(&self) -> bool {
        matches!(self, ValueType::Enum { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub ty: Option<ValueType>,
    pub default: Option<Value>,
}

impl Parameter {
    pub fn is_required(&self) -> bool {
        self.default.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Signature {
    parameters: Vec<Parameter>,
    returns: Vec<ValueType>,
}

impl Signature {
    pub fn new() -> Self {
        Self::default()
    }

    /// Typed parameter without a default.
    pub fn param(self, name: impl Into<String>, ty: ValueType) -> Self {
        self.push(name.into(), Some(ty), None)
    }

    /// Typed parameter with a default value.
    pub fn param_default(
        self,
        name: impl Into<String>,
        ty: ValueType,
        default: impl Into<Value>,
    ) -> Self {
        self.push(name.into(), Some(ty), Some(default.into()))
    }

    /// Parameter with no declared type.
    pub fn untyped(self, name: impl Into<String>) -> Self {
        self.push(name.into(), None, None)
    }

    pub fn untyped_default(self, name: impl Into<String>, default: impl Into<Value>) -> Self {
        self.push(name.into(), None, Some(default.into()))
    }

    /// Single return type; equivalent to a one-element tuple.
    pub fn returns(mut self, ty: ValueType) -> Self {
        self.returns = vec![ty];
        self
    }

    pub fn returns_tuple(mut self, types: impl IntoIterator<Item = ValueType>) -> Self {
        self.returns = types.into_iter().collect();
        self
    }

    fn push(mut self, name: String, ty: Option<ValueType>, default: Option<Value>) -> Self {
        self.parameters.push(Parameter { name, ty, default });
        self
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn returns_types(&self) -> &[ValueType] {
        &self.returns
    }

    pub fn arity(&self) -> usize {
        self.parameters.len()
    }

    pub fn parameter_names(&self) -> Vec<String> {
        self.parameters.iter().map(|p| p.name.clone()).collect()
    }
}

/// Bound arguments handed to a function body, keyed by parameter name.
#[derive(Debug, Clone, Default)]
pub struct Arguments {
    values: HashMap<String, Value>,
}

impl Arguments {
    pub fn new(values: HashMap<String, Value>) -> Self {
        Self { values }
    }

    pub fn get(&self, name: &str) -> Result<&Value, OperationError> {
        self.values
            .get(name)
            .ok_or_else(|| OperationError::ExecutionFailed(format!("unbound parameter {}", name)))
    }

    pub fn int(&self, name: &str) -> Result<i64, OperationError> {
        let value = self.get(name)?;
        value.as_i64().ok_or_else(|| mismatch(name, "int", value))
    }

    /// Accepts ints and floats.
    pub fn float(&self, name: &str) -> Result<f64, OperationError> {
        let value = self.get(name)?;
        value.as_f64().ok_or_else(|| mismatch(name, "float", value))
    }

    pub fn bool(&self, name: &str) -> Result<bool, OperationError> {
        let value = self.get(name)?;
        value.as_bool().ok_or_else(|| mismatch(name, "bool", value))
    }

    pub fn str(&self, name: &str) -> Result<&str, OperationError> {
        let value = self.get(name)?;
        value.as_str().ok_or_else(|| mismatch(name, "str", value))
    }

    pub fn array(&self, name: &str) -> Result<&[Value], OperationError> {
        let value = self.get(name)?;
        value.as_array().ok_or_else(|| mismatch(name, "array", value))
    }

    /// Numeric array as `f64`s.
    pub fn floats(&self, name: &str) -> Result<Vec<f64>, OperationError> {
        self.array(name)?
            .iter()
            .map(|v| v.as_f64().ok_or_else(|| mismatch(name, "array of numbers", v)))
            .collect()
    }
}

fn mismatch(field: &str, expected: &str, actual: &Value) -> OperationError {
    OperationError::InvalidArgumentType {
        field: field.to_string(),
        expected: expected.to_string(),
        actual: actual.kind().to_string(),
    }
}
