//! Parameter export for presentation layers.
//!
//! The set of type names a renderer can show is injected by the caller, so
//! the core stays independent of any particular widget toolkit.

use crate::{OperationPlugin, Opts, Value};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Type identifiers a presentation backend knows how to render.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PresentableTypes {
    names: HashSet<String>,
}

impl PresentableTypes {
    pub fn new() -> Self {
        Self::default()
    }

    /// The scalar and list types most parameter trees support.
    pub fn standard() -> Self {
        ["int", "float", "bool", "str", "text", "list", "color", "colormap"]
            .into_iter()
            .collect()
    }

    pub fn with(mut self, name: impl Into<String>) -> Self {
        self.names.insert(name.into());
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }
}

impl<S: Into<String>> FromIterator<S> for PresentableTypes {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            names: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// One editable input as a flat key/value record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterRecord(Opts);

impl ParameterRecord {
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.0.get(key)
    }

    pub fn name(&self) -> Option<&str> {
        self.get("name").and_then(serde_json::Value::as_str)
    }

    pub fn type_name(&self) -> Option<&str> {
        self.get("type").and_then(serde_json::Value::as_str)
    }

    pub fn limits(&self) -> Option<&serde_json::Value> {
        self.get("limits")
    }

    pub fn fixed(&self) -> Option<bool> {
        self.get("fixed").and_then(serde_json::Value::as_bool)
    }

    pub fn fixable(&self) -> Option<bool> {
        self.get("fixable").and_then(serde_json::Value::as_bool)
    }

    pub fn visible(&self) -> bool {
        self.get("visible")
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(true)
    }

    pub fn as_map(&self) -> &Opts {
        &self.0
    }

    pub fn into_map(self) -> Opts {
        self.0
    }
}

impl OperationPlugin {
    /// Describe each presentable input as a [`ParameterRecord`].
    ///
    /// Inputs are visited in declaration order. An input is included when its
    /// declared type name is in `presentable` or when it is an enumeration;
    /// untyped and unknown-typed inputs are skipped.
    pub fn as_parameter(&self, presentable: &PresentableTypes) -> Vec<ParameterRecord> {
        let parameters = self.function().signature().parameters();
        let mut records = Vec::new();

        for (name, parameter) in self.input_names().iter().zip(parameters) {
            let Some(ty) = parameter.ty.as_ref() else {
                continue;
            };
            if !ty.is_enum() && !presentable.contains(ty.type_name()) {
                continue;
            }

            let opts = self.opts().get(name);
            let mut record = Opts::new();
            if let Some(opts) = opts {
                record.extend(opts.clone());
            }

            let default = parameter
                .default
                .as_ref()
                .map(Value::to_json)
                .unwrap_or(serde_json::Value::Null);
            let value = self
                .filled_values()
                .get(name)
                .map(Value::to_json)
                .unwrap_or_else(|| default.clone());

            record.insert("name".into(), name.clone().into());
            record.insert("default".into(), default);
            record.insert("value".into(), value);

            let limits = self.limits().get(name).map(|limits| {
                serde_json::Value::Array(limits.iter().map(Value::to_json).collect())
            });

            match ty {
                crate::ValueType::Enum { variants, .. } => {
                    let values = limits.clone().unwrap_or_else(|| {
                        if variants.is_empty() {
                            serde_json::Value::Array(vec!["---".into()])
                        } else {
                            serde_json::Value::Array(
                                variants.iter().cloned().map(Into::into).collect(),
                            )
                        }
                    });
                    record.insert("type".into(), "list".into());
                    record.insert("values".into(), values);
                }
                _ => {
                    record.insert("type".into(), ty.type_name().into());
                }
            }

            if let Some(limits) = limits {
                record.insert("limits".into(), limits);
            }
            record.insert("units".into(), optional(self.units().get(name).cloned()));
            record.insert("fixed".into(), optional(self.fixed().get(name).copied()));
            record.insert("fixable".into(), optional(self.fixable().get(name).copied()));
            record.insert("visible".into(), self.is_visible(name).into());

            if let Some(opts) = opts {
                record.extend(opts.clone());
            }

            records.push(ParameterRecord(record));
        }

        records
    }
}

fn optional<T: Into<serde_json::Value>>(value: Option<T>) -> serde_json::Value {
    value.map(Into::into).unwrap_or(serde_json::Value::Null)
}
