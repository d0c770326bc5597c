//! Declarative operation metadata.
//!
//! Annotators are plain values. Applying one to an [`OperationMetadata`]
//! returns an updated record; nothing is stored on the function itself and
//! the function is never run while annotating.
//!
//! ```ignore
//! let square = Function::new("square", signature, body)
//!     .annotate(output_names(["square"]))
//!     .annotate(limits("a", [0, 100]))
//!     .annotate(units("a", "mm"));
//! ```

use crate::{PlotHint, Value};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Free-form presentation options for a single input.
pub type Opts = serde_json::Map<String, serde_json::Value>;

/// Everything the annotators can attach to a function.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OperationMetadata {
    pub display_name: Option<String>,
    pub input_names: Option<Vec<String>>,
    pub output_names: Option<Vec<String>>,
    pub output_shape: HashMap<String, Vec<usize>>,
    pub limits: HashMap<String, Vec<Value>>,
    pub units: HashMap<String, String>,
    pub fixed: HashMap<String, bool>,
    pub fixable: HashMap<String, bool>,
    pub visible: HashMap<String, bool>,
    pub opts: HashMap<String, Opts>,
    pub hints: Vec<PlotHint>,
}

impl OperationMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, annotation: Annotation) -> Self {
        annotation.apply(self)
    }
}

/// A single metadata transformer.
#[derive(Debug, Clone, PartialEq)]
pub enum Annotation {
    DisplayName(String),
    InputNames(Vec<String>),
    OutputNames(Vec<String>),
    OutputShape { output: String, shape: Vec<usize> },
    Limits { input: String, limits: Vec<Value> },
    Units { input: String, unit: String },
    Fixed { input: String, fixed: bool },
    Fixable { input: String, fixable: bool },
    Visible { input: String, visible: bool },
    Opts { input: String, opts: Opts },
    PlotHint(PlotHint),
}

impl Annotation {
    /// Merge this annotation into `metadata`.
    ///
    /// Keyed annotations replace any earlier value for the same key, name
    /// lists replace the whole list, and plot hints accumulate.
    pub fn apply(self, mut metadata: OperationMetadata) -> OperationMetadata {
        match self {
            Annotation::DisplayName(name) => metadata.display_name = Some(name),
            Annotation::InputNames(names) => metadata.input_names = Some(names),
            Annotation::OutputNames(names) => metadata.output_names = Some(names),
            Annotation::OutputShape { output, shape } => {
                metadata.output_shape.insert(output, shape);
            }
            Annotation::Limits { input, limits } => {
                metadata.limits.insert(input, limits);
            }
            Annotation::Units { input, unit } => {
                metadata.units.insert(input, unit);
            }
            Annotation::Fixed { input, fixed } => {
                metadata.fixed.insert(input, fixed);
            }
            Annotation::Fixable { input, fixable } => {
                metadata.fixable.insert(input, fixable);
            }
            Annotation::Visible { input, visible } => {
                metadata.visible.insert(input, visible);
            }
            Annotation::Opts { input, opts } => {
                metadata.opts.insert(input, opts);
            }
            Annotation::PlotHint(hint) => metadata.hints.push(hint),
        }
        metadata
    }
}

/// Overrides the operation's display name.
pub fn display_name(name: impl Into<String>) -> Annotation {
    Annotation::DisplayName(name.into())
}

/// Renames the inputs positionally; the count must match the function's arity.
pub fn input_names<I, S>(names: I) -> Annotation
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    Annotation::InputNames(names.into_iter().map(Into::into).collect())
}

/// Names the returned values, in order.
pub fn output_names<I, S>(names: I) -> Annotation
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    Annotation::OutputNames(names.into_iter().map(Into::into).collect())
}

pub fn output_shape(output: impl Into<String>, shape: impl IntoIterator<Item = usize>) -> Annotation {
    Annotation::OutputShape {
        output: output.into(),
        shape: shape.into_iter().collect(),
    }
}

/// Inclusive bounds for numeric inputs, or the allowed choices for enums.
pub fn limits<I, V>(input: impl Into<String>, limits: I) -> Annotation
where
    I: IntoIterator<Item = V>,
    V: Into<Value>,
{
    Annotation::Limits {
        input: input.into(),
        limits: limits.into_iter().map(Into::into).collect(),
    }
}

pub fn units(input: impl Into<String>, unit: impl Into<String>) -> Annotation {
    Annotation::Units {
        input: input.into(),
        unit: unit.into(),
    }
}

/// Marks an input as fixed. Use [`fixed_as`] to set an explicit state.
pub fn fixed(input: impl Into<String>) -> Annotation {
    fixed_as(input, true)
}

pub fn fixed_as(input: impl Into<String>, fixed: bool) -> Annotation {
    Annotation::Fixed {
        input: input.into(),
        fixed,
    }
}

pub fn fixable(input: impl Into<String>, fixable: bool) -> Annotation {
    Annotation::Fixable {
        input: input.into(),
        fixable,
    }
}

/// Marks an input as visible. Use [`visible_as`] to hide it.
pub fn visible(input: impl Into<String>) -> Annotation {
    visible_as(input, true)
}

pub fn visible_as(input: impl Into<String>, visible: bool) -> Annotation {
    Annotation::Visible {
        input: input.into(),
        visible,
    }
}

pub fn opts<I, K, V>(input: impl Into<String>, options: I) -> Annotation
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<serde_json::Value>,
{
    Annotation::Opts {
        input: input.into(),
        opts: options
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect(),
    }
}

pub fn plot_hint(hint: PlotHint) -> Annotation {
    Annotation::PlotHint(hint)
}

