use serde::{Deserialize, Serialize};

/// Describes how a one-dimensional output should be plotted.
///
/// The core never interprets hints; they ride along on the operation for the
/// presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotHint {
    /// Output plotted on the y axis.
    pub y: String,
    /// Output used for the x axis, if any.
    pub x: Option<String>,
    pub name: Option<String>,
    pub x_label: Option<String>,
    pub y_label: Option<String>,
    #[serde(default)]
    pub opts: serde_json::Map<String, serde_json::Value>,
}

impl PlotHint {
    pub fn new(y: impl Into<String>) -> Self {
        Self {
            y: y.into(),
            x: None,
            name: None,
            x_label: None,
            y_label: None,
            opts: serde_json::Map::new(),
        }
    }

    pub fn against(mut self, x: impl Into<String>) -> Self {
        self.x = Some(x.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_labels(mut self, x_label: impl Into<String>, y_label: impl Into<String>) -> Self {
        self.x_label = Some(x_label.into());
        self.y_label = Some(y_label.into());
        self
    }

    pub fn with_opt(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.opts.insert(key.into(), value.into());
        self
    }
}
