//! Table-like data sources consumed by list and tree views.

use crate::Value;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceFlags {
    pub is_flat: bool,
    pub can_push: bool,
}

impl Default for ResourceFlags {
    fn default() -> Self {
        Self {
            is_flat: true,
            can_push: false,
        }
    }
}

/// A source of rows and columns that a view adapter can forward to.
pub trait DataResource: Send {
    fn row_count(&self) -> usize;

    fn column_count(&self) -> usize;

    /// Cell at `row`, `column`, or `None` outside the table.
    fn data(&self, row: usize, column: usize) -> Option<Value>;

    /// Reload from the underlying source.
    fn refresh(&mut self);

    fn flags(&self) -> ResourceFlags {
        ResourceFlags::default()
    }

    /// Access parameters (scheme, host, path, ...) this resource was opened with.
    fn config(&self) -> &HashMap<String, Value>;
}

/// View-side adapter that forwards the table calls to its resource
/// without looking at how the resource stores anything.
pub struct DataResourceModel<R: DataResource> {
    resource: R,
}

impl<R: DataResource> DataResourceModel<R> {
    pub fn new(resource: R) -> Self {
        Self { resource }
    }

    pub fn row_count(&self) -> usize {
        self.resource.row_count()
    }

    pub fn column_count(&self) -> usize {
        self.resource.column_count()
    }

    pub fn data(&self, row: usize, column: usize) -> Option<Value> {
        self.resource.data(row, column)
    }

    pub fn refresh(&mut self) {
        self.resource.refresh()
    }

    pub fn config(&self) -> &HashMap<String, Value> {
        self.resource.config()
    }

    pub fn resource(&self) -> &R {
        &self.resource
    }

    pub fn into_inner(self) -> R {
        self.resource
    }
}

type Loader = dyn Fn() -> Vec<Vec<Value>> + Send;

/// In-memory resource whose rows come from a loader re-run on refresh.
pub struct ListResource {
    config: HashMap<String, Value>,
    rows: Vec<Vec<Value>>,
    loader: Box<Loader>,
}

impl ListResource {
    pub fn new<F>(loader: F) -> Self
    where
        F: Fn() -> Vec<Vec<Value>> + Send + 'static,
    {
        Self {
            config: HashMap::new(),
            rows: loader(),
            loader: Box::new(loader),
        }
    }

    pub fn with_config(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.config.insert(key.into(), value.into());
        self
    }
}

impl DataResource for ListResource {
    fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn column_count(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    fn data(&self, row: usize, column: usize) -> Option<Value> {
        self.rows.get(row)?.get(column).cloned()
    }

    fn refresh(&mut self) {
        self.rows = (self.loader)();
        tracing::debug!("Refreshed list resource: {} rows", self.rows.len());
    }

    fn config(&self) -> &HashMap<String, Value> {
        &self.config
    }
}
