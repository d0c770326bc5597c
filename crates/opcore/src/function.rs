use crate::{Annotation, Arguments, OperationError, OperationMetadata, Signature, Value};
use std::fmt;
use std::sync::Arc;

/// Values returned by a function body, in order.
pub type Returns = Vec<Value>;

type Body = dyn Fn(&Arguments) -> Result<Returns, OperationError> + Send + Sync;

/// A plain function plus its declared signature and attached metadata.
///
/// The body lives behind an `Arc`, so cloning a `Function` (or an operation
/// built from it) shares the same callable.
#[derive(Clone)]
pub struct Function {
    name: Option<String>,
    signature: Signature,
    body: Arc<Body>,
    metadata: OperationMetadata,
}

impl Function {
    pub fn new<F>(name: impl Into<String>, signature: Signature, body: F) -> Self
    where
        F: Fn(&Arguments) -> Result<Returns, OperationError> + Send + Sync + 'static,
    {
        Self {
            name: Some(name.into()),
            signature,
            body: Arc::new(body),
            metadata: OperationMetadata::default(),
        }
    }

    /// A function with no name of its own. It can only become an operation
    /// once a display name is attached.
    pub fn anonymous<F>(signature: Signature, body: F) -> Self
    where
        F: Fn(&Arguments) -> Result<Returns, OperationError> + Send + Sync + 'static,
    {
        Self {
            name: None,
            signature,
            body: Arc::new(body),
            metadata: OperationMetadata::default(),
        }
    }

    pub fn annotate(mut self, annotation: Annotation) -> Self {
        self.metadata = annotation.apply(self.metadata);
        self
    }

    pub fn annotate_all(self, annotations: impl IntoIterator<Item = Annotation>) -> Self {
        annotations.into_iter().fold(self, Function::annotate)
    }

    /// The function's own name, ignoring any display name.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub fn metadata(&self) -> &OperationMetadata {
        &self.metadata
    }

    pub fn invoke(&self, args: &Arguments) -> Result<Returns, OperationError> {
        (self.body)(args)
    }

    pub fn same_body(&self, other: &Function) -> bool {
        Arc::ptr_eq(&self.body, &other.body)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.name)
            .field("signature", &self.signature)
            .field("metadata", &self.metadata)
            .finish_non_exhaustive()
    }
}
