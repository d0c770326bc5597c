//! Standard operation library
//!
//! Collection of built-in operations for common numeric work

mod arithmetic;
mod array;

pub use arithmetic::{multiply, power, square, sum};
pub use array::{array_sum, scale, threshold};
use opcore::{Function, OperationError};
use opruntime::OperationRegistry;

/// Every built-in function, in a stable order
pub fn all() -> Vec<Function> {
    vec![
        square(),
        sum(),
        multiply(),
        power(),
        scale(),
        threshold(),
        array_sum(),
    ]
}

/// Register all standard operations with a registry
pub fn register_all(registry: &mut OperationRegistry) -> Result<(), OperationError> {
    for function in all() {
        registry.register(function)?;
    }
    tracing::debug!("Registered {} built-in functions", registry.len());
    Ok(())
}
