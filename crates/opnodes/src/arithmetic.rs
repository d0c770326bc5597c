use opcore::metadata::{limits, opts, output_names};
use opcore::{Arguments, Function, OperationError, Signature, Value, ValueType};

/// Combine two numbers, staying integral when both inputs are ints.
fn numeric(
    args: &Arguments,
    left: &str,
    right: &str,
    int_op: fn(i64, i64) -> Option<i64>,
    float_op: fn(f64, f64) -> f64,
) -> Result<Value, OperationError> {
    let (a, b) = (args.get(left)?, args.get(right)?);
    if let (Some(a), Some(b)) = (a.as_i64(), b.as_i64()) {
        return int_op(a, b)
            .map(Value::Int)
            .ok_or_else(|| OperationError::ExecutionFailed("integer overflow".to_string()));
    }
    Ok(Value::Float(float_op(args.float(left)?, args.float(right)?)))
}

/// `square(a = 3) -> square`
pub fn square() -> Function {
    Function::new(
        "square",
        Signature::new()
            .param_default("a", ValueType::Int, 3)
            .returns(ValueType::Int),
        |args| Ok(vec![numeric(args, "a", "a", i64::checked_mul, |a, b| a * b)?]),
    )
    .annotate(output_names(["square"]))
}

/// `sum(a, b = 3) -> sum`
pub fn sum() -> Function {
    Function::new(
        "sum",
        Signature::new()
            .param("a", ValueType::Float)
            .param_default("b", ValueType::Float, 3)
            .returns(ValueType::Float),
        |args| Ok(vec![numeric(args, "a", "b", i64::checked_add, |a, b| a + b)?]),
    )
    .annotate(output_names(["sum"]))
}

/// `multiply(a, b) -> product`
pub fn multiply() -> Function {
    Function::new(
        "multiply",
        Signature::new()
            .param("a", ValueType::Float)
            .param("b", ValueType::Float)
            .returns(ValueType::Float),
        |args| Ok(vec![numeric(args, "a", "b", i64::checked_mul, |a, b| a * b)?]),
    )
    .annotate(output_names(["product"]))
}

/// `power(base, exponent = 2.0) -> power`
pub fn power() -> Function {
    Function::new(
        "power",
        Signature::new()
            .param("base", ValueType::Float)
            .param_default("exponent", ValueType::Float, 2.0)
            .returns(ValueType::Float),
        |args| {
            let base = args.float("base")?;
            let exponent = args.float("exponent")?;
            Ok(vec![Value::Float(base.powf(exponent))])
        },
    )
    .annotate_all([
        output_names(["power"]),
        limits("exponent", [-10.0, 10.0]),
        opts("exponent", [("step", 0.5)]),
    ])
}
