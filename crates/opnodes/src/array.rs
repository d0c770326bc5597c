use opcore::metadata::{fixable, limits, opts, output_names, plot_hint, units, visible_as};
use opcore::{Function, OperationError, PlotHint, Signature, Value, ValueType};

fn floats(values: impl IntoIterator<Item = f64>) -> Value {
    Value::Array(values.into_iter().map(Value::Float).collect())
}

/// `scale(data, factor = 1.0) -> scaled`
pub fn scale() -> Function {
    Function::new(
        "scale",
        Signature::new()
            .param("data", ValueType::Array)
            .param_default("factor", ValueType::Float, 1.0)
            .returns(ValueType::Array),
        |args| {
            let factor = args.float("factor")?;
            let data = args.floats("data")?;
            Ok(vec![floats(data.into_iter().map(|x| x * factor))])
        },
    )
    .annotate_all([
        output_names(["scaled"]),
        limits("factor", [0.0, 1000.0]),
        units("factor", "counts/s"),
        plot_hint(PlotHint::new("scaled").with_name("Scaled data")),
    ])
}

/// `threshold(data, threshold = 0.5, mode = "above") -> (mask, masked)`
///
/// `mask` flags the points that pass; `masked` zeroes the ones that do not.
pub fn threshold() -> Function {
    Function::new(
        "threshold",
        Signature::new()
            .param("data", ValueType::Array)
            .param_default("threshold", ValueType::Float, 0.5)
            .param_default(
                "mode",
                ValueType::enumeration("ThresholdMode", ["above", "below"]),
                "above",
            )
            .returns_tuple([ValueType::Array, ValueType::Array]),
        |args| {
            let data = args.floats("data")?;
            let threshold = args.float("threshold")?;
            let keep: fn(f64, f64) -> bool = match args.str("mode")? {
                "above" => |x, t| x >= t,
                "below" => |x, t| x <= t,
                other => {
                    return Err(OperationError::ExecutionFailed(format!(
                        "unknown threshold mode \"{}\"",
                        other
                    )))
                }
            };

            let mask: Vec<bool> = data.iter().map(|&x| keep(x, threshold)).collect();
            let masked = data
                .iter()
                .zip(&mask)
                .map(|(&x, &pass)| if pass { x } else { 0.0 });
            let masked = floats(masked);
            Ok(vec![Value::from(mask), masked])
        },
    )
    .annotate_all([
        output_names(["mask", "masked"]),
        visible_as("data", false),
        opts("threshold", [("step", 0.05)]),
        fixable("threshold", true),
    ])
}

/// `array_sum(data) -> total`
pub fn array_sum() -> Function {
    Function::new(
        "array_sum",
        Signature::new()
            .param("data", ValueType::Array)
            .returns(ValueType::Float),
        |args| Ok(vec![Value::Float(args.floats("data")?.iter().sum())]),
    )
    .annotate(output_names(["total"]))
}
