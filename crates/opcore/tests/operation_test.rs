// crates/opcore/tests/operation_test.rs

use opcore::metadata::{
    display_name, fixed, input_names, limits, output_names, output_shape, units, visible_as,
};
use opcore::{
    Function, OperationError, OperationOverrides, OperationPlugin, ReducedOperation, Signature,
    Value, ValueType,
};
use std::collections::HashMap;

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};
    let _ = fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .with_test_writer()
        .try_init();
}

/// `add(x: int, y: int = 10) -> total`
fn add() -> Function {
    Function::new(
        "add",
        Signature::new()
            .param("x", ValueType::Int)
            .param_default("y", ValueType::Int, 10)
            .returns(ValueType::Int),
        |args| Ok(vec![Value::Int(args.int("x")? + args.int("y")?)]),
    )
    .annotate(output_names(["total"]))
}

fn kwargs(pairs: &[(&str, Value)]) -> HashMap<String, Value> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

#[test]
fn test_name_comes_from_function_or_display_name() {
    init_tracing();

    let op = OperationPlugin::new(add()).unwrap();
    assert_eq!(op.name(), "add");
    assert_eq!(op.to_string(), "OperationPlugin named add");

    let renamed = OperationPlugin::new(add().annotate(display_name("Addition"))).unwrap();
    assert_eq!(renamed.name(), "Addition");
}

#[test]
fn test_anonymous_function_needs_a_display_name() {
    let anonymous = || Function::anonymous(Signature::new(), |_| Ok(vec![]));

    assert_eq!(
        OperationPlugin::new(anonymous()).unwrap_err(),
        OperationError::Unnamed
    );
    assert_eq!(
        OperationPlugin::new(anonymous().annotate(display_name(""))).unwrap_err(),
        OperationError::Unnamed
    );

    let named = OperationPlugin::new(anonymous().annotate(display_name("Lambda"))).unwrap();
    assert_eq!(named.name(), "Lambda");
    assert_eq!(
        named.reduce().unwrap_err(),
        OperationError::Anonymous("Lambda".to_string())
    );
}

#[test]
fn test_inputs_and_types_are_derived() {
    let op = OperationPlugin::new(add()).unwrap();

    assert_eq!(op.input_names(), ["x", "y"]);
    assert_eq!(op.output_names(), ["total"]);
    assert_eq!(
        op.input_types(),
        vec![("x", Some(&ValueType::Int)), ("y", Some(&ValueType::Int))]
    );
    assert_eq!(op.output_types(), vec![("total", &ValueType::Int)]);
    assert!(op.has_input("y"));
    assert!(!op.has_output("y"));
}

#[test]
fn test_input_name_count_must_match_arity() {
    let err = OperationPlugin::new(add().annotate(input_names(["only"]))).unwrap_err();
    let OperationError::Validation(validation) = err else {
        panic!("expected a validation error, got {:?}", err);
    };
    assert_eq!(validation.operation, "add");
    assert_eq!(
        validation.problems,
        vec!["number of input_names given (1) must match number of inputs for the operation (2)"]
    );
}

#[test]
fn test_every_invalid_key_is_reported() {
    let function = add().annotate_all([
        visible_as("z", false),
        limits("w", [0, 1]),
        units("x", "mm"),
        output_shape("missing", [3]),
    ]);

    let err = OperationPlugin::new(function).unwrap_err();
    let OperationError::Validation(validation) = err else {
        panic!("expected a validation error, got {:?}", err);
    };
    assert_eq!(
        validation.problems,
        vec![
            "\"w\" is not a valid input for \"limits\"",
            "\"z\" is not a valid input for \"visible\"",
            "\"missing\" is not a valid output for \"output_shape\"",
        ]
    );
    assert!(validation.to_string().contains("\"z\" is not a valid input"));
}

#[test]
fn test_duplicate_input_names_rejected() {
    let err = OperationPlugin::new(add().annotate(input_names(["a", "a"]))).unwrap_err();
    assert!(matches!(err, OperationError::Validation(v) if v.problems.len() == 1));
}

#[test]
fn test_missing_output_names_is_only_a_warning() {
    init_tracing();

    let function = Function::new("silent", Signature::new(), |_| Ok(vec![Value::Int(1)]));
    let op = OperationPlugin::new(function).unwrap();
    assert!(op.output_names().is_empty());
    assert!(op.call_named(HashMap::new()).unwrap().is_empty());
}

#[test]
fn test_explicit_override_beats_annotation() {
    let function = add().annotate(units("x", "mm"));

    let op = OperationPlugin::with_overrides(
        function.clone(),
        OperationOverrides::new()
            .with_units("x", "cm")
            .with_output_names(["sum"]),
    )
    .unwrap();
    assert_eq!(op.units()["x"], "cm");
    assert_eq!(op.output_names(), ["sum"]);

    // An explicit empty map still wins.
    let cleared = OperationPlugin::with_overrides(
        function,
        OperationOverrides {
            units: Some(HashMap::new()),
            ..OperationOverrides::default()
        },
    )
    .unwrap();
    assert!(cleared.units().is_empty());
}

#[test]
fn test_call_binds_filled_values_then_defaults() {
    let op = OperationPlugin::with_overrides(
        add(),
        OperationOverrides::new().with_filled_value("x", 5),
    )
    .unwrap();

    assert_eq!(op.call(HashMap::new()).unwrap(), vec![Value::Int(15)]);
    assert_eq!(
        op.call(kwargs(&[("x", Value::Int(1)), ("y", Value::Int(2))]))
            .unwrap(),
        vec![Value::Int(3)]
    );
    assert_eq!(
        op.call_named(kwargs(&[("y", Value::Int(0))])).unwrap(),
        kwargs(&[("total", Value::Int(5))])
    );
}

#[test]
fn test_call_rejects_missing_and_unexpected_inputs() {
    let op = OperationPlugin::new(add()).unwrap();

    assert_eq!(
        op.call(HashMap::new()).unwrap_err(),
        OperationError::MissingArgument {
            operation: "add".to_string(),
            input: "x".to_string(),
        }
    );
    assert_eq!(
        op.call(kwargs(&[("x", Value::Int(1)), ("q", Value::Int(1))]))
            .unwrap_err(),
        OperationError::UnexpectedArgument {
            operation: "add".to_string(),
            input: "q".to_string(),
        }
    );
    assert!(matches!(
        op.call(kwargs(&[("x", Value::from("one"))])),
        Err(OperationError::InvalidArgumentType { field, .. }) if field == "x"
    ));
}

#[test]
fn test_renamed_inputs_bind_positionally() {
    let op = OperationPlugin::new(add().annotate(input_names(["left", "right"]))).unwrap();

    assert_eq!(
        op.call(kwargs(&[("left", Value::Int(2)), ("right", Value::Int(3))]))
            .unwrap(),
        vec![Value::Int(5)]
    );
    assert!(op.has_fallback("right"));
    assert!(!op.has_fallback("left"));
}

#[test]
fn test_fixed_inputs_refuse_new_values() {
    let mut op = OperationPlugin::new(add().annotate(fixed("y"))).unwrap();

    assert!(op.is_fixed("y"));
    assert_eq!(
        op.set_filled_value("y", 3),
        Err(OperationError::FixedInput {
            operation: "add".to_string(),
            input: "y".to_string(),
        })
    );
    assert!(matches!(
        op.set_filled_value("nope", 3),
        Err(OperationError::UnexpectedArgument { .. })
    ));

    op.set_filled_value("x", 7).unwrap();
    assert_eq!(op.filled_values()["x"], Value::Int(7));
    assert_eq!(op.clear_filled_value("x"), Some(Value::Int(7)));
}

#[test]
fn test_output_count_mismatch_pairs_what_it_can() {
    init_tracing();

    let function = Function::new("pair", Signature::new(), |_| {
        Ok(vec![Value::Int(1), Value::Int(2), Value::Int(3)])
    })
    .annotate(output_names(["first", "second"]));
    let op = OperationPlugin::new(function).unwrap();

    let outputs = op.call_named(HashMap::new()).unwrap();
    assert_eq!(outputs.len(), 2);
    assert_eq!(outputs["second"], Value::Int(2));
}

#[test]
fn test_clones_share_identity() {
    let op = OperationPlugin::new(add()).unwrap();
    let copy = op.clone();
    let twin = OperationPlugin::new(add()).unwrap();

    assert_eq!(op.id(), copy.id());
    assert_ne!(op.id(), twin.id());
    assert!(op.function().same_body(copy.function()));
}

#[test]
fn test_reduce_and_restore() {
    let mut op = OperationPlugin::with_overrides(
        add(),
        OperationOverrides::new().with_output_names(["result"]),
    )
    .unwrap();
    op.set_filled_value("x", 4).unwrap();

    let reduced = op.reduce().unwrap();
    assert_eq!(reduced.function, "add");
    assert_eq!(reduced.output_names, vec!["result"]);

    let json = serde_json::to_string(&reduced).unwrap();
    let reduced: ReducedOperation = serde_json::from_str(&json).unwrap();
    let restored = OperationPlugin::restore(add(), reduced).unwrap();

    assert_ne!(restored.id(), op.id());
    assert_eq!(restored.output_names(), ["result"]);
    assert_eq!(restored.filled_values()["x"], Value::Int(4));
    assert_eq!(
        restored.call(HashMap::new()).unwrap(),
        op.call(HashMap::new()).unwrap()
    );
}

#[test]
fn test_restore_with_wrong_function() {
    let reduced = OperationPlugin::new(add()).unwrap().reduce().unwrap();
    let other = Function::new("other", Signature::new(), |_| Ok(vec![]));

    assert_eq!(
        OperationPlugin::restore(other, reduced).unwrap_err(),
        OperationError::UnknownFunction("add".to_string())
    );
}

#[test]
fn test_override_builders_cover_every_input_property() {
    let op = OperationPlugin::with_overrides(
        add(),
        OperationOverrides::new()
            .with_fixable("x", true)
            .with_opts("y", [("step", 2)])
            .with_output_shape("total", [1]),
    )
    .unwrap();

    assert_eq!(op.fixable().get("x"), Some(&true));
    assert_eq!(op.opts()["y"]["step"], serde_json::json!(2));
    assert_eq!(op.output_shape()["total"], vec![1]);

    let err = OperationPlugin::with_overrides(
        add(),
        OperationOverrides::new()
            .with_fixable("z", true)
            .with_output_shape("missing", [2]),
    )
    .unwrap_err();
    let OperationError::Validation(validation) = err else {
        panic!("expected a validation error, got {:?}", err);
    };
    assert_eq!(validation.problems.len(), 2);
}
