// crates/opcore/tests/metadata_test.rs

use opcore::metadata::{
    display_name, fixable, fixed, input_names, limits, opts, output_names, output_shape,
    plot_hint, units, visible, visible_as,
};
use opcore::{Annotation, Function, OperationMetadata, PlotHint, Signature, Value};

fn noop() -> Function {
    Function::new("noop", Signature::new().untyped("a").untyped("b"), |_| {
        Ok(vec![])
    })
}

#[test]
fn test_last_annotation_for_a_key_wins() {
    let function = noop().annotate_all([
        limits("a", [0, 10]),
        units("a", "mm"),
        limits("a", [1, 5]),
        units("a", "um"),
    ]);

    let metadata = function.metadata();
    assert_eq!(metadata.limits["a"], vec![Value::Int(1), Value::Int(5)]);
    assert_eq!(metadata.units["a"], "um");
}

#[test]
fn test_annotations_on_different_keys_commute() {
    let forward = OperationMetadata::new()
        .with(limits("a", [0, 1]))
        .with(fixed("b"))
        .with(units("a", "s"));
    let backward = OperationMetadata::new()
        .with(units("a", "s"))
        .with(fixed("b"))
        .with(limits("a", [0, 1]));

    assert_eq!(forward, backward);
}

#[test]
fn test_name_lists_are_replaced_and_hints_accumulate() {
    let metadata = OperationMetadata::new()
        .with(output_names(["x"]))
        .with(output_names(["y", "z"]))
        .with(input_names(["first", "second"]))
        .with(plot_hint(PlotHint::new("y")))
        .with(plot_hint(PlotHint::new("z").against("y").with_name("z vs y")));

    assert_eq!(metadata.output_names, Some(vec!["y".to_string(), "z".to_string()]));
    assert_eq!(
        metadata.input_names,
        Some(vec!["first".to_string(), "second".to_string()])
    );
    assert_eq!(metadata.hints.len(), 2);
    assert_eq!(metadata.hints[1].x.as_deref(), Some("y"));
    assert_eq!(metadata.hints[1].name.as_deref(), Some("z vs y"));
}

#[test]
fn test_opts_replace_the_whole_record() {
    let metadata = OperationMetadata::new()
        .with(opts("a", [("step", 0.1)]))
        .with(opts("a", [("suffix", "Hz")]));

    let record = &metadata.opts["a"];
    assert_eq!(record.len(), 1);
    assert_eq!(record["suffix"], serde_json::json!("Hz"));
}

#[test]
fn test_boolean_annotators() {
    let metadata = OperationMetadata::new()
        .with(fixed("a"))
        .with(fixable("a", false))
        .with(visible("a"))
        .with(visible_as("b", false))
        .with(display_name("Renamed"))
        .with(output_shape("out", [2, 3]));

    assert_eq!(metadata.fixed.get("a"), Some(&true));
    assert_eq!(metadata.fixable.get("a"), Some(&false));
    assert_eq!(metadata.visible.get("a"), Some(&true));
    assert_eq!(metadata.visible.get("b"), Some(&false));
    assert_eq!(metadata.display_name.as_deref(), Some("Renamed"));
    assert_eq!(metadata.output_shape["out"], vec![2, 3]);
}

#[test]
fn test_annotating_does_not_run_the_function() {
    let function = Function::new("explode", Signature::new(), |_| {
        panic!("annotating must not invoke the body")
    })
    .annotate(Annotation::DisplayName("Still fine".to_string()));

    assert_eq!(function.metadata().display_name.as_deref(), Some("Still fine"));
    assert_eq!(function.name(), Some("explode"));
}
