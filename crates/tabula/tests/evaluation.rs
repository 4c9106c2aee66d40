//! Tests for the evaluation engine: laziness, cycles, spill and errors

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use tabula::prelude::*;
use tabula::{ComputedValue, ValueAndFormat};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn pos(xc: &str) -> Position {
    Position::parse(xc).unwrap()
}

/// Model with one sheet filled from `(address, text)` pairs
fn model_with(cells: &[(&str, &str)]) -> (Model, SheetId) {
    init_tracing();
    let mut model = Model::new();
    let sheet = model.active_sheet_id().clone();
    for (xc, text) in cells {
        model.set_cell_content(&sheet, xc, *text).unwrap();
    }
    (model, sheet)
}

fn error_kind(model: &Model, sheet: &SheetId, xc: &str) -> Option<ErrorKind> {
    model.evaluated_cell(sheet, pos(xc)).error().map(|e| e.kind)
}

#[test]
fn test_literals_and_formulas() {
    let (model, sheet) = model_with(&[
        ("A1", "10"),
        ("A2", "hello"),
        ("A3", "TRUE"),
        ("B1", "=A1*2+1"),
        ("B2", "=A2&\" world\""),
        ("B3", "=NOT(A3)"),
    ]);
    assert_eq!(model.evaluated_cell(&sheet, pos("B1")).value(), Value::Number(21.0));
    assert_eq!(model.evaluated_cell(&sheet, pos("B2")).value(), Value::text("hello world"));
    assert_eq!(model.evaluated_cell(&sheet, pos("B3")).value(), Value::Boolean(false));
    assert!(model.evaluated_cell(&sheet, pos("C1")).is_empty());
}

#[test]
fn test_formula_reads_later_cells() {
    // C1 is computed on demand while A1 is being evaluated
    let (model, sheet) = model_with(&[("A1", "=C1+1"), ("C1", "=D5*3"), ("D5", "2")]);
    assert_eq!(model.evaluated_cell(&sheet, pos("A1")).value(), Value::Number(7.0));
}

#[test]
fn test_reference_to_empty_cell_is_zero() {
    let (model, sheet) = model_with(&[("A1", "=B1"), ("A2", "=B1+1")]);
    assert_eq!(model.evaluated_cell(&sheet, pos("A1")).value(), Value::Number(0.0));
    assert_eq!(model.evaluated_cell(&sheet, pos("A2")).value(), Value::Number(1.0));
}

#[test]
fn test_cycle() {
    let (model, sheet) = model_with(&[("A1", "=B1"), ("B1", "=A1"), ("C1", "=A1+1")]);
    assert_eq!(error_kind(&model, &sheet, "A1"), Some(ErrorKind::CircularDependency));
    assert_eq!(error_kind(&model, &sheet, "B1"), Some(ErrorKind::CircularDependency));
    // Errors propagate to dependents unchanged
    assert_eq!(error_kind(&model, &sheet, "C1"), Some(ErrorKind::CircularDependency));
}

#[test]
fn test_self_reference() {
    let (model, sheet) = model_with(&[("A1", "=SUM(A1:A3)")]);
    assert_eq!(error_kind(&model, &sheet, "A1"), Some(ErrorKind::CircularDependency));
}

#[test]
fn test_reading_below_a_dependent_is_not_a_cycle() {
    // Reading C3 looks back at B2, which itself waits on A1
    let (model, sheet) = model_with(&[("A1", "=C3"), ("B2", "=A1+1")]);
    assert_eq!(model.evaluated_cell(&sheet, pos("A1")).value(), Value::Number(0.0));
    assert_eq!(model.evaluated_cell(&sheet, pos("B2")).value(), Value::Number(1.0));

    let (model, sheet) = model_with(&[("A1", "=SUM(C1:C3)"), ("B2", "=A1+1")]);
    assert_eq!(model.evaluated_cell(&sheet, pos("A1")).value(), Value::Number(0.0));
    assert_eq!(model.evaluated_cell(&sheet, pos("B2")).value(), Value::Number(1.0));

    // Deeper chains are left for the main pass as well
    let (model, sheet) = model_with(&[("A1", "=C3"), ("B2", "=B1*2"), ("B1", "=A1+5")]);
    assert_eq!(model.evaluated_cell(&sheet, pos("B2")).value(), Value::Number(10.0));
}

#[test]
fn test_cycle_through_look_back() {
    let (model, sheet) = model_with(&[("A1", "=C3+B2"), ("B2", "=A1")]);
    assert_eq!(error_kind(&model, &sheet, "A1"), Some(ErrorKind::CircularDependency));
    assert_eq!(error_kind(&model, &sheet, "B2"), Some(ErrorKind::CircularDependency));
}

#[test]
fn test_idempotent_passes() {
    let (mut model, sheet) = model_with(&[
        ("A1", "1"),
        ("A2", "=A1+1"),
        ("B1", "=SEQUENCE(2,2)"),
        ("D1", "=B1/0"),
        ("E1", "=E2"),
        ("E2", "=E1"),
    ]);
    let first = model.evaluated_cells(&sheet);
    model.dispatch(Command::EvaluateCells { sheet_id: None }).unwrap();
    let second = model.evaluated_cells(&sheet);
    assert_eq!(first, second);
}

#[test]
fn test_edit_invalidates() {
    let (mut model, sheet) = model_with(&[("A1", "1"), ("A2", "=A1*10")]);
    assert_eq!(model.evaluated_cell(&sheet, pos("A2")).value(), Value::Number(10.0));
    model.set_cell_content(&sheet, "A1", "4").unwrap();
    assert_eq!(model.evaluated_cell(&sheet, pos("A2")).value(), Value::Number(40.0));
}

#[test]
fn test_spill() {
    let (model, sheet) = model_with(&[("A1", "={1,2;3,4}")]);
    let values: Vec<(String, Value)> = model
        .evaluated_cells(&sheet)
        .into_iter()
        .map(|(p, cell)| (p.to_xc(), cell.value()))
        .collect();
    assert_eq!(
        values,
        vec![
            ("A1".to_string(), Value::Number(1.0)),
            ("B1".to_string(), Value::Number(2.0)),
            ("A2".to_string(), Value::Number(3.0)),
            ("B2".to_string(), Value::Number(4.0)),
        ]
    );
}

#[test]
fn test_spill_blocked_by_content_writes_nothing() {
    let (mut model, sheet) = model_with(&[("A1", "={1,2;3,4}"), ("B2", "x")]);
    assert_eq!(error_kind(&model, &sheet, "A1"), Some(ErrorKind::OverwriteData));
    assert_eq!(model.evaluated_cell(&sheet, pos("B2")).value(), Value::text("x"));
    assert!(model.evaluated_cell(&sheet, pos("B1")).is_empty());
    assert!(model.evaluated_cell(&sheet, pos("A2")).is_empty());

    model.set_cell_content(&sheet, "B2", "").unwrap();
    assert_eq!(model.evaluated_cell(&sheet, pos("B2")).value(), Value::Number(4.0));
}

#[test]
fn test_spill_beyond_sheet() {
    let (model, sheet) = model_with(&[("Z1", "=SEQUENCE(1,2)"), ("A99", "=SEQUENCE(3)")]);
    assert_eq!(error_kind(&model, &sheet, "Z1"), Some(ErrorKind::OverwriteData));
    assert_eq!(error_kind(&model, &sheet, "A99"), Some(ErrorKind::OverwriteData));
}

#[test]
fn test_oversized_array_is_an_error() {
    let (model, sheet) = model_with(&[("A1", "=SEQUENCE(100000000,100000)"), ("A2", "=MUNIT(1000000)")]);
    assert_eq!(error_kind(&model, &sheet, "A1"), Some(ErrorKind::OverwriteData));
    assert_eq!(error_kind(&model, &sheet, "A2"), Some(ErrorKind::OverwriteData));
    assert_eq!(
        model
            .evaluate_formula(&sheet, "=SEQUENCE(100000000,100000)")
            .map_err(|e| e.kind),
        Err(ErrorKind::OverwriteData)
    );
}

#[test]
fn test_spill_over_own_dependency() {
    let (model, sheet) = model_with(&[("A1", "=SEQUENCE(1, ROW(B1)+1)")]);
    assert_eq!(error_kind(&model, &sheet, "A1"), Some(ErrorKind::CircularDependency));
    assert!(model.evaluated_cell(&sheet, pos("B1")).is_empty());
}

#[test]
fn test_spilled_values_are_read_by_earlier_cells() {
    // B1 is evaluated before A2 spills onto A3
    let (model, sheet) = model_with(&[("B1", "=A3*10"), ("A2", "=SEQUENCE(2)"), ("C1", "=SUM(A1:A5)")]);
    assert_eq!(model.evaluated_cell(&sheet, pos("B1")).value(), Value::Number(20.0));
    assert_eq!(model.evaluated_cell(&sheet, pos("C1")).value(), Value::Number(3.0));
}

#[test]
fn test_spilled_value_takes_cell_format() {
    init_tracing();
    let mut model = Model::new();
    let sheet = model.active_sheet_id().clone();
    model.set_cell_content(&sheet, "A1", "=SEQUENCE(2)").unwrap();
    model
        .dispatch(Command::UpdateCell {
            sheet_id: sheet.clone(),
            position: pos("A2"),
            content: None,
            format: Some("0.00".into()),
        })
        .unwrap();
    assert_eq!(model.evaluated_cell(&sheet, pos("A2")).formatted_value(), "2.00");
}

#[test]
fn test_range_argument_where_value_expected() {
    let (model, sheet) = model_with(&[("A1", "=A2:A3+1"), ("B1", "=LEN(A2:A3)")]);
    assert_eq!(error_kind(&model, &sheet, "A1"), Some(ErrorKind::GenericError));
    let b1 = model.evaluated_cell(&sheet, pos("B1"));
    assert_eq!(
        b1.error().map(|e| e.message.as_str()),
        Some("Function LEN expects the parameter 1 to be a single value or a single cell reference, not a range.")
    );
}

#[test]
fn test_errors() {
    let (model, sheet) = model_with(&[
        ("A1", "=1/0"),
        ("A2", "=NOPE(1)"),
        ("A3", "=1+"),
        ("A4", "=IFERROR(A1, \"caught\")"),
        ("A5", "=Sheet9!A1"),
        ("A6", "=unknown_name"),
    ]);
    assert_eq!(error_kind(&model, &sheet, "A1"), Some(ErrorKind::DivisionByZero));
    assert_eq!(error_kind(&model, &sheet, "A2"), Some(ErrorKind::UnknownFunction));
    assert_eq!(error_kind(&model, &sheet, "A3"), Some(ErrorKind::BadExpression));
    assert_eq!(model.evaluated_cell(&sheet, pos("A4")).value(), Value::text("caught"));
    assert_eq!(error_kind(&model, &sheet, "A5"), Some(ErrorKind::InvalidReference));
    assert_eq!(error_kind(&model, &sheet, "A6"), Some(ErrorKind::UnknownFunction));
    assert_eq!(model.evaluated_cell(&sheet, pos("A1")).formatted_value(), "#DIV/0!");
}

#[test]
fn test_format_flows_through_formulas() {
    let (model, sheet) = model_with(&[("A1", "12%"), ("A2", "=A1+0.5"), ("A3", "=-A1")]);
    assert_eq!(model.evaluated_cell(&sheet, pos("A1")).formatted_value(), "12%");
    assert_eq!(model.evaluated_cell(&sheet, pos("A2")).formatted_value(), "62%");
    assert_eq!(model.evaluated_cell(&sheet, pos("A3")).formatted_value(), "-12%");
}

#[test]
fn test_cross_sheet_reference() {
    init_tracing();
    let mut model = Model::new();
    let s1 = model.active_sheet_id().clone();
    let s2 = SheetId::new("s2");
    model
        .dispatch(Command::CreateSheet {
            sheet_id: s2.clone(),
            name: "Data Sheet".into(),
            position: None,
            size: None,
        })
        .unwrap();
    model.set_cell_content(&s2, "A1", "=B1*2").unwrap();
    model.set_cell_content(&s2, "B1", "21").unwrap();
    model.set_cell_content(&s1, "A1", "='Data Sheet'!A1").unwrap();

    assert_eq!(model.evaluated_cell(&s1, pos("A1")).value(), Value::Number(42.0));
    // The other sheet is read from its own pass once it is evaluated
    assert_eq!(model.evaluated_cell(&s2, pos("A1")).value(), Value::Number(42.0));
    model.dispatch(Command::EvaluateCells { sheet_id: Some(s1.clone()) }).unwrap();
    assert_eq!(model.evaluated_cell(&s1, pos("A1")).value(), Value::Number(42.0));
}

#[test]
fn test_globals() {
    init_tracing();
    let mut model = Model::with_config(ModelConfig::default().with_global("TaxRate", 0.2));
    let sheet = model.active_sheet_id().clone();
    model.set_cell_content(&sheet, "A1", "=100*taxrate").unwrap();
    assert_eq!(model.evaluated_cell(&sheet, pos("A1")).value(), Value::Number(20.0));
}

#[test]
fn test_evaluate_formula_outside_cells() {
    let (model, sheet) = model_with(&[("A1", "3"), ("A2", "4")]);
    assert_eq!(
        model.evaluate_formula(&sheet, "=SUM(A1:A2)*2"),
        Ok(ComputedValue::number(14.0))
    );
    assert_eq!(model.evaluate_formula(&sheet, "=SEQUENCE(2)").map(|v| v.dimensions()), Ok((1, 2)));
    assert!(model.evaluate_formula(&sheet, "=(").is_err());
}

#[test]
fn test_range_values() {
    let (model, sheet) = model_with(&[("A1", "1"), ("B1", "=A1+1"), ("A2", "x")]);
    let range = model.range_from_xc(&sheet, "A1:B2");
    assert_eq!(
        model.range_values(&range).unwrap(),
        vec![Some(Value::Number(1.0)), Some(Value::Number(2.0)), Some(Value::text("x")), None]
    );
    assert_eq!(
        model.range_formatted_values(&range).unwrap(),
        vec!["1".to_string(), "2".to_string(), "x".to_string(), String::new()]
    );
    let invalid = model.range_from_xc(&sheet, "A1:");
    assert!(matches!(model.range_values(&invalid), Err(Error::InvalidRange(_))));
}

proptest! {
    #[test]
    fn literal_cells_evaluate_to_their_parsed_value(
        text in "(-?[0-9]{1,6}(\\.[0-9]{1,3})?%?|[a-zA-Z ]{1,10}|TRUE|false)",
        other in "-?[0-9]{1,3}",
    ) {
        let mut model = Model::new();
        let sheet = model.active_sheet_id().clone();
        model.set_cell_content(&sheet, "B3", text.as_str()).unwrap();
        model.set_cell_content(&sheet, "A1", "=B3").unwrap();
        model.set_cell_content(&sheet, "C9", other.as_str()).unwrap();

        let expected = ValueAndFormat::parse_literal(&text);
        let evaluated = model.evaluated_cell(&sheet, Position::new(1, 2));
        prop_assert_eq!(evaluated.value(), expected.value);
        prop_assert_eq!(evaluated.format(), expected.format.as_deref());
    }
}
