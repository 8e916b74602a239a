//! End-to-end pipeline tests over in-memory sheets
//!
//! Records → compile → generate → evaluate, without touching the filesystem.

use cellforge::config::GeneratorConfig;
use cellforge::core::evaluator::{check_against_cached, evaluate};
use cellforge::core::{compile_sheet, convert_workbook, ConvertOptions};
use cellforge::source::MemorySource;
use cellforge::{CellAddress, CellRange, CellRecord, CellValue, ForgeError, SheetContext};
use pretty_assertions::assert_eq;

fn addr(text: &str) -> CellAddress {
    CellAddress::parse(text).unwrap()
}

fn number(cell: &str, value: f64) -> CellRecord {
    CellRecord::literal(addr(cell), CellValue::Number(value))
}

fn formula(cell: &str, text: &str) -> CellRecord {
    CellRecord::formula(addr(cell), text)
}

fn budget_sheet() -> Vec<CellRecord> {
    vec![
        number("A1", 10.0),
        number("B1", 5.0),
        formula("B2", "=A1*2").with_cached(CellValue::Number(20.0)),
        formula("C3", "=B2+B1").with_cached(CellValue::Number(25.0)),
    ]
}

// ═══════════════════════════════════════════════════════════════════════════
// GENERATED OUTPUT
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_simple_sheet_generates_expected_function() {
    let compiled = compile_sheet(&budget_sheet(), &SheetContext::new("Sheet1", None)).unwrap();
    let generated = compiled.generate(&GeneratorConfig::default());

    assert_eq!(generated.order, vec![addr("B2"), addr("C3")]);
    assert_eq!(
        generated.function_source,
        "function Sheet1(d) {\n\
         \x20   // d is an object containing input cell values\n\
         \x20   let computed = {};\n\
         \x20   computed[\"B2\"] = (d[\"A1\"] * 2);\n\
         \x20   computed[\"C3\"] = (computed[\"B2\"] + d[\"B1\"]);\n\
         \x20   return computed;\n\
         }"
    );
    assert_eq!(generated.input_object, "{\n    \"A1\": 10,\n    \"B1\": 5\n}");
    assert_eq!(generated.inputs, vec![addr("A1"), addr("B1")]);
    assert!(generated.test_code.is_none());
}

#[test]
fn test_test_code_calls_function_with_inputs() {
    let config = GeneratorConfig {
        include_test_code: true,
        ..Default::default()
    };
    let compiled = compile_sheet(&budget_sheet(), &SheetContext::new("Sheet1", None)).unwrap();
    let generated = compiled.generate(&config);

    let test_code = generated.test_code.unwrap();
    assert!(test_code.starts_with("const Sheet1_args = {\n    \"A1\": 10,"));
    assert!(test_code.ends_with("console.log(\"Output for Sheet1: \", Sheet1(Sheet1_args));"));
}

#[test]
fn test_custom_container_names() {
    let config = GeneratorConfig::new("inputs", "out", false).unwrap();
    let compiled = compile_sheet(&budget_sheet(), &SheetContext::new("Sheet1", None)).unwrap();
    let source = compiled.generate(&config).function_source;

    assert!(source.starts_with("function Sheet1(inputs) {"));
    assert!(source.contains("out[\"C3\"] = (out[\"B2\"] + inputs[\"B1\"]);"));
    assert!(source.contains("return out;"));
}

#[test]
fn test_operator_translation() {
    let records = vec![
        number("A1", 2.0),
        formula("B1", "=-A1^2"),
        formula("B2", "=A1<>3"),
        formula("B3", "=(A1+1)*(A1-1)/4"),
        formula("B4", "=\"say \"\"hi\"\"\""),
        formula("B5", "=A1>=TRUE"),
    ];
    let compiled = compile_sheet(&records, &SheetContext::new("Ops", None)).unwrap();
    let source = compiled.generate(&GeneratorConfig::default()).function_source;

    assert!(source.contains("computed[\"B1\"] = ((-d[\"A1\"]) ** 2);"));
    assert!(source.contains("computed[\"B2\"] = (d[\"A1\"] !== 3);"));
    assert!(source.contains("computed[\"B3\"] = (((d[\"A1\"] + 1) * (d[\"A1\"] - 1)) / 4);"));
    assert!(source.contains("computed[\"B4\"] = \"say \\\"hi\\\"\";"));
    assert!(source.contains("computed[\"B5\"] = (d[\"A1\"] >= true);"));
}

#[test]
fn test_sheet_without_formulas() {
    let compiled = compile_sheet(&[number("A1", 1.0)], &SheetContext::new("Data", None)).unwrap();
    let generated = compiled.generate(&GeneratorConfig::default());

    assert!(generated.order.is_empty());
    assert_eq!(generated.input_object, "{}");
    assert_eq!(
        generated.function_source,
        "function Data(d) {\n\
         \x20   // d is an object containing input cell values\n\
         \x20   let computed = {};\n\
         \x20   return computed;\n\
         }"
    );
}

// ═══════════════════════════════════════════════════════════════════════════
// ORDERING PROPERTIES
// ═══════════════════════════════════════════════════════════════════════════

fn chain_sheet() -> Vec<CellRecord> {
    vec![
        number("A1", 1.0),
        formula("D1", "=C1+B2"),
        formula("C1", "=A1*3"),
        formula("B2", "=C1-1"),
        formula("A3", "=A1"),
        formula("E5", "=D1+A3"),
    ]
}

#[test]
fn test_order_respects_dependencies() {
    let compiled = compile_sheet(&chain_sheet(), &SheetContext::new("Chain", None)).unwrap();
    let order = compiled.order();
    let position = |cell: &str| order.iter().position(|c| *c == addr(cell)).unwrap();

    for (cell, dep) in compiled.graph().edges() {
        if compiled.graph().contains(&dep) {
            assert!(position(&dep.to_string()) < position(&cell.to_string()));
        }
    }
    assert_eq!(order.len(), 5);
}

#[test]
fn test_order_breaks_ties_row_major() {
    let compiled = compile_sheet(&chain_sheet(), &SheetContext::new("Chain", None)).unwrap();
    let order: Vec<String> = compiled.order().iter().map(ToString::to_string).collect();
    // C1 and A3 are both ready first; C1 sits on the earlier row
    assert_eq!(order, vec!["C1", "B2", "D1", "A3", "E5"]);
}

#[test]
fn test_output_is_deterministic_regardless_of_record_order() {
    let mut shuffled = chain_sheet();
    shuffled.reverse();

    let config = GeneratorConfig::default();
    let ctx = SheetContext::new("Chain", None);
    let first = compile_sheet(&chain_sheet(), &ctx).unwrap().generate(&config);
    let second = compile_sheet(&shuffled, &ctx).unwrap().generate(&config);

    assert_eq!(first, second);
}

#[test]
fn test_every_input_reference_is_in_input_object() {
    let compiled = compile_sheet(&chain_sheet(), &SheetContext::new("Chain", None)).unwrap();
    let generated = compiled.generate(&GeneratorConfig::default());

    assert_eq!(generated.inputs, vec![addr("A1")]);
    for cell in &generated.order {
        assert!(!generated.inputs.contains(cell));
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// ERRORS
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_cycle_is_rejected_with_chain() {
    let records = vec![formula("A1", "=B1+1"), formula("B1", "=A1+1")];
    let err = compile_sheet(&records, &SheetContext::new("Loop", None)).unwrap_err();

    match err {
        ForgeError::CircularDependency { sheet, cycle } => {
            assert_eq!(sheet, "Loop");
            assert_eq!(cycle.first(), cycle.last());
            assert!(cycle.contains(&addr("A1")));
            assert!(cycle.contains(&addr("B1")));
        }
        other => panic!("expected CircularDependency, got {other:?}"),
    }
}

#[test]
fn test_self_reference_is_a_cycle() {
    let err = compile_sheet(&[formula("C2", "=C2*2")], &SheetContext::new("Self", None))
        .unwrap_err();
    assert!(err
        .to_string()
        .contains("Circular dependency detected in sheet 'Self': C2 -> C2"));
}

#[test]
fn test_unsupported_syntax_names_cell() {
    for text in ["=SUM(A1:A3)", "=A1:B2", "=Other!A1", "=rate*2"] {
        let records = vec![number("A1", 1.0), formula("B7", text)];
        let err = compile_sheet(&records, &SheetContext::new("Bad", None)).unwrap_err();
        match err {
            ForgeError::UnsupportedFormula { cell, .. } => assert_eq!(cell, addr("B7")),
            other => panic!("{text}: expected UnsupportedFormula, got {other:?}"),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// RANGE FILTERING
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_range_treats_outside_cells_as_inputs() {
    let records = vec![
        number("A1", 3.0),
        formula("B2", "=A1+C5"),
        formula("C5", "=A1*14").with_cached(CellValue::Number(42.0)),
    ];
    let range = CellRange::new(addr("A1"), addr("B2")).unwrap();
    let compiled = compile_sheet(&records, &SheetContext::new("Part", Some(range))).unwrap();
    let generated = compiled.generate(&GeneratorConfig::default());

    assert_eq!(generated.order, vec![addr("B2")]);
    assert!(generated
        .function_source
        .contains("computed[\"B2\"] = (d[\"A1\"] + d[\"C5\"]);"));
    assert_eq!(generated.input_object, "{\n    \"A1\": 3,\n    \"C5\": 42\n}");
}

#[test]
fn test_range_skips_broken_formulas_outside() {
    let records = vec![number("A1", 1.0), formula("B1", "=A1"), formula("Z9", "=SUM(A1:A2)")];
    let range = CellRange::new(addr("A1"), addr("C3")).unwrap();
    let compiled = compile_sheet(&records, &SheetContext::new("Part", Some(range))).unwrap();
    assert_eq!(compiled.order(), &[addr("B1")]);
}

// ═══════════════════════════════════════════════════════════════════════════
// EVALUATION
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_evaluation_reproduces_cached_values() {
    let records = budget_sheet();
    let compiled = compile_sheet(&records, &SheetContext::new("Sheet1", None)).unwrap();

    let values = evaluate(&compiled).unwrap();
    assert_eq!(values[&addr("B2")], CellValue::Number(20.0));
    assert_eq!(values[&addr("C3")], CellValue::Number(25.0));
    assert!(check_against_cached(&compiled, &records).unwrap().is_empty());
}

#[test]
fn test_evaluation_reports_stale_cache() {
    let records = vec![
        number("A1", 10.0),
        formula("B1", "=A1/4").with_cached(CellValue::Number(3.0)),
    ];
    let compiled = compile_sheet(&records, &SheetContext::new("Stale", None)).unwrap();
    let mismatches = check_against_cached(&compiled, &records).unwrap();

    assert_eq!(mismatches.len(), 1);
    assert_eq!(mismatches[0].cell, addr("B1"));
    assert_eq!(mismatches[0].actual, CellValue::Number(2.5));
}

// ═══════════════════════════════════════════════════════════════════════════
// MULTI-SHEET RUNS
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_failing_sheet_does_not_block_others() {
    let mut source = MemorySource::new()
        .with_sheet("Budget", budget_sheet())
        .with_sheet("Loop", vec![formula("A1", "=B1"), formula("B1", "=A1")])
        .with_sheet("Funcs", vec![formula("A1", "=SUM(1,2)")]);

    let outcomes = convert_workbook(&mut source, &ConvertOptions::default());
    let status: Vec<(&str, bool)> = outcomes
        .iter()
        .map(|o| (o.sheet.as_str(), o.is_ok()))
        .collect();

    assert_eq!(
        status,
        vec![("Budget", true), ("Loop", false), ("Funcs", false)]
    );
}
