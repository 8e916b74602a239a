//! Reference evaluator
//!
//! Executes a compiled sheet in-process with the same semantics as the
//! generated JavaScript, so results can be compared against the values the
//! spreadsheet application cached in the file.

use super::compiler::CompiledSheet;
use super::parser::{BinaryOperator, Expr, UnaryOperator};
use crate::error::{ForgeError, ForgeResult};
use crate::types::{CellAddress, CellRecord, CellValue};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

const RELATIVE_TOLERANCE: f64 = 1e-9;
const ABSOLUTE_TOLERANCE: f64 = 1e-9;

/// A formula cell whose evaluated value disagrees with the cached one
#[derive(Debug, Clone, PartialEq)]
pub struct Mismatch {
    pub cell: CellAddress,
    pub expected: CellValue,
    pub actual: CellValue,
}

/// Evaluate every formula cell of the sheet in computation order
pub fn evaluate(compiled: &CompiledSheet) -> ForgeResult<BTreeMap<CellAddress, CellValue>> {
    let mut computed = BTreeMap::new();

    for cell in compiled.order() {
        let Some(expr) = compiled.formula(cell) else {
            continue;
        };
        let value = Evaluator {
            inputs: compiled.inputs(),
            computed: &computed,
        }
        .eval(expr)
        .map_err(|e| ForgeError::Eval(format!("{}!{cell}: {e}", compiled.sheet())))?;
        computed.insert(*cell, value);
    }

    Ok(computed)
}

/// Compare evaluated results with the cached values in `records`.
///
/// Formula cells without a cached value are skipped.
pub fn check_against_cached(
    compiled: &CompiledSheet,
    records: &[CellRecord],
) -> ForgeResult<Vec<Mismatch>> {
    let computed = evaluate(compiled)?;
    let cached: HashMap<&CellAddress, &CellValue> = records
        .iter()
        .filter(|record| record.is_formula())
        .map(|record| (&record.address, &record.value))
        .collect();

    let mismatches: Vec<Mismatch> = computed
        .into_iter()
        .filter_map(|(cell, actual)| {
            let expected = cached.get(&cell)?;
            if expected.is_empty() || values_match(expected, &actual) {
                return None;
            }
            Some(Mismatch {
                cell,
                expected: (*expected).clone(),
                actual,
            })
        })
        .collect();

    debug!(
        sheet = compiled.sheet(),
        mismatches = mismatches.len(),
        "checked against cached values"
    );
    Ok(mismatches)
}

/// Equality with floating-point tolerance for numbers
pub fn values_match(expected: &CellValue, actual: &CellValue) -> bool {
    match (expected, actual) {
        (CellValue::Number(a), CellValue::Number(b)) => {
            let diff = (a - b).abs();
            diff <= ABSOLUTE_TOLERANCE || diff <= RELATIVE_TOLERANCE * a.abs().max(b.abs())
        }
        _ => expected == actual,
    }
}

struct Evaluator<'a> {
    inputs: &'a BTreeMap<CellAddress, CellValue>,
    computed: &'a BTreeMap<CellAddress, CellValue>,
}

impl Evaluator<'_> {
    fn eval(&self, expr: &Expr) -> Result<CellValue, String> {
        match expr {
            Expr::Literal(value) => Ok(value.clone()),
            Expr::CellRef(address) => Ok(self
                .computed
                .get(address)
                .or_else(|| self.inputs.get(address))
                .cloned()
                .unwrap_or_default()),
            Expr::Unary { op, operand } => {
                let n = to_number(&self.eval(operand)?)?;
                Ok(CellValue::Number(match op {
                    UnaryOperator::Negate => -n,
                    UnaryOperator::Plus => n,
                }))
            }
            Expr::Binary { op, left, right } => {
                let left = self.eval(left)?;
                let right = self.eval(right)?;
                if op.is_comparison() {
                    Ok(CellValue::Bool(compare(*op, &left, &right)))
                } else {
                    arithmetic(*op, &left, &right)
                }
            }
        }
    }
}

fn to_number(value: &CellValue) -> Result<f64, String> {
    match value {
        CellValue::Number(n) => Ok(*n),
        CellValue::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
        CellValue::Empty => Ok(0.0),
        CellValue::Text(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| format!("cannot use text \"{s}\" as a number")),
    }
}

fn arithmetic(op: BinaryOperator, left: &CellValue, right: &CellValue) -> Result<CellValue, String> {
    // JavaScript '+' concatenates when either side is a string
    if op == BinaryOperator::Add {
        if let (CellValue::Text(_), _) | (_, CellValue::Text(_)) = (left, right) {
            return Ok(CellValue::Text(format!(
                "{}{}",
                js_string(left),
                js_string(right)
            )));
        }
    }

    let a = to_number(left)?;
    let b = to_number(right)?;
    let n = match op {
        BinaryOperator::Add => a + b,
        BinaryOperator::Subtract => a - b,
        BinaryOperator::Multiply => a * b,
        BinaryOperator::Divide => a / b,
        BinaryOperator::Power => a.powf(b),
        _ => return Err(format!("'{}' is not an arithmetic operator", op.symbol())),
    };
    Ok(CellValue::Number(n))
}

fn js_string(value: &CellValue) -> String {
    match value {
        CellValue::Empty => "null".to_string(),
        CellValue::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

/// `=` and `<>` are strict; relational operators compare two texts as
/// strings and coerce anything else to a number, as JavaScript does
fn compare(op: BinaryOperator, left: &CellValue, right: &CellValue) -> bool {
    let ordering = match (op, left, right) {
        (BinaryOperator::Equal | BinaryOperator::NotEqual, _, _) => match (left, right) {
            (CellValue::Number(a), CellValue::Number(b)) => a.partial_cmp(b),
            (CellValue::Text(a), CellValue::Text(b)) => Some(a.cmp(b)),
            (CellValue::Bool(a), CellValue::Bool(b)) => Some(a.cmp(b)),
            (CellValue::Empty, CellValue::Empty) => Some(Ordering::Equal),
            _ => None,
        },
        (_, CellValue::Text(a), CellValue::Text(b)) => Some(a.cmp(b)),
        _ => js_number(left).partial_cmp(&js_number(right)),
    };

    match op {
        BinaryOperator::Equal => ordering == Some(Ordering::Equal),
        BinaryOperator::NotEqual => ordering != Some(Ordering::Equal),
        BinaryOperator::Less => ordering == Some(Ordering::Less),
        BinaryOperator::Greater => ordering == Some(Ordering::Greater),
        BinaryOperator::LessEqual => matches!(ordering, Some(Ordering::Less | Ordering::Equal)),
        BinaryOperator::GreaterEqual => {
            matches!(ordering, Some(Ordering::Greater | Ordering::Equal))
        }
        _ => false,
    }
}

/// JavaScript ToNumber; unparsable text is NaN
fn js_number(value: &CellValue) -> f64 {
    match value {
        CellValue::Number(n) => *n,
        CellValue::Bool(b) => f64::from(u8::from(*b)),
        CellValue::Empty => 0.0,
        CellValue::Text(s) => {
            let text = s.trim();
            match text {
                "" => 0.0,
                "Infinity" | "+Infinity" => f64::INFINITY,
                "-Infinity" => f64::NEG_INFINITY,
                // Rust also accepts "inf" and "nan"
                _ if text.chars().any(|c| c.is_alphabetic() && c != 'e' && c != 'E') => f64::NAN,
                _ => text.parse().unwrap_or(f64::NAN),
            }
        }
    }
}
