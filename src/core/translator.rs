//! Formula AST → JavaScript expression translation

use super::graph::DependencyGraph;
use super::parser::{BinaryOperator, Expr, UnaryOperator};
use crate::config::GeneratorConfig;
use crate::types::{CellAddress, CellValue};

/// Render a cell value as a JavaScript literal
pub fn js_literal(value: &CellValue) -> String {
    match value {
        CellValue::Number(n) if n.is_nan() => "NaN".to_string(),
        CellValue::Number(n) if n.is_infinite() => {
            if *n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
        }
        CellValue::Number(n) => format!("{n}"),
        CellValue::Text(s) => serde_json::Value::String(s.clone()).to_string(),
        CellValue::Bool(b) => b.to_string(),
        CellValue::Empty => "null".to_string(),
    }
}

fn js_operator(op: BinaryOperator) -> &'static str {
    match op {
        BinaryOperator::Add => "+",
        BinaryOperator::Subtract => "-",
        BinaryOperator::Multiply => "*",
        BinaryOperator::Divide => "/",
        BinaryOperator::Power => "**",
        BinaryOperator::Equal => "===",
        BinaryOperator::NotEqual => "!==",
        BinaryOperator::Less => "<",
        BinaryOperator::Greater => ">",
        BinaryOperator::LessEqual => "<=",
        BinaryOperator::GreaterEqual => ">=",
    }
}

/// Translates formula ASTs of one sheet into JavaScript expressions
pub struct ExpressionTranslator<'a> {
    graph: &'a DependencyGraph,
    config: &'a GeneratorConfig,
}

impl<'a> ExpressionTranslator<'a> {
    /// Cells present in `graph` read from the computed container,
    /// everything else from the input container.
    pub fn new(graph: &'a DependencyGraph, config: &'a GeneratorConfig) -> Self {
        Self { graph, config }
    }

    /// Container access for one cell, e.g. `d["A1"]`
    pub fn cell_access(&self, address: &CellAddress) -> String {
        let container = if self.graph.contains(address) {
            &self.config.computed_name
        } else {
            &self.config.input_name
        };
        format!("{container}[\"{address}\"]")
    }

    /// Translate an expression. Every operation is parenthesized so the
    /// spreadsheet's evaluation order survives JavaScript precedence.
    pub fn translate(&self, expr: &Expr) -> String {
        match expr {
            Expr::Literal(value) => js_literal(value),
            Expr::CellRef(address) => self.cell_access(address),
            Expr::Unary { op, operand } => {
                let sign = match op {
                    UnaryOperator::Negate => "-",
                    UnaryOperator::Plus => "+",
                };
                format!("({sign}{})", self.translate(operand))
            }
            Expr::Binary { op, left, right } => format!(
                "({} {} {})",
                self.translate(left),
                js_operator(*op),
                self.translate(right)
            ),
        }
    }
}
