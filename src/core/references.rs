//! Cell reference collection over formula ASTs

use super::parser::Expr;
use crate::types::CellAddress;
use std::collections::BTreeSet;

/// Distinct cells read anywhere in the expression
pub fn references(expr: &Expr) -> BTreeSet<CellAddress> {
    let mut found = BTreeSet::new();
    collect(expr, &mut found);
    found
}

fn collect(expr: &Expr, found: &mut BTreeSet<CellAddress>) {
    match expr {
        Expr::Literal(_) => {}
        Expr::CellRef(address) => {
            found.insert(*address);
        }
        Expr::Unary { operand, .. } => collect(operand, found),
        Expr::Binary { left, right, .. } => {
            collect(left, found);
            collect(right, found);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::parser::parse_formula;

    fn refs(formula: &str) -> Vec<String> {
        references(&parse_formula(formula).unwrap())
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    #[test]
    fn test_no_references() {
        assert!(refs("=1 + 2 * 3").is_empty());
    }

    #[test]
    fn test_nested_references() {
        assert_eq!(refs("=(A1 + B2) * -(C3 / 2)"), vec!["A1", "B2", "C3"]);
    }

    #[test]
    fn test_duplicates_collapse() {
        assert_eq!(refs("=A1 * A1 + $A$1"), vec!["A1"]);
    }
}
