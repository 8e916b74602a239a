use crate::types::CellAddress;
use thiserror::Error;

pub type ForgeResult<T> = Result<T, ForgeError>;

#[derive(Error, Debug)]
pub enum ForgeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Cannot read workbook '{path}': {reason}")]
    FileUnreadable { path: String, reason: String },

    #[error("Sheet not found: '{sheet}'")]
    SheetNotFound { sheet: String },

    #[error("Unsupported formula in {sheet}!{cell}: {reason} at '{fragment}'")]
    UnsupportedFormula {
        sheet: String,
        cell: CellAddress,
        fragment: String,
        reason: String,
    },

    #[error("Circular dependency detected in sheet '{sheet}': {}", format_cycle(.cycle))]
    CircularDependency {
        sheet: String,
        cycle: Vec<CellAddress>,
    },

    #[error("Invalid cell range: {0}")]
    InvalidRange(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Formula evaluation error: {0}")]
    Eval(String),

    #[error("{failed} of {total} sheet(s) could not be converted")]
    SheetsFailed { failed: usize, total: usize },
}

impl ForgeError {
    /// Name of the sheet this error is scoped to, if any.
    pub fn sheet(&self) -> Option<&str> {
        match self {
            ForgeError::SheetNotFound { sheet }
            | ForgeError::UnsupportedFormula { sheet, .. }
            | ForgeError::CircularDependency { sheet, .. } => Some(sheet),
            _ => None,
        }
    }
}

fn format_cycle(cycle: &[CellAddress]) -> String {
    cycle
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" -> ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_circular_dependency_message_lists_cycle() {
        let err = ForgeError::CircularDependency {
            sheet: "Model".to_string(),
            cycle: vec![
                CellAddress::new(1, 1),
                CellAddress::new(2, 1),
                CellAddress::new(1, 1),
            ],
        };
        assert_eq!(
            err.to_string(),
            "Circular dependency detected in sheet 'Model': A1 -> B1 -> A1"
        );
        assert_eq!(err.sheet(), Some("Model"));
    }

    #[test]
    fn test_unsupported_formula_names_cell() {
        let err = ForgeError::UnsupportedFormula {
            sheet: "Sheet1".to_string(),
            cell: CellAddress::new(3, 4),
            fragment: "SUM(".to_string(),
            reason: "function calls are not supported".to_string(),
        };
        let message = err.to_string();
        assert!(message.contains("Sheet1!C4"));
        assert!(message.contains("SUM("));
    }

    #[test]
    fn test_run_level_errors_have_no_sheet() {
        assert!(ForgeError::InvalidRange("A0".to_string()).sheet().is_none());
    }
}
