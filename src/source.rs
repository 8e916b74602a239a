//! Cell sources
//!
//! The pipeline reads cells through [`CellSource`], so the compiler does not
//! care whether records come from a workbook on disk or from memory.

use crate::error::{ForgeError, ForgeResult};
use crate::types::CellRecord;

/// Anything that can list sheets and hand out their cell records
pub trait CellSource {
    /// Sheet names in workbook order
    fn sheet_names(&self) -> Vec<String>;

    /// Every non-empty cell of a sheet, fully materialized
    fn read_sheet(&mut self, sheet: &str) -> ForgeResult<Vec<CellRecord>>;
}

/// In-memory cell source
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    sheets: Vec<(String, Vec<CellRecord>)>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sheet, replacing any sheet with the same name
    pub fn with_sheet(mut self, name: impl Into<String>, records: Vec<CellRecord>) -> Self {
        let name = name.into();
        self.sheets.retain(|(existing, _)| *existing != name);
        self.sheets.push((name, records));
        self
    }
}

impl CellSource for MemorySource {
    fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|(name, _)| name.clone()).collect()
    }

    fn read_sheet(&mut self, sheet: &str) -> ForgeResult<Vec<CellRecord>> {
        self.sheets
            .iter()
            .find(|(name, _)| name == sheet)
            .map(|(_, records)| records.clone())
            .ok_or_else(|| ForgeError::SheetNotFound {
                sheet: sheet.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CellAddress, CellValue};

    #[test]
    fn test_memory_source() {
        let mut source = MemorySource::new()
            .with_sheet("One", vec![])
            .with_sheet(
                "Two",
                vec![CellRecord::literal(
                    CellAddress::new(1, 1),
                    CellValue::Number(1.0),
                )],
            );

        assert_eq!(source.sheet_names(), vec!["One", "Two"]);
        assert_eq!(source.read_sheet("Two").unwrap().len(), 1);
        assert!(matches!(
            source.read_sheet("Three"),
            Err(ForgeError::SheetNotFound { .. })
        ));
    }
}
