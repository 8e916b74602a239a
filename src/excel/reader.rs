//! Workbook reader - spreadsheet file → cell records

use crate::error::{ForgeError, ForgeResult};
use crate::source::CellSource;
use crate::types::{CellAddress, CellRecord, CellValue};
use calamine::{open_workbook_auto, Data, Range, Reader, Sheets};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Cell source backed by a workbook on disk (.xlsx, .xlsm, .xls, .ods)
pub struct WorkbookReader {
    path: PathBuf,
    workbook: Sheets<BufReader<File>>,
}

impl WorkbookReader {
    /// Open a workbook; fails with `FileUnreadable` if it cannot be parsed
    pub fn open<P: AsRef<Path>>(path: P) -> ForgeResult<Self> {
        let path = path.as_ref().to_path_buf();
        let workbook = open_workbook_auto(&path).map_err(|e| ForgeError::FileUnreadable {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self { path, workbook })
    }

    fn unreadable(&self, sheet: &str, reason: impl std::fmt::Display) -> ForgeError {
        ForgeError::FileUnreadable {
            path: self.path.display().to_string(),
            reason: format!("sheet '{sheet}': {reason}"),
        }
    }
}

impl CellSource for WorkbookReader {
    fn sheet_names(&self) -> Vec<String> {
        self.workbook.sheet_names()
    }

    fn read_sheet(&mut self, sheet: &str) -> ForgeResult<Vec<CellRecord>> {
        if !self.workbook.sheet_names().iter().any(|name| name == sheet) {
            return Err(ForgeError::SheetNotFound {
                sheet: sheet.to_string(),
            });
        }

        let values = self
            .workbook
            .worksheet_range(sheet)
            .map_err(|e| self.unreadable(sheet, e))?;
        let formulas = self
            .workbook
            .worksheet_formula(sheet)
            .map_err(|e| self.unreadable(sheet, e))?;

        let records = merge_cells(&values, &formulas);
        debug!(sheet, cells = records.len(), "read sheet");
        Ok(records)
    }
}

/// Combine cached values and formula text into one record per cell,
/// in row-major order
fn merge_cells(values: &Range<Data>, formulas: &Range<String>) -> Vec<CellRecord> {
    let mut cells: BTreeMap<CellAddress, CellRecord> = BTreeMap::new();

    let (row0, col0) = values.start().unwrap_or((0, 0));
    for (row, col, data) in values.used_cells() {
        let address = absolute_address(row0, col0, row, col);
        cells.insert(address, CellRecord::literal(address, convert_data(data)));
    }

    let (row0, col0) = formulas.start().unwrap_or((0, 0));
    for (row, col, formula) in formulas.used_cells() {
        if formula.trim().is_empty() {
            continue;
        }
        let address = absolute_address(row0, col0, row, col);
        let cached = cells
            .remove(&address)
            .map(|record| record.value)
            .unwrap_or_default();
        cells.insert(
            address,
            CellRecord::formula(address, formula.clone()).with_cached(cached),
        );
    }

    cells.into_values().collect()
}

/// Ranges report positions relative to their 0-based start cell
fn absolute_address(row0: u32, col0: u32, row: usize, col: usize) -> CellAddress {
    CellAddress::new(col0 + col as u32 + 1, row0 + row as u32 + 1)
}

/// Convert a calamine cell to a tagged cell value
fn convert_data(data: &Data) -> CellValue {
    match data {
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Float(f) => CellValue::Number(*f),
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Bool(b) => CellValue::Bool(*b),
        // Dates are serial numbers to formulas
        Data::DateTime(dt) => CellValue::Number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
        Data::Error(e) => CellValue::Text(e.to_string()),
        Data::Empty => CellValue::Empty,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_data() {
        assert_eq!(convert_data(&Data::Int(3)), CellValue::Number(3.0));
        assert_eq!(convert_data(&Data::Float(2.5)), CellValue::Number(2.5));
        assert_eq!(
            convert_data(&Data::String("x".to_string())),
            CellValue::Text("x".to_string())
        );
        assert_eq!(convert_data(&Data::Bool(true)), CellValue::Bool(true));
        assert_eq!(convert_data(&Data::Empty), CellValue::Empty);
    }

    #[test]
    fn test_absolute_address() {
        assert_eq!(absolute_address(0, 0, 0, 0), CellAddress::new(1, 1));
        assert_eq!(absolute_address(1, 2, 3, 0), CellAddress::new(3, 5));
    }

    #[test]
    fn test_merge_cells_attaches_cached_values() {
        let mut values: Range<Data> = Range::new((0, 0), (1, 1));
        values.set_value((0, 0), Data::Float(10.0));
        values.set_value((1, 1), Data::Float(20.0));

        let mut formulas: Range<String> = Range::new((1, 1), (1, 1));
        formulas.set_value((1, 1), "A1*2".to_string());

        let records = merge_cells(&values, &formulas);
        assert_eq!(
            records,
            vec![
                CellRecord::literal(CellAddress::new(1, 1), CellValue::Number(10.0)),
                CellRecord::formula(CellAddress::new(2, 2), "A1*2")
                    .with_cached(CellValue::Number(20.0)),
            ]
        );
    }

    #[test]
    fn test_open_missing_file_is_unreadable() {
        let err = WorkbookReader::open("does-not-exist.xlsx").err().unwrap();
        assert!(matches!(err, ForgeError::FileUnreadable { .. }));
    }
}
