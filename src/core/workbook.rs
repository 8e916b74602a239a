//! Multi-sheet driver
//!
//! Runs the per-sheet pipeline for every requested sheet. A failing sheet
//! never stops the others; each sheet gets its own outcome.

use super::codegen::GeneratedSheet;
use super::compiler::compile_sheet;
use super::evaluator::{check_against_cached, Mismatch};
use crate::config::GeneratorConfig;
use crate::error::{ForgeError, ForgeResult};
use crate::source::CellSource;
use crate::types::{CellRange, SheetContext};
use tracing::{info, warn};

/// Settings shared by every sheet of a run
#[derive(Debug, Clone, Default)]
pub struct ConvertOptions {
    /// Sheets to convert, in order; all sheets when None
    pub sheets: Option<Vec<String>>,
    pub range: Option<CellRange>,
    pub generator: GeneratorConfig,
    /// Evaluate each sheet and compare with cached results
    pub check: bool,
}

/// Successful conversion of one sheet
#[derive(Debug)]
pub struct ConvertedSheet {
    pub generated: GeneratedSheet,
    /// Present when checking was requested
    pub check: Option<ForgeResult<Vec<Mismatch>>>,
}

#[derive(Debug)]
pub struct SheetOutcome {
    pub sheet: String,
    pub result: ForgeResult<ConvertedSheet>,
}

impl SheetOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Convert every requested sheet of `source`
pub fn convert_workbook<S: CellSource>(
    source: &mut S,
    options: &ConvertOptions,
) -> Vec<SheetOutcome> {
    let available = source.sheet_names();
    let requested = options.sheets.clone().unwrap_or_else(|| available.clone());

    info!(
        sheets = requested.len(),
        range = ?options.range,
        "converting workbook"
    );

    requested
        .into_iter()
        .map(|sheet| {
            let result = if available.contains(&sheet) {
                convert_sheet(source, &sheet, options)
            } else {
                Err(ForgeError::SheetNotFound {
                    sheet: sheet.clone(),
                })
            };
            if let Err(e) = &result {
                warn!(sheet = %sheet, error = %e, "sheet skipped");
            }
            SheetOutcome { sheet, result }
        })
        .collect()
}

/// Read, compile and generate a single sheet
pub fn convert_sheet<S: CellSource>(
    source: &mut S,
    sheet: &str,
    options: &ConvertOptions,
) -> ForgeResult<ConvertedSheet> {
    let records = source.read_sheet(sheet)?;
    let ctx = SheetContext::new(sheet, options.range);

    let compiled = compile_sheet(&records, &ctx)?;
    let generated = compiled.generate(&options.generator);
    let check = options
        .check
        .then(|| check_against_cached(&compiled, &records));

    Ok(ConvertedSheet { generated, check })
}
