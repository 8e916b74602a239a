//! cellforge - spreadsheet formulas compiled to JavaScript
//!
//! Reads the formula cells of a sheet, orders them by their dependencies and
//! emits a self-contained JavaScript function that recomputes them from an
//! object of input values.
//!
//! # Features
//!
//! - Arithmetic and comparison formulas over single-cell references
//! - Deterministic computation order (row-major tie-break)
//! - Cycle detection with the offending cell chain in the error
//! - Optional cell range restricting which formulas are compiled
//! - Workbook import via calamine (.xlsx, .xlsm, .xls, .ods)
//!
//! # Example
//!
//! ```
//! use cellforge::config::GeneratorConfig;
//! use cellforge::core::compile_sheet;
//! use cellforge::{CellAddress, CellRecord, CellValue, SheetContext};
//!
//! let a1 = CellAddress::new(1, 1);
//! let b1 = CellAddress::new(2, 1);
//! let records = vec![
//!     CellRecord::literal(a1, CellValue::Number(10.0)),
//!     CellRecord::formula(b1, "=A1*2"),
//! ];
//!
//! let compiled = compile_sheet(&records, &SheetContext::new("Sheet1", None))?;
//! let generated = compiled.generate(&GeneratorConfig::default());
//!
//! assert!(generated
//!     .function_source
//!     .contains("computed[\"B1\"] = (d[\"A1\"] * 2);"));
//! # Ok::<(), cellforge::ForgeError>(())
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod excel;
pub mod source;
pub mod types;

// Re-export commonly used types
pub use error::{ForgeError, ForgeResult};
pub use types::{CellAddress, CellRange, CellRecord, CellValue, SheetContext};
