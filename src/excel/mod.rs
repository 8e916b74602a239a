//! Spreadsheet file access
//!
//! Reads workbooks through calamine and exposes them as a [`CellSource`].
//!
//! [`CellSource`]: crate::source::CellSource

mod reader;

pub use reader::WorkbookReader;
