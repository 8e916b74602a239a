use crate::error::{ForgeError, ForgeResult};
use regex::Regex;
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

/// Largest column index a worksheet can hold (`XFD`).
pub const MAX_COLUMN: u32 = 16_384;
/// Largest row number a worksheet can hold.
pub const MAX_ROW: u32 = 1_048_576;

static A1_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\$?(?<letters>[A-Za-z]{1,3})\$?(?<digits>[0-9]+)$").expect("valid A1 pattern")
});

//==============================================================================
// Cell Addresses
//==============================================================================

/// A single cell on the active sheet, 1-based on both axes.
///
/// Field order gives the derived `Ord` row-major ordering (row, then column),
/// which is what every deterministic ordering in the pipeline relies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellAddress {
    pub row: u32,
    pub column: u32,
}

impl CellAddress {
    /// Create an address from a 1-based column and row
    pub fn new(column: u32, row: u32) -> Self {
        Self { row, column }
    }

    /// Parse `A1` notation, ignoring `$` absolute markers.
    /// Returns None for anything that is not a single in-bounds cell.
    pub fn parse(text: &str) -> Option<Self> {
        let caps = A1_PATTERN.captures(text)?;
        let column = letters_to_column(&caps["letters"])?;
        let row = caps["digits"].parse::<u32>().ok()?;
        if row == 0 || row > MAX_ROW {
            return None;
        }
        Some(Self::new(column, row))
    }

    /// Convert a 1-based column index to letters (1→A, 26→Z, 27→AA)
    pub fn column_letters(column: u32) -> String {
        let mut result = String::new();
        let mut n = column;

        while n > 0 {
            let remainder = (n - 1) % 26;
            result.insert(0, (b'A' + remainder as u8) as char);
            n = (n - 1) / 26;
        }

        result
    }
}

fn letters_to_column(letters: &str) -> Option<u32> {
    let mut column = 0u32;
    for byte in letters.to_ascii_uppercase().bytes() {
        column = column * 26 + u32::from(byte - b'A') + 1;
    }
    (column <= MAX_COLUMN).then_some(column)
}

impl fmt::Display for CellAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", Self::column_letters(self.column), self.row)
    }
}

impl FromStr for CellAddress {
    type Err = ForgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s.trim())
            .ok_or_else(|| ForgeError::InvalidRange(format!("'{s}' is not a cell address")))
    }
}

impl Serialize for CellAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

//==============================================================================
// Cell Values and Records
//==============================================================================

/// A literal cell value as reported by the cell source
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Number(f64),
    Text(String),
    Bool(bool),
    #[default]
    Empty,
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Number(n) => write!(f, "{n}"),
            CellValue::Text(s) => write!(f, "{s}"),
            CellValue::Bool(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
            CellValue::Empty => Ok(()),
        }
    }
}

/// One cell as read from a sheet.
///
/// For formula cells `value` holds the cached result stored in the file.
#[derive(Debug, Clone, PartialEq)]
pub struct CellRecord {
    pub address: CellAddress,
    pub formula: Option<String>,
    pub value: CellValue,
}

impl CellRecord {
    /// A plain value cell
    pub fn literal(address: CellAddress, value: CellValue) -> Self {
        Self {
            address,
            formula: None,
            value,
        }
    }

    /// A formula cell with no cached result
    pub fn formula(address: CellAddress, formula: impl Into<String>) -> Self {
        Self {
            address,
            formula: Some(formula.into()),
            value: CellValue::Empty,
        }
    }

    /// Attach the cached result of a formula cell
    pub fn with_cached(mut self, value: CellValue) -> Self {
        self.value = value;
        self
    }

    pub fn is_formula(&self) -> bool {
        self.formula.is_some()
    }
}

//==============================================================================
// Ranges and Per-Run Context
//==============================================================================

/// Inclusive rectangular region of a sheet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRange {
    pub min: CellAddress,
    pub max: CellAddress,
}

impl CellRange {
    pub fn new(min: CellAddress, max: CellAddress) -> ForgeResult<Self> {
        if min.column > max.column || min.row > max.row {
            return Err(ForgeError::InvalidRange(format!(
                "minimum cell {min} is after maximum cell {max}"
            )));
        }
        Ok(Self { min, max })
    }

    /// Build a range from optional textual bounds, defaulting the missing
    /// side to the sheet edge. Returns None when neither bound is given.
    pub fn from_bounds(min: Option<&str>, max: Option<&str>) -> ForgeResult<Option<Self>> {
        if min.is_none() && max.is_none() {
            return Ok(None);
        }
        let min = match min {
            Some(text) => text.parse()?,
            None => CellAddress::new(1, 1),
        };
        let max = match max {
            Some(text) => text.parse()?,
            None => CellAddress::new(MAX_COLUMN, MAX_ROW),
        };
        Self::new(min, max).map(Some)
    }

    pub fn contains(&self, address: &CellAddress) -> bool {
        (self.min.column..=self.max.column).contains(&address.column)
            && (self.min.row..=self.max.row).contains(&address.row)
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.min, self.max)
    }
}

/// Per-sheet state threaded through every pipeline stage
#[derive(Debug, Clone, Copy)]
pub struct SheetContext<'a> {
    pub sheet: &'a str,
    pub range: Option<CellRange>,
}

impl<'a> SheetContext<'a> {
    pub fn new(sheet: &'a str, range: Option<CellRange>) -> Self {
        Self { sheet, range }
    }

    /// Whether an address belongs to the processed region
    pub fn in_region(&self, address: &CellAddress) -> bool {
        self.range.is_none_or(|range| range.contains(address))
    }
}
