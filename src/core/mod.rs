//! Formula compiler: parsing, dependency ordering and JavaScript generation

pub mod codegen;
pub mod compiler;
pub mod evaluator;
pub mod graph;
pub mod parser;
pub mod references;
pub mod tokenizer;
pub mod translator;
pub mod workbook;

pub use codegen::{CodeGenerator, GeneratedSheet};
pub use compiler::{compile_sheet, CompiledSheet};
pub use graph::DependencyGraph;
pub use parser::{parse_formula, Expr};
pub use workbook::{convert_workbook, ConvertOptions, ConvertedSheet, SheetOutcome};
