use clap::Parser;
use cellforge::cli::{self, ConvertArgs};
use cellforge::config::{DEFAULT_COMPUTED_NAME, DEFAULT_INPUT_NAME};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cellforge")]
#[command(about = "Compile spreadsheet formulas into a self-contained JavaScript function")]
#[command(long_about = "cellforge - spreadsheet formulas as JavaScript

Each sheet becomes one function that takes an object of input cell values
and returns an object of computed cell values. Formulas are emitted in
dependency order, so every cell is assigned after the cells it reads.

SUPPORTED FORMULAS:
  Numbers, strings, TRUE/FALSE, single-cell references (A1, $B$2)
  Operators: + - * / ^ = <> < <= > >= and unary minus/plus
  Functions, ranges and cross-sheet references are rejected per sheet.

EXAMPLES:
  cellforge model.xlsx                          # All sheets
  cellforge model.xlsx --sheet Inputs,Summary   # Selected sheets
  cellforge model.xlsx --min-cell B2 --max-cell D20
  cellforge model.xlsx --include-test-code -o model.js
  cellforge model.xlsx --check                  # Compare with cached results")]
#[command(version)]
struct Cli {
    /// Workbook to convert (.xlsx, .xlsm, .xls, .ods)
    file: PathBuf,

    /// Sheets to convert, comma separated (default: all sheets)
    #[arg(short, long = "sheet", value_delimiter = ',')]
    sheets: Vec<String>,

    /// Top-left cell of the region to compile (e.g. B2)
    #[arg(long, alias = "min_cell")]
    min_cell: Option<String>,

    /// Bottom-right cell of the region to compile (e.g. D20)
    #[arg(long, alias = "max_cell")]
    max_cell: Option<String>,

    /// Append the input object and a console.log call to each function
    #[arg(short = 't', long)]
    include_test_code: bool,

    /// Evaluate the compiled formulas and compare with the workbook's cached results
    #[arg(long)]
    check: bool,

    /// Emit a JSON array instead of JavaScript source
    #[arg(long)]
    json: bool,

    /// Write output to a file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Name of the input object parameter
    #[arg(long, env = "CELLFORGE_INPUT_NAME", default_value = DEFAULT_INPUT_NAME)]
    input_name: String,

    /// Name of the object holding computed values
    #[arg(long, env = "CELLFORGE_COMPUTED_NAME", default_value = DEFAULT_COMPUTED_NAME)]
    computed_name: String,

    /// Show progress and per-sheet details
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    let default_filter = if args.verbose {
        "cellforge=debug"
    } else {
        "cellforge=error"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    cli::convert(ConvertArgs {
        file: args.file,
        sheets: args.sheets,
        min_cell: args.min_cell,
        max_cell: args.max_cell,
        include_test_code: args.include_test_code,
        check: args.check,
        json: args.json,
        output: args.output,
        input_name: args.input_name,
        computed_name: args.computed_name,
        verbose: args.verbose,
    })?;

    Ok(())
}
