use crate::config::GeneratorConfig;
use crate::core::codegen::GeneratedSheet;
use crate::core::workbook::{convert_workbook, ConvertOptions, SheetOutcome};
use crate::error::{ForgeError, ForgeResult};
use crate::excel::WorkbookReader;
use crate::types::CellRange;
use colored::Colorize;
use std::fs;
use std::path::PathBuf;

/// Arguments of the convert command
#[derive(Debug, Clone, Default)]
pub struct ConvertArgs {
    pub file: PathBuf,
    /// Sheets to convert; empty means all sheets
    pub sheets: Vec<String>,
    pub min_cell: Option<String>,
    pub max_cell: Option<String>,
    pub include_test_code: bool,
    pub check: bool,
    pub json: bool,
    pub output: Option<PathBuf>,
    pub input_name: String,
    pub computed_name: String,
    pub verbose: bool,
}

/// Execute the convert command.
///
/// Generated code goes to stdout (or `--output`); progress, warnings and
/// per-sheet errors go to stderr. Returns an error if the run could not start
/// or any requested sheet failed.
pub fn convert(args: ConvertArgs) -> ForgeResult<()> {
    let range = CellRange::from_bounds(args.min_cell.as_deref(), args.max_cell.as_deref())?;
    let generator = GeneratorConfig::new(
        args.input_name.clone(),
        args.computed_name.clone(),
        args.include_test_code,
    )?;

    let sheets: Vec<String> = args
        .sheets
        .iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    if args.verbose {
        eprintln!("{}", "🔥 cellforge - Compiling formulas".bold().green());
        eprintln!("   File: {}", args.file.display());
        if let Some(range) = range {
            eprintln!("   Range: {}", range.to_string().bright_yellow());
        }
        eprintln!();
    }

    let mut reader = WorkbookReader::open(&args.file)?;
    let options = ConvertOptions {
        sheets: (!sheets.is_empty()).then_some(sheets),
        range,
        generator,
        check: args.check,
    };
    let outcomes = convert_workbook(&mut reader, &options);

    report(&outcomes, args.verbose);

    let rendered = if args.json {
        render_json(&outcomes)?
    } else {
        render_text(&outcomes)
    };

    match &args.output {
        Some(path) => {
            fs::write(path, rendered)?;
            if args.verbose {
                eprintln!("{} {}", "💾 Written:".cyan(), path.display());
            }
        }
        None => print!("{rendered}"),
    }

    let failed = outcomes.iter().filter(|o| !o.is_ok()).count();
    if failed > 0 {
        return Err(ForgeError::SheetsFailed {
            failed,
            total: outcomes.len(),
        });
    }
    Ok(())
}

fn generated(outcomes: &[SheetOutcome]) -> impl Iterator<Item = &GeneratedSheet> {
    outcomes
        .iter()
        .filter_map(|o| o.result.as_ref().ok())
        .map(|converted| &converted.generated)
}

/// Plain JavaScript output, one block per converted sheet
pub fn render_text(outcomes: &[SheetOutcome]) -> String {
    let mut out = String::new();

    for sheet in generated(outcomes) {
        out.push_str(&format!("// Code for sheet: {}\n", sheet.sheet));
        out.push_str(&sheet.function_source);
        out.push('\n');
        if let Some(test_code) = &sheet.test_code {
            out.push_str(&format!("\n\n{test_code}\n"));
        }
        out.push('\n');
    }

    out
}

/// JSON array of converted sheets
pub fn render_json(outcomes: &[SheetOutcome]) -> ForgeResult<String> {
    let sheets: Vec<&GeneratedSheet> = generated(outcomes).collect();
    Ok(serde_json::to_string_pretty(&sheets)? + "\n")
}

/// Per-sheet status on stderr
fn report(outcomes: &[SheetOutcome], verbose: bool) {
    for outcome in outcomes {
        let converted = match &outcome.result {
            Ok(converted) => converted,
            Err(e) => {
                eprintln!(
                    "{} {}",
                    format!("❌ Error processing sheet {}:", outcome.sheet).bold().red(),
                    e
                );
                continue;
            }
        };

        if verbose {
            eprintln!(
                "{} {} ({} formula cells, {} inputs)",
                "✅".green(),
                outcome.sheet.bright_blue().bold(),
                converted.generated.order.len(),
                converted.generated.inputs.len(),
            );
        }

        match &converted.check {
            None => {}
            Some(Ok(mismatches)) if mismatches.is_empty() => {
                eprintln!(
                    "{} {}: generated code reproduces cached values",
                    "✅".green(),
                    outcome.sheet.bright_blue()
                );
            }
            Some(Ok(mismatches)) => {
                for m in mismatches {
                    eprintln!(
                        "{} {}!{}: spreadsheet has {}, generated code yields {}",
                        "⚠️ ".yellow(),
                        outcome.sheet,
                        m.cell,
                        m.expected.to_string().bold(),
                        m.actual.to_string().bold()
                    );
                }
            }
            Some(Err(e)) => {
                eprintln!("{} {}", "⚠️  Check skipped:".yellow(), e);
            }
        }
    }
}
