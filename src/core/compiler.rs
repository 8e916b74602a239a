//! Per-sheet compilation pipeline
//!
//! Records → parsed formulas → dependency graph → computation order → input
//! set. A sheet either compiles completely or fails with the first error;
//! nothing partial is returned.

use super::codegen::{CodeGenerator, GeneratedSheet};
use super::graph::DependencyGraph;
use super::parser::{parse_formula, Expr};
use super::references::references;
use crate::config::GeneratorConfig;
use crate::error::{ForgeError, ForgeResult};
use crate::types::{CellAddress, CellRecord, CellValue, SheetContext};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info};

/// Everything the code generator needs for one sheet
#[derive(Debug, Clone)]
pub struct CompiledSheet {
    sheet: String,
    formulas: BTreeMap<CellAddress, Expr>,
    graph: DependencyGraph,
    order: Vec<CellAddress>,
    inputs: BTreeMap<CellAddress, CellValue>,
}

impl CompiledSheet {
    pub fn sheet(&self) -> &str {
        &self.sheet
    }

    /// Parsed formula of a region formula cell
    pub fn formula(&self, cell: &CellAddress) -> Option<&Expr> {
        self.formulas.get(cell)
    }

    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    /// Formula cells in dependency-respecting order
    pub fn order(&self) -> &[CellAddress] {
        &self.order
    }

    /// Non-computed cells the formulas read, with their source values
    pub fn inputs(&self) -> &BTreeMap<CellAddress, CellValue> {
        &self.inputs
    }

    /// Render the sheet as JavaScript
    pub fn generate(&self, config: &GeneratorConfig) -> GeneratedSheet {
        CodeGenerator::new(config).generate(self)
    }
}

/// Compile the formula cells of one sheet.
///
/// `records` may cover the whole sheet: only cells inside the context's
/// region become formulas to compute, while cells outside it still supply
/// values for the inputs they are read as.
pub fn compile_sheet(records: &[CellRecord], ctx: &SheetContext) -> ForgeResult<CompiledSheet> {
    let formulas = parse_region(records, ctx)?;
    debug!(sheet = ctx.sheet, formulas = formulas.len(), "parsed formulas");

    let graph = DependencyGraph::build(&formulas, ctx);
    let order = graph.computation_order(ctx)?;
    let inputs = collect_inputs(records, &formulas, &graph);

    info!(
        sheet = ctx.sheet,
        formulas = order.len(),
        inputs = inputs.len(),
        "compiled sheet"
    );

    Ok(CompiledSheet {
        sheet: ctx.sheet.to_string(),
        formulas,
        graph,
        order,
        inputs,
    })
}

/// Parse every formula cell inside the region, in row-major order
fn parse_region(
    records: &[CellRecord],
    ctx: &SheetContext,
) -> ForgeResult<BTreeMap<CellAddress, Expr>> {
    let mut sources: Vec<(&CellAddress, &str)> = records
        .iter()
        .filter(|record| ctx.in_region(&record.address))
        .filter_map(|record| Some((&record.address, record.formula.as_deref()?)))
        .collect();
    sources.sort_by_key(|(address, _)| **address);

    sources
        .into_iter()
        .map(|(address, formula)| {
            parse_formula(formula)
                .map(|expr| (*address, expr))
                .map_err(|e| ForgeError::UnsupportedFormula {
                    sheet: ctx.sheet.to_string(),
                    cell: *address,
                    fragment: e.fragment,
                    reason: e.message,
                })
        })
        .collect()
}

/// Every referenced cell that is not computed here, paired with the value
/// the source holds for it (empty when the sheet has no such cell)
fn collect_inputs(
    records: &[CellRecord],
    formulas: &BTreeMap<CellAddress, Expr>,
    graph: &DependencyGraph,
) -> BTreeMap<CellAddress, CellValue> {
    let values: HashMap<&CellAddress, &CellValue> = records
        .iter()
        .map(|record| (&record.address, &record.value))
        .collect();

    formulas
        .values()
        .flat_map(references)
        .filter(|cell| !graph.contains(cell))
        .map(|cell| {
            let value = values.get(&cell).map(|v| (*v).clone()).unwrap_or_default();
            (cell, value)
        })
        .collect()
}
