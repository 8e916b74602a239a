//! JavaScript code assembly
//!
//! Turns a compiled sheet into three pieces of source text: the function
//! body, the literal input object it expects, and (optionally) a snippet that
//! calls the function with that object.

use super::compiler::CompiledSheet;
use super::translator::{js_literal, ExpressionTranslator};
use crate::config::{GeneratorConfig, RESERVED_WORDS};
use crate::types::{CellAddress, CellValue};
use serde::Serialize;
use std::collections::BTreeMap;

const INDENT: &str = "    ";
const FALLBACK_FUNCTION_NAME: &str = "excelFunction";

/// Generated JavaScript for one sheet
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneratedSheet {
    pub sheet: String,
    pub function_name: String,
    pub function_source: String,
    pub input_object: String,
    /// Formula cells in the order they are assigned
    pub order: Vec<CellAddress>,
    /// Cells the function reads from its input object
    pub inputs: Vec<CellAddress>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_code: Option<String>,
}

/// Make a sheet title usable as a JavaScript function name.
///
/// Characters outside `[A-Za-z0-9_$]` are dropped. A leading digit or a
/// reserved word gets an underscore prefix.
pub fn sanitize_function_name(sheet: &str) -> String {
    let sanitized: String = sheet
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '$')
        .collect();

    if sanitized.is_empty() {
        return FALLBACK_FUNCTION_NAME.to_string();
    }
    if sanitized.starts_with(|c: char| c.is_ascii_digit())
        || RESERVED_WORDS.contains(&sanitized.as_str())
    {
        return format!("_{sanitized}");
    }
    sanitized
}

/// Object literal holding every input value, one entry per line
pub fn input_object(inputs: &BTreeMap<CellAddress, CellValue>) -> String {
    if inputs.is_empty() {
        return "{}".to_string();
    }

    let entries: Vec<String> = inputs
        .iter()
        .map(|(address, value)| format!("{INDENT}\"{address}\": {}", js_literal(value)))
        .collect();

    format!("{{\n{}\n}}", entries.join(",\n"))
}

/// Declaration of the input object plus a call that prints the result
pub fn test_code(function_name: &str, input_object: &str) -> String {
    format!(
        "const {function_name}_args = {input_object};\n\n\
         console.log(\"Output for {function_name}: \", {function_name}({function_name}_args));"
    )
}

/// Assembles the generated function for a compiled sheet
pub struct CodeGenerator<'a> {
    config: &'a GeneratorConfig,
}

impl<'a> CodeGenerator<'a> {
    pub fn new(config: &'a GeneratorConfig) -> Self {
        Self { config }
    }

    pub fn generate(&self, compiled: &CompiledSheet) -> GeneratedSheet {
        let function_name = sanitize_function_name(compiled.sheet());
        let translator = ExpressionTranslator::new(compiled.graph(), self.config);

        let assignments: Vec<(CellAddress, String)> = compiled
            .order()
            .iter()
            .filter_map(|cell| {
                compiled
                    .formula(cell)
                    .map(|expr| (*cell, translator.translate(expr)))
            })
            .collect();

        let function_source = self.function_source(&function_name, &assignments);
        let input_object = input_object(compiled.inputs());
        let test_code = self
            .config
            .include_test_code
            .then(|| test_code(&function_name, &input_object));

        GeneratedSheet {
            sheet: compiled.sheet().to_string(),
            function_name,
            function_source,
            input_object,
            order: compiled.order().to_vec(),
            inputs: compiled.inputs().keys().copied().collect(),
            test_code,
        }
    }

    /// Function text assigning each expression in order and returning the
    /// computed container
    pub fn function_source(&self, name: &str, assignments: &[(CellAddress, String)]) -> String {
        let input = &self.config.input_name;
        let computed = &self.config.computed_name;

        let mut lines = vec![
            format!("function {name}({input}) {{"),
            format!("{INDENT}// {input} is an object containing input cell values"),
            format!("{INDENT}let {computed} = {{}};"),
        ];

        for (cell, expression) in assignments {
            lines.push(format!("{INDENT}{computed}[\"{cell}\"] = {expression};"));
        }

        lines.push(format!("{INDENT}return {computed};"));
        lines.push("}".to_string());
        lines.join("\n")
    }
}
