//! Generator configuration

use crate::error::{ForgeError, ForgeResult};

/// Default name of the input-value container parameter
pub const DEFAULT_INPUT_NAME: &str = "d";
/// Default name of the computed-value container
pub const DEFAULT_COMPUTED_NAME: &str = "computed";

pub(crate) const RESERVED_WORDS: &[&str] = &[
    "break", "case", "catch", "class", "const", "continue", "debugger", "default", "delete", "do",
    "else", "export", "extends", "false", "finally", "for", "function", "if", "import", "in",
    "instanceof", "let", "new", "null", "return", "super", "switch", "this", "throw", "true",
    "try", "typeof", "var", "void", "while", "with", "yield",
];

/// Options controlling the generated JavaScript
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorConfig {
    /// Parameter holding input cell values
    pub input_name: String,
    /// Local object receiving computed cell values
    pub computed_name: String,
    /// Emit the input object declaration and a console.log invocation
    pub include_test_code: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            input_name: DEFAULT_INPUT_NAME.to_string(),
            computed_name: DEFAULT_COMPUTED_NAME.to_string(),
            include_test_code: false,
        }
    }
}

impl GeneratorConfig {
    pub fn new(
        input_name: impl Into<String>,
        computed_name: impl Into<String>,
        include_test_code: bool,
    ) -> ForgeResult<Self> {
        let config = Self {
            input_name: input_name.into(),
            computed_name: computed_name.into(),
            include_test_code,
        };
        config.validate()?;
        Ok(config)
    }

    /// Both container names must be distinct, plain JavaScript identifiers
    pub fn validate(&self) -> ForgeResult<()> {
        for name in [&self.input_name, &self.computed_name] {
            if !is_identifier(name) {
                return Err(ForgeError::Config(format!(
                    "'{name}' is not a valid JavaScript identifier"
                )));
            }
        }
        if self.input_name == self.computed_name {
            return Err(ForgeError::Config(format!(
                "input and computed containers must differ (both '{}')",
                self.input_name
            )));
        }
        Ok(())
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let valid_start = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$');
    valid_start
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
        && !RESERVED_WORDS.contains(&name)
}
