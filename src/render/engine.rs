//! Scalar placeholder resolution.

use regex::Regex;
use serde_json::{Map, Value};

use crate::engine::{replace_range, stringify_value, RunText};
use crate::error::{Error, Result};
use crate::parser::package::DocxPackage;
use crate::parser::wordml::{for_each_paragraph_mut, paragraph_runs_mut};

/// Resolves scalar placeholders in a template before its loops expand.
///
/// Implement this trait to plug in a richer templating engine; the
/// built-in [`PlaceholderEngine`] only understands `{{label}}`.
pub trait TemplateEngine: Send + Sync {
    /// Get the name of this engine.
    fn name(&self) -> &str;

    /// Resolve placeholders in place against a flat scalar context.
    ///
    /// Returns the number of placeholders resolved.
    fn render(&self, package: &mut DocxPackage, context: &Map<String, Value>) -> Result<usize>;
}

/// Default token pattern: `{{label}}` with optional inner whitespace.
pub const PLACEHOLDER_PATTERN: &str = r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}\}";

/// Literal `{{label}}` resolver.
///
/// Tokens may span runs; each is replaced run-by-run so that the value
/// takes the formatting of the run the token starts in. Labels missing
/// from the context resolve to the empty string.
#[derive(Debug, Clone)]
pub struct PlaceholderEngine {
    pattern: Regex,
}

impl PlaceholderEngine {
    /// Create an engine for the `{{label}}` syntax.
    pub fn new() -> Self {
        Self {
            pattern: Regex::new(PLACEHOLDER_PATTERN).expect("placeholder pattern is valid"),
        }
    }

    /// Create an engine with a custom pattern.
    ///
    /// The first capture group must be the label.
    pub fn with_pattern(pattern: &str) -> Result<Self> {
        let pattern = Regex::new(pattern).map_err(|e| Error::Render(e.to_string()))?;
        if pattern.captures_len() < 2 {
            return Err(Error::Render(
                "placeholder pattern needs a capture group for the label".to_string(),
            ));
        }
        Ok(Self { pattern })
    }

    /// Resolve placeholders in one paragraph's runs.
    pub fn resolve_runs<R: RunText>(&self, runs: &mut [R], context: &Map<String, Value>) -> usize {
        let text: String = runs.iter().map(RunText::text).collect();
        let tokens: Vec<(usize, usize, String)> = self
            .pattern
            .captures_iter(&text)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                let label = caps.get(1)?;
                Some((whole.start(), whole.end(), label.as_str().to_string()))
            })
            .collect();

        // Right to left so earlier offsets stay valid.
        let mut resolved = 0;
        for (start, end, label) in tokens.into_iter().rev() {
            let value = match context.get(&label) {
                Some(value) => stringify_value(value),
                None => {
                    log::debug!("No value for placeholder '{}'; using empty string", label);
                    String::new()
                }
            };
            if replace_range(runs, start, end, &value) {
                resolved += 1;
            }
        }
        resolved
    }
}

impl Default for PlaceholderEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateEngine for PlaceholderEngine {
    fn name(&self) -> &str {
        "placeholder"
    }

    fn render(&self, package: &mut DocxPackage, context: &Map<String, Value>) -> Result<usize> {
        let body = package.body_mut()?;
        let mut resolved = 0;
        for_each_paragraph_mut(body, &mut |paragraph| {
            resolved += self.resolve_runs(&mut paragraph_runs_mut(paragraph), context);
        });
        Ok(resolved)
    }
}
