//! Extraction options and configuration.

/// Options for extracting a document structure.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Error handling mode for auxiliary parts
    pub error_mode: ErrorMode,

    /// Whether to resolve style ids to display names via `word/styles.xml`
    pub resolve_styles: bool,

    /// Whether to collect per-run formatting
    pub include_runs: bool,
}

impl ExtractOptions {
    /// Create new extract options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set error mode.
    pub fn with_error_mode(mut self, mode: ErrorMode) -> Self {
        self.error_mode = mode;
        self
    }

    /// Enable lenient mode (ignore malformed auxiliary parts).
    pub fn lenient(mut self) -> Self {
        self.error_mode = ErrorMode::Lenient;
        self
    }

    /// Enable or disable style name resolution.
    pub fn with_style_names(mut self, resolve: bool) -> Self {
        self.resolve_styles = resolve;
        self
    }

    /// Extract text only, without per-run formatting.
    pub fn text_only(mut self) -> Self {
        self.include_runs = false;
        self
    }
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            error_mode: ErrorMode::Strict,
            resolve_styles: true,
            include_runs: true,
        }
    }
}

/// Error handling mode during extraction.
///
/// The main document part is always required; the mode only governs
/// auxiliary parts such as `word/styles.xml`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorMode {
    /// Fail on any error
    #[default]
    Strict,
    /// Skip invalid auxiliary parts and continue
    Lenient,
}
