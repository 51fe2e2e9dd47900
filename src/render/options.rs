//! Rendering options and configuration.

/// Options for rendering a published template.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Produce a PDF rendition after the DOCX is written
    pub convert_pdf: bool,

    /// Fail when a loop mapping's table no longer exists
    pub strict_loops: bool,

    /// Collect render statistics
    pub collect_stats: bool,
}

impl RenderOptions {
    /// Create new render options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable PDF conversion.
    pub fn with_pdf(mut self, convert: bool) -> Self {
        self.convert_pdf = convert;
        self
    }

    /// Skip loops whose table is missing instead of failing.
    pub fn lenient_loops(mut self) -> Self {
        self.strict_loops = false;
        self
    }

    /// Enable or disable statistics collection.
    pub fn with_stats(mut self, collect: bool) -> Self {
        self.collect_stats = collect;
        self
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            convert_pdf: false,
            strict_loops: true,
            collect_stats: true,
        }
    }
}
