//! Render output with status and statistics.

use serde::{Deserialize, Serialize};

/// Outcome of a render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderStatus {
    /// Every requested output was produced
    Completed,
    /// The DOCX was produced but the PDF rendition was not
    DocxOnly,
}

/// Documents produced by a render.
#[derive(Debug, Clone)]
pub struct RenderedDocument {
    /// The filled DOCX
    pub docx: Vec<u8>,

    /// PDF rendition, when requested and successful
    pub pdf: Option<Vec<u8>>,

    /// Overall status
    pub status: RenderStatus,

    /// Why the PDF rendition is missing, for [`RenderStatus::DocxOnly`]
    pub conversion_error: Option<String>,

    /// Render statistics
    pub stats: RenderStats,
}

impl RenderedDocument {
    /// Create a DOCX-only result with status `Completed`.
    pub fn docx(docx: Vec<u8>, stats: RenderStats) -> Self {
        Self {
            docx,
            pdf: None,
            status: RenderStatus::Completed,
            conversion_error: None,
            stats,
        }
    }

    /// Attach a PDF rendition.
    pub fn with_pdf(mut self, pdf: Vec<u8>) -> Self {
        self.pdf = Some(pdf);
        self.status = RenderStatus::Completed;
        self
    }

    /// Record a failed conversion.
    pub fn with_conversion_error(mut self, error: impl Into<String>) -> Self {
        self.conversion_error = Some(error.into());
        self.status = RenderStatus::DocxOnly;
        self
    }

    /// Check if the render produced everything requested.
    pub fn is_complete(&self) -> bool {
        self.status == RenderStatus::Completed
    }
}

/// Statistics collected during a render.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderStats {
    /// Loop mappings expanded
    pub loops_expanded: u32,

    /// Table rows inserted by loop expansion
    pub rows_inserted: u32,

    /// Template rows kept because their loop had no items
    pub empty_loops: u32,

    /// `{{label}}` tokens resolved by the template engine
    pub placeholders_resolved: u32,
}

impl RenderStats {
    /// Create new empty statistics.
    pub fn new() -> Self {
        Self::default()
    }
}
