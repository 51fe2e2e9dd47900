//! Rendering module: filling published templates and serializing
//! extracted structures.

mod engine;
mod json;
mod options;
mod pipeline;
mod result;
mod text;

pub use engine::{PlaceholderEngine, TemplateEngine, PLACEHOLDER_PATTERN};
pub use json::{to_json, value_to_json, JsonFormat};
pub use options::RenderOptions;
pub use pipeline::render;
pub use result::{RenderStats, RenderStatus, RenderedDocument};
pub use text::to_text;
