pub mod html;
pub mod json;
pub mod markdown;

pub use html::convert_to_html;
pub use json::{export_json, import_json};
pub use markdown::convert_to_markdown;

use crate::content::ExtractedContent;
use crate::error::Result;

/// Output format options for extracted content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Full structural serialization; re-importing yields an equal record.
    Json,
    Markdown,
    /// Minimal document wrapper around the paragraphs' raw HTML.
    Html,
}

/// Serialize content to the requested format.
pub fn export_content(content: &ExtractedContent, format: ExportFormat) -> Result<String> {
    match format {
        ExportFormat::Json => export_json(content),
        ExportFormat::Markdown => Ok(convert_to_markdown(content)),
        ExportFormat::Html => Ok(convert_to_html(content)),
    }
}

/// Parse previously exported JSON back into content.
pub fn import_content(json: &str) -> Result<ExtractedContent> {
    import_json(json)
}
