//! JSON export and import.
//!
//! The round trip is lossless: re-importing exported JSON yields an equal
//! [`ExtractedContent`].

use crate::content::ExtractedContent;
use crate::error::Result;

/// Serialize content to pretty-printed JSON.
pub fn export_json(content: &ExtractedContent) -> Result<String> {
    Ok(serde_json::to_string_pretty(content)?)
}

/// Parse exported JSON back into content.
pub fn import_json(json: &str) -> Result<ExtractedContent> {
    Ok(serde_json::from_str(json)?)
}
