//! Plugin hooks.
//!
//! Plugins are first-class extension code, not infrastructure: hooks run in
//! registration order under the orchestrator, and an error from a hook
//! aborts the extraction it was participating in, attributed to the plugin
//! by name.

use crate::content::ExtractedContent;
use crate::error::Result;
use crate::options::ExtractionOptions;
use crate::parse::Document;

/// An ordered extension point around extraction.
pub trait Plugin: Send + Sync {
    fn name(&self) -> &str;

    fn version(&self) -> &str;

    /// Called once when the plugin is registered.
    fn init(&self) -> Result<()> {
        Ok(())
    }

    /// Transform the parsed document before extraction. The default is the
    /// identity.
    fn before_extract(&self, doc: Document, _options: &ExtractionOptions) -> Result<Document> {
        Ok(doc)
    }

    /// Enrich or rewrite the content record after extraction. The default is
    /// the identity.
    fn after_extract(&self, content: ExtractedContent) -> Result<ExtractedContent> {
        Ok(content)
    }
}
