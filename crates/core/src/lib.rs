pub mod adapters;
pub mod analysis;
pub mod cache;
pub mod cleaner;
pub mod content;
pub mod detector;
pub mod error;
pub mod export;
pub mod fetch;
pub mod layout;
pub mod metadata;
pub mod options;
pub mod parse;
pub mod plugins;
pub mod ratelimit;
pub mod service;
pub mod structured;

pub use adapters::{AdapterRegistry, PartialContent, SiteAdapter};
pub use analysis::{HeuristicAnalyzer, TextAnalyzer};
#[doc(hidden)]
pub use cache::ExtractionCache;
pub use cleaner::{clean, sanitize_html};
pub use content::{
    Bounds, ContentList, ContentQuality, ContentTable, Embed, Entity, ExtractedContent, Metadata, Paragraph,
    Section, ValidationReport, validate_content,
};
pub use detector::{detect, detect_sections};
pub use error::{ExtractError, Result};
pub use export::{ExportFormat, export_content, import_content};
pub use fetch::{Fetcher, HttpFetcher};
pub use options::{CacheOptions, CacheStrategy, CleaningOptions, ExtractionOptions, RateLimitConfig, ServiceConfig};
pub use parse::Document;
pub use plugins::Plugin;
pub use ratelimit::RateLimiter;
pub use service::{ContentChunk, ContentExtractorService, ContentStream, ProgressHook, ProgressStage};
