//! Option structs controlling cleaning, extraction, caching, and the service.
//!
//! All option types are flat `Clone + Default` structs. `CleaningOptions` and
//! `ExtractionOptions` additionally serialize, because the result cache keys
//! entries by `hash(url, serialized options)`.

use serde::{Deserialize, Serialize};

/// Toggles for the boilerplate-removal passes.
///
/// Toggle order is irrelevant except for the fixed pass ordering documented
/// on [`crate::cleaner::clean`]: category removals run before attribute and
/// class cleanup, which runs before empty-element pruning, which runs before
/// hidden-element removal and aggressive pruning.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CleaningOptions {
    pub remove_ads: bool,
    pub remove_navigation: bool,
    pub remove_comments: bool,
    pub remove_related: bool,
    pub remove_footers: bool,
    pub remove_sidebars: bool,
    pub remove_popups: bool,
    pub remove_cookie_banners: bool,
    pub remove_newsletter: bool,
    pub preserve_images: bool,
    pub preserve_videos: bool,
    pub preserve_iframes: bool,
    /// Prune short, media-free divs, stray anchors, and promo-pattern blocks.
    pub aggressive: bool,
    /// Extra CSS selectors to remove. Invalid selectors are logged and skipped.
    pub custom_remove_selectors: Vec<String>,
    /// Selectors whose matches survive every removal pass.
    pub custom_keep_selectors: Vec<String>,
}

impl Default for CleaningOptions {
    fn default() -> Self {
        Self {
            remove_ads: true,
            remove_navigation: true,
            remove_comments: true,
            remove_related: true,
            remove_footers: true,
            remove_sidebars: true,
            remove_popups: true,
            remove_cookie_banners: true,
            remove_newsletter: true,
            preserve_images: true,
            preserve_videos: false,
            preserve_iframes: false,
            aggressive: false,
            custom_remove_selectors: Vec::new(),
            custom_keep_selectors: Vec::new(),
        }
    }
}

/// Feature flags controlling which optional analyses run during extraction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExtractionOptions {
    /// Force a named adapter instead of pattern dispatch.
    pub adapter: Option<String>,
    pub cleaning: CleaningOptions,
    /// Paragraphs shorter than this are dropped before scoring.
    pub min_paragraph_length: usize,
    pub include_metadata: bool,
    pub detect_sections: bool,
    pub score_paragraphs: bool,
    pub extract_tables: bool,
    pub extract_lists: bool,
    pub extract_embeds: bool,
    pub extract_structured_data: bool,
    pub extract_entities: bool,
    pub calculate_readability: bool,
    pub generate_summary: bool,
    /// Fetch timeout in milliseconds.
    pub timeout_ms: u64,
}

impl Default for ExtractionOptions {
    fn default() -> Self {
        Self {
            adapter: None,
            cleaning: CleaningOptions::default(),
            min_paragraph_length: 20,
            include_metadata: true,
            detect_sections: false,
            score_paragraphs: true,
            extract_tables: false,
            extract_lists: false,
            extract_embeds: false,
            extract_structured_data: false,
            extract_entities: false,
            calculate_readability: false,
            generate_summary: false,
            timeout_ms: 30_000,
        }
    }
}

/// Eviction strategy for the result cache.
///
/// Only `Lru` is implemented; `Lfu` and `Fifo` are accepted and behave as
/// `Lru`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CacheStrategy {
    Lru,
    Lfu,
    Fifo,
}

/// Result-cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheOptions {
    pub enabled: bool,
    /// Entry age at or beyond which a cached result is treated as a miss.
    pub ttl_ms: u64,
    /// Byte budget for the primary store, in megabytes.
    pub max_size_mb: usize,
    pub strategy: CacheStrategy,
    /// Adds a secondary unbounded store consulted on primary-cache miss.
    pub persistent: bool,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self { enabled: true, ttl_ms: 3_600_000, max_size_mb: 50, strategy: CacheStrategy::Lru, persistent: false }
    }
}

/// Sliding-window admission policy, per URL origin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    pub max_requests: usize,
    pub window_ms: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self { max_requests: 10, window_ms: 60_000 }
    }
}

/// Construction-time configuration for
/// [`crate::service::ContentExtractorService`].
#[derive(Debug, Clone, Default)]
pub struct ServiceConfig {
    pub cache: CacheOptions,
    pub rate_limit: RateLimitConfig,
    /// User-Agent presented by the default HTTP fetcher.
    pub user_agent: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extraction_options_default() {
        let options = ExtractionOptions::default();
        assert_eq!(options.min_paragraph_length, 20);
        assert_eq!(options.timeout_ms, 30_000);
        assert!(options.score_paragraphs);
        assert!(!options.extract_tables);
        assert!(options.adapter.is_none());
    }

    #[test]
    fn test_cleaning_options_default() {
        let options = CleaningOptions::default();
        assert!(options.remove_ads);
        assert!(options.preserve_images);
        assert!(!options.preserve_iframes);
        assert!(!options.aggressive);
    }

    #[test]
    fn test_rate_limit_default_policy() {
        let config = RateLimitConfig::default();
        assert_eq!(config.max_requests, 10);
        assert_eq!(config.window_ms, 60_000);
    }

    #[test]
    fn test_options_serialize_for_cache_key() {
        let options = ExtractionOptions::default();
        let json = serde_json::to_string(&options).unwrap();
        let back: ExtractionOptions = serde_json::from_str(&json).unwrap();
        assert_eq!(options, back);
    }
}
