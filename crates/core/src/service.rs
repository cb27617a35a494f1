//! The extraction orchestrator.
//!
//! [`ContentExtractorService`] is the only component with side effects. A
//! request flows: cache key → per-origin rate limit → in-flight dedup →
//! cache lookup → bounded fetch → parse → `before_extract` hooks → adapter
//! dispatch or the generic cleaner + detector path → enrichment →
//! `after_extract` hooks → fingerprint → cache write.
//!
//! Shared mutable state (cache, pending map, limiter windows, registry,
//! plugin list) is guarded by `std::sync::Mutex` and never held across an
//! await, which makes each check-then-act sequence atomic.

use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::FutureExt;
use futures::future::{Shared, join_all};
use sha2::{Digest, Sha256};
use url::Url;

use crate::adapters::{AdapterRegistry, SiteAdapter};
use crate::analysis::{HeuristicAnalyzer, TextAnalyzer};
use crate::cache::ExtractionCache;
use crate::cleaner;
use crate::content::{self, ExtractedContent, Metadata, Paragraph, ValidationReport};
use crate::detector;
use crate::error::{ExtractError, Result};
use crate::export::{self, ExportFormat};
use crate::fetch::{Fetcher, HttpFetcher};
use crate::options::{ExtractionOptions, ServiceConfig};
use crate::parse::Document;
use crate::plugins::Plugin;
use crate::ratelimit::RateLimiter;

/// Extraction milestones reported through the progress hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressStage {
    Fetching,
    Parsing,
    Cleaning,
    Extracting,
    Analyzing,
}

/// Observer for progress events; absence of a hook is a no-op.
pub type ProgressHook = Arc<dyn Fn(ProgressStage, u8) + Send + Sync>;

type SharedExtraction = Shared<Pin<Box<dyn Future<Output = Result<ExtractedContent>> + Send>>>;

struct ServiceInner {
    fetcher: Arc<dyn Fetcher>,
    limiter: RateLimiter,
    cache: Mutex<ExtractionCache>,
    pending: Mutex<HashMap<String, SharedExtraction>>,
    registry: Mutex<AdapterRegistry>,
    plugins: Mutex<Vec<Arc<dyn Plugin>>>,
    analyzer: Arc<dyn TextAnalyzer>,
}

/// Resilient content-extraction service: result caching, in-flight request
/// deduplication, per-origin rate limiting, and an ordered plugin chain
/// around the document-analysis pipeline.
#[derive(Clone)]
pub struct ContentExtractorService {
    inner: Arc<ServiceInner>,
}

impl Default for ContentExtractorService {
    fn default() -> Self {
        Self::new(ServiceConfig::default())
    }
}

impl ContentExtractorService {
    pub fn new(config: ServiceConfig) -> Self {
        Self::with_parts(
            config.clone(),
            Arc::new(HttpFetcher::new(config.user_agent)),
            AdapterRegistry::new(),
            Arc::new(HeuristicAnalyzer),
        )
    }

    /// Construct with explicit collaborators. The registry is owned by the
    /// service from here on; there is no global adapter state.
    pub fn with_parts(
        config: ServiceConfig, fetcher: Arc<dyn Fetcher>, registry: AdapterRegistry, analyzer: Arc<dyn TextAnalyzer>,
    ) -> Self {
        Self {
            inner: Arc::new(ServiceInner {
                fetcher,
                limiter: RateLimiter::new(&config.rate_limit),
                cache: Mutex::new(ExtractionCache::new(config.cache)),
                pending: Mutex::new(HashMap::new()),
                registry: Mutex::new(registry),
                plugins: Mutex::new(Vec::new()),
                analyzer,
            }),
        }
    }

    /// Register a site adapter; a name collision replaces the prior adapter.
    pub fn register_adapter(&self, adapter: Arc<dyn SiteAdapter>) {
        self.inner.registry.lock().unwrap().register(adapter);
    }

    /// Remove a site adapter by name.
    pub fn unregister_adapter(&self, name: &str) -> bool {
        self.inner.registry.lock().unwrap().unregister(name)
    }

    /// Registered adapters in registration order.
    pub fn adapters(&self) -> Vec<Arc<dyn SiteAdapter>> {
        self.inner.registry.lock().unwrap().list()
    }

    /// Register a plugin, running its `init` hook once.
    pub fn register_plugin(&self, plugin: Arc<dyn Plugin>) -> Result<()> {
        plugin.init().map_err(|e| plugin_error(plugin.name(), e))?;
        self.inner.plugins.lock().unwrap().push(plugin);
        Ok(())
    }

    /// Extract content from a URL.
    pub async fn extract(&self, url: &str, options: &ExtractionOptions) -> Result<ExtractedContent> {
        self.extract_with_progress(url, options, None).await
    }

    /// Extract content from a URL, reporting progress milestones.
    ///
    /// When a second caller arrives for the same cache key while the first
    /// is in flight, both await one shared operation; the later caller's
    /// hook is not invoked.
    pub async fn extract_with_progress(
        &self, url: &str, options: &ExtractionOptions, progress: Option<ProgressHook>,
    ) -> Result<ExtractedContent> {
        let parsed = Url::parse(url).map_err(|e| ExtractError::InvalidUrl(e.to_string()))?;

        let origin = parsed.origin().ascii_serialization();
        if !self.inner.limiter.check_limit(&origin) {
            let retry_after_ms = self.inner.limiter.retry_after_ms(&origin);
            return Err(ExtractError::RateLimitExceeded { origin, retry_after_ms });
        }

        let key = cache_key(url, options);
        let shared = {
            let mut pending = self.inner.pending.lock().unwrap();
            match pending.get(&key) {
                Some(existing) => existing.clone(),
                None => {
                    let inner = Arc::clone(&self.inner);
                    let url = url.to_string();
                    let options = options.clone();
                    let pending_key = key.clone();
                    let future: Pin<Box<dyn Future<Output = Result<ExtractedContent>> + Send>> =
                        Box::pin(async move {
                            let result = perform_extract(&inner, &url, &pending_key, &options, progress).await;
                            inner.pending.lock().unwrap().remove(&pending_key);
                            result
                        });
                    let shared = future.shared();
                    pending.insert(key, shared.clone());
                    shared
                }
            }
        };

        shared.await
    }

    /// Extract from markup the caller already holds. Enters the pipeline at
    /// the parse/adapter step: no fetch, rate limit, or cache involvement.
    pub fn extract_from_html(
        &self, html: &str, url: Option<&str>, options: &ExtractionOptions,
    ) -> Result<ExtractedContent> {
        let base = url.and_then(|u| Url::parse(u).ok());
        let doc = Document::parse_with_base(html, base)?;
        extract_document(&self.inner, doc, url, options, &None)
    }

    /// Extract from an already parsed document.
    pub fn extract_from_document(
        &self, doc: Document, url: Option<&str>, options: &ExtractionOptions,
    ) -> Result<ExtractedContent> {
        extract_document(&self.inner, doc, url, options, &None)
    }

    /// Extract a set of URLs in fixed-size groups, each group fully in
    /// parallel. Results preserve input order, and one URL's failure never
    /// aborts its siblings.
    pub async fn extract_batch(
        &self, urls: &[String], options: &ExtractionOptions, concurrency: usize,
    ) -> Vec<Result<ExtractedContent>> {
        let group_size = concurrency.max(1);
        let mut results = Vec::with_capacity(urls.len());
        for group in urls.chunks(group_size) {
            let futures: Vec<_> = group.iter().map(|url| self.extract(url, options)).collect();
            results.extend(join_all(futures).await);
        }
        results
    }

    /// Perform a full extraction, then yield the paragraphs as a finite,
    /// non-restartable chunked sequence. This is post-hoc chunking of a
    /// complete result, not incremental extraction.
    pub async fn extract_stream(&self, url: &str, options: &ExtractionOptions) -> Result<ContentStream> {
        let content = self.extract(url, options).await?;
        Ok(ContentStream::new(content, ContentStream::DEFAULT_CHUNK))
    }

    /// Extract each URL and group by fingerprint, returning only groups with
    /// at least two members. Failed URLs are skipped.
    pub async fn find_duplicates(&self, urls: &[String], options: &ExtractionOptions) -> Vec<Vec<String>> {
        let mut groups: Vec<(String, Vec<String>)> = Vec::new();
        for url in urls {
            match self.extract(url, options).await {
                Ok(content) => match groups.iter_mut().find(|(f, _)| *f == content.fingerprint) {
                    Some((_, members)) => members.push(url.clone()),
                    None => groups.push((content.fingerprint.clone(), vec![url.clone()])),
                },
                Err(e) => tracing::warn!(url = %url, error = %e, "skipping url in duplicate scan"),
            }
        }
        groups.into_iter().filter(|(_, members)| members.len() >= 2).map(|(_, members)| members).collect()
    }

    /// Serialize content to an export format.
    pub fn export_content(&self, content: &ExtractedContent, format: ExportFormat) -> Result<String> {
        export::export_content(content, format)
    }

    /// Parse previously exported JSON back into content.
    pub fn import_content(&self, json: &str) -> Result<ExtractedContent> {
        export::import_content(json)
    }

    /// Pure content-quality rule check; see [`content::validate_content`].
    pub fn validate_content(&self, content: &ExtractedContent) -> ValidationReport {
        content::validate_content(content)
    }

    /// Requests the origin can still make in the current window.
    pub fn remaining_requests(&self, origin: &str) -> usize {
        self.inner.limiter.remaining_requests(origin)
    }

    /// Drop every cached result.
    pub fn clear_cache(&self) {
        self.inner.cache.lock().unwrap().clear();
    }
}

/// Cache key: digest of the URL and the canonical serialization of options.
fn cache_key(url: &str, options: &ExtractionOptions) -> String {
    let serialized = serde_json::to_string(options).unwrap_or_default();
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    hasher.update(b"\n");
    hasher.update(serialized.as_bytes());
    hex::encode(hasher.finalize())
}

fn emit(progress: &Option<ProgressHook>, stage: ProgressStage, percent: u8) {
    if let Some(hook) = progress {
        hook(stage, percent);
    }
}

fn plugin_error(name: &str, error: ExtractError) -> ExtractError {
    match error {
        already @ ExtractError::Plugin { .. } => already,
        other => ExtractError::Plugin { plugin: name.to_string(), message: other.to_string() },
    }
}

async fn perform_extract(
    inner: &Arc<ServiceInner>, url: &str, key: &str, options: &ExtractionOptions, progress: Option<ProgressHook>,
) -> Result<ExtractedContent> {
    if let Some(content) = inner.cache.lock().unwrap().get(key) {
        tracing::debug!(url = %url, "cache hit");
        return Ok(content);
    }

    emit(&progress, ProgressStage::Fetching, 10);
    let markup = inner.fetcher.fetch(url, Duration::from_millis(options.timeout_ms)).await?;

    emit(&progress, ProgressStage::Parsing, 30);
    let base = Url::parse(url).ok();
    let doc = Document::parse_with_base(&markup, base)?;
    let content = extract_document(inner, doc, Some(url), options, &progress)?;

    inner.cache.lock().unwrap().insert(key.to_string(), content.clone());
    Ok(content)
}

/// The synchronous heart of the pipeline: hooks, adapter dispatch or the
/// generic path, enrichment, analysis, and the final derived-field refresh.
fn extract_document(
    inner: &Arc<ServiceInner>, doc: Document, url: Option<&str>, options: &ExtractionOptions,
    progress: &Option<ProgressHook>,
) -> Result<ExtractedContent> {
    let parsed_url = url.and_then(|u| Url::parse(u).ok());

    let plugins: Vec<Arc<dyn Plugin>> = inner.plugins.lock().unwrap().clone();
    let mut doc = doc;
    for plugin in &plugins {
        doc = plugin.before_extract(doc, options).map_err(|e| plugin_error(plugin.name(), e))?;
    }

    emit(progress, ProgressStage::Cleaning, 50);
    let cleaned = cleaner::clean(&doc, &options.cleaning);

    emit(progress, ProgressStage::Extracting, 70);
    let adapter = match &options.adapter {
        Some(name) => inner.registry.lock().unwrap().get(name),
        None => url.and_then(|u| inner.registry.lock().unwrap().dispatch(u)),
    };

    let mut content = match (adapter, parsed_url.as_ref()) {
        (Some(adapter), Some(target)) => {
            tracing::debug!(adapter = %adapter.name(), url = %target, "dispatching to site adapter");
            adapter_content(&*adapter, &doc, &cleaned, target, options)?
        }
        _ => generic_content(&doc, &cleaned, options),
    };

    if options.extract_tables {
        content.tables = Some(crate::structured::extract_tables(&cleaned));
    }
    if options.extract_lists {
        content.lists = Some(crate::structured::extract_lists(&cleaned));
    }
    if options.extract_embeds {
        content.embeds = Some(crate::structured::extract_embeds(&doc));
    }
    if options.extract_structured_data {
        content.structured_data = Some(crate::structured::extract_structured_data(&doc));
    }
    if options.detect_sections {
        content.sections = detector::detect_sections(&cleaned, &content.paragraphs);
    }

    emit(progress, ProgressStage::Analyzing, 90);
    if content.language.is_none() {
        content.language = inner.analyzer.language(&content.clean_text);
    }
    apply_analysis(&*inner.analyzer, &mut content, options);

    if options.generate_summary && content.metadata.description.is_none() {
        content.metadata.description = summarize(&content.paragraphs);
    }

    for plugin in &plugins {
        content = plugin.after_extract(content).map_err(|e| plugin_error(plugin.name(), e))?;
    }

    content.recompute_derived();
    emit(progress, ProgressStage::Analyzing, 100);
    Ok(content)
}

fn generic_content(doc: &Document, cleaned: &Document, options: &ExtractionOptions) -> ExtractedContent {
    let paragraphs = detector::detect(cleaned, options);
    // Title and metadata come from the original markup: cleanup strips the
    // meta and JSON-LD surface they live in.
    let title = doc.extract_title().unwrap_or_default();
    let metadata = if options.include_metadata { doc.extract_metadata() } else { Metadata::default() };
    let mut content = ExtractedContent::new(title, paragraphs, metadata);
    content.language = doc.language();
    content
}

fn adapter_content(
    adapter: &dyn SiteAdapter, doc: &Document, cleaned: &Document, url: &Url, options: &ExtractionOptions,
) -> Result<ExtractedContent> {
    let partial = adapter.extract(doc, url)?;

    let paragraphs = partial
        .paragraphs
        .or_else(|| adapter.detect_paragraphs(doc))
        .unwrap_or_else(|| detector::detect(cleaned, options));
    let title = partial.title.or_else(|| doc.extract_title()).unwrap_or_default();
    let metadata = match partial.metadata {
        Some(metadata) => metadata,
        None if options.include_metadata => doc.extract_metadata(),
        None => Metadata::default(),
    };

    let mut content = ExtractedContent::new(title, paragraphs, metadata);
    content.language = partial.language.or_else(|| doc.language());
    Ok(content)
}

fn apply_analysis(analyzer: &dyn TextAnalyzer, content: &mut ExtractedContent, options: &ExtractionOptions) {
    if !options.extract_entities && !options.calculate_readability {
        return;
    }
    for paragraph in &mut content.paragraphs {
        if options.extract_entities {
            paragraph.entities = Some(analyzer.entities(&paragraph.text));
            paragraph.sentiment = Some(analyzer.sentiment(&paragraph.text));
        }
        if options.calculate_readability {
            paragraph.readability = Some(analyzer.readability(&paragraph.text));
        }
    }
}

fn summarize(paragraphs: &[Paragraph]) -> Option<String> {
    let source = paragraphs.iter().find(|p| !p.is_heading && p.text.chars().count() >= 50)?;
    let summary: String = source.text.chars().take(300).collect();
    Some(summary)
}

/// One chunk of a streamed result.
#[derive(Debug, Clone)]
pub struct ContentChunk {
    pub index: usize,
    pub paragraphs: Vec<Paragraph>,
    /// Word count of this chunk alone.
    pub word_count: usize,
    pub is_last: bool,
}

/// Finite, non-restartable sequence of paragraph chunks over a completed
/// extraction.
pub struct ContentStream {
    chunks: VecDeque<ContentChunk>,
}

impl ContentStream {
    pub const DEFAULT_CHUNK: usize = 5;

    pub fn new(content: ExtractedContent, chunk_size: usize) -> Self {
        let size = chunk_size.max(1);
        let chunk_count = content.paragraphs.len().div_ceil(size);
        let mut chunks = VecDeque::with_capacity(chunk_count);

        for (index, group) in content.paragraphs.chunks(size).enumerate() {
            let text = group.iter().map(|p| p.text.as_str()).collect::<Vec<_>>().join("\n\n");
            chunks.push_back(ContentChunk {
                index,
                paragraphs: group.to_vec(),
                word_count: content::count_words(&text),
                is_last: index + 1 == chunk_count,
            });
        }

        Self { chunks }
    }
}

impl Iterator for ContentStream {
    type Item = ContentChunk;

    fn next(&mut self) -> Option<ContentChunk> {
        self.chunks.pop_front()
    }
}
