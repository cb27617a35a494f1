//! Site adapters: named, pattern-matched, priority-ranked extraction
//! strategies.
//!
//! The registry is an explicit instance owned by the orchestrator's
//! construction context; there is no module-level adapter state. Dispatch
//! selects the highest-priority adapter whose pattern set matches the URL,
//! with ties resolved by registration order.

use std::sync::Arc;

use regex::Regex;
use url::Url;

use crate::content::{Metadata, Paragraph};
use crate::error::Result;
use crate::parse::Document;

/// A partial content record returned by an adapter.
///
/// Adapters may omit any field; the orchestrator fills omissions with safe
/// defaults instead of failing.
#[derive(Debug, Clone, Default)]
pub struct PartialContent {
    pub title: Option<String>,
    pub paragraphs: Option<Vec<Paragraph>>,
    pub metadata: Option<Metadata>,
    pub language: Option<String>,
}

/// A site-specific extraction strategy.
pub trait SiteAdapter: Send + Sync {
    /// Unique adapter name; re-registering a name replaces the prior
    /// adapter.
    fn name(&self) -> &str;

    /// Ordered URL matchers; the adapter is eligible when any matches.
    fn patterns(&self) -> &[Regex];

    /// Dispatch rank; higher wins.
    fn priority(&self) -> i32;

    /// Produce a partial content record from the parsed document.
    fn extract(&self, doc: &Document, url: &Url) -> Result<PartialContent>;

    /// Optional adapter-specific paragraph detection; `None` defers to the
    /// generic detector.
    fn detect_paragraphs(&self, _doc: &Document) -> Option<Vec<Paragraph>> {
        None
    }
}

/// Ordered catalogue of site adapters.
#[derive(Default)]
pub struct AdapterRegistry {
    adapters: Vec<Arc<dyn SiteAdapter>>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self { adapters: Vec::new() }
    }

    /// Register an adapter. A name collision replaces the existing adapter
    /// in place, keeping its registration position.
    pub fn register(&mut self, adapter: Arc<dyn SiteAdapter>) {
        match self.adapters.iter().position(|a| a.name() == adapter.name()) {
            Some(index) => self.adapters[index] = adapter,
            None => self.adapters.push(adapter),
        }
    }

    /// Remove an adapter by name; returns whether one was removed.
    pub fn unregister(&mut self, name: &str) -> bool {
        match self.adapters.iter().position(|a| a.name() == name) {
            Some(index) => {
                self.adapters.remove(index);
                true
            }
            None => false,
        }
    }

    /// All registered adapters in registration order.
    pub fn list(&self) -> Vec<Arc<dyn SiteAdapter>> {
        self.adapters.clone()
    }

    /// Look up an adapter by exact name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn SiteAdapter>> {
        self.adapters.iter().find(|a| a.name() == name).cloned()
    }

    /// Select the adapter for a URL: highest priority among those whose
    /// patterns match, first-registered on ties.
    pub fn dispatch(&self, url: &str) -> Option<Arc<dyn SiteAdapter>> {
        let mut best: Option<&Arc<dyn SiteAdapter>> = None;
        for adapter in &self.adapters {
            if !adapter.patterns().iter().any(|p| p.is_match(url)) {
                continue;
            }
            if best.is_none_or(|b| adapter.priority() > b.priority()) {
                best = Some(adapter);
            }
        }
        best.cloned()
    }
}
