//! Content types produced by extraction.
//!
//! This module defines the [`Paragraph`] record and the [`ExtractedContent`]
//! aggregate along with its derived metrics. `clean_text` is always the
//! paragraphs joined by blank lines, and `word_count`/`reading_time` are
//! computed, never authored: [`ExtractedContent::recompute_derived`] is the
//! single place that maintains those invariants.

use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Estimated layout rectangle for a block element, in layout units.
///
/// Geometry is a coarse heuristic signal produced by [`crate::layout`], not a
/// rendered measurement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Bounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    /// Union rectangle of two bounds; used when merging wrapped paragraphs.
    pub fn union(&self, other: &Bounds) -> Bounds {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = (self.x + self.width).max(other.x + other.width);
        let bottom = (self.y + self.height).max(other.y + other.height);
        Bounds { x, y, width: right - x, height: bottom - y }
    }

    /// Vertical distance from the bottom of `self` to the top of `other`.
    pub fn gap_to(&self, other: &Bounds) -> f64 {
        other.y - (self.y + self.height)
    }
}

/// A named entity recognized by the analyzer seam.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub text: String,
    pub kind: String,
}

/// One content block in reading order.
///
/// Immutable once produced by a detector pass; `index` is the paragraph's
/// rank in reading order and is contiguous from 0 after any merge or filter
/// pass, with ids regenerated as `p-0..p-(n-1)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paragraph {
    pub id: String,
    pub text: String,
    pub html: String,
    pub index: usize,
    /// Structural selector path for traceability, e.g. `article > p:nth-child(2)`.
    pub element_path: String,
    pub bounds: Bounds,
    pub is_quote: bool,
    pub is_code: bool,
    pub is_heading: bool,
    pub heading_level: Option<u8>,
    /// Structure/quality score in `[0, 1]`; 0.5 when scoring was not requested.
    pub importance: f64,
    pub sentiment: Option<f64>,
    pub entities: Option<Vec<Entity>>,
    pub readability: Option<f64>,
}

/// Document metadata assembled from JSON-LD, Open Graph, meta tags, and DOM
/// fallbacks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub author: Option<String>,
    pub description: Option<String>,
    pub published: Option<String>,
    pub modified: Option<String>,
    pub site_name: Option<String>,
    pub url: Option<String>,
    pub image: Option<String>,
    pub keywords: Vec<String>,
}

/// Aggregate quality signal for an extraction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentQuality {
    /// Overall score in `[0, 1]`.
    pub score: f64,
    /// Average characters per paragraph.
    pub text_density: f64,
    /// Anchor-text share of the extracted text, `[0, 1]`.
    pub link_density: f64,
    pub paragraph_count: usize,
}

/// A heading-delimited run of paragraphs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub heading: Option<String>,
    pub level: u8,
    /// Indices into `ExtractedContent::paragraphs`.
    pub paragraph_indices: Vec<usize>,
}

/// A table lifted from the cleaned document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentTable {
    pub caption: Option<String>,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// An ordered or unordered list lifted from the cleaned document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentList {
    pub ordered: bool,
    pub items: Vec<String>,
}

/// An embedded media reference (iframe, video, object).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Embed {
    pub kind: String,
    pub src: String,
    pub title: Option<String>,
}

/// The aggregate result of one extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedContent {
    pub title: String,
    pub paragraphs: Vec<Paragraph>,
    /// Paragraph texts joined by blank lines. Derived.
    pub clean_text: String,
    pub metadata: Metadata,
    pub sections: Vec<Section>,
    /// Derived from `clean_text`.
    pub word_count: usize,
    /// Estimated minutes at 200 words per minute. Derived.
    pub reading_time: f64,
    pub language: Option<String>,
    pub quality: ContentQuality,
    /// Deterministic digest of `(title, clean_text[..1000])`. Two contents
    /// with equal fingerprints are the same underlying article regardless of
    /// source URL.
    pub fingerprint: String,
    pub tables: Option<Vec<ContentTable>>,
    pub lists: Option<Vec<ContentList>>,
    pub embeds: Option<Vec<Embed>>,
    pub structured_data: Option<Vec<serde_json::Value>>,
}

impl ExtractedContent {
    /// Assemble content from a title and detector output, computing every
    /// derived field.
    pub fn new(title: String, paragraphs: Vec<Paragraph>, metadata: Metadata) -> Self {
        let mut content = Self {
            title,
            paragraphs,
            clean_text: String::new(),
            metadata,
            sections: Vec::new(),
            word_count: 0,
            reading_time: 0.0,
            language: None,
            quality: ContentQuality::default(),
            fingerprint: String::new(),
            tables: None,
            lists: None,
            embeds: None,
            structured_data: None,
        };
        content.recompute_derived();
        content
    }

    /// Recompute `clean_text`, `word_count`, `reading_time`, `quality`, and
    /// the fingerprint from the current paragraph list.
    ///
    /// Called after every pass that may have replaced paragraphs, including
    /// the `after_extract` plugin chain.
    pub fn recompute_derived(&mut self) {
        self.clean_text = self.paragraphs.iter().map(|p| p.text.as_str()).collect::<Vec<_>>().join("\n\n");
        self.word_count = count_words(&self.clean_text);
        self.reading_time = self.word_count as f64 / 200.0;
        self.quality = quality_of(&self.title, &self.paragraphs, self.word_count);
        self.fingerprint = fingerprint(&self.title, &self.clean_text);
    }
}

/// Deterministic digest over the title and a bounded prefix of the clean
/// text, used for duplicate detection across URLs.
pub fn fingerprint(title: &str, clean_text: &str) -> String {
    let prefix: String = clean_text.chars().take(1000).collect();
    let mut hasher = Sha256::new();
    hasher.update(title.as_bytes());
    hasher.update(b"\n");
    hasher.update(prefix.as_bytes());
    hex::encode(hasher.finalize())
}

/// Count words using the same token pattern everywhere a count is derived.
pub fn count_words(text: &str) -> usize {
    let word_regex = Regex::new(r"\b[\w'-]+\b").unwrap();
    word_regex.find_iter(text).count()
}

fn quality_of(title: &str, paragraphs: &[Paragraph], word_count: usize) -> ContentQuality {
    let paragraph_count = paragraphs.len();
    if paragraph_count == 0 {
        return ContentQuality { score: 0.0, text_density: 0.0, link_density: 0.0, paragraph_count: 0 };
    }

    let total_chars: usize = paragraphs.iter().map(|p| p.text.chars().count()).sum();
    let text_density = total_chars as f64 / paragraph_count as f64;

    let total_anchor_chars: usize = paragraphs.iter().map(|p| anchor_text_len(&p.html)).sum();
    let link_density = if total_chars == 0 { 0.0 } else { (total_anchor_chars as f64 / total_chars as f64).min(1.0) };

    let title_factor = if title.trim().is_empty() { 0.0 } else { 0.2 };
    let volume_factor = (word_count as f64 / 400.0).min(1.0) * 0.4;
    let body_factor = (paragraph_count as f64 / 5.0).min(1.0) * 0.2;
    let prose_factor = (1.0 - link_density) * 0.2;
    let score = (title_factor + volume_factor + body_factor + prose_factor).clamp(0.0, 1.0);

    ContentQuality { score, text_density, link_density, paragraph_count }
}

/// Anchor text length inside an HTML fragment.
fn anchor_text_len(html: &str) -> usize {
    let fragment = scraper::Html::parse_fragment(html);
    let selector = scraper::Selector::parse("a").unwrap();
    fragment.select(&selector).map(|a| a.text().map(str::len).sum::<usize>()).sum()
}

/// Result of the pure content-quality rule check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
}

/// Check extracted content against fixed quality rules.
///
/// Each violated rule appends one error string; the report is `valid` iff no
/// rule was violated. Violations are informational and never abort anything.
pub fn validate_content(content: &ExtractedContent) -> ValidationReport {
    let mut errors = Vec::new();

    if content.title.trim().is_empty() {
        errors.push("Missing title".to_string());
    }
    if content.paragraphs.is_empty() {
        errors.push("No paragraphs extracted".to_string());
    }
    if content.word_count < 50 {
        errors.push(format!("Word count {} below minimum of 50", content.word_count));
    }
    if content.quality.score < 0.3 {
        errors.push(format!("Quality score {:.2} below threshold 0.3", content.quality.score));
    }

    ValidationReport { valid: errors.is_empty(), errors }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paragraph(index: usize, text: &str) -> Paragraph {
        Paragraph {
            id: format!("p-{}", index),
            text: text.to_string(),
            html: format!("<p>{}</p>", text),
            index,
            element_path: "article > p".to_string(),
            bounds: Bounds::default(),
            is_quote: false,
            is_code: false,
            is_heading: false,
            heading_level: None,
            importance: 0.5,
            sentiment: None,
            entities: None,
            readability: None,
        }
    }

    #[test]
    fn test_clean_text_is_paragraphs_joined_by_blank_lines() {
        let content = ExtractedContent::new(
            "Title".to_string(),
            vec![paragraph(0, "First paragraph."), paragraph(1, "Second paragraph.")],
            Metadata::default(),
        );
        assert_eq!(content.clean_text, "First paragraph.\n\nSecond paragraph.");
    }

    #[test]
    fn test_word_count_and_reading_time_are_derived() {
        let text = "word ".repeat(400);
        let content = ExtractedContent::new("T".to_string(), vec![paragraph(0, text.trim())], Metadata::default());
        assert_eq!(content.word_count, 400);
        assert!((content.reading_time - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_fingerprint_is_deterministic_and_bounded() {
        let long = "a".repeat(5000);
        let a = fingerprint("Title", &long);
        let b = fingerprint("Title", &format!("{}{}", "a".repeat(1000), "different tail"));
        assert_eq!(a, b, "only the first 1000 chars participate");
        assert_ne!(a, fingerprint("Other title", &long));
    }

    #[test]
    fn test_bounds_union() {
        let a = Bounds { x: 0.0, y: 10.0, width: 100.0, height: 20.0 };
        let b = Bounds { x: 10.0, y: 50.0, width: 100.0, height: 30.0 };
        let u = a.union(&b);
        assert_eq!(u.y, 10.0);
        assert_eq!(u.height, 70.0);
        assert_eq!(u.width, 110.0);
    }

    #[test]
    fn test_bounds_gap() {
        let a = Bounds { x: 0.0, y: 0.0, width: 100.0, height: 20.0 };
        let b = Bounds { x: 0.0, y: 34.0, width: 100.0, height: 20.0 };
        assert_eq!(a.gap_to(&b), 14.0);
    }

    #[test]
    fn test_validate_content_reports_each_violation() {
        let mut content = ExtractedContent::new(String::new(), Vec::new(), Metadata::default());
        content.word_count = 10;
        content.quality.score = 0.2;

        let report = validate_content(&content);
        assert!(!report.valid);
        assert!(report.errors.iter().any(|e| e == "Missing title"));
        assert!(report.errors.iter().any(|e| e == "No paragraphs extracted"));
        assert_eq!(report.errors.len(), 4);
    }

    #[test]
    fn test_validate_content_passes_good_content() {
        let text = "Sentence with several words, reaching a decent length for prose. ".repeat(10);
        let paragraphs = (0..5).map(|i| paragraph(i, text.trim())).collect();
        let content = ExtractedContent::new("A real title".to_string(), paragraphs, Metadata::default());

        let report = validate_content(&content);
        assert!(report.valid, "unexpected errors: {:?}", report.errors);
    }

    #[test]
    fn test_json_round_trip_preserves_equality() {
        let mut content = ExtractedContent::new(
            "Title".to_string(),
            vec![paragraph(0, "Round trip paragraph.")],
            Metadata { author: Some("Author".to_string()), ..Default::default() },
        );
        content.language = Some("en".to_string());
        content.tables = Some(vec![ContentTable {
            caption: None,
            headers: vec!["a".to_string()],
            rows: vec![vec!["1".to_string()]],
        }]);

        let json = serde_json::to_string(&content).unwrap();
        let back: ExtractedContent = serde_json::from_str(&json).unwrap();
        assert_eq!(content, back);
    }
}
