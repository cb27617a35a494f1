//! Paragraph detection.
//!
//! Locates the primary content container, walks it with
//! descend / skip-subtree / accept-leaf semantics to find the leaf-most
//! content blocks, materializes each into a [`Paragraph`], and merges
//! fragments that inline markup split apart. Detection is a pure function of
//! the document and options; an empty container yields an empty vector,
//! never an error.

use regex::Regex;
use scraper::ElementRef;

use crate::content::{Bounds, Paragraph, Section};
use crate::layout::{LayoutEstimate, VIEWPORT_HEIGHT};
use crate::options::ExtractionOptions;
use crate::parse::{Document, Element};

/// Ranked container candidates, most specific content markers first.
const CONTAINER_CANDIDATES: &[&str] = &[
    "main", "article", "[role=\"main\"]", "#content", "#main-content", ".content", ".main-content", ".post-content",
    ".article-content", ".entry-content", ".article-body", ".post-body", ".story-body",
];

/// Flat scan used when no container candidate exists.
const FALLBACK_SELECTOR: &str = "p, blockquote, pre, h1, h2, h3, h4, h5, h6, li";

/// Tags that prune their whole subtree from detection.
const EXCLUDED_TAGS: &[&str] =
    &["script", "style", "noscript", "nav", "header", "footer", "aside", "form", "button", "iframe", "template"];

/// Tags that may become paragraphs.
const PARAGRAPH_TAGS: &[&str] = &[
    "p", "div", "section", "article", "blockquote", "pre", "li", "td", "dd", "dt", "figcaption", "h1", "h2", "h3",
    "h4", "h5", "h6",
];

/// Minimum trimmed text length for an element to qualify at all.
const MIN_QUALIFYING_LEN: usize = 20;

/// Maximum vertical gap, in layout units, across which fragments merge.
const MERGE_GAP: f64 = 50.0;

fn exclusion_pattern() -> Regex {
    Regex::new(
        r"(?i)\b(ad|ads|advert|sponsor|sidebar|widget|comment|comments|social|share|related|promo|banner|menu|nav|breadcrumb)\b",
    )
    .unwrap()
}

/// Detect paragraphs in reading order.
pub fn detect(doc: &Document, options: &ExtractionOptions) -> Vec<Paragraph> {
    let exclusion = exclusion_pattern();

    let (elements, layout) = match select_container(doc) {
        Some(container) => {
            let layout = LayoutEstimate::of(container.element_ref());
            let mut accepted = Vec::new();
            walk(container.element_ref(), &exclusion, &mut accepted);
            (accepted, layout)
        }
        None => fallback_scan(doc, &exclusion),
    };

    let materialized: Vec<Paragraph> = elements
        .into_iter()
        .filter_map(|el| materialize(el, &layout, options))
        .filter(|p| p.text.chars().count() >= options.min_paragraph_length)
        .collect();

    let merged = merge_fragments(materialized);
    reindex(merged)
}

/// Choose the content container by `text_length × (1 − link_density)`.
fn select_container<'a>(doc: &'a Document) -> Option<Element<'a>> {
    let mut best: Option<(f64, Element<'a>)> = None;

    for candidate in CONTAINER_CANDIDATES {
        let Ok(elements) = doc.select(candidate) else { continue };
        for element in elements {
            let text = element.text();
            let text_len = text.trim().chars().count() as f64;
            if text_len == 0.0 {
                continue;
            }
            let score = text_len * (1.0 - link_text_ratio(&element));
            if best.as_ref().is_none_or(|(top, _)| score > *top) {
                best = Some((score, element));
            }
        }
    }

    best.map(|(_, element)| element)
}

/// Anchor-text share of an element's total text.
fn link_text_ratio(element: &Element<'_>) -> f64 {
    let total = element.text().chars().count();
    if total == 0 {
        return 0.0;
    }
    let anchor: usize = element
        .select("a")
        .unwrap_or_default()
        .iter()
        .map(|a| a.text().chars().count())
        .sum();
    anchor as f64 / total as f64
}

fn excluded(element: ElementRef<'_>, exclusion: &Regex) -> bool {
    let value = element.value();
    if EXCLUDED_TAGS.contains(&value.name()) {
        return true;
    }
    let class = value.attr("class").unwrap_or("");
    let id = value.attr("id").unwrap_or("");
    (!class.is_empty() && exclusion.is_match(class)) || (!id.is_empty() && exclusion.is_match(id))
}

fn qualifies(element: ElementRef<'_>, exclusion: &Regex) -> bool {
    if !PARAGRAPH_TAGS.contains(&element.value().name()) || excluded(element, exclusion) {
        return false;
    }
    trimmed_text_len(element) > MIN_QUALIFYING_LEN
}

/// One traversal step: skip excluded subtrees, accept leaf-most qualifying
/// blocks, descend otherwise.
fn walk<'a>(element: ElementRef<'a>, exclusion: &Regex, out: &mut Vec<ElementRef<'a>>) {
    if excluded(element, exclusion) {
        return;
    }

    let children: Vec<ElementRef<'a>> = element.children().filter_map(ElementRef::wrap).collect();
    let child_qualifies = children.iter().any(|c| qualifies(*c, exclusion));

    if qualifies(element, exclusion) && !child_qualifies {
        out.push(element);
        return;
    }

    for child in children {
        walk(child, exclusion, out);
    }
}

fn fallback_scan<'a>(doc: &'a Document, exclusion: &Regex) -> (Vec<ElementRef<'a>>, LayoutEstimate) {
    let layout = LayoutEstimate::of(doc.html.root_element());
    let elements = doc
        .select(FALLBACK_SELECTOR)
        .unwrap_or_default()
        .into_iter()
        .map(|el| el.element_ref())
        .filter(|el| !el.ancestors().filter_map(ElementRef::wrap).any(|a| excluded(a, exclusion)))
        .filter(|el| !excluded(*el, exclusion) && trimmed_text_len(*el) > MIN_QUALIFYING_LEN)
        .collect();
    (elements, layout)
}

fn trimmed_text_len(element: ElementRef<'_>) -> usize {
    text_without_scripts(element).chars().count()
}

/// Element text with script/style subtrees stripped and whitespace collapsed.
fn text_without_scripts(element: ElementRef<'_>) -> String {
    let mut parts: Vec<String> = Vec::new();
    collect_text(element, &mut parts);
    parts.join(" ").split_whitespace().collect::<Vec<_>>().join(" ")
}

fn collect_text(element: ElementRef<'_>, out: &mut Vec<String>) {
    for child in element.children() {
        if let Some(el) = ElementRef::wrap(child) {
            if matches!(el.value().name(), "script" | "style" | "noscript") {
                continue;
            }
            collect_text(el, out);
        } else if let Some(text) = child.value().as_text() {
            out.push(text.to_string());
        }
    }
}

fn materialize(element: ElementRef<'_>, layout: &LayoutEstimate, options: &ExtractionOptions) -> Option<Paragraph> {
    let text = text_without_scripts(element);
    if text.is_empty() {
        return None;
    }

    let value = element.value();
    let tag = value.name().to_lowercase();
    let class = value.attr("class").unwrap_or("").to_lowercase();

    let is_heading = matches!(tag.as_str(), "h1" | "h2" | "h3" | "h4" | "h5" | "h6");
    let heading_level = if is_heading { tag[1..].parse::<u8>().ok() } else { None };
    let is_quote = tag == "blockquote" || tag == "q" || value.attr("role") == Some("blockquote")
        || class.split_whitespace().any(|c| c.contains("quote"));
    let is_code = tag == "pre"
        || tag == "code"
        || class.split_whitespace().any(|c| c == "code" || c.contains("highlight"))
        || element.children().filter_map(ElementRef::wrap).any(|c| c.value().name() == "code");

    let bounds = layout.get(element.id()).unwrap_or_default();

    let importance = if options.score_paragraphs {
        score_importance(element, &text, &bounds, is_quote, is_code, &tag)
    } else {
        0.5
    };

    Some(Paragraph {
        id: String::new(),
        text,
        html: strip_script_html(&element.html()),
        index: 0,
        element_path: element_path(element),
        bounds,
        is_quote,
        is_code,
        is_heading,
        heading_level,
        importance,
        sentiment: None,
        entities: None,
        readability: None,
    })
}

/// Importance score: base 0.5, adjusted for length, position, container,
/// tag, structure type, and link density (anchors per word); clamped to
/// `[0, 1]`.
fn score_importance(
    element: ElementRef<'_>, text: &str, bounds: &Bounds, is_quote: bool, is_code: bool, tag: &str,
) -> f64 {
    let mut score = 0.5;
    let len = text.chars().count();

    if len > 100 {
        score += 0.1;
    }
    if len > 300 {
        score += 0.1;
    }
    if bounds.y < VIEWPORT_HEIGHT {
        score += 0.1;
    }
    if element.ancestors().filter_map(ElementRef::wrap).any(|a| a.value().name() == "article") {
        score += 0.1;
    }
    if tag == "p" {
        score += 0.05;
    }
    if is_quote {
        score -= 0.2;
    }
    if is_code {
        score -= 0.3;
    }

    let words = crate::content::count_words(text);
    if words > 0 {
        let anchors = element.descendants().filter_map(ElementRef::wrap).filter(|e| e.value().name() == "a").count();
        score -= 0.5 * (anchors as f64 / words as f64);
    }

    score.clamp(0.0, 1.0)
}

/// Structural selector path: id-anchored short-circuit, else tag plus up to
/// two classes plus `:nth-child`.
fn element_path(element: ElementRef<'_>) -> String {
    let mut segments = Vec::new();
    let mut current = Some(element);

    while let Some(el) = current {
        let value = el.value();
        let name = value.name();
        if matches!(name, "html" | "body") {
            break;
        }

        if let Some(id) = value.attr("id")
            && !id.is_empty()
        {
            segments.push(format!("{}#{}", name, id));
            break;
        }

        let mut segment = name.to_string();
        if let Some(class) = value.attr("class") {
            for class_name in class.split_whitespace().take(2) {
                segment.push('.');
                segment.push_str(class_name);
            }
        }
        let position = Element::new(el).sibling_position();
        if position > 1 {
            segment.push_str(&format!(":nth-child({})", position));
        }
        segments.push(segment);

        current = el.parent().and_then(ElementRef::wrap);
    }

    segments.reverse();
    segments.join(" > ")
}

/// Strip script/style from a paragraph's HTML fragment.
fn strip_script_html(html: &str) -> String {
    if !html.contains("<script") && !html.contains("<style") {
        return html.to_string();
    }
    let mut output = String::new();
    let mut rewriter = lol_html::HtmlRewriter::new(
        lol_html::Settings {
            element_content_handlers: vec![
                lol_html::element!("script", |el| {
                    el.remove();
                    Ok(())
                }),
                lol_html::element!("style", |el| {
                    el.remove();
                    Ok(())
                }),
            ],
            ..Default::default()
        },
        |c: &[u8]| output.push_str(&String::from_utf8_lossy(c)),
    );
    if rewriter.write(html.as_bytes()).is_err() || rewriter.end().is_err() {
        return html.to_string();
    }
    output
}

/// Merge paragraphs that inline markup split apart: neither side a heading,
/// quote, or code block; vertical gap within [`MERGE_GAP`]; the first does
/// not end a sentence; the second starts lowercase.
fn merge_fragments(paragraphs: Vec<Paragraph>) -> Vec<Paragraph> {
    let mut merged: Vec<Paragraph> = Vec::new();

    for paragraph in paragraphs {
        let mergeable = match merged.last() {
            Some(previous) => can_merge(previous, &paragraph),
            None => false,
        };
        if mergeable {
            let previous = merged.last_mut().unwrap();
            previous.text.push(' ');
            previous.text.push_str(&paragraph.text);
            previous.html.push('\n');
            previous.html.push_str(&paragraph.html);
            previous.bounds = previous.bounds.union(&paragraph.bounds);
        } else {
            merged.push(paragraph);
        }
    }

    merged
}

fn can_merge(first: &Paragraph, second: &Paragraph) -> bool {
    if first.is_heading || first.is_quote || first.is_code {
        return false;
    }
    if second.is_heading || second.is_quote || second.is_code {
        return false;
    }
    if first.bounds.gap_to(&second.bounds) > MERGE_GAP {
        return false;
    }
    if first.text.trim_end().ends_with(['.', '!', '?']) {
        return false;
    }
    second.text.chars().next().is_some_and(char::is_lowercase)
}

/// Reassign contiguous indices and regenerate ids after merge/filter passes.
fn reindex(mut paragraphs: Vec<Paragraph>) -> Vec<Paragraph> {
    for (i, paragraph) in paragraphs.iter_mut().enumerate() {
        paragraph.index = i;
        paragraph.id = format!("p-{}", i);
    }
    paragraphs
}

/// Group paragraphs into heading-delimited sections.
///
/// Headings are read from the container (they are often too short to survive
/// paragraph detection); paragraphs are attributed by vertical position.
/// Content before the first heading lands in a level-0 preamble section.
pub fn detect_sections(doc: &Document, paragraphs: &[Paragraph]) -> Vec<Section> {
    let Some(container) = select_container(doc) else { return Vec::new() };
    let layout = LayoutEstimate::of(container.element_ref());

    let mut headings: Vec<(f64, String, u8)> = Vec::new();
    for level in 1..=6u8 {
        let selector = format!("h{}", level);
        for heading in container.select(&selector).unwrap_or_default() {
            let text = heading.text().trim().to_string();
            if text.is_empty() {
                continue;
            }
            let y = layout.get(heading.node_id()).map_or(0.0, |b| b.y);
            headings.push((y, text, level));
        }
    }
    headings.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

    if headings.is_empty() {
        return Vec::new();
    }

    let mut sections: Vec<Section> = Vec::new();
    let preamble_indices: Vec<usize> =
        paragraphs.iter().filter(|p| p.bounds.y < headings[0].0).map(|p| p.index).collect();
    if !preamble_indices.is_empty() {
        sections.push(Section { heading: None, level: 0, paragraph_indices: preamble_indices });
    }

    for (i, (y, text, level)) in headings.iter().enumerate() {
        let end = headings.get(i + 1).map_or(f64::INFINITY, |next| next.0);
        let indices: Vec<usize> =
            paragraphs.iter().filter(|p| p.bounds.y >= *y && p.bounds.y < end).map(|p| p.index).collect();
        sections.push(Section { heading: Some(text.clone()), level: *level, paragraph_indices: indices });
    }

    sections
}
