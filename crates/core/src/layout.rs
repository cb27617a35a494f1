//! Coarse layout estimation for block elements.
//!
//! The detector's merge and viewport heuristics need vertical geometry, but
//! the parser does not render. This module assigns deterministic stacked
//! rectangles from reading order and text volume: leaf blocks advance a
//! vertical cursor by a line-wrap estimate, container blocks span their
//! children. The numbers are a heuristic signal only.

use std::collections::HashMap;

use scraper::ElementRef;
use ego_tree::NodeId;

use crate::content::Bounds;

/// Assumed page width in layout units.
pub const PAGE_WIDTH: f64 = 1000.0;
/// Vertical extent of the initial viewport, in layout units.
pub const VIEWPORT_HEIGHT: f64 = 900.0;

const LINE_HEIGHT: f64 = 22.0;
const CHARS_PER_LINE: usize = 85;
const BLOCK_MARGIN: f64 = 14.0;
const MEDIA_HEIGHT: f64 = 150.0;

const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "dd", "div", "dl", "dt", "fieldset", "figcaption", "figure",
    "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li", "main", "nav", "ol", "p", "pre",
    "section", "table", "td", "th", "tr", "ul",
];

const MEDIA_TAGS: &[&str] = &["img", "picture", "video", "iframe", "embed", "object", "canvas", "svg", "audio"];

pub(crate) fn is_block_tag(tag: &str) -> bool {
    BLOCK_TAGS.contains(&tag)
}

/// Estimated bounds for every block element under a root, keyed by node id.
pub struct LayoutEstimate {
    bounds: HashMap<NodeId, Bounds>,
}

impl LayoutEstimate {
    /// Walk `root` and assign stacked rectangles to its block elements.
    pub fn of(root: ElementRef<'_>) -> Self {
        let mut estimate = Self { bounds: HashMap::new() };
        let mut cursor = 0.0;
        estimate.place(root, &mut cursor);
        estimate
    }

    /// Bounds for an element, if it was laid out as a block.
    pub fn get(&self, id: NodeId) -> Option<Bounds> {
        self.bounds.get(&id).copied()
    }

    fn place(&mut self, element: ElementRef<'_>, cursor: &mut f64) -> f64 {
        let tag = element.value().name();
        let top = *cursor;

        if MEDIA_TAGS.contains(&tag) {
            let bounds = Bounds { x: 0.0, y: top, width: PAGE_WIDTH, height: MEDIA_HEIGHT };
            self.bounds.insert(element.id(), bounds);
            *cursor = top + MEDIA_HEIGHT + BLOCK_MARGIN;
            return MEDIA_HEIGHT;
        }

        let block_children: Vec<ElementRef<'_>> = element
            .children()
            .filter_map(ElementRef::wrap)
            .filter(|c| is_block_tag(c.value().name()) || MEDIA_TAGS.contains(&c.value().name()))
            .collect();

        let height = if block_children.is_empty() {
            let chars = element.text().map(str::len).sum::<usize>();
            let lines = (chars / CHARS_PER_LINE + 1).max(1);
            lines as f64 * LINE_HEIGHT
        } else {
            for child in block_children {
                self.place(child, cursor);
            }
            (*cursor - top - BLOCK_MARGIN).max(LINE_HEIGHT)
        };

        if is_block_tag(tag) {
            let bounds = Bounds { x: 0.0, y: top, width: PAGE_WIDTH, height };
            self.bounds.insert(element.id(), bounds);
            *cursor = top + height + BLOCK_MARGIN;
        }
        height
    }
}
