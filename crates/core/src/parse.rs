//! HTML parsing and DOM navigation.
//!
//! This module provides the [`Document`] and [`Element`] types for parsing
//! HTML and walking the tree with CSS selectors. The underlying `scraper`
//! tree is crate-visible so the cleaner can perform node surgery on a deep
//! copy without exposing `scraper` types in the public API.

use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::{ExtractError, Result};

/// A parsed HTML document.
///
/// # Example
///
/// ```rust
/// use excerpta_core::parse::Document;
///
/// let html = "<html><head><title>Test</title></head><body><p>Hello</p></body></html>";
/// let doc = Document::parse(html).unwrap();
/// assert_eq!(doc.title(), Some("Test".to_string()));
/// ```
pub struct Document {
    pub(crate) html: Html,
    pub(crate) base_url: Option<Url>,
}

impl Document {
    /// Parses HTML from a string.
    pub fn parse(html: &str) -> Result<Self> {
        let html = Html::parse_document(html);
        Ok(Self { html, base_url: None })
    }

    /// Parses HTML with a base URL for relative-link resolution.
    pub fn parse_with_base(html: &str, base_url: Option<Url>) -> Result<Self> {
        let html = Html::parse_document(html);
        Ok(Self { html, base_url })
    }

    /// The base URL this document was parsed against, if any.
    pub fn base_url(&self) -> Option<&Url> {
        self.base_url.as_ref()
    }

    /// The entire document serialized back to HTML.
    pub fn as_string(&self) -> String {
        self.html.html()
    }

    /// Deep copy of the document; mutations on the copy never touch `self`.
    pub fn deep_copy(&self) -> Document {
        Document { html: self.html.clone(), base_url: self.base_url.clone() }
    }

    /// Selects elements using a CSS selector.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::HtmlParse`] if the selector is invalid.
    pub fn select(&'_ self, selector: &str) -> Result<Vec<Element<'_>>> {
        let sel =
            Selector::parse(selector).map_err(|e| ExtractError::HtmlParse(format!("Invalid selector: {}", e)))?;
        Ok(self.html.select(&sel).map(Element::new).collect())
    }

    /// The content of the `<title>` element, if present.
    pub fn title(&self) -> Option<String> {
        let selector = Selector::parse("title").ok()?;
        self.html.select(&selector).next().map(|el| el.text().collect::<String>().trim().to_string())
    }

    /// Concatenated text of every node in the document.
    pub fn text_content(&self) -> String {
        self.html.root_element().text().collect()
    }
}

/// A single element in the document tree.
#[derive(Clone, Debug)]
pub struct Element<'a> {
    pub(crate) element: ElementRef<'a>,
}

impl<'a> Element<'a> {
    pub(crate) fn new(element: ElementRef<'a>) -> Self {
        Self { element }
    }

    /// The HTML content inside this element, excluding its own tags.
    pub fn inner_html(&self) -> String {
        self.element.inner_html()
    }

    /// The HTML content including this element's own tags.
    pub fn outer_html(&self) -> String {
        self.element.html()
    }

    /// Concatenated text of every node within this element.
    pub fn text(&self) -> String {
        self.element.text().collect()
    }

    /// The value of an attribute, if present.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.element.value().attr(name)
    }

    /// The lowercase tag name.
    pub fn tag_name(&self) -> String {
        self.element.value().name().to_lowercase()
    }

    /// Selects descendant elements using a CSS selector.
    pub fn select(&'_ self, selector: &str) -> Result<Vec<Element<'a>>> {
        let sel =
            Selector::parse(selector).map_err(|e| ExtractError::HtmlParse(format!("Invalid selector: {}", e)))?;
        Ok(self.element.select(&sel).map(Element::new).collect())
    }

    /// Direct child elements in document order.
    pub fn children(&self) -> Vec<Element<'a>> {
        self.element.children().filter_map(ElementRef::wrap).map(Element::new).collect()
    }

    /// The parent element, unless this is the root.
    pub fn parent(&self) -> Option<Element<'a>> {
        self.element.parent().and_then(ElementRef::wrap).map(Element::new)
    }

    /// 1-based position among the parent's element children.
    pub fn sibling_position(&self) -> usize {
        let Some(parent) = self.element.parent() else { return 1 };
        let mut position = 1;
        for child in parent.children() {
            if child.id() == self.element.id() {
                return position;
            }
            if ElementRef::wrap(child).is_some() {
                position += 1;
            }
        }
        position
    }

    pub(crate) fn node_id(&self) -> ego_tree::NodeId {
        self.element.id()
    }

    pub(crate) fn element_ref(&self) -> ElementRef<'a> {
        self.element
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_HTML: &str = r#"
        <!DOCTYPE html>
        <html lang="en">
        <head>
            <meta charset="UTF-8">
            <title>Test Page</title>
        </head>
        <body>
            <h1>Heading</h1>
            <p class="content">Paragraph 1</p>
            <p class="content">Paragraph 2</p>
            <a href="https://example.com">Link</a>
        </body>
        </html>
    "#;

    #[test]
    fn test_parse_document() {
        let doc = Document::parse(SAMPLE_HTML).unwrap();
        assert_eq!(doc.title(), Some("Test Page".to_string()));
    }

    #[test]
    fn test_select_elements() {
        let doc = Document::parse(SAMPLE_HTML).unwrap();
        let elements = doc.select("p.content").unwrap();

        assert_eq!(elements.len(), 2);
        assert_eq!(elements[0].text(), "Paragraph 1");
        assert_eq!(elements[1].text(), "Paragraph 2");
    }

    #[test]
    fn test_element_attributes() {
        let doc = Document::parse(SAMPLE_HTML).unwrap();
        let elements = doc.select("a").unwrap();

        assert_eq!(elements.len(), 1);
        assert_eq!(elements[0].attr("href"), Some("https://example.com"));
    }

    #[test]
    fn test_invalid_selector() {
        let doc = Document::parse(SAMPLE_HTML).unwrap();
        let result = doc.select("[[invalid");
        assert!(matches!(result, Err(ExtractError::HtmlParse(_))));
    }

    #[test]
    fn test_sibling_position() {
        let doc = Document::parse(SAMPLE_HTML).unwrap();
        let paragraphs = doc.select("p.content").unwrap();
        assert_eq!(paragraphs[0].sibling_position(), 2);
        assert_eq!(paragraphs[1].sibling_position(), 3);
    }

    #[test]
    fn test_deep_copy_is_independent() {
        let doc = Document::parse(SAMPLE_HTML).unwrap();
        let copy = doc.deep_copy();
        assert_eq!(doc.as_string(), copy.as_string());
    }
}
