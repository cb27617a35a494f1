//! Metadata extraction with priority fallback chains.
//!
//! Each field is resolved through an ordered chain: JSON-LD first, then Open
//! Graph / Twitter meta tags, then generic meta tags, then DOM fallbacks.

use crate::content::Metadata;
use crate::parse::Document;

impl Document {
    /// Extract the article title with priority fallback:
    /// 1. JSON-LD `headline`
    /// 2. Open Graph `og:title`
    /// 3. Twitter `twitter:title`
    /// 4. First `<h1>` element
    /// 5. `<title>` element
    ///
    /// The first `<h1>` outranks `<title>` because page titles routinely
    /// append site names and section labels that the in-content heading
    /// does not carry.
    pub fn extract_title(&self) -> Option<String> {
        if let Some(json_ld) = self.extract_json_ld_first()
            && let Some(headline) = json_ld.get("headline")
            && let Some(value) = headline.as_str()
        {
            return Some(value.to_string());
        }

        if let Some(title) = self.meta_content("og:title") {
            return Some(title);
        }
        if let Some(title) = self.meta_content("twitter:title") {
            return Some(title);
        }

        if let Ok(elements) = self.select("h1")
            && let Some(first) = elements.first()
        {
            let text = first.text();
            let text = text.trim();
            if !text.is_empty() {
                return Some(text.to_string());
            }
        }

        self.title().filter(|t| !t.is_empty())
    }

    /// Extract the author with priority fallback:
    /// 1. JSON-LD `author.name`
    /// 2. Meta `author`
    /// 3. `[rel="author"]` link text
    /// 4. `[itemprop="author"]` text
    /// 5. Class containing "author" or "byline"
    pub fn extract_author(&self) -> Option<String> {
        if let Some(json_ld) = self.extract_json_ld_first()
            && let Some(author) = json_ld.get("author")
            && let Some(name) = author_name_from_json_ld(author)
        {
            return Some(name);
        }

        if let Some(author) = self.meta_content("author") {
            return Some(author);
        }

        for selector in ["[rel=\"author\"]", "[itemprop=\"author\"]"] {
            if let Ok(elements) = self.select(selector)
                && let Some(first) = elements.first()
            {
                let text = first.text();
                let text = text.trim();
                if !text.is_empty() {
                    return Some(text.to_string());
                }
            }
        }

        for pattern in ["author", "byline"] {
            let selector = format!("[class*=\"{}\"]", pattern);
            if let Ok(elements) = self.select(&selector) {
                for el in elements.iter().take(3) {
                    let text = el.text();
                    let text = text.trim();
                    if !text.is_empty() && text.len() < 100 {
                        return Some(text.to_string());
                    }
                }
            }
        }

        None
    }

    /// Extract the publication date: JSON-LD `datePublished`, then
    /// `article:published_time`, then the first `<time datetime>`.
    pub fn extract_published(&self) -> Option<String> {
        if let Some(json_ld) = self.extract_json_ld_first()
            && let Some(date) = json_ld.get("datePublished")
            && let Some(value) = date.as_str()
        {
            return Some(value.to_string());
        }

        if let Some(date) = self.meta_content("article:published_time") {
            return Some(date);
        }

        if let Ok(elements) = self.select("time[datetime]")
            && let Some(first) = elements.first()
            && let Some(datetime) = first.attr("datetime")
        {
            return Some(datetime.to_string());
        }

        None
    }

    /// Extract the last-modified date: JSON-LD `dateModified`, then
    /// `article:modified_time`.
    pub fn extract_modified(&self) -> Option<String> {
        if let Some(json_ld) = self.extract_json_ld_first()
            && let Some(date) = json_ld.get("dateModified")
            && let Some(value) = date.as_str()
        {
            return Some(value.to_string());
        }
        self.meta_content("article:modified_time")
    }

    /// Extract the description: JSON-LD, `og:description`, then meta
    /// `description`.
    pub fn extract_description(&self) -> Option<String> {
        if let Some(json_ld) = self.extract_json_ld_first()
            && let Some(desc) = json_ld.get("description")
            && let Some(value) = desc.as_str()
        {
            return Some(value.to_string());
        }
        if let Some(desc) = self.meta_content("og:description") {
            return Some(desc);
        }
        self.meta_content("description")
    }

    /// Extract the site name: JSON-LD `publisher.name`, `og:site_name`, then
    /// the base URL's domain.
    pub fn extract_site_name(&self) -> Option<String> {
        if let Some(json_ld) = self.extract_json_ld_first()
            && let Some(publisher) = json_ld.get("publisher")
            && let Some(name) = publisher.get("name")
            && let Some(value) = name.as_str()
        {
            return Some(value.to_string());
        }
        if let Some(site) = self.meta_content("og:site_name") {
            return Some(site);
        }
        self.base_url().and_then(|u| u.domain()).map(|d| d.to_string())
    }

    /// Extract the lead image: `og:image`, then `twitter:image`.
    pub fn extract_image(&self) -> Option<String> {
        if let Some(image) = self.meta_content("og:image") {
            return Some(image);
        }
        self.meta_content("twitter:image")
    }

    /// Extract keywords from the meta `keywords` tag, comma-separated.
    pub fn extract_keywords(&self) -> Vec<String> {
        self.meta_content("keywords")
            .map(|k| k.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect())
            .unwrap_or_default()
    }

    /// Document language from the `<html lang>` attribute.
    pub fn language(&self) -> Option<String> {
        let html_el = self.select("html").ok()?.into_iter().next()?;
        html_el.attr("lang").map(|l| l.split('-').next().unwrap_or(l).to_lowercase())
    }

    /// Extract all metadata fields at once.
    pub fn extract_metadata(&self) -> Metadata {
        Metadata {
            author: self.extract_author(),
            description: self.extract_description(),
            published: self.extract_published(),
            modified: self.extract_modified(),
            site_name: self.extract_site_name(),
            url: self.base_url().map(|u| u.to_string()),
            image: self.extract_image(),
            keywords: self.extract_keywords(),
        }
    }

    /// First JSON-LD object in the document, if any parses.
    pub(crate) fn extract_json_ld_first(&self) -> Option<serde_json::Value> {
        let scripts = self.select("script[type=\"application/ld+json\"]").ok()?;
        for script in scripts {
            let raw = script.inner_html();
            if let Ok(value) = serde_json::from_str::<serde_json::Value>(raw.trim()) {
                match value {
                    serde_json::Value::Array(items) => {
                        if let Some(first) = items.into_iter().next() {
                            return Some(first);
                        }
                    }
                    other => return Some(other),
                }
            }
        }
        None
    }

    /// Meta tag content by `name` or `property` attribute.
    fn meta_content(&self, attr: &str) -> Option<String> {
        for selector in [format!("meta[name=\"{}\"]", attr), format!("meta[property=\"{}\"]", attr)] {
            if let Ok(elements) = self.select(&selector)
                && let Some(el) = elements.first()
                && let Some(content) = el.attr("content")
            {
                let content = content.trim();
                if !content.is_empty() {
                    return Some(content.to_string());
                }
            }
        }
        None
    }
}

fn author_name_from_json_ld(author: &serde_json::Value) -> Option<String> {
    match author {
        serde_json::Value::String(name) => Some(name.clone()),
        serde_json::Value::Object(obj) => obj.get("name").and_then(|n| n.as_str()).map(|s| s.to_string()),
        serde_json::Value::Array(items) => items.first().and_then(author_name_from_json_ld),
        _ => None,
    }
}
