//! Boilerplate removal and sanitization.
//!
//! [`clean`] operates on a deep copy of a parsed document and never touches
//! the input tree. Passes run in a fixed order: category removals, attribute
//! and class cleanup, media removal, empty-element pruning (to a fixed
//! point), hidden-element removal, then aggressive pruning. Every selector
//! application tolerates invalid selectors by logging and skipping them; no
//! pass ever fails.
//!
//! [`sanitize_html`] is the string-level allowlist sanitizer for callers that
//! only need a cleaned HTML string.

use std::collections::HashSet;

use ego_tree::NodeId;
use scraper::{ElementRef, Html, Node, Selector};
use tendril::StrTendril;

use crate::options::CleaningOptions;
use crate::parse::Document;

const AD_SELECTORS: &[&str] = &[
    ".ad", ".ads", ".advert", ".advertisement", ".ad-container", ".ad-wrapper", ".ad-banner", ".adsbygoogle",
    "[id^=\"ad-\"]", "[id^=\"google_ads\"]", "[class*=\"sponsored\"]", "[data-ad-slot]", "ins.adsbygoogle",
    "[id*=\"taboola\"]", "[class*=\"outbrain\"]",
];

const NAVIGATION_SELECTORS: &[&str] =
    &["nav", "[role=\"navigation\"]", ".navbar", ".nav-menu", ".menu-main", ".breadcrumb", ".breadcrumbs", ".pagination", ".pager"];

const COMMENT_SELECTORS: &[&str] =
    &["#comments", ".comments", ".comment-list", ".comment-section", "#disqus_thread", "[class*=\"comment-form\"]"];

const RELATED_SELECTORS: &[&str] =
    &[".related", ".related-posts", ".related-articles", ".recommended", ".read-more", ".more-stories", "[class*=\"related-content\"]"];

const FOOTER_SELECTORS: &[&str] = &["footer", "[role=\"contentinfo\"]", ".site-footer", ".page-footer", "#footer"];

const SIDEBAR_SELECTORS: &[&str] =
    &["aside", "[role=\"complementary\"]", ".sidebar", ".side-bar", "#sidebar", ".widget-area", ".rail"];

const POPUP_SELECTORS: &[&str] =
    &[".popup", ".modal", ".overlay", ".lightbox", "[class*=\"popup-\"]", "[role=\"dialog\"]", ".interstitial"];

const COOKIE_SELECTORS: &[&str] = &[
    "[class*=\"cookie-banner\"]", "[class*=\"cookie-consent\"]", "[id*=\"cookie-notice\"]", ".gdpr", ".consent-banner",
    "#onetrust-consent-sdk",
];

const NEWSLETTER_SELECTORS: &[&str] =
    &["[class*=\"newsletter\"]", "[class*=\"subscribe\"]", "[id*=\"signup\"]", ".email-capture"];

const SOCIAL_SELECTORS: &[&str] = &[
    "[class*=\"social-share\"]", "[class*=\"share-button\"]", "[class*=\"share-bar\"]", ".social-links", ".share-tools",
    "[class*=\"follow-us\"]",
];

/// Attributes that survive cleanup; `aria-*` attributes always survive.
const ALLOWED_ATTRIBUTES: &[&str] = &[
    "href", "src", "alt", "title", "class", "id", "data-src", "width", "height", "datetime", "cite", "lang", "dir",
];

const HIDDEN_CLASSES: &[&str] =
    &["hidden", "hide", "invisible", "sr-only", "visually-hidden", "screen-reader-text", "d-none", "offscreen"];

const STRUCTURAL_TAGS: &[&str] = &["table", "ul", "ol", "dl", "pre", "code"];

const MEDIA_TAGS: &[&str] = &["img", "picture", "video", "audio", "iframe", "embed", "object", "svg", "canvas"];

fn junk_class(name: &str) -> bool {
    if name.starts_with("js-") || name.starts_with("is-") || name.starts_with("has-") {
        return true;
    }
    if name.starts_with("css-") || name.starts_with("sc-") {
        return true;
    }
    // Identifier-style numeric suffixes ("comment-93841") carry no styling intent.
    let trailing_digits = name.chars().rev().take_while(|c| c.is_ascii_digit()).count();
    trailing_digits >= 4
}

fn promo_pattern(value: &str) -> bool {
    let lowered = value.to_lowercase();
    ["banner", "promo", "sponsor", "widget"].iter().any(|p| lowered.contains(p))
}

/// Remove boilerplate from a document, returning a cleaned deep copy.
pub fn clean(doc: &Document, options: &CleaningOptions) -> Document {
    let mut cleaned = doc.deep_copy();
    let keep = collect_keep_set(&cleaned.html, &options.custom_keep_selectors);

    let category_passes: &[(bool, &[&str])] = &[
        (options.remove_ads, AD_SELECTORS),
        (options.remove_navigation, NAVIGATION_SELECTORS),
        (options.remove_comments, COMMENT_SELECTORS),
        (options.remove_related, RELATED_SELECTORS),
        (options.remove_footers, FOOTER_SELECTORS),
        (options.remove_sidebars, SIDEBAR_SELECTORS),
        (options.remove_popups, POPUP_SELECTORS),
        (options.remove_cookie_banners, COOKIE_SELECTORS),
        (options.remove_newsletter, NEWSLETTER_SELECTORS),
    ];
    for (enabled, selectors) in category_passes {
        if *enabled {
            remove_matching(&mut cleaned.html, selectors.iter().copied(), &keep);
        }
    }
    remove_matching(&mut cleaned.html, SOCIAL_SELECTORS.iter().copied(), &keep);
    remove_matching(&mut cleaned.html, options.custom_remove_selectors.iter().map(String::as_str), &keep);

    // The allowlist drops `style` and `hidden`, so style-based hiding must be
    // recorded before the scrub and applied in the hidden pass afterwards.
    let hidden_by_style = collect_hidden_by_style(&cleaned.html, &keep);
    scrub_attributes(&mut cleaned.html);

    if !options.preserve_images {
        detach_by_tag(&mut cleaned.html, &["img", "picture"], &keep);
    }
    if !options.preserve_videos {
        detach_by_tag(&mut cleaned.html, &["video", "audio"], &keep);
    }
    if !options.preserve_iframes {
        detach_by_tag(&mut cleaned.html, &["iframe", "embed", "object"], &keep);
    }

    prune_empty_blocks(&mut cleaned.html, &keep);
    remove_hidden(&mut cleaned.html, &keep, &hidden_by_style);

    if options.aggressive {
        aggressive_prune(&mut cleaned.html, &keep);
    }

    cleaned
}

fn collect_keep_set(html: &Html, keep_selectors: &[String]) -> HashSet<NodeId> {
    let mut keep = HashSet::new();
    for raw in keep_selectors {
        match Selector::parse(raw) {
            Ok(sel) => keep.extend(html.select(&sel).map(|el| el.id())),
            Err(e) => tracing::warn!(selector = %raw, error = %e, "skipping invalid keep selector"),
        }
    }
    keep
}

fn remove_matching<'a>(html: &mut Html, selectors: impl Iterator<Item = &'a str>, keep: &HashSet<NodeId>) {
    for raw in selectors {
        let sel = match Selector::parse(raw) {
            Ok(sel) => sel,
            Err(e) => {
                tracing::warn!(selector = %raw, error = %e, "skipping invalid selector");
                continue;
            }
        };
        let ids: Vec<NodeId> = html.select(&sel).map(|el| el.id()).filter(|id| !keep.contains(id)).collect();
        detach_all(html, &ids);
    }
}

fn detach_by_tag(html: &mut Html, tags: &[&str], keep: &HashSet<NodeId>) {
    let ids: Vec<NodeId> = html
        .root_element()
        .descendants().filter_map(ElementRef::wrap)
        .filter(|el| tags.contains(&el.value().name()))
        .map(|el| el.id())
        .filter(|id| !keep.contains(id))
        .collect();
    detach_all(html, &ids);
}

fn detach_all(html: &mut Html, ids: &[NodeId]) {
    for id in ids {
        if let Some(mut node) = html.tree.get_mut(*id) {
            node.detach();
        }
    }
}

/// Drop attributes outside the allowlist and filter junk class names.
fn scrub_attributes(html: &mut Html) {
    let ids: Vec<NodeId> = html.root_element().descendants().filter_map(ElementRef::wrap).map(|el| el.id()).collect();
    for id in ids {
        let Some(mut node) = html.tree.get_mut(id) else { continue };
        let Node::Element(element) = node.value() else { continue };

        element
            .attrs
            .retain(|name, _| ALLOWED_ATTRIBUTES.contains(&name.local.as_ref()) || name.local.starts_with("aria-"));

        let class_key = element.attrs.keys().find(|k| k.local.as_ref() == "class").cloned();
        if let Some(key) = class_key {
            let filtered = element.attrs[&key]
                .split_whitespace()
                .filter(|c| !junk_class(c))
                .collect::<Vec<_>>()
                .join(" ");
            if filtered.is_empty() {
                element.attrs.remove(&key);
            } else {
                element.attrs.insert(key, StrTendril::from_slice(&filtered));
            }
        }
    }
}

/// Remove block elements with no text, media, or structural children.
///
/// Repeats until a fixed point: removing one empty wrapper can empty its
/// parent.
fn prune_empty_blocks(html: &mut Html, keep: &HashSet<NodeId>) {
    loop {
        let ids: Vec<NodeId> = html
            .root_element()
            .descendants().filter_map(ElementRef::wrap)
            .filter(|el| crate::layout::is_block_tag(el.value().name()))
            .filter(|el| !keep.contains(&el.id()))
            .filter(|el| is_empty_block(*el))
            .map(|el| el.id())
            .collect();
        if ids.is_empty() {
            break;
        }
        detach_all(html, &ids);
    }
}

fn is_empty_block(element: ElementRef<'_>) -> bool {
    if element.value().name() == "hr" {
        return false;
    }
    let has_text = element.text().any(|t| !t.trim().is_empty());
    if has_text {
        return false;
    }
    !element
        .descendants().filter_map(ElementRef::wrap)
        .any(|el| MEDIA_TAGS.contains(&el.value().name()) || STRUCTURAL_TAGS.contains(&el.value().name()))
}

/// Ids of elements hidden by inline style or the `hidden` attribute,
/// captured before the attribute scrub discards both.
fn collect_hidden_by_style(html: &Html, keep: &HashSet<NodeId>) -> Vec<NodeId> {
    html.root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(|el| !keep.contains(&el.id()))
        .filter(|el| {
            let value = el.value();
            if value.attr("hidden").is_some() {
                return true;
            }
            match value.attr("style") {
                Some(style) => {
                    let style = style.to_lowercase().replace(' ', "");
                    style.contains("display:none") || style.contains("visibility:hidden")
                }
                None => false,
            }
        })
        .map(|el| el.id())
        .collect()
}

/// Remove elements hidden by inline style, the `hidden` attribute, known
/// hidden class names, or zero-size attributes (images excepted: zero-size
/// images may be tracking pixels but removing them is the media pass's job).
fn remove_hidden(html: &mut Html, keep: &HashSet<NodeId>, hidden_by_style: &[NodeId]) {
    detach_all(html, hidden_by_style);
    let ids: Vec<NodeId> = html
        .root_element()
        .descendants().filter_map(ElementRef::wrap)
        .filter(|el| !keep.contains(&el.id()))
        .filter(|el| is_hidden(*el))
        .map(|el| el.id())
        .collect();
    detach_all(html, &ids);
}

fn is_hidden(element: ElementRef<'_>) -> bool {
    let value = element.value();
    if let Some(class) = value.attr("class")
        && class.split_whitespace().any(|c| HIDDEN_CLASSES.contains(&c))
    {
        return true;
    }
    if value.name() != "img"
        && (value.attr("width") == Some("0") || value.attr("height") == Some("0"))
    {
        return true;
    }
    false
}

/// Aggressive-mode pruning: short media-free divs, stray anchors outside
/// paragraphs and list items, and banner/promo/sponsor/widget blocks.
fn aggressive_prune(html: &mut Html, keep: &HashSet<NodeId>) {
    let mut ids: Vec<NodeId> = Vec::new();

    for el in html.root_element().descendants().filter_map(ElementRef::wrap) {
        if keep.contains(&el.id()) {
            continue;
        }
        let value = el.value();
        let name = value.name();

        if name == "div" {
            let text_len = el.text().map(|t| t.trim().len()).sum::<usize>();
            let has_children_of_note = el
                .descendants().filter_map(ElementRef::wrap)
                .any(|c| MEDIA_TAGS.contains(&c.value().name()) || STRUCTURAL_TAGS.contains(&c.value().name()));
            if text_len < 50 && !has_children_of_note {
                ids.push(el.id());
                continue;
            }
        }

        if name == "a" {
            let text_len = el.text().map(|t| t.trim().len()).sum::<usize>();
            let inside_prose = el
                .ancestors()
                .filter_map(ElementRef::wrap)
                .any(|a| matches!(a.value().name(), "p" | "li"));
            if text_len < 30 && !inside_prose {
                ids.push(el.id());
                continue;
            }
        }

        let class = value.attr("class").unwrap_or("");
        let id_attr = value.attr("id").unwrap_or("");
        if promo_pattern(class) || promo_pattern(id_attr) {
            ids.push(el.id());
        }
    }

    detach_all(html, &ids);
}

/// String-level allowlist sanitizer.
///
/// Dangerous elements are dropped wholesale, unknown elements are unwrapped,
/// and attributes are filtered against the same allowlist as [`clean`]. On a
/// rewriter failure the input is returned unchanged; this function never
/// errors.
pub fn sanitize_html(html: &str, options: &CleaningOptions) -> String {
    let mut output = String::new();
    let preserve_images = options.preserve_images;
    let preserve_videos = options.preserve_videos;
    let preserve_iframes = options.preserve_iframes;

    let mut rewriter = lol_html::HtmlRewriter::new(
        lol_html::Settings {
            element_content_handlers: vec![lol_html::element!("*", move |el| {
                let tag = el.tag_name().to_lowercase();

                let dangerous = matches!(
                    tag.as_str(),
                    "script" | "style" | "noscript" | "form" | "button" | "input" | "select" | "textarea" | "svg"
                        | "canvas"
                ) || (!preserve_iframes && matches!(tag.as_str(), "iframe" | "embed" | "object"))
                    || (!preserve_videos && matches!(tag.as_str(), "video" | "audio"))
                    || (!preserve_images && matches!(tag.as_str(), "img" | "picture"));
                if dangerous {
                    el.remove();
                    return Ok(());
                }

                if !allowed_tag(&tag) {
                    el.remove_and_keep_content();
                    return Ok(());
                }

                let names: Vec<String> = el.attributes().iter().map(|a| a.name()).collect();
                for name in names {
                    if !ALLOWED_ATTRIBUTES.contains(&name.as_str()) && !name.starts_with("aria-") {
                        el.remove_attribute(&name);
                    }
                }
                for url_attr in ["href", "src"] {
                    if let Some(value) = el.get_attribute(url_attr)
                        && value.trim_start().to_lowercase().starts_with("javascript:")
                    {
                        el.remove_attribute(url_attr);
                    }
                }
                Ok(())
            })],
            ..Default::default()
        },
        |c: &[u8]| {
            output.push_str(&String::from_utf8_lossy(c));
        },
    );

    if rewriter.write(html.as_bytes()).is_err() {
        return html.to_string();
    }
    if rewriter.end().is_err() {
        return html.to_string();
    }

    output
}

fn allowed_tag(tag: &str) -> bool {
    matches!(
        tag,
        "html" | "head" | "title" | "body" | "p" | "br" | "div" | "span" | "article" | "section" | "main" | "h1"
            | "h2" | "h3" | "h4" | "h5" | "h6" | "ul" | "ol" | "li" | "dl" | "dt" | "dd" | "blockquote" | "pre"
            | "code" | "em" | "strong" | "b" | "i" | "u" | "a" | "img" | "picture" | "figure" | "figcaption"
            | "table" | "thead" | "tbody" | "tr" | "td" | "th" | "caption" | "time" | "cite" | "q" | "sup" | "sub"
            | "hr" | "video" | "audio" | "iframe"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(html: &str) -> Document {
        Document::parse(html).unwrap()
    }

    #[test]
    fn test_category_removal_drops_nav_and_ads() {
        let input = doc(r#"
            <html><body>
                <nav class="navbar"><a href="/">Home</a></nav>
                <div class="ad-banner">Buy things</div>
                <article><p>Real content stays in place.</p></article>
            </body></html>
        "#);
        let cleaned = clean(&input, &CleaningOptions::default());
        let out = cleaned.as_string();

        assert!(!out.contains("navbar"));
        assert!(!out.contains("Buy things"));
        assert!(out.contains("Real content stays in place."));
    }

    #[test]
    fn test_clean_does_not_mutate_input() {
        let input = doc(r#"<html><body><nav>menu</nav><p>text</p></body></html>"#);
        let before = input.as_string();
        let _ = clean(&input, &CleaningOptions::default());
        assert_eq!(input.as_string(), before);
    }

    #[test]
    fn test_attribute_allowlist() {
        let input = doc(r#"<html><body><p onclick="evil()" style="color:red" data-track="x" aria-label="note" title="t">Text that should survive cleanup.</p></body></html>"#);
        let cleaned = clean(&input, &CleaningOptions::default());
        let out = cleaned.as_string();

        assert!(!out.contains("onclick"));
        assert!(!out.contains("data-track"));
        assert!(out.contains("aria-label"));
        assert!(out.contains("title=\"t\""));
    }

    #[test]
    fn test_junk_classes_filtered() {
        let input = doc(r#"<html><body><p class="js-toggle is-active prose comment-93841">Enough text to avoid the empty pruner.</p></body></html>"#);
        let cleaned = clean(&input, &CleaningOptions::default());
        let out = cleaned.as_string();

        assert!(out.contains("class=\"prose\""));
        assert!(!out.contains("js-toggle"));
        assert!(!out.contains("comment-93841"));
    }

    #[test]
    fn test_empty_wrappers_pruned_to_fixed_point() {
        let input = doc(r#"<html><body><div><div><div></div></div></div><p>kept paragraph text</p></body></html>"#);
        let cleaned = clean(&input, &CleaningOptions::default());
        let paragraphs = cleaned.select("p").unwrap();
        let divs = cleaned.select("div").unwrap();

        assert_eq!(paragraphs.len(), 1);
        assert!(divs.is_empty(), "nested empty wrappers should collapse entirely");
    }

    #[test]
    fn test_empty_block_with_image_survives() {
        let input = doc(r#"<html><body><figure><img src="a.png" alt=""></figure><p>text body here</p></body></html>"#);
        let cleaned = clean(&input, &CleaningOptions::default());
        assert_eq!(cleaned.select("img").unwrap().len(), 1);
    }

    #[test]
    fn test_hidden_elements_removed() {
        let input = doc(r#"
            <html><body>
                <p style="display:none">invisible one</p>
                <p hidden>invisible two</p>
                <p class="sr-only">invisible three</p>
                <p>visible paragraph text</p>
            </body></html>
        "#);
        let cleaned = clean(&input, &CleaningOptions::default());
        let out = cleaned.as_string();

        assert!(!out.contains("invisible one"));
        assert!(!out.contains("invisible two"));
        assert!(!out.contains("invisible three"));
        assert!(out.contains("visible paragraph text"));
    }

    #[test]
    fn test_media_removed_when_not_preserved() {
        let input = doc(r#"<html><body><img src="x.png"><p>body text stays here</p></body></html>"#);
        let options = CleaningOptions { preserve_images: false, ..Default::default() };
        let cleaned = clean(&input, &options);
        assert!(cleaned.select("img").unwrap().is_empty());
    }

    #[test]
    fn test_aggressive_mode_drops_short_divs_and_promos() {
        let input = doc(r#"
            <html><body>
                <div>tiny</div>
                <div class="promo-box">subscribe now</div>
                <article><p>A longer paragraph of genuine article prose that easily clears fifty characters.</p></article>
            </body></html>
        "#);
        let options = CleaningOptions { aggressive: true, ..Default::default() };
        let cleaned = clean(&input, &options);
        let out = cleaned.as_string();

        assert!(!out.contains("tiny"));
        assert!(!out.contains("subscribe now"));
        assert!(out.contains("genuine article prose"));
    }

    #[test]
    fn test_invalid_custom_selector_is_skipped() {
        let options =
            CleaningOptions { custom_remove_selectors: vec!["[[broken".to_string()], ..Default::default() };
        let input = doc(r#"<html><body><p>still here after the bad selector</p></body></html>"#);
        let cleaned = clean(&input, &options);
        assert!(cleaned.as_string().contains("still here"));
    }

    #[test]
    fn test_custom_keep_selector_survives_removal() {
        let options = CleaningOptions { custom_keep_selectors: vec!["nav.keep-me".to_string()], ..Default::default() };
        let input = doc(r#"<html><body><nav class="keep-me"><a href="/a">table of contents</a></nav><nav>menu</nav><p>body</p></body></html>"#);
        let cleaned = clean(&input, &options);
        let out = cleaned.as_string();

        assert!(out.contains("table of contents"));
        assert!(!out.contains("menu"));
    }

    #[test]
    fn test_sanitize_html_strips_scripts_and_event_handlers() {
        let html = r#"<div onclick="evil()"><script>alert(1)</script><p>Safe text</p><a href="javascript:evil()">link</a></div>"#;
        let out = sanitize_html(html, &CleaningOptions::default());

        assert!(!out.contains("script"));
        assert!(!out.contains("onclick"));
        assert!(!out.contains("javascript:"));
        assert!(out.contains("Safe text"));
    }

    #[test]
    fn test_sanitize_html_unwraps_unknown_elements() {
        let html = r#"<custom-widget><p>wrapped text</p></custom-widget>"#;
        let out = sanitize_html(html, &CleaningOptions::default());

        assert!(!out.contains("custom-widget"));
        assert!(out.contains("<p>wrapped text</p>"));
    }
}
