//! Minimal HTML document rendering for extracted content.

use crate::content::ExtractedContent;

/// Render content as a standalone HTML document: title and metadata header
/// followed by each paragraph's raw HTML in order.
pub fn convert_to_html(content: &ExtractedContent) -> String {
    let mut output = String::new();
    output.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    output.push_str(&format!("<title>{}</title>\n", escape(&content.title)));
    output.push_str("</head>\n<body>\n<header>\n");
    output.push_str(&format!("<h1>{}</h1>\n", escape(&content.title)));

    if let Some(author) = &content.metadata.author {
        output.push_str(&format!("<p class=\"byline\">{}</p>\n", escape(author)));
    }
    if let Some(published) = &content.metadata.published {
        output.push_str(&format!("<time datetime=\"{}\">{}</time>\n", escape(published), escape(published)));
    }

    output.push_str("</header>\n<main>\n");
    for paragraph in &content.paragraphs {
        output.push_str(&paragraph.html);
        output.push('\n');
    }
    output.push_str("</main>\n</body>\n</html>\n");
    output
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;").replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{Bounds, Metadata, Paragraph};

    #[test]
    fn test_html_wrapper_and_paragraph_order() {
        let paragraphs = vec![
            Paragraph {
                id: "p-0".to_string(),
                text: "First".to_string(),
                html: "<p>First</p>".to_string(),
                index: 0,
                element_path: String::new(),
                bounds: Bounds::default(),
                is_quote: false,
                is_code: false,
                is_heading: false,
                heading_level: None,
                importance: 0.5,
                sentiment: None,
                entities: None,
                readability: None,
            },
            Paragraph {
                id: "p-1".to_string(),
                text: "Second".to_string(),
                html: "<p>Second</p>".to_string(),
                index: 1,
                element_path: String::new(),
                bounds: Bounds::default(),
                is_quote: false,
                is_code: false,
                is_heading: false,
                heading_level: None,
                importance: 0.5,
                sentiment: None,
                entities: None,
                readability: None,
            },
        ];
        let content = ExtractedContent::new(
            "A <Title> & Co".to_string(),
            paragraphs,
            Metadata { author: Some("Writer".to_string()), ..Default::default() },
        );

        let html = convert_to_html(&content);
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<title>A &lt;Title&gt; &amp; Co</title>"));
        assert!(html.contains("class=\"byline\""));
        assert!(html.find("<p>First</p>").unwrap() < html.find("<p>Second</p>").unwrap());
    }
}
