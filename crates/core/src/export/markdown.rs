//! Markdown rendering for extracted content.
//!
//! The title renders as an H1, known metadata fields as a bold-label block,
//! then the paragraphs: headings from `#`-repeat, quotes `>`-prefixed, code
//! fenced, everything else as plain text. When sections are present they
//! render hierarchically; otherwise paragraphs render in flat reading order.

use crate::content::{ExtractedContent, Paragraph};

/// Render content as Markdown.
pub fn convert_to_markdown(content: &ExtractedContent) -> String {
    let mut output = String::new();

    if !content.title.is_empty() {
        output.push_str(&format!("# {}\n\n", content.title));
    }

    let metadata_block = metadata_block(content);
    if !metadata_block.is_empty() {
        output.push_str(&metadata_block);
        output.push('\n');
    }

    if content.sections.is_empty() {
        for paragraph in &content.paragraphs {
            output.push_str(&render_paragraph(paragraph));
        }
    } else {
        for section in &content.sections {
            if let Some(heading) = &section.heading {
                let level = section.level.clamp(1, 6) as usize;
                output.push_str(&format!("{} {}\n\n", "#".repeat(level), heading));
            }
            for index in &section.paragraph_indices {
                if let Some(paragraph) = content.paragraphs.get(*index) {
                    if paragraph.is_heading && section.heading.as_deref() == Some(paragraph.text.as_str()) {
                        continue;
                    }
                    output.push_str(&render_paragraph(paragraph));
                }
            }
        }
    }

    output.trim_end().to_string()
}

fn metadata_block(content: &ExtractedContent) -> String {
    let mut block = String::new();
    if let Some(author) = &content.metadata.author {
        block.push_str(&format!("**Author:** {}\n", author));
    }
    if let Some(published) = &content.metadata.published {
        block.push_str(&format!("**Published:** {}\n", published));
    }
    if let Some(site) = &content.metadata.site_name {
        block.push_str(&format!("**Site:** {}\n", site));
    }
    if content.word_count > 0 {
        block.push_str(&format!("**Words:** {}\n", content.word_count));
    }
    block
}

fn render_paragraph(paragraph: &Paragraph) -> String {
    if paragraph.is_heading {
        let level = paragraph.heading_level.unwrap_or(2).clamp(1, 6) as usize;
        return format!("{} {}\n\n", "#".repeat(level), paragraph.text);
    }
    if paragraph.is_code {
        return format!("```\n{}\n```\n\n", paragraph.text);
    }
    if paragraph.is_quote {
        let quoted = paragraph.text.lines().map(|l| format!("> {}", l)).collect::<Vec<_>>().join("\n");
        return format!("{}\n\n", quoted);
    }
    format!("{}\n\n", paragraph.text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{Bounds, Metadata, Section};

    fn paragraph(index: usize, text: &str) -> Paragraph {
        Paragraph {
            id: format!("p-{}", index),
            text: text.to_string(),
            html: format!("<p>{}</p>", text),
            index,
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
        }
    }

    #[test]
    fn test_markdown_scenario() {
        let content = ExtractedContent::new(
            "Test Article".to_string(),
            vec![paragraph(0, "First paragraph")],
            Metadata { author: Some("Test Author".to_string()), ..Default::default() },
        );

        let markdown = convert_to_markdown(&content);
        assert!(markdown.contains("# Test Article"));
        assert!(markdown.contains("**Author:** Test Author"));
        assert!(markdown.contains("First paragraph"));
    }

    #[test]
    fn test_paragraph_kinds_render_distinctly() {
        let mut heading = paragraph(0, "Section heading text");
        heading.is_heading = true;
        heading.heading_level = Some(3);
        let mut quote = paragraph(1, "a quoted line");
        quote.is_quote = true;
        let mut code = paragraph(2, "let x = 1;");
        code.is_code = true;

        let content = ExtractedContent::new("T".to_string(), vec![heading, quote, code], Metadata::default());
        let markdown = convert_to_markdown(&content);

        assert!(markdown.contains("### Section heading text"));
        assert!(markdown.contains("> a quoted line"));
        assert!(markdown.contains("```\nlet x = 1;\n```"));
    }

    #[test]
    fn test_sections_render_hierarchically() {
        let mut content = ExtractedContent::new(
            "Doc".to_string(),
            vec![paragraph(0, "Intro paragraph"), paragraph(1, "Body paragraph")],
            Metadata::default(),
        );
        content.sections = vec![
            Section { heading: None, level: 0, paragraph_indices: vec![0] },
            Section { heading: Some("Details".to_string()), level: 2, paragraph_indices: vec![1] },
        ];

        let markdown = convert_to_markdown(&content);
        let details_pos = markdown.find("## Details").unwrap();
        let body_pos = markdown.find("Body paragraph").unwrap();
        assert!(details_pos < body_pos);
        assert!(markdown.find("Intro paragraph").unwrap() < details_pos);
    }
}
