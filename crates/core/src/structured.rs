//! Structured-content extraction: tables, lists, embeds, and JSON-LD.
//!
//! These readers run over the cleaned document, each gated by its own
//! extraction-option toggle.

use crate::content::{ContentList, ContentTable, Embed};
use crate::parse::Document;

/// Extract every table with its caption, header row, and body rows.
pub fn extract_tables(doc: &Document) -> Vec<ContentTable> {
    let mut tables = Vec::new();
    for table in doc.select("table").unwrap_or_default() {
        let caption = table
            .select("caption")
            .unwrap_or_default()
            .first()
            .map(|c| c.text().trim().to_string())
            .filter(|c| !c.is_empty());

        let headers: Vec<String> = table
            .select("th")
            .unwrap_or_default()
            .iter()
            .map(|th| th.text().trim().to_string())
            .collect();

        let mut rows = Vec::new();
        for tr in table.select("tr").unwrap_or_default() {
            let cells: Vec<String> =
                tr.select("td").unwrap_or_default().iter().map(|td| td.text().trim().to_string()).collect();
            if !cells.is_empty() {
                rows.push(cells);
            }
        }

        if !headers.is_empty() || !rows.is_empty() {
            tables.push(ContentTable { caption, headers, rows });
        }
    }
    tables
}

/// Extract top-level ordered and unordered lists.
///
/// Nested lists are flattened into their items' text, matching how they
/// read; only lists that are not themselves inside another list produce a
/// record.
pub fn extract_lists(doc: &Document) -> Vec<ContentList> {
    let mut lists = Vec::new();
    for list in doc.select("ul, ol").unwrap_or_default() {
        let nested = {
            let mut inside = false;
            let mut parent = list.parent();
            while let Some(p) = parent {
                if matches!(p.tag_name().as_str(), "ul" | "ol") {
                    inside = true;
                    break;
                }
                parent = p.parent();
            }
            inside
        };
        if nested {
            continue;
        }

        let items: Vec<String> = list
            .select("li")
            .unwrap_or_default()
            .iter()
            .map(|li| li.text().split_whitespace().collect::<Vec<_>>().join(" "))
            .filter(|t| !t.is_empty())
            .collect();
        if !items.is_empty() {
            lists.push(ContentList { ordered: list.tag_name() == "ol", items });
        }
    }
    lists
}

/// Extract embedded media references: iframes, videos, and objects.
pub fn extract_embeds(doc: &Document) -> Vec<Embed> {
    let mut embeds = Vec::new();
    for (selector, kind) in [("iframe", "iframe"), ("video", "video"), ("embed", "embed"), ("object", "object")] {
        for el in doc.select(selector).unwrap_or_default() {
            let src = el.attr("src").or_else(|| el.attr("data-src")).unwrap_or("");
            if src.is_empty() {
                continue;
            }
            embeds.push(Embed {
                kind: kind.to_string(),
                src: src.to_string(),
                title: el.attr("title").map(|t| t.to_string()),
            });
        }
    }
    embeds
}

/// Every JSON-LD block that parses, in document order.
pub fn extract_structured_data(doc: &Document) -> Vec<serde_json::Value> {
    let mut values = Vec::new();
    for script in doc.select("script[type=\"application/ld+json\"]").unwrap_or_default() {
        let raw = script.inner_html();
        if let Ok(value) = serde_json::from_str::<serde_json::Value>(raw.trim()) {
            match value {
                serde_json::Value::Array(items) => values.extend(items),
                other => values.push(other),
            }
        }
    }
    values
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(html: &str) -> Document {
        Document::parse(html).unwrap()
    }

    #[test]
    fn test_extract_table_with_headers_and_rows() {
        let doc = doc(r#"
            <html><body><table>
                <caption>Results</caption>
                <tr><th>Name</th><th>Score</th></tr>
                <tr><td>First</td><td>10</td></tr>
                <tr><td>Second</td><td>20</td></tr>
            </table></body></html>
        "#);
        let tables = extract_tables(&doc);

        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].caption.as_deref(), Some("Results"));
        assert_eq!(tables[0].headers, vec!["Name", "Score"]);
        assert_eq!(tables[0].rows.len(), 2);
        assert_eq!(tables[0].rows[0], vec!["First", "10"]);
    }

    #[test]
    fn test_extract_lists_skips_nested() {
        let doc = doc(r#"
            <html><body>
                <ul><li>outer one<ul><li>inner</li></ul></li><li>outer two</li></ul>
                <ol><li>step one</li><li>step two</li></ol>
            </body></html>
        "#);
        let lists = extract_lists(&doc);

        assert_eq!(lists.len(), 2);
        assert!(!lists[0].ordered);
        assert_eq!(lists[0].items.len(), 2);
        assert!(lists[1].ordered);
        assert_eq!(lists[1].items, vec!["step one", "step two"]);
    }

    #[test]
    fn test_extract_embeds_reads_src_and_title() {
        let doc = doc(r#"
            <html><body>
                <iframe src="https://player.example.com/v/1" title="Player"></iframe>
                <video src="movie.mp4"></video>
                <iframe></iframe>
            </body></html>
        "#);
        let embeds = extract_embeds(&doc);

        assert_eq!(embeds.len(), 2);
        assert_eq!(embeds[0].kind, "iframe");
        assert_eq!(embeds[0].title.as_deref(), Some("Player"));
        assert_eq!(embeds[1].kind, "video");
    }

    #[test]
    fn test_extract_structured_data_flattens_arrays() {
        let doc = doc(r#"
            <html><head>
                <script type="application/ld+json">[{"@type":"Article"},{"@type":"Person"}]</script>
                <script type="application/ld+json">{"@type":"Organization"}</script>
                <script type="application/ld+json">not json</script>
            </head><body></body></html>
        "#);
        let values = extract_structured_data(&doc);

        assert_eq!(values.len(), 3);
        assert_eq!(values[2]["@type"], "Organization");
    }
}
