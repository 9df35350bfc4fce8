//! Artifact serialization for transport: table artifacts to HTML table
//! markup, rendered plots to base64.

use base64::Engine as _;

/// CSS classes carried on every rendered table, matching the frontend's
/// styling hooks.
pub const TABLE_CLASSES: &str = "table table-striped table-hover";

/// A computed, read-only table: row labels, column headers, and string
/// cells. Cell values arrive already rounded/formatted by the engine that
/// produced them; serialization must not alter them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableArtifact {
    pub index: Vec<String>,
    pub columns: Vec<String>,
    pub cells: Vec<Vec<String>>,
}

impl TableArtifact {
    pub fn row_count(&self) -> usize {
        self.index.len()
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

/// Render a table artifact as HTML table markup: header row with a leading
/// blank cell for the index, one `<th>` row label per body row, stable
/// column order.
pub fn table_markup(table: &TableArtifact) -> String {
    let mut html = String::new();
    html.push_str(&format!("<table class=\"{}\">\n", TABLE_CLASSES));
    html.push_str("  <thead>\n    <tr>\n      <th></th>\n");
    for column in &table.columns {
        html.push_str(&format!("      <th>{}</th>\n", escape(column)));
    }
    html.push_str("    </tr>\n  </thead>\n  <tbody>\n");
    for (label, row) in table.index.iter().zip(&table.cells) {
        html.push_str("    <tr>\n");
        html.push_str(&format!("      <th>{}</th>\n", escape(label)));
        for cell in row {
            html.push_str(&format!("      <td>{}</td>\n", escape(cell)));
        }
        html.push_str("    </tr>\n");
    }
    html.push_str("  </tbody>\n</table>");
    html
}

/// Encode rendered PNG bytes for inline embedding.
pub fn png_base64(bytes: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> TableArtifact {
        TableArtifact {
            index: vec!["0".into(), "1".into()],
            columns: vec!["a".into(), "b<c".into()],
            cells: vec![
                vec!["1.00".into(), "x&y".into()],
                vec!["2.00".into(), "z".into()],
            ],
        }
    }

    #[test]
    fn markup_has_header_and_body_rows() {
        let html = table_markup(&sample());
        assert!(html.starts_with("<table class=\"table table-striped table-hover\">"));
        assert_eq!(html.matches("<th>").count(), 5); // blank + 2 headers + 2 labels
        assert_eq!(html.matches("<td>").count(), 4);
    }

    #[test]
    fn markup_escapes_cells_and_headers() {
        let html = table_markup(&sample());
        assert!(html.contains("<th>b&lt;c</th>"));
        assert!(html.contains("<td>x&amp;y</td>"));
    }

    #[test]
    fn base64_round_trips() {
        use base64::Engine as _;
        let encoded = png_base64(b"\x89PNG\r\n");
        let decoded = base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .unwrap();
        assert_eq!(decoded, b"\x89PNG\r\n");
    }
}
