//! Summary tables rendered as HTML or plain text.

use serde::{Deserialize, Serialize};

/// One table row: a list of cells, optionally marked as a header.
///
/// A single-cell row spans the full table width.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRow {
    pub cells: Vec<String>,
    pub header: bool,
}

impl TableRow {
    /// A body row.
    #[must_use]
    pub fn new<I, S>(cells: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            cells: cells.into_iter().map(Into::into).collect(),
            header: false,
        }
    }

    /// A header row.
    #[must_use]
    pub fn header<I, S>(cells: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            header: true,
            ..Self::new(cells)
        }
    }

    /// A single full-width body cell.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::new([text.into()])
    }

    /// A single full-width header cell.
    #[must_use]
    pub fn heading(text: impl Into<String>) -> Self {
        Self::header([text.into()])
    }
}

/// An ordered list of rows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub rows: Vec<TableRow>,
}

impl Table {
    #[must_use]
    pub const fn new(rows: Vec<TableRow>) -> Self {
        Self { rows }
    }

    /// Widest row.
    #[must_use]
    pub fn column_count(&self) -> usize {
        self.rows.iter().map(|r| r.cells.len()).max().unwrap_or(0)
    }

    /// Renders the table as HTML without any line breaks, suitable for
    /// storing in a single keyword value.
    #[must_use]
    pub fn to_html(&self) -> String {
        let columns = self.column_count();
        let mut html = String::from(r#"<table class="table table-condensed">"#);
        for row in &self.rows {
            let tag = if row.header { "th" } else { "td" };
            html.push_str("<tr>");
            if row.cells.len() == 1 && columns > 1 {
                html.push_str(&format!(
                    r#"<{tag} colspan="{columns}">{}</{tag}>"#,
                    escape_html(&row.cells[0])
                ));
            } else {
                for cell in &row.cells {
                    html.push_str(&format!("<{tag}>{}</{tag}>", escape_html(cell)));
                }
            }
            html.push_str("</tr>");
        }
        html.push_str("</table>");
        html
    }
}

/// Plain text with columns padded to a common width. Header rows are
/// followed by a rule.
impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut widths: Vec<usize> = vec![0; self.column_count()];
        for row in self.rows.iter().filter(|r| r.cells.len() > 1) {
            for (width, cell) in widths.iter_mut().zip(&row.cells) {
                *width = (*width).max(cell.chars().count());
            }
        }
        let full_width = widths.iter().sum::<usize>() + 2 * widths.len().saturating_sub(1);

        for row in &self.rows {
            let line = if row.cells.len() > 1 {
                row.cells
                    .iter()
                    .zip(&widths)
                    .map(|(cell, &w)| format!("{cell:<w$}"))
                    .collect::<Vec<_>>()
                    .join("  ")
                    .trim_end()
                    .to_string()
            } else {
                row.cells.first().cloned().unwrap_or_default()
            };
            writeln!(f, "{line}")?;
            if row.header {
                let rule = full_width.max(line.chars().count());
                writeln!(f, "{}", "-".repeat(rule))?;
            }
        }
        Ok(())
    }
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\n' => escaped.push(' '),
            _ => escaped.push(c),
        }
    }
    escaped
}
