//! The grid walk shared by every ERP report.
//!
//! The ERP's grids render sparse markup when there is nothing to show: no
//! table at all, a single "No Record Found" cell, or spacer rows. None of
//! those are errors; they all end up as fewer records.

use crate::document::{Document, Node};
use tracing::debug;

const NO_RECORD_MARKERS: [&str; 2] = ["No Record", "No Data"];

/// Where a grid lives and how wide a data row must be.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TableSpec {
    pub id: &'static str,
    pub min_cells: usize,
    /// Leading rows to skip before looking at data.
    pub header_rows: usize,
}

impl TableSpec {
    pub const fn new(id: &'static str, min_cells: usize) -> Self {
        Self {
            id,
            min_cells,
            header_rows: 1,
        }
    }

    /// For grids whose header uses `th` cells only; those rows fall out as too narrow.
    pub const fn without_header(mut self) -> Self {
        self.header_rows = 0;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RowShape {
    Data,
    /// "No record" marker; nothing after it is data.
    Sentinel,
    Skip,
}

pub(crate) fn is_sentinel_text(text: &str) -> bool {
    NO_RECORD_MARKERS.iter().any(|marker| text.contains(marker))
}

/// Classifies a row by its cell count and, for single-cell rows, its text.
pub(crate) fn classify(cell_count: usize, sole_text: Option<&str>, min_cells: usize) -> RowShape {
    if cell_count == 1 && sole_text.is_some_and(is_sentinel_text) {
        return RowShape::Sentinel;
    }
    if cell_count >= min_cells {
        RowShape::Data
    } else {
        RowShape::Skip
    }
}

/// Text of the single cell of a one-cell row.
pub(crate) fn sole_text(cells: &[Node<'_>]) -> Option<String> {
    match cells {
        [only] => Some(only.text()),
        _ => None,
    }
}

/// Trimmed text of cell `index`, `""` when the row is shorter.
pub(crate) fn text_at(cells: &[Node<'_>], index: usize) -> String {
    cells.get(index).map(|cell| cell.text()).unwrap_or_default()
}

/// Text of the `span` nested in cell `index`; the ERP highlights percentages that way.
pub(crate) fn span_at(cells: &[Node<'_>], index: usize) -> String {
    cells
        .get(index)
        .and_then(|cell| cell.nested_text("span"))
        .unwrap_or_default()
}

/// Rows of the grid `id` after the header, or `None` when the page has no such grid.
pub(crate) fn body_rows<'a>(document: &'a Document, id: &str, header_rows: usize) -> Option<Vec<Node<'a>>> {
    let table = document.by_id(id)?;
    Some(table.rows().into_iter().skip(header_rows).collect())
}

/// Walks the grid described by `spec`, mapping each data row with `map`.
///
/// `map` may return `None` to drop a row it considers empty.
pub(crate) fn parse_table<T>(
    document: &Document,
    spec: TableSpec,
    mut map: impl FnMut(&[Node<'_>]) -> Option<T>,
) -> Vec<T> {
    let Some(rows) = body_rows(document, spec.id, spec.header_rows) else {
        debug!(table = spec.id, "table not rendered, no records");
        return Vec::new();
    };

    let mut records = Vec::new();
    for row in &rows {
        let cells = row.cells();
        match classify(cells.len(), sole_text(&cells).as_deref(), spec.min_cells) {
            RowShape::Sentinel => break,
            RowShape::Skip => continue,
            RowShape::Data => {
                if let Some(record) = map(&cells) {
                    records.push(record);
                }
            }
        }
    }
    debug!(table = spec.id, rows = rows.len(), records = records.len(), "parsed table");
    records
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_rules() {
        assert_eq!(classify(1, Some("No Record Found"), 5), RowShape::Sentinel);
        assert_eq!(classify(1, Some("No Data Available"), 5), RowShape::Sentinel);
        assert_eq!(classify(1, Some("something"), 5), RowShape::Skip);
        assert_eq!(classify(1, Some("No Record Found"), 1), RowShape::Sentinel);
        assert_eq!(classify(4, None, 5), RowShape::Skip);
        assert_eq!(classify(5, None, 5), RowShape::Data);
        assert_eq!(classify(9, None, 5), RowShape::Data);
    }

    fn first_cells(html: &str, spec: TableSpec) -> Vec<String> {
        let doc = Document::parse(html);
        parse_table(&doc, spec, |cells| Some(text_at(cells, 0)))
    }

    #[test]
    fn missing_table_is_zero_records() {
        let rows = first_cells("<html><body><p>nothing</p></body></html>", TableSpec::new("grid", 2));
        assert!(rows.is_empty());
    }

    #[test]
    fn sentinel_stops_the_walk() {
        let html = r#"<table id="grid">
            <tr><th>A</th><th>B</th></tr>
            <tr><td>1</td><td>x</td></tr>
            <tr><td colspan="2">No Record Found</td></tr>
            <tr><td>2</td><td>y</td></tr>
        </table>"#;
        assert_eq!(first_cells(html, TableSpec::new("grid", 2)), vec!["1"]);
    }

    #[test]
    fn short_rows_are_skipped_not_fatal() {
        let html = r#"<table id="grid">
            <tr><td>header</td><td>row</td></tr>
            <tr><td>spacer</td></tr>
            <tr><td>1</td><td>x</td></tr>
            <tr><td></td></tr>
            <tr><td>2</td><td>y</td></tr>
        </table>"#;
        assert_eq!(first_cells(html, TableSpec::new("grid", 2)), vec!["1", "2"]);
    }

    #[test]
    fn header_skip_is_configurable() {
        let html = r#"<table id="grid"><tr><td>1</td><td>x</td></tr><tr><td>2</td><td>y</td></tr></table>"#;
        assert_eq!(first_cells(html, TableSpec::new("grid", 2)), vec!["2"]);
        assert_eq!(
            first_cells(html, TableSpec::new("grid", 2).without_header()),
            vec!["1", "2"]
        );
    }

    #[test]
    fn span_values_come_from_the_child_element() {
        let doc = Document::parse(
            r#"<table id="g"><tr><td>x</td></tr><tr><td>Total <span>87.5</span></td><td>plain</td></tr></table>"#,
        );
        let rows = body_rows(&doc, "g", 1).unwrap();
        let cells = rows[0].cells();
        assert_eq!(span_at(&cells, 0), "87.5");
        assert_eq!(span_at(&cells, 1), "");
        assert_eq!(text_at(&cells, 5), "");
    }
}
