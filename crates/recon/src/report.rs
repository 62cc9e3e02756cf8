//! Tabular rendering of classified rows.
//!
//! The reporter stops at "sorted rows plus column layout". Writing a table to
//! a workbook or CSV belongs to the io crate.

use serde::Serialize;

use crate::identifier::SourceKind;
use crate::index::IndexStats;
use crate::model::{MatchRow, ReconResult};

pub const PERFECT_ALL_SOURCES: &str = "perfect-all-sources";
pub const SUMMARY: &str = "summary";
pub const BUCKET_COUNTS: &str = "bucket-counts";

/// One named table, ready for any tabular writer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportTable {
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Which optional columns a match table carries.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReportLayout {
    pub include_extraction: bool,
}

impl ReportLayout {
    fn columns(&self) -> Vec<String> {
        let mut columns = vec![
            "Inventory Number".to_string(),
            "Original Value".to_string(),
            "Alma Holdings IDs".to_string(),
            "FileMaker Record IDs".to_string(),
        ];
        if self.include_extraction {
            columns.push("Extraction Rows".to_string());
        }
        columns
    }
}

/// Render one category. Rows are sorted by identifier in plain byte order,
/// so `M10` sorts before `M9`.
pub fn render<'a>(
    category_name: &str,
    rows: impl IntoIterator<Item = &'a MatchRow>,
    layout: ReportLayout,
) -> ReportTable {
    let mut sorted: Vec<&MatchRow> = rows.into_iter().collect();
    sorted.sort_by(|a, b| a.identifier.cmp(&b.identifier));

    let rows = sorted
        .into_iter()
        .map(|row| {
            let mut cells = vec![
                row.identifier.to_string(),
                row.original_value.clone().unwrap_or_default(),
                row.display_refs(SourceKind::Alma),
                row.display_refs(SourceKind::FileMaker),
            ];
            if layout.include_extraction {
                cells.push(row.display_refs(SourceKind::Extraction));
            }
            cells
        })
        .collect();

    ReportTable {
        name: category_name.to_string(),
        columns: layout.columns(),
        rows,
    }
}

/// Per-source counts, one row per index.
pub fn render_stats(stats: &[IndexStats]) -> ReportTable {
    ReportTable {
        name: SUMMARY.to_string(),
        columns: ["Source", "Total", "Unique", "Singletons", "Repeats", "Empty"]
            .iter()
            .map(|c| c.to_string())
            .collect(),
        rows: stats
            .iter()
            .map(|s| {
                vec![
                    s.source.label().to_string(),
                    s.total.to_string(),
                    s.distinct.to_string(),
                    s.singletons.to_string(),
                    s.repeats.to_string(),
                    s.empty.to_string(),
                ]
            })
            .collect(),
    }
}

/// Every table for a run: summary, bucket counts, one table per category
/// (empty categories included), then the three-source perfect matches when
/// the run had an extraction source.
pub fn render_all(result: &ReconResult) -> Vec<ReportTable> {
    let layout = ReportLayout {
        include_extraction: result.has_extraction(),
    };

    let mut tables = vec![render_stats(&result.index_stats)];

    tables.push(ReportTable {
        name: BUCKET_COUNTS.to_string(),
        columns: vec!["Category".to_string(), "Rows".to_string()],
        rows: result
            .buckets
            .iter()
            .map(|(category, rows)| vec![category.name().to_string(), rows.len().to_string()])
            .collect(),
    });

    for (category, rows) in &result.buckets {
        tables.push(render(category.name(), rows, layout));
    }

    if let Some(ref perfect) = result.perfect_all_sources {
        tables.push(render(PERFECT_ALL_SOURCES, perfect, layout));
    }

    tables
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identifier::normalize;
    use crate::model::RecordRef;

    fn row(id: &str, original: Option<&str>, alma: &[&str], fm: &[&str]) -> MatchRow {
        MatchRow {
            identifier: normalize(Some(id), SourceKind::Extraction),
            original_value: original.map(str::to_string),
            alma: alma.iter().map(|r| RecordRef::new(*r)).collect(),
            filemaker: fm.iter().map(|r| RecordRef::new(*r)).collect(),
            extraction: Vec::new(),
        }
    }

    #[test]
    fn sorts_lexically() {
        let rows = vec![
            row("M9", None, &["A1"], &[]),
            row("M10", None, &[], &["F1", "F2"]),
            row("DVD1", Some("DVD1|M9"), &["A2"], &[]),
        ];
        let table = render("multiple-FileMaker-no-Alma", &rows, ReportLayout::default());

        assert_eq!(table.name, "multiple-FileMaker-no-Alma");
        assert_eq!(table.columns.len(), 4);
        let ids: Vec<&str> = table.rows.iter().map(|r| r[0].as_str()).collect();
        assert_eq!(ids, vec!["DVD1", "M10", "M9"]);
        assert_eq!(table.rows[0][1], "DVD1|M9");
        assert_eq!(table.rows[1][3], "F1|F2");
    }

    #[test]
    fn extraction_column_is_optional() {
        let mut r = row("M1", None, &["A1"], &["F1"]);
        r.extraction = vec![RecordRef::new("row 2")];
        let table = render("perfect-match", [&r], ReportLayout { include_extraction: true });
        assert_eq!(table.columns.last().map(String::as_str), Some("Extraction Rows"));
        assert_eq!(table.rows[0][4], "row 2");
    }

    #[test]
    fn empty_category_still_renders() {
        let table = render("multiple-both", std::iter::empty(), ReportLayout::default());
        assert!(table.rows.is_empty());
        assert_eq!(table.columns[0], "Inventory Number");
    }
}
