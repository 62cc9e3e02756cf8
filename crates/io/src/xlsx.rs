// Spreadsheet import (extraction sheet) and report workbook export

use std::borrow::Cow;
use std::path::Path;

use calamine::{open_workbook_auto, Data, Range, Reader};
use invmatch_recon::compound::SEPARATOR;
use invmatch_recon::config::ExtractionSource;
use invmatch_recon::model::ExtractionRow;
use invmatch_recon::ReportTable;
use rust_xlsxwriter::{Format, Workbook};

use crate::error::LoadError;

/// Excel caps worksheet names at 31 characters.
const MAX_SHEET_NAME: usize = 31;

/// Excel's per-cell text limit.
const MAX_CELL_CHARS: usize = 32_767;

/// Room left for the `|… (+N more)` marker when a cell is cut.
const MARKER_RESERVE: usize = 40;

/// Worksheet rows minus the header row.
const MAX_DATA_ROWS: usize = 1_048_575;

/// Load the extraction column from the configured sheet.
///
/// `.xlsx`, `.xlsm`, `.xls`, `.xlsb` and `.ods` files are read through calamine.
/// `.csv` files are treated as a single-sheet export and the sheet name is ignored.
pub fn load_extraction(path: &Path, source: &ExtractionSource) -> Result<Vec<ExtractionRow>, LoadError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    let rows = match ext.as_str() {
        "csv" => crate::csv::load_extraction(path, &source.column)?,
        "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" => load_sheet(path, source)?,
        _ => {
            return Err(LoadError::UnsupportedFormat {
                path: path.display().to_string(),
            })
        }
    };

    tracing::debug!(
        path = %path.display(),
        sheet = %source.sheet,
        rows = rows.len(),
        "loaded extraction rows"
    );
    Ok(rows)
}

fn load_sheet(path: &Path, source: &ExtractionSource) -> Result<Vec<ExtractionRow>, LoadError> {
    let mut workbook = open_workbook_auto(path).map_err(|e| sheet_err(path, e.to_string()))?;

    if !workbook.sheet_names().iter().any(|name| name == &source.sheet) {
        return Err(LoadError::MissingSheet {
            path: path.display().to_string(),
            sheet: source.sheet.clone(),
        });
    }

    let range = workbook
        .worksheet_range(&source.sheet)
        .map_err(|e| sheet_err(path, format!("sheet '{}': {}", source.sheet, e)))?;

    rows_from_range(&range, &source.column, path)
}

fn rows_from_range(range: &Range<Data>, column: &str, path: &Path) -> Result<Vec<ExtractionRow>, LoadError> {
    let missing = || LoadError::MissingColumn {
        path: path.display().to_string(),
        column: column.to_string(),
    };

    let mut rows = range.rows();
    let header = rows.next().ok_or_else(missing)?;
    let col_idx = header
        .iter()
        .position(|cell| cell_text(cell).trim() == column)
        .ok_or_else(missing)?;

    // Spreadsheet row numbers are 1-based; the range may not start at A1.
    let header_row = range.start().map_or(0, |(row, _)| row as usize) + 1;

    Ok(rows
        .enumerate()
        .map(|(i, cells)| {
            let text = cells.get(col_idx).map(cell_text).unwrap_or_default();
            ExtractionRow {
                row_number: header_row + i + 1,
                extracted: Some(text).filter(|t| !t.is_empty()),
            }
        })
        .collect())
}

/// Render a cell the way it reads in the sheet. Whole floats drop the `.0`
/// so numeric inventory numbers match their text form in the catalogs.
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        Data::Float(f) => f.to_string(),
        Data::Int(n) => n.to_string(),
        Data::Bool(b) => b.to_string().to_uppercase(),
        other => other.to_string(),
    }
}

/// Write one worksheet per table, header row in bold and frozen.
///
/// Every table gets at least one sheet. Cells over Excel's length limit are
/// cut at a reference boundary with a `… (+N more)` marker, and tables taller
/// than a worksheet continue on `name (2)`, `name (3)` and so on. The JSON
/// output is the place for untruncated reference lists.
pub fn write_report(tables: &[ReportTable], path: &Path) -> Result<(), LoadError> {
    write_report_paged(tables, path, MAX_DATA_ROWS)
}

fn write_report_paged(tables: &[ReportTable], path: &Path, rows_per_sheet: usize) -> Result<(), LoadError> {
    let write_err = |e: rust_xlsxwriter::XlsxError| LoadError::Write {
        path: path.display().to_string(),
        message: e.to_string(),
    };

    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();
    let mut sheets = 0usize;
    let mut truncated = 0usize;

    for table in tables {
        let no_rows: &[Vec<String>] = &[];
        let pages: Vec<&[Vec<String>]> = if table.rows.is_empty() {
            vec![no_rows]
        } else {
            table.rows.chunks(rows_per_sheet.max(1)).collect()
        };
        if pages.len() > 1 {
            tracing::warn!(table = %table.name, sheets = pages.len(), "table split across sheets");
        }

        for (page, rows) in pages.iter().enumerate() {
            let worksheet = workbook
                .add_worksheet()
                .set_name(page_sheet_name(&table.name, page))
                .map_err(write_err)?;
            sheets += 1;

            for (col, title) in table.columns.iter().enumerate() {
                worksheet
                    .write_string_with_format(0, col as u16, title, &header_format)
                    .map_err(write_err)?;
            }

            for (row_idx, row) in rows.iter().enumerate() {
                let row_num = row_idx as u32 + 1;
                for (col, value) in row.iter().enumerate() {
                    if value.is_empty() {
                        continue;
                    }
                    let cell = fit_cell(value);
                    if matches!(cell, Cow::Owned(_)) {
                        truncated += 1;
                    }
                    worksheet
                        .write_string(row_num, col as u16, &*cell)
                        .map_err(write_err)?;
                }
            }

            worksheet.set_freeze_panes(1, 0).map_err(write_err)?;
            worksheet.autofit();
        }
    }

    if truncated > 0 {
        tracing::warn!(cells = truncated, "cells over Excel's length limit were truncated in the workbook");
    }

    workbook.save(path).map_err(write_err)?;
    tracing::debug!(path = %path.display(), sheets, "wrote report workbook");
    Ok(())
}

/// Shorten a cell to Excel's limit, keeping whole references.
fn fit_cell(value: &str) -> Cow<'_, str> {
    if value.chars().count() <= MAX_CELL_CHARS {
        return Cow::Borrowed(value);
    }

    let budget = MAX_CELL_CHARS - MARKER_RESERVE;
    let parts: Vec<&str> = value.split(SEPARATOR).collect();
    let mut kept = String::new();
    let mut kept_chars = 0usize;
    let mut kept_parts = 0usize;

    for part in &parts {
        let extra = part.chars().count() + usize::from(kept_parts > 0);
        if kept_chars + extra > budget {
            break;
        }
        if kept_parts > 0 {
            kept.push(SEPARATOR);
        }
        kept.push_str(part);
        kept_chars += extra;
        kept_parts += 1;
    }

    if kept_parts == 0 {
        let mut cut: String = value.chars().take(budget).collect();
        cut.push_str("… (truncated)");
        return Cow::Owned(cut);
    }

    kept.push_str(&format!("{SEPARATOR}… (+{} more)", parts.len() - kept_parts));
    Cow::Owned(kept)
}

/// Sheet name for one page of a table: the plain name first, then `name (2)`.
fn page_sheet_name(name: &str, page: usize) -> String {
    if page == 0 {
        return sheet_name(name);
    }
    let suffix = format!(" ({})", page + 1);
    let mut base: String = sheet_name(name)
        .chars()
        .take(MAX_SHEET_NAME - suffix.chars().count())
        .collect();
    base.push_str(&suffix);
    base
}

fn sheet_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '[' | ']' | ':' | '*' | '?' | '/' | '\\' => '_',
            c => c,
        })
        .take(MAX_SHEET_NAME)
        .collect()
}

fn sheet_err(path: &Path, message: String) -> LoadError {
    LoadError::Sheet {
        path: path.display().to_string(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calamine::{open_workbook, Xlsx};
    use tempfile::tempdir;

    fn table(name: &str, rows: &[&[&str]]) -> ReportTable {
        ReportTable {
            name: name.to_string(),
            columns: vec!["Inventory Number".to_string(), "Alma Holdings IDs".to_string()],
            rows: rows
                .iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        }
    }

    #[test]
    fn report_round_trips_through_calamine() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("report.xlsx");
        let tables = vec![
            table("multiple-Alma-no-FileMaker", &[&["INV_NO_02", "A2|A3"]]),
            table("unmatched-both", &[]),
        ];

        write_report(&tables, &path).unwrap();

        let mut wb: Xlsx<_> = open_workbook(&path).unwrap();
        assert_eq!(wb.sheet_names(), vec!["multiple-Alma-no-FileMaker", "unmatched-both"]);

        let range = wb.worksheet_range("multiple-Alma-no-FileMaker").unwrap();
        assert_eq!(range.get_value((0, 0)), Some(&Data::String("Inventory Number".into())));
        assert_eq!(range.get_value((1, 1)), Some(&Data::String("A2|A3".into())));

        let empty = wb.worksheet_range("unmatched-both").unwrap();
        assert_eq!(empty.height(), 1);
    }

    #[test]
    fn extraction_from_named_sheet() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tapes.xlsx");

        let mut wb = Workbook::new();
        wb.add_worksheet().set_name("Overview").unwrap();
        let ws = wb.add_worksheet().set_name("Tapes(row 4560-24712)").unwrap();
        ws.write_string(0, 0, "Legacy Path").unwrap();
        ws.write_string(0, 1, "Inventory Number [EXTRACTED]").unwrap();
        ws.write_string(1, 0, "XFE4098M_XFF104M").unwrap();
        ws.write_string(1, 1, "XFE4098M|XFF104M").unwrap();
        ws.write_string(2, 0, "untitled").unwrap();
        ws.write_string(3, 0, "numeric").unwrap();
        ws.write_number(3, 1, 4417.0).unwrap();
        wb.save(&path).unwrap();

        let rows = load_extraction(&path, &ExtractionSource::with_file("tapes.xlsx")).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].row_number, 2);
        assert_eq!(rows[0].extracted.as_deref(), Some("XFE4098M|XFF104M"));
        assert_eq!(rows[1].extracted, None);
        assert_eq!(rows[2].extracted.as_deref(), Some("4417"));
    }

    #[test]
    fn missing_sheet_is_reported() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tapes.xlsx");
        let mut wb = Workbook::new();
        wb.add_worksheet().set_name("Sheet1").unwrap();
        wb.save(&path).unwrap();

        let err = load_extraction(&path, &ExtractionSource::with_file("tapes.xlsx")).unwrap_err();
        assert!(matches!(err, LoadError::MissingSheet { .. }));
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let err = load_extraction(Path::new("tapes.txt"), &ExtractionSource::with_file("tapes.txt"))
            .unwrap_err();
        assert!(matches!(err, LoadError::UnsupportedFormat { .. }));
    }

    #[test]
    fn oversized_reference_list_still_writes_workbook() {
        use invmatch_recon::model::{AlmaHolding, FileMakerRecord};
        use invmatch_recon::{render_all, run, Category, ReconConfig, ReconInput};

        let mut filemaker: Vec<FileMakerRecord> = (0..5000)
            .map(|n| FileMakerRecord {
                inventory_no: Some("N/A".to_string()),
                record_id: format!("fm-record-{n:05}"),
            })
            .collect();
        filemaker.push(FileMakerRecord {
            inventory_no: Some("M123".to_string()),
            record_id: "F1".to_string(),
        });
        let input = ReconInput {
            alma: vec![AlmaHolding {
                call_number: Some("M123".to_string()),
                holding_id: "A1".to_string(),
            }],
            filemaker,
            extraction: None,
        };
        let result = run(&ReconConfig::named("placeholder"), &input).unwrap();

        let dir = tempdir().unwrap();
        let path = dir.path().join("report.xlsx");
        write_report(&render_all(&result), &path).unwrap();
        assert!(path.exists());

        let mut wb: Xlsx<_> = open_workbook(&path).unwrap();
        let range = wb.worksheet_range(Category::MultipleFileMakerNoAlma.name()).unwrap();
        let Some(Data::String(cell)) = range.get_value((1, 3)) else {
            panic!("FileMaker ids missing");
        };
        assert!(cell.chars().count() <= MAX_CELL_CHARS);
        assert!(cell.starts_with("fm-record-00000|fm-record-00001"));
        assert!(cell.ends_with("more)"));

        let perfect = wb.worksheet_range(Category::PerfectMatch.name()).unwrap();
        assert_eq!(perfect.get_value((1, 0)), Some(&Data::String("M123".into())));

        // Full list stays in the result.
        let row = result.bucket(Category::MultipleFileMakerNoAlma).next().unwrap();
        assert_eq!(row.filemaker_count(), 5000);
    }

    #[test]
    fn fit_cell_cuts_at_reference_boundary() {
        assert!(matches!(fit_cell("A1|A2"), Cow::Borrowed("A1|A2")));

        let refs: Vec<String> = (0..10_000).map(|n| format!("R{n}")).collect();
        let joined = refs.join("|");
        let cell = fit_cell(&joined);
        assert!(cell.chars().count() <= MAX_CELL_CHARS);

        let (kept, marker) = cell.rsplit_once('|').unwrap();
        let kept_refs: Vec<&str> = kept.split('|').collect();
        assert_eq!(kept_refs, refs[..kept_refs.len()].iter().map(String::as_str).collect::<Vec<_>>());
        assert_eq!(marker, format!("… (+{} more)", refs.len() - kept_refs.len()));
    }

    #[test]
    fn fit_cell_single_long_value() {
        let long = "x".repeat(MAX_CELL_CHARS + 10);
        let cell = fit_cell(&long);
        assert!(cell.chars().count() <= MAX_CELL_CHARS);
        assert!(cell.ends_with("… (truncated)"));
    }

    #[test]
    fn tall_tables_continue_on_numbered_sheets() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("report.xlsx");
        let rows: [&[&str]; 5] = [&["M1", "A1"], &["M2", "A2"], &["M3", "A3"], &["M4", "A4"], &["M5", "A5"]];
        let tables = vec![table("one-sided", &rows), table("unmatched-both", &[])];

        write_report_paged(&tables, &path, 2).unwrap();

        let mut wb: Xlsx<_> = open_workbook(&path).unwrap();
        assert_eq!(
            wb.sheet_names(),
            vec!["one-sided", "one-sided (2)", "one-sided (3)", "unmatched-both"]
        );
        let last = wb.worksheet_range("one-sided (3)").unwrap();
        assert_eq!(last.height(), 2);
        assert_eq!(last.get_value((0, 0)), Some(&Data::String("Inventory Number".into())));
        assert_eq!(last.get_value((1, 0)), Some(&Data::String("M5".into())));
    }

    #[test]
    fn continuation_names_fit_the_limit() {
        let name = "each-resolves-to-exactly-one-more";
        let page = page_sheet_name(name, 11);
        assert!(page.chars().count() <= MAX_SHEET_NAME);
        assert!(page.ends_with(" (12)"));
    }

    #[test]
    fn sheet_names_are_sanitized() {
        assert_eq!(sheet_name("a/b:c"), "a_b_c");
        assert_eq!(sheet_name(&"x".repeat(40)).len(), 31);
    }
}
