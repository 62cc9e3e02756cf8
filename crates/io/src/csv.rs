// CSV import: Alma holdings export, extraction sheet saved as CSV

use std::io::Read;
use std::path::Path;

use invmatch_recon::config::AlmaSource;
use invmatch_recon::model::{AlmaHolding, ExtractionRow};

use crate::error::LoadError;

/// Load the Alma holdings export. Short rows and blank cells are kept with a
/// `None` call number so they show up in the empty counts.
pub fn load_alma(path: &Path, source: &AlmaSource) -> Result<Vec<AlmaHolding>, LoadError> {
    let content = read_file_as_utf8(path)?;
    let mut reader = reader_for(&content);
    let headers = headers(&mut reader, path)?;

    let call_idx = column_index(&headers, &source.identifier_column, path)?;
    let id_idx = column_index(&headers, &source.reference_column, path)?;

    let mut holdings = Vec::new();
    for (n, record) in reader.records().enumerate() {
        let record = record.map_err(|e| csv_err(path, e))?;
        let line = record_line(&record, n);
        let holding_id = match record.get(id_idx) {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => format!("line {line}"),
        };
        holdings.push(AlmaHolding {
            call_number: non_empty(record.get(call_idx)),
            holding_id,
        });
    }

    tracing::debug!(path = %path.display(), rows = holdings.len(), "loaded Alma holdings");
    Ok(holdings)
}

/// Load extraction rows from a CSV copy of the sheet.
pub fn load_extraction(path: &Path, column: &str) -> Result<Vec<ExtractionRow>, LoadError> {
    let content = read_file_as_utf8(path)?;
    let mut reader = reader_for(&content);
    let headers = headers(&mut reader, path)?;
    let col_idx = column_index(&headers, column, path)?;

    let mut rows = Vec::new();
    for (n, record) in reader.records().enumerate() {
        let record = record.map_err(|e| csv_err(path, e))?;
        rows.push(ExtractionRow {
            row_number: record_line(&record, n),
            extracted: non_empty(record.get(col_idx)),
        });
    }
    Ok(rows)
}

/// Read a file as UTF-8, dropping a leading BOM and falling back to
/// Windows-1252 for Excel-saved exports.
pub fn read_file_as_utf8(path: &Path) -> Result<String, LoadError> {
    let mut file = std::fs::File::open(path).map_err(|e| io_err(path, e))?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes).map_err(|e| io_err(path, e))?;

    let text = match String::from_utf8(bytes) {
        Ok(s) => s,
        Err(e) => {
            let bytes = e.into_bytes();
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            decoded.into_owned()
        }
    };

    Ok(match text.strip_prefix('\u{feff}') {
        Some(stripped) => stripped.to_string(),
        None => text,
    })
}

fn reader_for(content: &str) -> csv::Reader<&[u8]> {
    csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(content.as_bytes())
}

fn headers(reader: &mut csv::Reader<&[u8]>, path: &Path) -> Result<Vec<String>, LoadError> {
    Ok(reader
        .headers()
        .map_err(|e| csv_err(path, e))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect())
}

pub(crate) fn column_index(headers: &[String], name: &str, path: &Path) -> Result<usize, LoadError> {
    headers
        .iter()
        .position(|h| h == name)
        .ok_or_else(|| LoadError::MissingColumn {
            path: path.display().to_string(),
            column: name.to_string(),
        })
}

/// Line where a record starts. Quoted cells may span lines, so the record
/// index alone drifts; it is only the fallback when no position is tracked.
fn record_line(record: &csv::StringRecord, index: usize) -> usize {
    record
        .position()
        .map_or(index + 2, |pos| pos.line() as usize)
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(str::to_string)
}

fn csv_err(path: &Path, e: csv::Error) -> LoadError {
    LoadError::Csv {
        path: path.display().to_string(),
        message: e.to_string(),
    }
}

pub(crate) fn io_err(path: &Path, e: std::io::Error) -> LoadError {
    LoadError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    }
}
