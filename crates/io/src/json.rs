// JSON import (FileMaker export) and result export

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use invmatch_recon::config::FileMakerSource;
use invmatch_recon::model::FileMakerRecord;
use invmatch_recon::ReconResult;
use serde_json::Value;

use crate::csv::io_err;
use crate::error::LoadError;

/// Load the FileMaker export: a JSON array of flat record objects.
///
/// String and number values are accepted for both fields. A missing or null
/// inventory number becomes `None`; a missing record id falls back to the
/// record's position in the array.
///
/// JSON is read as strict UTF-8. Invalid bytes are an error rather than a
/// re-decode, so non-breaking spaces reach the normalizer intact.
pub fn load_filemaker(path: &Path, source: &FileMakerSource) -> Result<Vec<FileMakerRecord>, LoadError> {
    let bytes = std::fs::read(path).map_err(|e| io_err(path, e))?;
    let bytes = bytes.strip_prefix(b"\xef\xbb\xbf").unwrap_or(bytes.as_slice());
    let value: Value = serde_json::from_slice(bytes).map_err(|e| json_err(path, e.to_string()))?;

    let Value::Array(items) = value else {
        return Err(json_err(path, "expected a top-level array of records".into()));
    };

    let mut records = Vec::with_capacity(items.len());
    let mut missing_ids = 0usize;

    for (n, item) in items.iter().enumerate() {
        let Value::Object(fields) = item else {
            return Err(json_err(path, format!("record {n} is not an object")));
        };

        let record_id = match fields.get(&source.reference_field).and_then(scalar) {
            Some(id) if !id.is_empty() => id,
            _ => {
                missing_ids += 1;
                format!("#{n}")
            }
        };

        records.push(FileMakerRecord {
            inventory_no: fields
                .get(&source.identifier_field)
                .and_then(scalar)
                .filter(|v| !v.is_empty()),
            record_id,
        });
    }

    if missing_ids > 0 {
        tracing::warn!(
            path = %path.display(),
            field = %source.reference_field,
            count = missing_ids,
            "records without a reference id; using array position"
        );
    }
    tracing::debug!(path = %path.display(), rows = records.len(), "loaded FileMaker records");
    Ok(records)
}

fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Write the full result as pretty JSON.
pub fn write_result(result: &ReconResult, path: &Path) -> Result<(), LoadError> {
    let file = File::create(path).map_err(|e| io_err(path, e))?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, result).map_err(|e| LoadError::Write {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

fn json_err(path: &Path, message: String) -> LoadError {
    LoadError::Json {
        path: path.display().to_string(),
        message,
    }
}
