use serde::Deserialize;

use crate::error::ReconError;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct ReconConfig {
    pub name: String,
    #[serde(default)]
    pub alma: AlmaSource,
    #[serde(default)]
    pub filemaker: FileMakerSource,
    #[serde(default)]
    pub extraction: Option<ExtractionSource>,
    #[serde(default)]
    pub output: OutputConfig,
}

// ---------------------------------------------------------------------------
// Sources
// ---------------------------------------------------------------------------

/// Alma holdings CSV export.
#[derive(Debug, Clone, Deserialize)]
pub struct AlmaSource {
    #[serde(default)]
    pub file: String,
    #[serde(default = "default_alma_identifier")]
    pub identifier_column: String,
    #[serde(default = "default_alma_reference")]
    pub reference_column: String,
}

impl Default for AlmaSource {
    fn default() -> Self {
        Self {
            file: String::new(),
            identifier_column: default_alma_identifier(),
            reference_column: default_alma_reference(),
        }
    }
}

fn default_alma_identifier() -> String {
    "Permanent Call Number".into()
}

fn default_alma_reference() -> String {
    "Holding Id".into()
}

/// FileMaker JSON export (array of flat records).
#[derive(Debug, Clone, Deserialize)]
pub struct FileMakerSource {
    #[serde(default)]
    pub file: String,
    #[serde(default = "default_fm_identifier")]
    pub identifier_field: String,
    #[serde(default = "default_fm_reference")]
    pub reference_field: String,
}

impl Default for FileMakerSource {
    fn default() -> Self {
        Self {
            file: String::new(),
            identifier_field: default_fm_identifier(),
            reference_field: default_fm_reference(),
        }
    }
}

fn default_fm_identifier() -> String {
    "inventory_no".into()
}

fn default_fm_reference() -> String {
    "inventory_id".into()
}

/// Spreadsheet holding the extracted (possibly compound) inventory numbers.
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractionSource {
    pub file: String,
    /// Worksheet name; ignored for CSV files.
    #[serde(default = "default_extraction_sheet")]
    pub sheet: String,
    #[serde(default = "default_extraction_column")]
    pub column: String,
}

impl ExtractionSource {
    pub fn with_file(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            sheet: default_extraction_sheet(),
            column: default_extraction_column(),
        }
    }
}

fn default_extraction_sheet() -> String {
    "Tapes(row 4560-24712)".into()
}

fn default_extraction_column() -> String {
    "Inventory Number [EXTRACTED]".into()
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_workbook")]
    pub workbook: String,
    #[serde(default)]
    pub json: Option<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            workbook: default_workbook(),
            json: None,
        }
    }
}

fn default_workbook() -> String {
    "inventory_number_matches.xlsx".into()
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl ReconConfig {
    /// Config with default column names and no files; callers fill the paths.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alma: AlmaSource::default(),
            filemaker: FileMakerSource::default(),
            extraction: None,
            output: OutputConfig::default(),
        }
    }

    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config = Self::parse_toml(input)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse without validating, for callers that override paths first.
    pub fn parse_toml(input: &str) -> Result<Self, ReconError> {
        toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        if self.name.trim().is_empty() {
            return Err(ReconError::ConfigValidation("name must not be empty".into()));
        }

        require("alma.file", &self.alma.file)?;
        require("alma.identifier_column", &self.alma.identifier_column)?;
        require("alma.reference_column", &self.alma.reference_column)?;

        require("filemaker.file", &self.filemaker.file)?;
        require("filemaker.identifier_field", &self.filemaker.identifier_field)?;
        require("filemaker.reference_field", &self.filemaker.reference_field)?;

        if let Some(ref extraction) = self.extraction {
            require("extraction.file", &extraction.file)?;
            require("extraction.column", &extraction.column)?;
        }

        require("output.workbook", &self.output.workbook)?;
        if !self.output.workbook.to_ascii_lowercase().ends_with(".xlsx") {
            return Err(ReconError::ConfigValidation(format!(
                "output.workbook must be an .xlsx file, got '{}'",
                self.output.workbook
            )));
        }

        Ok(())
    }
}

fn require(field: &str, value: &str) -> Result<(), ReconError> {
    if value.trim().is_empty() {
        return Err(ReconError::ConfigValidation(format!("{field} must not be empty")));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
