use std::fmt;

#[derive(Debug)]
pub enum LoadError {
    /// File could not be opened, read or created.
    Io { path: String, message: String },
    /// Malformed CSV content.
    Csv { path: String, message: String },
    /// Malformed JSON content, or JSON that is not an array of objects.
    Json { path: String, message: String },
    /// Spreadsheet could not be opened or a sheet could not be read.
    Sheet { path: String, message: String },
    /// The named worksheet does not exist.
    MissingSheet { path: String, sheet: String },
    /// A configured column is absent from the header row.
    MissingColumn { path: String, column: String },
    /// File extension is not one we can read or write.
    UnsupportedFormat { path: String },
    /// Report workbook could not be written.
    Write { path: String, message: String },
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, message } => write!(f, "{path}: {message}"),
            Self::Csv { path, message } => write!(f, "{path}: CSV error: {message}"),
            Self::Json { path, message } => write!(f, "{path}: JSON error: {message}"),
            Self::Sheet { path, message } => write!(f, "{path}: spreadsheet error: {message}"),
            Self::MissingSheet { path, sheet } => write!(f, "{path}: no sheet named '{sheet}'"),
            Self::MissingColumn { path, column } => {
                write!(f, "{path}: missing column '{column}'")
            }
            Self::UnsupportedFormat { path } => write!(f, "{path}: unsupported file format"),
            Self::Write { path, message } => write!(f, "{path}: cannot write report: {message}"),
        }
    }
}

impl std::error::Error for LoadError {}
