use std::fmt;

#[derive(Debug)]
pub enum ReconError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (empty file path, bad output name, etc.).
    ConfigValidation(String),
    /// The compound classifier was handed a value with no `|` separator.
    /// Signals a routing bug in the caller, not bad source data.
    NotCompound(String),
    /// A source required for this run was not supplied.
    MissingSource(String),
}

impl fmt::Display for ReconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::NotCompound(value) => {
                write!(f, "value '{value}' is not compound (no '|' separator)")
            }
            Self::MissingSource(source) => write!(f, "missing source: {source}"),
        }
    }
}

impl std::error::Error for ReconError {}
