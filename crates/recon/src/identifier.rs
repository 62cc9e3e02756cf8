//! Per-source identifier normalization.
//!
//! Every match key in the engine is a [`CanonicalId`], and the only ways to
//! get one are [`normalize`] and the compound splitter. Raw catalog strings
//! never reach an index directly.

use std::fmt;

use serde::Serialize;

/// The catalog a raw value came from. Each has its own cleaning rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Alma,
    FileMaker,
    Extraction,
}

impl SourceKind {
    /// Human label used in report headers and log lines.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Alma => "Alma",
            Self::FileMaker => "FileMaker",
            Self::Extraction => "Extraction",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Alma => write!(f, "alma"),
            Self::FileMaker => write!(f, "filemaker"),
            Self::Extraction => write!(f, "extraction"),
        }
    }
}

/// A normalized inventory number.
///
/// Two raw values with different surface forms (`"M 123"`, `"M123\u{a0}"`)
/// are the same item once they normalize to the same `CanonicalId`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct CanonicalId(String);

impl CanonicalId {
    pub(crate) fn new(value: String) -> Self {
        Self(value)
    }

    pub fn empty() -> Self {
        Self(String::new())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Empty ids are counted but never used as match keys.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for CanonicalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CanonicalId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

const NO_BREAK_SPACE: char = '\u{a0}';

/// Map a raw catalog value to its canonical form. Never fails: a missing
/// field normalizes to the empty id.
///
/// Case is preserved for every source. Alma call numbers are uppercase by
/// convention, but nothing here relies on it.
pub fn normalize(raw: Option<&str>, source: SourceKind) -> CanonicalId {
    let Some(raw) = raw else {
        return CanonicalId::empty();
    };

    let cleaned: String = match source {
        SourceKind::Alma => raw.chars().filter(|c| *c != ' ').collect(),
        SourceKind::FileMaker => raw.chars().filter(|c| *c != NO_BREAK_SPACE).collect(),
        // Already cleaned upstream by the extraction pass.
        SourceKind::Extraction => raw.to_string(),
    };

    CanonicalId(cleaned)
}
