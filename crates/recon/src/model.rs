use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::hash::{Hash, Hasher};

use serde::Serialize;

use crate::identifier::{CanonicalId, SourceKind};
use crate::index::IndexStats;

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// Opaque pointer back to one raw record: a holdings id, a FileMaker record
/// id, a spreadsheet row number. Only ever displayed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct RecordRef(String);

impl RecordRef {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RecordRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The two fields the engine needs from any source row.
pub trait SourceRecord {
    /// Raw identifier cell, `None` when the field is missing.
    fn raw_identifier(&self) -> Option<&str>;
    fn record_ref(&self) -> RecordRef;
}

/// One row of the Alma holdings export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlmaHolding {
    pub call_number: Option<String>,
    pub holding_id: String,
}

impl SourceRecord for AlmaHolding {
    fn raw_identifier(&self) -> Option<&str> {
        self.call_number.as_deref()
    }

    fn record_ref(&self) -> RecordRef {
        RecordRef::new(self.holding_id.clone())
    }
}

/// One record of the FileMaker JSON export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMakerRecord {
    pub inventory_no: Option<String>,
    pub record_id: String,
}

impl SourceRecord for FileMakerRecord {
    fn raw_identifier(&self) -> Option<&str> {
        self.inventory_no.as_deref()
    }

    fn record_ref(&self) -> RecordRef {
        RecordRef::new(self.record_id.clone())
    }
}

/// One row of the extraction sheet. `extracted` may be compound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionRow {
    /// Spreadsheet row number (header row is 1).
    pub row_number: usize,
    pub extracted: Option<String>,
}

impl SourceRecord for ExtractionRow {
    fn raw_identifier(&self) -> Option<&str> {
        self.extracted.as_deref()
    }

    fn record_ref(&self) -> RecordRef {
        RecordRef::new(format!("row {}", self.row_number))
    }
}

/// Pre-loaded records for one run. The extraction source is optional.
#[derive(Debug, Default)]
pub struct ReconInput {
    pub alma: Vec<AlmaHolding>,
    pub filemaker: Vec<FileMakerRecord>,
    pub extraction: Option<Vec<ExtractionRow>>,
}

// ---------------------------------------------------------------------------
// Match rows
// ---------------------------------------------------------------------------

/// Lookup result for one query identifier across the participating indexes.
///
/// Identity is the identifier alone: `Eq`, `Ord` and `Hash` ignore every
/// other field. Buckets are `BTreeSet<MatchRow>`, so the same identifier
/// reached twice collapses to one row. Adding fields to the equality
/// contract changes de-duplication everywhere.
#[derive(Debug, Clone, Serialize)]
pub struct MatchRow {
    pub identifier: CanonicalId,
    /// The compound cell this candidate was split from, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_value: Option<String>,
    pub alma: Vec<RecordRef>,
    pub filemaker: Vec<RecordRef>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub extraction: Vec<RecordRef>,
}

impl MatchRow {
    pub fn alma_count(&self) -> usize {
        self.alma.len()
    }

    pub fn filemaker_count(&self) -> usize {
        self.filemaker.len()
    }

    pub fn extraction_count(&self) -> usize {
        self.extraction.len()
    }

    pub fn count(&self, source: SourceKind) -> usize {
        self.refs(source).len()
    }

    pub fn refs(&self, source: SourceKind) -> &[RecordRef] {
        match source {
            SourceKind::Alma => &self.alma,
            SourceKind::FileMaker => &self.filemaker,
            SourceKind::Extraction => &self.extraction,
        }
    }

    /// Alma + FileMaker. The extraction source is the query side and does
    /// not count toward resolution.
    pub fn total_count(&self) -> usize {
        self.alma.len() + self.filemaker.len()
    }

    /// `|`-joined references for one source, for tabular display.
    pub fn display_refs(&self, source: SourceKind) -> String {
        join_refs(self.refs(source))
    }
}

pub(crate) fn join_refs(refs: &[RecordRef]) -> String {
    refs.iter().map(RecordRef::as_str).collect::<Vec<_>>().join("|")
}

impl PartialEq for MatchRow {
    fn eq(&self, other: &Self) -> bool {
        self.identifier == other.identifier
    }
}

impl Eq for MatchRow {}

impl Hash for MatchRow {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identifier.hash(state);
    }
}

impl PartialOrd for MatchRow {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MatchRow {
    fn cmp(&self, other: &Self) -> Ordering {
        self.identifier.cmp(&other.identifier)
    }
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Relationship category. Every classified row lands in exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    // Single-value path, in rule priority order.
    MultipleFileMakerNoAlma,
    MultipleAlmaNoFileMaker,
    MultipleFileMakerOneAlma,
    MultipleAlmaOneFileMaker,
    MultipleBoth,
    UnmatchedBoth,
    PerfectMatch,
    OneSided,
    // Compound-value path.
    EachResolvesToExactlyOne,
    AtLeastOneMultiMatch,
    CompoundLeftover,
}

impl Category {
    /// All categories in report order.
    pub const ALL: [Category; 11] = [
        Self::MultipleFileMakerNoAlma,
        Self::MultipleAlmaNoFileMaker,
        Self::MultipleFileMakerOneAlma,
        Self::MultipleAlmaOneFileMaker,
        Self::MultipleBoth,
        Self::UnmatchedBoth,
        Self::PerfectMatch,
        Self::OneSided,
        Self::EachResolvesToExactlyOne,
        Self::AtLeastOneMultiMatch,
        Self::CompoundLeftover,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::MultipleFileMakerNoAlma => "multiple-FileMaker-no-Alma",
            Self::MultipleAlmaNoFileMaker => "multiple-Alma-no-FileMaker",
            Self::MultipleFileMakerOneAlma => "multiple-FileMaker-one-Alma",
            Self::MultipleAlmaOneFileMaker => "multiple-Alma-one-FileMaker",
            Self::MultipleBoth => "multiple-both",
            Self::UnmatchedBoth => "unmatched-both",
            Self::PerfectMatch => "perfect-match",
            Self::OneSided => "one-sided",
            Self::EachResolvesToExactlyOne => "each-resolves-to-exactly-one",
            Self::AtLeastOneMultiMatch => "at-least-one-multi-match",
            Self::CompoundLeftover => "compound-leftover",
        }
    }

    pub fn is_compound(&self) -> bool {
        matches!(
            self,
            Self::EachResolvesToExactlyOne | Self::AtLeastOneMultiMatch | Self::CompoundLeftover
        )
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Summary + Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct ReconSummary {
    /// Distinct identifiers sent down the single-value path.
    pub single_queries: usize,
    /// Distinct compound cells sent down the compound path.
    pub compound_queries: usize,
    pub perfect_matches: usize,
    pub perfect_all_sources: usize,
    pub multi_matches: usize,
    pub unmatched: usize,
    pub one_sided: usize,
    pub bucket_counts: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconMeta {
    pub config_name: String,
    pub engine_version: String,
    pub run_at: String,
    pub sources: Vec<SourceKind>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconResult {
    pub meta: ReconMeta,
    pub summary: ReconSummary,
    pub index_stats: Vec<IndexStats>,
    /// One entry per category, every category present even when empty.
    pub buckets: BTreeMap<Category, BTreeSet<MatchRow>>,
    /// Identifiers that are singletons in all three sources. `None` when
    /// the run had no extraction source.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub perfect_all_sources: Option<BTreeSet<MatchRow>>,
}

impl ReconResult {
    pub fn bucket(&self, category: Category) -> impl Iterator<Item = &MatchRow> {
        self.buckets.get(&category).into_iter().flatten()
    }

    pub fn bucket_len(&self, category: Category) -> usize {
        self.buckets.get(&category).map_or(0, BTreeSet::len)
    }

    pub fn has_extraction(&self) -> bool {
        self.meta.sources.contains(&SourceKind::Extraction)
    }
}
