use std::collections::BTreeMap;

use serde::Serialize;

use crate::compound::split_compound;
use crate::identifier::{normalize, CanonicalId, SourceKind};
use crate::model::{ExtractionRow, RecordRef, SourceRecord};

/// Counts for operator visibility. Computed once when the index is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IndexStats {
    pub source: SourceKind,
    /// Raw entries seen, empty ones included.
    pub total: usize,
    pub distinct: usize,
    pub singletons: usize,
    pub repeats: usize,
    pub empty: usize,
}

/// Canonical id → every record in one source that normalized to it.
///
/// Keys are never empty and never map to an empty list. Records whose
/// identifier normalized to `""` are kept aside in `empty_refs` so they
/// count toward [`IndexStats::empty`] without ever becoming a match key.
#[derive(Debug, Clone)]
pub struct SourceIndex {
    source: SourceKind,
    entries: BTreeMap<CanonicalId, Vec<RecordRef>>,
    empty_refs: Vec<RecordRef>,
    stats: IndexStats,
}

/// Index `records` by the canonical form of `field(record)`. Each record
/// adds exactly one reference, in encounter order; nothing is coalesced.
pub fn build_index<R, F, G>(source: SourceKind, records: &[R], field: F, reference: G) -> SourceIndex
where
    F: Fn(&R) -> Option<&str>,
    G: Fn(&R) -> RecordRef,
{
    let mut builder = IndexBuilder::new(source);
    for record in records {
        builder.push(normalize(field(record), source), reference(record));
    }
    builder.finish()
}

impl SourceIndex {
    pub fn from_records<R: SourceRecord>(source: SourceKind, records: &[R]) -> Self {
        build_index(source, records, R::raw_identifier, R::record_ref)
    }

    /// Index the extraction sheet. Each compound cell is split and every
    /// candidate gets its own entry pointing at the cell's row; a blank
    /// cell counts once as empty.
    pub fn from_extraction(rows: &[ExtractionRow]) -> Self {
        let mut builder = IndexBuilder::new(SourceKind::Extraction);
        for row in rows {
            let reference = row.record_ref();
            let candidates = split_compound(row.raw_identifier().unwrap_or(""));
            if candidates.is_empty() {
                builder.push(CanonicalId::empty(), reference);
                continue;
            }
            for candidate in candidates {
                builder.push(candidate, reference.clone());
            }
        }
        builder.finish()
    }

    pub fn source(&self) -> SourceKind {
        self.source
    }

    pub fn stats(&self) -> IndexStats {
        self.stats
    }

    /// References for `id`; empty slice when the source has none.
    pub fn get(&self, id: &CanonicalId) -> &[RecordRef] {
        self.entries.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn count(&self, id: &CanonicalId) -> usize {
        self.get(id).len()
    }

    pub fn contains(&self, id: &CanonicalId) -> bool {
        self.entries.contains_key(id)
    }

    pub fn is_singleton(&self, id: &CanonicalId) -> bool {
        self.count(id) == 1
    }

    pub fn is_repeat(&self, id: &CanonicalId) -> bool {
        self.count(id) > 1
    }

    pub fn keys(&self) -> impl Iterator<Item = &CanonicalId> {
        self.entries.keys()
    }

    pub fn singletons(&self) -> impl Iterator<Item = &CanonicalId> {
        self.entries
            .iter()
            .filter(|(_, refs)| refs.len() == 1)
            .map(|(id, _)| id)
    }

    pub fn repeats(&self) -> impl Iterator<Item = &CanonicalId> {
        self.entries
            .iter()
            .filter(|(_, refs)| refs.len() > 1)
            .map(|(id, _)| id)
    }

    pub fn empty_refs(&self) -> &[RecordRef] {
        &self.empty_refs
    }
}

struct IndexBuilder {
    source: SourceKind,
    entries: BTreeMap<CanonicalId, Vec<RecordRef>>,
    empty_refs: Vec<RecordRef>,
}

impl IndexBuilder {
    fn new(source: SourceKind) -> Self {
        Self {
            source,
            entries: BTreeMap::new(),
            empty_refs: Vec::new(),
        }
    }

    fn push(&mut self, id: CanonicalId, reference: RecordRef) {
        if id.is_empty() {
            self.empty_refs.push(reference);
        } else {
            self.entries.entry(id).or_default().push(reference);
        }
    }

    fn finish(self) -> SourceIndex {
        let singletons = self.entries.values().filter(|refs| refs.len() == 1).count();
        let stats = IndexStats {
            source: self.source,
            total: self.entries.values().map(Vec::len).sum::<usize>() + self.empty_refs.len(),
            distinct: self.entries.len(),
            singletons,
            repeats: self.entries.len() - singletons,
            empty: self.empty_refs.len(),
        };

        tracing::debug!(
            source = %self.source,
            total = stats.total,
            distinct = stats.distinct,
            singletons = stats.singletons,
            repeats = stats.repeats,
            empty = stats.empty,
            "built source index"
        );

        SourceIndex {
            source: self.source,
            entries: self.entries,
            empty_refs: self.empty_refs,
            stats,
        }
    }
}
