use crate::compound::{is_compound, split_compound};
use crate::error::ReconError;
use crate::identifier::CanonicalId;
use crate::index::SourceIndex;
use crate::model::{Category, MatchRow};

/// The indexes one run classifies against.
#[derive(Debug, Clone, Copy)]
pub struct Sources<'a> {
    pub alma: &'a SourceIndex,
    pub filemaker: &'a SourceIndex,
    pub extraction: Option<&'a SourceIndex>,
}

/// Single-value rules in priority order, keyed on (alma count, filemaker count).
/// The predicates are disjoint. The only pairs none of them claims are
/// `(1, 0)` and `(0, 1)`, which fall through to `one-sided`.
const SINGLE_RULES: [(Category, fn(usize, usize) -> bool); 7] = [
    (Category::MultipleFileMakerNoAlma, |a, f| f > 1 && a == 0),
    (Category::MultipleAlmaNoFileMaker, |a, f| a > 1 && f == 0),
    (Category::MultipleFileMakerOneAlma, |a, f| f > 1 && a == 1),
    (Category::MultipleAlmaOneFileMaker, |a, f| a > 1 && f == 1),
    (Category::MultipleBoth, |a, f| f > 1 && a > 1),
    (Category::UnmatchedBoth, |a, f| f == 0 && a == 0),
    (Category::PerfectMatch, |a, f| a == 1 && f == 1),
];

/// Collect every reference for `id` from each source.
pub fn lookup(id: &CanonicalId, original_value: Option<&str>, sources: &Sources<'_>) -> MatchRow {
    MatchRow {
        identifier: id.clone(),
        original_value: original_value.map(str::to_string),
        alma: sources.alma.get(id).to_vec(),
        filemaker: sources.filemaker.get(id).to_vec(),
        extraction: sources
            .extraction
            .map(|index| index.get(id).to_vec())
            .unwrap_or_default(),
    }
}

/// Category for an (alma, filemaker) count pair. Depends on counts only.
pub fn classify_counts(alma: usize, filemaker: usize) -> Category {
    SINGLE_RULES
        .iter()
        .find(|(_, rule)| rule(alma, filemaker))
        .map(|(category, _)| *category)
        .unwrap_or(Category::OneSided)
}

pub fn classify_single(row: &MatchRow) -> Category {
    classify_counts(row.alma_count(), row.filemaker_count())
}

/// Result of classifying one compound cell as a whole.
#[derive(Debug, Clone)]
pub struct CompoundOutcome {
    pub category: Category,
    /// Rows reported under `category`.
    pub retained: Vec<MatchRow>,
    /// Candidates not promoted to `category`; reported as compound leftovers.
    pub leftover: Vec<MatchRow>,
}

/// Classify a pipe-delimited cell by the match counts of its candidates.
///
/// - every candidate resolves to exactly one record overall
///   → `EachResolvesToExactlyOne` with all rows
/// - some candidate repeats in Alma or FileMaker
///   → `AtLeastOneMultiMatch` with only those rows
/// - anything else → `CompoundLeftover`
pub fn classify_compound(cell: &str, sources: &Sources<'_>) -> Result<CompoundOutcome, ReconError> {
    if !is_compound(cell) {
        return Err(ReconError::NotCompound(cell.to_string()));
    }

    let rows: Vec<MatchRow> = split_compound(cell)
        .iter()
        .map(|id| lookup(id, Some(cell), sources))
        .collect();

    if !rows.is_empty() && rows.iter().all(|r| r.total_count() == 1) {
        return Ok(CompoundOutcome {
            category: Category::EachResolvesToExactlyOne,
            retained: rows,
            leftover: Vec::new(),
        });
    }

    let (multi, rest): (Vec<MatchRow>, Vec<MatchRow>) = rows
        .into_iter()
        .partition(|r| r.alma_count() > 1 || r.filemaker_count() > 1);

    if multi.is_empty() {
        return Ok(CompoundOutcome {
            category: Category::CompoundLeftover,
            retained: rest,
            leftover: Vec::new(),
        });
    }

    Ok(CompoundOutcome {
        category: Category::AtLeastOneMultiMatch,
        retained: multi,
        leftover: rest,
    })
}
