use std::collections::{BTreeMap, BTreeSet};

use crate::model::{Category, MatchRow, ReconSummary};

/// Compute summary statistics from filled buckets.
pub fn compute_summary(
    buckets: &BTreeMap<Category, BTreeSet<MatchRow>>,
    single_queries: usize,
    compound_queries: usize,
    perfect_all_sources: usize,
) -> ReconSummary {
    let mut bucket_counts = BTreeMap::new();
    let mut perfect_matches = 0;
    let mut multi_matches = 0;
    let mut unmatched = 0;
    let mut one_sided = 0;

    for (category, rows) in buckets {
        let n = rows.len();
        bucket_counts.insert(category.name().to_string(), n);

        match category {
            Category::PerfectMatch => perfect_matches += n,
            Category::MultipleFileMakerNoAlma
            | Category::MultipleAlmaNoFileMaker
            | Category::MultipleFileMakerOneAlma
            | Category::MultipleAlmaOneFileMaker
            | Category::MultipleBoth
            | Category::AtLeastOneMultiMatch => multi_matches += n,
            Category::UnmatchedBoth => unmatched += n,
            Category::OneSided => one_sided += n,
            Category::EachResolvesToExactlyOne | Category::CompoundLeftover => {}
        }
    }

    ReconSummary {
        single_queries,
        compound_queries,
        perfect_matches,
        perfect_all_sources,
        multi_matches,
        unmatched,
        one_sided,
        bucket_counts,
    }
}
