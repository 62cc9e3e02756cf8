use std::collections::{BTreeMap, BTreeSet};

use crate::classify::{classify_compound, classify_single, lookup, Sources};
use crate::compound::is_compound;
use crate::config::ReconConfig;
use crate::error::ReconError;
use crate::evidence::compute_summary;
use crate::identifier::{normalize, CanonicalId, SourceKind};
use crate::index::SourceIndex;
use crate::model::{Category, MatchRow, ReconInput, ReconMeta, ReconResult, SourceRecord};

/// Run reconciliation over pre-loaded records. Returns every category
/// bucket (empty ones included) plus summary and index stats.
pub fn run(config: &ReconConfig, input: &ReconInput) -> Result<ReconResult, ReconError> {
    if config.extraction.is_some() && input.extraction.is_none() {
        return Err(ReconError::MissingSource(
            "config names an extraction source but no extraction rows were loaded".into(),
        ));
    }

    let alma = SourceIndex::from_records(SourceKind::Alma, &input.alma);
    let filemaker = SourceIndex::from_records(SourceKind::FileMaker, &input.filemaker);
    let extraction = input.extraction.as_deref().map(SourceIndex::from_extraction);

    let sources = Sources {
        alma: &alma,
        filemaker: &filemaker,
        extraction: extraction.as_ref(),
    };

    let (single_queries, compound_queries) = collect_queries(&sources, input);

    let mut buckets: BTreeMap<Category, BTreeSet<MatchRow>> =
        Category::ALL.iter().map(|c| (*c, BTreeSet::new())).collect();

    for id in &single_queries {
        let row = lookup(id, None, &sources);
        let category = classify_single(&row);
        buckets.entry(category).or_default().insert(row);
    }

    for cell in &compound_queries {
        let outcome = classify_compound(cell, &sources)?;
        if outcome.retained.is_empty() && outcome.leftover.is_empty() {
            tracing::warn!(cell = %cell, "compound value has no candidates");
        }
        buckets.entry(outcome.category).or_default().extend(outcome.retained);
        buckets
            .entry(Category::CompoundLeftover)
            .or_default()
            .extend(outcome.leftover);
    }

    let perfect_all_sources = extraction
        .as_ref()
        .map(|ext| perfect_in_all(&[&alma, &filemaker, ext], &sources));

    for (category, rows) in &buckets {
        tracing::debug!(category = %category, rows = rows.len(), "bucket filled");
    }

    let mut index_stats = vec![alma.stats(), filemaker.stats()];
    let mut present = vec![SourceKind::Alma, SourceKind::FileMaker];
    if let Some(ref ext) = extraction {
        index_stats.push(ext.stats());
        present.push(SourceKind::Extraction);
    }

    let summary = compute_summary(
        &buckets,
        single_queries.len(),
        compound_queries.len(),
        perfect_all_sources.as_ref().map_or(0, BTreeSet::len),
    );

    tracing::info!(
        single = summary.single_queries,
        compound = summary.compound_queries,
        perfect = summary.perfect_matches,
        multi = summary.multi_matches,
        unmatched = summary.unmatched,
        "reconciliation complete"
    );

    Ok(ReconResult {
        meta: ReconMeta {
            config_name: config.name.clone(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
            sources: present,
        },
        summary,
        index_stats,
        buckets,
        perfect_all_sources,
    })
}

/// Single-value queries: every Alma and FileMaker key plus each plain
/// extraction cell, so nothing indexed goes unclassified. Compound queries:
/// each distinct compound cell, in sheet order.
fn collect_queries(sources: &Sources<'_>, input: &ReconInput) -> (BTreeSet<CanonicalId>, Vec<String>) {
    let mut single: BTreeSet<CanonicalId> = sources
        .alma
        .keys()
        .chain(sources.filemaker.keys())
        .cloned()
        .collect();

    let mut compound = Vec::new();
    let mut seen = BTreeSet::new();

    for row in input.extraction.iter().flatten() {
        let Some(cell) = row.raw_identifier() else {
            continue;
        };
        if is_compound(cell) {
            if seen.insert(cell) {
                compound.push(cell.to_string());
            }
        } else {
            let id = normalize(Some(cell), SourceKind::Extraction);
            if !id.is_empty() {
                single.insert(id);
            }
        }
    }

    (single, compound)
}

/// Identifiers that are singletons in every index given.
fn perfect_in_all(indexes: &[&SourceIndex], sources: &Sources<'_>) -> BTreeSet<MatchRow> {
    let Some((first, rest)) = indexes.split_first() else {
        return BTreeSet::new();
    };
    first
        .singletons()
        .filter(|id| rest.iter().all(|index| index.is_singleton(id)))
        .map(|id| lookup(id, None, sources))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AlmaHolding, ExtractionRow, FileMakerRecord};

    fn alma(rows: &[(&str, &str)]) -> Vec<AlmaHolding> {
        rows.iter()
            .map(|(call, id)| AlmaHolding {
                call_number: Some(call.to_string()),
                holding_id: id.to_string(),
            })
            .collect()
    }

    fn filemaker(rows: &[(&str, &str)]) -> Vec<FileMakerRecord> {
        rows.iter()
            .map(|(inv, id)| FileMakerRecord {
                inventory_no: Some(inv.to_string()),
                record_id: id.to_string(),
            })
            .collect()
    }

    fn extraction(cells: &[&str]) -> Vec<ExtractionRow> {
        cells
            .iter()
            .enumerate()
            .map(|(i, cell)| ExtractionRow {
                row_number: i + 2,
                extracted: Some(cell.to_string()),
            })
            .collect()
    }

    fn ids<'a>(result: &'a ReconResult, category: Category) -> Vec<&'a str> {
        result.bucket(category).map(|r| r.identifier.as_str()).collect()
    }

    #[test]
    fn two_source_run_classifies_every_key() {
        let input = ReconInput {
            alma: alma(&[("M 123", "A1"), ("T1", "A2"), ("T1", "A3"), ("V9", "A4")]),
            filemaker: filemaker(&[("M123\u{a0}", "F1"), ("X5", "F2"), ("X5", "F3")]),
            extraction: None,
        };
        let result = run(&ReconConfig::named("two-source"), &input).unwrap();

        assert_eq!(result.buckets.len(), Category::ALL.len());
        assert_eq!(ids(&result, Category::PerfectMatch), vec!["M123"]);
        assert_eq!(ids(&result, Category::MultipleAlmaNoFileMaker), vec!["T1"]);
        assert_eq!(ids(&result, Category::MultipleFileMakerNoAlma), vec!["X5"]);
        assert_eq!(ids(&result, Category::OneSided), vec!["V9"]);
        assert!(result.perfect_all_sources.is_none());
        assert_eq!(result.summary.single_queries, 4);

        let classified: usize = result.buckets.values().map(BTreeSet::len).sum();
        assert_eq!(classified, 4);
    }

    #[test]
    fn extraction_cells_route_by_shape() {
        let input = ReconInput {
            alma: alma(&[("INV_NO_11", "A11"), ("INV_NO_13", "A12"), ("INV_NO_13", "A13"), ("M1", "A1")]),
            filemaker: filemaker(&[("INV_NO_12", "F12"), ("M1", "F1")]),
            extraction: Some(extraction(&[
                "INV_NO_11|INV_NO_12",
                "INV_NO_13|INV_NO_14",
                "M1",
                "",
                "INV_NO_11|INV_NO_12",
                "Q77",
            ])),
        };
        let result = run(&ReconConfig::named("three-source"), &input).unwrap();

        assert_eq!(
            ids(&result, Category::EachResolvesToExactlyOne),
            vec!["INV_NO_11", "INV_NO_12"]
        );
        assert_eq!(ids(&result, Category::AtLeastOneMultiMatch), vec!["INV_NO_13"]);
        assert_eq!(ids(&result, Category::CompoundLeftover), vec!["INV_NO_14"]);
        assert_eq!(ids(&result, Category::UnmatchedBoth), vec!["Q77"]);
        assert_eq!(result.summary.compound_queries, 2);

        let all = result.perfect_all_sources.as_ref().unwrap();
        assert_eq!(all.iter().map(|r| r.identifier.as_str()).collect::<Vec<_>>(), vec!["M1"]);
        assert_eq!(all.iter().next().map(MatchRow::extraction_count), Some(1));
        assert!(result.has_extraction());
        assert_eq!(result.index_stats.len(), 3);
    }

    #[test]
    fn first_compound_parent_wins_within_bucket() {
        let input = ReconInput {
            alma: alma(&[("M1", "A1")]),
            filemaker: filemaker(&[("M2", "F2"), ("M3", "F3")]),
            extraction: Some(extraction(&["M1|M2", "M1|M3"])),
        };
        let result = run(&ReconConfig::named("dedupe"), &input).unwrap();
        let rows: Vec<&MatchRow> = result.bucket(Category::EachResolvesToExactlyOne).collect();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].identifier.as_str(), "M1");
        assert_eq!(rows[0].original_value.as_deref(), Some("M1|M2"));
    }

    #[test]
    fn empty_identifiers_never_classified() {
        let input = ReconInput {
            alma: vec![AlmaHolding { call_number: None, holding_id: "A1".into() }],
            filemaker: filemaker(&[("\u{a0}", "F1")]),
            extraction: Some(extraction(&["", "|"])),
        };
        let result = run(&ReconConfig::named("empty"), &input).unwrap();
        assert!(result.buckets.values().all(BTreeSet::is_empty));
        assert_eq!(result.index_stats[0].empty, 1);
        assert_eq!(result.index_stats[1].empty, 1);
    }

    #[test]
    fn configured_extraction_requires_rows() {
        let mut config = ReconConfig::named("missing");
        config.extraction = Some(crate::config::ExtractionSource::with_file("google.xlsx"));
        let err = run(&config, &ReconInput::default()).unwrap_err();
        assert!(matches!(err, ReconError::MissingSource(_)));
    }
}
