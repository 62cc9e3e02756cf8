//! Splitting of pipe-delimited extraction cells.

use crate::identifier::{normalize, CanonicalId, SourceKind};

pub const SEPARATOR: char = '|';

/// True when `cell` holds more than one candidate slot.
pub fn is_compound(cell: &str) -> bool {
    cell.contains(SEPARATOR)
}

/// Expand one extraction cell into its candidate identifiers, in order.
///
/// No de-duplication: a candidate listed twice is looked up twice. Empty
/// segments are dropped, so `""` yields no candidates rather than one
/// empty one.
pub fn split_compound(cell: &str) -> Vec<CanonicalId> {
    cell.split(SEPARATOR)
        .filter(|part| !part.is_empty())
        .map(|part| normalize(Some(part), SourceKind::Extraction))
        .collect()
}

/// Inverse of [`split_compound`] for candidates without `|`.
pub fn join_compound(ids: &[CanonicalId]) -> String {
    ids.iter()
        .map(CanonicalId::as_str)
        .collect::<Vec<_>>()
        .join("|")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn strs(ids: &[CanonicalId]) -> Vec<&str> {
        ids.iter().map(CanonicalId::as_str).collect()
    }

    #[test]
    fn empty_cell_has_no_candidates() {
        assert!(split_compound("").is_empty());
        assert!(split_compound("|").is_empty());
    }

    #[test]
    fn single_value() {
        assert_eq!(strs(&split_compound("HFA27M")), vec!["HFA27M"]);
        assert!(!is_compound("HFA27M"));
    }

    #[test]
    fn keeps_order_and_duplicates() {
        let ids = split_compound("XFE4098M|XFF104M|XFE4098M");
        assert_eq!(strs(&ids), vec!["XFE4098M", "XFF104M", "XFE4098M"]);
        assert!(is_compound("XFE4098M|XFF104M"));
    }

    #[test]
    fn drops_empty_segments() {
        assert_eq!(strs(&split_compound("M1||M2|")), vec!["M1", "M2"]);
    }

    proptest! {
        #[test]
        fn split_inverts_join(parts in proptest::collection::vec("[A-Z]{1,3}[0-9]{2,6}", 0..8)) {
            let ids = split_compound(&parts.join("|"));
            prop_assert_eq!(strs(&ids), parts.iter().map(String::as_str).collect::<Vec<_>>());
            prop_assert_eq!(join_compound(&ids), parts.join("|"));
        }
    }
}
