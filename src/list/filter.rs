//! Search stage of the list pipeline.

use unicase::UniCase;

use crate::entity::{Entity, Facet};

/// Case-insensitive substring test.
///
/// Uses `unicase` for Unicode case folding, so "STRASSE" matches "straße".
pub fn contains_case_insensitive(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    let haystack_folded = UniCase::new(haystack).to_folded_case();
    let needle_folded = UniCase::new(needle).to_folded_case();
    haystack_folded.contains(&needle_folded)
}

/// Whether any of the record's search fields contains the (already trimmed)
/// term.
pub fn matches_term<E: Entity>(record: &E, term: &str) -> bool {
    term.is_empty()
        || record
            .search_fields()
            .iter()
            .any(|field| contains_case_insensitive(field, term))
}

/// Records admitted by the facet whose search fields contain the term.
///
/// A blank term only applies the facet. Order is preserved.
pub fn filter_records<'a, E: Entity>(records: &'a [E], term: &str, facet: &E::Facet) -> Vec<&'a E> {
    let term = term.trim();
    records
        .iter()
        .filter(|record| facet.admits(record))
        .filter(|record| matches_term(*record, term))
        .collect()
}
