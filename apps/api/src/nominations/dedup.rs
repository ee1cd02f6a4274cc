use std::collections::BTreeSet;

use crate::models::nomination::NominateEntity;

/// Normalises a comma-joined list of nominee object ids into a set: entries
/// are trimmed, empties dropped and case folded.
pub fn nominee_set(joined: &str) -> BTreeSet<String> {
    joined
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// True when any existing nomination names exactly the same nominees,
/// regardless of order. Callers pass only nominations of the same team,
/// award, cycle and nominator.
pub fn is_duplicate_nomination(existing: &[NominateEntity], nominees: &str) -> bool {
    let candidate = nominee_set(nominees);
    if candidate.is_empty() {
        return false;
    }
    existing
        .iter()
        .any(|nomination| nominee_set(&nomination.nominated_to_object_id) == candidate)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nominated(ids: &str) -> NominateEntity {
        NominateEntity {
            nominated_to_object_id: ids.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_order_does_not_matter() {
        let existing = vec![nominated("oid-a,oid-b")];
        assert!(is_duplicate_nomination(&existing, "oid-b,oid-a"));
        assert!(is_duplicate_nomination(&existing, " oid-B , oid-a "));
    }

    #[test]
    fn test_overlapping_sets_are_distinct() {
        let existing = vec![nominated("oid-a,oid-b")];
        assert!(!is_duplicate_nomination(&existing, "oid-a,oid-c"));
        assert!(!is_duplicate_nomination(&existing, "oid-a"));
        assert!(!is_duplicate_nomination(&existing, "oid-a,oid-b,oid-c"));
    }

    #[test]
    fn test_empty_entries_are_ignored() {
        let existing = vec![nominated("oid-a,,oid-b,")];
        assert!(is_duplicate_nomination(&existing, "oid-a,oid-b"));
        assert!(!is_duplicate_nomination(&existing, " , "));
    }
}
