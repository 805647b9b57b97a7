//! Strict resolution of a query to exactly one candidate.
//!
//! Ranking for display and resolving to one entity consume the same
//! [`rank`] output differently: here, several candidates sharing the best
//! tier are reported as [`ControlError::Ambiguous`] instead of silently
//! picking one.

use std::collections::HashSet;

use crate::errors::ControlError;
use crate::matcher::{Candidate, rank, top_ties};

/// Resolves `query` among `candidates`.
///
/// `kind` names the entity in errors ("playlist", "output device", ...).
pub fn resolve<'a, T: Candidate>(
    kind: &str,
    query: &str,
    candidates: &'a [T],
) -> Result<&'a T, ControlError> {
    let ranked = rank(query, candidates);
    match top_ties(&ranked) {
        [] => Err(ControlError::not_found(kind, query)),
        [only] => Ok(only.candidate),
        ties => Err(ControlError::Ambiguous {
            kind: kind.to_string(),
            query: query.to_string(),
            matches: ties
                .iter()
                .map(|r| (r.id().to_string(), r.display_name().to_string()))
                .collect(),
        }),
    }
}

/// Resolves every query, in order, stopping at the first failure.
///
/// Two queries resolving to the same candidate yield it once.
pub fn resolve_all<'a, T, S>(
    kind: &str,
    queries: &[S],
    candidates: &'a [T],
) -> Result<Vec<&'a T>, ControlError>
where
    T: Candidate,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut resolved = Vec::with_capacity(queries.len());
    for query in queries {
        let candidate = resolve(kind, query.as_ref(), candidates)?;
        if seen.insert(candidate.id().to_string()) {
            resolved.push(candidate);
        }
    }
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::NamedItem;

    fn items(names: &[&str]) -> Vec<NamedItem> {
        names
            .iter()
            .enumerate()
            .map(|(i, name)| NamedItem::new(format!("id{}", i), *name))
            .collect()
    }

    #[test]
    fn test_unique_exact_wins_over_prefixes() {
        let candidates = items(&["Focus", "Deep Focus", "Focus Mix"]);
        let found = resolve("playlist", "focus", &candidates).unwrap();
        assert_eq!(found.name, "Focus");
    }

    #[test]
    fn test_ties_in_top_tier_are_ambiguous() {
        let candidates = items(&["Focus", "Deep Focus", "Focus Mix"]);
        match resolve("playlist", "fo", &candidates) {
            Err(ControlError::Ambiguous { kind, query, matches }) => {
                assert_eq!(kind, "playlist");
                assert_eq!(query, "fo");
                assert_eq!(
                    matches,
                    vec![
                        ("id0".to_string(), "Focus".to_string()),
                        ("id2".to_string(), "Focus Mix".to_string()),
                    ]
                );
            }
            other => panic!("expected ambiguity, got {:?}", other),
        }
    }

    #[test]
    fn test_contains_ties_are_ambiguous() {
        let candidates = items(&["Deep Focus", "Pure Focus", "Chill"]);
        let err = resolve("playlist", "focus", &candidates).unwrap_err();
        match err {
            ControlError::Ambiguous { matches, .. } => assert_eq!(matches.len(), 2),
            other => panic!("expected ambiguity, got {:?}", other),
        }
    }

    #[test]
    fn test_exact_duplicates_differing_by_case_are_ambiguous() {
        let candidates = items(&["Chill", "Chill Vibes", "Super Chill Mix", "CHILL"]);
        let err = resolve("playlist", "Chill", &candidates).unwrap_err();
        match err {
            ControlError::Ambiguous { matches, .. } => {
                let names: Vec<_> = matches.iter().map(|(_, n)| n.as_str()).collect();
                assert_eq!(names, vec!["Chill", "CHILL"]);
            }
            other => panic!("expected ambiguity, got {:?}", other),
        }
    }

    #[test]
    fn test_not_found() {
        let candidates = items(&["Chill", "Focus"]);
        let err = resolve("playlist", "metal", &candidates).unwrap_err();
        assert!(matches!(err, ControlError::NotFound { .. }));
        assert_eq!(err.to_string(), "No playlist matches 'metal'");
    }

    #[test]
    fn test_subsequence_resolution() {
        let candidates = items(&["Chill", "Super Chill Mix"]);
        let found = resolve("playlist", "spr chll", &candidates).unwrap();
        assert_eq!(found.name, "Super Chill Mix");
    }

    #[test]
    fn test_resolve_all_dedups() {
        let candidates = items(&["Kitchen", "Living Room", "Computer"]);
        let found = resolve_all("output device", &["kitch", "living", "Kitchen"], &candidates).unwrap();
        let names: Vec<_> = found.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Kitchen", "Living Room"]);
    }

    #[test]
    fn test_resolve_all_stops_on_error() {
        let candidates = items(&["Kitchen", "Living Room"]);
        let err = resolve_all("output device", &["kitchen", "garage"], &candidates).unwrap_err();
        match err {
            ControlError::NotFound { query, .. } => assert_eq!(query, "garage"),
            other => panic!("expected not found, got {:?}", other),
        }
    }
}
