//! Matching a user-typed query against named entities.
//!
//! Query and candidate names are canonicalized with
//! [`amrutils::canonicalize`] and then lower-cased (in that order: the
//! invisible-mark strip works on exact code points). Each pair falls into
//! exactly one [`MatchTier`], evaluated in precedence order:
//!
//! 1. `Exact`: equal strings
//! 2. `Prefix`: the candidate starts with the query
//! 3. `Contains`: the query is a contiguous substring of the candidate
//! 4. `Subsequence`: the query characters appear in order, not necessarily
//!    contiguous (greedy leftmost scan)
//! 5. `None`: no match, excluded from ranking
//!
//! An empty query matches everything: it is a prefix of every name. Callers
//! that need a stricter behaviour reject empty queries themselves.

use std::cmp::Ordering;

use amrutils::canonicalize;
use serde::Serialize;

/// Anything that can be looked up by name: a stable identifier and a
/// display name. Identifiers are unique within a universe, names may repeat.
pub trait Candidate {
    fn id(&self) -> &str;
    fn display_name(&self) -> &str;
}

/// Plain identifier/name pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct NamedItem {
    pub id: String,
    pub name: String,
}

impl NamedItem {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

impl Candidate for NamedItem {
    fn id(&self) -> &str {
        &self.id
    }

    fn display_name(&self) -> &str {
        &self.name
    }
}

/// Match quality, best first. The derived ordering is the precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchTier {
    Exact,
    Prefix,
    Contains,
    Subsequence,
    None,
}

impl MatchTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchTier::Exact => "exact",
            MatchTier::Prefix => "prefix",
            MatchTier::Contains => "contains",
            MatchTier::Subsequence => "subsequence",
            MatchTier::None => "none",
        }
    }
}

/// Tightness of a subsequence match, in characters of the folded candidate.
///
/// Ordered by `span` then `start`: smaller is better.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct SubsequenceScore {
    /// Distance from the first to the last matched character, inclusive.
    pub span: usize,
    /// Position of the first matched character.
    pub start: usize,
}

/// Tier of one query/candidate pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub tier: MatchTier,
    /// Only set for [`MatchTier::Subsequence`].
    pub score: Option<SubsequenceScore>,
    /// Character offset of the match in the candidate (0 for exact and prefix).
    pub offset: usize,
}

impl Classification {
    fn new(tier: MatchTier, offset: usize) -> Self {
        Self {
            tier,
            score: None,
            offset,
        }
    }

    pub fn is_match(&self) -> bool {
        self.tier != MatchTier::None
    }
}

/// Classifies `candidate` against `query`, both raw display strings.
pub fn classify(query: &str, candidate: &str) -> Classification {
    let query = fold(query);
    let candidate = fold(candidate);
    classify_folded(&query, &candidate)
}

fn fold(text: &str) -> String {
    canonicalize(text).to_lowercase()
}

fn classify_folded(query: &str, candidate: &str) -> Classification {
    if query == candidate {
        return Classification::new(MatchTier::Exact, 0);
    }
    if candidate.starts_with(query) {
        return Classification::new(MatchTier::Prefix, 0);
    }
    if let Some(byte_offset) = candidate.find(query) {
        let offset = candidate[..byte_offset].chars().count();
        return Classification::new(MatchTier::Contains, offset);
    }
    match subsequence_score(query, candidate) {
        Some(score) => Classification {
            tier: MatchTier::Subsequence,
            score: Some(score),
            offset: score.start,
        },
        None => Classification::new(MatchTier::None, 0),
    }
}

/// Greedy leftmost subsequence scan.
fn subsequence_score(query: &str, candidate: &str) -> Option<SubsequenceScore> {
    let mut wanted = query.chars().peekable();
    let mut first = None;
    let mut last = 0;

    for (index, c) in candidate.chars().enumerate() {
        match wanted.peek() {
            Some(&w) if w == c => {
                first.get_or_insert(index);
                last = index;
                wanted.next();
            }
            Some(_) => {}
            None => break,
        }
    }

    if wanted.peek().is_some() {
        return None;
    }
    let start = first?;
    Some(SubsequenceScore {
        span: last - start + 1,
        start,
    })
}

/// A candidate annotated with its tier. Built per query, never stored.
#[derive(Debug, Clone)]
pub struct MatchResult<'a, T> {
    pub candidate: &'a T,
    pub tier: MatchTier,
    pub score: Option<SubsequenceScore>,
    offset: usize,
    length: usize,
    canonical: String,
}

impl<'a, T: Candidate> MatchResult<'a, T> {
    /// Canonical (not lower-cased) form of the candidate name.
    pub fn canonical_name(&self) -> &str {
        &self.canonical
    }

    pub fn id(&self) -> &'a str {
        self.candidate.id()
    }

    pub fn display_name(&self) -> &'a str {
        self.candidate.display_name()
    }
}

/// Tier-local ordering. `sort_by` is stable, so equal keys keep input order.
fn compare<T: Candidate>(a: &MatchResult<'_, T>, b: &MatchResult<'_, T>) -> Ordering {
    let by_length_then_id = || {
        a.length
            .cmp(&b.length)
            .then_with(|| a.candidate.id().cmp(b.candidate.id()))
    };

    a.tier.cmp(&b.tier).then_with(|| match a.tier {
        MatchTier::Exact | MatchTier::None => Ordering::Equal,
        MatchTier::Prefix => by_length_then_id(),
        MatchTier::Contains => a.offset.cmp(&b.offset).then_with(by_length_then_id),
        MatchTier::Subsequence => a.score.cmp(&b.score).then_with(by_length_then_id),
    })
}

/// Ranks every matching candidate, best first.
///
/// Candidates with tier `None` are dropped. Within a tier:
/// - exact matches keep their input order
/// - prefix matches prefer shorter names
/// - contains matches prefer an earlier match, then shorter names
/// - subsequence matches prefer a tighter span, then an earlier start, then
///   shorter names
///
/// Remaining ties are broken by identifier.
pub fn rank<'a, T: Candidate>(query: &str, candidates: &'a [T]) -> Vec<MatchResult<'a, T>> {
    let query = fold(query);

    let mut results: Vec<MatchResult<'a, T>> = candidates
        .iter()
        .filter_map(|candidate| {
            let canonical = canonicalize(candidate.display_name());
            let folded = canonical.to_lowercase();
            let classification = classify_folded(&query, &folded);
            classification.is_match().then(|| MatchResult {
                candidate,
                tier: classification.tier,
                score: classification.score,
                offset: classification.offset,
                length: folded.chars().count(),
                canonical,
            })
        })
        .collect();

    results.sort_by(compare);
    results
}

/// The leading run of `ranked` sharing the best tier.
pub fn top_ties<'r, 'a, T>(ranked: &'r [MatchResult<'a, T>]) -> &'r [MatchResult<'a, T>] {
    match ranked.first() {
        Some(best) => {
            let count = ranked.iter().take_while(|r| r.tier == best.tier).count();
            &ranked[..count]
        }
        None => &[],
    }
}

/// Best single match, or `None` when nothing matched.
///
/// Several exact matches (names differing only by case) are settled in favour
/// of the one whose canonical form is identical to the query's, else the
/// first seen. This never reports ambiguity: see [`crate::resolver`] for the
/// strict resolution mode.
pub fn pick_best<'a, T: Candidate>(query: &str, candidates: &'a [T]) -> Option<MatchResult<'a, T>> {
    let ranked = rank(query, candidates);
    let canonical_query = canonicalize(query);

    let chosen = top_ties(&ranked)
        .iter()
        .position(|r| r.tier == MatchTier::Exact && r.canonical == canonical_query)
        .unwrap_or(0);

    ranked.into_iter().nth(chosen)
}
