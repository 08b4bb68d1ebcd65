//! Fuzzy name matching for composers and piece titles.
//!
//! Imported sheets spell names loosely: "J. S. Bach", "Rachmaninov",
//! "Antonio Vivaldi". Matching existing catalog entries instead of
//! creating near-duplicates needs a tolerant comparison. All scoring
//! runs on a normalized form (lowercase, ASCII alphanumerics only),
//! with a token-level pass for name fragments and initials and a
//! Levenshtein fallback for spelling variants.

/// Scores at or above this are treated as the same name.
pub const MATCH_THRESHOLD: f64 = 0.8;

/// Most candidates ever surfaced for an ambiguous match.
pub const MAX_MATCH_OPTIONS: usize = 5;

/// Score of an exact normalized match.
const EXACT_SCORE: f64 = 1.0;

/// Score when one normalized name contains the other.
const SUBSTRING_SCORE: f64 = 0.9;

/// Score when every query token matches some candidate token.
const ALL_TOKENS_SCORE: f64 = 0.85;

/// Lowercase `s` and strip everything but ASCII alphanumerics.
pub fn normalize(s: &str) -> String {
    s.to_lowercase()
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .collect()
}

/// Split a name into lowercase tokens on whitespace and commas.
///
/// Periods survive ("J. S. Bach" keeps its abbreviation dots); the
/// per-token comparison normalizes them away later.
pub fn tokenize(s: &str) -> Vec<String> {
    s.to_lowercase()
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Classic edit distance over characters.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];
    for i in 1..=a.len() {
        curr[0] = i;
        for j in 1..=b.len() {
            let cost = usize::from(a[i - 1] != b[j - 1]);
            curr[j] = (prev[j] + 1)
                .min(curr[j - 1] + 1)
                .min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// Edit-distance similarity in `0.0..=1.0` for two already-normalized
/// strings. Empty inputs score 0.
pub fn similarity(a: &str, b: &str) -> f64 {
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 0.0;
    }
    1.0 - levenshtein(a, b) as f64 / max_len as f64
}

/// Composite score in `0.0..=1.0` for how well `query` names the same
/// thing as `candidate`.
///
/// In descending order of confidence: exact normalized equality (1.0),
/// containment either way (0.9), all query tokens matching candidate
/// tokens (0.85, initials count), then the better of a partial token
/// ratio and whole-string edit similarity.
pub fn similarity_score(query: &str, candidate: &str) -> f64 {
    let nq = normalize(query);
    let nc = normalize(candidate);
    if nq.is_empty() || nc.is_empty() {
        return 0.0;
    }
    if nq == nc {
        return EXACT_SCORE;
    }
    if nc.contains(&nq) || nq.contains(&nc) {
        return SUBSTRING_SCORE;
    }

    let query_tokens = normalized_tokens(query);
    let cand_tokens = normalized_tokens(candidate);

    let matched = query_tokens
        .iter()
        .filter(|qt| cand_tokens.iter().any(|ct| token_matches(qt, ct)))
        .count();

    let token_score = if query_tokens.is_empty() {
        0.0
    } else if matched == query_tokens.len() {
        ALL_TOKENS_SCORE
    } else {
        ALL_TOKENS_SCORE * matched as f64 / query_tokens.len() as f64
    };

    token_score.max(similarity(&nq, &nc))
}

fn normalized_tokens(s: &str) -> Vec<String> {
    tokenize(s)
        .iter()
        .map(|t| normalize(t))
        .filter(|t| !t.is_empty())
        .collect()
}

/// Whether one normalized query token names one candidate token.
/// Single letters act as initials ("j" matches "johann").
fn token_matches(query: &str, candidate: &str) -> bool {
    if query == candidate {
        return true;
    }
    if query.chars().count() == 1 {
        return candidate.starts_with(query);
    }
    similarity(query, candidate) >= MATCH_THRESHOLD
}

/// One scored candidate out of [`rank_candidates`].
#[derive(Debug)]
pub struct RankedMatch<'a, T> {
    pub candidate: &'a T,
    pub score: f64,
}

/// Score every candidate against `query`, keep those at or above
/// `min_score`, sorted best-first and truncated to `max_results`.
pub fn rank_candidates<'a, T>(
    query: &str,
    candidates: &'a [T],
    name: impl Fn(&T) -> &str,
    min_score: f64,
    max_results: usize,
) -> Vec<RankedMatch<'a, T>> {
    let mut ranked: Vec<RankedMatch<'a, T>> = candidates
        .iter()
        .map(|candidate| RankedMatch {
            candidate,
            score: similarity_score(query, name(candidate)),
        })
        .filter(|m| m.score >= min_score)
        .collect();
    ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
    ranked.truncate(max_results);
    ranked
}

/// Result of matching one sheet name against existing catalog entries.
#[derive(Debug)]
pub enum MatchOutcome<'a, T> {
    /// Nothing cleared the match threshold.
    NoMatch,
    /// One acceptable candidate, or an unrivalled exact match.
    Unique(&'a T),
    /// Several acceptable candidates; a user resolution is needed.
    Ambiguous(Vec<RankedMatch<'a, T>>),
}

/// Match `query` against `candidates` at [`MATCH_THRESHOLD`].
///
/// An exact normalized match wins outright even when lesser candidates
/// also clear the threshold; otherwise more than one acceptable
/// candidate is ambiguous.
pub fn best_match<'a, T>(
    query: &str,
    candidates: &'a [T],
    name: impl Fn(&T) -> &str,
) -> MatchOutcome<'a, T> {
    let ranked = rank_candidates(query, candidates, name, MATCH_THRESHOLD, MAX_MATCH_OPTIONS);
    if ranked.is_empty() {
        return MatchOutcome::NoMatch;
    }
    let exact_leader = ranked[0].score >= EXACT_SCORE
        && ranked.get(1).map_or(true, |r| r.score < EXACT_SCORE);
    if ranked.len() == 1 || exact_leader {
        return MatchOutcome::Unique(ranked[0].candidate);
    }
    MatchOutcome::Ambiguous(ranked)
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    // -- normalize / tokenize tests --

    #[test]
    fn test_normalize_strips_case_and_punctuation() {
        assert_eq!(normalize("Bach, Johann Sebastian"), "bachjohannsebastian");
        assert_eq!(normalize("J. S. Bach"), "jsbach");
        assert_eq!(normalize("Dvořák"), "dvok");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn test_tokenize_splits_on_whitespace_and_commas() {
        assert_eq!(
            tokenize("Bach, Johann Sebastian"),
            vec!["bach", "johann", "sebastian"]
        );
        assert_eq!(tokenize("Vaughan Williams"), vec!["vaughan", "williams"]);
        assert_eq!(tokenize("J. S. Bach"), vec!["j.", "s.", "bach"]);
        assert_eq!(tokenize("multi  space   test"), vec!["multi", "space", "test"]);
        assert!(tokenize("").is_empty());
    }

    // -- levenshtein / similarity tests --

    #[test]
    fn test_levenshtein_known_distances() {
        assert_eq!(levenshtein("kitten", "sitting"), 3);
        assert_eq!(levenshtein("rachmaninoff", "rachmaninov"), 2);
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("abc", ""), 3);
        assert_eq!(levenshtein("same", "same"), 0);
    }

    #[test]
    fn test_similarity_bounds() {
        assert_eq!(similarity("", ""), 0.0);
        assert_eq!(similarity("abcd", "abcd"), 1.0);
        assert!(similarity("abcd", "wxyz") <= 0.0 + f64::EPSILON);
    }

    // -- similarity_score tests --

    #[test]
    fn test_exact_match_scores_one() {
        assert_eq!(similarity_score("Bach", "Bach"), 1.0);
        assert_eq!(similarity_score("bach", "BACH"), 1.0);
        assert_eq!(similarity_score("Rutter, John", "Rutter, John"), 1.0);
    }

    #[test]
    fn test_substring_match_scores_high() {
        assert!(similarity_score("Bach", "Bach, Johann Sebastian") >= 0.9);
        assert!(similarity_score("Hallelujah", "Hallelujah Chorus") >= 0.9);
        assert!(similarity_score("Symphony No. 5", "Symphony No. 5 in C minor") >= 0.8);
        assert!(similarity_score("B", "Bach") >= 0.5);
    }

    #[test]
    fn test_all_token_match_scores_above_threshold() {
        assert!(similarity_score("Johann Bach", "Bach, Johann Sebastian") >= 0.85);
        assert!(similarity_score("J S Bach", "Johann Sebastian Bach") >= 0.7);
        assert!(similarity_score("J. S. Bach", "Bach, Johann Sebastian") >= MATCH_THRESHOLD);
    }

    #[test]
    fn test_spelling_variants_score_between() {
        let score = similarity_score("Rachmaninoff", "Rachmaninov");
        assert!((0.7..1.0).contains(&score), "got {score}");
    }

    #[test]
    fn test_unrelated_names_score_low() {
        assert!(similarity_score("Bach", "Mozart") < 0.5);
    }

    #[test]
    fn test_empty_inputs_score_zero() {
        assert_eq!(similarity_score("", ""), 0.0);
        assert_eq!(similarity_score("Bach", ""), 0.0);
        assert_eq!(similarity_score("", "Bach"), 0.0);
    }

    #[test]
    fn test_unicode_names_survive_normalization() {
        assert!(similarity_score("Dvořák", "Dvorak") >= 0.6);
    }

    #[test]
    fn test_long_names_score_moderately() {
        let a = "This is a very long composer name with many words";
        let b = "This is a very long composer name with different words";
        let score = similarity_score(a, b);
        assert!((0.5..0.95).contains(&score), "got {score}");
    }

    // -- rank_candidates tests --

    const COMPOSERS: [&str; 5] = [
        "Bach, Johann Sebastian",
        "Bach, Carl Philipp Emanuel",
        "Mozart, Wolfgang Amadeus",
        "Rutter, John",
        "Rachmaninoff, Sergei",
    ];

    #[test]
    fn test_rank_candidates_sorts_and_filters() {
        let ranked = rank_candidates("Bach", &COMPOSERS, |c| c, 0.6, 10);
        assert!(ranked.len() >= 2);
        assert!(ranked[0].candidate.contains("Bach"));
        assert!(ranked.iter().all(|r| r.score >= 0.6));
        assert!(ranked.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn test_rank_candidates_respects_max_results() {
        let ranked = rank_candidates("a", &COMPOSERS, |c| c, 0.1, 2);
        assert!(ranked.len() <= 2);
    }

    #[test]
    fn test_rank_candidates_high_threshold_excludes_noise() {
        let ranked = rank_candidates("xyz", &COMPOSERS, |c| c, 0.9, 10);
        assert!(ranked.is_empty());
    }

    #[test]
    fn test_rank_candidates_exact_match_tops() {
        let ranked = rank_candidates("Rutter, John", &COMPOSERS, |c| c, 0.6, 10);
        assert_eq!(*ranked[0].candidate, "Rutter, John");
        assert!(ranked[0].score >= 0.95);
    }

    #[test]
    fn test_rank_prefers_candidates_with_all_tokens() {
        let candidates = ["Bach, Johann Sebastian", "Sebastian, Johann", "Brahms, Johannes"];
        let ranked = rank_candidates("Sebastian Bach", &candidates, |c| c, 0.6, 10);
        assert!(!ranked.is_empty());
        assert_eq!(*ranked[0].candidate, "Bach, Johann Sebastian");
    }

    // -- best_match tests --

    #[test]
    fn test_best_match_unique_for_single_candidate() {
        let candidates = ["Mendelssohn, Felix"];
        match best_match("Mendelssohn", &candidates, |c| c) {
            MatchOutcome::Unique(c) => assert_eq!(*c, "Mendelssohn, Felix"),
            other => panic!("expected unique match, got {other:?}"),
        }
    }

    #[test]
    fn test_best_match_ambiguous_for_rival_candidates() {
        let candidates = ["Bach, Johann Sebastian", "Bach, Carl Philipp Emanuel"];
        match best_match("Bach", &candidates, |c| c) {
            MatchOutcome::Ambiguous(options) => assert_eq!(options.len(), 2),
            other => panic!("expected ambiguous match, got {other:?}"),
        }
    }

    #[test]
    fn test_best_match_exact_beats_close_rival() {
        // "Composer A" vs "Composer B" differ by one letter, so both
        // clear the threshold; the exact match must still win outright.
        let candidates = ["Composer A", "Composer B"];
        match best_match("Composer A", &candidates, |c| c) {
            MatchOutcome::Unique(c) => assert_eq!(*c, "Composer A"),
            other => panic!("expected unique match, got {other:?}"),
        }
    }

    #[test]
    fn test_best_match_none_below_threshold() {
        let candidates = ["Mozart, Wolfgang Amadeus"];
        assert!(matches!(
            best_match("Byrd", &candidates, |c| c),
            MatchOutcome::NoMatch
        ));
    }
}
