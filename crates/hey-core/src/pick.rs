//! Resolution of a user-typed token against a displayed list.
//!
//! A token is either a list index (`"2"`) or a name. Names resolve in three
//! tiers: exact match, then the single closest fuzzy match, then the first
//! entry starting with the token. An exact hit is never overridden by a looser
//! match.

use crate::error::{HeyError, Result};

/// Minimum similarity (0.0..=1.0) for a fuzzy match to count.
pub const FUZZY_CUTOFF: f64 = 0.6;

/// Resolves `token` to an index into `candidates`.
pub fn pick<S: AsRef<str>>(candidates: &[S], token: &str) -> Result<usize> {
    if !token.is_empty() && token.chars().all(|c| c.is_ascii_digit()) {
        let index = token.parse::<usize>().unwrap_or(usize::MAX);
        if index < candidates.len() {
            return Ok(index);
        }
        return Err(HeyError::IndexOutOfRange {
            index,
            len: candidates.len(),
        });
    }

    if let Some(index) = candidates.iter().position(|c| c.as_ref() == token) {
        return Ok(index);
    }

    if let Some(index) = closest_match(candidates, token) {
        return Ok(index);
    }

    candidates
        .iter()
        .position(|c| c.as_ref().starts_with(token))
        .ok_or_else(|| HeyError::NoMatch(token.to_string()))
}

/// Resolves `token` and returns the matching entry.
pub fn pick_value<'a, S: AsRef<str>>(candidates: &'a [S], token: &str) -> Result<&'a S> {
    pick(candidates, token).map(|index| &candidates[index])
}

/// Index of the most similar candidate at or above [`FUZZY_CUTOFF`].
/// Ties keep the earliest entry.
fn closest_match<S: AsRef<str>>(candidates: &[S], token: &str) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (index, candidate) in candidates.iter().enumerate() {
        let score = similarity(candidate.as_ref(), token);
        if score < FUZZY_CUTOFF {
            continue;
        }
        match best {
            Some((_, best_score)) if best_score >= score => {}
            _ => best = Some((index, score)),
        }
    }
    best.map(|(index, _)| index)
}

/// Edit-distance similarity normalised to 0.0..=1.0.
fn similarity(a: &str, b: &str) -> f64 {
    let longest = a.chars().count().max(b.chars().count());
    if longest == 0 {
        return 1.0;
    }
    1.0 - levenshtein(a, b) as f64 / longest as f64
}

fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let m = a.len();
    let n = b.len();

    if m == 0 {
        return n;
    }
    if n == 0 {
        return m;
    }

    let mut prev: Vec<usize> = (0..=n).collect();
    let mut curr = vec![0; n + 1];

    for i in 1..=m {
        curr[0] = i;
        for j in 1..=n {
            let cost = if a[i - 1] == b[j - 1] { 0 } else { 1 };
            curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[n]
}

#[cfg(test)]
mod tests {
    use super::*;

    const GREEK: [&str; 3] = ["alpha", "beta", "gamma"];

    #[test]
    fn test_index_token() {
        assert_eq!(pick_value(&GREEK, "2").unwrap(), &"gamma");
        assert_eq!(pick(&GREEK, "0").unwrap(), 0);
    }

    #[test]
    fn test_index_out_of_range() {
        assert_eq!(
            pick(&GREEK, "3"),
            Err(HeyError::IndexOutOfRange { index: 3, len: 3 })
        );
        assert!(matches!(
            pick(&GREEK, "99999999999999999999999"),
            Err(HeyError::IndexOutOfRange { .. })
        ));
    }

    #[test]
    fn test_exact_match() {
        assert_eq!(pick_value(&GREEK, "beta").unwrap(), &"beta");
    }

    #[test]
    fn test_partial_name_resolves() {
        assert_eq!(pick_value(&GREEK, "bet").unwrap(), &"beta");
    }

    #[test]
    fn test_fuzzy_match_with_typo() {
        assert_eq!(pick_value(&GREEK, "gamna").unwrap(), &"gamma");
    }

    #[test]
    fn test_prefix_fallback_when_too_dissimilar() {
        let titles = ["rust lifetimes explained in depth", "python packaging"];
        assert_eq!(pick(&titles, "rust").unwrap(), 0);
    }

    #[test]
    fn test_exact_beats_looser_matches() {
        let items = ["betas", "beta"];
        assert_eq!(pick(&items, "beta").unwrap(), 1);
    }

    #[test]
    fn test_no_match() {
        assert_eq!(pick(&GREEK, "zzz"), Err(HeyError::NoMatch("zzz".into())));
    }

    #[test]
    fn test_empty_list() {
        let empty: [&str; 0] = [];
        assert!(matches!(pick(&empty, "0"), Err(HeyError::IndexOutOfRange { .. })));
        assert!(matches!(pick(&empty, "x"), Err(HeyError::NoMatch(_))));
    }

    #[test]
    fn test_levenshtein() {
        assert_eq!(levenshtein("kitten", "sitting"), 3);
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("same", "same"), 0);
    }
}
