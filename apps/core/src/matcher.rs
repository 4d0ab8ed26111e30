use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;

use crate::config::MatcherKind;
use crate::model::normalize_for_search;

/// Ranking strategy. Given a query and, per item, the strings it can be found
/// by, returns the indices of matching items best first.
pub trait QueryMatcher {
    fn rank(&self, query: &str, candidates: &[Vec<&str>]) -> Vec<usize>;
}

impl<M: QueryMatcher + ?Sized> QueryMatcher for Box<M> {
    fn rank(&self, query: &str, candidates: &[Vec<&str>]) -> Vec<usize> {
        (**self).rank(query, candidates)
    }
}

pub fn matcher_for(kind: MatcherKind) -> Box<dyn QueryMatcher> {
    match kind {
        MatcherKind::Skim => Box::new(SkimMatcher::default()),
        MatcherKind::Subsequence => Box::new(SubsequenceMatcher),
    }
}

#[derive(Default)]
pub struct SkimMatcher {
    inner: SkimMatcherV2,
}

impl QueryMatcher for SkimMatcher {
    fn rank(&self, query: &str, candidates: &[Vec<&str>]) -> Vec<usize> {
        let query = query.trim();
        rank_by(candidates, |_, text| self.inner.fuzzy_match(text, query))
    }
}

/// In-order subsequence matching over alphanumeric characters. Word starts
/// and runs of adjacent hits score higher, and earlier keywords outweigh later
/// ones: an item's title beats its domain, which beats its raw url.
pub struct SubsequenceMatcher;

impl QueryMatcher for SubsequenceMatcher {
    fn rank(&self, query: &str, candidates: &[Vec<&str>]) -> Vec<usize> {
        let needle: Vec<char> = normalize_for_search(query).chars().collect();
        if needle.is_empty() {
            return Vec::new();
        }
        rank_by(candidates, |slot, text| {
            keyword_score(&needle, text).map(|score| score * keyword_weight(slot))
        })
    }
}

fn keyword_weight(slot: usize) -> i64 {
    match slot {
        0 => 3,
        1 => 2,
        _ => 1,
    }
}

const HIT: i64 = 10;
const WORD_START_BONUS: i64 = 15;
const ADJACENT_BONUS: i64 = 10;
const LEADING_BONUS: i64 = 20;
const MAX_LENGTH_PENALTY: i64 = 20;

/// Lowercased alphanumeric characters of `text`, each tagged with whether it
/// opens a word.
fn searchable_chars(text: &str) -> Vec<(char, bool)> {
    let mut chars = Vec::with_capacity(text.len());
    let mut at_boundary = true;
    for c in text.chars() {
        if !c.is_alphanumeric() {
            at_boundary = true;
            continue;
        }
        for (offset, lower) in c.to_lowercase().enumerate() {
            chars.push((lower, at_boundary && offset == 0));
        }
        at_boundary = false;
    }
    chars
}

fn keyword_score(needle: &[char], text: &str) -> Option<i64> {
    let haystack = searchable_chars(text);
    let mut score = 0;
    let mut cursor = 0;
    let mut previous: Option<usize> = None;

    for wanted in needle {
        let hit = cursor + haystack[cursor..].iter().position(|(c, _)| c == wanted)?;
        score += HIT;
        if haystack[hit].1 {
            score += WORD_START_BONUS;
        }
        match previous {
            Some(last) if hit == last + 1 => score += ADJACENT_BONUS,
            Some(last) => score -= (hit - last - 1) as i64,
            None if hit == 0 => score += LEADING_BONUS,
            None => score -= hit as i64,
        }
        previous = Some(hit);
        cursor = hit + 1;
    }

    let unmatched = (haystack.len() - needle.len()) as i64;
    Some((score - unmatched.min(MAX_LENGTH_PENALTY)).max(1))
}

fn rank_by<F>(candidates: &[Vec<&str>], score: F) -> Vec<usize>
where
    F: Fn(usize, &str) -> Option<i64>,
{
    let mut scored: Vec<(i64, usize)> = candidates
        .iter()
        .enumerate()
        .filter_map(|(index, keywords)| {
            keywords
                .iter()
                .enumerate()
                .filter_map(|(slot, text)| score(slot, text))
                .max()
                .map(|best| (best, index))
        })
        .collect();

    scored.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));
    scored.into_iter().map(|(_, index)| index).collect()
}

#[cfg(test)]
mod tests {
    use super::{QueryMatcher, SkimMatcher, SubsequenceMatcher};

    fn candidates() -> Vec<Vec<&'static str>> {
        vec![
            vec!["Codeium", "codeium.com"],
            vec!["Inbox", "mail.example.com"],
            vec!["Code", "code.visualstudio.com"],
        ]
    }

    #[test]
    fn subsequence_prefers_tighter_match() {
        let ranked = SubsequenceMatcher.rank("code", &candidates());
        assert_eq!(ranked, vec![2, 0]);
    }

    #[test]
    fn subsequence_matches_out_of_contiguous_order() {
        let ranked = SubsequenceMatcher.rank("ibx", &candidates());
        assert_eq!(ranked, vec![1]);
    }

    #[test]
    fn title_hits_outrank_domain_hits() {
        let candidates = vec![
            vec!["Weekly notes", "rust-lang.org", "https://rust-lang.org/notes"],
            vec!["Rust blog", "blog.example", "https://blog.example/"],
        ];
        assert_eq!(SubsequenceMatcher.rank("rust", &candidates), vec![1, 0]);
    }

    #[test]
    fn word_starts_beat_buried_hits() {
        let candidates = vec![vec!["Thrust gauge"], vec!["Read the Rust book"]];
        assert_eq!(SubsequenceMatcher.rank("rust", &candidates), vec![1, 0]);
    }

    #[test]
    fn keywords_are_searched_too() {
        let ranked = SkimMatcher::default().rank("mail", &candidates());
        assert_eq!(ranked, vec![1]);
    }

    #[test]
    fn skim_drops_non_matching_items() {
        let ranked = SkimMatcher::default().rank("zzz", &candidates());
        assert!(ranked.is_empty());
    }
}
