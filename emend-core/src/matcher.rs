//! Maps edited-source paragraph records onto live document paragraphs.
//!
//! Precedence, first hit wins: exact (whitespace-collapsed) equality, fuzzy
//! word overlap, then the record's declared position.

use tracing::debug;

use crate::config::EngineConfig;
use crate::text::collapse_whitespace;
use crate::types::LiveParagraph;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    Exact,
    Fuzzy,
    Positional,
}

impl MatchKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MatchKind::Exact => "exact",
            MatchKind::Fuzzy => "fuzzy",
            MatchKind::Positional => "positional",
        }
    }
}

/// Finds the live paragraph whose text matches `target` by content alone.
///
/// Returns the candidate index and how it matched. Positional fallback is not
/// attempted here; see [`ParagraphMatcher::resolve`].
pub fn match_paragraph(
    candidates: &[LiveParagraph],
    target: &str,
    config: &EngineConfig,
) -> Option<(usize, MatchKind)> {
    find(candidates, target, config, |_| false)
}

/// Fraction of `target` words that occur, case-insensitively, inside some
/// word of `candidate`. Zero when `target` has no words.
pub fn word_overlap(target: &str, candidate: &str) -> f64 {
    let candidate_words: Vec<String> = candidate.split_whitespace().map(str::to_lowercase).collect();
    let mut total = 0usize;
    let mut found = 0usize;
    for word in target.split_whitespace() {
        total += 1;
        let word = word.to_lowercase();
        if candidate_words.iter().any(|c| c.contains(&word)) {
            found += 1;
        }
    }
    if total == 0 {
        0.0
    } else {
        found as f64 / total as f64
    }
}

fn find(
    candidates: &[LiveParagraph],
    target: &str,
    config: &EngineConfig,
    skip: impl Fn(usize) -> bool,
) -> Option<(usize, MatchKind)> {
    let collapsed = collapse_whitespace(target);
    if let Some(idx) = (0..candidates.len())
        .filter(|&i| !skip(i))
        .find(|&i| collapse_whitespace(&candidates[i].text) == collapsed)
    {
        return Some((idx, MatchKind::Exact));
    }

    if target.split_whitespace().count() <= config.min_fuzzy_words {
        return None;
    }
    (0..candidates.len())
        .filter(|&i| !skip(i))
        .find(|&i| word_overlap(target, &candidates[i].text) >= config.fuzzy_threshold)
        .map(|i| (i, MatchKind::Fuzzy))
}

/// Stateful matcher that hands out each live paragraph at most once.
pub struct ParagraphMatcher<'a> {
    candidates: &'a [LiveParagraph],
    claimed: Vec<bool>,
    config: &'a EngineConfig,
}

impl<'a> ParagraphMatcher<'a> {
    pub fn new(candidates: &'a [LiveParagraph], config: &'a EngineConfig) -> Self {
        Self {
            candidates,
            claimed: vec![false; candidates.len()],
            config,
        }
    }

    /// Content match among unclaimed candidates.
    pub fn find(&self, target: &str) -> Option<(usize, MatchKind)> {
        find(self.candidates, target, self.config, |i| self.claimed[i])
    }

    /// `paragraph_number - 1` as an index, if in range and unclaimed.
    pub fn positional(&self, paragraph_number: u32) -> Option<usize> {
        let idx = (paragraph_number as usize).checked_sub(1)?;
        (idx < self.candidates.len() && !self.claimed[idx]).then_some(idx)
    }

    pub fn claim(&mut self, idx: usize) {
        if let Some(slot) = self.claimed.get_mut(idx) {
            *slot = true;
        }
    }

    /// Runs the full precedence and claims the winner.
    pub fn resolve(&mut self, target: &str, paragraph_number: u32) -> Option<(&'a LiveParagraph, MatchKind)> {
        let (idx, kind) = self
            .find(target)
            .or_else(|| self.positional(paragraph_number).map(|i| (i, MatchKind::Positional)))?;
        self.claim(idx);
        let candidates = self.candidates;
        debug!(
            paragraph_number,
            live_id = %candidates[idx].id,
            kind = kind.as_str(),
            "matched paragraph"
        );
        Some((&candidates[idx], kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn live(texts: &[&str]) -> Vec<LiveParagraph> {
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| LiveParagraph::new(format!("L{i}"), *t))
            .collect()
    }

    #[test]
    fn exact_match_ignores_whitespace_runs() {
        let candidates = live(&["first", "the  quick\tfox", "other"]);
        let hit = match_paragraph(&candidates, " the quick fox ", &EngineConfig::default());
        assert_eq!(hit, Some((1, MatchKind::Exact)));
    }

    #[test]
    fn fuzzy_requires_more_than_min_words() {
        let config = EngineConfig::default();
        let candidates = live(&["one two three four five"]);
        assert_eq!(match_paragraph(&candidates, "one two three four fivee", &config), None);

        let candidates = live(&["The cat sat upon the warm mat today"]);
        let hit = match_paragraph(&candidates, "the cat sat on the warm mat", &config);
        assert_eq!(hit, Some((0, MatchKind::Fuzzy)));
    }

    #[test]
    fn overlap_uses_substring_of_candidate_words() {
        assert!((word_overlap("cat dog", "concatenate dogs") - 1.0).abs() < f64::EPSILON);
        assert!((word_overlap("cat bird", "cat") - 0.5).abs() < f64::EPSILON);
        assert_eq!(word_overlap("", "anything"), 0.0);
    }

    #[test]
    fn duplicates_are_claimed_one_to_one() {
        let candidates = live(&["same", "same"]);
        let config = EngineConfig::default();
        let mut matcher = ParagraphMatcher::new(&candidates, &config);
        assert_eq!(matcher.resolve("same", 1).map(|(p, _)| p.id.as_str()), Some("L0"));
        assert_eq!(matcher.resolve("same", 2).map(|(p, _)| p.id.as_str()), Some("L1"));
        assert!(matcher.resolve("same", 3).is_none());
    }

    #[test]
    fn positional_fallback_when_content_differs() {
        let candidates = live(&["alpha", "beta"]);
        let config = EngineConfig::default();
        let mut matcher = ParagraphMatcher::new(&candidates, &config);
        let (p, kind) = matcher.resolve("completely different", 2).unwrap();
        assert_eq!((p.id.as_str(), kind), ("L1", MatchKind::Positional));
        assert!(matcher.positional(0).is_none());
        assert!(matcher.positional(3).is_none());
    }
}
