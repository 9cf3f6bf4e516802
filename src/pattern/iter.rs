//! Lazy iteration over successive non-overlapping matches.

use std::iter::FusedIterator;

use super::compile::Pattern;
use super::matcher::{Backtracker, MatchBudgetExceeded, MatchResult, StepBudget, Unlimited};

/// Search position shared by [`Matches`] and [`TryMatches`].
///
/// `position` only moves forward. After an empty match it moves one char past
/// the match so the next search cannot return the same empty match again.
/// One backtracker serves every search of the pass.
#[derive(Debug, Clone)]
struct Cursor<'p, 'h> {
    backtracker: Backtracker<'p, 'h>,
    haystack: &'h str,
    position: usize,
    exhausted: bool,
}

impl<'p, 'h> Cursor<'p, 'h> {
    fn new(pattern: &'p Pattern, haystack: &'h str) -> Self {
        Self {
            backtracker: Backtracker::new(pattern.nfa(), haystack),
            haystack,
            position: 0,
            exhausted: false,
        }
    }

    fn advance<B: StepBudget>(&mut self, budget: &mut B) -> Result<Option<MatchResult>, B::Error> {
        if self.exhausted {
            return Ok(None);
        }
        let found = match self.backtracker.search(self.position, budget) {
            Ok(found) => found,
            Err(err) => {
                self.exhausted = true;
                return Err(err);
            }
        };
        let Some(m) = found else {
            self.exhausted = true;
            return Ok(None);
        };

        if !m.is_empty() {
            self.position = m.end();
        } else {
            match self.haystack[m.end()..].chars().next() {
                Some(ch) => self.position = m.end() + ch.len_utf8(),
                None => self.exhausted = true,
            }
        }
        Ok(Some(m))
    }
}

/// Iterator returned by [`Pattern::find_iter`].
#[derive(Debug, Clone)]
pub struct Matches<'p, 'h> {
    cursor: Cursor<'p, 'h>,
}

impl<'p, 'h> Matches<'p, 'h> {
    pub(crate) fn new(pattern: &'p Pattern, haystack: &'h str) -> Self {
        Self {
            cursor: Cursor::new(pattern, haystack),
        }
    }
}

impl Iterator for Matches<'_, '_> {
    type Item = MatchResult;

    fn next(&mut self) -> Option<MatchResult> {
        let Ok(found) = self.cursor.advance(&mut Unlimited);
        found
    }
}

impl FusedIterator for Matches<'_, '_> {}

/// Iterator returned by [`Pattern::try_find_iter`].
///
/// Each search gets a fresh step budget. After an error the iterator is done.
#[derive(Debug, Clone)]
pub struct TryMatches<'p, 'h> {
    pattern: &'p Pattern,
    cursor: Cursor<'p, 'h>,
}

impl<'p, 'h> TryMatches<'p, 'h> {
    pub(crate) fn new(pattern: &'p Pattern, haystack: &'h str) -> Self {
        Self {
            pattern,
            cursor: Cursor::new(pattern, haystack),
        }
    }
}

impl Iterator for TryMatches<'_, '_> {
    type Item = Result<MatchResult, MatchBudgetExceeded>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut budget = self.pattern.budget();
        self.cursor.advance(&mut budget).transpose()
    }
}

impl FusedIterator for TryMatches<'_, '_> {}

#[cfg(test)]
mod tests {
    use itertools::Itertools;

    use crate::pattern::compile::compile;

    fn spans(pattern: &str, text: &str) -> Vec<(usize, usize)> {
        compile(pattern)
            .unwrap()
            .find_iter(text)
            .map(|m| (m.start(), m.end()))
            .collect_vec()
    }

    #[test]
    fn finds_each_occurrence() {
        assert_eq!(spans(r"\d+", "a1b22c333"), vec![(1, 2), (3, 5), (6, 9)]);
    }

    #[test]
    fn no_matches_is_empty() {
        assert!(spans(r"\d", "abc").is_empty());
    }

    #[test]
    fn empty_matches_advance_by_one_char() {
        assert_eq!(spans("x*", "ab"), vec![(0, 0), (1, 1), (2, 2)]);
    }

    #[test]
    fn empty_match_after_non_empty_match() {
        assert_eq!(spans("a*", "baaa"), vec![(0, 0), (1, 4), (4, 4)]);
    }

    #[test]
    fn empty_matches_step_over_multibyte_chars() {
        assert_eq!(spans("", "é"), vec![(0, 0), (2, 2)]);
    }

    #[test]
    fn empty_haystack_yields_one_empty_match() {
        assert_eq!(spans("a*", ""), vec![(0, 0)]);
    }

    #[test]
    fn anchored_pattern_matches_once() {
        assert_eq!(spans("^a", "aaa"), vec![(0, 1)]);
    }

    #[test]
    fn iteration_restarts_from_zero() {
        let p = compile("o").unwrap();
        let first = p.find_iter("foo").count();
        let second = p.find_iter("foo").map(|m| m.start()).collect_vec();
        assert_eq!(first, 2);
        assert_eq!(second, vec![1, 2]);
    }

    #[test]
    fn iterator_is_fused() {
        let p = compile("a").unwrap();
        let mut it = p.find_iter("a");
        assert!(it.next().is_some());
        assert!(it.next().is_none());
        assert!(it.next().is_none());
    }

    #[test]
    fn try_iter_stops_after_budget_error() {
        let p = compile("(a|b)*c").unwrap().with_step_limit(15);
        let text = "ab".repeat(40);
        let results = p.try_find_iter(&text).collect_vec();
        assert_eq!(results.len(), 1);
        assert!(results[0].is_err());
    }

    #[test]
    fn long_text_keeps_per_match_work_bounded() {
        let p = compile(r"\w+\s").unwrap().with_step_limit(64);
        let text = "ab ".repeat(50_000);
        let mut count = 0;
        for m in p.try_find_iter(&text) {
            let m = m.unwrap();
            assert_eq!(m.len(), 3);
            count += 1;
        }
        assert_eq!(count, 50_000);
    }

    #[test]
    fn try_iter_without_limit_matches_find_iter() {
        let p = compile(r"\w+").unwrap();
        let text = "one two three";
        let tried = p
            .try_find_iter(text)
            .map(|r| r.map(|m| m.span()))
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        let plain = p.find_iter(text).map(|m| m.span()).collect_vec();
        assert_eq!(tried, plain);
    }
}
