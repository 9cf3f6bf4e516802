//! The compiled [`Pattern`] and its matching entry points.

use std::fmt;
use std::str::FromStr;

use super::iter::{Matches, TryMatches};
use super::matcher::{
    self, MatchBudgetExceeded, MatchResult, StepCounter, Unlimited, try_match_at,
};
use super::nfa::Nfa;
use super::parser::{Ast, PatternSyntaxError, parse};
use super::replace::{self, TemplateError};

/// A compiled regular expression.
///
/// Immutable once built; matching only reads it, so one `Pattern` can be
/// shared between threads.
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    ast: Ast,
    nfa: Nfa,
    step_limit: Option<usize>,
}

/// Compile `pattern`.
pub fn compile(pattern: &str) -> Result<Pattern, PatternSyntaxError> {
    Pattern::new(pattern)
}

impl Pattern {
    pub fn new(pattern: &str) -> Result<Self, PatternSyntaxError> {
        let ast = parse(pattern).inspect_err(|err| {
            tracing::debug!(pattern, %err, "pattern rejected");
        })?;
        let nfa = Nfa::new(&ast)?;
        tracing::debug!(
            pattern,
            captures = ast.captures,
            states = nfa.len(),
            "compiled pattern"
        );
        tracing::trace!("automaton for {pattern:?}:\n{nfa}");
        Ok(Self {
            source: pattern.to_owned(),
            ast,
            nfa,
            step_limit: None,
        })
    }

    /// Cap the backtracking work of each `try_*` search at `limit` steps.
    pub fn with_step_limit(mut self, limit: usize) -> Self {
        self.step_limit = Some(limit);
        self
    }

    pub fn step_limit(&self) -> Option<usize> {
        self.step_limit
    }

    /// The pattern string this was compiled from.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Number of capturing groups, not counting the whole match.
    pub fn captures_len(&self) -> usize {
        self.ast.captures
    }

    pub fn ast(&self) -> &Ast {
        &self.ast
    }

    pub fn nfa(&self) -> &Nfa {
        &self.nfa
    }

    pub fn is_match(&self, haystack: &str) -> bool {
        self.find(haystack).is_some()
    }

    /// Leftmost match anywhere in `haystack`.
    pub fn find(&self, haystack: &str) -> Option<MatchResult> {
        self.find_at(haystack, 0)
    }

    /// Leftmost match starting at or after byte offset `start`.
    pub fn find_at(&self, haystack: &str, start: usize) -> Option<MatchResult> {
        let Ok(found) = matcher::search(&self.nfa, haystack, start, &mut Unlimited);
        found
    }

    /// A match covering all of `haystack`, if there is one.
    pub fn full_match(&self, haystack: &str) -> Option<MatchResult> {
        matcher::match_at(self, haystack, 0, true)
    }

    /// All non-overlapping matches, left to right.
    pub fn find_iter<'p, 'h>(&'p self, haystack: &'h str) -> Matches<'p, 'h> {
        Matches::new(self, haystack)
    }

    /// [`find`](Self::find) under the configured step limit.
    pub fn try_find(&self, haystack: &str) -> Result<Option<MatchResult>, MatchBudgetExceeded> {
        matcher::search(&self.nfa, haystack, 0, &mut self.budget())
    }

    /// [`full_match`](Self::full_match) under the configured step limit.
    pub fn try_full_match(
        &self,
        haystack: &str,
    ) -> Result<Option<MatchResult>, MatchBudgetExceeded> {
        try_match_at(&self.nfa, haystack, 0, true, &mut self.budget())
    }

    /// [`find_iter`](Self::find_iter) under the configured step limit,
    /// applied to each search separately.
    pub fn try_find_iter<'p, 'h>(&'p self, haystack: &'h str) -> TryMatches<'p, 'h> {
        TryMatches::new(self, haystack)
    }

    /// Replace every match with the expansion of `template`.
    pub fn replace_all(&self, haystack: &str, template: &str) -> Result<String, TemplateError> {
        replace::replace(self, haystack, template, None)
    }

    /// Replace only the leftmost match.
    pub fn replace_first(&self, haystack: &str, template: &str) -> Result<String, TemplateError> {
        replace::replace(self, haystack, template, Some(1))
    }

    pub(crate) fn budget(&self) -> StepCounter {
        StepCounter::new(self.step_limit)
    }
}

impl FromStr for Pattern {
    type Err = PatternSyntaxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}
