//! Backtracking matcher: run an [`Nfa`] against a haystack.
//!
//! All positions are **byte** offsets into the haystack and always fall on
//! `char` boundaries.

use std::convert::Infallible;
use std::ops::Range;

use super::ast::AnchorKind;
use super::char_class::{class_matches, is_line_terminator};
use super::compile::Pattern;
use super::nfa::{Nfa, State, StateId};

/// A half-open `start..end` range of byte offsets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }
}

impl From<Span> for Range<usize> {
    fn from(span: Span) -> Self {
        span.range()
    }
}

/// The result of a successful match.
///
/// Holds offsets only, so it can outlive the haystack it was produced from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult {
    span: Span,
    /// Spans of groups `1..`; `None` for groups that did not participate.
    groups: Vec<Option<Span>>,
}

impl MatchResult {
    pub fn span(&self) -> Span {
        self.span
    }

    pub fn start(&self) -> usize {
        self.span.start
    }

    pub fn end(&self) -> usize {
        self.span.end
    }

    pub fn len(&self) -> usize {
        self.span.len()
    }

    pub fn is_empty(&self) -> bool {
        self.span.is_empty()
    }

    /// Span of group `index`, where group 0 is the whole match.
    pub fn get(&self, index: usize) -> Option<Span> {
        match index {
            0 => Some(self.span),
            _ => self.groups.get(index - 1).copied().flatten(),
        }
    }

    /// Capture spans in group order, starting at group 1.
    pub fn groups(&self) -> &[Option<Span>] {
        &self.groups
    }

    /// The matched text. `haystack` must be the text that was searched.
    pub fn as_str<'h>(&self, haystack: &'h str) -> &'h str {
        &haystack[self.span.range()]
    }

    /// Text of group `index`, or `None` if it did not participate.
    pub fn group_str<'h>(&self, haystack: &'h str, index: usize) -> Option<&'h str> {
        self.get(index).map(|span| &haystack[span.range()])
    }
}

/// Raised when a configured step limit runs out before the search finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("match exceeded the step limit of {limit}")]
pub struct MatchBudgetExceeded {
    pub limit: usize,
}

/// Accounting for backtracking work. One step is one state visit.
pub trait StepBudget {
    type Error;

    fn step(&mut self) -> Result<(), Self::Error>;
}

/// No limit; searches always run to completion.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unlimited;

impl StepBudget for Unlimited {
    type Error = Infallible;

    #[inline]
    fn step(&mut self) -> Result<(), Infallible> {
        Ok(())
    }
}

/// Counts steps against an optional limit.
#[derive(Debug, Clone, Copy)]
pub struct StepCounter {
    limit: Option<usize>,
    used: usize,
}

impl StepCounter {
    pub fn new(limit: Option<usize>) -> Self {
        Self { limit, used: 0 }
    }
}

impl StepBudget for StepCounter {
    type Error = MatchBudgetExceeded;

    #[inline]
    fn step(&mut self) -> Result<(), MatchBudgetExceeded> {
        self.used += 1;
        match self.limit {
            Some(limit) if self.used > limit => Err(MatchBudgetExceeded { limit }),
            _ => Ok(()),
        }
    }
}

// ─── Public API ─────────────────────────────────────────────────────────────

/// Try to match `pattern` starting exactly at byte offset `start`.
///
/// With `anchored` set the match must also end at the end of `haystack`.
/// Returns `None` if `start` is out of range or not on a char boundary.
pub fn match_at(
    pattern: &Pattern,
    haystack: &str,
    start: usize,
    anchored: bool,
) -> Option<MatchResult> {
    let Ok(found) = try_match_at(pattern.nfa(), haystack, start, anchored, &mut Unlimited);
    found
}

/// Budgeted form of [`match_at`].
pub fn try_match_at<B: StepBudget>(
    nfa: &Nfa,
    haystack: &str,
    start: usize,
    anchored: bool,
    budget: &mut B,
) -> Result<Option<MatchResult>, B::Error> {
    if !haystack.is_char_boundary(start) {
        return Ok(None);
    }
    Backtracker::new(nfa, haystack).run_at(start, anchored, budget)
}

/// Find the leftmost match starting at or after `from`.
pub fn search<B: StepBudget>(
    nfa: &Nfa,
    haystack: &str,
    from: usize,
    budget: &mut B,
) -> Result<Option<MatchResult>, B::Error> {
    Backtracker::new(nfa, haystack).search(from, budget)
}

// ─── Backtracking engine ─────────────────────────────────────────────────────

#[derive(Debug, Clone)]
enum Frame {
    /// Continue exploring from `state` at `pos`.
    Explore { state: StateId, pos: usize },
    /// Undo a capture write when backtracking past a `Save`.
    Restore { slot: usize, old: Option<usize> },
}

/// One `(state, position)` bit per pair.
///
/// A pair that was explored once and did not lead to a match never will, so
/// the set is kept across start offsets of a single search. Pairs on the path
/// of a successful match are marked too, so it must be cleared between
/// searches. `dirty` lists the words written since the last clear.
#[derive(Debug, Clone)]
struct Visited {
    bits: Vec<u64>,
    dirty: Vec<usize>,
    stride: usize,
}

impl Visited {
    fn new(states: usize, haystack_len: usize) -> Self {
        let stride = haystack_len + 1;
        let words = (states * stride).div_ceil(64);
        Self {
            bits: vec![0; words],
            dirty: Vec::new(),
            stride,
        }
    }

    /// Mark the pair, returning `false` if it was already marked.
    fn insert(&mut self, state: StateId, pos: usize) -> bool {
        let index = state * self.stride + pos;
        let (word, bit) = (index / 64, 1u64 << (index % 64));
        let old = self.bits[word];
        if old == 0 {
            self.dirty.push(word);
        }
        self.bits[word] = old | bit;
        old & bit == 0
    }

    /// Unmark everything, in time proportional to the words written.
    fn clear(&mut self) {
        for word in self.dirty.drain(..) {
            self.bits[word] = 0;
        }
    }
}

/// Backtracking state for one haystack. Reusable across searches, so an
/// iterator allocates the visited set once per pass.
#[derive(Debug, Clone)]
pub(crate) struct Backtracker<'n, 'h> {
    nfa: &'n Nfa,
    haystack: &'h str,
    stack: Vec<Frame>,
    slots: Vec<Option<usize>>,
    visited: Visited,
}

impl<'n, 'h> Backtracker<'n, 'h> {
    pub(crate) fn new(nfa: &'n Nfa, haystack: &'h str) -> Self {
        Self {
            nfa,
            haystack,
            stack: Vec::new(),
            slots: vec![None; nfa.slot_count()],
            visited: Visited::new(nfa.len(), haystack.len()),
        }
    }

    /// Leftmost match starting at or after `from`.
    pub(crate) fn search<B: StepBudget>(
        &mut self,
        from: usize,
        budget: &mut B,
    ) -> Result<Option<MatchResult>, B::Error> {
        if !self.haystack.is_char_boundary(from) {
            return Ok(None);
        }
        self.visited.clear();
        let mut start = from;
        loop {
            if let Some(found) = self.run_at(start, false, budget)? {
                return Ok(Some(found));
            }
            match self.char_at(start) {
                Some(ch) => start += ch.len_utf8(),
                None => return Ok(None),
            }
        }
    }

    /// Explore every path from the start state at `start`, in priority order,
    /// until one reaches `Match`.
    fn run_at<B: StepBudget>(
        &mut self,
        start: usize,
        anchored: bool,
        budget: &mut B,
    ) -> Result<Option<MatchResult>, B::Error> {
        let nfa = self.nfa;
        self.stack.clear();
        self.slots.fill(None);
        self.stack.push(Frame::Explore {
            state: nfa.start(),
            pos: start,
        });

        while let Some(frame) = self.stack.pop() {
            let (mut state, mut pos) = match frame {
                Frame::Restore { slot, old } => {
                    self.slots[slot] = old;
                    continue;
                }
                Frame::Explore { state, pos } => (state, pos),
            };

            // Follow primary edges without pushing; alternatives go on the stack.
            loop {
                budget.step()?;
                if !self.visited.insert(state, pos) {
                    break;
                }
                match nfa.state(state) {
                    State::Char { ch, next } => match self.char_at(pos) {
                        Some(c) if c == *ch => {
                            pos += c.len_utf8();
                            state = *next;
                        }
                        _ => break,
                    },
                    State::Any { next } => match self.char_at(pos) {
                        Some(c) if !is_line_terminator(c) => {
                            pos += c.len_utf8();
                            state = *next;
                        }
                        _ => break,
                    },
                    State::Class { class, next } => match self.char_at(pos) {
                        Some(c) if class_matches(class, c) => {
                            pos += c.len_utf8();
                            state = *next;
                        }
                        _ => break,
                    },
                    State::Split { primary, secondary } => {
                        self.stack.push(Frame::Explore {
                            state: *secondary,
                            pos,
                        });
                        state = *primary;
                    }
                    State::Save { slot, next } => {
                        self.stack.push(Frame::Restore {
                            slot: *slot,
                            old: self.slots[*slot],
                        });
                        self.slots[*slot] = Some(pos);
                        state = *next;
                    }
                    State::Assert { kind, next } => {
                        let ok = match kind {
                            AnchorKind::StartOfText => pos == 0,
                            AnchorKind::EndOfText => pos == self.haystack.len(),
                        };
                        if !ok {
                            break;
                        }
                        state = *next;
                    }
                    State::Match => {
                        if anchored && pos != self.haystack.len() {
                            break;
                        }
                        return Ok(Some(self.result()));
                    }
                }
            }
        }
        Ok(None)
    }

    fn char_at(&self, pos: usize) -> Option<char> {
        self.haystack[pos..].chars().next()
    }

    fn result(&self) -> MatchResult {
        let span_of = |group: usize| match (self.slots[2 * group], self.slots[2 * group + 1]) {
            (Some(start), Some(end)) if start <= end => Some(Span::new(start, end)),
            _ => None,
        };
        let groups = self.slots.len() / 2;
        MatchResult {
            span: span_of(0).unwrap_or_default(),
            groups: (1..groups).map(span_of).collect(),
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
