//! Lowering of the pattern AST into a Thompson-style NFA.
//!
//! Nodes are lowered back to front: each node receives the id of the state
//! that follows it and returns the id of its own entry state. Capture group
//! `g` is bracketed by `Save` states writing slots `2g` and `2g + 1`; group 0
//! is the whole match.

use std::fmt;

use super::ast::*;
use super::parser::{Ast, PatternSyntaxError, SyntaxErrorKind};

pub type StateId = usize;

/// Upper bound on automaton size, reached only through nested counted
/// repetitions such as `(a{1000}){1000}`.
pub const MAX_STATES: usize = 1 << 20;

#[derive(Debug, Clone)]
pub enum State {
    Char { ch: char, next: StateId },
    Any { next: StateId },
    Class { class: CharClass, next: StateId },
    /// Epsilon fork. `primary` is explored first.
    Split { primary: StateId, secondary: StateId },
    /// Record the current position in capture slot `slot`.
    Save { slot: usize, next: StateId },
    Assert { kind: AnchorKind, next: StateId },
    Match,
}

/// A compiled automaton.
#[derive(Debug, Clone)]
pub struct Nfa {
    states: Vec<State>,
    start: StateId,
    slots: usize,
}

impl Nfa {
    pub fn new(ast: &Ast) -> Result<Self, PatternSyntaxError> {
        let mut builder = Builder { states: Vec::new() };
        let matched = builder.push(State::Match)?;
        let close = builder.push(State::Save {
            slot: 1,
            next: matched,
        })?;
        let body = builder.lower(&ast.root, close)?;
        let start = builder.push(State::Save { slot: 0, next: body })?;
        Ok(Self {
            states: builder.states,
            start,
            slots: 2 * (ast.captures + 1),
        })
    }

    pub fn start(&self) -> StateId {
        self.start
    }

    pub fn state(&self, id: StateId) -> &State {
        &self.states[id]
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Number of capture slots, two per group including group 0.
    pub fn slot_count(&self) -> usize {
        self.slots
    }
}

impl fmt::Display for Nfa {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (id, state) in self.states.iter().enumerate() {
            let marker = if id == self.start { '>' } else { ' ' };
            write!(f, "{marker}{id:>4}: ")?;
            match state {
                State::Char { ch, next } => writeln!(f, "char {ch:?} -> {next}")?,
                State::Any { next } => writeln!(f, "any -> {next}")?,
                State::Class { class, next } => {
                    let neg = if class.negated { "^" } else { "" };
                    write!(f, "class [{neg}")?;
                    for r in &class.ranges {
                        if r.lo == r.hi {
                            write!(f, "{}", r.lo.escape_debug())?;
                        } else {
                            write!(f, "{}-{}", r.lo.escape_debug(), r.hi.escape_debug())?;
                        }
                    }
                    writeln!(f, "] -> {next}")?
                }
                State::Split { primary, secondary } => {
                    writeln!(f, "split -> {primary}, {secondary}")?
                }
                State::Save { slot, next } => writeln!(f, "save {slot} -> {next}")?,
                State::Assert { kind, next } => writeln!(f, "assert {kind:?} -> {next}")?,
                State::Match => writeln!(f, "match")?,
            }
        }
        Ok(())
    }
}

struct Builder {
    states: Vec<State>,
}

impl Builder {
    fn push(&mut self, state: State) -> Result<StateId, PatternSyntaxError> {
        if self.states.len() >= MAX_STATES {
            return Err(PatternSyntaxError {
                offset: 0,
                kind: SyntaxErrorKind::PatternTooLarge,
            });
        }
        self.states.push(state);
        Ok(self.states.len() - 1)
    }

    /// Lower `node` so that a successful match continues at `next`.
    fn lower(&mut self, node: &Node, next: StateId) -> Result<StateId, PatternSyntaxError> {
        match node {
            Node::Empty => Ok(next),
            Node::Literal(ch) => self.push(State::Char { ch: *ch, next }),
            Node::AnyChar => self.push(State::Any { next }),
            Node::CharClass(class) => self.push(State::Class {
                class: class.clone(),
                next,
            }),
            Node::Anchor(kind) => self.push(State::Assert { kind: *kind, next }),
            Node::Concat(items) => {
                let mut cur = next;
                for item in items.iter().rev() {
                    cur = self.lower(item, cur)?;
                }
                Ok(cur)
            }
            Node::Alternation(branches) => {
                let mut entries = Vec::with_capacity(branches.len());
                for branch in branches {
                    entries.push(self.lower(branch, next)?);
                }
                let Some(mut cur) = entries.pop() else {
                    return Ok(next);
                };
                for &entry in entries.iter().rev() {
                    cur = self.push(State::Split {
                        primary: entry,
                        secondary: cur,
                    })?;
                }
                Ok(cur)
            }
            Node::Group { child, capture } => match capture {
                Some(index) => {
                    let close = self.push(State::Save {
                        slot: 2 * index + 1,
                        next,
                    })?;
                    let body = self.lower(child, close)?;
                    self.push(State::Save {
                        slot: 2 * index,
                        next: body,
                    })
                }
                None => self.lower(child, next),
            },
            Node::Repeat {
                child,
                min,
                max,
                greedy,
            } => {
                let (min, max) = if child.is_zero_width() {
                    // A second pass over an empty body matches nothing new.
                    let min = (*min).min(1);
                    (min, Some(max.map_or(1, |max| max.min(1)).max(min)))
                } else {
                    (*min, *max)
                };
                let mut cur = match max {
                    None => self.star(child, next, *greedy)?,
                    Some(max) => {
                        // Nested optionals: each extra copy is only tried
                        // after the previous one matched.
                        let mut cur = next;
                        for _ in min..max {
                            let body = self.lower(child, cur)?;
                            cur = self.fork(body, next, *greedy)?;
                        }
                        cur
                    }
                };
                for _ in 0..min {
                    cur = self.lower(child, cur)?;
                }
                Ok(cur)
            }
        }
    }

    /// Zero or more copies of `child`, looping through a single split.
    fn star(
        &mut self,
        child: &Node,
        next: StateId,
        greedy: bool,
    ) -> Result<StateId, PatternSyntaxError> {
        let split = self.push(State::Match)?;
        let body = self.lower(child, split)?;
        self.states[split] = split_state(body, next, greedy);
        Ok(split)
    }

    fn fork(
        &mut self,
        body: StateId,
        exit: StateId,
        greedy: bool,
    ) -> Result<StateId, PatternSyntaxError> {
        self.push(split_state(body, exit, greedy))
    }
}

/// Greedy repetitions prefer another iteration, lazy ones prefer leaving.
fn split_state(body: StateId, exit: StateId, greedy: bool) -> State {
    if greedy {
        State::Split {
            primary: body,
            secondary: exit,
        }
    } else {
        State::Split {
            primary: exit,
            secondary: body,
        }
    }
}
