//! AST types for compiled patterns.

/// One node of a parsed pattern.
///
/// A pattern like `a(b|c)+` parses to
/// `Concat[Literal('a'), Repeat { Group(Alternation[b, c]), 1.. }]`.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Matches the empty string. Produced by an empty pattern or `()`.
    Empty,
    Literal(char),
    /// `.`: anything but a line terminator.
    AnyChar,
    CharClass(CharClass),
    Concat(Vec<Node>),
    /// Branches in source order; the first one that leads to a match wins.
    Alternation(Vec<Node>),
    Repeat {
        child: Box<Node>,
        min: u32,
        /// `None` is unbounded.
        max: Option<u32>,
        greedy: bool,
    },
    /// `capture` is `None` for `(?:...)`.
    Group {
        child: Box<Node>,
        capture: Option<usize>,
    },
    Anchor(AnchorKind),
}

impl Node {
    /// True if the node can only ever match the empty string.
    pub fn is_zero_width(&self) -> bool {
        match self {
            Node::Empty | Node::Anchor(_) => true,
            Node::Literal(_) | Node::AnyChar | Node::CharClass(_) => false,
            Node::Concat(items) => items.iter().all(Node::is_zero_width),
            Node::Alternation(branches) => branches.iter().all(Node::is_zero_width),
            Node::Repeat { child, max, .. } => *max == Some(0) || child.is_zero_width(),
            Node::Group { child, .. } => child.is_zero_width(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorKind {
    StartOfText, // ^
    EndOfText,   // $
}

/// A bracketed or shorthand character class, stored as inclusive ranges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharClass {
    pub ranges: Vec<ClassRange>,
    pub negated: bool,
}

/// An inclusive `lo..=hi` range. A single character has `lo == hi`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ClassRange {
    pub lo: char,
    pub hi: char,
}

impl ClassRange {
    pub const fn new(lo: char, hi: char) -> Self {
        Self { lo, hi }
    }

    pub const fn single(ch: char) -> Self {
        Self { lo: ch, hi: ch }
    }
}
