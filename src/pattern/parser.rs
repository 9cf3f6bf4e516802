//! Recursive descent parser for pattern strings.
//!
//! Precedence from loosest to tightest: alternation, concatenation, postfix
//! quantifier, atom. Offsets in errors count characters, not bytes.

use std::str::Chars;

use itertools::{PeekNth, peek_nth};

use super::ast::*;
use super::char_class::{CONTROL_ESCAPES, SHORTHANDS};

/// Largest count accepted in `{n}`, `{n,}` or `{n,m}`.
pub const MAX_REPEAT: u32 = 1000;

/// What went wrong while parsing a pattern.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SyntaxErrorKind {
    #[error("unclosed group '('")]
    UnclosedGroup,
    #[error("unmatched ')'")]
    UnmatchedParen,
    #[error("unclosed character class '['")]
    UnclosedClass,
    #[error("quantifier has nothing to repeat")]
    NothingToRepeat,
    #[error("empty alternative in '|'")]
    EmptyAlternative,
    #[error("trailing backslash")]
    TrailingBackslash,
    #[error("unsupported escape '\\{0}'")]
    UnsupportedEscape(char),
    #[error("unsupported group syntax '(?{0}'")]
    UnsupportedGroup(char),
    #[error("invalid character class range {lo:?}-{hi:?}")]
    InvalidClassRange { lo: char, hi: char },
    #[error("malformed counted repetition")]
    MalformedRepetition,
    #[error("repetition range {{{min},{max}}} is reversed")]
    ReversedRepetition { min: u32, max: u32 },
    #[error("repetition count exceeds {}", MAX_REPEAT)]
    RepetitionTooLarge,
    #[error("pattern compiles to more than {} states", super::nfa::MAX_STATES)]
    PatternTooLarge,
}

/// A pattern that could not be compiled.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("pattern syntax error at offset {offset}: {kind}")]
pub struct PatternSyntaxError {
    /// Character offset into the pattern where the problem was detected.
    pub offset: usize,
    pub kind: SyntaxErrorKind,
}

impl PatternSyntaxError {
    fn new(offset: usize, kind: SyntaxErrorKind) -> Self {
        Self { offset, kind }
    }

    /// Human readable description, without the offset.
    pub fn message(&self) -> String {
        self.kind.to_string()
    }
}

/// The parsed form of a pattern.
#[derive(Debug, Clone, PartialEq)]
pub struct Ast {
    pub root: Node,
    /// Number of capturing groups, not counting the implicit whole match.
    pub captures: usize,
}

/// Parse a pattern string into an [`Ast`].
pub fn parse(input: &str) -> Result<Ast, PatternSyntaxError> {
    let mut parser = Parser {
        chars: peek_nth(input.chars()),
        pos: 0,
        captures: 0,
    };
    let root = parser.parse_alternation()?;
    if parser.peek() == Some(')') {
        return Err(PatternSyntaxError::new(parser.pos, SyntaxErrorKind::UnmatchedParen));
    }
    Ok(Ast {
        root,
        captures: parser.captures,
    })
}

struct Parser<'a> {
    chars: PeekNth<Chars<'a>>,
    /// Characters consumed so far.
    pos: usize,
    captures: usize,
}

/// One element inside `[...]` before ranges are resolved.
enum ClassAtom {
    Char(char),
    Set(Vec<ClassRange>),
}

impl Parser<'_> {
    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn peek_second(&mut self) -> Option<char> {
        self.chars.peek_nth(1).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.chars.next()?;
        self.pos += 1;
        Some(ch)
    }

    fn error(&self, kind: SyntaxErrorKind) -> PatternSyntaxError {
        PatternSyntaxError::new(self.pos, kind)
    }

    /// `branch ('|' branch)*`, stopping before `)` or end of input.
    fn parse_alternation(&mut self) -> Result<Node, PatternSyntaxError> {
        let mut branches = vec![self.parse_concat()?];
        let mut bars = Vec::new();
        while self.peek() == Some('|') {
            bars.push(self.pos);
            self.bump();
            branches.push(self.parse_concat()?);
        }

        if branches.len() == 1 {
            return Ok(branches.pop().unwrap_or(Node::Empty));
        }
        if let Some(i) = branches.iter().position(|b| *b == Node::Empty) {
            // Blame the bar next to the empty branch.
            let offset = bars[i.min(bars.len() - 1)];
            return Err(PatternSyntaxError::new(offset, SyntaxErrorKind::EmptyAlternative));
        }
        Ok(Node::Alternation(branches))
    }

    fn parse_concat(&mut self) -> Result<Node, PatternSyntaxError> {
        let mut items = Vec::new();
        while let Some(ch) = self.peek() {
            if ch == '|' || ch == ')' {
                break;
            }
            let atom = self.parse_atom()?;
            items.push(self.parse_quantifiers(atom)?);
        }
        Ok(match items.len() {
            0 => Node::Empty,
            1 => items.pop().unwrap_or(Node::Empty),
            _ => Node::Concat(items),
        })
    }

    /// Wrap `atom` in a postfix quantifier if one follows.
    fn parse_quantifiers(&mut self, atom: Node) -> Result<Node, PatternSyntaxError> {
        let start = self.pos;
        let (min, max) = match self.peek() {
            Some('*') => {
                self.bump();
                (0, None)
            }
            Some('+') => {
                self.bump();
                (1, None)
            }
            Some('?') => {
                self.bump();
                (0, Some(1))
            }
            Some('{') => self.parse_counted()?,
            _ => return Ok(atom),
        };

        if matches!(atom, Node::Anchor(_)) {
            return Err(PatternSyntaxError::new(start, SyntaxErrorKind::NothingToRepeat));
        }

        let greedy = if self.peek() == Some('?') {
            self.bump();
            false
        } else {
            true
        };

        if matches!(self.peek(), Some('*' | '+' | '?' | '{')) {
            return Err(self.error(SyntaxErrorKind::NothingToRepeat));
        }

        Ok(Node::Repeat {
            child: Box::new(atom),
            min,
            max,
            greedy,
        })
    }

    /// Parse `{n}`, `{n,}` or `{n,m}`. The cursor is on the `{`.
    fn parse_counted(&mut self) -> Result<(u32, Option<u32>), PatternSyntaxError> {
        let open = self.pos;
        self.bump();
        let malformed = || PatternSyntaxError::new(open, SyntaxErrorKind::MalformedRepetition);

        let min = self.parse_number(open)?.ok_or_else(malformed)?;
        let max = match self.bump() {
            Some('}') => return Ok((min, Some(min))),
            Some(',') => self.parse_number(open)?,
            _ => return Err(malformed()),
        };
        if self.bump() != Some('}') {
            return Err(malformed());
        }
        if let Some(max) = max
            && max < min
        {
            return Err(PatternSyntaxError::new(
                open,
                SyntaxErrorKind::ReversedRepetition { min, max },
            ));
        }
        Ok((min, max))
    }

    fn parse_number(&mut self, open: usize) -> Result<Option<u32>, PatternSyntaxError> {
        let mut value: Option<u32> = None;
        while let Some(digit) = self.peek().and_then(|c| c.to_digit(10)) {
            self.bump();
            let next = value.unwrap_or(0) * 10 + digit;
            if next > MAX_REPEAT {
                return Err(PatternSyntaxError::new(open, SyntaxErrorKind::RepetitionTooLarge));
            }
            value = Some(next);
        }
        Ok(value)
    }

    fn parse_atom(&mut self) -> Result<Node, PatternSyntaxError> {
        let start = self.pos;
        let Some(ch) = self.bump() else {
            return Ok(Node::Empty);
        };
        match ch {
            '(' => self.parse_group(start),
            '[' => self.parse_class(start).map(Node::CharClass),
            '.' => Ok(Node::AnyChar),
            '^' => Ok(Node::Anchor(AnchorKind::StartOfText)),
            '$' => Ok(Node::Anchor(AnchorKind::EndOfText)),
            '\\' => self.parse_escape(),
            '*' | '+' | '?' | '{' => Err(PatternSyntaxError::new(
                start,
                SyntaxErrorKind::NothingToRepeat,
            )),
            c => Ok(Node::Literal(c)),
        }
    }

    /// The opening `(` at `open` has been consumed.
    fn parse_group(&mut self, open: usize) -> Result<Node, PatternSyntaxError> {
        let capture = if self.peek() == Some('?') {
            self.bump();
            match self.bump() {
                Some(':') => None,
                Some(c) => {
                    return Err(PatternSyntaxError::new(open, SyntaxErrorKind::UnsupportedGroup(c)));
                }
                None => {
                    return Err(PatternSyntaxError::new(open, SyntaxErrorKind::UnclosedGroup));
                }
            }
        } else {
            self.captures += 1;
            Some(self.captures)
        };

        let child = self.parse_alternation()?;
        if self.bump() != Some(')') {
            return Err(PatternSyntaxError::new(open, SyntaxErrorKind::UnclosedGroup));
        }
        Ok(Node::Group {
            child: Box::new(child),
            capture,
        })
    }

    /// A backslash outside brackets has been consumed.
    fn parse_escape(&mut self) -> Result<Node, PatternSyntaxError> {
        let Some(ch) = self.bump() else {
            return Err(self.error(SyntaxErrorKind::TrailingBackslash));
        };
        if let Some(shorthand) = SHORTHANDS.get(&ch) {
            return Ok(Node::CharClass(shorthand.to_class()));
        }
        if let Some(&control) = CONTROL_ESCAPES.get(&ch) {
            return Ok(Node::Literal(control));
        }
        if ch.is_ascii_alphanumeric() {
            return Err(PatternSyntaxError::new(
                self.pos - 2,
                SyntaxErrorKind::UnsupportedEscape(ch),
            ));
        }
        Ok(Node::Literal(ch))
    }

    /// The opening `[` at `open` has been consumed.
    fn parse_class(&mut self, open: usize) -> Result<CharClass, PatternSyntaxError> {
        let negated = if self.peek() == Some('^') {
            self.bump();
            true
        } else {
            false
        };

        let mut ranges = Vec::new();
        let mut first = true;
        loop {
            let lo = match self.peek() {
                None => {
                    return Err(PatternSyntaxError::new(open, SyntaxErrorKind::UnclosedClass));
                }
                Some(']') if !first => {
                    self.bump();
                    break;
                }
                _ => self.parse_class_atom(open)?,
            };
            first = false;

            let is_range =
                self.peek() == Some('-') && !matches!(self.peek_second(), Some(']') | None);
            match lo {
                ClassAtom::Char(lo) if is_range => {
                    let dash = self.pos;
                    self.bump();
                    match self.parse_class_atom(open)? {
                        ClassAtom::Char(hi) if lo <= hi => ranges.push(ClassRange::new(lo, hi)),
                        ClassAtom::Char(hi) => {
                            return Err(PatternSyntaxError::new(
                                dash,
                                SyntaxErrorKind::InvalidClassRange { lo, hi },
                            ));
                        }
                        ClassAtom::Set(_) => {
                            return Err(PatternSyntaxError::new(
                                dash,
                                SyntaxErrorKind::InvalidClassRange { lo, hi: '-' },
                            ));
                        }
                    }
                }
                ClassAtom::Char(ch) => ranges.push(ClassRange::single(ch)),
                ClassAtom::Set(set) => ranges.extend(set),
            }
        }

        Ok(CharClass { ranges, negated })
    }

    fn parse_class_atom(&mut self, open: usize) -> Result<ClassAtom, PatternSyntaxError> {
        match self.bump() {
            None => Err(PatternSyntaxError::new(open, SyntaxErrorKind::UnclosedClass)),
            Some('\\') => {
                let Some(ch) = self.bump() else {
                    return Err(self.error(SyntaxErrorKind::TrailingBackslash));
                };
                if let Some(shorthand) = SHORTHANDS.get(&ch) {
                    return Ok(ClassAtom::Set(shorthand.effective_ranges()));
                }
                if let Some(&control) = CONTROL_ESCAPES.get(&ch) {
                    return Ok(ClassAtom::Char(control));
                }
                match ch {
                    'b' => Ok(ClassAtom::Char('\u{08}')),
                    c if c.is_ascii_alphanumeric() => Err(PatternSyntaxError::new(
                        self.pos - 2,
                        SyntaxErrorKind::UnsupportedEscape(c),
                    )),
                    c => Ok(ClassAtom::Char(c)),
                }
            }
            Some(ch) => Ok(ClassAtom::Char(ch)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(s: &str) -> Ast {
        parse(s).expect("parse should succeed")
    }
    fn parse_err(s: &str) -> PatternSyntaxError {
        parse(s).expect_err("parse should fail")
    }

    fn lit(c: char) -> Node {
        Node::Literal(c)
    }

    // --- Atoms ---

    #[test]
    fn test_literal_sequence() {
        assert_eq!(
            parse_ok("abc").root,
            Node::Concat(vec![lit('a'), lit('b'), lit('c')])
        );
    }

    #[test]
    fn test_empty_pattern() {
        let ast = parse_ok("");
        assert_eq!(ast.root, Node::Empty);
        assert_eq!(ast.captures, 0);
    }

    #[test]
    fn test_escaped_metachars_are_literal() {
        assert_eq!(
            parse_ok(r"\[\.\]").root,
            Node::Concat(vec![lit('['), lit('.'), lit(']')])
        );
    }

    #[test]
    fn test_digit_shorthand() {
        match parse_ok(r"\d").root {
            Node::CharClass(class) => {
                assert!(!class.negated);
                assert_eq!(class.ranges, vec![ClassRange::new('0', '9')]);
            }
            other => panic!("expected CharClass, got {other:?}"),
        }
    }

    #[test]
    fn test_control_escape() {
        assert_eq!(parse_ok(r"\t").root, lit('\t'));
    }

    #[test]
    fn test_anchors() {
        assert_eq!(
            parse_ok("^a$").root,
            Node::Concat(vec![
                Node::Anchor(AnchorKind::StartOfText),
                lit('a'),
                Node::Anchor(AnchorKind::EndOfText),
            ])
        );
    }

    #[test]
    fn test_lone_closing_brackets_are_literal() {
        assert_eq!(parse_ok("]}").root, Node::Concat(vec![lit(']'), lit('}')]));
    }

    // --- Classes ---

    #[test]
    fn test_class_with_range_and_singles() {
        match parse_ok("[a-cx_]").root {
            Node::CharClass(class) => assert_eq!(
                class.ranges,
                vec![
                    ClassRange::new('a', 'c'),
                    ClassRange::single('x'),
                    ClassRange::single('_'),
                ]
            ),
            other => panic!("expected CharClass, got {other:?}"),
        }
    }

    #[test]
    fn test_negated_class() {
        match parse_ok("[^0-9]").root {
            Node::CharClass(class) => assert!(class.negated),
            other => panic!("expected CharClass, got {other:?}"),
        }
    }

    #[test]
    fn test_class_leading_bracket_and_trailing_dash() {
        match parse_ok("[]a-]").root {
            Node::CharClass(class) => assert_eq!(
                class.ranges,
                vec![
                    ClassRange::single(']'),
                    ClassRange::single('a'),
                    ClassRange::single('-'),
                ]
            ),
            other => panic!("expected CharClass, got {other:?}"),
        }
    }

    #[test]
    fn test_class_with_shorthand() {
        match parse_ok(r"[\d.]").root {
            Node::CharClass(class) => assert_eq!(
                class.ranges,
                vec![ClassRange::new('0', '9'), ClassRange::single('.')]
            ),
            other => panic!("expected CharClass, got {other:?}"),
        }
    }

    // --- Quantifiers ---

    #[test]
    fn test_star_plus_question() {
        for (src, min, max) in [("a*", 0, None), ("a+", 1, None), ("a?", 0, Some(1))] {
            match parse_ok(src).root {
                Node::Repeat {
                    min: m,
                    max: x,
                    greedy,
                    ..
                } => {
                    assert_eq!((m, x), (min, max), "{src}");
                    assert!(greedy);
                }
                other => panic!("expected Repeat for {src}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_lazy_quantifier() {
        match parse_ok("a+?").root {
            Node::Repeat { greedy, .. } => assert!(!greedy),
            other => panic!("expected Repeat, got {other:?}"),
        }
    }

    #[test]
    fn test_counted_repetition() {
        for (src, min, max) in [
            ("a{3}", 3, Some(3)),
            ("a{2,}", 2, None),
            ("a{2,5}", 2, Some(5)),
        ] {
            match parse_ok(src).root {
                Node::Repeat { min: m, max: x, .. } => assert_eq!((m, x), (min, max), "{src}"),
                other => panic!("expected Repeat for {src}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_quantifier_binds_to_previous_atom() {
        assert_eq!(
            parse_ok("ab+").root,
            Node::Concat(vec![
                lit('a'),
                Node::Repeat {
                    child: Box::new(lit('b')),
                    min: 1,
                    max: None,
                    greedy: true,
                },
            ])
        );
    }

    // --- Groups and alternation ---

    #[test]
    fn test_capture_indices_follow_open_parens() {
        let ast = parse_ok("((a)(b))(c)");
        assert_eq!(ast.captures, 4);
        match ast.root {
            Node::Concat(items) => match &items[0] {
                Node::Group { capture, child } => {
                    assert_eq!(*capture, Some(1));
                    match child.as_ref() {
                        Node::Concat(inner) => {
                            assert!(matches!(inner[0], Node::Group { capture: Some(2), .. }));
                            assert!(matches!(inner[1], Node::Group { capture: Some(3), .. }));
                        }
                        other => panic!("expected Concat, got {other:?}"),
                    }
                }
                other => panic!("expected Group, got {other:?}"),
            },
            other => panic!("expected Concat, got {other:?}"),
        }
    }

    #[test]
    fn test_non_capturing_group() {
        let ast = parse_ok("(?:ab)(c)");
        assert_eq!(ast.captures, 1);
    }

    #[test]
    fn test_alternation_binds_loosest() {
        assert_eq!(
            parse_ok("ab|c").root,
            Node::Alternation(vec![Node::Concat(vec![lit('a'), lit('b')]), lit('c')])
        );
    }

    #[test]
    fn test_empty_group_is_allowed() {
        let ast = parse_ok("()");
        assert_eq!(ast.captures, 1);
    }

    // --- Errors ---

    #[test]
    fn test_trailing_empty_alternative() {
        let err = parse_err("a|");
        assert_eq!(err.kind, SyntaxErrorKind::EmptyAlternative);
        assert_eq!(err.offset, 1);
    }

    #[test]
    fn test_leading_empty_alternative() {
        assert_eq!(parse_err("|a").kind, SyntaxErrorKind::EmptyAlternative);
        assert_eq!(parse_err("(a|)").kind, SyntaxErrorKind::EmptyAlternative);
        assert_eq!(parse_err("a||b").kind, SyntaxErrorKind::EmptyAlternative);
    }

    #[test]
    fn test_unclosed_group() {
        let err = parse_err("a(bc");
        assert_eq!(err.kind, SyntaxErrorKind::UnclosedGroup);
        assert_eq!(err.offset, 1);
    }

    #[test]
    fn test_unmatched_paren() {
        let err = parse_err("ab)");
        assert_eq!(err.kind, SyntaxErrorKind::UnmatchedParen);
        assert_eq!(err.offset, 2);
    }

    #[test]
    fn test_unclosed_class() {
        assert_eq!(parse_err("[abc").kind, SyntaxErrorKind::UnclosedClass);
        assert_eq!(parse_err("[").kind, SyntaxErrorKind::UnclosedClass);
    }

    #[test]
    fn test_dangling_quantifiers() {
        for src in ["*a", "a|+b", "(?a)", "a**", "^*", "a{2}{3}"] {
            let err = parse_err(src);
            if src == "(?a)" {
                assert_eq!(err.kind, SyntaxErrorKind::UnsupportedGroup('a'));
            } else {
                assert_eq!(err.kind, SyntaxErrorKind::NothingToRepeat, "{src}");
            }
        }
    }

    #[test]
    fn test_bad_escapes() {
        assert_eq!(parse_err("ab\\").kind, SyntaxErrorKind::TrailingBackslash);
        let err = parse_err(r"a\b");
        assert_eq!(err.kind, SyntaxErrorKind::UnsupportedEscape('b'));
        assert_eq!(err.offset, 1);
    }

    #[test]
    fn test_reversed_class_range() {
        assert_eq!(
            parse_err("[z-a]").kind,
            SyntaxErrorKind::InvalidClassRange { lo: 'z', hi: 'a' }
        );
    }

    #[test]
    fn test_bad_counted_repetition() {
        assert_eq!(parse_err("a{").kind, SyntaxErrorKind::MalformedRepetition);
        assert_eq!(parse_err("a{,3}").kind, SyntaxErrorKind::MalformedRepetition);
        assert_eq!(parse_err("a{2").kind, SyntaxErrorKind::MalformedRepetition);
        assert_eq!(
            parse_err("a{3,1}").kind,
            SyntaxErrorKind::ReversedRepetition { min: 3, max: 1 }
        );
        assert_eq!(parse_err("a{1001}").kind, SyntaxErrorKind::RepetitionTooLarge);
    }

    #[test]
    fn test_error_display() {
        let err = parse_err("a|");
        assert_eq!(
            err.to_string(),
            "pattern syntax error at offset 1: empty alternative in '|'"
        );
        assert_eq!(err.message(), "empty alternative in '|'");
    }
}
