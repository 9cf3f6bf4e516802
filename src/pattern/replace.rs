//! Substitution: replace matches with an expanded template.
//!
//! | Token      | Expands to                                     |
//! |------------|------------------------------------------------|
//! | `$&`, `$0` | the whole match                                |
//! | `$N`/`$NN` | capture group N (empty if it did not take part) |
//! | `` $` ``   | text before the match                          |
//! | `$'`       | text after the match                           |
//! | `$$`       | a literal `$`                                  |
//!
//! A `$` followed by anything else is copied as is.

use std::iter::Peekable;
use std::str::Chars;

use super::compile::Pattern;
use super::matcher::MatchResult;

/// A template referenced a group the pattern does not have.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error(
    "replacement refers to group ${group_index} but the pattern has {captures} capture group(s)"
)]
pub struct TemplateError {
    pub group_index: usize,
    pub captures: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Piece {
    Literal(String),
    Group(usize),
    Before,
    After,
}

/// A replacement template, parsed once and expanded per match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    pieces: Vec<Piece>,
}

impl Template {
    /// Parse `template` for a pattern with `captures` capture groups.
    pub fn parse(template: &str, captures: usize) -> Result<Self, TemplateError> {
        TemplateParser {
            chars: template.chars().peekable(),
            captures,
            pieces: Vec::new(),
            literal: String::new(),
        }
        .parse()
    }

    /// Append the expansion for `m` to `out`.
    pub fn expand(&self, m: &MatchResult, haystack: &str, out: &mut String) {
        for piece in &self.pieces {
            match piece {
                Piece::Literal(text) => out.push_str(text),
                Piece::Group(index) => {
                    if let Some(text) = m.group_str(haystack, *index) {
                        out.push_str(text);
                    }
                }
                Piece::Before => out.push_str(&haystack[..m.start()]),
                Piece::After => out.push_str(&haystack[m.end()..]),
            }
        }
    }
}

struct TemplateParser<'a> {
    chars: Peekable<Chars<'a>>,
    captures: usize,
    pieces: Vec<Piece>,
    literal: String,
}

impl TemplateParser<'_> {
    fn parse(mut self) -> Result<Template, TemplateError> {
        while let Some(ch) = self.chars.next() {
            if ch != '$' {
                self.literal.push(ch);
                continue;
            }
            match self.chars.peek().copied() {
                Some('&') => {
                    self.chars.next();
                    self.push(Piece::Group(0));
                }
                Some('$') => {
                    self.chars.next();
                    self.literal.push('$');
                }
                Some('`') => {
                    self.chars.next();
                    self.push(Piece::Before);
                }
                Some('\'') => {
                    self.chars.next();
                    self.push(Piece::After);
                }
                Some(c) if c.is_ascii_digit() => {
                    self.chars.next();
                    let index = self.group_index(c)?;
                    self.push(Piece::Group(index));
                }
                _ => self.literal.push('$'),
            }
        }
        if !self.literal.is_empty() {
            self.pieces.push(Piece::Literal(self.literal));
        }
        Ok(Template {
            pieces: self.pieces,
        })
    }

    /// Resolve `$N` or `$NN`. Two digits are taken only when they name an
    /// existing group, so `$10` with one group is group 1 followed by `0`.
    fn group_index(&mut self, first: char) -> Result<usize, TemplateError> {
        let first = first.to_digit(10).unwrap_or_default() as usize;
        if let Some(second) = self.chars.peek().and_then(|c| c.to_digit(10)) {
            let two = first * 10 + second as usize;
            if two <= self.captures {
                self.chars.next();
                return Ok(two);
            }
        }
        if first > self.captures {
            return Err(TemplateError {
                group_index: first,
                captures: self.captures,
            });
        }
        Ok(first)
    }

    fn push(&mut self, piece: Piece) {
        if !self.literal.is_empty() {
            self.pieces
                .push(Piece::Literal(std::mem::take(&mut self.literal)));
        }
        self.pieces.push(piece);
    }
}

/// Replace up to `limit` matches (all when `None`) of `pattern` in `haystack`.
pub(crate) fn replace(
    pattern: &Pattern,
    haystack: &str,
    template: &str,
    limit: Option<usize>,
) -> Result<String, TemplateError> {
    let template = Template::parse(template, pattern.captures_len())?;

    let mut out = String::with_capacity(haystack.len());
    let mut last = 0;
    let mut replaced = 0usize;
    for m in pattern.find_iter(haystack).take(limit.unwrap_or(usize::MAX)) {
        out.push_str(&haystack[last..m.start()]);
        template.expand(&m, haystack, &mut out);
        last = m.end();
        replaced += 1;
    }
    out.push_str(&haystack[last..]);

    tracing::debug!(pattern = pattern.as_str(), replaced, "substitution done");
    Ok(out)
}
