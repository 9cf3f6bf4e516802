//! A small backtracking regular-expression engine.
//!
//! # Example
//!
//! ```rust
//! use rematch::{compile, find_all, find_first, matches_fully, replace_all};
//!
//! let ip = compile(r"\[(\d+)\.(\d+)\.(\d+)\.(\d+)\]").unwrap();
//! let text = "Here we have an IP: >>>[192.168.1.41]<<<";
//!
//! let m = find_first(&ip, text).unwrap();
//! assert_eq!(m.as_str(text), "[192.168.1.41]");
//! assert_eq!(m.group_str(text, 4), Some("41"));
//!
//! assert!(matches_fully(&ip, "[192.168.1.31]").is_some());
//! assert!(matches_fully(&ip, "x[192.168.1.31]").is_none());
//!
//! let words = compile(r"\w+\s").unwrap();
//! assert_eq!(find_all(&words, "a b c").count(), 2);
//! assert_eq!(replace_all(&words, "a b c", "[$&]").unwrap(), "[a ][b ]c");
//! ```

pub mod pattern;

pub use pattern::{
    MatchBudgetExceeded, MatchResult, Matches, Pattern, PatternSyntaxError, Span,
    SyntaxErrorKind, Template, TemplateError, TryMatches, compile,
};

/// Leftmost match anywhere in `text`.
pub fn find_first(pattern: &Pattern, text: &str) -> Option<MatchResult> {
    pattern.find(text)
}

/// A match that spans all of `text`.
pub fn matches_fully(pattern: &Pattern, text: &str) -> Option<MatchResult> {
    pattern.full_match(text)
}

/// Every non-overlapping match in `text`, left to right.
pub fn find_all<'p, 'h>(pattern: &'p Pattern, text: &'h str) -> Matches<'p, 'h> {
    pattern.find_iter(text)
}

/// Replace every match in `text` with the expansion of `template`.
pub fn replace_all(pattern: &Pattern, text: &str, template: &str) -> Result<String, TemplateError> {
    pattern.replace_all(text, template)
}
