//! Regular expression engine.
//!
//! Patterns are parsed into an AST, lowered to an NFA and run by a
//! backtracking matcher with leftmost-first (Perl) precedence.
//!
//! # Pattern syntax
//!
//! | Token            | Meaning                                          |
//! |------------------|--------------------------------------------------|
//! | `c`              | The literal character `c`                        |
//! | `.`              | Any character except a line terminator           |
//! | `\d` `\w` `\s`   | Digit, word character, whitespace                |
//! | `\D` `\W` `\S`   | Negations of the above                           |
//! | `\n` `\t` …      | Control characters                               |
//! | `\x`             | Literal `x` for any non-alphanumeric `x`         |
//! | `[abc]` `[a-z]`  | Character class                                  |
//! | `[^…]`           | Negated character class                          |
//! | `(…)`            | Capturing group                                  |
//! | `(?:…)`          | Non-capturing group                              |
//! | `X\|Y`           | Alternation, `X` preferred                       |
//! | `X*` `X+` `X?`   | Zero or more, one or more, optional              |
//! | `X{n}` `X{n,}` `X{n,m}` | Counted repetition                        |
//! | `X*?` …          | Lazy variant of any quantifier                   |
//! | `^` `$`          | Start and end of text                            |

pub mod ast;
pub mod char_class;
pub mod compile;
pub mod iter;
pub mod matcher;
pub mod nfa;
pub mod parser;
pub mod replace;

pub use compile::{Pattern, compile};
pub use iter::{Matches, TryMatches};
pub use matcher::{MatchBudgetExceeded, MatchResult, Span, match_at};
pub use parser::{PatternSyntaxError, SyntaxErrorKind};
pub use replace::{Template, TemplateError};
