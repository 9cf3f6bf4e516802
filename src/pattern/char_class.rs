//! Character class membership tests and the escape tables used by the parser.

use phf::{Map, phf_map};

use super::ast::{CharClass, ClassRange};

/// A predefined class reachable through a backslash escape.
#[derive(Debug, Clone, Copy)]
pub struct Shorthand {
    ranges: &'static [ClassRange],
    negated: bool,
}

impl Shorthand {
    pub fn to_class(self) -> CharClass {
        CharClass {
            ranges: self.ranges.to_vec(),
            negated: self.negated,
        }
    }

    /// Ranges this shorthand covers, already complemented when negated.
    /// Used when the shorthand appears inside brackets, e.g. `[\D_]`.
    pub fn effective_ranges(self) -> Vec<ClassRange> {
        if self.negated {
            complement(self.ranges)
        } else {
            self.ranges.to_vec()
        }
    }
}

const DIGIT: &[ClassRange] = &[ClassRange::new('0', '9')];

const WORD: &[ClassRange] = &[
    ClassRange::new('0', '9'),
    ClassRange::new('A', 'Z'),
    ClassRange::single('_'),
    ClassRange::new('a', 'z'),
];

// ECMAScript WhiteSpace plus LineTerminator.
const SPACE: &[ClassRange] = &[
    ClassRange::new('\t', '\r'),
    ClassRange::single(' '),
    ClassRange::single('\u{a0}'),
    ClassRange::single('\u{1680}'),
    ClassRange::new('\u{2000}', '\u{200a}'),
    ClassRange::new('\u{2028}', '\u{2029}'),
    ClassRange::single('\u{202f}'),
    ClassRange::single('\u{205f}'),
    ClassRange::single('\u{3000}'),
    ClassRange::single('\u{feff}'),
];

/// `\d`, `\w`, `\s` and their upper-case negations.
pub static SHORTHANDS: Map<char, Shorthand> = phf_map! {
    'd' => Shorthand { ranges: DIGIT, negated: false },
    'D' => Shorthand { ranges: DIGIT, negated: true },
    's' => Shorthand { ranges: SPACE, negated: false },
    'S' => Shorthand { ranges: SPACE, negated: true },
    'w' => Shorthand { ranges: WORD, negated: false },
    'W' => Shorthand { ranges: WORD, negated: true },
};

/// Single-character control escapes such as `\n`.
pub static CONTROL_ESCAPES: Map<char, char> = phf_map! {
    '0' => '\0',
    'f' => '\u{0c}',
    'n' => '\n',
    'r' => '\r',
    't' => '\t',
    'v' => '\u{0b}',
};

/// Test whether `ch` is a member of `class`.
pub fn class_matches(class: &CharClass, ch: char) -> bool {
    let base = class.ranges.iter().any(|r| r.lo <= ch && ch <= r.hi);
    base != class.negated
}

/// Characters `.` refuses to match.
pub fn is_line_terminator(ch: char) -> bool {
    matches!(ch, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}

/// Complement a set of ranges over the whole scalar value space.
fn complement(ranges: &[ClassRange]) -> Vec<ClassRange> {
    let mut sorted = ranges.to_vec();
    sorted.sort();

    let mut out = Vec::new();
    let mut next = Some('\0');
    for r in sorted {
        let Some(lo) = next else { break };
        if lo < r.lo
            && let Some(hi) = prev_char(r.lo)
        {
            out.push(ClassRange::new(lo, hi));
        }
        if lo <= r.hi {
            next = next_char(r.hi);
        }
    }
    if let Some(lo) = next {
        out.push(ClassRange::new(lo, char::MAX));
    }
    out
}

fn next_char(ch: char) -> Option<char> {
    match ch {
        '\u{d7ff}' => Some('\u{e000}'),
        char::MAX => None,
        _ => char::from_u32(ch as u32 + 1),
    }
}

fn prev_char(ch: char) -> Option<char> {
    match ch {
        '\0' => None,
        '\u{e000}' => Some('\u{d7ff}'),
        _ => char::from_u32(ch as u32 - 1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shorthand(letter: char) -> CharClass {
        SHORTHANDS
            .get(&letter)
            .expect("known shorthand")
            .to_class()
    }

    #[test]
    fn digit_matches_ascii_digits_only() {
        let d = shorthand('d');
        assert!(class_matches(&d, '0'));
        assert!(class_matches(&d, '9'));
        assert!(!class_matches(&d, 'a'));
        assert!(!class_matches(&d, '\u{0663}'), "arabic-indic digit is not \\d");
    }

    #[test]
    fn negated_digit() {
        let nd = shorthand('D');
        assert!(class_matches(&nd, 'x'));
        assert!(!class_matches(&nd, '5'));
    }

    #[test]
    fn word_set() {
        let w = shorthand('w');
        for ch in ['a', 'Z', '0', '_'] {
            assert!(class_matches(&w, ch), "expected word char: {ch}");
        }
        for ch in [' ', '-', '.', 'é'] {
            assert!(!class_matches(&w, ch), "expected non-word char: {ch}");
        }
    }

    #[test]
    fn space_set() {
        let s = shorthand('s');
        for ch in [' ', '\t', '\n', '\r', '\u{0b}', '\u{0c}', '\u{a0}', '\u{3000}'] {
            assert!(class_matches(&s, ch), "expected space: {ch:?}");
        }
        assert!(!class_matches(&s, 'a'));
    }

    #[test]
    fn custom_range() {
        let class = CharClass {
            ranges: vec![ClassRange::new('a', 'f')],
            negated: false,
        };
        assert!(class_matches(&class, 'a'));
        assert!(class_matches(&class, 'c'));
        assert!(class_matches(&class, 'f'));
        assert!(!class_matches(&class, 'g'));
    }

    #[test]
    fn negated_class() {
        let class = CharClass {
            ranges: vec![ClassRange::single('x')],
            negated: true,
        };
        assert!(class_matches(&class, 'y'));
        assert!(!class_matches(&class, 'x'));
    }

    #[test]
    fn complement_of_digits_excludes_only_digits() {
        let ranges = SHORTHANDS
            .get(&'D')
            .expect("known shorthand")
            .effective_ranges();
        let class = CharClass {
            ranges,
            negated: false,
        };
        assert!(!class_matches(&class, '4'));
        assert!(class_matches(&class, '\0'));
        assert!(class_matches(&class, 'a'));
        assert!(class_matches(&class, char::MAX));
    }

    #[test]
    fn complement_skips_surrogate_gap() {
        let ranges = complement(&[ClassRange::new('\0', '\u{d7ff}')]);
        assert_eq!(ranges, vec![ClassRange::new('\u{e000}', char::MAX)]);
    }

    #[test]
    fn complement_of_everything_is_empty() {
        assert!(complement(&[ClassRange::new('\0', char::MAX)]).is_empty());
    }

    #[test]
    fn line_terminators() {
        assert!(is_line_terminator('\n'));
        assert!(is_line_terminator('\u{2028}'));
        assert!(!is_line_terminator('\t'));
    }
}
