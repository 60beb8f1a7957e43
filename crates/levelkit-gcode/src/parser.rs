//! G-Code tokenizer
//!
//! Splits a line into address words (`letter` + signed decimal). The
//! tokenizer is permissive: characters that do not form a word are skipped,
//! so vendor extensions and stray text never make a line unreadable.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::ops::Range;

/// Remove `( ... )` and `; ...` comments from a line
///
/// An unterminated parenthesis comments out the rest of the line. The
/// result is trimmed.
pub fn strip_comments(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut in_paren = false;

    for ch in line.chars() {
        match ch {
            ';' if !in_paren => break,
            '(' if !in_paren => in_paren = true,
            ')' if in_paren => in_paren = false,
            _ if in_paren => {}
            _ => out.push(ch),
        }
    }

    out.trim().to_string()
}

/// A single address word such as `X-1.5` or `G38.2`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Word {
    /// Upper-cased address letter
    pub letter: char,
    /// Numeric value
    pub value: f64,
    /// Byte range of the word inside the comment-stripped line
    pub span: Range<usize>,
}

/// A G or M code with its optional sub-code (`G38.2` is major 38, minor 2)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Code {
    /// `G` or `M`
    pub letter: char,
    /// Integer part
    pub major: u32,
    /// Digits after the decimal point, if any
    pub minor: Option<u32>,
}

impl Code {
    fn from_raw(letter: char, raw: &str) -> Option<Self> {
        let (major, minor) = match raw.split_once('.') {
            Some((major, "")) => (major, None),
            Some((major, minor)) => (major, Some(minor.parse::<u32>().ok()?)),
            None => (raw, None),
        };
        Some(Self {
            letter,
            major: major.parse::<u32>().ok()?,
            minor,
        })
    }

    /// Whether this is `G<major>` with no sub-code
    pub fn is_g(&self, major: u32) -> bool {
        self.letter == 'G' && self.major == major && self.minor.is_none()
    }

    /// Whether this is `G<major>` with any (or no) sub-code
    pub fn is_g_family(&self, major: u32) -> bool {
        self.letter == 'G' && self.major == major
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.minor {
            Some(minor) => write!(f, "{}{}.{}", self.letter, self.major, minor),
            None => write!(f, "{}{}", self.letter, self.major),
        }
    }
}

/// A tokenized G-code line
///
/// Holds the comment-stripped text and the words found in it. G and M words
/// are exposed as [`Code`]s; every other letter is an operand.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Block {
    source: String,
    words: Vec<Word>,
}

impl Block {
    /// Strip comments from `line` and tokenize what remains
    pub fn parse(line: &str) -> Self {
        let source = strip_comments(line);
        let words = tokenize(&source);
        Self { source, words }
    }

    /// The comment-stripped text the words refer to
    pub fn source(&self) -> &str {
        &self.source
    }

    /// All words in order of appearance
    pub fn words(&self) -> &[Word] {
        &self.words
    }

    /// True when the line has no words at all
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// The command word, when the line starts with a G or M code
    pub fn command(&self) -> Option<Code> {
        let first = self.words.first()?;
        if is_code_letter(first.letter) {
            self.code_of(first)
        } else {
            None
        }
    }

    /// Every G and M code on the line, in order
    pub fn codes(&self) -> Vec<Code> {
        self.words
            .iter()
            .filter(|w| is_code_letter(w.letter))
            .filter_map(|w| self.code_of(w))
            .collect()
    }

    /// Whether the line carries `G<major>` without a sub-code
    pub fn has_g(&self, major: u32) -> bool {
        self.codes().iter().any(|c| c.is_g(major))
    }

    /// Whether the line carries `G<major>` with any sub-code
    pub fn has_g_family(&self, major: u32) -> bool {
        self.codes().iter().any(|c| c.is_g_family(major))
    }

    /// Operand words keyed by letter; a repeated letter keeps its last value
    pub fn operands(&self) -> BTreeMap<char, f64> {
        self.words
            .iter()
            .filter(|w| !is_code_letter(w.letter))
            .map(|w| (w.letter, w.value))
            .collect()
    }

    /// Value of a single operand
    pub fn operand(&self, letter: char) -> Option<f64> {
        self.words
            .iter()
            .rev()
            .find(|w| w.letter == letter)
            .map(|w| w.value)
    }

    /// Whether any of the given operand letters is present
    pub fn has_any(&self, letters: &[char]) -> bool {
        self.words.iter().any(|w| letters.contains(&w.letter))
    }

    /// The stripped text with every word of the given letters removed
    ///
    /// Whitespace between the remaining words is collapsed to single spaces.
    pub fn without_words(&self, letters: &[char]) -> String {
        let mut out = String::with_capacity(self.source.len());
        let mut cursor = 0;
        for word in self.words.iter().filter(|w| letters.contains(&w.letter)) {
            out.push_str(&self.source[cursor..word.span.start]);
            out.push(' ');
            cursor = word.span.end;
        }
        out.push_str(&self.source[cursor..]);
        out.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    fn code_of(&self, word: &Word) -> Option<Code> {
        let raw = &self.source[word.span.start + 1..word.span.end];
        Code::from_raw(word.letter, raw)
    }
}

fn is_code_letter(letter: char) -> bool {
    letter == 'G' || letter == 'M'
}

fn tokenize(text: &str) -> Vec<Word> {
    let bytes = text.as_bytes();
    let mut words = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        if !bytes[i].is_ascii_alphabetic() {
            i += 1;
            continue;
        }

        let start = i;
        let letter = (bytes[i] as char).to_ascii_uppercase();
        let mut j = i + 1;
        if j < bytes.len() && (bytes[j] == b'+' || bytes[j] == b'-') {
            j += 1;
        }

        let mut seen_digit = false;
        let mut seen_dot = false;
        while j < bytes.len() {
            match bytes[j] {
                b'0'..=b'9' => seen_digit = true,
                b'.' if !seen_dot => seen_dot = true,
                _ => break,
            }
            j += 1;
        }

        if seen_digit {
            if let Ok(value) = text[start + 1..j].parse::<f64>() {
                words.push(Word {
                    letter,
                    value,
                    span: start..j,
                });
                i = j;
                continue;
            }
        }

        i = start + 1;
    }

    words
}
