use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ClueError;

/// The letter-count hint printed after a clue, e.g. `(6)`, `(3,5)` or `(4-4)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enumeration {
    parts: Vec<usize>,
    /// Separator printed after each part except the last (`,` or `-`).
    separators: Vec<char>,
}

impl Enumeration {
    pub fn single(len: usize) -> Self {
        Self {
            parts: vec![len],
            separators: Vec::new(),
        }
    }

    /// Derive the enumeration from an answer as written: spaces separate
    /// words, hyphens separate hyphenated parts.
    ///
    /// Any other non-letter character is rejected.
    pub fn from_answer(answer: &str) -> Result<Self, ClueError> {
        let mut parts = Vec::new();
        let mut separators = Vec::new();
        let mut current = 0usize;
        let mut pending: Option<char> = None;

        for c in answer.trim().chars() {
            if c.is_ascii_alphabetic() {
                if let Some(sep) = pending.take() {
                    if current > 0 {
                        parts.push(current);
                        separators.push(sep);
                        current = 0;
                    }
                }
                current += 1;
            } else if c == ' ' || c == '-' {
                // A hyphen wins over surrounding spaces.
                pending = match (pending, c) {
                    (Some('-'), _) => Some('-'),
                    (_, '-') => Some('-'),
                    _ => Some(','),
                };
            } else {
                return Err(ClueError::MalformedInput(format!(
                    "answer {answer:?} contains {c:?}; only letters, spaces and hyphens are allowed"
                )));
            }
        }

        if current == 0 {
            return Err(ClueError::MalformedInput(format!(
                "answer {answer:?} contains no letters"
            )));
        }
        parts.push(current);
        Ok(Self { parts, separators })
    }

    pub fn parts(&self) -> &[usize] {
        &self.parts
    }

    pub fn total(&self) -> usize {
        self.parts.iter().sum()
    }
}

impl FromStr for Enumeration {
    type Err = ClueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let inner = trimmed
            .strip_prefix('(')
            .and_then(|rest| rest.strip_suffix(')'))
            .unwrap_or(trimmed);

        if inner.trim().is_empty() {
            return Err(ClueError::InvalidEnumeration(format!("{s:?} is empty")));
        }

        let mut parts = Vec::new();
        let mut separators = Vec::new();
        let mut digits = String::new();

        let flush = |digits: &mut String, parts: &mut Vec<usize>| -> Result<(), ClueError> {
            let n: usize = digits
                .trim()
                .parse()
                .map_err(|_| ClueError::InvalidEnumeration(format!("{s:?}: bad part {digits:?}")))?;
            if n == 0 {
                return Err(ClueError::InvalidEnumeration(format!(
                    "{s:?}: parts must be positive"
                )));
            }
            parts.push(n);
            digits.clear();
            Ok(())
        };

        for c in inner.chars() {
            match c {
                ',' | '-' => {
                    flush(&mut digits, &mut parts)?;
                    separators.push(c);
                }
                _ => digits.push(c),
            }
        }
        flush(&mut digits, &mut parts)?;

        Ok(Self { parts, separators })
    }
}

impl fmt::Display for Enumeration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, part) in self.parts.iter().enumerate() {
            write!(f, "{part}")?;
            if let Some(sep) = self.separators.get(i) {
                write!(f, "{sep}")?;
            }
        }
        write!(f, ")")
    }
}

impl Serialize for Enumeration {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Enumeration {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
