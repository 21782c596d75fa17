use std::collections::HashSet;
use std::path::Path;

use clueforge_common::ClueError;

/// Direction words that only make sense in a grid. Clues are shown alone,
/// so these are unfair as indicators.
pub const DIRECTIONAL_BLOCKLIST: &[&str] = &[
    "rising",
    "lifted",
    "climbing",
    "up",
    "upwards",
    "skyward",
    "mounting",
    "ascending",
    "on",
    "supports",
    "overhead",
    "over",
    "underneath",
    "atop",
    "climbing up",
    "going up",
    "comes up",
    "rises",
    "lifts",
    "climbs",
];

/// Nouns that name a mix rather than instruct one.
pub const NOUN_INDICATORS: &[&str] = &[
    "anagram", "medley", "salad", "mixture", "hash", "chaos", "mess", "jumble", "tangle",
];

/// Link words a surface may use without them counting as filler.
pub const ALLOWED_CONNECTORS: &[&str] =
    &["is", "for", "gives", "from", "at", "becomes", "to", "in", "of", "with"];

/// At most this many connectors per surface.
pub const CONNECTOR_BUDGET: usize = 2;

/// Standard abbreviations any solver is expected to know.
pub const PRIORITY_ABBREVIATIONS: &[&str] = &[
    // Roman numerals
    "I", "V", "X", "L", "C", "D", "M", "XI",
    // Chemical symbols
    "H", "O", "N", "AU", "AG", "FE", "PB", "CU", "S",
    // Compass points
    "E", "W",
    // Music, chess, cards
    "R", "P", "F", "PP", "FF", "K", "Q", "B",
    // Titles and degrees
    "DR", "MO", "MP", "QC", "PM", "BA", "MA", "BSC",
    // Units
    "T", "G", "OZ", "LB", "HR", "MIN",
    // Single letters in common use
    "A", "U", "Y", "Z",
];

/// Fair but less familiar abbreviations; a clue leaning on these gets a
/// warning.
pub const EXTENDED_ABBREVIATIONS: &[&str] = &[
    "EN", "RE", "RA", "GI", "CA", "CH", "LA", "TE", "DIT", "DAH", "NT", "ER", "ED", "ST", "ND",
    "RD", "TH",
];

/// Two-letter tokens that read as ordinary English.
pub const COMMON_TWO_LETTER: &[&str] = &[
    "am", "an", "as", "at", "be", "by", "do", "go", "he", "hi", "if", "in", "is", "it", "me",
    "my", "no", "of", "oh", "ok", "on", "or", "ox", "so", "to", "up", "us", "we", "ye",
];

/// Very short fodder tokens that are abbreviations rather than words.
pub const SHORT_ABBREVIATIONS: &[&str] =
    &["n", "s", "e", "w", "l", "r", "u", "o", "er", "ed", "re"];

/// Past-tense-looking words that are not participles.
pub const NON_PARTICIPLE_ED: &[&str] = &["red", "bed", "fed", "led", "wed", "bred", "shed"];

pub fn is_priority_abbreviation(fragment: &str) -> bool {
    let upper = fragment.to_ascii_uppercase();
    PRIORITY_ABBREVIATIONS.contains(&upper.as_str())
}

pub fn is_extended_abbreviation(fragment: &str) -> bool {
    let upper = fragment.to_ascii_uppercase();
    EXTENDED_ABBREVIATIONS.contains(&upper.as_str())
}

pub fn is_known_abbreviation(fragment: &str) -> bool {
    is_priority_abbreviation(fragment) || is_extended_abbreviation(fragment)
}

/// Dictionary lookups used by the word-validity checks.
pub trait Lexicon: Send + Sync {
    /// Case-insensitive membership.
    fn contains(&self, word: &str) -> bool;
}

/// An in-memory word list.
#[derive(Debug, Clone, Default)]
pub struct WordListLexicon {
    words: HashSet<String>,
}

impl WordListLexicon {
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            words: words
                .into_iter()
                .map(|w| w.as_ref().trim().to_ascii_lowercase())
                .filter(|w| !w.is_empty())
                .collect(),
        }
    }

    /// One word per line; blank lines and `#` comments are skipped.
    pub fn from_file(path: &Path) -> Result<Self, ClueError> {
        let raw = std::fs::read_to_string(path)?;
        let lexicon = Self::new(
            raw.lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && !line.starts_with('#')),
        );
        tracing::info!(path = %path.display(), words = lexicon.len(), "Loaded dictionary");
        Ok(lexicon)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl Lexicon for WordListLexicon {
    fn contains(&self, word: &str) -> bool {
        self.words.contains(&word.trim().to_ascii_lowercase())
    }
}
