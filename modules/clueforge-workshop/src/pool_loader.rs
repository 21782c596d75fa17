//! Loads word pools from `*.json` files shaped like
//! `{"anagram_friendly": ["SILENT", ...], "standard_utility": [...]}`.

use std::path::Path;

use anyhow::{Context, Result};
use rand::Rng;
use serde_json::Value;
use tracing::{info, warn};

use clueforge_common::WordplayMechanism;

use crate::pool::{PoolEntry, WordPool};

/// Category key for words with no preferred mechanism.
pub const STANDARD_UTILITY: &str = "standard_utility";

/// Mechanism for a category key; `None` for unknown keys and for
/// [`STANDARD_UTILITY`].
pub fn category_mechanism(category: &str) -> Option<WordplayMechanism> {
    match category {
        "anagram_friendly" => Some(WordplayMechanism::Anagram),
        "charade_friendly" => Some(WordplayMechanism::Charade),
        "hidden_word_friendly" => Some(WordplayMechanism::HiddenWord),
        "container_friendly" => Some(WordplayMechanism::Container),
        "reversal_friendly" => Some(WordplayMechanism::Reversal),
        "homophone_friendly" => Some(WordplayMechanism::Homophone),
        "double_def_friendly" => Some(WordplayMechanism::DoubleDefinition),
        _ => None,
    }
}

/// Relative weights for picking a mechanism for an uncategorised word.
pub fn affinity_weights(word: &str) -> Vec<(WordplayMechanism, u32)> {
    use WordplayMechanism::*;

    let length = word.chars().filter(char::is_ascii_alphabetic).count();
    let vowels = word
        .chars()
        .filter(|c| matches!(c.to_ascii_uppercase(), 'A' | 'E' | 'I' | 'O' | 'U'))
        .count();

    let mut weights = if length < 5 {
        vec![(HiddenWord, 4), (Reversal, 4), (Charade, 2), (Anagram, 1)]
    } else if vowels > 3 {
        vec![(Anagram, 5), (HiddenWord, 2), (Charade, 1)]
    } else if length <= 8 {
        vec![
            (Anagram, 3),
            (Container, 3),
            (Charade, 2),
            (HiddenWord, 2),
            (Reversal, 1),
        ]
    } else {
        vec![(HiddenWord, 4), (Charade, 3), (Anagram, 2), (Container, 1)]
    };
    weights.extend([(DoubleDefinition, 1), (Homophone, 1), (AllInOne, 1)]);
    weights
}

pub fn suggest_mechanism<R: Rng>(word: &str, rng: &mut R) -> WordplayMechanism {
    let weights = affinity_weights(word);
    let total: u32 = weights.iter().map(|(_, w)| w).sum();
    let mut roll = rng.random_range(0..total);
    for (mechanism, weight) in &weights {
        if roll < *weight {
            return *mechanism;
        }
        roll -= weight;
    }
    WordplayMechanism::Anagram
}

/// Entries from one pool document.
pub fn parse_pool<R: Rng>(doc: &Value, source: &str, rng: &mut R) -> Vec<PoolEntry> {
    let Some(categories) = doc.as_object() else {
        warn!(source, "Word pool is not a JSON object; skipping");
        return Vec::new();
    };

    let mut entries = Vec::new();
    for (category, words) in categories {
        let fixed = category_mechanism(category);
        if fixed.is_none() && category != STANDARD_UTILITY {
            warn!(source, category = category.as_str(), "Unknown word pool category");
            continue;
        }
        let Some(words) = words.as_array() else {
            warn!(source, category = category.as_str(), "Category is not a list");
            continue;
        };
        for word in words.iter().filter_map(Value::as_str) {
            if word.trim().is_empty() {
                continue;
            }
            let mechanism = fixed.unwrap_or_else(|| suggest_mechanism(word, rng));
            entries.push(PoolEntry::new(word, mechanism, source));
        }
    }
    entries
}

/// Every `*.json` file in `dir`, in file-name order.
pub fn load_dir(dir: &Path) -> Result<WordPool> {
    let mut files: Vec<_> = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read word pool directory {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    files.sort();

    let mut rng = rand::rng();
    let mut entries = Vec::new();
    for path in &files {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let doc: Value = serde_json::from_str(&raw)
            .with_context(|| format!("Invalid JSON in {}", path.display()))?;
        let source = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let loaded = parse_pool(&doc, &source, &mut rng);
        info!(file = source.as_str(), words = loaded.len(), "Loaded word pool");
        entries.extend(loaded);
    }

    let pool = WordPool::new(entries);
    info!(files = files.len(), entries = pool.len(), "Word pools ready");
    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use serde_json::json;

    #[test]
    fn short_words_lean_to_hidden_and_reversal() {
        let weights = affinity_weights("ROT");
        assert_eq!(weights[0], (WordplayMechanism::HiddenWord, 4));
        assert_eq!(weights[1], (WordplayMechanism::Reversal, 4));
    }

    #[test]
    fn vowel_heavy_words_lean_to_anagram() {
        let weights = affinity_weights("EDUCATION");
        assert_eq!(weights[0], (WordplayMechanism::Anagram, 5));
    }

    #[test]
    fn suggestions_come_from_the_weight_table() {
        let mut rng = StdRng::seed_from_u64(7);
        let allowed: Vec<_> = affinity_weights("BATTEN").into_iter().map(|(m, _)| m).collect();
        for _ in 0..100 {
            assert!(allowed.contains(&suggest_mechanism("BATTEN", &mut rng)));
        }
    }

    #[test]
    fn categories_map_to_mechanisms() {
        let mut rng = StdRng::seed_from_u64(1);
        let doc = json!({
            "anagram_friendly": ["silent", "listen"],
            "reversal_friendly": ["regal"],
            "standard_utility": ["table"],
            "mystery": ["ignored"],
        });
        let entries = parse_pool(&doc, "seed.json", &mut rng);
        assert_eq!(entries.len(), 4);
        assert!(entries
            .iter()
            .any(|e| e.word == "REGAL" && e.mechanism == WordplayMechanism::Reversal));
        assert!(entries.iter().all(|e| e.word != "IGNORED"));
        assert!(entries.iter().all(|e| e.source == "seed.json"));
    }

    #[test]
    fn loads_every_json_file_in_a_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.json"), r#"{"anagram_friendly": ["silent"]}"#).unwrap();
        std::fs::write(dir.path().join("b.json"), r#"{"charade_friendly": ["carpet"]}"#).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "not a pool").unwrap();

        let pool = load_dir(dir.path()).unwrap();
        assert_eq!(pool.len(), 2);
        assert_eq!(pool.stats().per_mechanism[&WordplayMechanism::Charade], 1);
    }

    #[test]
    fn missing_directory_is_an_error() {
        assert!(load_dir(Path::new("/nonexistent/word_pools")).is_err());
    }
}
