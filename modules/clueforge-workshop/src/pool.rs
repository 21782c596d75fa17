use std::collections::{BTreeMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use rand::seq::IndexedRandom;
use serde::Serialize;
use tracing::debug;

use clueforge_common::WordplayMechanism;

use crate::traits::{Draw, WordSupply};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolEntry {
    /// Uppercase, as it will be clued.
    pub word: String,
    pub mechanism: WordplayMechanism,
    /// File the entry was loaded from.
    pub source: String,
    pub usage_count: u32,
}

impl PoolEntry {
    pub fn new(word: &str, mechanism: WordplayMechanism, source: &str) -> Self {
        Self {
            word: word.trim().to_uppercase(),
            mechanism,
            source: source.to_string(),
            usage_count: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PoolStats {
    pub total_entries: usize,
    pub unique_words: usize,
    pub drawn_this_run: usize,
    pub per_mechanism: BTreeMap<WordplayMechanism, usize>,
}

#[derive(Debug, Default)]
struct PoolState {
    entries: Vec<PoolEntry>,
    /// Words handed out in this run.
    drawn: HashSet<String>,
}

/// In-memory word supply. One lock covers selection and reservation, so two
/// concurrent draws can never return the same word.
#[derive(Debug, Default)]
pub struct WordPool {
    state: Mutex<PoolState>,
}

impl WordPool {
    pub fn new(entries: Vec<PoolEntry>) -> Self {
        Self {
            state: Mutex::new(PoolState {
                entries,
                drawn: HashSet::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, PoolState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Pick one of the least-used entries that has not been drawn this run,
    /// at random, and reserve it.
    pub fn draw(&self, mechanism: Option<WordplayMechanism>) -> Draw {
        let mut state = self.lock();
        let eligible: Vec<&PoolEntry> = state
            .entries
            .iter()
            .filter(|e| !state.drawn.contains(&e.word))
            .filter(|e| mechanism.is_none() || mechanism == Some(e.mechanism))
            .collect();

        let Some(fewest) = eligible.iter().map(|e| e.usage_count).min() else {
            debug!(mechanism = ?mechanism, "Word pool exhausted");
            return Draw::Exhausted;
        };
        let least_used: Vec<&PoolEntry> = eligible
            .into_iter()
            .filter(|e| e.usage_count == fewest)
            .collect();

        let Some(&chosen) = least_used.choose(&mut rand::rng()) else {
            return Draw::Exhausted;
        };
        let (word, mechanism) = (chosen.word.clone(), chosen.mechanism);
        state.drawn.insert(word.clone());
        Draw::Word { word, mechanism }
    }

    pub fn record_use(&self, word: &str) {
        let word = word.trim().to_uppercase();
        let mut state = self.lock();
        for entry in state.entries.iter_mut().filter(|e| e.word == word) {
            entry.usage_count += 1;
        }
        state.drawn.insert(word);
    }

    /// Forget which words were drawn; usage counts are kept.
    pub fn reset_run(&self) {
        let mut state = self.lock();
        debug!(words = state.drawn.len(), "Resetting drawn words");
        state.drawn.clear();
    }

    pub fn usage_count(&self, word: &str) -> u32 {
        let word = word.trim().to_uppercase();
        self.lock()
            .entries
            .iter()
            .filter(|e| e.word == word)
            .map(|e| e.usage_count)
            .max()
            .unwrap_or(0)
    }

    pub fn stats(&self) -> PoolStats {
        let state = self.lock();
        let mut per_mechanism = BTreeMap::new();
        for entry in &state.entries {
            *per_mechanism.entry(entry.mechanism).or_insert(0) += 1;
        }
        PoolStats {
            total_entries: state.entries.len(),
            unique_words: state
                .entries
                .iter()
                .map(|e| e.word.as_str())
                .collect::<HashSet<_>>()
                .len(),
            drawn_this_run: state.drawn.len(),
            per_mechanism,
        }
    }
}

#[async_trait]
impl WordSupply for WordPool {
    async fn next(&self, mechanism: Option<WordplayMechanism>) -> Draw {
        self.draw(mechanism)
    }

    async fn mark_used(&self, word: &str) {
        self.record_use(word);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn pool(words: &[(&str, WordplayMechanism)]) -> WordPool {
        WordPool::new(
            words
                .iter()
                .map(|(w, m)| PoolEntry::new(w, *m, "test.json"))
                .collect(),
        )
    }

    fn drawn_word(draw: Draw) -> String {
        match draw {
            Draw::Word { word, .. } => word,
            Draw::Exhausted => panic!("pool exhausted"),
        }
    }

    #[test]
    fn words_are_not_repeated_within_a_run() {
        let pool = pool(&[
            ("silent", WordplayMechanism::Anagram),
            ("regal", WordplayMechanism::Reversal),
        ]);
        let first = drawn_word(pool.draw(None));
        let second = drawn_word(pool.draw(None));
        assert_ne!(first, second);
        assert_eq!(pool.draw(None), Draw::Exhausted);
    }

    #[test]
    fn filter_restricts_mechanism() {
        let pool = pool(&[
            ("silent", WordplayMechanism::Anagram),
            ("regal", WordplayMechanism::Reversal),
        ]);
        assert_eq!(
            pool.draw(Some(WordplayMechanism::Reversal)),
            Draw::Word {
                word: "REGAL".into(),
                mechanism: WordplayMechanism::Reversal
            }
        );
        assert_eq!(pool.draw(Some(WordplayMechanism::Reversal)), Draw::Exhausted);
    }

    #[test]
    fn least_used_words_come_first() {
        let pool = pool(&[
            ("silent", WordplayMechanism::Anagram),
            ("listen", WordplayMechanism::Anagram),
        ]);
        pool.record_use("SILENT");
        pool.reset_run();
        assert_eq!(drawn_word(pool.draw(None)), "LISTEN");
        assert_eq!(pool.usage_count("silent"), 1);
    }

    #[test]
    fn same_word_under_two_mechanisms_is_drawn_once() {
        let pool = pool(&[
            ("silent", WordplayMechanism::Anagram),
            ("silent", WordplayMechanism::HiddenWord),
        ]);
        drawn_word(pool.draw(None));
        assert_eq!(pool.draw(None), Draw::Exhausted);
    }

    #[test]
    fn stats_count_entries_per_mechanism() {
        let pool = pool(&[
            ("silent", WordplayMechanism::Anagram),
            ("silent", WordplayMechanism::HiddenWord),
            ("regal", WordplayMechanism::Reversal),
        ]);
        let stats = pool.stats();
        assert_eq!(stats.total_entries, 3);
        assert_eq!(stats.unique_words, 2);
        assert_eq!(stats.per_mechanism[&WordplayMechanism::Anagram], 1);
    }

    #[tokio::test]
    async fn concurrent_draws_never_collide() {
        let entries = (0..50)
            .map(|i| PoolEntry::new(&format!("word{i}"), WordplayMechanism::Anagram, "t"))
            .collect();
        let pool = Arc::new(WordPool::new(entries));

        let handles: Vec<_> = (0..50)
            .map(|_| {
                let pool = pool.clone();
                tokio::spawn(async move { pool.next(None).await })
            })
            .collect();
        let mut seen = HashSet::new();
        for handle in handles {
            let word = drawn_word(handle.await.unwrap());
            assert!(seen.insert(word), "word handed out twice");
        }
        assert_eq!(seen.len(), 50);
    }
}
