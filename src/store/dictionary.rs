use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::BufRead;
use std::path::Path;

use rand::Rng;
use rand::SeedableRng;
use rand::rngs::SmallRng;

use crate::error::{Result, StudyError};
use crate::keyboard::key_press::{KeyPress, matches_pattern};
use crate::store::{DictionaryEntry, DictionaryStore};

const BUNDLED_WORDS: &str = include_str!("../../assets/dictionary.csv");

/// Word/frequency dictionary held in memory.
///
/// Only obtainable through one of the loaders, so every read happens after
/// the bulk load has finished.
pub struct MemoryDictionary {
    /// All words in ascending order; the population for uniform draws.
    words: Vec<String>,
    /// Entries bucketed by letter count, most frequent first, ties by word.
    by_length: HashMap<usize, Vec<DictionaryEntry>>,
    rng: SmallRng,
}

impl MemoryDictionary {
    pub fn bundled() -> Result<Self> {
        Self::from_reader(BUNDLED_WORDS.as_bytes())
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            StudyError::Setup(format!("Unable to read dictionary {}: {e}", path.display()))
        })?;
        Self::from_reader(content.as_bytes())
    }

    /// Bulk load from `word,frequency` lines. Words are lowercased and a
    /// repeated word replaces the earlier entry.
    pub fn from_reader(reader: impl BufRead) -> Result<Self> {
        let mut entries: BTreeMap<String, u32> = BTreeMap::new();
        for (index, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| StudyError::Setup(format!("Dictionary read failed: {e}")))?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let (word, frequency) = parse_line(line).ok_or_else(|| {
                StudyError::Setup(format!("Malformed dictionary line {}: {line:?}", index + 1))
            })?;
            entries.insert(word, frequency);
        }
        tracing::info!(words = entries.len(), "dictionary loaded");
        Ok(Self::from_entries(entries))
    }

    fn from_entries(entries: BTreeMap<String, u32>) -> Self {
        let words: Vec<String> = entries.keys().cloned().collect();
        let mut by_length: HashMap<usize, Vec<DictionaryEntry>> = HashMap::new();
        for (word, frequency) in entries {
            by_length
                .entry(word.chars().count())
                .or_default()
                .push(DictionaryEntry { word, frequency });
        }
        for bucket in by_length.values_mut() {
            bucket.sort_by(|a, b| b.frequency.cmp(&a.frequency).then_with(|| a.word.cmp(&b.word)));
        }
        Self {
            words,
            by_length,
            rng: SmallRng::from_entropy(),
        }
    }

    /// Replaces the random source, making `random_word` reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = SmallRng::seed_from_u64(seed);
        self
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.binary_search_by(|w| w.as_str().cmp(word)).is_ok()
    }
}

fn parse_line(line: &str) -> Option<(String, u32)> {
    let (word, frequency) = line.split_once(',')?;
    let word = word.trim().to_lowercase();
    if word.is_empty() {
        return None;
    }
    let frequency = frequency.trim().parse().ok()?;
    Some((word, frequency))
}

impl DictionaryStore for MemoryDictionary {
    fn random_word(&mut self) -> Option<String> {
        if self.words.is_empty() {
            return None;
        }
        let idx = self.rng.gen_range(0..self.words.len());
        Some(self.words[idx].clone())
    }

    fn matching_words(&self, pattern: &[KeyPress]) -> Vec<DictionaryEntry> {
        match self.by_length.get(&pattern.len()) {
            Some(bucket) => bucket
                .iter()
                .filter(|e| matches_pattern(&e.word, pattern))
                .cloned()
                .collect(),
            None => Vec::new(),
        }
    }

    fn word_count(&self) -> usize {
        self.words.len()
    }
}
