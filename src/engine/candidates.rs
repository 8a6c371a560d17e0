//! Resolves an ambiguous key sequence into ranked dictionary words.

use crate::keyboard::key_press::KeyPress;
use crate::store::DictionaryStore;

/// Ranked words for `pressed`, most frequent first, at most `limit` long.
///
/// An empty sequence (or a zero limit) yields no words. Ties in frequency
/// keep the store's order, which is ascending by word.
pub fn suggest(dict: &dyn DictionaryStore, pressed: &[KeyPress], limit: usize) -> Vec<String> {
    if pressed.is_empty() {
        return Vec::new();
    }
    dict.matching_words(pressed)
        .into_iter()
        .take(limit)
        .map(|entry| entry.word)
        .collect()
}

/// The words offered after a key press, split into the single autocomplete
/// word and the alternates listed alongside it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Suggestions {
    words: Vec<String>,
}

impl Suggestions {
    pub fn new(words: Vec<String>) -> Self {
        Self { words }
    }

    pub fn compute(dict: &dyn DictionaryStore, pressed: &[KeyPress], limit: usize) -> Self {
        Self::new(suggest(dict, pressed, limit))
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// The last-ranked word: the least frequent of the shown matches.
    pub fn autocomplete(&self) -> Option<&str> {
        self.words.last().map(String::as_str)
    }

    /// Every word except the autocomplete one, in ranked order.
    pub fn alternates(&self) -> &[String] {
        match self.words.split_last() {
            Some((_, rest)) => rest,
            None => &[],
        }
    }
}

/// A word split into the part covered by key presses and the inferred tail.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DisplaySplit<'a> {
    pub typed: &'a str,
    pub inferred: &'a str,
}

impl<'a> DisplaySplit<'a> {
    /// Letters `[0, press_count)` are typed, the rest inferred. A press count
    /// past the end of the word leaves nothing inferred.
    pub fn new(word: &'a str, press_count: usize) -> Self {
        let boundary = word
            .char_indices()
            .nth(press_count)
            .map_or(word.len(), |(i, _)| i);
        let (typed, inferred) = word.split_at(boundary);
        Self { typed, inferred }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyboard::key_press::matches_pattern;
    use crate::keyboard::layout::KeyboardType;
    use crate::store::dictionary::MemoryDictionary;

    fn dict(csv: &str) -> MemoryDictionary {
        MemoryDictionary::from_reader(csv.as_bytes()).unwrap()
    }

    fn abc() -> KeyPress {
        KeyPress::from_label("abc")
    }

    #[test]
    fn ranks_by_frequency_and_splits_autocomplete() {
        let d = dict("ab,5\nac,9\nba,1\nad,20\n");
        let words = suggest(&d, &[abc(), abc()], 3);
        assert_eq!(words, vec!["ac", "ab", "ba"]);

        let s = Suggestions::new(words);
        assert_eq!(s.autocomplete(), Some("ba"));
        assert_eq!(s.alternates(), &["ac".to_string(), "ab".to_string()]);
    }

    #[test]
    fn empty_sequence_yields_nothing() {
        let d = dict("a,1\n");
        assert!(suggest(&d, &[], 5).is_empty());
        assert!(Suggestions::compute(&d, &[], 5).is_empty());
    }

    #[test]
    fn no_match_is_a_normal_empty_result() {
        let d = dict("xyz,4\n");
        let s = Suggestions::compute(&d, &[abc(), abc(), abc()], 12);
        assert!(s.is_empty());
        assert_eq!(s.autocomplete(), None);
        assert!(s.alternates().is_empty());
    }

    #[test]
    fn limit_truncates_after_ranking() {
        let d = dict("aa,1\nab,2\nac,3\nba,4\nbb,5\n");
        let words = suggest(&d, &[abc(), abc()], 2);
        assert_eq!(words, vec!["bb", "ba"]);
        assert!(suggest(&d, &[abc(), abc()], 0).is_empty());
    }

    #[test]
    fn single_match_has_no_alternates() {
        let d = dict("cab,7\n");
        let s = Suggestions::compute(&d, &[abc(), abc(), abc()], 12);
        assert_eq!(s.autocomplete(), Some("cab"));
        assert!(s.alternates().is_empty());
    }

    #[test]
    fn every_candidate_fits_the_pattern_on_bundled_words() {
        let d = MemoryDictionary::bundled().unwrap();
        let layout = KeyboardType::ThreeKey;
        for typed in ["the", "word", "house", "at"] {
            let pressed: Vec<KeyPress> = typed
                .chars()
                .filter_map(|c| layout.key_for_letter(c))
                .collect();
            let words = suggest(&d, &pressed, 12);
            assert!(!words.is_empty(), "{typed} should match itself");
            assert!(words.len() <= 12);
            for w in &words {
                assert!(matches_pattern(w, &pressed), "{w} vs {typed}");
            }
            let freqs: Vec<u32> = d
                .matching_words(&pressed)
                .into_iter()
                .take(words.len())
                .map(|e| e.frequency)
                .collect();
            assert!(freqs.windows(2).all(|w| w[0] >= w[1]));
        }
    }

    #[test]
    fn display_split_follows_press_count() {
        assert_eq!(
            DisplaySplit::new("hello", 2),
            DisplaySplit {
                typed: "he",
                inferred: "llo"
            }
        );
        assert_eq!(DisplaySplit::new("hi", 2).inferred, "");
        assert_eq!(DisplaySplit::new("hi", 5).typed, "hi");
        assert_eq!(DisplaySplit::new("hi", 0).typed, "");
    }
}
