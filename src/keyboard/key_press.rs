use std::collections::BTreeSet;

/// One key activation: the set of letters the pressed key can stand for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyPress {
    letters: BTreeSet<char>,
}

impl KeyPress {
    pub fn new(letters: impl IntoIterator<Item = char>) -> Self {
        Self {
            letters: letters
                .into_iter()
                .filter(|c| !c.is_whitespace())
                .map(|c| c.to_ascii_lowercase())
                .collect(),
        }
    }

    /// Builds a press from a key label such as `"qwe"`. Line breaks used to
    /// wrap labels on narrow keys are ignored.
    pub fn from_label(label: &str) -> Self {
        Self::new(label.chars())
    }

    pub fn contains(&self, letter: char) -> bool {
        self.letters.contains(&letter.to_ascii_lowercase())
    }

    pub fn label(&self) -> String {
        self.letters.iter().collect()
    }

    pub fn is_ambiguous(&self) -> bool {
        self.letters.len() > 1
    }
}

/// True iff `word` has one letter per press and each letter is one the
/// corresponding key can produce.
pub fn matches_pattern(word: &str, pattern: &[KeyPress]) -> bool {
    word.chars().count() == pattern.len()
        && word
            .chars()
            .zip(pattern)
            .all(|(letter, press)| press.contains(letter))
}
