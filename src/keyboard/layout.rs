use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, StudyError};
use crate::keyboard::key_press::KeyPress;

/// Rows of keys, each key labelled with the letters it can produce.
type Rows = &'static [&'static [&'static str]];

const STANDARD_ROWS: Rows = &[
    &["q", "w", "e", "r", "t", "y", "u", "i", "o", "p"],
    &["a", "s", "d", "f", "g", "h", "j", "k", "l"],
    &["z", "x", "c", "v", "b", "n", "m"],
];

const NINE_KEY_ROWS: Rows = &[
    &["qwe", "rty", "uiop"],
    &["asd", "fgh", "jkl"],
    &["zx", "cvb", "nm"],
];

const THREE_KEY_ROWS: Rows = &[&["qwertyuiop"], &["asdfghjkl"], &["zxcvbnm"]];

/// The keyboards a participant can be asked to type on. Declaration order is
/// the canonical default presentation order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum KeyboardType {
    Standard,
    NineKey,
    ThreeKey,
}

impl KeyboardType {
    pub const ALL: [KeyboardType; 3] = [
        KeyboardType::Standard,
        KeyboardType::NineKey,
        KeyboardType::ThreeKey,
    ];

    /// Single-character code used when persisting this keyboard type.
    pub fn code(self) -> char {
        match self {
            KeyboardType::Standard => 'S',
            KeyboardType::NineKey => '9',
            KeyboardType::ThreeKey => '3',
        }
    }

    pub fn from_code(code: char) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|kb| kb.code() == code)
            .ok_or(StudyError::UnknownKeyboardCode(code))
    }

    pub fn as_str(self) -> &'static str {
        match self {
            KeyboardType::Standard => "STANDARD",
            KeyboardType::NineKey => "NINE_KEY",
            KeyboardType::ThreeKey => "THREE_KEY",
        }
    }

    pub fn rows(self) -> Rows {
        match self {
            KeyboardType::Standard => STANDARD_ROWS,
            KeyboardType::NineKey => NINE_KEY_ROWS,
            KeyboardType::ThreeKey => THREE_KEY_ROWS,
        }
    }

    /// Key labels in reading order (row by row, left to right).
    pub fn keys(self) -> impl Iterator<Item = &'static str> {
        self.rows().iter().flat_map(|row| row.iter().copied())
    }

    pub fn key_count(self) -> usize {
        self.keys().count()
    }

    /// The press produced by whichever key on this layout carries `letter`.
    pub fn key_for_letter(self, letter: char) -> Option<KeyPress> {
        let letter = letter.to_ascii_lowercase();
        self.keys()
            .find(|label| label.contains(letter))
            .map(KeyPress::from_label)
    }

    /// True when at least one key maps to more than one letter.
    pub fn is_ambiguous(self) -> bool {
        self.keys().any(|label| label.len() > 1)
    }
}

impl fmt::Display for KeyboardType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Serializes a `KeyboardType` as its single-character code. Reading an
/// unknown code fails.
pub mod keyboard_code {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::KeyboardType;

    pub fn serialize<S: Serializer>(kb: &KeyboardType, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_char(kb.code())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<KeyboardType, D::Error> {
        let code = String::deserialize(deserializer)?;
        let mut chars = code.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => KeyboardType::from_code(c).map_err(D::Error::custom),
            _ => Err(D::Error::custom(format!(
                "keyboard code must be one character, got '{code}'"
            ))),
        }
    }
}
