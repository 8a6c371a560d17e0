use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, StudyError};
use crate::keyboard::layout::KeyboardType;

/// The order in which a session walks through keyboard types.
///
/// Always non-empty with no repeats. Persisted as the concatenation of the
/// keyboard codes, e.g. `"S93"`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct KeyboardOrder(Vec<KeyboardType>);

impl KeyboardOrder {
    pub fn new(types: Vec<KeyboardType>) -> Result<Self> {
        if types.is_empty() {
            return Err(StudyError::EmptyKeyboardOrder);
        }
        for (i, kb) in types.iter().enumerate() {
            if types[..i].contains(kb) {
                return Err(StudyError::DuplicateKeyboardType(*kb));
            }
        }
        Ok(Self(types))
    }

    pub fn from_code(code: &str) -> Result<Self> {
        let types = code
            .chars()
            .map(KeyboardType::from_code)
            .collect::<Result<Vec<_>>>()?;
        Self::new(types)
    }

    pub fn to_code(&self) -> String {
        self.0.iter().map(|kb| kb.code()).collect()
    }

    pub fn as_slice(&self) -> &[KeyboardType] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn first(&self) -> KeyboardType {
        self.0[0]
    }

    /// The keyboard type that follows `kb`, or `None` when `kb` is last.
    pub fn after(&self, kb: KeyboardType) -> Result<Option<KeyboardType>> {
        let index = self
            .0
            .iter()
            .position(|&t| t == kb)
            .ok_or(StudyError::UnknownKeyboardType(kb))?;
        Ok(self.0.get(index + 1).copied())
    }

    /// Cyclic left rotation by one: element `(i + 1) % n` moves to `i`.
    pub fn rotated(&self) -> Self {
        let mut types = self.0.clone();
        types.rotate_left(1);
        Self(types)
    }
}

impl Default for KeyboardOrder {
    fn default() -> Self {
        Self(KeyboardType::ALL.to_vec())
    }
}

impl TryFrom<String> for KeyboardOrder {
    type Error = StudyError;

    fn try_from(code: String) -> Result<Self> {
        Self::from_code(&code)
    }
}

impl From<KeyboardOrder> for String {
    fn from(order: KeyboardOrder) -> Self {
        order.to_code()
    }
}

impl fmt::Display for KeyboardOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.0.iter().map(|kb| kb.as_str()).collect();
        write!(f, "[{}]", names.join(", "))
    }
}
