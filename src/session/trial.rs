use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, StudyError};
use crate::keyboard::layout::{KeyboardType, keyboard_code};
use crate::store::StudyStore;

/// How the participant finished a trial.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntryMethod {
    PrimarySuggestionAccepted,
    AlternateSuggestionSelected,
}

impl EntryMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            EntryMethod::PrimarySuggestionAccepted => "PRIMARY_SUGGESTION_ACCEPTED",
            EntryMethod::AlternateSuggestionSelected => "ALTERNATE_SUGGESTION_SELECTED",
        }
    }
}

impl fmt::Display for EntryMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrialState {
    Pending,
    Running,
    Ended,
}

impl TrialState {
    pub fn as_str(self) -> &'static str {
        match self {
            TrialState::Pending => "PENDING",
            TrialState::Running => "RUNNING",
            TrialState::Ended => "ENDED",
        }
    }
}

/// One timed attempt to enter a target word on one keyboard.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trial {
    id: u64,
    session_id: u64,
    #[serde(with = "keyboard_code")]
    keyboard_type: KeyboardType,
    target_word: String,
    #[serde(default)]
    start_timestamp: Option<i64>,
    #[serde(default)]
    end_timestamp: Option<i64>,
    #[serde(default)]
    entry_method: Option<EntryMethod>,
    #[serde(default)]
    entered_word: Option<String>,
}

impl Trial {
    /// Inserts a new pending trial into `store`.
    pub fn create(
        store: &mut dyn StudyStore,
        session_id: u64,
        target_word: &str,
        keyboard_type: KeyboardType,
    ) -> Result<Self> {
        let id = store.insert_trial(session_id, target_word, keyboard_type)?;
        Ok(Self::new(id, session_id, keyboard_type, target_word))
    }

    pub fn new(id: u64, session_id: u64, keyboard_type: KeyboardType, target_word: &str) -> Self {
        Self {
            id,
            session_id,
            keyboard_type,
            target_word: target_word.to_string(),
            start_timestamp: None,
            end_timestamp: None,
            entry_method: None,
            entered_word: None,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn session_id(&self) -> u64 {
        self.session_id
    }

    pub fn keyboard_type(&self) -> KeyboardType {
        self.keyboard_type
    }

    pub fn target_word(&self) -> &str {
        &self.target_word
    }

    pub fn start_timestamp(&self) -> Option<i64> {
        self.start_timestamp
    }

    pub fn end_timestamp(&self) -> Option<i64> {
        self.end_timestamp
    }

    pub fn entry_method(&self) -> Option<EntryMethod> {
        self.entry_method
    }

    pub fn entered_word(&self) -> Option<&str> {
        self.entered_word.as_deref()
    }

    pub fn state(&self) -> TrialState {
        match (self.start_timestamp, self.end_timestamp) {
            (_, Some(_)) => TrialState::Ended,
            (Some(_), None) => TrialState::Running,
            (None, None) => TrialState::Pending,
        }
    }

    pub fn has_ended(&self) -> bool {
        self.state() == TrialState::Ended
    }

    pub fn start(&mut self, now_ms: i64) -> Result<()> {
        if self.state() != TrialState::Pending {
            return Err(self.invalid("start"));
        }
        self.start_timestamp = Some(now_ms);
        Ok(())
    }

    /// Final: an ended trial cannot be ended again or restarted.
    pub fn end(&mut self, method: EntryMethod, entered_word: &str, now_ms: i64) -> Result<()> {
        if self.state() != TrialState::Running {
            return Err(self.invalid("end"));
        }
        self.entry_method = Some(method);
        self.entered_word = Some(entered_word.to_string());
        self.end_timestamp = Some(now_ms);
        Ok(())
    }

    /// End minus start, defined only once the trial has ended. The value is
    /// not clamped; a non-positive duration means the caller's clock went
    /// backwards.
    pub fn duration_ms(&self) -> Option<i64> {
        match (self.start_timestamp, self.end_timestamp) {
            (Some(start), Some(end)) => Some(end - start),
            _ => None,
        }
    }

    fn invalid(&self, action: &'static str) -> StudyError {
        StudyError::InvalidTrialTransition {
            id: self.id,
            action,
            state: self.state().as_str(),
        }
    }
}
