pub mod dictionary;
pub mod json_store;
pub mod schema;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::keyboard::key_press::KeyPress;
use crate::keyboard::layout::KeyboardType;
use crate::keyboard::order::KeyboardOrder;
use crate::session::study::{Session, SessionStatus};
use crate::session::trial::Trial;

/// A dictionary word and its relative frequency.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DictionaryEntry {
    pub word: String,
    pub frequency: u32,
}

/// Word source consumed by the candidate engine and the scheduler.
pub trait DictionaryStore {
    /// A word drawn uniformly at random, ignoring frequency. `None` only when
    /// the dictionary is empty.
    fn random_word(&mut self) -> Option<String>;

    /// Every word matching `pattern` position by position, most frequent
    /// first. Unbounded; callers apply their own limit.
    fn matching_words(&self, pattern: &[KeyPress]) -> Vec<DictionaryEntry>;

    fn word_count(&self) -> usize;
}

/// Persistence of sessions and trials. Ids are assigned on insert.
pub trait StudyStore {
    fn insert_session(
        &mut self,
        participant_id: &str,
        keyboard_order: &KeyboardOrder,
        status: SessionStatus,
    ) -> Result<u64>;

    fn update_session(&mut self, session: &Session) -> Result<()>;

    /// All sessions by ascending id.
    fn all_sessions(&self) -> Result<Vec<Session>>;

    /// The completed session with the highest id, across all participants.
    fn last_completed_session(&self) -> Result<Option<Session>>;

    fn insert_trial(
        &mut self,
        session_id: u64,
        target_word: &str,
        keyboard_type: KeyboardType,
    ) -> Result<u64>;

    fn update_trial(&mut self, trial: &Trial) -> Result<()>;

    /// Trials of one session by ascending id.
    fn trials_for_session(&self, session_id: u64) -> Result<Vec<Trial>>;

    fn delete_all_sessions(&mut self) -> Result<usize>;

    fn delete_all_trials(&mut self) -> Result<usize>;
}
