use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Serialize, de::DeserializeOwned};

use crate::error::{Result, StudyError};
use crate::keyboard::layout::KeyboardType;
use crate::keyboard::order::KeyboardOrder;
use crate::session::study::{Session, SessionStatus};
use crate::session::trial::Trial;
use crate::store::StudyStore;
use crate::store::schema::{SessionsData, TrialsData};

const SESSIONS_FILE: &str = "sessions.json";
const TRIALS_FILE: &str = "trials.json";

/// Study data kept as two JSON files under one directory. Every mutation is
/// written straight through with a temp-file rename.
pub struct JsonStore {
    base_dir: PathBuf,
    sessions: SessionsData,
    trials: TrialsData,
}

impl JsonStore {
    pub fn open(base_dir: &Path) -> Result<Self> {
        fs::create_dir_all(base_dir)?;
        let mut store = Self {
            base_dir: base_dir.to_path_buf(),
            sessions: SessionsData::default(),
            trials: TrialsData::default(),
        };
        store.sessions = store.load(SESSIONS_FILE)?;
        store.trials = store.load(TRIALS_FILE)?;
        if store.sessions.needs_reset() || store.trials.needs_reset() {
            return Err(StudyError::Setup(format!(
                "Unsupported study data schema in {}",
                base_dir.display()
            )));
        }
        Ok(store)
    }

    fn file_path(&self, name: &str) -> PathBuf {
        self.base_dir.join(name)
    }

    fn load<T: DeserializeOwned + Default>(&self, name: &str) -> Result<T> {
        let path = self.file_path(name);
        if path.exists() {
            let content = fs::read_to_string(&path)?;
            Ok(serde_json::from_str(&content)?)
        } else {
            Ok(T::default())
        }
    }

    fn save<T: Serialize>(&self, name: &str, data: &T) -> Result<()> {
        let path = self.file_path(name);
        let tmp_path = path.with_extension("tmp");

        let json = serde_json::to_string_pretty(data)?;
        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(json.as_bytes())?;
        file.sync_all()?;

        fs::rename(&tmp_path, &path)?;
        Ok(())
    }
}

impl StudyStore for JsonStore {
    fn insert_session(
        &mut self,
        participant_id: &str,
        keyboard_order: &KeyboardOrder,
        status: SessionStatus,
    ) -> Result<u64> {
        let id = self.sessions.last_id + 1;
        let mut session = Session::new(id, participant_id, keyboard_order.clone());
        match status {
            SessionStatus::Created => {}
            SessionStatus::Canceled => session.cancel()?,
            other => {
                return Err(StudyError::InvalidSessionTransition {
                    id,
                    action: "insert",
                    status: other,
                });
            }
        }
        self.sessions.last_id = id;
        self.sessions.sessions.push(session);
        self.save(SESSIONS_FILE, &self.sessions)?;
        Ok(id)
    }

    fn update_session(&mut self, session: &Session) -> Result<()> {
        let slot = self
            .sessions
            .sessions
            .iter_mut()
            .find(|s| s.id() == session.id())
            .ok_or(StudyError::UnknownSession(session.id()))?;
        *slot = session.clone();
        self.save(SESSIONS_FILE, &self.sessions)
    }

    fn all_sessions(&self) -> Result<Vec<Session>> {
        let mut sessions = self.sessions.sessions.clone();
        sessions.sort_by_key(Session::id);
        Ok(sessions)
    }

    fn last_completed_session(&self) -> Result<Option<Session>> {
        Ok(self
            .sessions
            .sessions
            .iter()
            .filter(|s| s.status() == SessionStatus::Completed)
            .max_by_key(|s| s.id())
            .cloned())
    }

    fn insert_trial(
        &mut self,
        session_id: u64,
        target_word: &str,
        keyboard_type: KeyboardType,
    ) -> Result<u64> {
        let id = self.trials.last_id + 1;
        self.trials.last_id = id;
        self.trials
            .trials
            .push(Trial::new(id, session_id, keyboard_type, target_word));
        self.save(TRIALS_FILE, &self.trials)?;
        Ok(id)
    }

    fn update_trial(&mut self, trial: &Trial) -> Result<()> {
        let slot = self
            .trials
            .trials
            .iter_mut()
            .find(|t| t.id() == trial.id())
            .ok_or(StudyError::UnknownTrial(trial.id()))?;
        *slot = trial.clone();
        self.save(TRIALS_FILE, &self.trials)
    }

    fn trials_for_session(&self, session_id: u64) -> Result<Vec<Trial>> {
        let mut trials: Vec<Trial> = self
            .trials
            .trials
            .iter()
            .filter(|t| t.session_id() == session_id)
            .cloned()
            .collect();
        trials.sort_by_key(Trial::id);
        Ok(trials)
    }

    fn delete_all_sessions(&mut self) -> Result<usize> {
        let count = self.sessions.sessions.len();
        self.sessions.sessions.clear();
        self.save(SESSIONS_FILE, &self.sessions)?;
        Ok(count)
    }

    fn delete_all_trials(&mut self) -> Result<usize> {
        let count = self.trials.trials.len();
        self.trials.trials.clear();
        self.save(TRIALS_FILE, &self.trials)?;
        Ok(count)
    }
}
