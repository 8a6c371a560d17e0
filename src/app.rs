use crate::config::Config;
use crate::engine::candidates::{DisplaySplit, Suggestions};
use crate::engine::scheduler::{self, SchedulerState};
use crate::error::{Result, StudyError};
use crate::keyboard::key_press::KeyPress;
use crate::keyboard::layout::KeyboardType;
use crate::session::clock::Clock;
use crate::session::study::Session;
use crate::session::trial::{EntryMethod, Trial};
use crate::store::{DictionaryStore, StudyStore};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Advance {
    NextTrial,
    SessionCompleted,
}

/// Everything that lives only while a session is being run.
struct ActiveSession {
    session: Session,
    scheduler: SchedulerState,
    trial: Trial,
    pressed: Vec<KeyPress>,
    suggestions: Suggestions,
}

/// Drives a participant through a session: key presses in, ranked
/// suggestions out, accepted words closing trials and the scheduler picking
/// the next one.
pub struct StudyApp<S, D, C> {
    pub config: Config,
    store: S,
    dictionary: D,
    clock: C,
    active: Option<ActiveSession>,
}

impl<S: StudyStore, D: DictionaryStore, C: Clock> StudyApp<S, D, C> {
    pub fn new(mut config: Config, store: S, dictionary: D, clock: C) -> Self {
        config.validate();
        Self {
            config,
            store,
            dictionary,
            clock,
            active: None,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn session(&self) -> Option<&Session> {
        self.active.as_ref().map(|a| &a.session)
    }

    pub fn trial(&self) -> Option<&Trial> {
        self.active.as_ref().map(|a| &a.trial)
    }

    pub fn keyboard_type(&self) -> Option<KeyboardType> {
        self.trial().map(Trial::keyboard_type)
    }

    pub fn pressed(&self) -> &[KeyPress] {
        self.active
            .as_ref()
            .map(|a| a.pressed.as_slice())
            .unwrap_or(&[])
    }

    pub fn suggestions(&self) -> Option<&Suggestions> {
        self.active.as_ref().map(|a| &a.suggestions)
    }

    /// The autocomplete word split at the number of keys pressed so far.
    pub fn autocomplete_split(&self) -> Option<DisplaySplit<'_>> {
        let active = self.active.as_ref()?;
        let word = active.suggestions.autocomplete()?;
        Some(DisplaySplit::new(word, active.pressed.len()))
    }

    /// The alternates that fit in the visible part of the list.
    pub fn visible_alternates(&self) -> &[String] {
        match self.suggestions() {
            Some(s) => {
                let alternates = s.alternates();
                &alternates[..alternates.len().min(self.config.max_suggested_visible)]
            }
            None => &[],
        }
    }

    /// Creates a session with the counterbalanced keyboard order and starts
    /// its first trial.
    pub fn begin_session(&mut self, participant_id: &str) -> Result<&Trial> {
        if let Some(active) = &self.active {
            return Err(StudyError::SessionInProgress(active.session.id()));
        }
        let order = scheduler::next_keyboard_order(&self.store)?;
        let mut session = Session::create(&mut self.store, participant_id, order)?;
        let mut state = SchedulerState::new(self.config.trials_per_keyboard);

        let trial = match scheduler::advance_to_next_trial(
            &mut session,
            None,
            &mut state,
            &mut self.dictionary,
            &mut self.store,
            &self.clock,
        )? {
            Some(trial) => trial,
            None => return Err(StudyError::NoActiveTrial),
        };

        let active = self.active.insert(ActiveSession {
            session,
            scheduler: state,
            trial,
            pressed: Vec::new(),
            suggestions: Suggestions::default(),
        });
        Ok(&active.trial)
    }

    pub fn press_key(&mut self, press: KeyPress) -> Result<&Suggestions> {
        let limit = self.config.max_suggested_words;
        let active = self.active.as_mut().ok_or(StudyError::NoActiveSession)?;
        tracing::debug!(key = %press.label(), "key pressed");
        active.pressed.push(press);
        active.suggestions = Suggestions::compute(&self.dictionary, &active.pressed, limit);
        Ok(&active.suggestions)
    }

    /// Presses whichever key of the current layout carries `letter`.
    /// Returns `None` when no key does.
    pub fn press_letter(&mut self, letter: char) -> Result<Option<&Suggestions>> {
        let kb = self.keyboard_type().ok_or(StudyError::NoActiveSession)?;
        match kb.key_for_letter(letter) {
            Some(press) => self.press_key(press).map(Some),
            None => Ok(None),
        }
    }

    pub fn clear_keys(&mut self) {
        if let Some(active) = self.active.as_mut() {
            active.pressed.clear();
            active.suggestions = Suggestions::default();
        }
    }

    pub fn accept_autocomplete(&mut self) -> Result<Advance> {
        let word = self
            .suggestions()
            .and_then(Suggestions::autocomplete)
            .ok_or(StudyError::NoAutocomplete)?
            .to_string();
        self.accept_word(EntryMethod::PrimarySuggestionAccepted, &word)
    }

    /// Picks an alternate by its position in the alternates list.
    pub fn select_alternate(&mut self, index: usize) -> Result<Advance> {
        let alternates = self
            .suggestions()
            .ok_or(StudyError::NoActiveSession)?
            .alternates();
        let word = alternates
            .get(index)
            .ok_or(StudyError::AlternateOutOfRange {
                index,
                count: alternates.len(),
            })?
            .clone();
        self.accept_word(EntryMethod::AlternateSuggestionSelected, &word)
    }

    fn accept_word(&mut self, method: EntryMethod, word: &str) -> Result<Advance> {
        let active = self.active.as_mut().ok_or(StudyError::NoActiveSession)?;
        active.trial.end(method, word, self.clock.now_ms())?;
        self.store.update_trial(&active.trial)?;
        tracing::info!(
            trial_id = active.trial.id(),
            target_word = active.trial.target_word(),
            entered = word,
            method = %method,
            "word accepted"
        );

        let next = scheduler::advance_to_next_trial(
            &mut active.session,
            Some(&active.trial),
            &mut active.scheduler,
            &mut self.dictionary,
            &mut self.store,
            &self.clock,
        );
        let next = match next {
            Ok(next) => next,
            Err(err) => {
                self.abandon_after_failure(&err);
                return Err(err);
            }
        };
        match next {
            Some(trial) => {
                active.trial = trial;
                active.pressed.clear();
                active.suggestions = Suggestions::default();
                Ok(Advance::NextTrial)
            }
            None => {
                self.active = None;
                Ok(Advance::SessionCompleted)
            }
        }
    }

    /// The ended trial has no successor, so the session cannot continue.
    /// Cancels it and drops the runtime state; a failure to cancel is only
    /// logged.
    fn abandon_after_failure(&mut self, err: &StudyError) {
        let Some(mut active) = self.active.take() else {
            return;
        };
        let session_id = active.session.id();
        tracing::warn!(session_id, error = %err, "could not advance, canceling session");
        let canceled = active
            .session
            .cancel()
            .and_then(|()| self.store.update_session(&active.session));
        if let Err(cancel_err) = canceled {
            tracing::warn!(session_id, error = %cancel_err, "could not cancel session");
        }
    }

    /// Abandons the running session. The unfinished trial is left unended.
    pub fn cancel_session(&mut self) -> Result<()> {
        let mut active = self.active.take().ok_or(StudyError::NoActiveSession)?;
        active.session.cancel()?;
        self.store.update_session(&active.session)
    }

    /// Deletes every stored session and trial. Refused while a session runs.
    pub fn clear_data(&mut self) -> Result<(usize, usize)> {
        if let Some(active) = &self.active {
            return Err(StudyError::SessionInProgress(active.session.id()));
        }
        let sessions = self.store.delete_all_sessions()?;
        let trials = self.store.delete_all_trials()?;
        tracing::info!(sessions, trials, "cleared study data");
        Ok((sessions, trials))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyboard::layout::KeyboardType::*;
    use crate::session::clock::ManualClock;
    use crate::session::study::SessionStatus;
    use crate::store::dictionary::MemoryDictionary;
    use crate::keyboard::key_press::matches_pattern;
    use crate::store::DictionaryEntry;
    use crate::store::json_store::JsonStore;
    use tempfile::TempDir;

    const WORDS: &str = "ab,5\nac,9\nba,1\nad,2\n";

    fn make_app(dir: &TempDir) -> StudyApp<JsonStore, MemoryDictionary, ManualClock> {
        let store = JsonStore::open(dir.path()).unwrap();
        let dictionary = MemoryDictionary::from_reader(WORDS.as_bytes())
            .unwrap()
            .with_seed(1);
        StudyApp::new(
            Config::default(),
            store,
            dictionary,
            ManualClock::starting_at(0),
        )
    }

    fn abc() -> KeyPress {
        KeyPress::from_label("abc")
    }

    #[test]
    fn begin_starts_session_and_first_trial() {
        let dir = TempDir::new().unwrap();
        let mut app = make_app(&dir);
        let trial = app.begin_session("p01").unwrap();
        assert_eq!(trial.keyboard_type(), Standard);
        assert!(trial.start_timestamp().is_some());
        assert_eq!(app.session().unwrap().status(), SessionStatus::Started);
        assert!(matches!(
            app.begin_session("p02"),
            Err(StudyError::SessionInProgress(1))
        ));
    }

    #[test]
    fn empty_participant_is_rejected() {
        let dir = TempDir::new().unwrap();
        let mut app = make_app(&dir);
        assert!(matches!(
            app.begin_session("  "),
            Err(StudyError::EmptyParticipant)
        ));
        assert!(app.session().is_none());
    }

    #[test]
    fn key_presses_refresh_suggestions() {
        let dir = TempDir::new().unwrap();
        let mut app = make_app(&dir);
        app.config.max_suggested_words = 3;
        app.begin_session("p01").unwrap();

        app.press_key(abc()).unwrap();
        let s = app.press_key(abc()).unwrap();
        assert_eq!(s.words(), &["ac", "ab", "ba"]);
        assert_eq!(s.autocomplete(), Some("ba"));
        assert_eq!(
            app.autocomplete_split(),
            Some(DisplaySplit {
                typed: "ba",
                inferred: ""
            })
        );

        app.config.max_suggested_visible = 1;
        assert_eq!(app.visible_alternates(), &["ac".to_string()]);

        app.clear_keys();
        assert!(app.pressed().is_empty());
        assert!(app.suggestions().unwrap().is_empty());
    }

    #[test]
    fn accept_without_candidates_fails_without_ending_trial() {
        let dir = TempDir::new().unwrap();
        let mut app = make_app(&dir);
        app.begin_session("p01").unwrap();
        app.press_key(KeyPress::from_label("z")).unwrap();
        assert!(matches!(
            app.accept_autocomplete(),
            Err(StudyError::NoAutocomplete)
        ));
        assert!(!app.trial().unwrap().has_ended());
        assert!(matches!(
            app.select_alternate(0),
            Err(StudyError::AlternateOutOfRange { index: 0, count: 0 })
        ));
    }

    #[test]
    fn press_letter_uses_active_layout() {
        let dir = TempDir::new().unwrap();
        let mut app = make_app(&dir);
        app.begin_session("p01").unwrap();
        assert!(app.press_letter('7').unwrap().is_none());
        let s = app.press_letter('a').unwrap().unwrap();
        assert!(s.is_empty());
        assert_eq!(app.pressed().len(), 1);
    }

    #[test]
    fn accepting_words_walks_the_whole_session() {
        let dir = TempDir::new().unwrap();
        let mut app = make_app(&dir);
        app.begin_session("p01").unwrap();

        let mut keyboards = Vec::new();
        let mut methods = Vec::new();
        loop {
            keyboards.push(app.keyboard_type().unwrap());
            app.press_key(abc()).unwrap();
            app.press_key(abc()).unwrap();
            app.clock().advance(800);
            let outcome = if keyboards.len() % 2 == 0 {
                methods.push(EntryMethod::AlternateSuggestionSelected);
                app.select_alternate(0).unwrap()
            } else {
                methods.push(EntryMethod::PrimarySuggestionAccepted);
                app.accept_autocomplete().unwrap()
            };
            if outcome == Advance::SessionCompleted {
                break;
            }
            assert!(app.pressed().is_empty());
        }

        assert_eq!(
            keyboards,
            vec![Standard, Standard, NineKey, NineKey, ThreeKey, ThreeKey]
        );
        assert!(app.session().is_none());

        let sessions = app.store().all_sessions().unwrap();
        assert_eq!(sessions[0].status(), SessionStatus::Completed);
        let trials = app.store().trials_for_session(sessions[0].id()).unwrap();
        assert_eq!(trials.len(), 6);
        for (trial, method) in trials.iter().zip(&methods) {
            assert_eq!(trial.entry_method(), Some(*method));
            assert_eq!(trial.duration_ms(), Some(800));
        }
        assert_eq!(trials[0].entered_word(), Some("ba"));
        assert_eq!(trials[1].entered_word(), Some("ac"));
    }

    #[test]
    fn second_session_rotates_order() {
        let dir = TempDir::new().unwrap();
        let mut app = make_app(&dir);
        app.config.trials_per_keyboard = 1;
        app.begin_session("p01").unwrap();
        loop {
            app.press_key(abc()).unwrap();
            app.press_key(abc()).unwrap();
            if app.accept_autocomplete().unwrap() == Advance::SessionCompleted {
                break;
            }
        }
        app.begin_session("p02").unwrap();
        assert_eq!(app.session().unwrap().keyboard_order().to_code(), "93S");
        assert_eq!(app.keyboard_type(), Some(NineKey));
    }

    #[test]
    fn cancel_leaves_order_unrotated() {
        let dir = TempDir::new().unwrap();
        let mut app = make_app(&dir);
        app.begin_session("p01").unwrap();
        app.cancel_session().unwrap();
        assert!(app.session().is_none());
        assert!(matches!(
            app.cancel_session(),
            Err(StudyError::NoActiveSession)
        ));

        let stored = app.store().all_sessions().unwrap();
        assert_eq!(stored[0].status(), SessionStatus::Canceled);
        app.begin_session("p02").unwrap();
        assert_eq!(app.session().unwrap().keyboard_order().to_code(), "S93");
    }

    /// Hands out a fixed list of target words, then runs dry.
    struct FiniteWords(Vec<String>);

    impl DictionaryStore for FiniteWords {
        fn random_word(&mut self) -> Option<String> {
            self.0.pop()
        }

        fn matching_words(&self, pattern: &[KeyPress]) -> Vec<DictionaryEntry> {
            ["ac", "ab"]
                .iter()
                .filter(|w| matches_pattern(w, pattern))
                .map(|w| DictionaryEntry {
                    word: w.to_string(),
                    frequency: 1,
                })
                .collect()
        }

        fn word_count(&self) -> usize {
            self.0.len()
        }
    }

    #[test]
    fn failed_advance_cancels_session_instead_of_stranding_it() {
        let dir = TempDir::new().unwrap();
        let store = JsonStore::open(dir.path()).unwrap();
        let words = FiniteWords(vec!["ab".to_string()]);
        let mut app = StudyApp::new(
            Config::default(),
            store,
            words,
            ManualClock::starting_at(0),
        );
        app.begin_session("p01").unwrap();

        app.press_key(abc()).unwrap();
        app.press_key(abc()).unwrap();
        let err = app.accept_autocomplete().unwrap_err();
        assert!(err.is_setup());

        assert!(app.session().is_none());
        assert!(matches!(
            app.select_alternate(0),
            Err(StudyError::NoActiveSession)
        ));
        let sessions = app.store().all_sessions().unwrap();
        assert_eq!(sessions[0].status(), SessionStatus::Canceled);
        let trials = app.store().trials_for_session(sessions[0].id()).unwrap();
        assert_eq!(trials.len(), 1);
        assert!(trials[0].has_ended());

        // Nothing is left running, so clearing is allowed.
        assert_eq!(app.clear_data().unwrap(), (1, 1));
    }

    #[test]
    fn clear_data_is_refused_mid_session() {
        let dir = TempDir::new().unwrap();
        let mut app = make_app(&dir);
        app.begin_session("p01").unwrap();
        assert!(app.clear_data().is_err());
        app.cancel_session().unwrap();
        assert_eq!(app.clear_data().unwrap(), (1, 1));
        assert!(app.store().all_sessions().unwrap().is_empty());
    }
}
