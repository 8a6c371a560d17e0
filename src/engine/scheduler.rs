//! Experiment sequencing: keyboard counterbalancing across sessions and the
//! per-keyboard trial quota within one.

use crate::error::{Result, StudyError};
use crate::keyboard::layout::KeyboardType;
use crate::keyboard::order::KeyboardOrder;
use crate::session::clock::Clock;
use crate::session::study::{Session, SessionStatus};
use crate::session::trial::Trial;
use crate::store::{DictionaryStore, StudyStore};

/// Order for a new session: the rotation of the most recently completed
/// session's order (from any participant), or the default order when no
/// session has completed yet.
pub fn next_keyboard_order(store: &dyn StudyStore) -> Result<KeyboardOrder> {
    Ok(match store.last_completed_session()? {
        Some(last) => last.keyboard_order().rotated(),
        None => KeyboardOrder::default(),
    })
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    Next(KeyboardType),
    Complete,
}

/// Counter threaded through successive scheduler calls for one session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SchedulerState {
    quota: u32,
    remaining: u32,
}

impl SchedulerState {
    /// `quota` is the number of trials per keyboard type; at least one.
    pub fn new(quota: u32) -> Self {
        let quota = quota.max(1);
        Self {
            quota,
            remaining: quota,
        }
    }

    pub fn quota(&self) -> u32 {
        self.quota
    }

    /// Decides the keyboard for the trial after `prior` (or the first trial
    /// when `prior` is `None`). Touches nothing but the counter.
    pub fn next_step(&mut self, session: &Session, prior: Option<&Trial>) -> Result<Step> {
        let next = match prior {
            None => Some(session.first_keyboard_type()),
            Some(trial) => {
                let current = trial.keyboard_type();
                if self.remaining == 0 {
                    self.remaining = self.quota;
                    session.keyboard_type_after(current)?
                } else {
                    Some(current)
                }
            }
        };
        self.remaining = self.remaining.saturating_sub(1);
        Ok(match next {
            Some(kb) => Step::Next(kb),
            None => Step::Complete,
        })
    }
}

/// Runs one scheduler step against real collaborators.
///
/// Either completes the session and returns `None`, or draws a target word,
/// persists a new trial, starts the session if it is still CREATED, then
/// starts the trial.
pub fn advance_to_next_trial(
    session: &mut Session,
    prior: Option<&Trial>,
    state: &mut SchedulerState,
    words: &mut dyn DictionaryStore,
    store: &mut dyn StudyStore,
    clock: &dyn Clock,
) -> Result<Option<Trial>> {
    let kb = match state.next_step(session, prior)? {
        Step::Complete => {
            session.complete()?;
            store.update_session(session)?;
            return Ok(None);
        }
        Step::Next(kb) => kb,
    };

    if prior.is_none_or(|p| p.keyboard_type() != kb) {
        tracing::debug!(session_id = session.id(), keyboard = %kb, "keyboard type changed");
    }

    let word = words
        .random_word()
        .ok_or_else(|| StudyError::Setup("Dictionary is empty".to_string()))?;
    let mut trial = Trial::create(store, session.id(), &word, kb)?;

    if session.status() == SessionStatus::Created {
        session.start(clock.now_ms())?;
        store.update_session(session)?;
    }
    trial.start(clock.now_ms())?;
    store.update_trial(&trial)?;
    Ok(Some(trial))
}
