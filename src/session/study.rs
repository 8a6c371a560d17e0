use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, StudyError};
use crate::keyboard::layout::KeyboardType;
use crate::keyboard::order::KeyboardOrder;
use crate::store::StudyStore;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    Created,
    Started,
    Completed,
    Canceled,
}

impl SessionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SessionStatus::Created => "CREATED",
            SessionStatus::Started => "STARTED",
            SessionStatus::Completed => "COMPLETED",
            SessionStatus::Canceled => "CANCELED",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, SessionStatus::Completed | SessionStatus::Canceled)
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A participant's run through every keyboard type in a fixed order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    id: u64,
    participant_id: String,
    keyboard_order: KeyboardOrder,
    status: SessionStatus,
    #[serde(default)]
    start_timestamp: Option<i64>,
}

impl Session {
    /// Inserts a new CREATED session into `store` and returns it with the
    /// id the store assigned.
    pub fn create(
        store: &mut dyn StudyStore,
        participant_id: &str,
        keyboard_order: KeyboardOrder,
    ) -> Result<Self> {
        if participant_id.trim().is_empty() {
            return Err(StudyError::EmptyParticipant);
        }
        let id = store.insert_session(participant_id, &keyboard_order, SessionStatus::Created)?;
        tracing::info!(
            session_id = id,
            participant_id,
            order = %keyboard_order,
            "session created"
        );
        Ok(Self::new(id, participant_id, keyboard_order))
    }

    pub fn new(id: u64, participant_id: &str, keyboard_order: KeyboardOrder) -> Self {
        Self {
            id,
            participant_id: participant_id.to_string(),
            keyboard_order,
            status: SessionStatus::Created,
            start_timestamp: None,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn participant_id(&self) -> &str {
        &self.participant_id
    }

    pub fn keyboard_order(&self) -> &KeyboardOrder {
        &self.keyboard_order
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    /// Undefined (`None`) until the session has started.
    pub fn start_timestamp(&self) -> Option<i64> {
        self.start_timestamp
    }

    pub fn has_started(&self) -> bool {
        self.status != SessionStatus::Created
    }

    pub fn first_keyboard_type(&self) -> KeyboardType {
        self.keyboard_order.first()
    }

    pub fn keyboard_type_after(&self, kb: KeyboardType) -> Result<Option<KeyboardType>> {
        self.keyboard_order.after(kb)
    }

    pub fn start(&mut self, now_ms: i64) -> Result<()> {
        if self.status != SessionStatus::Created {
            return Err(self.invalid("start"));
        }
        self.start_timestamp = Some(now_ms);
        self.status = SessionStatus::Started;
        tracing::info!(session_id = self.id, "session started");
        Ok(())
    }

    pub fn complete(&mut self) -> Result<()> {
        if self.status.is_terminal() {
            return Err(self.invalid("complete"));
        }
        self.status = SessionStatus::Completed;
        tracing::info!(session_id = self.id, "session completed");
        Ok(())
    }

    pub fn cancel(&mut self) -> Result<()> {
        if self.status.is_terminal() {
            return Err(self.invalid("cancel"));
        }
        self.status = SessionStatus::Canceled;
        tracing::info!(session_id = self.id, "session canceled");
        Ok(())
    }

    fn invalid(&self, action: &'static str) -> StudyError {
        StudyError::InvalidSessionTransition {
            id: self.id,
            action,
            status: self.status,
        }
    }
}
