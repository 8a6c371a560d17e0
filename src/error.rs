//! Errors raised by the study core and its storage adapters.

use thiserror::Error;

use crate::keyboard::layout::KeyboardType;
use crate::session::study::SessionStatus;

#[derive(Error, Debug)]
pub enum StudyError {
    #[error("At least one keyboard type is required")]
    EmptyKeyboardOrder,

    #[error("Keyboard type {0} appears more than once in the order")]
    DuplicateKeyboardType(KeyboardType),

    #[error("No keyboard type found for '{0}'")]
    UnknownKeyboardCode(char),

    #[error("Unknown keyboard type {0} for this session's order")]
    UnknownKeyboardType(KeyboardType),

    #[error("Session {id} cannot {action} while {status}")]
    InvalidSessionTransition {
        id: u64,
        action: &'static str,
        status: SessionStatus,
    },

    #[error("Trial {id} cannot {action} while {state}")]
    InvalidTrialTransition {
        id: u64,
        action: &'static str,
        state: &'static str,
    },

    #[error("Session {0} did not exist")]
    UnknownSession(u64),

    #[error("Trial {0} did not exist")]
    UnknownTrial(u64),

    #[error("Participant id must not be empty")]
    EmptyParticipant,

    #[error("Session {0} is still in progress")]
    SessionInProgress(u64),

    #[error("No session is in progress")]
    NoActiveSession,

    #[error("No trial is in progress")]
    NoActiveTrial,

    #[error("No autocomplete word to accept")]
    NoAutocomplete,

    #[error("Alternate suggestion {index} out of range ({count} shown)")]
    AlternateOutOfRange { index: usize, count: usize },

    /// Dictionary or storage could not be brought up; the core is unusable
    /// until this is resolved.
    #[error("Setup failed: {0}")]
    Setup(String),

    #[error("Failed to read/write study data: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse study data: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to parse config TOML: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("Failed to serialize config TOML: {0}")]
    TomlSer(#[from] toml::ser::Error),
}

impl StudyError {
    /// True for errors in the fatal-setup category.
    pub fn is_setup(&self) -> bool {
        matches!(self, StudyError::Setup(_) | StudyError::Io(_))
    }
}

pub type Result<T, E = StudyError> = std::result::Result<T, E>;
