use serde::{Deserialize, Serialize};

use crate::session::study::Session;
use crate::session::trial::Trial;

pub const SCHEMA_VERSION: u32 = 1;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionsData {
    pub schema_version: u32,
    /// Last id handed out; ids are never reused, even after a clear.
    #[serde(default)]
    pub last_id: u64,
    pub sessions: Vec<Session>,
}

impl Default for SessionsData {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            last_id: 0,
            sessions: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TrialsData {
    pub schema_version: u32,
    #[serde(default)]
    pub last_id: u64,
    pub trials: Vec<Trial>,
}

impl Default for TrialsData {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            last_id: 0,
            trials: Vec::new(),
        }
    }
}

impl SessionsData {
    pub fn needs_reset(&self) -> bool {
        self.schema_version != SCHEMA_VERSION
    }
}

impl TrialsData {
    pub fn needs_reset(&self) -> bool {
        self.schema_version != SCHEMA_VERSION
    }
}
