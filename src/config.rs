use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::Result;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_trials_per_keyboard")]
    pub trials_per_keyboard: u32,
    #[serde(default = "default_max_suggested_words")]
    pub max_suggested_words: usize,
    #[serde(default = "default_max_suggested_visible")]
    pub max_suggested_visible: usize,
    /// CSV of `word,frequency` lines; the bundled list is used when unset.
    #[serde(default)]
    pub dictionary_path: Option<String>,
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    /// Fixes the target word draws for reproducible runs.
    #[serde(default)]
    pub random_seed: Option<u64>,
}

fn default_trials_per_keyboard() -> u32 {
    2
}
fn default_max_suggested_words() -> usize {
    12
}
fn default_max_suggested_visible() -> usize {
    3
}
fn default_data_dir() -> String {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("keytrial")
        .to_string_lossy()
        .to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            trials_per_keyboard: default_trials_per_keyboard(),
            max_suggested_words: default_max_suggested_words(),
            max_suggested_visible: default_max_suggested_visible(),
            dictionary_path: None,
            data_dir: default_data_dir(),
            random_seed: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        if path.exists() {
            let content = fs::read_to_string(&path)?;
            let mut config: Config = toml::from_str(&content)?;
            config.validate();
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("keytrial")
            .join("config.toml")
    }

    /// Clamp counts to usable values. Call after deserialization or after
    /// applying command-line overrides.
    pub fn validate(&mut self) {
        self.trials_per_keyboard = self.trials_per_keyboard.max(1);
        self.max_suggested_words = self.max_suggested_words.max(1);
        self.max_suggested_visible = self
            .max_suggested_visible
            .clamp(1, self.max_suggested_words);
    }
}
