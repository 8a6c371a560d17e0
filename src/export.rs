//! Flat (session, trial) records for analysis outside the tool.

use std::fs;
use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Local, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::session::study::Session;
use crate::session::trial::Trial;
use crate::store::StudyStore;

pub const EXPORT_VERSION: u32 = 1;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportRow {
    pub session_id: u64,
    pub participant_id: String,
    /// Empty until the session has started.
    pub session_start: String,
    pub status: String,
    pub trial_id: u64,
    pub keyboard_type: String,
    pub target_word: String,
    pub entered_word: String,
    /// This and the remaining fields stay empty until the trial has ended.
    pub entry_method: String,
    pub trial_start: String,
    pub trial_end: String,
    pub duration_ms: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExportData {
    pub keytrial_export_version: u32,
    pub exported_at: DateTime<Utc>,
    pub rows: Vec<ExportRow>,
}

pub fn format_timestamp<Tz>(ms: i64, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    tz.timestamp_millis_opt(ms)
        .single()
        .map(|dt| dt.format(TIMESTAMP_FORMAT).to_string())
        .unwrap_or_default()
}

pub fn row<Tz>(session: &Session, trial: &Trial, tz: &Tz) -> ExportRow
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let ended = trial.has_ended();
    let when_ended = |value: Option<String>| if ended { value.unwrap_or_default() } else { String::new() };

    ExportRow {
        session_id: session.id(),
        participant_id: session.participant_id().to_string(),
        session_start: session
            .start_timestamp()
            .filter(|_| session.has_started())
            .map(|ms| format_timestamp(ms, tz))
            .unwrap_or_default(),
        status: session.status().to_string(),
        trial_id: trial.id(),
        keyboard_type: trial.keyboard_type().to_string(),
        target_word: trial.target_word().to_string(),
        entered_word: trial.entered_word().unwrap_or_default().to_string(),
        entry_method: when_ended(trial.entry_method().map(|m| m.to_string())),
        trial_start: when_ended(trial.start_timestamp().map(|ms| format_timestamp(ms, tz))),
        trial_end: when_ended(trial.end_timestamp().map(|ms| format_timestamp(ms, tz))),
        duration_ms: when_ended(trial.duration_ms().map(|d| d.to_string())),
    }
}

/// One row per trial, sessions by id, trials by id within each session.
pub fn export_rows<Tz>(store: &dyn StudyStore, tz: &Tz) -> Result<Vec<ExportRow>>
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let mut rows = Vec::new();
    for session in store.all_sessions()? {
        for trial in store.trials_for_session(session.id())? {
            rows.push(row(&session, &trial, tz));
        }
    }
    Ok(rows)
}

pub fn export_data(store: &dyn StudyStore) -> Result<ExportData> {
    Ok(ExportData {
        keytrial_export_version: EXPORT_VERSION,
        exported_at: Utc::now(),
        rows: export_rows(store, &Local)?,
    })
}

pub fn default_file_name(now: DateTime<Local>) -> String {
    format!("KeyboardTrialData_{}.json", now.format("%Y%m%d-%H%M%S"))
}

pub fn write_export(data: &ExportData, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(data)?;
    let mut file = fs::File::create(path)?;
    file.write_all(json.as_bytes())?;
    file.sync_all()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyboard::layout::KeyboardType;
    use crate::keyboard::order::KeyboardOrder;
    use crate::session::trial::EntryMethod;
    use crate::store::json_store::JsonStore;
    use tempfile::TempDir;

    #[test]
    fn timestamps_have_millisecond_precision() {
        assert_eq!(format_timestamp(1_500, &Utc), "1970-01-01 00:00:01.500");
    }

    #[test]
    fn unstarted_and_unended_fields_are_empty() {
        let session = Session::new(4, "p9", KeyboardOrder::default());
        let trial = Trial::new(8, 4, KeyboardType::ThreeKey, "tree");
        let r = row(&session, &trial, &Utc);
        assert_eq!(r.session_start, "");
        assert_eq!(r.status, "CREATED");
        assert_eq!(r.keyboard_type, "THREE_KEY");
        assert_eq!(r.entered_word, "");
        assert_eq!(r.entry_method, "");
        assert_eq!(r.trial_start, "");
        assert_eq!(r.trial_end, "");
        assert_eq!(r.duration_ms, "");
    }

    #[test]
    fn ended_trial_fills_every_field() {
        let mut session = Session::new(4, "p9", KeyboardOrder::default());
        session.start(0).unwrap();
        let mut trial = Trial::new(8, 4, KeyboardType::NineKey, "tree");
        trial.start(1_000).unwrap();
        trial
            .end(EntryMethod::AlternateSuggestionSelected, "trek", 2_250)
            .unwrap();
        let r = row(&session, &trial, &Utc);
        assert_eq!(r.session_start, "1970-01-01 00:00:00.000");
        assert_eq!(r.entered_word, "trek");
        assert_eq!(r.entry_method, "ALTERNATE_SUGGESTION_SELECTED");
        assert_eq!(r.trial_start, "1970-01-01 00:00:01.000");
        assert_eq!(r.trial_end, "1970-01-01 00:00:02.250");
        assert_eq!(r.duration_ms, "1250");
    }

    #[test]
    fn rows_walk_sessions_then_trials() {
        let dir = TempDir::new().unwrap();
        let mut store = JsonStore::open(dir.path()).unwrap();
        let a = Session::create(&mut store, "a", KeyboardOrder::default()).unwrap();
        let b = Session::create(&mut store, "b", KeyboardOrder::default()).unwrap();
        Trial::create(&mut store, b.id(), "two", KeyboardType::Standard).unwrap();
        Trial::create(&mut store, a.id(), "one", KeyboardType::Standard).unwrap();
        Trial::create(&mut store, a.id(), "three", KeyboardType::NineKey).unwrap();

        let rows = export_rows(&store, &Utc).unwrap();
        let words: Vec<&str> = rows.iter().map(|r| r.target_word.as_str()).collect();
        assert_eq!(words, vec!["one", "three", "two"]);
        assert_eq!(rows[2].participant_id, "b");
    }

    #[test]
    fn default_file_name_is_timestamped() {
        let now = Local.with_ymd_and_hms(2016, 10, 7, 9, 5, 3).unwrap();
        assert_eq!(default_file_name(now), "KeyboardTrialData_20161007-090503.json");
    }
}
