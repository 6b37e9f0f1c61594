use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::rc::Rc;

use crate::metrics;
use crate::storage::{KeyValueStore, StorageError};

/// Key of the persisted history record.
pub const HISTORY_KEY: &str = "coderacer-stats-history";

/// Number of sessions kept in the rolling history.
pub const MAX_HISTORY: usize = 10;

/// Everything measured about a session when it ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FinalStats {
    pub wpm: u32,
    pub accuracy: u32,
    pub lines_completed: u32,
    pub time_elapsed_secs: u64,
    pub loc_per_minute: u32,
    pub characters_per_second: u32,
    pub total_characters: u32,
    pub correct_characters: u32,
    pub mistyped_characters: u32,
}

impl FinalStats {
    pub fn into_record(self, timestamp: DateTime<Utc>) -> SessionRecord {
        SessionRecord {
            timestamp,
            wpm: self.wpm,
            accuracy: self.accuracy,
            loc_per_minute: self.loc_per_minute,
            lines_completed: self.lines_completed,
            time_elapsed_secs: self.time_elapsed_secs,
            total_characters: self.total_characters,
            correct_characters: self.correct_characters,
        }
    }
}

/// Immutable summary of one finished or pause-saved session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    pub wpm: u32,
    pub accuracy: u32,
    #[serde(rename = "locPerMinute")]
    pub loc_per_minute: u32,
    pub lines_completed: u32,
    #[serde(rename = "timeElapsed")]
    pub time_elapsed_secs: u64,
    #[serde(default)]
    pub total_characters: u32,
    #[serde(default)]
    pub correct_characters: u32,
}

/// Rolling history plus all-time aggregates, persisted as one JSON document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HistoryStore {
    /// Newest first, at most [`MAX_HISTORY`] entries.
    pub session_history: Vec<SessionRecord>,
    pub last_game_stats: Option<SessionRecord>,
    #[serde(rename = "bestWPM")]
    pub best_wpm: u32,
    pub best_accuracy: u32,
    #[serde(rename = "bestLOCPerMinute")]
    pub best_loc_per_minute: u32,
    pub total_sessions_played: u32,
    pub lifetime_lines_completed: u64,
    #[serde(rename = "lifetimeTotalTime")]
    pub lifetime_total_time_secs: u64,
    pub lifetime_total_characters: u64,
    pub lifetime_correct_characters: u64,
}

impl HistoryStore {
    /// Fold one record into the history and aggregates.
    pub fn record(&mut self, session: SessionRecord) {
        self.last_game_stats = Some(session);

        self.lifetime_lines_completed += u64::from(session.lines_completed);
        self.lifetime_total_time_secs += session.time_elapsed_secs;
        self.lifetime_total_characters += u64::from(session.total_characters);
        self.lifetime_correct_characters += u64::from(session.correct_characters);

        self.session_history.insert(0, session);
        self.session_history.truncate(MAX_HISTORY);

        self.best_wpm = self.best_wpm.max(session.wpm);
        self.best_accuracy = self.best_accuracy.max(session.accuracy);
        self.best_loc_per_minute = self.best_loc_per_minute.max(session.loc_per_minute);

        self.total_sessions_played += 1;
    }

    fn rounded_mean(&self, field: impl Fn(&SessionRecord) -> u32) -> u32 {
        let samples: Vec<f64> = self
            .session_history
            .iter()
            .map(|s| f64::from(field(s)))
            .collect();
        metrics::mean(&samples).map_or(0, |m| m.round() as u32)
    }

    pub fn average_wpm(&self) -> u32 {
        self.rounded_mean(|s| s.wpm)
    }

    pub fn average_accuracy(&self) -> u32 {
        self.rounded_mean(|s| s.accuracy)
    }

    pub fn average_loc_per_minute(&self) -> u32 {
        self.rounded_mean(|s| s.loc_per_minute)
    }

    pub fn consistency_score(&self) -> u32 {
        let wpms: Vec<f64> = self
            .session_history
            .iter()
            .map(|s| f64::from(s.wpm))
            .collect();
        metrics::consistency_score(&wpms)
    }

    pub fn lifetime_accuracy(&self) -> u32 {
        if self.lifetime_total_characters == 0 {
            return 0;
        }
        (self.lifetime_correct_characters as f64 / self.lifetime_total_characters as f64 * 100.0)
            .round() as u32
    }

    pub fn lifetime_average_loc_per_minute(&self) -> u32 {
        if self.lifetime_total_time_secs == 0 || self.lifetime_lines_completed == 0 {
            return 0;
        }
        let minutes = self.lifetime_total_time_secs as f64 / 60.0;
        (self.lifetime_lines_completed as f64 / minutes).round() as u32
    }
}

/// Owns the history and writes it through to durable storage.
pub struct StatsStore {
    history: HistoryStore,
    store: Rc<dyn KeyValueStore>,
}

impl std::fmt::Debug for StatsStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatsStore")
            .field("history", &self.history)
            .finish_non_exhaustive()
    }
}

impl StatsStore {
    /// Load the persisted history. Unreadable or corrupt data yields an empty history.
    pub fn load(store: Rc<dyn KeyValueStore>) -> Self {
        let history = match read_history(store.as_ref()) {
            Ok(history) => history.unwrap_or_default(),
            Err(e) => {
                tracing::warn!(error = %e, "failed to load stats history, starting empty");
                HistoryStore::default()
            }
        };
        Self { history, store }
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    /// Record a session and persist the whole history. Write failures are logged, not returned.
    pub fn save_session(&mut self, record: SessionRecord) {
        self.history.record(record);
        tracing::debug!(
            wpm = record.wpm,
            accuracy = record.accuracy,
            lines = record.lines_completed,
            sessions = self.history.total_sessions_played,
            "session saved"
        );
        if let Err(e) = self.persist() {
            tracing::warn!(error = %e, "failed to persist stats history");
        }
    }

    fn persist(&self) -> Result<(), StorageError> {
        let json = serde_json::to_string(&self.history)?;
        self.store.put(HISTORY_KEY, &json)
    }
}

fn read_history(store: &dyn KeyValueStore) -> Result<Option<HistoryStore>, StorageError> {
    match store.get(HISTORY_KEY)? {
        Some(json) => Ok(Some(serde_json::from_str(&json)?)),
        None => Ok(None),
    }
}
