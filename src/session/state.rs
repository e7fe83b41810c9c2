//! Per-session state: key, saved summaries, last summary.

use std::collections::BTreeMap;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Timestamp format of summary keys (second resolution).
pub const SUMMARY_KEY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Number of input characters shown in summary history.
pub const INPUT_PREVIEW_CHARS: usize = 150;

/// One saved summary.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryRecord {
    /// Article text the summary was generated from.
    pub input: String,
    /// Generated summary.
    pub output: String,
}

impl SummaryRecord {
    /// Input truncated for display, followed by `...`.
    #[must_use]
    pub fn input_preview(&self) -> String {
        let head: String = self.input.chars().take(INPUT_PREVIEW_CHARS).collect();
        format!("{head}...")
    }
}

/// Ephemeral state of one session.
///
/// Every field has a usable default, so a fresh session can be read before
/// anything was written to it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// API key entered for this session.
    pub api_key: String,
    /// Saved summaries keyed by wall-clock timestamp.
    pub summaries: BTreeMap<String, SummaryRecord>,
    /// Most recent summary, usable as question context.
    pub last_summary: Option<String>,
    /// Successful generations in this session.
    pub interaction_count: u64,
}

impl Session {
    /// Fresh session with an optional pre-filled key.
    #[must_use]
    pub fn with_api_key(api_key: Option<&str>) -> Self {
        Self {
            api_key: api_key.unwrap_or_default().to_string(),
            ..Self::default()
        }
    }

    /// Whether a non-blank key is set.
    #[must_use]
    pub fn has_api_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    /// Key under which a summary produced at `at` is stored.
    #[must_use]
    pub fn summary_key(at: DateTime<Local>) -> String {
        at.format(SUMMARY_KEY_FORMAT).to_string()
    }

    /// Save a summary under `timestamp` and make it the last summary.
    ///
    /// Two summaries saved within the same second share a key; the later one
    /// replaces the earlier.
    pub fn record_summary(&mut self, timestamp: String, input: &str, output: &str) {
        self.last_summary = Some(output.to_string());
        self.summaries.insert(
            timestamp,
            SummaryRecord {
                input: input.to_string(),
                output: output.to_string(),
            },
        );
    }

    /// Count a successful generation.
    pub const fn record_interaction(&mut self) {
        self.interaction_count = self.interaction_count.saturating_add(1);
    }

    /// Saved summaries, newest first.
    pub fn saved_summaries(&self) -> impl Iterator<Item = (&String, &SummaryRecord)> {
        self.summaries.iter().rev()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_summary_roundtrip() {
        let mut session = Session::default();
        session.record_summary("2026-10-19 09:30:00".to_string(), "article", "summary");

        assert_eq!(
            session.summaries.get("2026-10-19 09:30:00"),
            Some(&SummaryRecord {
                input: "article".to_string(),
                output: "summary".to_string(),
            })
        );
        assert_eq!(session.last_summary.as_deref(), Some("summary"));
    }

    #[test]
    fn test_same_second_collision_overwrites() {
        let mut session = Session::default();
        session.record_summary("2026-10-19 09:30:00".to_string(), "first", "one");
        session.record_summary("2026-10-19 09:30:00".to_string(), "second", "two");

        assert_eq!(session.summaries.len(), 1);
        assert_eq!(session.summaries["2026-10-19 09:30:00"].input, "second");
    }

    #[test]
    fn test_saved_summaries_newest_first() {
        let mut session = Session::default();
        session.record_summary("2026-10-19 09:30:00".to_string(), "a", "1");
        session.record_summary("2026-10-19 09:31:00".to_string(), "b", "2");

        let keys: Vec<&String> = session.saved_summaries().map(|(k, _)| k).collect();
        assert_eq!(keys, ["2026-10-19 09:31:00", "2026-10-19 09:30:00"]);
    }

    #[test]
    fn test_summary_key_format() {
        let at = Local.with_ymd_and_hms(2026, 3, 7, 8, 5, 9).single();
        assert_eq!(at.map(Session::summary_key).as_deref(), Some("2026-03-07 08:05:09"));
    }

    #[test]
    fn test_input_preview() {
        let record = SummaryRecord {
            input: "x".repeat(400),
            output: String::new(),
        };
        assert_eq!(record.input_preview().chars().count(), INPUT_PREVIEW_CHARS + 3);
    }

    #[test]
    fn test_default_key() {
        assert!(!Session::with_api_key(None).has_api_key());
        assert!(Session::with_api_key(Some("abc")).has_api_key());
    }
}
