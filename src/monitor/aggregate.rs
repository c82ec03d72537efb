use super::log_parser::{LogEntry, parse_log_line};
use chrono::{NaiveDateTime, TimeDelta};
use regex::Regex;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::sync::LazyLock;
use strum::Display;

const RECENT_USER_MESSAGES: usize = 20;
const RECENT_MESSAGE_CHARS: usize = 150;

static USER_MESSAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)received message from user (\d+) \(([^)]+)\): (.+)")
        .expect("user message pattern is a valid regex")
});

/// A user message recovered from a "Received message" log line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserMessageLine {
    pub timestamp: NaiveDateTime,
    pub user_id: i64,
    pub user_name: String,
    pub message: String,
}

/// Statistics derived from a window of log lines.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LogStats {
    pub total_logs: usize,
    pub info_count: usize,
    pub warning_count: usize,
    pub error_count: usize,
    pub user_messages: usize,
    pub audio_generations: usize,
    pub gemini_responses: usize,
    pub last_activity: Option<NaiveDateTime>,
    /// Parsed lines per `YYYY-MM-DD HH:00`, in time order.
    pub hourly_activity: BTreeMap<String, usize>,
    /// Newest last.
    pub recent_user_messages: Vec<UserMessageLine>,
    pub unique_users: usize,
    pub average_message_length: Option<f64>,
}

impl LogStats {
    pub fn from_lines<'a>(lines: impl IntoIterator<Item = &'a str>) -> Self {
        let mut stats = Self::default();
        for line in lines {
            stats.total_logs += 1;
            if let Some(entry) = parse_log_line(line) {
                stats.observe(&entry);
            }
        }

        let skip = stats
            .recent_user_messages
            .len()
            .saturating_sub(RECENT_USER_MESSAGES);
        stats.recent_user_messages.drain(..skip);

        let recent = &stats.recent_user_messages;
        stats.unique_users = recent
            .iter()
            .map(|m| m.user_id)
            .collect::<HashSet<_>>()
            .len();
        if !recent.is_empty() {
            let chars: usize = recent.iter().map(|m| m.message.chars().count()).sum();
            #[allow(clippy::cast_precision_loss)]
            let average = chars as f64 / recent.len() as f64;
            stats.average_message_length = Some(average);
        }
        stats
    }

    fn observe(&mut self, entry: &LogEntry) {
        match entry.level.as_str() {
            "INFO" => self.info_count += 1,
            "WARNING" => self.warning_count += 1,
            "ERROR" => self.error_count += 1,
            _ => {}
        }

        let lowered = entry.message.to_lowercase();
        if lowered.contains("received message from user") {
            self.user_messages += 1;
            if let Some(message) = user_message(entry) {
                self.recent_user_messages.push(message);
            }
        } else if lowered.contains("generated audio file") {
            self.audio_generations += 1;
        } else if lowered.contains("generated gemini response") {
            self.gemini_responses += 1;
        }

        let hour = entry.timestamp.format("%Y-%m-%d %H:00").to_string();
        *self.hourly_activity.entry(hour).or_default() += 1;

        if self.last_activity.is_none_or(|last| entry.timestamp > last) {
            self.last_activity = Some(entry.timestamp);
        }
    }
}

fn user_message(entry: &LogEntry) -> Option<UserMessageLine> {
    let caps = USER_MESSAGE.captures(&entry.message)?;
    let user_id = caps.get(1)?.as_str().parse().ok()?;
    let text = caps.get(3)?.as_str();

    let mut message: String = text.chars().take(RECENT_MESSAGE_CHARS).collect();
    if text.chars().count() > RECENT_MESSAGE_CHARS {
        message.push_str("...");
    }
    Some(UserMessageLine {
        timestamp: entry.timestamp,
        user_id,
        user_name: caps.get(2)?.as_str().to_string(),
        message,
    })
}

/// How recently the bot logged anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityStatus {
    Active,
    Slow,
    Inactive,
    Unknown,
}

impl ActivityStatus {
    pub fn classify(last_activity: Option<NaiveDateTime>, now: NaiveDateTime) -> Self {
        let Some(last) = last_activity else {
            return Self::Unknown;
        };
        let idle = now - last;
        if idle < TimeDelta::minutes(5) {
            Self::Active
        } else if idle < TimeDelta::minutes(30) {
            Self::Slow
        } else {
            Self::Inactive
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Active => "🟢 Active",
            Self::Slow => "🟡 Slow",
            Self::Inactive => "🔴 Inactive",
            Self::Unknown => "⚫ Unknown",
        }
    }

    /// CSS class of the status card.
    pub fn css_class(self) -> &'static str {
        match self {
            Self::Active => "status-good",
            Self::Slow => "status-warning",
            Self::Inactive | Self::Unknown => "status-error",
        }
    }
}
