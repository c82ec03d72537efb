use super::aggregate::{ActivityStatus, LogStats};
use super::log_parser::parse_log_line;
use crate::config::Config;
use crate::storage::RecentConversation;
use crate::utils::truncate_chars;
use chrono::NaiveDateTime;
use serde::Serialize;
use std::path::Path;
use tera::{Context, Tera};

const TEMPLATE: &str = include_str!("dashboard.html");
const PAGE_RECENT_MESSAGES: usize = 10;
const PAGE_RECENT_LOGS: usize = 50;
const LOG_MESSAGE_CHARS: usize = 100;
const REFRESH_SECS: u64 = 10;

/// Which credentials were configured, without their values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CredentialFlags {
    pub telegram_api_key: bool,
    pub gemini_api_key: bool,
    pub admin_user_id: bool,
}

impl CredentialFlags {
    pub fn from_config(config: &Config) -> Self {
        let present = |v: Option<&String>| v.is_some_and(|s| !s.trim().is_empty());
        Self {
            telegram_api_key: present(config.telegram_api_key.as_ref()),
            gemini_api_key: present(config.gemini_api_key.as_ref()),
            admin_user_id: config.admin_user_id.is_some(),
        }
    }

    fn rows(self) -> [Flag; 3] {
        [
            Flag {
                name: "TELEGRAM_API_KEY",
                set: self.telegram_api_key,
            },
            Flag {
                name: "GEMINI_API_KEY",
                set: self.gemini_api_key,
            },
            Flag {
                name: "ADMIN_USER_ID",
                set: self.admin_user_id,
            },
        ]
    }
}

#[derive(Serialize)]
struct Flag {
    name: &'static str,
    set: bool,
}

#[derive(Debug, Serialize)]
struct Bar {
    label: String,
    count: usize,
    percent: usize,
}

fn bars<'a>(items: impl IntoIterator<Item = (&'a str, usize)>) -> Vec<Bar> {
    let items: Vec<_> = items.into_iter().collect();
    let max = items.iter().map(|(_, c)| *c).max().unwrap_or(0).max(1);
    items
        .into_iter()
        .map(|(label, count)| Bar {
            label: label.to_string(),
            count,
            percent: count * 100 / max,
        })
        .collect()
}

#[derive(Serialize)]
struct MessageRow {
    time: String,
    user: String,
    message: String,
}

#[derive(Serialize)]
struct LogRow {
    time: String,
    level: String,
    message: String,
}

#[derive(Serialize)]
struct ConversationRow {
    time: String,
    user: String,
    message: String,
    response: String,
    audio: bool,
}

/// Everything the dashboard page shows.
pub struct Dashboard<'a> {
    pub stats: &'a LogStats,
    /// Raw tail of the log, oldest first.
    pub lines: &'a [String],
    pub conversations: &'a [RecentConversation],
    pub credentials: CredentialFlags,
    pub log_file: &'a Path,
    pub log_file_present: bool,
    pub now: NaiveDateTime,
}

impl Dashboard<'_> {
    fn context(&self) -> Context {
        let stats = self.stats;
        let status = ActivityStatus::classify(stats.last_activity, self.now);

        let level_bars = bars([
            ("INFO", stats.info_count),
            ("WARNING", stats.warning_count),
            ("ERROR", stats.error_count),
        ]);
        let hourly_bars = bars(
            stats
                .hourly_activity
                .iter()
                .map(|(hour, count)| (hour.as_str(), *count)),
        );

        let recent_messages: Vec<MessageRow> = stats
            .recent_user_messages
            .iter()
            .rev()
            .take(PAGE_RECENT_MESSAGES)
            .map(|m| MessageRow {
                time: m.timestamp.format("%H:%M:%S").to_string(),
                user: format!("{} ({})", m.user_name, m.user_id),
                message: m.message.clone(),
            })
            .collect();

        let skip = self.lines.len().saturating_sub(PAGE_RECENT_LOGS);
        let recent_logs: Vec<LogRow> = self.lines[skip..]
            .iter()
            .filter_map(|line| parse_log_line(line))
            .map(|entry| {
                let mut message = truncate_chars(&entry.message, LOG_MESSAGE_CHARS).to_string();
                if message.len() < entry.message.len() {
                    message.push_str("...");
                }
                LogRow {
                    time: entry.timestamp.format("%H:%M:%S").to_string(),
                    level: entry.level,
                    message,
                }
            })
            .collect();

        let conversations: Vec<ConversationRow> = self
            .conversations
            .iter()
            .map(|c| ConversationRow {
                time: c.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
                user: format!("{} ({})", c.user_name, c.user_id),
                message: c.message.clone(),
                response: truncate_chars(&c.response, LOG_MESSAGE_CHARS).to_string(),
                audio: c.audio_generated,
            })
            .collect();

        let mut ctx = Context::new();
        ctx.insert("refresh_secs", &REFRESH_SECS);
        ctx.insert("status_label", status.label());
        ctx.insert("status_class", status.css_class());
        ctx.insert(
            "last_activity",
            &stats.last_activity.map_or_else(
                || "Unknown".to_string(),
                |t| t.format("%Y-%m-%d %H:%M:%S").to_string(),
            ),
        );
        ctx.insert("stats", stats);
        ctx.insert("level_bars", &level_bars);
        ctx.insert("hourly_bars", &hourly_bars);
        ctx.insert("recent_messages", &recent_messages);
        ctx.insert(
            "average_length",
            &stats
                .average_message_length
                .map_or_else(|| "0".to_string(), |avg| format!("{avg:.0}")),
        );
        ctx.insert("conversations", &conversations);
        ctx.insert("recent_logs", &recent_logs);
        ctx.insert("generated_at", &self.now.format("%Y-%m-%d %H:%M:%S").to_string());
        ctx.insert("log_file", &self.log_file.display().to_string());
        ctx.insert("log_file_present", &self.log_file_present);
        ctx.insert("credentials", &self.credentials.rows());
        ctx
    }
}

/// Render the dashboard HTML. Values are HTML-escaped.
pub fn render_page(dashboard: &Dashboard<'_>) -> anyhow::Result<String> {
    let rendered = Tera::one_off(TEMPLATE, &dashboard.context(), true)?;
    Ok(rendered)
}
