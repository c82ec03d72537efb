use crate::storage::UserStats;
use crate::utils::truncate_chars;
use chrono::{DateTime, Local};
use serde::Serialize;
use std::collections::VecDeque;
use std::fmt::Write;

/// Most recent inbound messages kept in memory.
pub const RECENT_CAPACITY: usize = 50;
const RECENT_MESSAGE_CHARS: usize = 200;
const RECENT_RESPONSE_CHARS: usize = 100;
/// Remembered messages listed in the `/stats` reply, newest first.
const REPORT_RECENT: usize = 5;
const REPORT_MESSAGE_CHARS: usize = 50;

/// One inbound message as remembered for the stats report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecentMessage {
    pub timestamp: DateTime<Local>,
    pub user_id: i64,
    pub user_name: String,
    pub username: Option<String>,
    pub message: String,
    pub response_sent: bool,
    pub response: Option<String>,
}

impl RecentMessage {
    pub fn new(
        timestamp: DateTime<Local>,
        user_id: i64,
        user_name: &str,
        username: Option<&str>,
        message: &str,
    ) -> Self {
        Self {
            timestamp,
            user_id,
            user_name: user_name.to_string(),
            username: username.map(str::to_string),
            message: truncate_chars(message, RECENT_MESSAGE_CHARS).to_string(),
            response_sent: false,
            response: None,
        }
    }
}

/// Process-lifetime counters. Advisory only: nothing branches on them.
#[derive(Debug, Clone, Serialize)]
pub struct BotStats {
    pub start_time: DateTime<Local>,
    pub total_messages: u64,
    pub successful_responses: u64,
    pub failed_responses: u64,
    pub audio_generations: u64,
    pub last_activity: Option<DateTime<Local>>,
    recent: VecDeque<RecentMessage>,
}

impl BotStats {
    pub fn new(start_time: DateTime<Local>) -> Self {
        Self {
            start_time,
            total_messages: 0,
            successful_responses: 0,
            failed_responses: 0,
            audio_generations: 0,
            last_activity: None,
            recent: VecDeque::with_capacity(RECENT_CAPACITY),
        }
    }

    /// Count an inbound message or command.
    pub fn record_message(&mut self, now: DateTime<Local>) {
        self.total_messages += 1;
        self.last_activity = Some(now);
    }

    /// Remember a message, evicting the oldest beyond [`RECENT_CAPACITY`].
    pub fn push_recent(&mut self, message: RecentMessage) {
        if self.recent.len() == RECENT_CAPACITY {
            self.recent.pop_front();
        }
        self.recent.push_back(message);
    }

    /// Mark the newest remembered message as answered.
    pub fn mark_last_answered(&mut self, response: &str) {
        if let Some(last) = self.recent.back_mut() {
            last.response_sent = true;
            last.response = Some(truncate_chars(response, RECENT_RESPONSE_CHARS).to_string());
        }
    }

    pub fn record_success(&mut self, voice: bool) {
        self.successful_responses += 1;
        if voice {
            self.audio_generations += 1;
        }
    }

    pub fn record_failure(&mut self) {
        self.failed_responses += 1;
    }

    pub fn recent(&self) -> &VecDeque<RecentMessage> {
        &self.recent
    }

    /// The `/stats` reply.
    pub fn report(&self, now: DateTime<Local>, stored: Option<&UserStats>) -> String {
        let uptime = now.signed_duration_since(self.start_time);
        let days = uptime.num_days();
        let hours = uptime.num_hours() - days * 24;
        let last = self.last_activity.map_or_else(
            || "N/A".to_string(),
            |t| t.format("%Y-%m-%d %H:%M:%S").to_string(),
        );

        let mut out = String::from("📊 മാവേലി ബോട്ട് സ്ഥിതിവിവരം:\n\n");
        let _ = writeln!(out, "⏱️ പ്രവർത്തന സമയം: {days} ദിവസങ്ങൾ, {hours} മണിക്കൂർ");
        let _ = writeln!(out, "📨 ആകെ സന്ദേശങ്ങൾ: {}", self.total_messages);
        let _ = writeln!(out, "✅ വിജയകരമായ മറുപടികൾ: {}", self.successful_responses);
        let _ = writeln!(out, "❌ പരാജയപ്പെട്ട മറുപടികൾ: {}", self.failed_responses);
        let _ = writeln!(out, "🎵 ഓഡിയോ സന്ദേശങ്ങൾ: {}", self.audio_generations);
        let _ = write!(out, "🕐 അവസാന പ്രവർത്തനം: {last}");

        if let Some(stored) = stored {
            let _ = write!(
                out,
                "\n\n👥 ആകെ ഉപയോക്താക്കൾ: {}\n💬 സംഭരിച്ച സംഭാഷണങ്ങൾ: {}",
                stored.total_users, stored.total_conversations
            );
        }

        if !self.recent().is_empty() {
            out.push_str("\n\n🗨️ സമീപകാല സന്ദേശങ്ങൾ:");
            for entry in self.recent().iter().rev().take(REPORT_RECENT) {
                let mark = if entry.response_sent { "✅" } else { "⏳" };
                let _ = write!(
                    out,
                    "\n{mark} {} {}: {}",
                    entry.timestamp.format("%H:%M"),
                    entry.user_name,
                    truncate_chars(&entry.message, REPORT_MESSAGE_CHARS)
                );
            }
        }
        out
    }
}
