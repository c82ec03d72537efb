use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

/// A chat-platform user as last seen by the bot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub message_count: i64,
    pub is_active: bool,
}

/// One stored turn, as spliced back into prompts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryEntry {
    pub user_message: String,
    pub bot_response: String,
    pub timestamp: DateTime<Utc>,
    pub audio_generated: bool,
}

/// A stored turn joined with its user's first name, for the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecentConversation {
    pub timestamp: DateTime<Utc>,
    pub user_id: i64,
    pub user_name: String,
    pub message: String,
    pub response: String,
    pub audio_generated: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UserStats {
    pub total_users: i64,
    pub active_users: i64,
    pub total_conversations: i64,
    pub total_audio_messages: i64,
}

/// One row of the `bot_stats` daily rollup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyStats {
    pub date: NaiveDate,
    pub total_messages: i64,
    pub successful_responses: i64,
    pub failed_responses: i64,
    pub audio_generations: i64,
    pub unique_users: i64,
}
