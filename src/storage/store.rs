use super::types::{DailyStats, HistoryEntry, RecentConversation, User, UserStats};
use crate::error::StorageError;
use crate::persona::{BOT_LABEL, HISTORY_HEADER, USER_LABEL};
use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use sqlx::Row;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteRow,
};
use std::path::Path;

/// SQLite-backed persistence for users and conversation turns.
///
/// Every public operation except `connect`/`new` swallows storage errors:
/// it logs them and returns a safe value, so the turn pipeline never fails
/// because the database did.
pub struct ConversationStore {
    pool: SqlitePool,
}

const SCHEMA_META_TABLE: &str = "
CREATE TABLE IF NOT EXISTS schema_meta (
    key   TEXT PRIMARY KEY,
    value TEXT NOT NULL
)";
const SCHEMA_VERSION_KEY: &str = "maveli_schema_version";
const SCHEMA_VERSION: u32 = 1;

/// Stamp or check the schema version.
///
/// A database written by the earlier deployment has the same tables but no
/// version row; it is adopted as version 1.
async fn ensure_schema_version(pool: &SqlitePool) -> Result<()> {
    sqlx::query(SCHEMA_META_TABLE)
        .execute(pool)
        .await
        .context("create schema_meta table")?;

    let stored_version: Option<(String,)> =
        sqlx::query_as("SELECT value FROM schema_meta WHERE key = $1")
            .bind(SCHEMA_VERSION_KEY)
            .fetch_optional(pool)
            .await
            .context("load schema version")?;

    if let Some((value,)) = stored_version {
        let parsed = value
            .parse::<u32>()
            .with_context(|| format!("invalid schema version value: {value}"))?;
        anyhow::ensure!(
            parsed == SCHEMA_VERSION,
            "incompatible schema version: stored={parsed}, expected={SCHEMA_VERSION}"
        );
        return Ok(());
    }

    let legacy_table_count: (i64,) = sqlx::query_as(
        "SELECT COUNT(*)
         FROM sqlite_master
         WHERE type = 'table'
           AND name IN ('users', 'conversations', 'bot_stats')",
    )
    .fetch_one(pool)
    .await
    .context("detect existing tables")?;

    if legacy_table_count.0 > 0 {
        tracing::info!(
            "Adopting existing database ({} tables) as schema version {SCHEMA_VERSION}",
            legacy_table_count.0
        );
    }

    sqlx::query("INSERT INTO schema_meta (key, value) VALUES ($1, $2)")
        .bind(SCHEMA_VERSION_KEY)
        .bind(SCHEMA_VERSION.to_string())
        .execute(pool)
        .await
        .context("persist schema version")?;

    Ok(())
}

async fn create_tables(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS users (
             id            INTEGER PRIMARY KEY,
             username      TEXT,
             first_name    TEXT,
             last_name     TEXT,
             created_at    TEXT NOT NULL,
             last_seen     TEXT NOT NULL,
             message_count INTEGER NOT NULL DEFAULT 0,
             is_active     INTEGER NOT NULL DEFAULT 1
         )",
    )
    .execute(pool)
    .await
    .context("create users table")?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS conversations (
             id                INTEGER PRIMARY KEY AUTOINCREMENT,
             user_id           INTEGER NOT NULL,
             user_message      TEXT NOT NULL,
             bot_response      TEXT NOT NULL,
             timestamp         TEXT NOT NULL,
             response_time_ms  INTEGER,
             audio_generated   INTEGER NOT NULL DEFAULT 0,
             language_detected TEXT
         )",
    )
    .execute(pool)
    .await
    .context("create conversations table")?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_conversations_user_time
             ON conversations(user_id, timestamp)",
    )
    .execute(pool)
    .await
    .context("create conversations index")?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS bot_stats (
             id                   INTEGER PRIMARY KEY AUTOINCREMENT,
             date                 TEXT NOT NULL,
             total_messages       INTEGER NOT NULL DEFAULT 0,
             successful_responses INTEGER NOT NULL DEFAULT 0,
             failed_responses     INTEGER NOT NULL DEFAULT 0,
             audio_generations    INTEGER NOT NULL DEFAULT 0,
             unique_users         INTEGER NOT NULL DEFAULT 0
         )",
    )
    .execute(pool)
    .await
    .context("create bot_stats table")?;

    sqlx::query("CREATE UNIQUE INDEX IF NOT EXISTS idx_bot_stats_date ON bot_stats(date)")
        .execute(pool)
        .await
        .context("create bot_stats index")?;

    Ok(())
}

/// Fixed-width UTC timestamp, so lexical order is chronological order.
fn now_stamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Accepts RFC 3339 and the `YYYY-MM-DD HH:MM:SS[.ffffff]` form older rows use.
fn parse_stamp(raw: &str) -> Result<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .with_context(|| format!("unrecognized timestamp: {raw}"))
}

fn map_user_row(row: &SqliteRow) -> Result<User> {
    let created_at: String = row.try_get("created_at")?;
    let last_seen: String = row.try_get("last_seen")?;

    Ok(User {
        id: row.try_get("id")?,
        username: row.try_get("username")?,
        first_name: row.try_get("first_name")?,
        last_name: row.try_get("last_name")?,
        created_at: parse_stamp(&created_at)?,
        last_seen: parse_stamp(&last_seen)?,
        message_count: row.try_get("message_count")?,
        is_active: row.try_get("is_active")?,
    })
}

fn map_history_row(row: &SqliteRow) -> Result<HistoryEntry> {
    let timestamp: String = row.try_get("timestamp")?;

    Ok(HistoryEntry {
        user_message: row.try_get("user_message")?,
        bot_response: row.try_get("bot_response")?,
        timestamp: parse_stamp(&timestamp)?,
        audio_generated: row.try_get("audio_generated")?,
    })
}

fn map_recent_row(row: &SqliteRow) -> Result<RecentConversation> {
    let timestamp: String = row.try_get("timestamp")?;

    Ok(RecentConversation {
        timestamp: parse_stamp(&timestamp)?,
        user_id: row.try_get("user_id")?,
        user_name: row.try_get("user_name")?,
        message: row.try_get("user_message")?,
        response: row.try_get("bot_response")?,
        audio_generated: row.try_get("audio_generated")?,
    })
}

/// Render history as the transcript block spliced into prompts.
///
/// Empty history renders as an empty string.
pub fn format_transcript(history: &[HistoryEntry]) -> String {
    if history.is_empty() {
        return String::new();
    }

    let mut context = format!("\n\n{HISTORY_HEADER}\n");
    for turn in history {
        context.push_str(&format!("{USER_LABEL}: {}\n", turn.user_message));
        context.push_str(&format!("{BOT_LABEL}: {}\n\n", turn.bot_response));
    }
    context
}

fn limit_i64(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

impl ConversationStore {
    /// Open (creating if missing) the database file and run migrations.
    pub async fn connect(path: &Path) -> Result<Self, StorageError> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(|e| StorageError::Open(format!("{}: {e}", path.display())))?;

        Self::new(pool).await
    }

    /// Wrap an existing pool and run migrations.
    pub async fn new(pool: SqlitePool) -> Result<Self, StorageError> {
        ensure_schema_version(&pool)
            .await
            .map_err(|e| StorageError::Migration(format!("{e:#}")))?;
        create_tables(&pool)
            .await
            .map_err(|e| StorageError::Migration(format!("{e:#}")))?;

        Ok(Self { pool })
    }

    /// Access the underlying pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    // ── Writes ──────────────────────────────────────────────────────

    /// Create the user on first contact, otherwise refresh names and bump the count.
    pub async fn upsert_user(
        &self,
        id: i64,
        username: Option<&str>,
        first_name: Option<&str>,
        last_name: Option<&str>,
    ) -> bool {
        let result = sqlx::query(
            "INSERT INTO users (id, username, first_name, last_name, created_at, last_seen, message_count, is_active)
             VALUES ($1, $2, $3, $4, $5, $5, 1, 1)
             ON CONFLICT(id) DO UPDATE SET
                 username = excluded.username,
                 first_name = excluded.first_name,
                 last_name = excluded.last_name,
                 last_seen = excluded.last_seen,
                 message_count = users.message_count + 1",
        )
        .bind(id)
        .bind(username)
        .bind(first_name)
        .bind(last_name)
        .bind(now_stamp())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => true,
            Err(e) => {
                tracing::error!("Database error creating/updating user {id}: {e}");
                false
            }
        }
    }

    pub async fn save_turn(
        &self,
        user_id: i64,
        user_message: &str,
        bot_response: &str,
        latency_ms: Option<i64>,
        audio_generated: bool,
        language_tag: Option<&str>,
    ) -> bool {
        let result = sqlx::query(
            "INSERT INTO conversations
                 (user_id, user_message, bot_response, timestamp, response_time_ms, audio_generated, language_detected)
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(user_id)
        .bind(user_message)
        .bind(bot_response)
        .bind(now_stamp())
        .bind(latency_ms)
        .bind(audio_generated)
        .bind(language_tag)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => true,
            Err(e) => {
                tracing::error!("Database error saving conversation for user {user_id}: {e}");
                false
            }
        }
    }

    /// Roll one day's turns up into `bot_stats`.
    ///
    /// Failures never reach storage, so `failed_responses` is recorded as 0 and
    /// every stored turn counts as both a message and a successful response.
    pub async fn record_daily_rollup(&self, date: NaiveDate) -> Option<DailyStats> {
        match self.try_record_daily_rollup(date).await {
            Ok(stats) => Some(stats),
            Err(e) => {
                tracing::error!("Database error recording daily rollup for {date}: {e:#}");
                None
            }
        }
    }

    async fn try_record_daily_rollup(&self, date: NaiveDate) -> Result<DailyStats> {
        let day = date.format("%Y-%m-%d").to_string();

        let row = sqlx::query(
            "SELECT COUNT(*) AS turns,
                    COALESCE(SUM(audio_generated), 0) AS audio,
                    COUNT(DISTINCT user_id) AS users
             FROM conversations
             WHERE substr(timestamp, 1, 10) = $1",
        )
        .bind(&day)
        .fetch_one(&self.pool)
        .await
        .context("aggregate conversations for day")?;

        let stats = DailyStats {
            date,
            total_messages: row.try_get("turns")?,
            successful_responses: row.try_get("turns")?,
            failed_responses: 0,
            audio_generations: row.try_get("audio")?,
            unique_users: row.try_get("users")?,
        };

        sqlx::query(
            "INSERT INTO bot_stats
                 (date, total_messages, successful_responses, failed_responses, audio_generations, unique_users)
             VALUES ($1, $2, $3, $4, $5, $6)
             ON CONFLICT(date) DO UPDATE SET
                 total_messages = excluded.total_messages,
                 successful_responses = excluded.successful_responses,
                 failed_responses = excluded.failed_responses,
                 audio_generations = excluded.audio_generations,
                 unique_users = excluded.unique_users",
        )
        .bind(&day)
        .bind(stats.total_messages)
        .bind(stats.successful_responses)
        .bind(stats.failed_responses)
        .bind(stats.audio_generations)
        .bind(stats.unique_users)
        .execute(&self.pool)
        .await
        .context("upsert bot_stats row")?;

        Ok(stats)
    }

    // ── Reads ───────────────────────────────────────────────────────

    pub async fn get_user(&self, id: i64) -> Option<User> {
        self.try_get_user(id).await.unwrap_or_else(|e| {
            tracing::error!("Database error loading user {id}: {e:#}");
            None
        })
    }

    async fn try_get_user(&self, id: i64) -> Result<Option<User>> {
        let row = sqlx::query(
            "SELECT id, username, first_name, last_name, created_at, last_seen, message_count, is_active
             FROM users
             WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("load user")?;

        row.map(|r| map_user_row(&r)).transpose()
    }

    /// The most recent `limit` turns of one user, oldest first.
    pub async fn get_history(&self, user_id: i64, limit: usize) -> Vec<HistoryEntry> {
        self.try_get_history(user_id, limit)
            .await
            .unwrap_or_else(|e| {
                tracing::error!(
                    "Database error getting conversation history for user {user_id}: {e:#}"
                );
                Vec::new()
            })
    }

    async fn try_get_history(&self, user_id: i64, limit: usize) -> Result<Vec<HistoryEntry>> {
        let rows = sqlx::query(
            "SELECT user_message, bot_response, timestamp, audio_generated
             FROM conversations
             WHERE user_id = $1
             ORDER BY timestamp DESC, id DESC
             LIMIT $2",
        )
        .bind(user_id)
        .bind(limit_i64(limit))
        .fetch_all(&self.pool)
        .await
        .context("load conversation history")?;

        let mut history = rows
            .iter()
            .map(map_history_row)
            .collect::<Result<Vec<_>>>()?;
        history.reverse();
        Ok(history)
    }

    /// Transcript block of the user's recent turns; empty when there are none.
    pub async fn get_formatted_context(&self, user_id: i64, limit: usize) -> String {
        format_transcript(&self.get_history(user_id, limit).await)
    }

    /// Latest turns across all users, newest first.
    pub async fn get_recent_turns_across_users(&self, limit: usize) -> Vec<RecentConversation> {
        self.try_get_recent_turns(limit).await.unwrap_or_else(|e| {
            tracing::error!("Database error getting recent conversations: {e:#}");
            Vec::new()
        })
    }

    async fn try_get_recent_turns(&self, limit: usize) -> Result<Vec<RecentConversation>> {
        let rows = sqlx::query(
            "SELECT c.timestamp, c.user_id, c.user_message, c.bot_response, c.audio_generated,
                    COALESCE(u.first_name, 'Unknown') AS user_name
             FROM conversations c
             LEFT JOIN users u ON u.id = c.user_id
             ORDER BY c.timestamp DESC, c.id DESC
             LIMIT $1",
        )
        .bind(limit_i64(limit))
        .fetch_all(&self.pool)
        .await
        .context("load recent conversations")?;

        rows.iter().map(map_recent_row).collect()
    }

    pub async fn get_aggregate_user_stats(&self) -> UserStats {
        self.try_get_aggregate_user_stats()
            .await
            .unwrap_or_else(|e| {
                tracing::error!("Database error getting user stats: {e:#}");
                UserStats::default()
            })
    }

    async fn try_get_aggregate_user_stats(&self) -> Result<UserStats> {
        let row = sqlx::query(
            "SELECT
                 (SELECT COUNT(*) FROM users) AS total_users,
                 (SELECT COUNT(*) FROM users WHERE is_active = 1) AS active_users,
                 (SELECT COUNT(*) FROM conversations) AS total_conversations,
                 (SELECT COUNT(*) FROM conversations WHERE audio_generated = 1) AS total_audio",
        )
        .fetch_one(&self.pool)
        .await
        .context("aggregate user stats")?;

        Ok(UserStats {
            total_users: row.try_get("total_users")?,
            active_users: row.try_get("active_users")?,
            total_conversations: row.try_get("total_conversations")?,
            total_audio_messages: row.try_get("total_audio")?,
        })
    }

    pub async fn get_daily_stats(&self, date: NaiveDate) -> Option<DailyStats> {
        self.try_get_daily_stats(date).await.unwrap_or_else(|e| {
            tracing::error!("Database error loading daily stats for {date}: {e:#}");
            None
        })
    }

    async fn try_get_daily_stats(&self, date: NaiveDate) -> Result<Option<DailyStats>> {
        let row = sqlx::query(
            "SELECT total_messages, successful_responses, failed_responses, audio_generations, unique_users
             FROM bot_stats
             WHERE date = $1",
        )
        .bind(date.format("%Y-%m-%d").to_string())
        .fetch_optional(&self.pool)
        .await
        .context("load daily stats")?;

        let Some(row) = row else {
            return Ok(None);
        };

        Ok(Some(DailyStats {
            date,
            total_messages: row.try_get("total_messages")?,
            successful_responses: row.try_get("successful_responses")?,
            failed_responses: row.try_get("failed_responses")?,
            audio_generations: row.try_get("audio_generations")?,
            unique_users: row.try_get("unique_users")?,
        }))
    }
}
