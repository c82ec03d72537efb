use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ── Top-level config ──────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path the config was read from, if any - not serialized
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
    /// Telegram Bot API token (`TELEGRAM_API_KEY`)
    #[serde(default)]
    pub telegram_api_key: Option<String>,
    /// Gemini API key (`GEMINI_API_KEY`)
    #[serde(default)]
    pub gemini_api_key: Option<String>,
    /// Telegram user id allowed to run `/stats` (`ADMIN_USER_ID`)
    #[serde(default)]
    pub admin_user_id: Option<i64>,

    #[serde(default)]
    pub model: ModelConfig,

    #[serde(default)]
    pub speech: SpeechConfig,

    #[serde(default)]
    pub knowledge: KnowledgeConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub bot: BotConfig,

    #[serde(default)]
    pub monitor: MonitorConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_path: None,
            telegram_api_key: None,
            gemini_api_key: None,
            admin_user_id: None,
            model: ModelConfig::default(),
            speech: SpeechConfig::default(),
            knowledge: KnowledgeConfig::default(),
            storage: StorageConfig::default(),
            logging: LoggingConfig::default(),
            bot: BotConfig::default(),
            monitor: MonitorConfig::default(),
        }
    }
}

/// Credentials that must be present before the bot starts.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub telegram_api_key: String,
    pub gemini_api_key: String,
}

// ── Model ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default = "default_model_name")]
    pub name: String,
    #[serde(default = "default_model_base_url")]
    pub base_url: String,
    #[serde(default = "default_model_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_model_name() -> String {
    "gemini-2.0-flash".into()
}

fn default_model_base_url() -> String {
    "https://generativelanguage.googleapis.com".into()
}

fn default_model_timeout_secs() -> u64 {
    60
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: default_model_name(),
            base_url: default_model_base_url(),
            timeout_secs: default_model_timeout_secs(),
        }
    }
}

// ── Speech ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechConfig {
    /// Send voice replies (default: true). Text-only when false.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// TTS language code (default: "ml")
    #[serde(default = "default_speech_language")]
    pub language: String,
    /// Slower speaking rate for a deeper voice (default: true)
    #[serde(default = "default_true")]
    pub slow: bool,
    #[serde(default = "default_speech_base_url")]
    pub base_url: String,
    #[serde(default = "default_remote_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_speech_language() -> String {
    "ml".into()
}

fn default_speech_base_url() -> String {
    "https://translate.google.com.au".into()
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            language: default_speech_language(),
            slow: true,
            base_url: default_speech_base_url(),
            timeout_secs: default_remote_timeout_secs(),
        }
    }
}

// ── Knowledge ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Primary-language encyclopedia (default: Malayalam Wikipedia)
    #[serde(default = "default_primary_wiki")]
    pub primary_base_url: String,
    /// Secondary-language encyclopedia (default: English Wikipedia)
    #[serde(default = "default_secondary_wiki")]
    pub secondary_base_url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_remote_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_primary_wiki() -> String {
    "https://ml.wikipedia.org".into()
}

fn default_secondary_wiki() -> String {
    "https://en.wikipedia.org".into()
}

fn default_user_agent() -> String {
    concat!("MaveliBot/", env!("CARGO_PKG_VERSION")).into()
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            primary_base_url: default_primary_wiki(),
            secondary_base_url: default_secondary_wiki(),
            user_agent: default_user_agent(),
            timeout_secs: default_remote_timeout_secs(),
        }
    }
}

// ── Storage ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
}

fn default_database_path() -> PathBuf {
    PathBuf::from("maveli.db")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

// ── Logging ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Line-oriented log file read by `maveli monitor`
    #[serde(default = "default_log_file")]
    pub file: PathBuf,
    /// Default filter when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_file() -> PathBuf {
    PathBuf::from("bot.log")
}

fn default_log_level() -> String {
    "info".into()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file: default_log_file(),
            level: default_log_level(),
        }
    }
}

// ── Bot ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    /// Upper bound on reply generation for a single turn
    #[serde(default = "default_turn_timeout_secs")]
    pub turn_timeout_secs: u64,
    /// Prior turns spliced into the prompt
    #[serde(default = "default_history_turns")]
    pub history_turns: u32,
    /// Replace the bundled persona script with this file
    #[serde(default)]
    pub persona_file: Option<PathBuf>,
    #[serde(default = "default_telegram_base_url")]
    pub telegram_base_url: String,
}

fn default_turn_timeout_secs() -> u64 {
    150
}

fn default_history_turns() -> u32 {
    3
}

fn default_telegram_base_url() -> String {
    "https://api.telegram.org".into()
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            turn_timeout_secs: default_turn_timeout_secs(),
            history_turns: default_history_turns(),
            persona_file: None,
            telegram_base_url: default_telegram_base_url(),
        }
    }
}

// ── Monitor ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    #[serde(default = "default_monitor_host")]
    pub host: String,
    #[serde(default = "default_monitor_port")]
    pub port: u16,
    /// How many trailing log lines feed the statistics
    #[serde(default = "default_log_tail_lines")]
    pub log_tail_lines: usize,
}

fn default_monitor_host() -> String {
    "127.0.0.1".into()
}

fn default_monitor_port() -> u16 {
    8501
}

fn default_log_tail_lines() -> usize {
    1000
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            host: default_monitor_host(),
            port: default_monitor_port(),
            log_tail_lines: default_log_tail_lines(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_remote_timeout_secs() -> u64 {
    30
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.model.name, "gemini-2.0-flash");
        assert_eq!(config.speech.language, "ml");
        assert!(config.speech.slow);
        assert_eq!(config.bot.history_turns, 3);
        assert_eq!(config.storage.database_path, PathBuf::from("maveli.db"));
        assert_eq!(config.logging.file, PathBuf::from("bot.log"));
        assert!(config.telegram_api_key.is_none());
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let config: Config = toml::from_str(
            r#"
            admin_user_id = 42

            [speech]
            enabled = false

            [monitor]
            port = 9000
            "#,
        )
        .unwrap();

        assert_eq!(config.admin_user_id, Some(42));
        assert!(!config.speech.enabled);
        assert_eq!(config.speech.language, "ml");
        assert_eq!(config.monitor.port, 9000);
        assert_eq!(config.monitor.host, "127.0.0.1");
    }

    #[test]
    fn user_agent_carries_version() {
        let config = KnowledgeConfig::default();
        assert!(config.user_agent.starts_with("MaveliBot/"));
    }
}
