pub mod env_overrides;
pub mod loader;
pub mod schema;

#[cfg(test)]
mod test_env;

pub use schema::{
    BotConfig, Config, Credentials, KnowledgeConfig, LoggingConfig, ModelConfig, MonitorConfig,
    SpeechConfig, StorageConfig,
};
