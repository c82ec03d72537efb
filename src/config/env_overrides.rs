use super::Config;
use crate::error::ConfigError;
use std::path::PathBuf;

impl Config {
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(key) = std::env::var("TELEGRAM_API_KEY")
            && !key.is_empty()
        {
            self.telegram_api_key = Some(key);
        }

        if let Ok(key) = std::env::var("GEMINI_API_KEY")
            && !key.is_empty()
        {
            self.gemini_api_key = Some(key);
        }

        if let Ok(raw) = std::env::var("ADMIN_USER_ID")
            && !raw.trim().is_empty()
        {
            let id = raw.trim().parse::<i64>().map_err(|_| {
                ConfigError::Validation(format!("ADMIN_USER_ID is not a numeric user id: {raw}"))
            })?;
            self.admin_user_id = Some(id);
        }

        if let Ok(model) = std::env::var("MAVELI_MODEL")
            && !model.is_empty()
        {
            self.model.name = model;
        }

        if let Ok(path) = std::env::var("MAVELI_DB_PATH")
            && !path.is_empty()
        {
            self.storage.database_path = PathBuf::from(path);
        }

        if let Ok(path) = std::env::var("MAVELI_LOG_FILE")
            && !path.is_empty()
        {
            self.logging.file = PathBuf::from(path);
        }

        if let Ok(path) = std::env::var("MAVELI_PERSONA_FILE")
            && !path.is_empty()
        {
            self.bot.persona_file = Some(PathBuf::from(path));
        }

        Ok(())
    }
}
