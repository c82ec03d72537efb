use super::{Config, Credentials};
use crate::error::ConfigError;
use std::fs;
use std::path::Path;

/// Picked up from the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "maveli.toml";

impl Config {
    /// Load defaults, then the config file, then `.env` and environment overrides.
    ///
    /// An explicit `path` must exist; the implicit `maveli.toml` is optional.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(explicit) => Self::from_file(explicit)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };

        if let Err(e) = dotenvy::dotenv()
            && !e.not_found()
        {
            return Err(ConfigError::Load(format!("failed to read .env: {e}")));
        }

        config.apply_env_overrides()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&contents)
            .map_err(|e| ConfigError::Load(format!("{}: {e}", path.display())))?;
        config.config_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Both credentials are required to start the bot; either missing is fatal.
    pub fn credentials(&self) -> Result<Credentials, ConfigError> {
        let telegram_api_key = non_empty(self.telegram_api_key.as_deref())
            .ok_or_else(|| ConfigError::Validation("TELEGRAM_API_KEY is not set".into()))?;
        let gemini_api_key = non_empty(self.gemini_api_key.as_deref())
            .ok_or_else(|| ConfigError::Validation("GEMINI_API_KEY is not set".into()))?;

        Ok(Credentials {
            telegram_api_key: telegram_api_key.to_string(),
            gemini_api_key: gemini_api_key.to_string(),
        })
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
