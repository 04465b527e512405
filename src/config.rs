//! Settings loaded from a `.env` file.
//!
//! The file is read into an explicit [`Config`] value that callers pass to
//! the components that need it; the process environment is not touched.

use anyhow::{Context, Result, anyhow, bail};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;

pub const DEFAULT_ENV_FILE: &str = ".env";

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3306;

#[derive(Clone)]
pub struct DatabaseSettings {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub database: String,
}

#[derive(Clone, Default)]
pub struct AiSettings {
    /// Empty means the analysis step is skipped
    pub api_key: String,
    pub base_url: Option<String>,
    pub model: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database: DatabaseSettings,
    pub ai: AiSettings,
}

impl Config {
    /// Load and validate the settings stored at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            bail!(
                "no .env file found at {}, run `aiexplain env` to create one",
                path.display()
            );
        }

        let entries = dotenvy::from_path_iter(path)
            .with_context(|| format!("Failed to open {}", path.display()))?;

        let mut values = HashMap::new();
        for entry in entries {
            let (key, value) =
                entry.with_context(|| format!("Failed to parse {}", path.display()))?;
            values.insert(key, value);
        }

        Self::from_values(&values)
    }

    /// Build settings from already-parsed key/value pairs.
    pub fn from_values(values: &HashMap<String, String>) -> Result<Self> {
        let get = |key: &str| {
            values
                .get(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let port = match get("port") {
            Some(port) => port
                .parse::<u16>()
                .map_err(|_| anyhow!("Invalid port '{}': expected a number", port))?,
            None => DEFAULT_PORT,
        };

        let database = DatabaseSettings {
            host: get("host").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            username: get("username").ok_or_else(|| anyhow!("'username' is not set"))?,
            // Passwords may legitimately contain surrounding spaces
            password: values.get("password").cloned().unwrap_or_default(),
            database: get("database").ok_or_else(|| anyhow!("'database' is not set"))?,
        };

        let ai = AiSettings {
            api_key: get("ai_api_key").unwrap_or_default(),
            base_url: get("ai_base_url"),
            model: get("ai_model").unwrap_or_default(),
        };

        if !ai.api_key.is_empty() && ai.model.is_empty() {
            bail!("'ai_model' must be set when 'ai_api_key' is set");
        }

        Ok(Self { database, ai })
    }
}

impl fmt::Debug for DatabaseSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("database", &self.database)
            .finish()
    }
}

impl fmt::Debug for AiSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let api_key = if self.api_key.is_empty() {
            "<unset>"
        } else {
            "<redacted>"
        };
        f.debug_struct("AiSettings")
            .field("api_key", &api_key)
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}
