use std::env;
use std::path::PathBuf;

use anyhow::Context;

/// Application configuration loaded from environment variables.
#[derive(Clone, Debug)]
pub struct Config {
    /// SQLite connection URL
    pub database_url: String,

    /// Path to the serialized regression artifact
    pub model_path: PathBuf,

    /// Address the HTTP server binds to
    pub bind_addr: String,

    pub max_connections: u32,
}

impl Config {
    /// Loads configuration from the environment, reading `.env` first if present.
    ///
    /// Optional environment variables:
    /// - `DATABASE_URL` (default: `sqlite://co2.db`)
    /// - `MODEL_PATH` (default: `model/co2_model.json`)
    /// - `BIND_ADDR` (default: `0.0.0.0:3000`)
    /// - `DB_MAX_CONNECTIONS` (default: `5`)
    ///
    /// # Errors
    ///
    /// Returns an error if `DB_MAX_CONNECTIONS` is not a number.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        fn env_or(key: &str, default: &str) -> String {
            env::var(key).unwrap_or_else(|_| default.to_string())
        }

        let max_connections = env_or("DB_MAX_CONNECTIONS", "5")
            .parse()
            .context("DB_MAX_CONNECTIONS must be a positive integer")?;

        Ok(Self {
            database_url: env_or("DATABASE_URL", "sqlite://co2.db"),
            model_path: PathBuf::from(env_or("MODEL_PATH", "model/co2_model.json")),
            bind_addr: env_or("BIND_ADDR", "0.0.0.0:3000"),
            max_connections,
        })
    }
}
