// src/config.rs

use dotenvy::dotenv;
use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub rust_log: String,
    pub max_connections: u32,
    /// How long a story stays available before `expire_stories` hides it.
    pub story_retention_hours: i64,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://social.db?mode=rwc".to_string());

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let max_connections = env::var("DB_MAX_CONNECTIONS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(5);

        let story_retention_hours = env::var("STORY_RETENTION_HOURS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(24);

        Self {
            database_url,
            rust_log,
            max_connections,
            story_retention_hours,
        }
    }

    /// Single-connection in-memory database, for tests and throwaway runs.
    pub fn in_memory() -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            rust_log: "error".to_string(),
            max_connections: 1,
            story_retention_hours: 24,
        }
    }

    pub fn story_retention(&self) -> chrono::Duration {
        chrono::Duration::hours(self.story_retention_hours)
    }
}
