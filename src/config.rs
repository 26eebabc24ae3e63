//! Runtime configuration.

use std::time::Duration;

use crate::session::DEFAULT_REST_INCREMENT_SECS;

pub const DEFAULT_DB_PATH: &str = "setwise.db";

/// Configuration shared by the CLI, TUI and bot.
#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite file.
    pub db_path: String,
    /// Seconds added by "+ rest".
    pub rest_increment_secs: u32,
    /// Rest timer tick period.
    pub tick_interval: Duration,
    /// How many times a finished workout is offered to storage.
    pub save_attempts: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: DEFAULT_DB_PATH.to_string(),
            rest_increment_secs: DEFAULT_REST_INCREMENT_SECS,
            tick_interval: Duration::from_secs(1),
            save_attempts: 3,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_db_path(mut self, path: impl Into<String>) -> Self {
        self.db_path = path.into();
        self
    }

    pub fn with_rest_increment(mut self, secs: u32) -> Self {
        self.rest_increment_secs = secs;
        self
    }

    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    pub fn with_save_attempts(mut self, attempts: u32) -> Self {
        self.save_attempts = attempts.max(1);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.db_path, "setwise.db");
        assert_eq!(config.rest_increment_secs, 30);
        assert_eq!(config.tick_interval, Duration::from_secs(1));
        assert_eq!(config.save_attempts, 3);
    }

    #[test]
    fn test_builder() {
        let config = Config::new()
            .with_db_path("/tmp/gym.db")
            .with_rest_increment(15)
            .with_tick_interval(Duration::from_millis(100))
            .with_save_attempts(0);
        assert_eq!(config.db_path, "/tmp/gym.db");
        assert_eq!(config.rest_increment_secs, 15);
        assert_eq!(config.tick_interval, Duration::from_millis(100));
        assert_eq!(config.save_attempts, 1);
    }
}
