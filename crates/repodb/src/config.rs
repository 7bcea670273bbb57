//! Connection configuration.

use tracing::Level;

/// Configuration for a [`Connection`](crate::Connection).
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// When `true`, `commit` / `roll_back` without an active transaction are
    /// logged no-ops instead of being passed to the client.
    pub lenient_transactions: bool,
    /// SQL statement logging.
    pub sql_log: SqlLogConfig,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            lenient_transactions: true,
            sql_log: SqlLogConfig::default(),
        }
    }
}

impl ConnectionConfig {
    /// Create a new configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Pass `commit` / `roll_back` through to the client even when no
    /// transaction was begun on this connection.
    pub fn strict_transactions(mut self) -> Self {
        self.lenient_transactions = false;
        self
    }

    /// Treat `commit` / `roll_back` without an active transaction as no-ops.
    pub fn lenient_transactions(mut self) -> Self {
        self.lenient_transactions = true;
        self
    }

    /// Replace the SQL logging configuration.
    pub fn sql_log(mut self, sql_log: SqlLogConfig) -> Self {
        self.sql_log = sql_log;
        self
    }

    /// Disable SQL logging.
    pub fn no_sql_log(mut self) -> Self {
        self.sql_log.enabled = false;
        self
    }
}

/// How executed statements are reported through `tracing`.
#[derive(Debug, Clone)]
pub struct SqlLogConfig {
    /// Whether statements are logged at all.
    pub enabled: bool,
    /// Tracing event level to emit at.
    pub level: Level,
    /// Truncate long SQL strings (in bytes). `None` means no truncation.
    pub max_sql_length: Option<usize>,
}

impl Default for SqlLogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: Level::DEBUG,
            max_sql_length: Some(200),
        }
    }
}

impl SqlLogConfig {
    /// Create a new logging configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the tracing event level.
    pub fn level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Set maximum SQL length to display.
    pub fn max_sql_length(mut self, len: usize) -> Self {
        self.max_sql_length = Some(len);
        self
    }

    /// Disable SQL truncation.
    pub fn no_truncate(mut self) -> Self {
        self.max_sql_length = None;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ConnectionConfig::new();
        assert!(config.lenient_transactions);
        assert!(config.sql_log.enabled);
        assert_eq!(config.sql_log.level, Level::DEBUG);
        assert_eq!(config.sql_log.max_sql_length, Some(200));
    }

    #[test]
    fn builders() {
        let config = ConnectionConfig::new()
            .strict_transactions()
            .sql_log(SqlLogConfig::new().level(Level::INFO).no_truncate());
        assert!(!config.lenient_transactions);
        assert_eq!(config.sql_log.level, Level::INFO);
        assert_eq!(config.sql_log.max_sql_length, None);

        assert!(!ConnectionConfig::new().no_sql_log().sql_log.enabled);
    }
}
