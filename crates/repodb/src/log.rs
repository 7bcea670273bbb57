//! `tracing` helpers for statement logging.

use crate::config::SqlLogConfig;
use crate::query::CommandType;
use tracing::Level;

/// Truncate a string to at most `max_bytes` bytes, respecting char boundaries.
pub(crate) fn truncate_sql_bytes(sql: &str, max_bytes: usize) -> &str {
    if sql.len() <= max_bytes {
        return sql;
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}

fn display_sql(config: &SqlLogConfig, sql: &str) -> String {
    match config.max_sql_length {
        Some(max) if sql.len() > max => format!("{}...", truncate_sql_bytes(sql, max)),
        _ => sql.to_string(),
    }
}

/// Emit one event on `repodb.sql` describing a statement about to run.
pub(crate) fn log_statement(
    config: &SqlLogConfig,
    command: Option<CommandType>,
    sql: &str,
    param_count: usize,
    reused: bool,
) {
    if !config.enabled {
        return;
    }

    /// Dispatch a tracing event at a runtime-determined level.
    macro_rules! emit_at_level {
        ($level:expr, $($field:tt)*) => {
            match $level {
                Level::ERROR => tracing::error!($($field)*),
                Level::WARN  => tracing::warn!($($field)*),
                Level::INFO  => tracing::info!($($field)*),
                Level::DEBUG => tracing::debug!($($field)*),
                Level::TRACE => tracing::trace!($($field)*),
            }
        };
    }

    let sql = display_sql(config, sql);
    let command = command.map_or("RAW", CommandType::as_str);
    emit_at_level!(
        config.level,
        target: "repodb.sql",
        command,
        param_count,
        reused_statement = reused,
        sql = %sql,
    );
}
