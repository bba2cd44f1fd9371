// Log output: console always, plus an optional size-rotated file
use crate::config::settings::LoggingConfig;
use crate::error::{EngineError, Result};
use rolling_file::{BasicRollingFileAppender, RollingConditionBasic};
use std::fs;
use std::path::Path;

/// Parses sizes such as `10MB`, `512 KB` or `4096` (bytes) into a byte count.
pub fn parse_size(text: &str) -> Result<u64> {
    let upper = text.trim().to_ascii_uppercase();
    let split = upper
        .find(|c: char| c.is_ascii_alphabetic())
        .unwrap_or(upper.len());
    let (number, unit) = upper.split_at(split);
    let multiplier: u64 = match unit.trim() {
        "" | "B" => 1,
        "KB" => 1 << 10,
        "MB" => 1 << 20,
        "GB" => 1 << 30,
        "TB" => 1 << 40,
        _ => {
            return Err(EngineError::ConfigError(format!(
                "unknown size unit in '{}'",
                text
            )))
        }
    };
    let value: f64 = number
        .trim()
        .parse()
        .map_err(|_| EngineError::ConfigError(format!("invalid size '{}'", text)))?;
    if !value.is_finite() || value <= 0.0 {
        return Err(EngineError::ConfigError(format!(
            "size must be positive, got '{}'",
            text
        )));
    }
    Ok((value * multiplier as f64) as u64)
}

/// Opens the configured log file for appending, creating missing parent
/// directories. The file rolls over to `<file>.1 .. <file>.<backup_count>`
/// once it reaches `max_size`.
pub fn file_appender(config: &LoggingConfig, path: &Path) -> Result<BasicRollingFileAppender> {
    let max_size = parse_size(&config.max_size)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let condition = RollingConditionBasic::new().max_size(max_size);
    let appender = BasicRollingFileAppender::new(path, condition, config.backup_count)?;
    Ok(appender)
}
