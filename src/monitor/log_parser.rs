use crate::observability::log_format::{SEPARATOR, TIMESTAMP_FORMAT};
use chrono::NaiveDateTime;
use serde::Serialize;
use std::path::Path;

/// Lines read from the end of the log when no count is configured.
pub const DEFAULT_TAIL_LINES: usize = 1000;

/// One parsed log line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    pub timestamp: NaiveDateTime,
    pub logger: String,
    pub level: String,
    pub message: String,
}

/// Parse `timestamp - logger - LEVEL - message`. The message may itself
/// contain the separator; anything that does not fit the shape is `None`.
pub fn parse_log_line(line: &str) -> Option<LogEntry> {
    let mut parts = line.trim_end().splitn(4, SEPARATOR);
    let timestamp = parts.next()?;
    let logger = parts.next()?;
    let level = parts.next()?;
    let message = parts.next()?;

    let timestamp = NaiveDateTime::parse_from_str(timestamp.trim(), TIMESTAMP_FORMAT).ok()?;
    Some(LogEntry {
        timestamp,
        logger: logger.to_string(),
        level: level.to_string(),
        message: message.to_string(),
    })
}

/// The last `n` non-empty lines of `path`, trimmed. A missing file is an empty log.
pub async fn load_tail(path: &Path, n: usize) -> anyhow::Result<Vec<String>> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => {
            return Err(anyhow::Error::new(e).context(format!("read log file {}", path.display())));
        }
    };

    let text = String::from_utf8_lossy(&bytes);
    let lines: Vec<String> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();
    let skip = lines.len().saturating_sub(n);
    Ok(lines.into_iter().skip(skip).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Timelike};
    use std::io::Write;

    #[test]
    fn parses_well_formed_line() {
        let entry = parse_log_line(
            "2025-09-05 14:03:11,482 - maveli::bot - INFO - Received message from user 7 (Anu): hi...",
        )
        .unwrap();

        let expected = NaiveDate::from_ymd_opt(2025, 9, 5)
            .unwrap()
            .and_hms_milli_opt(14, 3, 11, 482)
            .unwrap();
        assert_eq!(entry.timestamp, expected);
        assert_eq!(entry.logger, "maveli::bot");
        assert_eq!(entry.level, "INFO");
        assert_eq!(entry.message, "Received message from user 7 (Anu): hi...");
    }

    #[test]
    fn message_keeps_embedded_separators() {
        let entry =
            parse_log_line("2025-09-05 14:03:11,000 - m - WARNING - a - b - c").unwrap();
        assert_eq!(entry.message, "a - b - c");
        assert_eq!(entry.timestamp.nanosecond(), 0);
    }

    #[test]
    fn rejects_short_or_undated_lines() {
        assert!(parse_log_line("").is_none());
        assert!(parse_log_line("2025-09-05 14:03:11,000 - m - INFO").is_none());
        assert!(parse_log_line("yesterday - m - INFO - hello").is_none());
        assert!(parse_log_line("2025-09-05T14:03:11Z - m - INFO - hello").is_none());
    }

    #[tokio::test]
    async fn missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let lines = load_tail(&dir.path().join("absent.log"), 10).await.unwrap();
        assert!(lines.is_empty());
    }

    #[tokio::test]
    async fn tail_keeps_last_non_empty_lines() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        for i in 1..=5 {
            writeln!(file, "line {i}").unwrap();
            writeln!(file, "   ").unwrap();
        }

        let lines = load_tail(file.path(), 3).await.unwrap();
        assert_eq!(lines, vec!["line 3", "line 4", "line 5"]);

        let all = load_tail(file.path(), DEFAULT_TAIL_LINES).await.unwrap();
        assert_eq!(all.len(), 5);
    }
}
