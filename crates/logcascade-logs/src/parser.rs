use std::sync::LazyLock;

use chrono::{DateTime, NaiveDateTime, Utc};
use regex::Regex;
use serde_json::{Map, Value};

use logcascade_types::{Level, LogRecord};

/// Logger name used when a line carries none
pub const ROOT_LOGGER: &str = "root";

/// `WARNING:app.db:slow query`, Python's `basicConfig` format
static BASIC_FORMAT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<level>[A-Za-z]+|\d+):(?P<logger>[^:\s]*):(?P<message>.*)$")
        .expect("valid regex")
});

/// `2024-01-15 10:30:00,123 WARNING app.db: slow query`
static TIMESTAMPED_FORMAT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^(?P<ts>\d{4}-\d{2}-\d{2}[T ]\d{2}:\d{2}:\d{2}(?:[.,]\d+)?(?:Z|[+-]\d{2}:?\d{2})?)",
        r"\s+\[?(?P<level>[A-Za-z]+|\d+)\]?",
        r"\s+(?P<logger>[\w.\-]+):?",
        r"(?:\s+-)?\s+(?P<message>.*)$",
    ))
    .expect("valid regex")
});

/// Log parser for turning raw lines into records
pub struct RecordParser;

impl RecordParser {
    /// Parse a raw line into a LogRecord
    ///
    /// Lines in no known format become `root` records at `NOTSET` carrying
    /// the whole line as message.
    pub fn parse(raw: &str) -> LogRecord {
        let trimmed = raw.trim_end_matches(['\r', '\n']);

        if let Some(record) = Self::try_parse_json(trimmed) {
            return record;
        }
        if let Some(record) = Self::try_parse_timestamped(trimmed) {
            return record;
        }
        if let Some(record) = Self::try_parse_basic(trimmed) {
            return record;
        }

        tracing::trace!(line = trimmed, "unrecognised log line format");
        LogRecord::new(ROOT_LOGGER, Level::NotSet.value(), trimmed)
    }

    /// Try to parse a JSON object line
    fn try_parse_json(content: &str) -> Option<LogRecord> {
        let trimmed = content.trim();
        if !trimmed.starts_with('{') {
            return None;
        }

        let value: Value = serde_json::from_str(trimmed).ok()?;
        let fields = value.as_object()?;

        let logger = string_field(fields, &["name", "logger", "logger_name"])
            .filter(|name| !name.is_empty())
            .unwrap_or(ROOT_LOGGER);
        let message = string_field(fields, &["msg", "message"]).unwrap_or_default();

        let mut record = LogRecord::new(logger, Self::extract_levelno(fields), message);
        record.pathname = string_field(fields, &["pathname", "filename"]).map(str::to_string);
        record.lineno = fields
            .get("lineno")
            .and_then(Value::as_u64)
            .and_then(|line| u32::try_from(line).ok());
        record.timestamp = Self::extract_timestamp(fields);
        Some(record)
    }

    /// Extract a numeric severity from JSON fields
    fn extract_levelno(fields: &Map<String, Value>) -> i64 {
        if let Some(levelno) = fields.get("levelno").and_then(Value::as_i64) {
            return levelno;
        }

        for field in ["level", "levelname", "severity"] {
            match fields.get(field) {
                Some(Value::Number(n)) => {
                    if let Some(levelno) = n.as_i64() {
                        return levelno;
                    }
                }
                Some(Value::String(s)) => {
                    if let Ok(level) = s.parse::<Level>() {
                        return level.value();
                    }
                }
                _ => {}
            }
        }

        Level::NotSet.value()
    }

    /// Extract a timestamp from `created` (epoch seconds) or a text field
    fn extract_timestamp(fields: &Map<String, Value>) -> Option<DateTime<Utc>> {
        if let Some(created) = fields.get("created").and_then(Value::as_f64) {
            let secs = created.floor();
            let nanos = ((created - secs) * 1e9) as u32;
            return DateTime::from_timestamp(secs as i64, nanos);
        }
        string_field(fields, &["asctime", "timestamp", "time"]).and_then(parse_timestamp)
    }

    fn try_parse_timestamped(content: &str) -> Option<LogRecord> {
        let caps = TIMESTAMPED_FORMAT.captures(content)?;
        let level: Level = caps["level"].parse().ok()?;
        let mut record = LogRecord::new(&caps["logger"], level.value(), &caps["message"]);
        record.timestamp = parse_timestamp(&caps["ts"]);
        Some(record)
    }

    fn try_parse_basic(content: &str) -> Option<LogRecord> {
        let caps = BASIC_FORMAT.captures(content)?;
        let level: Level = caps["level"].parse().ok()?;
        let logger = match &caps["logger"] {
            "" => ROOT_LOGGER,
            name => name,
        };
        Some(LogRecord::new(logger, level.value(), &caps["message"]))
    }
}

fn string_field<'a>(fields: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .find_map(|key| fields.get(*key).and_then(Value::as_str))
}

/// Parse RFC 3339 or Python `asctime` timestamps, the latter taken as UTC
fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let normalized = text.trim().replace(',', ".");
    if let Ok(ts) = DateTime::parse_from_rfc3339(&normalized) {
        return Some(ts.with_timezone(&Utc));
    }
    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(&normalized, format).ok())
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_parse_json_record() {
        let line = r#"{"name":"app.db","levelno":30,"msg":"slow query","pathname":"db.py","lineno":42,"created":1705314600.5}"#;
        let record = RecordParser::parse(line);
        assert_eq!(record.logger, "app.db");
        assert_eq!(record.level(), Level::Warning);
        assert_eq!(record.message, "slow query");
        assert_eq!(record.location().as_deref(), Some("db.py:42"));
        let ts = record.timestamp.unwrap();
        assert_eq!(ts.timestamp(), 1705314600);
        assert_eq!(ts.timestamp_subsec_millis(), 500);
    }

    #[test]
    fn test_parse_json_level_name() {
        let line = r#"{"logger":"web","level":"error","message":"boom"}"#;
        let record = RecordParser::parse(line);
        assert_eq!(record.logger, "web");
        assert_eq!(record.levelno, 40);
    }

    #[test]
    fn test_parse_json_without_logger_is_root() {
        let record = RecordParser::parse(r#"{"msg":"hello","levelno":25}"#);
        assert_eq!(record.logger, ROOT_LOGGER);
        assert_eq!(record.level(), Level::Info);
    }

    #[test]
    fn test_parse_basic_format() {
        let record = RecordParser::parse("WARNING:app.db.pool:connection reset: retrying");
        assert_eq!(record.logger, "app.db.pool");
        assert_eq!(record.level(), Level::Warning);
        assert_eq!(record.message, "connection reset: retrying");

        let root = RecordParser::parse("INFO::started");
        assert_eq!(root.logger, ROOT_LOGGER);
    }

    #[test]
    fn test_parse_timestamped_format() {
        let record = RecordParser::parse("2024-01-15 10:30:00,123 ERROR app.http: request failed");
        assert_eq!(record.logger, "app.http");
        assert_eq!(record.level(), Level::Error);
        assert_eq!(record.message, "request failed");
        let ts = record.timestamp.unwrap();
        assert_eq!((ts.year(), ts.hour(), ts.minute()), (2024, 10, 30));

        let bracketed = RecordParser::parse("2024-01-15T10:30:00Z [warn] worker - queue full");
        assert_eq!(bracketed.logger, "worker");
        assert_eq!(bracketed.level(), Level::Warning);
        assert_eq!(bracketed.message, "queue full");
    }

    #[test]
    fn test_unknown_format_falls_back_to_root() {
        let record = RecordParser::parse("just some text");
        assert_eq!(record.logger, ROOT_LOGGER);
        assert_eq!(record.level(), Level::NotSet);
        assert_eq!(record.message, "just some text");

        let bad_level = RecordParser::parse("LOUD:app:message");
        assert_eq!(bad_level.logger, ROOT_LOGGER);
    }

    #[test]
    fn test_parse_multibyte_utf8_no_panic() {
        let record = RecordParser::parse("INFO:app:─────────╭──╮");
        assert_eq!(record.message, "─────────╭──╮");
    }
}
