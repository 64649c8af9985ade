//! Shared types for logcascade
//!
//! This crate contains the value types used across the filter compiler,
//! the ingestion layer and the command line driver.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Severity
// ============================================================================

/// Log severity level
///
/// A fixed, totally ordered enumeration. Numeric severities are floored onto
/// it with [`Level::from_numeric`].
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    #[default]
    NotSet,
    Debug,
    Info,
    #[serde(alias = "warn")]
    Warning,
    Error,
    #[serde(alias = "fatal")]
    Critical,
}

impl Level {
    /// All levels in ascending order
    pub const ALL: [Level; 6] = [
        Self::NotSet,
        Self::Debug,
        Self::Info,
        Self::Warning,
        Self::Error,
        Self::Critical,
    ];

    /// Numeric value of this level
    pub fn value(&self) -> i64 {
        match self {
            Self::NotSet => 0,
            Self::Debug => 10,
            Self::Info => 20,
            Self::Warning => 30,
            Self::Error => 40,
            Self::Critical => 50,
        }
    }

    /// Map a numeric severity down to the nearest level at or below it
    ///
    /// Severities below every level map to `NotSet`.
    pub fn from_numeric(severity: i64) -> Self {
        Self::ALL
            .iter()
            .rev()
            .find(|level| level.value() <= severity)
            .copied()
            .unwrap_or(Self::NotSet)
    }

    /// Upper-case display name
    pub fn name(&self) -> &'static str {
        match self {
            Self::NotSet => "NOTSET",
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
            Self::Critical => "CRITICAL",
        }
    }

    /// Lower-case token used in class names
    pub fn css_name(&self) -> &'static str {
        match self {
            Self::NotSet => "notset",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Critical => "critical",
        }
    }

    /// Position of this level in [`Level::ALL`]
    pub fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when a level name is not recognised
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown log level '{0}'")]
pub struct ParseLevelError(pub String);

impl FromStr for Level {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(severity) = trimmed.parse::<i64>() {
            return Ok(Self::from_numeric(severity));
        }

        match trimmed.to_lowercase().as_str() {
            "notset" | "trace" | "trc" => Ok(Self::NotSet),
            "debug" | "dbg" => Ok(Self::Debug),
            "info" | "inf" | "information" => Ok(Self::Info),
            "warning" | "warn" | "wrn" => Ok(Self::Warning),
            "error" | "err" => Ok(Self::Error),
            "critical" | "crit" | "fatal" => Ok(Self::Critical),
            _ => Err(ParseLevelError(trimmed.to_string())),
        }
    }
}

// ============================================================================
// Directives
// ============================================================================

/// A user's visibility choice for one (logger, level) pair
///
/// `Show` is absolute over the whole subtree. `Hide` hides the logger and
/// every descendant that has no directive of its own. The weak variants only
/// ever affect the logger they are set on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Directive {
    #[serde(rename = "show")]
    Show,
    #[serde(rename = "show_weak")]
    WeakShow,
    #[serde(rename = "hide")]
    Hide,
    #[serde(rename = "hide_weak")]
    WeakHide,
}

impl Directive {
    /// All directives in control-panel order
    pub const ALL: [Directive; 4] = [Self::Show, Self::WeakShow, Self::Hide, Self::WeakHide];

    /// Token used in directive class names
    pub fn token(&self) -> &'static str {
        match self {
            Self::Show => "show",
            Self::WeakShow => "show_weak",
            Self::Hide => "hide",
            Self::WeakHide => "hide_weak",
        }
    }

    /// Human readable label for the control panel
    pub fn label(&self) -> &'static str {
        match self {
            Self::Show => "Show",
            Self::WeakShow => "Weak show",
            Self::Hide => "Hide",
            Self::WeakHide => "Weak hide",
        }
    }

    /// Whether this directive suppresses its own logger's rows
    pub fn is_hiding(&self) -> bool {
        matches!(self, Self::Hide | Self::WeakHide)
    }
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Error returned when a directive token is not recognised
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown filter directive '{0}'")]
pub struct ParseDirectiveError(pub String);

impl FromStr for Directive {
    type Err = ParseDirectiveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "show" => Ok(Self::Show),
            "show_weak" | "weak_show" | "weakshow" => Ok(Self::WeakShow),
            "hide" => Ok(Self::Hide),
            "hide_weak" | "weak_hide" | "weakhide" => Ok(Self::WeakHide),
            _ => Err(ParseDirectiveError(s.trim().to_string())),
        }
    }
}

// ============================================================================
// Logger paths and records
// ============================================================================

/// A dotted logger name split into its non-empty segments
#[derive(Clone, Debug, PartialEq, Eq, Hash, Default)]
pub struct LoggerPath {
    segments: Vec<String>,
}

impl LoggerPath {
    /// Split a dotted logger name, skipping empty segments
    pub fn parse(name: &str) -> Self {
        Self {
            segments: name
                .split('.')
                .filter(|segment| !segment.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// `app.db.pool`
    pub fn dotted(&self) -> String {
        self.segments.join(".")
    }

    /// `app-db-pool`, the form used in class names
    pub fn dashed(&self) -> String {
        dashed_path(self.segments.iter().map(String::as_str))
    }
}

/// Join segments with `-` for use in class names
///
/// A `_` inside a segment becomes `__` and a `-` becomes `_2d`, so distinct
/// paths never share a dashed form: `a.b` is `a-b` while `a-b` is `a_2db`.
pub fn dashed_path<'a>(segments: impl IntoIterator<Item = &'a str>) -> String {
    let mut dashed = String::new();
    for (i, segment) in segments.into_iter().enumerate() {
        if i > 0 {
            dashed.push('-');
        }
        for c in segment.chars() {
            match c {
                '_' => dashed.push_str("__"),
                '-' => dashed.push_str("_2d"),
                c => dashed.push(c),
            }
        }
    }
    dashed
}

impl<S: Into<String>> FromIterator<S> for LoggerPath {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            segments: iter
                .into_iter()
                .map(Into::into)
                .filter(|segment: &String| !segment.is_empty())
                .collect(),
        }
    }
}

impl fmt::Display for LoggerPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.dotted())
    }
}

/// A single log record as delivered by ingestion
#[derive(Clone, Debug)]
pub struct LogRecord {
    /// Log message
    pub message: String,

    /// Numeric severity as emitted by the producer
    pub levelno: i64,

    /// Dotted logger name
    pub logger: String,

    /// Source file (if known)
    pub pathname: Option<String>,

    /// Source line (if known)
    pub lineno: Option<u32>,

    /// Record timestamp (if known)
    pub timestamp: Option<DateTime<Utc>>,
}

impl LogRecord {
    /// Create a record with no source location or timestamp
    pub fn new(logger: impl Into<String>, levelno: i64, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            levelno,
            logger: logger.into(),
            pathname: None,
            lineno: None,
            timestamp: None,
        }
    }

    /// Severity mapped onto the enumeration
    pub fn level(&self) -> Level {
        Level::from_numeric(self.levelno)
    }

    pub fn path(&self) -> LoggerPath {
        LoggerPath::parse(&self.logger)
    }

    /// `file.py:42` style source location
    pub fn location(&self) -> Option<String> {
        let pathname = self.pathname.as_deref()?;
        Some(match self.lineno {
            Some(line) => format!("{}:{}", pathname, line),
            None => pathname.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_from_numeric_floors() {
        assert_eq!(Level::from_numeric(0), Level::NotSet);
        assert_eq!(Level::from_numeric(15), Level::Debug);
        assert_eq!(Level::from_numeric(30), Level::Warning);
        assert_eq!(Level::from_numeric(39), Level::Warning);
        assert_eq!(Level::from_numeric(1000), Level::Critical);
    }

    #[test]
    fn test_level_below_range_is_notset() {
        assert_eq!(Level::from_numeric(-5), Level::NotSet);
        assert_eq!(Level::from_numeric(i64::MIN), Level::NotSet);
    }

    #[test]
    fn test_level_parse_names_and_numbers() {
        assert_eq!("warn".parse::<Level>(), Ok(Level::Warning));
        assert_eq!("CRITICAL".parse::<Level>(), Ok(Level::Critical));
        assert_eq!("25".parse::<Level>(), Ok(Level::Info));
        assert!("verbose".parse::<Level>().is_err());
    }

    #[test]
    fn test_level_ordering_and_index() {
        assert!(Level::Debug < Level::Info);
        for (i, level) in Level::ALL.iter().enumerate() {
            assert_eq!(level.index(), i);
        }
    }

    #[test]
    fn test_directive_tokens_parse_back() {
        for directive in Directive::ALL {
            assert_eq!(directive.token().parse::<Directive>(), Ok(directive));
        }
        assert!("maybe".parse::<Directive>().is_err());
    }

    #[test]
    fn test_logger_path_skips_empty_segments() {
        let path = LoggerPath::parse("app..db.");
        assert_eq!(path.segments(), ["app", "db"]);
        assert_eq!(path.dotted(), "app.db");
        assert_eq!(path.dashed(), "app-db");
        assert!(LoggerPath::parse("").is_empty());
    }

    #[test]
    fn test_dashed_form_keeps_paths_apart() {
        assert_eq!(LoggerPath::parse("a.b").dashed(), "a-b");
        assert_eq!(LoggerPath::parse("a-b").dashed(), "a_2db");
        assert_eq!(LoggerPath::parse("my_app.db").dashed(), "my__app-db");
        assert_ne!(
            LoggerPath::parse("a_2d").dashed(),
            LoggerPath::parse("a-").dashed()
        );
        assert_ne!(
            LoggerPath::parse("a-.b").dashed(),
            LoggerPath::parse("a.-b").dashed()
        );
    }

    #[test]
    fn test_record_level_and_location() {
        let mut record = LogRecord::new("app.db", 35, "slow query");
        assert_eq!(record.level(), Level::Warning);
        assert_eq!(record.location(), None);

        record.pathname = Some("db.py".to_string());
        record.lineno = Some(12);
        assert_eq!(record.location().as_deref(), Some("db.py:12"));
    }
}
