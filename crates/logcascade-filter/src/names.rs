//! Class naming scheme shared by the row renderer, the control panel and the
//! compiled stylesheet.
//!
//! - rows: `log-<dashed path>` and `loglevel-<level>`, with `_` and `-` inside
//!   a segment encoded as `__` and `_2d`
//! - scope element: `logfilter-<directive>-<level>[-<dashed path>]`, where an
//!   omitted path denotes the global slot

use std::borrow::Cow;
use std::fmt::Write;

use logcascade_types::{Directive, Level};

pub const LOGGER_CLASS_PREFIX: &str = "log-";
pub const LEVEL_CLASS_PREFIX: &str = "loglevel-";
pub const DIRECTIVE_CLASS_PREFIX: &str = "logfilter-";

/// Class carried by every row of a logger
pub fn logger_class(dashed_path: &str) -> String {
    format!("{}{}", LOGGER_CLASS_PREFIX, dashed_path)
}

/// Class carried by every row of a level
pub fn level_class(level: Level) -> String {
    format!("{}{}", LEVEL_CLASS_PREFIX, level.css_name())
}

/// Class toggled on the scope element for a directive
///
/// `dashed_path` is `None` for the global slot.
pub fn directive_class(directive: Directive, level: Level, dashed_path: Option<&str>) -> String {
    let mut class = format!(
        "{}{}-{}",
        DIRECTIVE_CLASS_PREFIX,
        directive.token(),
        level.css_name()
    );
    if let Some(path) = dashed_path {
        class.push('-');
        class.push_str(path);
    }
    class
}

/// A directive class split back into its parts
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DirectiveClass<'a> {
    pub directive: Directive,
    pub level: Level,
    pub dashed_path: Option<&'a str>,
}

/// Parse a `logfilter-...` class name
pub fn parse_directive_class(class: &str) -> Option<DirectiveClass<'_>> {
    let rest = class.strip_prefix(DIRECTIVE_CLASS_PREFIX)?;
    let (token, rest) = rest.split_once('-')?;
    let directive = Directive::ALL.into_iter().find(|d| d.token() == token)?;

    let (level_name, dashed_path) = match rest.split_once('-') {
        Some((level_name, path)) if !path.is_empty() => (level_name, Some(path)),
        Some(_) => return None,
        None => (rest, None),
    };
    let level = Level::ALL
        .into_iter()
        .find(|level| level.css_name() == level_name)?;

    Some(DirectiveClass {
        directive,
        level,
        dashed_path,
    })
}

/// Escape a class name for use inside a selector
///
/// Only ASCII characters outside `[A-Za-z0-9_-]` need escaping; class names
/// here always start with a letter prefix, so the leading-digit rule never
/// applies.
pub fn escape_class(class: &str) -> Cow<'_, str> {
    let needs_escape = |c: char| c.is_ascii() && !(c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if !class.chars().any(needs_escape) {
        return Cow::Borrowed(class);
    }

    let mut escaped = String::with_capacity(class.len() + 8);
    for c in class.chars() {
        if c.is_ascii_control() {
            let _ = write!(escaped, "\\{:x} ", c as u32);
        } else if needs_escape(c) {
            escaped.push('\\');
            escaped.push(c);
        } else {
            escaped.push(c);
        }
    }
    Cow::Owned(escaped)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_classes() {
        assert_eq!(logger_class("app-db"), "log-app-db");
        assert_eq!(level_class(Level::Warning), "loglevel-warning");
    }

    #[test]
    fn test_directive_class_names() {
        assert_eq!(
            directive_class(Directive::WeakHide, Level::Info, Some("app-db")),
            "logfilter-hide_weak-info-app-db"
        );
        assert_eq!(
            directive_class(Directive::Show, Level::Error, None),
            "logfilter-show-error"
        );
    }

    #[test]
    fn test_parse_directive_class() {
        let parsed = parse_directive_class("logfilter-show_weak-warning-app-db-pool").unwrap();
        assert_eq!(parsed.directive, Directive::WeakShow);
        assert_eq!(parsed.level, Level::Warning);
        assert_eq!(parsed.dashed_path, Some("app-db-pool"));

        let global = parse_directive_class("logfilter-hide-debug").unwrap();
        assert_eq!(global.directive, Directive::Hide);
        assert_eq!(global.dashed_path, None);
    }

    #[test]
    fn test_parse_rejects_malformed_classes() {
        assert!(parse_directive_class("log-app").is_none());
        assert!(parse_directive_class("logfilter-reveal-info").is_none());
        assert!(parse_directive_class("logfilter-hide-loud").is_none());
        assert!(parse_directive_class("logfilter-hide-info-").is_none());
    }

    #[test]
    fn test_escape_class() {
        assert!(matches!(escape_class("log-app_db"), Cow::Borrowed(_)));
        assert_eq!(escape_class("log-app:v2"), "log-app\\:v2");
        assert_eq!(escape_class("log-a/b c"), "log-a\\/b\\ c");
        assert_eq!(escape_class("log-ünïcode"), "log-ünïcode");
        assert_eq!(escape_class("log-\t"), "log-\\9 ");
    }
}
