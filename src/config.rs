//! Config file support
//!
//! ```toml
//! [stylesheet]
//! scope_class = "logview"
//! ghost_class = "logfilter-controls"
//! ghost_opacity = 0.4
//!
//! [[directives]]
//! logger = "app.db"      # omit for the global slot
//! level = "warning"
//! directive = "hide"
//! ```

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use logcascade_filter::{CompileOptions, Directive, FilterError, FilterSession, Level};

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub stylesheet: StylesheetConfig,
    pub directives: Vec<DirectiveConfig>,
}

impl Config {
    /// Load a config file
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("invalid config {}", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        anyhow::ensure!(
            config.stylesheet.ghost_opacity.is_finite(),
            "ghost_opacity must be a finite number, got {}",
            config.stylesheet.ghost_opacity
        );
        Ok(config)
    }
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StylesheetConfig {
    pub scope_class: Option<String>,
    pub ghost_class: String,
    pub ghost_opacity: f32,
}

impl Default for StylesheetConfig {
    fn default() -> Self {
        let defaults = CompileOptions::default();
        Self {
            scope_class: defaults.scope_class,
            ghost_class: defaults.ghost_class,
            ghost_opacity: defaults.ghost_opacity,
        }
    }
}

impl StylesheetConfig {
    pub fn compile_options(&self) -> CompileOptions {
        CompileOptions {
            scope_class: self.scope_class.clone(),
            ghost_class: self.ghost_class.clone(),
            ghost_opacity: self.ghost_opacity.clamp(0.0, 1.0),
        }
    }
}

/// One directive from the config file
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DirectiveConfig {
    /// Dotted logger name, `None` for the global slot
    #[serde(default)]
    pub logger: Option<String>,
    pub level: Level,
    pub directive: Directive,
}

/// Apply every directive whose logger has been observed
///
/// Directives for loggers not seen yet stay in `pending`.
pub fn apply_ready(pending: &mut Vec<DirectiveConfig>, session: &mut FilterSession) {
    pending.retain(|entry| {
        match session.set_directive(entry.logger.as_deref(), entry.level, entry.directive) {
            Ok(_) => false,
            Err(FilterError::UnknownLogger(_)) => true,
            Err(e) => {
                tracing::warn!(error = %e, "skipping directive");
                false
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use logcascade_filter::LogRecord;
    use std::io::Write;

    const SAMPLE: &str = r#"
[stylesheet]
scope_class = "logview"
ghost_opacity = 0.5

[[directives]]
logger = "app"
level = "warning"
directive = "hide"

[[directives]]
level = "debug"
directive = "hide_weak"

[[directives]]
logger = "app.db.pool"
level = "warn"
directive = "show_weak"
"#;

    #[test]
    fn test_parse_config() {
        let config = Config::parse(SAMPLE).unwrap();
        assert_eq!(config.stylesheet.scope_class.as_deref(), Some("logview"));
        assert_eq!(config.stylesheet.ghost_class, "logfilter-controls");
        assert_eq!(config.directives.len(), 3);
        assert_eq!(config.directives[1].logger, None);
        assert_eq!(config.directives[2].level, Level::Warning);
        assert_eq!(config.directives[2].directive, Directive::WeakShow);
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.stylesheet.compile_options(), CompileOptions::default());
        assert!(config.directives.is_empty());
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        assert!(Config::parse("[stylesheet]\nopacity = 1.0\n").is_err());
        assert!(Config::parse("[[directives]]\nlevel = \"info\"\ndirective = \"reveal\"\n").is_err());
    }

    #[test]
    fn test_non_finite_opacity_is_rejected() {
        for value in ["nan", "inf", "-inf"] {
            let text = format!("[stylesheet]\nghost_opacity = {}\n", value);
            let err = Config::parse(&text).unwrap_err();
            assert!(err.to_string().contains("ghost_opacity"), "{}", err);
        }
        let clamped = Config::parse("[stylesheet]\nghost_opacity = 3.0\n").unwrap();
        assert_eq!(clamped.stylesheet.compile_options().ghost_opacity, 1.0);
    }

    #[test]
    fn test_dots_only_logger_is_dropped() {
        let config = Config::parse("[[directives]]\nlogger = \"...\"\nlevel = \"info\"\ndirective = \"hide\"\n")
            .unwrap();
        let mut pending = config.directives;
        let mut session = FilterSession::default();
        session.observe_batch(&[LogRecord::new("app", 20, "up")]);

        apply_ready(&mut pending, &mut session);
        assert!(pending.is_empty());
        assert!(session.store().is_empty());
        assert!(session.resolve("app", Level::Info).unwrap().is_visible());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.stylesheet.ghost_opacity, 0.5);

        assert!(Config::load(Path::new("/nonexistent/logcascade.toml")).is_err());
    }

    #[test]
    fn test_apply_ready_keeps_unseen_loggers() {
        let config = Config::parse(SAMPLE).unwrap();
        let mut pending = config.directives.clone();
        let mut session = FilterSession::default();

        session.observe_batch(&[LogRecord::new("app", 30, "up")]);
        apply_ready(&mut pending, &mut session);
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].logger.as_deref(), Some("app.db.pool"));

        session.observe_batch(&[LogRecord::new("app.db.pool", 30, "reset")]);
        apply_ready(&mut pending, &mut session);
        assert!(pending.is_empty());
        assert!(session.resolve("app.db.pool", Level::Warning).unwrap().is_visible());
        assert!(session.resolve("app", Level::Warning).unwrap().is_hidden());
    }
}
