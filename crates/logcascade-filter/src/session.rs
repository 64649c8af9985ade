use logcascade_types::{Directive, Level, LogRecord, LoggerPath};

use crate::compiler::StylesheetCompiler;
use crate::error::FilterError;
use crate::policy::{self, Resolution, Slot};
use crate::store::{DirectiveStore, ScopeClasses};
use crate::stylesheet::StylesheetHandle;
use crate::tree::LoggerTree;

/// Tree, directives and live stylesheet for one log view
///
/// Records grow the tree; the stylesheet is recompiled once per batch and
/// always before a directive referencing a new logger is applied.
#[derive(Debug)]
pub struct FilterSession {
    tree: LoggerTree,
    store: DirectiveStore,
    compiler: StylesheetCompiler,
    stylesheet: StylesheetHandle,

    /// Tree changed since the last compile
    dirty: bool,
}

impl FilterSession {
    pub fn new(compiler: StylesheetCompiler, stylesheet: StylesheetHandle) -> Self {
        Self {
            tree: LoggerTree::new(),
            store: DirectiveStore::new(),
            compiler,
            stylesheet,
            dirty: false,
        }
    }

    /// Insert a record's logger path without recompiling
    pub fn observe(&mut self, record: &LogRecord) -> bool {
        let grew = self.tree.insert(&record.path());
        if grew {
            tracing::debug!(logger = %record.logger, "new logger observed");
        }
        self.dirty |= grew;
        grew
    }

    /// Insert a whole batch, then recompile once if the tree grew
    pub fn observe_batch<'a, I>(&mut self, records: I) -> bool
    where
        I: IntoIterator<Item = &'a LogRecord>,
    {
        let mut grew = false;
        for record in records {
            grew |= self.observe(record);
        }
        self.flush();
        grew
    }

    /// Recompile if the tree changed since the last compile
    pub fn flush(&mut self) -> bool {
        if !self.dirty {
            return false;
        }
        self.recompile();
        true
    }

    /// Recompile and install the stylesheet unconditionally
    pub fn recompile(&mut self) {
        let css = self.compiler.compile_css(&self.tree);
        let bytes = css.len();
        let generation = self.stylesheet.replace(css);
        self.dirty = false;
        tracing::debug!(
            loggers = self.tree.len(),
            bytes,
            generation,
            "stylesheet replaced"
        );
    }

    /// Resolve a dotted logger name to its slot, `None` meaning global
    ///
    /// A name made only of dots is rejected rather than read as global.
    pub fn slot(&self, logger: Option<&str>) -> Result<Slot, FilterError> {
        match logger {
            None => Ok(Slot::Global),
            Some(name) => {
                let path = LoggerPath::parse(name);
                if path.is_empty() {
                    return Err(FilterError::InvalidLoggerName(name.to_string()));
                }
                self.tree
                    .find(path.segments())
                    .map(Slot::Logger)
                    .ok_or_else(|| FilterError::UnknownLogger(name.to_string()))
            }
        }
    }

    /// Set a directive for a logger (or the global slot)
    pub fn set_directive(
        &mut self,
        logger: Option<&str>,
        level: Level,
        directive: Directive,
    ) -> Result<Slot, FilterError> {
        let slot = self.slot(logger)?;
        self.flush();
        self.store.set(&self.tree, slot, level, directive);
        Ok(slot)
    }

    /// Return a pair to the unset state
    pub fn clear_directive(
        &mut self,
        logger: Option<&str>,
        level: Level,
    ) -> Result<Option<Directive>, FilterError> {
        let slot = self.slot(logger)?;
        Ok(self.store.clear(&self.tree, slot, level))
    }

    /// Apply a control's value string
    pub fn apply_class(&mut self, value: &str) -> Result<Slot, FilterError> {
        self.flush();
        self.store.apply_class(&self.tree, value)
    }

    /// Visibility of a logger's rows at a level
    pub fn resolve(&self, logger: &str, level: Level) -> Result<Resolution, FilterError> {
        match self.slot(Some(logger))? {
            Slot::Logger(node) => Ok(policy::resolve(&self.tree, &self.store, node, level)),
            Slot::Global => Err(FilterError::UnknownLogger(logger.to_string())),
        }
    }

    pub fn tree(&self) -> &LoggerTree {
        &self.tree
    }

    pub fn store(&self) -> &DirectiveStore {
        &self.store
    }

    pub fn scope_classes(&self) -> &ScopeClasses {
        self.store.scope_classes()
    }

    pub fn stylesheet(&self) -> &StylesheetHandle {
        &self.stylesheet
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }
}

impl Default for FilterSession {
    fn default() -> Self {
        Self::new(StylesheetCompiler::default(), StylesheetHandle::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records(names: &[&str]) -> Vec<LogRecord> {
        names
            .iter()
            .map(|name| LogRecord::new(*name, 20, "message"))
            .collect()
    }

    #[test]
    fn test_batch_compiles_once() {
        let mut session = FilterSession::default();
        let batch = records(&["app", "app.db", "app.db", "web"]);

        assert!(session.observe_batch(&batch));
        assert_eq!(session.stylesheet().generation(), 1);
        assert!(!session.is_dirty());
        assert!(session.stylesheet().current().contains(".log-app-db.loglevel-info"));

        // repeats leave the stylesheet alone
        assert!(!session.observe_batch(&batch));
        assert_eq!(session.stylesheet().generation(), 1);
    }

    #[test]
    fn test_directive_flushes_pending_compile() {
        let mut session = FilterSession::default();
        session.observe(&LogRecord::new("app.db", 30, "slow"));
        assert!(session.is_dirty());
        assert_eq!(session.stylesheet().generation(), 0);

        session
            .set_directive(Some("app.db"), Level::Warning, Directive::Hide)
            .unwrap();
        assert_eq!(session.stylesheet().generation(), 1);
        assert!(session
            .scope_classes()
            .contains("logfilter-hide-warning-app-db"));
    }

    #[test]
    fn test_unknown_logger_is_rejected() {
        let mut session = FilterSession::default();
        assert_eq!(
            session.set_directive(Some("ghost"), Level::Info, Directive::Hide),
            Err(FilterError::UnknownLogger("ghost".to_string()))
        );
        assert!(session.store().is_empty());
    }

    #[test]
    fn test_resolve_end_to_end() {
        let mut session = FilterSession::default();
        session.observe_batch(&records(&["app", "app.db", "app.db.pool"]));
        session
            .set_directive(Some("app"), Level::Warning, Directive::Hide)
            .unwrap();
        session
            .apply_class("logfilter-show_weak-warning-app-db-pool")
            .unwrap();

        assert!(session.resolve("app", Level::Warning).unwrap().is_hidden());
        assert_eq!(
            session.resolve("app.db", Level::Warning).unwrap(),
            Resolution::InheritedHide(session.slot(Some("app")).unwrap())
        );
        assert!(session.resolve("app.db.pool", Level::Warning).unwrap().is_visible());

        session.clear_directive(Some("app"), Level::Warning).unwrap();
        assert!(session.resolve("app.db", Level::Warning).unwrap().is_visible());
    }

    #[test]
    fn test_global_slot() {
        let mut session = FilterSession::default();
        session.observe_batch(&records(&["app"]));
        assert_eq!(
            session.set_directive(None, Level::Debug, Directive::Hide),
            Ok(Slot::Global)
        );
        assert!(session.resolve("app", Level::Debug).unwrap().is_hidden());
        assert!(session.scope_classes().contains("logfilter-hide-debug"));
    }

    #[test]
    fn test_dots_only_name_is_not_global() {
        let mut session = FilterSession::default();
        session.observe_batch(&records(&["app"]));

        for name in ["", ".", "..."] {
            assert_eq!(
                session.set_directive(Some(name), Level::Info, Directive::Hide),
                Err(FilterError::InvalidLoggerName(name.to_string()))
            );
            assert!(session.resolve(name, Level::Info).is_err());
        }
        assert!(session.store().is_empty());
        assert!(session.scope_classes().is_empty());
        assert!(session.resolve("app", Level::Info).unwrap().is_visible());
    }
}
