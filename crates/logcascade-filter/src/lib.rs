//! Hierarchical log filter compiler for logcascade
//!
//! This crate keeps the tree of observed logger names, the per-(logger, level)
//! visibility directives, and compiles both into a static stylesheet that
//! hides log rows by class without any per-row work.

mod compiler;
mod error;
pub mod names;
mod policy;
mod session;
mod store;
mod stylesheet;
mod tree;

pub use compiler::{
    CompileOptions, RuleFamily, RuleKind, RuleSet, ScopeSelector, StylesheetCompiler,
};
pub use error::FilterError;
pub use policy::{DirectiveLookup, Resolution, Slot, is_hidden, resolve, upstream};
pub use session::FilterSession;
pub use store::{DirectiveStore, ScopeClasses};
pub use stylesheet::StylesheetHandle;
pub use tree::{LoggerNode, LoggerTree, NodeId};

// Re-export types used in our public API
pub use logcascade_types::{Directive, Level, LogRecord, LoggerPath};
