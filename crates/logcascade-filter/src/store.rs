use std::collections::{BTreeSet, HashMap};

use logcascade_types::{Directive, Level};

use crate::error::FilterError;
use crate::names::{directive_class, parse_directive_class};
use crate::policy::{DirectiveLookup, Slot};
use crate::tree::LoggerTree;

/// Class list of the scope element
///
/// Only [`DirectiveStore`] writes to it, which keeps at most one directive
/// class per (slot, level) pair.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ScopeClasses {
    classes: BTreeSet<String>,
}

impl ScopeClasses {
    pub fn contains(&self, class: &str) -> bool {
        self.classes.contains(class)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.classes.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Space separated, ready for a `class` attribute
    pub fn to_attribute(&self) -> String {
        self.iter().collect::<Vec<_>>().join(" ")
    }

    fn replace(&mut self, candidates: &[String], chosen: Option<String>) {
        for class in candidates {
            self.classes.remove(class);
        }
        if let Some(class) = chosen {
            self.classes.insert(class);
        }
    }
}

impl<S: Into<String>> FromIterator<S> for ScopeClasses {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            classes: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Active directives, keyed by (slot, level)
///
/// The map is the source of truth; [`ScopeClasses`] is its serialization for
/// the scope element.
#[derive(Clone, Debug, Default)]
pub struct DirectiveStore {
    directives: HashMap<(Slot, Level), Directive>,
    scope: ScopeClasses,
}

impl DirectiveStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The directive set for a pair, `None` when unset
    pub fn get(&self, slot: Slot, level: Level) -> Option<Directive> {
        self.directives.get(&(slot, level)).copied()
    }

    /// Set the directive for a pair, replacing any previous one
    pub fn set(&mut self, tree: &LoggerTree, slot: Slot, level: Level, directive: Directive) {
        let dashed = slot.dashed(tree);
        let chosen = directive_class(directive, level, dashed.as_deref());
        self.scope
            .replace(&candidates(level, dashed.as_deref()), Some(chosen));
        self.directives.insert((slot, level), directive);
        tracing::debug!(
            slot = %slot.display(tree),
            level = %level,
            directive = %directive,
            "directive set"
        );
    }

    /// Return a pair to the unset state
    pub fn clear(&mut self, tree: &LoggerTree, slot: Slot, level: Level) -> Option<Directive> {
        let dashed = slot.dashed(tree);
        self.scope.replace(&candidates(level, dashed.as_deref()), None);
        self.directives.remove(&(slot, level))
    }

    /// Apply a control's value string, e.g. `logfilter-hide-warning-app-db`
    pub fn apply_class(&mut self, tree: &LoggerTree, value: &str) -> Result<Slot, FilterError> {
        let parsed = parse_directive_class(value)
            .ok_or_else(|| FilterError::InvalidDirectiveClass(value.to_string()))?;
        let slot = match parsed.dashed_path {
            None => Slot::Global,
            Some(path) => tree
                .find_dashed(path)
                .map(Slot::Logger)
                .ok_or_else(|| FilterError::UnknownLogger(path.to_string()))?,
        };
        self.set(tree, slot, parsed.level, parsed.directive);
        Ok(slot)
    }

    /// Current class list of the scope element
    pub fn scope_classes(&self) -> &ScopeClasses {
        &self.scope
    }

    /// Number of pairs with a directive
    pub fn len(&self) -> usize {
        self.directives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.directives.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Slot, Level, Directive)> + '_ {
        self.directives
            .iter()
            .map(|(&(slot, level), &directive)| (slot, level, directive))
    }
}

impl DirectiveLookup for DirectiveStore {
    fn directive(&self, slot: Slot, level: Level) -> Option<Directive> {
        self.get(slot, level)
    }
}

/// The four classes a pair may carry
fn candidates(level: Level, dashed_path: Option<&str>) -> Vec<String> {
    Directive::ALL
        .iter()
        .map(|&directive| directive_class(directive, level, dashed_path))
        .collect()
}
