//! Cascade policy
//!
//! Decides whether the rows of one (logger, level) pair are visible given
//! the directives currently set. Let `upstream(L)` be the global slot plus
//! every strict ancestor of `L`:
//!
//! 1. `Show` anywhere in `upstream(L)` makes `L` visible, whatever else is set.
//! 2. Otherwise `L` is hidden when its own directive is `Hide` or `WeakHide`,
//!    or when it has no directive and some slot in `upstream(L)` has `Hide`.
//! 3. Otherwise `L` is visible.
//!
//! An explicit `WeakShow` on `L` therefore cancels every hiding ancestor for
//! `L`'s own rows but not for its descendants.

use logcascade_types::{Directive, Level};

use crate::tree::{LoggerTree, NodeId};

/// A directive slot on the scope element
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Slot {
    /// Level-wide slot with no logger suffix
    Global,
    Logger(NodeId),
}

impl Slot {
    /// Dashed logger path, `None` for the global slot
    pub fn dashed(&self, tree: &LoggerTree) -> Option<String> {
        match self {
            Self::Global => None,
            Self::Logger(id) => Some(tree.dashed(*id)),
        }
    }

    /// Display name, `*` for the global slot
    pub fn display(&self, tree: &LoggerTree) -> String {
        match self {
            Self::Global => "*".to_string(),
            Self::Logger(id) => tree.dotted(*id),
        }
    }
}

/// Read access to the active directives
pub trait DirectiveLookup {
    /// The directive set for a pair, `None` when unset
    fn directive(&self, slot: Slot, level: Level) -> Option<Directive>;
}

impl<F> DirectiveLookup for F
where
    F: Fn(Slot, Level) -> Option<Directive>,
{
    fn directive(&self, slot: Slot, level: Level) -> Option<Directive> {
        self(slot, level)
    }
}

/// Outcome of the policy for one (logger, level) pair, with its cause
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Resolution {
    /// An upstream slot has `Show`
    ForcedShow(Slot),
    /// The logger's own `Show` or `WeakShow`
    OwnShow(Directive),
    /// The logger's own `Hide` or `WeakHide`
    OwnHide(Directive),
    /// Unset, and an upstream slot has `Hide`
    InheritedHide(Slot),
    /// Nothing applies
    Default,
}

impl Resolution {
    pub fn is_hidden(&self) -> bool {
        matches!(self, Self::OwnHide(_) | Self::InheritedHide(_))
    }

    pub fn is_visible(&self) -> bool {
        !self.is_hidden()
    }

    /// Short explanation for reports
    pub fn describe(&self, tree: &LoggerTree) -> String {
        match self {
            Self::ForcedShow(slot) => format!("shown by {}", slot.display(tree)),
            Self::OwnShow(d) | Self::OwnHide(d) => d.token().to_string(),
            Self::InheritedHide(slot) => format!("hidden by {}", slot.display(tree)),
            Self::Default => "default".to_string(),
        }
    }
}

/// Global slot, then the strict ancestors of `node` nearest first
pub fn upstream(tree: &LoggerTree, node: NodeId) -> impl Iterator<Item = Slot> + '_ {
    std::iter::once(Slot::Global).chain(tree.ancestors(node).map(Slot::Logger))
}

/// Resolve the visibility of `node`'s rows at `level`
pub fn resolve<D>(tree: &LoggerTree, directives: &D, node: NodeId, level: Level) -> Resolution
where
    D: DirectiveLookup + ?Sized,
{
    if let Some(slot) =
        upstream(tree, node).find(|&slot| directives.directive(slot, level) == Some(Directive::Show))
    {
        return Resolution::ForcedShow(slot);
    }

    match directives.directive(Slot::Logger(node), level) {
        Some(own) if own.is_hiding() => Resolution::OwnHide(own),
        Some(own) => Resolution::OwnShow(own),
        None => upstream(tree, node)
            .find(|&slot| directives.directive(slot, level) == Some(Directive::Hide))
            .map_or(Resolution::Default, Resolution::InheritedHide),
    }
}

/// Whether `node`'s rows at `level` are hidden
pub fn is_hidden<D>(tree: &LoggerTree, directives: &D, node: NodeId, level: Level) -> bool
where
    D: DirectiveLookup + ?Sized,
{
    resolve(tree, directives, node, level).is_hidden()
}
