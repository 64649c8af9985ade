//! Stylesheet compiler
//!
//! Materializes the cascade policy as CSS so the browser decides row
//! visibility from the classes on the scope element. For every logger `L`
//! and level, rows `.log-L.loglevel-lv` are collapsed by any of:
//!
//! 1. `hide(L)` with no `Show` on the global slot or an ancestor
//! 2. `hide_weak(L)` with the same negation
//! 3. for each upstream slot `P`: `hide(P)` while `L` has neither `Show` nor
//!    `WeakShow` and no other upstream slot has `Show`
//!
//! Each family is mirrored under the control-panel class, where matching
//! controls are dimmed instead of collapsed.

use std::fmt::{self, Write};

use logcascade_types::{Directive, Level};

use crate::names::{directive_class, escape_class, level_class, logger_class};
use crate::policy::{Slot, upstream};
use crate::store::ScopeClasses;
use crate::tree::{LoggerTree, NodeId};

/// Presentation knobs for the compiled stylesheet
#[derive(Clone, Debug, PartialEq)]
pub struct CompileOptions {
    /// Class qualifying the scope element, if any
    pub scope_class: Option<String>,

    /// Class of the control panel container
    pub ghost_class: String,

    /// Opacity of controls whose rows are hidden
    pub ghost_opacity: f32,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            scope_class: None,
            ghost_class: "logfilter-controls".to_string(),
            ghost_opacity: 0.4,
        }
    }
}

/// Which policy clause a selector encodes
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RuleKind {
    OwnHide,
    OwnWeakHide,
    /// `Hide` on an upstream slot reaching an unset logger
    Inherited(Slot),
}

/// Conditions on the scope element's class list
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScopeSelector {
    /// Classes that must all be present
    pub required: Vec<String>,

    /// Classes that must all be absent, rendered as one `:not(...)`
    pub excluded: Vec<String>,
}

impl ScopeSelector {
    pub fn matches(&self, scope: &ScopeClasses) -> bool {
        self.required.iter().all(|class| scope.contains(class))
            && !self.excluded.iter().any(|class| scope.contains(class))
    }

    fn render(&self, scope_class: Option<&str>, out: &mut String) {
        for class in scope_class.into_iter().chain(self.required.iter().map(String::as_str)) {
            out.push('.');
            out.push_str(&escape_class(class));
        }
        if self.excluded.is_empty() {
            return;
        }
        out.push_str(":not(");
        for (i, class) in self.excluded.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            out.push('.');
            out.push_str(&escape_class(class));
        }
        out.push(')');
    }
}

/// All selectors hiding the rows of one (logger, level) pair
#[derive(Clone, Debug)]
pub struct RuleFamily {
    pub node: NodeId,
    pub level: Level,
    pub logger_class: String,
    pub level_class: String,
    pub selectors: Vec<(RuleKind, ScopeSelector)>,
}

impl RuleFamily {
    /// Whether a row with these classes is collapsed under `scope`
    pub fn hides_row(&self, scope: &ScopeClasses, logger_class: &str, level_class: &str) -> bool {
        self.logger_class == logger_class
            && self.level_class == level_class
            && self.selectors.iter().any(|(_, selector)| selector.matches(scope))
    }

    fn render_selectors(&self, options: &CompileOptions, ghost: bool, out: &mut String) {
        let row = format!(
            ".{}.{}",
            escape_class(&self.logger_class),
            escape_class(&self.level_class)
        );
        for (i, (_, selector)) in self.selectors.iter().enumerate() {
            if i > 0 {
                out.push_str(",\n");
            }
            selector.render(options.scope_class.as_deref(), out);
            if ghost {
                out.push_str(" .");
                out.push_str(&escape_class(&options.ghost_class));
            }
            out.push(' ');
            out.push_str(&row);
        }
    }
}

/// Compiled rules for a whole tree
#[derive(Clone, Debug)]
pub struct RuleSet {
    families: Vec<RuleFamily>,
    options: CompileOptions,
}

impl RuleSet {
    pub fn families(&self) -> &[RuleFamily] {
        &self.families
    }

    pub fn is_empty(&self) -> bool {
        self.families.is_empty()
    }

    /// Number of individual selectors, ghost mirrors excluded
    pub fn selector_count(&self) -> usize {
        self.families.iter().map(|f| f.selectors.len()).sum()
    }

    /// Whether a row with these classes is collapsed under `scope`
    pub fn hides_row(&self, scope: &ScopeClasses, logger_class: &str, level_class: &str) -> bool {
        self.families
            .iter()
            .any(|family| family.hides_row(scope, logger_class, level_class))
    }

    /// Whether the rows of `node` at `level` are collapsed under `scope`
    pub fn hides(&self, tree: &LoggerTree, scope: &ScopeClasses, node: NodeId, level: Level) -> bool {
        self.hides_row(
            scope,
            &logger_class(&tree.dashed(node)),
            &level_class(level),
        )
    }

    /// Render the stylesheet text
    pub fn render(&self) -> String {
        let mut out = String::new();
        for family in &self.families {
            if family.selectors.is_empty() {
                continue;
            }
            family.render_selectors(&self.options, false, &mut out);
            out.push_str(" {\n  visibility: collapse;\n}\n");

            family.render_selectors(&self.options, true, &mut out);
            let _ = write!(
                out,
                " {{\n  opacity: {};\n  visibility: visible !important;\n}}\n",
                self.options.ghost_opacity
            );
        }
        out
    }
}

impl fmt::Display for RuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Turns a [`LoggerTree`] into a [`RuleSet`]
#[derive(Clone, Debug, Default)]
pub struct StylesheetCompiler {
    options: CompileOptions,
}

impl StylesheetCompiler {
    pub fn new(options: CompileOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    /// Build the rule families for every logger and level
    pub fn compile(&self, tree: &LoggerTree) -> RuleSet {
        let families: Vec<RuleFamily> = tree
            .loggers()
            .flat_map(|node| Level::ALL.into_iter().map(move |level| (node, level)))
            .map(|(node, level)| family_for(tree, node, level))
            .collect();

        tracing::debug!(
            loggers = tree.len(),
            families = families.len(),
            "compiled logger filter rules"
        );

        RuleSet {
            families,
            options: self.options.clone(),
        }
    }

    /// Compile and render in one step
    pub fn compile_css(&self, tree: &LoggerTree) -> String {
        self.compile(tree).render()
    }
}

fn family_for(tree: &LoggerTree, node: NodeId, level: Level) -> RuleFamily {
    let class = |slot: Slot, directive: Directive| {
        directive_class(directive, level, slot.dashed(tree).as_deref())
    };
    let own = Slot::Logger(node);
    let slots: Vec<Slot> = upstream(tree, node).collect();
    let upstream_shows: Vec<String> = slots
        .iter()
        .map(|&slot| class(slot, Directive::Show))
        .collect();

    let mut selectors = vec![
        (
            RuleKind::OwnHide,
            ScopeSelector {
                required: vec![class(own, Directive::Hide)],
                excluded: upstream_shows.clone(),
            },
        ),
        (
            RuleKind::OwnWeakHide,
            ScopeSelector {
                required: vec![class(own, Directive::WeakHide)],
                excluded: upstream_shows.clone(),
            },
        ),
    ];

    for (i, &hiding) in slots.iter().enumerate() {
        let mut excluded = vec![class(own, Directive::Show), class(own, Directive::WeakShow)];
        excluded.extend(
            upstream_shows
                .iter()
                .enumerate()
                .filter(|&(j, _)| j != i)
                .map(|(_, show)| show.clone()),
        );
        selectors.push((
            RuleKind::Inherited(hiding),
            ScopeSelector {
                required: vec![class(hiding, Directive::Hide)],
                excluded,
            },
        ));
    }

    RuleFamily {
        node,
        level,
        logger_class: logger_class(&tree.dashed(node)),
        level_class: level_class(level),
        selectors,
    }
}
