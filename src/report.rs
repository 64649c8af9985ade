use std::collections::HashMap;
use std::fmt::Write;

use logcascade_filter::{FilterSession, Level, resolve};
use logcascade_logs::LevelCounts;

/// Render a logger × level visibility table
///
/// Cells show row counts; hidden pairs are wrapped in brackets and explained
/// below the table. `sources` lists lines read per input.
pub fn render(
    session: &FilterSession,
    counts: &HashMap<String, LevelCounts>,
    sources: &[(String, u64)],
) -> String {
    let tree = session.tree();
    let mut loggers: Vec<(String, _)> = tree.loggers().map(|id| (tree.dotted(id), id)).collect();
    loggers.sort();

    let name_width = loggers
        .iter()
        .map(|(name, _)| name.len())
        .max()
        .unwrap_or(0)
        .max("logger".len());
    let cell_width = Level::ALL.iter().map(|l| l.name().len()).max().unwrap_or(0) + 2;

    let mut out = String::new();
    let _ = write!(out, "{:<name_width$}", "logger");
    for level in Level::ALL {
        let _ = write!(out, "  {:>cell_width$}", level.name());
    }
    let _ = writeln!(out, "  {:>cell_width$}", "total");

    let mut hidden = Vec::new();
    for (name, id) in &loggers {
        let _ = write!(out, "{:<name_width$}", name);
        let row_counts = counts.get(name).copied().unwrap_or_default();
        for level in Level::ALL {
            let resolution = resolve(tree, session.store(), *id, level);
            let count = row_counts.get(level);
            let cell = if resolution.is_hidden() {
                hidden.push(format!("  {} {}: {}", name, level, resolution.describe(tree)));
                format!("[{}]", count)
            } else {
                count.to_string()
            };
            let _ = write!(out, "  {:>cell_width$}", cell);
        }
        let _ = writeln!(out, "  {:>cell_width$}", row_counts.total());
    }

    if !hidden.is_empty() {
        out.push_str("\nhidden:\n");
        for line in hidden {
            out.push_str(&line);
            out.push('\n');
        }
    }

    let scope = session.scope_classes();
    if !scope.is_empty() {
        let _ = write!(out, "\nscope classes: {}\n", scope.to_attribute());
    }

    if !sources.is_empty() {
        out.push_str("\nsources:\n");
        for (source, lines) in sources {
            let _ = writeln!(out, "  {}: {} lines", source, lines);
        }
    }
    out
}
