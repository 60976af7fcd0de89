//! CLI output formatting.
//!
//! # Information-First Display
//!
//! Outlines and build results are shown by what they contain, not by the
//! files behind them. Every line leads with a positional index and a title;
//! ids and output paths follow as secondary context.
//!
//! # Output Format
//!
//! ## Outline
//!
//! ```text
//! 001 Introduction → book:intro
//!     001 Install → book:intro#install
//! 002 setup → book:setup
//! ```
//!
//! ## Build
//!
//! ```text
//! 001 book:intro → book/intro.html
//! 002 book:setup → book/setup.html
//!     warning: page book:setup does not link back to previous page book:intro
//!
//! Built 2 pages, 1 warning
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::naming::no_ns;
use crate::outline::{Outline, WalkWarning};
use crate::wiki::BuiltPage;

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(count: usize, one: &str, many: &str) -> String {
    if count == 1 {
        format!("{count} {one}")
    } else {
        format!("{count} {many}")
    }
}

// ============================================================================
// Outline
// ============================================================================

/// Format a walked outline as an indented tree.
///
/// Indices count siblings per level; entries without a title show the last
/// id component.
pub fn format_outline(outline: &Outline) -> Vec<String> {
    let mut lines = Vec::new();
    let mut counters: Vec<usize> = Vec::new();

    for entry in outline.entries() {
        let depth = usize::from(entry.level.max(1)) - 1;
        counters.truncate(depth + 1);
        counters.resize(depth + 1, 0);
        counters[depth] += 1;

        let name = entry
            .title
            .clone()
            .unwrap_or_else(|| no_ns(&entry.id).to_string());
        lines.push(format!(
            "{}{} {} → {}",
            indent(depth),
            format_index(counters[depth]),
            name,
            entry.id
        ));
    }

    if lines.is_empty() {
        lines.push("(empty outline)".to_string());
    }
    lines
}

/// Print an outline to stdout.
pub fn print_outline(outline: &Outline) {
    for line in format_outline(outline) {
        println!("{}", line);
    }
}

// ============================================================================
// Warnings
// ============================================================================

/// One line per walk warning.
pub fn format_warnings(warnings: &[WalkWarning]) -> Vec<String> {
    warnings.iter().map(|w| format!("warning: {w}")).collect()
}

/// Print walk warnings to stderr.
pub fn print_warnings(warnings: &[WalkWarning]) {
    for line in format_warnings(warnings) {
        eprintln!("{}", line);
    }
}

// ============================================================================
// Build
// ============================================================================

/// Format the result of a full build: one line per page, its warnings
/// indented below it, and a summary.
pub fn format_build_output(pages: &[BuiltPage]) -> Vec<String> {
    let mut lines = Vec::new();

    for (i, page) in pages.iter().enumerate() {
        lines.push(format!(
            "{} {} → {}",
            format_index(i + 1),
            page.id,
            page.path
        ));
        for warning in format_warnings(&page.warnings) {
            lines.push(format!("{}{}", indent(1), warning));
        }
    }

    let warning_count: usize = pages.iter().map(|p| p.warnings.len()).sum();
    lines.push(String::new());
    lines.push(format!(
        "Built {}, {}",
        plural(pages.len(), "page", "pages"),
        plural(warning_count, "warning", "warnings")
    ));
    lines
}

/// Print build output to stdout.
pub fn print_build_output(pages: &[BuiltPage]) {
    for line in format_build_output(pages) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================
