//! CLI output formatting.
//!
//! # Output Format
//!
//! ## Convert
//!
//! ```text
//! photo.jpg → photo.webp
//!     Steps: resize:fit=800, grayscale
//!     Size: 800x450
//!     Encoded: webp, 41.2 KB
//! ```
//!
//! ## Batch
//!
//! ```text
//! 001 one.png → one.jpg (800x400)
//! 002 sub/two.jpg → sub/two.jpg (400x800)
//!
//! Failed
//! 001 broken.png
//!     Error: upstream failure: Decoding failed: ...
//!
//! Converted 2 of 3 files
//! ```
//!
//! ## Transforms
//!
//! ```text
//! Transforms
//! 001 grayscale
//! 002 resize
//! 003 sharpen
//! ```
//!
//! # Architecture
//!
//! Each report has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::convert::{BatchReport, ConvertOutcome};
use crate::steps::StepSpec;
use std::path::Path;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Human-readable byte count.
fn format_bytes(bytes: usize) -> String {
    const KB: f64 = 1024.0;
    let b = bytes as f64;
    if b < KB {
        format!("{bytes} B")
    } else if b < KB * KB {
        format!("{:.1} KB", b / KB)
    } else {
        format!("{:.1} MB", b / (KB * KB))
    }
}

/// Path relative to `root` when possible, for shorter lines.
fn display_relative(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .display()
        .to_string()
}

// ============================================================================
// Convert
// ============================================================================

pub fn format_convert_output(outcome: &ConvertOutcome, steps: &[StepSpec]) -> Vec<String> {
    let mut lines = vec![format!(
        "{} → {}",
        outcome.input.display(),
        outcome.output.display()
    )];
    if !steps.is_empty() {
        let names: Vec<String> = steps.iter().map(StepSpec::to_string).collect();
        lines.push(format!("{}Steps: {}", indent(1), names.join(", ")));
    }
    let (w, h) = outcome.dimensions;
    lines.push(format!("{}Size: {w}x{h}", indent(1)));
    lines.push(format!(
        "{}Encoded: {}, {}",
        indent(1),
        outcome.format,
        format_bytes(outcome.bytes)
    ));
    lines
}

pub fn print_convert_output(outcome: &ConvertOutcome, steps: &[StepSpec]) {
    for line in format_convert_output(outcome, steps) {
        println!("{}", line);
    }
}

// ============================================================================
// Batch
// ============================================================================

pub fn format_batch_output(report: &BatchReport, input_dir: &Path, out_dir: &Path) -> Vec<String> {
    let mut lines = Vec::new();
    for (i, outcome) in report.converted.iter().enumerate() {
        let (w, h) = outcome.dimensions;
        lines.push(format!(
            "{} {} → {} ({w}x{h})",
            format_index(i + 1),
            display_relative(&outcome.input, input_dir),
            display_relative(&outcome.output, out_dir),
        ));
    }

    if !report.failed.is_empty() {
        if !lines.is_empty() {
            lines.push(String::new());
        }
        lines.push("Failed".to_string());
        for (i, (input, error)) in report.failed.iter().enumerate() {
            lines.push(format!(
                "{} {}",
                format_index(i + 1),
                display_relative(input, input_dir)
            ));
            lines.push(format!("{}Error: {error}", indent(1)));
        }
    }

    if !lines.is_empty() {
        lines.push(String::new());
    }
    lines.push(format!(
        "Converted {} of {} files",
        report.converted.len(),
        report.total()
    ));
    lines
}

pub fn print_batch_output(report: &BatchReport, input_dir: &Path, out_dir: &Path) {
    for line in format_batch_output(report, input_dir, out_dir) {
        println!("{}", line);
    }
}

// ============================================================================
// Transforms
// ============================================================================

pub fn format_transform_list(names: &[&str]) -> Vec<String> {
    let mut lines = vec!["Transforms".to_string()];
    lines.extend(
        names
            .iter()
            .enumerate()
            .map(|(i, name)| format!("{} {}", format_index(i + 1), name)),
    );
    lines
}

pub fn print_transform_list(names: &[&str]) {
    for line in format_transform_list(names) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================
