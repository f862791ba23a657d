//! CLI output formatting.
//!
//! # Output Format
//!
//! ## Optimize
//!
//! ```text
//! warning: expected source not found: rack_tv_flotante
//! 001/002 050-escritorio_gamer.png (1600x1200)
//!     mobile-9x16 → 001-050-escritorio-gamer.webp 142.08 KB (-93.94%)
//!     desktop-16x9 → 001-050-escritorio-gamer.webp 187.11 KB (-92.02%)
//! 002/002 051-placard_vestidor.jpg (1200x1600)
//!     ...
//!
//! Processed 2 images
//!     mobile-9x16: assets/optimized/mobile-9x16
//!     desktop-16x9: assets/optimized/desktop-16x9
//! Report: assets/optimized/optimization-report.csv
//! ```
//!
//! With nothing to do, a single line:
//!
//! ```text
//! No images to process in assets
//! ```
//!
//! ## Plan
//!
//! ```text
//! 001 050-escritorio_gamer.png (1600x1200)
//!     mobile-9x16 → assets/optimized/mobile-9x16/001-050-escritorio-gamer.webp
//!         crop 675x1200+462+0, resize 1080x1920, webp q75
//! ```
//!
//! # Architecture
//!
//! Each output has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure, with no I/O.

use crate::process::{OptimizeEvent, Plan, RunSummary};
use crate::report::format_decimal;
use std::path::Path;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Signed size change, the negation of the reduction: `-92.02%`, `+4.10%`.
fn format_change(reduction_percent: f64) -> String {
    let change = -reduction_percent;
    if change > 0.0 {
        format!("+{}%", format_decimal(change))
    } else {
        format!("{}%", format_decimal(change))
    }
}

fn missing_expected_line(prefix: &str) -> String {
    format!("warning: expected source not found: {}", prefix)
}

// ============================================================================
// Optimize
// ============================================================================

/// Format a single progress event as display lines.
pub fn format_event(event: &OptimizeEvent) -> Vec<String> {
    match event {
        OptimizeEvent::MissingExpected { prefix } => vec![missing_expected_line(prefix)],
        OptimizeEvent::SourceStarted {
            index,
            total,
            file_name,
            dimensions,
        } => vec![format!(
            "{}/{} {} ({}x{})",
            format_index(*index),
            format_index(*total),
            file_name,
            dimensions.width,
            dimensions.height
        )],
        OptimizeEvent::VariantWritten(row) => vec![format!(
            "{}{} → {} {} KB ({})",
            indent(1),
            row.target_folder,
            row.output_file,
            format_decimal(row.output_kb),
            format_change(row.reduction_percent)
        )],
    }
}

pub fn print_event(event: &OptimizeEvent) {
    for line in format_event(event) {
        println!("{}", line);
    }
}

/// Closing summary: processed count, one output directory per profile, and
/// the report path.
pub fn format_summary(summary: &RunSummary) -> Vec<String> {
    let noun = if summary.sources == 1 { "image" } else { "images" };
    let mut lines = vec![
        String::new(),
        format!("Processed {} {}", summary.sources, noun),
    ];
    for (name, dir) in &summary.profile_dirs {
        lines.push(format!("{}{}: {}", indent(1), name, dir.display()));
    }
    lines.push(format!("Report: {}", summary.report_path.display()));
    lines
}

pub fn print_summary(summary: &RunSummary) {
    for line in format_summary(summary) {
        println!("{}", line);
    }
}

pub fn format_no_sources(source_dir: &Path) -> String {
    format!("No images to process in {}", source_dir.display())
}

pub fn print_no_sources(source_dir: &Path) {
    println!("{}", format_no_sources(source_dir));
}

// ============================================================================
// Plan
// ============================================================================

/// Format a dry-run plan, grouped by source.
pub fn format_plan(plan: &Plan) -> Vec<String> {
    let mut lines: Vec<String> = plan
        .missing_expected
        .iter()
        .map(|p| missing_expected_line(p))
        .collect();

    if plan.variants.is_empty() {
        lines.push(format_no_sources(&plan.source_dir));
        return lines;
    }

    let mut current = None;
    for v in &plan.variants {
        if current != Some(v.index) {
            current = Some(v.index);
            lines.push(format!(
                "{} {} ({})",
                format_index(v.index),
                v.source,
                v.source_resolution
            ));
        }
        lines.push(format!(
            "{}{} → {}",
            indent(1),
            v.profile,
            v.output.display()
        ));
        lines.push(format!(
            "{}crop {}x{}+{}+{}, resize {}x{}, {} q{}",
            indent(2),
            v.crop.width,
            v.crop.height,
            v.crop.x,
            v.crop.y,
            v.width,
            v.height,
            v.format,
            v.quality
        ));
    }

    lines.push(String::new());
    lines.push(format!("Report would be written to {}", plan.report_path.display()));
    lines
}

pub fn print_plan(plan: &Plan) {
    for line in format_plan(plan) {
        println!("{}", line);
    }
}
