//! Optimization report.
//!
//! One [`ReportRow`] per (source, profile) pair, written as a single CSV file
//! after every source has been processed. The column order is fixed:
//!
//! ```text
//! source,source_resolution,source_kb,target_folder,target_resolution,output_file,output_kb,reduction_percent
//! 050-escritorio_gamer.png,1600x1200,2345.67,desktop-16x9,1920x1080,001-050-escritorio-gamer.webp,187.12,92.02
//! ```
//!
//! Sizes are kilobytes (1024 bytes) and every number carries exactly two
//! decimals, rounded half to even (`0.125` → `0.12`). Records end with CRLF,
//! as RFC 4180 prescribes.

use crate::imaging::Dimensions;
use serde::Serialize;
use std::borrow::Cow;
use std::path::Path;

/// Report columns, in output order.
pub const REPORT_HEADER: [&str; 8] = [
    "source",
    "source_resolution",
    "source_kb",
    "target_folder",
    "target_resolution",
    "output_file",
    "output_kb",
    "reduction_percent",
];

const LINE_END: &str = "\r\n";

/// One output file, compared against its source.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    pub source: String,
    pub source_resolution: String,
    pub source_kb: f64,
    pub target_folder: String,
    pub target_resolution: String,
    pub output_file: String,
    pub output_kb: f64,
    pub reduction_percent: f64,
}

impl ReportRow {
    pub fn new(
        source: &str,
        source_dims: Dimensions,
        source_bytes: u64,
        target_folder: &str,
        target_dims: Dimensions,
        output_file: &str,
        output_bytes: u64,
    ) -> Self {
        Self {
            source: source.to_string(),
            source_resolution: resolution(source_dims),
            source_kb: kilobytes(source_bytes),
            target_folder: target_folder.to_string(),
            target_resolution: resolution(target_dims),
            output_file: output_file.to_string(),
            output_kb: kilobytes(output_bytes),
            reduction_percent: reduction_percent(source_bytes, output_bytes),
        }
    }

    fn fields(&self) -> [Cow<'_, str>; 8] {
        [
            Cow::Borrowed(self.source.as_str()),
            Cow::Borrowed(self.source_resolution.as_str()),
            Cow::Owned(format_decimal(self.source_kb)),
            Cow::Borrowed(self.target_folder.as_str()),
            Cow::Borrowed(self.target_resolution.as_str()),
            Cow::Borrowed(self.output_file.as_str()),
            Cow::Owned(format_decimal(self.output_kb)),
            Cow::Owned(format_decimal(self.reduction_percent)),
        ]
    }
}

/// `WxH`.
pub fn resolution(dims: Dimensions) -> String {
    format!("{}x{}", dims.width, dims.height)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

/// Bytes → kilobytes, rounded to two decimals.
pub fn kilobytes(bytes: u64) -> f64 {
    round2(bytes as f64 / 1024.0)
}

/// `(1 - output/source) * 100`, rounded to two decimals. Negative when the
/// output grew; `0.0` for an empty source.
pub fn reduction_percent(source_bytes: u64, output_bytes: u64) -> f64 {
    if source_bytes == 0 {
        return 0.0;
    }
    round2((1.0 - output_bytes as f64 / source_bytes as f64) * 100.0)
}

/// Two fixed decimals, never `-0.00`.
pub fn format_decimal(value: f64) -> String {
    let value = if value == 0.0 { 0.0 } else { value };
    format!("{:.2}", value)
}

/// Quote a field when it contains a delimiter, quote or line break.
fn csv_field(value: &str) -> Cow<'_, str> {
    if value.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(value)
    }
}

fn push_record<'a>(out: &mut String, fields: impl IntoIterator<Item = &'a str>) {
    for (i, field) in fields.into_iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&csv_field(field));
    }
    out.push_str(LINE_END);
}

/// Render the header plus all rows.
pub fn render_csv(rows: &[ReportRow]) -> String {
    let mut out = String::new();
    push_record(&mut out, REPORT_HEADER);
    for row in rows {
        let fields = row.fields();
        push_record(&mut out, fields.iter().map(|f| f.as_ref()));
    }
    out
}

/// Write the report, replacing any previous one.
pub fn write_report(path: &Path, rows: &[ReportRow]) -> std::io::Result<()> {
    std::fs::write(path, render_csv(rows))
}
