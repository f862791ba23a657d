//! Pipeline driver.
//!
//! Ties the stages together for one run:
//!
//! ```text
//! scan::list_sources ──► check_expected ──► per source: open once
//!                                              │
//!                                              ├─► profile 1: crop → resize → encode
//!                                              ├─► profile 2: ...
//!                                              ▼
//!                                           drop decoded source
//!                                              │
//!                                   all sources ▼
//!                                       report::write_report
//! ```
//!
//! ## Output Structure
//!
//! ```text
//! assets/optimized/
//! ├── optimization-report.csv
//! ├── mobile-9x16/
//! │   ├── 001-050-escritorio-gamer.webp
//! │   └── 002-051-placard-vestidor.webp
//! └── desktop-16x9/
//!     ├── 001-050-escritorio-gamer.webp
//!     └── 002-051-placard-vestidor.webp
//! ```
//!
//! Processing is sequential. Progress is reported through a caller-supplied
//! callback so the library never prints on its own.
//!
//! ## Failure behaviour
//!
//! Any open, decode, encode or write failure aborts the run. The report is
//! only written once every source has succeeded, so a partial run never
//! leaves a report describing files that were not produced.

use crate::config::OptimizeConfig;
use crate::imaging::{
    BackendError, CropRect, Dimensions, ImageBackend, OutputFormat, RustBackend, create_variant,
    plan_variant,
};
use crate::naming::{output_file_name, slugify_with_fallback};
use crate::report::{self, ReportRow};
use crate::scan::{self, ScanError, SourceEntry};
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Scan(#[from] ScanError),
    #[error("Image processing failed: {0}")]
    Imaging(#[from] BackendError),
}

/// Progress notifications emitted while a run is in flight.
#[derive(Debug, Clone, PartialEq)]
pub enum OptimizeEvent {
    /// An `expected` prefix matched no source (warn policy only).
    MissingExpected { prefix: String },
    /// A source was decoded and is about to be rendered.
    SourceStarted {
        index: usize,
        total: usize,
        file_name: String,
        dimensions: Dimensions,
    },
    /// One variant was written; carries its report row.
    VariantWritten(ReportRow),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    /// Number of sources processed.
    pub sources: usize,
    /// Report rows in source-then-profile order.
    pub rows: Vec<ReportRow>,
    pub report_path: PathBuf,
    /// `(profile name, directory)` in profile order.
    pub profile_dirs: Vec<(String, PathBuf)>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// Nothing eligible in the source directory; nothing was written.
    NoSources { source_dir: PathBuf },
    Completed(RunSummary),
}

/// Run the pipeline with the production backend.
pub fn optimize(
    config: &OptimizeConfig,
    on_event: impl FnMut(&OptimizeEvent),
) -> Result<RunOutcome, ProcessError> {
    let backend = RustBackend::new();
    optimize_with_backend(&backend, config, on_event)
}

/// Run the pipeline using a specific backend (allows testing with mock).
pub fn optimize_with_backend<B: ImageBackend>(
    backend: &B,
    config: &OptimizeConfig,
    mut on_event: impl FnMut(&OptimizeEvent),
) -> Result<RunOutcome, ProcessError> {
    let sources = scan::list_sources(&config.source_dir, &config.sources)?;
    if sources.is_empty() {
        return Ok(RunOutcome::NoSources {
            source_dir: config.source_dir.clone(),
        });
    }

    for prefix in scan::check_expected(&sources, &config.sources)? {
        on_event(&OptimizeEvent::MissingExpected { prefix });
    }

    let mut profile_dirs = Vec::with_capacity(config.profiles.len());
    for profile in &config.profiles {
        let dir = config.profile_dir(profile);
        std::fs::create_dir_all(&dir)?;
        profile_dirs.push((profile.name.clone(), dir));
    }

    let total = sources.len();
    let mut rows = Vec::with_capacity(total * config.profiles.len());

    for entry in &sources {
        let source_bytes = std::fs::metadata(&entry.path)?.len();
        let decoded = backend.open(&entry.path)?;
        let dimensions = backend.dimensions(&decoded);

        on_event(&OptimizeEvent::SourceStarted {
            index: entry.index,
            total,
            file_name: entry.file_name.clone(),
            dimensions,
        });

        let slug = slugify_with_fallback(&entry.stem, &config.fallback_slug);
        for (profile, (_, dir)) in config.profiles.iter().zip(&profile_dirs) {
            let output_file = output_file_name(entry.index, &slug, profile.format.extension());
            let variant =
                create_variant(backend, &decoded, &profile.variant_target(), &dir.join(&output_file))?;

            let row = ReportRow::new(
                &entry.file_name,
                dimensions,
                source_bytes,
                &profile.name,
                Dimensions {
                    width: variant.width,
                    height: variant.height,
                },
                &output_file,
                variant.bytes,
            );
            on_event(&OptimizeEvent::VariantWritten(row.clone()));
            rows.push(row);
        }
        // `decoded` goes out of scope here, before the next source is opened.
    }

    let report_path = config.report_path();
    report::write_report(&report_path, &rows)?;

    Ok(RunOutcome::Completed(RunSummary {
        sources: total,
        rows,
        report_path,
        profile_dirs,
    }))
}

// =============================================================================
// Dry run
// =============================================================================

/// One output the pipeline would write.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlannedVariant {
    pub index: usize,
    pub source: String,
    pub source_resolution: String,
    pub profile: String,
    pub output: PathBuf,
    pub crop: CropRect,
    pub width: u32,
    pub height: u32,
    pub quality: u32,
    pub format: OutputFormat,
}

/// Everything an `optimize` run would do, without doing it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Plan {
    pub source_dir: PathBuf,
    pub missing_expected: Vec<String>,
    pub variants: Vec<PlannedVariant>,
    pub report_path: PathBuf,
}

/// Plan a run with the production backend.
pub fn plan(config: &OptimizeConfig) -> Result<Plan, ProcessError> {
    plan_with_backend(&RustBackend::new(), config)
}

/// Decode every source to learn its oriented size and compute all crop
/// windows. Creates no directories and writes no files.
pub fn plan_with_backend<B: ImageBackend>(
    backend: &B,
    config: &OptimizeConfig,
) -> Result<Plan, ProcessError> {
    let sources = scan::list_sources(&config.source_dir, &config.sources)?;
    let missing_expected = if sources.is_empty() {
        Vec::new()
    } else {
        scan::check_expected(&sources, &config.sources)?
    };

    let mut variants = Vec::with_capacity(sources.len() * config.profiles.len());
    for entry in &sources {
        let dimensions = backend.dimensions(&backend.open(&entry.path)?);
        variants.extend(plan_source(config, entry, dimensions));
    }

    Ok(Plan {
        source_dir: config.source_dir.clone(),
        missing_expected,
        variants,
        report_path: config.report_path(),
    })
}

fn plan_source(
    config: &OptimizeConfig,
    entry: &SourceEntry,
    dimensions: Dimensions,
) -> Vec<PlannedVariant> {
    let slug = slugify_with_fallback(&entry.stem, &config.fallback_slug);
    config
        .profiles
        .iter()
        .map(|profile| {
            let output = config.profile_dir(profile).join(output_file_name(
                entry.index,
                &slug,
                profile.format.extension(),
            ));
            let params = plan_variant(dimensions, &profile.variant_target(), &output);
            PlannedVariant {
                index: entry.index,
                source: entry.file_name.clone(),
                source_resolution: report::resolution(dimensions),
                profile: profile.name.clone(),
                output: params.output,
                crop: params.crop,
                width: params.width,
                height: params.height,
                quality: params.quality.value(),
                format: params.format,
            }
        })
        .collect()
}
