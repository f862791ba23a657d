//! # Asset Optimizer
//!
//! Turns a folder of product photographs into exact-size, ratio-correct,
//! lossy-compressed variants for a static storefront, plus a CSV report of
//! what was written and how much smaller it got.
//!
//! # Pipeline
//!
//! A single linear pass, run once per invocation:
//!
//! ```text
//! 1. Enumerate   assets/*.{png,jpg,...}   →  sorted, 1-based index
//! 2. Name        "050-escritorio_gamer"   →  "050-escritorio-gamer"
//! 3. Crop        center window at the profile's aspect ratio
//! 4. Encode      resize to exact size, WebP/AVIF at profile quality
//! 5. Report      one CSV row per (source, profile)
//! ```
//!
//! Data flows strictly forward. Each source is decoded once, rendered for
//! every profile, then released before the next one is opened.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`config`] | `optimize.toml` loading, merging over stock defaults, validation |
//! | [`scan`] | Source enumeration, exclusions, expected-source check |
//! | [`naming`] | Slug derivation and `NNN-slug.ext` output names |
//! | [`imaging`] | Crop math, the backend trait, and the pure-Rust encoder backend |
//! | [`process`] | Pipeline driver and dry-run planner |
//! | [`report`] | Report rows and CSV output |
//! | [`output`] | CLI output formatting |
//!
//! # Determinism
//!
//! Sources are sorted by filename before indices are assigned, and slugs are
//! a pure function of the filename stem. Re-running over an unchanged source
//! directory overwrites every output with the same name and reproduces the
//! report row for row.

pub mod config;
pub mod imaging;
pub mod naming;
pub mod output;
pub mod process;
pub mod report;
pub mod scan;

#[cfg(test)]
pub(crate) mod test_helpers;
