//! Optimizer configuration.
//!
//! Handles loading, merging and validating `optimize.toml`. The stock defaults
//! reproduce the site's historical layout (`assets/` → `assets/optimized/`,
//! one 9:16 and one 16:9 WebP profile); a user file only needs the keys it
//! wants to change.
//!
//! ## Config File
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! source_dir = "assets"
//! output_dir = "assets/optimized"
//! report_name = "optimization-report.csv"
//! fallback_slug = "image"
//!
//! [sources]
//! extensions = ["png", "jpg", "jpeg", "webp", "avif", "tif", "tiff"]
//! exclude_prefixes = ["logo", "favicon"]
//! exclude_exact = ["image-manifest.json"]
//! expected = []
//! missing_expected = "warn"
//!
//! [[profiles]]
//! name = "mobile-9x16"
//! width = 1080
//! height = 1920
//! quality = 75
//! format = "webp"
//!
//! [[profiles]]
//! name = "desktop-16x9"
//! width = 1920
//! height = 1080
//! quality = 78
//! format = "webp"
//! ```
//!
//! ## Merging
//!
//! Tables merge key by key; arrays replace the default wholesale. Declaring a
//! single `[[profiles]]` entry therefore yields exactly one profile.
//!
//! Unknown keys are rejected to catch typos early.
//!
//! Once loaded, an [`OptimizeConfig`] is never mutated by the pipeline: it is
//! built at startup and passed down by reference.

use crate::imaging::{OutputFormat, Quality, VariantTarget, supported_input_extensions};
use crate::naming;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Config file looked up in the working directory when `--config` is absent.
pub const CONFIG_FILENAME: &str = "optimize.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Top-level configuration for one optimizer run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OptimizeConfig {
    /// Directory holding the source photographs (not scanned recursively).
    pub source_dir: PathBuf,
    /// Base directory; each profile writes into `<output_dir>/<profile.name>/`.
    pub output_dir: PathBuf,
    /// Report filename, written inside `output_dir`.
    pub report_name: String,
    /// Slug used when a filename stem has no usable characters.
    pub fallback_slug: String,
    /// Source discovery rules.
    pub sources: SourcesConfig,
    /// Output profiles, rendered in this order for every source.
    pub profiles: Vec<Profile>,
}

impl Default for OptimizeConfig {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("assets"),
            output_dir: PathBuf::from("assets/optimized"),
            report_name: "optimization-report.csv".to_string(),
            fallback_slug: naming::DEFAULT_SLUG.to_string(),
            sources: SourcesConfig::default(),
            profiles: Profile::stock(),
        }
    }
}

impl OptimizeConfig {
    /// Full path of the CSV report.
    pub fn report_path(&self) -> PathBuf {
        self.output_dir.join(&self.report_name)
    }

    /// Output directory for a profile.
    pub fn profile_dir(&self, profile: &Profile) -> PathBuf {
        self.output_dir.join(&profile.name)
    }

    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.profiles.is_empty() {
            return Err(ConfigError::Validation(
                "at least one [[profiles]] entry is required".into(),
            ));
        }

        let mut seen = HashSet::new();
        for profile in &self.profiles {
            profile.validate()?;
            if !seen.insert(profile.name.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "duplicate profile name '{}'",
                    profile.name
                )));
            }
        }

        if self.sources.extensions.is_empty() {
            return Err(ConfigError::Validation(
                "sources.extensions must not be empty".into(),
            ));
        }
        let supported = supported_input_extensions();
        for ext in &self.sources.extensions {
            let normalized = normalize_extension(ext);
            if !supported.contains(&normalized.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "sources.extensions: no decoder for '{}' (supported: {})",
                    ext,
                    supported.join(", ")
                )));
            }
        }

        if !naming::is_slug(&self.fallback_slug) {
            return Err(ConfigError::Validation(format!(
                "fallback_slug '{}' must be lowercase a-z/0-9 words joined by single hyphens",
                self.fallback_slug
            )));
        }

        if !is_plain_file_name(&self.report_name) {
            return Err(ConfigError::Validation(format!(
                "report_name '{}' must be a plain file name",
                self.report_name
            )));
        }

        Ok(())
    }
}

/// What to do when an `expected` source is absent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingPolicy {
    /// Report it and keep going.
    #[default]
    Warn,
    /// Abort before anything is written.
    Error,
}

/// Source discovery rules. All name comparisons are case-insensitive.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SourcesConfig {
    /// Accepted file extensions, without the dot.
    pub extensions: Vec<String>,
    /// Filenames starting with any of these are skipped (logos, favicons).
    pub exclude_prefixes: Vec<String>,
    /// Exact filenames to skip.
    pub exclude_exact: Vec<String>,
    /// Stem prefixes that must match at least one source.
    pub expected: Vec<String>,
    pub missing_expected: MissingPolicy,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            extensions: ["png", "jpg", "jpeg", "webp", "avif", "tif", "tiff"]
                .map(String::from)
                .to_vec(),
            exclude_prefixes: vec!["logo".to_string(), "favicon".to_string()],
            exclude_exact: vec!["image-manifest.json".to_string()],
            expected: Vec::new(),
            missing_expected: MissingPolicy::Warn,
        }
    }
}

/// A named output variant: exact pixel size, codec and quality.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Profile {
    /// Also the output subdirectory name.
    pub name: String,
    pub width: u32,
    pub height: u32,
    /// Lossy quality, 1-100.
    pub quality: u32,
    #[serde(default)]
    pub format: OutputFormat,
}

impl Profile {
    /// The two variants the site templates reference.
    pub fn stock() -> Vec<Profile> {
        vec![
            Profile {
                name: "mobile-9x16".to_string(),
                width: 1080,
                height: 1920,
                quality: 75,
                format: OutputFormat::Webp,
            },
            Profile {
                name: "desktop-16x9".to_string(),
                width: 1920,
                height: 1080,
                quality: 78,
                format: OutputFormat::Webp,
            },
        ]
    }

    /// Size and encoding handed to the imaging layer.
    pub fn variant_target(&self) -> VariantTarget {
        VariantTarget {
            width: self.width,
            height: self.height,
            quality: Quality::new(self.quality),
            format: self.format,
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !is_plain_file_name(&self.name) {
            return Err(ConfigError::Validation(format!(
                "profile name '{}' must be a plain directory name",
                self.name
            )));
        }
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::Validation(format!(
                "profile '{}': width and height must be non-zero",
                self.name
            )));
        }
        if !(1..=100).contains(&self.quality) {
            return Err(ConfigError::Validation(format!(
                "profile '{}': quality must be 1-100",
                self.name
            )));
        }
        Ok(())
    }
}

/// Lowercase an extension and drop a leading dot (`".PNG"` → `"png"`).
pub fn normalize_extension(ext: &str) -> String {
    ext.trim_start_matches('.').to_ascii_lowercase()
}

fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\'])
        && !name.chars().any(char::is_control)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(OptimizeConfig::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay, arrays included, replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Read a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<OptimizeConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: OptimizeConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load `optimize.toml` from `dir`, falling back to stock defaults when the
/// file is absent.
pub fn load_config(dir: &Path) -> Result<OptimizeConfig, ConfigError> {
    let overlay = load_raw_config(&dir.join(CONFIG_FILENAME))?;
    resolve_config(stock_defaults_value()?, overlay)
}

/// Load an explicitly named config file. A missing file is an error.
pub fn load_config_file(path: &Path) -> Result<OptimizeConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let overlay: toml::Value = toml::from_str(&content)?;
    resolve_config(stock_defaults_value()?, Some(overlay))
}

/// Returns a fully-commented stock `optimize.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Asset Optimizer Configuration
# ============================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
# Unknown keys will cause an error.

# Directory with the source photographs. Only its top level is read.
source_dir = "assets"

# Base output directory. Each profile writes to <output_dir>/<profile name>/.
output_dir = "assets/optimized"

# CSV report written to <output_dir>/<report_name> after every run.
report_name = "optimization-report.csv"

# Slug used when a filename has no letters or digits left after cleanup.
fallback_slug = "image"

# ---------------------------------------------------------------------------
# Source discovery (all comparisons are case-insensitive)
# ---------------------------------------------------------------------------
[sources]
# File extensions to process.
extensions = ["png", "jpg", "jpeg", "webp", "avif", "tif", "tiff"]

# Skip files whose name starts with one of these (site chrome, not content).
exclude_prefixes = ["logo", "favicon"]

# Skip these exact filenames.
exclude_exact = ["image-manifest.json"]

# Filename stem prefixes that must be present, e.g. ["050-escritorio_gamer"].
expected = []

# "warn" reports missing expected sources and continues; "error" aborts.
missing_expected = "warn"

# ---------------------------------------------------------------------------
# Output profiles
# ---------------------------------------------------------------------------
# Every source is center-cropped to each profile's aspect ratio, resized to
# exactly width x height and encoded lossily. Declaring any [[profiles]]
# replaces this whole list.
#
# format: "webp" or "avif". quality: 1-100.

[[profiles]]
name = "mobile-9x16"
width = 1080
height = 1920
quality = 75
format = "webp"

[[profiles]]
name = "desktop-16x9"
width = 1920
height = 1080
quality = 78
format = "webp"
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_matches_site_layout() {
        let config = OptimizeConfig::default();
        assert_eq!(config.source_dir, PathBuf::from("assets"));
        assert_eq!(config.output_dir, PathBuf::from("assets/optimized"));
        assert_eq!(
            config.report_path(),
            PathBuf::from("assets/optimized/optimization-report.csv")
        );
        assert_eq!(config.fallback_slug, "image");
    }

    #[test]
    fn default_extensions_include_avif() {
        let config = OptimizeConfig::default();
        assert!(config.sources.extensions.iter().any(|e| e == "avif"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn default_profiles() {
        let config = OptimizeConfig::default();
        let names: Vec<&str> = config.profiles.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["mobile-9x16", "desktop-16x9"]);
        let mobile = config.profiles[0].variant_target();
        assert_eq!((mobile.width, mobile.height), (1080, 1920));
        let desktop = config.profiles[1].variant_target();
        assert_eq!((desktop.width, desktop.height), (1920, 1080));
        assert_eq!(desktop.quality.value(), 78);
        assert_eq!(desktop.format, OutputFormat::Webp);
    }

    #[test]
    fn profile_dir_joins_name() {
        let config = OptimizeConfig::default();
        assert_eq!(
            config.profile_dir(&config.profiles[1]),
            PathBuf::from("assets/optimized/desktop-16x9")
        );
    }

    #[test]
    fn parse_partial_config() {
        let toml = r#"
source_dir = "img"

[sources]
exclude_prefixes = ["logo"]
"#;
        let config: OptimizeConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.source_dir, PathBuf::from("img"));
        assert_eq!(config.sources.exclude_prefixes, vec!["logo"]);
        // Defaults preserved
        assert_eq!(config.sources.exclude_exact, vec!["image-manifest.json"]);
        assert_eq!(config.profiles.len(), 2);
    }

    #[test]
    fn profile_format_defaults_to_webp() {
        let toml = r#"
[[profiles]]
name = "square"
width = 800
height = 800
quality = 80
"#;
        let config: OptimizeConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.profiles.len(), 1);
        assert_eq!(config.profiles[0].format, OutputFormat::Webp);
    }

    #[test]
    fn missing_policy_parses() {
        let toml = r#"
[sources]
expected = ["050-escritorio_gamer"]
missing_expected = "error"
"#;
        let config: OptimizeConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.sources.missing_expected, MissingPolicy::Error);
        assert_eq!(config.sources.expected, vec!["050-escritorio_gamer"]);
    }

    // =========================================================================
    // merge_toml tests
    // =========================================================================

    #[test]
    fn merge_toml_scalar_override() {
        let base: toml::Value = toml::from_str("a = 1\nb = 2").unwrap();
        let overlay: toml::Value = toml::from_str("b = 3").unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged["a"].as_integer(), Some(1));
        assert_eq!(merged["b"].as_integer(), Some(3));
    }

    #[test]
    fn merge_toml_nested_table() {
        let base = stock_defaults_value().unwrap();
        let overlay: toml::Value = toml::from_str(
            r#"
[sources]
missing_expected = "error"
"#,
        )
        .unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged["sources"]["missing_expected"].as_str(), Some("error"));
        // Sibling keys survive
        assert!(merged["sources"]["extensions"].as_array().is_some());
    }

    #[test]
    fn merge_toml_arrays_replace() {
        let base = stock_defaults_value().unwrap();
        let overlay: toml::Value = toml::from_str(
            r#"
[[profiles]]
name = "hero"
width = 2400
height = 1000
quality = 80
format = "avif"
"#,
        )
        .unwrap();
        let config = resolve_config(base, Some(overlay)).unwrap();
        assert_eq!(config.profiles.len(), 1);
        assert_eq!(config.profiles[0].name, "hero");
        assert_eq!(config.profiles[0].format, OutputFormat::Avif);
    }

    // =========================================================================
    // Unknown keys
    // =========================================================================

    #[test]
    fn unknown_key_rejected() {
        let result: Result<OptimizeConfig, _> = toml::from_str("sorce_dir = \"x\"");
        assert!(result.is_err());
    }

    #[test]
    fn unknown_nested_key_rejected() {
        let result: Result<OptimizeConfig, _> = toml::from_str("[sources]\nexclude = []");
        assert!(result.is_err());
    }

    #[test]
    fn unknown_profile_key_rejected() {
        let toml = r#"
[[profiles]]
name = "x"
width = 10
height = 10
quality = 80
qualty = 80
"#;
        let result: Result<OptimizeConfig, _> = toml::from_str(toml);
        assert!(result.is_err());
    }

    // =========================================================================
    // Validation tests
    // =========================================================================

    #[test]
    fn validate_default_config_passes() {
        assert!(OptimizeConfig::default().validate().is_ok());
    }

    #[test]
    fn validate_empty_profiles() {
        let config = OptimizeConfig {
            profiles: vec![],
            ..OptimizeConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn validate_duplicate_profile_names() {
        let mut config = OptimizeConfig::default();
        config.profiles[1].name = "mobile-9x16".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn validate_zero_dimensions() {
        let mut config = OptimizeConfig::default();
        config.profiles[0].width = 0;
        assert!(config.validate().is_err());

        let mut config = OptimizeConfig::default();
        config.profiles[0].height = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_quality_range() {
        let mut config = OptimizeConfig::default();
        config.profiles[0].quality = 100;
        assert!(config.validate().is_ok());

        config.profiles[0].quality = 1;
        assert!(config.validate().is_ok());

        config.profiles[0].quality = 0;
        assert!(config.validate().is_err());

        config.profiles[0].quality = 101;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("quality"));
    }

    #[test]
    fn validate_profile_name_is_plain() {
        for bad in ["", ".", "..", "a/b", "a\\b"] {
            let mut config = OptimizeConfig::default();
            config.profiles[0].name = bad.to_string();
            assert!(config.validate().is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn validate_extensions() {
        let mut config = OptimizeConfig::default();
        config.sources.extensions = vec![".PNG".to_string(), "Jpg".to_string()];
        assert!(config.validate().is_ok());

        config.sources.extensions = vec!["avif".to_string()];
        assert!(config.validate().is_ok());

        config.sources.extensions = vec!["gif".to_string()];
        assert!(config.validate().is_err());

        config.sources.extensions = vec![];
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_fallback_slug() {
        let mut config = OptimizeConfig::default();
        config.fallback_slug = "Photo!".to_string();
        assert!(config.validate().is_err());

        config.fallback_slug = "photo-2".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_report_name() {
        let mut config = OptimizeConfig::default();
        config.report_name = "../report.csv".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn normalize_extension_strips_dot() {
        assert_eq!(normalize_extension(".JPEG"), "jpeg");
        assert_eq!(normalize_extension("png"), "png");
    }

    // =========================================================================
    // load_config tests
    // =========================================================================

    #[test]
    fn load_config_returns_default_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.profiles, Profile::stock());
    }

    #[test]
    fn load_config_reads_file() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join(CONFIG_FILENAME),
            r#"
output_dir = "public/img"
report_name = "report.csv"
"#,
        )
        .unwrap();

        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.report_path(), PathBuf::from("public/img/report.csv"));
        assert_eq!(config.source_dir, PathBuf::from("assets"));
    }

    #[test]
    fn load_config_validates_values() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join(CONFIG_FILENAME),
            r#"
[[profiles]]
name = "broken"
width = 100
height = 100
quality = 200
"#,
        )
        .unwrap();

        let result = load_config(tmp.path());
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn load_config_file_requires_file() {
        let tmp = TempDir::new().unwrap();
        let result = load_config_file(&tmp.path().join("missing.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn load_raw_config_returns_none_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let result = load_raw_config(&tmp.path().join(CONFIG_FILENAME)).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn stock_config_toml_matches_defaults() {
        let parsed: OptimizeConfig = toml::from_str(stock_config_toml()).unwrap();
        let defaults = OptimizeConfig::default();
        assert_eq!(parsed.source_dir, defaults.source_dir);
        assert_eq!(parsed.output_dir, defaults.output_dir);
        assert_eq!(parsed.report_name, defaults.report_name);
        assert_eq!(parsed.fallback_slug, defaults.fallback_slug);
        assert_eq!(parsed.sources.extensions, defaults.sources.extensions);
        assert_eq!(parsed.sources.exclude_prefixes, defaults.sources.exclude_prefixes);
        assert_eq!(parsed.profiles, defaults.profiles);
        assert!(parsed.validate().is_ok());
    }
}
