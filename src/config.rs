//! Web root configuration.
//!
//! Handles loading and validating `whitebear.toml`. The file lives
//! in the web root next to the pages it describes and is entirely optional:
//! stock defaults apply for every key it leaves out.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [classification]
//! index_filename = "index.html"   # Mandatory front page
//! extension = "html"              # Only files with this extension are pages
//! skip_markers = ["google", "404"] # Unrecognized files containing these are skipped
//!
//! [schemas]
//! # directory = "schemas"         # Use schema_<name>.toml files from here
//!
//! [seo.link_title]
//! min = 3
//! max = 100
//! placeholder = "Link title"
//!
//! [seo.image_alt]
//! min = 3
//! max = 125
//! placeholder = "Image description"
//!
//! [processing]
//! parallel = false                # Classify files on a worker pool
//! # max_processes = 4             # Max workers (omit for auto = CPU cores)
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse. Override just the values you want:
//!
//! ```toml
//! [classification]
//! skip_markers = ["google", "404", "yandex"]
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::seo::SeoPolicies;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the config file looked up in the web root.
pub const CONFIG_FILENAME: &str = "whitebear.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Configuration loaded from `whitebear.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WhitebearConfig {
    /// Which files are pages and which unmatched files are tolerated.
    pub classification: ClassificationConfig,
    /// Where the role schemas come from.
    pub schemas: SchemaConfig,
    /// SEO field policies for article images.
    pub seo: SeoPolicies,
    /// Parallel classification settings.
    pub processing: ProcessingConfig,
}

impl WhitebearConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let classification = &self.classification;
        if classification.extension.is_empty() || classification.extension.starts_with('.') {
            return Err(ConfigError::Validation(
                "classification.extension must be non-empty and without a leading dot".into(),
            ));
        }
        if classification.index_filename.is_empty()
            || classification.index_filename.contains(['/', '\\'])
        {
            return Err(ConfigError::Validation(
                "classification.index_filename must be a plain file name".into(),
            ));
        }
        if !classification
            .index_filename
            .ends_with(&format!(".{}", classification.extension))
        {
            return Err(ConfigError::Validation(format!(
                "classification.index_filename must end in .{}",
                classification.extension
            )));
        }
        if classification.skip_markers.iter().any(|m| m.is_empty()) {
            return Err(ConfigError::Validation(
                "classification.skip_markers must not contain empty markers".into(),
            ));
        }
        for (name, policy) in [
            ("link_title", &self.seo.link_title),
            ("image_alt", &self.seo.image_alt),
        ] {
            if policy.min > policy.max {
                return Err(ConfigError::Validation(format!(
                    "seo.{name}.min must not exceed seo.{name}.max"
                )));
            }
        }
        if self.processing.max_processes == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_processes must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Classification settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClassificationConfig {
    /// The front page that must exist and satisfy the index schema.
    pub index_filename: String,
    /// Extension (without dot) of files considered pages. Case sensitive.
    pub extension: String,
    /// Unrecognized files whose name contains any of these are skipped
    /// instead of failing the load.
    pub skip_markers: Vec<String>,
}

impl Default for ClassificationConfig {
    fn default() -> Self {
        Self {
            index_filename: "index.html".to_string(),
            extension: "html".to_string(),
            skip_markers: vec!["google".to_string(), "404".to_string()],
        }
    }
}

/// Schema source settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SchemaConfig {
    /// Directory holding `schema_<name>.toml`, relative to the web root.
    /// When absent the bundled schemas are used.
    pub directory: Option<PathBuf>,
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Classify files on the rayon pool instead of one by one.
    pub parallel: bool,
    /// Maximum number of parallel workers.
    /// When absent or null, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_processes.map(|n| n.min(cores)).unwrap_or(cores)
}

// =============================================================================
// Loading
// =============================================================================

/// Load `whitebear.toml` from the web root, or the stock defaults if absent.
///
/// The file is laid over the serialized defaults as raw TOML before it is
/// deserialized. `[seo.link_title]` and `[seo.image_alt]` share
/// [`FieldPolicy`](crate::seo::FieldPolicy) but not its defaults, so a table
/// that only sets `max` must inherit the bounds and placeholder of its own
/// field; `#[serde(default)]` cannot tell the two apart.
pub fn load_config(root: &Path) -> Result<WhitebearConfig, ConfigError> {
    let mut value = toml::Value::try_from(WhitebearConfig::default())?;
    let path = root.join(CONFIG_FILENAME);
    if path.exists() {
        let overlay: toml::Value = toml::from_str(&fs::read_to_string(&path)?)?;
        overlay_table(&mut value, overlay);
    }
    let config: WhitebearConfig = value.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Write every key of `overlay` into `base`, descending into tables present
/// in both. Arrays and scalars are replaced whole.
fn overlay_table(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base_table), toml::Value::Table(entries)) => {
            for (key, value) in entries {
                let descend =
                    value.is_table() && base_table.get(&key).is_some_and(toml::Value::is_table);
                if let Some(existing) = base_table.get_mut(&key).filter(|_| descend) {
                    overlay_table(existing, value);
                } else {
                    base_table.insert(key, value);
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

/// Returns a fully-commented stock `whitebear.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# White Bear Configuration
# ========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Place this file in the web root
# as whitebear.toml. Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Classification
# ---------------------------------------------------------------------------
[classification]
# Front page. It must exist and satisfy the index schema, otherwise the
# directory is not a White Bear web root.
index_filename = "index.html"

# Files directly in the web root with this extension are pages (case sensitive).
extension = "html"

# Pages that match no schema normally abort the load. Files whose name
# contains one of these markers are skipped instead (search-engine
# verification files, error pages).
skip_markers = ["google", "404"]

# ---------------------------------------------------------------------------
# Schemas
# ---------------------------------------------------------------------------
[schemas]
# Directory with schema_index.toml, schema_article.toml and schema_menu.toml,
# relative to the web root. Omit to use the bundled schemas.
# directory = "schemas"

# ---------------------------------------------------------------------------
# SEO checks for article images
# ---------------------------------------------------------------------------
[seo.link_title]
# Inclusive length bounds, in characters.
min = 3
max = 100
# Text a new image link starts with. Leaving it unchanged is flagged.
placeholder = "Link title"

[seo.image_alt]
min = 3
max = 125
placeholder = "Image description"

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Classify pages on a worker pool. When several pages are broken, which
# error is reported first is then unspecified.
parallel = false

# Maximum parallel workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}
