//! Site configuration module.
//!
//! Handles loading, validating, and merging the `config.toml` that may sit in
//! the notes root. Stock defaults are serialized to a TOML table and the user
//! file is merged on top of it, so a config file only needs the keys it wants
//! to change.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [renderer]
//! backend = "pandoc"          # "pandoc" or "builtin"
//! program = "pandoc"          # executable used by the pandoc backend
//! args = []                   # extra arguments placed before the standard ones
//!
//! [output]
//! tree_file = "notesTree.json"
//! copy_assets = false         # mirror non-Markdown files into the output
//!
//! [toc]
//! # assets_dir = "toc"        # viewer assets, relative to the notes root (never scanned as notes)
//!
//! [processing]
//! # max_processes = 4         # concurrent renderer processes (default: CPU cores)
//! ```
//!
//! The file itself is metadata: the tree builder never lists `config.toml`
//! found in the notes root as content. Unknown keys are rejected to catch
//! typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name of the site configuration, looked up in the notes root only.
pub const CONFIG_FILE: &str = "config.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Site configuration loaded from `config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Which Markdown renderer to use and how to invoke it.
    pub renderer: RendererConfig,
    /// Output layout settings.
    pub output: OutputConfig,
    /// Table-of-contents viewer settings.
    pub toc: TocConfig,
    /// Concurrency settings for renderer jobs.
    pub processing: ProcessingConfig,
}

impl SiteConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.renderer.program.trim().is_empty() {
            return Err(ConfigError::Validation(
                "renderer.program must not be empty".into(),
            ));
        }
        let tree_file = &self.output.tree_file;
        if tree_file.is_empty() || tree_file.contains('/') || tree_file.contains('\\') {
            return Err(ConfigError::Validation(
                "output.tree_file must be a plain file name".into(),
            ));
        }
        if self.processing.max_processes == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_processes must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Markdown renderer backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RendererBackend {
    /// External `pandoc` process per Markdown file.
    #[default]
    Pandoc,
    /// In-process pulldown-cmark conversion.
    Builtin,
}

/// Renderer settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RendererConfig {
    pub backend: RendererBackend,
    /// Executable for the pandoc backend.
    pub program: String,
    /// Arguments inserted before the standard pandoc arguments.
    pub args: Vec<String>,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            backend: RendererBackend::Pandoc,
            program: "pandoc".to_string(),
            args: Vec::new(),
        }
    }
}

/// Output layout settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// Name of the serialized tree written to the output root.
    pub tree_file: String,
    /// Copy non-Markdown files (images, attachments) next to the generated HTML.
    pub copy_assets: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            tree_file: crate::tree::TREE_FILE.to_string(),
            copy_assets: false,
        }
    }
}

/// Table-of-contents viewer settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TocConfig {
    /// Directory of viewer assets, relative to the notes root.
    /// It is left out of the notes tree when it lies inside the root.
    /// When absent, the built-in viewer is written instead.
    pub assets_dir: Option<PathBuf>,
}

/// Concurrency settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of renderer jobs in flight.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective worker count from config.
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
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(SiteConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// Tables merge key-by-key; any other overlay value replaces the base value.
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

/// Load `config.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if the directory has no config file.
pub fn load_raw_config(dir: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = dir.join(CONFIG_FILE);
    if !config_path.is_file() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<SiteConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: SiteConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load the site config for a notes root, falling back to stock defaults.
pub fn load_config(root: &Path) -> Result<SiteConfig, ConfigError> {
    let base = stock_defaults_value();
    let overlay = load_raw_config(root)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `config.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# notes-site configuration
# ========================
# Place this file in the root of your notes directory. All settings are
# optional; the values below are the defaults. Unknown keys cause an error.

# ---------------------------------------------------------------------------
# Markdown renderer
# ---------------------------------------------------------------------------
[renderer]
# "pandoc" runs an external pandoc process per note,
# "builtin" converts in process (templates may use $body$ and $title$).
backend = "pandoc"

# Executable used by the pandoc backend.
program = "pandoc"

# Extra arguments placed before the standard ones, e.g. ["--lua-filter", "links.lua"].
args = []

# ---------------------------------------------------------------------------
# Output
# ---------------------------------------------------------------------------
[output]
# Serialized note tree consumed by the table-of-contents viewer.
tree_file = "notesTree.json"

# Copy images and other non-Markdown files next to the generated pages.
copy_assets = false

# ---------------------------------------------------------------------------
# Table of contents
# ---------------------------------------------------------------------------
[toc]
# Directory with your own viewer (index.html, scripts, styles), relative to
# the notes root. A directory inside the notes root is not scanned as notes.
# Omit to get the built-in viewer.
# assets_dir = "toc"

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum renderer processes running at once.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}
