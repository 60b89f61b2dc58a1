//! Application configuration for pipeviz.
//!
//! Project config lives at `./pipeviz.toml` next to the mkdocs project.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{PipevizError, Result};

/// Default configuration file name.
pub const CONFIG_FILE_NAME: &str = "pipeviz.toml";

// ---------------------------------------------------------------------------
// Config structs (matching pipeviz.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// PlantUML graph rendering.
    #[serde(default)]
    pub plantuml: PlantUmlConfig,

    /// Navigation generation.
    #[serde(default)]
    pub nav: NavConfig,

    /// Log output.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// `[plantuml]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlantUmlConfig {
    /// Emit a task dependency graph on pipeline pages.
    #[serde(default = "default_true")]
    pub graphs: bool,

    /// Graph layout: "TB" (top to bottom) or "LR" (left to right).
    #[serde(default = "default_graph_direction")]
    pub graph_direction: String,

    /// PlantUML theme name; `_none_` omits the `!theme` directive.
    #[serde(default = "default_theme")]
    pub theme: String,
}

impl Default for PlantUmlConfig {
    fn default() -> Self {
        Self {
            graphs: true,
            graph_direction: default_graph_direction(),
            theme: default_theme(),
        }
    }
}

impl PlantUmlConfig {
    /// The PlantUML layout directive for the configured direction.
    ///
    /// Anything other than `LR` falls back to top-to-bottom.
    pub fn direction_directive(&self) -> &'static str {
        if self.graph_direction.eq_ignore_ascii_case("LR") {
            "left to right direction"
        } else {
            "top to bottom direction"
        }
    }
}

fn default_true() -> bool {
    true
}
fn default_graph_direction() -> String {
    "TB".into()
}
fn default_theme() -> String {
    "_none_".into()
}

/// `[nav]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavConfig {
    /// Build the navigation tree at all. Pages are rendered either way.
    #[serde(default = "default_true")]
    pub generation: bool,

    /// Label of the top-level pipelines section.
    #[serde(default = "default_section_pipelines")]
    pub section_pipelines: String,

    /// Label of the top-level tasks section.
    #[serde(default = "default_section_tasks")]
    pub section_tasks: String,

    /// `"start:end"` slice over a pipeline's directory segments.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pipeline_grouping_offset: Option<String>,

    /// `"start:end"` slice over a task's directory segments.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_grouping_offset: Option<String>,
}

impl Default for NavConfig {
    fn default() -> Self {
        Self {
            generation: true,
            section_pipelines: default_section_pipelines(),
            section_tasks: default_section_tasks(),
            pipeline_grouping_offset: None,
            task_grouping_offset: None,
        }
    }
}

fn default_section_pipelines() -> String {
    "Pipelines".into()
}
fn default_section_tasks() -> String {
    "Tasks".into()
}

/// `[logging]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default log level when `RUST_LOG` and `-v` are absent.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".into()
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Load `pipeviz.toml` from `dir`. Returns defaults if the file does not exist.
pub fn load_config(dir: &Path) -> Result<AppConfig> {
    let path = dir.join(CONFIG_FILE_NAME);

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| PipevizError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        PipevizError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Write a default `pipeviz.toml` into `dir`.
/// Returns the path to the created file. Refuses to overwrite.
pub fn init_config(dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(dir).map_err(|e| PipevizError::io(dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    if path.exists() {
        return Err(PipevizError::config(format!(
            "{} already exists",
            path.display()
        )));
    }

    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| PipevizError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| PipevizError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
