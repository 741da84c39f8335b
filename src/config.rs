use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::chart::Color;

/// Environment variable naming a JSON config file.
pub const CONFIG_ENV: &str = "RUSTY_OVERLAY_CONFIG";
/// Config file picked up from the working directory when present.
pub const DEFAULT_CONFIG_FILE: &str = "rusty-overlay.json";

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// User-tunable settings. Every field has a default, so a config file only
/// needs the keys it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Trace colours, reused cyclically. Any CSS colour name or `#rrggbb`.
    pub palette: Vec<String>,
    pub export: ExportConfig,
    pub window: WindowConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Suggested name for the exported document.
    pub file_name: String,
    /// plotly.js location referenced by exported documents.
    pub plotly_js_url: String,
    /// Local plotly.js to inline instead, for fully offline documents.
    pub plotly_js_path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub width: f32,
    pub height: f32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            palette: ["blue", "red", "green", "orange", "purple"]
                .into_iter()
                .map(String::from)
                .collect(),
            export: ExportConfig::default(),
            window: WindowConfig::default(),
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            file_name: "plotly_figure.html".to_string(),
            plotly_js_url: "https://cdn.plot.ly/plotly-2.35.2.min.js".to_string(),
            plotly_js_path: None,
        }
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1200.0,
            height: 800.0,
        }
    }
}

impl AppConfig {
    /// Load from `$RUSTY_OVERLAY_CONFIG`, else `./rusty-overlay.json`, else
    /// defaults.
    pub fn load() -> Result<Self> {
        let from_env = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
        match resolve_path(from_env, Path::new(DEFAULT_CONFIG_FILE)) {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: AppConfig = serde_json::from_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        config.validate()?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.palette.is_empty() {
            bail!("palette must contain at least one colour");
        }
        if self.export.file_name.trim().is_empty() {
            bail!("export.file_name must not be empty");
        }
        Ok(())
    }

    pub fn palette(&self) -> Vec<Color> {
        self.palette.iter().map(Color::new).collect()
    }
}

/// An explicitly named file always wins; the working-directory file is only
/// used when it exists.
fn resolve_path(from_env: Option<PathBuf>, fallback: &Path) -> Option<PathBuf> {
    from_env.or_else(|| fallback.is_file().then(|| fallback.to_path_buf()))
}
