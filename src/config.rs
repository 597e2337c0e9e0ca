use std::path::Path;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

use crate::hours::BaseWindow;

/// The daily base window, in whole wall-clock hours.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HoursConfig {
    #[serde(default = "default_base_start")]
    pub base_start: u32,
    #[serde(default = "default_base_end")]
    pub base_end: u32,
}

impl Default for HoursConfig {
    fn default() -> Self {
        Self {
            base_start: default_base_start(),
            base_end: default_base_end(),
        }
    }
}

/// User configuration, read from `<app-dir>/config.toml`. A missing file
/// means defaults, a broken file is an error the user has to fix.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub hours: HoursConfig,
    /// Project name stamped on sessions started without `--project`.
    #[serde(default = "default_project")]
    pub project: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            hours: HoursConfig::default(),
            project: default_project(),
        }
    }
}

fn default_base_start() -> u32 {
    9
}

fn default_base_end() -> u32 {
    18
}

fn default_project() -> String {
    "Workday".into()
}

impl Config {
    pub fn load(app_dir: &Path) -> Result<Config> {
        let path = app_dir.join("config.toml");
        let content = match std::fs::read_to_string(&path) {
            Ok(v) => v,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Config::default()),
            Err(e) => return Err(e).with_context(|| format!("Failed to read {path:?}")),
        };

        let config: Config =
            toml::from_str(&content).with_context(|| format!("Failed to parse {path:?}"))?;
        config.base_window()?;
        Ok(config)
    }

    pub fn base_window(&self) -> Result<BaseWindow> {
        BaseWindow::new_opt(self.hours.base_start, self.hours.base_end).ok_or_else(|| {
            anyhow!(
                "Invalid base window {}..{} in configuration",
                self.hours.base_start,
                self.hours.base_end
            )
        })
    }
}
