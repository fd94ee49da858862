use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Configuration from config.toml in the data directory
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub export: ExportConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Store file name, relative to the data directory
    #[serde(default = "default_store_file")]
    pub file: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            file: default_store_file(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Output file for `tm export` when no `--output` is given
    #[serde(default = "default_export_file")]
    pub file: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        ExportConfig {
            file: default_export_file(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    /// strftime pattern for start/deadline display, rendered in local time
    #[serde(default = "default_time_format")]
    pub time_format: String,
    /// Hex color overrides keyed by role (pending, active, expired, completed, highlight)
    #[serde(default)]
    pub colors: HashMap<String, String>,
}

impl Default for UiConfig {
    fn default() -> Self {
        UiConfig {
            time_format: default_time_format(),
            colors: HashMap::new(),
        }
    }
}

fn default_store_file() -> String {
    "tasks.json".into()
}

fn default_export_file() -> String {
    "todo_tasks.csv".into()
}

/// Matches what a browser's `toLocaleString()` prints for en-US
pub fn default_time_format() -> String {
    "%-m/%-d/%Y, %-I:%M:%S %p".into()
}
