use std::fs;
use std::path::{Path, PathBuf};

use log::warn;
use serde::{Deserialize, Serialize};
use smartspread_engine::DataFormat;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // API
    #[serde(rename = "api.sheetsBase")]
    pub sheets_base: Option<String>,  // None = value saved with credentials

    #[serde(rename = "api.driveBase")]
    pub drive_base: Option<String>,

    #[serde(rename = "api.timeoutSecs")]
    pub timeout_secs: u64,

    #[serde(rename = "api.maxRetries")]
    pub max_retries: u32,

    // Tabs
    #[serde(rename = "tab.defaultFormat")]
    pub default_format: DataFormat,

    #[serde(rename = "tab.keepNumberFormatting")]
    pub keep_number_formatting: bool,

    #[serde(rename = "tab.newTabRows")]
    pub new_tab_rows: usize,

    #[serde(rename = "tab.newTabCols")]
    pub new_tab_cols: usize,

    // Writes
    #[serde(rename = "write.overwrite")]
    pub overwrite: bool,

    #[serde(rename = "write.asTable")]
    pub as_table: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            // API
            sheets_base: None,
            drive_base: None,
            timeout_secs: 60,
            max_retries: 3,
            // Tabs
            default_format: DataFormat::Frame,
            keep_number_formatting: false,
            new_tab_rows: 1000,
            new_tab_cols: 26,
            // Writes
            overwrite: false,
            as_table: false,
        }
    }
}

const DEFAULT_CONFIG: &str = r#"{
    // API endpoints (null = use the ones saved by `sspread login`)
    "api.sheetsBase": null,
    "api.driveBase": null,
    "api.timeoutSecs": 60,
    "api.maxRetries": 3,

    // Tabs: "frame", "records" or "rows"
    "tab.defaultFormat": "frame",
    "tab.keepNumberFormatting": false,
    "tab.newTabRows": 1000,
    "tab.newTabCols": 26,

    // Writes: overwrite clears the tab first; asTable adds a filter and a frozen bold header
    "write.overwrite": false,
    "write.asTable": false
}
"#;

impl Settings {
    /// Get the settings file path
    pub fn config_path() -> PathBuf {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("smartspread");
        config_dir.join("settings.json")
    }

    /// Load settings from disk, falling back to defaults.
    /// Writes a commented default file on first run.
    pub fn load() -> Self {
        let path = Self::config_path();

        if !path.exists() {
            create_default_file(&path);
            return Self::default();
        }
        Self::load_from(&path)
    }

    /// Load settings from `path`; unreadable or invalid files yield defaults.
    pub fn load_from(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(contents) => match Self::parse(&contents) {
                Ok(settings) => settings,
                Err(e) => {
                    warn!("Error parsing {}: {}; using default settings", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                warn!("Error reading {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Parse settings JSON. Lines starting with `//` are comments.
    pub fn parse(contents: &str) -> Result<Self, serde_json::Error> {
        let cleaned: String = contents
            .lines()
            .filter(|line| !line.trim().starts_with("//"))
            .collect::<Vec<_>>()
            .join("\n");
        serde_json::from_str(&cleaned)
    }

    /// Save current settings to disk
    pub fn save_to(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| e.to_string())?;
        }

        let json = serde_json::to_string_pretty(self)
            .map_err(|e| e.to_string())?;

        fs::write(path, json).map_err(|e| e.to_string())
    }
}

fn create_default_file(path: &Path) {
    if let Some(parent) = path.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            warn!("Error creating config directory: {}", e);
            return;
        }
    }

    if let Err(e) = fs::write(path, DEFAULT_CONFIG) {
        warn!("Error writing default settings.json: {}", e);
    }
}
