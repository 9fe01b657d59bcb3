// Assistant settings
// Loaded from ~/.config/gridwise/settings.json

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // Undo
    /// Snapshots up to this many cells are also written to the persistent journal.
    #[serde(rename = "undo.persistCellCap")]
    pub undo_persist_cell_cap: usize,

    // Rates
    #[serde(rename = "rates.baseUrl")]
    pub rates_base_url: String,

    #[serde(rename = "rates.timeoutSecs")]
    pub rates_timeout_secs: u64,

    // Holidays
    #[serde(rename = "holidays.jurisdiction")]
    pub holidays_jurisdiction: String,

    // Scheduling
    #[serde(rename = "schedule.outputCell")]
    pub schedule_output_cell: String,

    #[serde(rename = "schedule.maxBusinessDays")]
    pub schedule_max_business_days: usize,

    // Report output sheets
    #[serde(rename = "output.runRateSheet")]
    pub run_rate_sheet: String,

    #[serde(rename = "output.periodCompareSheet")]
    pub period_compare_sheet: String,

    #[serde(rename = "output.periodSummarySheet")]
    pub period_summary_sheet: String,

    #[serde(rename = "output.rollingSheet")]
    pub rolling_sheet: String,

    #[serde(rename = "output.varianceSheet")]
    pub variance_sheet: String,

    // Preview
    #[serde(rename = "preview.sampleRows")]
    pub sample_rows: usize,

    #[serde(rename = "preview.sampleColumns")]
    pub sample_columns: usize,

    #[serde(rename = "preview.maxRows")]
    pub preview_max_rows: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            undo_persist_cell_cap: 2000,
            rates_base_url: "https://api.cnb.cz/cnbapi".to_string(),
            rates_timeout_secs: 30,
            holidays_jurisdiction: "CZ".to_string(),
            schedule_output_cell: "H1".to_string(),
            schedule_max_business_days: 1000,
            run_rate_sheet: "_RunRate".to_string(),
            period_compare_sheet: "_PeriodCompare".to_string(),
            period_summary_sheet: "_PeriodSummary".to_string(),
            rolling_sheet: "_Rolling".to_string(),
            variance_sheet: "_Variance".to_string(),
            sample_rows: 6,
            sample_columns: 3,
            preview_max_rows: 5,
        }
    }
}

impl Settings {
    /// Get the settings file path
    pub fn config_path() -> PathBuf {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("gridwise");
        config_dir.join("settings.json")
    }

    /// Load settings from the default location, falling back to defaults
    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    /// Load settings from `path`. Missing or unreadable files yield defaults.
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(contents) => match Self::parse(&contents) {
                Ok(settings) => settings,
                Err(e) => {
                    log::warn!("Error parsing {}: {}; using default settings", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                log::warn!("Error reading {}: {}", path.display(), e);
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

    /// Save current settings to the default location
    pub fn save(&self) -> Result<(), String> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| e.to_string())?;
        }

        let json = serde_json::to_string_pretty(self)
            .map_err(|e| e.to_string())?;

        fs::write(path, json).map_err(|e| e.to_string())
    }

    /// Get the config file path for display
    pub fn config_path_display() -> String {
        Self::config_path().to_string_lossy().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let s = Settings::default();
        assert_eq!(s.undo_persist_cell_cap, 2000);
        assert_eq!(s.run_rate_sheet, "_RunRate");
        assert_eq!(s.schedule_output_cell, "H1");
    }

    #[test]
    fn test_parse_with_comments_and_partial_keys() {
        let json = r#"{
    // keep small edits durable
    "undo.persistCellCap": 50,
    "rates.baseUrl": "http://localhost:9000"
}"#;
        let s = Settings::parse(json).unwrap();
        assert_eq!(s.undo_persist_cell_cap, 50);
        assert_eq!(s.rates_base_url, "http://localhost:9000");
        assert_eq!(s.period_compare_sheet, "_PeriodCompare");
    }

    #[test]
    fn test_load_from_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let s = Settings::load_from(&dir.path().join("nope.json"));
        assert_eq!(s, Settings::default());
    }

    #[test]
    fn test_load_from_invalid_json_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ not json").unwrap();
        assert_eq!(Settings::load_from(&path), Settings::default());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        let mut s = Settings::default();
        s.variance_sheet = "_Odchylky".to_string();
        s.save_to(&path).unwrap();
        assert_eq!(Settings::load_from(&path), s);
    }
}
