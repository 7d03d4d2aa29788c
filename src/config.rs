// src/config.rs

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::constants::{
    COLUMN_CONTROLLED, COLUMN_PERIOD, COLUMN_SETPOINT, COLUMN_TIMESTAMP, DEFAULT_AMPLITUDE_MIN,
    DEFAULT_DELIMITER, DEFAULT_FRACTION_SEPARATOR, DEFAULT_R2_MIN, DEFAULT_TIMESTAMP_FORMAT,
    DEFAULT_WINDOW_S, MIN_WINDOW_SAMPLES,
};
use crate::data_analysis::sinusoid_fit::MIN_FIT_SAMPLES;
use crate::error::BodeError;

/// Thresholds and window length used by the sweep and single-period analyses.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    /// Trailing window (seconds) of each excitation period that is fitted
    pub window_s: f64,
    /// Minimum number of samples the window must contain
    pub min_window_samples: usize,
    /// Minimum output amplitude for an accepted point (signal units)
    pub amplitude_min: f64,
    /// Minimum output R² for an accepted point
    pub r2_min: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            window_s: DEFAULT_WINDOW_S,
            min_window_samples: MIN_WINDOW_SAMPLES,
            amplitude_min: DEFAULT_AMPLITUDE_MIN,
            r2_min: DEFAULT_R2_MIN,
        }
    }
}

impl AnalysisConfig {
    pub fn validate(&self) -> Result<(), BodeError> {
        if !self.window_s.is_finite() || self.window_s <= 0.0 {
            return Err(BodeError::Config(format!(
                "window_s must be a positive number of seconds, got {}",
                self.window_s
            )));
        }
        if self.min_window_samples < MIN_FIT_SAMPLES {
            return Err(BodeError::Config(format!(
                "min_window_samples must be at least {}, got {}",
                MIN_FIT_SAMPLES, self.min_window_samples
            )));
        }
        if !self.amplitude_min.is_finite() || self.amplitude_min < 0.0 {
            return Err(BodeError::Config(format!(
                "amplitude_min must be non-negative, got {}",
                self.amplitude_min
            )));
        }
        if !self.r2_min.is_finite() || self.r2_min > 1.0 {
            return Err(BodeError::Config(format!(
                "r2_min must be a finite value no greater than 1.0, got {}",
                self.r2_min
            )));
        }
        Ok(())
    }
}

/// Layout of the logged CSV file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ColumnConfig {
    pub timestamp: String,
    pub period: String,
    pub setpoint: String,
    pub controlled: String,
    pub delimiter: char,
    /// chrono format of the timestamp up to whole seconds
    pub timestamp_format: String,
    /// Separator between whole seconds and the fractional part, e.g. `12:00:01,250`
    pub fraction_separator: char,
}

impl Default for ColumnConfig {
    fn default() -> Self {
        Self {
            timestamp: COLUMN_TIMESTAMP.to_string(),
            period: COLUMN_PERIOD.to_string(),
            setpoint: COLUMN_SETPOINT.to_string(),
            controlled: COLUMN_CONTROLLED.to_string(),
            delimiter: DEFAULT_DELIMITER,
            timestamp_format: DEFAULT_TIMESTAMP_FORMAT.to_string(),
            fraction_separator: DEFAULT_FRACTION_SEPARATOR,
        }
    }
}

impl ColumnConfig {
    /// Column names that must be present in the header row.
    pub fn required_columns(&self) -> [&str; 4] {
        [
            self.timestamp.as_str(),
            self.period.as_str(),
            self.setpoint.as_str(),
            self.controlled.as_str(),
        ]
    }

    /// The delimiter as the single byte the csv reader expects.
    pub fn delimiter_byte(&self) -> Result<u8, BodeError> {
        if self.delimiter.is_ascii() {
            Ok(self.delimiter as u8)
        } else {
            Err(BodeError::Config(format!(
                "CSV delimiter must be an ASCII character, got '{}'",
                self.delimiter
            )))
        }
    }

    pub fn validate(&self) -> Result<(), BodeError> {
        self.delimiter_byte()?;
        for name in self.required_columns() {
            if name.trim().is_empty() {
                return Err(BodeError::Config("column names must not be empty".to_string()));
            }
        }
        Ok(())
    }
}

/// Top level configuration, optionally read from a TOML file.
///
/// ```toml
/// [analysis]
/// window_s = 20.0
/// r2_min = 0.9
///
/// [columns]
/// delimiter = ","
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub analysis: AnalysisConfig,
    pub columns: ColumnConfig,
}

impl AppConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, BodeError> {
        let config: AppConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, BodeError> {
        let content = fs::read_to_string(path).map_err(|source| BodeError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<(), BodeError> {
        self.analysis.validate()?;
        self.columns.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_constants() {
        let config = AppConfig::default();
        assert_eq!(config.analysis.window_s, 30.0);
        assert_eq!(config.analysis.min_window_samples, 10);
        assert_eq!(config.analysis.amplitude_min, 0.05);
        assert_eq!(config.analysis.r2_min, 0.85);
        assert_eq!(
            config.columns.required_columns(),
            ["DataHora", "Período", "Setpoint", "Variavel_Controlada"]
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = AppConfig::from_toml_str(
            r#"
            [analysis]
            window_s = 20.0

            [columns]
            delimiter = ","
            "#,
        )
        .unwrap();
        assert_eq!(config.analysis.window_s, 20.0);
        assert_eq!(config.analysis.r2_min, 0.85);
        assert_eq!(config.columns.delimiter_byte().unwrap(), b',');
        assert_eq!(config.columns.setpoint, "Setpoint");
    }

    #[test]
    fn test_rejects_invalid_values() {
        assert!(matches!(
            AppConfig::from_toml_str("[analysis]\nwindow_s = -1.0\n"),
            Err(BodeError::Config(_))
        ));
        assert!(matches!(
            AppConfig::from_toml_str("[analysis]\nmin_window_samples = 2\n"),
            Err(BodeError::Config(_))
        ));
        assert!(matches!(
            AppConfig::from_toml_str("[columns]\ndelimiter = \"§\"\n"),
            Err(BodeError::Config(_))
        ));
    }

    #[test]
    fn test_unknown_keys_are_errors() {
        assert!(matches!(
            AppConfig::from_toml_str("[analysis]\nwindow = 10.0\n"),
            Err(BodeError::ConfigFormat(_))
        ));
    }
}
