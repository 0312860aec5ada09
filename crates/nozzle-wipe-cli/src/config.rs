//! TOML configuration for the `nozzle-wipe` binary.

use std::path::Path;

use anyhow::{Context, Result};
use nozzle_wipe::WipeSettings;
use nozzle_wipe_gcode::{GcodeWriter, TrackerSettings};
use serde::{Deserialize, Serialize};

/// Everything the binary can be configured with. Missing tables and keys
/// fall back to their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Wipe out and back (`true`) or half the distance both ways.
    pub full_wipe: bool,
    /// Retraction and feedrate settings.
    pub settings: WipeSettings,
    /// Firmware assumptions for position tracking.
    pub gcode: TrackerSettings,
    /// Number formatting for emitted wipes.
    pub output: GcodeWriter,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            full_wipe: true,
            settings: WipeSettings::default(),
            gcode: TrackerSettings::default(),
            output: GcodeWriter::default(),
        }
    }
}

impl Config {
    /// Read a config file, or use the defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("invalid config {}", path.display()))
    }

    fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_empty_config_is_default() {
        assert_eq!(Config::parse("").unwrap(), Config::default());
        assert_eq!(Config::load(None).unwrap(), Config::default());
    }

    #[test]
    fn test_partial_tables() {
        let config = Config::parse(
            r#"
full_wipe = false

[settings]
retraction_length = 1.5
wipe_feedrate = 2000

[gcode]
g90_influences_extruder = true

[output]
extrusion_precision = 3
"#,
        )
        .unwrap();
        assert!(!config.full_wipe);
        assert_relative_eq!(config.settings.retraction_length, 1.5);
        assert_relative_eq!(config.settings.wipe_feedrate, 2000.0);
        assert_relative_eq!(config.settings.retraction_feedrate, 2400.0);
        assert!(config.gcode.g90_influences_extruder);
        assert_eq!(config.output.extrusion_precision, 3);
        assert_eq!(config.output.coordinate_precision, 3);
    }

    #[test]
    fn test_bad_values_rejected() {
        assert!(Config::parse("full_wipe = \"yes\"").is_err());
        assert!(Config::parse("[settings]\nretraction_length = \"long\"").is_err());
    }

    #[test]
    fn test_missing_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("wipe.toml");
        let err = Config::load(Some(missing.as_path())).unwrap_err();
        assert!(err.to_string().contains("wipe.toml"));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wipe.toml");
        std::fs::write(&path, "[settings]\nretraction_length = 1.2\n").unwrap();
        let config = Config::load(Some(path.as_path())).unwrap();
        assert!(config.full_wipe);
        assert_relative_eq!(config.settings.retraction_length, 1.2);
    }
}
