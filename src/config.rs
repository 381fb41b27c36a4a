use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::report::DEFAULT_TOLERANCE_MM;
use crate::types::{AxisSign, PerPlate, PlateGeometry};

/// Rig constants for one pole check run. Every field has a default, so a
/// config file only needs the values that differ.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoleCheckConfig {
    /// Vertical force below which a plate counts as loaded (N, negative = downward)
    pub force_threshold: f64,
    /// Tip distance beyond the low midpoint, measured on the pole (mm)
    pub extra_length: f64,
    /// Plate samples per marker frame
    pub ratio: usize,
    /// Pass limit on mean discrepancy (mm)
    pub tolerance: f64,
    /// Shift of the COP±X / COP±Y display markers (mm)
    pub cop_marker_offset: f64,
    pub plate1: PlateGeometry,
    pub plate2: PlateGeometry,
    /// Marker pair nearest the tip
    pub low_markers: [String; 2],
    /// Marker pair at the far end of the pole
    pub high_markers: [String; 2],
    /// Markers that must be present but do not enter the geometry
    pub extra_markers: Vec<String>,
}

impl Default for PoleCheckConfig {
    fn default() -> Self {
        Self {
            force_threshold: -50.0,
            extra_length: 98.0,
            ratio: 10,
            tolerance: DEFAULT_TOLERANCE_MM,
            cop_marker_offset: 15.0,
            plate1: PlateGeometry {
                device: "Force Plate 1".to_string(),
                offset_x: -232.0,
                offset_y: -254.0,
                sign: AxisSign::Negative,
            },
            plate2: PlateGeometry {
                device: "Force Plate 2".to_string(),
                offset_x: 232.0,
                offset_y: -255.0,
                sign: AxisSign::Positive,
            },
            low_markers: ["Pole1".to_string(), "Pole2".to_string()],
            high_markers: ["Pole3".to_string(), "Pole4".to_string()],
            extra_markers: vec!["Pole5".to_string()],
        }
    }
}

impl PoleCheckConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: PoleCheckConfig = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.ratio == 0 {
            bail!("ratio must be a positive integer");
        }
        if self.force_threshold.is_nan() || self.force_threshold >= 0.0 {
            bail!(
                "force_threshold must be negative (downward load), got {}",
                self.force_threshold
            );
        }
        if !self.tolerance.is_finite() || self.tolerance < 0.0 {
            bail!("tolerance must be a non-negative number, got {}", self.tolerance);
        }
        Ok(())
    }

    pub fn plates(&self) -> PerPlate<PlateGeometry> {
        PerPlate::new(self.plate1.clone(), self.plate2.clone())
    }

    /// Every marker that must exist for a frame to count
    pub fn required_markers(&self) -> Vec<&str> {
        self.low_markers
            .iter()
            .chain(self.high_markers.iter())
            .chain(self.extra_markers.iter())
            .map(|s| s.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = PoleCheckConfig::default();
        assert_eq!(config.force_threshold, -50.0);
        assert_eq!(config.extra_length, 98.0);
        assert_eq!(config.ratio, 10);
        assert_eq!(config.tolerance, 5.0);
        assert_eq!(config.plate1.sign, AxisSign::Negative);
        assert_eq!(config.plate2.sign, AxisSign::Positive);
        assert_eq!(
            config.required_markers(),
            vec!["Pole1", "Pole2", "Pole3", "Pole4", "Pole5"]
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"force_threshold": -80.0, "plate2": {{"device": "FP B", "offset_x": 1.0, "offset_y": 2.0, "sign": "negative"}}}}"#
        )
        .unwrap();

        let config = PoleCheckConfig::load(file.path()).unwrap();
        assert_eq!(config.force_threshold, -80.0);
        assert_eq!(config.plate2.device, "FP B");
        assert_eq!(config.plate2.sign, AxisSign::Negative);
        assert_eq!(config.ratio, 10);
        assert_eq!(config.plate1, PoleCheckConfig::default().plate1);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = PoleCheckConfig::default();
        config.ratio = 0;
        assert!(config.validate().is_err());

        let mut config = PoleCheckConfig::default();
        config.force_threshold = 50.0;
        assert!(config.validate().is_err());

        let mut config = PoleCheckConfig::default();
        config.tolerance = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let err = PoleCheckConfig::load("/nonexistent/pole_check.json").unwrap_err();
        assert!(err.to_string().contains("Failed to read config"));
    }
}
