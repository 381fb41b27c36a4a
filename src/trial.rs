use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::channels::DeviceMetadata;
use crate::types::Trajectory;

/// One captured trial, as exported from the capture system
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TrialInput {
    pub trial_name: String,
    #[serde(default)]
    pub subject: String,
    pub frame_count: usize,
    pub markers: Vec<Trajectory>,
    #[serde(default)]
    pub devices: Vec<DeviceMetadata>,
}

impl TrialInput {
    /// Load a trial export (`.json` or `.json.gz`)
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Failed to open trial {}", path.display()))?;
        let trial: TrialInput = if path.extension().map(|e| e == "gz").unwrap_or(false) {
            let gz = GzDecoder::new(file);
            serde_json::from_reader(BufReader::new(gz))
        } else {
            serde_json::from_reader(BufReader::new(file))
        }
        .with_context(|| format!("Failed to parse trial {}", path.display()))?;
        Ok(trial)
    }

    /// Marker by name. A marker missing from the export reads as an empty
    /// trajectory, which validity gating reports as `MissingMarker`.
    pub fn marker(&self, name: &str) -> Trajectory {
        self.markers
            .iter()
            .find(|m| m.name == name)
            .cloned()
            .unwrap_or_else(|| Trajectory {
                name: name.to_string(),
                ..Default::default()
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    const TRIAL_JSON: &str = r#"{
        "trial_name": "Pole 01",
        "frame_count": 2,
        "markers": [
            {"name": "Pole1", "x": [1.0, 2.0], "y": [0.0, 0.0], "z": [5.0, 5.0], "exists": [true, false]}
        ],
        "devices": [
            {"name": "Force Plate 1", "outputs": [
                {"kind": "Force", "components": ["Fz"], "channels": [[-60.0, 0.0]]}
            ]}
        ]
    }"#;

    #[test]
    fn test_load_plain_json() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        file.write_all(TRIAL_JSON.as_bytes()).unwrap();

        let trial = TrialInput::load(file.path()).unwrap();
        assert_eq!(trial.trial_name, "Pole 01");
        assert_eq!(trial.frame_count, 2);
        assert_eq!(trial.subject, "");
        assert_eq!(trial.devices[0].outputs[0].channels[0], vec![-60.0, 0.0]);
        assert!(trial.marker("Pole1").exists_at(0));
    }

    #[test]
    fn test_load_gzip_json() {
        let file = tempfile::Builder::new().suffix(".json.gz").tempfile().unwrap();
        let mut encoder = GzEncoder::new(file.reopen().unwrap(), Compression::default());
        encoder.write_all(TRIAL_JSON.as_bytes()).unwrap();
        encoder.finish().unwrap();

        let trial = TrialInput::load(file.path()).unwrap();
        assert_eq!(trial.markers.len(), 1);
    }

    #[test]
    fn test_absent_marker_is_empty() {
        let trial = TrialInput::default();
        let traj = trial.marker("Pole5");
        assert_eq!(traj.name, "Pole5");
        assert!(traj.is_empty());
    }

    #[test]
    fn test_load_bad_json() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        file.write_all(b"{ not json").unwrap();
        let err = TrialInput::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse trial"));
    }
}
