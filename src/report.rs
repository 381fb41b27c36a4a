use ndarray::Array1;
use serde::Serialize;

use crate::config::PoleCheckConfig;
use crate::types::{DifferenceRecord, PerPlate, PlateId, ValidationVerdict, VerdictStatus};

/// Default pass/fail limit on mean discrepancy (mm)
pub const DEFAULT_TOLERANCE_MM: f64 = 5.0;

/// Population mean and standard deviation. Empty input gives NaN for both.
fn mean_std(values: Vec<f64>) -> (f64, f64) {
    if values.is_empty() {
        return (f64::NAN, f64::NAN);
    }
    let arr = Array1::from_vec(values);
    let mean = arr.mean().unwrap_or(f64::NAN);
    (mean, arr.std(0.0))
}

/// Mean and standard deviation ignoring NaN entries
pub fn nan_mean_std(values: &[f64]) -> (f64, f64) {
    mean_std(values.iter().copied().filter(|v| !v.is_nan()).collect())
}

/// Reduce one plate's difference records to a verdict.
///
/// No records, or a NaN mean, gives `NoActiveSamples` with NaN statistics.
/// Otherwise the plate passes iff the mean magnitude is within `tolerance`,
/// boundary included.
pub fn summarize(plate: PlateId, records: &[DifferenceRecord], tolerance: f64) -> ValidationVerdict {
    let (mean_magnitude, std_magnitude) = mean_std(records.iter().map(|r| r.magnitude).collect());
    let (mean_dx, std_dx) = mean_std(records.iter().map(|r| r.dx).collect());
    let (mean_dy, std_dy) = mean_std(records.iter().map(|r| r.dy).collect());

    let status = if records.is_empty() || mean_magnitude.is_nan() {
        VerdictStatus::NoActiveSamples
    } else if mean_magnitude <= tolerance {
        VerdictStatus::Pass
    } else {
        VerdictStatus::Fail
    };

    ValidationVerdict {
        plate,
        sample_count: records.len(),
        mean_magnitude,
        std_magnitude,
        mean_dx,
        mean_dy,
        std_dx,
        std_dy,
        tolerance,
        status,
    }
}

pub fn summarize_plates(
    records: &PerPlate<Vec<DifferenceRecord>>,
    tolerance: f64,
) -> PerPlate<ValidationVerdict> {
    records.map(|plate, recs| summarize(plate, recs, tolerance))
}

/// Everything the report writer needs: verdicts plus raw records for charting
#[derive(Clone, Debug, Serialize)]
pub struct TrialReport {
    pub trial_name: String,
    pub subject: String,
    pub generated_at: String,
    pub config: PoleCheckConfig,
    pub verdicts: PerPlate<ValidationVerdict>,
    pub records: PerPlate<Vec<DifferenceRecord>>,
}

impl TrialReport {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// One line per plate for the console
    pub fn summary_lines(&self) -> Vec<String> {
        self.verdicts
            .iter()
            .map(|(plate, v)| {
                let label = match v.status {
                    VerdictStatus::Pass => "PASS",
                    VerdictStatus::Fail => "FAIL",
                    VerdictStatus::NoActiveSamples => "NO DATA",
                };
                format!(
                    "{} meanCOPdiff {:.3} mm  stdCOPdiff {:.3} mm  (x {:.3}, y {:.3}, n={})  {}",
                    plate, v.mean_magnitude, v.std_magnitude, v.mean_dx, v.mean_dy, v.sample_count, label
                )
            })
            .collect()
    }
}
