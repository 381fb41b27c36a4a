//! Whole-trial pole check
//!
//! Stages run strictly in order, each consuming the previous stage's output:
//! validity mask → pole geometry → plate activation → alignment → verdicts.
//! Marker and channel problems abort with an error before any plate data is
//! touched; a plate with no usable contact still produces a verdict, and the
//! caller decides what to do with it via [`TrialOutcome::check`].

use crate::activation::classify;
use crate::alignment::align_plates;
use crate::channels::resolve_plate;
use crate::config::PoleCheckConfig;
use crate::error::{PoleCheckError, PoleResult};
use crate::geometry::{compute_validity_mask, pole_geometry, PoleGeometry};
use crate::markers::{cop_markers, pole_markers, ModelOutput};
use crate::report::{nan_mean_std, summarize_plates, TrialReport};
use crate::trial::TrialInput;
use crate::types::{
    DifferenceRecord, FrameValidityMask, PerPlate, PlateId, ValidationVerdict, VerdictStatus,
};

/// Everything one run produces
#[derive(Clone, Debug)]
pub struct TrialOutcome {
    pub mask: FrameValidityMask,
    pub pole: PoleGeometry,
    /// Mean and SD of the high-to-low midpoint distance over valid frames (mm)
    pub pole_length_mean: f64,
    pub pole_length_std: f64,
    pub active_samples: PerPlate<usize>,
    pub double_contact_samples: usize,
    pub records: PerPlate<Vec<DifferenceRecord>>,
    pub verdicts: PerPlate<ValidationVerdict>,
    /// Modelled markers for the capture system: pole low/high/point, then COP±X/±Y
    pub model_outputs: Vec<ModelOutput>,
}

impl TrialOutcome {
    /// Fails with every plate that never produced a usable contact
    pub fn check(&self) -> Result<(), Vec<PoleCheckError>> {
        let missing: Vec<PoleCheckError> = self
            .verdicts
            .iter()
            .filter(|(_, v)| v.status == VerdictStatus::NoActiveSamples)
            .map(|(plate, _)| PoleCheckError::NoActiveSamples { plate })
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(missing)
        }
    }

    pub fn passed(&self) -> bool {
        self.verdicts.iter().all(|(_, v)| v.passed())
    }

    pub fn report(&self, trial: &TrialInput, config: &PoleCheckConfig, generated_at: String) -> TrialReport {
        TrialReport {
            trial_name: trial.trial_name.clone(),
            subject: trial.subject.clone(),
            generated_at,
            config: config.clone(),
            verdicts: self.verdicts.clone(),
            records: self.records.clone(),
        }
    }
}

pub fn run_trial(trial: &TrialInput, config: &PoleCheckConfig) -> PoleResult<TrialOutcome> {
    let frame_count = trial.frame_count;
    let ratio = config.ratio;
    log::info!("Frames of data: {}", frame_count);

    let required: Vec<_> = config
        .required_markers()
        .into_iter()
        .map(|name| trial.marker(name))
        .collect();
    let required_refs: Vec<_> = required.iter().collect();
    let mask = compute_validity_mask(&required_refs, frame_count)?;
    if !mask.any_valid() {
        return Err(PoleCheckError::NoValidGeometryFrame);
    }
    log::info!("{} of {} frames have every pole marker", mask.valid_count(), frame_count);

    // required[0..4] are the low pair then the high pair
    let pole = pole_geometry(
        (&required[0], &required[1]),
        (&required[2], &required[3]),
        config.extra_length,
        &mask,
    )?;
    let (pole_length_mean, pole_length_std) = nan_mean_std(&pole.pole_length);
    log::info!(
        "Mean distance between midpoints: {:.2} mm  SD: {:.2} mm",
        pole_length_mean,
        pole_length_std
    );

    let plate1 = resolve_plate(&trial.devices, PlateId::Plate1, &config.plate1.device)?;
    let plate2 = resolve_plate(&trial.devices, PlateId::Plate2, &config.plate2.device)?;
    let expected_samples = frame_count
        .checked_mul(ratio)
        .ok_or_else(|| PoleCheckError::LengthMismatch {
            what: format!("{} channels ({} frames at ratio {})", plate1.plate, frame_count, ratio),
            expected: usize::MAX,
            actual: plate1.sample_count(),
        })?;
    for channels in [&plate1, &plate2] {
        if channels.sample_count() != expected_samples {
            return Err(PoleCheckError::LengthMismatch {
                what: format!("{} channels", channels.plate),
                expected: expected_samples,
                actual: channels.sample_count(),
            });
        }
    }

    let activation = classify(
        &plate1.samples(),
        &plate2.samples(),
        config.force_threshold,
        &config.plate1,
        &config.plate2,
    )?;
    let active_samples = PerPlate::new(
        activation.active_count(PlateId::Plate1),
        activation.active_count(PlateId::Plate2),
    );

    let records = align_plates(&mask, &pole.tip, &activation, ratio);
    let verdicts = summarize_plates(&records, config.tolerance);
    for (plate, v) in verdicts.iter() {
        log::info!(
            "{}: {} aligned frames, mean {:.3} mm, SD {:.3} mm, {:?}",
            plate,
            v.sample_count,
            v.mean_magnitude,
            v.std_magnitude,
            v.status
        );
    }

    let mut model_outputs = pole_markers(&pole, &mask);
    model_outputs.extend(cop_markers(&activation, frame_count, ratio, config.cop_marker_offset));

    Ok(TrialOutcome {
        mask,
        pole,
        pole_length_mean,
        pole_length_std,
        active_samples,
        double_contact_samples: activation.double_contact_samples,
        records,
        verdicts,
        model_outputs,
    })
}
