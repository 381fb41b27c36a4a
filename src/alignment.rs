//! Index alignment between the marker stream and the plate stream
//!
//! The plate stream runs at a fixed integer multiple of the marker rate.
//! Marker frame `i` is paired with plate sample `i * ratio` only; the samples
//! in between are never looked at and nothing is interpolated.

use crate::activation::ActivationResult;
use crate::types::{
    horizontal, Activation, DifferenceRecord, FrameValidityMask, PerPlate, PlateId, VirtualMarker,
};

/// `(frame, plate_sample)` pairs for every marker frame. Frames whose sample
/// index would overflow are dropped.
pub fn decimated_indices(frame_count: usize, ratio: usize) -> impl Iterator<Item = (usize, usize)> {
    (0..frame_count).map_while(move |frame| frame.checked_mul(ratio).map(|sample| (frame, sample)))
}

/// Difference records for one plate.
///
/// A frame contributes only if it is valid in the mask and `plate` is the
/// active plate at the decimated sample. Other frames are skipped, so the
/// result is usually shorter than the trial. Frames past the end of `tip` or
/// of the plate stream are skipped as well.
pub fn align(
    mask: &FrameValidityMask,
    tip: &VirtualMarker,
    activation: &ActivationResult,
    ratio: usize,
    plate: PlateId,
) -> Vec<DifferenceRecord> {
    let wanted = Activation::active(plate);
    let cop = activation.corrected_cop.get(plate);

    decimated_indices(mask.len(), ratio)
        .filter(|&(frame, _)| mask.is_valid(frame))
        .filter(|&(_, sample)| activation.assignment.get(sample) == Some(&wanted))
        .filter_map(|(frame, sample)| {
            let measured = *cop.get(sample)?;
            let tip_xy = horizontal(tip.points.get(frame)?);
            Some(DifferenceRecord::new(frame, sample, measured, tip_xy))
        })
        .collect()
}

pub fn align_plates(
    mask: &FrameValidityMask,
    tip: &VirtualMarker,
    activation: &ActivationResult,
    ratio: usize,
) -> PerPlate<Vec<DifferenceRecord>> {
    PerPlate::new(
        align(mask, tip, activation, ratio, PlateId::Plate1),
        align(mask, tip, activation, ratio, PlateId::Plate2),
    )
}
