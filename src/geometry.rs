//! Pole geometry over full-length marker sequences
//!
//! Every function keeps one output element per capture frame so results stay
//! index-aligned with the trajectories handed back to the capture system.
//! Undefined frames hold zero in trajectories that are written back, and NaN
//! in internal-only sequences.

use crate::error::{PoleCheckError, PoleResult};
use crate::types::{FrameValidityMask, Trajectory, Vec3, VirtualMarker};

/// Build the validity mask: a frame is valid iff every required marker exists there.
///
/// Fails with `MissingMarker` for the first marker that was never captured,
/// and with `LengthMismatch` if a trajectory does not span `frame_count` frames.
pub fn compute_validity_mask(
    required: &[&Trajectory],
    frame_count: usize,
) -> PoleResult<FrameValidityMask> {
    for traj in required {
        if traj.is_empty() || !traj.is_captured() {
            return Err(PoleCheckError::MissingMarker {
                marker: traj.name.clone(),
            });
        }
        let lengths = [traj.exists.len(), traj.x.len(), traj.y.len(), traj.z.len()];
        if let Some(&actual) = lengths.iter().find(|&&len| len != frame_count) {
            return Err(PoleCheckError::LengthMismatch {
                what: format!("marker {}", traj.name),
                expected: frame_count,
                actual,
            });
        }
    }

    let flags = (0..frame_count)
        .map(|frame| required.iter().all(|traj| traj.exists_at(frame)))
        .collect();
    Ok(FrameValidityMask::from_flags(flags))
}

/// Componentwise average of two markers at valid frames, zero elsewhere.
///
/// # Panics
/// If either trajectory is shorter than `mask`. [`pole_geometry`] checks this.
pub fn midpoint(a: &Trajectory, b: &Trajectory, mask: &FrameValidityMask) -> VirtualMarker {
    let points = (0..mask.len())
        .map(|frame| {
            if mask.is_valid(frame) {
                (a.point(frame) + b.point(frame)) / 2.0
            } else {
                Vec3::zeros()
            }
        })
        .collect();
    VirtualMarker { points }
}

/// Euclidean distance per frame; NaN at invalid frames.
///
/// # Panics
/// If `a` or `b` has fewer points than `mask`.
pub fn distance(a: &VirtualMarker, b: &VirtualMarker, mask: &FrameValidityMask) -> Vec<f64> {
    (0..mask.len())
        .map(|frame| {
            if mask.is_valid(frame) {
                (b.points[frame] - a.points[frame]).norm()
            } else {
                f64::NAN
            }
        })
        .collect()
}

/// `(to - from) / magnitude` per frame, ignoring validity.
///
/// A zero or NaN magnitude yields non-finite components; nothing is raised.
pub fn unit_vector(from: &VirtualMarker, to: &VirtualMarker, magnitude: &[f64]) -> Vec<Vec3> {
    from.points
        .iter()
        .zip(to.points.iter())
        .zip(magnitude.iter())
        .map(|((f, t), &m)| (t - f) / m)
        .collect()
}

/// `origin + unit * (base_distance + extra_length)` at valid frames, zero elsewhere.
///
/// # Panics
/// If `origin`, `unit` or `base_distance` is shorter than `mask`.
pub fn extrapolate(
    origin: &VirtualMarker,
    unit: &[Vec3],
    base_distance: &[f64],
    extra_length: f64,
    mask: &FrameValidityMask,
) -> VirtualMarker {
    let points = (0..mask.len())
        .map(|frame| {
            if mask.is_valid(frame) {
                origin.points[frame] + unit[frame] * (base_distance[frame] + extra_length)
            } else {
                Vec3::zeros()
            }
        })
        .collect();
    VirtualMarker { points }
}

/// Midpoints and tip derived from the two marker pairs on the pole
#[derive(Clone, Debug)]
pub struct PoleGeometry {
    /// Midpoint of the pair nearest the tip
    pub low: VirtualMarker,
    /// Midpoint of the far pair; origin of the extrapolation
    pub high: VirtualMarker,
    /// Tip extrapolated from `high` through `low`
    pub tip: VirtualMarker,
    /// |low - high| per frame, NaN at invalid frames
    pub pole_length: Vec<f64>,
}

/// Fails with `LengthMismatch` if any of the four trajectories is shorter
/// than the mask.
pub fn pole_geometry(
    low_pair: (&Trajectory, &Trajectory),
    high_pair: (&Trajectory, &Trajectory),
    extra_length: f64,
    mask: &FrameValidityMask,
) -> PoleResult<PoleGeometry> {
    for traj in [low_pair.0, low_pair.1, high_pair.0, high_pair.1] {
        let shortest = traj.x.len().min(traj.y.len()).min(traj.z.len());
        if shortest < mask.len() {
            return Err(PoleCheckError::LengthMismatch {
                what: format!("marker {}", traj.name),
                expected: mask.len(),
                actual: shortest,
            });
        }
    }

    let low = midpoint(low_pair.0, low_pair.1, mask);
    let high = midpoint(high_pair.0, high_pair.1, mask);
    let pole_length = distance(&high, &low, mask);
    let unit = unit_vector(&high, &low, &pole_length);
    let tip = extrapolate(&high, &unit, &pole_length, extra_length, mask);

    Ok(PoleGeometry {
        low,
        high,
        tip,
        pole_length,
    })
}
