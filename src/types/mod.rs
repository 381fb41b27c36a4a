pub mod linalg;

pub use linalg::*;

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Force plate identifier. Only two reference plates are supported.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PlateId {
    Plate1,
    Plate2,
}

impl PlateId {
    pub const ALL: [PlateId; 2] = [PlateId::Plate1, PlateId::Plate2];
}

impl Display for PlateId {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            PlateId::Plate1 => write!(f, "FP1"),
            PlateId::Plate2 => write!(f, "FP2"),
        }
    }
}

/// A value held once per plate
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PerPlate<T> {
    pub plate1: T,
    pub plate2: T,
}

impl<T> PerPlate<T> {
    pub fn new(plate1: T, plate2: T) -> Self {
        Self { plate1, plate2 }
    }

    pub fn get(&self, plate: PlateId) -> &T {
        match plate {
            PlateId::Plate1 => &self.plate1,
            PlateId::Plate2 => &self.plate2,
        }
    }

    pub fn map<U>(&self, mut f: impl FnMut(PlateId, &T) -> U) -> PerPlate<U> {
        PerPlate {
            plate1: f(PlateId::Plate1, &self.plate1),
            plate2: f(PlateId::Plate2, &self.plate2),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (PlateId, &T)> {
        [(PlateId::Plate1, &self.plate1), (PlateId::Plate2, &self.plate2)].into_iter()
    }
}

/// Marker trajectory as delivered by the capture system (columnar x/y/z/exists).
///
/// An empty `exists` vector means the marker is not part of the trial at all.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Trajectory {
    pub name: String,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub z: Vec<f64>,
    pub exists: Vec<bool>,
}

impl Trajectory {
    pub fn from_points(name: &str, points: &[Option<Vec3>]) -> Self {
        let mut traj = Trajectory {
            name: name.to_string(),
            ..Default::default()
        };
        for point in points {
            let p = point.unwrap_or_else(Vec3::zeros);
            traj.x.push(p.x);
            traj.y.push(p.y);
            traj.z.push(p.z);
            traj.exists.push(point.is_some());
        }
        traj
    }

    pub fn len(&self) -> usize {
        self.exists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exists.is_empty()
    }

    /// True if the marker was seen in at least one frame
    pub fn is_captured(&self) -> bool {
        self.exists.iter().any(|&e| e)
    }

    pub fn exists_at(&self, frame: usize) -> bool {
        self.exists.get(frame).copied().unwrap_or(false)
    }

    /// Raw position at `frame`, regardless of the exists flag
    pub fn point(&self, frame: usize) -> Vec3 {
        Vec3::new(self.x[frame], self.y[frame], self.z[frame])
    }
}

/// Per-frame flag: true iff every required marker exists at that frame.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameValidityMask(Vec<bool>);

impl FrameValidityMask {
    pub fn from_flags(flags: Vec<bool>) -> Self {
        FrameValidityMask(flags)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn is_valid(&self, frame: usize) -> bool {
        self.0.get(frame).copied().unwrap_or(false)
    }

    pub fn valid_count(&self) -> usize {
        self.0.iter().filter(|&&v| v).count()
    }

    pub fn any_valid(&self) -> bool {
        self.0.iter().any(|&v| v)
    }

    pub fn flags(&self) -> &[bool] {
        &self.0
    }
}

/// Derived per-frame point sequence (midpoint or extrapolated tip)
#[derive(Clone, Debug, PartialEq)]
pub struct VirtualMarker {
    pub points: Vec<Vec3>,
}

impl VirtualMarker {
    pub fn zeros(frame_count: usize) -> Self {
        VirtualMarker {
            points: vec![Vec3::zeros(); frame_count],
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// One high-rate force plate sample. Channels missing from the device are NaN.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlateSample {
    pub force: Vec3,
    pub moment: Vec3,
    pub cop: Vec2,
}

/// Sign convention applied after adding the plate offset
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisSign {
    Positive,
    Negative,
}

impl AxisSign {
    pub fn factor(self) -> f64 {
        match self {
            AxisSign::Positive => 1.0,
            AxisSign::Negative => -1.0,
        }
    }
}

/// Maps a plate's local contact-point readout into the lab frame
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlateGeometry {
    /// Capture-system device name, e.g. "Force Plate 1"
    pub device: String,
    pub offset_x: f64,
    pub offset_y: f64,
    pub sign: AxisSign,
}

impl PlateGeometry {
    /// `(c + offset) * sign`, per axis
    pub fn correct(&self, cop: Vec2) -> Vec2 {
        let s = self.sign.factor();
        Vec2::new((cop.x + self.offset_x) * s, (cop.y + self.offset_y) * s)
    }
}

/// Which plate, if any, is loaded at a high-rate sample
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Activation {
    Plate1Active,
    Plate2Active,
    Neither,
}

impl Activation {
    pub fn active(plate: PlateId) -> Self {
        match plate {
            PlateId::Plate1 => Activation::Plate1Active,
            PlateId::Plate2 => Activation::Plate2Active,
        }
    }

    pub fn plate(self) -> Option<PlateId> {
        match self {
            Activation::Plate1Active => Some(PlateId::Plate1),
            Activation::Plate2Active => Some(PlateId::Plate2),
            Activation::Neither => None,
        }
    }
}

/// Discrepancy between corrected contact point and tip at one aligned frame
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct DifferenceRecord {
    /// Low-rate (marker) frame index
    pub frame: usize,
    /// High-rate (plate) sample index the frame was aligned to
    pub plate_sample: usize,
    pub dx: f64,
    pub dy: f64,
    pub magnitude: f64,
}

impl DifferenceRecord {
    pub fn new(frame: usize, plate_sample: usize, measured: Vec2, tip: Vec2) -> Self {
        let d = measured - tip;
        DifferenceRecord {
            frame,
            plate_sample,
            dx: d.x,
            dy: d.y,
            magnitude: d.norm(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerdictStatus {
    Pass,
    Fail,
    NoActiveSamples,
}

/// Per-plate calibration result. NaN statistics serialize as `null`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ValidationVerdict {
    pub plate: PlateId,
    pub sample_count: usize,
    pub mean_magnitude: f64,
    pub std_magnitude: f64,
    pub mean_dx: f64,
    pub mean_dy: f64,
    pub std_dx: f64,
    pub std_dy: f64,
    pub tolerance: f64,
    pub status: VerdictStatus,
}

impl ValidationVerdict {
    pub fn passed(&self) -> bool {
        self.status == VerdictStatus::Pass
    }
}
