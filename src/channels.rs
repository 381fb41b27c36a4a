//! Force plate channel resolution
//!
//! Turns the capture system's device → output → component hierarchy into an
//! explicit map from semantic label to signal, checked once for the channels
//! the pole check needs.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use crate::error::{PoleCheckError, PoleResult};
use crate::types::{PlateId, PlateSample, Vec2, Vec3};

/// Output category reported by the capture system for a device output
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputKind {
    Force,
    Moment,
    CoP,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ChannelLabel {
    Fx,
    Fy,
    Fz,
    Mx,
    My,
    Mz,
    Cx,
    Cy,
    Cz,
}

impl ChannelLabel {
    /// Channels without which a plate cannot be checked
    pub const REQUIRED: [ChannelLabel; 3] = [ChannelLabel::Fz, ChannelLabel::Cx, ChannelLabel::Cy];

    pub fn kind(self) -> OutputKind {
        match self {
            ChannelLabel::Fx | ChannelLabel::Fy | ChannelLabel::Fz => OutputKind::Force,
            ChannelLabel::Mx | ChannelLabel::My | ChannelLabel::Mz => OutputKind::Moment,
            ChannelLabel::Cx | ChannelLabel::Cy | ChannelLabel::Cz => OutputKind::CoP,
        }
    }

    /// Label for a component name, only if it belongs to the given output kind
    pub fn for_output(kind: OutputKind, component: &str) -> Option<Self> {
        component
            .parse::<ChannelLabel>()
            .ok()
            .filter(|label| label.kind() == kind)
    }
}

impl FromStr for ChannelLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Fx" => Ok(ChannelLabel::Fx),
            "Fy" => Ok(ChannelLabel::Fy),
            "Fz" => Ok(ChannelLabel::Fz),
            "Mx" => Ok(ChannelLabel::Mx),
            "My" => Ok(ChannelLabel::My),
            "Mz" => Ok(ChannelLabel::Mz),
            "Cx" => Ok(ChannelLabel::Cx),
            "Cy" => Ok(ChannelLabel::Cy),
            "Cz" => Ok(ChannelLabel::Cz),
            other => Err(format!("unknown channel component: {}", other)),
        }
    }
}

impl Display for ChannelLabel {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// One device output: parallel component names and channel data
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DeviceOutput {
    pub kind: OutputKind,
    pub components: Vec<String>,
    pub channels: Vec<Vec<f64>>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DeviceMetadata {
    pub name: String,
    pub outputs: Vec<DeviceOutput>,
}

/// Resolved signals for one plate, keyed by label
#[derive(Clone, Debug)]
pub struct PlateChannels {
    pub plate: PlateId,
    signals: BTreeMap<ChannelLabel, Vec<f64>>,
}

impl PlateChannels {
    pub fn get(&self, label: ChannelLabel) -> Option<&[f64]> {
        self.signals.get(&label).map(|s| s.as_slice())
    }

    pub fn require(&self, label: ChannelLabel) -> PoleResult<&[f64]> {
        self.get(label).ok_or(PoleCheckError::MissingChannel {
            plate: self.plate,
            label,
        })
    }

    /// Number of high-rate samples (length of Fz)
    pub fn sample_count(&self) -> usize {
        self.get(ChannelLabel::Fz).map(|s| s.len()).unwrap_or(0)
    }

    /// Per-sample view of the plate. Missing optional channels read as NaN.
    pub fn samples(&self) -> Vec<PlateSample> {
        let at = |label: ChannelLabel, i: usize| {
            self.get(label)
                .and_then(|s| s.get(i).copied())
                .unwrap_or(f64::NAN)
        };
        (0..self.sample_count())
            .map(|i| PlateSample {
                force: Vec3::new(at(ChannelLabel::Fx, i), at(ChannelLabel::Fy, i), at(ChannelLabel::Fz, i)),
                moment: Vec3::new(at(ChannelLabel::Mx, i), at(ChannelLabel::My, i), at(ChannelLabel::Mz, i)),
                cop: Vec2::new(at(ChannelLabel::Cx, i), at(ChannelLabel::Cy, i)),
            })
            .collect()
    }
}

/// Resolve the named device into plate channels.
///
/// A missing device reports `MissingChannel` for Fz, as does any absent
/// required label. All resolved channels must share one length.
pub fn resolve_plate(
    devices: &[DeviceMetadata],
    plate: PlateId,
    device_name: &str,
) -> PoleResult<PlateChannels> {
    let device = devices
        .iter()
        .find(|d| d.name == device_name)
        .ok_or(PoleCheckError::MissingChannel {
            plate,
            label: ChannelLabel::Fz,
        })?;

    let mut signals = BTreeMap::new();
    for output in &device.outputs {
        for (component, channel) in output.components.iter().zip(output.channels.iter()) {
            match ChannelLabel::for_output(output.kind, component) {
                Some(label) => {
                    signals.insert(label, channel.clone());
                }
                None => log::debug!(
                    "{}: ignoring component {} on {:?} output",
                    device_name,
                    component,
                    output.kind
                ),
            }
        }
    }

    let channels = PlateChannels { plate, signals };
    for label in ChannelLabel::REQUIRED {
        channels.require(label)?;
    }

    let expected = channels.sample_count();
    for (label, signal) in &channels.signals {
        if signal.len() != expected {
            return Err(PoleCheckError::LengthMismatch {
                what: format!("{} {} channel", plate, label),
                expected,
                actual: signal.len(),
            });
        }
    }

    log::debug!(
        "{} resolved from '{}': {} channels, {} samples",
        plate,
        device_name,
        channels.signals.len(),
        expected
    );
    Ok(channels)
}
