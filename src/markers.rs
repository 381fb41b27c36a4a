use serde::{Deserialize, Serialize};

use crate::activation::ActivationResult;
use crate::alignment::decimated_indices;
use crate::geometry::PoleGeometry;
use crate::types::{FrameValidityMask, Vec2, Vec3, VirtualMarker};

/// Modelled marker written back to the capture system
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModelOutput {
    pub name: String,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub z: Vec<f64>,
    pub exists: Vec<bool>,
}

impl ModelOutput {
    pub fn from_points(name: &str, points: &[Vec3], exists: Vec<bool>) -> Self {
        ModelOutput {
            name: name.to_string(),
            x: points.iter().map(|p| p.x).collect(),
            y: points.iter().map(|p| p.y).collect(),
            z: points.iter().map(|p| p.z).collect(),
            exists,
        }
    }

    pub fn from_marker(name: &str, marker: &VirtualMarker, mask: &FrameValidityMask) -> Self {
        Self::from_points(name, &marker.points, mask.flags().to_vec())
    }

    pub fn len(&self) -> usize {
        self.exists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exists.is_empty()
    }

    pub fn point(&self, frame: usize) -> Vec3 {
        Vec3::new(self.x[frame], self.y[frame], self.z[frame])
    }
}

/// "pole low", "pole high" and "pole point", valid where the mask is
pub fn pole_markers(pole: &PoleGeometry, mask: &FrameValidityMask) -> Vec<ModelOutput> {
    vec![
        ModelOutput::from_marker("pole low", &pole.low, mask),
        ModelOutput::from_marker("pole high", &pole.high, mask),
        ModelOutput::from_marker("pole point", &pole.tip, mask),
    ]
}

/// Four floor-level markers around the corrected contact point of whichever
/// plate is active at each frame's decimated sample.
pub fn cop_markers(
    activation: &ActivationResult,
    frame_count: usize,
    ratio: usize,
    offset: f64,
) -> Vec<ModelOutput> {
    let shifts = [
        ("COP+X", Vec2::new(offset, 0.0)),
        ("COP-X", Vec2::new(-offset, 0.0)),
        ("COP+Y", Vec2::new(0.0, offset)),
        ("COP-Y", Vec2::new(0.0, -offset)),
    ];

    let mut contacts: Vec<Option<Vec2>> = decimated_indices(frame_count, ratio)
        .map(|(_, sample)| activation.contact_at(sample).map(|(_, cop)| cop))
        .collect();
    contacts.resize(frame_count, None);
    let exists: Vec<bool> = contacts.iter().map(|c| c.is_some()).collect();

    shifts
        .iter()
        .map(|(name, shift)| {
            let points: Vec<Vec3> = contacts
                .iter()
                .map(|c| match c {
                    Some(cop) => {
                        let p = cop + shift;
                        Vec3::new(p.x, p.y, 0.0)
                    }
                    None => Vec3::zeros(),
                })
                .collect();
            ModelOutput::from_points(name, &points, exists.clone())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Activation, PerPlate};

    fn activation(assignment: Vec<Activation>, cop1: Vec2, cop2: Vec2) -> ActivationResult {
        let c1 = assignment
            .iter()
            .map(|a| if *a == Activation::Plate1Active { cop1 } else { Vec2::zeros() })
            .collect();
        let c2 = assignment
            .iter()
            .map(|a| if *a == Activation::Plate2Active { cop2 } else { Vec2::zeros() })
            .collect();
        ActivationResult {
            assignment,
            corrected_cop: PerPlate::new(c1, c2),
            double_contact_samples: 0,
        }
    }

    #[test]
    fn test_cop_markers_follow_active_plate() {
        let ratio = 2;
        let assignment = vec![
            Activation::Plate1Active,
            Activation::Neither,
            Activation::Neither,
            Activation::Plate1Active,
            Activation::Plate2Active,
            Activation::Neither,
        ];
        let act = activation(assignment, Vec2::new(100.0, 50.0), Vec2::new(-20.0, 10.0));
        let markers = cop_markers(&act, 3, ratio, 15.0);

        let names: Vec<&str> = markers.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["COP+X", "COP-X", "COP+Y", "COP-Y"]);

        let plus_x = &markers[0];
        assert_eq!(plus_x.exists, vec![true, false, true]);
        assert_eq!(plus_x.point(0), Vec3::new(115.0, 50.0, 0.0));
        assert_eq!(plus_x.point(1), Vec3::zeros());
        assert_eq!(plus_x.point(2), Vec3::new(-5.0, 10.0, 0.0));

        let minus_y = &markers[3];
        assert_eq!(minus_y.point(0), Vec3::new(100.0, 35.0, 0.0));
        assert_eq!(minus_y.point(2), Vec3::new(-20.0, -5.0, 0.0));
    }

    #[test]
    fn test_cop_markers_span_every_frame() {
        let act = activation(vec![Activation::Plate1Active; 4], Vec2::new(1.0, 2.0), Vec2::zeros());
        let markers = cop_markers(&act, 3, usize::MAX / 2, 15.0);
        for m in &markers {
            assert_eq!(m.exists, vec![true, false, false]);
        }
    }

    #[test]
    fn test_model_output_from_marker() {
        let marker = VirtualMarker {
            points: vec![Vec3::new(1.0, 2.0, 3.0), Vec3::zeros()],
        };
        let mask = FrameValidityMask::from_flags(vec![true, false]);
        let out = ModelOutput::from_marker("pole point", &marker, &mask);
        assert_eq!(out.len(), 2);
        assert_eq!(out.x, vec![1.0, 0.0]);
        assert_eq!(out.exists, vec![true, false]);
    }
}
