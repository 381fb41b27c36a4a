use crate::error::{PoleCheckError, PoleResult};
use crate::types::{Activation, PerPlate, PlateGeometry, PlateId, PlateSample, Vec2};

/// Output of plate activation detection, one element per high-rate sample
#[derive(Clone, Debug)]
pub struct ActivationResult {
    pub assignment: Vec<Activation>,
    /// Lab-frame contact point per plate; zero where that plate is not the active one
    pub corrected_cop: PerPlate<Vec<Vec2>>,
    /// Samples where both plates were over threshold (plate 1 took them)
    pub double_contact_samples: usize,
}

impl ActivationResult {
    pub fn len(&self) -> usize {
        self.assignment.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assignment.is_empty()
    }

    pub fn active_count(&self, plate: PlateId) -> usize {
        let tag = Activation::active(plate);
        self.assignment.iter().filter(|&&a| a == tag).count()
    }

    /// Active plate and its corrected contact point at a high-rate sample
    pub fn contact_at(&self, sample: usize) -> Option<(PlateId, Vec2)> {
        let plate = self.assignment.get(sample)?.plate()?;
        Some((plate, self.corrected_cop.get(plate)[sample]))
    }
}

/// Vertical load is negative, so a plate is loaded when `Fz < threshold`
/// with a negative threshold. NaN force never activates.
fn is_loaded(sample: &PlateSample, threshold: f64) -> bool {
    sample.force.z < threshold
}

/// Tag each high-rate sample with the loaded plate and correct its contact point.
///
/// Plate 1 is checked first and wins when both plates are loaded at the same
/// sample; plate 2 is not evaluated for that sample. Each sample is classified
/// on its own, without smoothing or hysteresis.
pub fn classify(
    plate1: &[PlateSample],
    plate2: &[PlateSample],
    threshold: f64,
    geom1: &PlateGeometry,
    geom2: &PlateGeometry,
) -> PoleResult<ActivationResult> {
    if plate1.len() != plate2.len() {
        return Err(PoleCheckError::LengthMismatch {
            what: format!("{} samples", PlateId::Plate2),
            expected: plate1.len(),
            actual: plate2.len(),
        });
    }

    let n = plate1.len();
    let mut assignment = vec![Activation::Neither; n];
    let mut cop1 = vec![Vec2::zeros(); n];
    let mut cop2 = vec![Vec2::zeros(); n];
    let mut double_contact_samples = 0;

    for (i, (s1, s2)) in plate1.iter().zip(plate2.iter()).enumerate() {
        if is_loaded(s1, threshold) {
            assignment[i] = Activation::Plate1Active;
            cop1[i] = geom1.correct(s1.cop);
            if is_loaded(s2, threshold) {
                double_contact_samples += 1;
            }
        } else if is_loaded(s2, threshold) {
            assignment[i] = Activation::Plate2Active;
            cop2[i] = geom2.correct(s2.cop);
        }
    }

    if double_contact_samples > 0 {
        log::warn!(
            "{} samples load both plates; attributed to {}",
            double_contact_samples,
            PlateId::Plate1
        );
    }

    let result = ActivationResult {
        assignment,
        corrected_cop: PerPlate::new(cop1, cop2),
        double_contact_samples,
    };
    log::debug!(
        "Activation over {} samples: {} {}, {} {}",
        n,
        result.active_count(PlateId::Plate1),
        PlateId::Plate1,
        result.active_count(PlateId::Plate2),
        PlateId::Plate2
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AxisSign, Vec3};
    use approx::assert_relative_eq;

    const THRESHOLD: f64 = -50.0;

    fn sample(fz: f64, cx: f64, cy: f64) -> PlateSample {
        PlateSample {
            force: Vec3::new(0.0, 0.0, fz),
            moment: Vec3::zeros(),
            cop: Vec2::new(cx, cy),
        }
    }

    fn geometries() -> (PlateGeometry, PlateGeometry) {
        (
            PlateGeometry {
                device: "Force Plate 1".to_string(),
                offset_x: -232.0,
                offset_y: -254.0,
                sign: AxisSign::Negative,
            },
            PlateGeometry {
                device: "Force Plate 2".to_string(),
                offset_x: 232.0,
                offset_y: -255.0,
                sign: AxisSign::Positive,
            },
        )
    }

    #[test]
    fn test_plate1_active_with_negated_offset() {
        let (g1, g2) = geometries();
        let p1 = vec![sample(-120.0, 232.0, 254.0)];
        let p2 = vec![sample(0.0, 0.0, 0.0)];
        let result = classify(&p1, &p2, THRESHOLD, &g1, &g2).unwrap();
        assert_eq!(result.assignment[0], Activation::Plate1Active);
        assert_relative_eq!(result.corrected_cop.plate1[0].x, 0.0);
        assert_relative_eq!(result.corrected_cop.plate1[0].y, 0.0);
        assert_eq!(result.corrected_cop.plate2[0], Vec2::zeros());
    }

    #[test]
    fn test_plate2_active_keeps_sign() {
        let (g1, g2) = geometries();
        let p1 = vec![sample(-10.0, 0.0, 0.0)];
        let p2 = vec![sample(-300.0, 10.0, 300.0)];
        let result = classify(&p1, &p2, THRESHOLD, &g1, &g2).unwrap();
        assert_eq!(result.assignment[0], Activation::Plate2Active);
        assert_relative_eq!(result.corrected_cop.plate2[0].x, 242.0);
        assert_relative_eq!(result.corrected_cop.plate2[0].y, 45.0);
        assert_eq!(result.corrected_cop.plate1[0], Vec2::zeros());
    }

    #[test]
    fn test_threshold_is_strict() {
        let (g1, g2) = geometries();
        let p1 = vec![sample(-50.0, 1.0, 1.0), sample(-50.000001, 1.0, 1.0)];
        let p2 = vec![sample(-50.0, 1.0, 1.0), sample(0.0, 1.0, 1.0)];
        let result = classify(&p1, &p2, THRESHOLD, &g1, &g2).unwrap();
        assert_eq!(result.assignment[0], Activation::Neither);
        assert_eq!(result.assignment[1], Activation::Plate1Active);
    }

    #[test]
    fn test_both_loaded_goes_to_plate1() {
        let (g1, g2) = geometries();
        let p1 = vec![sample(-200.0, 0.0, 0.0); 4];
        let p2 = vec![sample(-200.0, 0.0, 0.0); 4];
        let result = classify(&p1, &p2, THRESHOLD, &g1, &g2).unwrap();
        assert!(result.assignment.iter().all(|&a| a == Activation::Plate1Active));
        assert_eq!(result.double_contact_samples, 4);
        assert!(result.corrected_cop.plate2.iter().all(|c| *c == Vec2::zeros()));
    }

    #[test]
    fn test_activation_mutually_exclusive() {
        let (g1, g2) = geometries();
        let fz = [-100.0, 0.0, -100.0, f64::NAN, 0.0, -51.0];
        let fz2 = [-100.0, -100.0, 0.0, -100.0, 0.0, f64::NAN];
        let p1: Vec<_> = fz.iter().map(|&f| sample(f, 5.0, 5.0)).collect();
        let p2: Vec<_> = fz2.iter().map(|&f| sample(f, 5.0, 5.0)).collect();
        let result = classify(&p1, &p2, THRESHOLD, &g1, &g2).unwrap();

        for i in 0..result.len() {
            let c1 = result.corrected_cop.plate1[i] != Vec2::zeros();
            let c2 = result.corrected_cop.plate2[i] != Vec2::zeros();
            assert!(!(c1 && c2), "sample {} has both plates", i);
        }
        assert_eq!(
            result.assignment,
            vec![
                Activation::Plate1Active,
                Activation::Plate2Active,
                Activation::Plate1Active,
                Activation::Plate2Active,
                Activation::Neither,
                Activation::Plate1Active,
            ]
        );
        assert_eq!(result.active_count(PlateId::Plate1), 3);
        assert_eq!(result.active_count(PlateId::Plate2), 2);
    }

    #[test]
    fn test_contact_at() {
        let (g1, g2) = geometries();
        let p1 = vec![sample(0.0, 0.0, 0.0), sample(0.0, 0.0, 0.0)];
        let p2 = vec![sample(0.0, 0.0, 0.0), sample(-90.0, -232.0, 255.0)];
        let result = classify(&p1, &p2, THRESHOLD, &g1, &g2).unwrap();
        assert_eq!(result.contact_at(0), None);
        assert_eq!(result.contact_at(1), Some((PlateId::Plate2, Vec2::zeros())));
        assert_eq!(result.contact_at(7), None);
    }

    #[test]
    fn test_length_mismatch() {
        let (g1, g2) = geometries();
        let p1 = vec![sample(0.0, 0.0, 0.0); 3];
        let p2 = vec![sample(0.0, 0.0, 0.0); 2];
        let err = classify(&p1, &p2, THRESHOLD, &g1, &g2).unwrap_err();
        assert!(matches!(err, PoleCheckError::LengthMismatch { expected: 3, actual: 2, .. }));
    }
}
