//! # IMO Intact Stability Criteria
//!
//! The six general criteria of IMO Resolution A.749(18), §3.1.2, checked
//! against a GZ curve:
//!
//! | # | Check                                          | Required      |
//! |---|------------------------------------------------|---------------|
//! | 1 | Area under GZ, 0° to 30°                        | ≥ 0.055 m·rad |
//! | 2 | Area under GZ, 0° to 40° (or flooding angle)    | ≥ 0.090 m·rad |
//! | 3 | Area under GZ, 30° to 40° (or flooding angle)   | ≥ 0.030 m·rad |
//! | 4 | Heel at maximum GZ                              | ≥ 25°         |
//! | 5 | Initial GMt                                     | ≥ 0.15 m      |
//! | 6 | GZ at 30°                                       | ≥ 0.20 m      |
//!
//! Areas are trapezoidal over the curve's own samples, in radians.
//!
//! ## Example
//!
//! ```rust
//! use hydro_core::calculations::criteria::check_criteria;
//! use hydro_core::calculations::stability::compute_gz_curve;
//! use hydro_core::calculations::StabilityMethod;
//! use hydro_core::hull::HullGeometry;
//! use hydro_core::loadcase::Loadcase;
//!
//! let barge = HullGeometry::box_barge(20.0, 10.0, 6.0, 11, 13);
//! let lc = Loadcase::new("Departure", 1025.0).with_draft(3.0).with_kg(3.0);
//! let curve = compute_gz_curve(&barge, &lc, 0.0, 60.0, 1.0, StabilityMethod::FullImmersion).unwrap();
//!
//! let assessment = check_criteria(&curve, &lc).unwrap();
//! assert!(assessment.passed);
//! ```

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calculations::stability::StabilityCurve;
use crate::errors::{CalcError, CalcResult};
use crate::loadcase::Loadcase;

/// Upper heel of the area criteria before any flooding angle (degrees)
const AREA_LIMIT_DEG: f64 = 40.0;
/// Heel separating criteria 1 and 3 (degrees)
const INTERMEDIATE_DEG: f64 = 30.0;
/// Largest angle used for the initial-slope estimate of GM (degrees)
const INITIAL_SLOPE_LIMIT_DEG: f64 = 10.0;

/// One of the six fixed checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ImoCriterion {
    AreaTo30,
    AreaTo40,
    Area30To40,
    MaxGzAngle,
    InitialGm,
    GzAt30,
}

impl ImoCriterion {
    pub const ALL: [ImoCriterion; 6] = [
        ImoCriterion::AreaTo30,
        ImoCriterion::AreaTo40,
        ImoCriterion::Area30To40,
        ImoCriterion::MaxGzAngle,
        ImoCriterion::InitialGm,
        ImoCriterion::GzAt30,
    ];

    /// Position in the A.749(18) list (1-6)
    pub fn id(&self) -> u8 {
        match self {
            ImoCriterion::AreaTo30 => 1,
            ImoCriterion::AreaTo40 => 2,
            ImoCriterion::Area30To40 => 3,
            ImoCriterion::MaxGzAngle => 4,
            ImoCriterion::InitialGm => 5,
            ImoCriterion::GzAt30 => 6,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ImoCriterion::AreaTo30 => "Area under GZ curve from 0° to 30°",
            ImoCriterion::AreaTo40 => "Area under GZ curve from 0° to 40° or flooding angle",
            ImoCriterion::Area30To40 => "Area under GZ curve from 30° to 40° or flooding angle",
            ImoCriterion::MaxGzAngle => "Heel angle of maximum GZ",
            ImoCriterion::InitialGm => "Initial metacentric height GMt",
            ImoCriterion::GzAt30 => "Righting arm GZ at 30°",
        }
    }

    /// Minimum acceptable value
    pub fn required(&self) -> f64 {
        match self {
            ImoCriterion::AreaTo30 => 0.055,
            ImoCriterion::AreaTo40 => 0.090,
            ImoCriterion::Area30To40 => 0.030,
            ImoCriterion::MaxGzAngle => 25.0,
            ImoCriterion::InitialGm => 0.15,
            ImoCriterion::GzAt30 => 0.20,
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            ImoCriterion::AreaTo30 | ImoCriterion::AreaTo40 | ImoCriterion::Area30To40 => "m·rad",
            ImoCriterion::MaxGzAngle => "deg",
            ImoCriterion::InitialGm | ImoCriterion::GzAt30 => "m",
        }
    }
}

/// Outcome of one check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriterionResult {
    pub criterion: ImoCriterion,
    pub description: String,
    pub required: f64,
    pub actual: f64,
    pub unit: String,
    pub passed: bool,
}

impl CriterionResult {
    fn new(criterion: ImoCriterion, actual: f64) -> Self {
        CriterionResult {
            criterion,
            description: criterion.description().to_string(),
            required: criterion.required(),
            actual,
            unit: criterion.unit().to_string(),
            passed: actual >= criterion.required(),
        }
    }
}

/// All six checks, in criterion order.
///
/// ## JSON Example
///
/// ```json
/// {
///   "results": [
///     {
///       "criterion": "AreaTo30",
///       "description": "Area under GZ curve from 0° to 30°",
///       "required": 0.055,
///       "actual": 0.214,
///       "unit": "m·rad",
///       "passed": true
///     }
///   ],
///   "passed": true
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriteriaAssessment {
    pub results: Vec<CriterionResult>,
    /// True only if every check passed
    pub passed: bool,
}

impl CriteriaAssessment {
    pub fn result(&self, criterion: ImoCriterion) -> Option<&CriterionResult> {
        self.results.iter().find(|r| r.criterion == criterion)
    }

    pub fn failed(&self) -> impl Iterator<Item = &CriterionResult> {
        self.results.iter().filter(|r| !r.passed)
    }
}

/// Check a GZ curve against the six criteria.
///
/// The loadcase supplies the flooding angle, which caps the upper bound of
/// criteria 2 and 3 when it is below 40°.
///
/// # Errors
/// A curve that does not cover 0° to 40°, an invalid loadcase, or a curve
/// with neither a GMt nor a positive sample at or below 10°.
pub fn check_criteria(curve: &StabilityCurve, loadcase: &Loadcase) -> CalcResult<CriteriaAssessment> {
    loadcase.validate()?;
    let (first, last) = match (curve.points.first(), curve.points.last()) {
        (Some(first), Some(last)) => (first.heel_deg, last.heel_deg),
        _ => return Err(CalcError::invalid_input("curve", "[]", "GZ curve has no points")),
    };
    if first > 0.0 || last < AREA_LIMIT_DEG {
        return Err(CalcError::invalid_input(
            "curve",
            format!("[{}°, {}°]", first, last),
            "GZ curve must cover 0° to 40°",
        ));
    }

    let upper_deg = loadcase
        .flooding_angle_deg
        .map_or(AREA_LIMIT_DEG, |f| f.min(AREA_LIMIT_DEG));

    let area = |from: f64, to: f64| -> CalcResult<f64> {
        curve
            .area_between(from, to)
            .ok_or_else(|| CalcError::calculation_failed("IMO criteria", format!("No GZ between {}° and {}°", from, to)))
    };

    let area_to_30 = area(0.0, INTERMEDIATE_DEG)?;
    let area_to_40 = area(0.0, upper_deg)?;
    // Flooding before 30° leaves no range for criterion 3
    let area_30_to_40 = if upper_deg > INTERMEDIATE_DEG {
        area(INTERMEDIATE_DEG, upper_deg)?
    } else {
        0.0
    };

    let max_gz_angle = curve
        .points
        .iter()
        .filter(|p| p.heel_deg >= 0.0)
        .fold(None, |best: Option<(f64, f64)>, p| match best {
            Some((_, gz)) if gz >= p.gz_m => best,
            _ => Some((p.heel_deg, p.gz_m)),
        })
        .map(|(heel, _)| heel)
        .unwrap_or(0.0);

    let gm = match curve.gmt_m {
        Some(gm) => gm,
        None => initial_slope_gm(curve)?,
    };

    let gz_30 = curve
        .gz_at(INTERMEDIATE_DEG)
        .ok_or_else(|| CalcError::calculation_failed("IMO criteria", "No GZ at 30°"))?;

    let results = vec![
        CriterionResult::new(ImoCriterion::AreaTo30, area_to_30),
        CriterionResult::new(ImoCriterion::AreaTo40, area_to_40),
        CriterionResult::new(ImoCriterion::Area30To40, area_30_to_40),
        CriterionResult::new(ImoCriterion::MaxGzAngle, max_gz_angle),
        CriterionResult::new(ImoCriterion::InitialGm, gm),
        CriterionResult::new(ImoCriterion::GzAt30, gz_30),
    ];
    let passed = results.iter().all(|r| r.passed);

    debug!(passed, failed = results.iter().filter(|r| !r.passed).count(), "checked IMO criteria");

    Ok(CriteriaAssessment { results, passed })
}

/// GM from the slope of the curve at the smallest positive sample up to 10°
fn initial_slope_gm(curve: &StabilityCurve) -> CalcResult<f64> {
    curve
        .points
        .iter()
        .find(|p| p.heel_deg > 0.0 && p.heel_deg <= INITIAL_SLOPE_LIMIT_DEG)
        .map(|p| p.gz_m / p.heel_deg.to_radians().sin())
        .ok_or_else(|| {
            CalcError::calculation_failed(
                "IMO criteria",
                "GMt unknown and no GZ sample between 0° and 10°",
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculations::stability::{compute_gz_curve, StabilityPoint};
    use crate::calculations::StabilityMethod;
    use crate::hull::HullGeometry;

    fn barge_curve(kg_m: f64) -> (StabilityCurve, Loadcase) {
        let barge = HullGeometry::box_barge(20.0, 10.0, 6.0, 11, 13);
        let lc = Loadcase::new("Barge", 1025.0).with_draft(3.0).with_kg(kg_m);
        let curve = compute_gz_curve(&barge, &lc, 0.0, 60.0, 1.0, StabilityMethod::FullImmersion).unwrap();
        (curve, lc)
    }

    #[test]
    fn test_stable_barge_passes_all() {
        // GMt = 1.278 m, GZ(30°) = 0.870 m, max GZ near 45°
        let (curve, lc) = barge_curve(3.0);
        let assessment = check_criteria(&curve, &lc).unwrap();
        assert_eq!(assessment.results.len(), 6);
        assert!(assessment.passed, "failed: {:?}", assessment.failed().collect::<Vec<_>>());
        let ids: Vec<u8> = assessment.results.iter().map(|r| r.criterion.id()).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5, 6]);
        let gm = assessment.result(ImoCriterion::InitialGm).unwrap();
        assert!((gm.actual - (1.5 + 100.0 / 36.0 - 3.0)).abs() < 1e-9);
    }

    #[test]
    fn test_high_kg_fails_gm_and_area() {
        // GMt = 4.278 - 4.2 = 0.078 m
        let (curve, lc) = barge_curve(4.2);
        let assessment = check_criteria(&curve, &lc).unwrap();
        assert!(!assessment.passed);
        assert!(!assessment.result(ImoCriterion::InitialGm).unwrap().passed);
        assert!(!assessment.result(ImoCriterion::AreaTo30).unwrap().passed);
        // Deck-edge immersion still gives 0.27 m at 30°
        assert!(assessment.result(ImoCriterion::GzAt30).unwrap().passed);
    }

    #[test]
    fn test_flooding_angle_caps_areas() {
        let (curve, lc) = barge_curve(3.0);
        let open = check_criteria(&curve, &lc).unwrap();
        let flooded = check_criteria(&curve, &lc.clone().with_flooding_angle(35.0)).unwrap();

        let a_open = open.result(ImoCriterion::AreaTo40).unwrap().actual;
        let a_flood = flooded.result(ImoCriterion::AreaTo40).unwrap().actual;
        assert!(a_flood < a_open);
        let expected = curve.area_between(0.0, 35.0).unwrap();
        assert!((a_flood - expected).abs() < 1e-12);

        let early = check_criteria(&curve, &lc.with_flooding_angle(25.0)).unwrap();
        assert_eq!(early.result(ImoCriterion::Area30To40).unwrap().actual, 0.0);
        assert!(!early.passed);
    }

    fn synthetic(points: &[(f64, f64)], gmt_m: Option<f64>) -> StabilityCurve {
        StabilityCurve {
            method: StabilityMethod::WallSided,
            draft_m: 1.0,
            volume_m3: 1.0,
            displacement_kg: 1025.0,
            kg_m: 1.0,
            gmt_m,
            points: points
                .iter()
                .map(|&(heel_deg, gz_m)| StabilityPoint { heel_deg, gz_m })
                .collect(),
        }
    }

    #[test]
    fn test_gm_from_initial_slope() {
        // GZ = 0.5·sinφ below 10°
        let gz5 = 0.5 * 5.0_f64.to_radians().sin();
        let curve = synthetic(&[(0.0, 0.0), (5.0, gz5), (20.0, 0.3), (40.0, 0.4)], None);
        let assessment = check_criteria(&curve, &Loadcase::default()).unwrap();
        let gm = assessment.result(ImoCriterion::InitialGm).unwrap();
        assert!((gm.actual - 0.5).abs() < 1e-12);

        let coarse = synthetic(&[(0.0, 0.0), (20.0, 0.3), (40.0, 0.4)], None);
        assert!(check_criteria(&coarse, &Loadcase::default()).is_err());
    }

    #[test]
    fn test_short_curve_rejected() {
        let curve = synthetic(&[(0.0, 0.0), (20.0, 0.3), (30.0, 0.4)], Some(1.0));
        let err = check_criteria(&curve, &Loadcase::default()).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_INPUT");
        let empty = synthetic(&[], Some(1.0));
        assert!(check_criteria(&empty, &Loadcase::default()).is_err());
    }
}
