//! # Large-Angle Stability
//!
//! Righting-arm (GZ) curves at constant displacement, by one of two
//! methods:
//!
//! - [`StabilityMethod::WallSided`]: `GZ = (GMt + ½·BMt·tan²φ)·sinφ` from the
//!   upright hydrostatics. Exact for a wall-sided hull until the deck edge
//!   immerses or the bilge emerges; undefined at 90°.
//! - [`StabilityMethod::FullImmersion`]: every station becomes a closed
//!   section polygon, rotated about the baseline origin by φ and clipped
//!   below an earth-fixed waterline. The waterline height is found by
//!   bisection so the immersed volume equals the upright volume, and
//!   `GZ = Y_B − (TCG·cosφ + KG·sinφ)`. Valid from −180° to 180°.
//!
//! Heel is positive with the starboard side down. A positive GZ rights the
//! vessel.
//!
//! ## Example
//!
//! ```rust
//! use hydro_core::calculations::stability::compute_gz_curve;
//! use hydro_core::calculations::StabilityMethod;
//! use hydro_core::hull::HullGeometry;
//! use hydro_core::loadcase::Loadcase;
//!
//! let barge = HullGeometry::box_barge(20.0, 10.0, 6.0, 11, 13);
//! let lc = Loadcase::new("Trial", 1025.0).with_draft(3.0).with_kg(3.0);
//!
//! let curve = compute_gz_curve(&barge, &lc, 0.0, 60.0, 5.0, StabilityMethod::FullImmersion).unwrap();
//! assert_eq!(curve.points.len(), 13);
//! assert!(curve.gz_at(30.0).unwrap() > 0.2);
//! ```

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calculations::hydrostatics::{compute_at_grid, VOLUME_EPSILON};
use crate::calculations::StabilityMethod;
use crate::equations::integration::integrate;
use crate::equations::section::Polygon;
use crate::errors::{CalcError, CalcResult};
use crate::hull::{HullGeometry, HullGrid};
use crate::loadcase::Loadcase;
use crate::units::{Degrees, Radians};

/// Largest sweep accepted by [`heel_angles`]
pub const MAX_CURVE_POINTS: usize = 10_000;

/// Waterline bisection stops once the bracket is this small (m)
const WATERLINE_TOLERANCE_M: f64 = 1e-12;
const MAX_BISECTIONS: usize = 200;

/// Slack when comparing angles to range ends (degrees)
const ANGLE_EPSILON_DEG: f64 = 1e-9;

/// One sample of a GZ curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StabilityPoint {
    pub heel_deg: f64,
    /// Righting arm (m), negative when the moment is capsizing
    pub gz_m: f64,
}

/// GZ curve at constant displacement.
///
/// ## JSON Example
///
/// ```json
/// {
///   "method": "FullImmersion",
///   "draft_m": 3.0,
///   "volume_m3": 600.0,
///   "displacement_kg": 615000.0,
///   "kg_m": 3.0,
///   "gmt_m": 1.278,
///   "points": [
///     { "heel_deg": 0.0, "gz_m": 0.0 },
///     { "heel_deg": 10.0, "gz_m": 0.229 }
///   ]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StabilityCurve {
    pub method: StabilityMethod,
    /// Upright draft the curve was computed from (m)
    pub draft_m: f64,
    pub volume_m3: f64,
    pub displacement_kg: f64,
    pub kg_m: f64,
    /// Upright transverse metacentric height (m)
    pub gmt_m: Option<f64>,
    /// Samples ordered by increasing heel
    pub points: Vec<StabilityPoint>,
}

impl StabilityCurve {
    /// Sample with the largest righting arm (first one on ties)
    pub fn max_gz(&self) -> Option<StabilityPoint> {
        self.points.iter().copied().fold(None, |best, p| match best {
            Some(b) if b.gz_m >= p.gz_m => Some(b),
            _ => Some(p),
        })
    }

    /// GZ at `heel_deg`, linear between samples; `None` outside the curve
    pub fn gz_at(&self, heel_deg: f64) -> Option<f64> {
        let first = self.points.first()?;
        let last = self.points.last()?;
        if heel_deg < first.heel_deg - ANGLE_EPSILON_DEG || heel_deg > last.heel_deg + ANGLE_EPSILON_DEG {
            return None;
        }
        let upper = self.points.partition_point(|p| p.heel_deg < heel_deg);
        if upper == 0 {
            return Some(first.gz_m);
        }
        if upper >= self.points.len() {
            return Some(last.gz_m);
        }
        let a = self.points[upper - 1];
        let b = self.points[upper];
        let t = (heel_deg - a.heel_deg) / (b.heel_deg - a.heel_deg);
        Some(a.gz_m + t * (b.gz_m - a.gz_m))
    }

    /// Area under the curve between two heel angles (m·rad).
    ///
    /// Trapezoidal over the curve's own samples, with GZ interpolated at the
    /// bounds. `None` if either bound lies outside the curve.
    pub fn area_between(&self, from_deg: f64, to_deg: f64) -> Option<f64> {
        if from_deg > to_deg {
            return self.area_between(to_deg, from_deg).map(|a| -a);
        }
        let mut abscissae = vec![from_deg];
        let mut values = vec![self.gz_at(from_deg)?];
        for p in &self.points {
            if p.heel_deg > from_deg && p.heel_deg < to_deg {
                abscissae.push(p.heel_deg);
                values.push(p.gz_m);
            }
        }
        abscissae.push(to_deg);
        values.push(self.gz_at(to_deg)?);

        let area: f64 = abscissae
            .windows(2)
            .zip(values.windows(2))
            .map(|(x, y)| Radians::from(Degrees(x[1] - x[0])).value() * (y[0] + y[1]) / 2.0)
            .sum();
        Some(area)
    }

    /// First positive heel past which GZ falls to zero or below,
    /// interpolated between samples.
    pub fn angle_of_vanishing_stability(&self) -> Option<f64> {
        self.points
            .windows(2)
            .filter(|w| w[0].heel_deg > 0.0 && w[0].gz_m > 0.0 && w[1].gz_m <= 0.0)
            .map(|w| {
                let (a, b) = (w[0], w[1]);
                a.heel_deg + a.gz_m / (a.gz_m - b.gz_m) * (b.heel_deg - a.heel_deg)
            })
            .next()
    }
}

/// Heel angles from `min_deg` to `max_deg` in steps of `step_deg`.
///
/// The sweep always ends exactly at `max_deg`, even when the step does not
/// divide the range.
///
/// # Errors
/// Non-finite values, a non-positive step, `min > max`, angles beyond ±180°
/// or more than [`MAX_CURVE_POINTS`] samples.
pub fn heel_angles(min_deg: f64, max_deg: f64, step_deg: f64) -> CalcResult<Vec<f64>> {
    for (field, value) in [("angle_min", min_deg), ("angle_max", max_deg), ("angle_step", step_deg)] {
        if !value.is_finite() {
            return Err(CalcError::invalid_input(field, value.to_string(), "Angle must be finite"));
        }
    }
    if step_deg <= 0.0 {
        return Err(CalcError::invalid_input(
            "angle_step",
            step_deg.to_string(),
            "Angle step must be positive",
        ));
    }
    if min_deg > max_deg {
        return Err(CalcError::invalid_input(
            "angle_min",
            min_deg.to_string(),
            format!("Must not exceed angle_max ({})", max_deg),
        ));
    }
    if min_deg < -180.0 || max_deg > 180.0 {
        return Err(CalcError::invalid_input(
            "angle_range",
            format!("[{}, {}]", min_deg, max_deg),
            "Heel angles must lie within ±180°",
        ));
    }

    let intervals = ((max_deg - min_deg) / step_deg + ANGLE_EPSILON_DEG).floor();
    if intervals + 2.0 > MAX_CURVE_POINTS as f64 {
        return Err(CalcError::invalid_input(
            "angle_step",
            step_deg.to_string(),
            format!("Sweep would exceed {} points", MAX_CURVE_POINTS),
        ));
    }

    let mut angles: Vec<f64> = (0..=intervals as usize)
        .map(|k| min_deg + step_deg * k as f64)
        .collect();
    match angles.last_mut() {
        Some(last) if (*last - max_deg).abs() <= ANGLE_EPSILON_DEG => *last = max_deg,
        _ => angles.push(max_deg),
    }
    Ok(angles)
}

/// GZ curve over a heel sweep.
///
/// Needs `draft_m` and `kg_m` on the loadcase. Negative GZ and GMt are
/// returned as computed.
///
/// # Errors
/// Invalid geometry, loadcase or sweep; zero displacement at the draft;
/// wall-sided angles at or beyond 90°.
pub fn compute_gz_curve(
    hull: &HullGeometry,
    loadcase: &Loadcase,
    angle_min_deg: f64,
    angle_max_deg: f64,
    angle_step_deg: f64,
    method: StabilityMethod,
) -> CalcResult<StabilityCurve> {
    let grid = hull.validate()?;
    let angles = heel_angles(angle_min_deg, angle_max_deg, angle_step_deg)?;
    compute_gz_curve_grid(&grid, loadcase, &angles, method)
}

/// GZ curve at explicit heel angles on an already validated grid.
///
/// Angles must be increasing; they are evaluated in parallel and returned
/// in the order given.
pub fn compute_gz_curve_grid(
    grid: &HullGrid,
    loadcase: &Loadcase,
    angles_deg: &[f64],
    method: StabilityMethod,
) -> CalcResult<StabilityCurve> {
    loadcase.validate()?;
    let draft_m = loadcase.require_draft()?;
    let kg_m = loadcase.require_kg()?;
    grid.check_draft(draft_m)?;

    if angles_deg.is_empty() {
        return Err(CalcError::invalid_input("angles", "[]", "At least one heel angle is required"));
    }
    if angles_deg.windows(2).any(|w| w[1] <= w[0]) {
        return Err(CalcError::invalid_input("angles", format!("{:?}", angles_deg), "Heel angles must increase"));
    }
    if let Some(&bad) = angles_deg.iter().find(|a| !a.is_finite() || a.abs() > 180.0) {
        return Err(CalcError::invalid_input("angles", bad.to_string(), "Heel angles must lie within ±180°"));
    }
    if method == StabilityMethod::WallSided {
        if let Some(&bad) = angles_deg.iter().find(|a| a.abs() >= 90.0) {
            return Err(CalcError::invalid_input(
                "angles",
                bad.to_string(),
                "Wall-sided formula is undefined at or beyond 90°",
            ));
        }
    }

    let upright = compute_at_grid(grid, loadcase, draft_m)?;
    if upright.volume_m3 <= VOLUME_EPSILON {
        return Err(CalcError::calculation_failed(
            "GZ curve",
            format!("No displacement at draft {} m", draft_m),
        ));
    }

    debug!(method = method.display_name(), draft_m, angles = angles_deg.len(), "computing GZ curve");

    let gz: Vec<f64> = match method {
        StabilityMethod::WallSided => {
            let bmt = upright.bmt_m.ok_or_else(|| {
                CalcError::calculation_failed("GZ curve", "Metacentric radius undefined at draft")
            })?;
            let gmt = upright
                .gmt_m
                .ok_or_else(|| CalcError::calculation_failed("GZ curve", "GMt undefined at draft"))?;
            angles_deg.iter().map(|&a| wall_sided_gz(gmt, bmt, a)).collect()
        }
        StabilityMethod::FullImmersion => {
            let sections = HeeledSections::new(grid);
            let target_volume = sections.upright_volume(draft_m)?;
            angles_deg
                .par_iter()
                .map(|&a| sections.gz(a, target_volume, kg_m, loadcase.tcg_m))
                .collect::<CalcResult<Vec<f64>>>()?
        }
    };

    let points: Vec<StabilityPoint> = angles_deg
        .iter()
        .zip(gz)
        .map(|(&heel_deg, gz_m)| StabilityPoint { heel_deg, gz_m })
        .collect();

    debug!(points = points.len(), "computed GZ curve");

    Ok(StabilityCurve {
        method,
        draft_m,
        volume_m3: upright.volume_m3,
        displacement_kg: upright.displacement_kg,
        kg_m,
        gmt_m: upright.gmt_m,
        points,
    })
}

/// Wall-sided righting arm, `(GM + ½·BM·tan²φ)·sinφ`
pub fn wall_sided_gz(gmt_m: f64, bmt_m: f64, heel_deg: f64) -> f64 {
    let phi = Radians::from(Degrees(heel_deg)).value();
    (gmt_m + 0.5 * bmt_m * phi.tan().powi(2)) * phi.sin()
}

/// Section outlines of every station, ready to be heeled.
struct HeeledSections<'a> {
    xs: &'a [f64],
    outlines: Vec<Polygon>,
}

/// Immersed volume and its first moment about the earth-fixed vertical axis
struct Immersion {
    volume_m3: f64,
    moment_y_m4: f64,
}

impl<'a> HeeledSections<'a> {
    fn new(grid: &'a HullGrid) -> Self {
        HeeledSections {
            xs: grid.xs(),
            outlines: (0..grid.n_stations()).map(|i| grid.section_polygon(i)).collect(),
        }
    }

    fn immersion(xs: &[f64], outlines: &[Polygon], level: f64) -> CalcResult<Immersion> {
        let (areas, moments): (Vec<f64>, Vec<f64>) = outlines
            .iter()
            .map(|p| {
                let props = p.clipped_below(level).properties();
                (props.area, props.moment_y)
            })
            .unzip();
        Ok(Immersion {
            volume_m3: integrate(xs, &areas)?.value,
            moment_y_m4: integrate(xs, &moments)?.value,
        })
    }

    /// Volume below a level waterline at `draft_m`, by the same polygon
    /// integration used when heeled
    fn upright_volume(&self, draft_m: f64) -> CalcResult<f64> {
        Ok(Self::immersion(self.xs, &self.outlines, draft_m)?.volume_m3)
    }

    fn gz(&self, heel_deg: f64, target_volume: f64, kg_m: f64, tcg_m: f64) -> CalcResult<f64> {
        let phi = heel_deg.to_radians();
        let heeled: Vec<Polygon> = self.outlines.iter().map(|p| p.rotated(phi)).collect();

        let (mut lo, mut hi) = heeled
            .iter()
            .filter_map(Polygon::z_extent)
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), (a, b)| (lo.min(a), hi.max(b)));
        if !lo.is_finite() || !hi.is_finite() {
            return Err(CalcError::invalid_geometry("Hull has no section outlines"));
        }

        // Immersed volume grows monotonically with the waterline height
        for _ in 0..MAX_BISECTIONS {
            if hi - lo <= WATERLINE_TOLERANCE_M {
                break;
            }
            let mid = 0.5 * (lo + hi);
            if Self::immersion(self.xs, &heeled, mid)?.volume_m3 < target_volume {
                lo = mid;
            } else {
                hi = mid;
            }
        }

        let immersed = Self::immersion(self.xs, &heeled, 0.5 * (lo + hi))?;
        if immersed.volume_m3 <= VOLUME_EPSILON {
            return Err(CalcError::calculation_failed(
                "GZ curve",
                format!("No immersed volume at heel {}°", heel_deg),
            ));
        }
        let y_b = immersed.moment_y_m4 / immersed.volume_m3;
        let y_g = tcg_m * phi.cos() + kg_m * phi.sin();
        Ok(y_b - y_g)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn barge() -> HullGeometry {
        HullGeometry::box_barge(20.0, 10.0, 6.0, 11, 13)
    }

    fn barge_loadcase(kg_m: f64) -> Loadcase {
        Loadcase::new("Barge", 1025.0).with_draft(3.0).with_kg(kg_m)
    }

    #[test]
    fn test_heel_angles() {
        assert_eq!(heel_angles(0.0, 10.0, 5.0).unwrap(), vec![0.0, 5.0, 10.0]);
        // Step does not divide the range: max is still included
        assert_eq!(heel_angles(0.0, 12.0, 5.0).unwrap(), vec![0.0, 5.0, 10.0, 12.0]);
        assert_eq!(heel_angles(15.0, 15.0, 1.0).unwrap(), vec![15.0]);
        assert_eq!(heel_angles(0.0, 1.0, 0.1).unwrap().len(), 11);
    }

    #[test]
    fn test_heel_angles_rejected() {
        assert!(heel_angles(0.0, 10.0, 0.0).is_err());
        assert!(heel_angles(0.0, 10.0, -1.0).is_err());
        assert!(heel_angles(20.0, 10.0, 1.0).is_err());
        assert!(heel_angles(0.0, 190.0, 1.0).is_err());
        assert!(heel_angles(f64::NAN, 10.0, 1.0).is_err());
        assert!(heel_angles(0.0, 180.0, 0.001).is_err());
    }

    #[test]
    fn test_wall_sided_barge_closed_form() {
        // GMt = T/2 + B²/(12T) - KG = 1.5 + 2.778 - 3.0 = 1.278 m
        let curve = compute_gz_curve(&barge(), &barge_loadcase(3.0), 0.0, 45.0, 5.0, StabilityMethod::WallSided).unwrap();
        let gm = 1.5 + 100.0 / 36.0 - 3.0;
        let bm = 100.0 / 36.0;
        for p in &curve.points {
            let phi = p.heel_deg.to_radians();
            let expected = (gm + 0.5 * bm * phi.tan().powi(2)) * phi.sin();
            assert!((p.gz_m - expected).abs() < 1e-9, "φ = {}: {} vs {}", p.heel_deg, p.gz_m, expected);
        }
        assert!((curve.gmt_m.unwrap() - gm).abs() < 1e-9);
    }

    #[test]
    fn test_full_immersion_matches_wall_sided_on_barge() {
        // Box barge is wall-sided until the deck edge immerses at atan(3/5) ≈ 31°
        let lc = barge_loadcase(3.0);
        let full = compute_gz_curve(&barge(), &lc, 1.0, 30.0, 1.0, StabilityMethod::FullImmersion).unwrap();
        let wall = compute_gz_curve(&barge(), &lc, 1.0, 30.0, 1.0, StabilityMethod::WallSided).unwrap();
        for (f, w) in full.points.iter().zip(&wall.points) {
            assert_eq!(f.heel_deg, w.heel_deg);
            assert!(((f.gz_m - w.gz_m) / w.gz_m).abs() < 0.001, "φ = {}: {} vs {}", f.heel_deg, f.gz_m, w.gz_m);
        }
    }

    #[test]
    fn test_full_immersion_large_angles() {
        let curve = compute_gz_curve(&barge(), &barge_loadcase(3.0), 0.0, 180.0, 10.0, StabilityMethod::FullImmersion).unwrap();
        assert_eq!(curve.points.len(), 19);
        assert!(curve.gz_at(0.0).unwrap().abs() < 1e-9);
        // Beam ends: G and B both on the centreline of the rotated box
        assert!(curve.gz_at(90.0).unwrap().abs() < 1e-6);
        assert!(curve.gz_at(180.0).unwrap().abs() < 1e-6);
        // 60°: deck edge well under, B at (0.9 + KG sin60) from the centreline
        assert!((curve.gz_at(60.0).unwrap() - 0.9).abs() < 1e-3);
        let max = curve.max_gz().unwrap();
        assert!(max.heel_deg >= 30.0 && max.heel_deg <= 50.0, "max at {}", max.heel_deg);
    }

    #[test]
    fn test_full_immersion_antisymmetric() {
        let lc = barge_loadcase(3.0);
        let curve = compute_gz_curve(&barge(), &lc, -60.0, 60.0, 10.0, StabilityMethod::FullImmersion).unwrap();
        let n = curve.points.len();
        for i in 0..n {
            let p = curve.points[i];
            let q = curve.points[n - 1 - i];
            assert!((p.heel_deg + q.heel_deg).abs() < 1e-12);
            assert!((p.gz_m + q.gz_m).abs() < 1e-6);
        }
    }

    #[test]
    fn test_negative_gm_is_reported_not_rejected() {
        // KG above the metacentre: KM = 4.278 m
        let curve = compute_gz_curve(&barge(), &barge_loadcase(5.0), 0.0, 20.0, 5.0, StabilityMethod::WallSided).unwrap();
        assert!(curve.gmt_m.unwrap() < 0.0);
        assert!(curve.gz_at(5.0).unwrap() < 0.0);
    }

    #[test]
    fn test_off_centre_tcg_lists_vessel() {
        let lc = barge_loadcase(3.0).with_tcg(0.5);
        let curve = compute_gz_curve(&barge(), &lc, 0.0, 10.0, 1.0, StabilityMethod::FullImmersion).unwrap();
        // Upright, G to starboard gives a heeling (negative) arm of TCG
        assert!((curve.points[0].gz_m + 0.5).abs() < 1e-6);
        assert!(curve.angle_of_vanishing_stability().is_none());
    }

    #[test]
    fn test_wall_sided_rejects_ninety_degrees() {
        let err = compute_gz_curve(&barge(), &barge_loadcase(3.0), 0.0, 90.0, 10.0, StabilityMethod::WallSided).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_INPUT");
    }

    #[test]
    fn test_requires_draft_and_kg() {
        let no_kg = Loadcase::default().with_draft(3.0);
        let err = compute_gz_curve(&barge(), &no_kg, 0.0, 10.0, 1.0, StabilityMethod::FullImmersion).unwrap_err();
        assert_eq!(err, CalcError::missing_field("kg_m"));

        let no_draft = Loadcase::default().with_kg(3.0);
        let err = compute_gz_curve(&barge(), &no_draft, 0.0, 10.0, 1.0, StabilityMethod::FullImmersion).unwrap_err();
        assert_eq!(err, CalcError::missing_field("draft_m"));

        let zero_draft = barge_loadcase(3.0).with_draft(0.0);
        let err = compute_gz_curve(&barge(), &zero_draft, 0.0, 10.0, 1.0, StabilityMethod::FullImmersion).unwrap_err();
        assert_eq!(err.error_code(), "CALCULATION_FAILED");
    }

    fn sample_curve() -> StabilityCurve {
        StabilityCurve {
            method: StabilityMethod::FullImmersion,
            draft_m: 1.0,
            volume_m3: 1.0,
            displacement_kg: 1025.0,
            kg_m: 1.0,
            gmt_m: None,
            points: [(0.0, 0.0), (10.0, 0.2), (20.0, 0.4), (30.0, 0.2), (40.0, -0.2)]
                .iter()
                .map(|&(heel_deg, gz_m)| StabilityPoint { heel_deg, gz_m })
                .collect(),
        }
    }

    #[test]
    fn test_curve_queries() {
        let curve = sample_curve();
        assert_eq!(curve.max_gz().unwrap().heel_deg, 20.0);
        assert!((curve.gz_at(15.0).unwrap() - 0.3).abs() < 1e-12);
        assert!(curve.gz_at(45.0).is_none());
        // Vanishes halfway between 30° (0.2) and 40° (-0.2)
        assert!((curve.angle_of_vanishing_stability().unwrap() - 35.0).abs() < 1e-12);
    }

    #[test]
    fn test_area_between() {
        let curve = sample_curve();
        // 0-20°: triangle, ½ · 20° · 0.4 m = 4 m·deg
        let area = curve.area_between(0.0, 20.0).unwrap();
        assert!((area - 4.0_f64.to_radians()).abs() < 1e-12);
        // 5-15° with interpolated ends: 10° · 0.2 m = 2 m·deg
        let area = curve.area_between(5.0, 15.0).unwrap();
        assert!((area - 2.0_f64.to_radians()).abs() < 1e-12);
        assert!(curve.area_between(0.0, 50.0).is_none());
    }
}
