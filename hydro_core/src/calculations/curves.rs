//! # Curve Sets
//!
//! Plot-ready series assembled from the calculators:
//!
//! - [`hydrostatic_curves`] - hydrostatic particulars against draft
//! - [`stability_curves`] - GZ (one series per method) and KN against heel
//! - [`cross_curves`] - KN against displacement, one series per heel angle
//!
//! Undefined values (`None` in the underlying results) are left out of a
//! series rather than plotted as zero.
//!
//! ## Example
//!
//! ```rust
//! use hydro_core::calculations::curves::hydrostatic_curves;
//! use hydro_core::hull::HullGeometry;
//! use hydro_core::loadcase::Loadcase;
//!
//! let barge = HullGeometry::box_barge(20.0, 10.0, 6.0, 11, 13);
//! let set = hydrostatic_curves(&barge, &Loadcase::default(), &[1.0, 2.0, 3.0]).unwrap();
//! let disp = set.series("Displacement").unwrap();
//! assert_eq!(disp.points.len(), 3);
//! ```

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calculations::hydrostatics::{compute_table_grid, HydroResult};
use crate::calculations::stability::{compute_gz_curve_grid, StabilityCurve};
use crate::calculations::StabilityMethod;
use crate::errors::{CalcError, CalcResult};
use crate::hull::HullGeometry;
use crate::loadcase::Loadcase;

/// One named line of a plot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurveSeries {
    pub name: String,
    pub x_label: String,
    pub y_label: String,
    pub points: Vec<(f64, f64)>,
}

impl CurveSeries {
    pub fn new(name: impl Into<String>, x_label: impl Into<String>, y_label: impl Into<String>) -> Self {
        CurveSeries {
            name: name.into(),
            x_label: x_label.into(),
            y_label: y_label.into(),
            points: Vec::new(),
        }
    }

    /// Linear interpolation at `x`; `None` outside the series
    pub fn y_at(&self, x: f64) -> Option<f64> {
        self.points.windows(2).find_map(|w| {
            let ((x0, y0), (x1, y1)) = (w[0], w[1]);
            let (lo, hi) = if x0 <= x1 { (x0, x1) } else { (x1, x0) };
            if x < lo || x > hi {
                return None;
            }
            if x1 == x0 {
                return Some(y0);
            }
            Some(y0 + (x - x0) / (x1 - x0) * (y1 - y0))
        })
    }
}

/// A titled group of series sharing an x axis.
///
/// ## JSON Example
///
/// ```json
/// {
///   "title": "Hydrostatic curves: Box barge 20x10x6",
///   "series": [
///     {
///       "name": "Displacement",
///       "x_label": "Draft (m)",
///       "y_label": "Displacement (kg)",
///       "points": [[1.0, 205000.0], [2.0, 410000.0]]
///     }
///   ]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurveSet {
    pub title: String,
    pub series: Vec<CurveSeries>,
}

impl CurveSet {
    pub fn series(&self, name: &str) -> Option<&CurveSeries> {
        self.series.iter().find(|s| s.name == name)
    }
}

type Extractor = fn(&HydroResult) -> Option<f64>;

/// Name, y-axis label and value of each hydrostatic series
const HYDROSTATIC_SERIES: [(&str, &str, Extractor); 16] = [
    ("Displacement", "Displacement (kg)", |r| Some(r.displacement_kg)),
    ("Volume", "Volume (m³)", |r| Some(r.volume_m3)),
    ("KB", "KB (m)", |r| r.kb_m),
    ("LCB", "LCB (m)", |r| r.lcb_m),
    ("LCF", "LCF (m)", |r| r.lcf_m),
    ("BMt", "BMt (m)", |r| r.bmt_m),
    ("BMl", "BMl (m)", |r| r.bml_m),
    ("KMt", "KMt (m)", |r| r.kmt_m),
    ("KMl", "KMl (m)", |r| r.kml_m),
    ("Awp", "Waterplane area (m²)", |r| Some(r.waterplane_area_m2)),
    ("TPC", "TPC (kg/cm)", |r| Some(r.tpc_kg_per_cm)),
    ("MTC", "MTC (kg·m/m)", |r| r.mtc_kgm_per_m),
    ("Cb", "Cb", |r| r.cb),
    ("Cp", "Cp", |r| r.cp),
    ("Cm", "Cm", |r| r.cm),
    ("Cwp", "Cwp", |r| r.cwp),
];

/// Hydrostatic particulars against draft.
pub fn hydrostatic_curves(hull: &HullGeometry, loadcase: &Loadcase, drafts_m: &[f64]) -> CalcResult<CurveSet> {
    let grid = hull.validate()?;
    let table = compute_table_grid(&grid, loadcase, drafts_m)?;

    let series = HYDROSTATIC_SERIES
        .iter()
        .map(|(name, y_label, value)| {
            let mut s = CurveSeries::new(*name, "Draft (m)", *y_label);
            s.points = table
                .iter()
                .filter_map(|r| value(r).map(|v| (r.draft_m, v)))
                .collect();
            s
        })
        .collect();

    Ok(CurveSet {
        title: format!("Hydrostatic curves: {}", grid.label()),
        series,
    })
}

/// GZ for each method, plus KN = GZ + KG·sinφ for each, against heel.
///
/// Needs `draft_m` and `kg_m` on the loadcase.
pub fn stability_curves(
    hull: &HullGeometry,
    loadcase: &Loadcase,
    angles_deg: &[f64],
    methods: &[StabilityMethod],
) -> CalcResult<CurveSet> {
    if methods.is_empty() {
        return Err(CalcError::invalid_input("methods", "[]", "At least one stability method is required"));
    }
    let grid = hull.validate()?;
    let curves = methods
        .iter()
        .map(|&m| compute_gz_curve_grid(&grid, loadcase, angles_deg, m))
        .collect::<CalcResult<Vec<StabilityCurve>>>()?;

    let mut series = Vec::with_capacity(2 * curves.len());
    for curve in &curves {
        let mut gz = CurveSeries::new(format!("GZ ({})", curve.method.display_name()), "Heel (deg)", "GZ (m)");
        gz.points = curve.points.iter().map(|p| (p.heel_deg, p.gz_m)).collect();
        series.push(gz);
    }
    for curve in &curves {
        let mut kn = CurveSeries::new(format!("KN ({})", curve.method.display_name()), "Heel (deg)", "KN (m)");
        kn.points = curve
            .points
            .iter()
            .map(|p| (p.heel_deg, p.gz_m + curve.kg_m * p.heel_deg.to_radians().sin()))
            .collect();
        series.push(kn);
    }

    Ok(CurveSet {
        title: format!("Stability curves: {}", grid.label()),
        series,
    })
}

/// Cross curves of stability: KN against displacement, one series per
/// heel angle, by the full-immersion method.
///
/// KN is GZ with G on the baseline, so the loadcase KG and TCG are ignored.
/// Each draft must give a non-zero displacement.
pub fn cross_curves(
    hull: &HullGeometry,
    loadcase: &Loadcase,
    drafts_m: &[f64],
    angles_deg: &[f64],
) -> CalcResult<CurveSet> {
    let grid = hull.validate()?;
    for &d in drafts_m {
        grid.check_draft(d)?;
    }
    debug!(drafts = drafts_m.len(), angles = angles_deg.len(), "computing cross curves");

    let curves = drafts_m
        .par_iter()
        .map(|&d| {
            let at_draft = Loadcase {
                draft_m: Some(d),
                kg_m: Some(0.0),
                tcg_m: 0.0,
                ..loadcase.clone()
            };
            compute_gz_curve_grid(&grid, &at_draft, angles_deg, StabilityMethod::FullImmersion)
        })
        .collect::<CalcResult<Vec<StabilityCurve>>>()?;

    let series = angles_deg
        .iter()
        .enumerate()
        .map(|(i, &angle)| {
            let mut s = CurveSeries::new(format!("{}°", angle), "Displacement (kg)", "KN (m)");
            s.points = curves
                .iter()
                .map(|c| (c.displacement_kg, c.points[i].gz_m))
                .collect();
            s
        })
        .collect();

    Ok(CurveSet {
        title: format!("Cross curves: {}", grid.label()),
        series,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculations::stability::compute_gz_curve;

    fn barge() -> HullGeometry {
        HullGeometry::box_barge(20.0, 10.0, 6.0, 11, 13)
    }

    #[test]
    fn test_hydrostatic_curves() {
        let set = hydrostatic_curves(&barge(), &Loadcase::default(), &[0.0, 1.0, 2.0, 3.0]).unwrap();
        assert_eq!(set.series.len(), 16);

        // Δ = 1025 · 200 · T
        let disp = set.series("Displacement").unwrap();
        assert_eq!(disp.points.len(), 4);
        assert!((disp.y_at(1.5).unwrap() - 307_500.0).abs() < 1e-6);

        // No volume at T = 0: KB is undefined there and left out
        let kb = set.series("KB").unwrap();
        assert_eq!(kb.points.len(), 3);
        assert_eq!(kb.points[0].0, 1.0);
    }

    #[test]
    fn test_stability_curves_kn() {
        let lc = Loadcase::default().with_draft(3.0).with_kg(3.0);
        let angles = [0.0, 10.0, 20.0, 30.0];
        let set = stability_curves(&barge(), &lc, &angles, &StabilityMethod::ALL).unwrap();
        assert_eq!(set.series.len(), 4);

        let gz = set.series("GZ (Full immersion)").unwrap();
        let kn = set.series("KN (Full immersion)").unwrap();
        for (g, k) in gz.points.iter().zip(&kn.points) {
            assert!((k.1 - g.1 - 3.0 * g.0.to_radians().sin()).abs() < 1e-12);
        }
        assert!(stability_curves(&barge(), &lc, &angles, &[]).is_err());
    }

    #[test]
    fn test_cross_curves_match_gz() {
        let lc = Loadcase::default().with_kg(3.0);
        let angles = [10.0, 30.0, 60.0];
        let set = cross_curves(&barge(), &lc, &[2.0, 3.0, 4.0], &angles).unwrap();
        assert_eq!(set.series.len(), 3);

        // At T = 3 m, KN - KG·sinφ is the GZ of the loaded barge
        let curve = compute_gz_curve(
            &barge(),
            &lc.clone().with_draft(3.0),
            10.0,
            60.0,
            10.0,
            StabilityMethod::FullImmersion,
        )
        .unwrap();
        for (s, &angle) in set.series.iter().zip(&angles) {
            assert_eq!(s.points.len(), 3);
            let (disp, kn) = s.points[1];
            assert!((disp - 615_000.0).abs() < 1e-6);
            let gz = curve.gz_at(angle).unwrap();
            assert!((kn - 3.0 * angle.to_radians().sin() - gz).abs() < 1e-6, "φ = {}", angle);
        }
    }

    #[test]
    fn test_cross_curves_reject_bad_draft() {
        let err = cross_curves(&barge(), &Loadcase::default(), &[3.0, 9.0], &[10.0]).unwrap_err();
        assert_eq!(err.error_code(), "DRAFT_OUT_OF_RANGE");
    }
}
