//! # Naval Architecture Calculations
//!
//! Each calculator is a set of pure functions over a hull and a loadcase:
//!
//! - [`hydrostatics`] - Upright hydrostatics at one draft or a table of drafts
//! - [`stability`] - GZ curves by the wall-sided or full-immersion method
//! - [`criteria`] - IMO A.749(18) general intact stability criteria
//! - [`trim`] - Newton-Raphson equilibrium trim
//! - [`curves`] - Plot-ready hydrostatic, stability and cross curves
//!
//! [`AnalysisItem`] wraps one request for any of them so a study can be
//! described in JSON and run in one call.

pub mod criteria;
pub mod curves;
pub mod hydrostatics;
pub mod stability;
pub mod trim;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::CalcResult;
use crate::hull::HullGeometry;
use crate::loadcase::Loadcase;
use crate::settings::AnalysisSettings;

// Re-export commonly used types
pub use criteria::{check_criteria, CriteriaAssessment, CriterionResult, ImoCriterion};
pub use curves::{cross_curves, hydrostatic_curves, stability_curves, CurveSeries, CurveSet};
pub use hydrostatics::{compute_at, compute_table, compute_trimmed, HydroResult, TrimmedHydro};
pub use stability::{compute_gz_curve, StabilityCurve, StabilityPoint};
pub use trim::{solve_trim, solve_trim_with_cancel, TrimRequest, TrimSolution, TrimTermination};

/// The GZ methods on offer. The set is fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StabilityMethod {
    /// `(GMt + ½·BMt·tan²φ)·sinφ`, small to moderate heel
    WallSided,
    /// Rotate and clip the section outlines at constant displacement
    FullImmersion,
}

impl StabilityMethod {
    pub const ALL: [StabilityMethod; 2] = [StabilityMethod::WallSided, StabilityMethod::FullImmersion];

    pub fn display_name(&self) -> &'static str {
        match self {
            StabilityMethod::WallSided => "Wall-sided",
            StabilityMethod::FullImmersion => "Full immersion",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            StabilityMethod::WallSided => {
                "Closed-form righting arm from upright GMt and BMt; exact for vertical sides until deck-edge immersion"
            }
            StabilityMethod::FullImmersion => {
                "Heeled section outlines clipped at the constant-displacement waterline; valid to 180°"
            }
        }
    }

    /// Largest heel magnitude the method accepts (degrees, exclusive for wall-sided)
    pub fn max_heel_deg(&self) -> f64 {
        match self {
            StabilityMethod::WallSided => 90.0,
            StabilityMethod::FullImmersion => 180.0,
        }
    }
}

impl fmt::Display for StabilityMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// One requested analysis.
///
/// Fields left out fall back to the study's [`AnalysisSettings`].
///
/// ## JSON Example
///
/// ```json
/// [
///   { "type": "HydrostaticTable", "from_m": 0.5, "to_m": 4.0 },
///   { "type": "Criteria" },
///   { "type": "Trim", "target_displacement_kg": 600000.0 }
/// ]
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum AnalysisItem {
    /// Hydrostatics from `from_m` to `to_m` at the settings' draft step
    HydrostaticTable { from_m: f64, to_m: f64 },
    /// GZ curve over the settings' heel sweep
    GzCurve {
        #[serde(default)]
        method: Option<StabilityMethod>,
    },
    /// GZ curve plus the six IMO criteria
    Criteria {
        #[serde(default)]
        method: Option<StabilityMethod>,
    },
    /// Equilibrium drafts; starts level at the loadcase draft unless given
    Trim {
        target_displacement_kg: f64,
        #[serde(default)]
        initial_draft_fwd_m: Option<f64>,
        #[serde(default)]
        initial_draft_aft_m: Option<f64>,
    },
    /// Hydrostatic curves from `from_m` to `to_m`
    HydrostaticCurves { from_m: f64, to_m: f64 },
    /// GZ and KN for every method over the heel sweep
    StabilityCurves,
    /// KN against displacement at the given drafts, per heel of the sweep
    CrossCurves { drafts_m: Vec<f64> },
}

/// Result of one [`AnalysisItem`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "result")]
pub enum AnalysisOutput {
    HydrostaticTable(Vec<HydroResult>),
    GzCurve(StabilityCurve),
    Criteria {
        curve: StabilityCurve,
        assessment: CriteriaAssessment,
    },
    Trim(TrimSolution),
    Curves(CurveSet),
}

impl AnalysisItem {
    /// Get the analysis type as a string
    pub fn calc_type(&self) -> &'static str {
        match self {
            AnalysisItem::HydrostaticTable { .. } => "Hydrostatic table",
            AnalysisItem::GzCurve { .. } => "GZ curve",
            AnalysisItem::Criteria { .. } => "IMO criteria",
            AnalysisItem::Trim { .. } => "Trim",
            AnalysisItem::HydrostaticCurves { .. } => "Hydrostatic curves",
            AnalysisItem::StabilityCurves => "Stability curves",
            AnalysisItem::CrossCurves { .. } => "Cross curves",
        }
    }

    /// Run the analysis.
    pub fn run(&self, hull: &HullGeometry, loadcase: &Loadcase, settings: &AnalysisSettings) -> CalcResult<AnalysisOutput> {
        settings.validate()?;
        let heel = &settings.heel;
        match self {
            AnalysisItem::HydrostaticTable { from_m, to_m } => {
                let drafts = settings.draft_range(*from_m, *to_m)?;
                Ok(AnalysisOutput::HydrostaticTable(compute_table(hull, loadcase, &drafts)?))
            }
            AnalysisItem::GzCurve { method } => {
                let method = method.unwrap_or(settings.stability_method);
                let curve = compute_gz_curve(hull, loadcase, heel.min_deg, heel.max_deg, heel.step_deg, method)?;
                Ok(AnalysisOutput::GzCurve(curve))
            }
            AnalysisItem::Criteria { method } => {
                let method = method.unwrap_or(settings.stability_method);
                let curve = compute_gz_curve(hull, loadcase, heel.min_deg, heel.max_deg, heel.step_deg, method)?;
                let assessment = check_criteria(&curve, loadcase)?;
                Ok(AnalysisOutput::Criteria { curve, assessment })
            }
            AnalysisItem::Trim {
                target_displacement_kg,
                initial_draft_fwd_m,
                initial_draft_aft_m,
            } => {
                let start = match loadcase.draft_m {
                    Some(d) => d,
                    None => {
                        let grid = hull.validate()?;
                        0.5 * (grid.keel_z_m() + grid.top_z_m())
                    }
                };
                let request = TrimRequest::from_settings(
                    *target_displacement_kg,
                    initial_draft_fwd_m.unwrap_or(start),
                    initial_draft_aft_m.unwrap_or(start),
                    &settings.trim,
                );
                let cancel = std::sync::atomic::AtomicBool::new(false);
                Ok(AnalysisOutput::Trim(solve_trim_with_cancel(hull, loadcase, &request, &cancel)?))
            }
            AnalysisItem::HydrostaticCurves { from_m, to_m } => {
                let drafts = settings.draft_range(*from_m, *to_m)?;
                Ok(AnalysisOutput::Curves(hydrostatic_curves(hull, loadcase, &drafts)?))
            }
            AnalysisItem::StabilityCurves => {
                let angles = heel.angles()?;
                let methods: Vec<StabilityMethod> = StabilityMethod::ALL
                    .into_iter()
                    .filter(|m| angles.iter().all(|a| a.abs() < m.max_heel_deg()))
                    .collect();
                Ok(AnalysisOutput::Curves(stability_curves(hull, loadcase, &angles, &methods)?))
            }
            AnalysisItem::CrossCurves { drafts_m } => {
                let angles = heel.angles()?;
                Ok(AnalysisOutput::Curves(cross_curves(hull, loadcase, drafts_m, &angles)?))
            }
        }
    }
}
