//! # Equilibrium Trim
//!
//! Finds the forward and aft drafts at which the vessel floats at a target
//! displacement with its centre of buoyancy below its centre of gravity.
//!
//! ## Method
//!
//! Two-variable Newton-Raphson on `(draft_fwd, draft_aft)` with residuals
//!
//! - `r₁ = Δ(T_f, T_a) − Δ_target` (kg)
//! - `r₂ = LCB(T_f, T_a) − LCG` (m), the trimming lever
//!
//! The Jacobian is built by forward differences. Drafts are clamped to the
//! sampled waterline range after each step. The run ends as soon as both
//! residuals are within tolerance, the iteration limit is reached, the
//! Jacobian becomes singular, or the caller cancels. None of those is an
//! error: the best estimate comes back with `converged = false`.
//!
//! ## Example
//!
//! ```rust
//! use hydro_core::calculations::trim::solve_trim;
//! use hydro_core::hull::HullGeometry;
//! use hydro_core::loadcase::Loadcase;
//!
//! let barge = HullGeometry::box_barge(20.0, 10.0, 6.0, 11, 13);
//! let lc = Loadcase::new("Aft load", 1025.0).with_lcg(9.0);
//!
//! let solution = solve_trim(&barge, &lc, 615_000.0, 3.0, 3.0, 50, 1.0).unwrap();
//! assert!(solution.converged);
//! assert!(solution.draft_aft_m > solution.draft_fwd_m);
//! ```

use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::calculations::hydrostatics::{compute_at_grid, compute_trimmed_grid};
use crate::errors::{CalcError, CalcResult};
use crate::hull::{HullGeometry, HullGrid};
use crate::loadcase::Loadcase;
use crate::settings::TrimSettings;

/// Lever tolerance as a fraction of Lpp
const LEVER_TOLERANCE_RATIO: f64 = 1e-6;

/// Jacobian treated as singular below this relative determinant
const SINGULAR_RATIO: f64 = 1e-12;

/// Why the solver stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrimTermination {
    Converged,
    MaxIterations,
    SingularJacobian,
    Cancelled,
}

/// Parameters of one trim run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrimRequest {
    pub target_displacement_kg: f64,
    pub initial_draft_fwd_m: f64,
    pub initial_draft_aft_m: f64,
    pub max_iterations: usize,
    /// Acceptable displacement error (kg)
    pub tolerance_kg: f64,
    /// Finite-difference draft step (m)
    pub fd_step_m: f64,
}

impl TrimRequest {
    /// Request with the default solver settings
    pub fn new(target_displacement_kg: f64, initial_draft_fwd_m: f64, initial_draft_aft_m: f64) -> Self {
        TrimRequest::from_settings(
            target_displacement_kg,
            initial_draft_fwd_m,
            initial_draft_aft_m,
            &TrimSettings::default(),
        )
    }

    pub fn from_settings(
        target_displacement_kg: f64,
        initial_draft_fwd_m: f64,
        initial_draft_aft_m: f64,
        settings: &TrimSettings,
    ) -> Self {
        TrimRequest {
            target_displacement_kg,
            initial_draft_fwd_m,
            initial_draft_aft_m,
            max_iterations: settings.max_iterations,
            tolerance_kg: settings.tolerance_kg,
            fd_step_m: settings.fd_step_m,
        }
    }

    fn validate(&self, grid: &HullGrid) -> CalcResult<()> {
        if !self.target_displacement_kg.is_finite() || self.target_displacement_kg <= 0.0 {
            return Err(CalcError::invalid_input(
                "target_displacement_kg",
                self.target_displacement_kg.to_string(),
                "Target displacement must be positive",
            ));
        }
        grid.check_draft(self.initial_draft_fwd_m)?;
        grid.check_draft(self.initial_draft_aft_m)?;
        TrimSettings {
            max_iterations: self.max_iterations,
            tolerance_kg: self.tolerance_kg,
            fd_step_m: self.fd_step_m,
        }
        .validate()
    }
}

/// Equilibrium (or best estimate) of a trim run.
///
/// ## JSON Example
///
/// ```json
/// {
///   "draft_fwd_m": 2.1,
///   "draft_aft_m": 3.9,
///   "mean_draft_m": 3.0,
///   "trim_m": -1.8,
///   "trim_angle_deg": -5.14,
///   "displacement_kg": 615000.0,
///   "displacement_error_kg": 0.0,
///   "lever_error_m": 0.0,
///   "converged": true,
///   "iterations": 2,
///   "termination": "Converged"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrimSolution {
    pub draft_fwd_m: f64,
    pub draft_aft_m: f64,
    pub mean_draft_m: f64,
    /// Forward minus aft draft; positive by the head (m)
    pub trim_m: f64,
    pub trim_angle_deg: f64,
    /// LCF at the mean draft (m)
    pub lcf_m: Option<f64>,
    /// Moment to change trim at the mean draft (kg·m/m)
    pub mtc_kgm_per_m: Option<f64>,
    pub displacement_kg: f64,
    /// Achieved minus target displacement (kg)
    pub displacement_error_kg: f64,
    /// LCB minus LCG (m)
    pub lever_error_m: f64,
    pub converged: bool,
    pub iterations: usize,
    pub termination: TrimTermination,
}

/// Solve for equilibrium drafts.
///
/// # Arguments
/// * `target_displacement_kg` - Mass the vessel must support (kg)
/// * `initial_draft_fwd_m`, `initial_draft_aft_m` - Starting estimate (m)
/// * `max_iterations` - Newton steps allowed
/// * `tolerance_kg` - Acceptable displacement error (kg)
///
/// # Errors
/// Only for invalid inputs; non-convergence is reported in the solution.
pub fn solve_trim(
    hull: &HullGeometry,
    loadcase: &Loadcase,
    target_displacement_kg: f64,
    initial_draft_fwd_m: f64,
    initial_draft_aft_m: f64,
    max_iterations: usize,
    tolerance_kg: f64,
) -> CalcResult<TrimSolution> {
    let request = TrimRequest {
        max_iterations,
        tolerance_kg,
        ..TrimRequest::new(target_displacement_kg, initial_draft_fwd_m, initial_draft_aft_m)
    };
    solve_trim_with_cancel(hull, loadcase, &request, &AtomicBool::new(false))
}

/// [`solve_trim`] with a cancellation flag, checked between iterations.
pub fn solve_trim_with_cancel(
    hull: &HullGeometry,
    loadcase: &Loadcase,
    request: &TrimRequest,
    cancel: &AtomicBool,
) -> CalcResult<TrimSolution> {
    let grid = hull.validate()?;
    solve_trim_grid(&grid, loadcase, request, cancel)
}

/// Residuals at one pair of drafts
#[derive(Debug, Clone, Copy)]
struct Residual {
    displacement_kg: f64,
    displacement_error_kg: f64,
    lever_error_m: f64,
}

impl Residual {
    /// Size of the residual with both parts scaled to be dimensionless
    fn merit(&self, target_kg: f64, lpp_m: f64) -> f64 {
        (self.displacement_error_kg / target_kg).abs() + (self.lever_error_m / lpp_m).abs()
    }
}

/// Trim solver on an already validated grid.
pub fn solve_trim_grid(
    grid: &HullGrid,
    loadcase: &Loadcase,
    request: &TrimRequest,
    cancel: &AtomicBool,
) -> CalcResult<TrimSolution> {
    loadcase.validate()?;
    request.validate(grid)?;

    let lcg = loadcase.lcg_or(grid.midship_x_m());
    let lpp = grid.lpp_m();
    let lever_tolerance = LEVER_TOLERANCE_RATIO * lpp;
    let (lo, hi) = (grid.keel_z_m(), grid.top_z_m());
    let h = request.fd_step_m;

    let evaluate = |fwd: f64, aft: f64| -> CalcResult<Residual> {
        let trimmed = compute_trimmed_grid(grid, loadcase, aft, fwd)?;
        Ok(Residual {
            displacement_kg: trimmed.displacement_kg,
            displacement_error_kg: trimmed.displacement_kg - request.target_displacement_kg,
            // No volume, no lever: the displacement residual drives the step
            lever_error_m: trimmed.lcb_m.map_or(0.0, |lcb| lcb - lcg),
        })
    };
    // Step away from the upper limit so the perturbed draft stays in range
    let step_for = |d: f64| if d + h <= hi { h } else { -h };

    debug!(
        target_kg = request.target_displacement_kg,
        lcg_m = lcg,
        max_iterations = request.max_iterations,
        "solving trim"
    );

    let mut fwd = request.initial_draft_fwd_m;
    let mut aft = request.initial_draft_aft_m;
    let mut residual = evaluate(fwd, aft)?;
    let mut iterations = 0;
    // Lowest residual seen so far, starting point included
    let mut best = (fwd, aft, residual);
    let merit = |r: &Residual| r.merit(request.target_displacement_kg, lpp);

    let termination = loop {
        if residual.displacement_error_kg.abs() < request.tolerance_kg
            && residual.lever_error_m.abs() < lever_tolerance
        {
            break TrimTermination::Converged;
        }
        if iterations >= request.max_iterations {
            break TrimTermination::MaxIterations;
        }
        if cancel.load(Ordering::Relaxed) {
            break TrimTermination::Cancelled;
        }

        let hf = step_for(fwd);
        let ha = step_for(aft);
        let r_fwd = evaluate(fwd + hf, aft)?;
        let r_aft = evaluate(fwd, aft + ha)?;

        // J = ∂(r₁, r₂)/∂(T_f, T_a)
        let j11 = (r_fwd.displacement_error_kg - residual.displacement_error_kg) / hf;
        let j21 = (r_fwd.lever_error_m - residual.lever_error_m) / hf;
        let j12 = (r_aft.displacement_error_kg - residual.displacement_error_kg) / ha;
        let j22 = (r_aft.lever_error_m - residual.lever_error_m) / ha;

        let det = j11 * j22 - j12 * j21;
        let scale = (j11 * j22).abs() + (j12 * j21).abs();
        if !det.is_finite() || scale == 0.0 || det.abs() <= SINGULAR_RATIO * scale {
            break TrimTermination::SingularJacobian;
        }

        let r1 = residual.displacement_error_kg;
        let r2 = residual.lever_error_m;
        let d_fwd = (-r1 * j22 + r2 * j12) / det;
        let d_aft = (-r2 * j11 + r1 * j21) / det;

        fwd = (fwd + d_fwd).clamp(lo, hi);
        aft = (aft + d_aft).clamp(lo, hi);
        iterations += 1;
        residual = evaluate(fwd, aft)?;
        if merit(&residual) < merit(&best.2) {
            best = (fwd, aft, residual);
        }

        debug!(
            iteration = iterations,
            draft_fwd_m = fwd,
            draft_aft_m = aft,
            error_kg = residual.displacement_error_kg,
            lever_m = residual.lever_error_m,
            "trim iteration"
        );
    };

    let converged = termination == TrimTermination::Converged;
    let (fwd, aft, residual) = if converged { (fwd, aft, residual) } else { best };
    if !converged {
        warn!(
            ?termination,
            iterations,
            error_kg = residual.displacement_error_kg,
            lever_m = residual.lever_error_m,
            "trim solver stopped before convergence"
        );
    }

    let mean = 0.5 * (fwd + aft);
    let upright = compute_at_grid(grid, loadcase, mean)?;
    let trim = fwd - aft;

    Ok(TrimSolution {
        draft_fwd_m: fwd,
        draft_aft_m: aft,
        mean_draft_m: mean,
        trim_m: trim,
        trim_angle_deg: (trim / lpp).atan().to_degrees(),
        lcf_m: upright.lcf_m,
        mtc_kgm_per_m: upright.mtc_kgm_per_m,
        displacement_kg: residual.displacement_kg,
        displacement_error_kg: residual.displacement_error_kg,
        lever_error_m: residual.lever_error_m,
        converged,
        iterations,
        termination,
    })
}
