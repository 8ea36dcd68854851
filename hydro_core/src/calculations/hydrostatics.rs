//! # Upright Hydrostatics
//!
//! Displacement, centres of buoyancy, metacentric radii and heights,
//! waterplane properties and form coefficients at a level waterline, plus
//! volume and LCB for a trimmed waterline (used by the trim solver).
//!
//! ## Method
//!
//! 1. Sectional area at each station, `A(x) = 2∫y dz`, keel to draft
//!    (half-breadth interpolated at the draft)
//! 2. Volume `∇ = ∫A dx`, displacement `Δ = ρ∇`
//! 3. `KB = ∫Mz dx / ∇` with `Mz = 2∫z·y dz` per section
//! 4. `LCB = ∫x·A dx / ∇`, `TCB = 0` (symmetric hull)
//! 5. Waterplane: `Awp = 2∫y dx`, `LCF = 2∫x·y dx / Awp`,
//!    `It = ⅔∫y³ dx`, `Il = 2∫x²·y dx − Awp·LCF²`
//! 6. `BMt = It/∇`, `BMl = Il/∇`, `GM = KB + BM − KG`
//! 7. `Cb = ∇/(L·B·T)`, `Cp = ∇/(Am·L)`, `Cm = Am/(B·T)`, `Cwp = Awp/(L·B)`
//!
//! ## Example
//!
//! ```rust
//! use hydro_core::calculations::hydrostatics::compute_at;
//! use hydro_core::hull::HullGeometry;
//! use hydro_core::loadcase::Loadcase;
//!
//! let barge = HullGeometry::box_barge(20.0, 10.0, 6.0, 11, 13);
//! let lc = Loadcase::new("Trial", 1025.0).with_kg(3.0);
//!
//! let result = compute_at(&barge, &lc, 3.0).unwrap();
//! assert!((result.displacement_kg - 615_000.0).abs() < 1.0);
//! assert!((result.kb_m.unwrap() - 1.5).abs() < 1e-9);
//! ```

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::equations::integration::{first_moment, integrate, second_moment, select_rule, IntegrationRule};
use crate::errors::CalcResult;
use crate::hull::{HullGeometry, HullGrid};
use crate::loadcase::Loadcase;

/// Volumes, areas and lengths below these are treated as zero
pub(crate) const VOLUME_EPSILON: f64 = 1e-9;
pub(crate) const AREA_EPSILON: f64 = 1e-12;
pub(crate) const LENGTH_EPSILON: f64 = 1e-12;

/// Hydrostatic properties at one level draft.
///
/// `None` marks a quantity that is undefined at this draft (zero volume,
/// zero waterplane, zero beam) or that needs KG when none was supplied.
///
/// ## JSON Example
///
/// ```json
/// {
///   "draft_m": 3.0,
///   "volume_m3": 600.0,
///   "displacement_kg": 615000.0,
///   "kb_m": 1.5,
///   "bmt_m": 2.778,
///   "gmt_m": 1.278,
///   "cb": 1.0
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HydroResult {
    /// Draft above the baseline (m)
    pub draft_m: f64,
    /// Displaced volume ∇ (m³)
    pub volume_m3: f64,
    /// Displacement Δ = ρ∇ (kg)
    pub displacement_kg: f64,
    /// Vertical centre of buoyancy above the baseline (m)
    pub kb_m: Option<f64>,
    /// Longitudinal centre of buoyancy (m)
    pub lcb_m: Option<f64>,
    /// Transverse centre of buoyancy (m), zero for a symmetric hull
    pub tcb_m: Option<f64>,
    /// Transverse metacentric radius (m)
    pub bmt_m: Option<f64>,
    /// Longitudinal metacentric radius (m)
    pub bml_m: Option<f64>,
    /// Transverse metacentric height (m), needs KG
    pub gmt_m: Option<f64>,
    /// Longitudinal metacentric height (m), needs KG
    pub gml_m: Option<f64>,
    /// Transverse metacentre above the baseline, KB + BMt (m)
    pub kmt_m: Option<f64>,
    /// Longitudinal metacentre above the baseline, KB + BMl (m)
    pub kml_m: Option<f64>,
    /// Waterplane area (m²)
    pub waterplane_area_m2: f64,
    /// Waterplane second moment about the centreline (m⁴)
    pub waterplane_it_m4: f64,
    /// Waterplane second moment about a transverse axis through the LCF (m⁴)
    pub waterplane_il_m4: Option<f64>,
    /// Longitudinal centre of flotation (m)
    pub lcf_m: Option<f64>,
    /// Mass to sink one centimetre (kg/cm)
    pub tpc_kg_per_cm: f64,
    /// Moment to change trim one metre, Δ·GMl/Lpp (kg·m/m); BMl stands in for GMl without KG
    pub mtc_kgm_per_m: Option<f64>,
    /// Block coefficient
    pub cb: Option<f64>,
    /// Prismatic coefficient
    pub cp: Option<f64>,
    /// Midship section coefficient
    pub cm: Option<f64>,
    /// Waterplane area coefficient
    pub cwp: Option<f64>,
    /// Rule used for integrals along the length
    pub integration_rule: IntegrationRule,
}

/// Volume and LCB for a trimmed (inclined) waterline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrimmedHydro {
    pub draft_aft_m: f64,
    pub draft_fwd_m: f64,
    pub volume_m3: f64,
    pub displacement_kg: f64,
    /// `None` when the immersed volume is zero
    pub lcb_m: Option<f64>,
}

/// Area and vertical first moment of each station's immersed section.
struct SectionalData {
    areas: Vec<f64>,
    moments_z: Vec<f64>,
}

/// Immersed area `2∫y dz` and moment `2∫z·y dz` of one station up to `draft`.
fn immersed_section(grid: &HullGrid, station: usize, draft_m: f64) -> CalcResult<(f64, f64)> {
    let (zs, ys) = grid.immersed_profile(station, draft_m);
    if zs.len() < 2 {
        // Draft at the keel line
        return Ok((0.0, 0.0));
    }
    let area = 2.0 * integrate(&zs, &ys)?.value;
    let moment = 2.0 * first_moment(&zs, &ys)?.value;
    Ok((area, moment))
}

fn sectional_data<F>(grid: &HullGrid, local_draft: F) -> CalcResult<SectionalData>
where
    F: Fn(f64) -> f64,
{
    let n = grid.n_stations();
    let mut areas = Vec::with_capacity(n);
    let mut moments_z = Vec::with_capacity(n);
    for (i, &x) in grid.xs().iter().enumerate() {
        let (a, m) = immersed_section(grid, i, local_draft(x))?;
        areas.push(a);
        moments_z.push(m);
    }
    Ok(SectionalData { areas, moments_z })
}

/// Linear interpolation of sectional area at longitudinal position `x`
fn area_at(xs: &[f64], areas: &[f64], x: f64) -> f64 {
    let n = xs.len();
    if x <= xs[0] {
        return areas[0];
    }
    if x >= xs[n - 1] {
        return areas[n - 1];
    }
    let upper = xs.partition_point(|v| *v < x);
    let lower = upper - 1;
    let t = (x - xs[lower]) / (xs[upper] - xs[lower]);
    areas[lower] + t * (areas[upper] - areas[lower])
}

fn ratio(numerator: f64, denominator: f64, epsilon: f64) -> Option<f64> {
    (denominator.abs() > epsilon).then(|| numerator / denominator)
}

/// Hydrostatics at one draft.
///
/// # Errors
/// Invalid geometry or loadcase, or a draft outside the sampled waterlines.
pub fn compute_at(hull: &HullGeometry, loadcase: &Loadcase, draft_m: f64) -> CalcResult<HydroResult> {
    let grid = hull.validate()?;
    compute_at_grid(&grid, loadcase, draft_m)
}

/// Hydrostatics at one draft on an already validated grid.
pub fn compute_at_grid(grid: &HullGrid, loadcase: &Loadcase, draft_m: f64) -> CalcResult<HydroResult> {
    loadcase.validate()?;
    grid.check_draft(draft_m)?;

    let xs = grid.xs();
    let rho = loadcase.density_kg_m3;

    // Steps 1-4: sections, volume, centres of buoyancy
    let sections = sectional_data(grid, |_| draft_m)?;
    let volume_integral = integrate(xs, &sections.areas)?;
    let volume = volume_integral.value;
    let has_volume = volume > VOLUME_EPSILON;

    let kb = ratio(integrate(xs, &sections.moments_z)?.value, volume, VOLUME_EPSILON);
    let lcb = ratio(first_moment(xs, &sections.areas)?.value, volume, VOLUME_EPSILON);
    let tcb = has_volume.then_some(0.0);

    // Step 5: waterplane
    let wl = grid.waterline_offsets(draft_m);
    let awp = 2.0 * integrate(xs, &wl)?.value;
    let lcf = ratio(2.0 * first_moment(xs, &wl)?.value, awp, AREA_EPSILON);
    let cubes: Vec<f64> = wl.iter().map(|y| y.powi(3)).collect();
    let it = 2.0 / 3.0 * integrate(xs, &cubes)?.value;
    let il_origin = 2.0 * second_moment(xs, &wl)?.value;
    let il = lcf.map(|lcf| il_origin - awp * lcf * lcf);

    // Step 6: metacentric radii and heights
    let bmt = ratio(it, volume, VOLUME_EPSILON);
    let bml = il.and_then(|il| ratio(il, volume, VOLUME_EPSILON));
    let kmt = kb.zip(bmt).map(|(kb, bm)| kb + bm);
    let kml = kb.zip(bml).map(|(kb, bm)| kb + bm);
    let gmt = kmt.zip(loadcase.kg_m).map(|(km, kg)| km - kg);
    let gml = kml.zip(loadcase.kg_m).map(|(km, kg)| km - kg);

    // Step 7: form coefficients
    let lpp = grid.lpp_m();
    let beam = 2.0 * wl.iter().fold(0.0f64, |m, y| m.max(*y));
    let draft_above_keel = draft_m - grid.keel_z_m();
    let midship_area = area_at(xs, &sections.areas, grid.midship_x_m());
    let cb = if has_volume {
        ratio(volume, lpp * beam * draft_above_keel, VOLUME_EPSILON)
    } else {
        None
    };
    let cp = if has_volume {
        ratio(volume, midship_area * lpp, VOLUME_EPSILON)
    } else {
        None
    };
    let cm = ratio(midship_area, beam * draft_above_keel, AREA_EPSILON);
    let cwp = ratio(awp, lpp * beam, AREA_EPSILON);

    let displacement = volume * rho;
    let mtc = gml
        .or(bml)
        .and_then(|gml| ratio(displacement * gml, lpp, LENGTH_EPSILON));

    debug!(draft_m, volume_m3 = volume, kb_m = ?kb, bmt_m = ?bmt, "computed hydrostatics");

    Ok(HydroResult {
        draft_m,
        volume_m3: volume,
        displacement_kg: displacement,
        kb_m: kb,
        lcb_m: lcb,
        tcb_m: tcb,
        bmt_m: bmt,
        bml_m: bml,
        gmt_m: gmt,
        gml_m: gml,
        kmt_m: kmt,
        kml_m: kml,
        waterplane_area_m2: awp,
        waterplane_it_m4: it,
        waterplane_il_m4: il,
        lcf_m: lcf,
        tpc_kg_per_cm: awp * rho / 100.0,
        mtc_kgm_per_m: mtc,
        cb,
        cp,
        cm,
        cwp,
        integration_rule: select_rule(xs),
    })
}

/// Hydrostatics at each draft, in the order given.
///
/// Geometry and every draft are validated before any integration runs.
/// Entries are independent and evaluated in parallel; the output is
/// identical to calling [`compute_at`] per draft.
///
/// # Example
/// ```rust
/// use hydro_core::calculations::hydrostatics::compute_table;
/// use hydro_core::hull::HullGeometry;
/// use hydro_core::loadcase::Loadcase;
///
/// let barge = HullGeometry::box_barge(20.0, 10.0, 6.0, 11, 13);
/// let table = compute_table(&barge, &Loadcase::default(), &[1.0, 2.0, 3.0]).unwrap();
/// assert_eq!(table.len(), 3);
/// assert!(table[0].volume_m3 < table[2].volume_m3);
/// ```
pub fn compute_table(hull: &HullGeometry, loadcase: &Loadcase, drafts_m: &[f64]) -> CalcResult<Vec<HydroResult>> {
    let grid = hull.validate()?;
    compute_table_grid(&grid, loadcase, drafts_m)
}

/// [`compute_table`] on an already validated grid.
pub fn compute_table_grid(grid: &HullGrid, loadcase: &Loadcase, drafts_m: &[f64]) -> CalcResult<Vec<HydroResult>> {
    loadcase.validate()?;
    for &d in drafts_m {
        grid.check_draft(d)?;
    }
    debug!(drafts = drafts_m.len(), "computing hydrostatic table");
    drafts_m
        .par_iter()
        .map(|&d| compute_at_grid(grid, loadcase, d))
        .collect()
}

/// Volume and LCB with the waterline inclined between the aft and forward
/// perpendiculars.
///
/// The local draft at each station varies linearly from `draft_aft_m` at
/// the first station to `draft_fwd_m` at the last.
pub fn compute_trimmed(
    hull: &HullGeometry,
    loadcase: &Loadcase,
    draft_aft_m: f64,
    draft_fwd_m: f64,
) -> CalcResult<TrimmedHydro> {
    let grid = hull.validate()?;
    compute_trimmed_grid(&grid, loadcase, draft_aft_m, draft_fwd_m)
}

/// [`compute_trimmed`] on an already validated grid.
pub fn compute_trimmed_grid(
    grid: &HullGrid,
    loadcase: &Loadcase,
    draft_aft_m: f64,
    draft_fwd_m: f64,
) -> CalcResult<TrimmedHydro> {
    loadcase.validate()?;
    grid.check_draft(draft_aft_m)?;
    grid.check_draft(draft_fwd_m)?;

    let xs = grid.xs();
    let x_aft = grid.x_aft_m();
    let lpp = grid.lpp_m();
    let sections = sectional_data(grid, |x| {
        draft_aft_m + (draft_fwd_m - draft_aft_m) * (x - x_aft) / lpp
    })?;
    let volume = integrate(xs, &sections.areas)?.value;
    let lcb = ratio(first_moment(xs, &sections.areas)?.value, volume, VOLUME_EPSILON);

    Ok(TrimmedHydro {
        draft_aft_m,
        draft_fwd_m,
        volume_m3: volume,
        displacement_kg: volume * loadcase.density_kg_m3,
        lcb_m: lcb,
    })
}
