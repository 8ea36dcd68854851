//! # Hull Geometry
//!
//! The discretized hull surface: stations (longitudinal slices), waterlines
//! (horizontal slices) and the half-breadth offsets sampled at every
//! station/waterline pair.
//!
//! [`HullGeometry`] mirrors how the persistence layer stores a hull (three
//! flat lists keyed by ordinal indices). Calculations never read it
//! directly: [`HullGeometry::validate`] borrows it and produces a
//! [`HullGrid`], a dense, ordered grid that every calculator works from.
//!
//! ## Conventions
//!
//! - Stations run aft to forward; the first is the aft perpendicular and
//!   the last the forward perpendicular, so `Lpp = x_last − x_first`.
//! - The lowest waterline is the keel line.
//! - Only the starboard half is stored; the hull is port/starboard symmetric.
//!
//! ## Example
//!
//! ```rust
//! use hydro_core::hull::HullGeometry;
//!
//! let barge = HullGeometry::box_barge(20.0, 10.0, 6.0, 11, 13);
//! let grid = barge.validate().unwrap();
//! assert_eq!(grid.lpp_m(), 20.0);
//! assert_eq!(grid.half_breadth_at_height(5, 2.25), 5.0);
//! ```

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::equations::section::Polygon;
use crate::errors::{CalcError, CalcResult};

/// Longitudinal slice of the hull
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Station {
    /// Ordinal index (contiguous across the hull)
    pub index: usize,
    /// Longitudinal position (m)
    pub x_m: f64,
}

/// Horizontal slice of the hull
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Waterline {
    /// Ordinal index (contiguous across the hull)
    pub index: usize,
    /// Height above the baseline (m)
    pub z_m: f64,
}

/// Half-breadth sample at one station/waterline pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Offset {
    /// Station ordinal index
    pub station: usize,
    /// Waterline ordinal index
    pub waterline: usize,
    /// Half-breadth from the centreline (m)
    pub half_breadth_m: f64,
}

/// Hull surface as supplied by the persistence layer.
///
/// ## JSON Example
///
/// ```json
/// {
///   "label": "Barge 20x10",
///   "stations": [ { "index": 0, "x_m": 0.0 }, { "index": 1, "x_m": 20.0 } ],
///   "waterlines": [ { "index": 0, "z_m": 0.0 }, { "index": 1, "z_m": 6.0 } ],
///   "offsets": [
///     { "station": 0, "waterline": 0, "half_breadth_m": 5.0 },
///     { "station": 0, "waterline": 1, "half_breadth_m": 5.0 },
///     { "station": 1, "waterline": 0, "half_breadth_m": 5.0 },
///     { "station": 1, "waterline": 1, "half_breadth_m": 5.0 }
///   ]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HullGeometry {
    /// User label for this hull (e.g., "Hull 4410 rev B")
    #[serde(default)]
    pub label: String,
    pub stations: Vec<Station>,
    pub waterlines: Vec<Waterline>,
    pub offsets: Vec<Offset>,
}

impl HullGeometry {
    /// Build a hull from plain arrays: `half_breadths[station][waterline]`.
    ///
    /// Indices are assigned in array order. A ragged row leaves gaps that
    /// [`HullGeometry::validate`] will reject.
    pub fn from_grid(label: impl Into<String>, xs: &[f64], zs: &[f64], half_breadths: &[Vec<f64>]) -> Self {
        let stations = xs
            .iter()
            .enumerate()
            .map(|(index, &x_m)| Station { index, x_m })
            .collect();
        let waterlines = zs
            .iter()
            .enumerate()
            .map(|(index, &z_m)| Waterline { index, z_m })
            .collect();
        let offsets = half_breadths
            .iter()
            .enumerate()
            .flat_map(|(station, row)| {
                row.iter().enumerate().map(move |(waterline, &half_breadth_m)| Offset {
                    station,
                    waterline,
                    half_breadth_m,
                })
            })
            .collect();
        HullGeometry {
            label: label.into(),
            stations,
            waterlines,
            offsets,
        }
    }

    /// Rectangular barge of length `L`, beam `B` and depth `D`, sampled on
    /// uniform station and waterline spacings.
    pub fn box_barge(length_m: f64, beam_m: f64, depth_m: f64, n_stations: usize, n_waterlines: usize) -> Self {
        let xs = uniform_spacing(0.0, length_m, n_stations);
        let zs = uniform_spacing(0.0, depth_m, n_waterlines);
        let rows = vec![vec![beam_m / 2.0; zs.len()]; xs.len()];
        HullGeometry::from_grid(format!("Box barge {}x{}x{}", length_m, beam_m, depth_m), &xs, &zs, &rows)
    }

    /// Wigley parabolic hull below the design draft `T`, with vertical
    /// topsides continuing up to depth `D`.
    ///
    /// # Formula
    /// y(x, z) = B/2 · (1 − ξ²) · (1 − ζ²), ξ = 2x/L − 1, ζ = (T − z)/T for z ≤ T
    ///
    /// Displaced volume at the design draft is 4/9·L·B·T and KB = 5T/8.
    pub fn wigley(
        length_m: f64,
        beam_m: f64,
        draft_m: f64,
        depth_m: f64,
        n_stations: usize,
        n_waterlines: usize,
    ) -> Self {
        let xs = uniform_spacing(0.0, length_m, n_stations);
        let zs = uniform_spacing(0.0, depth_m, n_waterlines);
        let rows: Vec<Vec<f64>> = xs
            .iter()
            .map(|&x| {
                let xi = 2.0 * x / length_m - 1.0;
                let waterplane = beam_m / 2.0 * (1.0 - xi * xi);
                zs.iter()
                    .map(|&z| {
                        if z >= draft_m {
                            waterplane
                        } else {
                            let zeta = (draft_m - z) / draft_m;
                            waterplane * (1.0 - zeta * zeta)
                        }
                    })
                    .collect()
            })
            .collect();
        HullGeometry::from_grid(format!("Wigley {}x{}x{}", length_m, beam_m, draft_m), &xs, &zs, &rows)
    }

    /// Validate the geometry and build the dense grid used by calculations.
    ///
    /// # Errors
    /// `InvalidGeometry` for fewer than 2 stations or waterlines, duplicate
    /// or missing ordinal indices, non-monotonic or non-finite coordinates,
    /// negative waterline heights, offsets with unknown indices, duplicate
    /// offsets, gaps in the grid, or negative half-breadths.
    pub fn validate(&self) -> CalcResult<HullGrid> {
        let (station_base, mut xs) = ordered_axis(
            "station",
            self.stations.iter().map(|s| (s.index, s.x_m)).collect(),
        )?;
        let (waterline_base, mut zs) = ordered_axis(
            "waterline",
            self.waterlines.iter().map(|w| (w.index, w.z_m)).collect(),
        )?;

        if let Some(z) = zs.iter().find(|z| **z < 0.0) {
            return Err(CalcError::invalid_geometry(format!(
                "waterline height {} m is below the baseline",
                z
            )));
        }

        let n_st = xs.len();
        let n_wl = zs.len();
        let mut cells: Vec<Option<f64>> = vec![None; n_st * n_wl];
        for offset in &self.offsets {
            let i = offset
                .station
                .checked_sub(station_base)
                .filter(|i| *i < n_st)
                .ok_or_else(|| {
                    CalcError::invalid_geometry(format!("offset refers to unknown station {}", offset.station))
                })?;
            let j = offset
                .waterline
                .checked_sub(waterline_base)
                .filter(|j| *j < n_wl)
                .ok_or_else(|| {
                    CalcError::invalid_geometry(format!(
                        "offset refers to unknown waterline {}",
                        offset.waterline
                    ))
                })?;
            if !offset.half_breadth_m.is_finite() || offset.half_breadth_m < 0.0 {
                return Err(CalcError::invalid_geometry(format!(
                    "half-breadth {} at station {}, waterline {} must be finite and non-negative",
                    offset.half_breadth_m, offset.station, offset.waterline
                )));
            }
            let cell = &mut cells[i * n_wl + j];
            if cell.is_some() {
                return Err(CalcError::invalid_geometry(format!(
                    "duplicate offset at station {}, waterline {}",
                    offset.station, offset.waterline
                )));
            }
            *cell = Some(offset.half_breadth_m);
        }

        let missing = cells.iter().filter(|c| c.is_none()).count();
        if let Some(first) = cells.iter().position(|c| c.is_none()) {
            return Err(CalcError::invalid_geometry(format!(
                "{} offset(s) missing, first at station {}, waterline {}",
                missing,
                station_base + first / n_wl,
                waterline_base + first % n_wl
            )));
        }
        let mut half_breadths: Vec<f64> = cells.into_iter().flatten().collect();

        // Normalize both axes to increasing order
        if xs[0] > xs[n_st - 1] {
            xs.reverse();
            half_breadths = (0..n_st)
                .rev()
                .flat_map(|i| half_breadths[i * n_wl..(i + 1) * n_wl].to_vec())
                .collect();
        }
        if zs[0] > zs[n_wl - 1] {
            zs.reverse();
            for row in half_breadths.chunks_mut(n_wl) {
                row.reverse();
            }
        }

        debug!(label = %self.label, stations = n_st, waterlines = n_wl, "validated hull geometry");

        Ok(HullGrid {
            label: self.label.clone(),
            xs,
            zs,
            half_breadths,
        })
    }
}

/// Sort one axis by ordinal index and check indices and coordinates.
///
/// Returns the first index and the coordinates in index order.
fn ordered_axis(kind: &str, mut entries: Vec<(usize, f64)>) -> CalcResult<(usize, Vec<f64>)> {
    if entries.len() < 2 {
        return Err(CalcError::invalid_geometry(format!(
            "at least 2 {}s required, got {}",
            kind,
            entries.len()
        )));
    }
    entries.sort_by_key(|(index, _)| *index);
    let base = entries[0].0;
    for (offset, (index, coord)) in entries.iter().enumerate() {
        let expected = base.checked_add(offset).ok_or_else(|| {
            CalcError::invalid_geometry(format!("{} index {} is out of range", kind, index))
        })?;
        if *index != expected {
            return Err(CalcError::invalid_geometry(format!(
                "{} indices must be contiguous without duplicates; expected {}, found {}",
                kind, expected, index
            )));
        }
        if !coord.is_finite() {
            return Err(CalcError::invalid_geometry(format!(
                "{} {} has a non-finite coordinate",
                kind, index
            )));
        }
    }
    let coords: Vec<f64> = entries.into_iter().map(|(_, c)| c).collect();
    let increasing = coords[1] > coords[0];
    let monotonic = coords
        .windows(2)
        .all(|w| if increasing { w[1] > w[0] } else { w[1] < w[0] });
    if !monotonic {
        return Err(CalcError::invalid_geometry(format!(
            "{} coordinates must be strictly monotonic in index order",
            kind
        )));
    }
    Ok((base, coords))
}

fn uniform_spacing(start: f64, end: f64, n: usize) -> Vec<f64> {
    if n < 2 {
        return vec![start; n];
    }
    (0..n)
        .map(|i| start + (end - start) * i as f64 / (n - 1) as f64)
        .collect()
}

/// Validated hull: increasing stations and waterlines, dense offsets.
#[derive(Debug, Clone, PartialEq)]
pub struct HullGrid {
    label: String,
    xs: Vec<f64>,
    zs: Vec<f64>,
    /// Row-major `[station][waterline]`
    half_breadths: Vec<f64>,
}

impl HullGrid {
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Station positions, increasing (m)
    pub fn xs(&self) -> &[f64] {
        &self.xs
    }

    /// Waterline heights, increasing (m)
    pub fn zs(&self) -> &[f64] {
        &self.zs
    }

    pub fn n_stations(&self) -> usize {
        self.xs.len()
    }

    pub fn n_waterlines(&self) -> usize {
        self.zs.len()
    }

    /// Half-breadths of one station, keel upward (m)
    pub fn station_offsets(&self, station: usize) -> &[f64] {
        let n = self.zs.len();
        &self.half_breadths[station * n..(station + 1) * n]
    }

    /// Length between perpendiculars (m)
    pub fn lpp_m(&self) -> f64 {
        self.x_fwd_m() - self.x_aft_m()
    }

    pub fn x_aft_m(&self) -> f64 {
        self.xs[0]
    }

    pub fn x_fwd_m(&self) -> f64 {
        self.xs[self.xs.len() - 1]
    }

    pub fn midship_x_m(&self) -> f64 {
        (self.x_aft_m() + self.x_fwd_m()) / 2.0
    }

    /// Keel line height (m)
    pub fn keel_z_m(&self) -> f64 {
        self.zs[0]
    }

    /// Highest sampled waterline (m)
    pub fn top_z_m(&self) -> f64 {
        self.zs[self.zs.len() - 1]
    }

    /// Reject drafts outside the sampled waterline range.
    pub fn check_draft(&self, draft_m: f64) -> CalcResult<()> {
        if !draft_m.is_finite() || draft_m < self.keel_z_m() || draft_m > self.top_z_m() {
            return Err(CalcError::draft_out_of_range(draft_m, self.keel_z_m(), self.top_z_m()));
        }
        Ok(())
    }

    /// Half-breadth of a station at height `z`, linear between waterlines.
    ///
    /// Heights outside the sampled range take the nearest end value.
    pub fn half_breadth_at_height(&self, station: usize, z_m: f64) -> f64 {
        let row = self.station_offsets(station);
        let zs = &self.zs;
        if z_m <= zs[0] {
            return row[0];
        }
        let n = zs.len();
        if z_m >= zs[n - 1] {
            return row[n - 1];
        }
        let upper = zs.partition_point(|z| *z < z_m);
        let lower = upper - 1;
        let t = (z_m - zs[lower]) / (zs[upper] - zs[lower]);
        row[lower] + t * (row[upper] - row[lower])
    }

    /// Half-breadth at height `z` for every station (waterplane offsets)
    pub fn waterline_offsets(&self, z_m: f64) -> Vec<f64> {
        (0..self.n_stations())
            .map(|i| self.half_breadth_at_height(i, z_m))
            .collect()
    }

    /// Heights and half-breadths of one station from the keel up to `draft`,
    /// ending with a sample interpolated exactly at the draft.
    pub fn immersed_profile(&self, station: usize, draft_m: f64) -> (Vec<f64>, Vec<f64>) {
        let row = self.station_offsets(station);
        let mut zs = Vec::with_capacity(self.zs.len() + 1);
        let mut ys = Vec::with_capacity(self.zs.len() + 1);
        for (&z, &y) in self.zs.iter().zip(row) {
            if z >= draft_m {
                break;
            }
            zs.push(z);
            ys.push(y);
        }
        zs.push(draft_m);
        ys.push(self.half_breadth_at_height(station, draft_m));
        (zs, ys)
    }

    /// Closed transverse outline of one station (both sides, keel to top waterline)
    pub fn section_polygon(&self, station: usize) -> Polygon {
        Polygon::from_half_breadths(self.station_offsets(station), &self.zs)
    }
}
