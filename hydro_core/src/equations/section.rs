//! # Transverse Section Geometry
//!
//! Closed polygons in the transverse (y, z) plane of one station, and the
//! two transforms large-angle stability needs: rotation about the baseline
//! origin and clipping below a waterline.
//!
//! ## Notation
//!
//! - `y` = Transverse coordinate, positive to starboard
//! - `z` = Vertical coordinate, positive up, zero at the baseline
//! - `φ` = Heel angle, positive with starboard going down
//! - `A` = Section area
//! - `My`, `Mz` = First moments of area about the z and y axes
//!
//! ```text
//!          port   z   starboard
//!      ┌──────────┼──────────┐  deck
//!      │          │          │
//!      │ ~~~~~~~~~│~~~~~~~~~ │  waterline
//!       \         │         /
//!        \________│________/   keel
//!                 0 ────────→ y
//! ```
//!
//! Rotation, clipping and property evaluation are independent so that
//! each can be tested on its own.

use serde::{Deserialize, Serialize};

/// Areas below this are treated as empty when forming centroids (m²)
pub const AREA_EPSILON: f64 = 1e-12;

/// A vertex in the transverse plane (m)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SectionPoint {
    pub y: f64,
    pub z: f64,
}

impl SectionPoint {
    pub fn new(y: f64, z: f64) -> Self {
        SectionPoint { y, z }
    }

    /// Rotate about the origin by heel angle `phi_rad` (starboard down).
    ///
    /// # Formulas
    /// - y' = y·cosφ + z·sinφ
    /// - z' = z·cosφ − y·sinφ
    #[inline]
    pub fn rotated(self, phi_rad: f64) -> Self {
        let (s, c) = phi_rad.sin_cos();
        SectionPoint {
            y: self.y * c + self.z * s,
            z: self.z * c - self.y * s,
        }
    }
}

/// Area and first moments of a plane figure.
///
/// Moments are kept instead of centroids so they can be integrated
/// along the length directly: ∫My dx / ∫A dx is the volume centroid.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SectionProperties {
    /// Area (m²)
    pub area: f64,
    /// First moment about the vertical axis, ∫y dA (m³)
    pub moment_y: f64,
    /// First moment about the baseline, ∫z dA (m³)
    pub moment_z: f64,
}

impl SectionProperties {
    /// Transverse centroid, `None` for an empty section
    pub fn centroid_y(&self) -> Option<f64> {
        (self.area > AREA_EPSILON).then(|| self.moment_y / self.area)
    }

    /// Vertical centroid above the baseline, `None` for an empty section
    pub fn centroid_z(&self) -> Option<f64> {
        (self.area > AREA_EPSILON).then(|| self.moment_z / self.area)
    }
}

/// Closed polygon; the last vertex connects back to the first.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Polygon {
    pub vertices: Vec<SectionPoint>,
}

impl Polygon {
    pub fn new(vertices: Vec<SectionPoint>) -> Self {
        Polygon { vertices }
    }

    /// Build the full section of a port/starboard symmetric hull.
    ///
    /// Runs up the starboard offsets, across the top waterline, down the
    /// mirrored port offsets and back across the keel line, which gives a
    /// counter-clockwise outline. Zero half-breadths produce coincident
    /// vertices, which do not disturb the area sums.
    ///
    /// # Arguments
    /// * `half_breadths` - Half-breadth at each height (m)
    /// * `heights` - Waterline heights, increasing (m)
    ///
    /// # Example
    /// ```rust
    /// use hydro_core::equations::section::Polygon;
    ///
    /// // 4 m wide, 2 m deep box section
    /// let section = Polygon::from_half_breadths(&[2.0, 2.0, 2.0], &[0.0, 1.0, 2.0]);
    /// let props = section.properties();
    /// assert!((props.area - 8.0).abs() < 1e-12);
    /// assert!((props.centroid_z().unwrap() - 1.0).abs() < 1e-12);
    /// ```
    pub fn from_half_breadths(half_breadths: &[f64], heights: &[f64]) -> Self {
        let starboard = half_breadths
            .iter()
            .zip(heights)
            .map(|(&y, &z)| SectionPoint::new(y, z));
        let port = half_breadths
            .iter()
            .zip(heights)
            .rev()
            .map(|(&y, &z)| SectionPoint::new(-y, z));
        Polygon::new(starboard.chain(port).collect())
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.len() < 3
    }

    /// Rotate every vertex about the baseline origin (see [`SectionPoint::rotated`]).
    pub fn rotated(&self, phi_rad: f64) -> Polygon {
        Polygon::new(self.vertices.iter().map(|p| p.rotated(phi_rad)).collect())
    }

    /// Keep only the part at or below `level` (Sutherland–Hodgman against
    /// one half-plane).
    ///
    /// A non-convex outline may come back with zero-width bridges between
    /// its immersed pieces; those contribute nothing to area or moments.
    pub fn clipped_below(&self, level: f64) -> Polygon {
        let n = self.vertices.len();
        let mut out = Vec::with_capacity(n + 2);
        for i in 0..n {
            let current = self.vertices[i];
            let next = self.vertices[(i + 1) % n];
            let current_inside = current.z <= level;
            let next_inside = next.z <= level;

            if current_inside {
                out.push(current);
            }
            if current_inside != next_inside {
                let t = (level - current.z) / (next.z - current.z);
                out.push(SectionPoint::new(current.y + t * (next.y - current.y), level));
            }
        }
        Polygon::new(out)
    }

    /// Lowest and highest vertex heights, `None` for an empty polygon
    pub fn z_extent(&self) -> Option<(f64, f64)> {
        if self.vertices.is_empty() {
            return None;
        }
        Some(self.vertices.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
            (lo.min(p.z), hi.max(p.z))
        }))
    }

    /// Area and first moments (shoelace formulas).
    ///
    /// # Formulas
    /// - cᵢ = yᵢ·zᵢ₊₁ − yᵢ₊₁·zᵢ
    /// - A = Σcᵢ / 2
    /// - My = Σ(yᵢ + yᵢ₊₁)·cᵢ / 6
    /// - Mz = Σ(zᵢ + zᵢ₊₁)·cᵢ / 6
    ///
    /// Clockwise outlines are normalized so the area is non-negative.
    pub fn properties(&self) -> SectionProperties {
        if self.is_empty() {
            return SectionProperties::default();
        }
        let n = self.vertices.len();
        let (mut a, mut my, mut mz) = (0.0, 0.0, 0.0);
        for i in 0..n {
            let p = self.vertices[i];
            let q = self.vertices[(i + 1) % n];
            let c = p.y * q.z - q.y * p.z;
            a += c;
            my += (p.y + q.y) * c;
            mz += (p.z + q.z) * c;
        }
        let sign = if a < 0.0 { -1.0 } else { 1.0 };
        SectionProperties {
            area: sign * a / 2.0,
            moment_y: sign * my / 6.0,
            moment_z: sign * mz / 6.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < EPSILON
    }

    fn box_section(half_beam: f64, depth: f64) -> Polygon {
        Polygon::from_half_breadths(&[half_beam, half_beam, half_beam], &[0.0, depth / 2.0, depth])
    }

    #[test]
    fn test_box_properties() {
        // 10 m beam, 6 m deep: A = 60, centroid on the centreline at 3 m
        let props = box_section(5.0, 6.0).properties();
        assert!(approx_eq(props.area, 60.0), "A = {}", props.area);
        assert!(approx_eq(props.centroid_y().unwrap(), 0.0));
        assert!(approx_eq(props.centroid_z().unwrap(), 3.0));
    }

    #[test]
    fn test_triangle_properties() {
        // V-section: half-breadth grows linearly from 0 at keel to 2 at z = 3
        // A = 6, centroid at 2/3 of the height = 2.0
        let props = Polygon::from_half_breadths(&[0.0, 1.0, 2.0], &[0.0, 1.5, 3.0]).properties();
        assert!(approx_eq(props.area, 6.0), "A = {}", props.area);
        assert!(approx_eq(props.centroid_z().unwrap(), 2.0));
    }

    #[test]
    fn test_clockwise_outline_normalized() {
        let mut section = box_section(1.0, 2.0);
        section.vertices.reverse();
        let props = section.properties();
        assert!(approx_eq(props.area, 4.0));
        assert!(approx_eq(props.centroid_z().unwrap(), 1.0));
    }

    #[test]
    fn test_asymmetric_polygon_centroid() {
        // Right triangle (0,0), (3,0), (0,3): A = 4.5, centroid at (1, 1)
        let triangle = Polygon::new(vec![
            SectionPoint::new(0.0, 0.0),
            SectionPoint::new(3.0, 0.0),
            SectionPoint::new(0.0, 3.0),
        ]);
        let props = triangle.properties();
        assert!(approx_eq(props.area, 4.5), "A = {}", props.area);
        assert!(approx_eq(props.centroid_y().unwrap(), 1.0));
        assert!(approx_eq(props.centroid_z().unwrap(), 1.0));
    }

    #[test]
    fn test_point_rotation() {
        // 90° heel: a point to starboard goes straight down,
        // a point on the centreline swings out to starboard
        let p = SectionPoint::new(1.0, 0.0).rotated(std::f64::consts::FRAC_PI_2);
        assert!(approx_eq(p.y, 0.0) && approx_eq(p.z, -1.0), "{:?}", p);

        let q = SectionPoint::new(0.0, 1.0).rotated(std::f64::consts::FRAC_PI_2);
        assert!(approx_eq(q.y, 1.0) && approx_eq(q.z, 0.0), "{:?}", q);
    }

    #[test]
    fn test_rotation_preserves_area() {
        let section = Polygon::from_half_breadths(&[0.0, 1.5, 2.0, 2.0], &[0.0, 1.0, 2.0, 3.0]);
        let before = section.properties().area;
        for deg in [10.0, 45.0, 90.0, 135.0, 180.0] {
            let after = section.rotated(f64::to_radians(deg)).properties().area;
            assert!(approx_eq(before, after), "{}°: {} vs {}", deg, before, after);
        }
    }

    #[test]
    fn test_clip_upright_box() {
        // 10 m beam box, clipped at 3 m: A = 30, centroid at 1.5 m
        let props = box_section(5.0, 6.0).clipped_below(3.0).properties();
        assert!(approx_eq(props.area, 30.0));
        assert!(approx_eq(props.centroid_z().unwrap(), 1.5));
    }

    #[test]
    fn test_clip_outside_extent() {
        let section = box_section(5.0, 6.0);
        assert_eq!(section.clipped_below(-1.0).properties().area, 0.0);
        assert!(section.clipped_below(-1.0).properties().centroid_z().is_none());
        assert!(approx_eq(section.clipped_below(10.0).properties().area, 60.0));
    }

    #[test]
    fn test_clip_heeled_box_wedge() {
        // Box 10 m wide heeled 45° about the keel centre and clipped at z = 0:
        // immersed part is the triangle below the rotated keel line on the
        // starboard side, legs 5 m along the keel and 5 m up the side
        let section = box_section(5.0, 6.0).rotated(std::f64::consts::FRAC_PI_4);
        let props = section.clipped_below(0.0).properties();
        let starboard_bilge = SectionPoint::new(5.0, 0.0).rotated(std::f64::consts::FRAC_PI_4);
        assert!(starboard_bilge.z < 0.0);
        // Triangle: keel centre (0,0), bilge corner, and side crossing at z = 0
        // Side crossing: 5 m up the starboard side from the bilge -> area = 12.5
        assert!(approx_eq(props.area, 12.5), "A = {}", props.area);
        assert!(props.centroid_y().unwrap() > 0.0);
    }

    #[test]
    fn test_z_extent() {
        let (lo, hi) = box_section(5.0, 6.0).z_extent().unwrap();
        assert!(approx_eq(lo, 0.0) && approx_eq(hi, 6.0));
        assert!(Polygon::default().z_extent().is_none());
    }
}
