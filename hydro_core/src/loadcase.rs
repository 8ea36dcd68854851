//! # Load Conditions
//!
//! A [`Loadcase`] describes how the vessel is loaded: the water it floats
//! in, where its centre of gravity sits, and (for stability work) the
//! upright draft it floats at.
//!
//! Fields that only some calculations need are optional; each calculation
//! reports a `MissingField` error when it needs one that is absent.
//!
//! | Field                | Needed by                                   |
//! |----------------------|---------------------------------------------|
//! | `density_kg_m3`      | everything                                  |
//! | `kg_m`               | GM values, GZ curves                        |
//! | `draft_m`            | GZ curves                                   |
//! | `lcg_m`              | trim solver (defaults to midship)           |
//! | `tcg_m`              | GZ curves (defaults to the centreline)      |
//! | `flooding_angle_deg` | IMO criteria 2 and 3 (optional)             |
//!
//! ## Example
//!
//! ```rust
//! use hydro_core::loadcase::Loadcase;
//!
//! let lc = Loadcase::new("Full load departure", 1025.0)
//!     .with_draft(3.0)
//!     .with_kg(3.2);
//! assert!(lc.validate().is_ok());
//! ```

use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};
use crate::units::SEA_WATER_DENSITY_KG_M3;

/// Loading condition for one computation.
///
/// ## JSON Example
///
/// ```json
/// {
///   "label": "Ballast arrival",
///   "density_kg_m3": 1025.0,
///   "draft_m": 2.4,
///   "kg_m": 3.1,
///   "lcg_m": 9.6,
///   "flooding_angle_deg": 48.0
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Loadcase {
    /// User label (e.g., "Full load departure")
    #[serde(default)]
    pub label: String,

    /// Density of the water the vessel floats in (kg/m³)
    #[serde(default = "default_density")]
    pub density_kg_m3: f64,

    /// Upright mean draft above the baseline (m)
    #[serde(default)]
    pub draft_m: Option<f64>,

    /// Vertical centre of gravity above the baseline (m)
    #[serde(default)]
    pub kg_m: Option<f64>,

    /// Longitudinal centre of gravity (m, same axis as the stations).
    /// `None` means midship.
    #[serde(default)]
    pub lcg_m: Option<f64>,

    /// Transverse centre of gravity, positive to starboard (m)
    #[serde(default)]
    pub tcg_m: f64,

    /// Angle at which unprotected openings immerse (degrees)
    #[serde(default)]
    pub flooding_angle_deg: Option<f64>,
}

fn default_density() -> f64 {
    SEA_WATER_DENSITY_KG_M3
}

impl Default for Loadcase {
    fn default() -> Self {
        Loadcase::new("", SEA_WATER_DENSITY_KG_M3)
    }
}

impl Loadcase {
    /// Create a loadcase with only a water density set
    pub fn new(label: impl Into<String>, density_kg_m3: f64) -> Self {
        Loadcase {
            label: label.into(),
            density_kg_m3,
            draft_m: None,
            kg_m: None,
            lcg_m: None,
            tcg_m: 0.0,
            flooding_angle_deg: None,
        }
    }

    pub fn with_draft(mut self, draft_m: f64) -> Self {
        self.draft_m = Some(draft_m);
        self
    }

    pub fn with_kg(mut self, kg_m: f64) -> Self {
        self.kg_m = Some(kg_m);
        self
    }

    pub fn with_lcg(mut self, lcg_m: f64) -> Self {
        self.lcg_m = Some(lcg_m);
        self
    }

    pub fn with_tcg(mut self, tcg_m: f64) -> Self {
        self.tcg_m = tcg_m;
        self
    }

    pub fn with_flooding_angle(mut self, angle_deg: f64) -> Self {
        self.flooding_angle_deg = Some(angle_deg);
        self
    }

    /// Validate the fields that are present.
    pub fn validate(&self) -> CalcResult<()> {
        if !self.density_kg_m3.is_finite() || self.density_kg_m3 <= 0.0 {
            return Err(CalcError::invalid_input(
                "density_kg_m3",
                self.density_kg_m3.to_string(),
                "Water density must be positive",
            ));
        }
        for (field, value) in [
            ("draft_m", self.draft_m),
            ("kg_m", self.kg_m),
            ("lcg_m", self.lcg_m),
            ("tcg_m", Some(self.tcg_m)),
        ] {
            if let Some(v) = value {
                if !v.is_finite() {
                    return Err(CalcError::invalid_input(field, v.to_string(), "Value must be finite"));
                }
            }
        }
        if let Some(angle) = self.flooding_angle_deg {
            if !angle.is_finite() || angle <= 0.0 || angle > 180.0 {
                return Err(CalcError::invalid_input(
                    "flooding_angle_deg",
                    angle.to_string(),
                    "Flooding angle must be in (0°, 180°]",
                ));
            }
        }
        Ok(())
    }

    /// KG, or a `MissingField` error
    pub fn require_kg(&self) -> CalcResult<f64> {
        self.kg_m.ok_or_else(|| CalcError::missing_field("kg_m"))
    }

    /// Upright draft, or a `MissingField` error
    pub fn require_draft(&self) -> CalcResult<f64> {
        self.draft_m.ok_or_else(|| CalcError::missing_field("draft_m"))
    }

    /// LCG, falling back to the given midship position
    pub fn lcg_or(&self, midship_x_m: f64) -> f64 {
        self.lcg_m.unwrap_or(midship_x_m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_density_validation() {
        assert!(Loadcase::new("ok", 1000.0).validate().is_ok());
        assert!(Loadcase::new("zero", 0.0).validate().is_err());
        assert!(Loadcase::new("negative", -1025.0).validate().is_err());
        assert!(Loadcase::new("nan", f64::NAN).validate().is_err());
    }

    #[test]
    fn test_non_finite_fields_rejected() {
        let lc = Loadcase::new("bad kg", 1025.0).with_kg(f64::INFINITY);
        assert_eq!(lc.validate().unwrap_err().error_code(), "INVALID_INPUT");
    }

    #[test]
    fn test_flooding_angle_range() {
        assert!(Loadcase::default().with_flooding_angle(35.0).validate().is_ok());
        assert!(Loadcase::default().with_flooding_angle(0.0).validate().is_err());
        assert!(Loadcase::default().with_flooding_angle(200.0).validate().is_err());
    }

    #[test]
    fn test_required_fields() {
        let lc = Loadcase::default();
        assert_eq!(lc.require_kg().unwrap_err(), CalcError::missing_field("kg_m"));
        assert_eq!(lc.require_draft().unwrap_err(), CalcError::missing_field("draft_m"));
        assert_eq!(lc.lcg_or(10.0), 10.0);
        assert_eq!(lc.with_lcg(9.5).lcg_or(10.0), 9.5);
    }

    #[test]
    fn test_json_defaults() {
        let lc: Loadcase = serde_json::from_str(r#"{ "kg_m": 3.0 }"#).unwrap();
        assert_eq!(lc.density_kg_m3, 1025.0);
        assert_eq!(lc.kg_m, Some(3.0));
        assert_eq!(lc.tcg_m, 0.0);
        assert!(lc.draft_m.is_none());
    }
}
