//! # Analysis Settings
//!
//! Defaults for the sweeps and solvers a study runs. Callers that pass
//! explicit parameters to the calculation functions never need these; the
//! CLI reads them from the case file so a study can be re-run unchanged.
//!
//! Every field has a default, so a case file may omit the whole block or any
//! part of it.
//!
//! ## JSON Example
//!
//! ```json
//! {
//!   "heel": { "min_deg": 0.0, "max_deg": 80.0, "step_deg": 2.0 },
//!   "stability_method": "FullImmersion",
//!   "trim": { "max_iterations": 30, "tolerance_kg": 5.0, "fd_step_m": 0.001 },
//!   "draft_step_m": 0.25
//! }
//! ```

use serde::{Deserialize, Serialize};

use crate::calculations::stability::{heel_angles, MAX_CURVE_POINTS};
use crate::calculations::StabilityMethod;
use crate::errors::{CalcError, CalcResult};

/// Drafts closer than this to the end of a range are merged into it (m)
const DRAFT_EPSILON_M: f64 = 1e-9;

/// Settings for one study.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    /// Heel sweep for GZ curves
    pub heel: HeelSweep,

    /// Method used when a study does not name one
    pub stability_method: StabilityMethod,

    /// Trim solver limits
    pub trim: TrimSettings,

    /// Draft spacing of hydrostatic tables (m)
    pub draft_step_m: f64,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        AnalysisSettings {
            heel: HeelSweep::default(),
            stability_method: StabilityMethod::FullImmersion,
            trim: TrimSettings::default(),
            draft_step_m: 0.25,
        }
    }
}

impl AnalysisSettings {
    pub fn validate(&self) -> CalcResult<()> {
        self.heel.angles()?;
        self.trim.validate()?;
        if !self.draft_step_m.is_finite() || self.draft_step_m <= 0.0 {
            return Err(CalcError::invalid_input(
                "draft_step_m",
                self.draft_step_m.to_string(),
                "Draft step must be positive",
            ));
        }
        Ok(())
    }

    /// Drafts from `from_m` to `to_m` at `draft_step_m`, always ending at `to_m`.
    ///
    /// # Errors
    /// Non-finite bounds, a non-positive step, `from_m > to_m` or more than
    /// [`MAX_CURVE_POINTS`] drafts.
    pub fn draft_range(&self, from_m: f64, to_m: f64) -> CalcResult<Vec<f64>> {
        let step = self.draft_step_m;
        for (field, value) in [("from_m", from_m), ("to_m", to_m), ("draft_step_m", step)] {
            if !value.is_finite() {
                return Err(CalcError::invalid_input(field, value.to_string(), "Must be finite"));
            }
        }
        if step <= 0.0 {
            return Err(CalcError::invalid_input(
                "draft_step_m",
                step.to_string(),
                "Draft step must be positive",
            ));
        }
        if from_m > to_m {
            return Err(CalcError::invalid_input(
                "from_m",
                from_m.to_string(),
                format!("Must not exceed to_m ({})", to_m),
            ));
        }
        // An overflowing span is infinite and fails the count check too
        if (to_m - from_m) / step + 2.0 > MAX_CURVE_POINTS as f64 {
            return Err(CalcError::invalid_input(
                "draft_step_m",
                step.to_string(),
                format!("Draft range would exceed {} points", MAX_CURVE_POINTS),
            ));
        }

        let mut drafts: Vec<f64> = (0..MAX_CURVE_POINTS)
            .map(|k| from_m + step * k as f64)
            .take_while(|d| *d < to_m - DRAFT_EPSILON_M)
            .collect();
        drafts.push(to_m);
        Ok(drafts)
    }
}

/// Heel angle range (degrees)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeelSweep {
    pub min_deg: f64,
    pub max_deg: f64,
    pub step_deg: f64,
}

impl Default for HeelSweep {
    fn default() -> Self {
        HeelSweep {
            min_deg: 0.0,
            max_deg: 80.0,
            step_deg: 1.0,
        }
    }
}

impl HeelSweep {
    /// Sample angles of the sweep (validated)
    pub fn angles(&self) -> CalcResult<Vec<f64>> {
        heel_angles(self.min_deg, self.max_deg, self.step_deg)
    }
}

/// Trim solver limits
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrimSettings {
    pub max_iterations: usize,
    /// Acceptable displacement error (kg)
    pub tolerance_kg: f64,
    /// Draft perturbation of the finite-difference Jacobian (m)
    pub fd_step_m: f64,
}

impl Default for TrimSettings {
    fn default() -> Self {
        TrimSettings {
            max_iterations: 50,
            tolerance_kg: 1.0,
            fd_step_m: 1e-3,
        }
    }
}

impl TrimSettings {
    pub fn validate(&self) -> CalcResult<()> {
        if self.max_iterations == 0 {
            return Err(CalcError::invalid_input(
                "max_iterations",
                "0",
                "At least one iteration is required",
            ));
        }
        if !self.tolerance_kg.is_finite() || self.tolerance_kg <= 0.0 {
            return Err(CalcError::invalid_input(
                "tolerance_kg",
                self.tolerance_kg.to_string(),
                "Tolerance must be positive",
            ));
        }
        if !self.fd_step_m.is_finite() || self.fd_step_m <= 0.0 {
            return Err(CalcError::invalid_input(
                "fd_step_m",
                self.fd_step_m.to_string(),
                "Finite-difference step must be positive",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(AnalysisSettings::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let settings: AnalysisSettings =
            serde_json::from_str(r#"{ "heel": { "max_deg": 60.0 }, "stability_method": "WallSided" }"#).unwrap();
        assert_eq!(settings.heel.max_deg, 60.0);
        assert_eq!(settings.heel.step_deg, 1.0);
        assert_eq!(settings.stability_method, StabilityMethod::WallSided);
        assert_eq!(settings.trim, TrimSettings::default());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut settings = AnalysisSettings::default();
        settings.heel.step_deg = 0.0;
        assert!(settings.validate().is_err());

        let mut settings = AnalysisSettings::default();
        settings.trim.max_iterations = 0;
        assert!(settings.validate().is_err());

        let mut settings = AnalysisSettings::default();
        settings.draft_step_m = -0.1;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_draft_range() {
        let settings = AnalysisSettings {
            draft_step_m: 0.5,
            ..Default::default()
        };
        assert_eq!(settings.draft_range(0.5, 2.0).unwrap(), vec![0.5, 1.0, 1.5, 2.0]);
        assert_eq!(settings.draft_range(0.5, 1.75).unwrap(), vec![0.5, 1.0, 1.5, 1.75]);
        assert_eq!(settings.draft_range(1.0, 1.0).unwrap(), vec![1.0]);
    }

    #[test]
    fn test_draft_range_rejects_bad_bounds() {
        let settings = AnalysisSettings::default();
        // Reversed range
        assert!(matches!(
            settings.draft_range(4.0, 1.0),
            Err(CalcError::InvalidInput { ref field, .. }) if field == "from_m"
        ));
        assert!(settings.draft_range(f64::NAN, 3.0).is_err());
        assert!(settings.draft_range(0.0, f64::INFINITY).is_err());
        // 4,000,013 drafts at 0.25 m
        assert!(settings.draft_range(-1.0e6, 3.0).is_err());
        assert!(settings.draft_range(-1.0e12, 3.0).is_err());
        assert!(settings.draft_range(-f64::MAX, f64::MAX).is_err());
    }

    #[test]
    fn test_draft_range_rejects_bad_step() {
        // validate() skipped: the range still refuses to loop
        let mut settings = AnalysisSettings::default();
        settings.draft_step_m = 0.0;
        assert!(settings.draft_range(0.0, 3.0).is_err());
        settings.draft_step_m = f64::NAN;
        assert!(settings.draft_range(0.0, 3.0).is_err());
    }

    #[test]
    fn test_draft_range_at_point_limit() {
        let settings = AnalysisSettings {
            draft_step_m: 1.0,
            ..Default::default()
        };
        let drafts = settings.draft_range(0.0, (MAX_CURVE_POINTS - 2) as f64).unwrap();
        assert_eq!(drafts.len(), MAX_CURVE_POINTS - 1);
        assert!(settings.draft_range(0.0, MAX_CURVE_POINTS as f64).is_err());
    }
}
