//! # Numerical Integration
//!
//! Definite integrals, first moments and second moments over discretely
//! sampled data, as used for sectional areas, volumes, centroids and
//! waterplane inertias.
//!
//! ## Rule Selection
//!
//! The rule is picked by [`select_rule`] from the abscissae alone:
//!
//! | Spacing   | Point count | Rule                                   |
//! |-----------|-------------|----------------------------------------|
//! | uniform   | odd, ≥ 3    | Simpson's 1/3 rule                     |
//! | uniform   | even, ≥ 4   | Simpson on all but the last interval, trapezoid on the last |
//! | otherwise | ≥ 2         | Trapezoidal rule                       |
//!
//! Every result is tagged with the rule that produced it, and
//! [`integrate_with`] lets callers force a rule.
//!
//! ## Example
//!
//! ```rust
//! use hydro_core::equations::integration::{integrate, IntegrationRule};
//!
//! // y = x² on [0, 2], five uniform samples
//! let x = [0.0, 0.5, 1.0, 1.5, 2.0];
//! let y: Vec<f64> = x.iter().map(|v| v * v).collect();
//!
//! let result = integrate(&x, &y).unwrap();
//! assert_eq!(result.rule, IntegrationRule::Simpson);
//! assert!((result.value - 8.0 / 3.0).abs() < 1e-12);
//! ```

use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};

/// Relative tolerance on interval widths for spacing to count as uniform
pub const UNIFORM_SPACING_TOLERANCE: f64 = 1e-9;

/// Quadrature rule used for one integral.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IntegrationRule {
    /// Trapezoidal rule, any spacing
    Trapezoidal,
    /// Simpson's 1/3 rule, uniform spacing, odd point count
    Simpson,
    /// Simpson's rule on all but the last interval, trapezoid on the last
    CompositeSimpson,
}

impl IntegrationRule {
    /// Minimum number of samples the rule accepts
    pub fn min_points(self) -> usize {
        match self {
            IntegrationRule::Trapezoidal => 2,
            IntegrationRule::Simpson | IntegrationRule::CompositeSimpson => 3,
        }
    }

    /// Display name for reports
    pub fn display_name(&self) -> &'static str {
        match self {
            IntegrationRule::Trapezoidal => "Trapezoidal",
            IntegrationRule::Simpson => "Simpson 1/3",
            IntegrationRule::CompositeSimpson => "Simpson 1/3 + trapezoidal end",
        }
    }
}

/// Value of a definite integral tagged with the rule that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Integral {
    pub rule: IntegrationRule,
    pub value: f64,
}

/// Check whether abscissae are uniformly spaced.
pub fn is_uniform(x: &[f64]) -> bool {
    if x.len() < 2 {
        return false;
    }
    let h = x[1] - x[0];
    x.windows(2)
        .all(|w| ((w[1] - w[0]) - h).abs() <= UNIFORM_SPACING_TOLERANCE * h.abs())
}

/// Pick the integration rule for the given abscissae.
///
/// # Example
/// ```rust
/// use hydro_core::equations::integration::{select_rule, IntegrationRule};
///
/// assert_eq!(select_rule(&[0.0, 1.0, 2.0]), IntegrationRule::Simpson);
/// assert_eq!(select_rule(&[0.0, 1.0, 2.0, 3.0]), IntegrationRule::CompositeSimpson);
/// assert_eq!(select_rule(&[0.0, 1.0, 3.0]), IntegrationRule::Trapezoidal);
/// assert_eq!(select_rule(&[0.0, 1.0]), IntegrationRule::Trapezoidal);
/// ```
pub fn select_rule(x: &[f64]) -> IntegrationRule {
    if x.len() < 3 || !is_uniform(x) {
        IntegrationRule::Trapezoidal
    } else if x.len() % 2 == 1 {
        IntegrationRule::Simpson
    } else {
        IntegrationRule::CompositeSimpson
    }
}

/// Integrate `y` over `x` with the automatically selected rule.
///
/// # Errors
/// Mismatched lengths, fewer than 2 points, non-finite samples or
/// non-monotonic abscissae.
pub fn integrate(x: &[f64], y: &[f64]) -> CalcResult<Integral> {
    validate_samples(x, y)?;
    let rule = select_rule(x);
    Ok(Integral {
        rule,
        value: apply_rule(rule, x, y),
    })
}

/// Integrate `y` over `x` with a caller-chosen rule.
///
/// Forcing a Simpson variant on irregular spacing, or plain Simpson on an
/// even point count, is rejected rather than silently downgraded.
pub fn integrate_with(rule: IntegrationRule, x: &[f64], y: &[f64]) -> CalcResult<Integral> {
    validate_samples(x, y)?;
    if x.len() < rule.min_points() {
        return Err(CalcError::InsufficientPoints {
            required: rule.min_points(),
            actual: x.len(),
        });
    }
    match rule {
        IntegrationRule::Trapezoidal => {}
        IntegrationRule::Simpson | IntegrationRule::CompositeSimpson => {
            if !is_uniform(x) {
                return Err(CalcError::invalid_input(
                    "x",
                    format!("{} samples", x.len()),
                    format!("{} requires uniform spacing", rule.display_name()),
                ));
            }
            if rule == IntegrationRule::Simpson && x.len() % 2 == 0 {
                return Err(CalcError::invalid_input(
                    "x",
                    format!("{} samples", x.len()),
                    "Simpson's 1/3 rule requires an odd number of points",
                ));
            }
        }
    }
    Ok(Integral {
        rule,
        value: apply_rule(rule, x, y),
    })
}

/// First moment ∫x·y dx, the numerator of a centroid.
pub fn first_moment(x: &[f64], y: &[f64]) -> CalcResult<Integral> {
    validate_samples(x, y)?;
    let xy: Vec<f64> = x.iter().zip(y).map(|(xi, yi)| xi * yi).collect();
    integrate(x, &xy)
}

/// Second moment ∫x²·y dx.
pub fn second_moment(x: &[f64], y: &[f64]) -> CalcResult<Integral> {
    validate_samples(x, y)?;
    let x2y: Vec<f64> = x.iter().zip(y).map(|(xi, yi)| xi * xi * yi).collect();
    integrate(x, &x2y)
}

fn validate_samples(x: &[f64], y: &[f64]) -> CalcResult<()> {
    if x.len() != y.len() {
        return Err(CalcError::invalid_input(
            "y",
            format!("{} samples", y.len()),
            format!("Expected {} samples to match x", x.len()),
        ));
    }
    if x.len() < 2 {
        return Err(CalcError::InsufficientPoints {
            required: 2,
            actual: x.len(),
        });
    }
    if let Some(bad) = x.iter().chain(y).find(|v| !v.is_finite()) {
        return Err(CalcError::invalid_input(
            "samples",
            bad.to_string(),
            "Samples must be finite",
        ));
    }
    let increasing = x[1] > x[0];
    let monotonic = x
        .windows(2)
        .all(|w| if increasing { w[1] > w[0] } else { w[1] < w[0] });
    if !monotonic {
        return Err(CalcError::invalid_input(
            "x",
            format!("{:?}", x),
            "Abscissae must be strictly monotonic",
        ));
    }
    Ok(())
}

fn apply_rule(rule: IntegrationRule, x: &[f64], y: &[f64]) -> f64 {
    match rule {
        IntegrationRule::Trapezoidal => trapezoidal(x, y),
        IntegrationRule::Simpson => simpson(x, y),
        IntegrationRule::CompositeSimpson => {
            if x.len() % 2 == 1 {
                simpson(x, y)
            } else {
                let n = x.len();
                simpson(&x[..n - 1], &y[..n - 1]) + trapezoidal(&x[n - 2..], &y[n - 2..])
            }
        }
    }
}

fn trapezoidal(x: &[f64], y: &[f64]) -> f64 {
    x.windows(2)
        .zip(y.windows(2))
        .map(|(xw, yw)| (xw[1] - xw[0]) * (yw[0] + yw[1]) / 2.0)
        .sum()
}

/// Simpson's 1/3 rule; uniform spacing and odd count already checked.
fn simpson(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len();
    let h = (x[n - 1] - x[0]) / (n - 1) as f64;
    let interior: f64 = y[1..n - 1]
        .iter()
        .enumerate()
        .map(|(i, v)| if i % 2 == 0 { 4.0 * v } else { 2.0 * v })
        .sum();
    h / 3.0 * (y[0] + y[n - 1] + interior)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn uniform_grid(start: f64, h: f64, n: usize) -> Vec<f64> {
        (0..n).map(|i| start + h * i as f64).collect()
    }

    #[test]
    fn test_rule_selection() {
        assert_eq!(select_rule(&uniform_grid(0.0, 0.5, 7)), IntegrationRule::Simpson);
        assert_eq!(select_rule(&uniform_grid(0.0, 0.5, 8)), IntegrationRule::CompositeSimpson);
        assert_eq!(select_rule(&[0.0, 0.4, 1.0, 1.5, 2.0]), IntegrationRule::Trapezoidal);
        assert_eq!(select_rule(&[0.0, 2.0]), IntegrationRule::Trapezoidal);
    }

    #[test]
    fn test_uniform_detection_tolerates_rounding() {
        // 0.1 * i is not exactly representable
        let x: Vec<f64> = (0..11).map(|i| 0.1 * i as f64).collect();
        assert!(is_uniform(&x));
    }

    #[test]
    fn test_trapezoid_triangle_exact() {
        // y = kx over [0, L] -> kL²/2
        let (k, l) = (3.0, 7.0);
        let x = [0.0, l];
        let y = [0.0, k * l];
        let result = integrate(&x, &y).unwrap();
        assert_eq!(result.rule, IntegrationRule::Trapezoidal);
        assert_eq!(result.value, k * l * l / 2.0);
    }

    #[test]
    fn test_trapezoid_irregular_linear_exact() {
        let x = [0.0, 0.3, 1.1, 2.0, 4.5];
        let y: Vec<f64> = x.iter().map(|v| 2.0 * v + 1.0).collect();
        let result = integrate(&x, &y).unwrap();
        assert_eq!(result.rule, IntegrationRule::Trapezoidal);
        // ∫(2x + 1) dx on [0, 4.5] = 20.25 + 4.5
        assert!((result.value - 24.75).abs() < 1e-12);
    }

    #[test]
    fn test_composite_even_count() {
        // Constant data is exact under every rule
        let x = uniform_grid(0.0, 1.0, 6);
        let y = [2.0; 6];
        let result = integrate(&x, &y).unwrap();
        assert_eq!(result.rule, IntegrationRule::CompositeSimpson);
        assert!((result.value - 10.0).abs() < 1e-12);

        // x² on [0, 5]: Simpson exact on [0, 4], trapezoid on [4, 5] gives 20.5 vs 61/3
        let y: Vec<f64> = x.iter().map(|v| v * v).collect();
        let result = integrate(&x, &y).unwrap();
        assert!((result.value - (64.0 / 3.0 + 20.5)).abs() < 1e-12);
    }

    #[test]
    fn test_decreasing_abscissae_give_signed_integral() {
        let x = [2.0, 1.0, 0.0];
        let y = [1.0, 1.0, 1.0];
        assert!((integrate(&x, &y).unwrap().value + 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_moments() {
        // Uniform strip of height 1 on [0, 4]: ∫x dx = 8, ∫x² dx = 64/3
        let x = uniform_grid(0.0, 1.0, 5);
        let y = [1.0; 5];
        assert!((first_moment(&x, &y).unwrap().value - 8.0).abs() < 1e-12);
        assert!((second_moment(&x, &y).unwrap().value - 64.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_too_few_points_is_error() {
        let err = integrate(&[1.0], &[1.0]).unwrap_err();
        assert_eq!(err, CalcError::InsufficientPoints { required: 2, actual: 1 });
        assert!(integrate(&[], &[]).is_err());
    }

    #[test]
    fn test_invalid_samples_rejected() {
        assert!(integrate(&[0.0, 1.0], &[1.0]).is_err());
        assert!(integrate(&[0.0, 1.0, 1.0], &[1.0, 1.0, 1.0]).is_err());
        assert!(integrate(&[0.0, 2.0, 1.0], &[1.0, 1.0, 1.0]).is_err());
        assert!(integrate(&[0.0, f64::NAN], &[1.0, 1.0]).is_err());
    }

    #[test]
    fn test_forced_rule() {
        let x = uniform_grid(0.0, 1.0, 4);
        let y = [1.0; 4];
        assert!(integrate_with(IntegrationRule::Simpson, &x, &y).is_err());
        let trap = integrate_with(IntegrationRule::Trapezoidal, &x, &y).unwrap();
        assert_eq!(trap.rule, IntegrationRule::Trapezoidal);
        assert!((trap.value - 3.0).abs() < 1e-12);

        let irregular = [0.0, 1.0, 3.0];
        assert!(integrate_with(IntegrationRule::CompositeSimpson, &irregular, &[1.0; 3]).is_err());
        assert!(integrate_with(IntegrationRule::Simpson, &[0.0, 1.0], &[1.0; 2]).is_err());
    }

    proptest! {
        #[test]
        fn prop_simpson_exact_for_cubics(
            a in -5.0f64..5.0,
            h in 0.01f64..2.0,
            half in 1usize..20,
            c0 in -10.0f64..10.0,
            c1 in -10.0f64..10.0,
            c2 in -10.0f64..10.0,
            c3 in -10.0f64..10.0,
        ) {
            let n = 2 * half + 1;
            let x = uniform_grid(a, h, n);
            let y: Vec<f64> = x.iter().map(|v| c0 + c1 * v + c2 * v * v + c3 * v * v * v).collect();
            let antiderivative = |v: f64| c0 * v + c1 * v * v / 2.0 + c2 * v.powi(3) / 3.0 + c3 * v.powi(4) / 4.0;
            let b = x[n - 1];
            let exact = antiderivative(b) - antiderivative(a);

            let result = integrate(&x, &y).unwrap();
            prop_assert_eq!(result.rule, IntegrationRule::Simpson);

            let scale = y.iter().fold(1.0f64, |m, v| m.max(v.abs())) * (b - a);
            prop_assert!((result.value - exact).abs() <= 1e-10 * scale + 1e-12,
                "Simpson {} vs exact {}", result.value, exact);
        }

        #[test]
        fn prop_trapezoid_exact_for_lines(
            k in -10.0f64..10.0,
            length in 0.1f64..100.0,
            n in 2usize..30,
        ) {
            // Irregular spacing forces the trapezoidal rule
            let x: Vec<f64> = (0..n).map(|i| length * (i as f64 / (n - 1) as f64).powf(1.5)).collect();
            let y: Vec<f64> = x.iter().map(|v| k * v).collect();
            let result = integrate(&x, &y).unwrap();
            let exact = k * length * length / 2.0;
            prop_assert!((result.value - exact).abs() <= 1e-10 * (k.abs() * length * length + 1.0));
        }
    }
}
