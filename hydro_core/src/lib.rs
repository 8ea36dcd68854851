//! # hydro_core - Hydrostatics & Stability Engine
//!
//! `hydro_core` computes the hydrostatic particulars, large-angle stability,
//! IMO intact-stability compliance and equilibrium trim of a ship hull
//! described by a table of offsets. All inputs and outputs are
//! JSON-serializable value types.
//!
//! ## Design Philosophy
//!
//! - **Stateless**: Pure functions from hull + loadcase to results
//! - **JSON-First**: All types implement Serialize/Deserialize
//! - **Rich Errors**: Structured error types, not just strings
//! - **Degenerate ≠ Error**: Undefined quantities come back as `None`
//!
//! ## Quick Start
//!
//! ```rust
//! use hydro_core::calculations::{check_criteria, compute_at, compute_gz_curve, StabilityMethod};
//! use hydro_core::hull::HullGeometry;
//! use hydro_core::loadcase::Loadcase;
//!
//! let barge = HullGeometry::box_barge(20.0, 10.0, 6.0, 11, 13);
//! let lc = Loadcase::new("Departure", 1025.0).with_draft(3.0).with_kg(3.0);
//!
//! let hydro = compute_at(&barge, &lc, 3.0).unwrap();
//! println!("GMt = {:.3} m", hydro.gmt_m.unwrap());
//!
//! let curve = compute_gz_curve(&barge, &lc, 0.0, 60.0, 1.0, StabilityMethod::FullImmersion).unwrap();
//! let assessment = check_criteria(&curve, &lc).unwrap();
//! assert!(assessment.passed);
//! ```
//!
//! ## Modules
//!
//! - [`hull`] - Offsets table, validation and hull builders
//! - [`loadcase`] - Water density and centre of gravity
//! - [`calculations`] - Hydrostatics, stability, criteria, trim and curves
//! - [`equations`] - Numerical integration and section geometry
//! - [`settings`] - Sweep and solver defaults for a study
//! - [`units`] - Angle and mass wrappers, water densities
//! - [`errors`] - Structured error types

pub mod calculations;
pub mod equations;
pub mod errors;
pub mod hull;
pub mod loadcase;
pub mod settings;
pub mod units;

// Re-export commonly used types at crate root for convenience
pub use calculations::{AnalysisItem, AnalysisOutput, StabilityMethod};
pub use errors::{CalcError, CalcResult};
pub use hull::{HullGeometry, HullGrid};
pub use loadcase::Loadcase;
pub use settings::AnalysisSettings;
