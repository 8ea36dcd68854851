//! # Numerical and Geometric Building Blocks
//!
//! The low-level pieces every calculation in [`crate::calculations`] is
//! assembled from. Keeping them here, separate from the naval-architecture
//! formulas, lets each be verified against closed-form references on its own.
//!
//! ## Modules
//!
//! - [`integration`] - Trapezoidal/Simpson quadrature with explicit rule selection
//! - [`section`] - Transverse section polygons: rotate, clip, area and moments
//!
//! ## Sign Conventions
//!
//! - **x**: Longitudinal, positive forward, aft perpendicular at the first station
//! - **y**: Transverse, positive to starboard
//! - **z**: Vertical, positive up from the baseline
//! - **Heel**: Positive with starboard side down
//! - **Trim**: Positive by the head (forward draft greater than aft)
//!
//! ## References
//!
//! - Biran & López-Pulido, Ship Hydrostatics and Stability, 2nd Edition
//! - IMO Resolution A.749(18), Code on Intact Stability

pub mod integration;
pub mod section;

pub use integration::{
    first_moment,
    integrate,
    integrate_with,
    second_moment,
    select_rule,
    Integral,
    IntegrationRule,
};

pub use section::{Polygon, SectionPoint, SectionProperties};
