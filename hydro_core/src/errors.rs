//! # Error Types
//!
//! Structured error types for hydro_core. Only validation problems are
//! errors: numeric degeneracy is reported as `None` fields, solver
//! non-convergence as a flag, and instability as an ordinary result.
//!
//! ## Example
//!
//! ```rust
//! use hydro_core::errors::{CalcError, CalcResult};
//!
//! fn validate_density(density_kg_m3: f64) -> CalcResult<()> {
//!     if density_kg_m3 <= 0.0 {
//!         return Err(CalcError::invalid_input(
//!             "density_kg_m3",
//!             density_kg_m3.to_string(),
//!             "Water density must be positive",
//!         ));
//!     }
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for hydro_core operations
pub type CalcResult<T> = Result<T, CalcError>;

/// Structured error type for calculation operations.
///
/// Each variant carries enough context for a caller to report which input
/// was rejected and why, without parsing the message.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "details")]
pub enum CalcError {
    /// An input value is invalid (out of range, not finite, etc.)
    #[error("Invalid input for '{field}': {value} - {reason}")]
    InvalidInput {
        field: String,
        value: String,
        reason: String,
    },

    /// A value required by this particular computation is missing
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    /// The station/waterline/offset grid is malformed
    #[error("Invalid hull geometry: {reason}")]
    InvalidGeometry { reason: String },

    /// Requested draft lies outside the sampled waterline range
    #[error("Draft {draft_m} m outside sampled waterline range [{min_m}, {max_m}] m")]
    DraftOutOfRange { draft_m: f64, min_m: f64, max_m: f64 },

    /// Too few samples for the requested integration
    #[error("Integration needs at least {required} points, got {actual}")]
    InsufficientPoints { required: usize, actual: usize },

    /// Calculation could not be carried out
    #[error("Calculation failed: {calculation_type} - {reason}")]
    CalculationFailed {
        calculation_type: String,
        reason: String,
    },

    /// File I/O error (CLI case files)
    #[error("File error: {operation} on '{path}' - {reason}")]
    FileError {
        operation: String,
        path: String,
        reason: String,
    },

    /// JSON serialization/deserialization error
    #[error("Serialization error: {reason}")]
    SerializationError { reason: String },
}

impl CalcError {
    /// Create an InvalidInput error
    pub fn invalid_input(field: impl Into<String>, value: impl Into<String>, reason: impl Into<String>) -> Self {
        CalcError::InvalidInput {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a MissingField error
    pub fn missing_field(field: impl Into<String>) -> Self {
        CalcError::MissingField {
            field: field.into(),
        }
    }

    /// Create an InvalidGeometry error
    pub fn invalid_geometry(reason: impl Into<String>) -> Self {
        CalcError::InvalidGeometry {
            reason: reason.into(),
        }
    }

    /// Create a DraftOutOfRange error
    pub fn draft_out_of_range(draft_m: f64, min_m: f64, max_m: f64) -> Self {
        CalcError::DraftOutOfRange { draft_m, min_m, max_m }
    }

    /// Create a CalculationFailed error
    pub fn calculation_failed(calculation_type: impl Into<String>, reason: impl Into<String>) -> Self {
        CalcError::CalculationFailed {
            calculation_type: calculation_type.into(),
            reason: reason.into(),
        }
    }

    /// Create a FileError
    pub fn file_error(operation: impl Into<String>, path: impl Into<String>, reason: impl Into<String>) -> Self {
        CalcError::FileError {
            operation: operation.into(),
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// True for errors raised by input validation (as opposed to I/O)
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            CalcError::InvalidInput { .. }
                | CalcError::MissingField { .. }
                | CalcError::InvalidGeometry { .. }
                | CalcError::DraftOutOfRange { .. }
                | CalcError::InsufficientPoints { .. }
        )
    }

    /// Get a short error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            CalcError::InvalidInput { .. } => "INVALID_INPUT",
            CalcError::MissingField { .. } => "MISSING_FIELD",
            CalcError::InvalidGeometry { .. } => "INVALID_GEOMETRY",
            CalcError::DraftOutOfRange { .. } => "DRAFT_OUT_OF_RANGE",
            CalcError::InsufficientPoints { .. } => "INSUFFICIENT_POINTS",
            CalcError::CalculationFailed { .. } => "CALCULATION_FAILED",
            CalcError::FileError { .. } => "FILE_ERROR",
            CalcError::SerializationError { .. } => "SERIALIZATION_ERROR",
        }
    }
}

impl From<serde_json::Error> for CalcError {
    fn from(err: serde_json::Error) -> Self {
        CalcError::SerializationError {
            reason: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_serialization() {
        let error = CalcError::draft_out_of_range(7.5, 0.0, 6.0);
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("\"type\":\"DraftOutOfRange\""));
        let roundtrip: CalcError = serde_json::from_str(&json).unwrap();
        assert_eq!(error, roundtrip);
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(CalcError::missing_field("kg_m").error_code(), "MISSING_FIELD");
        assert_eq!(CalcError::invalid_geometry("gap").error_code(), "INVALID_GEOMETRY");
        assert_eq!(
            CalcError::InsufficientPoints { required: 2, actual: 1 }.error_code(),
            "INSUFFICIENT_POINTS"
        );
    }

    #[test]
    fn test_validation_classification() {
        assert!(CalcError::invalid_geometry("gap").is_validation());
        assert!(!CalcError::file_error("read", "case.json", "not found").is_validation());
    }

    #[test]
    fn test_display_message() {
        let error = CalcError::invalid_input("density_kg_m3", "-1", "Water density must be positive");
        assert_eq!(
            error.to_string(),
            "Invalid input for 'density_kg_m3': -1 - Water density must be positive"
        );
    }
}
