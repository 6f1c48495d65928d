//! Error types shared across the crate.

use std::path::PathBuf;

/// Bad caller input, raised before any computation or network call.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("{field} must be greater than zero")]
    NonPositive { field: &'static str },

    #[error("{field} is required")]
    Missing { field: &'static str },

    #[error("Unknown region: {state}")]
    UnknownRegion { state: String },

    #[error("Unknown quality tier: {0}")]
    UnknownQuality(String),

    #[error("Unknown concrete grade: {0}")]
    UnknownGrade(String),

    #[error("Unknown unit: {0}")]
    UnknownUnit(String),

    #[error("Paintable area must be greater than zero (doors and windows cover {openings:.2} of {wall:.2} sq.ft)")]
    NoPaintableArea { wall: f64, openings: f64 },

    #[error("{field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ValidationError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// Reject zero, negative and non-finite measurements.
pub fn require_positive(field: &'static str, value: f64) -> Result<f64, ValidationError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(ValidationError::NonPositive { field })
    }
}

/// Database errors.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Connection pool error: {0}")]
    Pool(String),

    #[error("Query failed: {0}")]
    Query(#[from] tokio_postgres::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("Constraint violation: {0}")]
    Constraint(String),
}

impl From<deadpool_postgres::PoolError> for DatabaseError {
    fn from(e: deadpool_postgres::PoolError) -> Self {
        DatabaseError::Pool(e.to_string())
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse pricing tables: {0}")]
    Parse(String),

    #[error("Invalid pricing tables: {0}")]
    InvalidTables(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_positive() {
        assert_eq!(require_positive("length", 2.5), Ok(2.5));
        assert_eq!(
            require_positive("length", 0.0),
            Err(ValidationError::NonPositive { field: "length" })
        );
        assert!(require_positive("length", -1.0).is_err());
        assert!(require_positive("length", f64::NAN).is_err());
        assert!(require_positive("length", f64::INFINITY).is_err());
    }

    #[test]
    fn test_validation_messages() {
        let err = ValidationError::NonPositive { field: "coats" };
        assert_eq!(err.to_string(), "coats must be greater than zero");

        let err = ValidationError::UnknownRegion {
            state: "atlantis".into(),
        };
        assert_eq!(err.to_string(), "Unknown region: atlantis");
    }
}
