//! Error types for goalflow
//!
//! All errors use thiserror for structured error handling.
//! Each variant carries a machine-readable code so the presentation
//! layer can branch on it without parsing messages.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("{entity} {id} belongs to another user")]
    Forbidden { entity: &'static str, id: String },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Access denied: {0}")]
    AccessDenied(String),

    /// Stored data violates the goal hierarchy (e.g. a weekly goal without
    /// a parent). Not a user error; callers must not try to continue.
    #[error("Structural fault: {0}")]
    StructuralFault(String),

    #[error("{0}")]
    Generic(String),
}

impl AppError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        AppError::NotFound {
            entity,
            id: id.into(),
        }
    }

    pub fn forbidden(entity: &'static str, id: impl Into<String>) -> Self {
        AppError::Forbidden {
            entity,
            id: id.into(),
        }
    }

    /// Machine-readable error code
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Database(_) => "database",
            AppError::Io(_) => "io",
            AppError::Serialization(_) => "serialization",
            AppError::NotFound { .. } => "not_found",
            AppError::Forbidden { .. } => "forbidden",
            AppError::InvalidArgument(_) => "invalid_argument",
            AppError::AccessDenied(_) => "access_denied",
            AppError::StructuralFault(_) => "structural_fault",
            AppError::Generic(_) => "internal",
        }
    }

    /// Whether the caller can show this to the user and carry on
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AppError::NotFound { .. }
                | AppError::Forbidden { .. }
                | AppError::InvalidArgument(_)
                | AppError::AccessDenied(_)
        )
    }
}

impl serde::Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;

        let mut state = serializer.serialize_struct("AppError", 2)?;
        state.serialize_field("code", self.code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_with_code() {
        let err = AppError::not_found("Goal", "abc");
        let json = serde_json::to_value(&err).unwrap();

        assert_eq!(json["code"], "not_found");
        assert_eq!(json["message"], "Goal not found: abc");
    }

    #[test]
    fn test_structural_fault_is_not_recoverable() {
        assert!(!AppError::StructuralFault("missing parent".to_string()).is_recoverable());
        assert!(AppError::forbidden("Goal", "abc").is_recoverable());
        assert!(AppError::InvalidArgument("empty".to_string()).is_recoverable());
    }
}
