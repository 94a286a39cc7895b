use thiserror::Error;

use models::errors::ModelError;

/// Title shown with permission errors that are meant for direct display.
pub const INSUFFICIENT_PERMISSIONS_TITLE: &str = "Insufficient permissions. Please contact your administrator.";

#[derive(Debug, Error, PartialEq)]
pub enum ServiceError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("{title}: {message}")]
    Permission { title: String, message: String },
    #[error("duplicate entry: {0}")]
    Duplicate(String),
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("database error: {0}")]
    Db(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    pub fn not_found(doctype: &str, name: &str) -> Self { Self::NotFound(format!("{} {} not found", doctype, name)) }

    pub fn permission(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Permission { title: title.into(), message: message.into() }
    }

    /// Stable short code for external mapping/logging
    pub fn kind(&self) -> &'static str {
        match self {
            ServiceError::Validation(_) => "ValidationError",
            ServiceError::NotFound(_) => "DoesNotExistError",
            ServiceError::Permission { .. } => "PermissionError",
            ServiceError::Duplicate(_) => "DuplicateEntryError",
            ServiceError::Unauthorized(_) => "AuthenticationError",
            ServiceError::Db(_) => "DatabaseError",
            ServiceError::Internal(_) => "InternalError",
        }
    }
}

impl From<ModelError> for ServiceError {
    fn from(e: ModelError) -> Self {
        match e {
            ModelError::Validation(msg) => ServiceError::Validation(msg),
            ModelError::NotFound { doctype, name } => ServiceError::not_found(&doctype, &name),
            ModelError::Duplicate { doctype, name } => ServiceError::Duplicate(format!("{} {} already exists", doctype, name)),
            ModelError::Db(msg) => ServiceError::Db(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_errors_keep_their_kind() {
        let e: ServiceError = ModelError::NotFound { doctype: "Note".into(), name: "n1".into() }.into();
        assert_eq!(e, ServiceError::NotFound("Note n1 not found".into()));
        let e: ServiceError = ModelError::Duplicate { doctype: "Note".into(), name: "n1".into() }.into();
        assert_eq!(e.kind(), "DuplicateEntryError");
    }
}
