//! Error types for SecAudit core
//!
//! Provides error handling for:
//! - Authentication and admin authorization failures
//! - Audit lifecycle violations (no bound audit, locked audit)
//! - Store failures surfaced by the ports
//! - Validation of questionnaire and record edits

use secaudit_model::{AuditId, ValidationError};

/// Main error type for core operations
#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    /// No authenticated identity
    #[error("not authenticated")]
    Unauthenticated,

    /// Identity lacks the required role
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Session has no audit bound yet
    #[error("no active audit for this session")]
    NoActiveAudit,

    /// Audit is finalized and read-only
    #[error("audit {audit_id} is finalized")]
    AuditLocked {
        /// Locked audit
        audit_id: AuditId,
    },

    /// Referenced record or account does not exist
    #[error("{collection} record not found: {id}")]
    RecordNotFound {
        /// Collection or directory name
        collection: String,
        /// Requested id
        id: String,
    },

    /// Edit or payload rejected
    #[error("validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),

    /// Store or authorization backend unreachable
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// Configuration could not be loaded
    #[error("configuration error: {0}")]
    Config(String),
}

impl AuditError {
    /// Check if retrying the same call may succeed
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StoreUnavailable(_))
    }

    /// Check if the error is the caller's to fix (as opposed to an outage)
    #[inline]
    #[must_use]
    pub fn is_user_facing(&self) -> bool {
        !matches!(self, Self::StoreUnavailable(_) | Self::Config(_))
    }
}

/// Errors reported by store ports
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Backend unreachable
    #[error("unavailable: {0}")]
    Unavailable(String),

    /// No audit with this id
    #[error("audit not found: {0}")]
    AuditNotFound(AuditId),

    /// No record with this id
    #[error("{collection} record not found: {id}")]
    RecordNotFound {
        /// Collection or directory name
        collection: String,
        /// Requested id
        id: String,
    },

    /// Write refused because the audit is finalized
    #[error("audit {0} is finalized")]
    Locked(AuditId),

    /// Payload refused
    #[error("rejected: {0}")]
    Rejected(String),
}

impl From<StoreError> for AuditError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(msg) => Self::StoreUnavailable(msg),
            StoreError::AuditNotFound(_) => Self::NoActiveAudit,
            StoreError::RecordNotFound { collection, id } => Self::RecordNotFound { collection, id },
            StoreError::Locked(audit_id) => Self::AuditLocked { audit_id },
            StoreError::Rejected(msg) => Self::ValidationFailed(ValidationError::Rejected(msg)),
        }
    }
}

/// Result alias for core operations
pub type AuditResult<T> = Result<T, AuditError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn audit_error_display() {
        let err = AuditError::Unauthorized("admin role required".to_string());
        assert!(err.to_string().contains("unauthorized"));
    }

    #[test]
    fn only_unavailability_is_retryable() {
        assert!(AuditError::StoreUnavailable("timeout".to_string()).is_retryable());
        assert!(!AuditError::NoActiveAudit.is_retryable());
        assert!(!AuditError::Unauthenticated.is_retryable());
    }

    #[test]
    fn user_facing_classification() {
        assert!(AuditError::NoActiveAudit.is_user_facing());
        assert!(!AuditError::Config("bad".to_string()).is_user_facing());
    }

    #[test]
    fn store_errors_map_onto_audit_errors() {
        let id = AuditId::generate();
        assert!(matches!(
            AuditError::from(StoreError::Locked(id.clone())),
            AuditError::AuditLocked { audit_id } if audit_id == id
        ));
        assert!(matches!(
            AuditError::from(StoreError::Rejected("dup".to_string())),
            AuditError::ValidationFailed(ValidationError::Rejected(_))
        ));
        assert!(AuditError::from(StoreError::Unavailable("down".to_string())).is_retryable());
    }
}
