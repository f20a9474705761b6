//! Audit lifecycle transitions
//!
//! `InProgress --save--> InProgress` and `InProgress --finalize--> Finalized`.
//! `Finalized` is terminal.

use crate::error::AuditError;
use secaudit_model::{AuditId, AuditState};

/// Lifecycle operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditTransition {
    /// Per-category save
    Save,
    /// One-way lock
    Finalize,
}

impl AuditTransition {
    /// State reached by applying this transition
    #[must_use]
    pub fn target(self) -> AuditState {
        match self {
            Self::Save => AuditState::InProgress,
            Self::Finalize => AuditState::Finalized,
        }
    }
}

/// Transitions permitted from `from`
#[must_use]
pub fn allowed_transitions(from: AuditState) -> Vec<AuditTransition> {
    match from {
        AuditState::InProgress => vec![AuditTransition::Save, AuditTransition::Finalize],
        AuditState::Finalized => vec![],
    }
}

/// Check a transition against the table
///
/// # Errors
/// `AuditLocked` when the audit is finalized.
pub fn validate_transition(
    audit_id: &AuditId,
    from: AuditState,
    transition: AuditTransition,
) -> Result<AuditState, AuditError> {
    if allowed_transitions(from).contains(&transition) {
        Ok(transition.target())
    } else {
        Err(AuditError::AuditLocked {
            audit_id: audit_id.clone(),
        })
    }
}
