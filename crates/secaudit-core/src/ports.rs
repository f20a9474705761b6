//! Collaborator ports
//!
//! Everything outside the core is reached through these traits: the audit
//! and record stores, the identity provider, the authorization probe and the
//! user directory. Services hold them as `Arc<dyn Trait>`.

use crate::error::{AuditError, StoreError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secaudit_model::{
    Answers, Audit, AuditId, CategoryAnswer, CollectionKind, Fields, Identity, NewAudit, OwnerId,
    Record, RecordId, UserAccount, UserUpdate,
};

/// Write applied to a stored audit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuditUpdate {
    /// Replace one category's answer
    SaveCategory {
        /// Category key
        category: String,
        /// New answer
        answer: CategoryAnswer,
        /// Modification time
        at: DateTime<Utc>,
    },
    /// Replace all answers and lock the audit
    Finalize {
        /// Full answer set
        answers: Answers,
        /// Finalization time
        at: DateTime<Utc>,
    },
}

impl AuditUpdate {
    /// Apply to a stored audit
    ///
    /// # Errors
    /// `Locked` if the audit is already finalized.
    pub fn apply_to(self, audit: &mut Audit) -> Result<(), StoreError> {
        if audit.is_finalized() {
            return Err(StoreError::Locked(audit.id.clone()));
        }
        match self {
            Self::SaveCategory {
                category,
                answer,
                at,
            } => {
                audit.answers.insert(category, answer);
                audit.last_modified_at = at;
            }
            Self::Finalize { answers, at } => {
                audit.answers = answers;
                audit.state = secaudit_model::AuditState::Finalized;
                audit.last_modified_at = at;
                audit.finalized_at = Some(at);
            }
        }
        Ok(())
    }
}

/// Persistent audit storage
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuditStore: Send + Sync {
    /// The owner's audit, in any state
    async fn find_audit(&self, owner: &OwnerId) -> Result<Option<Audit>, StoreError>;

    /// Audit by id
    async fn get_audit(&self, id: &AuditId) -> Result<Audit, StoreError>;

    /// Return the owner's existing audit or insert `new`, as one conditional write
    async fn find_or_create_audit(&self, new: NewAudit) -> Result<Audit, StoreError>;

    /// Apply an update, returning the stored result
    async fn update_audit(&self, id: &AuditId, update: AuditUpdate) -> Result<Audit, StoreError>;
}

/// Taxonomy record storage
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// All records of a collection, in store order
    async fn list_records(&self, kind: CollectionKind) -> Result<Vec<Record>, StoreError>;

    /// One record
    async fn get_record(&self, kind: CollectionKind, id: &RecordId) -> Result<Record, StoreError>;

    /// Insert, returning the assigned store id
    async fn create_record(&self, kind: CollectionKind, fields: Fields)
        -> Result<RecordId, StoreError>;

    /// Merge `fields` into the stored record (`$set` semantics)
    async fn update_record(
        &self,
        kind: CollectionKind,
        id: &RecordId,
        fields: Fields,
    ) -> Result<Record, StoreError>;

    /// Remove
    async fn delete_record(&self, kind: CollectionKind, id: &RecordId) -> Result<(), StoreError>;
}

/// Source of the authenticated caller
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Current identity, or `Unauthenticated`
    async fn current_identity(&self) -> Result<Identity, AuditError>;
}

/// Server-side admin check
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthorizationService: Send + Sync {
    /// Whether `identity` holds the admin role
    async fn is_admin(&self, identity: &Identity) -> Result<bool, StoreError>;
}

/// Administered user accounts
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// All accounts
    async fn list_users(&self) -> Result<Vec<UserAccount>, StoreError>;

    /// Apply a partial update
    async fn update_user(&self, id: &str, update: UserUpdate) -> Result<UserAccount, StoreError>;

    /// Remove
    async fn delete_user(&self, id: &str) -> Result<(), StoreError>;
}
