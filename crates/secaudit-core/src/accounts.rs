//! Account administration

use crate::access::AdminContext;
use crate::error::AuditResult;
use crate::ports::UserDirectory;
use secaudit_model::{Role, UserAccount, UserUpdate, ValidationError};
use std::sync::Arc;

/// Account as shown in the admin listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountSummary {
    /// Directory id
    pub id: String,
    /// Email
    pub email: String,
    /// Display name (`Sin nombre` when unset)
    pub name: String,
    /// Derived role
    pub role: Role,
    /// Status (`Activo` when unset)
    pub status: String,
}

impl From<&UserAccount> for AccountSummary {
    fn from(account: &UserAccount) -> Self {
        Self {
            id: account.id.clone(),
            email: account.email.clone(),
            name: account.display_name().to_string(),
            role: account.role(),
            status: account.display_status().to_string(),
        }
    }
}

/// User directory operations for administrators
#[derive(Clone)]
pub struct AccountAdmin {
    directory: Arc<dyn UserDirectory>,
}

impl std::fmt::Debug for AccountAdmin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountAdmin").finish_non_exhaustive()
    }
}

impl AccountAdmin {
    /// Create over a user directory
    #[must_use]
    pub fn new(directory: Arc<dyn UserDirectory>) -> Self {
        Self { directory }
    }

    /// All accounts with display defaults applied
    ///
    /// # Errors
    /// Store failures.
    pub async fn list_users(&self, ctx: &AdminContext) -> AuditResult<Vec<AccountSummary>> {
        let accounts = self.directory.list_users().await?;
        tracing::debug!("{} listed {} accounts", ctx.identity().id, accounts.len());
        Ok(accounts.iter().map(AccountSummary::from).collect())
    }

    /// Apply a partial update
    ///
    /// # Errors
    /// - `ValidationFailed` for an empty update
    /// - `RecordNotFound` for an unknown account
    /// - Store failures
    pub async fn update_user(
        &self,
        ctx: &AdminContext,
        id: &str,
        update: UserUpdate,
    ) -> AuditResult<AccountSummary> {
        if update.is_empty() {
            return Err(ValidationError::Rejected("empty account update".to_string()).into());
        }
        let account = self.directory.update_user(id, update).await?;
        tracing::info!("{} updated account {}", ctx.identity().id, id);
        Ok(AccountSummary::from(&account))
    }

    /// Remove an account
    ///
    /// # Errors
    /// `RecordNotFound` for an unknown account, store failures.
    pub async fn delete_user(&self, ctx: &AdminContext, id: &str) -> AuditResult<()> {
        self.directory.delete_user(id).await?;
        tracing::info!("{} deleted account {}", ctx.identity().id, id);
        Ok(())
    }
}
