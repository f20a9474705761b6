//! Admin gate
//!
//! Issues [`AdminContext`] values, the capability every administrative
//! operation requires. The identity provider's admin flag is checked first,
//! then the authorization service is probed once per identity.

use crate::config::AccessPolicy;
use crate::error::{AuditError, AuditResult, StoreError};
use crate::ports::{AuthorizationService, IdentityProvider};
use dashmap::DashMap;
use secaudit_model::Identity;
use std::sync::Arc;

/// Proof that the caller passed the admin gate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminContext {
    identity: Identity,
    degraded: bool,
}

impl AdminContext {
    /// Admin identity
    #[inline]
    #[must_use]
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Granted without a definitive authorization answer
    #[inline]
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        self.degraded
    }
}

/// Admin authorization with a one-time probe per identity
pub struct AdminGate {
    authz: Arc<dyn AuthorizationService>,
    policy: AccessPolicy,
    probed: DashMap<String, bool>,
}

impl std::fmt::Debug for AdminGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminGate")
            .field("policy", &self.policy)
            .field("probed", &self.probed.len())
            .finish_non_exhaustive()
    }
}

impl AdminGate {
    /// Create gate over an authorization service
    #[must_use]
    pub fn new(authz: Arc<dyn AuthorizationService>, policy: AccessPolicy) -> Self {
        Self {
            authz,
            policy,
            probed: DashMap::new(),
        }
    }

    /// Authorize `identity` for administration
    ///
    /// # Errors
    /// - `Unauthorized` if the identity is not an admin
    /// - `StoreUnavailable` if the probe fails and the policy is fail-closed
    pub async fn authorize(&self, identity: &Identity) -> AuditResult<AdminContext> {
        if !identity.is_admin {
            return Err(AuditError::Unauthorized(format!(
                "{} is not an administrator",
                identity.id
            )));
        }
        let cached = self.probed.get(&identity.id).map(|entry| *entry);
        let granted = match cached {
            Some(granted) => granted,
            None => match self.authz.is_admin(identity).await {
                Ok(granted) => {
                    self.probed.insert(identity.id.clone(), granted);
                    granted
                }
                Err(StoreError::Unavailable(reason)) if self.policy.fail_open => {
                    tracing::warn!(
                        "authorization probe unavailable ({}); granting degraded admin access to {}",
                        reason,
                        identity.id
                    );
                    return Ok(AdminContext {
                        identity: identity.clone(),
                        degraded: true,
                    });
                }
                Err(err) => return Err(err.into()),
            },
        };
        if granted {
            tracing::debug!("admin access granted to {}", identity.id);
            Ok(AdminContext {
                identity: identity.clone(),
                degraded: false,
            })
        } else {
            tracing::warn!("admin access denied to {}", identity.id);
            Err(AuditError::Unauthorized(format!(
                "{} lacks the admin role",
                identity.id
            )))
        }
    }

    /// Authorize whoever the identity provider reports
    ///
    /// # Errors
    /// `Unauthenticated` from the provider, then as [`Self::authorize`].
    pub async fn authorize_current(
        &self,
        provider: &dyn IdentityProvider,
    ) -> AuditResult<AdminContext> {
        let identity = provider.current_identity().await?;
        self.authorize(&identity).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{MockAuthorizationService, MockIdentityProvider};

    fn admin() -> Identity {
        Identity::new("admin-1").admin()
    }

    fn gate(authz: MockAuthorizationService, fail_open: bool) -> AdminGate {
        AdminGate::new(Arc::new(authz), AccessPolicy { fail_open })
    }

    #[tokio::test]
    async fn non_admin_identity_is_rejected_without_probe() {
        let mut authz = MockAuthorizationService::new();
        authz.expect_is_admin().times(0);
        let err = gate(authz, true).authorize(&Identity::new("u1")).await.unwrap_err();
        assert!(matches!(err, AuditError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn definitive_answer_is_probed_once() {
        let mut authz = MockAuthorizationService::new();
        authz.expect_is_admin().times(1).returning(|_| Ok(true));
        let gate = gate(authz, false);
        let first = gate.authorize(&admin()).await.unwrap();
        let second = gate.authorize(&admin()).await.unwrap();
        assert!(!first.is_degraded());
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn denial_is_cached_too() {
        let mut authz = MockAuthorizationService::new();
        authz.expect_is_admin().times(1).returning(|_| Ok(false));
        let gate = gate(authz, true);
        assert!(gate.authorize(&admin()).await.is_err());
        assert!(matches!(
            gate.authorize(&admin()).await,
            Err(AuditError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn unavailable_probe_fails_closed_by_default() {
        let mut authz = MockAuthorizationService::new();
        authz
            .expect_is_admin()
            .returning(|_| Err(StoreError::Unavailable("down".to_string())));
        let err = gate(authz, false).authorize(&admin()).await.unwrap_err();
        assert!(matches!(err, AuditError::StoreUnavailable(_)));
    }

    #[tokio::test]
    async fn unavailable_probe_degrades_when_fail_open_and_is_not_cached() {
        let mut authz = MockAuthorizationService::new();
        authz
            .expect_is_admin()
            .times(2)
            .returning(|_| Err(StoreError::Unavailable("down".to_string())));
        let gate = gate(authz, true);
        assert!(gate.authorize(&admin()).await.unwrap().is_degraded());
        assert!(gate.authorize(&admin()).await.unwrap().is_degraded());
    }

    #[tokio::test]
    async fn unauthenticated_caller_is_rejected() {
        let mut provider = MockIdentityProvider::new();
        provider
            .expect_current_identity()
            .returning(|| Err(AuditError::Unauthenticated));
        let err = gate(MockAuthorizationService::new(), false)
            .authorize_current(&provider)
            .await
            .unwrap_err();
        assert!(matches!(err, AuditError::Unauthenticated));
    }
}
