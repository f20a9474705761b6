//! Testing utilities for SecAudit workspace
//!
//! Shared fixtures and fault-injecting collaborators.

#![allow(missing_docs)]

use async_trait::async_trait;
use chrono::Utc;
use secaudit_core::{
    AccessPolicy, AdminContext, AdminGate, AuditError, AuditStore, AuditUpdate,
    AuthorizationService, IdentityProvider, MemoryStore, StoreError,
};
use secaudit_model::{
    Audit, AuditId, CollectionKind, Fields, Identity, NewAudit, OwnerId, Record, RecordId,
    UserAccount,
};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub fn record(id: &str, fields: Value) -> Record {
    let fields: Fields = serde_json::from_value(fields).unwrap();
    Record::new(RecordId::new(id), fields)
}

pub fn asset(human_id: i64, category: &str, name: &str, provider: &str) -> Record {
    record(
        &format!("asset-{human_id}"),
        json!({
            "ID_Activos": human_id,
            "Nombre": name,
            "Categoría": category,
            "Proveedor": provider,
        }),
    )
}

pub fn threat(human_id: i64, name: &str) -> Record {
    record(
        &format!("threat-{human_id}"),
        json!({
            "ID_Amenazas": human_id,
            "Nombre": name,
            "Tipo": "Ataques intencionados",
        }),
    )
}

pub fn sample_assets() -> Vec<Record> {
    vec![
        asset(1, "Servidores", "PowerEdge R740", "Dell"),
        asset(2, "Redes", "ISR 4321", "Cisco"),
        asset(4, "Servidores", "ProLiant DL380", "HPE"),
        asset(3, "Portátil", "ThinkPad X1", "Lenovo"),
    ]
}

pub fn sample_categories() -> Vec<String> {
    vec![
        "Servidores".to_string(),
        "Redes".to_string(),
        "Portátil".to_string(),
    ]
}

pub fn user_account(id: &str, labels: &[&str]) -> UserAccount {
    UserAccount {
        id: id.to_string(),
        email: format!("{id}@example.com"),
        name: None,
        labels: labels.iter().map(|l| (*l).to_string()).collect(),
        status: None,
    }
}

pub fn seeded_store() -> Arc<MemoryStore> {
    Arc::new(
        MemoryStore::new()
            .with_records(CollectionKind::Assets, sample_assets())
            .with_records(
                CollectionKind::Threats,
                vec![threat(2, "Phishing"), threat(1, "Incendio")],
            )
            .with_users(vec![
                user_account("admin-1", &["admin"]),
                user_account("u1", &[]),
            ]),
    )
}

pub fn respondent(id: &str) -> Identity {
    Identity::new(id).with_contact("Ana Pérez", format!("{id}@example.com"))
}

pub fn admin_identity() -> Identity {
    Identity::new("admin-1")
        .admin()
        .with_contact("Admin", "admin-1@example.com")
}

pub fn new_audit(owner: &str, categories: &[String]) -> NewAudit {
    NewAudit::for_categories(OwnerId::new(owner), categories, Utc::now())
}

/// Authorization probe with a fixed answer, counting calls
#[derive(Debug)]
pub struct FixedAuthorization {
    answer: Result<bool, StoreError>,
    calls: AtomicUsize,
}

impl FixedAuthorization {
    pub fn granting() -> Self {
        Self::answering(Ok(true))
    }

    pub fn denying() -> Self {
        Self::answering(Ok(false))
    }

    pub fn unavailable() -> Self {
        Self::answering(Err(StoreError::Unavailable("authorization service down".to_string())))
    }

    fn answering(answer: Result<bool, StoreError>) -> Self {
        Self {
            answer,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AuthorizationService for FixedAuthorization {
    async fn is_admin(&self, _identity: &Identity) -> Result<bool, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.answer.clone()
    }
}

/// Identity provider returning a fixed caller, or none
#[derive(Debug, Clone)]
pub struct StaticIdentity(pub Option<Identity>);

#[async_trait]
impl IdentityProvider for StaticIdentity {
    async fn current_identity(&self) -> Result<Identity, AuditError> {
        self.0.clone().ok_or(AuditError::Unauthenticated)
    }
}

/// Audit store wrapper that fails the next N updates with `Unavailable`
pub struct FlakyAuditStore {
    inner: Arc<dyn AuditStore>,
    failing_updates: AtomicUsize,
    updates: AtomicUsize,
}

impl FlakyAuditStore {
    pub fn new(inner: Arc<dyn AuditStore>) -> Self {
        Self {
            inner,
            failing_updates: AtomicUsize::new(0),
            updates: AtomicUsize::new(0),
        }
    }

    pub fn fail_next_updates(&self, n: usize) {
        self.failing_updates.store(n, Ordering::SeqCst);
    }

    /// Update calls that reached the inner store
    pub fn updates(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AuditStore for FlakyAuditStore {
    async fn find_audit(&self, owner: &OwnerId) -> Result<Option<Audit>, StoreError> {
        self.inner.find_audit(owner).await
    }

    async fn get_audit(&self, id: &AuditId) -> Result<Audit, StoreError> {
        self.inner.get_audit(id).await
    }

    async fn find_or_create_audit(&self, new: NewAudit) -> Result<Audit, StoreError> {
        self.inner.find_or_create_audit(new).await
    }

    async fn update_audit(&self, id: &AuditId, update: AuditUpdate) -> Result<Audit, StoreError> {
        let failing = self
            .failing_updates
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(StoreError::Unavailable("injected failure".to_string()));
        }
        self.updates.fetch_add(1, Ordering::SeqCst);
        self.inner.update_audit(id, update).await
    }
}

/// Admin context issued by a gate that always grants
pub async fn admin_context() -> AdminContext {
    AdminGate::new(Arc::new(FixedAuthorization::granting()), AccessPolicy::default())
        .authorize(&admin_identity())
        .await
        .unwrap()
}
