//! In-memory store
//!
//! Reference implementation of the audit, record and user-directory ports.
//! The audit table sits behind one mutex so find-or-create is a single
//! critical section; record collections are sharded in a `DashMap`.

use crate::error::StoreError;
use crate::ports::{AuditStore, AuditUpdate, RecordStore, UserDirectory};
use async_trait::async_trait;
use dashmap::DashMap;
use indexmap::IndexMap;
use parking_lot::{Mutex, RwLock};
use secaudit_model::{
    Audit, AuditId, CollectionKind, Fields, NewAudit, OwnerId, Record, RecordId, UserAccount,
    UserUpdate,
};

/// In-memory implementation of every store port
#[derive(Debug, Default)]
pub struct MemoryStore {
    audits: Mutex<IndexMap<AuditId, Audit>>,
    records: DashMap<CollectionKind, Vec<Record>>,
    users: RwLock<IndexMap<String, UserAccount>>,
}

impl MemoryStore {
    /// Create empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With records preloaded into a collection
    #[must_use]
    pub fn with_records(self, kind: CollectionKind, records: Vec<Record>) -> Self {
        self.records.entry(kind).or_default().extend(records);
        self
    }

    /// With user accounts preloaded
    #[must_use]
    pub fn with_users(self, users: Vec<UserAccount>) -> Self {
        {
            let mut table = self.users.write();
            for user in users {
                table.insert(user.id.clone(), user);
            }
        }
        self
    }

    /// Number of stored audits
    #[must_use]
    pub fn audit_count(&self) -> usize {
        self.audits.lock().len()
    }

    /// Stored audits of one owner
    #[must_use]
    pub fn audits_of(&self, owner: &OwnerId) -> Vec<Audit> {
        self.audits
            .lock()
            .values()
            .filter(|a| &a.owner == owner)
            .cloned()
            .collect()
    }

    fn record_not_found(kind: CollectionKind, id: &RecordId) -> StoreError {
        StoreError::RecordNotFound {
            collection: kind.to_string(),
            id: id.to_string(),
        }
    }

    fn user_not_found(id: &str) -> StoreError {
        StoreError::RecordNotFound {
            collection: "users".to_string(),
            id: id.to_string(),
        }
    }
}

#[async_trait]
impl AuditStore for MemoryStore {
    async fn find_audit(&self, owner: &OwnerId) -> Result<Option<Audit>, StoreError> {
        Ok(self
            .audits
            .lock()
            .values()
            .rev()
            .find(|a| &a.owner == owner)
            .cloned())
    }

    async fn get_audit(&self, id: &AuditId) -> Result<Audit, StoreError> {
        self.audits
            .lock()
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::AuditNotFound(id.clone()))
    }

    async fn find_or_create_audit(&self, new: NewAudit) -> Result<Audit, StoreError> {
        let mut audits = self.audits.lock();
        if let Some(existing) = audits.values().rev().find(|a| a.owner == new.owner) {
            return Ok(existing.clone());
        }
        let audit = new.into_audit(AuditId::generate());
        audits.insert(audit.id.clone(), audit.clone());
        tracing::debug!("created audit {} for {}", audit.id, audit.owner);
        Ok(audit)
    }

    async fn update_audit(&self, id: &AuditId, update: AuditUpdate) -> Result<Audit, StoreError> {
        let mut audits = self.audits.lock();
        let audit = audits
            .get_mut(id)
            .ok_or_else(|| StoreError::AuditNotFound(id.clone()))?;
        update.apply_to(audit)?;
        Ok(audit.clone())
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn list_records(&self, kind: CollectionKind) -> Result<Vec<Record>, StoreError> {
        Ok(self
            .records
            .get(&kind)
            .map(|records| records.clone())
            .unwrap_or_default())
    }

    async fn get_record(&self, kind: CollectionKind, id: &RecordId) -> Result<Record, StoreError> {
        self.records
            .get(&kind)
            .and_then(|records| records.iter().find(|r| &r.id == id).cloned())
            .ok_or_else(|| Self::record_not_found(kind, id))
    }

    async fn create_record(
        &self,
        kind: CollectionKind,
        mut fields: Fields,
    ) -> Result<RecordId, StoreError> {
        fields.remove("_id");
        let id = RecordId::generate();
        self.records
            .entry(kind)
            .or_default()
            .push(Record::new(id.clone(), fields));
        Ok(id)
    }

    async fn update_record(
        &self,
        kind: CollectionKind,
        id: &RecordId,
        fields: Fields,
    ) -> Result<Record, StoreError> {
        let mut records = self
            .records
            .get_mut(&kind)
            .ok_or_else(|| Self::record_not_found(kind, id))?;
        let record = records
            .iter_mut()
            .find(|r| &r.id == id)
            .ok_or_else(|| Self::record_not_found(kind, id))?;
        for (key, value) in fields {
            if key != "_id" {
                record.fields.insert(key, value);
            }
        }
        Ok(record.clone())
    }

    async fn delete_record(&self, kind: CollectionKind, id: &RecordId) -> Result<(), StoreError> {
        let mut records = self
            .records
            .get_mut(&kind)
            .ok_or_else(|| Self::record_not_found(kind, id))?;
        let index = records
            .iter()
            .position(|r| &r.id == id)
            .ok_or_else(|| Self::record_not_found(kind, id))?;
        records.remove(index);
        Ok(())
    }
}

#[async_trait]
impl UserDirectory for MemoryStore {
    async fn list_users(&self) -> Result<Vec<UserAccount>, StoreError> {
        Ok(self.users.read().values().cloned().collect())
    }

    async fn update_user(&self, id: &str, update: UserUpdate) -> Result<UserAccount, StoreError> {
        let mut users = self.users.write();
        let account = users.get_mut(id).ok_or_else(|| Self::user_not_found(id))?;
        account.apply(update);
        Ok(account.clone())
    }

    async fn delete_user(&self, id: &str) -> Result<(), StoreError> {
        self.users
            .write()
            .shift_remove(id)
            .map(|_| ())
            .ok_or_else(|| Self::user_not_found(id))
    }
}
