//! Audit session manager
//!
//! Provides [`AuditSessionManager`], the only path through which audits are
//! read or written:
//! - Session resolution (find-or-create, one live audit per owner)
//! - Draft reconciliation against the current category set
//! - Per-category save and one-way finalization
//!
//! An [`AuditSession`] is the explicit per-caller context. Writes take it by
//! `&mut`, so at most one write per session is in flight.

use crate::catalog::CategoryCatalog;
use crate::config::QuestionnaireConfig;
use crate::draft::AuditDraft;
use crate::error::{AuditError, AuditResult};
use crate::ports::{AuditStore, AuditUpdate, RecordStore};
use crate::state::{validate_transition, AuditTransition};
use chrono::Utc;
use secaudit_model::{
    Answers, Audit, AuditId, AuditState, CollectionKind, Identity, NewAudit, OwnerId,
    RespondentProfile, ValidationError,
};
use std::sync::Arc;

/// Outcome of resolving an owner's audit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionResolution {
    /// Existing or newly created audit
    Ready(Audit),
    /// Category set not known yet; nothing was read or written
    Deferred,
}

/// One caller's questionnaire context
#[derive(Debug, Clone)]
pub struct AuditSession {
    owner: OwnerId,
    catalog: CategoryCatalog,
    categories: Vec<String>,
    audit: Option<Audit>,
    draft: AuditDraft,
}

impl AuditSession {
    /// Owner of the session
    #[inline]
    #[must_use]
    pub fn owner(&self) -> &OwnerId {
        &self.owner
    }

    /// Category set fixed at open time
    #[inline]
    #[must_use]
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    /// Option domains for detail fields
    #[inline]
    #[must_use]
    pub fn catalog(&self) -> &CategoryCatalog {
        &self.catalog
    }

    /// Bound audit as last read from or written to the store
    #[inline]
    #[must_use]
    pub fn audit(&self) -> Option<&Audit> {
        self.audit.as_ref()
    }

    /// Bound audit id
    #[must_use]
    pub fn audit_id(&self) -> Option<&AuditId> {
        self.audit.as_ref().map(|a| &a.id)
    }

    /// Lifecycle state of the bound audit
    #[must_use]
    pub fn state(&self) -> Option<AuditState> {
        self.audit.as_ref().map(|a| a.state)
    }

    /// Check if the bound audit is finalized
    #[must_use]
    pub fn is_finalized(&self) -> bool {
        self.audit.as_ref().is_some_and(Audit::is_finalized)
    }

    /// Current draft
    #[inline]
    #[must_use]
    pub fn draft(&self) -> &AuditDraft {
        &self.draft
    }

    /// Mutable draft
    ///
    /// # Errors
    /// `AuditLocked` once the audit is finalized.
    pub fn draft_mut(&mut self) -> AuditResult<&mut AuditDraft> {
        match &self.audit {
            Some(audit) if audit.is_finalized() => Err(AuditError::AuditLocked {
                audit_id: audit.id.clone(),
            }),
            _ => Ok(&mut self.draft),
        }
    }

    fn bound_audit(&self) -> AuditResult<&Audit> {
        self.audit.as_ref().ok_or(AuditError::NoActiveAudit)
    }
}

/// Mediates every audit read and write
#[derive(Clone)]
pub struct AuditSessionManager {
    audits: Arc<dyn AuditStore>,
    records: Arc<dyn RecordStore>,
    config: QuestionnaireConfig,
}

impl std::fmt::Debug for AuditSessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditSessionManager")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl AuditSessionManager {
    /// Create manager over the given stores
    #[must_use]
    pub fn new(audits: Arc<dyn AuditStore>, records: Arc<dyn RecordStore>) -> Self {
        Self {
            audits,
            records,
            config: QuestionnaireConfig::default(),
        }
    }

    /// With questionnaire configuration
    #[inline]
    #[must_use]
    pub fn with_config(mut self, config: QuestionnaireConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the category catalog from the asset records
    ///
    /// # Errors
    /// Store failures.
    pub async fn derive_categories(&self) -> AuditResult<CategoryCatalog> {
        let assets = self.records.list_records(CollectionKind::Assets).await?;
        Ok(CategoryCatalog::from_assets(&assets, &self.config))
    }

    /// Existing audit of `owner`, or a fresh in-progress one
    ///
    /// With no categories the call is deferred and touches nothing.
    ///
    /// # Errors
    /// Store failures.
    pub async fn resolve_session(
        &self,
        owner: &OwnerId,
        categories: &[String],
    ) -> AuditResult<SessionResolution> {
        self.resolve(owner, categories, None).await
    }

    async fn resolve(
        &self,
        owner: &OwnerId,
        categories: &[String],
        respondent: Option<RespondentProfile>,
    ) -> AuditResult<SessionResolution> {
        if categories.is_empty() {
            tracing::debug!("session for {} deferred: no categories", owner);
            return Ok(SessionResolution::Deferred);
        }
        let mut new = NewAudit::for_categories(owner.clone(), categories, Utc::now());
        if let Some(respondent) = respondent {
            new = new.with_respondent(respondent);
        }
        let audit = self.audits.find_or_create_audit(new).await?;
        tracing::info!(
            "resolved audit {} for {} ({})",
            audit.id,
            owner,
            audit.state
        );
        Ok(SessionResolution::Ready(audit))
    }

    /// Answers with one entry per category, stored entries kept verbatim
    #[must_use]
    pub fn load_draft(audit: &Audit, categories: &[String]) -> Answers {
        AuditDraft::reconcile(&audit.answers, categories).into_answers()
    }

    /// Bootstrap a session for `identity`
    ///
    /// # Errors
    /// Store failures.
    pub async fn open(&self, identity: &Identity) -> AuditResult<AuditSession> {
        let owner = identity.owner_id();
        let catalog = self.derive_categories().await?;
        let categories = catalog.categories();
        let resolution = self
            .resolve(&owner, &categories, Some(identity.respondent_profile()))
            .await?;
        let (audit, draft) = match resolution {
            SessionResolution::Ready(audit) => {
                let draft = AuditDraft::reconcile(&audit.answers, &categories);
                (Some(audit), draft)
            }
            SessionResolution::Deferred => (None, AuditDraft::default()),
        };
        let draft = draft.with_max_units(self.config.unit_cap());
        Ok(AuditSession {
            owner,
            catalog,
            categories,
            audit,
            draft,
        })
    }

    /// Persist one category of the draft
    ///
    /// # Errors
    /// - `NoActiveAudit` if no audit is bound
    /// - `AuditLocked` if the audit is finalized
    /// - `ValidationFailed` if the draft has no such category
    /// - Store failures, unretried
    pub async fn save_category(&self, session: &mut AuditSession, category: &str) -> AuditResult<()> {
        let audit = session.bound_audit()?;
        validate_transition(&audit.id, audit.state, AuditTransition::Save)?;
        let answer = session
            .draft
            .category(category)
            .cloned()
            .ok_or_else(|| ValidationError::UnknownCategory(category.to_string()))?;
        let id = audit.id.clone();
        let update = AuditUpdate::SaveCategory {
            category: category.to_string(),
            answer,
            at: Utc::now(),
        };
        let stored = self.audits.update_audit(&id, update).await.map_err(|e| {
            tracing::warn!("save of {} on audit {} failed: {}", category, id, e);
            AuditError::from(e)
        })?;
        tracing::info!("saved category {} on audit {}", category, id);
        session.audit = Some(stored);
        Ok(())
    }

    /// Persist the whole draft and lock the audit
    ///
    /// # Errors
    /// - `NoActiveAudit` if no audit is bound
    /// - `AuditLocked` if already finalized
    /// - Store failures
    pub async fn finalize(&self, session: &mut AuditSession) -> AuditResult<()> {
        let audit = session.bound_audit()?;
        validate_transition(&audit.id, audit.state, AuditTransition::Finalize)?;
        let id = audit.id.clone();
        let answers = AuditDraft::reconcile(session.draft.answers(), &session.categories)
            .into_answers();
        let update = AuditUpdate::Finalize {
            answers,
            at: Utc::now(),
        };
        let stored = self.audits.update_audit(&id, update).await.map_err(|e| {
            tracing::warn!("finalize of audit {} failed: {}", id, e);
            AuditError::from(e)
        })?;
        tracing::info!("finalized audit {}", id);
        session.draft =
            AuditDraft::new(stored.answers.clone()).with_max_units(session.draft.max_units());
        session.audit = Some(stored);
        Ok(())
    }

    /// Re-read the bound audit, discarding unsaved edits
    ///
    /// # Errors
    /// - `NoActiveAudit` if no audit is bound
    /// - Store failures
    pub async fn reload(&self, session: &mut AuditSession) -> AuditResult<()> {
        let id = session.bound_audit()?.id.clone();
        let audit = self.audits.get_audit(&id).await?;
        tracing::debug!("reloaded audit {}", id);
        session.draft = AuditDraft::reconcile(&audit.answers, &session.categories)
            .with_max_units(session.draft.max_units());
        session.audit = Some(audit);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::ports::{MockAuditStore, MockRecordStore};
    use secaudit_model::{CategoryAnswer, DetailField};

    fn in_progress(owner: &str, categories: &[&str]) -> Audit {
        let categories: Vec<String> = categories.iter().map(|c| (*c).to_string()).collect();
        NewAudit::for_categories(OwnerId::new(owner), &categories, Utc::now())
            .into_audit(AuditId::generate())
    }

    fn manager(audits: MockAuditStore) -> AuditSessionManager {
        AuditSessionManager::new(Arc::new(audits), Arc::new(MockRecordStore::new()))
    }

    fn session_for(audit: Audit) -> AuditSession {
        let categories: Vec<String> = audit.answers.keys().cloned().collect();
        let draft = AuditDraft::reconcile(&audit.answers, &categories);
        AuditSession {
            owner: audit.owner.clone(),
            catalog: CategoryCatalog::default(),
            categories,
            audit: Some(audit),
            draft,
        }
    }

    #[tokio::test]
    async fn empty_categories_defer_without_store_call() {
        let mut audits = MockAuditStore::new();
        audits.expect_find_or_create_audit().times(0);
        let resolution = manager(audits)
            .resolve_session(&OwnerId::new("u1"), &[])
            .await
            .unwrap();
        assert_eq!(resolution, SessionResolution::Deferred);
    }

    #[tokio::test]
    async fn resolve_goes_through_single_conditional_write() {
        let mut audits = MockAuditStore::new();
        audits.expect_find_audit().times(0);
        audits
            .expect_find_or_create_audit()
            .times(1)
            .returning(|new| Ok(new.into_audit(AuditId::generate())));
        let categories = vec!["Redes".to_string()];
        let resolution = manager(audits)
            .resolve_session(&OwnerId::new("u1"), &categories)
            .await
            .unwrap();
        let SessionResolution::Ready(audit) = resolution else {
            panic!("expected a ready session");
        };
        assert_eq!(audit.state, AuditState::InProgress);
        assert!(audit.answers.contains_key("Redes"));
    }

    #[tokio::test]
    async fn failed_save_leaves_draft_untouched() {
        let audit = in_progress("u1", &["Redes"]);
        let mut audits = MockAuditStore::new();
        audits
            .expect_update_audit()
            .times(1)
            .returning(|_, _| Err(StoreError::Unavailable("timeout".to_string())));
        let manager = manager(audits);
        let mut session = session_for(audit.clone());
        session.draft_mut().unwrap().set_count("Redes", 2).unwrap();
        let before = session.draft().clone();

        let err = manager.save_category(&mut session, "Redes").await.unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(session.draft(), &before);
        assert_eq!(session.audit(), Some(&audit));
    }

    #[tokio::test]
    async fn save_of_unknown_category_is_rejected_before_store() {
        let mut audits = MockAuditStore::new();
        audits.expect_update_audit().times(0);
        let mut session = session_for(in_progress("u1", &["Redes"]));
        let err = manager(audits)
            .save_category(&mut session, "Impresoras")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AuditError::ValidationFailed(ValidationError::UnknownCategory(_))
        ));
    }

    #[tokio::test]
    async fn save_sends_only_the_named_category() {
        let mut audits = MockAuditStore::new();
        audits
            .expect_update_audit()
            .withf(|_, update| {
                matches!(update, AuditUpdate::SaveCategory { category, answer, .. }
                    if category == "Redes" && answer.count() == 1)
            })
            .times(1)
            .returning(|id, update| {
                let mut audit = in_progress("u1", &["Redes", "Servidores"]);
                audit.id = id.clone();
                update.apply_to(&mut audit).map(|()| audit)
            });
        let mut session = session_for(in_progress("u1", &["Redes", "Servidores"]));
        let draft = session.draft_mut().unwrap();
        draft.set_count("Redes", 1).unwrap();
        draft.set_count("Servidores", 4).unwrap();

        manager(audits).save_category(&mut session, "Redes").await.unwrap();
        let stored = session.audit().unwrap();
        assert_eq!(stored.answers["Redes"].count(), 1);
        assert_eq!(stored.answers["Servidores"], CategoryAnswer::new());
        // unsaved edits stay in the draft
        assert_eq!(session.draft().category("Servidores").unwrap().count(), 4);
    }

    #[tokio::test]
    async fn unbound_session_has_no_active_audit() {
        let mut session = AuditSession {
            owner: OwnerId::new("u1"),
            catalog: CategoryCatalog::default(),
            categories: Vec::new(),
            audit: None,
            draft: AuditDraft::default(),
        };
        let manager = manager(MockAuditStore::new());
        assert!(matches!(
            manager.save_category(&mut session, "Redes").await,
            Err(AuditError::NoActiveAudit)
        ));
        assert!(matches!(manager.finalize(&mut session).await, Err(AuditError::NoActiveAudit)));
        assert!(matches!(manager.reload(&mut session).await, Err(AuditError::NoActiveAudit)));
    }

    #[tokio::test]
    async fn finalized_session_refuses_everything_but_reads() {
        let mut audit = in_progress("u1", &["Redes"]);
        audit.state = AuditState::Finalized;
        let mut audits = MockAuditStore::new();
        audits.expect_update_audit().times(0);
        let manager = manager(audits);
        let mut session = session_for(audit);

        assert!(matches!(
            manager.save_category(&mut session, "Redes").await,
            Err(AuditError::AuditLocked { .. })
        ));
        assert!(matches!(manager.finalize(&mut session).await, Err(AuditError::AuditLocked { .. })));
        assert!(matches!(session.draft_mut(), Err(AuditError::AuditLocked { .. })));
        assert!(session.draft().category("Redes").is_some());
    }

    #[tokio::test]
    async fn finalize_sends_full_draft_with_unsaved_edits() {
        let mut audits = MockAuditStore::new();
        audits
            .expect_update_audit()
            .withf(|_, update| {
                matches!(update, AuditUpdate::Finalize { answers, .. }
                    if answers["Redes"].details()[0].name == "ISR")
            })
            .times(1)
            .returning(|id, update| {
                let mut audit = in_progress("u1", &["Redes"]);
                audit.id = id.clone();
                update.apply_to(&mut audit).map(|()| audit)
            });
        let mut session = session_for(in_progress("u1", &["Redes"]));
        let draft = session.draft_mut().unwrap();
        draft.set_count("Redes", 1).unwrap();
        draft
            .set_detail_field("Redes", 0, DetailField::Name, "ISR".into())
            .unwrap();

        manager(audits).finalize(&mut session).await.unwrap();
        assert!(session.is_finalized());
        let stored = session.audit().unwrap();
        assert_eq!(stored.finalized_at, Some(stored.last_modified_at));
    }

    #[test]
    fn load_draft_matches_reconcile() {
        let audit = in_progress("u1", &["A"]);
        let categories = vec!["A".to_string(), "B".to_string()];
        let answers = AuditSessionManager::load_draft(&audit, &categories);
        assert_eq!(answers.keys().collect::<Vec<_>>(), vec!["A", "B"]);
    }
}
