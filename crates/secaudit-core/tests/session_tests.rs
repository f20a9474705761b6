//! Functional tests for the audit questionnaire lifecycle.
//!
//! Core guarantees exercised here:
//! - One audit per owner, resolved through a single find-or-create.
//! - Per-category saves persist exactly one category.
//! - Finalization is terminal: the stored audit never changes afterwards.
//! - Reconciliation picks up categories added after the audit was created
//!   without losing saved answers.

use pretty_assertions::assert_eq;
use secaudit_core::{
    AuditError, AuditSessionManager, AuditStore, MemoryStore, QuestionnaireConfig, RecordStore,
    SessionResolution,
};
use secaudit_model::{
    AuditState, CategoryAnswer, CollectionKind, DetailField, DetailValue, OwnerId, UnitDetail,
    ValidationError,
};
use secaudit_test_utils::{asset, respondent, seeded_store, FlakyAuditStore};
use std::sync::Arc;

fn manager_over(store: &Arc<MemoryStore>) -> AuditSessionManager {
    AuditSessionManager::new(store.clone(), store.clone())
}

/// Scenario A: first resolution creates an empty in-progress audit.
#[tokio::test]
async fn resolve_creates_empty_in_progress_audit() {
    let store = Arc::new(MemoryStore::new());
    let categories = vec!["Redes".to_string(), "Servidores".to_string()];
    let resolution = manager_over(&store)
        .resolve_session(&OwnerId::new("u1"), &categories)
        .await
        .unwrap();

    let SessionResolution::Ready(audit) = resolution else {
        panic!("expected a ready session");
    };
    assert_eq!(audit.state, AuditState::InProgress);
    assert_eq!(audit.answers.len(), 2);
    assert_eq!(audit.answers["Redes"], CategoryAnswer::new());
    assert_eq!(audit.answers["Servidores"], CategoryAnswer::new());
}

/// Two concurrent opens for the same owner bind the same audit.
#[tokio::test]
async fn concurrent_opens_share_one_audit() {
    let store = seeded_store();
    let manager = manager_over(&store);
    let identity = respondent("u1");
    let (a, b) = tokio::join!(manager.open(&identity), manager.open(&identity));
    assert_eq!(a.unwrap().audit_id(), b.unwrap().audit_id());
    assert_eq!(store.audits_of(&OwnerId::new("u1")).len(), 1);
}

/// Open derives categories from assets and snapshots the respondent.
#[tokio::test]
async fn open_builds_session_from_asset_catalog() {
    let store = seeded_store();
    let session = manager_over(&store).open(&respondent("u1")).await.unwrap();

    assert_eq!(session.categories(), ["Servidores", "Redes", "Portátil"]);
    assert_eq!(session.draft().answers().len(), 3);
    assert!(!session.catalog().asks_provider("Portátil"));
    let stored = session.audit().unwrap();
    assert_eq!(stored.respondent.as_ref().unwrap().company, "No especificada");
}

/// No assets means no categories: the session is deferred and nothing is stored.
#[tokio::test]
async fn open_without_assets_is_deferred() {
    let store = Arc::new(MemoryStore::new());
    let mut session = manager_over(&store).open(&respondent("u1")).await.unwrap();
    assert!(session.audit().is_none());
    assert_eq!(store.audit_count(), 0);
    assert!(session.draft_mut().is_ok());
    assert!(matches!(
        manager_over(&store).finalize(&mut session).await,
        Err(AuditError::NoActiveAudit)
    ));
}

/// Scenario B: count change plus detail edit, then save of that category only.
#[tokio::test]
async fn save_category_persists_one_category() {
    let store = seeded_store();
    let manager = manager_over(&store);
    let mut session = manager.open(&respondent("u1")).await.unwrap();

    let draft = session.draft_mut().unwrap();
    draft.set_count("Redes", 2).unwrap();
    draft
        .set_detail_field("Redes", 0, DetailField::Criticality, DetailValue::Level(5))
        .unwrap();
    draft.set_count("Servidores", 3).unwrap();
    manager.save_category(&mut session, "Redes").await.unwrap();

    let stored = store.get_audit(session.audit_id().unwrap()).await.unwrap();
    let redes = &stored.answers["Redes"];
    assert_eq!(redes.count(), 2);
    assert_eq!(redes.details()[0].criticality.value(), 5);
    assert_eq!(redes.details()[1], UnitDetail::default());
    assert_eq!(stored.answers["Servidores"], CategoryAnswer::new());
    assert!(stored.last_modified_at >= stored.created_at);
}

/// Scenario C: after finalize, saves fail and the stored audit is frozen.
#[tokio::test]
async fn finalize_locks_the_audit() {
    let store = seeded_store();
    let manager = manager_over(&store);
    let mut session = manager.open(&respondent("u1")).await.unwrap();
    session.draft_mut().unwrap().set_count("Redes", 1).unwrap();
    manager.finalize(&mut session).await.unwrap();

    let id = session.audit_id().unwrap().clone();
    let frozen = store.get_audit(&id).await.unwrap();
    assert_eq!(frozen.state, AuditState::Finalized);
    assert_eq!(frozen.answers["Redes"].count(), 1);
    assert!(frozen.finalized_at.is_some());

    assert!(matches!(
        manager.save_category(&mut session, "Redes").await,
        Err(AuditError::AuditLocked { .. })
    ));
    assert!(matches!(
        manager.finalize(&mut session).await,
        Err(AuditError::AuditLocked { .. })
    ));
    assert!(matches!(session.draft_mut(), Err(AuditError::AuditLocked { .. })));
    assert_eq!(store.get_audit(&id).await.unwrap(), frozen);

    // reopening binds the finalized audit read-only
    let reopened = manager.open(&respondent("u1")).await.unwrap();
    assert!(reopened.is_finalized());
    assert_eq!(store.audit_count(), 1);
}

/// Scenario D: a category added later is merged in, saved answers survive.
#[tokio::test]
async fn new_category_is_merged_on_reopen() {
    let store = seeded_store();
    let manager = manager_over(&store);
    let mut session = manager.open(&respondent("u1")).await.unwrap();
    session.draft_mut().unwrap().set_count("Redes", 2).unwrap();
    manager.save_category(&mut session, "Redes").await.unwrap();

    store
        .create_record(CollectionKind::Assets, asset(9, "Nubes", "S3", "AWS").fields)
        .await
        .unwrap();

    let reopened = manager.open(&respondent("u1")).await.unwrap();
    assert_eq!(reopened.audit_id(), session.audit_id());
    let answers = reopened.draft().answers();
    assert_eq!(answers["Nubes"], CategoryAnswer::new());
    assert_eq!(answers["Redes"].count(), 2);
    assert_eq!(answers.len(), 4);
}

/// A failed save surfaces the store error and leaves the draft as it was.
#[tokio::test]
async fn failed_save_is_not_retried_and_keeps_draft() {
    let store = seeded_store();
    let flaky = Arc::new(FlakyAuditStore::new(store.clone()));
    let manager = AuditSessionManager::new(flaky.clone(), store.clone());
    let mut session = manager.open(&respondent("u1")).await.unwrap();
    session.draft_mut().unwrap().set_count("Redes", 1).unwrap();
    let before = session.draft().clone();

    flaky.fail_next_updates(1);
    let err = manager.save_category(&mut session, "Redes").await.unwrap_err();
    assert!(err.is_retryable());
    assert_eq!(flaky.updates(), 0);
    assert_eq!(session.draft(), &before);

    manager.save_category(&mut session, "Redes").await.unwrap();
    assert_eq!(flaky.updates(), 1);
}

/// A failed finalize leaves the draft and the stored audit as they were.
#[tokio::test]
async fn failed_finalize_keeps_audit_in_progress() {
    let store = seeded_store();
    let flaky = Arc::new(FlakyAuditStore::new(store.clone()));
    let manager = AuditSessionManager::new(flaky.clone(), store.clone());
    let mut session = manager.open(&respondent("u1")).await.unwrap();
    session.draft_mut().unwrap().set_count("Redes", 2).unwrap();
    let before = session.draft().clone();

    flaky.fail_next_updates(1);
    let err = manager.finalize(&mut session).await.unwrap_err();
    assert!(matches!(err, AuditError::StoreUnavailable(_)));
    assert!(!session.is_finalized());
    assert_eq!(session.draft(), &before);
    assert!(session.draft_mut().is_ok());

    let stored = store
        .find_audit(&OwnerId::new("u1"))
        .await
        .unwrap()
        .expect("audit exists");
    assert_eq!(stored.state, AuditState::InProgress);
    assert!(stored.finalized_at.is_none());
    assert_eq!(stored.answers["Redes"], CategoryAnswer::new());

    manager.finalize(&mut session).await.unwrap();
    assert!(session.is_finalized());
    let stored = flaky.find_audit(&OwnerId::new("u1")).await.unwrap().unwrap();
    assert_eq!(stored.state, AuditState::Finalized);
    assert_eq!(stored.answers["Redes"].count(), 2);
    assert_eq!(flaky.updates(), 1);
}

/// The configured unit cap bounds counts entered through the session.
#[tokio::test]
async fn unit_cap_comes_from_config() {
    let store = seeded_store();
    let config = QuestionnaireConfig {
        max_units: 3,
        ..QuestionnaireConfig::default()
    };
    let manager = manager_over(&store).with_config(config);
    let mut session = manager.open(&respondent("u1")).await.unwrap();

    let draft = session.draft_mut().unwrap();
    assert!(draft.set_count("Redes", 3).unwrap());
    assert!(matches!(
        draft.set_count("Redes", 4),
        Err(ValidationError::OutOfRange { max: 3, value: 4, .. })
    ));
    assert_eq!(session.draft().category("Redes").unwrap().count(), 3);

    manager.save_category(&mut session, "Redes").await.unwrap();
    manager.reload(&mut session).await.unwrap();
    assert_eq!(session.draft().max_units(), 3);
}

/// Reload discards unsaved local edits.
#[tokio::test]
async fn reload_discards_unsaved_edits() {
    let store = seeded_store();
    let manager = manager_over(&store);
    let mut session = manager.open(&respondent("u1")).await.unwrap();
    session.draft_mut().unwrap().set_count("Redes", 2).unwrap();
    manager.save_category(&mut session, "Redes").await.unwrap();
    session.draft_mut().unwrap().set_count("Redes", 7).unwrap();

    manager.reload(&mut session).await.unwrap();
    assert_eq!(session.draft().category("Redes").unwrap().count(), 2);
}
