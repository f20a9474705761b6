//! SecAudit Core
//!
//! Audit questionnaire lifecycle and administrative services.
//!
//! # Architecture
//!
//! ```text
//! Identity ──► AuditSessionManager ──► AuditSession (draft) ──save/finalize──► AuditStore
//!                     │
//!                     └── CategoryCatalog ◄── RecordStore (Activos)
//!
//! Identity ──► AdminGate ──► AdminContext ──► RecordEditor / AccountAdmin
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use secaudit_core::prelude::*;
//!
//! let store = Arc::new(MemoryStore::new());
//! let manager = AuditSessionManager::new(store.clone(), store.clone());
//! let mut session = manager.open(&identity).await?;
//! session.draft_mut()?.set_count("Servidores", 2)?;
//! manager.save_category(&mut session, "Servidores").await?;
//! manager.finalize(&mut session).await?;
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod access;
pub mod accounts;
pub mod catalog;
pub mod config;
pub mod draft;
pub mod editor;
pub mod error;
pub mod memory;
pub mod ports;
pub mod session;
pub mod state;

pub use access::{AdminContext, AdminGate};
pub use accounts::{AccountAdmin, AccountSummary};
pub use catalog::{CategoryCatalog, NamedAsset};
pub use config::{AccessPolicy, AuditConfig, QuestionnaireConfig};
pub use draft::{AuditDraft, Progress};
pub use editor::{RecordEditor, SubmitOutcome};
pub use error::{AuditError, AuditResult, StoreError};
pub use memory::MemoryStore;
pub use ports::{
    AuditStore, AuditUpdate, AuthorizationService, IdentityProvider, RecordStore, UserDirectory,
};
pub use session::{AuditSession, AuditSessionManager, SessionResolution};
pub use state::{allowed_transitions, validate_transition, AuditTransition};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        AdminContext, AdminGate, AuditConfig, AuditError, AuditResult, AuditSession,
        AuditSessionManager, AuditStore, MemoryStore, RecordEditor, RecordStore,
        SessionResolution,
    };
    pub use secaudit_model::{CollectionKind, DetailField, Identity};
    pub use std::sync::Arc;
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
