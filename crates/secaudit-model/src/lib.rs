//! SecAudit data model
//!
//! Types shared by every layer of the audit intake system:
//! - [`Audit`] and its questionnaire answers ([`CategoryAnswer`], [`UnitDetail`])
//! - Taxonomy [`Record`]s keyed by [`CollectionKind`]
//! - Caller identities and administered [`UserAccount`]s
//! - [`ValidationError`] for shape violations detected anywhere in the stack

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod audit;
pub mod error;
pub mod identity;
pub mod ids;
pub mod record;

pub use audit::{
    check_unit_count, Answers, Audit, AuditState, CategoryAnswer, Criticality, DetailField,
    DetailValue, NewAudit, RespondentProfile, UnitDetail,
};
pub use error::ValidationError;
pub use identity::{Identity, Role, UserAccount, UserUpdate};
pub use ids::{AuditId, OwnerId, RecordId};
pub use record::{CollectionKind, Fields, Record};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
