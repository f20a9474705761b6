//! SecAudit taxonomy schemas
//!
//! Declarative description of the five reference collections and the form
//! model used to create and edit their records:
//! - [`FieldKind`] tags every field (scalar, composite, fixed slots, reference, sequential id)
//! - [`SchemaRegistry`] holds one [`CollectionSchema`] per collection
//! - [`RecordForm`] applies [`FieldEdit`]s by dispatching on the field kind

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod field;
pub mod form;
pub mod registry;
pub mod schema;
pub mod value;

pub use field::{CompositePart, FieldDef, FieldKind, OptionSource, ScalarKind};
pub use form::{EditOutcome, FieldEdit, FieldPath, FormMode, RecordForm, ReferenceOption};
pub use registry::{reference_options, SchemaRegistry};
pub use schema::{CollectionSchema, ListOrder};
pub use value::{parse_integer, FieldValue, RefKey};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
