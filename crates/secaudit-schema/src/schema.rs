//! Collection schemas

use crate::field::{FieldDef, FieldKind};
use crate::value::parse_integer;
use secaudit_model::{CollectionKind, Record};

/// How a collection's records are ordered in listings
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListOrder {
    /// Ascending by the named sequential id field
    ByHumanId(String),
    /// As returned by the store
    StoreOrder,
}

/// Field layout of one collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionSchema {
    /// Collection
    pub kind: CollectionKind,
    /// Fields in form order
    pub fields: Vec<FieldDef>,
}

impl CollectionSchema {
    /// Create schema
    #[must_use]
    pub fn new(kind: CollectionKind, fields: Vec<FieldDef>) -> Self {
        Self { kind, fields }
    }

    /// Field by name
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Name of the sequential id field, if the collection has one
    #[must_use]
    pub fn human_id_field(&self) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| matches!(f.kind, FieldKind::SequentialId))
            .map(|f| f.name.as_str())
    }

    /// Listing order
    #[must_use]
    pub fn list_order(&self) -> ListOrder {
        self.human_id_field()
            .map_or(ListOrder::StoreOrder, |f| ListOrder::ByHumanId(f.to_string()))
    }

    /// Parsed human id of `record`
    #[must_use]
    pub fn human_id_of(&self, record: &Record) -> Option<i64> {
        self.human_id_field()
            .and_then(|f| record.get(f))
            .and_then(parse_integer)
    }

    /// Sort for listing
    ///
    /// Stable; records without a parseable id sort as 0.
    pub fn sort_records(&self, records: &mut [Record]) {
        if self.human_id_field().is_some() {
            records.sort_by_key(|r| self.human_id_of(r).unwrap_or(0));
        }
    }
}
