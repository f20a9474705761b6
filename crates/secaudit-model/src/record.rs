//! Taxonomy records
//!
//! Five collections hold the reference taxonomies. Every record has an
//! opaque store id plus free-form fields whose shape the schema registry
//! describes.

use crate::error::ValidationError;
use crate::ids::RecordId;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;

/// Field map of a record
pub type Fields = serde_json::Map<String, Value>;

/// Reference collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CollectionKind {
    /// `Activos`
    #[serde(rename = "Activos")]
    Assets,
    /// `Amenazas`
    #[serde(rename = "Amenazas")]
    Threats,
    /// `Vulnerabilidades`
    #[serde(rename = "Vulnerabilidades")]
    Vulnerabilities,
    /// `Salvaguardas`
    #[serde(rename = "Salvaguardas")]
    Safeguards,
    /// `Relaciones`
    #[serde(rename = "Relaciones")]
    Relations,
}

impl CollectionKind {
    /// All collections, in admin navigation order
    pub const ALL: [Self; 5] = [
        Self::Assets,
        Self::Threats,
        Self::Vulnerabilities,
        Self::Safeguards,
        Self::Relations,
    ];

    /// Collection name in the store
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Assets => "Activos",
            Self::Threats => "Amenazas",
            Self::Vulnerabilities => "Vulnerabilidades",
            Self::Safeguards => "Salvaguardas",
            Self::Relations => "Relaciones",
        }
    }
}

impl std::fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CollectionKind {
    type Err = ValidationError;

    /// Case-insensitive, accepts the store name
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| ValidationError::UnknownCollection(s.to_string()))
    }
}

/// One taxonomy entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Opaque store id
    #[serde(rename = "_id")]
    pub id: RecordId,
    /// Schema-defined fields
    #[serde(flatten)]
    pub fields: Fields,
}

impl Record {
    /// Create record
    #[inline]
    #[must_use]
    pub fn new(id: RecordId, fields: Fields) -> Self {
        Self { id, fields }
    }

    /// Raw field value
    #[inline]
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Field value when it is a string
    #[inline]
    #[must_use]
    pub fn text(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(Value::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn collection_parse_is_case_insensitive() {
        assert_eq!("activos".parse::<CollectionKind>().unwrap(), CollectionKind::Assets);
        assert_eq!("Relaciones".parse::<CollectionKind>().unwrap(), CollectionKind::Relations);
        assert!(matches!(
            "users".parse::<CollectionKind>(),
            Err(ValidationError::UnknownCollection(_))
        ));
    }

    #[test]
    fn record_flattens_fields_next_to_id() {
        let record: Record = serde_json::from_value(json!({
            "_id": "65a1",
            "Nombre": "Firewall",
            "ID_Activos": 4
        }))
        .unwrap();
        assert_eq!(record.id.as_str(), "65a1");
        assert_eq!(record.text("Nombre"), Some("Firewall"));
        assert_eq!(record.get("ID_Activos"), Some(&json!(4)));
        assert!(!record.fields.contains_key("_id"));
    }
}
