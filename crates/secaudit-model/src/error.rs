//! Validation errors
//!
//! Raised whenever a value violates the shape declared for it: questionnaire
//! detail fields, schema-driven record fields, or a write the store refused.

/// Field or value shape violation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Collection name not known to the registry
    #[error("unknown collection: {0}")]
    UnknownCollection(String),

    /// Field not declared by the collection schema
    #[error("unknown field {field} in {collection}")]
    UnknownField { collection: String, field: String },

    /// Sub-key not declared by a composite field
    #[error("unknown part {part} of field {field}")]
    UnknownPart { field: String, part: String },

    /// Category not part of the current questionnaire
    #[error("unknown category: {0}")]
    UnknownCategory(String),

    /// Questionnaire detail field name not recognised
    #[error("unknown detail field: {0}")]
    UnknownDetailField(String),

    /// Edit does not fit the field's kind
    #[error("field {field} expects {expected}")]
    ShapeMismatch { field: String, expected: &'static str },

    /// Field is assigned once and never edited afterwards
    #[error("field {0} is read-only")]
    ReadOnlyField(String),

    /// Numeric value outside its declared bounds
    #[error("{field} must be within {min}..={max}, got {value}")]
    OutOfRange {
        field: String,
        min: i64,
        max: i64,
        value: i64,
    },

    /// Value is not one of the selectable options
    #[error("{value:?} is not a valid option for {field}")]
    NotAnOption { field: String, value: String },

    /// Required field left empty
    #[error("field {0} is required")]
    MissingRequired(String),

    /// Store rejected the payload
    #[error("rejected by store: {0}")]
    Rejected(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_range_display() {
        let err = ValidationError::OutOfRange {
            field: "criticidad".to_string(),
            min: 1,
            max: 5,
            value: 9,
        };
        assert_eq!(err.to_string(), "criticidad must be within 1..=5, got 9");
    }

    #[test]
    fn read_only_display() {
        let err = ValidationError::ReadOnlyField("ID_Activos".to_string());
        assert!(err.to_string().contains("read-only"));
    }
}
