//! Typed field values
//!
//! Stored records are loose JSON. [`FieldValue::from_json`] reads them
//! leniently into the shape the field kind declares, and
//! [`FieldValue::to_json`] writes that shape back.

use crate::field::{FieldKind, OptionSource, ScalarKind};
use indexmap::IndexMap;
use secaudit_model::{CollectionKind, RecordId};
use serde_json::{Map, Value};

/// Key of a referenced record
///
/// The human-visible sequential id when the target has one, otherwise the
/// opaque store id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RefKey {
    /// Sequential id
    Human(i64),
    /// Store id
    Store(RecordId),
}

impl RefKey {
    /// Parse a stored or submitted reference
    ///
    /// Numeric strings become [`RefKey::Human`] only when the target
    /// collection is keyed by a sequential id; otherwise strings are store ids
    /// kept as written.
    #[must_use]
    pub fn from_json(value: &Value, human_keyed: bool) -> Option<Self> {
        match value {
            Value::Number(_) => value.as_i64().map(Self::Human),
            Value::String(s) if s.trim().is_empty() => None,
            Value::String(s) if human_keyed => Some(
                s.trim()
                    .parse::<i64>()
                    .map_or_else(|_| Self::Store(RecordId::new(s.clone())), Self::Human),
            ),
            Value::String(s) => Some(Self::Store(RecordId::new(s.clone()))),
            _ => None,
        }
    }

    /// Check if a submitted value designates this key
    ///
    /// `3` and `"3"` both match `Human(3)`; `"123456"` and `123456` both match
    /// the store id `"123456"`.
    #[must_use]
    pub fn matches(&self, raw: &Value) -> bool {
        match (self, raw) {
            (Self::Human(n), Value::Number(_)) => raw.as_i64() == Some(*n),
            (Self::Human(n), Value::String(s)) => s.trim().parse::<i64>().ok() == Some(*n),
            (Self::Store(id), Value::String(s)) => id.as_str() == s,
            (Self::Store(id), Value::Number(n)) => id.as_str() == n.to_string(),
            _ => false,
        }
    }

    /// Stored form
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Human(n) => Value::from(*n),
            Self::Store(id) => Value::from(id.as_str()),
        }
    }
}

impl std::fmt::Display for RefKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Human(n) => write!(f, "{n}"),
            Self::Store(id) => write!(f, "{id}"),
        }
    }
}

/// Value of one field in a form
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    /// Text scalar
    Text(String),
    /// Integer scalar, unset until entered
    Integer(Option<i64>),
    /// Selected option
    Choice(Option<String>),
    /// Sub-key values, in declaration order
    Composite(IndexMap<String, FieldValue>),
    /// Slot contents, one entry per slot
    ///
    /// Collection-sourced slots hold the referenced record's key; fixed
    /// option lists are keyed by the option text.
    Slots(Vec<Option<RefKey>>),
    /// Selected referenced record
    Reference(Option<RefKey>),
    /// Assigned human id
    SequentialId(Option<i64>),
}

/// Leading integer of a JSON number or string
///
/// `"12"` and `" 7 units"` parse; `"abc"`, booleans and fractional numbers do
/// not.
#[must_use]
pub fn parse_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => {
            let s = s.trim_start();
            let (sign, digits) = match s.strip_prefix('-') {
                Some(rest) => (-1, rest),
                None => (1, s.strip_prefix('+').unwrap_or(s)),
            };
            let end = digits
                .char_indices()
                .find(|(_, c)| !c.is_ascii_digit())
                .map_or(digits.len(), |(i, _)| i);
            digits[..end].parse::<i64>().ok().map(|n| sign * n)
        }
        _ => None,
    }
}

fn scalar_default(kind: &ScalarKind) -> FieldValue {
    match kind {
        ScalarKind::Text => FieldValue::Text(String::new()),
        ScalarKind::Integer { .. } => FieldValue::Integer(None),
        ScalarKind::Choice(_) => FieldValue::Choice(None),
    }
}

fn scalar_from_json(kind: &ScalarKind, raw: Option<&Value>) -> FieldValue {
    match (kind, raw) {
        (ScalarKind::Text, Some(Value::String(s))) => FieldValue::Text(s.clone()),
        (ScalarKind::Text, Some(Value::Number(n))) => FieldValue::Text(n.to_string()),
        (ScalarKind::Integer { .. }, Some(v)) => FieldValue::Integer(parse_integer(v)),
        (ScalarKind::Choice(_), Some(Value::String(s))) if !s.is_empty() => {
            FieldValue::Choice(Some(s.clone()))
        }
        (kind, _) => scalar_default(kind),
    }
}

impl FieldValue {
    /// Empty value for a field kind
    #[must_use]
    pub fn default_for(kind: &FieldKind) -> Self {
        match kind {
            FieldKind::Scalar(scalar) => scalar_default(scalar),
            FieldKind::Composite(parts) => Self::Composite(
                parts
                    .iter()
                    .map(|p| (p.key.clone(), scalar_default(&p.kind)))
                    .collect(),
            ),
            FieldKind::FixedSlots { slots, .. } => Self::Slots(vec![None; *slots]),
            FieldKind::Reference { .. } => Self::Reference(None),
            FieldKind::SequentialId => Self::SequentialId(None),
        }
    }

    /// Read a stored value into the shape `kind` declares
    ///
    /// `human_keyed` tells whether a referenced collection is keyed by a
    /// sequential id. Missing or mistyped data falls back to the empty value
    /// rather than failing; records predating a schema change must still open.
    #[must_use]
    pub fn from_json(
        kind: &FieldKind,
        raw: Option<&Value>,
        human_keyed: &dyn Fn(CollectionKind) -> bool,
    ) -> Self {
        match kind {
            FieldKind::Scalar(scalar) => scalar_from_json(scalar, raw),
            FieldKind::Composite(parts) => {
                let obj = raw.and_then(Value::as_object);
                Self::Composite(
                    parts
                        .iter()
                        .map(|p| {
                            let sub = obj.and_then(|o| o.get(&p.key));
                            (p.key.clone(), scalar_from_json(&p.kind, sub))
                        })
                        .collect(),
                )
            }
            FieldKind::FixedSlots { slots, source } => {
                let key_of = |item: &Value| match source {
                    OptionSource::Fixed(_) => item
                        .as_str()
                        .filter(|s| !s.is_empty())
                        .map(|s| RefKey::Store(RecordId::new(s))),
                    OptionSource::Collection(target) => {
                        RefKey::from_json(item, human_keyed(*target))
                    }
                };
                let mut values = vec![None; *slots];
                match raw {
                    Some(Value::Object(obj)) => {
                        for (i, slot) in values.iter_mut().enumerate() {
                            *slot = obj.get(&(i + 1).to_string()).and_then(key_of);
                        }
                    }
                    Some(Value::Array(items)) => {
                        for (slot, item) in values.iter_mut().zip(items) {
                            *slot = key_of(item);
                        }
                    }
                    _ => {}
                }
                Self::Slots(values)
            }
            FieldKind::Reference { target } => {
                Self::Reference(raw.and_then(|v| RefKey::from_json(v, human_keyed(*target))))
            }
            FieldKind::SequentialId => Self::SequentialId(raw.and_then(parse_integer)),
        }
    }

    /// Stored form
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Text(s) => Value::from(s.as_str()),
            Self::Integer(n) | Self::SequentialId(n) => n.map_or(Value::Null, Value::from),
            Self::Choice(c) => c.as_deref().map_or(Value::Null, Value::from),
            Self::Composite(parts) => Value::Object(
                parts
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect::<Map<String, Value>>(),
            ),
            Self::Slots(slots) => Value::Object(
                slots
                    .iter()
                    .enumerate()
                    .map(|(i, s)| {
                        let v = s.as_ref().map_or(Value::Null, RefKey::to_json);
                        ((i + 1).to_string(), v)
                    })
                    .collect(),
            ),
            Self::Reference(r) => r.as_ref().map_or(Value::Null, RefKey::to_json),
        }
    }

    /// Check if nothing has been entered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(s) => s.trim().is_empty(),
            Self::Integer(n) | Self::SequentialId(n) => n.is_none(),
            Self::Choice(c) => c.is_none(),
            Self::Composite(parts) => parts.values().all(Self::is_empty),
            Self::Slots(slots) => slots.iter().all(Option::is_none),
            Self::Reference(r) => r.is_none(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::CompositePart;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn slots_kind() -> FieldKind {
        FieldKind::FixedSlots {
            slots: 3,
            source: OptionSource::Collection(CollectionKind::Assets),
        }
    }

    fn assets_by_human_id(kind: CollectionKind) -> bool {
        kind == CollectionKind::Assets
    }

    fn store(id: &str) -> Option<RefKey> {
        Some(RefKey::Store(RecordId::new(id)))
    }

    #[test]
    fn parse_integer_accepts_numbers_and_leading_digits() {
        assert_eq!(parse_integer(&json!(4)), Some(4));
        assert_eq!(parse_integer(&json!("12")), Some(12));
        assert_eq!(parse_integer(&json!(" 7 units")), Some(7));
        assert_eq!(parse_integer(&json!("-3")), Some(-3));
        assert_eq!(parse_integer(&json!("abc")), None);
        assert_eq!(parse_integer(&json!(2.5)), None);
        assert_eq!(parse_integer(&json!(true)), None);
    }

    #[test]
    fn slots_load_from_object_and_array() {
        let from_obj = FieldValue::from_json(
            &slots_kind(),
            Some(&json!({"1": 4, "3": "7"})),
            &assets_by_human_id,
        );
        assert_eq!(
            from_obj,
            FieldValue::Slots(vec![Some(RefKey::Human(4)), None, Some(RefKey::Human(7))])
        );

        let from_arr =
            FieldValue::from_json(&slots_kind(), Some(&json!(["a1f0", ""])), &assets_by_human_id);
        assert_eq!(from_arr, FieldValue::Slots(vec![store("a1f0"), None, None]));
    }

    #[test]
    fn fixed_slots_keep_option_text() {
        let kind = FieldKind::FixedSlots {
            slots: 2,
            source: OptionSource::Fixed(vec!["12".into()]),
        };
        let value = FieldValue::from_json(&kind, Some(&json!(["12"])), &|_| true);
        assert_eq!(value, FieldValue::Slots(vec![store("12"), None]));
        assert_eq!(value.to_json(), json!({"1": "12", "2": null}));
    }

    #[test]
    fn slots_store_keys_as_numbered_object() {
        let value = FieldValue::Slots(vec![Some(RefKey::Human(3)), None, store("a1f0")]);
        assert_eq!(value.to_json(), json!({"1": 3, "2": null, "3": "a1f0"}));
    }

    #[test]
    fn composite_fills_missing_parts() {
        let kind = FieldKind::Composite(vec![
            CompositePart::new("Integridad", ScalarKind::Integer { min: 1, max: 5 }),
            CompositePart::new("Disponibilidad", ScalarKind::Integer { min: 1, max: 5 }),
        ]);
        let value = FieldValue::from_json(&kind, Some(&json!({"Integridad": "4"})), &|_| true);
        assert_eq!(value.to_json(), json!({"Integridad": 4, "Disponibilidad": null}));
        assert!(!value.is_empty());
        assert!(FieldValue::default_for(&kind).is_empty());
    }

    #[test]
    fn ref_key_parse_follows_target_keying() {
        assert_eq!(RefKey::from_json(&json!(3), true), Some(RefKey::Human(3)));
        assert_eq!(RefKey::from_json(&json!("3"), true), Some(RefKey::Human(3)));
        assert_eq!(RefKey::from_json(&json!("65a1f0"), true), store("65a1f0"));
        assert_eq!(RefKey::from_json(&json!("123456"), false), store("123456"));
        assert_eq!(RefKey::from_json(&json!(""), true), None);
        assert_eq!(RefKey::Human(3).to_string(), "3");
    }

    #[test]
    fn store_keyed_reference_round_trips_as_string() {
        let kind = FieldKind::Reference {
            target: CollectionKind::Vulnerabilities,
        };
        let value = FieldValue::from_json(&kind, Some(&json!("123456")), &assets_by_human_id);
        assert_eq!(value, FieldValue::Reference(store("123456")));
        assert_eq!(value.to_json(), json!("123456"));
    }

    #[test]
    fn ref_key_matches_either_spelling() {
        assert!(RefKey::Human(3).matches(&json!(3)));
        assert!(RefKey::Human(3).matches(&json!(" 3")));
        assert!(!RefKey::Human(3).matches(&json!("3a")));
        let id = RefKey::Store(RecordId::new("123456"));
        assert!(id.matches(&json!("123456")));
        assert!(id.matches(&json!(123456)));
        assert!(!id.matches(&json!(null)));
    }

    #[test]
    fn mistyped_stored_text_falls_back_to_empty() {
        let kind = FieldKind::Scalar(ScalarKind::Text);
        let text = |raw: serde_json::Value| FieldValue::from_json(&kind, Some(&raw), &|_| true);
        assert_eq!(text(json!([1])), FieldValue::Text(String::new()));
        assert_eq!(text(json!(12)), FieldValue::Text("12".into()));
    }
}
