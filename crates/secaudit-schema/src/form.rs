//! Record forms
//!
//! A [`RecordForm`] is the editable state behind a create or update of one
//! taxonomy record. Edits are addressed by [`FieldPath`] and dispatched on
//! the field's declared kind.

use crate::field::{FieldKind, OptionSource, ScalarKind};
use crate::schema::CollectionSchema;
use crate::value::{parse_integer, FieldValue, RefKey};
use indexmap::IndexMap;
use secaudit_model::{CollectionKind, Fields, RecordId, ValidationError};
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};
use std::str::FromStr;
use std::sync::Arc;

/// Whether the form creates or updates
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormMode {
    /// New record
    Create,
    /// Existing record
    Update(RecordId),
}

/// Address of an edit: a field, or one part of a composite field
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldPath {
    /// Field name
    pub field: String,
    /// Composite sub-key
    pub part: Option<String>,
}

impl FieldPath {
    /// Whole field
    #[must_use]
    pub fn field(name: impl Into<String>) -> Self {
        Self {
            field: name.into(),
            part: None,
        }
    }

    /// Composite sub-key
    #[must_use]
    pub fn part(name: impl Into<String>, part: impl Into<String>) -> Self {
        Self {
            field: name.into(),
            part: Some(part.into()),
        }
    }
}

impl FromStr for FieldPath {
    type Err = std::convert::Infallible;

    /// `Field` or `Field.part`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.split_once('.') {
            Some((field, part)) => Self::part(field, part),
            None => Self::field(s),
        })
    }
}

impl std::fmt::Display for FieldPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.part {
            Some(part) => write!(f, "{}.{part}", self.field),
            None => f.write_str(&self.field),
        }
    }
}

/// One edit
#[derive(Debug, Clone, PartialEq)]
pub enum FieldEdit {
    /// Replace a scalar, composite part or reference
    Set(Value),
    /// Add an option to a multi-slot field
    Select(String),
    /// Remove an option from a multi-slot field
    Deselect(String),
}

/// Result of an accepted edit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    /// Form state changed
    Applied,
    /// Accepted but nothing to do (slots full, option already selected)
    Unchanged,
}

/// Selectable referenced record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceOption {
    /// Stored key
    pub value: RefKey,
    /// Display label
    pub label: String,
}

/// Editable state of one record
#[derive(Debug, Clone)]
pub struct RecordForm {
    schema: Arc<CollectionSchema>,
    mode: FormMode,
    values: IndexMap<String, FieldValue>,
    read_only: BTreeSet<String>,
    options: HashMap<CollectionKind, Vec<ReferenceOption>>,
}

impl RecordForm {
    pub(crate) fn new(
        schema: Arc<CollectionSchema>,
        mode: FormMode,
        values: IndexMap<String, FieldValue>,
    ) -> Self {
        let read_only = schema
            .fields
            .iter()
            .filter(|f| matches!(f.kind, FieldKind::SequentialId))
            .map(|f| f.name.clone())
            .collect();
        Self {
            schema,
            mode,
            values,
            read_only,
            options: HashMap::new(),
        }
    }

    /// Target collection
    #[must_use]
    pub fn collection(&self) -> CollectionKind {
        self.schema.kind
    }

    /// Schema backing the form
    #[must_use]
    pub fn schema(&self) -> &CollectionSchema {
        &self.schema
    }

    /// Create or update
    #[must_use]
    pub fn mode(&self) -> &FormMode {
        &self.mode
    }

    /// Current value of a field
    #[must_use]
    pub fn value(&self, field: &str) -> Option<&FieldValue> {
        self.values.get(field)
    }

    /// All values in form order
    #[must_use]
    pub fn values(&self) -> &IndexMap<String, FieldValue> {
        &self.values
    }

    /// Check if a field rejects edits
    #[must_use]
    pub fn is_read_only(&self, field: &str) -> bool {
        self.read_only.contains(field)
    }

    /// Collections whose records must be loaded as options
    #[must_use]
    pub fn referenced_collections(&self) -> Vec<CollectionKind> {
        let mut kinds: Vec<_> = self
            .schema
            .fields
            .iter()
            .filter_map(|f| f.kind.referenced_collection())
            .collect();
        kinds.sort();
        kinds.dedup();
        kinds
    }

    /// Install loaded options for a referenced collection
    pub fn set_options(&mut self, kind: CollectionKind, options: Vec<ReferenceOption>) {
        self.options.insert(kind, options);
    }

    /// Options offered for a reference or multi-slot field
    #[must_use]
    pub fn options_for(&self, field: &str) -> Vec<ReferenceOption> {
        match self.schema.field(field).map(|f| &f.kind) {
            Some(FieldKind::FixedSlots {
                source: OptionSource::Fixed(options),
                ..
            }) => options
                .iter()
                .map(|o| ReferenceOption {
                    value: RefKey::Store(RecordId::new(o.clone())),
                    label: o.clone(),
                })
                .collect(),
            Some(kind) => kind
                .referenced_collection()
                .and_then(|k| self.options.get(&k))
                .cloned()
                .unwrap_or_default(),
            None => Vec::new(),
        }
    }

    /// Apply one edit
    ///
    /// # Errors
    /// - `UnknownField` / `UnknownPart` for an address the schema does not declare
    /// - `ReadOnlyField` for the sequential id
    /// - `ShapeMismatch` when the edit does not fit the field kind
    /// - `OutOfRange` / `NotAnOption` for values outside the field's domain
    pub fn apply_field_edit(
        &mut self,
        path: &FieldPath,
        edit: FieldEdit,
    ) -> Result<EditOutcome, ValidationError> {
        let def = self
            .schema
            .field(&path.field)
            .ok_or_else(|| ValidationError::UnknownField {
                collection: self.schema.kind.to_string(),
                field: path.field.clone(),
            })?;
        if self.read_only.contains(&def.name) {
            return Err(ValidationError::ReadOnlyField(def.name.clone()));
        }
        let mismatch = || ValidationError::ShapeMismatch {
            field: path.to_string(),
            expected: def.kind.describe(),
        };

        let new_value = match (&def.kind, &path.part, edit) {
            (FieldKind::Scalar(scalar), None, FieldEdit::Set(raw)) => {
                coerce_scalar(&def.name, scalar, &raw)?
            }
            (FieldKind::Composite(parts), Some(part), FieldEdit::Set(raw)) => {
                let spec = parts.iter().find(|p| &p.key == part).ok_or_else(|| {
                    ValidationError::UnknownPart {
                        field: def.name.clone(),
                        part: part.clone(),
                    }
                })?;
                let coerced = coerce_scalar(&path.to_string(), &spec.kind, &raw)?;
                let mut current = match self.values.get(&def.name) {
                    Some(FieldValue::Composite(map)) => map.clone(),
                    _ => IndexMap::new(),
                };
                current.insert(part.clone(), coerced);
                FieldValue::Composite(current)
            }
            (FieldKind::FixedSlots { slots, .. }, None, FieldEdit::Select(option)) => {
                let key = self.resolve_slot_option(&def.name, &def.kind, &option)?;
                let mut current = self.slots_of(&def.name, *slots);
                if current.iter().any(|s| s.as_ref() == Some(&key)) {
                    return Ok(EditOutcome::Unchanged);
                }
                match current.iter_mut().find(|s| s.is_none()) {
                    Some(slot) => *slot = Some(key),
                    None => return Ok(EditOutcome::Unchanged),
                }
                FieldValue::Slots(current)
            }
            (FieldKind::FixedSlots { slots, .. }, None, FieldEdit::Deselect(option)) => {
                let resolved = self.resolve_slot_option(&def.name, &def.kind, &option).ok();
                let mut current = self.slots_of(&def.name, *slots);
                let mut changed = false;
                for slot in current.iter_mut() {
                    let held = slot
                        .as_ref()
                        .is_some_and(|k| Some(k) == resolved.as_ref() || k.to_string() == option);
                    if held {
                        *slot = None;
                        changed = true;
                    }
                }
                if !changed {
                    return Ok(EditOutcome::Unchanged);
                }
                FieldValue::Slots(current)
            }
            (FieldKind::Reference { target }, None, FieldEdit::Set(raw)) => {
                if raw.is_null() {
                    FieldValue::Reference(None)
                } else {
                    if !(raw.is_string() || raw.is_number()) {
                        return Err(mismatch());
                    }
                    let options = self.options.get(target).map_or(&[][..], Vec::as_slice);
                    let key = options
                        .iter()
                        .find(|o| o.value.to_json() == raw)
                        .or_else(|| options.iter().find(|o| o.value.matches(&raw)))
                        .map(|o| o.value.clone())
                        .ok_or_else(|| ValidationError::NotAnOption {
                            field: def.name.clone(),
                            value: raw.as_str().map_or_else(|| raw.to_string(), str::to_string),
                        })?;
                    FieldValue::Reference(Some(key))
                }
            }
            (
                FieldKind::Scalar(_) | FieldKind::Reference { .. } | FieldKind::FixedSlots { .. },
                Some(part),
                _,
            ) => {
                return Err(ValidationError::UnknownPart {
                    field: def.name.clone(),
                    part: part.clone(),
                });
            }
            _ => return Err(mismatch()),
        };

        let name = def.name.clone();
        if self.values.get(&name) == Some(&new_value) {
            return Ok(EditOutcome::Unchanged);
        }
        self.values.insert(name, new_value);
        Ok(EditOutcome::Applied)
    }

    fn slots_of(&self, field: &str, slots: usize) -> Vec<Option<RefKey>> {
        match self.values.get(field) {
            Some(FieldValue::Slots(current)) => {
                let mut current = current.clone();
                current.resize(slots, None);
                current
            }
            _ => vec![None; slots],
        }
    }

    /// Key stored for a slot option
    ///
    /// Loaded options match by key first, then by label when exactly one
    /// option carries it. Without loaded options the text is taken as a key.
    fn resolve_slot_option(
        &self,
        field: &str,
        kind: &FieldKind,
        option: &str,
    ) -> Result<RefKey, ValidationError> {
        let not_an_option = || ValidationError::NotAnOption {
            field: field.to_string(),
            value: option.to_string(),
        };
        match kind {
            FieldKind::FixedSlots {
                source: OptionSource::Fixed(options),
                ..
            } if options.iter().any(|o| o == option) => Ok(RefKey::Store(RecordId::new(option))),
            FieldKind::FixedSlots {
                source: OptionSource::Collection(target),
                ..
            } => match self.options.get(target) {
                Some(opts) => {
                    if let Some(o) = opts.iter().find(|o| o.value.to_string() == option) {
                        return Ok(o.value.clone());
                    }
                    let mut labelled = opts.iter().filter(|o| o.label == option);
                    match (labelled.next(), labelled.next()) {
                        (Some(o), None) => Ok(o.value.clone()),
                        _ => Err(not_an_option()),
                    }
                }
                None => RefKey::from_json(&Value::from(option), true).ok_or_else(not_an_option),
            },
            _ => Err(not_an_option()),
        }
    }

    /// Check required fields
    ///
    /// # Errors
    /// `MissingRequired` naming the first empty required field.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for def in self.schema.fields.iter().filter(|f| f.required) {
            let empty = self.values.get(&def.name).map_or(true, FieldValue::is_empty);
            if empty {
                return Err(ValidationError::MissingRequired(def.name.clone()));
            }
        }
        Ok(())
    }

    /// Fields to send to the store
    ///
    /// On update the sequential id is left out so the stored value is never
    /// overwritten.
    #[must_use]
    pub fn payload(&self) -> Fields {
        self.schema
            .fields
            .iter()
            .filter(|f| {
                !(matches!(self.mode, FormMode::Update(_))
                    && matches!(f.kind, FieldKind::SequentialId))
            })
            .filter_map(|f| self.values.get(&f.name).map(|v| (f.name.clone(), v.to_json())))
            .collect()
    }
}

fn coerce_scalar(
    field: &str,
    kind: &ScalarKind,
    raw: &Value,
) -> Result<FieldValue, ValidationError> {
    match kind {
        ScalarKind::Text => match raw {
            Value::String(s) => Ok(FieldValue::Text(s.clone())),
            Value::Number(n) => Ok(FieldValue::Text(n.to_string())),
            Value::Null => Ok(FieldValue::Text(String::new())),
            _ => Err(ValidationError::ShapeMismatch {
                field: field.to_string(),
                expected: "a text value",
            }),
        },
        ScalarKind::Integer { min, max } => {
            if raw.is_null() || raw.as_str().is_some_and(|s| s.trim().is_empty()) {
                return Ok(FieldValue::Integer(None));
            }
            let value = parse_integer(raw).ok_or_else(|| ValidationError::ShapeMismatch {
                field: field.to_string(),
                expected: "an integer value",
            })?;
            if (*min..=*max).contains(&value) {
                Ok(FieldValue::Integer(Some(value)))
            } else {
                Err(ValidationError::OutOfRange {
                    field: field.to_string(),
                    min: *min,
                    max: *max,
                    value,
                })
            }
        }
        ScalarKind::Choice(options) => match raw {
            Value::Null => Ok(FieldValue::Choice(None)),
            Value::String(s) if s.is_empty() => Ok(FieldValue::Choice(None)),
            Value::String(s) if options.contains(s) => Ok(FieldValue::Choice(Some(s.clone()))),
            Value::String(s) => Err(ValidationError::NotAnOption {
                field: field.to_string(),
                value: s.clone(),
            }),
            _ => Err(ValidationError::ShapeMismatch {
                field: field.to_string(),
                expected: "one of its listed options",
            }),
        },
    }
}
