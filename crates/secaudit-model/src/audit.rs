//! Audit questionnaire types
//!
//! An [`Audit`] holds one respondent's answers, keyed by asset category.
//! Each [`CategoryAnswer`] keeps its unit count and its detail list in
//! lockstep: the count is derived from the list, so the two cannot diverge.

use crate::error::ValidationError;
use crate::ids::{AuditId, OwnerId};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Answers keyed by category, in presentation order
pub type Answers = IndexMap<String, CategoryAnswer>;

/// Audit lifecycle state
///
/// The only transition is `InProgress -> Finalized`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditState {
    /// Draft still editable, category saves allowed
    #[default]
    InProgress,
    /// Terminal, read-only
    #[serde(alias = "completada")]
    Finalized,
}

impl AuditState {
    /// Check if this state accepts writes
    #[inline]
    #[must_use]
    pub fn is_editable(self) -> bool {
        matches!(self, Self::InProgress)
    }
}

impl std::fmt::Display for AuditState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InProgress => write!(f, "in_progress"),
            Self::Finalized => write!(f, "finalized"),
        }
    }
}

/// Snapshot of who answered the questionnaire
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RespondentProfile {
    /// Display name
    #[serde(rename = "nombre", alias = "name")]
    pub name: String,
    /// Contact email
    pub email: String,
    /// Organization
    #[serde(rename = "empresa", alias = "company")]
    pub company: String,
}

/// One respondent's security questionnaire
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Audit {
    /// Store-assigned, immutable
    pub id: AuditId,
    /// Submitting identity
    pub owner: OwnerId,
    /// Lifecycle state
    pub state: AuditState,
    /// Answers per category
    #[serde(default)]
    pub answers: Answers,
    /// Who answered
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub respondent: Option<RespondentProfile>,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Updated on every save or finalize
    pub last_modified_at: DateTime<Utc>,
    /// Set only on finalize
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finalized_at: Option<DateTime<Utc>>,
}

impl Audit {
    /// Check if the audit is locked
    #[inline]
    #[must_use]
    pub fn is_finalized(&self) -> bool {
        self.state == AuditState::Finalized
    }
}

/// Audit about to be created by the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAudit {
    /// Owner
    pub owner: OwnerId,
    /// Initial answers (one empty entry per category)
    pub answers: Answers,
    /// Respondent snapshot
    pub respondent: Option<RespondentProfile>,
    /// Creation time
    pub at: DateTime<Utc>,
}

impl NewAudit {
    /// Create an empty in-progress audit for `categories`
    #[must_use]
    pub fn for_categories(owner: OwnerId, categories: &[String], at: DateTime<Utc>) -> Self {
        let answers = categories
            .iter()
            .map(|c| (c.clone(), CategoryAnswer::default()))
            .collect();
        Self {
            owner,
            answers,
            respondent: None,
            at,
        }
    }

    /// With respondent snapshot
    #[inline]
    #[must_use]
    pub fn with_respondent(mut self, respondent: RespondentProfile) -> Self {
        self.respondent = Some(respondent);
        self
    }

    /// Materialize with the id the store assigned
    #[must_use]
    pub fn into_audit(self, id: AuditId) -> Audit {
        Audit {
            id,
            owner: self.owner,
            state: AuditState::InProgress,
            answers: self.answers,
            respondent: self.respondent,
            created_at: self.at,
            last_modified_at: self.at,
            finalized_at: None,
        }
    }
}

/// Criticality rating, 1 (lowest) to 5 (highest)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Criticality(u8);

impl Criticality {
    /// Lowest rating
    pub const MIN: u8 = 1;
    /// Highest rating
    pub const MAX: u8 = 5;

    /// Create a rating, rejecting values outside 1..=5
    pub fn new(value: i64) -> Result<Self, ValidationError> {
        match u8::try_from(value) {
            Ok(level) if (Self::MIN..=Self::MAX).contains(&level) => Ok(Self(level)),
            _ => Err(ValidationError::OutOfRange {
                field: "criticidad".to_string(),
                min: i64::from(Self::MIN),
                max: i64::from(Self::MAX),
                value,
            }),
        }
    }

    /// Numeric value
    #[inline]
    #[must_use]
    pub fn value(self) -> u8 {
        self.0
    }
}

impl Default for Criticality {
    fn default() -> Self {
        Self(3)
    }
}

impl TryFrom<i64> for Criticality {
    type Error = ValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Criticality> for i64 {
    fn from(value: Criticality) -> Self {
        i64::from(value.0)
    }
}

/// Details of one declared unit within a category
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UnitDetail {
    /// Asset model name
    #[serde(rename = "nombre", alias = "name", default)]
    pub name: String,
    /// Vendor
    #[serde(rename = "proveedor", alias = "provider", default)]
    pub provider: String,
    /// Criticality rating
    #[serde(rename = "criticidad", alias = "criticality", default)]
    pub criticality: Criticality,
    /// Free-text description of how the unit is hardened
    #[serde(
        rename = "securizacion",
        alias = "hardening_notes",
        alias = "hardeningNotes",
        default
    )]
    pub hardening_notes: String,
}

impl UnitDetail {
    /// Replace one field
    ///
    /// # Errors
    /// - `ShapeMismatch` if the value kind does not fit the field
    /// - `OutOfRange` for a criticality outside 1..=5
    pub fn set(&mut self, field: DetailField, value: DetailValue) -> Result<(), ValidationError> {
        match (field, value) {
            (DetailField::Name, DetailValue::Text(v)) => self.name = v,
            (DetailField::Provider, DetailValue::Text(v)) => self.provider = v,
            (DetailField::HardeningNotes, DetailValue::Text(v)) => self.hardening_notes = v,
            (DetailField::Criticality, DetailValue::Level(v)) => {
                self.criticality = Criticality::new(v)?;
            }
            (field, _) => {
                return Err(ValidationError::ShapeMismatch {
                    field: field.wire_name().to_string(),
                    expected: field.expected(),
                })
            }
        }
        Ok(())
    }
}

/// Editable field of a [`UnitDetail`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DetailField {
    /// `nombre`
    Name,
    /// `proveedor`
    Provider,
    /// `criticidad`
    Criticality,
    /// `securizacion`
    HardeningNotes,
}

impl DetailField {
    /// Key used in stored answers
    #[must_use]
    pub fn wire_name(self) -> &'static str {
        match self {
            Self::Name => "nombre",
            Self::Provider => "proveedor",
            Self::Criticality => "criticidad",
            Self::HardeningNotes => "securizacion",
        }
    }

    fn expected(self) -> &'static str {
        match self {
            Self::Criticality => "an integer level",
            _ => "text",
        }
    }
}

impl FromStr for DetailField {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "nombre" | "name" => Ok(Self::Name),
            "proveedor" | "provider" => Ok(Self::Provider),
            "criticidad" | "criticality" => Ok(Self::Criticality),
            "securizacion" | "hardening_notes" | "hardeningNotes" => Ok(Self::HardeningNotes),
            other => Err(ValidationError::UnknownDetailField(other.to_string())),
        }
    }
}

/// New value for a [`DetailField`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetailValue {
    /// Text fields
    Text(String),
    /// Criticality
    Level(i64),
}

impl From<&str> for DetailValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for DetailValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for DetailValue {
    fn from(value: i64) -> Self {
        Self::Level(value)
    }
}

/// Answer for one category: declared unit count plus one detail per unit
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "CategoryAnswerWire", into = "CategoryAnswerWire")]
pub struct CategoryAnswer {
    details: Vec<UnitDetail>,
}

impl CategoryAnswer {
    /// Hard ceiling on declared units per category
    pub const MAX_UNITS: usize = 10_000;

    /// Empty answer (`count == 0`)
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer with `count` default-initialized units
    ///
    /// # Errors
    /// `OutOfRange` above [`Self::MAX_UNITS`].
    pub fn with_count(count: usize) -> Result<Self, ValidationError> {
        let mut answer = Self::new();
        answer.set_count(count)?;
        Ok(answer)
    }

    /// Declared number of units
    #[inline]
    #[must_use]
    pub fn count(&self) -> usize {
        self.details.len()
    }

    /// Unit details, one per declared unit
    #[inline]
    #[must_use]
    pub fn details(&self) -> &[UnitDetail] {
        &self.details
    }

    /// Detail at `index`
    #[inline]
    #[must_use]
    pub fn detail(&self, index: usize) -> Option<&UnitDetail> {
        self.details.get(index)
    }

    /// Whether the respondent declared at least one unit
    #[inline]
    #[must_use]
    pub fn is_answered(&self) -> bool {
        !self.details.is_empty()
    }

    /// Grow with default units or truncate from the tail
    ///
    /// # Errors
    /// `OutOfRange` above [`Self::MAX_UNITS`]; the answer is left untouched.
    pub fn set_count(&mut self, count: usize) -> Result<(), ValidationError> {
        check_unit_count(count, Self::MAX_UNITS)?;
        self.details.resize_with(count, UnitDetail::default);
        Ok(())
    }

    /// Replace one field of one unit
    ///
    /// Returns `Ok(false)` without touching anything when `index` is out of
    /// bounds.
    ///
    /// # Errors
    /// Value shape violations from [`UnitDetail::set`].
    pub fn set_detail_field(
        &mut self,
        index: usize,
        field: DetailField,
        value: DetailValue,
    ) -> Result<bool, ValidationError> {
        match self.details.get_mut(index) {
            Some(detail) => {
                detail.set(field, value)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Delete the unit at `index`, shifting later units left
    ///
    /// Returns the removed unit, or `None` if `index` is out of bounds.
    pub fn remove_unit(&mut self, index: usize) -> Option<UnitDetail> {
        (index < self.details.len()).then(|| self.details.remove(index))
    }
}

impl FromIterator<UnitDetail> for CategoryAnswer {
    fn from_iter<I: IntoIterator<Item = UnitDetail>>(iter: I) -> Self {
        Self {
            details: iter.into_iter().collect(),
        }
    }
}

/// Check a unit count against `max`
///
/// # Errors
/// `OutOfRange` on the `cantidad` field when `count > max`.
pub fn check_unit_count(count: usize, max: usize) -> Result<(), ValidationError> {
    if count <= max {
        return Ok(());
    }
    Err(ValidationError::OutOfRange {
        field: "cantidad".to_string(),
        min: 0,
        max: i64::try_from(max).unwrap_or(i64::MAX),
        value: i64::try_from(count).unwrap_or(i64::MAX),
    })
}

/// Stored shape: `{ "cantidad": n, "detalles": [...] }`
#[derive(Serialize, Deserialize)]
struct CategoryAnswerWire {
    #[serde(rename = "cantidad", alias = "count", default)]
    count: Option<usize>,
    #[serde(rename = "detalles", alias = "details", default)]
    details: Vec<UnitDetail>,
}

impl TryFrom<CategoryAnswerWire> for CategoryAnswer {
    type Error = ValidationError;

    fn try_from(wire: CategoryAnswerWire) -> Result<Self, Self::Error> {
        // a declared count wins and details follow it; without one the details stand
        let count = wire.count.unwrap_or(wire.details.len());
        check_unit_count(count, Self::MAX_UNITS)?;
        let mut answer = Self {
            details: wire.details,
        };
        answer.set_count(count)?;
        Ok(answer)
    }
}

impl From<CategoryAnswer> for CategoryAnswerWire {
    fn from(answer: CategoryAnswer) -> Self {
        Self {
            count: Some(answer.details.len()),
            details: answer.details,
        }
    }
}
