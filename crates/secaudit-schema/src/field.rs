//! Field definitions
//!
//! Every field of every collection is one of a small set of kinds. Edit
//! dispatch and validation match on [`FieldKind`]; nothing inspects values
//! to guess their shape.

use secaudit_model::CollectionKind;

/// Shape of a single-valued field (or of one part of a composite)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScalarKind {
    /// Free text
    Text,
    /// Integer within inclusive bounds
    Integer {
        /// Lower bound
        min: i64,
        /// Upper bound
        max: i64,
    },
    /// One of a fixed list of labels
    Choice(Vec<String>),
}

impl ScalarKind {
    /// Choice over `options`
    #[must_use]
    pub fn choice(options: &[&str]) -> Self {
        Self::Choice(options.iter().map(|o| (*o).to_string()).collect())
    }
}

/// Named sub-key of a composite field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositePart {
    /// Sub-key
    pub key: String,
    /// Sub-key shape
    pub kind: ScalarKind,
}

impl CompositePart {
    /// Create part
    #[must_use]
    pub fn new(key: impl Into<String>, kind: ScalarKind) -> Self {
        Self {
            key: key.into(),
            kind,
        }
    }
}

/// Where the selectable options of a multi-slot field come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionSource {
    /// Static list
    Fixed(Vec<String>),
    /// Records of another collection, loaded when the form opens
    Collection(CollectionKind),
}

/// Field kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    /// Plain value
    Scalar(ScalarKind),
    /// Fixed set of named sub-keys edited one at a time
    Composite(Vec<CompositePart>),
    /// Up to `slots` distinct selections, each in its own slot
    FixedSlots {
        /// Slot count
        slots: usize,
        /// Option domain
        source: OptionSource,
    },
    /// Foreign key into another collection
    Reference {
        /// Referenced collection
        target: CollectionKind,
    },
    /// Human-visible id assigned as `max + 1` on creation, read-only afterwards
    SequentialId,
}

impl FieldKind {
    /// Short description used in shape errors
    #[must_use]
    pub fn describe(&self) -> &'static str {
        match self {
            Self::Scalar(ScalarKind::Text) => "a text value",
            Self::Scalar(ScalarKind::Integer { .. }) => "an integer value",
            Self::Scalar(ScalarKind::Choice(_)) => "one of its listed options",
            Self::Composite(_) => "a sub-key edit (field.part)",
            Self::FixedSlots { .. } => "select/deselect of an option",
            Self::Reference { .. } => "a referenced record id",
            Self::SequentialId => "no edits",
        }
    }

    /// Collection whose records feed this field's options
    #[must_use]
    pub fn referenced_collection(&self) -> Option<CollectionKind> {
        match self {
            Self::Reference { target } => Some(*target),
            Self::FixedSlots {
                source: OptionSource::Collection(target),
                ..
            } => Some(*target),
            _ => None,
        }
    }
}

/// Field definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDef {
    /// Field name in the stored record
    pub name: String,
    /// Shape
    pub kind: FieldKind,
    /// Must be non-empty on submit
    pub required: bool,
}

impl FieldDef {
    /// Create optional field
    #[must_use]
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            required: false,
        }
    }

    /// Free-text field
    #[must_use]
    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Scalar(ScalarKind::Text))
    }

    /// Bounded integer field
    #[must_use]
    pub fn integer(name: impl Into<String>, min: i64, max: i64) -> Self {
        Self::new(name, FieldKind::Scalar(ScalarKind::Integer { min, max }))
    }

    /// Select field
    #[must_use]
    pub fn choice(name: impl Into<String>, options: &[&str]) -> Self {
        Self::new(name, FieldKind::Scalar(ScalarKind::choice(options)))
    }

    /// Composite field
    #[must_use]
    pub fn composite(name: impl Into<String>, parts: Vec<CompositePart>) -> Self {
        Self::new(name, FieldKind::Composite(parts))
    }

    /// Fixed-slot multi-select
    #[must_use]
    pub fn slots(name: impl Into<String>, slots: usize, source: OptionSource) -> Self {
        Self::new(name, FieldKind::FixedSlots { slots, source })
    }

    /// Foreign key
    #[must_use]
    pub fn reference(name: impl Into<String>, target: CollectionKind) -> Self {
        Self::new(name, FieldKind::Reference { target })
    }

    /// Sequential human id
    #[must_use]
    pub fn sequential_id(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::SequentialId)
    }

    /// Mark required
    #[inline]
    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}
