//! Schema registry
//!
//! Provides [`SchemaRegistry`] mapping each [`CollectionKind`] to its
//! [`CollectionSchema`], plus the form builders that read it:
//! - [`SchemaRegistry::new_record_template`] for creates (assigns the next human id)
//! - [`SchemaRegistry::edit_form`] for updates (keeps the stored id untouched)
//! - [`reference_options`] for foreign-key selects

use crate::field::{CompositePart, FieldDef, FieldKind, OptionSource, ScalarKind};
use crate::form::{FormMode, RecordForm, ReferenceOption};
use crate::schema::CollectionSchema;
use crate::value::{FieldValue, RefKey};
use indexmap::IndexMap;
use secaudit_model::{CollectionKind, Record, ValidationError};
use std::collections::HashMap;
use std::sync::Arc;

/// Registry of collection schemas
#[derive(Debug, Default, Clone)]
pub struct SchemaRegistry {
    schemas: HashMap<CollectionKind, Arc<CollectionSchema>>,
}

impl SchemaRegistry {
    /// Create new empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            schemas: HashMap::new(),
        }
    }

    /// Create registry with the built-in taxonomy schemas
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(assets_schema());
        registry.register(threats_schema());
        registry.register(vulnerabilities_schema());
        registry.register(safeguards_schema());
        registry.register(relations_schema());
        registry
    }

    /// Register or replace a schema
    pub fn register(&mut self, schema: CollectionSchema) {
        self.schemas.insert(schema.kind, Arc::new(schema));
    }

    /// Check if a collection has a schema
    #[inline]
    #[must_use]
    pub fn contains(&self, kind: CollectionKind) -> bool {
        self.schemas.contains_key(&kind)
    }

    /// Schema for a collection
    ///
    /// # Errors
    /// `UnknownCollection` if none is registered.
    pub fn get(&self, kind: CollectionKind) -> Result<Arc<CollectionSchema>, ValidationError> {
        self.schemas
            .get(&kind)
            .cloned()
            .ok_or_else(|| ValidationError::UnknownCollection(kind.to_string()))
    }

    /// Schema by collection name (case-insensitive)
    ///
    /// # Errors
    /// `UnknownCollection` for names outside the fixed set or without a schema.
    pub fn lookup(&self, name: &str) -> Result<Arc<CollectionSchema>, ValidationError> {
        self.get(name.parse()?)
    }

    /// Registered collections, in navigation order
    #[must_use]
    pub fn kinds(&self) -> Vec<CollectionKind> {
        CollectionKind::ALL
            .into_iter()
            .filter(|k| self.schemas.contains_key(k))
            .collect()
    }

    /// Get number of registered schemas
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    /// Check if registry is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Check if references into `kind` store its sequential id
    #[must_use]
    pub fn keyed_by_human_id(&self, kind: CollectionKind) -> bool {
        self.schemas
            .get(&kind)
            .is_some_and(|s| s.human_id_field().is_some())
    }

    /// Blank form for a new record
    ///
    /// The sequential id is `max(existing) + 1` over the ids that parse as
    /// integers, or 1 for an empty collection. Gaps are never reused.
    ///
    /// # Errors
    /// - `UnknownCollection` if the collection has no schema
    /// - `OutOfRange` if the largest stored id leaves no successor
    pub fn new_record_template(
        &self,
        kind: CollectionKind,
        existing: &[Record],
    ) -> Result<RecordForm, ValidationError> {
        let schema = self.get(kind)?;
        let max_id = existing
            .iter()
            .filter_map(|r| schema.human_id_of(r))
            .max()
            .unwrap_or(0);
        let next_id = max_id
            .checked_add(1)
            .ok_or_else(|| ValidationError::OutOfRange {
                field: schema.human_id_field().unwrap_or_default().to_string(),
                min: 1,
                max: i64::MAX,
                value: max_id,
            })?;
        let values = schema
            .fields
            .iter()
            .map(|f| {
                let value = match f.kind {
                    FieldKind::SequentialId => FieldValue::SequentialId(Some(next_id)),
                    ref kind => FieldValue::default_for(kind),
                };
                (f.name.clone(), value)
            })
            .collect::<IndexMap<_, _>>();
        Ok(RecordForm::new(schema, FormMode::Create, values))
    }

    /// Form prefilled from a stored record
    ///
    /// # Errors
    /// `UnknownCollection` if the collection has no schema.
    pub fn edit_form(
        &self,
        kind: CollectionKind,
        record: &Record,
    ) -> Result<RecordForm, ValidationError> {
        let schema = self.get(kind)?;
        let values = schema
            .fields
            .iter()
            .map(|f| {
                let value = FieldValue::from_json(&f.kind, record.get(&f.name), &|target| {
                    self.keyed_by_human_id(target)
                });
                (f.name.clone(), value)
            })
            .collect::<IndexMap<_, _>>();
        Ok(RecordForm::new(
            schema,
            FormMode::Update(record.id.clone()),
            values,
        ))
    }

    /// Sort records of `kind` for listing
    pub fn sort_for_listing(&self, kind: CollectionKind, records: &mut [Record]) {
        if let Some(schema) = self.schemas.get(&kind) {
            schema.sort_records(records);
        }
    }

    /// Options for fields referencing `target`
    ///
    /// # Errors
    /// `UnknownCollection` if `target` has no schema.
    pub fn reference_options(
        &self,
        target: CollectionKind,
        records: &[Record],
    ) -> Result<Vec<ReferenceOption>, ValidationError> {
        let schema = self.get(target)?;
        Ok(reference_options(&schema, records))
    }
}

/// Selectable entries for a foreign key into `schema`'s collection
///
/// Keyed by the human id where the record has one, otherwise by store id.
/// Labelled by `Nombre`, falling back to the key.
#[must_use]
pub fn reference_options(schema: &CollectionSchema, records: &[Record]) -> Vec<ReferenceOption> {
    records
        .iter()
        .map(|r| {
            let value = schema
                .human_id_of(r)
                .map_or_else(|| RefKey::Store(r.id.clone()), RefKey::Human);
            let label = r
                .text("Nombre")
                .filter(|s| !s.is_empty())
                .map_or_else(|| value.to_string(), str::to_string);
            ReferenceOption { value, label }
        })
        .collect()
}

fn cia_parts(min: i64, max: i64) -> Vec<CompositePart> {
    ["Confidencialidad", "Integridad", "Disponibilidad"]
        .into_iter()
        .map(|k| CompositePart::new(k, ScalarKind::Integer { min, max }))
        .collect()
}

fn assets_schema() -> CollectionSchema {
    CollectionSchema::new(
        CollectionKind::Assets,
        vec![
            FieldDef::sequential_id("ID_Activos"),
            FieldDef::text("Nombre").required(),
            FieldDef::text("Categoría").required(),
            FieldDef::text("Proveedor"),
            FieldDef::text("Descripción"),
            FieldDef::composite("Valoración", cia_parts(1, 5)),
        ],
    )
}

fn threats_schema() -> CollectionSchema {
    CollectionSchema::new(
        CollectionKind::Threats,
        vec![
            FieldDef::sequential_id("ID_Amenazas"),
            FieldDef::text("Nombre").required(),
            FieldDef::choice(
                "Tipo",
                &[
                    "Desastres naturales",
                    "De origen industrial",
                    "Errores y fallos no intencionados",
                    "Ataques intencionados",
                ],
            )
            .required(),
            FieldDef::composite("Degradación", cia_parts(0, 100)),
            FieldDef::slots(
                "Activos_Afectados",
                5,
                OptionSource::Collection(CollectionKind::Assets),
            ),
        ],
    )
}

fn vulnerabilities_schema() -> CollectionSchema {
    CollectionSchema::new(
        CollectionKind::Vulnerabilities,
        vec![
            FieldDef::text("Nombre").required(),
            FieldDef::text("Descripción"),
            FieldDef::choice("Severidad", &["Baja", "Media", "Alta", "Crítica"]),
            FieldDef::reference("Amenaza", CollectionKind::Threats),
        ],
    )
}

fn safeguards_schema() -> CollectionSchema {
    CollectionSchema::new(
        CollectionKind::Safeguards,
        vec![
            FieldDef::text("Nombre").required(),
            FieldDef::choice(
                "Tipo",
                &["Preventiva", "Disuasoria", "Detectiva", "Correctiva", "Recuperativa"],
            ),
            FieldDef::text("Descripción"),
            FieldDef::integer("Eficacia", 0, 100),
        ],
    )
}

fn relations_schema() -> CollectionSchema {
    CollectionSchema::new(
        CollectionKind::Relations,
        vec![
            FieldDef::reference("Activo", CollectionKind::Assets).required(),
            FieldDef::reference("Amenaza", CollectionKind::Threats).required(),
            FieldDef::reference("Vulnerabilidad", CollectionKind::Vulnerabilities),
            FieldDef::reference("Salvaguarda", CollectionKind::Safeguards),
        ],
    )
}
