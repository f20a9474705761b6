//! Record editor service
//!
//! Provides [`RecordEditor`] for administrative maintenance of the taxonomy
//! collections:
//! - Ordered listings
//! - Create/update forms with reference options loaded up front
//! - Submit and delete
//!
//! Every operation takes an [`AdminContext`] issued by the admin gate.

use crate::access::AdminContext;
use crate::error::{AuditError, AuditResult, StoreError};
use crate::ports::RecordStore;
use futures::future::try_join_all;
use secaudit_model::{CollectionKind, Record, RecordId};
use secaudit_schema::{FormMode, RecordForm, SchemaRegistry};
use std::sync::Arc;

/// Result of a successful submit
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// New record inserted
    Created(RecordId),
    /// Existing record merged
    Updated(Record),
}

/// Schema-driven record maintenance
#[derive(Clone)]
pub struct RecordEditor {
    records: Arc<dyn RecordStore>,
    registry: Arc<SchemaRegistry>,
}

impl std::fmt::Debug for RecordEditor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordEditor")
            .field("collections", &self.registry.kinds())
            .finish_non_exhaustive()
    }
}

impl RecordEditor {
    /// Create editor
    #[must_use]
    pub fn new(records: Arc<dyn RecordStore>, registry: Arc<SchemaRegistry>) -> Self {
        Self { records, registry }
    }

    /// Schema registry in use
    #[inline]
    #[must_use]
    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    /// Records of a collection in listing order
    ///
    /// # Errors
    /// Store failures.
    pub async fn list(&self, ctx: &AdminContext, kind: CollectionKind) -> AuditResult<Vec<Record>> {
        let mut records = self.records.list_records(kind).await?;
        self.registry.sort_for_listing(kind, &mut records);
        tracing::debug!(
            "{} listed {} {} records",
            ctx.identity().id,
            records.len(),
            kind
        );
        Ok(records)
    }

    /// Blank form with the next sequential id assigned
    ///
    /// # Errors
    /// Store failures, or `ValidationFailed` for a collection without schema.
    pub async fn open_new(&self, ctx: &AdminContext, kind: CollectionKind) -> AuditResult<RecordForm> {
        let existing = self.records.list_records(kind).await?;
        let mut form = self.registry.new_record_template(kind, &existing)?;
        self.load_options(&mut form).await?;
        tracing::debug!("{} opened new {} form", ctx.identity().id, kind);
        Ok(form)
    }

    /// Form prefilled from a stored record
    ///
    /// # Errors
    /// `RecordNotFound`, store failures, or `ValidationFailed` for a
    /// collection without schema.
    pub async fn open_existing(
        &self,
        ctx: &AdminContext,
        kind: CollectionKind,
        id: &RecordId,
    ) -> AuditResult<RecordForm> {
        let record = self.records.get_record(kind, id).await?;
        let mut form = self.registry.edit_form(kind, &record)?;
        self.load_options(&mut form).await?;
        tracing::debug!("{} opened {} record {}", ctx.identity().id, kind, id);
        Ok(form)
    }

    async fn load_options(&self, form: &mut RecordForm) -> AuditResult<()> {
        let kinds = form.referenced_collections();
        let loaded = try_join_all(kinds.into_iter().map(|kind| async move {
            let records = self.records.list_records(kind).await?;
            Ok::<_, StoreError>((kind, records))
        }))
        .await?;
        for (kind, records) in loaded {
            let options = self.registry.reference_options(kind, &records)?;
            form.set_options(kind, options);
        }
        Ok(())
    }

    /// Validate and write the form
    ///
    /// # Errors
    /// - `ValidationFailed` for a missing required field or a store rejection
    /// - `RecordNotFound` if the updated record vanished
    /// - Store failures
    pub async fn submit(&self, ctx: &AdminContext, form: &RecordForm) -> AuditResult<SubmitOutcome> {
        form.validate()?;
        let kind = form.collection();
        let payload = form.payload();
        match form.mode() {
            FormMode::Create => {
                let id = self.records.create_record(kind, payload).await.map_err(|e| {
                    tracing::warn!("create in {} rejected: {}", kind, e);
                    AuditError::from(e)
                })?;
                tracing::info!("{} created {} record {}", ctx.identity().id, kind, id);
                Ok(SubmitOutcome::Created(id))
            }
            FormMode::Update(id) => {
                let record = self
                    .records
                    .update_record(kind, id, payload)
                    .await
                    .map_err(|e| {
                        tracing::warn!("update of {} record {} rejected: {}", kind, id, e);
                        AuditError::from(e)
                    })?;
                tracing::info!("{} updated {} record {}", ctx.identity().id, kind, id);
                Ok(SubmitOutcome::Updated(record))
            }
        }
    }

    /// Remove a record
    ///
    /// # Errors
    /// `RecordNotFound` if absent, store failures.
    pub async fn delete(&self, ctx: &AdminContext, kind: CollectionKind, id: &RecordId) -> AuditResult<()> {
        self.records.delete_record(kind, id).await?;
        tracing::info!("{} deleted {} record {}", ctx.identity().id, kind, id);
        Ok(())
    }
}
