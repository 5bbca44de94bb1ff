//! Upsert engine: one record from raw source row to persisted parent row and
//! child associations.
//!
//! Per record: map, validate, look up the natural key, then create or
//! update. Child collections are replaced wholesale on update. Each record
//! runs inside its own transaction, or inside a savepoint when the caller
//! already holds a step-level transaction, so a rejected statement only
//! discards that record's writes.

use tsu_core::mapper::{map_record, MapOutcome};
use tsu_core::outcome::{LinkTally, RecordError, RecordReport, SkipReason, UpsertOutcome};
use tsu_core::reference::ReferenceResolver;
use tsu_core::schema::{ChildSpec, EntitySchema};
use tsu_core::store::{Column, ConfigStore, SqlValue, StoreError};
use tsu_core::types::DbId;
use tsu_core::validation::{validate_record, ResolvedReferences};
use tsu_core::value::{FieldMap, ImportRecord, RawRecord, TypedValue};

pub struct UpsertEngine<'a> {
    schema: &'static EntitySchema,
    resolver: &'a ReferenceResolver,
}

impl<'a> UpsertEngine<'a> {
    pub fn new(schema: &'static EntitySchema, resolver: &'a ReferenceResolver) -> Self {
        Self { schema, resolver }
    }

    /// Map, validate and persist one raw record.
    ///
    /// Record-level problems are returned as `Skipped`/`Failed` reports; only
    /// fatal store errors are returned as `Err`.
    pub async fn process<S>(&self, store: &mut S, raw: &RawRecord) -> Result<RecordReport, StoreError>
    where
        S: ConfigStore + ?Sized,
    {
        let category = self.schema.kind;
        let record = match map_record(self.schema, raw) {
            MapOutcome::Mapped(record) => record,
            MapOutcome::MissingNaturalKey { position, field } => {
                tracing::warn!(category, position, field, "Record has no natural key, skipped");
                return Ok(RecordReport::new(
                    category,
                    position,
                    "",
                    UpsertOutcome::Skipped(SkipReason::MissingNaturalKey(field)),
                ));
            }
        };

        let validation = validate_record(self.schema, &record, self.resolver);
        for warning in &validation.warnings {
            tracing::warn!(
                category,
                natural_key = %record.natural_key,
                field = %warning.field,
                "{}; stored as NULL",
                warning.message
            );
        }
        if !validation.is_valid {
            tracing::warn!(
                category,
                natural_key = %record.natural_key,
                position = record.position,
                errors = %validation.summary(),
                "Validation failed"
            );
            return Ok(RecordReport::new(
                category,
                record.position,
                record.natural_key.clone(),
                UpsertOutcome::Failed(RecordError::Invalid(validation.errors)),
            ));
        }

        self.upsert(store, &record, &validation.references).await
    }

    /// Persist a validated record inside its own record boundary.
    pub async fn upsert<S>(
        &self,
        store: &mut S,
        record: &ImportRecord,
        references: &ResolvedReferences,
    ) -> Result<RecordReport, StoreError>
    where
        S: ConfigStore + ?Sized,
    {
        let category = self.schema.kind;
        let boundary = RecordBoundary::open(store, record.position).await?;

        match self.write(store, record, references).await {
            Ok((outcome, links)) => {
                boundary.close(store).await?;
                tracing::debug!(
                    category,
                    natural_key = %record.natural_key,
                    outcome = outcome.kind().as_str(),
                    "Record persisted"
                );
                Ok(RecordReport::new(category, record.position, record.natural_key.clone(), outcome)
                    .with_links(links))
            }
            Err(e) if !e.is_fatal() => {
                boundary.discard(store).await?;
                tracing::warn!(
                    category,
                    natural_key = %record.natural_key,
                    position = record.position,
                    error = %e,
                    "Record failed"
                );
                Ok(RecordReport::new(
                    category,
                    record.position,
                    record.natural_key.clone(),
                    UpsertOutcome::Failed(RecordError::Statement(e.to_string())),
                ))
            }
            Err(e) => Err(e),
        }
    }

    async fn write<S>(
        &self,
        store: &mut S,
        record: &ImportRecord,
        references: &ResolvedReferences,
    ) -> Result<(UpsertOutcome, Vec<LinkTally>), StoreError>
    where
        S: ConfigStore + ?Sized,
    {
        let table = self.schema.table;
        let key = key_columns(self.schema, record, references);
        let row = row_columns(self.schema, record, references);

        let (outcome, id) = match store.find_id(table, &key, self.schema.soft_deletes).await? {
            Some(id) => {
                store.update(table, id, &row).await?;
                for child in self.schema.children {
                    store.delete_where(child.table, &child_filter(child, Some(id))).await?;
                }
                (UpsertOutcome::Updated(id), id)
            }
            None => {
                let id = store.insert(table, &row).await?;
                (UpsertOutcome::Created(id), id)
            }
        };

        let mut links = Vec::with_capacity(self.schema.children.len());
        for child in self.schema.children {
            links.push(self.write_children(store, child, record, id).await?);
        }
        Ok((outcome, links))
    }

    /// Insert one child collection in source order. Entries whose reference
    /// does not resolve are skipped.
    async fn write_children<S>(
        &self,
        store: &mut S,
        child: &ChildSpec,
        record: &ImportRecord,
        parent_id: DbId,
    ) -> Result<LinkTally, StoreError>
    where
        S: ConfigStore + ?Sized,
    {
        let mut tally = LinkTally {
            counter: child.counter,
            added: 0,
            skipped: 0,
        };

        for entry in record.children(child.name) {
            let code = match entry.get(child.reference.name) {
                Some(TypedValue::Text(code)) if !code.is_empty() => code,
                _ => {
                    tracing::warn!(
                        category = self.schema.kind,
                        natural_key = %record.natural_key,
                        collection = child.name,
                        "Child entry has no `{}`, skipped",
                        child.reference.name
                    );
                    tally.skipped += 1;
                    continue;
                }
            };
            let target = match self.resolver.resolve(child.reference.kind, code) {
                Ok(id) => id,
                Err(unresolved) => {
                    tracing::warn!(
                        category = self.schema.kind,
                        natural_key = %record.natural_key,
                        collection = child.name,
                        "{unresolved}, link skipped"
                    );
                    tally.skipped += 1;
                    continue;
                }
            };

            let row = child_row(child, parent_id, target, entry);
            store.insert(child.table, &row).await?;
            tally.added += 1;
        }
        Ok(tally)
    }
}

/// Delete every row of `schema` and its child tables. Polymorphic child
/// tables only lose the rows owned by this kind. Rows in other tables that
/// reference the cleared ones go with them through `ON DELETE CASCADE`
/// foreign keys; the schema migration declares every such key that way.
pub async fn clear<S>(store: &mut S, schema: &EntitySchema) -> Result<(), StoreError>
where
    S: ConfigStore + ?Sized,
{
    for child in schema.children {
        let removed = store.delete_where(child.table, &child_filter(child, None)).await?;
        tracing::debug!(table = child.table, removed, "Cleared child table");
    }
    let removed = store.delete_where(schema.table, &[]).await?;
    tracing::info!(table = schema.table, removed, "Cleared table");
    Ok(())
}

// ---------------------------------------------------------------------------
// Record boundary
// ---------------------------------------------------------------------------

/// Transaction or savepoint wrapping one record's statements.
enum RecordBoundary {
    Transaction,
    Savepoint(String),
}

impl RecordBoundary {
    async fn open<S: ConfigStore + ?Sized>(store: &mut S, position: usize) -> Result<Self, StoreError> {
        if store.in_transaction() {
            let name = format!("record_{position}");
            store.savepoint(&name).await?;
            Ok(Self::Savepoint(name))
        } else {
            store.begin().await?;
            Ok(Self::Transaction)
        }
    }

    async fn close<S: ConfigStore + ?Sized>(self, store: &mut S) -> Result<(), StoreError> {
        match self {
            Self::Transaction => store.commit().await,
            Self::Savepoint(name) => store.release_savepoint(&name).await,
        }
    }

    async fn discard<S: ConfigStore + ?Sized>(self, store: &mut S) -> Result<(), StoreError> {
        match self {
            Self::Transaction => store.rollback().await,
            Self::Savepoint(name) => {
                store.rollback_to_savepoint(&name).await?;
                store.release_savepoint(&name).await
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Column assembly
// ---------------------------------------------------------------------------

fn field_columns<'r>(
    fields: &'static [tsu_core::schema::FieldSpec],
    values: &'r FieldMap,
) -> impl Iterator<Item = Column> + 'r {
    fields.iter().map(move |spec| {
        let value = values.get(spec.name).unwrap_or(&TypedValue::Null);
        Column::new(spec.column_name(), SqlValue::from_typed(spec.kind, value)).cast(spec.sql_type)
    })
}

fn key_columns(schema: &EntitySchema, record: &ImportRecord, references: &ResolvedReferences) -> Vec<Column> {
    schema
        .natural_key
        .iter()
        .filter_map(|name| {
            if let Some(spec) = schema.field(name) {
                let value = record.get(spec.name).unwrap_or(&TypedValue::Null);
                Some(
                    Column::new(spec.column_name(), SqlValue::from_typed(spec.kind, value))
                        .cast(spec.sql_type),
                )
            } else {
                schema.reference(name).map(|reference| {
                    let id = references.get(reference.column).copied().flatten();
                    Column::new(reference.column, SqlValue::Int(id))
                })
            }
        })
        .collect()
}

fn row_columns(schema: &EntitySchema, record: &ImportRecord, references: &ResolvedReferences) -> Vec<Column> {
    field_columns(schema.fields, &record.fields)
        .chain(
            references
                .iter()
                .map(|(column, id)| Column::new(*column, SqlValue::Int(*id))),
        )
        .collect()
}

fn child_row(child: &ChildSpec, parent_id: DbId, target: DbId, entry: &FieldMap) -> Vec<Column> {
    let mut row = vec![Column::new(child.parent_column, SqlValue::id(parent_id))];
    if let Some((column, value)) = child.discriminator {
        row.push(Column::new(column, SqlValue::text(value)));
    }
    row.push(Column::new(child.reference.column, SqlValue::id(target)));
    row.extend(field_columns(child.fields, entry));
    row
}

/// Rows of `child` owned by `parent` (or by any parent of this kind).
fn child_filter(child: &ChildSpec, parent: Option<DbId>) -> Vec<Column> {
    let mut filter = Vec::with_capacity(2);
    if let Some((column, value)) = child.discriminator {
        filter.push(Column::new(column, SqlValue::text(value)));
    }
    if let Some(id) = parent {
        filter.push(Column::new(child.parent_column, SqlValue::id(id)));
    }
    filter
}
