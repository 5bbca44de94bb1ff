//! Step runner and run orchestration.
//!
//! An import step is one entity kind from one source under one
//! [`WritePolicy`]. The [`Importer`] owns the store and the run statistics
//! for the whole run; steps execute strictly one after another.

use std::path::PathBuf;

use tsu_core::error::CoreError;
use tsu_core::outcome::{OutcomeKind, RecordReport};
use tsu_core::policy::WritePolicy;
use tsu_core::reference::ReferenceResolver;
use tsu_core::schema::EntitySchema;
use tsu_core::stats::{RunStats, RunSummary};
use tsu_core::store::{ConfigStore, StoreError};
use tsu_core::value::RawRecord;

use crate::catalog::{self, EQUIPMENT_FILES, MONSTERS, WORKBOOK_SHEETS};
use crate::engine::{clear, UpsertEngine};
use crate::error::ImportError;
use crate::source::{JsonSource, SourceError, Workbook};

// ---------------------------------------------------------------------------
// Plans
// ---------------------------------------------------------------------------

/// Which sources a run imports, in order.
#[derive(Debug, Clone)]
pub enum Plan {
    /// One mandatory monsters file.
    Monsters { file: PathBuf },
    /// Optional equipment files under one directory.
    Equipment { dir: PathBuf },
    /// A mandatory workbook; missing sheets are skipped.
    Workbook {
        file: PathBuf,
        sheets: Vec<(&'static str, &'static EntitySchema)>,
    },
}

impl Plan {
    /// Workbook plan restricted to `only` (sheet or category names), or
    /// every sheet when `only` is empty. Sheets keep dependency order.
    pub fn workbook(file: impl Into<PathBuf>, only: &[String]) -> Result<Self, CoreError> {
        let selected: Vec<&'static str> = only
            .iter()
            .map(|name| catalog::sheet(name).map(|(sheet, _)| sheet))
            .collect::<Result<_, _>>()?;
        let sheets = WORKBOOK_SHEETS
            .iter()
            .copied()
            .filter(|(sheet, _)| selected.is_empty() || selected.contains(sheet))
            .collect();
        Ok(Self::Workbook {
            file: file.into(),
            sheets,
        })
    }
}

// ---------------------------------------------------------------------------
// Importer
// ---------------------------------------------------------------------------

pub struct Importer<S> {
    store: S,
    policy: WritePolicy,
    stats: RunStats,
}

impl<S: ConfigStore> Importer<S> {
    pub fn new(store: S, policy: WritePolicy) -> Self {
        Self {
            store,
            policy,
            stats: RunStats::new(),
        }
    }

    pub fn policy(&self) -> WritePolicy {
        self.policy
    }

    pub fn stats(&self) -> &RunStats {
        &self.stats
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Execute every step of `plan`.
    pub async fn run(&mut self, plan: &Plan) -> Result<(), ImportError> {
        match plan {
            Plan::Monsters { file } => {
                let records = JsonSource::new(file).read()?;
                tracing::info!(path = %file.display(), records = records.len(), "Loaded monsters file");
                self.import(&MONSTERS, &records).await
            }
            Plan::Equipment { dir } => {
                for &(file, schema) in EQUIPMENT_FILES {
                    let source = JsonSource::new(dir.join(file));
                    match source.read() {
                        Ok(records) if records.is_empty() => {
                            tracing::info!(path = %source.path().display(), "Source is empty, step skipped");
                        }
                        Ok(records) => self.import(schema, &records).await?,
                        Err(e) => {
                            tracing::warn!(category = schema.kind, error = %e, "Source unavailable, step skipped");
                        }
                    }
                }
                Ok(())
            }
            Plan::Workbook { file, sheets } => {
                let mut workbook = Workbook::open(file)?;
                tracing::info!(path = %file.display(), sheets = ?workbook.sheet_names(), "Opened workbook");
                for &(sheet, schema) in sheets {
                    match workbook.sheet(sheet) {
                        Ok(records) => self.import(schema, &records).await?,
                        Err(e @ SourceError::SheetMissing(_)) => {
                            tracing::warn!(category = schema.kind, error = %e, "Sheet skipped");
                        }
                        Err(e) => {
                            tracing::warn!(category = schema.kind, sheet, error = %e, "Sheet unreadable, skipped");
                        }
                    }
                }
                Ok(())
            }
        }
    }

    /// Run one import step over already-loaded records.
    ///
    /// Under [`WritePolicy::Truncate`] the whole step, including the wipe,
    /// is one transaction and its reports are folded in only after commit.
    pub async fn import(
        &mut self,
        schema: &'static EntitySchema,
        records: &[RawRecord],
    ) -> Result<(), ImportError> {
        let category = schema.kind;
        self.stats.open_category(category);
        tracing::info!(category, records = records.len(), policy = %self.policy, "Import step started");

        let resolver = self.load_references(schema).await?;
        match self.policy {
            WritePolicy::Incremental => {
                let engine = UpsertEngine::new(schema, &resolver);
                for raw in records {
                    let report = engine.process(&mut self.store, raw).await?;
                    self.stats.record(&report);
                }
            }
            WritePolicy::Truncate => {
                self.store.begin().await?;
                match truncate_step(&mut self.store, schema, &resolver, records).await {
                    Ok(reports) => {
                        self.store.commit().await?;
                        for report in &reports {
                            self.stats.record(report);
                        }
                    }
                    Err(e) => {
                        tracing::error!(category, error = %e, "Import step aborted, rolling back");
                        if let Err(rollback) = self.store.rollback().await {
                            tracing::warn!(category, error = %rollback, "Rollback failed");
                        }
                        return Err(e.into());
                    }
                }
            }
        }

        if let Some(stats) = self.stats.category(category) {
            tracing::info!(
                category,
                created = stats.count(OutcomeKind::Created),
                updated = stats.count(OutcomeKind::Updated),
                skipped = stats.count(OutcomeKind::Skipped),
                failed = stats.count(OutcomeKind::Failed),
                "Import step finished"
            );
        }
        Ok(())
    }

    /// One bulk query per reference kind the schema depends on.
    async fn load_references(&mut self, schema: &EntitySchema) -> Result<ReferenceResolver, StoreError> {
        let mut tables = Vec::new();
        for kind in schema.reference_kinds() {
            let table = self.store.load_reference(kind).await?;
            tracing::info!(category = schema.kind, reference = %kind, codes = table.len(), "Loaded reference table");
            tables.push(table);
        }
        Ok(ReferenceResolver::new(tables))
    }

    /// Roll back whatever the interrupted step left open.
    pub async fn abort(&mut self) {
        if self.store.in_transaction() {
            match self.store.rollback().await {
                Ok(()) => tracing::warn!("Open transaction rolled back"),
                Err(e) => tracing::error!(error = %e, "Rollback after interruption failed"),
            }
        }
    }

    /// Freeze the statistics and hand back the store for closing.
    pub fn finish(self, interrupted: bool) -> (S, RunSummary) {
        (self.store, self.stats.finalize(interrupted))
    }
}

async fn truncate_step<S: ConfigStore>(
    store: &mut S,
    schema: &'static EntitySchema,
    resolver: &ReferenceResolver,
    records: &[RawRecord],
) -> Result<Vec<RecordReport>, StoreError> {
    clear(store, schema).await?;
    let engine = UpsertEngine::new(schema, resolver);
    let mut reports = Vec::with_capacity(records.len());
    for raw in records {
        reports.push(engine.process(store, raw).await?);
    }
    Ok(reports)
}
