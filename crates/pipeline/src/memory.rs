//! In-memory [`ConfigStore`] backing the engine and runner tests.
//!
//! Tables are plain row vectors keyed by table name. Transactions and
//! savepoints snapshot the whole store, which is enough for the sequential,
//! single-connection access pattern of the pipeline.

use std::collections::BTreeMap;

use async_trait::async_trait;
use indexmap::IndexMap;
use tsu_core::reference::ReferenceTable;
use tsu_core::schema::ReferenceKind;
use tsu_core::store::{Column, ConfigStore, SqlValue, StoreError};
use tsu_core::types::DbId;

/// One stored row.
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryRow {
    pub id: DbId,
    pub columns: IndexMap<&'static str, SqlValue>,
}

impl MemoryRow {
    pub fn get(&self, column: &str) -> Option<&SqlValue> {
        self.columns.get(column)
    }

    fn is_deleted(&self) -> bool {
        self.get("deleted_at").is_some_and(|v| !v.is_null())
    }

    fn matches(&self, filter: &[Column]) -> bool {
        filter.iter().all(|c| {
            let stored = self.columns.get(c.name);
            if c.value.is_null() {
                stored.map_or(true, SqlValue::is_null)
            } else {
                stored == Some(&c.value)
            }
        })
    }
}

#[derive(Debug, Clone, Default)]
struct Snapshot {
    tables: BTreeMap<String, Vec<MemoryRow>>,
    next_id: DbId,
}

/// A statement failure injected for one column value.
#[derive(Debug, Clone)]
struct FailRule {
    table: String,
    column: &'static str,
    value: SqlValue,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    data: Snapshot,
    transaction: Option<Snapshot>,
    savepoints: Vec<(String, Snapshot)>,
    fail_rules: Vec<FailRule>,
    disconnected: bool,
    statements: u64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a row outside any transaction, e.g. reference data.
    pub fn seed(&mut self, table: &str, row: Vec<Column>) -> DbId {
        self.data.next_id += 1;
        let id = self.data.next_id;
        self.data
            .tables
            .entry(table.to_string())
            .or_default()
            .push(MemoryRow {
                id,
                columns: row.into_iter().map(|c| (c.name, c.value)).collect(),
            });
        id
    }

    /// Seed a reference row holding only its code.
    pub fn seed_reference(&mut self, kind: ReferenceKind, code: &str) -> DbId {
        self.seed(kind.table(), vec![Column::new(kind.code_column(), SqlValue::text(code))])
    }

    /// Reject every insert or update into `table` that sets `column` to `value`.
    pub fn fail_on(&mut self, table: &str, column: &'static str, value: SqlValue) {
        self.fail_rules.push(FailRule {
            table: table.to_string(),
            column,
            value,
        });
    }

    /// Make every subsequent call fail with a connection error.
    pub fn disconnect(&mut self) {
        self.disconnected = true;
    }

    pub fn rows(&self, table: &str) -> &[MemoryRow] {
        self.data.tables.get(table).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn count(&self, table: &str) -> usize {
        self.rows(table).len()
    }

    /// First row of `table` whose `column` holds the text `value`.
    pub fn find(&self, table: &str, column: &str, value: &str) -> Option<&MemoryRow> {
        self.rows(table)
            .iter()
            .find(|row| row.get(column).and_then(SqlValue::text_value) == Some(value))
    }

    /// Number of data statements executed so far.
    pub fn statements(&self) -> u64 {
        self.statements
    }

    fn check(&mut self) -> Result<(), StoreError> {
        if self.disconnected {
            return Err(StoreError::Connection("connection reset".into()));
        }
        self.statements += 1;
        Ok(())
    }

    fn check_rules(&self, table: &str, row: &[Column]) -> Result<(), StoreError> {
        let hit = self.fail_rules.iter().find(|rule| {
            rule.table == table && row.iter().any(|c| c.name == rule.column && c.value == rule.value)
        });
        match hit {
            Some(rule) => Err(StoreError::Statement(format!(
                "rejected {}.{} value {:?}",
                rule.table, rule.column, rule.value
            ))),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ConfigStore for MemoryStore {
    async fn load_reference(&mut self, kind: ReferenceKind) -> Result<ReferenceTable, StoreError> {
        self.check()?;
        let rows = self.rows(kind.table()).iter().filter_map(|row| {
            if kind.soft_deletes() && row.is_deleted() {
                return None;
            }
            let code = row.get(kind.code_column()).and_then(SqlValue::text_value)?;
            Some((code.to_string(), row.id))
        });
        Ok(ReferenceTable::from_rows(kind, rows.collect::<Vec<_>>()))
    }

    async fn begin(&mut self) -> Result<(), StoreError> {
        self.check()?;
        if self.transaction.is_some() {
            return Err(StoreError::Transaction("transaction already open".into()));
        }
        self.transaction = Some(self.data.clone());
        Ok(())
    }

    async fn commit(&mut self) -> Result<(), StoreError> {
        self.check()?;
        if self.transaction.take().is_none() {
            return Err(StoreError::Transaction("commit without open transaction".into()));
        }
        self.savepoints.clear();
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), StoreError> {
        if let Some(snapshot) = self.transaction.take() {
            self.data = snapshot;
        }
        self.savepoints.clear();
        Ok(())
    }

    async fn savepoint(&mut self, name: &str) -> Result<(), StoreError> {
        self.check()?;
        if self.transaction.is_none() {
            return Err(StoreError::Transaction("savepoint outside transaction".into()));
        }
        self.savepoints.push((name.to_string(), self.data.clone()));
        Ok(())
    }

    async fn release_savepoint(&mut self, name: &str) -> Result<(), StoreError> {
        self.check()?;
        let idx = self.savepoint_index(name)?;
        self.savepoints.truncate(idx);
        Ok(())
    }

    async fn rollback_to_savepoint(&mut self, name: &str) -> Result<(), StoreError> {
        self.check()?;
        let idx = self.savepoint_index(name)?;
        self.data = self.savepoints[idx].1.clone();
        self.savepoints.truncate(idx + 1);
        Ok(())
    }

    fn in_transaction(&self) -> bool {
        self.transaction.is_some()
    }

    async fn find_id(
        &mut self,
        table: &str,
        filter: &[Column],
        live_only: bool,
    ) -> Result<Option<DbId>, StoreError> {
        self.check()?;
        Ok(self
            .rows(table)
            .iter()
            .filter(|row| !(live_only && row.is_deleted()))
            .find(|row| row.matches(filter))
            .map(|row| row.id))
    }

    async fn insert(&mut self, table: &str, row: &[Column]) -> Result<DbId, StoreError> {
        self.check()?;
        self.check_rules(table, row)?;
        Ok(self.seed(table, row.to_vec()))
    }

    async fn update(&mut self, table: &str, id: DbId, row: &[Column]) -> Result<(), StoreError> {
        self.check()?;
        self.check_rules(table, row)?;
        let stored = self
            .data
            .tables
            .get_mut(table)
            .and_then(|rows| rows.iter_mut().find(|r| r.id == id))
            .ok_or_else(|| StoreError::Statement(format!("no row {id} in {table}")))?;
        for column in row {
            stored.columns.insert(column.name, column.value.clone());
        }
        Ok(())
    }

    async fn delete_where(&mut self, table: &str, filter: &[Column]) -> Result<u64, StoreError> {
        self.check()?;
        let Some(rows) = self.data.tables.get_mut(table) else {
            return Ok(0);
        };
        let before = rows.len();
        rows.retain(|row| !row.matches(filter));
        Ok((before - rows.len()) as u64)
    }
}

impl MemoryStore {
    fn savepoint_index(&self, name: &str) -> Result<usize, StoreError> {
        self.savepoints
            .iter()
            .rposition(|(n, _)| n == name)
            .ok_or_else(|| StoreError::Transaction(format!("unknown savepoint `{name}`")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    const TABLE: &str = "game_config.items";

    fn row(code: &str) -> Vec<Column> {
        vec![Column::new("item_code", SqlValue::text(code))]
    }

    #[tokio::test]
    async fn rollback_restores_the_snapshot() {
        let mut store = MemoryStore::new();
        store.insert(TABLE, &row("A")).await.unwrap();
        store.begin().await.unwrap();
        store.insert(TABLE, &row("B")).await.unwrap();
        store.rollback().await.unwrap();
        assert_eq!(store.count(TABLE), 1);
        assert!(!store.in_transaction());
    }

    #[tokio::test]
    async fn savepoints_undo_only_later_writes() {
        let mut store = MemoryStore::new();
        store.begin().await.unwrap();
        store.insert(TABLE, &row("A")).await.unwrap();
        store.savepoint("record_2").await.unwrap();
        store.insert(TABLE, &row("B")).await.unwrap();
        store.rollback_to_savepoint("record_2").await.unwrap();
        store.release_savepoint("record_2").await.unwrap();
        store.commit().await.unwrap();
        assert_eq!(store.count(TABLE), 1);
        assert!(store.find(TABLE, "item_code", "A").is_some());
    }

    #[tokio::test]
    async fn null_filters_match_missing_columns() {
        let mut store = MemoryStore::new();
        let id = store.insert(TABLE, &row("A")).await.unwrap();
        let found = store
            .find_id(TABLE, &[Column::new("equip_slot", SqlValue::Text(None))], false)
            .await
            .unwrap();
        assert_eq!(found, Some(id));
    }

    #[tokio::test]
    async fn live_lookup_ignores_tombstones() {
        let mut store = MemoryStore::new();
        store.seed(
            TABLE,
            vec![
                Column::new("item_code", SqlValue::text("A")),
                Column::new("deleted_at", SqlValue::text("2026-01-01")),
            ],
        );
        assert!(store.find_id(TABLE, &row("A"), true).await.unwrap().is_none());
        assert!(store.find_id(TABLE, &row("A"), false).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn injected_failures_are_statement_errors() {
        let mut store = MemoryStore::new();
        store.fail_on(TABLE, "item_code", SqlValue::text("BAD"));
        assert_matches!(store.insert(TABLE, &row("BAD")).await, Err(StoreError::Statement(_)));
        assert!(store.insert(TABLE, &row("GOOD")).await.is_ok());
    }

    #[tokio::test]
    async fn disconnected_store_fails_fatally() {
        let mut store = MemoryStore::new();
        store.disconnect();
        let err = store.find_id(TABLE, &[], false).await.unwrap_err();
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn reference_load_skips_soft_deleted_codes() {
        let mut store = MemoryStore::new();
        store.seed_reference(ReferenceKind::Skill, "SLASH");
        store.seed(
            ReferenceKind::Skill.table(),
            vec![
                Column::new("skill_code", SqlValue::text("OLD")),
                Column::new("deleted_at", SqlValue::text("2026-01-01")),
            ],
        );
        let table = store.load_reference(ReferenceKind::Skill).await.unwrap();
        assert_eq!(table.len(), 1);
        assert!(table.get("OLD").is_none());
    }
}
