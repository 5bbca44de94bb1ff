//! PostgreSQL implementation of [`ConfigStore`] over one connection.
//!
//! Statements are assembled from static schema identifiers; every value is a
//! bound parameter. Transactions and savepoints are issued as plain SQL so the
//! engine can keep a step-level transaction open across many records.

use async_trait::async_trait;
use sqlx::postgres::PgArguments;
use sqlx::{Arguments, Connection, PgConnection};
use tsu_core::reference::ReferenceTable;
use tsu_core::schema::ReferenceKind;
use tsu_core::store::{Column, ConfigStore, SqlValue, StoreError};
use tsu_core::types::DbId;

use crate::config::DbProfile;

/// Single-connection store, opened at run start and closed at run end.
pub struct PgStore {
    conn: PgConnection,
    in_transaction: bool,
}

impl PgStore {
    /// Connect using a resolved profile.
    pub async fn connect(profile: &DbProfile) -> Result<Self, StoreError> {
        let mut conn = PgConnection::connect_with(&profile.connect_options())
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        let version: String = sqlx::query_scalar("SELECT version()")
            .fetch_one(&mut conn)
            .await
            .map_err(classify)?;
        tracing::info!(profile = %profile, %version, "Connected to database");

        Ok(Self::from_connection(conn))
    }

    /// Wrap an already-open connection.
    pub fn from_connection(conn: PgConnection) -> Self {
        Self {
            conn,
            in_transaction: false,
        }
    }

    /// Underlying connection, for queries outside the import pipeline.
    pub fn connection(&mut self) -> &mut PgConnection {
        &mut self.conn
    }

    /// Roll back any open transaction and close the connection.
    pub async fn close(mut self) -> Result<(), StoreError> {
        if self.in_transaction {
            self.rollback().await?;
        }
        self.conn
            .close()
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))
    }

    async fn execute_raw(&mut self, sql: &str) -> Result<(), StoreError> {
        sqlx::Executor::execute(&mut self.conn, sqlx::raw_sql(sql))
            .await
            .map_err(classify)?;
        Ok(())
    }
}

#[async_trait]
impl ConfigStore for PgStore {
    async fn load_reference(&mut self, kind: ReferenceKind) -> Result<ReferenceTable, StoreError> {
        let filter = if kind.soft_deletes() {
            " WHERE deleted_at IS NULL"
        } else {
            ""
        };
        let query = format!(
            "SELECT {code}, id FROM {table}{filter}",
            code = kind.code_column(),
            table = kind.table(),
        );
        let rows = sqlx::query_as::<_, (String, DbId)>(&query)
            .fetch_all(&mut self.conn)
            .await
            .map_err(classify)?;
        tracing::debug!(kind = %kind, count = rows.len(), "Loaded reference table");
        Ok(ReferenceTable::from_rows(kind, rows))
    }

    async fn begin(&mut self) -> Result<(), StoreError> {
        if self.in_transaction {
            return Err(StoreError::Transaction("transaction already open".into()));
        }
        self.execute_raw("BEGIN").await?;
        self.in_transaction = true;
        Ok(())
    }

    async fn commit(&mut self) -> Result<(), StoreError> {
        if !self.in_transaction {
            return Err(StoreError::Transaction("commit without open transaction".into()));
        }
        self.in_transaction = false;
        self.execute_raw("COMMIT").await
    }

    async fn rollback(&mut self) -> Result<(), StoreError> {
        if !self.in_transaction {
            return Ok(());
        }
        self.in_transaction = false;
        self.execute_raw("ROLLBACK").await
    }

    async fn savepoint(&mut self, name: &str) -> Result<(), StoreError> {
        let name = savepoint_name(name)?;
        self.execute_raw(&format!("SAVEPOINT {name}")).await
    }

    async fn release_savepoint(&mut self, name: &str) -> Result<(), StoreError> {
        let name = savepoint_name(name)?;
        self.execute_raw(&format!("RELEASE SAVEPOINT {name}")).await
    }

    async fn rollback_to_savepoint(&mut self, name: &str) -> Result<(), StoreError> {
        let name = savepoint_name(name)?;
        self.execute_raw(&format!("ROLLBACK TO SAVEPOINT {name}")).await
    }

    fn in_transaction(&self) -> bool {
        self.in_transaction
    }

    async fn find_id(
        &mut self,
        table: &str,
        filter: &[Column],
        live_only: bool,
    ) -> Result<Option<DbId>, StoreError> {
        let (mut where_clause, params) = where_clause(filter, 1);
        if live_only {
            let joiner = if where_clause.is_empty() { "WHERE" } else { " AND" };
            where_clause.push_str(joiner);
            where_clause.push_str(" deleted_at IS NULL");
        }
        let query = format!("SELECT id FROM {table} {where_clause} LIMIT 1");
        let args = arguments(params)?;
        sqlx::query_scalar_with::<_, DbId, _>(&query, args)
            .fetch_optional(&mut self.conn)
            .await
            .map_err(classify)
    }

    async fn insert(&mut self, table: &str, row: &[Column]) -> Result<DbId, StoreError> {
        let columns: Vec<&str> = row.iter().map(|c| c.name).collect();
        let placeholders: Vec<String> = row
            .iter()
            .enumerate()
            .map(|(idx, c)| placeholder(idx + 1, c.cast))
            .collect();
        let query = format!(
            "INSERT INTO {table} ({}) VALUES ({}) RETURNING id",
            columns.join(", "),
            placeholders.join(", "),
        );
        let args = arguments(row.iter().map(|c| &c.value))?;
        sqlx::query_scalar_with::<_, DbId, _>(&query, args)
            .fetch_one(&mut self.conn)
            .await
            .map_err(classify)
    }

    async fn update(&mut self, table: &str, id: DbId, row: &[Column]) -> Result<(), StoreError> {
        let assignments: Vec<String> = row
            .iter()
            .enumerate()
            .map(|(idx, c)| format!("{} = {}", c.name, placeholder(idx + 1, c.cast)))
            .collect();
        let id_param = row.len() + 1;
        let query = format!(
            "UPDATE {table} SET {} WHERE id = ${id_param}",
            assignments.join(", "),
        );
        let id_value = SqlValue::id(id);
        let args = arguments(row.iter().map(|c| &c.value).chain(std::iter::once(&id_value)))?;
        sqlx::query_with(&query, args)
            .execute(&mut self.conn)
            .await
            .map_err(classify)?;
        Ok(())
    }

    async fn delete_where(&mut self, table: &str, filter: &[Column]) -> Result<u64, StoreError> {
        let (where_clause, params) = where_clause(filter, 1);
        let query = format!("DELETE FROM {table} {where_clause}");
        let args = arguments(params)?;
        let result = sqlx::query_with(&query, args)
            .execute(&mut self.conn)
            .await
            .map_err(classify)?;
        Ok(result.rows_affected())
    }
}

// ---------------------------------------------------------------------------
// SQL assembly
// ---------------------------------------------------------------------------

fn placeholder(idx: usize, cast: Option<&str>) -> String {
    match cast {
        Some(sql_type) => format!("${idx}::{sql_type}"),
        None => format!("${idx}"),
    }
}

/// Build `WHERE a = $1 AND b IS NULL ...`; null filters bind nothing.
fn where_clause(filter: &[Column], first_param: usize) -> (String, Vec<&SqlValue>) {
    let mut conditions: Vec<String> = Vec::new();
    let mut params = Vec::new();
    let mut param_idx = first_param;

    for column in filter {
        if column.value.is_null() {
            conditions.push(format!("{} IS NULL", column.name));
        } else {
            conditions.push(format!(
                "{} = {}",
                column.name,
                placeholder(param_idx, column.cast)
            ));
            params.push(&column.value);
            param_idx += 1;
        }
    }

    let clause = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };
    (clause, params)
}

fn arguments<'a>(values: impl IntoIterator<Item = &'a SqlValue>) -> Result<PgArguments, StoreError> {
    let mut args = PgArguments::default();
    for value in values {
        let added = match value {
            SqlValue::Bool(v) => args.add(*v),
            SqlValue::Int(v) => args.add(*v),
            SqlValue::Float(v) => args.add(*v),
            SqlValue::Text(v) => args.add(v.clone()),
            SqlValue::TextList(v) => args.add(v.clone()),
            SqlValue::Json(v) => args.add(v.clone().map(sqlx::types::Json)),
        };
        added.map_err(|e| StoreError::Statement(format!("cannot bind parameter: {e}")))?;
    }
    Ok(args)
}

/// Only word characters are allowed in savepoint names.
fn savepoint_name(name: &str) -> Result<&str, StoreError> {
    if !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Ok(name)
    } else {
        Err(StoreError::Transaction(format!("invalid savepoint name `{name}`")))
    }
}

/// Split driver errors into record-level and run-level failures.
pub(crate) fn classify(err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let code = db_err.code().map(|c| c.to_string()).unwrap_or_default();
            if code.is_empty() {
                StoreError::Statement(db_err.message().to_string())
            } else {
                StoreError::Statement(format!("{} (SQLSTATE {code})", db_err.message()))
            }
        }
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::Protocol(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => StoreError::Connection(err.to_string()),
        other => StoreError::Statement(other.to_string()),
    }
}
