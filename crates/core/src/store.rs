//! Persistence seam for the import pipeline.
//!
//! The upsert engine talks to the database only through [`ConfigStore`].
//! Table and column names always come from static entity schemas; values are
//! always bound as typed parameters ([`SqlValue`]).

use async_trait::async_trait;
use serde_json::Value;

use crate::reference::ReferenceTable;
use crate::schema::{FieldKind, ReferenceKind};
use crate::types::DbId;
use crate::value::TypedValue;

/// A bindable parameter. Nulls keep their SQL type so the database never
/// has to guess a column type from an untyped NULL.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Bool(Option<bool>),
    Int(Option<i64>),
    Float(Option<f64>),
    Text(Option<String>),
    TextList(Option<Vec<String>>),
    Json(Option<Value>),
}

impl SqlValue {
    /// Convert a validated typed value for a column of `kind`.
    pub fn from_typed(kind: FieldKind, value: &TypedValue) -> Self {
        match kind {
            FieldKind::Text | FieldKind::Keyword | FieldKind::Choice(_) => {
                Self::Text(match value {
                    TypedValue::Null => None,
                    other => Some(other.display()),
                })
            }
            FieldKind::Integer => Self::Int(match value {
                TypedValue::Int(i) => Some(*i),
                TypedValue::Float(f) if f.fract() == 0.0 => Some(*f as i64),
                _ => None,
            }),
            FieldKind::Decimal => Self::Float(value.as_f64()),
            FieldKind::Bool => Self::Bool(match value {
                TypedValue::Bool(b) => Some(*b),
                _ => None,
            }),
            FieldKind::Json => Self::Json(match value {
                TypedValue::Null => None,
                other => Some(other.to_json()),
            }),
            FieldKind::StringList => Self::TextList(match value {
                TypedValue::List(items) => Some(items.clone()),
                _ => None,
            }),
        }
    }

    pub fn id(id: DbId) -> Self {
        Self::Int(Some(id))
    }

    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(Some(s.into()))
    }

    pub fn text_value(&self) -> Option<&str> {
        match self {
            Self::Text(Some(s)) => Some(s),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        match self {
            Self::Bool(v) => v.is_none(),
            Self::Int(v) => v.is_none(),
            Self::Float(v) => v.is_none(),
            Self::Text(v) => v.is_none(),
            Self::TextList(v) => v.is_none(),
            Self::Json(v) => v.is_none(),
        }
    }
}

/// One column assignment or equality filter.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: &'static str,
    pub value: SqlValue,
    /// Postgres type the parameter is cast to, e.g. an enum type.
    pub cast: Option<&'static str>,
}

impl Column {
    pub fn new(name: &'static str, value: SqlValue) -> Self {
        Self {
            name,
            value,
            cast: None,
        }
    }

    pub fn cast(mut self, cast: Option<&'static str>) -> Self {
        self.cast = cast;
        self
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The connection is unusable; the run cannot continue.
    #[error("Connection error: {0}")]
    Connection(String),

    /// A single statement was rejected; only the current record is affected.
    #[error("Statement error: {0}")]
    Statement(String),

    /// Transaction bookkeeping went wrong (e.g. commit without begin).
    #[error("Transaction error: {0}")]
    Transaction(String),
}

impl StoreError {
    /// Whether the error must abort the run rather than one record.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Statement(_))
    }
}

/// Database operations the import pipeline needs.
///
/// Implementations hold a single connection; every call completes before the
/// next one is issued.
#[async_trait]
pub trait ConfigStore: Send {
    /// Bulk-load the code -> id table for one reference kind.
    async fn load_reference(&mut self, kind: ReferenceKind) -> Result<ReferenceTable, StoreError>;

    async fn begin(&mut self) -> Result<(), StoreError>;
    async fn commit(&mut self) -> Result<(), StoreError>;
    async fn rollback(&mut self) -> Result<(), StoreError>;
    async fn savepoint(&mut self, name: &str) -> Result<(), StoreError>;
    async fn release_savepoint(&mut self, name: &str) -> Result<(), StoreError>;
    async fn rollback_to_savepoint(&mut self, name: &str) -> Result<(), StoreError>;
    fn in_transaction(&self) -> bool;

    /// Identifier of the row matching every filter column, if any. With
    /// `live_only`, rows whose `deleted_at` is set never match.
    async fn find_id(
        &mut self,
        table: &str,
        filter: &[Column],
        live_only: bool,
    ) -> Result<Option<DbId>, StoreError>;

    /// Insert one row and return its generated identifier.
    async fn insert(&mut self, table: &str, row: &[Column]) -> Result<DbId, StoreError>;

    async fn update(&mut self, table: &str, id: DbId, row: &[Column]) -> Result<(), StoreError>;

    /// Delete every row matching all filter columns (all rows when empty).
    async fn delete_where(&mut self, table: &str, filter: &[Column]) -> Result<u64, StoreError>;
}
