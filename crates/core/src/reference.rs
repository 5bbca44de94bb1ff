//! Code -> identifier lookup tables for foreign-key resolution.
//!
//! One [`ReferenceTable`] per [`ReferenceKind`] is loaded by a single bulk
//! query when an import step starts, then held read-only by the
//! [`ReferenceResolver`] owned by that step. Staleness within a step is
//! accepted; nothing is refreshed.

use std::collections::HashMap;

use crate::schema::ReferenceKind;
use crate::types::DbId;

/// Snapshot of one referenced entity kind.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceTable {
    pub kind: ReferenceKind,
    codes: HashMap<String, DbId>,
}

impl ReferenceTable {
    pub fn new(kind: ReferenceKind) -> Self {
        Self {
            kind,
            codes: HashMap::new(),
        }
    }

    pub fn from_rows(kind: ReferenceKind, rows: impl IntoIterator<Item = (String, DbId)>) -> Self {
        Self {
            kind,
            codes: rows.into_iter().collect(),
        }
    }

    pub fn get(&self, code: &str) -> Option<DbId> {
        self.codes.get(code).copied()
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

/// A code that has no row in its reference table.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} `{code}` not found")]
pub struct Unresolved {
    pub kind: ReferenceKind,
    pub code: String,
}

/// Read-only set of reference tables for one import step.
#[derive(Debug, Clone, Default)]
pub struct ReferenceResolver {
    tables: HashMap<ReferenceKind, ReferenceTable>,
}

impl ReferenceResolver {
    pub fn new(tables: impl IntoIterator<Item = ReferenceTable>) -> Self {
        Self {
            tables: tables.into_iter().map(|t| (t.kind, t)).collect(),
        }
    }

    /// Resolve `code` to an identifier. A kind that was never loaded behaves
    /// like an empty table.
    pub fn resolve(&self, kind: ReferenceKind, code: &str) -> Result<DbId, Unresolved> {
        self.tables
            .get(&kind)
            .and_then(|t| t.get(code))
            .ok_or_else(|| Unresolved {
                kind,
                code: code.to_string(),
            })
    }

    pub fn table(&self, kind: ReferenceKind) -> Option<&ReferenceTable> {
        self.tables.get(&kind)
    }
}
