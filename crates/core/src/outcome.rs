//! Per-record upsert outcomes.

use std::fmt;

use serde::Serialize;

use crate::types::DbId;
use crate::validation::FieldViolation;

/// Why a record was not persisted without being an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The named natural-key field was absent.
    MissingNaturalKey(&'static str),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingNaturalKey(field) => write!(f, "missing natural key `{field}`"),
        }
    }
}

/// Why a record failed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RecordError {
    #[error("validation failed: {}", join_violations(.0))]
    Invalid(Vec<FieldViolation>),

    #[error("statement failed: {0}")]
    Statement(String),
}

fn join_violations(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Tagged result of attempting to persist one record.
#[derive(Debug, Clone, PartialEq)]
pub enum UpsertOutcome {
    Created(DbId),
    Updated(DbId),
    Skipped(SkipReason),
    Failed(RecordError),
}

impl UpsertOutcome {
    pub fn kind(&self) -> OutcomeKind {
        match self {
            Self::Created(_) => OutcomeKind::Created,
            Self::Updated(_) => OutcomeKind::Updated,
            Self::Skipped(_) => OutcomeKind::Skipped,
            Self::Failed(_) => OutcomeKind::Failed,
        }
    }

    pub fn id(&self) -> Option<DbId> {
        match self {
            Self::Created(id) | Self::Updated(id) => Some(*id),
            _ => None,
        }
    }
}

/// Outcome discriminant, used as a counter key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    Created,
    Updated,
    Skipped,
    Failed,
}

impl OutcomeKind {
    pub const ALL: &'static [OutcomeKind] =
        &[Self::Created, Self::Updated, Self::Skipped, Self::Failed];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Skipped => "skipped",
            Self::Failed => "failed",
        }
    }
}

/// Child associations written (and skipped) for one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkTally {
    /// Counter name, e.g. `skills_added`.
    pub counter: &'static str,
    pub added: u64,
    pub skipped: u64,
}

/// Everything the reporter needs to know about one processed record.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordReport {
    pub category: &'static str,
    pub position: usize,
    /// Empty when the record had no natural key.
    pub natural_key: String,
    pub outcome: UpsertOutcome,
    /// Empty unless the outcome is `Created` or `Updated`.
    pub links: Vec<LinkTally>,
}

impl RecordReport {
    pub fn new(category: &'static str, position: usize, natural_key: impl Into<String>, outcome: UpsertOutcome) -> Self {
        Self {
            category,
            position,
            natural_key: natural_key.into(),
            outcome,
            links: Vec::new(),
        }
    }

    pub fn with_links(mut self, links: Vec<LinkTally>) -> Self {
        self.links = links;
        self
    }
}
