//! Validation rule and result types.

use indexmap::IndexMap;
use serde::Serialize;

use crate::types::DbId;

/// The rule a violation was raised by.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    Required,
    TypeCheck,
    Range,
    EnumValues,
    Reference,
}

impl RuleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Required => "required",
            Self::TypeCheck => "type_check",
            Self::Range => "range",
            Self::EnumValues => "enum_values",
            Self::Reference => "reference",
        }
    }
}

/// A single field-level rule violation.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FieldViolation {
    /// Field path, e.g. `monster_level` or `drops[1].drop_chance`.
    pub field: String,
    pub rule: RuleKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
}

impl std::fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Resolved reference column -> identifier (`None` for an absent or
/// unresolved optional reference).
pub type ResolvedReferences = IndexMap<&'static str, Option<DbId>>;

/// Aggregated result of validating one record.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<FieldViolation>,
    /// Informational only, e.g. an optional reference that did not resolve.
    pub warnings: Vec<FieldViolation>,
    pub references: ResolvedReferences,
}

impl ValidationResult {
    /// All error messages joined for a single log line.
    pub fn summary(&self) -> String {
        self.errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ")
    }
}
