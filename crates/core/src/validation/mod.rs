//! Record validation.
//!
//! Checks required fields, type conformance, numeric ranges, enumerated
//! domains, and referential integrity before any mutation is attempted.

pub mod evaluator;
pub mod rules;

pub use evaluator::validate_record;
pub use rules::{FieldViolation, ResolvedReferences, RuleKind, ValidationResult};
