//! Loosely-typed source values and the typed records produced from them.
//!
//! [`RawValue`] is what a record source yields for one cell or JSON member;
//! [`TypedValue`] is what the field mapper produces after coercion. All
//! coercion rules live in [`crate::mapper`].

use indexmap::IndexMap;
use serde_json::Value;

// ---------------------------------------------------------------------------
// Raw values
// ---------------------------------------------------------------------------

/// One cell or JSON member as read from a source, before any coercion.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Null,
    Bool(bool),
    /// A whole number that fits `i64`, kept exact.
    Integer(i64),
    Number(f64),
    Text(String),
    /// A JSON object or array.
    Nested(Value),
}

impl RawValue {
    /// Convert a parsed JSON value into its raw form.
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Integer(i),
                None => n.as_f64().map_or(Self::Null, Self::Number),
            },
            Value::String(s) => Self::Text(s),
            nested @ (Value::Array(_) | Value::Object(_)) => Self::Nested(nested),
        }
    }

    /// Returns `true` for null, blank text, and the literal string `None`
    /// that spreadsheet exports use for empty cells.
    pub fn is_absent(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Text(s) => {
                let trimmed = s.trim();
                trimmed.is_empty() || trimmed == "None"
            }
            _ => false,
        }
    }

    /// Render the value as JSON, for violation reports and log context.
    pub fn to_json(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Bool(b) => Value::Bool(*b),
            Self::Integer(i) => Value::from(*i),
            Self::Number(n) => serde_json::Number::from_f64(*n).map_or(Value::Null, Value::Number),
            Self::Text(s) => Value::String(s.clone()),
            Self::Nested(v) => v.clone(),
        }
    }
}

/// Render a number the way a spreadsheet shows it: integral values have no
/// trailing `.0`.
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// One source row or JSON object. Worksheet rows keep their column order;
/// JSON members come out in `serde_json`'s map order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRecord {
    /// 1-based position in the source (array index or worksheet row).
    pub position: usize,
    pub fields: IndexMap<String, RawValue>,
}

impl RawRecord {
    pub fn new(position: usize) -> Self {
        Self {
            position,
            fields: IndexMap::new(),
        }
    }

    /// Builder-style insert, mostly for tests and fixtures.
    pub fn with(mut self, label: impl Into<String>, value: RawValue) -> Self {
        self.fields.insert(label.into(), value);
        self
    }

    /// Build a record from a JSON object.
    pub fn from_json_object(position: usize, object: serde_json::Map<String, Value>) -> Self {
        let fields = object
            .into_iter()
            .map(|(k, v)| (k, RawValue::from_json(v)))
            .collect();
        Self { position, fields }
    }

    pub fn get(&self, label: &str) -> Option<&RawValue> {
        self.fields.get(label)
    }
}

// ---------------------------------------------------------------------------
// Typed values
// ---------------------------------------------------------------------------

/// A coerced value ready for validation and persistence.
#[derive(Debug, Clone, PartialEq)]
pub enum TypedValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    List(Vec<String>),
    Json(Value),
}

impl TypedValue {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Human-readable form used when building natural-key labels.
    pub fn display(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::Bool(b) => b.to_string(),
            Self::Int(i) => i.to_string(),
            Self::Float(f) => format_number(*f),
            Self::Text(s) => s.clone(),
            Self::List(items) => items.join(","),
            Self::Json(v) => v.to_string(),
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Bool(b) => Value::Bool(*b),
            Self::Int(i) => Value::from(*i),
            Self::Float(f) => serde_json::Number::from_f64(*f).map_or(Value::Null, Value::Number),
            Self::Text(s) => Value::String(s.clone()),
            Self::List(items) => Value::from(items.clone()),
            Self::Json(v) => v.clone(),
        }
    }
}

/// Normalized attribute name -> typed value, in schema order.
pub type FieldMap = IndexMap<String, TypedValue>;

/// One mapped record: normalized fields plus its child collections.
///
/// Produced by the field mapper and never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportRecord {
    pub position: usize,
    /// Natural-key values joined with `.` (e.g. `"WARRIOR.weapon"`).
    pub natural_key: String,
    pub fields: FieldMap,
    /// Child collection name -> entries in source order.
    pub children: IndexMap<String, Vec<FieldMap>>,
}

impl ImportRecord {
    pub fn get(&self, name: &str) -> Option<&TypedValue> {
        self.fields.get(name)
    }

    pub fn children(&self, name: &str) -> &[FieldMap] {
        self.children.get(name).map(Vec::as_slice).unwrap_or(&[])
    }
}
