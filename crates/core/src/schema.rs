//! Declarative per-entity-kind schemas.
//!
//! Every importable entity kind is described by one static [`EntitySchema`]:
//! its target table, natural key, typed fields with defaults and ranges, the
//! foreign-key references it resolves, and the child collections that are
//! fully replaced on every upsert. The mapper, validator, and upsert engine
//! are all driven from these tables; nothing downstream is entity-specific.

use std::fmt;

use serde_json::Value;

use crate::value::TypedValue;

// ---------------------------------------------------------------------------
// Reference kinds
// ---------------------------------------------------------------------------

/// An entity kind that other records refer to by code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ReferenceKind {
    Skill,
    DropPool,
    Tag,
    Class,
    Item,
}

impl ReferenceKind {
    pub const ALL: &'static [ReferenceKind] = &[
        Self::Skill,
        Self::DropPool,
        Self::Tag,
        Self::Class,
        Self::Item,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Skill => "skill",
            Self::DropPool => "drop_pool",
            Self::Tag => "tag",
            Self::Class => "class",
            Self::Item => "item",
        }
    }

    /// Table holding the referenced rows.
    pub fn table(&self) -> &'static str {
        match self {
            Self::Skill => "game_config.skills",
            Self::DropPool => "game_config.drop_pools",
            Self::Tag => "game_config.tags",
            Self::Class => "game_config.classes",
            Self::Item => "game_config.items",
        }
    }

    /// Column carrying the natural-key code.
    pub fn code_column(&self) -> &'static str {
        match self {
            Self::Skill => "skill_code",
            Self::DropPool => "pool_code",
            Self::Tag => "tag_code",
            Self::Class => "class_code",
            Self::Item => "item_code",
        }
    }

    /// Whether soft-deleted rows (`deleted_at IS NOT NULL`) must be excluded.
    pub fn soft_deletes(&self) -> bool {
        matches!(self, Self::Skill | Self::DropPool | Self::Tag)
    }
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Field kinds, defaults, ranges
// ---------------------------------------------------------------------------

/// Target type of a normalized field. Coercion rules live in the mapper.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldKind {
    Text,
    /// Text, lowercased.
    Keyword,
    Integer,
    Decimal,
    Bool,
    Json,
    /// Comma- or semicolon-delimited list of strings.
    StringList,
    /// Text mapped through a lookup table: the first key contained in the
    /// raw text wins.
    Choice(&'static [(&'static str, &'static str)]),
}

impl FieldKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Text | Self::Keyword | Self::Choice(_) => "string",
            Self::Integer => "integer",
            Self::Decimal => "number",
            Self::Bool => "boolean",
            Self::Json => "json",
            Self::StringList => "list",
        }
    }

    /// Whether `value` already has this kind's typed shape. `Null` always
    /// matches; presence is a separate rule.
    pub fn accepts(&self, value: &TypedValue) -> bool {
        match (self, value) {
            (_, TypedValue::Null) => true,
            (Self::Text | Self::Keyword | Self::Choice(_), TypedValue::Text(_)) => true,
            (Self::Integer, TypedValue::Int(_)) => true,
            (Self::Decimal, TypedValue::Float(_) | TypedValue::Int(_)) => true,
            (Self::Bool, TypedValue::Bool(_)) => true,
            (Self::Json, TypedValue::Json(_)) => true,
            (Self::StringList, TypedValue::List(_)) => true,
            _ => false,
        }
    }
}

/// Value applied when an optional field is absent from the source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldDefault {
    /// Stored as NULL.
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(&'static str),
    EmptyObject,
    EmptyArray,
    EmptyList,
}

impl FieldDefault {
    pub fn value(&self) -> TypedValue {
        match self {
            Self::None => TypedValue::Null,
            Self::Bool(b) => TypedValue::Bool(*b),
            Self::Int(i) => TypedValue::Int(*i),
            Self::Float(f) => TypedValue::Float(*f),
            Self::Text(s) => TypedValue::Text((*s).to_string()),
            Self::EmptyObject => TypedValue::Json(Value::Object(Default::default())),
            Self::EmptyArray => TypedValue::Json(Value::Array(Vec::new())),
            Self::EmptyList => TypedValue::List(Vec::new()),
        }
    }
}

/// One end of a numeric range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Bound {
    Inclusive(f64),
    Exclusive(f64),
    Unbounded,
}

/// Numeric domain of a field, e.g. `[1, 100]` or `(0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumericRange {
    pub min: Bound,
    pub max: Bound,
}

impl NumericRange {
    pub const fn inclusive(min: f64, max: f64) -> Self {
        Self {
            min: Bound::Inclusive(min),
            max: Bound::Inclusive(max),
        }
    }

    /// `(0, 1]`: zero is rejected, one is accepted.
    pub const fn probability() -> Self {
        Self {
            min: Bound::Exclusive(0.0),
            max: Bound::Inclusive(1.0),
        }
    }

    /// `(0, +inf)`.
    pub const fn positive() -> Self {
        Self {
            min: Bound::Exclusive(0.0),
            max: Bound::Unbounded,
        }
    }

    /// `[min, +inf)`.
    pub const fn at_least(min: f64) -> Self {
        Self {
            min: Bound::Inclusive(min),
            max: Bound::Unbounded,
        }
    }

    pub fn contains(&self, n: f64) -> bool {
        let above = match self.min {
            Bound::Inclusive(min) => n >= min,
            Bound::Exclusive(min) => n > min,
            Bound::Unbounded => true,
        };
        let below = match self.max {
            Bound::Inclusive(max) => n <= max,
            Bound::Exclusive(max) => n < max,
            Bound::Unbounded => true,
        };
        above && below
    }
}

impl fmt::Display for NumericRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.min {
            Bound::Inclusive(min) => write!(f, "[{min}, ")?,
            Bound::Exclusive(min) => write!(f, "({min}, ")?,
            Bound::Unbounded => f.write_str("(-inf, ")?,
        }
        match self.max {
            Bound::Inclusive(max) => write!(f, "{max}]"),
            Bound::Exclusive(max) => write!(f, "{max})"),
            Bound::Unbounded => f.write_str("+inf)"),
        }
    }
}

// ---------------------------------------------------------------------------
// Field and reference specs
// ---------------------------------------------------------------------------

/// One normalized attribute of an entity kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldSpec {
    /// Normalized attribute name.
    pub name: &'static str,
    /// Extra raw labels accepted for this field, checked after `name`.
    pub labels: &'static [&'static str],
    pub kind: FieldKind,
    /// Target column; `None` means the column is named like the field.
    pub column: Option<&'static str>,
    /// Postgres type the bound parameter is cast to (enum columns).
    pub sql_type: Option<&'static str>,
    pub required: bool,
    pub default: FieldDefault,
    pub range: Option<NumericRange>,
    /// Enumerated domain; empty means unrestricted.
    pub allowed: &'static [&'static str],
}

impl FieldSpec {
    pub const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            labels: &[],
            kind,
            column: None,
            sql_type: None,
            required: false,
            default: FieldDefault::None,
            range: None,
            allowed: &[],
        }
    }

    pub const fn text(name: &'static str) -> Self {
        Self::new(name, FieldKind::Text)
    }

    pub const fn keyword(name: &'static str) -> Self {
        Self::new(name, FieldKind::Keyword)
    }

    pub const fn int(name: &'static str) -> Self {
        Self::new(name, FieldKind::Integer)
    }

    pub const fn decimal(name: &'static str) -> Self {
        Self::new(name, FieldKind::Decimal)
    }

    pub const fn flag(name: &'static str) -> Self {
        Self::new(name, FieldKind::Bool)
    }

    pub const fn json(name: &'static str) -> Self {
        Self::new(name, FieldKind::Json)
    }

    pub const fn list(name: &'static str) -> Self {
        Self::new(name, FieldKind::StringList)
    }

    pub const fn choice(name: &'static str, table: &'static [(&'static str, &'static str)]) -> Self {
        Self::new(name, FieldKind::Choice(table))
    }

    pub const fn labels(mut self, labels: &'static [&'static str]) -> Self {
        self.labels = labels;
        self
    }

    pub const fn column(mut self, column: &'static str) -> Self {
        self.column = Some(column);
        self
    }

    pub const fn sql_type(mut self, sql_type: &'static str) -> Self {
        self.sql_type = Some(sql_type);
        self
    }

    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub const fn default(mut self, default: FieldDefault) -> Self {
        self.default = default;
        self
    }

    pub const fn range(mut self, range: NumericRange) -> Self {
        self.range = Some(range);
        self
    }

    pub const fn allowed(mut self, allowed: &'static [&'static str]) -> Self {
        self.allowed = allowed;
        self
    }

    pub fn column_name(&self) -> &'static str {
        self.column.unwrap_or(self.name)
    }

    /// The field name followed by every alternative label.
    pub fn all_labels(&self) -> impl Iterator<Item = &'static str> {
        std::iter::once(self.name).chain(self.labels.iter().copied())
    }
}

/// A field whose code must be resolved to another entity's identifier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReferenceSpec {
    /// Normalized name under which the code is kept in the record.
    pub name: &'static str,
    pub labels: &'static [&'static str],
    pub kind: ReferenceKind,
    /// Column receiving the resolved identifier.
    pub column: &'static str,
    /// Unresolved required references fail validation; unresolved optional
    /// ones are stored as NULL.
    pub required: bool,
}

impl ReferenceSpec {
    pub const fn required(name: &'static str, kind: ReferenceKind, column: &'static str) -> Self {
        Self {
            name,
            labels: &[],
            kind,
            column,
            required: true,
        }
    }

    pub const fn optional(name: &'static str, kind: ReferenceKind, column: &'static str) -> Self {
        Self {
            required: false,
            ..Self::required(name, kind, column)
        }
    }

    pub const fn labels(mut self, labels: &'static [&'static str]) -> Self {
        self.labels = labels;
        self
    }

    pub fn all_labels(&self) -> impl Iterator<Item = &'static str> {
        std::iter::once(self.name).chain(self.labels.iter().copied())
    }
}

// ---------------------------------------------------------------------------
// Child collections
// ---------------------------------------------------------------------------

/// How a child collection appears in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildShape {
    /// An array of objects, e.g. `"skills": [{"skill_code": "X", ...}]`.
    Objects,
    /// A list of bare codes, e.g. `"tags": ["BOSS", "UNDEAD"]` or `"BOSS,UNDEAD"`.
    Codes,
}

/// A dependent association table replaced wholesale on every upsert.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChildSpec {
    /// Collection name in the record and the source.
    pub name: &'static str,
    pub shape: ChildShape,
    pub table: &'static str,
    /// Column holding the parent's identifier.
    pub parent_column: &'static str,
    /// Fixed `(column, value)` pair for polymorphic association tables.
    pub discriminator: Option<(&'static str, &'static str)>,
    /// Each entry's link target; unresolved links are skipped.
    pub reference: ReferenceSpec,
    pub fields: &'static [FieldSpec],
    /// Counter name used in run statistics, e.g. `skills_added`.
    pub counter: &'static str,
}

// ---------------------------------------------------------------------------
// Entity schema
// ---------------------------------------------------------------------------

/// Declarative description of one importable entity kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntitySchema {
    /// Category name used in statistics and logs, e.g. `monsters`.
    pub kind: &'static str,
    pub table: &'static str,
    /// Field or reference names forming the natural key, in order.
    pub natural_key: &'static [&'static str],
    pub fields: &'static [FieldSpec],
    pub references: &'static [ReferenceSpec],
    pub children: &'static [ChildSpec],
    /// Rows with `deleted_at` set are tombstones: the natural-key lookup
    /// ignores them, so a re-imported record is created afresh.
    pub soft_deletes: bool,
}

impl EntitySchema {
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn reference(&self, name: &str) -> Option<&ReferenceSpec> {
        self.references.iter().find(|r| r.name == name)
    }

    pub fn child(&self, name: &str) -> Option<&ChildSpec> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Every reference kind this schema resolves, parent and children, in a
    /// stable order without duplicates.
    pub fn reference_kinds(&self) -> Vec<ReferenceKind> {
        let mut kinds: Vec<ReferenceKind> = self
            .references
            .iter()
            .map(|r| r.kind)
            .chain(self.children.iter().map(|c| c.reference.kind))
            .collect();
        kinds.sort();
        kinds.dedup();
        kinds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TAG_CATEGORIES: &[(&str, &str)] = &[("skill", "skill")];

    const FIELDS: &[FieldSpec] = &[
        FieldSpec::text("monster_code").required(),
        FieldSpec::int("monster_level")
            .required()
            .range(NumericRange::inclusive(1.0, 100.0)),
        FieldSpec::flag("is_active").default(FieldDefault::Bool(true)),
        FieldSpec::choice("category", TAG_CATEGORIES).column("tag_category"),
    ];

    const CHILDREN: &[ChildSpec] = &[ChildSpec {
        name: "tags",
        shape: ChildShape::Codes,
        table: "game_config.tags_relations",
        parent_column: "entity_id",
        discriminator: Some(("entity_type", "monster")),
        reference: ReferenceSpec::required("tag_code", ReferenceKind::Tag, "tag_id"),
        fields: &[],
        counter: "tags_added",
    }];

    const SCHEMA: EntitySchema = EntitySchema {
        kind: "monsters",
        table: "game_config.monsters",
        natural_key: &["monster_code"],
        fields: FIELDS,
        references: &[ReferenceSpec::optional(
            "required_class_code",
            ReferenceKind::Class,
            "required_class_id",
        )],
        children: CHILDREN,
        soft_deletes: false,
    };

    #[test]
    fn probability_excludes_zero_and_includes_one() {
        let range = NumericRange::probability();
        assert!(!range.contains(0.0));
        assert!(range.contains(0.0001));
        assert!(range.contains(1.0));
        assert!(!range.contains(1.0001));
    }

    #[test]
    fn inclusive_range_accepts_both_ends() {
        let range = NumericRange::inclusive(1.0, 100.0);
        assert!(range.contains(1.0));
        assert!(range.contains(100.0));
        assert!(!range.contains(0.0));
        assert!(!range.contains(101.0));
    }

    #[test]
    fn ranges_render_with_bracket_notation() {
        assert_eq!(NumericRange::probability().to_string(), "(0, 1]");
        assert_eq!(NumericRange::inclusive(0.0, 99.0).to_string(), "[0, 99]");
        assert_eq!(NumericRange::positive().to_string(), "(0, +inf)");
    }

    #[test]
    fn const_builders_compose() {
        let level = SCHEMA.field("monster_level").unwrap();
        assert!(level.required);
        assert_eq!(level.range, Some(NumericRange::inclusive(1.0, 100.0)));
        assert_eq!(SCHEMA.field("category").unwrap().column_name(), "tag_category");
        assert_eq!(SCHEMA.field("is_active").unwrap().column_name(), "is_active");
    }

    #[test]
    fn defaults_produce_typed_values() {
        assert_eq!(FieldDefault::Bool(true).value(), TypedValue::Bool(true));
        assert_eq!(FieldDefault::Text("none").value(), TypedValue::Text("none".into()));
        assert_eq!(FieldDefault::None.value(), TypedValue::Null);
        assert_eq!(
            FieldDefault::EmptyArray.value(),
            TypedValue::Json(Value::Array(vec![]))
        );
    }

    #[test]
    fn reference_kinds_cover_parent_and_children() {
        assert_eq!(
            SCHEMA.reference_kinds(),
            vec![ReferenceKind::Tag, ReferenceKind::Class]
        );
    }

    #[test]
    fn decimal_fields_accept_integers() {
        assert!(FieldKind::Decimal.accepts(&TypedValue::Int(1)));
        assert!(!FieldKind::Integer.accepts(&TypedValue::Text("1.5".into())));
        assert!(FieldKind::Json.accepts(&TypedValue::Null));
    }
}
