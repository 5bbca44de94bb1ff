//! Field mapper: raw source records to typed [`ImportRecord`]s.
//!
//! All coercion rules are centralized here. Unknown raw labels are ignored,
//! absent optional fields receive their declared default, and records whose
//! natural key is absent are dropped before mapping completes.

use serde_json::Value;

use crate::schema::{ChildShape, ChildSpec, EntitySchema, FieldKind, FieldSpec};
use crate::value::{format_number, FieldMap, ImportRecord, RawRecord, RawValue, TypedValue};

/// Tokens accepted as `true` (compared case-insensitively).
pub const TRUTHY_TOKENS: &[&str] = &["true", "yes", "y", "1", "t"];

/// Separator used when joining composite natural keys.
pub const KEY_SEPARATOR: &str = ".";

/// Result of mapping one raw record.
#[derive(Debug, Clone, PartialEq)]
pub enum MapOutcome {
    Mapped(ImportRecord),
    /// The record cannot be upserted; it is counted as skipped, not failed.
    MissingNaturalKey { position: usize, field: &'static str },
}

/// Map one raw record against its entity schema.
pub fn map_record(schema: &EntitySchema, raw: &RawRecord) -> MapOutcome {
    let mut key_parts = Vec::with_capacity(schema.natural_key.len());
    for &key in schema.natural_key {
        let labels: Vec<&'static str> = match (schema.field(key), schema.reference(key)) {
            (Some(field), _) => field.all_labels().collect(),
            (None, Some(reference)) => reference.all_labels().collect(),
            (None, None) => vec![key],
        };
        match lookup(raw, labels) {
            Some(value) => key_parts.push(text_of(value)),
            None => {
                return MapOutcome::MissingNaturalKey {
                    position: raw.position,
                    field: key,
                }
            }
        }
    }

    let mut fields = map_fields(schema.fields, raw);

    for reference in schema.references {
        let code = lookup(raw, reference.all_labels())
            .map(|v| TypedValue::Text(text_of(v)))
            .unwrap_or(TypedValue::Null);
        fields.insert(reference.name.to_string(), code);
    }

    let children = schema
        .children
        .iter()
        .map(|child| (child.name.to_string(), map_children(child, raw)))
        .collect();

    MapOutcome::Mapped(ImportRecord {
        position: raw.position,
        natural_key: key_parts.join(KEY_SEPARATOR),
        fields,
        children,
    })
}

fn map_fields(specs: &[FieldSpec], raw: &RawRecord) -> FieldMap {
    specs
        .iter()
        .map(|spec| {
            let value = match lookup(raw, spec.all_labels()).map(|v| coerce(spec.kind, v)) {
                Some(TypedValue::Null) | None => spec.default.value(),
                Some(value) => value,
            };
            (spec.name.to_string(), value)
        })
        .collect()
}

fn map_children(child: &ChildSpec, raw: &RawRecord) -> Vec<FieldMap> {
    let Some(value) = raw.get(child.name).filter(|v| !v.is_absent()) else {
        return Vec::new();
    };
    let reference_name = child.reference.name.to_string();

    match child.shape {
        ChildShape::Codes => match coerce(FieldKind::StringList, value) {
            TypedValue::List(codes) => codes
                .into_iter()
                .map(|code| {
                    let mut entry = FieldMap::new();
                    entry.insert(reference_name.clone(), TypedValue::Text(code));
                    entry
                })
                .collect(),
            _ => Vec::new(),
        },
        ChildShape::Objects => {
            let entries = match value {
                RawValue::Nested(Value::Array(items)) => items.clone(),
                RawValue::Text(s) => match serde_json::from_str::<Value>(s) {
                    Ok(Value::Array(items)) => items,
                    _ => Vec::new(),
                },
                _ => Vec::new(),
            };
            entries
                .into_iter()
                .enumerate()
                .filter_map(|(idx, entry)| match entry {
                    Value::Object(object) => Some(RawRecord::from_json_object(idx + 1, object)),
                    _ => None,
                })
                .map(|entry| {
                    let code = lookup(&entry, child.reference.all_labels())
                        .map(|v| TypedValue::Text(text_of(v)))
                        .unwrap_or(TypedValue::Null);
                    let mut fields = FieldMap::new();
                    fields.insert(reference_name.clone(), code);
                    fields.extend(map_fields(child.fields, &entry));
                    fields
                })
                .collect()
        }
    }
}

/// First non-absent value among `labels`.
fn lookup<'a>(
    raw: &'a RawRecord,
    labels: impl IntoIterator<Item = &'static str>,
) -> Option<&'a RawValue> {
    labels
        .into_iter()
        .filter_map(|label| raw.get(label))
        .find(|value| !value.is_absent())
}

// ---------------------------------------------------------------------------
// Coercion
// ---------------------------------------------------------------------------

/// Coerce one raw value to `kind`.
///
/// Absent input yields `Null`. A value that cannot take the declared kind is
/// kept as `Text` so validation reports it, except for JSON and choice fields
/// where unparsable input is treated as absent.
pub fn coerce(kind: FieldKind, raw: &RawValue) -> TypedValue {
    if raw.is_absent() {
        return TypedValue::Null;
    }
    match kind {
        FieldKind::Text => TypedValue::Text(text_of(raw)),
        FieldKind::Keyword => TypedValue::Text(text_of(raw).to_lowercase()),
        FieldKind::Integer => coerce_integer(raw),
        FieldKind::Decimal => coerce_decimal(raw),
        FieldKind::Bool => TypedValue::Bool(parse_bool(raw)),
        FieldKind::Json => coerce_json(raw),
        FieldKind::StringList => coerce_list(raw),
        FieldKind::Choice(table) => {
            let text = text_of(raw);
            table
                .iter()
                .find(|(key, _)| text.contains(key))
                .map(|(_, value)| TypedValue::Text((*value).to_string()))
                .unwrap_or(TypedValue::Null)
        }
    }
}

/// Truthy-token boolean parsing; anything unrecognized is `false`.
pub fn parse_bool(raw: &RawValue) -> bool {
    match raw {
        RawValue::Bool(b) => *b,
        RawValue::Integer(i) => *i != 0,
        RawValue::Number(n) => *n != 0.0,
        RawValue::Text(s) => {
            let token = s.trim();
            TRUTHY_TOKENS.iter().any(|t| t.eq_ignore_ascii_case(token))
        }
        RawValue::Null | RawValue::Nested(_) => false,
    }
}

fn text_of(raw: &RawValue) -> String {
    match raw {
        RawValue::Null => String::new(),
        RawValue::Bool(b) => b.to_string(),
        RawValue::Integer(i) => i.to_string(),
        RawValue::Number(n) => format_number(*n),
        RawValue::Text(s) => s.trim().to_string(),
        RawValue::Nested(v) => v.to_string(),
    }
}

fn coerce_integer(raw: &RawValue) -> TypedValue {
    let parsed = match raw {
        RawValue::Integer(i) => return TypedValue::Int(*i),
        RawValue::Number(n) => Some(*n),
        RawValue::Text(s) => match s.trim().parse::<i64>() {
            Ok(i) => return TypedValue::Int(i),
            Err(_) => s.trim().parse::<f64>().ok(),
        },
        _ => None,
    };
    match parsed {
        Some(n) if n.fract() == 0.0 && n.abs() <= i64::MAX as f64 => TypedValue::Int(n as i64),
        _ => TypedValue::Text(text_of(raw)),
    }
}

fn coerce_decimal(raw: &RawValue) -> TypedValue {
    match raw {
        RawValue::Integer(i) => TypedValue::Float(*i as f64),
        RawValue::Number(n) => TypedValue::Float(*n),
        RawValue::Text(s) => s
            .trim()
            .parse::<f64>()
            .map(TypedValue::Float)
            .unwrap_or_else(|_| TypedValue::Text(text_of(raw))),
        _ => TypedValue::Text(text_of(raw)),
    }
}

fn coerce_json(raw: &RawValue) -> TypedValue {
    match raw {
        RawValue::Nested(v) => TypedValue::Json(v.clone()),
        RawValue::Text(s) => serde_json::from_str::<Value>(s.trim())
            .map(TypedValue::Json)
            .unwrap_or(TypedValue::Null),
        _ => TypedValue::Null,
    }
}

fn coerce_list(raw: &RawValue) -> TypedValue {
    let items: Vec<String> = match raw {
        RawValue::Text(s) => s
            .split([',', ';'])
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect(),
        RawValue::Nested(Value::Array(values)) => values
            .iter()
            .map(|v| match v {
                Value::String(s) => s.trim().to_string(),
                other => text_of(&RawValue::from_json(other.clone())),
            })
            .filter(|item| !item.is_empty())
            .collect(),
        other => vec![text_of(other)],
    };
    if items.is_empty() {
        TypedValue::Null
    } else {
        TypedValue::List(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{
        ChildSpec, FieldDefault, NumericRange, ReferenceKind, ReferenceSpec,
    };
    use assert_matches::assert_matches;
    use serde_json::json;

    const CATEGORY_MAP: &[(&str, &str)] = &[("技能", "skill"), ("monster", "monster")];

    const DROP_FIELDS: &[FieldSpec] = &[
        FieldSpec::text("drop_type").default(FieldDefault::Text("team")),
        FieldSpec::decimal("drop_chance")
            .default(FieldDefault::Float(1.0))
            .range(NumericRange::probability()),
    ];

    const CHILDREN: &[ChildSpec] = &[
        ChildSpec {
            name: "drops",
            shape: ChildShape::Objects,
            table: "game_config.monster_drops",
            parent_column: "monster_id",
            discriminator: None,
            reference: ReferenceSpec::required("drop_pool_code", ReferenceKind::DropPool, "drop_pool_id"),
            fields: DROP_FIELDS,
            counter: "drops_added",
        },
        ChildSpec {
            name: "tags",
            shape: ChildShape::Codes,
            table: "game_config.tags_relations",
            parent_column: "entity_id",
            discriminator: Some(("entity_type", "monster")),
            reference: ReferenceSpec::required("tag_code", ReferenceKind::Tag, "tag_id"),
            fields: &[],
            counter: "tags_added",
        },
    ];

    const SCHEMA: EntitySchema = EntitySchema {
        kind: "things",
        table: "game_config.things",
        natural_key: &["code"],
        fields: &[
            FieldSpec::text("code").labels(&["代码"]).required(),
            FieldSpec::int("level"),
            FieldSpec::flag("is_active").default(FieldDefault::Bool(true)),
            FieldSpec::choice("category", CATEGORY_MAP).default(FieldDefault::Text("skill")),
            FieldSpec::json("config").default(FieldDefault::EmptyObject),
            FieldSpec::keyword("skill_type").default(FieldDefault::Text("weapon")),
        ],
        references: &[ReferenceSpec::optional("class_code", ReferenceKind::Class, "class_id")],
        children: CHILDREN,
        soft_deletes: false,
    };

    fn mapped(raw: &RawRecord) -> ImportRecord {
        match map_record(&SCHEMA, raw) {
            MapOutcome::Mapped(record) => record,
            other => panic!("expected mapped record, got {other:?}"),
        }
    }

    #[test]
    fn truthy_tokens_are_case_insensitive() {
        for token in ["true", "TRUE", "Yes", "y", "1", "T"] {
            assert!(parse_bool(&RawValue::Text(token.into())), "{token}");
        }
        for token in ["false", "no", "0", "enabled", ""] {
            assert!(!parse_bool(&RawValue::Text(token.into())), "{token}");
        }
    }

    #[test]
    fn delimited_lists_drop_blank_entries() {
        assert_eq!(
            coerce(FieldKind::StringList, &RawValue::Text("a, b;;c , ".into())),
            TypedValue::List(vec!["a".into(), "b".into(), "c".into()])
        );
        assert_eq!(
            coerce(FieldKind::StringList, &RawValue::Text(" ,; ".into())),
            TypedValue::Null
        );
    }

    #[test]
    fn malformed_json_string_is_absent() {
        assert_eq!(
            coerce(FieldKind::Json, &RawValue::Text("{not json".into())),
            TypedValue::Null
        );
        assert_eq!(
            coerce(FieldKind::Json, &RawValue::Text(r#"{"a": 1}"#.into())),
            TypedValue::Json(json!({"a": 1}))
        );
    }

    #[test]
    fn integers_beyond_f64_precision_stay_exact() {
        assert_eq!(
            coerce(FieldKind::Integer, &RawValue::Integer(9_007_199_254_740_993)),
            TypedValue::Int(9_007_199_254_740_993)
        );
        assert_eq!(
            coerce(FieldKind::Integer, &RawValue::Text("9007199254740993".into())),
            TypedValue::Int(9_007_199_254_740_993)
        );
    }

    #[test]
    fn non_integral_integer_stays_text() {
        assert_eq!(coerce(FieldKind::Integer, &RawValue::Number(5.0)), TypedValue::Int(5));
        assert_eq!(coerce(FieldKind::Integer, &RawValue::Text(" 7 ".into())), TypedValue::Int(7));
        assert_eq!(
            coerce(FieldKind::Integer, &RawValue::Number(2.5)),
            TypedValue::Text("2.5".into())
        );
    }

    #[test]
    fn choice_takes_first_contained_key() {
        assert_eq!(
            coerce(FieldKind::Choice(CATEGORY_MAP), &RawValue::Text("技能,物品".into())),
            TypedValue::Text("skill".into())
        );
        assert_eq!(
            coerce(FieldKind::Choice(CATEGORY_MAP), &RawValue::Text("unknown".into())),
            TypedValue::Null
        );
    }

    #[test]
    fn missing_natural_key_is_reported() {
        let raw = RawRecord::new(4).with("level", RawValue::Number(3.0));
        assert_matches!(
            map_record(&SCHEMA, &raw),
            MapOutcome::MissingNaturalKey { position: 4, field: "code" }
        );
    }

    #[test]
    fn blank_natural_key_is_missing() {
        let raw = RawRecord::new(1).with("code", RawValue::Text("None".into()));
        assert_matches!(map_record(&SCHEMA, &raw), MapOutcome::MissingNaturalKey { .. });
    }

    #[test]
    fn alternative_labels_and_defaults_apply() {
        let raw = RawRecord::new(2)
            .with("代码", RawValue::Text("FIRE".into()))
            .with("unknown_column", RawValue::Text("ignored".into()))
            .with("skill_type", RawValue::Text("MAGIC".into()));
        let record = mapped(&raw);

        assert_eq!(record.natural_key, "FIRE");
        assert_eq!(record.get("is_active"), Some(&TypedValue::Bool(true)));
        assert_eq!(record.get("category"), Some(&TypedValue::Text("skill".into())));
        assert_eq!(record.get("config"), Some(&TypedValue::Json(json!({}))));
        assert_eq!(record.get("skill_type"), Some(&TypedValue::Text("magic".into())));
        assert_eq!(record.get("level"), Some(&TypedValue::Null));
        assert_eq!(record.get("class_code"), Some(&TypedValue::Null));
        assert!(record.get("unknown_column").is_none());
    }

    #[test]
    fn object_children_keep_source_order_and_defaults() {
        let raw = RawRecord::new(1)
            .with("code", RawValue::Text("SLIME".into()))
            .with(
                "drops",
                RawValue::Nested(json!([
                    {"drop_pool_code": "P2", "drop_chance": 0.25},
                    {"drop_pool_code": "P1"},
                    "not an object"
                ])),
            );
        let record = mapped(&raw);
        let drops = record.children("drops");

        assert_eq!(drops.len(), 2);
        assert_eq!(drops[0]["drop_pool_code"], TypedValue::Text("P2".into()));
        assert_eq!(drops[0]["drop_chance"], TypedValue::Float(0.25));
        assert_eq!(drops[1]["drop_pool_code"], TypedValue::Text("P1".into()));
        assert_eq!(drops[1]["drop_chance"], TypedValue::Float(1.0));
        assert_eq!(drops[1]["drop_type"], TypedValue::Text("team".into()));
    }

    #[test]
    fn code_children_accept_arrays_and_delimited_text() {
        let from_array = mapped(
            &RawRecord::new(1)
                .with("code", RawValue::Text("A".into()))
                .with("tags", RawValue::Nested(json!(["BOSS", "UNDEAD"]))),
        );
        let from_text = mapped(
            &RawRecord::new(1)
                .with("code", RawValue::Text("A".into()))
                .with("tags", RawValue::Text("BOSS; UNDEAD".into())),
        );
        assert_eq!(from_array.children("tags"), from_text.children("tags"));
        assert_eq!(from_array.children("tags")[1]["tag_code"], TypedValue::Text("UNDEAD".into()));
    }
}
