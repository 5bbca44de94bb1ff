//! Record validator -- pure logic, no database access.
//!
//! Every violation of a record is collected, parent fields first, then
//! references, then child entries in source order.

use crate::reference::ReferenceResolver;
use crate::schema::{EntitySchema, FieldSpec};
use crate::value::{ImportRecord, TypedValue};

use super::rules::{FieldViolation, ResolvedReferences, RuleKind, ValidationResult};

/// Validate a mapped record against its schema and resolve its references.
pub fn validate_record(
    schema: &EntitySchema,
    record: &ImportRecord,
    resolver: &ReferenceResolver,
) -> ValidationResult {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();
    let mut references = ResolvedReferences::new();

    for spec in schema.fields {
        let value = record.get(spec.name).unwrap_or(&TypedValue::Null);
        check_field(spec, spec.name, value, &mut errors);
    }

    for reference in schema.references {
        let code = match record.get(reference.name) {
            Some(TypedValue::Text(code)) if !code.is_empty() => code,
            _ => {
                if reference.required {
                    errors.push(FieldViolation {
                        field: reference.name.to_string(),
                        rule: RuleKind::Required,
                        message: format!("missing required reference `{}`", reference.name),
                        value: None,
                    });
                }
                references.insert(reference.column, None);
                continue;
            }
        };

        match resolver.resolve(reference.kind, code) {
            Ok(id) => {
                references.insert(reference.column, Some(id));
            }
            Err(unresolved) => {
                let violation = FieldViolation {
                    field: reference.name.to_string(),
                    rule: RuleKind::Reference,
                    message: unresolved.to_string(),
                    value: Some(serde_json::Value::String(code.clone())),
                };
                if reference.required {
                    errors.push(violation);
                } else {
                    warnings.push(violation);
                }
                references.insert(reference.column, None);
            }
        }
    }

    for child in schema.children {
        for (idx, entry) in record.children(child.name).iter().enumerate() {
            for spec in child.fields {
                let path = format!("{}[{idx}].{}", child.name, spec.name);
                let value = entry.get(spec.name).unwrap_or(&TypedValue::Null);
                check_field(spec, &path, value, &mut errors);
            }
        }
    }

    ValidationResult {
        is_valid: errors.is_empty(),
        errors,
        warnings,
        references,
    }
}

fn check_field(spec: &FieldSpec, path: &str, value: &TypedValue, errors: &mut Vec<FieldViolation>) {
    let violation = |rule: RuleKind, message: String| FieldViolation {
        field: path.to_string(),
        rule,
        message,
        value: (!value.is_null()).then(|| value.to_json()),
    };

    let blank = match value {
        TypedValue::Null => true,
        TypedValue::Text(s) => s.is_empty(),
        _ => false,
    };
    if blank {
        if spec.required {
            errors.push(violation(RuleKind::Required, "missing required field".to_string()));
        }
        return;
    }

    if !spec.kind.accepts(value) {
        errors.push(violation(
            RuleKind::TypeCheck,
            format!("expected {}, got `{}`", spec.kind.name(), value.display()),
        ));
        return;
    }

    if let (Some(range), Some(n)) = (spec.range, value.as_f64()) {
        if !range.contains(n) {
            errors.push(violation(
                RuleKind::Range,
                format!("{} is outside {range}", value.display()),
            ));
        }
    }

    if let (false, Some(s)) = (spec.allowed.is_empty(), value.as_str()) {
        if !spec.allowed.contains(&s) {
            errors.push(violation(
                RuleKind::EnumValues,
                format!("`{s}` is not one of {}", spec.allowed.join(", ")),
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::ReferenceTable;
    use crate::schema::{
        ChildShape, ChildSpec, FieldDefault, NumericRange, ReferenceKind, ReferenceSpec,
    };
    use crate::value::FieldMap;
    use indexmap::IndexMap;

    const DROP_FIELDS: &[FieldSpec] = &[FieldSpec::decimal("drop_chance")
        .default(FieldDefault::Float(1.0))
        .range(NumericRange::probability())];

    const SCHEMA: EntitySchema = EntitySchema {
        kind: "monsters",
        table: "game_config.monsters",
        natural_key: &["monster_code"],
        fields: &[
            FieldSpec::text("monster_code").required(),
            FieldSpec::text("monster_name").required(),
            FieldSpec::int("monster_level")
                .required()
                .range(NumericRange::inclusive(1.0, 100.0)),
            FieldSpec::int("max_hp").required().range(NumericRange::positive()),
            FieldSpec::int("base_str").range(NumericRange::inclusive(0.0, 99.0)),
            FieldSpec::text("drop_type").allowed(&["team", "personal"]),
        ],
        references: &[
            ReferenceSpec::optional("class_code", ReferenceKind::Class, "class_id"),
            ReferenceSpec::required("pool_code", ReferenceKind::DropPool, "drop_pool_id"),
        ],
        children: &[ChildSpec {
            name: "drops",
            shape: ChildShape::Objects,
            table: "game_config.monster_drops",
            parent_column: "monster_id",
            discriminator: None,
            reference: ReferenceSpec::required("drop_pool_code", ReferenceKind::DropPool, "drop_pool_id"),
            fields: DROP_FIELDS,
            counter: "drops_added",
        }],
        soft_deletes: false,
    };

    fn resolver() -> ReferenceResolver {
        ReferenceResolver::new([
            ReferenceTable::from_rows(ReferenceKind::DropPool, [("POOL_A".to_string(), 7)]),
            ReferenceTable::from_rows(ReferenceKind::Class, [("WARRIOR".to_string(), 3)]),
        ])
    }

    fn record(pairs: &[(&str, TypedValue)], drops: Vec<FieldMap>) -> ImportRecord {
        let mut children = IndexMap::new();
        children.insert("drops".to_string(), drops);
        ImportRecord {
            position: 1,
            natural_key: "SLIME".to_string(),
            fields: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
            children,
        }
    }

    fn valid_fields() -> Vec<(&'static str, TypedValue)> {
        vec![
            ("monster_code", TypedValue::Text("SLIME".into())),
            ("monster_name", TypedValue::Text("Slime".into())),
            ("monster_level", TypedValue::Int(1)),
            ("max_hp", TypedValue::Int(30)),
            ("base_str", TypedValue::Int(0)),
            ("drop_type", TypedValue::Text("team".into())),
            ("pool_code", TypedValue::Text("POOL_A".into())),
        ]
    }

    fn with(field: &'static str, value: TypedValue) -> Vec<(&'static str, TypedValue)> {
        let mut fields = valid_fields();
        if let Some(slot) = fields.iter_mut().find(|(k, _)| *k == field) {
            slot.1 = value;
        } else {
            fields.push((field, value));
        }
        fields
    }

    fn drop_entry(chance: f64) -> FieldMap {
        let mut entry = FieldMap::new();
        entry.insert("drop_pool_code".into(), TypedValue::Text("POOL_A".into()));
        entry.insert("drop_chance".into(), TypedValue::Float(chance));
        entry
    }

    #[test]
    fn valid_record_passes_and_resolves_references() {
        let result = validate_record(&SCHEMA, &record(&valid_fields(), vec![]), &resolver());
        assert!(result.is_valid, "{}", result.summary());
        assert_eq!(result.references["drop_pool_id"], Some(7));
        assert_eq!(result.references["class_id"], None);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn level_bounds_are_inclusive() {
        for level in [1, 100] {
            let r = record(&with("monster_level", TypedValue::Int(level)), vec![]);
            assert!(validate_record(&SCHEMA, &r, &resolver()).is_valid);
        }
        for level in [0, 101] {
            let r = record(&with("monster_level", TypedValue::Int(level)), vec![]);
            let result = validate_record(&SCHEMA, &r, &resolver());
            assert_eq!(result.errors[0].rule, RuleKind::Range);
        }
    }

    #[test]
    fn zero_hp_is_rejected() {
        let r = record(&with("max_hp", TypedValue::Int(0)), vec![]);
        let result = validate_record(&SCHEMA, &r, &resolver());
        assert!(!result.is_valid);
        assert_eq!(result.errors[0].field, "max_hp");
    }

    #[test]
    fn all_violations_are_collected() {
        let mut fields = with("monster_level", TypedValue::Int(0));
        fields.retain(|(k, _)| *k != "monster_name");
        fields.push(("base_str", TypedValue::Int(120)));
        let fields: Vec<_> = fields
            .into_iter()
            .filter(|(k, v)| !(*k == "base_str" && *v == TypedValue::Int(0)))
            .collect();
        let r = record(&fields, vec![drop_entry(0.0)]);
        let result = validate_record(&SCHEMA, &r, &resolver());

        let failed: Vec<&str> = result.errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(
            failed,
            vec!["monster_name", "monster_level", "base_str", "drops[0].drop_chance"]
        );
    }

    #[test]
    fn drop_chance_accepts_one_and_rejects_zero() {
        let ok = record(&valid_fields(), vec![drop_entry(1.0)]);
        assert!(validate_record(&SCHEMA, &ok, &resolver()).is_valid);

        let bad = record(&valid_fields(), vec![drop_entry(1.5)]);
        let result = validate_record(&SCHEMA, &bad, &resolver());
        assert_eq!(result.errors[0].message, "1.5 is outside (0, 1]");
    }

    #[test]
    fn unresolved_required_reference_fails() {
        let r = record(&with("pool_code", TypedValue::Text("MISSING".into())), vec![]);
        let result = validate_record(&SCHEMA, &r, &resolver());
        assert!(!result.is_valid);
        assert_eq!(result.errors[0].rule, RuleKind::Reference);
        assert_eq!(result.references["drop_pool_id"], None);
    }

    #[test]
    fn unresolved_optional_reference_only_warns() {
        let r = record(&with("class_code", TypedValue::Text("NINJA".into())), vec![]);
        let result = validate_record(&SCHEMA, &r, &resolver());
        assert!(result.is_valid);
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.references["class_id"], None);
    }

    #[test]
    fn type_mismatch_is_reported() {
        let r = record(&with("monster_level", TypedValue::Text("2.5".into())), vec![]);
        let result = validate_record(&SCHEMA, &r, &resolver());
        assert_eq!(result.errors[0].rule, RuleKind::TypeCheck);
        assert_eq!(result.errors[0].message, "expected integer, got `2.5`");
    }

    #[test]
    fn enum_domain_is_enforced() {
        let r = record(&with("drop_type", TypedValue::Text("guild".into())), vec![]);
        let result = validate_record(&SCHEMA, &r, &resolver());
        assert_eq!(result.errors[0].rule, RuleKind::EnumValues);
    }
}
