//! Static entity-kind catalog.
//!
//! Every importable table is described once here; the mapper, validator and
//! upsert engine are driven entirely by these declarations. Raw labels cover
//! both the JSON keys of the equipment/monster files and the header row of
//! the configuration workbook.

use tsu_core::error::CoreError;
use tsu_core::schema::{
    ChildShape, ChildSpec, EntitySchema, FieldDefault, FieldSpec, NumericRange, ReferenceKind,
    ReferenceSpec,
};

const DESCRIPTION: &[&str] = &["描述"];
const IS_ACTIVE: &[&str] = &["是否启用"];

const ACTIVE: FieldSpec = FieldSpec::flag("is_active")
    .labels(IS_ACTIVE)
    .default(FieldDefault::Bool(true));

const ATTRIBUTE: NumericRange = NumericRange::inclusive(0.0, 99.0);

// ---------------------------------------------------------------------------
// Equipment (JSON)
// ---------------------------------------------------------------------------

pub const ITEMS: EntitySchema = EntitySchema {
    kind: "items",
    table: "game_config.items",
    natural_key: &["item_code"],
    fields: &[
        FieldSpec::text("item_code").required(),
        FieldSpec::text("item_name").required(),
        FieldSpec::text("item_type").required(),
        FieldSpec::text("item_quality").required(),
        FieldSpec::text("description").labels(&["item_description"]),
        FieldSpec::text("equip_slot"),
        FieldSpec::int("required_level"),
        FieldSpec::int("max_durability"),
        FieldSpec::int("base_value")
            .labels(&["base_price"])
            .default(FieldDefault::Int(0)),
        FieldSpec::flag("is_tradable").default(FieldDefault::Bool(true)),
        FieldSpec::flag("is_droppable").default(FieldDefault::Bool(true)),
        FieldSpec::text("uniqueness_type").default(FieldDefault::Text("none")),
        FieldSpec::json("out_of_combat_effects"),
        FieldSpec::json("in_combat_effects"),
        FieldSpec::int("max_stack_size")
            .default(FieldDefault::Int(1))
            .range(NumericRange::at_least(1.0)),
    ],
    references: &[ReferenceSpec::optional(
        "required_class_code",
        ReferenceKind::Class,
        "required_class_id",
    )
    .labels(&["required_class_id"])],
    children: &[],
    soft_deletes: false,
};

pub const EQUIPMENT_SLOTS: EntitySchema = EntitySchema {
    kind: "equipment_slots",
    table: "game_config.equipment_slot_configs",
    natural_key: &["class_code", "slot_type"],
    fields: &[
        FieldSpec::text("slot_type").required(),
        FieldSpec::int("default_count").required(),
        FieldSpec::int("max_count").required(),
        FieldSpec::int("unlock_level").required(),
    ],
    references: &[
        ReferenceSpec::required("class_code", ReferenceKind::Class, "class_id").labels(&["class_id"]),
    ],
    children: &[],
    soft_deletes: false,
};

const DROP_POOL_ITEM_FIELDS: &[FieldSpec] = &[
    FieldSpec::int("drop_weight").default(FieldDefault::Int(1)),
    FieldSpec::decimal("drop_rate").range(NumericRange::probability()),
    FieldSpec::json("quality_weights"),
    FieldSpec::int("min_quantity").default(FieldDefault::Int(1)),
    FieldSpec::int("max_quantity").default(FieldDefault::Int(1)),
    FieldSpec::int("min_level"),
    FieldSpec::int("max_level"),
    ACTIVE,
];

pub const DROP_POOLS: EntitySchema = EntitySchema {
    kind: "drop_pools",
    table: "game_config.drop_pools",
    natural_key: &["pool_code"],
    fields: &[
        FieldSpec::text("pool_code").required(),
        FieldSpec::text("pool_name").required(),
        FieldSpec::text("pool_type").required(),
        FieldSpec::text("description"),
        FieldSpec::int("min_drops").default(FieldDefault::Int(0)),
        FieldSpec::int("max_drops").default(FieldDefault::Int(1)),
        FieldSpec::int("guaranteed_drops").default(FieldDefault::Int(0)),
        ACTIVE,
    ],
    references: &[],
    children: &[ChildSpec {
        name: "items",
        shape: ChildShape::Objects,
        table: "game_config.drop_pool_items",
        parent_column: "drop_pool_id",
        discriminator: None,
        reference: ReferenceSpec::required("item_code", ReferenceKind::Item, "item_id"),
        fields: DROP_POOL_ITEM_FIELDS,
        counter: "items_added",
    }],
    soft_deletes: false,
};

pub const WORLD_DROPS: EntitySchema = EntitySchema {
    kind: "world_drops",
    table: "game_config.world_drop_configs",
    natural_key: &["item_code"],
    fields: &[
        FieldSpec::int("total_drop_limit"),
        FieldSpec::int("daily_drop_limit"),
        FieldSpec::int("hourly_drop_limit"),
        FieldSpec::int("min_drop_interval"),
        FieldSpec::int("max_drop_interval"),
        FieldSpec::json("trigger_conditions"),
        FieldSpec::decimal("base_drop_rate").range(NumericRange::probability()),
        FieldSpec::json("drop_rate_modifiers"),
        ACTIVE,
    ],
    references: &[ReferenceSpec::required("item_code", ReferenceKind::Item, "item_id")],
    children: &[],
    soft_deletes: false,
};

pub const EQUIPMENT_SETS: EntitySchema = EntitySchema {
    kind: "equipment_sets",
    table: "game_config.equipment_set_configs",
    natural_key: &["set_code"],
    fields: &[
        FieldSpec::text("set_code").required(),
        FieldSpec::text("set_name").required(),
        FieldSpec::text("description").labels(&["set_description"]),
        FieldSpec::json("set_effects").labels(&["set_bonuses"]),
        ACTIVE,
    ],
    references: &[],
    children: &[],
    soft_deletes: false,
};

// ---------------------------------------------------------------------------
// Monsters (JSON)
// ---------------------------------------------------------------------------

const MONSTER_SKILL_FIELDS: &[FieldSpec] = &[
    FieldSpec::int("skill_level").default(FieldDefault::Int(1)),
    FieldSpec::list("gain_actions").default(FieldDefault::EmptyList),
];

const MONSTER_DROP_FIELDS: &[FieldSpec] = &[
    FieldSpec::text("drop_type").default(FieldDefault::Text("team")),
    FieldSpec::decimal("drop_chance")
        .default(FieldDefault::Float(1.0))
        .range(NumericRange::probability()),
    FieldSpec::int("min_quantity").default(FieldDefault::Int(1)),
    FieldSpec::int("max_quantity").default(FieldDefault::Int(1)),
];

pub const MONSTERS: EntitySchema = EntitySchema {
    kind: "monsters",
    table: "game_config.monsters",
    natural_key: &["monster_code"],
    fields: &[
        FieldSpec::text("monster_code").required(),
        FieldSpec::text("monster_name").required(),
        FieldSpec::int("monster_level")
            .required()
            .range(NumericRange::inclusive(1.0, 100.0)),
        FieldSpec::text("description"),
        FieldSpec::int("max_hp").required().range(NumericRange::positive()),
        FieldSpec::int("hp_recovery").default(FieldDefault::Int(0)),
        FieldSpec::int("max_mp").default(FieldDefault::Int(0)),
        FieldSpec::int("mp_recovery").default(FieldDefault::Int(0)),
        FieldSpec::int("base_str").default(FieldDefault::Int(0)).range(ATTRIBUTE),
        FieldSpec::int("base_agi").default(FieldDefault::Int(0)).range(ATTRIBUTE),
        FieldSpec::int("base_vit").default(FieldDefault::Int(0)).range(ATTRIBUTE),
        FieldSpec::int("base_wlp").default(FieldDefault::Int(0)).range(ATTRIBUTE),
        FieldSpec::int("base_int").default(FieldDefault::Int(0)).range(ATTRIBUTE),
        FieldSpec::int("base_wis").default(FieldDefault::Int(0)).range(ATTRIBUTE),
        FieldSpec::int("base_cha").default(FieldDefault::Int(0)).range(ATTRIBUTE),
        FieldSpec::text("accuracy_formula"),
        FieldSpec::text("dodge_formula"),
        FieldSpec::text("initiative_formula"),
        FieldSpec::text("body_resist_formula"),
        FieldSpec::text("magic_resist_formula"),
        FieldSpec::text("mental_resist_formula"),
        FieldSpec::text("environment_resist_formula"),
        FieldSpec::json("damage_resistances").default(FieldDefault::EmptyObject),
        FieldSpec::json("passive_buffs").default(FieldDefault::EmptyArray),
        FieldSpec::int("drop_gold_min").default(FieldDefault::Int(0)),
        FieldSpec::int("drop_gold_max").default(FieldDefault::Int(0)),
        FieldSpec::int("drop_exp").default(FieldDefault::Int(0)),
        FieldSpec::text("icon_url"),
        FieldSpec::text("model_url"),
        ACTIVE,
        FieldSpec::int("display_order").default(FieldDefault::Int(0)),
    ],
    references: &[],
    children: &[
        ChildSpec {
            name: "skills",
            shape: ChildShape::Objects,
            table: "game_config.monster_skills",
            parent_column: "monster_id",
            discriminator: None,
            reference: ReferenceSpec::required("skill_code", ReferenceKind::Skill, "skill_id"),
            fields: MONSTER_SKILL_FIELDS,
            counter: "skills_added",
        },
        ChildSpec {
            name: "drops",
            shape: ChildShape::Objects,
            table: "game_config.monster_drops",
            parent_column: "monster_id",
            discriminator: None,
            reference: ReferenceSpec::required(
                "drop_pool_code",
                ReferenceKind::DropPool,
                "drop_pool_id",
            ),
            fields: MONSTER_DROP_FIELDS,
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
    ],
    soft_deletes: true,
};

// ---------------------------------------------------------------------------
// Workbook sheets
// ---------------------------------------------------------------------------

pub const HERO_ATTRIBUTE_TYPES: EntitySchema = EntitySchema {
    kind: "hero_attribute_types",
    table: "game_config.hero_attribute_type",
    natural_key: &["attribute_code"],
    fields: &[
        FieldSpec::text("attribute_code").labels(&["代码"]).required(),
        FieldSpec::text("attribute_name").labels(&["名称"]),
        FieldSpec::text("category").labels(&["分类"]),
        FieldSpec::text("data_type").labels(&["数据类型"]),
        FieldSpec::decimal("min_value").labels(&["最小值"]),
        FieldSpec::decimal("max_value").labels(&["最大值"]),
        FieldSpec::decimal("default_value").labels(&["默认值"]),
        FieldSpec::text("unit").labels(&["单位"]),
        FieldSpec::text("description").labels(DESCRIPTION),
        ACTIVE,
    ],
    references: &[],
    children: &[],
    soft_deletes: false,
};

pub const DAMAGE_TYPES: EntitySchema = EntitySchema {
    kind: "damage_types",
    table: "game_config.damage_types",
    natural_key: &["code"],
    fields: &[
        FieldSpec::text("code").labels(&["代码"]).required(),
        FieldSpec::text("name").labels(&["名称"]),
        FieldSpec::text("category").labels(&["分类"]),
        FieldSpec::text("resistance_attribute_code").labels(&["抗性属性"]),
        FieldSpec::text("damage_reduction_attribute_code").labels(&["伤害减免属性"]),
        FieldSpec::decimal("resistance_cap").labels(&["抗性上限"]),
        FieldSpec::text("color").labels(&["颜色"]),
        FieldSpec::text("icon").labels(&["图标"]),
        FieldSpec::text("description").labels(DESCRIPTION),
        ACTIVE,
    ],
    references: &[],
    children: &[],
    soft_deletes: false,
};

pub const ACTION_CATEGORIES: EntitySchema = EntitySchema {
    kind: "action_categories",
    table: "game_config.action_categories",
    natural_key: &["category_code"],
    fields: &[
        FieldSpec::text("category_code").labels(&["代码"]).required(),
        FieldSpec::text("category_name").labels(&["名称"]),
        FieldSpec::text("description").labels(DESCRIPTION),
        ACTIVE,
    ],
    references: &[],
    children: &[],
    soft_deletes: false,
};

const TAG_CATEGORIES: &[(&str, &str)] = &[
    ("技能", "skill"),
    ("skill", "skill"),
    ("物品", "item"),
    ("item", "item"),
    ("职业", "class"),
    ("class", "class"),
    ("怪物", "monster"),
    ("monster", "monster"),
];

pub const TAGS: EntitySchema = EntitySchema {
    kind: "tags",
    table: "game_config.tags",
    natural_key: &["tag_code"],
    fields: &[
        FieldSpec::text("tag_code").labels(&["特征代码"]).required(),
        FieldSpec::text("tag_name").labels(&["特征名称"]),
        FieldSpec::choice("category", TAG_CATEGORIES)
            .labels(&["适用类型"])
            .sql_type("game_config.tag_type_enum")
            .default(FieldDefault::Text("skill")),
        FieldSpec::text("color").labels(&["颜色"]),
        FieldSpec::text("icon").labels(&["图标"]),
        FieldSpec::text("description").labels(DESCRIPTION),
        ACTIVE,
        FieldSpec::int("display_order")
            .labels(&["显示顺序"])
            .default(FieldDefault::Int(0)),
    ],
    references: &[],
    children: &[],
    soft_deletes: false,
};

pub const EFFECT_TYPE_DEFINITIONS: EntitySchema = EntitySchema {
    kind: "effect_type_definitions",
    table: "game_config.effect_type_definitions",
    natural_key: &["effect_type_code"],
    fields: &[
        FieldSpec::text("effect_type_code").labels(&["效果类型代码"]).required(),
        FieldSpec::text("effect_type_name").labels(&["效果类型名称"]),
        FieldSpec::text("description").labels(DESCRIPTION),
        FieldSpec::list("parameter_list").labels(&["参数列表"]),
        FieldSpec::text("parameter_descriptions").labels(&["参数说明"]),
        FieldSpec::json("parameter_definitions").labels(&["参数定义"]),
        FieldSpec::text("failure_handling").labels(&["失败处理"]),
        FieldSpec::json("json_template").labels(&["JSON模板"]),
        FieldSpec::text("example").labels(&["示例"]),
        FieldSpec::text("notes").labels(&["备注"]),
        ACTIVE,
    ],
    references: &[],
    children: &[],
    soft_deletes: false,
};

pub const FORMULA_VARIABLES: EntitySchema = EntitySchema {
    kind: "formula_variables",
    table: "game_config.formula_variables",
    natural_key: &["variable_code"],
    fields: &[
        FieldSpec::text("variable_code").labels(&["变量代码"]).required(),
        FieldSpec::text("variable_name").labels(&["变量名称"]),
        FieldSpec::text("variable_type").labels(&["变量类型"]),
        FieldSpec::text("scope").labels(&["作用域"]),
        FieldSpec::text("data_type").labels(&["数据类型"]),
        FieldSpec::text("description").labels(DESCRIPTION),
        FieldSpec::text("example").labels(&["示例"]),
        ACTIVE,
    ],
    references: &[],
    children: &[],
    soft_deletes: false,
};

pub const RANGE_CONFIG_RULES: EntitySchema = EntitySchema {
    kind: "range_config_rules",
    table: "game_config.range_config_rules",
    natural_key: &["parameter_type"],
    fields: &[
        FieldSpec::text("parameter_type").labels(&["参数类型"]).required(),
        FieldSpec::text("parameter_format").labels(&["参数格式"]),
        FieldSpec::text("description").labels(DESCRIPTION),
        FieldSpec::text("example").labels(&["示例"]),
        FieldSpec::text("notes").labels(&["备注"]),
        ACTIVE,
    ],
    references: &[],
    children: &[],
    soft_deletes: false,
};

pub const ACTION_TYPE_DEFINITIONS: EntitySchema = EntitySchema {
    kind: "action_type_definitions",
    table: "game_config.action_type_definitions",
    natural_key: &["action_type"],
    fields: &[
        FieldSpec::text("action_type").labels(&["动作类型"]).required(),
        FieldSpec::text("description").labels(DESCRIPTION),
        FieldSpec::int("per_turn_limit").labels(&["每回合限制"]),
        FieldSpec::text("usage_timing").labels(&["使用时机"]),
        FieldSpec::text("example").labels(&["示例"]),
        ACTIVE,
    ],
    references: &[],
    children: &[],
    soft_deletes: false,
};

pub const ACTION_FLAGS: EntitySchema = EntitySchema {
    kind: "action_flags",
    table: "game_config.action_flags",
    natural_key: &["flag_code"],
    fields: &[
        FieldSpec::text("flag_code").labels(&["标记代码"]).required(),
        FieldSpec::text("flag_name").labels(&["标记名称"]),
        FieldSpec::text("category").labels(&["分类"]),
        FieldSpec::text("duration_type")
            .labels(&["持续类型"])
            .default(FieldDefault::Text("action")),
        FieldSpec::text("default_duration")
            .labels(&["默认持续时间"])
            .default(FieldDefault::Text("1")),
        FieldSpec::text("auto_remove_condition").labels(&["自动移除条件"]),
        FieldSpec::list("remove_on_events").labels(&["移除事件"]),
        FieldSpec::flag("is_visible")
            .labels(&["是否可见"])
            .default(FieldDefault::Bool(false)),
        FieldSpec::flag("is_stackable")
            .labels(&["是否可叠加"])
            .default(FieldDefault::Bool(false)),
        FieldSpec::int("max_stacks")
            .labels(&["最大叠加层数"])
            .default(FieldDefault::Int(1)),
        FieldSpec::flag("provides_advantage")
            .labels(&["提供优势"])
            .default(FieldDefault::Bool(false)),
        FieldSpec::flag("provides_disadvantage")
            .labels(&["提供劣势"])
            .default(FieldDefault::Bool(false)),
        FieldSpec::list("advantage_applies_to").labels(&["优势适用于"]),
        FieldSpec::json("flag_effects").labels(&["标记效果"]),
        FieldSpec::json("modifier_effects").labels(&["修正效果"]),
        FieldSpec::text("description").labels(DESCRIPTION),
        ACTIVE,
    ],
    references: &[],
    children: &[],
    soft_deletes: false,
};

pub const BUFFS: EntitySchema = EntitySchema {
    kind: "buffs",
    table: "game_config.buffs",
    natural_key: &["buff_code"],
    fields: &[
        FieldSpec::text("buff_code").labels(&["代码"]).required(),
        FieldSpec::text("buff_name").labels(&["名称"]),
        FieldSpec::text("buff_type")
            .labels(&["Buff类型"])
            .default(FieldDefault::Text("buff")),
        FieldSpec::text("category").labels(&["分类"]),
        FieldSpec::list("feature_tags").labels(&["特征标签"]),
        FieldSpec::int("default_duration")
            .labels(&["默认持续时间"])
            .default(FieldDefault::Int(1)),
        FieldSpec::text("effect_description").labels(&["效果描述"]),
        FieldSpec::text("stack_rule")
            .labels(&["叠加规则"])
            .default(FieldDefault::Text("no_stack")),
        FieldSpec::int("max_stacks")
            .labels(&["最大叠加层数"])
            .default(FieldDefault::Int(1)),
        FieldSpec::text("description").labels(DESCRIPTION),
        ACTIVE,
    ],
    references: &[],
    children: &[],
    soft_deletes: false,
};

pub const SKILLS: EntitySchema = EntitySchema {
    kind: "skills",
    table: "game_config.skills",
    natural_key: &["skill_code"],
    fields: &[
        FieldSpec::text("skill_code").labels(&["代码"]).required(),
        FieldSpec::text("skill_name").labels(&["名称"]),
        FieldSpec::keyword("skill_type")
            .labels(&["技能类型"])
            .sql_type("game_config.skill_type_enum")
            .default(FieldDefault::Text("weapon")),
        FieldSpec::int("max_level")
            .labels(&["最大等级"])
            .default(FieldDefault::Int(10)),
        FieldSpec::list("feature_tags").labels(&["特征标签"]),
        FieldSpec::json("passive_effects").labels(&["被动效果"]),
        FieldSpec::keyword("level_scaling_type")
            .labels(&["升级类型"])
            .default(FieldDefault::Text("linear")),
        FieldSpec::json("level_scaling_config")
            .labels(&["升级配置"])
            .default(FieldDefault::EmptyObject),
        FieldSpec::text("description").labels(DESCRIPTION),
        ACTIVE,
    ],
    references: &[],
    children: &[],
    soft_deletes: false,
};

pub const SKILL_UPGRADE_COSTS: EntitySchema = EntitySchema {
    kind: "skill_upgrade_costs",
    table: "game_config.skill_upgrade_costs",
    natural_key: &["level_number"],
    fields: &[
        FieldSpec::int("level_number")
            .labels(&["等级", "升级到等级"])
            .required(),
        FieldSpec::int("cost_xp")
            .labels(&["经验消耗", "XP消耗"])
            .default(FieldDefault::Int(0)),
        FieldSpec::int("cost_gold")
            .labels(&["金币消耗"])
            .default(FieldDefault::Int(0)),
        FieldSpec::json("cost_materials")
            .labels(&["材料消耗"])
            .default(FieldDefault::EmptyArray),
    ],
    references: &[],
    children: &[],
    soft_deletes: false,
};

pub const ACTIONS: EntitySchema = EntitySchema {
    kind: "actions",
    table: "game_config.actions",
    natural_key: &["action_code"],
    fields: &[
        FieldSpec::text("action_code").labels(&["动作代码"]).required(),
        FieldSpec::text("action_name").labels(&["动作名称"]),
        FieldSpec::keyword("action_type")
            .labels(&["动作类型"])
            .sql_type("game_config.action_type_enum")
            .default(FieldDefault::Text("main")),
        FieldSpec::list("feature_tags").labels(&["特征标签"]),
        FieldSpec::json("range_config")
            .labels(&["射程配置"])
            .default(FieldDefault::EmptyObject),
        FieldSpec::list("start_flags").labels(&["开始标记"]),
        FieldSpec::json("requirements").labels(&["需求条件"]),
        FieldSpec::text("description").labels(DESCRIPTION),
        ACTIVE,
    ],
    references: &[],
    children: &[],
    soft_deletes: false,
};

// ---------------------------------------------------------------------------
// Source bindings
// ---------------------------------------------------------------------------

/// Equipment files in import order. Later kinds reference items written by
/// earlier steps.
pub const EQUIPMENT_FILES: &[(&str, &EntitySchema)] = &[
    ("items.json", &ITEMS),
    ("equipment_slot_configs.json", &EQUIPMENT_SLOTS),
    ("drop_pools.json", &DROP_POOLS),
    ("world_drop_configs.json", &WORLD_DROPS),
    ("equipment_set_configs.json", &EQUIPMENT_SETS),
];

/// Workbook sheets in dependency order.
pub const WORKBOOK_SHEETS: &[(&str, &EntitySchema)] = &[
    ("角色数据类型", &HERO_ATTRIBUTE_TYPES),
    ("伤害类型", &DAMAGE_TYPES),
    ("动作类别", &ACTION_CATEGORIES),
    ("特征配置", &TAGS),
    ("元效果类型定义", &EFFECT_TYPE_DEFINITIONS),
    ("公式变量定义", &FORMULA_VARIABLES),
    ("射程配置规则", &RANGE_CONFIG_RULES),
    ("动作类型定义", &ACTION_TYPE_DEFINITIONS),
    ("动作标记", &ACTION_FLAGS),
    ("Buff配置", &BUFFS),
    ("技能配置", &SKILLS),
    ("技能升级消耗", &SKILL_UPGRADE_COSTS),
    ("动作配置", &ACTIONS),
];

/// Every entity kind, monsters last.
pub const ALL: &[&EntitySchema] = &[
    &ITEMS,
    &EQUIPMENT_SLOTS,
    &DROP_POOLS,
    &WORLD_DROPS,
    &EQUIPMENT_SETS,
    &HERO_ATTRIBUTE_TYPES,
    &DAMAGE_TYPES,
    &ACTION_CATEGORIES,
    &TAGS,
    &EFFECT_TYPE_DEFINITIONS,
    &FORMULA_VARIABLES,
    &RANGE_CONFIG_RULES,
    &ACTION_TYPE_DEFINITIONS,
    &ACTION_FLAGS,
    &BUFFS,
    &SKILLS,
    &SKILL_UPGRADE_COSTS,
    &ACTIONS,
    &MONSTERS,
];

/// Look up a schema by its category name.
pub fn schema(kind: &str) -> Result<&'static EntitySchema, CoreError> {
    ALL.iter()
        .copied()
        .find(|s| s.kind == kind)
        .ok_or_else(|| CoreError::UnknownEntityKind(kind.to_string()))
}

/// Resolve a sheet filter entry given either the sheet name or the
/// category name.
pub fn sheet(name: &str) -> Result<(&'static str, &'static EntitySchema), CoreError> {
    WORKBOOK_SHEETS
        .iter()
        .copied()
        .find(|(sheet, schema)| *sheet == name || schema.kind == name)
        .ok_or_else(|| CoreError::UnknownEntityKind(name.to_string()))
}
