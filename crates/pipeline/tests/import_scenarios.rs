//! End-to-end import runs against the in-memory store.

use std::path::Path;

use assert_matches::assert_matches;
use serde_json::json;
use tsu_core::outcome::OutcomeKind;
use tsu_core::policy::WritePolicy;
use tsu_core::schema::ReferenceKind;
use tsu_core::store::{Column, ConfigStore, SqlValue};
use tsu_pipeline::{ImportError, Importer, MemoryStore, Plan, SourceError};

fn write_json(dir: &Path, name: &str, value: serde_json::Value) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, value.to_string()).unwrap();
    path
}

fn reference_store() -> MemoryStore {
    let mut store = MemoryStore::new();
    store.seed_reference(ReferenceKind::Skill, "BITE");
    store.seed_reference(ReferenceKind::Skill, "SLASH");
    store.seed_reference(ReferenceKind::DropPool, "GOBLIN_LOOT");
    store.seed_reference(ReferenceKind::Tag, "HUMANOID");
    store
}

fn goblin(skills: serde_json::Value) -> serde_json::Value {
    json!({
        "monster_code": "GOBLIN",
        "monster_name": "Goblin",
        "monster_level": 3,
        "max_hp": 30,
        "skills": skills,
        "drops": [{"drop_pool_code": "GOBLIN_LOOT", "drop_chance": 0.5}],
        "tags": ["HUMANOID"]
    })
}

fn counts(importer: &Importer<MemoryStore>, category: &str) -> [u64; 4] {
    let stats = importer.stats().category(category).unwrap();
    [
        stats.count(OutcomeKind::Created),
        stats.count(OutcomeKind::Updated),
        stats.count(OutcomeKind::Skipped),
        stats.count(OutcomeKind::Failed),
    ]
}

#[tokio::test]
async fn item_without_optional_fields_gets_defaults() {
    let dir = tempfile::tempdir().unwrap();
    write_json(
        dir.path(),
        "items.json",
        json!([{"item_code": "SWORD01", "item_name": "Iron Sword", "item_type": "weapon", "item_quality": "common"}]),
    );

    let mut importer = Importer::new(MemoryStore::new(), WritePolicy::Truncate);
    importer
        .run(&Plan::Equipment { dir: dir.path().to_path_buf() })
        .await
        .unwrap();

    assert_eq!(counts(&importer, "items"), [1, 0, 0, 0]);
    let row = importer
        .store()
        .find("game_config.items", "item_code", "SWORD01")
        .unwrap();
    assert_eq!(row.get("is_tradable"), Some(&SqlValue::Bool(Some(true))));
    assert_eq!(row.get("is_droppable"), Some(&SqlValue::Bool(Some(true))));
    assert_eq!(row.get("max_stack_size"), Some(&SqlValue::Int(Some(1))));
    assert_eq!(row.get("uniqueness_type"), Some(&SqlValue::text("none")));
}

#[tokio::test]
async fn unknown_monster_skill_skips_only_the_link() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_json(
        dir.path(),
        "monsters.json",
        json!([goblin(json!([{"skill_code": "BITE"}, {"skill_code": "FIREBALL"}]))]),
    );

    let mut importer = Importer::new(reference_store(), WritePolicy::Incremental);
    importer.run(&Plan::Monsters { file }).await.unwrap();

    assert_eq!(counts(&importer, "monsters"), [1, 0, 0, 0]);
    let stats = importer.stats().category("monsters").unwrap();
    assert_eq!(stats.links["skills_added"].added, 1);
    assert_eq!(stats.links["skills_added"].skipped, 1);
    assert_eq!(stats.links["drops_added"].added, 1);
    assert_eq!(stats.links["tags_added"].added, 1);
    assert_eq!(importer.store().count("game_config.monster_skills"), 1);
}

#[tokio::test]
async fn incremental_rerun_updates_without_new_rows() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_json(
        dir.path(),
        "monsters.json",
        json!([goblin(json!([{"skill_code": "BITE"}])), {
            "monster_code": "WOLF", "monster_name": "Wolf", "monster_level": 2, "max_hp": 20
        }]),
    );
    let plan = Plan::Monsters { file };

    let mut first = Importer::new(reference_store(), WritePolicy::Incremental);
    first.run(&plan).await.unwrap();
    assert_eq!(counts(&first, "monsters"), [2, 0, 0, 0]);
    let (store, _) = first.finish(false);
    let monsters_before = store.rows("game_config.monsters").to_vec();
    let links_before = store.count("game_config.monster_skills");

    let mut second = Importer::new(store, WritePolicy::Incremental);
    second.run(&plan).await.unwrap();
    assert_eq!(counts(&second, "monsters"), [0, 2, 0, 0]);
    assert_eq!(second.store().rows("game_config.monsters"), monsters_before.as_slice());
    assert_eq!(second.store().count("game_config.monster_skills"), links_before);
}

#[tokio::test]
async fn update_drops_associations_missing_from_the_new_record() {
    let dir = tempfile::tempdir().unwrap();
    let with_slash = write_json(
        dir.path(),
        "v1.json",
        json!([goblin(json!([{"skill_code": "BITE"}, {"skill_code": "SLASH"}]))]),
    );
    let bite_only = write_json(dir.path(), "v2.json", json!([goblin(json!([{"skill_code": "BITE"}]))]));

    let mut importer = Importer::new(reference_store(), WritePolicy::Incremental);
    importer.run(&Plan::Monsters { file: with_slash }).await.unwrap();
    importer.run(&Plan::Monsters { file: bite_only }).await.unwrap();

    assert_eq!(importer.store().count("game_config.monster_skills"), 1);
    assert_eq!(counts(&importer, "monsters"), [1, 1, 0, 0]);
}

#[tokio::test]
async fn truncate_twice_keeps_the_same_row_count() {
    let dir = tempfile::tempdir().unwrap();
    write_json(
        dir.path(),
        "equipment_set_configs.json",
        json!([
            {"set_code": "S1", "set_name": "Guardian", "set_bonuses": {"2": {"def": 5}}},
            {"set_code": "S2", "set_name": "Raider"},
            {"set_code": "S3", "set_name": "Sage"}
        ]),
    );
    let plan = Plan::Equipment { dir: dir.path().to_path_buf() };

    let mut importer = Importer::new(MemoryStore::new(), WritePolicy::Truncate);
    importer.run(&plan).await.unwrap();
    assert_eq!(importer.store().count("game_config.equipment_set_configs"), 3);
    importer.run(&plan).await.unwrap();
    assert_eq!(importer.store().count("game_config.equipment_set_configs"), 3);
    assert_eq!(counts(&importer, "equipment_sets"), [6, 0, 0, 0]);
}

#[tokio::test]
async fn truncate_discards_rows_absent_from_the_input() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_json(dir.path(), "monsters.json", json!([goblin(json!([]))]));
    let mut store = reference_store();
    store.seed(
        "game_config.monsters",
        vec![Column::new("monster_code", SqlValue::text("DRAGON"))],
    );

    let mut importer = Importer::new(store, WritePolicy::Truncate);
    importer.run(&Plan::Monsters { file }).await.unwrap();

    assert_eq!(importer.store().count("game_config.monsters"), 1);
    assert!(importer
        .store()
        .find("game_config.monsters", "monster_code", "DRAGON")
        .is_none());
    assert!(!importer.store().in_transaction());
}

#[tokio::test]
async fn invalid_and_keyless_records_are_counted_not_written() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_json(
        dir.path(),
        "monsters.json",
        json!([
            goblin(json!([])),
            {"monster_name": "No Code", "monster_level": 1, "max_hp": 1},
            {"monster_code": "ZERO", "monster_name": "Zero", "monster_level": 0, "max_hp": 10},
            {"monster_code": "GHOST", "monster_name": "Ghost", "monster_level": 5,
             "drops": [{"drop_pool_code": "GOBLIN_LOOT", "drop_chance": 0}]},
            {"monster_code": "SURE", "monster_name": "Sure", "monster_level": 5, "max_hp": 5,
             "drops": [{"drop_pool_code": "GOBLIN_LOOT", "drop_chance": 1}]}
        ]),
    );

    let mut importer = Importer::new(reference_store(), WritePolicy::Incremental);
    importer.run(&Plan::Monsters { file }).await.unwrap();

    assert_eq!(counts(&importer, "monsters"), [2, 0, 1, 2]);
    let stats = importer.stats().category("monsters").unwrap();
    assert_eq!(stats.total(), 5);
    assert_eq!(importer.stats().observed(), 5);
    assert_eq!(importer.store().count("game_config.monsters"), 2);
    assert!(importer
        .store()
        .find("game_config.monsters", "monster_code", "ZERO")
        .is_none());
}

#[tokio::test]
async fn statement_failure_in_truncate_mode_keeps_other_records() {
    let dir = tempfile::tempdir().unwrap();
    write_json(
        dir.path(),
        "equipment_set_configs.json",
        json!([{"set_code": "S1", "set_name": "A"}, {"set_code": "S2", "set_name": "B"}]),
    );
    let mut store = MemoryStore::new();
    store.fail_on("game_config.equipment_set_configs", "set_code", SqlValue::text("S2"));

    let mut importer = Importer::new(store, WritePolicy::Truncate);
    importer
        .run(&Plan::Equipment { dir: dir.path().to_path_buf() })
        .await
        .unwrap();

    assert_eq!(counts(&importer, "equipment_sets"), [1, 0, 0, 1]);
    assert_eq!(importer.store().count("game_config.equipment_set_configs"), 1);
}

#[tokio::test]
async fn missing_monsters_file_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let mut importer = Importer::new(reference_store(), WritePolicy::Incremental);
    let result = importer
        .run(&Plan::Monsters { file: dir.path().join("monsters.json") })
        .await;
    assert_matches!(result, Err(ImportError::Source(SourceError::NotFound(_))));
}

#[tokio::test]
async fn missing_equipment_files_skip_without_wiping() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("drop_pools.json"), "{ not json").unwrap();
    write_json(dir.path(), "world_drop_configs.json", json!([]));
    let mut store = MemoryStore::new();
    store.seed("game_config.items", vec![Column::new("item_code", SqlValue::text("OLD"))]);
    store.seed(
        "game_config.world_drop_configs",
        vec![Column::new("base_drop_rate", SqlValue::Float(Some(0.1)))],
    );

    let mut importer = Importer::new(store, WritePolicy::Truncate);
    importer
        .run(&Plan::Equipment { dir: dir.path().to_path_buf() })
        .await
        .unwrap();

    assert_eq!(importer.store().count("game_config.items"), 1);
    assert_eq!(importer.store().count("game_config.world_drop_configs"), 1);
    assert!(importer.stats().category("items").is_none());
}

#[tokio::test]
async fn later_equipment_steps_see_items_from_earlier_steps() {
    let dir = tempfile::tempdir().unwrap();
    write_json(
        dir.path(),
        "items.json",
        json!([{"item_code": "POTION", "item_name": "Potion", "item_type": "consumable", "item_quality": "common", "max_stack_size": 99}]),
    );
    write_json(
        dir.path(),
        "drop_pools.json",
        json!([{"pool_code": "P1", "pool_name": "Pool", "pool_type": "monster",
                "items": [{"item_code": "POTION", "drop_rate": 0.25}, {"item_code": "ELIXIR"}]}]),
    );
    write_json(
        dir.path(),
        "world_drop_configs.json",
        json!([{"item_code": "POTION", "base_drop_rate": 0.01}, {"item_code": "ELIXIR"}]),
    );

    let mut importer = Importer::new(MemoryStore::new(), WritePolicy::Truncate);
    importer
        .run(&Plan::Equipment { dir: dir.path().to_path_buf() })
        .await
        .unwrap();

    let pools = importer.stats().category("drop_pools").unwrap();
    assert_eq!(pools.links["items_added"].added, 1);
    assert_eq!(pools.links["items_added"].skipped, 1);
    assert_eq!(counts(&importer, "world_drops"), [1, 0, 0, 1]);
}

#[tokio::test]
async fn summary_reports_every_category_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_json(dir.path(), "monsters.json", json!([goblin(json!([]))]));

    let mut importer = Importer::new(reference_store(), WritePolicy::Incremental);
    importer.run(&Plan::Monsters { file }).await.unwrap();
    let (_, summary) = importer.finish(false);

    assert!(!summary.interrupted);
    assert!(!summary.has_failures());
    let rendered = summary.to_string();
    assert!(rendered.contains("monsters"));
    assert!(rendered.contains("drops_added: 1"));
}
