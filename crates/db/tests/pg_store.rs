//! Integration tests for `PgStore` against a migrated database.
//!
//! Require `DATABASE_URL`; run with `cargo test -- --ignored`.

use assert_matches::assert_matches;
use sqlx::PgPool;
use tsu_core::schema::ReferenceKind;
use tsu_core::store::{Column, ConfigStore, SqlValue, StoreError};
use tsu_db::users::UserRepo;
use tsu_db::PgStore;

async fn store(pool: &PgPool) -> PgStore {
    let conn = pool.acquire().await.unwrap().detach();
    PgStore::from_connection(conn)
}

fn item_row(code: &str, name: &str) -> Vec<Column> {
    vec![
        Column::new("item_code", SqlValue::text(code)),
        Column::new("item_name", SqlValue::text(name)),
        Column::new("item_type", SqlValue::text("weapon")),
        Column::new("item_quality", SqlValue::text("common")),
        Column::new("base_value", SqlValue::Int(Some(0))),
        Column::new("out_of_combat_effects", SqlValue::Json(None)),
    ]
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn insert_then_find_by_natural_key(pool: PgPool) {
    let mut store = store(&pool).await;

    let id = store.insert("game_config.items", &item_row("SWORD01", "Sword")).await.unwrap();
    let found = store
        .find_id("game_config.items", &[Column::new("item_code", SqlValue::text("SWORD01"))], false)
        .await
        .unwrap();
    assert_eq!(found, Some(id));

    let missing = store
        .find_id("game_config.items", &[Column::new("item_code", SqlValue::text("NOPE"))], false)
        .await
        .unwrap();
    assert_eq!(missing, None);
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn live_lookup_skips_tombstoned_monsters(pool: PgPool) {
    sqlx::query(
        "INSERT INTO game_config.monsters (monster_code, monster_name, monster_level, max_hp, deleted_at) \
         VALUES ('GOBLIN', 'Goblin', 5, 40, NOW())",
    )
    .execute(&pool)
    .await
    .unwrap();

    let mut store = store(&pool).await;
    let key = [Column::new("monster_code", SqlValue::text("GOBLIN"))];
    assert_eq!(store.find_id("game_config.monsters", &key, true).await.unwrap(), None);
    assert!(store.find_id("game_config.monsters", &key, false).await.unwrap().is_some());

    let row = vec![
        Column::new("monster_code", SqlValue::text("GOBLIN")),
        Column::new("monster_name", SqlValue::text("Goblin")),
        Column::new("monster_level", SqlValue::Int(Some(5))),
        Column::new("max_hp", SqlValue::Int(Some(40))),
    ];
    let id = store.insert("game_config.monsters", &row).await.unwrap();
    assert_eq!(store.find_id("game_config.monsters", &key, true).await.unwrap(), Some(id));
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn update_overwrites_columns(pool: PgPool) {
    let mut store = store(&pool).await;
    let id = store.insert("game_config.items", &item_row("SWORD01", "Sword")).await.unwrap();

    store
        .update("game_config.items", id, &item_row("SWORD01", "Long Sword"))
        .await
        .unwrap();

    let name: String = sqlx::query_scalar("SELECT item_name FROM game_config.items WHERE id = $1")
        .bind(id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(name, "Long Sword");
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn reference_load_skips_soft_deleted_rows(pool: PgPool) {
    sqlx::query(
        "INSERT INTO game_config.skills (skill_code, skill_name) VALUES ('SLASH', 'Slash'), ('OLD', 'Old')",
    )
    .execute(&pool)
    .await
    .unwrap();
    sqlx::query("UPDATE game_config.skills SET deleted_at = NOW() WHERE skill_code = 'OLD'")
        .execute(&pool)
        .await
        .unwrap();

    let mut store = store(&pool).await;
    let table = store.load_reference(ReferenceKind::Skill).await.unwrap();
    assert_eq!(table.len(), 1);
    assert!(table.get("SLASH").is_some());
    assert!(table.get("OLD").is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn enum_columns_bind_through_casts(pool: PgPool) {
    let mut store = store(&pool).await;
    let row = vec![
        Column::new("tag_code", SqlValue::text("FIRE")),
        Column::new("tag_name", SqlValue::text("Fire")),
        Column::new("category", SqlValue::text("monster")).cast(Some("game_config.tag_type_enum")),
    ];
    store.insert("game_config.tags", &row).await.unwrap();

    let category: String = sqlx::query_scalar("SELECT category::text FROM game_config.tags WHERE tag_code = 'FIRE'")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(category, "monster");
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn savepoint_rollback_keeps_earlier_rows(pool: PgPool) {
    let mut store = store(&pool).await;
    store.begin().await.unwrap();
    store.insert("game_config.items", &item_row("A", "A")).await.unwrap();

    store.savepoint("record_2").await.unwrap();
    let err = store
        .insert("game_config.items", &item_row("A", "duplicate"))
        .await
        .unwrap_err();
    assert_matches!(err, StoreError::Statement(msg) if msg.contains("23505"));
    store.rollback_to_savepoint("record_2").await.unwrap();

    store.insert("game_config.items", &item_row("B", "B")).await.unwrap();
    store.commit().await.unwrap();

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM game_config.items")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 2);
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn rollback_discards_step_writes(pool: PgPool) {
    let mut store = store(&pool).await;
    store.begin().await.unwrap();
    assert!(store.in_transaction());
    store.insert("game_config.items", &item_row("A", "A")).await.unwrap();
    store.rollback().await.unwrap();
    assert!(!store.in_transaction());

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM game_config.items")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn delete_where_filters_by_discriminator(pool: PgPool) {
    sqlx::query("INSERT INTO game_config.tags (tag_code, tag_name) VALUES ('T', 'T')")
        .execute(&pool)
        .await
        .unwrap();
    sqlx::query(
        "INSERT INTO game_config.tags_relations (entity_type, entity_id, tag_id)
         SELECT kind, 1, id FROM game_config.tags, (VALUES ('monster'), ('skill')) AS k(kind)",
    )
    .execute(&pool)
    .await
    .unwrap();

    let mut store = store(&pool).await;
    let deleted = store
        .delete_where(
            "game_config.tags_relations",
            &[Column::new("entity_type", SqlValue::text("monster"))],
        )
        .await
        .unwrap();
    assert_eq!(deleted, 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn commit_without_begin_is_rejected(pool: PgPool) {
    let mut store = store(&pool).await;
    assert_matches!(store.commit().await, Err(StoreError::Transaction(_)));
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn user_lookup_by_username(pool: PgPool) {
    sqlx::query("INSERT INTO auth.users (username, email) VALUES ('root', 'root@tsu-game.com')")
        .execute(&pool)
        .await
        .unwrap();

    let mut store = store(&pool).await;
    let id = UserRepo::find_id_by_username(store.connection(), "root").await.unwrap();
    assert!(id.is_some());
    let missing = UserRepo::find_id_by_username(store.connection(), "ghost").await.unwrap();
    assert_eq!(missing, None);
}
