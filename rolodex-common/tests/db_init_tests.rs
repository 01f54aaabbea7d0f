//! Database initialization and migrations

use rolodex_common::db::{
    get_schema_version, init_database, init_memory_database, run_migrations,
    CURRENT_SCHEMA_VERSION,
};
use std::time::Duration;

#[tokio::test]
async fn test_database_creation_when_missing() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("nested").join("rolodex.db");

    let result = init_database(&db_path, Duration::from_millis(500)).await;

    assert!(result.is_ok(), "Database initialization failed: {:?}", result.err());
    assert!(db_path.exists(), "Database file was not created");
}

#[tokio::test]
async fn test_database_opens_existing() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("rolodex.db");

    let pool1 = init_database(&db_path, Duration::from_millis(500)).await.unwrap();
    pool1.close().await;

    let pool2 = init_database(&db_path, Duration::from_millis(500)).await;
    assert!(pool2.is_ok(), "Failed to open existing database: {:?}", pool2.err());
}

#[tokio::test]
async fn test_tables_created() {
    let pool = init_memory_database().await.unwrap();

    for table in ["raw_contacts", "contact_data", "label_groups", "schema_version"] {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?)",
        )
        .bind(table)
        .fetch_one(&pool)
        .await
        .unwrap();
        assert!(exists, "table {} missing", table);
    }
}

#[tokio::test]
async fn test_migrations_are_idempotent() {
    let pool = init_memory_database().await.unwrap();
    assert_eq!(get_schema_version(&pool).await.unwrap(), CURRENT_SCHEMA_VERSION);

    run_migrations(&pool).await.unwrap();
    run_migrations(&pool).await.unwrap();

    let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM schema_version")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(rows, CURRENT_SCHEMA_VERSION as i64);
}

#[tokio::test]
async fn test_foreign_keys_cascade() {
    let pool = init_memory_database().await.unwrap();

    sqlx::query(
        "INSERT INTO raw_contacts (lookup_key, created_at, updated_at) VALUES ('k1', 0, 0)",
    )
    .execute(&pool)
    .await
    .unwrap();
    sqlx::query("INSERT INTO contact_data (raw_contact_id, field, value) VALUES (1, 'note', 'x')")
        .execute(&pool)
        .await
        .unwrap();

    sqlx::query("DELETE FROM raw_contacts WHERE id = 1")
        .execute(&pool)
        .await
        .unwrap();

    let left: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM contact_data")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(left, 0);

    let orphan = sqlx::query(
        "INSERT INTO contact_data (raw_contact_id, field, value) VALUES (99, 'note', 'x')",
    )
    .execute(&pool)
    .await;
    assert!(orphan.is_err(), "foreign key should reject unknown parent");
}
