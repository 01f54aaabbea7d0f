//! `SqliteStore`: the three collaborator traits over one pool

use super::rows::{apply_row, columns_for};
use crate::error::BatchError;
use crate::operation::{FieldValue, Operation, ParentRef};
use crate::ports::{ContactRepository, LabelGroupStore, TransactionalBatchStore};
use async_trait::async_trait;
use rolodex_common::model::{GroupId, ParentId};
use rolodex_common::{Aggregate, FieldType, Result};
use sqlx::{Row, SqliteConnection, SqlitePool};
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl ContactRepository for SqliteStore {
    async fn fetch_by_key(&self, identifier: &str) -> Result<Option<Aggregate>> {
        let parent = sqlx::query(
            "SELECT id, lookup_key, account_type, account_name FROM raw_contacts WHERE lookup_key = ?",
        )
        .bind(identifier)
        .fetch_optional(&self.pool)
        .await?;

        let Some(parent) = parent else {
            return Ok(None);
        };

        let mut contact = Aggregate {
            identifier: Some(parent.get("lookup_key")),
            account_type: parent.get("account_type"),
            account_name: parent.get("account_name"),
            ..Aggregate::default()
        };

        let rows = sqlx::query(
            r#"
            SELECT d.id, d.field, d.kind, d.label, d.value, d.payload, g.title AS group_title
            FROM contact_data d
            LEFT JOIN label_groups g
                ON d.field = 'label' AND g.id = CAST(d.value AS INTEGER)
            WHERE d.raw_contact_id = ?
            ORDER BY d.id
            "#,
        )
        .bind(parent.get::<i64, _>("id"))
        .fetch_all(&self.pool)
        .await?;

        for row in &rows {
            apply_row(&mut contact, row)?;
        }
        contact.display_name = contact.derive_display_name();

        debug!("Loaded contact {} ({} rows)", identifier, rows.len());
        Ok(Some(contact))
    }

    async fn resolve_parent_id(&self, identifier: &str) -> Result<Option<ParentId>> {
        let id: Option<i64> = sqlx::query_scalar("SELECT id FROM raw_contacts WHERE lookup_key = ?")
            .bind(identifier)
            .fetch_optional(&self.pool)
            .await?;
        Ok(id.map(ParentId))
    }

    async fn list_identifiers(&self) -> Result<Vec<String>> {
        let keys: Vec<String> = sqlx::query_scalar("SELECT lookup_key FROM raw_contacts ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(keys)
    }

    async fn find_by_value(&self, field: FieldType, value: &str) -> Result<Vec<String>> {
        let keys: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT DISTINCT r.lookup_key
            FROM contact_data d
            JOIN raw_contacts r ON r.id = d.raw_contact_id
            WHERE d.field = ? AND d.value = ?
            ORDER BY r.id
            "#,
        )
        .bind(field.as_str())
        .bind(value)
        .fetch_all(&self.pool)
        .await?;
        Ok(keys)
    }
}

#[async_trait]
impl LabelGroupStore for SqliteStore {
    async fn find_by_title(&self, title: &str) -> Result<Option<GroupId>> {
        let id: Option<i64> = sqlx::query_scalar("SELECT id FROM label_groups WHERE title = ?")
            .bind(title)
            .fetch_optional(&self.pool)
            .await?;
        Ok(id.map(GroupId))
    }

    async fn create(&self, title: &str) -> Result<GroupId> {
        // a concurrent creator may win; either way the title maps to one row
        sqlx::query(
            "INSERT INTO label_groups (title, created_at) VALUES (?, ?) ON CONFLICT(title) DO NOTHING",
        )
        .bind(title)
        .bind(chrono::Utc::now().timestamp_millis())
        .execute(&self.pool)
        .await?;

        let id: i64 = sqlx::query_scalar("SELECT id FROM label_groups WHERE title = ?")
            .bind(title)
            .fetch_one(&self.pool)
            .await?;
        Ok(GroupId(id))
    }
}

#[async_trait]
impl TransactionalBatchStore for SqliteStore {
    async fn commit(&self, operations: &[Operation]) -> std::result::Result<(), BatchError> {
        self.run_batch(operations, None).await
    }

    /// The deadline covers begin and the operations; once they are all in,
    /// the final COMMIT always runs, so a Timeout means nothing landed.
    async fn commit_within(
        &self,
        operations: &[Operation],
        deadline: Duration,
    ) -> std::result::Result<(), BatchError> {
        self.run_batch(operations, Some(deadline)).await
    }
}

impl SqliteStore {
    async fn run_batch(
        &self,
        operations: &[Operation],
        deadline: Option<Duration>,
    ) -> std::result::Result<(), BatchError> {
        let work = async {
            let mut tx = self
                .pool
                .begin()
                .await
                .map_err(|e| BatchError::from_sqlx(0, None, &e))?;

            let now = chrono::Utc::now().timestamp_millis();
            let mut created: HashMap<usize, i64> = HashMap::new();

            // dropping `tx` on an early return rolls everything back
            for (position, op) in operations.iter().enumerate() {
                let index = position + 1;
                let id = apply_operation(&mut tx, op, index, &created, now).await?;
                if let (Operation::CreateParent(_), Some(id)) = (op, id) {
                    created.insert(position, id);
                }
            }
            Ok::<_, BatchError>(tx)
        };

        let tx = match deadline {
            None => work.await?,
            Some(deadline) => match tokio::time::timeout(deadline, work).await {
                Ok(result) => result?,
                Err(_) => {
                    return Err(BatchError::timeout(format!(
                        "operations exceeded {:?}",
                        deadline
                    )))
                }
            },
        };

        tx.commit()
            .await
            .map_err(|e| BatchError::from_sqlx(0, None, &e))?;

        debug!("Committed {} operations", operations.len());
        Ok(())
    }
}

/// Run one operation; returns the generated id of a parent insert
async fn apply_operation(
    conn: &mut SqliteConnection,
    op: &Operation,
    index: usize,
    created: &HashMap<usize, i64>,
    now: i64,
) -> std::result::Result<Option<i64>, BatchError> {
    let field = op.field();
    let db_err = |e: sqlx::Error| BatchError::from_sqlx(index, field, &e);

    match op {
        Operation::CreateParent(record) => {
            let result = sqlx::query(
                r#"
                INSERT INTO raw_contacts (lookup_key, account_type, account_name, created_at, updated_at)
                VALUES (?, ?, ?, ?, ?)
                "#,
            )
            .bind(&record.identifier)
            .bind(&record.account_type)
            .bind(&record.account_name)
            .bind(now)
            .bind(now)
            .execute(&mut *conn)
            .await
            .map_err(db_err)?;
            Ok(Some(result.last_insert_rowid()))
        }

        Operation::DeleteParent { parent } => {
            let result = sqlx::query("DELETE FROM raw_contacts WHERE id = ?")
                .bind(parent.0)
                .execute(&mut *conn)
                .await
                .map_err(db_err)?;
            if result.rows_affected() != 1 {
                return Err(BatchError::rejected(index, None, format!("no contact {}", parent)));
            }
            Ok(None)
        }

        Operation::Insert {
            field,
            value,
            parent,
        } => {
            let parent_id = match parent {
                ParentRef::Id(id) => id.0,
                ParentRef::BackReference(position) => *created.get(position).ok_or_else(|| {
                    BatchError::rejected(
                        index,
                        Some(*field),
                        format!("unresolved back-reference to position {}", position),
                    )
                })?,
            };
            let columns =
                columns_for(*field, value).map_err(|e| BatchError::rejected(index, Some(*field), e))?;

            if let FieldValue::Membership(group) = value {
                let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM label_groups WHERE id = ?")
                    .bind(group.0)
                    .fetch_optional(&mut *conn)
                    .await
                    .map_err(db_err)?;
                if exists.is_none() {
                    return Err(BatchError::rejected(
                        index,
                        Some(*field),
                        format!("no label group {}", group),
                    ));
                }
            }

            sqlx::query(
                r#"
                INSERT INTO contact_data (raw_contact_id, field, kind, label, value, payload)
                VALUES (?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(parent_id)
            .bind(field.as_str())
            .bind(columns.kind)
            .bind(columns.label)
            .bind(columns.value)
            .bind(columns.payload)
            .execute(&mut *conn)
            .await
            .map_err(db_err)?;

            sqlx::query("UPDATE raw_contacts SET updated_at = ? WHERE id = ?")
                .bind(now)
                .bind(parent_id)
                .execute(&mut *conn)
                .await
                .map_err(db_err)?;
            Ok(None)
        }

        Operation::Update {
            field,
            row_id,
            value,
        } => {
            let id = parse_row_id(index, *field, row_id)?;
            let columns =
                columns_for(*field, value).map_err(|e| BatchError::rejected(index, Some(*field), e))?;

            touch_owner(conn, id, now).await.map_err(db_err)?;
            let result = sqlx::query(
                "UPDATE contact_data SET kind = ?, label = ?, value = ?, payload = ? WHERE id = ? AND field = ?",
            )
            .bind(columns.kind)
            .bind(columns.label)
            .bind(columns.value)
            .bind(columns.payload)
            .bind(id)
            .bind(field.as_str())
            .execute(&mut *conn)
            .await
            .map_err(db_err)?;
            if result.rows_affected() != 1 {
                return Err(BatchError::rejected(
                    index,
                    Some(*field),
                    format!("no {} row {}", field, row_id),
                ));
            }
            Ok(None)
        }

        Operation::Delete { field, row_id } => {
            let id = parse_row_id(index, *field, row_id)?;

            touch_owner(conn, id, now).await.map_err(db_err)?;
            let result = sqlx::query("DELETE FROM contact_data WHERE id = ? AND field = ?")
                .bind(id)
                .bind(field.as_str())
                .execute(&mut *conn)
                .await
                .map_err(db_err)?;
            if result.rows_affected() != 1 {
                return Err(BatchError::rejected(
                    index,
                    Some(*field),
                    format!("no {} row {}", field, row_id),
                ));
            }
            Ok(None)
        }
    }
}

fn parse_row_id(index: usize, field: FieldType, row_id: &str) -> std::result::Result<i64, BatchError> {
    row_id
        .parse()
        .map_err(|_| BatchError::rejected(index, Some(field), format!("malformed row id '{}'", row_id)))
}

/// Bump `updated_at` on the contact owning data row `row_id`
async fn touch_owner(conn: &mut SqliteConnection, row_id: i64, now: i64) -> sqlx::Result<()> {
    sqlx::query(
        "UPDATE raw_contacts SET updated_at = ? WHERE id = (SELECT raw_contact_id FROM contact_data WHERE id = ?)",
    )
    .bind(now)
    .bind(row_id)
    .execute(&mut *conn)
    .await?;
    Ok(())
}
