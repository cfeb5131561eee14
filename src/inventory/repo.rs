use anyhow::Context;
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::grocery::assistant::InventoryDraft;

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub quantity: f64,
    pub unit: String,
    pub category: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Inserts all drafts or none.
pub async fn insert_many(
    db: &PgPool,
    user_id: Uuid,
    drafts: &[InventoryDraft],
) -> anyhow::Result<Vec<InventoryItem>> {
    let mut tx = db.begin().await.context("begin inventory tx")?;
    let mut items = Vec::with_capacity(drafts.len());
    for d in drafts {
        let item = sqlx::query_as::<_, InventoryItem>(
            r#"
            INSERT INTO inventory_items (user_id, name, quantity, unit, category)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, name, quantity, unit, category, created_at
            "#,
        )
        .bind(user_id)
        .bind(d.name.trim())
        .bind(d.quantity)
        .bind(d.unit.trim())
        .bind(d.category.trim())
        .fetch_one(&mut *tx)
        .await
        .context("insert inventory item")?;
        items.push(item);
    }
    tx.commit().await.context("commit inventory tx")?;
    Ok(items)
}

pub async fn list_by_user(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<InventoryItem>> {
    let rows = sqlx::query_as::<_, InventoryItem>(
        r#"
        SELECT id, user_id, name, quantity, unit, category, created_at
        FROM inventory_items
        WHERE user_id = $1
        ORDER BY category ASC, name ASC
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await
    .context("list inventory")?;
    Ok(rows)
}
