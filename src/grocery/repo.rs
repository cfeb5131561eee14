use anyhow::Context;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct GroceryList {
    pub user_id: Uuid,
    pub items: Option<String>,
    pub updated_at: OffsetDateTime,
}

impl GroceryList {
    /// Stored text, `None` when the list is missing or blank.
    pub fn text(&self) -> Option<&str> {
        self.items.as_deref().filter(|s| !s.trim().is_empty())
    }
}

pub async fn find(db: &PgPool, user_id: Uuid) -> anyhow::Result<Option<GroceryList>> {
    let row = sqlx::query_as::<_, GroceryList>(
        r#"SELECT user_id, items, updated_at FROM grocery_lists WHERE user_id = $1"#,
    )
    .bind(user_id)
    .fetch_optional(db)
    .await
    .context("load grocery list")?;
    Ok(row)
}

pub async fn upsert(db: &PgPool, user_id: Uuid, items: Option<&str>) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO grocery_lists (user_id, items, updated_at)
        VALUES ($1, $2, now())
        ON CONFLICT (user_id) DO UPDATE SET items = EXCLUDED.items, updated_at = now()
        "#,
    )
    .bind(user_id)
    .bind(items)
    .execute(db)
    .await
    .context("upsert grocery list")?;
    Ok(())
}

pub async fn clear(db: &PgPool, user_id: Uuid) -> anyhow::Result<()> {
    upsert(db, user_id, None).await
}
