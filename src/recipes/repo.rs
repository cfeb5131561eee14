use anyhow::Context;
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SavedRecipe {
    pub id: Uuid,
    pub user_id: Uuid,
    pub recipe_id: i64,
    pub title: String,
    pub image: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Returns `None` when the user already saved this recipe.
pub async fn save(
    db: &PgPool,
    user_id: Uuid,
    recipe_id: i64,
    title: &str,
    image: Option<&str>,
) -> anyhow::Result<Option<SavedRecipe>> {
    let row = sqlx::query_as::<_, SavedRecipe>(
        r#"
        INSERT INTO saved_recipes (user_id, recipe_id, title, image)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (user_id, recipe_id) DO NOTHING
        RETURNING id, user_id, recipe_id, title, image, created_at
        "#,
    )
    .bind(user_id)
    .bind(recipe_id)
    .bind(title)
    .bind(image)
    .fetch_optional(db)
    .await
    .context("insert saved recipe")?;
    Ok(row)
}

pub async fn unsave(db: &PgPool, user_id: Uuid, recipe_id: i64) -> anyhow::Result<bool> {
    let res = sqlx::query(r#"DELETE FROM saved_recipes WHERE user_id = $1 AND recipe_id = $2"#)
        .bind(user_id)
        .bind(recipe_id)
        .execute(db)
        .await
        .context("delete saved recipe")?;
    Ok(res.rows_affected() > 0)
}

pub async fn list_by_user(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<SavedRecipe>> {
    let rows = sqlx::query_as::<_, SavedRecipe>(
        r#"
        SELECT id, user_id, recipe_id, title, image, created_at
        FROM saved_recipes
        WHERE user_id = $1
        ORDER BY created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await
    .context("list saved recipes")?;
    Ok(rows)
}
