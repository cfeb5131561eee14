use std::str::FromStr;

use anyhow::Context;
use serde::Serialize;
use sqlx::{types::Json, FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

pub const GROCERY_LIST: &str = "GROCERY_LIST";

/// Delivery state of a scheduled email. A sweep claims a `Pending` row by
/// moving it to `Sending`, then finishes it as `Sent` or `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EmailStatus {
    Pending,
    Sending,
    Sent,
    Failed,
}

#[derive(Debug, thiserror::Error)]
#[error("unknown email status {0:?}")]
pub struct UnknownStatus(String);

impl EmailStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Sending => "SENDING",
            Self::Sent => "SENT",
            Self::Failed => "FAILED",
        }
    }
}

impl FromStr for EmailStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "SENDING" => Ok(Self::Sending),
            "SENT" => Ok(Self::Sent),
            "FAILED" => Ok(Self::Failed),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

// Column decoding for `#[sqlx(try_from = "String")]`.
impl TryFrom<String> for EmailStatus {
    type Error = UnknownStatus;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        raw.parse()
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledEmail {
    pub id: Uuid,
    pub user_id: Uuid,
    pub email_type: String,
    #[serde(with = "time::serde::rfc3339")]
    pub scheduled_for: OffsetDateTime,
    #[sqlx(try_from = "String")]
    pub status: EmailStatus,
    pub data: serde_json::Value,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// A due row claimed by one sweep, with the address to deliver to.
#[derive(Debug, Clone, FromRow)]
pub struct DueEmail {
    pub id: Uuid,
    pub user_id: Uuid,
    pub email_type: String,
    pub scheduled_for: OffsetDateTime,
    pub data: serde_json::Value,
    pub to_email: String,
}

const COLUMNS: &str =
    "id, user_id, email_type, scheduled_for, status, data, created_at, updated_at";

pub async fn create(
    db: &PgPool,
    user_id: Uuid,
    email_type: &str,
    scheduled_for: OffsetDateTime,
    data: &serde_json::Value,
) -> anyhow::Result<ScheduledEmail> {
    let row = sqlx::query_as::<_, ScheduledEmail>(&format!(
        r#"
        INSERT INTO scheduled_emails (user_id, email_type, scheduled_for, status, data)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING {COLUMNS}
        "#
    ))
    .bind(user_id)
    .bind(email_type)
    .bind(scheduled_for)
    .bind(EmailStatus::Pending.as_str())
    .bind(Json(data))
    .fetch_one(db)
    .await
    .context("insert scheduled email")?;
    Ok(row)
}

pub async fn list_by_user(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<ScheduledEmail>> {
    let rows = sqlx::query_as::<_, ScheduledEmail>(&format!(
        "SELECT {COLUMNS} FROM scheduled_emails WHERE user_id = $1 ORDER BY scheduled_for DESC"
    ))
    .bind(user_id)
    .fetch_all(db)
    .await
    .context("list scheduled emails")?;
    Ok(rows)
}

pub async fn delete_for_user(db: &PgPool, user_id: Uuid, id: Uuid) -> anyhow::Result<bool> {
    let res = sqlx::query(r#"DELETE FROM scheduled_emails WHERE id = $1 AND user_id = $2"#)
        .bind(id)
        .bind(user_id)
        .execute(db)
        .await
        .context("delete scheduled email")?;
    Ok(res.rows_affected() > 0)
}

/// Claims the pending rows scheduled at or before `now` (one user's rows when
/// `user_id` is set) by moving them to SENDING, and returns them oldest
/// first. Rows locked or already claimed by a concurrent sweep are skipped,
/// so each row is handed out once.
pub async fn claim_due(
    db: &PgPool,
    now: OffsetDateTime,
    user_id: Option<Uuid>,
) -> anyhow::Result<Vec<DueEmail>> {
    let rows = sqlx::query_as::<_, DueEmail>(
        r#"
        WITH claimed AS (
            UPDATE scheduled_emails
            SET status = $1, updated_at = now()
            WHERE status = $2
              AND id IN (
                SELECT id
                FROM scheduled_emails
                WHERE status = $2
                  AND scheduled_for <= $3
                  AND ($4::uuid IS NULL OR user_id = $4)
                FOR UPDATE SKIP LOCKED
              )
            RETURNING id, user_id, email_type, scheduled_for, data
        )
        SELECT c.id, c.user_id, c.email_type, c.scheduled_for, c.data, u.email AS to_email
        FROM claimed c
        JOIN users u ON u.id = c.user_id
        ORDER BY c.scheduled_for ASC
        "#,
    )
    .bind(EmailStatus::Sending.as_str())
    .bind(EmailStatus::Pending.as_str())
    .bind(now)
    .bind(user_id)
    .fetch_all(db)
    .await
    .context("claim due emails")?;
    Ok(rows)
}

/// Moves a claimed row to its final status.
pub async fn finish(db: &PgPool, id: Uuid, status: EmailStatus) -> anyhow::Result<bool> {
    let res = sqlx::query(
        r#"
        UPDATE scheduled_emails
        SET status = $2, updated_at = now()
        WHERE id = $1 AND status = $3
        "#,
    )
    .bind(id)
    .bind(status.as_str())
    .bind(EmailStatus::Sending.as_str())
    .execute(db)
    .await
    .context("update scheduled email status")?;
    Ok(res.rows_affected() > 0)
}
