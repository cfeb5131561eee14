use std::time::Duration;

use serde::Serialize;
use time::OffsetDateTime;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::mailer::GroceryListEmail;
use super::repo::{self, DueEmail, EmailStatus, GROCERY_LIST};
use crate::state::AppState;

pub const SCHEDULED_SUBJECT: &str = "Your Scheduled Grocery List";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepResult {
    pub id: Uuid,
    pub status: EmailStatus,
    pub email_type: String,
    #[serde(with = "time::serde::rfc3339")]
    pub scheduled_for: OffsetDateTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Email to send for a due row.
pub fn build_email(due: &DueEmail) -> anyhow::Result<GroceryListEmail> {
    if due.email_type != GROCERY_LIST {
        anyhow::bail!("unsupported email type {}", due.email_type);
    }
    let list = due
        .data
        .get("groceryList")
        .and_then(|v| v.as_str())
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| anyhow::anyhow!("scheduled email has no grocery list"))?;
    Ok(GroceryListEmail {
        to_email: due.to_email.clone(),
        grocery_list: list.to_string(),
        recipe_name: SCHEDULED_SUBJECT.into(),
    })
}

/// Claims every due pending email (for one user, or all when `user_id` is
/// `None`), sends it and records SENT or FAILED. Rows claimed by a concurrent
/// sweep are left to that sweep. Failed rows are not retried.
pub async fn sweep_due(state: &AppState, user_id: Option<Uuid>) -> anyhow::Result<Vec<SweepResult>> {
    let now = OffsetDateTime::now_utc();
    let due = repo::claim_due(&state.db, now, user_id).await?;
    let mut results = Vec::with_capacity(due.len());

    for row in due {
        let sent = match build_email(&row) {
            Ok(email) => state.mailer.send_grocery_list(&email).await,
            Err(e) => Err(e),
        };
        let (status, err) = match sent {
            Ok(()) => (EmailStatus::Sent, None),
            Err(e) => {
                error!(error = %e, email_id = %row.id, "scheduled email failed");
                (EmailStatus::Failed, Some(e.to_string()))
            }
        };
        if !repo::finish(&state.db, row.id, status).await? {
            warn!(email_id = %row.id, "scheduled email no longer claimed");
            continue;
        }
        results.push(SweepResult {
            id: row.id,
            status,
            email_type: row.email_type,
            scheduled_for: row.scheduled_for,
            error: err,
        });
    }

    if !results.is_empty() {
        info!(processed = results.len(), "scheduled emails processed");
    }
    Ok(results)
}

/// Background sweep on a fixed interval, for deployments without an
/// external cron calling the sweep endpoint.
pub fn spawn_sweeper(state: AppState, every: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if let Err(e) = sweep_due(&state, None).await {
                error!(error = %e, "scheduled email sweep failed");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn due(email_type: &str, data: serde_json::Value) -> DueEmail {
        DueEmail {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            email_type: email_type.into(),
            scheduled_for: OffsetDateTime::now_utc(),
            data,
            to_email: "cook@example.com".into(),
        }
    }

    #[test]
    fn builds_grocery_list_email() {
        let row = due(GROCERY_LIST, serde_json::json!({ "groceryList": "Produce:\n- kale" }));
        let email = build_email(&row).unwrap();
        assert_eq!(email.to_email, "cook@example.com");
        assert_eq!(email.grocery_list, "Produce:\n- kale");
        assert_eq!(email.recipe_name, SCHEDULED_SUBJECT);
    }

    #[test]
    fn rejects_rows_it_cannot_deliver() {
        assert!(build_email(&due(GROCERY_LIST, serde_json::json!({}))).is_err());
        assert!(build_email(&due(GROCERY_LIST, serde_json::json!({ "groceryList": " " }))).is_err());
        assert!(build_email(&due("NEWSLETTER", serde_json::json!({ "groceryList": "x" }))).is_err());
    }

    #[test]
    fn sweep_result_omits_empty_error() {
        let r = SweepResult {
            id: Uuid::nil(),
            status: EmailStatus::Sent,
            email_type: GROCERY_LIST.into(),
            scheduled_for: time::macros::datetime!(2026-01-01 0:00 UTC),
            error: None,
        };
        let v = serde_json::to_value(&r).unwrap();
        assert_eq!(v["status"], "SENT");
        assert!(v.get("error").is_none());
    }

    struct CountingMailer {
        to: String,
        sent: std::sync::atomic::AtomicUsize,
    }

    #[axum::async_trait]
    impl crate::emails::mailer::Mailer for CountingMailer {
        async fn send_grocery_list(&self, email: &GroceryListEmail) -> anyhow::Result<()> {
            tokio::time::sleep(Duration::from_millis(50)).await;
            if email.to_email == self.to {
                self.sent.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            }
            Ok(())
        }
    }

    // Needs a Postgres database; skipped unless TEST_DATABASE_URL is set.
    #[tokio::test]
    async fn overlapping_sweeps_send_each_row_once() {
        let Ok(url) = std::env::var("TEST_DATABASE_URL") else {
            return;
        };
        let mut state = AppState::fake();
        state.db = sqlx::postgres::PgPoolOptions::new()
            .max_connections(4)
            .connect(&url)
            .await
            .unwrap();
        sqlx::migrate!("./migrations").run(&state.db).await.unwrap();

        let to = format!("{}@example.com", Uuid::new_v4());
        let mailer = std::sync::Arc::new(CountingMailer {
            to: to.clone(),
            sent: Default::default(),
        });
        state.mailer = mailer.clone();

        let (user_id,): (Uuid,) =
            sqlx::query_as("INSERT INTO users (email, password_hash) VALUES ($1, 'x') RETURNING id")
                .bind(&to)
                .fetch_one(&state.db)
                .await
                .unwrap();
        let row = repo::create(
            &state.db,
            user_id,
            GROCERY_LIST,
            OffsetDateTime::now_utc() - time::Duration::minutes(1),
            &serde_json::json!({ "groceryList": "Produce:\n- kale" }),
        )
        .await
        .unwrap();

        let (cron, user) = tokio::join!(sweep_due(&state, None), sweep_due(&state, Some(user_id)));
        let recorded = cron
            .unwrap()
            .into_iter()
            .chain(user.unwrap())
            .filter(|r| r.id == row.id)
            .count();

        assert_eq!(mailer.sent.load(std::sync::atomic::Ordering::SeqCst), 1);
        assert_eq!(recorded, 1);
        let stored = repo::list_by_user(&state.db, user_id).await.unwrap();
        assert_eq!(stored[0].status, EmailStatus::Sent);

        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(&state.db)
            .await
            .unwrap();
    }
}
