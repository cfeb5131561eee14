use std::time::Duration;

mod app;
mod auth;
mod config;
mod dietary;
mod emails;
mod error;
mod grocery;
mod inventory;
mod preferences;
mod recipes;
mod state;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "cravings=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let app_state = state::AppState::init().await?;

    if let Err(e) = sqlx::migrate!("./migrations").run(&app_state.db).await {
        tracing::warn!(error = %e, "migration failed; continuing");
    }

    if let Some(secs) = app_state.config.email_sweep_interval_secs {
        tracing::info!(every_secs = secs, "scheduled email sweeper enabled");
        emails::services::spawn_sweeper(app_state.clone(), Duration::from_secs(secs));
    }

    let app = app::build_app(app_state);
    app::serve(app).await
}
