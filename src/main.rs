use anyhow::Context;

mod app;
mod auth;
mod bootstrap;
mod config;
mod crypto;
mod error;
mod flags;
mod modules;
mod scoring;
mod server_key;
mod state;
mod tutorials;
mod users;
mod web;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "shepherd=debug,axum=info,tower_http=info".to_string());
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

    sqlx::migrate!("./migrations")
        .run(&app_state.db)
        .await
        .context("run database migrations")?;

    if app_state.config.bootstrap_enabled {
        let seeds = bootstrap::PgSeedStore::new(app_state.db.clone());
        bootstrap::run(&seeds, &app_state.config.admin)
            .await
            .map_err(|e| anyhow::anyhow!("bootstrap failed: {e}"))?;
    } else {
        tracing::info!("bootstrap disabled");
    }

    let app = app::build_app(app_state);
    app::serve(app).await
}
