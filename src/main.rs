// src/main.rs

//! Maintenance entry point: applies migrations, expires stale stories and
//! repairs follower counters. Meant to be run from cron or a job scheduler.

use chrono::Utc;
use dotenvy::dotenv;
use social_model::config::Config;
use social_model::repo::{followers, stories};
use social_model::state::{self, AppState};
use std::time::Duration;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenv().ok();

    let config = Config::from_env();

    let file_appender = tracing_appender::rolling::daily("logs", "social-model.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::new(&config.rust_log);
    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    let skip_expiry = std::env::args().any(|arg| arg == "--no-expire");

    if let Err(e) = run(config, skip_expiry).await {
        tracing::error!("Maintenance run failed: {}", e);
        std::process::exit(1);
    }
}

async fn run(config: Config, skip_expiry: bool) -> Result<(), Box<dyn std::error::Error>> {
    // Connect with retry; the database may still be starting up.
    let mut retry_count = 0;
    let pool = loop {
        match state::connect(&config).await {
            Ok(pool) => break pool,
            Err(e) => {
                retry_count += 1;
                if retry_count > 5 {
                    return Err(format!("Failed to connect to database after 5 retries: {}", e).into());
                }
                tracing::warn!("Database not ready, retrying in 2s... (Attempt {})", retry_count);
                tokio::time::sleep(Duration::from_secs(2)).await;
            }
        }
    };
    tracing::info!("Database connected...");

    tracing::info!("Running migrations...");
    state::migrate(&pool).await?;
    tracing::info!("Migrations applied successfully.");

    let state = AppState { pool, config };

    if !skip_expiry {
        let expired =
            stories::expire_stories(&state.pool, Utc::now(), state.config.story_retention()).await?;
        tracing::info!("Story expiry done, {} hidden", expired);
    }

    let repaired = followers::recount_all(&state.pool).await?;
    tracing::info!("Follower counters reconciled, {} repaired", repaired.len());

    state.pool.close().await;
    Ok(())
}
