// src/main.rs

use std::{process::ExitCode, sync::Arc, time::Duration};

use assessment_engine::{
    AppState,
    config::Config,
    store::PgStore,
};
use sqlx::{PgPool, postgres::PgPoolOptions};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const CONNECT_RETRIES: u32 = 5;

#[tokio::main]
async fn main() -> ExitCode {
    // Load configuration from environment (and .env, if present)
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    let file_appender = tracing_appender::rolling::daily(&config.log_dir, "grade-backfill.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::new(&config.rust_log);
    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    // Initialize Tracing (Logging)
    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    let Some(pool) = connect_with_retry(&config).await else {
        return ExitCode::FAILURE;
    };
    tracing::info!("Database connected...");

    // Run Migrations Automatically
    tracing::info!("Running migrations...");
    if let Err(e) = sqlx::migrate!("./migrations").run(&pool).await {
        tracing::error!("Failed to run database migrations: {}", e);
        return ExitCode::FAILURE;
    }
    tracing::info!("Migrations applied successfully.");

    let state = AppState::new(Arc::new(PgStore::new(pool)), config.clone());

    match config.backfill_course_id {
        Some(course_id) => tracing::info!("Recalculating grades for course {}", course_id),
        None => tracing::info!("Recalculating grades for all courses"),
    }

    match state.grades.recalculate_all(config.backfill_course_id).await {
        Ok(summary) => {
            tracing::info!(
                "Backfill finished: {} recalculated, {} failed",
                summary.recalculated,
                summary.failed
            );
            if summary.failed == 0 {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(e) => {
            tracing::error!("Backfill aborted: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn connect_with_retry(config: &Config) -> Option<PgPool> {
    let mut retry_count = 0;
    loop {
        match PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&config.database_url)
            .await
        {
            Ok(pool) => return Some(pool),
            Err(e) => {
                retry_count += 1;
                if retry_count > CONNECT_RETRIES {
                    tracing::error!(
                        "Failed to connect to database after {} retries: {}",
                        CONNECT_RETRIES,
                        e
                    );
                    return None;
                }
                tracing::warn!("Database not ready, retrying in 2s... (Attempt {})", retry_count);
                tokio::time::sleep(Duration::from_secs(2)).await;
            }
        }
    }
}
