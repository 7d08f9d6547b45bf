//! `StudyBot` - Telegram shop for student projects.
//!
//! Long-polls the Bot API and serves optional health endpoints.
//!
//! # Architecture
//!
//! - Bot API over `reqwest`, long polling with per-chat ordering
//! - `PostgreSQL` via `sqlx` for users, catalog, orders and tickets
//! - In-memory dialogue state (`moka`) for multi-step forms
//! - Uploaded deliverables on the local filesystem
//! - Axum for `/health` and `/health/ready`

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;

use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use studybot_bot::config::BotConfig;
use studybot_bot::services::FileStorage;
use studybot_bot::state::AppState;
use studybot_bot::telegram::TelegramClient;
use studybot_bot::{db, health, runtime};

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &BotConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            sample_rate: config.sentry_sample_rate,
            traces_sample_rate: config.sentry_traces_sample_rate,
            attach_stacktrace: true,
            // Telegram ids are attached explicitly per update
            send_default_pii: false,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    let config = BotConfig::from_env().expect("Failed to load configuration");

    // Sentry must be initialized before the tracing subscriber
    let _sentry_guard = init_sentry(&config);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "studybot_bot=info,studybot=info,tower_http=info".into());

    let json_layer = config
        .json_logs
        .then(|| tracing_subscriber::fmt::layer().json().flatten_event(true));
    let text_layer = (!config.json_logs).then(tracing_subscriber::fmt::layer);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let pool = db::create_pool(&config.database_url)
        .await
        .expect("Failed to create database pool");
    tracing::info!("Database pool created");

    // NOTE: Migrations are NOT run automatically on startup.
    // Run them explicitly via: cargo run -p studybot-cli -- migrate

    FileStorage::new(config.uploads_dir.clone())
        .init()
        .await
        .expect("Failed to create uploads directory");

    let client = TelegramClient::new(&config.telegram).expect("Failed to build Telegram client");
    let me = client.get_me().await.expect("Bot token rejected by Telegram");
    tracing::info!(bot_id = me.id, username = ?me.username, "Connected to Telegram");

    if let Some(addr) = config.health_addr {
        let pool = pool.clone();
        tokio::spawn(async move {
            if let Err(e) = health::serve(addr, pool, runtime::shutdown_signal()).await {
                tracing::error!(error = %e, "Health server failed");
            }
        });
    }

    let state = AppState::new(config, pool, Arc::new(client.clone()), me.username);
    runtime::run(state, client, runtime::shutdown_signal()).await;
}
