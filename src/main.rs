//! opsdesk - operational reporting over chat
//!
//! A Telegram bot that walks restaurant staff through filing follow-ups,
//! kitchen and facility issues, and shout-outs into a Notion database.

mod config;
mod notion;
mod report;
mod runtime;
mod session;
mod state_machine;
mod telegram;

use axum::{routing::get, Router};
use config::Config;
use notion::NotionClient;
use runtime::Dispatcher;
use session::SessionStore;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use telegram::TelegramClient;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Pause before retrying after a failed poll
const POLL_RETRY_SECS: u64 = 5;
/// Cadence of the background expiry sweep
const SWEEP_INTERVAL_SECS: u64 = 60;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "opsdesk=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    let config = Config::from_env()?;

    let telegram = Arc::new(TelegramClient::new(&config.telegram_token));
    let notion = Arc::new(NotionClient::new(
        &config.notion_token,
        &config.employees_db_id,
        &config.communication_db_id,
    ));
    let sessions = Arc::new(SessionStore::new(chrono::Duration::seconds(
        config.session_timeout_secs,
    )));

    let dispatcher = Arc::new(Dispatcher::new(
        telegram.clone(),
        telegram.clone(),
        notion.clone(),
        notion,
        sessions.clone(),
        config.shoutout_chat_id,
    ));

    // Background sweep so abandoned sessions do not pile up between lookups
    let sweep_sessions = sessions.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(SWEEP_INTERVAL_SECS));
        loop {
            interval.tick().await;
            let removed = sweep_sessions.sweep_expired(chrono::Local::now().naive_local());
            if removed > 0 {
                tracing::info!(removed, "Swept expired sessions");
            }
        }
    });

    // Health endpoint for container orchestration
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let app = Router::new().route("/health", get(|| async { "OK" }));
    tokio::spawn(async move {
        match tokio::net::TcpListener::bind(addr).await {
            Ok(listener) => {
                tracing::info!("Health endpoint listening on {}", addr);
                if let Err(e) = axum::serve(listener, app).await {
                    tracing::error!(error = %e, "Health server exited");
                }
            }
            Err(e) => tracing::error!(error = %e, "Failed to bind health endpoint"),
        }
    });

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "Starting update poll loop"
    );

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutting down");
                break;
            }
            batch = telegram.get_updates() => {
                match batch {
                    Ok(updates) => {
                        for update in updates {
                            dispatcher
                                .handle_update(update, chrono::Local::now().naive_local())
                                .await;
                        }
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Poll failed, backing off");
                        tokio::time::sleep(Duration::from_secs(POLL_RETRY_SECS)).await;
                    }
                }
            }
        }
    }

    Ok(())
}
