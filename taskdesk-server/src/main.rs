//! `TaskDesk` server -- owner-scoped task storage over WebSocket.
//!
//! An axum WebSocket server holding accounts, sessions, and per-owner
//! task lists. Clients talk to it with postcard-encoded request frames
//! and get exactly one response per request.
//!
//! # Usage
//!
//! ```bash
//! # Run on default address 0.0.0.0:9100
//! cargo run --bin taskdesk-server
//!
//! # Run on custom address
//! cargo run --bin taskdesk-server -- --bind 127.0.0.1:8080
//!
//! # Or via environment variable
//! TASKDESK_SERVER_ADDR=127.0.0.1:8080 cargo run --bin taskdesk-server
//! ```

use std::sync::Arc;

use clap::Parser;
use taskdesk_server::config::{ServerCliArgs, ServerConfig};
use taskdesk_server::server::{self, AppState};

#[tokio::main]
async fn main() {
    let cli = ServerCliArgs::parse();

    // Load config from CLI args + config file + env vars + defaults.
    let config = match ServerConfig::load(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading configuration: {e}");
            std::process::exit(1);
        }
    };

    // Initialize tracing with the resolved log level.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    tracing::info!(addr = %config.bind_addr, "starting taskdesk server");

    let state = Arc::new(AppState::with_config(config.max_per_page));

    match server::start_server_with_state(&config.bind_addr, state).await {
        Ok((bound_addr, handle)) => {
            tracing::info!(addr = %bound_addr, "taskdesk server listening");
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "taskdesk server task failed");
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to start taskdesk server");
            std::process::exit(1);
        }
    }
}
