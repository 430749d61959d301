// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Grove - Community Moderation Bot
//!
//! Reads platform events as JSON lines on stdin and acts on them through the
//! platform REST API and the suggestion service.

use std::sync::Arc;

use tokio::io::BufReader;
use tracing::{info, warn};

use grove_bot::platform::DiscordRest;
use grove_bot::suggestions::HttpSuggestionService;
use grove_bot::{Bot, Config, EventBridge};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "grove_bot=info,grove_core=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    // Load .env file if present
    if let Err(e) = dotenvy::dotenv() {
        warn!("No .env file loaded: {}", e);
    }

    // Load configuration
    let config = Config::from_env()?;

    info!(
        guild_id = %config.guild_id,
        data_dir = %config.data_dir.display(),
        suggestions_host = %config.suggestions_host,
        "Starting Grove"
    );

    let platform = Arc::new(DiscordRest::new(
        &config.token,
        &config.application_id,
        &config.guild_id,
    )?);
    let suggestions = Arc::new(HttpSuggestionService::new(
        &config.suggestions_host,
        &config.suggestions_auth,
    )?);

    let bot = Bot::load(config, platform, suggestions).await?;

    let bridge = EventBridge::new(bot);
    let shutdown = bridge.shutdown_handle();
    let mut bridge_task = tokio::spawn(bridge.run(BufReader::new(tokio::io::stdin())));

    info!("Grove ready");

    // Wait for shutdown signal or the event source closing
    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            result?;
            info!("Shutdown signal received");
            shutdown.notify_one();
            let stats = bridge_task.await??;
            info!(dispatched = stats.dispatched, "Event bridge drained");
            info!("Grove shut down");
            // Dropping the runtime would block on the pending stdin read
            // until the writer closes the pipe.
            std::process::exit(0);
        }
        joined = &mut bridge_task => {
            let stats = joined??;
            info!(
                dispatched = stats.dispatched,
                malformed = stats.malformed,
                "Event source closed"
            );
        }
    }

    info!("Grove shut down");

    Ok(())
}
