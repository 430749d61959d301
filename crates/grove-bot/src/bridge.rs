// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Event ingestion.
//!
//! The gateway connection lives in a separate process that writes one JSON
//! [`BotEvent`] per line. [`EventBridge`] reads those lines and dispatches each
//! event on its own task.

use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::Notify;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::bot::Bot;
use crate::error::Error;
use crate::events::BotEvent;

/// Counters reported when the bridge stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BridgeStats {
    /// Events handed to the dispatcher
    pub dispatched: u64,
    /// Lines that did not decode as an event
    pub malformed: u64,
}

/// Reads newline-delimited events and dispatches them concurrently.
pub struct EventBridge {
    bot: Arc<Bot>,
    shutdown: Arc<Notify>,
}

impl EventBridge {
    /// Create a bridge feeding `bot`.
    pub fn new(bot: Arc<Bot>) -> Self {
        Self {
            bot,
            shutdown: Arc::new(Notify::new()),
        }
    }

    /// Get a handle to signal shutdown.
    pub fn shutdown_handle(&self) -> Arc<Notify> {
        self.shutdown.clone()
    }

    /// Run until end of input or shutdown.
    ///
    /// At end of input, in-flight handlers are awaited. On shutdown the bridge
    /// stops reading and returns at once; running handlers are left to finish
    /// on their own.
    pub async fn run<R>(self, reader: R) -> std::io::Result<BridgeStats>
    where
        R: AsyncBufRead + Unpin,
    {
        info!("Event bridge started");

        let mut lines = reader.lines();
        let mut tasks = JoinSet::new();
        let mut stats = BridgeStats::default();

        loop {
            tokio::select! {
                _ = self.shutdown.notified() => {
                    info!(in_flight = tasks.len(), "Event bridge shutting down");
                    tasks.detach_all();
                    return Ok(stats);
                }
                line = lines.next_line() => {
                    let Some(line) = line? else {
                        break;
                    };
                    if line.trim().is_empty() {
                        continue;
                    }

                    match serde_json::from_str::<BotEvent>(&line) {
                        Ok(event) => {
                            stats.dispatched += 1;
                            let bot = self.bot.clone();
                            tasks.spawn(async move {
                                let kind = event.kind();
                                if let Err(e) = bot.dispatch(event).await {
                                    error!(kind, error = %e, "Event handler failed");
                                }
                            });
                        }
                        Err(e) => {
                            stats.malformed += 1;
                            warn!(error = %Error::from(e), "Skipping malformed event");
                        }
                    }

                    // Reap finished handlers so the set does not grow unbounded.
                    while let Some(finished) = tasks.try_join_next() {
                        if let Err(e) = finished {
                            error!(error = %e, "Event handler panicked");
                        }
                    }
                }
            }
        }

        debug!(in_flight = tasks.len(), "End of input, waiting for handlers");
        while let Some(finished) = tasks.join_next().await {
            if let Err(e) = finished {
                error!(error = %e, "Event handler panicked");
            }
        }

        info!(
            dispatched = stats.dispatched,
            malformed = stats.malformed,
            "Event bridge stopped"
        );
        Ok(stats)
    }
}
