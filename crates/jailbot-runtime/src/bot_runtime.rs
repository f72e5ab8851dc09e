//! Long-polling loop that feeds Telegram updates to the command router.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use jailbot_telegram::{inbound_message_from_update, TelegramApiClient, TelegramUpdate};
use tokio::task::JoinSet;

use crate::bot_reply::TelegramReplySink;
use crate::command_router::CommandRouter;

pub const DEFAULT_IDLE_BACKOFF_MS: u64 = 1_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Public struct `BotRuntimeConfig` used across jailbot components.
pub struct BotRuntimeConfig {
    /// Run a single `getUpdates` cycle, wait for its messages and return.
    pub poll_once: bool,
    /// Delay before polling again after a transport failure.
    pub idle_backoff_ms: u64,
}

impl Default for BotRuntimeConfig {
    fn default() -> Self {
        Self {
            poll_once: false,
            idle_backoff_ms: DEFAULT_IDLE_BACKOFF_MS,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
/// Counters accumulated over one run of the polling loop.
pub struct BotRuntimeSummary {
    pub poll_cycles: u64,
    pub updates_received: u64,
    pub messages_dispatched: u64,
    pub updates_skipped: u64,
    pub poll_failures: u64,
    pub handler_failures: u64,
}

/// Next `getUpdates` offset: one past the highest update id seen so far.
pub fn next_update_offset(current: Option<i64>, updates: &[TelegramUpdate]) -> Option<i64> {
    updates
        .iter()
        .map(|update| update.update_id.saturating_add(1))
        .chain(current)
        .max()
}

/// Polls Telegram until `shutdown` resolves, spawning one task per inbound
/// message. In-flight handlers are awaited before returning.
pub async fn run_bot_polling_loop<F>(
    config: BotRuntimeConfig,
    telegram: Arc<TelegramApiClient>,
    router: Arc<CommandRouter>,
    shutdown: F,
) -> Result<BotRuntimeSummary>
where
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);
    let mut summary = BotRuntimeSummary::default();
    let mut offset = None;
    let mut handlers = JoinSet::new();

    loop {
        reap_finished_handlers(&mut handlers, &mut summary);

        let polled = tokio::select! {
            _ = &mut shutdown => {
                tracing::info!("telegram polling shutdown requested");
                break;
            }
            polled = telegram.get_updates(offset) => polled,
        };
        summary.poll_cycles = summary.poll_cycles.saturating_add(1);

        let updates = match polled {
            Ok(updates) => updates,
            Err(error) => {
                summary.poll_failures = summary.poll_failures.saturating_add(1);
                if config.poll_once {
                    drain_handlers(&mut handlers, &mut summary).await;
                    return Err(error.context("telegram getUpdates failed"));
                }
                tracing::warn!(error = %format!("{error:#}"), "telegram getUpdates failed");
                tokio::select! {
                    _ = &mut shutdown => {
                        tracing::info!("telegram polling shutdown requested");
                        break;
                    }
                    _ = tokio::time::sleep(Duration::from_millis(config.idle_backoff_ms)) => {}
                }
                continue;
            }
        };

        offset = next_update_offset(offset, &updates);
        summary.updates_received = summary
            .updates_received
            .saturating_add(updates.len() as u64);
        for update in &updates {
            let Some(message) = inbound_message_from_update(update) else {
                tracing::debug!(update_id = update.update_id, "skipping non-text update");
                summary.updates_skipped = summary.updates_skipped.saturating_add(1);
                continue;
            };
            summary.messages_dispatched = summary.messages_dispatched.saturating_add(1);
            let router = Arc::clone(&router);
            let sink = TelegramReplySink::new(Arc::clone(&telegram), message.chat_id);
            handlers.spawn(async move {
                if let Err(error) = router.handle_message(&message, &sink).await {
                    tracing::error!(
                        update_id = message.update_id,
                        chat_id = message.chat_id,
                        error = %format!("{error:#}"),
                        "chat message handling failed"
                    );
                    return false;
                }
                true
            });
        }

        if config.poll_once {
            break;
        }
    }

    drain_handlers(&mut handlers, &mut summary).await;
    tracing::info!(
        poll_cycles = summary.poll_cycles,
        updates_received = summary.updates_received,
        messages_dispatched = summary.messages_dispatched,
        updates_skipped = summary.updates_skipped,
        poll_failures = summary.poll_failures,
        handler_failures = summary.handler_failures,
        "telegram polling stopped"
    );
    Ok(summary)
}

fn reap_finished_handlers(handlers: &mut JoinSet<bool>, summary: &mut BotRuntimeSummary) {
    while let Some(joined) = handlers.try_join_next() {
        record_handler_result(joined, summary);
    }
}

async fn drain_handlers(handlers: &mut JoinSet<bool>, summary: &mut BotRuntimeSummary) {
    while let Some(joined) = handlers.join_next().await {
        record_handler_result(joined, summary);
    }
}

fn record_handler_result(
    joined: Result<bool, tokio::task::JoinError>,
    summary: &mut BotRuntimeSummary,
) {
    match joined {
        Ok(true) => {}
        Ok(false) => summary.handler_failures = summary.handler_failures.saturating_add(1),
        Err(error) => {
            tracing::error!(%error, "chat message task panicked");
            summary.handler_failures = summary.handler_failures.saturating_add(1);
        }
    }
}
