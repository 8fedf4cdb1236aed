use std::time::Duration;

use anyhow::{bail, Context, Result};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use super::SessionController;

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::log_info;

/// Owns the background task that ends idle sessions.
#[derive(Default)]
pub struct EvictionSweeper {
    handle: Option<JoinHandle<()>>,
    cancel_token: Option<CancellationToken>,
}

impl EvictionSweeper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    pub fn start(
        &mut self,
        controller: SessionController,
        interval: Duration,
        ttl: Duration,
    ) -> Result<()> {
        if self.handle.is_some() {
            bail!("eviction sweeper already running");
        }
        if interval.is_zero() {
            bail!("sweep interval must be greater than zero");
        }

        let cancel_token = CancellationToken::new();
        let handle = tokio::spawn(sweep_loop(controller, interval, ttl, cancel_token.clone()));

        self.handle = Some(handle);
        self.cancel_token = Some(cancel_token);
        Ok(())
    }

    pub async fn stop(&mut self) -> Result<()> {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }

        if let Some(handle) = self.handle.take() {
            handle
                .await
                .context("eviction sweeper task failed to join")
        } else {
            Ok(())
        }
    }
}

async fn sweep_loop(
    controller: SessionController,
    interval: Duration,
    ttl: Duration,
    cancel_token: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let evicted = controller.evict_idle(ttl);
                if !evicted.is_empty() {
                    log_info!(
                        "evicted {} idle sessions ({} still live)",
                        evicted.len(),
                        controller.store().len()
                    );
                }
            }
            _ = cancel_token.cancelled() => {
                log_info!("eviction sweeper shutting down");
                break;
            }
        }
    }
}
