//! Block stream follower
//!
//! Subscribes to the availability block stream and feeds every new head into
//! [`BlockDiscovery`], so the head cache stays warm without polling.
//! This module is only available with the `native` feature.

use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use tokio::sync::mpsc::UnboundedSender;
use tokio_tungstenite::connect_async;
use tungstenite::protocol::Message;

use crate::config::Config;
use crate::constants::stream::{
    INITIAL_RECONNECT_DELAY_MS, MAX_RECONNECT_ATTEMPTS, MAX_RECONNECT_DELAY_MS,
};
use crate::discovery::BlockDiscovery;
use crate::error::{Result, ScanError};
use crate::types::StreamBlock;

/// Delay before reconnect attempt `attempt` (1-based): 1s, 2s, 4s, ... capped.
pub fn reconnect_delay(attempt: u32) -> Duration {
    let shift = attempt.saturating_sub(1).min(16);
    let ms = INITIAL_RECONNECT_DELAY_MS.saturating_mul(1 << shift);
    Duration::from_millis(ms.min(MAX_RECONNECT_DELAY_MS))
}

/// Parse one text frame; returns the block height if the frame is a block.
pub fn frame_height(text: &str) -> Option<u64> {
    serde_json::from_str::<StreamBlock>(text)
        .ok()
        .map(|b| b.height())
        .filter(|h| *h > 0)
}

pub struct HeadFollower {
    cfg: Config,
    discovery: Arc<BlockDiscovery>,
    last_seen: u64,
    notify: Option<UnboundedSender<u64>>,
}

impl HeadFollower {
    pub fn new(cfg: Config, discovery: Arc<BlockDiscovery>) -> Self {
        Self {
            cfg,
            discovery,
            last_seen: 0,
            notify: None,
        }
    }

    /// Also send every new head height to `tx`.
    pub fn with_notify(mut self, tx: UnboundedSender<u64>) -> Self {
        self.notify = Some(tx);
        self
    }

    pub fn last_seen(&self) -> u64 {
        self.last_seen
    }

    fn stream_url(&self, from: u64) -> String {
        self.cfg.ws_url(&format!("/availability/stream/blocks/{from}"))
    }

    /// Follow the stream until reconnects are exhausted.
    pub async fn run(&mut self) -> Result<()> {
        let mut attempts = 0u32;
        loop {
            let from = if self.last_seen > 0 {
                self.last_seen + 1
            } else {
                self.discovery.discover_latest_height().await?
            };

            match self.follow(from).await {
                Ok(frames) if frames > 0 => attempts = 0,
                Ok(_) => {}
                Err(e) => log::warn!("[stream] connection error: {e}"),
            }

            attempts += 1;
            if attempts > MAX_RECONNECT_ATTEMPTS {
                return Err(ScanError::UpstreamUnavailable(format!(
                    "block stream: gave up after {MAX_RECONNECT_ATTEMPTS} reconnect attempts"
                )));
            }
            let delay = reconnect_delay(attempts);
            log::info!(
                "[stream] reconnecting in {}ms (attempt {attempts}/{MAX_RECONNECT_ATTEMPTS})",
                delay.as_millis()
            );
            tokio::time::sleep(delay).await;
        }
    }

    /// One connection. Returns the number of block frames handled.
    async fn follow(&mut self, from: u64) -> Result<usize> {
        let url = self.stream_url(from);
        log::info!("[stream] connecting to {url}");
        let (ws, _) = connect_async(url.as_str())
            .await
            .map_err(|e| ScanError::UpstreamUnavailable(format!("block stream: {e}")))?;
        let (_write, mut read) = ws.split();

        let mut frames = 0;
        while let Some(msg) = read.next().await {
            let text = match msg {
                Ok(Message::Text(t)) => t,
                Ok(Message::Close(_)) => break,
                Ok(_) => continue,
                Err(e) => {
                    return Err(ScanError::UpstreamUnavailable(format!("block stream: {e}")));
                }
            };
            let Some(height) = frame_height(&text) else {
                log::debug!("[stream] ignoring non-block frame");
                continue;
            };
            frames += 1;
            if height > self.last_seen {
                self.last_seen = height;
                self.discovery.observe_head(height);
                if let Some(tx) = &self.notify {
                    let _ = tx.send(height);
                }
            }
        }
        Ok(frames)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reconnect_delay_doubles_and_caps() {
        assert_eq!(reconnect_delay(1), Duration::from_secs(1));
        assert_eq!(reconnect_delay(2), Duration::from_secs(2));
        assert_eq!(reconnect_delay(3), Duration::from_secs(4));
        assert_eq!(reconnect_delay(4), Duration::from_secs(8));
        assert_eq!(reconnect_delay(5), Duration::from_secs(10));
        assert_eq!(reconnect_delay(40), Duration::from_secs(10));
    }

    #[test]
    fn frames_yield_heights() {
        let frame = r#"{"header":{"fields":{"height":4242,"timestamp":1}},"num_transactions":3}"#;
        assert_eq!(frame_height(frame), Some(4242));
        assert_eq!(frame_height(r#"{"header":null}"#), None);
        assert_eq!(frame_height("not json"), None);
    }
}
