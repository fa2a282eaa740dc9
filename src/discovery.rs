//! Chain head discovery with a short-lived cache.

use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use tokio::time::Instant;

use crate::error::{Result, ScanError};
use crate::gateway::Gateway;
use crate::types::BlockSummary;

#[derive(Clone, Copy, Debug)]
struct HeadEntry {
    latest: u64,
    fetched_at: Instant,
}

#[derive(Debug)]
pub struct BlockDiscovery {
    gateway: Arc<Gateway>,
    ttl: Duration,
    network: String,
    cache: RwLock<Option<HeadEntry>>,
}

impl BlockDiscovery {
    pub fn new(gateway: Arc<Gateway>) -> Self {
        let ttl = Duration::from_millis(gateway.config().head_cache_ttl_ms);
        let network = gateway.config().network.clone();
        Self {
            gateway,
            ttl,
            network,
            cache: RwLock::new(None),
        }
    }

    fn cached(&self) -> Option<HeadEntry> {
        *self.cache.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn store(&self, latest: u64) {
        *self.cache.write().unwrap_or_else(PoisonError::into_inner) = Some(HeadEntry {
            latest,
            fetched_at: Instant::now(),
        });
    }

    /// Latest block height, served from cache while younger than the TTL.
    pub async fn discover_latest_height(&self) -> Result<u64> {
        if let Some(entry) = self.cached() {
            if entry.fetched_at.elapsed() < self.ttl {
                return Ok(entry.latest);
            }
        }

        let latest = match self.gateway.get_head_height().await {
            Ok(0) => {
                return Err(ScanError::DiscoveryFailed(format!(
                    "no blocks found on {}",
                    self.network
                )))
            }
            Ok(h) => h,
            Err(ScanError::Decode(msg)) => return Err(ScanError::DiscoveryFailed(msg)),
            Err(e) => return Err(e),
        };

        self.store(latest);
        log::debug!("[discovery] {} head is {latest}", self.network);
        Ok(latest)
    }

    /// Feed a head observed elsewhere (e.g. the block stream). Older heights are ignored.
    pub fn observe_head(&self, height: u64) {
        if height == 0 {
            return;
        }
        let newer = self.cached().map_or(true, |e| height > e.latest);
        if newer {
            self.store(height);
        }
    }

    /// Up to `count` blocks walking back from the head. Blocks that fail to
    /// load are skipped, so the result may be shorter than requested.
    pub async fn get_recent_blocks(&self, count: usize) -> Result<Vec<BlockSummary>> {
        let latest = self.discover_latest_height().await?;
        let mut blocks = Vec::with_capacity(count);

        for i in 0..count as u64 {
            let Some(height) = latest.checked_sub(i).filter(|h| *h >= 1) else {
                break;
            };
            match self.gateway.get_block_by_height(height).await {
                Ok(block) => blocks.push(block),
                Err(e) => log::warn!("[discovery] skipping block {height}: {e}"),
            }
        }
        Ok(blocks)
    }

    pub fn clear_cache(&self) {
        *self.cache.write().unwrap_or_else(PoisonError::into_inner) = None;
    }
}
