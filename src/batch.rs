//! Complete transaction list of a block, fetched as concurrent pages of the
//! explorer listing.

use futures::future::join_all;
use std::sync::Arc;

use crate::error::Result;
use crate::gateway::Gateway;
use crate::types::{BlockTxRef, PageRequest, TxPageEntry};

/// Split `[0, total)` into pages of `page_size`.
pub fn plan_pages(total: u64, page_size: u64) -> Vec<PageRequest> {
    let page_size = page_size.max(1);
    (0..total)
        .step_by(page_size as usize)
        .map(|offset| PageRequest {
            offset,
            limit: page_size.min(total - offset),
        })
        .collect()
}

/// Order rows by descending page offset, keeping only the first rollup id.
///
/// Descending offset is the established display order for block listings;
/// changing it to ascending must be a deliberate decision.
pub fn order_and_reduce(mut rows: Vec<TxPageEntry>) -> Vec<BlockTxRef> {
    rows.sort_by(|a, b| b.offset.cmp(&a.offset));
    rows.into_iter()
        .map(|tx| BlockTxRef {
            namespace: tx.rollups.first().copied().unwrap_or(0),
            index: tx.offset,
            hash: tx.hash,
        })
        .collect()
}

#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct BlockTransactions {
    pub transactions: Vec<BlockTxRef>,
    pub total_transactions: u64,
    pub returned_transactions: usize,
    pub batches_processed: usize,
}

#[derive(Debug)]
pub struct BatchFetcher {
    gateway: Arc<Gateway>,
    page_size: u64,
}

impl BatchFetcher {
    pub fn new(gateway: Arc<Gateway>) -> Self {
        let page_size = gateway.config().page_size;
        Self { gateway, page_size }
    }

    /// All transactions of block `height`. Only the initial block lookup can
    /// fail; a failed page contributes nothing.
    pub async fn get_all_transactions(&self, height: u64) -> Result<Vec<BlockTxRef>> {
        Ok(self.get_block_transactions(height).await?.transactions)
    }

    /// Same as [`Self::get_all_transactions`] with listing counters attached.
    pub async fn get_block_transactions(&self, height: u64) -> Result<BlockTransactions> {
        let block = self.gateway.get_block_by_height(height).await?;
        let total = block.num_transactions;
        if total == 0 {
            return Ok(BlockTransactions::default());
        }

        let pages = plan_pages(total, self.page_size);
        log::debug!(
            "[batch] block {height}: {total} txs in {} pages",
            pages.len()
        );

        let results = join_all(pages.iter().map(|p| async move {
            match self
                .gateway
                .get_transaction_page(height, p.offset, p.limit)
                .await
            {
                Ok(rows) => rows,
                Err(e) => {
                    log::warn!(
                        "[batch] block {height} page offset={} limit={} failed: {e}",
                        p.offset,
                        p.limit
                    );
                    Vec::new()
                }
            }
        }))
        .await;

        let transactions = order_and_reduce(results.into_iter().flatten().collect());
        Ok(BlockTransactions {
            returned_transactions: transactions.len(),
            total_transactions: total,
            batches_processed: pages.len(),
            transactions,
        })
    }
}
