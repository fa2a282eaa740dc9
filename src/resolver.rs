//! Search orchestration: classify a query, dispatch it, and turn expected
//! failures into `error` envelopes.

use std::sync::Arc;

use crate::classify::{classify, is_too_short};
use crate::constants::query::MIN_SEARCH_LENGTH_NON_NUMERIC;
use crate::error::Result;
use crate::gateway::Gateway;
use crate::registry::RollupRegistry;
use crate::types::{
    BlockSummary, EnvelopePayload, NamespaceRef, QueryKind, ResultEnvelope, RollupEntry,
};
use crate::util_text::format_number;

const DISPLAY_QUERY_CHARS: usize = 20;

fn short_query(q: &str) -> String {
    let mut s: String = q.chars().take(DISPLAY_QUERY_CHARS).collect();
    if q.chars().count() > DISPLAY_QUERY_CHARS {
        s.push_str("...");
    }
    s
}

fn block_description(block: &BlockSummary) -> String {
    format!(
        "{} transactions • {}",
        format_number(block.num_transactions),
        block.human_readable_size
    )
}

fn rollup_description(entry: &RollupEntry) -> String {
    format!("{} rollup • {}", entry.name, entry.website)
}

#[derive(Debug, Clone)]
pub struct SearchResolver {
    gateway: Arc<Gateway>,
    registry: Arc<RollupRegistry>,
}

impl SearchResolver {
    pub fn new(gateway: Arc<Gateway>, registry: Arc<RollupRegistry>) -> Self {
        Self { gateway, registry }
    }

    pub fn gateway(&self) -> &Arc<Gateway> {
        &self.gateway
    }

    pub fn registry(&self) -> &Arc<RollupRegistry> {
        &self.registry
    }

    /// Resolve `query` into result envelopes.
    ///
    /// Not-found and ambiguous outcomes come back as `error` envelopes; an
    /// invalid or too-short query yields an empty list. Only a registry that
    /// cannot be loaded surfaces as `Err`.
    pub async fn search(&self, query: &str) -> Result<Vec<ResultEnvelope>> {
        let q = query.trim();
        if is_too_short(q, MIN_SEARCH_LENGTH_NON_NUMERIC) {
            return Ok(Vec::new());
        }

        let kind = classify(q);
        log::debug!("[search] '{q}' classified as {kind:?}");

        match kind {
            QueryKind::Invalid => Ok(Vec::new()),
            QueryKind::Transaction => Ok(vec![self.search_transaction(q).await]),
            QueryKind::BlockHash => Ok(vec![self.search_block_hash(q).await]),
            QueryKind::Namespace => self.search_namespace(q).await,
            QueryKind::BlockOrNamespace => self.search_block_or_namespace(q).await,
            QueryKind::RollupName => self.search_rollup_name(q).await,
        }
    }

    async fn search_transaction(&self, q: &str) -> ResultEnvelope {
        match self.gateway.get_transaction_by_hash(q).await {
            Ok(tx) => {
                let description = match (tx.block_height, tx.namespace) {
                    (h, Some(ns)) => format!("Block #{h} • NS {ns}"),
                    (h, None) => format!("Block #{h}"),
                };
                ResultEnvelope::new(
                    EnvelopePayload::Transaction(tx),
                    q,
                    format!("Transaction {}", short_query(q)),
                )
                .with_description(description)
            }
            Err(e) => {
                log::debug!("[search] transaction '{q}': {e}");
                ResultEnvelope::error(q, format!("Transaction not found: {q}"))
            }
        }
    }

    async fn search_block_hash(&self, q: &str) -> ResultEnvelope {
        match self.gateway.get_block_by_hash(q).await {
            Ok(block) => {
                let description = block_description(&block);
                ResultEnvelope::new(
                    EnvelopePayload::Block(block),
                    q,
                    format!("Block Hash {}", short_query(q)),
                )
                .with_description(description)
            }
            Err(e) => {
                log::debug!("[search] block hash '{q}': {e}");
                ResultEnvelope::error(q, format!("Block hash not found: {q}"))
            }
        }
    }

    fn namespace_envelope(q: &str, entry: RollupEntry) -> ResultEnvelope {
        let display = format!("Namespace #{} ({})", entry.namespace, entry.name);
        let description = rollup_description(&entry);
        ResultEnvelope::new(EnvelopePayload::Namespace(NamespaceRef::from(entry)), q, display)
            .with_description(description)
    }

    async fn search_namespace(&self, q: &str) -> Result<Vec<ResultEnvelope>> {
        let registry = self.registry.ensure_ready().await?;
        let entry = q
            .parse::<u64>()
            .ok()
            .and_then(|ns| registry.entry_by_namespace(ns).cloned());

        Ok(vec![match entry {
            Some(entry) => Self::namespace_envelope(q, entry),
            None => ResultEnvelope::error(q, format!("Namespace #{q} is not a registered rollup")),
        }])
    }

    /// Both readings are tried independently; when both hit, each envelope is
    /// annotated so the ambiguity stays visible. A registry failure only
    /// removes the namespace reading; it is raised when the block reading
    /// found nothing either.
    async fn search_block_or_namespace(&self, q: &str) -> Result<Vec<ResultEnvelope>> {
        let Ok(value) = q.parse::<u64>() else {
            return Ok(vec![ResultEnvelope::error(q, format!("No block or rollup found: {q}"))]);
        };

        let block = match self.gateway.get_block_by_height(value).await {
            Ok(b) => Some(b),
            Err(e) => {
                log::debug!("[search] block {value}: {e}");
                None
            }
        };

        let rollup = match self.registry.ensure_ready().await {
            Ok(registry) => registry.entry_by_namespace(value).cloned(),
            Err(e) if block.is_some() => {
                log::warn!("[search] namespace reading of {value} skipped: {e}");
                None
            }
            Err(e) => return Err(e),
        };

        let results = match (block, rollup) {
            (Some(block), Some(entry)) => {
                let block_desc = format!("Block data • {}", block_description(&block));
                let rollup_desc = format!("Rollup data • {}", rollup_description(&entry));
                vec![
                    ResultEnvelope::new(EnvelopePayload::Block(block), q, format!("Block #{value}"))
                        .with_description(block_desc),
                    Self::namespace_envelope(q, entry).with_description(rollup_desc),
                ]
            }
            (Some(block), None) => {
                let desc = block_description(&block);
                vec![
                    ResultEnvelope::new(EnvelopePayload::Block(block), q, format!("Block #{value}"))
                        .with_description(desc),
                ]
            }
            (None, Some(entry)) => vec![Self::namespace_envelope(q, entry)],
            (None, None) => vec![ResultEnvelope::error(
                q,
                format!("No block or rollup found: {q}"),
            )],
        };
        Ok(results)
    }

    async fn search_rollup_name(&self, q: &str) -> Result<Vec<ResultEnvelope>> {
        let registry = self.registry.ensure_ready().await?;
        let matches = registry.search_by_term(q);
        if matches.is_empty() {
            return Ok(vec![ResultEnvelope::error(q, format!("No rollup found: {q}"))]);
        }

        Ok(matches
            .into_iter()
            .map(|entry| {
                let description = rollup_description(&entry);
                ResultEnvelope::new(EnvelopePayload::Rollup(entry), q, format!("Rollup \"{q}\""))
                    .with_description(description)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_queries_are_shortened_for_display() {
        assert_eq!(short_query("TX~abc"), "TX~abc");
        assert_eq!(short_query(&"a".repeat(25)), format!("{}...", "a".repeat(20)));
    }
}
