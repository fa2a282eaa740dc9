//! Availability API client.
//!
//! Every call returns values normalized into [`crate::types`]; large opaque
//! fields (payload bytes, payload proofs) are stripped before anything leaves
//! this module.

use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::constants::query::{BLOCK_PREFIX, TX_PREFIX};
use crate::error::{Result, ScanError};
use crate::net::{get_with_retry, AssumeOnline, Reachability, RetryPolicy};
use crate::types::{BlockSummary, TransactionSummary, TxPageEntry};
use crate::util_text::{base64_decoded_len, format_block_size, format_block_time};

#[derive(Clone)]
pub struct Gateway {
    client: reqwest::Client,
    cfg: Config,
    policy: RetryPolicy,
    reach: Arc<dyn Reachability>,
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway")
            .field("api", &self.cfg.api_base_url)
            .field("policy", &self.policy)
            .finish()
    }
}

impl Gateway {
    pub fn new(cfg: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .pool_max_idle_per_host(8)
            .tcp_nodelay(true)
            .timeout(Duration::from_millis(cfg.rpc_timeout_ms))
            .build()?;

        Ok(Self {
            client,
            cfg: cfg.clone(),
            policy: RetryPolicy::new(
                cfg.retry_attempts,
                Duration::from_millis(cfg.retry_base_delay_ms),
            ),
            reach: Arc::new(AssumeOnline),
        })
    }

    /// Replace the connectivity check consulted between retries.
    pub fn with_reachability(mut self, reach: Arc<dyn Reachability>) -> Self {
        self.reach = reach;
        self
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    pub fn http_client(&self) -> &reqwest::Client {
        &self.client
    }

    async fn get_json(&self, endpoint: &str, policy: RetryPolicy, label: &str) -> Result<Value> {
        let url = self.cfg.api_url(endpoint);
        log::debug!("[gateway] GET {url}");
        let res = get_with_retry(&self.client, &url, policy, self.reach.as_ref(), label).await?;
        Ok(res.json::<Value>().await?)
    }

    fn single_attempt(&self) -> RetryPolicy {
        RetryPolicy::new(1, Duration::ZERO)
    }

    /// Block summary at `height` (must be >= 1), with bounded retry.
    pub async fn get_block_by_height(&self, height: u64) -> Result<BlockSummary> {
        if height < 1 {
            return Err(ScanError::InvalidArgument(format!(
                "invalid block height: {height}"
            )));
        }

        let label = format!("block {height}");
        let mut data = self
            .get_json(&format!("/availability/block/{height}"), self.policy, &label)
            .await?;
        strip_payload(&mut data);
        Ok(block_summary_from_json(&data, Some(height)))
    }

    /// Block summary by hash; the `BLOCK~` prefix is optional on input.
    pub async fn get_block_by_hash(&self, hash: &str) -> Result<BlockSummary> {
        let hash = normalize_prefixed(hash, BLOCK_PREFIX);
        let endpoint = format!("/availability/block/hash/{}", urlencoding::encode(&hash));
        let label = format!("block with hash {hash}");
        let mut data = self.get_json(&endpoint, self.single_attempt(), &label).await?;
        strip_payload(&mut data);

        let mut block = block_summary_from_json(&data, None);
        if block.hash.is_none() {
            block.hash = Some(hash);
        }
        Ok(block)
    }

    /// Transaction by hash, enhanced with size, containing block hash and age.
    pub async fn get_transaction_by_hash(&self, hash: &str) -> Result<TransactionSummary> {
        let hash = normalize_prefixed(hash, TX_PREFIX);
        let endpoint = format!(
            "/availability/transaction/hash/{}",
            urlencoding::encode(&hash)
        );
        let label = format!("transaction {hash}");
        let data = self.get_json(&endpoint, self.single_attempt(), &label).await?;
        let mut tx = transaction_summary_from_json(data, &hash)?;

        if tx.block_height > 0 {
            match self.get_block_by_height(tx.block_height).await {
                Ok(block) => {
                    tx.block_hash = block.hash;
                    tx.timestamp = Some(block.timestamp);
                    tx.human_readable_time = Some(block.human_readable_time);
                }
                Err(e) => {
                    log::debug!(
                        "[gateway] containing block {} for {hash} unavailable: {e}",
                        tx.block_height
                    );
                }
            }
        }
        Ok(tx)
    }

    /// Per-namespace transaction listing of one block, passed through as-is.
    /// Any non-success status means the slice is not available.
    pub async fn get_namespace_data(&self, height: u64, namespace: u64) -> Result<Value> {
        let url = self
            .cfg
            .api_url(&format!("/availability/block/{height}/namespace/{namespace}"));
        let label = format!("namespace {namespace} in block {height}");
        log::debug!("[gateway] GET {url}");

        let res = self
            .client
            .get(&url)
            .header("Content-Type", "application/json")
            .send()
            .await
            .map_err(|e| ScanError::UpstreamUnavailable(format!("{label}: {e}")))?;

        let status = res.status();
        if !status.is_success() {
            return Err(ScanError::NotFound(format!(
                "{label} (http {})",
                status.as_u16()
            )));
        }
        Ok(res.json::<Value>().await?)
    }

    /// Raw head height as reported upstream; zero is returned as-is.
    pub async fn get_head_height(&self) -> Result<u64> {
        let v = self
            .get_json("/status/block-height", self.single_attempt(), "head height")
            .await?;
        parse_height(&v).ok_or_else(|| ScanError::Decode(format!("invalid block height: {v}")))
    }

    /// One page of the explorer transaction listing for `height`.
    pub async fn get_transaction_page(
        &self,
        height: u64,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<TxPageEntry>> {
        let endpoint =
            format!("/explorer/transactions/from/{height}/{offset}/{limit}/block/{height}");
        let label = format!("transactions {offset}+{limit} of block {height}");
        let mut v = self.get_json(&endpoint, self.single_attempt(), &label).await?;
        match v.get_mut("transaction_summaries").map(Value::take) {
            Some(Value::Null) | None => Ok(Vec::new()),
            Some(list) => Ok(serde_json::from_value(list)?),
        }
    }
}

/// Ensure `prefix` appears exactly once at the start of `hash`.
pub fn normalize_prefixed(hash: &str, prefix: &str) -> String {
    let mut rest = hash.trim();
    while let Some(r) = rest.strip_prefix(prefix) {
        rest = r;
    }
    format!("{prefix}{rest}")
}

fn parse_height(v: &Value) -> Option<u64> {
    v.as_u64()
        .or_else(|| v.as_str().and_then(|s| s.trim().parse().ok()))
}

fn non_null(v: &Value) -> Option<Value> {
    if v.is_null() {
        None
    } else {
        Some(v.clone())
    }
}

/// Drop payload bytes and payload proofs that are never displayed.
pub fn strip_payload(data: &mut Value) {
    if let Some(obj) = data.as_object_mut() {
        obj.remove("payload");
    }
    if let Some(tx) = data.get_mut("transaction").and_then(Value::as_object_mut) {
        tx.remove("payload");
    }
    if let Some(p) = data
        .pointer_mut("/proof/payload_proof_tx")
        .and_then(Value::as_object_mut)
    {
        p.remove("proofs");
    }
}

pub fn block_summary_from_json(data: &Value, fallback_height: Option<u64>) -> BlockSummary {
    let fields = &data["header"]["fields"];
    let height = parse_height(&fields["height"])
        .filter(|h| *h > 0)
        .or(fallback_height)
        .unwrap_or(0);
    let timestamp = fields["timestamp"]
        .as_i64()
        .or_else(|| fields["timestamp"].as_str().and_then(|s| s.parse().ok()))
        .unwrap_or(0);
    let size = data["size"].as_u64().unwrap_or(0);

    BlockSummary {
        height,
        hash: data["hash"].as_str().map(str::to_string),
        timestamp,
        size,
        num_transactions: data["num_transactions"].as_u64().unwrap_or(0),
        human_readable_time: format_block_time(timestamp),
        human_readable_size: format_block_size(size),
        l1_head: non_null(&fields["l1_head"]),
        l1_finalized: non_null(&fields["l1_finalized"]),
        chain_id: non_null(&fields["chain_config"]["chain_config"]["Left"]["chain_id"]),
        fee_info: non_null(&fields["fee_info"]),
        builder_commitment: non_null(&fields["builder_commitment"]),
        payload_commitment: non_null(&fields["payload_commitment"]),
        header: non_null(&data["header"]),
    }
}

/// Normalize a transaction-by-hash body. The block-derived fields are left
/// empty for the caller to fill.
pub fn transaction_summary_from_json(mut data: Value, hash: &str) -> Result<TransactionSummary> {
    let tx = match data.get("transaction") {
        Some(tx) if tx.is_object() => tx,
        _ => return Err(ScanError::Decode("invalid transaction data".to_string())),
    };

    let tx_size_bytes = tx["payload"].as_str().map(base64_decoded_len);
    let block_height = tx["block_height"].as_u64().unwrap_or(0);
    let namespace = tx["namespace"].as_u64();
    let sender = non_null(&tx["sender"]);
    let index = data["index"].as_u64().unwrap_or(0);

    strip_payload(&mut data);

    Ok(TransactionSummary {
        hash: hash.to_string(),
        block_height,
        index,
        namespace,
        tx_size_bytes,
        sender,
        block_hash: None,
        timestamp: None,
        human_readable_time: None,
        raw: data,
    })
}
