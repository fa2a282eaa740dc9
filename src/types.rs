use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Block header summary normalized from the availability API.
///
/// Chain-specific header fields are passed through as opaque JSON.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct BlockSummary {
    pub height: u64,
    pub hash: Option<String>,
    pub timestamp: i64,
    pub size: u64,
    pub num_transactions: u64,
    pub human_readable_time: String,
    pub human_readable_size: String,
    pub l1_head: Option<Value>,
    pub l1_finalized: Option<Value>,
    pub chain_id: Option<Value>,
    pub fee_info: Option<Value>,
    pub builder_commitment: Option<Value>,
    pub payload_commitment: Option<Value>,
    pub header: Option<Value>,
}

/// Transaction looked up by hash, enhanced with derived fields.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TransactionSummary {
    pub hash: String,
    pub block_height: u64,
    pub index: u64,
    pub namespace: Option<u64>,
    pub tx_size_bytes: Option<u64>,
    pub sender: Option<Value>,
    // Populated by the secondary block lookup; stay `None` if it fails
    pub block_hash: Option<String>,
    pub timestamp: Option<i64>,
    pub human_readable_time: Option<String>,
    /// Upstream body with payload bytes and proofs stripped
    pub raw: Value,
}

/// One entry of a block's transaction list, as produced by the batch fetcher.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct BlockTxRef {
    pub hash: String,
    pub index: u64,
    pub namespace: u64,
}

/// Row of the explorer `transaction_summaries` listing.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TxPageEntry {
    pub hash: String,
    #[serde(default)]
    pub rollups: Vec<u64>,
    #[serde(default)]
    pub height: u64,
    #[serde(default)]
    pub offset: u64,
    #[serde(default)]
    pub time: Option<String>,
}

/// Page of the explorer listing requested by the batch fetcher.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageRequest {
    pub offset: u64,
    pub limit: u64,
}

/// Rollup registered in the explorer bundle.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RollupEntry {
    pub namespace: u64,
    pub name: String,
    pub website: String,
    pub scan: String,
}

/// Semantic type of a search string.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryKind {
    Transaction,
    BlockHash,
    BlockOrNamespace,
    Namespace,
    RollupName,
    Invalid,
}

/// Namespace resolved to a registered rollup.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct NamespaceRef {
    pub namespace: u64,
    pub name: String,
    pub website: String,
    pub scan: String,
}

impl From<RollupEntry> for NamespaceRef {
    fn from(r: RollupEntry) -> Self {
        NamespaceRef {
            namespace: r.namespace,
            name: r.name,
            website: r.website,
            scan: r.scan,
        }
    }
}

/// Data payload of a search result; the tag doubles as the envelope type.
#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum EnvelopePayload {
    Block(BlockSummary),
    Transaction(TransactionSummary),
    Namespace(NamespaceRef),
    Rollup(RollupEntry),
    Error { error: String },
}

/// Uniform output of a search.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct ResultEnvelope {
    pub payload: EnvelopePayload,
    pub query: String,
    pub display_text: Option<String>,
    pub description: Option<String>,
}

/// Envelope type tag without its payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EnvelopeKind {
    Block,
    Transaction,
    Namespace,
    Rollup,
    Error,
}

impl ResultEnvelope {
    pub fn new(payload: EnvelopePayload, query: &str, display_text: impl Into<String>) -> Self {
        Self {
            payload,
            query: query.to_string(),
            display_text: Some(display_text.into()),
            description: None,
        }
    }

    pub fn error(query: &str, message: impl Into<String>) -> Self {
        Self {
            payload: EnvelopePayload::Error {
                error: message.into(),
            },
            query: query.to_string(),
            display_text: None,
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn kind(&self) -> EnvelopeKind {
        match self.payload {
            EnvelopePayload::Block(_) => EnvelopeKind::Block,
            EnvelopePayload::Transaction(_) => EnvelopeKind::Transaction,
            EnvelopePayload::Namespace(_) => EnvelopeKind::Namespace,
            EnvelopePayload::Rollup(_) => EnvelopeKind::Rollup,
            EnvelopePayload::Error { .. } => EnvelopeKind::Error,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.payload {
            EnvelopePayload::Error { error } => Some(error),
            _ => None,
        }
    }
}

/// Block frame delivered by the availability stream; only the height matters here.
#[derive(Debug, Clone, Deserialize)]
pub struct StreamBlock {
    pub header: Option<StreamHeader>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StreamHeader {
    pub fields: Option<StreamHeaderFields>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StreamHeaderFields {
    #[serde(default)]
    pub height: u64,
}

impl StreamBlock {
    pub fn height(&self) -> u64 {
        self.header
            .as_ref()
            .and_then(|h| h.fields.as_ref())
            .map(|f| f.height)
            .unwrap_or(0)
    }
}
