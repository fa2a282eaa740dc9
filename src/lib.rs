//! composable-scan - rollup block explorer search core
//!
//! This library resolves free-form explorer searches (transaction hashes,
//! block hashes, block heights, namespace ids, rollup names) against an
//! availability API and a rollup registry mined from the explorer bundle.
//!
//! ## Architecture
//!
//! - [`classify`]: pure query classification
//! - [`registry`]: rollup registry extracted from bundle text
//! - [`gateway`]: availability API client with bounded retry
//! - [`discovery`]: chain head discovery with a short-lived cache
//! - [`batch`]: full transaction lists via concurrent page fetches
//! - [`resolver`]: the search orchestrator
//!
//! ## Usage
//!
//! ```bash
//! cargo run --bin scan -- search 123456
//! cargo run --bin scan-proxy --features proxy
//! ```

// Core modules
pub mod config;
pub mod constants;
pub mod error;
pub mod types;
pub mod util_text;

// Upstream access
pub mod net;
pub mod gateway;

// Services
pub mod batch;
pub mod discovery;
pub mod registry;

// Search
pub mod classify;
pub mod resolver;

// Block stream follower (native-only)
#[cfg(feature = "native")]
pub mod source_ws;

// Re-export commonly used types
pub use batch::{BatchFetcher, BlockTransactions};
pub use classify::classify;
pub use config::Config;
pub use discovery::BlockDiscovery;
pub use error::{Result, ScanError};
pub use gateway::Gateway;
pub use registry::{RefreshOutcome, RollupRegistry};
pub use resolver::SearchResolver;
pub use types::{
    BlockSummary, BlockTxRef, EnvelopeKind, EnvelopePayload, QueryKind, ResultEnvelope,
    RollupEntry, TransactionSummary,
};
