//! Application constants
//!
//! Hash shapes, digit windows, cache and retry timings, and the registry
//! bundle patterns used throughout the crate.

/// Query shapes recognised by the classifier
pub mod query {
    /// Canonical prefix carried by transaction hashes
    pub const TX_PREFIX: &str = "TX~";

    /// Canonical prefix carried by block hashes
    pub const BLOCK_PREFIX: &str = "BLOCK~";

    /// Length of a bare base64url-encoded transaction hash
    pub const BASE64_HASH_LENGTH: usize = 44;

    /// Length of a hex hash (without `0x`)
    pub const HEX_HASH_LENGTH: usize = 64;

    /// Upper bound of the digit window that may be a block height or a namespace
    pub const MAX_BLOCK_HEIGHT_DIGITS: usize = 12;

    /// Digit window that can only be a namespace
    pub const MIN_NAMESPACE_DIGITS: usize = 13;
    pub const MAX_NAMESPACE_DIGITS: usize = 15;

    /// Non-numeric queries shorter than this resolve to an empty result set
    pub const MIN_SEARCH_LENGTH_NON_NUMERIC: usize = 2;
}

/// Upstream call behaviour
pub mod upstream {
    /// Attempts per call, including the first
    pub const RETRY_ATTEMPTS: u32 = 3;

    /// First backoff delay; doubles on every further attempt
    pub const RETRY_BASE_DELAY_MS: u64 = 1000;

    /// Head height cache lifetime
    pub const HEAD_CACHE_TTL_MS: u64 = 5000;

    /// Page size for the explorer transaction listing
    pub const TX_PAGE_SIZE: u64 = 100;

    /// Only network the explorer serves
    pub const NETWORK: &str = "mainnet";

    /// User agent sent when fetching the registry bundle
    pub const USER_AGENT: &str = "Mozilla/5.0 (compatible; composable-scan)";
}

/// Registry bundle text patterns
///
/// The bundle is minified third-party output; these literals describe its
/// current shape and are the only place that knows about it.
pub mod registry {
    /// Namespace that the minifier hoists into a variable
    pub const SENTINEL_NAMESPACE: u64 = 1_397_311_310;

    /// Indirect binding emitted for the sentinel namespace
    pub const HOISTED_BINDING: &str = "Hl=1397311310,qr=new k(Hl";

    /// Inline form the binding is rewritten to
    pub const INLINED_BINDING: &str = "qr=new k(1397311310";

    /// Opening of each rollup constructor call
    pub const CTOR_OPEN: &str = "new k(";

    /// Separator between the display name and the website URL
    pub const URL_OPEN: &str = "new URL(\"";

    /// Manually curated aliases: (display name, alias)
    pub const NAME_ALIASES: &[(&str, &str)] =
        &[("MOLTEN", "MOLTEN NETWORK"), ("LOGX", "LOGX NETWORK")];
}

/// Block stream follower
pub mod stream {
    pub const MAX_RECONNECT_ATTEMPTS: u32 = 5;
    pub const INITIAL_RECONNECT_DELAY_MS: u64 = 1000;
    pub const MAX_RECONNECT_DELAY_MS: u64 = 10_000;
}
