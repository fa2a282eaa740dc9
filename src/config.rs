use anyhow::{anyhow, Result};
use clap::Parser;
use std::env;

use crate::constants::upstream;

/// Composable Scan - rollup explorer search backend
///
/// Configuration priority: CLI args > Environment variables > Defaults
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "scan")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Rollup explorer search backend", long_about = None)]
pub struct CliArgs {
    /// Availability API base URL
    #[arg(long, env = "API_BASE_URL")]
    pub api_base_url: Option<String>,

    /// Availability API version path segment
    #[arg(long, env = "API_VERSION")]
    pub api_version: Option<String>,

    /// Streaming endpoint base URL
    #[arg(long, env = "WS_BASE_URL")]
    pub ws_base_url: Option<String>,

    /// Explorer (scan) base URL
    #[arg(long, env = "SCAN_BASE_URL")]
    pub scan_base_url: Option<String>,

    /// URL of the explorer bundle that embeds the rollup registry
    #[arg(long, env = "WEB_WORKER_URL")]
    pub web_worker_url: Option<String>,

    /// Network name (only mainnet is served)
    #[arg(long, env = "NETWORK")]
    pub network: Option<String>,

    /// Upstream request timeout in milliseconds (1000-60000)
    #[arg(long, env = "RPC_TIMEOUT_MS")]
    pub rpc_timeout_ms: Option<u64>,

    /// Attempts per upstream call, including the first (1-10)
    #[arg(long, env = "RETRY_ATTEMPTS")]
    pub retry_attempts: Option<u32>,

    /// First retry delay in milliseconds, doubled per attempt (0-60000)
    #[arg(long, env = "RETRY_BASE_DELAY_MS")]
    pub retry_base_delay_ms: Option<u64>,

    /// Lifetime of the cached head height in milliseconds (0-60000)
    #[arg(long, env = "HEAD_CACHE_TTL_MS")]
    pub head_cache_ttl_ms: Option<u64>,

    /// Page size for block transaction listings (1-100)
    #[arg(long, env = "PAGE_SIZE")]
    pub page_size: Option<u64>,

    /// Proxy listen port
    #[arg(long, env = "PORT")]
    pub port: Option<u16>,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub api_base_url: String,
    pub api_version: String,
    pub ws_base_url: String,
    pub scan_base_url: String,
    pub web_worker_url: String,
    pub network: String,
    pub rpc_timeout_ms: u64,
    pub retry_attempts: u32,
    pub retry_base_delay_ms: u64,
    pub head_cache_ttl_ms: u64,
    pub page_size: u64,
    pub port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "https://query.main.net.espresso.network".to_string(),
            api_version: "v0".to_string(),
            ws_base_url: "wss://query.main.net.espresso.network".to_string(),
            scan_base_url: "https://explorer.main.net.espresso.network".to_string(),
            web_worker_url: "https://explorer.main.net.espresso.network/assets/node_validator_web_worker_api.js-bT9djMJi.js".to_string(),
            network: upstream::NETWORK.to_string(),
            rpc_timeout_ms: 8000,
            retry_attempts: upstream::RETRY_ATTEMPTS,
            retry_base_delay_ms: upstream::RETRY_BASE_DELAY_MS,
            head_cache_ttl_ms: upstream::HEAD_CACHE_TTL_MS,
            page_size: upstream::TX_PAGE_SIZE,
            port: 3030,
        }
    }
}

/// Validate that a value is within a given range (inclusive)
fn validate_in_range<T>(val: T, min: T, max: T, name: &str) -> Result<T>
where
    T: PartialOrd + std::fmt::Display + Copy,
{
    if val < min || val > max {
        Err(anyhow!("{name} must be in range [{min}, {max}], got {val}"))
    } else {
        Ok(val)
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|s| s.parse().ok())
}

/// Load configuration from CLI args and environment variables
pub fn load() -> Result<Config> {
    Config::from_args(CliArgs::parse())
}

impl Config {
    /// Resolve already-parsed arguments against env and defaults.
    pub fn from_args(args: CliArgs) -> Result<Config> {
        let d = Config::default();

        let api_base_url = args
            .api_base_url
            .or_else(|| env::var("API_BASE_URL").ok())
            .unwrap_or(d.api_base_url);
        validate_url(&api_base_url, "API_BASE_URL")?;

        let ws_base_url = args
            .ws_base_url
            .or_else(|| env::var("WS_BASE_URL").ok())
            .unwrap_or(d.ws_base_url);
        validate_url(&ws_base_url, "WS_BASE_URL")?;

        let scan_base_url = args
            .scan_base_url
            .or_else(|| env::var("SCAN_BASE_URL").ok())
            .unwrap_or(d.scan_base_url);
        validate_url(&scan_base_url, "SCAN_BASE_URL")?;

        let web_worker_url = args
            .web_worker_url
            .or_else(|| env::var("WEB_WORKER_URL").ok())
            .unwrap_or(d.web_worker_url);
        validate_url(&web_worker_url, "WEB_WORKER_URL")?;

        let api_version = args
            .api_version
            .or_else(|| env::var("API_VERSION").ok())
            .unwrap_or(d.api_version);

        let network = args
            .network
            .or_else(|| env::var("NETWORK").ok())
            .unwrap_or(d.network)
            .to_lowercase();
        if network != upstream::NETWORK {
            return Err(anyhow!(
                "NETWORK '{network}' is not supported (only {})",
                upstream::NETWORK
            ));
        }

        let rpc_timeout_ms = args
            .rpc_timeout_ms
            .or_else(|| env_parse("RPC_TIMEOUT_MS"))
            .unwrap_or(d.rpc_timeout_ms);
        let rpc_timeout_ms = validate_in_range(rpc_timeout_ms, 1000, 60000, "RPC_TIMEOUT_MS")?;

        let retry_attempts = args
            .retry_attempts
            .or_else(|| env_parse("RETRY_ATTEMPTS"))
            .unwrap_or(d.retry_attempts);
        let retry_attempts = validate_in_range(retry_attempts, 1, 10, "RETRY_ATTEMPTS")?;

        let retry_base_delay_ms = args
            .retry_base_delay_ms
            .or_else(|| env_parse("RETRY_BASE_DELAY_MS"))
            .unwrap_or(d.retry_base_delay_ms);
        let retry_base_delay_ms =
            validate_in_range(retry_base_delay_ms, 0, 60000, "RETRY_BASE_DELAY_MS")?;

        let head_cache_ttl_ms = args
            .head_cache_ttl_ms
            .or_else(|| env_parse("HEAD_CACHE_TTL_MS"))
            .unwrap_or(d.head_cache_ttl_ms);
        let head_cache_ttl_ms =
            validate_in_range(head_cache_ttl_ms, 0, 60000, "HEAD_CACHE_TTL_MS")?;

        let page_size = args
            .page_size
            .or_else(|| env_parse("PAGE_SIZE"))
            .unwrap_or(d.page_size);
        let page_size = validate_in_range(page_size, 1, 100, "PAGE_SIZE")?;

        let port = args.port.or_else(|| env_parse("PORT")).unwrap_or(d.port);

        Ok(Config {
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            api_version: api_version.trim_matches('/').to_string(),
            ws_base_url: ws_base_url.trim_end_matches('/').to_string(),
            scan_base_url: scan_base_url.trim_end_matches('/').to_string(),
            web_worker_url,
            network,
            rpc_timeout_ms,
            retry_attempts,
            retry_base_delay_ms,
            head_cache_ttl_ms,
            page_size,
            port,
        })
    }

    /// Config pointing at explicit endpoints with defaults elsewhere (no CLI/env).
    pub fn for_endpoints(api_base_url: &str, ws_base_url: &str, web_worker_url: &str) -> Config {
        Config {
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            ws_base_url: ws_base_url.trim_end_matches('/').to_string(),
            web_worker_url: web_worker_url.to_string(),
            ..Config::default()
        }
    }

    /// `{api}/{version}{endpoint}`
    pub fn api_url(&self, endpoint: &str) -> String {
        format!("{}/{}{}", self.api_base_url, self.api_version, endpoint)
    }

    /// `{ws}/{version}{endpoint}`
    pub fn ws_url(&self, endpoint: &str) -> String {
        format!("{}/{}{}", self.ws_base_url, self.api_version, endpoint)
    }

    /// `{scan}{path}`
    pub fn scan_url(&self, path: &str) -> String {
        format!("{}{}", self.scan_base_url, path)
    }

    pub fn print_summary(&self) {
        log::info!("Composable Scan configuration:");
        log::info!("  Network: {}", self.network);
        log::info!("  API: {}/{}", self.api_base_url, self.api_version);
        log::info!("  Stream: {}", self.ws_base_url);
        log::info!("  Registry bundle: {}", self.web_worker_url);
        log::info!("  Timeout: {}ms", self.rpc_timeout_ms);
        log::info!(
            "  Retry: {} attempts, {}ms base delay",
            self.retry_attempts,
            self.retry_base_delay_ms
        );
        log::info!("  Head cache TTL: {}ms", self.head_cache_ttl_ms);
        log::info!("  Page size: {}", self.page_size);
    }
}

/// Validate URL format (basic check)
fn validate_url(url: &str, name: &str) -> Result<()> {
    if url.is_empty() {
        return Err(anyhow!("{name} cannot be empty"));
    }

    if url.starts_with("ws://")
        || url.starts_with("wss://")
        || url.starts_with("http://")
        || url.starts_with("https://")
    {
        Ok(())
    } else {
        Err(anyhow!(
            "{name} must start with ws://, wss://, http://, or https://"
        ))
    }
}
