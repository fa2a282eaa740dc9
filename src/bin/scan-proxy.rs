//! Backend proxy server for the explorer frontend
//!
//! Exposes the search core as a small JSON API so a browser frontend can run
//! searches and block lookups without talking to the availability API
//! directly.
//!
//! ## Endpoints
//! - GET /health - Health check
//! - GET /api/search/:query - Resolve a free-form search
//! - GET /api/block/:height - Block by height
//! - GET /api/block-hash/:hash - Block by hash
//! - GET /api/transaction-hash/:hash - Transaction by hash
//! - GET /api/namespace/:height/:namespace - Namespace slice of a block
//! - GET /api/block-transactions/:height - Every transaction of a block
//! - GET /api/block-discovery/:network - Latest block height
//! - GET /api/recent-blocks?count=N - Most recent blocks
//! - GET /api/rollup?query=|namespace=|raw=true - Rollup registry lookups
//!
//! ## Usage
//! ```bash
//! cargo run --bin scan-proxy --features proxy
//! ```

use axum::{
    extract::{Path, Query, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};

use composable_scan::{
    config::load,
    net::TcpProbe,
    types::{BlockSummary, ResultEnvelope, RollupEntry, TransactionSummary},
    BatchFetcher, BlockDiscovery, BlockTransactions, Gateway, RollupRegistry, ScanError,
    SearchResolver,
};

/// Application state shared across handlers
#[derive(Clone)]
struct AppState {
    gateway: Arc<Gateway>,
    registry: Arc<RollupRegistry>,
    discovery: Arc<BlockDiscovery>,
    batch: Arc<BatchFetcher>,
    resolver: SearchResolver,
    network: String,
}

/// Error body returned by every failing endpoint
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

struct ApiError(ScanError);

impl From<ScanError> for ApiError {
    fn from(e: ScanError) -> Self {
        ApiError(e)
    }
}

fn status_for(e: &ScanError) -> StatusCode {
    match e {
        ScanError::InvalidArgument(_) | ScanError::BadRequest { .. } => StatusCode::BAD_REQUEST,
        ScanError::NotFound(_) => StatusCode::NOT_FOUND,
        ScanError::NoRollupDataFound | ScanError::DiscoveryFailed(_) | ScanError::Decode(_) => {
            StatusCode::BAD_GATEWAY
        }
        ScanError::UpstreamUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        if status.is_server_error() {
            log::error!("{}", self.0);
        } else {
            log::debug!("{}", self.0);
        }
        (
            status,
            Json(ErrorBody {
                error: self.0.to_string(),
            }),
        )
            .into_response()
    }
}

fn bad_request(msg: impl Into<String>) -> ApiError {
    ApiError(ScanError::InvalidArgument(msg.into()))
}

type ApiResult<T> = Result<Json<T>, ApiError>;

/// Query parameters for /api/recent-blocks
#[derive(Debug, Deserialize)]
struct RecentQuery {
    #[serde(default = "default_count")]
    count: usize,
}

fn default_count() -> usize {
    10
}

/// Query parameters for /api/rollup
#[derive(Debug, Deserialize, Default)]
struct RollupQuery {
    query: Option<String>,
    namespace: Option<u64>,
    #[serde(default)]
    raw: bool,
}

/// Response for /api/block-discovery
#[derive(Debug, Serialize)]
struct DiscoveryResponse {
    network: String,
    latest: u64,
}

/// Response for /api/rollup
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum RollupResponse {
    List(Vec<RollupEntry>),
    Name { namespace: u64, name: String },
    Raw { bundle: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if it exists (safe to ignore if not found)
    let _ = dotenvy::dotenv();

    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cfg = load()?;
    log::info!("Composable Scan Proxy Server");
    cfg.print_summary();
    log::info!("Port: {}", cfg.port);

    // Configure CORS (allow all origins)
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers(Any);

    // Build application state; retries stop early once the API host is unreachable
    let mut gateway = Gateway::new(&cfg)?;
    if let Some(probe) = TcpProbe::from_url(&cfg.api_base_url, Duration::from_secs(2)) {
        gateway = gateway.with_reachability(Arc::new(probe));
    }
    let gateway = Arc::new(gateway);
    let registry = Arc::new(RollupRegistry::new(
        gateway.http_client().clone(),
        cfg.web_worker_url.clone(),
    ));
    let state = AppState {
        discovery: Arc::new(BlockDiscovery::new(Arc::clone(&gateway))),
        batch: Arc::new(BatchFetcher::new(Arc::clone(&gateway))),
        resolver: SearchResolver::new(Arc::clone(&gateway), Arc::clone(&registry)),
        network: cfg.network.clone(),
        gateway,
        registry,
    };

    // Warm the registry in the background; searches load it lazily otherwise
    let warm = Arc::clone(&state.registry);
    tokio::spawn(async move {
        if let Err(e) = warm.refresh().await {
            log::warn!("[registry] initial load failed: {e}");
        }
    });

    // Build router
    let app = Router::new()
        .route("/health", get(health_handler))
        .route("/api/search/:query", get(search_handler))
        .route("/api/block/:height", get(block_handler))
        .route("/api/block-hash/:hash", get(block_hash_handler))
        .route("/api/transaction-hash/:hash", get(transaction_hash_handler))
        .route("/api/namespace/:height/:namespace", get(namespace_handler))
        .route(
            "/api/block-transactions/:height",
            get(block_transactions_handler),
        )
        .route("/api/block-discovery/:network", get(block_discovery_handler))
        .route("/api/recent-blocks", get(recent_blocks_handler))
        .route("/api/rollup", get(rollup_handler))
        .layer(cors)
        .with_state(state);

    // Start server
    let addr = format!("0.0.0.0:{}", cfg.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    log::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Health check endpoint
async fn health_handler() -> &'static str {
    "OK"
}

async fn search_handler(
    Path(query): Path<String>,
    State(state): State<AppState>,
) -> ApiResult<Vec<ResultEnvelope>> {
    log::debug!("Search '{}'", query);
    Ok(Json(state.resolver.search(&query).await?))
}

async fn block_handler(
    Path(height): Path<u64>,
    State(state): State<AppState>,
) -> ApiResult<BlockSummary> {
    Ok(Json(state.gateway.get_block_by_height(height).await?))
}

async fn block_hash_handler(
    Path(hash): Path<String>,
    State(state): State<AppState>,
) -> ApiResult<BlockSummary> {
    Ok(Json(state.gateway.get_block_by_hash(&hash).await?))
}

async fn transaction_hash_handler(
    Path(hash): Path<String>,
    State(state): State<AppState>,
) -> ApiResult<TransactionSummary> {
    Ok(Json(state.gateway.get_transaction_by_hash(&hash).await?))
}

async fn namespace_handler(
    Path((height, namespace)): Path<(u64, u64)>,
    State(state): State<AppState>,
) -> ApiResult<serde_json::Value> {
    Ok(Json(state.gateway.get_namespace_data(height, namespace).await?))
}

async fn block_transactions_handler(
    Path(height): Path<u64>,
    State(state): State<AppState>,
) -> ApiResult<BlockTransactions> {
    let listing = state.batch.get_block_transactions(height).await?;
    log::debug!(
        "Block {} listing: {}/{} txs in {} batches",
        height,
        listing.returned_transactions,
        listing.total_transactions,
        listing.batches_processed
    );
    Ok(Json(listing))
}

async fn block_discovery_handler(
    Path(network): Path<String>,
    State(state): State<AppState>,
) -> ApiResult<DiscoveryResponse> {
    if network != state.network {
        return Err(bad_request(format!(
            "unsupported network '{network}', only {} is served",
            state.network
        )));
    }
    let latest = state.discovery.discover_latest_height().await?;
    Ok(Json(DiscoveryResponse { network, latest }))
}

async fn recent_blocks_handler(
    Query(params): Query<RecentQuery>,
    State(state): State<AppState>,
) -> ApiResult<Vec<BlockSummary>> {
    let count = params.count.min(100); // Cap at 100 blocks per request
    Ok(Json(state.discovery.get_recent_blocks(count).await?))
}

async fn rollup_handler(
    Query(params): Query<RollupQuery>,
    State(state): State<AppState>,
) -> ApiResult<RollupResponse> {
    if params.raw {
        let bundle = state.registry.fetch_bundle().await?;
        return Ok(Json(RollupResponse::Raw { bundle }));
    }

    let snapshot = state.registry.ensure_ready().await?;
    if let Some(namespace) = params.namespace {
        let name = snapshot.require_namespace(namespace)?.to_string();
        return Ok(Json(RollupResponse::Name { namespace, name }));
    }
    match params.query {
        Some(q) => Ok(Json(RollupResponse::List(snapshot.search_by_term(&q)))),
        None => Ok(Json(RollupResponse::List(snapshot.entries().to_vec()))),
    }
}
