//! Mock availability API and registry bundle shared by the integration tests.

#![allow(dead_code)]

use serde_json::{json, Value};
use std::sync::Arc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use composable_scan::{Config, Gateway, RollupRegistry, SearchResolver};

pub const BUNDLE_PATH: &str = "/assets/worker.js";

/// Config pointing every endpoint at `server`, with millisecond retry delays.
pub fn test_config(server: &MockServer) -> Config {
    let mut cfg = Config::for_endpoints(
        &server.uri(),
        &server.uri().replace("http", "ws"),
        &format!("{}{BUNDLE_PATH}", server.uri()),
    );
    cfg.retry_base_delay_ms = 5;
    cfg.rpc_timeout_ms = 2000;
    cfg
}

pub fn gateway(server: &MockServer) -> Arc<Gateway> {
    Arc::new(Gateway::new(&test_config(server)).expect("client builds"))
}

pub fn resolver(server: &MockServer) -> SearchResolver {
    let gw = gateway(server);
    let registry = Arc::new(RollupRegistry::new(
        gw.http_client().clone(),
        gw.config().web_worker_url.clone(),
    ));
    SearchResolver::new(gw, registry)
}

pub fn rollup_call(namespace: u64, name: &str) -> String {
    format!(
        r#"new k({namespace},"{name}",new URL("https://{lower}.xyz"),new URL("https://scan.{lower}.xyz"))"#,
        lower = name.to_lowercase()
    )
}

/// Minified-looking bundle registering `rollups`.
pub fn bundle(rollups: &[(u64, &str)]) -> String {
    let calls: Vec<String> = rollups.iter().map(|(ns, n)| rollup_call(*ns, n)).collect();
    format!("var a=1;const b=[{}];export{{b as r}};", calls.join(","))
}

pub async fn mount_bundle(server: &MockServer, rollups: &[(u64, &str)]) {
    Mock::given(method("GET"))
        .and(path(BUNDLE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string(bundle(rollups)))
        .mount(server)
        .await;
}

pub fn block_json(height: u64, num_transactions: u64) -> Value {
    json!({
        "hash": format!("BLOCK~hash{height}"),
        "size": 1536,
        "num_transactions": num_transactions,
        "payload": "AAAAAAAA",
        "header": {"fields": {
            "height": height,
            "timestamp": 1_700_000_000,
            "l1_head": 19_000_000,
            "fee_info": {"account": "0x0", "amount": "0"}
        }}
    })
}

pub async fn mount_block(server: &MockServer, height: u64, num_transactions: u64) {
    Mock::given(method("GET"))
        .and(path(format!("/v0/availability/block/{height}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(block_json(height, num_transactions)))
        .mount(server)
        .await;
}

pub async fn mount_status(server: &MockServer, route: &str, status: u16) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}
