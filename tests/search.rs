//! End-to-end search resolution against a mocked availability API.

mod common;

use common::*;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use composable_scan::{EnvelopeKind, EnvelopePayload, ScanError};

#[tokio::test]
async fn numeric_query_with_existing_block_and_unregistered_namespace_returns_block() {
    let server = MockServer::start().await;
    mount_bundle(&server, &[(360, "MOLTEN")]).await;
    mount_block(&server, 123_456, 4).await;

    let results = resolver(&server).search("123456").await.unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].kind(), EnvelopeKind::Block);
    assert_eq!(results[0].query, "123456");
    assert_eq!(results[0].display_text.as_deref(), Some("Block #123456"));
    match &results[0].payload {
        EnvelopePayload::Block(b) => {
            assert_eq!(b.height, 123_456);
            assert_eq!(b.human_readable_size, "1.5 KB");
        }
        other => panic!("expected block, got {other:?}"),
    }
}

#[tokio::test]
async fn missing_transaction_becomes_error_envelope() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v0/availability/transaction/hash/TX~abc123"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let results = resolver(&server).search("TX~abc123").await.unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].kind(), EnvelopeKind::Error);
    assert_eq!(results[0].query, "TX~abc123");
    let msg = results[0].error_message().unwrap();
    assert!(msg.contains("TX~abc123"), "{msg}");
    assert!(msg.to_lowercase().contains("not found"), "{msg}");
}

#[tokio::test]
async fn rollup_name_matches_case_insensitively() {
    let server = MockServer::start().await;
    mount_bundle(&server, &[(360, "MOLTEN"), (42, "Nitro")]).await;

    let results = resolver(&server).search("Molten").await.unwrap();

    assert_eq!(results.len(), 1);
    match &results[0].payload {
        EnvelopePayload::Rollup(entry) => {
            assert_eq!(entry.namespace, 360);
            assert_eq!(entry.name, "MOLTEN");
        }
        other => panic!("expected rollup, got {other:?}"),
    }
}

#[tokio::test]
async fn empty_and_short_queries_yield_nothing() {
    let server = MockServer::start().await;
    let resolver = resolver(&server);

    assert!(resolver.search("").await.unwrap().is_empty());
    assert!(resolver.search("   ").await.unwrap().is_empty());
    assert!(resolver.search("a").await.unwrap().is_empty());
    assert!(resolver.search("%%%").await.unwrap().is_empty());
    assert!(server.received_requests().await.unwrap_or_default().is_empty());
}

#[tokio::test]
async fn ambiguous_number_returns_both_readings_annotated() {
    let server = MockServer::start().await;
    mount_bundle(&server, &[(777, "Lucky")]).await;
    mount_block(&server, 777, 2).await;

    let results = resolver(&server).search("777").await.unwrap();

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].kind(), EnvelopeKind::Block);
    assert_eq!(results[1].kind(), EnvelopeKind::Namespace);
    assert!(results[0]
        .description
        .as_deref()
        .unwrap()
        .starts_with("Block data"));
    assert!(results[1]
        .description
        .as_deref()
        .unwrap()
        .starts_with("Rollup data"));
    assert_eq!(
        results[1].display_text.as_deref(),
        Some("Namespace #777 (Lucky)")
    );
}

#[tokio::test]
async fn number_matching_only_a_rollup_returns_namespace() {
    let server = MockServer::start().await;
    mount_bundle(&server, &[(360, "MOLTEN")]).await;
    mount_status(&server, "/v0/availability/block/360", 404).await;

    let results = resolver(&server).search("360").await.unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].kind(), EnvelopeKind::Namespace);
    assert!(results[0].description.as_deref().unwrap().starts_with("MOLTEN rollup"));
}

#[tokio::test]
async fn number_matching_nothing_is_a_single_error() {
    let server = MockServer::start().await;
    mount_bundle(&server, &[(360, "MOLTEN")]).await;
    mount_status(&server, "/v0/availability/block/55", 404).await;

    let results = resolver(&server).search("55").await.unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].kind(), EnvelopeKind::Error);
}

#[tokio::test]
async fn long_namespace_ids_must_be_registered() {
    let server = MockServer::start().await;
    mount_bundle(&server, &[(1_234_567_890_123, "Wide")]).await;
    let resolver = resolver(&server);

    let hit = resolver.search("1234567890123").await.unwrap();
    assert_eq!(hit.len(), 1);
    assert_eq!(hit[0].kind(), EnvelopeKind::Namespace);

    let miss = resolver.search("9999999999999").await.unwrap();
    assert_eq!(miss.len(), 1);
    assert_eq!(
        miss[0].error_message(),
        Some("Namespace #9999999999999 is not a registered rollup")
    );
}

#[tokio::test]
async fn unknown_rollup_name_is_an_error_envelope() {
    let server = MockServer::start().await;
    mount_bundle(&server, &[(360, "MOLTEN")]).await;

    let results = resolver(&server).search("Nowhere").await.unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].error_message(), Some("No rollup found: Nowhere"));
}

#[tokio::test]
async fn unavailable_registry_is_raised() {
    let server = MockServer::start().await;
    mount_status(&server, BUNDLE_PATH, 503).await;

    let err = resolver(&server).search("Molten").await.unwrap_err();
    assert!(matches!(err, ScanError::UpstreamUnavailable(_)), "{err:?}");
}

#[tokio::test]
async fn block_is_returned_when_registry_is_unavailable() {
    let server = MockServer::start().await;
    mount_status(&server, BUNDLE_PATH, 503).await;
    mount_block(&server, 123_456, 4).await;

    let results = resolver(&server).search("123456").await.unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].kind(), EnvelopeKind::Block);
    assert_eq!(results[0].display_text.as_deref(), Some("Block #123456"));
}

#[tokio::test]
async fn unavailable_registry_and_missing_block_is_raised() {
    let server = MockServer::start().await;
    mount_status(&server, BUNDLE_PATH, 503).await;
    mount_status(&server, "/v0/availability/block/123456", 404).await;

    let err = resolver(&server).search("123456").await.unwrap_err();
    assert!(matches!(err, ScanError::UpstreamUnavailable(_)), "{err:?}");
}

#[tokio::test]
async fn block_is_returned_while_registry_is_still_loading() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(BUNDLE_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(bundle(&[(360, "MOLTEN")]))
                .set_delay(Duration::from_millis(300)),
        )
        .expect(1)
        .mount(&server)
        .await;
    mount_block(&server, 123_456, 4).await;

    let resolver = resolver(&server);
    let (by_name, by_number) = tokio::join!(resolver.search("Molten"), async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        resolver.search("123456").await
    });

    let by_number = by_number.unwrap();
    assert_eq!(by_number.len(), 1);
    assert_eq!(by_number[0].kind(), EnvelopeKind::Block);

    let by_name = by_name.unwrap();
    assert_eq!(by_name.len(), 1);
    assert_eq!(by_name[0].kind(), EnvelopeKind::Rollup);
}

#[tokio::test]
async fn transaction_without_reachable_block_keeps_block_fields_empty() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v0/availability/transaction/hash/TX~orphan"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "index": 0,
            "transaction": {"block_height": 10, "namespace": 360, "payload": "AAAA"}
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v0/availability/block/10"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let results = resolver(&server).search("TX~orphan").await.unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].kind(), EnvelopeKind::Transaction);
    match &results[0].payload {
        EnvelopePayload::Transaction(tx) => {
            assert_eq!(tx.hash, "TX~orphan");
            assert_eq!(tx.block_height, 10);
            assert_eq!(tx.block_hash, None);
            assert_eq!(tx.timestamp, None);
            assert_eq!(tx.human_readable_time, None);
        }
        other => panic!("expected transaction, got {other:?}"),
    }
    assert_eq!(results[0].description.as_deref(), Some("Block #10 • NS 360"));
}

#[tokio::test]
async fn transaction_lookup_is_enhanced_with_block_fields() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v0/availability/transaction/hash/TX~found"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "index": 1,
            "transaction": {"block_height": 10, "namespace": 360, "payload": "AAAAAAAA"},
            "proof": {"payload_proof_tx": {"proofs": ["x"]}}
        })))
        .mount(&server)
        .await;
    mount_block(&server, 10, 1).await;

    let results = resolver(&server).search("TX~found").await.unwrap();

    assert_eq!(results.len(), 1);
    match &results[0].payload {
        EnvelopePayload::Transaction(tx) => {
            assert_eq!(tx.hash, "TX~found");
            assert_eq!(tx.tx_size_bytes, Some(6));
            assert_eq!(tx.block_hash.as_deref(), Some("BLOCK~hash10"));
            assert_eq!(tx.timestamp, Some(1_700_000_000));
            assert!(tx.raw["proof"]["payload_proof_tx"].get("proofs").is_none());
        }
        other => panic!("expected transaction, got {other:?}"),
    }
    assert_eq!(results[0].description.as_deref(), Some("Block #10 • NS 360"));
}

#[tokio::test]
async fn block_hash_query_gets_prefix_added() {
    let server = MockServer::start().await;
    let hex = "ab".repeat(32);
    Mock::given(method("GET"))
        .and(path(format!("/v0/availability/block/hash/BLOCK~0x{hex}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(block_json(8, 0)))
        .expect(1)
        .mount(&server)
        .await;

    let results = resolver(&server).search(&format!("0x{hex}")).await.unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].kind(), EnvelopeKind::Block);
}
