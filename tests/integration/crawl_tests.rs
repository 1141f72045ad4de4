//! Integration tests for the crawler
//!
//! These tests use wiremock to stand in for the archive's search and
//! metadata endpoints and drive the full crawl cycle end-to-end against
//! on-disk SQLite stores.

use archive_hasher::config::{ArchiveConfig, Config, CrawlerConfig, OutputConfig};
use archive_hasher::crawler::{run_crawl, ArchiveApi, ArchiveError, ItemKind, StepOutcome};
use archive_hasher::output::load_statistics;
use archive_hasher::storage::{HashRecorder, SqliteHashStore, SqliteLedger, WorkLedger};
use archive_hasher::{Coordinator, HttpArchive};
use serde_json::json;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SHA_A: &str = "da39a3ee5e6b4b0d3255bfef95601890afd80709";
const SHA_B: &str = "2fd4e1c67a2d28fced849ee1bb76e7391b93eb12";
const SHA_C: &str = "de9f2c7fd25e1b3afad3e85a0bd17d9b100db4b3";

fn archive_config(base_url: &str) -> ArchiveConfig {
    ArchiveConfig {
        base_url: base_url.to_string(),
        user_agent: "archive-hasher-tests/1.0".to_string(),
        timeout_secs: 5,
    }
}

/// No pause between items so tests run quickly
fn crawler_config() -> CrawlerConfig {
    CrawlerConfig {
        batch_size: 1000,
        item_delay_ms: 0,
        retry_next_page: true,
    }
}

fn create_test_config(base_url: &str, dir: &TempDir) -> Config {
    Config {
        crawler: crawler_config(),
        archive: archive_config(base_url),
        output: OutputConfig {
            ledger_path: dir.path().join("working.db").to_string_lossy().into_owned(),
            hashes_path: dir.path().join("hashes.db").to_string_lossy().into_owned(),
        },
    }
}

fn open_coordinator(base_url: &str, dir: &TempDir) -> Coordinator<HttpArchive> {
    let archive = HttpArchive::new(&archive_config(base_url)).expect("archive client");
    let ledger = SqliteLedger::new(&dir.path().join("working.db")).expect("ledger");
    let recorder = SqliteHashStore::new(&dir.path().join("hashes.db")).expect("hash store");
    Coordinator::new(crawler_config(), archive, ledger, recorder)
}

fn search_body(identifiers: &[&str]) -> serde_json::Value {
    let docs: Vec<_> = identifiers
        .iter()
        .map(|id| json!({ "identifier": id }))
        .collect();
    json!({
        "responseHeader": { "status": 0 },
        "response": { "numFound": identifiers.len(), "start": 0, "docs": docs }
    })
}

async fn mount_page(server: &MockServer, collection: &str, page: u32, identifiers: &[&str]) {
    Mock::given(method("GET"))
        .and(path("/advancedsearch.php"))
        .and(query_param("q", format!("collection:{}", collection)))
        .and(query_param("page", page.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_body(identifiers)))
        .mount(server)
        .await;
}

async fn mount_failing_page(server: &MockServer, collection: &str, page: u32, status: u16) {
    Mock::given(method("GET"))
        .and(path("/advancedsearch.php"))
        .and(query_param("q", format!("collection:{}", collection)))
        .and(query_param("page", page.to_string()))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

async fn mount_mediatype(server: &MockServer, item: &str, mediatype: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/metadata/{}/metadata/mediatype", item)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "result": mediatype })))
        .mount(server)
        .await;
}

async fn mount_files(server: &MockServer, item: &str, files: &[(&str, &str)]) {
    let result: Vec<_> = files
        .iter()
        .map(|(name, sha1)| json!({ "name": name, "sha1": sha1, "source": "original" }))
        .collect();
    Mock::given(method("GET"))
        .and(path(format!("/metadata/{}/files", item)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "result": result })))
        .mount(server)
        .await;
}

/// demo lists leafA and the sub-collection subB; subB lists leafC
async fn mount_demo_archive(server: &MockServer) {
    mount_page(server, "demo", 1, &["leafA", "subB"]).await;
    mount_page(server, "demo", 2, &[]).await;
    mount_page(server, "subB", 1, &["leafC"]).await;
    mount_page(server, "subB", 2, &[]).await;

    mount_mediatype(server, "leafA", "texts").await;
    mount_mediatype(server, "subB", "collection").await;
    mount_mediatype(server, "leafC", "movies").await;

    mount_files(
        server,
        "leafA",
        &[
            ("__ia_thumb.jpg", SHA_C),
            ("leafA_meta.xml", SHA_C),
            ("leafA.pdf", SHA_A),
        ],
    )
    .await;
    mount_files(server, "leafC", &[("leafC.mp4", SHA_B)]).await;
}

#[tokio::test]
async fn test_fetch_page_sends_search_query() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/advancedsearch.php"))
        .and(query_param("q", "collection:demo"))
        .and(query_param("fl[]", "identifier"))
        .and(query_param("rows", "1000"))
        .and(query_param("page", "3"))
        .and(query_param("output", "json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_body(&["a", "b"])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let archive = HttpArchive::new(&archive_config(&mock_server.uri())).unwrap();
    let entries = archive.fetch_page("demo", 1000, 3).await.unwrap();

    assert_eq!(entries, vec!["a".to_string(), "b".to_string()]);
}

#[tokio::test]
async fn test_fetch_kind_and_files() {
    let mock_server = MockServer::start().await;
    mount_mediatype(&mock_server, "subB", "collection").await;
    mount_mediatype(&mock_server, "leafA", "texts").await;
    mount_files(&mock_server, "leafA", &[("leafA.pdf", SHA_A)]).await;

    let archive = HttpArchive::new(&archive_config(&mock_server.uri())).unwrap();

    assert_eq!(archive.fetch_kind("subB").await.unwrap(), ItemKind::Collection);
    assert_eq!(archive.fetch_kind("leafA").await.unwrap(), ItemKind::Item);

    let files = archive.fetch_files("leafA").await.unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].name, "leafA.pdf");
    assert_eq!(files[0].sha1, SHA_A);
}

#[tokio::test]
async fn test_server_error_maps_to_status() {
    let mock_server = MockServer::start().await;
    mount_failing_page(&mock_server, "demo", 1, 500).await;

    let archive = HttpArchive::new(&archive_config(&mock_server.uri())).unwrap();
    let result = archive.fetch_page("demo", 1000, 1).await;

    assert!(matches!(result, Err(ArchiveError::Status { status: 500, .. })));
}

#[tokio::test]
async fn test_malformed_body_maps_to_decode() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/metadata/leafA/files"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>busy</html>"))
        .mount(&mock_server)
        .await;

    let archive = HttpArchive::new(&archive_config(&mock_server.uri())).unwrap();
    let result = archive.fetch_files("leafA").await;

    assert!(matches!(result, Err(ArchiveError::Decode { .. })));
}

#[tokio::test]
async fn test_full_crawl_nested_collections() {
    let mock_server = MockServer::start().await;
    mount_demo_archive(&mock_server).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&mock_server.uri(), &dir);
    let stop = AtomicBool::new(false);

    let summary = run_crawl(&config, &["demo"], &stop).await.unwrap();

    assert_eq!(summary.pages_processed, 2);
    assert_eq!(summary.collections_completed, 2);
    assert_eq!(summary.collections_failed, 0);
    assert_eq!(summary.collections_discovered, 1);
    assert_eq!(summary.items_recorded, 2);
    assert_eq!(summary.hashes_recorded, 2);

    // Reopen both stores from disk
    let ledger = SqliteLedger::new(Path::new(&config.output.ledger_path)).unwrap();
    let recorder = SqliteHashStore::new(Path::new(&config.output.hashes_path)).unwrap();

    assert!(ledger.is_empty());
    assert!(ledger.is_done("demo").unwrap());
    assert!(ledger.is_done("subB").unwrap());
    assert_eq!(ledger.done_record("demo").unwrap().unwrap().page, 2);

    assert_eq!(recorder.hashes_for("leafA").unwrap(), vec![SHA_A.to_string()]);
    assert_eq!(recorder.hashes_for("leafC").unwrap(), vec![SHA_B.to_string()]);
    assert!(!recorder.contains_item("subB").unwrap());

    let stats = load_statistics(&ledger, &recorder).unwrap();
    assert_eq!(stats.completed_collections(), 2);
    assert_eq!(stats.recorded_items, 2);
    assert_eq!(stats.recorded_hashes, 2);
}

#[tokio::test]
async fn test_resume_after_restart() {
    let mock_server = MockServer::start().await;

    // demo page 1 must never be fetched twice
    Mock::given(method("GET"))
        .and(path("/advancedsearch.php"))
        .and(query_param("q", "collection:demo"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_body(&["leafA", "subB"])))
        .expect(1)
        .mount(&mock_server)
        .await;
    mount_page(&mock_server, "demo", 2, &[]).await;
    mount_page(&mock_server, "subB", 1, &["leafC"]).await;
    mount_page(&mock_server, "subB", 2, &[]).await;
    mount_mediatype(&mock_server, "leafA", "texts").await;
    mount_mediatype(&mock_server, "subB", "collection").await;
    mount_mediatype(&mock_server, "leafC", "movies").await;
    mount_files(&mock_server, "leafA", &[("leafA.pdf", SHA_A)]).await;
    mount_files(&mock_server, "leafC", &[("leafC.mp4", SHA_B)]).await;

    let dir = TempDir::new().unwrap();

    {
        let mut coordinator = open_coordinator(&mock_server.uri(), &dir);
        assert_eq!(coordinator.seed(["demo"]).unwrap(), 1);

        let outcome = coordinator.step().await.unwrap();
        assert!(matches!(outcome, StepOutcome::Advanced { entries: 2, .. }));
        assert_eq!(coordinator.ledger().len(), 2);
    }

    let mut coordinator = open_coordinator(&mock_server.uri(), &dir);
    assert_eq!(coordinator.ledger().len(), 2);
    assert_eq!(coordinator.ledger().job("demo").unwrap().unwrap().page, 2);
    assert_eq!(coordinator.ledger().job("subB").unwrap().unwrap().page, 1);

    // Re-seeding an active collection is a no-op
    assert_eq!(coordinator.seed(["demo"]).unwrap(), 0);

    let stop = AtomicBool::new(false);
    let summary = coordinator.run(&stop).await.unwrap();

    assert_eq!(summary.collections_completed, 2);
    assert_eq!(summary.items_recorded, 1);
    assert!(coordinator.ledger().is_empty());
    assert_eq!(coordinator.recorder().item_count().unwrap(), 2);
}

#[tokio::test]
async fn test_failed_page_retries_next_page() {
    let mock_server = MockServer::start().await;
    mount_failing_page(&mock_server, "demo", 1, 502).await;
    mount_page(&mock_server, "demo", 2, &["leafA"]).await;
    mount_page(&mock_server, "demo", 3, &[]).await;
    mount_mediatype(&mock_server, "leafA", "texts").await;
    mount_files(&mock_server, "leafA", &[("leafA.pdf", SHA_A)]).await;

    let dir = TempDir::new().unwrap();
    let mut coordinator = open_coordinator(&mock_server.uri(), &dir);
    coordinator.seed(["demo"]).unwrap();

    let stop = AtomicBool::new(false);
    let summary = coordinator.run(&stop).await.unwrap();

    assert_eq!(summary.collections_completed, 1);
    assert_eq!(summary.items_recorded, 1);

    let record = coordinator.ledger().done_record("demo").unwrap().unwrap();
    assert_eq!(record.page, 3);
    assert_eq!(record.reason, "");
}

#[tokio::test]
async fn test_failed_retry_retires_collection_with_reason() {
    let mock_server = MockServer::start().await;
    mount_failing_page(&mock_server, "demo", 1, 503).await;
    mount_failing_page(&mock_server, "demo", 2, 503).await;

    let dir = TempDir::new().unwrap();
    let mut coordinator = open_coordinator(&mock_server.uri(), &dir);
    coordinator.seed(["demo"]).unwrap();

    let stop = AtomicBool::new(false);
    let summary = coordinator.run(&stop).await.unwrap();

    assert_eq!(summary.collections_failed, 1);
    assert!(coordinator.ledger().is_empty());

    let record = coordinator.ledger().done_record("demo").unwrap().unwrap();
    assert_eq!(record.page, 2);
    assert!(record.reason.contains("503"), "reason: {}", record.reason);

    let failed = coordinator.ledger().failed_records().unwrap();
    assert_eq!(failed.len(), 1);
}

#[tokio::test]
async fn test_unreachable_item_is_skipped() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, "demo", 1, &["missing", "leafA"]).await;
    mount_page(&mock_server, "demo", 2, &[]).await;
    // No mediatype mock for "missing": wiremock answers 404
    mount_mediatype(&mock_server, "leafA", "texts").await;
    mount_files(&mock_server, "leafA", &[("leafA.pdf", SHA_A)]).await;

    let dir = TempDir::new().unwrap();
    let mut coordinator = open_coordinator(&mock_server.uri(), &dir);
    coordinator.seed(["demo"]).unwrap();

    let stop = AtomicBool::new(false);
    let summary = coordinator.run(&stop).await.unwrap();

    assert_eq!(summary.items_skipped, 1);
    assert_eq!(summary.items_recorded, 1);
    assert!(coordinator.ledger().is_done("demo").unwrap());
    assert!(!coordinator.recorder().contains_item("missing").unwrap());
}
