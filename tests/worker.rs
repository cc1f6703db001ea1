use std::sync::Arc;
use std::time::Duration;

use mockito::ServerGuard;
use serde_json::json;
use url::Url;

use shellcache::fetch::HttpFetcher;
use shellcache::http::Request;
use shellcache::manifest::Manifest;
use shellcache::notify::Notice;
use shellcache::store::{MemoryStore, Store};
use shellcache::{FetchOutcome, Worker, WorkerConfig};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("shellcache=debug")
        .with_test_writer()
        .try_init();
}

fn config_for(origin: &str, current_version: &str, resources: &[&str]) -> WorkerConfig {
    serde_json::from_value(json!({
        "currentVersion": current_version,
        "manifestUrl": format!("{origin}/update.json"),
        "origin": origin,
        "resources": resources,
    }))
    .unwrap()
}

fn worker_with_memory_store(config: WorkerConfig) -> (Worker, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let worker = Worker::build(config, store.clone(), Arc::new(HttpFetcher::new()));
    (worker, store)
}

fn request_for(origin: &str, path: &str) -> Request {
    Request::get(Url::parse(&format!("{origin}{path}")).unwrap())
}

async fn mock_manifest(server: &mut ServerGuard, latest: &str) -> mockito::Mock {
    server
        .mock("GET", "/update.json")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({ "latestVersion": latest, "updateLog": "Playback fixes" }).to_string(),
        )
        .create_async()
        .await
}

fn expect_response(outcome: FetchOutcome) -> shellcache::http::Response {
    match outcome {
        FetchOutcome::Response(response) => response,
        FetchOutcome::Bypass => panic!("expected a handled response, got a bypass"),
    }
}

#[tokio::test]
async fn newer_manifest_version_notifies_observers_and_passes_the_body_through() {
    init_tracing();
    let mut server = mockito::Server::new_async().await;
    let mock = mock_manifest(&mut server, "1.2.0").await;

    let (worker, _store) = worker_with_memory_store(config_for(&server.url(), "1.0.0", &[]));
    let mut notices = worker.subscribe();

    let outcome = worker
        .handle_fetch(&request_for(&server.url(), "/update.json"))
        .await
        .unwrap();

    mock.assert_async().await;

    let response = expect_response(outcome);
    assert!(response.ok());
    let manifest: Manifest = response.json().unwrap();
    assert_eq!(manifest.latest_version, "1.2.0");

    let Notice::UpdateAvailable { update_data } = notices.try_recv().unwrap();
    assert_eq!(update_data.latest_version, "1.2.0");
    assert_eq!(update_data.update_log, "Playback fixes");
    assert!(notices.try_recv().is_err(), "exactly one notice per fetch");
}

#[tokio::test]
async fn manifest_matching_the_running_version_raises_no_notice() {
    let mut server = mockito::Server::new_async().await;
    mock_manifest(&mut server, "1.2.0").await;

    let (worker, _store) = worker_with_memory_store(config_for(&server.url(), "1.2.0", &[]));
    let mut notices = worker.subscribe();

    let outcome = worker
        .handle_fetch(&request_for(&server.url(), "/update.json"))
        .await
        .unwrap();

    assert!(expect_response(outcome).ok());
    assert!(notices.try_recv().is_err());
}

#[tokio::test]
async fn unreachable_manifest_origin_degrades_to_a_no_update_body() {
    // Nothing listens on the reserved port
    let origin = "http://127.0.0.1:1";
    let (worker, _store) = worker_with_memory_store(config_for(origin, "1.0.0", &[]));
    let mut notices = worker.subscribe();

    let outcome = worker
        .handle_fetch(&request_for(origin, "/update.json"))
        .await
        .unwrap();

    let response = expect_response(outcome);
    assert_eq!(response.status(), 200);
    let manifest: Manifest = response.json().unwrap();
    assert_eq!(manifest.latest_version, "1.0.0");
    assert!(!manifest.update_log.is_empty());
    assert!(notices.try_recv().is_err());
}

#[tokio::test]
async fn resources_are_served_from_the_store_after_the_first_fetch() {
    init_tracing();
    let mut server = mockito::Server::new_async().await;
    let first = server
        .mock("GET", "/app.js")
        .with_status(200)
        .with_body("v1")
        .expect(1)
        .create_async()
        .await;

    let (worker, store) = worker_with_memory_store(config_for(&server.url(), "1.0.0", &[]));
    let request = request_for(&server.url(), "/app.js");

    // Miss: waits for the network and repopulates the store
    let outcome = worker.handle_fetch(&request).await.unwrap();
    assert_eq!(expect_response(outcome).body().as_ref(), b"v1");
    first.assert_async().await;

    // The origin moves on; the stored copy is what comes back
    first.remove_async().await;
    server
        .mock("GET", "/app.js")
        .with_status(200)
        .with_body("v2")
        .create_async()
        .await;

    let outcome = worker.handle_fetch(&request).await.unwrap();
    assert_eq!(expect_response(outcome).body().as_ref(), b"v1");

    // Meanwhile the background refresh lands the new copy for next time
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    loop {
        let stored = store
            .get("app-cache-v1.0.0", &request.key())
            .await
            .unwrap()
            .unwrap();
        if stored.body().as_ref() == b"v2" {
            break;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "store was not refreshed in time"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

#[tokio::test]
async fn resource_failure_with_nothing_stored_propagates() {
    let origin = "http://127.0.0.1:1";
    let (worker, _store) = worker_with_memory_store(config_for(origin, "1.0.0", &[]));

    let result = worker.handle_fetch(&request_for(origin, "/app.js")).await;

    assert!(result.is_err());
}

#[tokio::test]
async fn off_origin_unregistered_requests_are_bypassed() {
    let server = mockito::Server::new_async().await;
    let (worker, _store) = worker_with_memory_store(config_for(&server.url(), "1.0.0", &[]));

    let outcome = worker
        .handle_fetch(&Request::get(
            Url::parse("https://tracker.example/pixel.gif").unwrap(),
        ))
        .await
        .unwrap();

    assert_eq!(outcome, FetchOutcome::Bypass);
}

#[tokio::test]
async fn registered_off_origin_resources_are_handled() {
    let mut server = mockito::Server::new_async().await;
    let cdn = server
        .mock("GET", "/lib.js")
        .with_status(200)
        .with_body("lib")
        .create_async()
        .await;

    // The "CDN" entry points at the mock server but the configured origin is
    // elsewhere, so only the registry makes this request ours
    let cdn_url = format!("{}/lib.js", server.url());
    let config = serde_json::from_value::<WorkerConfig>(json!({
        "currentVersion": "1.0.0",
        "manifestUrl": "https://app.example/update.json",
        "origin": "https://app.example/",
        "resources": [cdn_url],
    }))
    .unwrap();
    let (worker, _store) = worker_with_memory_store(config);

    let outcome = worker
        .handle_fetch(&Request::get(
            Url::parse(&format!("{}/lib.js", server.url())).unwrap(),
        ))
        .await
        .unwrap();

    cdn.assert_async().await;
    assert_eq!(expect_response(outcome).body().as_ref(), b"lib");
}

#[tokio::test]
async fn install_populates_the_store_and_activate_evicts_stale_ones() {
    init_tracing();
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/index.html")
        .with_status(200)
        .with_body("<html>")
        .create_async()
        .await;
    server
        .mock("GET", "/app.js")
        .with_status(200)
        .with_body("console.log(1)")
        .create_async()
        .await;

    let (worker, store) = worker_with_memory_store(config_for(
        &server.url(),
        "1.0.0",
        &["/index.html", "/app.js"],
    ));

    // A store left behind by the previous release
    store.open("app-cache-v0.9.0").await.unwrap();

    worker.install().await.unwrap();

    let index_key = request_for(&server.url(), "/index.html").key();
    let stored = store.get("app-cache-v1.0.0", &index_key).await.unwrap().unwrap();
    assert_eq!(stored.body().as_ref(), b"<html>");

    worker.activate().await.unwrap();

    assert_eq!(
        store.list().await.unwrap(),
        vec!["app-cache-v1.0.0".to_string()]
    );
}

#[tokio::test]
async fn install_fails_as_a_whole_when_any_resource_is_missing() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/index.html")
        .with_status(200)
        .with_body("<html>")
        .create_async()
        .await;
    server
        .mock("GET", "/app.js")
        .with_status(404)
        .create_async()
        .await;

    let (worker, store) = worker_with_memory_store(config_for(
        &server.url(),
        "1.0.0",
        &["/index.html", "/app.js"],
    ));

    assert!(worker.install().await.is_err());

    // All-or-nothing: not even the resource that fetched fine was written
    let index_key = request_for(&server.url(), "/index.html").key();
    assert!(
        store
            .get("app-cache-v1.0.0", &index_key)
            .await
            .unwrap()
            .is_none()
    );
}
