//! Integration tests for the control API
//!
//! Each test serves the router on an ephemeral port and talks to it with
//! reqwest, while wiremock stands in for the profile site.

use rating_harvester::config::{Config, CrawlerConfig, FetcherConfig, OutputConfig, ServerConfig};
use rating_harvester::control::{self, ApiState, JobController};
use rating_harvester::crawler::Coordinator;
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

struct TestApi {
    base: String,
    client: reqwest::Client,
    controller: Arc<JobController>,
    shutdown: CancellationToken,
}

impl TestApi {
    async fn start(site: &str, dataset: &Path) -> Self {
        let config = Config {
            crawler: CrawlerConfig {
                max_concurrent_fetches: 4,
                start_id: 1,
                end_id: 1_000_000,
            },
            fetcher: FetcherConfig {
                base_url: format!("{}/professor/", site),
                timeout_secs: 5,
                max_attempts: 1,
                retry_delay_ms: 10,
            },
            output: OutputConfig {
                dataset_path: dataset.to_path_buf(),
            },
            server: ServerConfig::default(),
        };

        let controller = Arc::new(JobController::new(Coordinator::new(Arc::new(config))));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let shutdown = CancellationToken::new();

        tokio::spawn(control::serve(
            listener,
            ApiState::new(Arc::clone(&controller)),
            shutdown.clone().cancelled_owned(),
        ));

        Self {
            base: format!("http://{}", addr),
            client: reqwest::Client::new(),
            controller,
            shutdown,
        }
    }

    async fn get(&self, route: &str) -> reqwest::Response {
        self.client
            .get(format!("{}{}", self.base, route))
            .send()
            .await
            .unwrap()
    }

    async fn post_json(&self, route: &str) -> Value {
        self.client
            .post(format!("{}{}", self.base, route))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap()
    }

    async fn get_json(&self, route: &str) -> Value {
        self.get(route).await.json().await.unwrap()
    }
}

impl Drop for TestApi {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

fn unreachable_site() -> &'static str {
    "http://127.0.0.1:1"
}

#[tokio::test]
async fn test_root_health() {
    let dir = TempDir::new().unwrap();
    let api = TestApi::start(unreachable_site(), &dir.path().join("data.jsonl")).await;

    assert_eq!(api.get_json("/").await, json!({"status": "ok"}));
}

#[tokio::test]
async fn test_inspection_routes_without_dataset() {
    let dir = TempDir::new().unwrap();
    let dataset = dir.path().join("missing").join("professors_dataset.jsonl");
    let api = TestApi::start(unreachable_site(), &dataset).await;

    let count = api.get("/count").await;
    assert_eq!(count.status(), 200);
    assert_eq!(count.text().await.unwrap(), "0");

    let download = api.get("/download").await;
    assert_eq!(download.status(), 404);
    assert_eq!(download.text().await.unwrap(), "File not found");

    assert_eq!(
        api.get_json("/peek").await,
        json!({"error": "file not found"})
    );
    assert_eq!(api.get_json("/ls").await, json!({"files": []}));
    assert_eq!(api.get_json("/status").await, json!({"running": false}));
}

#[tokio::test]
async fn test_inspection_routes_with_dataset() {
    let dir = TempDir::new().unwrap();
    let dataset = dir.path().join("professors_dataset.jsonl");
    let lines: Vec<String> = (1..=7)
        .map(|id| format!("{{\"professor_id\":{}}}", id))
        .collect();
    let content = format!("{}\n", lines.join("\n"));
    std::fs::write(&dataset, &content).unwrap();
    std::fs::write(dir.path().join("notes.txt"), "scratch").unwrap();

    let api = TestApi::start(unreachable_site(), &dataset).await;

    assert_eq!(api.get("/count").await.text().await.unwrap(), "7");

    let download = api.get("/download").await;
    assert_eq!(download.status(), 200);
    assert_eq!(
        download.headers()["content-type"],
        "application/octet-stream"
    );
    assert_eq!(
        download.headers()["content-disposition"],
        "attachment; filename=\"professors_dataset.jsonl\""
    );
    assert_eq!(download.text().await.unwrap(), content);

    assert_eq!(api.get_json("/peek").await, json!({"lines": &lines[..5]}));
    assert_eq!(
        api.get_json("/ls").await,
        json!({"files": ["notes.txt", "professors_dataset.jsonl"]})
    );
}

#[tokio::test]
async fn test_start_pause_status_cycle() {
    let site = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"<div class="NameTitle__Name">Api Driven</div>"#)
                .set_delay(Duration::from_millis(50)),
        )
        .mount(&site)
        .await;

    let dir = TempDir::new().unwrap();
    let dataset = dir.path().join("professors_dataset.jsonl");
    let api = TestApi::start(&site.uri(), &dataset).await;

    assert_eq!(api.post_json("/pause").await, json!({"status": "not running"}));
    assert_eq!(api.post_json("/start").await, json!({"status": "started"}));
    assert_eq!(
        api.post_json("/start").await,
        json!({"status": "already running"})
    );
    assert_eq!(api.get_json("/status").await, json!({"running": true}));

    tokio::time::sleep(Duration::from_millis(300)).await;

    assert_eq!(api.post_json("/pause").await, json!({"status": "paused"}));
    assert_eq!(api.get_json("/status").await, json!({"running": false}));

    let saved: u64 = api.get("/count").await.text().await.unwrap().parse().unwrap();
    assert!(saved > 0);
    tokio::time::sleep(Duration::from_millis(200)).await;
    let later: u64 = api.get("/count").await.text().await.unwrap().parse().unwrap();
    assert_eq!(saved, later);
}

#[tokio::test]
async fn test_start_failure_is_server_error() {
    let dir = TempDir::new().unwrap();
    let dataset = dir.path().join("professors_dataset.jsonl");
    let api = TestApi::start("not a url", &dataset).await;

    let response = api
        .client
        .post(format!("{}/start", api.base))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 500);

    let body: Value = response.json().await.unwrap();
    assert!(body["error"].is_string());
    assert!(!api.controller.status().await.running);
}
