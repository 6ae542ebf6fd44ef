//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end: fetch, extract, append, resume.

use rating_harvester::config::{Config, CrawlerConfig, FetcherConfig, OutputConfig, ServerConfig};
use rating_harvester::crawler::{run_crawl, Coordinator};
use rating_harvester::{JobController, PauseOutcome, ProfessorRecord, StartOutcome};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration crawling `start..end` from the mock server
fn create_test_config(server: &MockServer, dataset: &Path, start: u64, end: u64) -> Config {
    Config {
        crawler: CrawlerConfig {
            max_concurrent_fetches: 8,
            start_id: start,
            end_id: end,
        },
        fetcher: FetcherConfig {
            base_url: format!("{}/professor/", server.uri()),
            timeout_secs: 5,
            max_attempts: 2,
            retry_delay_ms: 10,
        },
        output: OutputConfig {
            dataset_path: dataset.to_path_buf(),
        },
        server: ServerConfig::default(),
    }
}

fn profile_page(name: &str, department: &str) -> String {
    format!(
        r#"<html><head><title>{name}</title></head><body>
        <div class="NameTitle__Name-dowf0z-0 cfjPUG">{name}</div>
        <div class="NameTitle__Title-dowf0z-1 iLYGwn">Professor in the
            <a class="TeacherDepartment__StyledDepartmentLink-fl79e8-0">{department} department</a>
        </div>
        <div class="RatingValue__Numerator-qw8sqy-2 liyUjw">4.2</div>
        <a class="RatingValue__NumRatings-qw8sqy-0">Based on 12ratings</a>
        <div class="FeedbackItem__FeedbackNumber-uof32n-1">88%</div>
        <div class="FeedbackItem__FeedbackNumber-uof32n-1">2.9</div>
        </body></html>"#
    )
}

async fn mount_profile(server: &MockServer, id: u64, name: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/professor/{}", id)))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(profile_page(name, "Mathematics"))
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

fn read_records(dataset: &Path) -> Vec<ProfessorRecord> {
    std::fs::read_to_string(dataset)
        .unwrap_or_default()
        .lines()
        .map(|line| serde_json::from_str(line).expect("every line is a record"))
        .collect()
}

#[tokio::test]
async fn test_full_crawl_writes_only_existing_profiles() {
    let server = MockServer::start().await;
    mount_profile(&server, 100, "Ada Lovelace").await;
    mount_profile(&server, 102, "Alan Turing").await;
    mount_profile(&server, 104, "Grace Hopper").await;
    // 101 and 103 fall through to 404

    let dir = TempDir::new().unwrap();
    let dataset = dir.path().join("professors_dataset.jsonl");
    let config = create_test_config(&server, &dataset, 100, 105);

    let report = run_crawl(config, CancellationToken::new()).await.unwrap();
    assert_eq!(report.attempted, 5);
    assert_eq!(report.saved, 3);
    assert_eq!(report.not_found, 2);

    let records = read_records(&dataset);
    assert_eq!(records.len(), 3);

    let ids: HashSet<u64> = records.iter().map(|r| r.professor_id).collect();
    assert_eq!(ids, HashSet::from([100, 102, 104]));

    let ada = records.iter().find(|r| r.professor_id == 100).unwrap();
    assert_eq!(ada.name_title.as_deref().map(|s| s.contains("Ada")), Some(true));
    assert_eq!(ada.department.as_deref(), Some("Mathematics department"));
    assert_eq!(ada.main_rating.as_deref(), Some("4.2"));
    assert_eq!(ada.would_take_again.as_deref(), Some("88%"));
    assert_eq!(ada.level_of_difficulty.as_deref(), Some("2.9"));
}

#[tokio::test]
async fn test_crawl_resumes_above_max_recorded_id() {
    let server = MockServer::start().await;
    for id in 1..=6 {
        mount_profile(&server, id, &format!("Professor {}", id)).await;
    }

    let dir = TempDir::new().unwrap();
    let dataset = dir.path().join("professors_dataset.jsonl");
    std::fs::write(
        &dataset,
        "{\"professor_id\":2,\"name_title\":\"Earlier Run\"}\n\
         {\"professor_id\":4,\"name_title\":\"Earlier Run\"}\n",
    )
    .unwrap();

    let config = create_test_config(&server, &dataset, 1, 7);
    let report = run_crawl(config, CancellationToken::new()).await.unwrap();
    assert_eq!(report.attempted, 2);
    assert_eq!(report.saved, 2);

    let ids: Vec<u64> = read_records(&dataset)
        .iter()
        .map(|r| r.professor_id)
        .collect();
    assert_eq!(&ids[..2], &[2, 4]);
    let mut appended = ids[2..].to_vec();
    appended.sort_unstable();
    assert_eq!(appended, vec![5, 6]);

    let received = server.received_requests().await.unwrap_or_default();
    let paths: HashSet<&str> = received.iter().map(|request| request.url.path()).collect();
    assert_eq!(paths, HashSet::from(["/professor/5", "/professor/6"]));
}

#[tokio::test]
async fn test_transient_errors_recovered_and_failures_skipped() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/professor/1"))
        .respond_with(ResponseTemplate::new(502))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_profile(&server, 1, "Flaky Gateway").await;
    Mock::given(method("GET"))
        .and(path("/professor/2"))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&server)
        .await;
    mount_profile(&server, 3, "After Failure").await;

    let dir = TempDir::new().unwrap();
    let dataset = dir.path().join("professors_dataset.jsonl");
    let config = create_test_config(&server, &dataset, 1, 4);

    let report = run_crawl(config, CancellationToken::new()).await.unwrap();
    assert_eq!(report.saved, 2);
    assert_eq!(report.failures, 1);

    let ids: HashSet<u64> = read_records(&dataset)
        .iter()
        .map(|r| r.professor_id)
        .collect();
    assert_eq!(ids, HashSet::from([1, 3]));
}

#[tokio::test]
async fn test_job_pause_then_restart_resumes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(profile_page("Steady Profile", "History"))
                .set_delay(Duration::from_millis(50)),
        )
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let dataset = dir.path().join("nested").join("professors_dataset.jsonl");
    let config = create_test_config(&server, &dataset, 1, 1_000_000);
    let jobs = JobController::new(Coordinator::new(Arc::new(config)));

    assert_eq!(jobs.start().await.unwrap(), StartOutcome::Started);
    tokio::time::sleep(Duration::from_millis(400)).await;
    assert_eq!(jobs.pause().await, PauseOutcome::Paused);
    assert!(!jobs.status().await.running);

    let after_pause = read_records(&dataset);
    assert!(!after_pause.is_empty());
    let max_before = after_pause.iter().map(|r| r.professor_id).max().unwrap();

    // Nothing lands in the dataset once pause has returned
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(read_records(&dataset).len(), after_pause.len());

    assert_eq!(jobs.start().await.unwrap(), StartOutcome::Started);
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(jobs.pause().await, PauseOutcome::Paused);

    let after_restart = read_records(&dataset);
    assert!(after_restart.len() > after_pause.len());
    assert!(after_restart[after_pause.len()..]
        .iter()
        .all(|r| r.professor_id > max_before));
}
