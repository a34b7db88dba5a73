/*
[INPUT]:  vdub-tracker binary, sample configuration, mocked backend
[OUTPUT]: Exit status and stdout checks
[POS]:    Integration test layer - command-line surface
[UPDATE]: When CLI flags or command output change
*/

use std::process::{Command, Output};

use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn tracker() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_vdub-tracker"));
    command
        .env("RUST_LOG", "error")
        .env_remove("VDUB_API_URL")
        .arg("--log-level")
        .arg("error");
    command
}

fn sample_config() -> String {
    format!("{}/config/tracker.yaml", env!("CARGO_MANIFEST_DIR"))
}

fn assert_success(output: &Output) {
    assert!(
        output.status.success(),
        "Process exited with non-zero status: {}\nStdout: {}\nStderr: {}",
        output.status,
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
}

#[test]
fn cli_mode_with_config_and_dry_run_works() {
    let output = tracker()
        .arg("--config")
        .arg(sample_config())
        .arg("--dry-run")
        .output()
        .expect("Failed to start vdub-tracker binary");

    assert_success(&output);
}

#[test]
fn dry_run_rejects_invalid_config() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("bad.yaml");
    std::fs::write(&config_path, "list:\n  page_size: 0\n").unwrap();

    let output = tracker()
        .arg("--config")
        .arg(&config_path)
        .arg("--dry-run")
        .output()
        .expect("Failed to start vdub-tracker binary");

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("page_size"));
}

#[test]
fn dry_run_rejects_unusable_api_url() {
    let output = tracker()
        .arg("--config")
        .arg(sample_config())
        .arg("--api-url")
        .arg("not a url")
        .arg("--dry-run")
        .output()
        .expect("Failed to start vdub-tracker binary");

    assert!(!output.status.success());
}

#[tokio::test]
async fn list_prints_tasks_from_backend() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/tasks"))
        .and(query_param("page", "1"))
        .and(query_param("page_size", "10"))
        .and(query_param("status", "completed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "items": [{
                "id": "6f1c2d3e-4b5a-4c7d-8e9f-0a1b2c3d4e5f",
                "title": "quarterly update",
                "source_language": "en",
                "target_language": "ja",
                "status": "completed",
                "subtitle_mode": "BURN",
                "progress": 100,
                "segment_count": 12,
                "created_at": "2024-05-01T10:00:00Z",
                "updated_at": "2024-05-01T10:20:00Z",
                "completed_at": "2024-05-01T10:20:00Z"
            }],
            "total": 21,
            "page": 1,
            "page_size": 10,
            "total_pages": 3
        })))
        .expect(1)
        .mount(&server)
        .await;

    let api_url = format!("{}/api/v1", server.uri());
    let output = tokio::task::spawn_blocking(move || {
        tracker()
            .arg("--config")
            .arg(sample_config())
            .arg("--api-url")
            .arg(api_url)
            .arg("list")
            .arg("--status")
            .arg("completed")
            .output()
            .expect("Failed to start vdub-tracker binary")
    })
    .await
    .unwrap();

    assert_success(&output);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("6f1c2d3e"));
    assert!(stdout.contains("quarterly update"));
    assert!(stdout.contains("Completed"));
    assert!(stdout.contains("21 task(s), page 1 of 3"));
    assert!(stdout.contains("[1] 2 3 >"));
}

#[tokio::test]
async fn result_of_unfinished_task_fails() {
    let server = MockServer::start().await;
    let id = "6f1c2d3e-4b5a-4c7d-8e9f-0a1b2c3d4e5f";
    Mock::given(method("GET"))
        .and(path(format!("/api/v1/tasks/{id}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": id,
            "source_language": "en",
            "target_language": "zh",
            "status": "translating",
            "subtitle_mode": "EXTERNAL",
            "progress": 45,
            "created_at": "2024-05-01T10:00:00Z",
            "updated_at": "2024-05-01T10:05:00Z"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/api/v1/tasks/{id}/result")))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let api_url = format!("{}/api/v1", server.uri());
    let output = tokio::task::spawn_blocking(move || {
        tracker()
            .arg("--api-url")
            .arg(api_url)
            .arg("result")
            .arg(id)
            .output()
            .expect("Failed to start vdub-tracker binary")
    })
    .await
    .unwrap();

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("translating"));
}

async fn past_the_end_backend() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/tasks"))
        .and(query_param("page", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "items": [],
            "total": 23,
            "page": 5,
            "page_size": 10,
            "total_pages": 3
        })))
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn list_rejects_page_past_the_end() {
    let server = past_the_end_backend().await;
    let api_url = format!("{}/api/v1", server.uri());
    let output = tokio::task::spawn_blocking(move || {
        tracker()
            .arg("--config")
            .arg(sample_config())
            .arg("--api-url")
            .arg(api_url)
            .arg("list")
            .arg("--page")
            .arg("5")
            .output()
            .expect("Failed to start vdub-tracker binary")
    })
    .await
    .unwrap();

    assert!(!output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(!stdout.contains("page 1 of 3"));
    assert!(!stdout.contains("No tasks yet."));
    assert!(String::from_utf8_lossy(&output.stderr).contains("page 5 out of range (3 pages)"));
}

#[tokio::test]
async fn watch_rejects_page_past_the_end() {
    let server = past_the_end_backend().await;
    let api_url = format!("{}/api/v1", server.uri());
    let output = tokio::task::spawn_blocking(move || {
        tracker()
            .arg("--config")
            .arg(sample_config())
            .arg("--api-url")
            .arg(api_url)
            .arg("watch")
            .arg("--page")
            .arg("5")
            .output()
            .expect("Failed to start vdub-tracker binary")
    })
    .await
    .unwrap();

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("page 5 out of range (3 pages)"));
}
