//! Starts the real `plexsubs` binary and talks to it over TCP.

use std::io::Write;
use std::net::TcpListener;
use std::process::Output;
use std::time::Duration;

use reqwest::Client;
use tempfile::NamedTempFile;
use tokio::process::{Child, Command};
use tokio::time::{sleep, timeout};

const TOKEN: &str = "abcdefghijklmnop";
const PASSWORD: &str = "secret-password";

fn free_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

/// Plex points at the discard port so nothing answers.
fn config_for(port: u16, extra: &str) -> String {
    format!(
        r#"
[server]
host = "127.0.0.1"
port = {port}
{extra}

[plex]
url = "http://127.0.0.1:9"
token = "{TOKEN}"

[opensubtitles]
api_key = "key"
username = "user"
password = "{PASSWORD}"
"#
    )
}

struct RunningServer {
    child: Child,
    base_url: String,
    client: Client,
    _config: NamedTempFile,
}

impl RunningServer {
    async fn start(extra: &str) -> Self {
        let port = free_port();
        let config = write_config(&config_for(port, extra));
        let child = Command::new(env!("CARGO_BIN_EXE_plexsubs"))
            .env("PLEXSUBS_CONFIG", config.path())
            .env("RUST_LOG", "error")
            .kill_on_drop(true)
            .spawn()
            .expect("Failed to spawn plexsubs");

        let server = Self {
            child,
            base_url: format!("http://127.0.0.1:{port}"),
            client: Client::new(),
            _config: config,
        };
        assert!(server.wait_ready().await, "plexsubs did not start in time");
        server
    }

    async fn wait_ready(&self) -> bool {
        for _ in 0..40 {
            if self.client.get(self.url("/api/v1/health")).send().await.is_ok() {
                return true;
            }
            sleep(Duration::from_millis(50)).await;
        }
        false
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn stop(mut self) {
        self.child.kill().await.ok();
    }
}

/// Runs the binary to completion; it must exit on its own.
async fn run_to_exit(config_path: &std::path::Path) -> Output {
    timeout(
        Duration::from_secs(5),
        Command::new(env!("CARGO_BIN_EXE_plexsubs"))
            .env("PLEXSUBS_CONFIG", config_path)
            .env("RUST_LOG", "error")
            .output(),
    )
    .await
    .expect("plexsubs kept running")
    .expect("Failed to execute plexsubs")
}

#[tokio::test]
async fn test_health_reports_version() {
    let server = RunningServer::start("").await;

    let response = server
        .client
        .get(server.url("/api/v1/health"))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());

    let json: serde_json::Value = response.json().await.unwrap();
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());

    server.stop().await;
}

#[tokio::test]
async fn test_config_hides_credentials() {
    let server = RunningServer::start("").await;

    let body = server
        .client
        .get(server.url("/api/v1/config"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(!body.contains(PASSWORD));
    assert!(!body.contains(TOKEN));

    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["plex"]["token_configured"], true);
    assert_eq!(json["opensubtitles"]["password_configured"], true);

    server.stop().await;
}

#[tokio::test]
async fn test_custom_webhook_path_ignores_other_events() {
    let server = RunningServer::start(r#"webhook_path = "/hooks/plex""#).await;

    let response = server
        .client
        .post(server.url("/hooks/plex"))
        .header("content-type", "application/json")
        .body(r#"{"event":"media.pause","Metadata":{"ratingKey":"1"}}"#)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let json: serde_json::Value = response.json().await.unwrap();
    assert_eq!(json["status"], "ignored");

    server.stop().await;
}

#[tokio::test]
async fn test_unreachable_plex_gives_bad_gateway() {
    let server = RunningServer::start("").await;

    let response = server
        .client
        .post(server.url("/plexsubs"))
        .header("content-type", "application/json")
        .body(r#"{"event":"media.play","Metadata":{"ratingKey":"1001"}}"#)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 502);

    let metrics = server
        .client
        .get(server.url("/metrics"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(metrics.contains("plexsubs_webhook_events_total"));

    server.stop().await;
}

#[tokio::test]
async fn test_missing_config_file_exits_with_error() {
    let output = run_to_exit(std::path::Path::new("/nonexistent/config.toml")).await;
    assert!(!output.status.success());
}

#[tokio::test]
async fn test_missing_credentials_exits_with_error() {
    let config = write_config(&format!(
        r#"
[server]
port = {}

[plex]
token = "{TOKEN}"
"#,
        free_port()
    ));
    let output = run_to_exit(config.path()).await;
    assert!(!output.status.success());
}

#[tokio::test]
async fn test_webhook_path_on_builtin_route_exits_with_error() {
    let config = write_config(&config_for(free_port(), r#"webhook_path = "/metrics""#));
    let output = run_to_exit(config.path()).await;
    assert!(!output.status.success());
}
