use maveli::monitor::{CredentialFlags, LogStats, MonitorState, run_monitor_with_listener};
use maveli::storage::ConversationStore;
use reqwest::StatusCode;
use serde_json::Value;
use sqlx::sqlite::SqlitePoolOptions;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tempfile::NamedTempFile;

const LOG: &str = "\
2025-09-05 09:10:00,001 - maveli::bot - INFO - Received message from user 11 (Anu): ഓണം എപ്പോൾ ആണ്?...
2025-09-05 09:10:02,120 - maveli::responder - INFO - Successfully generated Gemini response: ഓണം...
2025-09-05 09:10:03,500 - maveli::speech - INFO - Generated audio file: /tmp/maveli-a.mp3
2025-09-05 09:12:00,000 - maveli::bot - ERROR - Error handling message from user 22: boom
";

struct MonitorTestServer {
    port: u16,
    handle: tokio::task::JoinHandle<anyhow::Result<()>>,
    _log: NamedTempFile,
}

impl MonitorTestServer {
    async fn start(store: Option<Arc<ConversationStore>>) -> Self {
        let mut log = NamedTempFile::new().expect("temp log should be created");
        log.write_all(LOG.as_bytes()).expect("log should be written");

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("ephemeral monitor listener should bind");
        let port = listener
            .local_addr()
            .expect("ephemeral monitor listener should expose local address")
            .port();

        let state = MonitorState {
            log_file: Arc::new(log.path().to_path_buf()),
            tail_lines: 1000,
            store,
            credentials: CredentialFlags {
                gemini_api_key: true,
                ..CredentialFlags::default()
            },
        };
        let handle = tokio::spawn(run_monitor_with_listener(listener, state));
        wait_until_monitor_ready(port).await;

        Self {
            port,
            handle,
            _log: log,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("http://127.0.0.1:{}{path}", self.port)
    }
}

impl Drop for MonitorTestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn wait_until_monitor_ready(port: u16) {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_millis(200))
        .build()
        .expect("reqwest client should be built");

    for _ in 0..80 {
        let health = client
            .get(format!("http://127.0.0.1:{port}/health"))
            .send()
            .await;
        if matches!(health, Ok(resp) if resp.status() == StatusCode::OK) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    panic!("monitor did not become ready on port {port}");
}

async fn memory_store() -> Arc<ConversationStore> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory pool should open");
    Arc::new(ConversationStore::new(pool).await.expect("schema should apply"))
}

#[tokio::test]
async fn health_reports_ok() {
    let server = MonitorTestServer::start(None).await;
    let body: Value = reqwest::get(server.url("/health"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn stats_endpoint_aggregates_log_file() {
    let server = MonitorTestServer::start(None).await;
    let resp = reqwest::get(server.url("/api/stats")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["total_logs"], 4);
    assert_eq!(body["user_messages"], 1);
    assert_eq!(body["gemini_responses"], 1);
    assert_eq!(body["audio_generations"], 1);
    assert_eq!(body["error_count"], 1);
    assert_eq!(body["hourly_activity"]["2025-09-05 09:00"], 4);
    assert_eq!(body["recent_user_messages"][0]["user_name"], "Anu");

    let direct = LogStats::from_lines(LOG.lines());
    assert_eq!(body["unique_users"], direct.unique_users);
}

#[tokio::test]
async fn dashboard_page_renders_html() {
    let server = MonitorTestServer::start(None).await;
    let resp = reqwest::get(server.url("/")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let content_type = resp.headers()["content-type"].to_str().unwrap().to_string();
    assert!(content_type.starts_with("text/html"));

    let html = resp.text().await.unwrap();
    assert!(html.contains("Maveli Bot Monitoring Dashboard"));
    assert!(html.contains("Anu (11)"));
    assert!(html.contains("GEMINI_API_KEY: ✅ Set"));
    assert!(html.contains("TELEGRAM_API_KEY: ❌ Not Available"));
    assert!(html.contains("No stored conversations"));
}

#[tokio::test]
async fn conversations_endpoint_lists_stored_turns() {
    let store = memory_store().await;
    store.upsert_user(5, Some("biju"), Some("Biju"), None).await;
    for i in 0..3 {
        store
            .save_turn(5, &format!("q{i}"), &format!("a{i}"), Some(10), i % 2 == 0, None)
            .await;
    }

    let server = MonitorTestServer::start(Some(store)).await;

    let all: Vec<Value> = reqwest::get(server.url("/api/conversations"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(all.len(), 3);
    assert_eq!(all[0]["message"], "q2");
    assert_eq!(all[0]["user_name"], "Biju");

    let limited: Vec<Value> = reqwest::get(server.url("/api/conversations?limit=1"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(limited.len(), 1);

    let html = reqwest::get(server.url("/")).await.unwrap().text().await.unwrap();
    assert!(html.contains("Biju (5)"));
}

#[tokio::test]
async fn conversations_without_store_is_empty() {
    let server = MonitorTestServer::start(None).await;
    let body: Vec<Value> = reqwest::get(server.url("/api/conversations"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(body.is_empty());
}
