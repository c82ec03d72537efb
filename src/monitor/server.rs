use super::aggregate::LogStats;
use super::page::{CredentialFlags, Dashboard, render_page};
use super::Snapshot;
use crate::storage::{ConversationStore, RecentConversation};
use anyhow::Result;
use axum::{
    Router,
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Json},
    routing::get,
};
use chrono::Local;
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tower_http::timeout::TimeoutLayer;

/// Request timeout (30s)
pub const REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_CONVERSATIONS: usize = 20;
const MAX_CONVERSATIONS: usize = 200;

/// Shared state for the dashboard handlers.
#[derive(Clone)]
pub struct MonitorState {
    pub log_file: Arc<PathBuf>,
    pub tail_lines: usize,
    /// Absent when the database could not be opened; the log views still work.
    pub store: Option<Arc<ConversationStore>>,
    pub credentials: CredentialFlags,
}

#[derive(Debug, Deserialize)]
pub struct ConversationsQuery {
    pub limit: Option<usize>,
}

/// Serve the dashboard on `host:port` until the task is dropped.
pub async fn run_monitor(host: &str, port: u16, state: MonitorState) -> Result<()> {
    let addr: SocketAddr = format!("{host}:{port}").parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    run_monitor_with_listener(listener, state).await
}

/// Serve the dashboard from a pre-bound listener.
pub async fn run_monitor_with_listener(
    listener: tokio::net::TcpListener,
    state: MonitorState,
) -> Result<()> {
    let addr = listener.local_addr()?;
    tracing::info!("Monitor listening on http://{addr}");

    let app = router(state);
    axum::serve(listener, app).await?;
    Ok(())
}

fn router(state: MonitorState) -> Router {
    Router::new()
        .route("/", get(handle_dashboard))
        .route("/api/stats", get(handle_stats))
        .route("/api/conversations", get(handle_conversations))
        .route("/health", get(handle_health))
        .with_state(state)
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(REQUEST_TIMEOUT_SECS),
        ))
}

fn internal_error(err: &anyhow::Error) -> (StatusCode, String) {
    tracing::error!("Monitor request failed: {err:#}");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "failed to read bot activity".to_string(),
    )
}

async fn recent_conversations(state: &MonitorState, limit: usize) -> Vec<RecentConversation> {
    match &state.store {
        Some(store) => store.get_recent_turns_across_users(limit).await,
        None => Vec::new(),
    }
}

/// GET /: HTML dashboard
async fn handle_dashboard(
    State(state): State<MonitorState>,
) -> Result<Html<String>, (StatusCode, String)> {
    let snapshot = Snapshot::load(&state.log_file, state.tail_lines)
        .await
        .map_err(|e| internal_error(&e))?;
    let conversations = recent_conversations(&state, DEFAULT_CONVERSATIONS).await;
    let log_file_present = tokio::fs::try_exists(state.log_file.as_path())
        .await
        .unwrap_or(false);

    let html = render_page(&Dashboard {
        stats: &snapshot.stats,
        lines: &snapshot.lines,
        conversations: &conversations,
        credentials: state.credentials,
        log_file: &state.log_file,
        log_file_present,
        now: Local::now().naive_local(),
    })
    .map_err(|e| internal_error(&e))?;
    Ok(Html(html))
}

/// GET /api/stats: log-derived statistics
async fn handle_stats(
    State(state): State<MonitorState>,
) -> Result<Json<LogStats>, (StatusCode, String)> {
    let snapshot = Snapshot::load(&state.log_file, state.tail_lines)
        .await
        .map_err(|e| internal_error(&e))?;
    Ok(Json(snapshot.stats))
}

/// GET /api/conversations?limit=N: newest stored turns across all users
async fn handle_conversations(
    State(state): State<MonitorState>,
    Query(query): Query<ConversationsQuery>,
) -> Json<Vec<RecentConversation>> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_CONVERSATIONS)
        .min(MAX_CONVERSATIONS);
    Json(recent_conversations(&state, limit).await)
}

/// GET /health
async fn handle_health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}
