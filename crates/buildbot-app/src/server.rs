use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use buildbot_github::webhook_events::{CheckRunEvent, IssueCommentEvent};
use buildbot_github::webhook_signature::verify_webhook_signature;
use buildbot_runtime::build_status_flow::{handle_build_status_event, BuildStatusEvent};
use buildbot_runtime::github_ops::GithubOps;
use buildbot_runtime::issue_comment_flow::{handle_issue_comment_event, IssueCommentOutcome};
use buildbot_runtime::trybot::TryScheduler;
use serde_json::json;
use tokio::net::TcpListener;
use tracing::{info, warn};

const GITHUB_HOOK_ENDPOINT: &str = "/github-hook";
const BUILDBOT_STATUS_HOOK_ENDPOINT: &str = "/buildbot-status-hook";
const HEALTH_ENDPOINT: &str = "/healthz";

// Webhook bodies are capped at 1 MiB, matching what GitHub delivers.
const MAX_HOOK_BODY_BYTES: usize = 1_048_576;

/// Shared handler state: the GitHub capability set, the try scheduler, and
/// the webhook secret.
pub struct AppState {
    pub ops: Arc<dyn GithubOps>,
    pub scheduler: Arc<dyn TryScheduler>,
    pub webhook_secret: String,
}

pub fn build_app_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(GITHUB_HOOK_ENDPOINT, post(handle_github_hook))
        .route(
            BUILDBOT_STATUS_HOOK_ENDPOINT,
            post(handle_buildbot_status_hook),
        )
        .route(HEALTH_ENDPOINT, get(handle_health))
        .layer(DefaultBodyLimit::max(MAX_HOOK_BODY_BYTES))
        .with_state(state)
}

/// Binds the bridge HTTP server and serves it until ctrl-c.
pub async fn run_app_server(bind_address: &str, state: Arc<AppState>) -> Result<()> {
    let bind_addr = bind_address
        .parse::<SocketAddr>()
        .with_context(|| format!("invalid bind address '{bind_address}'"))?;
    let listener = TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind app server on {bind_addr}"))?;
    let local_addr = listener
        .local_addr()
        .context("failed to resolve bound app server address")?;
    info!(
        "buildbot-app listening: github_hook={} status_hook={} addr={}",
        GITHUB_HOOK_ENDPOINT, BUILDBOT_STATUS_HOOK_ENDPOINT, local_addr
    );

    let app = build_app_router(state);
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .context("app server exited unexpectedly")
}

async fn handle_health() -> &'static str {
    "ok"
}

async fn handle_github_hook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if !state.webhook_secret.is_empty() {
        let Some(signature) = headers
            .get("x-hub-signature-256")
            .and_then(|value| value.to_str().ok())
        else {
            return (StatusCode::UNAUTHORIZED, "missing webhook signature").into_response();
        };
        if let Err(error) = verify_webhook_signature(&body, signature, &state.webhook_secret) {
            warn!("rejected github hook delivery: {error}");
            return (StatusCode::UNAUTHORIZED, "invalid webhook signature").into_response();
        }
    }

    let event_name = headers
        .get("x-github-event")
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    match event_name {
        "ping" => (StatusCode::OK, "pong").into_response(),
        "issue_comment" => {
            let event: IssueCommentEvent = match serde_json::from_slice(&body) {
                Ok(event) => event,
                Err(error) => {
                    return (
                        StatusCode::BAD_REQUEST,
                        format!("failed to decode issue_comment event: {error}"),
                    )
                        .into_response();
                }
            };
            match handle_issue_comment_event(state.ops.as_ref(), state.scheduler.as_ref(), &event)
                .await
            {
                Ok(outcome) => issue_comment_outcome_response(outcome),
                Err(error) => {
                    warn!("issue_comment handling failed: {error:#}");
                    (StatusCode::INTERNAL_SERVER_ERROR, format!("{error:#}")).into_response()
                }
            }
        }
        "check_run" => {
            // TODO(requested actions): act on MakeMandatory/MakeOptional/
            // ReRunCheck clicks instead of only acknowledging them.
            match serde_json::from_slice::<CheckRunEvent>(&body) {
                Ok(event) => {
                    let identifier = event
                        .requested_action
                        .map(|action| action.identifier)
                        .unwrap_or_default();
                    info!(
                        action = %event.action,
                        identifier = %identifier,
                        "check_run event received but not handled yet"
                    );
                    (StatusCode::OK, Json(json!({ "outcome": "ignored_event" }))).into_response()
                }
                Err(error) => (
                    StatusCode::BAD_REQUEST,
                    format!("failed to decode check_run event: {error}"),
                )
                    .into_response(),
            }
        }
        other => {
            info!("ignoring github event: {other}");
            (StatusCode::OK, Json(json!({ "outcome": "ignored_event" }))).into_response()
        }
    }
}

fn issue_comment_outcome_response(outcome: IssueCommentOutcome) -> Response {
    let payload = match outcome {
        IssueCommentOutcome::Ignored { reason_code } => {
            json!({ "outcome": "ignored", "reason_code": reason_code })
        }
        IssueCommentOutcome::SkippedDuplicate { check_run_id } => {
            json!({ "outcome": "skipped_duplicate", "check_run_id": check_run_id })
        }
        IssueCommentOutcome::Scheduled { check_run_id } => {
            json!({ "outcome": "scheduled", "check_run_id": check_run_id })
        }
    };
    (StatusCode::OK, Json(payload)).into_response()
}

async fn handle_buildbot_status_hook(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Response {
    let event: BuildStatusEvent = match serde_json::from_slice(&body) {
        Ok(event) => event,
        Err(error) => {
            return (
                StatusCode::BAD_REQUEST,
                format!("failed to decode build status payload: {error}"),
            )
                .into_response();
        }
    };
    match handle_build_status_event(state.ops.as_ref(), &event).await {
        Ok(()) => (
            StatusCode::OK,
            "thank you for calling back to the buildbot-app",
        )
            .into_response(),
        Err(error) => {
            warn!("build status handling failed: {error:#}");
            (StatusCode::INTERNAL_SERVER_ERROR, format!("{error:#}")).into_response()
        }
    }
}
