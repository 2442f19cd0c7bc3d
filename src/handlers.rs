use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use tracing::{info, warn};

use crate::{
    AppState,
    dispatch::Decision,
    error::WebhookError,
    event::WebhookEvent,
    signature::verify_signature,
};

pub const SIGNATURE_HEADER: &str = "X-Hub-Signature-256";
pub const EVENT_HEADER: &str = "X-GitHub-Event";

fn required_header<'a>(
    headers: &'a HeaderMap,
    name: &'static str,
) -> Result<&'a str, WebhookError> {
    headers
        .get(name)
        .ok_or(WebhookError::MissingHeader(name))?
        .to_str()
        .map_err(|_| WebhookError::InvalidHeader(name))
}

/// Receives GitHub App deliveries.
///
/// Returns as soon as the jobs are queued; their outcome is only logged.
pub async fn postreceive(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, WebhookError> {
    let signature = required_header(&headers, SIGNATURE_HEADER)?;
    let kind = required_header(&headers, EVENT_HEADER)?;

    if state.validate_signatures && !verify_signature(&body, &state.webhook_secret, signature) {
        warn!(event = kind, "invalid webhook signature");
        return Err(WebhookError::SignatureMismatch);
    }

    let event = WebhookEvent::parse(kind, &body).inspect_err(|e| {
        warn!(event = kind, error = %e, "failed to parse webhook payload");
    })?;
    info!(event = kind, action = event.action().unwrap_or("UNKNOWN"), "received event");

    let action = event.action().map(str::to_owned);
    match state.dispatcher.decide(event) {
        Decision::Pong(zen) => Ok((StatusCode::OK, zen).into_response()),
        Decision::Dispatch(jobs) => {
            let count = jobs.len();
            for job in jobs {
                state.jobs.submit(job)?;
            }
            info!(event = kind, jobs = count, "jobs queued");
            Ok((StatusCode::ACCEPTED, "accepted").into_response())
        }
        Decision::NotActionable(reason) => {
            warn!(
                event = kind,
                action = action.as_deref().unwrap_or("UNKNOWN"),
                %reason,
                "skip processing of event"
            );
            Ok((StatusCode::UNPROCESSABLE_ENTITY, "event not allowed").into_response())
        }
    }
}

pub async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "message": "GitHub Webhook Handler is running"
    }))
}

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now(),
    }))
}
