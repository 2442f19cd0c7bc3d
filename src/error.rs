use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Failures on the `/postreceive` path that end the request early.
///
/// A delivery that is authentic but not actionable is not an error; see
/// [`crate::dispatch::Decision::NotActionable`].
#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("missing required header: {0}")]
    MissingHeader(&'static str),

    #[error("header {0} is not valid ASCII")]
    InvalidHeader(&'static str),

    #[error("request signatures didn't match")]
    SignatureMismatch,

    #[error("invalid event payload: {0}")]
    InvalidPayload(#[from] serde_json::Error),

    #[error(transparent)]
    Queue(#[from] QueueError),
}

impl WebhookError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingHeader(_) | Self::InvalidHeader(_) | Self::InvalidPayload(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::SignatureMismatch => StatusCode::FORBIDDEN,
            Self::Queue(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        let body = match &self {
            Self::SignatureMismatch => "Request signatures didn't match!".to_string(),
            other => other.to_string(),
        };
        (self.status(), body).into_response()
    }
}

/// Job submission failures.
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("job queue is closed")]
    Closed,
}

/// Failures talking to the agent-graph server.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("graph server request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("graph server returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("run finished without any messages")]
    EmptyRun,
}
