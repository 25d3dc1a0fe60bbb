//! Axum route handler for the chat endpoint

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router, routing};
use futures_util::{Stream, StreamExt};
use kaiwu_core::HttpError;
use serde::{Deserialize, Serialize};

use crate::error::LlmError;
use crate::provider::LanguageModel;
use crate::types::{CallOptions, CallWarning, Content, FinishReason, PartStream, Prompt, Usage};

/// Message returned for every failure; details only go to the log
const GENERIC_ERROR: &str = "Internal server error";

/// Shared state for the chat endpoint
#[derive(Clone)]
pub struct ChatState {
    model: Arc<dyn LanguageModel>,
}

impl ChatState {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model }
    }
}

/// Build the chat router
pub fn chat_router(state: ChatState) -> Router {
    Router::new()
        .route("/api/chat", routing::post(chat))
        .with_state(state)
}

/// Body of `POST /api/chat`
#[derive(Debug, Deserialize)]
struct ChatPayload {
    messages: Prompt,
    #[serde(default = "default_stream")]
    stream: bool,
}

const fn default_stream() -> bool {
    true
}

/// Non-streaming answer
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ChatAnswer {
    content: Vec<Content>,
    finish_reason: FinishReason,
    usage: Usage,
    warnings: Vec<CallWarning>,
}

/// Handle `POST /api/chat`
async fn chat(State(state): State<ChatState>, body: Bytes) -> Response {
    let payload: ChatPayload = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(e) => {
            tracing::warn!(error = %e, "rejecting malformed chat request");
            return generic_error();
        }
    };

    let options = CallOptions::new(payload.messages);

    if payload.stream {
        match state.model.stream(options).await {
            Ok(result) => sse_response(result.stream).into_response(),
            Err(e) => error_response(&e),
        }
    } else {
        match state.model.generate(options).await {
            Ok(result) => Json(ChatAnswer {
                content: result.content,
                finish_reason: result.finish_reason,
                usage: result.usage,
                warnings: result.warnings,
            })
            .into_response(),
            Err(e) => error_response(&e),
        }
    }
}

/// Forward stream parts as SSE `data:` lines
fn sse_response(parts: PartStream) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    let events = parts.map(|part| match part {
        Ok(part) => Event::default().json_data(part),
        Err(e) => {
            log_error(&e, "chat stream failed");
            Event::default().json_data(serde_json::json!({
                "type": "error",
                "errorText": GENERIC_ERROR,
            }))
        }
    });

    Sse::new(events).keep_alive(KeepAlive::default())
}

fn error_response(error: &LlmError) -> Response {
    log_error(error, "chat request failed");
    generic_error()
}

fn log_error(error: &LlmError, message: &'static str) {
    if error.is_client_error() {
        tracing::warn!(error = %error, error_type = error.error_type(), "{message}");
    } else {
        tracing::error!(
            error = %error,
            error_type = error.error_type(),
            upstream_status = ?error.upstream_status(),
            "{message}"
        );
    }
}

fn generic_error() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({ "error": GENERIC_ERROR })),
    )
        .into_response()
}
