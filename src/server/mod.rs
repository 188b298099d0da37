// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Cumulus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Cumulus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! HTTP surface.
//!
//! `POST /api/generate` runs one session in its own task and streams the session's event channel
//! back as `text/event-stream`. Dropping the response body drops the receiver, which cancels the
//! session at its next delta boundary.

use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::sse::{Event, Sse};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures_util::stream::{self, Stream, StreamExt};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, instrument};

use crate::agent::{run_session, ChatMessage, SessionRequest};
use crate::config::AgentConfig;
use crate::llm::ModelClient;
use crate::model::{Graph, GraphSnapshot};
use crate::stream::channel;

#[derive(Clone)]
pub struct AppState {
    client: Arc<dyn ModelClient>,
    config: Arc<AgentConfig>,
}

impl AppState {
    pub fn new(client: Arc<dyn ModelClient>, config: AgentConfig) -> Self {
        Self { client, config: Arc::new(config) }
    }
}

/// Body of `POST /api/generate`.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateRequest {
    pub messages: Vec<ChatMessage>,
    /// Diagram to continue from; the session starts empty without it.
    #[serde(default)]
    pub graph: Option<GraphSnapshot>,
    #[serde(default)]
    pub previous_response_id: Option<String>,
}

type ApiError = (StatusCode, Json<Value>);

fn unprocessable(kind: &str, message: String) -> ApiError {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(json!({ "error": { "kind": kind, "message": message } })),
    )
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/generate", post(generate))
        .route("/health", get(health))
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

#[instrument(skip_all, fields(messages = body.messages.len(), seeded = body.graph.is_some()))]
async fn generate(
    State(state): State<AppState>,
    Json(body): Json<GenerateRequest>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    if body.messages.is_empty() {
        return Err(unprocessable("invalid_request", "messages must not be empty".to_owned()));
    }
    let graph = match body.graph.as_ref() {
        Some(snapshot) => Graph::from_snapshot(snapshot)
            .map_err(|err| unprocessable("invalid_graph", err.to_string()))?,
        None => Graph::new(),
    };

    let (sink, receiver) = channel(state.config.channel_capacity);
    let request = SessionRequest {
        messages: body.messages,
        graph,
        previous_response_id: body.previous_response_id,
    };
    let AppState { client, config } = state;
    tokio::spawn(async move {
        // the outcome has already been reported on the event channel
        if let Err(err) = run_session(client, config, request, sink).await {
            debug!(error = %err, "session task finished with error");
        }
    });

    let frames = receiver
        .into_stream()
        .flat_map(|event| stream::iter(event.payloads()))
        .map(|payload| Ok::<_, Infallible>(Event::default().data(payload)));
    Ok(Sse::new(frames))
}
