// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Cumulus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Cumulus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Streaming HTTP client for a Responses-API compatible endpoint.

use std::collections::VecDeque;
use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::stream::{self, BoxStream, Stream, StreamExt};
use reqwest::Client;

use super::sse::SseDecoder;
use super::types::{ResponsesRequest, StreamEvent};

/// Errors from the upstream model call.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("rate limited (retry after {retry_after:?}s)")]
    RateLimited { retry_after: Option<u64> },

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("upstream failure: {0}")]
    Upstream(String),

    #[error("no stream event within {0:?}")]
    IdleTimeout(Duration),

    #[error("missing API key: {0}")]
    MissingApiKey(String),
}

pub type ModelStream = BoxStream<'static, Result<StreamEvent, LlmError>>;

/// Source of streamed model responses. The controller only talks to this trait.
#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn stream(&self, request: &ResponsesRequest) -> Result<ModelStream, LlmError>;
}

#[derive(Debug, Clone)]
pub struct HttpModelClient {
    http: Client,
    api_key: String,
    base_url: String,
}

impl HttpModelClient {
    pub fn new(
        api_key: String,
        base_url: String,
        connect_timeout: Duration,
    ) -> Result<Self, LlmError> {
        if api_key.trim().is_empty() {
            return Err(LlmError::MissingApiKey("API key is empty".to_owned()));
        }
        let http = Client::builder().connect_timeout(connect_timeout).build()?;
        Ok(Self { http, api_key, base_url: base_url.trim_end_matches('/').to_owned() })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl ModelClient for HttpModelClient {
    async fn stream(&self, request: &ResponsesRequest) -> Result<ModelStream, LlmError> {
        let url = format!("{}/responses", self.base_url);

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .header("accept", "text/event-stream")
            .json(request)
            .send()
            .await?;

        let status = response.status().as_u16();

        if status == 429 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok());
            return Err(LlmError::RateLimited { retry_after });
        }

        if status >= 400 {
            let body = response.text().await.unwrap_or_else(|_| "(no body)".into());
            return Err(LlmError::ApiError { status, message: body });
        }

        Ok(decode_event_stream(response.bytes_stream()))
    }
}

struct DecodeState<S> {
    bytes: Pin<Box<S>>,
    decoder: SseDecoder,
    pending: VecDeque<String>,
    finished: bool,
}

/// Turns a raw SSE byte stream into parsed [`StreamEvent`]s, in arrival order.
pub fn decode_event_stream<S, B, E>(bytes: S) -> ModelStream
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Send + 'static,
    LlmError: From<E>,
{
    let state = DecodeState {
        bytes: Box::pin(bytes),
        decoder: SseDecoder::new(),
        pending: VecDeque::new(),
        finished: false,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(payload) = state.pending.pop_front() {
                return Some((StreamEvent::parse(&payload), state));
            }
            if state.finished {
                return None;
            }
            match state.bytes.next().await {
                Some(Ok(chunk)) => {
                    let payloads = state.decoder.push(chunk.as_ref());
                    state.pending.extend(payloads);
                }
                Some(Err(err)) => {
                    state.finished = true;
                    return Some((Err(LlmError::from(err)), state));
                }
                None => {
                    state.finished = true;
                    state.pending.extend(state.decoder.finish());
                }
            }
        }
    })
    .boxed()
}
