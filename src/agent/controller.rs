// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Cumulus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Cumulus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Conversation loop controller.
//!
//! One controller owns one session: its graph, its conversation and the producer half of the
//! outbound event channel. Each turn issues one streaming model request, mirrors every increment,
//! executes each tool call as soon as its item is complete, and loops until a response arrives
//! without tool calls.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use futures_util::StreamExt;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::config::AgentConfig;
use crate::llm::{
    LlmError, ModelClient, ModelStream, OutputItem, ResponsesRequest, ToolDefinition,
    UpstreamEvent,
};
use crate::model::Graph;
use crate::ops::{apply_batch, ApplyResult, BatchError};
use crate::stream::{ErrorKind, EventSink, OutboundEvent};
use crate::tool::{
    batch_update_parameters, decode_tool_call, DecodeError, BATCH_UPDATE_DESCRIPTION,
    BATCH_UPDATE_TOOL,
};

use super::budget::TurnBudget;
use super::conversation::{ChatMessage, Conversation};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControllerState {
    AwaitingModel,
    StreamingDeltas,
    ExecutingTools,
    Completed,
    Failed,
}

impl fmt::Display for ControllerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AwaitingModel => f.write_str("awaiting_model"),
            Self::StreamingDeltas => f.write_str("streaming_deltas"),
            Self::ExecutingTools => f.write_str("executing_tools"),
            Self::Completed => f.write_str("completed"),
            Self::Failed => f.write_str("failed"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("tool call {call_id} could not be decoded: {source}")]
    Decode { call_id: String, source: DecodeError },

    #[error("tool call {call_id} was rejected: {source}")]
    Validation { call_id: String, source: BatchError },

    #[error("model call failed: {0}")]
    Transport(#[from] LlmError),

    #[error("protocol violation: {0}")]
    Protocol(String),

    #[error("caller disconnected")]
    Cancelled,
}

impl SessionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Decode { .. } => ErrorKind::Decode,
            Self::Validation { .. } => ErrorKind::Validation,
            Self::Transport(_) | Self::Cancelled => ErrorKind::Transport,
            Self::Protocol(_) => ErrorKind::Protocol,
        }
    }
}

/// Input of one generation session.
#[derive(Debug, Clone, Default)]
pub struct SessionRequest {
    pub messages: Vec<ChatMessage>,
    pub graph: Graph,
    /// Continue from an earlier response instead of starting a fresh thread.
    pub previous_response_id: Option<String>,
}

impl SessionRequest {
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self { messages, ..Self::default() }
    }
}

#[derive(Debug, Clone)]
pub struct SessionOutcome {
    pub graph: Graph,
    pub turns: u32,
    pub response_id: Option<String>,
    pub conversation: Conversation,
}

/// Per-response bookkeeping.
#[derive(Debug, Default)]
struct TurnState {
    arguments: HashMap<String, String>,
    handled_calls: HashSet<String>,
    tool_calls: usize,
}

pub struct Controller {
    client: Arc<dyn ModelClient>,
    config: Arc<AgentConfig>,
    graph: Graph,
    conversation: Conversation,
    budget: TurnBudget,
    state: ControllerState,
    sink: EventSink,
    response_id: Option<String>,
    tools: Vec<ToolDefinition>,
}

impl Controller {
    pub fn new(
        client: Arc<dyn ModelClient>,
        config: Arc<AgentConfig>,
        request: SessionRequest,
        sink: EventSink,
    ) -> Self {
        let mut conversation = Conversation::with_graph_context(request.messages, &request.graph);
        conversation.set_previous_response_id(request.previous_response_id);
        let budget = TurnBudget::new(config.max_turns);
        Self {
            client,
            config,
            graph: request.graph,
            conversation,
            budget,
            state: ControllerState::AwaitingModel,
            sink,
            response_id: None,
            tools: vec![ToolDefinition::function(
                BATCH_UPDATE_TOOL,
                BATCH_UPDATE_DESCRIPTION,
                batch_update_parameters(),
            )],
        }
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    /// Drives the session to `Completed` or `Failed`.
    ///
    /// The terminal `done`/`error` event is always the last thing written to the sink (unless the
    /// caller disconnected, in which case nothing more can be delivered).
    #[tracing::instrument(
        skip_all,
        fields(model = %self.config.model, max_turns = self.config.max_turns)
    )]
    pub async fn run(mut self) -> Result<SessionOutcome, SessionError> {
        match self.run_loop().await {
            Ok(()) => {
                self.transition(ControllerState::Completed);
                info!(turns = self.budget.turn(), rev = self.graph.rev(), "session completed");
                let done = OutboundEvent::Done {
                    response_id: self.response_id.clone(),
                    turns: self.budget.turn(),
                    graph: self.graph.snapshot(),
                };
                self.sink.send(done).await.map_err(|_| SessionError::Cancelled)?;
                Ok(SessionOutcome {
                    graph: self.graph,
                    turns: self.budget.turn(),
                    response_id: self.response_id,
                    conversation: self.conversation,
                })
            }
            Err(err) => {
                self.transition(ControllerState::Failed);
                if matches!(err, SessionError::Cancelled) {
                    info!("caller disconnected, session stopped");
                } else {
                    warn!(kind = %err.kind(), error = %err, "session failed");
                    let event = OutboundEvent::Error { kind: err.kind(), message: err.to_string() };
                    // the caller may be gone already; the error is returned either way
                    let _ = self.sink.send(event).await;
                }
                Err(err)
            }
        }
    }

    async fn run_loop(&mut self) -> Result<(), SessionError> {
        loop {
            self.transition(ControllerState::AwaitingModel);
            info!(
                turn = self.budget.turn(),
                final_turn = self.budget.is_final_turn(),
                "turn started"
            );

            let request = self.next_request();
            self.conversation.mark_sent();
            let stream = self.open_stream(&request).await?;

            self.transition(ControllerState::StreamingDeltas);
            let tool_calls = self.consume(stream).await?;

            if tool_calls == 0 {
                return Ok(());
            }

            self.transition(ControllerState::ExecutingTools);
            self.conversation.drop_transient();
            self.budget.advance();
            if self.budget.is_final_turn() {
                info!(turn = self.budget.turn(), "turn budget reached, advising model to conclude");
            }
        }
    }

    fn next_request(&self) -> ResponsesRequest {
        let (input, previous_response_id) = self.conversation.next_input(self.config.continuation);
        ResponsesRequest {
            model: self.config.model.clone(),
            instructions: Some(self.budget.instructions(&self.config.instructions)),
            input,
            tools: self.tools.clone(),
            stream: true,
            previous_response_id,
        }
    }

    async fn open_stream(&self, request: &ResponsesRequest) -> Result<ModelStream, SessionError> {
        let idle_timeout = self.config.idle_timeout;
        tokio::select! {
            biased;
            _ = self.sink.closed() => Err(SessionError::Cancelled),
            opened = tokio::time::timeout(idle_timeout, self.client.stream(request)) => {
                match opened {
                    Ok(result) => Ok(result?),
                    Err(_) => Err(LlmError::IdleTimeout(idle_timeout).into()),
                }
            }
        }
    }

    /// Consumes one model response. Returns the number of tool calls it executed.
    async fn consume(&mut self, mut stream: ModelStream) -> Result<usize, SessionError> {
        let idle_timeout = self.config.idle_timeout;
        let mut turn = TurnState::default();

        loop {
            let next = tokio::select! {
                biased;
                _ = self.sink.closed() => return Err(SessionError::Cancelled),
                next = tokio::time::timeout(idle_timeout, stream.next()) => next,
            };
            let event = match next {
                Err(_) => return Err(LlmError::IdleTimeout(idle_timeout).into()),
                Ok(None) => {
                    return Err(SessionError::Protocol(
                        "model stream ended before response.completed".to_owned(),
                    ))
                }
                Ok(Some(event)) => event?,
            };

            self.emit(OutboundEvent::Upstream(event.data)).await?;

            match event.event {
                UpstreamEvent::ResponseCreated { response } => {
                    self.remember_response(response.id);
                }
                UpstreamEvent::FunctionCallArgumentsDelta { item_id, delta } => {
                    turn.arguments.entry(item_id).or_default().push_str(&delta);
                }
                UpstreamEvent::OutputItemDone { item } => match item {
                    OutputItem::FunctionCall { id, call_id, name, arguments } => {
                        if !turn.handled_calls.insert(call_id.clone()) {
                            warn!(call_id = %call_id, "duplicate tool call id ignored");
                            continue;
                        }
                        let streamed = id.as_ref().and_then(|id| turn.arguments.remove(id));
                        let arguments = if arguments.is_empty() {
                            streamed.unwrap_or_default()
                        } else {
                            arguments
                        };

                        self.transition(ControllerState::ExecutingTools);
                        self.execute_tool_call(&call_id, &name, &arguments).await?;
                        turn.tool_calls += 1;
                        self.transition(ControllerState::StreamingDeltas);
                    }
                    OutputItem::Message { .. } => {
                        if let Some(text) = item.message_text().filter(|text| !text.is_empty()) {
                            self.conversation.record_assistant_text(text);
                        }
                    }
                    OutputItem::Reasoning => self.conversation.record_reasoning(),
                    OutputItem::Other => {}
                },
                UpstreamEvent::ResponseCompleted { response } => {
                    self.remember_response(response.id);
                    debug!(tool_calls = turn.tool_calls, "response completed");
                    return Ok(turn.tool_calls);
                }
                UpstreamEvent::ResponseFailed { response } => {
                    let detail = response
                        .error
                        .map(|error| error.to_string())
                        .unwrap_or_else(|| "response failed".to_owned());
                    return Err(LlmError::Upstream(detail).into());
                }
                UpstreamEvent::Error { code, message } => {
                    let detail = match (code, message) {
                        (Some(code), Some(message)) => format!("{code}: {message}"),
                        (None, Some(message)) => message,
                        (Some(code), None) => code,
                        (None, None) => "unspecified upstream error".to_owned(),
                    };
                    return Err(LlmError::Upstream(detail).into());
                }
                UpstreamEvent::OutputTextDelta { .. } | UpstreamEvent::Other => {}
            }
        }
    }

    async fn execute_tool_call(
        &mut self,
        call_id: &str,
        name: &str,
        arguments: &str,
    ) -> Result<(), SessionError> {
        self.conversation.record_tool_call(call_id, name, arguments);

        let ops = decode_tool_call(name, arguments).map_err(|source| SessionError::Decode {
            call_id: call_id.to_owned(),
            source,
        })?;
        let result = apply_batch(&mut self.graph, &ops).map_err(|source| {
            SessionError::Validation { call_id: call_id.to_owned(), source }
        })?;
        info!(
            call_id,
            applied = result.applied,
            rev = result.new_rev,
            nodes = self.graph.node_count(),
            edges = self.graph.edge_count(),
            "tool call applied"
        );

        let output = tool_output(&result, &self.graph);
        self.emit(OutboundEvent::ToolOutput { call_id: call_id.to_owned(), output: output.clone() })
            .await?;
        self.conversation.record_tool_output(call_id, output);
        Ok(())
    }

    async fn emit(&mut self, event: OutboundEvent) -> Result<(), SessionError> {
        self.sink.send(event).await.map_err(|_| SessionError::Cancelled)
    }

    fn remember_response(&mut self, response_id: Option<String>) {
        if let Some(response_id) = response_id {
            self.response_id = Some(response_id.clone());
            self.conversation.set_previous_response_id(Some(response_id));
        }
    }

    fn transition(&mut self, next: ControllerState) {
        if self.state != next {
            debug!(from = %self.state, to = %next, "state transition");
            self.state = next;
        }
    }
}

/// JSON string returned to the model for a successful batch.
pub fn tool_output(result: &ApplyResult, graph: &Graph) -> String {
    json!({
        "status": "ok",
        "applied": result.applied,
        "rev": result.new_rev,
        "delta": result.delta,
        "graph": graph.snapshot(),
    })
    .to_string()
}

/// Runs one session to completion. See [`Controller::run`].
pub async fn run_session(
    client: Arc<dyn ModelClient>,
    config: Arc<AgentConfig>,
    request: SessionRequest,
    sink: EventSink,
) -> Result<SessionOutcome, SessionError> {
    Controller::new(client, config, request, sink).run().await
}
