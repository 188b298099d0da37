// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Cumulus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Cumulus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Outbound event channel of a generation session.
//!
//! Mirrored upstream increments, tool results and the terminal event share one ordered, bounded
//! channel. The sink closes itself after the first terminal event, so a consumer always sees
//! exactly one `done` or `error` as the last event.

use std::fmt;

use futures_util::stream::{self, Stream};
use serde::Serialize;
use serde_json::{json, Value};
use tokio::sync::mpsc;

use crate::model::GraphSnapshot;

pub const DONE_SENTINEL: &str = "[DONE]";

/// Default number of buffered events before the producer waits for the consumer.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Decode,
    Validation,
    Transport,
    Protocol,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Decode => f.write_str("decode"),
            Self::Validation => f.write_str("validation"),
            Self::Transport => f.write_str("transport"),
            Self::Protocol => f.write_str("protocol"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum OutboundEvent {
    /// A verbatim upstream increment (the original `data:` payload).
    Upstream(String),
    /// Result of one executed tool call; `output` is itself a JSON string.
    ToolOutput { call_id: String, output: String },
    Done { response_id: Option<String>, turns: u32, graph: GraphSnapshot },
    Error { kind: ErrorKind, message: String },
}

impl OutboundEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done { .. } | Self::Error { .. })
    }

    /// JSON body of the event. Upstream payloads that are not JSON come back as a string.
    pub fn to_json(&self) -> Value {
        match self {
            Self::Upstream(data) => {
                serde_json::from_str(data).unwrap_or_else(|_| Value::String(data.clone()))
            }
            Self::ToolOutput { call_id, output } => json!({
                "type": "function_call_output",
                "call_id": call_id,
                "output": output,
            }),
            Self::Done { response_id, turns, graph } => json!({
                "type": "done",
                "response_id": response_id,
                "turns": turns,
                "graph": graph,
            }),
            Self::Error { kind, message } => json!({
                "type": "error",
                "error": { "kind": kind, "message": message },
            }),
        }
    }

    /// `data:` payloads of this event; `done` is followed by the `[DONE]` sentinel.
    pub fn payloads(&self) -> Vec<String> {
        let first = match self {
            Self::Upstream(data) => data.clone(),
            other => other.to_json().to_string(),
        };
        let mut out = vec![first];
        if matches!(self, Self::Done { .. }) {
            out.push(DONE_SENTINEL.to_owned());
        }
        out
    }

    /// Wire form: one `data: <json>\n\n` frame per payload.
    pub fn encode(&self) -> String {
        self.payloads().iter().map(|payload| encode_frame(payload)).collect()
    }
}

/// One SSE frame. A payload spanning several lines becomes one `data:` field per line.
pub fn encode_frame(payload: &str) -> String {
    let mut frame = String::with_capacity(payload.len() + 8);
    for line in payload.split('\n') {
        frame.push_str("data: ");
        frame.push_str(line);
        frame.push('\n');
    }
    frame.push('\n');
    frame
}

/// The consumer went away (or the sink already sent its terminal event).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelClosed;

impl fmt::Display for ChannelClosed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("event channel is closed")
    }
}

impl std::error::Error for ChannelClosed {}

/// Producer half, owned by the session controller.
#[derive(Debug)]
pub struct EventSink {
    tx: Option<mpsc::Sender<OutboundEvent>>,
}

/// Consumer half, handed to the transport.
#[derive(Debug)]
pub struct EventReceiver {
    rx: mpsc::Receiver<OutboundEvent>,
}

pub fn channel(capacity: usize) -> (EventSink, EventReceiver) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (EventSink { tx: Some(tx) }, EventReceiver { rx })
}

impl EventSink {
    /// Sends one event, waiting while the consumer is behind.
    pub async fn send(&mut self, event: OutboundEvent) -> Result<(), ChannelClosed> {
        let Some(tx) = self.tx.as_ref() else {
            return Err(ChannelClosed);
        };
        let terminal = event.is_terminal();
        if tx.send(event).await.is_err() {
            self.tx = None;
            return Err(ChannelClosed);
        }
        if terminal {
            self.tx = None;
        }
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.tx.as_ref().map_or(true, mpsc::Sender::is_closed)
    }

    /// Resolves once the consumer has dropped its half.
    pub async fn closed(&self) {
        if let Some(tx) = self.tx.as_ref() {
            tx.closed().await;
        }
    }
}

impl EventReceiver {
    pub async fn recv(&mut self) -> Option<OutboundEvent> {
        self.rx.recv().await
    }

    pub fn into_stream(self) -> impl Stream<Item = OutboundEvent> + Send + 'static {
        stream::unfold(self.rx, |mut rx| async move { rx.recv().await.map(|event| (event, rx)) })
    }

    /// Drains every remaining event into the wire log.
    pub async fn into_frame_log(mut self) -> String {
        let mut log = String::new();
        while let Some(event) = self.rx.recv().await {
            log.push_str(&event.encode());
        }
        log
    }
}
