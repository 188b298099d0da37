// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Cumulus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Cumulus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

#![cfg(test)]

//! In-memory [`ModelClient`] that replays canned responses, one per request.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use futures_util::stream::{self, StreamExt};
use serde_json::{json, Value};

use super::client::{LlmError, ModelClient, ModelStream};
use super::types::{ResponsesRequest, StreamEvent};

/// One scripted response: a list of stream items.
pub(crate) type Script = Vec<Result<Value, String>>;

#[derive(Debug, Default)]
pub(crate) struct ScriptedModel {
    scripts: Mutex<VecDeque<Script>>,
    requests: Mutex<Vec<ResponsesRequest>>,
}

impl ScriptedModel {
    pub(crate) fn new(scripts: impl IntoIterator<Item = Script>) -> Self {
        Self { scripts: Mutex::new(scripts.into_iter().collect()), requests: Mutex::default() }
    }

    pub(crate) fn requests(&self) -> Vec<ResponsesRequest> {
        self.requests.lock().expect("requests lock").clone()
    }
}

#[async_trait]
impl ModelClient for ScriptedModel {
    async fn stream(&self, request: &ResponsesRequest) -> Result<ModelStream, LlmError> {
        self.requests.lock().expect("requests lock").push(request.clone());
        let script = self
            .scripts
            .lock()
            .expect("scripts lock")
            .pop_front()
            .ok_or_else(|| LlmError::Upstream("script exhausted".to_owned()))?;

        let items = script
            .into_iter()
            .map(|item| match item {
                Ok(value) => StreamEvent::from_json(&value),
                Err(message) => Err(LlmError::Upstream(message)),
            })
            .collect::<Vec<_>>();
        Ok(stream::iter(items).boxed())
    }
}

pub(crate) fn created(response_id: &str) -> Result<Value, String> {
    Ok(json!({"type": "response.created", "response": {"id": response_id, "status": "in_progress"}}))
}

pub(crate) fn text_delta(delta: &str) -> Result<Value, String> {
    Ok(json!({"type": "response.output_text.delta", "item_id": "msg_1", "delta": delta}))
}

pub(crate) fn message_done(text: &str) -> Result<Value, String> {
    Ok(json!({
        "type": "response.output_item.done",
        "item": {"type": "message", "role": "assistant", "content": [{"type": "output_text", "text": text}]}
    }))
}

pub(crate) fn reasoning_done() -> Result<Value, String> {
    Ok(json!({"type": "response.output_item.done", "item": {"type": "reasoning", "id": "rs_1", "summary": []}}))
}

pub(crate) fn args_delta(item_id: &str, delta: &str) -> Result<Value, String> {
    Ok(json!({"type": "response.function_call_arguments.delta", "item_id": item_id, "delta": delta}))
}

/// A completed `batch_update` call carrying its full arguments.
pub(crate) fn tool_call(call_id: &str, arguments: &Value) -> Result<Value, String> {
    named_call(&format!("fc_{call_id}"), call_id, "batch_update", &arguments.to_string())
}

pub(crate) fn named_call(
    item_id: &str,
    call_id: &str,
    name: &str,
    arguments: &str,
) -> Result<Value, String> {
    Ok(json!({
        "type": "response.output_item.done",
        "item": {"type": "function_call", "id": item_id, "call_id": call_id, "name": name, "arguments": arguments}
    }))
}

pub(crate) fn completed(response_id: &str) -> Result<Value, String> {
    Ok(json!({"type": "response.completed", "response": {"id": response_id, "status": "completed"}}))
}
