// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Cumulus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Cumulus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Request/response types for a Responses-API style streaming endpoint.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::client::LlmError;

/// Request body for `POST {base_url}/responses`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponsesRequest {
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    pub input: Vec<InputItem>,
    pub tools: Vec<ToolDefinition>,
    pub stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_response_id: Option<String>,
}

/// A replayable conversation item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputItem {
    Message { role: String, content: String },
    FunctionCall { call_id: String, name: String, arguments: String },
    FunctionCallOutput { call_id: String, output: String },
}

impl InputItem {
    pub fn message(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self::Message { role: role.into(), content: content.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolDefinition {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

impl ToolDefinition {
    pub fn function(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: Value,
    ) -> Self {
        Self { kind: "function", name: name.into(), description: description.into(), parameters }
    }
}

/// Events of the upstream stream the controller acts on.
///
/// Everything else is [`UpstreamEvent::Other`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type")]
pub enum UpstreamEvent {
    #[serde(rename = "response.created")]
    ResponseCreated { response: ResponseInfo },
    #[serde(rename = "response.output_text.delta")]
    OutputTextDelta {
        #[serde(default)]
        delta: String,
    },
    #[serde(rename = "response.function_call_arguments.delta")]
    FunctionCallArgumentsDelta {
        item_id: String,
        #[serde(default)]
        delta: String,
    },
    #[serde(rename = "response.output_item.done")]
    OutputItemDone { item: OutputItem },
    #[serde(rename = "response.completed")]
    ResponseCompleted { response: ResponseInfo },
    #[serde(rename = "response.failed")]
    ResponseFailed { response: ResponseInfo },
    #[serde(rename = "error")]
    Error {
        #[serde(default)]
        code: Option<String>,
        #[serde(default)]
        message: Option<String>,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ResponseInfo {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub error: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutputItem {
    FunctionCall {
        #[serde(default)]
        id: Option<String>,
        call_id: String,
        name: String,
        #[serde(default)]
        arguments: String,
    },
    Message {
        #[serde(default)]
        content: Vec<MessageContent>,
    },
    Reasoning,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MessageContent {
    #[serde(default)]
    pub text: Option<String>,
}

impl OutputItem {
    /// Concatenated text of a `message` item.
    pub fn message_text(&self) -> Option<String> {
        match self {
            Self::Message { content } => {
                Some(content.iter().filter_map(|part| part.text.as_deref()).collect())
            }
            _ => None,
        }
    }
}

/// One upstream increment: the verbatim `data:` payload (mirrored to the caller) plus its typed
/// reading.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamEvent {
    pub data: String,
    pub event: UpstreamEvent,
}

impl StreamEvent {
    pub fn parse(data: &str) -> Result<Self, LlmError> {
        let raw: Value = serde_json::from_str(data)
            .map_err(|err| LlmError::InvalidResponse(format!("stream event is not JSON: {err}")))?;
        let event = UpstreamEvent::deserialize(&raw).map_err(|err| {
            LlmError::InvalidResponse(format!("malformed stream event: {err}"))
        })?;
        Ok(Self { data: data.to_owned(), event })
    }

    /// Builds an event from JSON, e.g. for scripted model clients.
    pub fn from_json(raw: &Value) -> Result<Self, LlmError> {
        Self::parse(&raw.to_string())
    }
}
