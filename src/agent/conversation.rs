// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Cumulus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Cumulus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::llm::InputItem;
use crate::model::Graph;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::System => "system",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A caller-supplied chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversationItem {
    /// Caller messages and tool results; sent upstream exactly once in continuation mode.
    Local(InputItem),
    /// Items the model produced (tool calls, assistant text). Replayed only without continuation.
    Model(InputItem),
    /// Reasoning trace of the current response. Dropped before the next request.
    Reasoning,
}

impl ConversationItem {
    fn input(&self) -> Option<&InputItem> {
        match self {
            Self::Local(item) | Self::Model(item) => Some(item),
            Self::Reasoning => None,
        }
    }
}

/// Ordered item log of one generation session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Conversation {
    items: Vec<ConversationItem>,
    sent: usize,
    previous_response_id: Option<String>,
}

impl Conversation {
    pub fn new(messages: impl IntoIterator<Item = ChatMessage>) -> Self {
        let mut conversation = Self::default();
        for message in messages {
            conversation.push_message(message);
        }
        conversation
    }

    /// Like [`Conversation::new`], but when `graph` already has content the first item tells the
    /// model what exists.
    pub fn with_graph_context(
        messages: impl IntoIterator<Item = ChatMessage>,
        graph: &Graph,
    ) -> Self {
        let mut conversation = Self::default();
        if !graph.is_empty() {
            let snapshot = serde_json::to_string(&graph.snapshot()).unwrap_or_default();
            conversation.push_message(ChatMessage::user(format!(
                "The diagram currently contains the following graph (JSON). Edit it in place; \
                 do not re-create nodes that already exist.\n{snapshot}"
            )));
        }
        for message in messages {
            conversation.push_message(message);
        }
        conversation
    }

    pub fn push_message(&mut self, message: ChatMessage) {
        let item = InputItem::message(message.role.as_str(), message.content);
        match message.role {
            Role::Assistant => self.items.push(ConversationItem::Model(item)),
            Role::User | Role::System => self.items.push(ConversationItem::Local(item)),
        }
    }

    pub fn record_assistant_text(&mut self, text: String) {
        let item = InputItem::message(Role::Assistant.as_str(), text);
        self.items.push(ConversationItem::Model(item));
    }

    pub fn record_tool_call(&mut self, call_id: &str, name: &str, arguments: &str) {
        self.items.push(ConversationItem::Model(InputItem::FunctionCall {
            call_id: call_id.to_owned(),
            name: name.to_owned(),
            arguments: arguments.to_owned(),
        }));
    }

    pub fn record_tool_output(&mut self, call_id: &str, output: String) {
        self.items.push(ConversationItem::Local(InputItem::FunctionCallOutput {
            call_id: call_id.to_owned(),
            output,
        }));
    }

    pub fn record_reasoning(&mut self) {
        self.items.push(ConversationItem::Reasoning);
    }

    /// Removes reasoning traces; they are not valid to replay.
    pub fn drop_transient(&mut self) {
        let dropped_before_sent = self.items[..self.sent]
            .iter()
            .filter(|item| matches!(item, ConversationItem::Reasoning))
            .count();
        self.items.retain(|item| !matches!(item, ConversationItem::Reasoning));
        self.sent -= dropped_before_sent;
    }

    pub fn items(&self) -> &[ConversationItem] {
        &self.items
    }

    pub fn previous_response_id(&self) -> Option<&str> {
        self.previous_response_id.as_deref()
    }

    pub fn set_previous_response_id(&mut self, response_id: Option<String>) {
        if response_id.is_some() {
            self.previous_response_id = response_id;
        }
    }

    /// Every persistent item, for requests that resend the whole history.
    pub fn full_input(&self) -> Vec<InputItem> {
        self.items.iter().filter_map(ConversationItem::input).cloned().collect()
    }

    /// Local items added since the last request, for continuation requests.
    pub fn pending_input(&self) -> Vec<InputItem> {
        self.items[self.sent..]
            .iter()
            .filter_map(|item| match item {
                ConversationItem::Local(item) => Some(item.clone()),
                _ => None,
            })
            .collect()
    }

    /// Input and `previous_response_id` for the next request.
    ///
    /// Falls back to the full history when continuation is off or no response id is known yet.
    pub fn next_input(&self, continuation: bool) -> (Vec<InputItem>, Option<String>) {
        match (continuation, self.previous_response_id.as_ref()) {
            (true, Some(response_id)) => (self.pending_input(), Some(response_id.clone())),
            _ => (self.full_input(), None),
        }
    }

    pub fn mark_sent(&mut self) {
        self.sent = self.items.len();
    }
}
