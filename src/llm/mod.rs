// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Cumulus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Cumulus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

pub mod client;
pub(crate) mod scripted;
pub mod sse;
pub mod types;

pub use client::{decode_event_stream, HttpModelClient, LlmError, ModelClient, ModelStream};
pub use sse::SseDecoder;
pub use types::{
    InputItem, OutputItem, ResponseInfo, ResponsesRequest, StreamEvent, ToolDefinition,
    UpstreamEvent,
};
