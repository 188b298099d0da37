// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Cumulus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Cumulus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Cumulus: an LLM agent that draws cloud architecture diagrams.
//!
//! The model edits a [`model::Graph`] through one tool, `batch_update`, whose operation batches
//! are applied atomically by [`ops::apply_batch`]. [`agent::run_session`] drives the conversation
//! loop and mirrors everything onto a [`stream`] channel that [`server`] serves as SSE.

pub mod agent;
pub mod config;
pub mod llm;
pub mod mcp;
pub mod model;
pub mod ops;
pub mod server;
pub mod stream;
pub mod tool;
