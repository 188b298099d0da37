// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Cumulus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Cumulus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

pub mod budget;
pub mod controller;
pub mod conversation;

pub use budget::TurnBudget;
pub use controller::{
    run_session, tool_output, Controller, ControllerState, SessionError, SessionOutcome,
    SessionRequest,
};
pub use conversation::{ChatMessage, Conversation, ConversationItem, Role};

#[cfg(test)]
mod tests;
