// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Cumulus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Cumulus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use crate::config::FINAL_TURN_ADVISORY;

/// Soft turn budget.
///
/// The budget never stops the loop. Once the last budgeted turn is reached it asks the model to
/// wrap up; the session still ends only when a response carries no tool calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnBudget {
    max_turns: u32,
    turn: u32,
    advise_final: bool,
}

impl TurnBudget {
    pub fn new(max_turns: u32) -> Self {
        Self { max_turns: max_turns.max(1), turn: 1, advise_final: false }
    }

    /// 1-based number of the current turn.
    pub fn turn(&self) -> u32 {
        self.turn
    }

    pub fn max_turns(&self) -> u32 {
        self.max_turns
    }

    /// Moves to the next turn. Only called when a response produced tool calls.
    pub fn advance(&mut self) {
        self.turn = self.turn.saturating_add(1);
        self.advise_final = self.turn >= self.max_turns;
    }

    pub fn is_final_turn(&self) -> bool {
        self.advise_final
    }

    pub fn instructions(&self, base: &str) -> String {
        if self.advise_final {
            format!("{base}\n\n{FINAL_TURN_ADVISORY}")
        } else {
            base.to_owned()
        }
    }
}
