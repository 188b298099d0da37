// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Cumulus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Cumulus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::time::Duration;

use crate::stream::DEFAULT_CHANNEL_CAPACITY;

pub const DEFAULT_MODEL: &str = "gpt-4.1";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MAX_TURNS: u32 = 3;
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(60);
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

pub const DEFAULT_INSTRUCTIONS: &str = "You are a cloud architect drawing architecture diagrams. \
Build the diagram the user describes by calling the batch_update tool with an ordered list of \
operations. Use short, stable, kebab-case node ids and put top-level nodes under \"root\". Group \
related resources (VPCs, subnets, regions, tiers) with group_nodes. Prefer one batch per logical \
step. When the diagram is complete, reply with a short summary and do not call any tool.";

/// Appended to the instructions once the turn budget is used up.
pub const FINAL_TURN_ADVISORY: &str = "This is your final turn. Finish any edit that is still \
needed in a single batch_update call, or stop calling tools and summarise the diagram.";

/// Runtime settings of a generation session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentConfig {
    pub model: String,
    pub base_url: String,
    pub api_key: Option<String>,
    /// Soft budget: reaching it only adds an advisory to the instructions.
    pub max_turns: u32,
    /// Longest wait for the next upstream increment.
    pub idle_timeout: Duration,
    pub connect_timeout: Duration,
    /// Thread `previous_response_id` instead of resending the whole conversation.
    pub continuation: bool,
    pub instructions: String,
    pub channel_capacity: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_owned(),
            base_url: DEFAULT_BASE_URL.to_owned(),
            api_key: None,
            max_turns: DEFAULT_MAX_TURNS,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            continuation: true,
            instructions: DEFAULT_INSTRUCTIONS.to_owned(),
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

impl AgentConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds a config from an arbitrary variable lookup. Unparseable values keep their default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let text =
            |name: &str| lookup(name).map(|raw| raw.trim().to_owned()).filter(|v| !v.is_empty());

        Self {
            model: text("CUMULUS_MODEL").unwrap_or(defaults.model),
            base_url: text("CUMULUS_BASE_URL").unwrap_or(defaults.base_url),
            api_key: text(API_KEY_ENV),
            max_turns: text("CUMULUS_MAX_TURNS")
                .and_then(|raw| raw.parse::<u32>().ok())
                .filter(|turns| *turns > 0)
                .unwrap_or(defaults.max_turns),
            idle_timeout: text("CUMULUS_IDLE_TIMEOUT_SECS")
                .and_then(|raw| raw.parse::<u64>().ok())
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.idle_timeout),
            connect_timeout: defaults.connect_timeout,
            continuation: text("CUMULUS_CONTINUATION")
                .and_then(|raw| parse_flag(&raw))
                .unwrap_or(defaults.continuation),
            instructions: defaults.instructions,
            channel_capacity: defaults.channel_capacity,
        }
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
