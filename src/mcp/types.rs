// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Cumulus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Cumulus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::model::GraphSnapshot;
use crate::tool::WireOp;

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct GraphBatchUpdateParams {
    /// Revision the operations were written against; a stale value is rejected as a conflict.
    #[serde(default)]
    pub base_rev: Option<u64>,
    pub operations: Vec<WireOp>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DeltaSummary {
    pub added: Vec<String>,
    pub removed: Vec<String>,
    pub updated: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GraphReadResponse {
    pub rev: u64,
    pub node_count: u64,
    pub edge_count: u64,
    pub graph: GraphSnapshot,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GraphBatchUpdateResponse {
    pub rev: u64,
    pub applied: u64,
    pub delta: DeltaSummary,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GraphResetResponse {
    pub rev: u64,
}
