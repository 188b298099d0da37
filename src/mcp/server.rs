// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Cumulus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Cumulus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::sync::Arc;

use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::{Json, Parameters};
use rmcp::model::{ServerCapabilities, ServerInfo};
use rmcp::{tool, tool_handler, tool_router, ErrorData, ServerHandler, ServiceExt};
use tokio::sync::Mutex;
use tracing::info;

use crate::model::Graph;
use crate::ops::{apply_batch, ApplyError, BatchError, Delta, GraphRef};
use crate::tool::{wire_op_to_internal, DecodeError};

use super::types::*;

#[derive(Clone)]
pub struct CumulusMcp {
    graph: Arc<Mutex<Graph>>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl CumulusMcp {
    pub fn new(graph: Graph) -> Self {
        Self { graph: Arc::new(Mutex::new(graph)), tool_router: Self::tool_router() }
    }

    pub async fn serve_stdio(self) -> Result<(), rmcp::RmcpError> {
        let service = self.serve((tokio::io::stdin(), tokio::io::stdout())).await?;
        service.waiting().await?;
        Ok(())
    }

    /// Current diagram: revision, counts and the nested snapshot.
    #[tool(name = "graph.read")]
    async fn graph_read(&self) -> Result<Json<GraphReadResponse>, ErrorData> {
        let graph = self.graph.lock().await;
        Ok(Json(GraphReadResponse {
            rev: graph.rev(),
            node_count: graph.node_count() as u64,
            edge_count: graph.edge_count() as u64,
            graph: graph.snapshot(),
        }))
    }

    /// Apply an ordered batch of edits atomically (same operations as the `batch_update` model
    /// tool). Pass `base_rev` from `graph.read` to guard against concurrent edits.
    #[tool(name = "graph.batch_update")]
    async fn graph_batch_update(
        &self,
        params: Parameters<GraphBatchUpdateParams>,
    ) -> Result<Json<GraphBatchUpdateResponse>, ErrorData> {
        let GraphBatchUpdateParams { base_rev, operations } = params.0;
        let ops = operations
            .iter()
            .enumerate()
            .map(|(index, op)| wire_op_to_internal(index, op))
            .collect::<Result<Vec<_>, _>>()
            .map_err(map_decode_error)?;

        let mut graph = self.graph.lock().await;
        if let Some(base_rev) = base_rev {
            let current_rev = graph.rev();
            if base_rev != current_rev {
                return Err(ErrorData::invalid_request(
                    "conflict: stale base_rev",
                    Some(serde_json::json!({
                        "base_rev": base_rev,
                        "current_rev": current_rev,
                        "snapshot_tool": "graph.read",
                    })),
                ));
            }
        }

        let result = apply_batch(&mut graph, &ops).map_err(map_batch_error)?;
        info!(applied = result.applied, rev = result.new_rev, "mcp batch applied");

        Ok(Json(GraphBatchUpdateResponse {
            rev: result.new_rev,
            applied: result.applied as u64,
            delta: delta_summary(&result.delta),
        }))
    }

    /// Discard the diagram and start over from an empty graph. The revision keeps counting.
    #[tool(name = "graph.reset")]
    async fn graph_reset(&self) -> Result<Json<GraphResetResponse>, ErrorData> {
        let mut graph = self.graph.lock().await;
        let rev = graph.rev() + 1;
        *graph = Graph::new();
        graph.set_rev(rev);
        Ok(Json(GraphResetResponse { rev }))
    }
}

#[tool_handler]
impl ServerHandler for CumulusMcp {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Cumulus architecture diagram server \
                 (tools: graph.read, graph.batch_update, graph.reset)"
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

// Error and delta mapping for the tool handlers.
include!("server/helpers.rs");

#[cfg(test)]
mod tests;
