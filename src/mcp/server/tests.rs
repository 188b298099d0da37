// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Cumulus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Cumulus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use super::*;
use crate::model::fixtures::{architecture_graph, nid};
use crate::tool::{WireNodeData, WireOp};

fn add_node(node_id: &str, parent_id: &str) -> WireOp {
    WireOp::AddNode {
        nodename: node_id.to_owned(),
        parent_id: parent_id.to_owned(),
        data: Some(WireNodeData {
            label: Some(node_id.to_uppercase()),
            ..WireNodeData::default()
        }),
    }
}

fn batch(operations: Vec<WireOp>) -> Parameters<GraphBatchUpdateParams> {
    Parameters(GraphBatchUpdateParams { base_rev: None, operations })
}

#[tokio::test]
async fn read_returns_snapshot_and_counts() {
    let server = CumulusMcp::new(architecture_graph());
    let Json(read) = server.graph_read().await.expect("read");

    assert_eq!(read.rev, 0);
    assert_eq!(read.node_count, 5);
    assert_eq!(read.edge_count, 3);
    assert_eq!(read.graph, architecture_graph().snapshot());
}

#[tokio::test]
async fn batch_update_applies_and_reports_delta() {
    let server = CumulusMcp::new(architecture_graph());
    let Json(response) = server
        .graph_batch_update(batch(vec![
            add_node("cache", "vpc"),
            WireOp::AddEdge {
                edge_id: "app-cache".to_owned(),
                source_id: "app".to_owned(),
                target_id: "cache".to_owned(),
                label: None,
            },
        ]))
        .await
        .expect("batch_update");

    assert_eq!(response.rev, 1);
    assert_eq!(response.applied, 2);
    assert_eq!(response.delta.added, vec!["node:cache".to_owned(), "edge:app-cache".to_owned()]);
    assert!(response.delta.removed.is_empty());

    let graph = server.graph.lock().await;
    assert_eq!(graph.parent_of(&nid("cache")), Some(&nid("vpc")));
}

#[tokio::test]
async fn stale_base_rev_is_a_conflict() {
    let server = CumulusMcp::new(architecture_graph());
    let err = match server
        .graph_batch_update(Parameters(GraphBatchUpdateParams {
            base_rev: Some(7),
            operations: vec![add_node("cache", "root")],
        }))
        .await
    {
        Ok(_) => panic!("expected conflict error"),
        Err(err) => err,
    };

    assert_eq!(err.code, rmcp::model::ErrorCode::INVALID_REQUEST);
    let data = err.data.expect("error data");
    assert_eq!(data["current_rev"].as_u64(), Some(0));
    assert_eq!(data["snapshot_tool"].as_str(), Some("graph.read"));
}

#[tokio::test]
async fn missing_reference_maps_to_resource_not_found_and_keeps_graph() {
    let server = CumulusMcp::new(architecture_graph());
    let err = match server
        .graph_batch_update(batch(vec![
            add_node("cache", "root"),
            WireOp::DeleteNode { node_id: "ghost".to_owned() },
        ]))
        .await
    {
        Ok(_) => panic!("expected not found error"),
        Err(err) => err,
    };

    assert_eq!(err.code, rmcp::model::ErrorCode::RESOURCE_NOT_FOUND);
    let data = err.data.expect("error data");
    assert_eq!(data["index"].as_u64(), Some(1));
    assert_eq!(data["id"].as_str(), Some("ghost"));

    let graph = server.graph.lock().await;
    assert_eq!(graph.rev(), 0);
    assert!(!graph.contains_node(&nid("cache")));
}

#[tokio::test]
async fn duplicate_node_maps_to_invalid_params() {
    let server = CumulusMcp::new(architecture_graph());
    let err = match server.graph_batch_update(batch(vec![add_node("db", "root")])).await {
        Ok(_) => panic!("expected already exists error"),
        Err(err) => err,
    };
    assert_eq!(err.code, rmcp::model::ErrorCode::INVALID_PARAMS);
}

#[tokio::test]
async fn invalid_id_is_rejected_before_touching_the_graph() {
    let server = CumulusMcp::new(Graph::new());
    let err = match server.graph_batch_update(batch(vec![add_node("", "root")])).await {
        Ok(_) => panic!("expected invalid id error"),
        Err(err) => err,
    };

    assert_eq!(err.code, rmcp::model::ErrorCode::INVALID_PARAMS);
    let data = err.data.expect("error data");
    assert_eq!(data["field"].as_str(), Some("nodename"));
    assert!(server.graph.lock().await.is_empty());
}

#[tokio::test]
async fn reset_clears_graph_and_advances_rev() {
    let server = CumulusMcp::new(architecture_graph());
    server.graph_batch_update(batch(vec![add_node("cache", "root")])).await.expect("batch_update");

    let Json(reset) = server.graph_reset().await.expect("reset");
    assert_eq!(reset.rev, 2);

    let Json(read) = server.graph_read().await.expect("read");
    assert_eq!(read.rev, 2);
    assert_eq!(read.node_count, 0);
    assert!(read.graph.children.is_empty());
}

#[test]
fn server_info_lists_graph_tools() {
    let info = CumulusMcp::new(Graph::new()).get_info();
    let instructions = info.instructions.expect("instructions");
    for tool in ["graph.read", "graph.batch_update", "graph.reset"] {
        assert!(instructions.contains(tool));
    }
}
