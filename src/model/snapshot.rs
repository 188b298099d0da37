// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Cumulus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Cumulus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Nested JSON form of a [`Graph`], as seen by the model, the caller, and MCP clients.

use std::collections::BTreeSet;
use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::graph::{Edge, Graph, NodeData};
use super::ids::{EdgeId, Id, IdError, NodeId, ROOT_NODE_ID};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct GraphSnapshot {
    pub id: String,
    #[serde(default)]
    pub children: Vec<SnapshotNode>,
    #[serde(default)]
    pub edges: Vec<SnapshotEdge>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SnapshotNode {
    pub id: String,
    #[serde(default)]
    pub data: SnapshotNodeData,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<SnapshotNode>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotNodeData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_group: bool,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotEdge {
    pub id: String,
    pub source_id: String,
    pub target_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl From<&NodeData> for SnapshotNodeData {
    fn from(data: &NodeData) -> Self {
        Self {
            label: data.label().map(ToOwned::to_owned),
            icon: data.icon().map(ToOwned::to_owned),
            style: data.style().map(ToOwned::to_owned),
            is_group: data.is_group(),
            attributes: data.attributes().clone(),
        }
    }
}

impl From<&SnapshotNodeData> for NodeData {
    fn from(data: &SnapshotNodeData) -> Self {
        let mut out = NodeData::new(data.label.clone(), data.icon.clone(), data.style.clone())
            .with_attributes(data.attributes.clone());
        out.set_group(data.is_group);
        out
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotError {
    NotRooted { id: String },
    InvalidId { id: String, reason: IdError },
    ReservedRootId,
    DuplicateNode { id: String },
    DuplicateEdge { id: String },
    MissingEndpoint { edge_id: String, node_id: String },
}

impl fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotRooted { id } => {
                write!(f, "snapshot must be rooted at '{ROOT_NODE_ID}' (found '{id}')")
            }
            Self::InvalidId { id, reason } => write!(f, "invalid id '{id}': {reason}"),
            Self::ReservedRootId => write!(f, "'{ROOT_NODE_ID}' cannot be used as a node id"),
            Self::DuplicateNode { id } => write!(f, "duplicate node id '{id}'"),
            Self::DuplicateEdge { id } => write!(f, "duplicate edge id '{id}'"),
            Self::MissingEndpoint { edge_id, node_id } => {
                write!(f, "edge '{edge_id}' refers to missing node '{node_id}'")
            }
        }
    }
}

impl std::error::Error for SnapshotError {}

impl Graph {
    pub fn snapshot(&self) -> GraphSnapshot {
        GraphSnapshot {
            id: ROOT_NODE_ID.to_owned(),
            children: self
                .root_children()
                .iter()
                .filter_map(|child_id| self.snapshot_node(child_id))
                .collect(),
            edges: self
                .edges()
                .iter()
                .map(|(edge_id, edge)| SnapshotEdge {
                    id: edge_id.to_string(),
                    source_id: edge.source_id().to_string(),
                    target_id: edge.target_id().to_string(),
                    label: edge.label().map(ToOwned::to_owned),
                })
                .collect(),
        }
    }

    fn snapshot_node(&self, node_id: &NodeId) -> Option<SnapshotNode> {
        let node = self.node(node_id)?;
        Some(SnapshotNode {
            id: node_id.to_string(),
            data: SnapshotNodeData::from(node.data()),
            children: node
                .children()
                .iter()
                .filter_map(|child_id| self.snapshot_node(child_id))
                .collect(),
        })
    }

    /// Rebuilds a graph from a snapshot, rejecting anything that would break the model invariants.
    pub fn from_snapshot(snapshot: &GraphSnapshot) -> Result<Self, SnapshotError> {
        if snapshot.id != ROOT_NODE_ID {
            return Err(SnapshotError::NotRooted { id: snapshot.id.clone() });
        }

        let mut graph = Graph::new();
        let mut seen = BTreeSet::new();
        let mut stack = snapshot
            .children
            .iter()
            .rev()
            .map(|node| (NodeId::root(), node))
            .collect::<Vec<_>>();

        while let Some((parent_id, node)) = stack.pop() {
            let node_id: NodeId = parse_snapshot_id(&node.id)?;
            if node_id.is_root() {
                return Err(SnapshotError::ReservedRootId);
            }
            if !seen.insert(node_id.clone()) {
                return Err(SnapshotError::DuplicateNode { id: node.id.clone() });
            }
            graph.attach(node_id.clone(), &parent_id, NodeData::from(&node.data));
            stack.extend(node.children.iter().rev().map(|child| (node_id.clone(), child)));
        }

        for edge in &snapshot.edges {
            let edge_id: EdgeId = parse_snapshot_id(&edge.id)?;
            if graph.contains_edge(&edge_id) {
                return Err(SnapshotError::DuplicateEdge { id: edge.id.clone() });
            }
            let source_id: NodeId = parse_snapshot_id(&edge.source_id)?;
            let target_id: NodeId = parse_snapshot_id(&edge.target_id)?;
            for endpoint in [&source_id, &target_id] {
                if !graph.contains_node(endpoint) {
                    return Err(SnapshotError::MissingEndpoint {
                        edge_id: edge.id.clone(),
                        node_id: endpoint.to_string(),
                    });
                }
            }
            graph.insert_edge(edge_id, Edge::new_with(source_id, target_id, edge.label.clone()));
        }

        Ok(graph)
    }
}

fn parse_snapshot_id<T>(value: &str) -> Result<Id<T>, SnapshotError> {
    Id::new(value.to_owned())
        .map_err(|reason| SnapshotError::InvalidId { id: value.to_owned(), reason })
}
