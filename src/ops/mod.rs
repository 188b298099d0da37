// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Cumulus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Cumulus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Graph mutation operations.
//!
//! A batch of operations is applied in order against a scratch copy of the graph and only
//! committed when every operation succeeds, so a rejected batch leaves the graph untouched.
//! Each committed batch bumps the graph revision and reports a minimal delta.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Serialize, Serializer};

use crate::model::{Edge, EdgeId, Graph, NodeData, NodeId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    AddNode {
        node_id: NodeId,
        parent_id: NodeId,
        data: NodeData,
    },
    DeleteNode {
        node_id: NodeId,
    },
    MoveNode {
        node_id: NodeId,
        new_parent_id: NodeId,
    },
    AddEdge {
        edge_id: EdgeId,
        source_id: NodeId,
        target_id: NodeId,
        label: Option<String>,
    },
    DeleteEdge {
        edge_id: EdgeId,
    },
    GroupNodes {
        node_ids: Vec<NodeId>,
        parent_id: NodeId,
        group_id: NodeId,
        style: Option<String>,
        icon: Option<String>,
    },
    RemoveGroup {
        group_id: NodeId,
    },
}

impl Op {
    pub fn kind(&self) -> OpKind {
        match self {
            Self::AddNode { .. } => OpKind::AddNode,
            Self::DeleteNode { .. } => OpKind::DeleteNode,
            Self::MoveNode { .. } => OpKind::MoveNode,
            Self::AddEdge { .. } => OpKind::AddEdge,
            Self::DeleteEdge { .. } => OpKind::DeleteEdge,
            Self::GroupNodes { .. } => OpKind::GroupNodes,
            Self::RemoveGroup { .. } => OpKind::RemoveGroup,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpKind {
    AddNode,
    DeleteNode,
    MoveNode,
    AddEdge,
    DeleteEdge,
    GroupNodes,
    RemoveGroup,
}

impl OpKind {
    pub const ALL: [OpKind; 7] = [
        OpKind::AddNode,
        OpKind::DeleteNode,
        OpKind::MoveNode,
        OpKind::AddEdge,
        OpKind::DeleteEdge,
        OpKind::GroupNodes,
        OpKind::RemoveGroup,
    ];

    /// Name used on the tool wire (`name` field of an operation).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AddNode => "add_node",
            Self::DeleteNode => "delete_node",
            Self::MoveNode => "move_node",
            Self::AddEdge => "add_edge",
            Self::DeleteEdge => "delete_edge",
            Self::GroupNodes => "group_nodes",
            Self::RemoveGroup => "remove_group",
        }
    }

    pub fn from_wire(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == name)
    }
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ObjectKind {
    Node,
    Edge,
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Node => f.write_str("node"),
            Self::Edge => f.write_str("edge"),
        }
    }
}

/// A changed graph object, rendered as `node:<id>` / `edge:<id>`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GraphRef {
    Node(NodeId),
    Edge(EdgeId),
}

impl fmt::Display for GraphRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Node(node_id) => write!(f, "node:{node_id}"),
            Self::Edge(edge_id) => write!(f, "edge:{edge_id}"),
        }
    }
}

impl Serialize for GraphRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyResult {
    pub new_rev: u64,
    pub applied: usize,
    pub delta: Delta,
}

/// Objects added/removed/updated by a batch. Moves and re-parenting count as updates.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Delta {
    pub added: Vec<GraphRef>,
    pub removed: Vec<GraphRef>,
    pub updated: Vec<GraphRef>,
}

impl Delta {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.updated.is_empty()
    }
}

#[derive(Debug, Default)]
struct DeltaBuilder {
    added: BTreeSet<GraphRef>,
    removed: BTreeSet<GraphRef>,
    updated: BTreeSet<GraphRef>,
}

impl DeltaBuilder {
    fn record_added(&mut self, object_ref: GraphRef) {
        // remove + re-add of the same id within one batch nets out to an update
        if self.removed.remove(&object_ref) {
            self.updated.insert(object_ref);
            return;
        }
        self.updated.remove(&object_ref);
        self.added.insert(object_ref);
    }

    fn record_removed(&mut self, object_ref: GraphRef) {
        self.updated.remove(&object_ref);
        if self.added.remove(&object_ref) {
            return;
        }
        self.removed.insert(object_ref);
    }

    fn record_updated(&mut self, object_ref: GraphRef) {
        if self.added.contains(&object_ref) || self.removed.contains(&object_ref) {
            return;
        }
        self.updated.insert(object_ref);
    }

    fn finish(self) -> Delta {
        Delta {
            added: self.added.into_iter().collect(),
            removed: self.removed.into_iter().collect(),
            updated: self.updated.into_iter().collect(),
        }
    }
}

/// Applies `ops` to `graph` atomically.
///
/// Operations run strictly in order, so later operations may reference ids created by earlier
/// ones. On the first failure the graph is left exactly as it was before the call.
pub fn apply_batch(graph: &mut Graph, ops: &[Op]) -> Result<ApplyResult, BatchError> {
    if ops.is_empty() {
        return Ok(ApplyResult { new_rev: graph.rev(), applied: 0, delta: Delta::default() });
    }

    let mut candidate = graph.clone();
    let mut delta = DeltaBuilder::default();

    for (index, op) in ops.iter().enumerate() {
        apply_op(&mut candidate, op, &mut delta).map_err(|error| BatchError {
            index,
            op_kind: op.kind(),
            error,
        })?;
    }

    debug_assert!(candidate.check_invariants().is_ok(), "batch broke graph invariants");

    candidate.bump_rev();
    *graph = candidate;

    Ok(ApplyResult { new_rev: graph.rev(), applied: ops.len(), delta: delta.finish() })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyError {
    AlreadyExists { kind: ObjectKind, id: String },
    NotFound { kind: ObjectKind, id: String },
    RootImmutable { op_kind: OpKind },
    Cycle { node_id: NodeId, new_parent_id: NodeId },
    NotUnderParent { node_id: NodeId, parent_id: NodeId },
    DuplicateGroupMember { node_id: NodeId },
    NotAGroup { node_id: NodeId },
    GroupHasEdges { group_id: NodeId, edge_id: EdgeId },
}

impl fmt::Display for ApplyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyExists { kind, id } => write!(f, "{kind} '{id}' already exists"),
            Self::NotFound { kind, id } => write!(f, "{kind} '{id}' does not exist"),
            Self::RootImmutable { op_kind } => write!(f, "{op_kind} cannot modify the root node"),
            Self::Cycle { node_id, new_parent_id } => write!(
                f,
                "cannot move '{node_id}' under '{new_parent_id}' (it is the node itself or one of its descendants)"
            ),
            Self::NotUnderParent { node_id, parent_id } => {
                write!(f, "node '{node_id}' is not inside '{parent_id}'")
            }
            Self::DuplicateGroupMember { node_id } => {
                write!(f, "node '{node_id}' is listed more than once")
            }
            Self::NotAGroup { node_id } => write!(f, "node '{node_id}' is not a group"),
            Self::GroupHasEdges { group_id, edge_id } => write!(
                f,
                "group '{group_id}' is an endpoint of edge '{edge_id}'; delete or re-target the edge first"
            ),
        }
    }
}

impl std::error::Error for ApplyError {}

/// A rejected batch: which operation failed and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchError {
    pub index: usize,
    pub op_kind: OpKind,
    pub error: ApplyError,
}

impl fmt::Display for BatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "operation #{} ({}) failed: {}", self.index, self.op_kind, self.error)
    }
}

impl std::error::Error for BatchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

// Extracted per-operation implementation.
include!("ops_impl.rs");
