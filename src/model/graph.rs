// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Cumulus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Cumulus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde_json::{Map, Value};

use super::ids::{EdgeId, NodeId};

/// Hierarchical architecture diagram: a tree of nodes under `root` plus a flat edge set.
///
/// The tree is stored bidirectionally (`parent` on the child, ordered `children` on the parent).
/// Structural edits go through the crate-private primitives below so both directions stay in sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Graph {
    nodes: BTreeMap<NodeId, Node>,
    edges: BTreeMap<EdgeId, Edge>,
    rev: u64,
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

impl Graph {
    pub fn new() -> Self {
        let mut nodes = BTreeMap::new();
        nodes.insert(NodeId::root(), Node::container_root());
        Self { nodes, edges: BTreeMap::new(), rev: 0 }
    }

    pub fn rev(&self) -> u64 {
        self.rev
    }

    pub(crate) fn bump_rev(&mut self) {
        self.rev = self.rev.saturating_add(1);
    }

    pub(crate) fn set_rev(&mut self, rev: u64) {
        self.rev = rev;
    }

    /// True when nothing but the synthetic root exists.
    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1 && self.edges.is_empty()
    }

    /// Number of nodes, not counting the synthetic root.
    pub fn node_count(&self) -> usize {
        self.nodes.len().saturating_sub(1)
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn node(&self, node_id: &NodeId) -> Option<&Node> {
        self.nodes.get(node_id)
    }

    pub fn contains_node(&self, node_id: &NodeId) -> bool {
        self.nodes.contains_key(node_id)
    }

    pub fn nodes(&self) -> &BTreeMap<NodeId, Node> {
        &self.nodes
    }

    pub fn edge(&self, edge_id: &EdgeId) -> Option<&Edge> {
        self.edges.get(edge_id)
    }

    pub fn contains_edge(&self, edge_id: &EdgeId) -> bool {
        self.edges.contains_key(edge_id)
    }

    pub fn edges(&self) -> &BTreeMap<EdgeId, Edge> {
        &self.edges
    }

    pub fn root_children(&self) -> &[NodeId] {
        self.nodes.get(&NodeId::root()).map(|root| root.children()).unwrap_or(&[])
    }

    pub fn parent_of(&self, node_id: &NodeId) -> Option<&NodeId> {
        self.nodes.get(node_id).and_then(Node::parent)
    }

    /// Every node strictly below `node_id`, in pre-order (display order).
    pub fn descendants(&self, node_id: &NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let Some(node) = self.nodes.get(node_id) else {
            return out;
        };

        let mut stack = node.children().iter().rev().cloned().collect::<Vec<_>>();
        while let Some(current) = stack.pop() {
            if let Some(child) = self.nodes.get(&current) {
                stack.extend(child.children().iter().rev().cloned());
            }
            out.push(current);
        }
        out
    }

    /// `node_id` and all of its descendants.
    pub fn subtree(&self, node_id: &NodeId) -> Vec<NodeId> {
        if !self.nodes.contains_key(node_id) {
            return Vec::new();
        }
        let mut out = vec![node_id.clone()];
        out.extend(self.descendants(node_id));
        out
    }

    /// True when `ancestor` is a strict ancestor of `node_id` (walks the parent chain).
    pub fn is_ancestor(&self, ancestor: &NodeId, node_id: &NodeId) -> bool {
        let mut current = self.parent_of(node_id);
        let mut hops = 0usize;
        while let Some(parent) = current {
            if parent == ancestor {
                return true;
            }
            hops += 1;
            if hops > self.nodes.len() {
                return false;
            }
            current = self.parent_of(parent);
        }
        false
    }

    /// Edges with at least one endpoint in `node_ids`.
    pub fn edges_touching(&self, node_ids: &BTreeSet<NodeId>) -> Vec<EdgeId> {
        self.edges
            .iter()
            .filter(|(_, edge)| {
                node_ids.contains(edge.source_id()) || node_ids.contains(edge.target_id())
            })
            .map(|(edge_id, _)| edge_id.clone())
            .collect()
    }

    /// Inserts `node_id` as the last child of `parent_id`.
    ///
    /// Callers must have checked that `node_id` is fresh and `parent_id` exists.
    pub(crate) fn attach(&mut self, node_id: NodeId, parent_id: &NodeId, data: NodeData) {
        self.attach_at(node_id, parent_id, None, data);
    }

    pub(crate) fn attach_at(
        &mut self,
        node_id: NodeId,
        parent_id: &NodeId,
        position: Option<usize>,
        data: NodeData,
    ) {
        if let Some(parent) = self.nodes.get_mut(parent_id) {
            insert_child(&mut parent.children, node_id.clone(), position);
        }
        self.nodes.insert(
            node_id,
            Node { parent: Some(parent_id.clone()), children: Vec::new(), data },
        );
    }

    /// Moves `node_id` (with its subtree) under `new_parent_id`.
    ///
    /// Callers must have ruled out cycles; `position: None` appends.
    pub(crate) fn reparent(
        &mut self,
        node_id: &NodeId,
        new_parent_id: &NodeId,
        position: Option<usize>,
    ) {
        let old_parent_id = self.parent_of(node_id).cloned();
        if let Some(old_parent_id) = old_parent_id {
            if let Some(old_parent) = self.nodes.get_mut(&old_parent_id) {
                old_parent.children.retain(|child| child != node_id);
            }
        }
        if let Some(new_parent) = self.nodes.get_mut(new_parent_id) {
            insert_child(&mut new_parent.children, node_id.clone(), position);
        }
        if let Some(node) = self.nodes.get_mut(node_id) {
            node.parent = Some(new_parent_id.clone());
        }
    }

    /// Removes `node_id` and its whole subtree. Returns the removed ids (subtree order).
    ///
    /// Edges are not touched; callers remove them first.
    pub(crate) fn detach_subtree(&mut self, node_id: &NodeId) -> Vec<NodeId> {
        let removed = self.subtree(node_id);
        if let Some(parent_id) = self.parent_of(node_id).cloned() {
            if let Some(parent) = self.nodes.get_mut(&parent_id) {
                parent.children.retain(|child| child != node_id);
            }
        }
        for id in &removed {
            self.nodes.remove(id);
        }
        removed
    }

    pub(crate) fn insert_edge(&mut self, edge_id: EdgeId, edge: Edge) {
        self.edges.insert(edge_id, edge);
    }

    pub(crate) fn remove_edge(&mut self, edge_id: &EdgeId) -> Option<Edge> {
        self.edges.remove(edge_id)
    }

    /// Validates every structural invariant of the model.
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        let root_id = NodeId::root();
        let Some(root) = self.nodes.get(&root_id) else {
            return Err(InvariantViolation::MissingRoot);
        };
        if root.parent.is_some() {
            return Err(InvariantViolation::RootHasParent);
        }

        for (node_id, node) in &self.nodes {
            if node_id.is_root() {
                continue;
            }
            let Some(parent_id) = node.parent.as_ref() else {
                return Err(InvariantViolation::Orphan { node_id: node_id.clone() });
            };
            let Some(parent) = self.nodes.get(parent_id) else {
                return Err(InvariantViolation::DanglingParent {
                    node_id: node_id.clone(),
                    parent_id: parent_id.clone(),
                });
            };
            let listed = parent.children.iter().filter(|child| *child == node_id).count();
            if listed != 1 {
                return Err(InvariantViolation::ChildListMismatch {
                    parent_id: parent_id.clone(),
                    node_id: node_id.clone(),
                });
            }
        }

        for (parent_id, parent) in &self.nodes {
            for child_id in &parent.children {
                let points_back = self
                    .nodes
                    .get(child_id)
                    .and_then(Node::parent)
                    .is_some_and(|p| p == parent_id);
                if !points_back {
                    return Err(InvariantViolation::ChildListMismatch {
                        parent_id: parent_id.clone(),
                        node_id: child_id.clone(),
                    });
                }
            }
        }

        // Every node must be reachable from root; anything else sits on a parent cycle.
        let reachable = self.subtree(&root_id).into_iter().collect::<BTreeSet<_>>();
        if let Some(node_id) = self.nodes.keys().find(|id| !reachable.contains(*id)) {
            return Err(InvariantViolation::Cycle { node_id: node_id.clone() });
        }

        for (edge_id, edge) in &self.edges {
            for endpoint in [edge.source_id(), edge.target_id()] {
                if !self.nodes.contains_key(endpoint) {
                    return Err(InvariantViolation::DanglingEdge {
                        edge_id: edge_id.clone(),
                        node_id: endpoint.clone(),
                    });
                }
            }
        }

        Ok(())
    }
}

fn insert_child(children: &mut Vec<NodeId>, node_id: NodeId, position: Option<usize>) {
    match position {
        Some(index) if index <= children.len() => children.insert(index, node_id),
        _ => children.push(node_id),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    data: NodeData,
}

impl Node {
    fn container_root() -> Self {
        Self { parent: None, children: Vec::new(), data: NodeData::default() }
    }

    /// `None` only for the synthetic root.
    pub fn parent(&self) -> Option<&NodeId> {
        self.parent.as_ref()
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn data(&self) -> &NodeData {
        &self.data
    }

    pub fn is_group(&self) -> bool {
        self.data.is_group()
    }
}

/// Free-form presentation attributes of a node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeData {
    label: Option<String>,
    icon: Option<String>,
    style: Option<String>,
    group: bool,
    attributes: Map<String, Value>,
}

impl NodeData {
    pub fn new(label: Option<String>, icon: Option<String>, style: Option<String>) -> Self {
        Self { label, icon, style, group: false, attributes: Map::new() }
    }

    pub fn group(style: Option<String>, icon: Option<String>) -> Self {
        Self { label: None, icon, style, group: true, attributes: Map::new() }
    }

    /// Replaces the attributes that have no dedicated field.
    pub fn with_attributes(mut self, attributes: Map<String, Value>) -> Self {
        self.attributes = attributes;
        self
    }

    pub fn set_label<T: Into<String>>(&mut self, label: Option<T>) {
        self.label = label.map(Into::into);
    }

    pub fn set_icon<T: Into<String>>(&mut self, icon: Option<T>) {
        self.icon = icon.map(Into::into);
    }

    pub fn set_style<T: Into<String>>(&mut self, style: Option<T>) {
        self.style = style.map(Into::into);
    }

    pub fn set_group(&mut self, group: bool) {
        self.group = group;
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn icon(&self) -> Option<&str> {
        self.icon.as_deref()
    }

    pub fn style(&self) -> Option<&str> {
        self.style.as_deref()
    }

    pub fn is_group(&self) -> bool {
        self.group
    }

    pub fn attributes(&self) -> &Map<String, Value> {
        &self.attributes
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    source_id: NodeId,
    target_id: NodeId,
    label: Option<String>,
}

impl Edge {
    pub fn new(source_id: NodeId, target_id: NodeId) -> Self {
        Self { source_id, target_id, label: None }
    }

    pub fn new_with(source_id: NodeId, target_id: NodeId, label: Option<String>) -> Self {
        Self { source_id, target_id, label }
    }

    pub fn set_label<T: Into<String>>(&mut self, label: Option<T>) {
        self.label = label.map(Into::into);
    }

    pub fn source_id(&self) -> &NodeId {
        &self.source_id
    }

    pub fn target_id(&self) -> &NodeId {
        &self.target_id
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    MissingRoot,
    RootHasParent,
    Orphan { node_id: NodeId },
    DanglingParent { node_id: NodeId, parent_id: NodeId },
    ChildListMismatch { parent_id: NodeId, node_id: NodeId },
    Cycle { node_id: NodeId },
    DanglingEdge { edge_id: EdgeId, node_id: NodeId },
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingRoot => f.write_str("graph has no root node"),
            Self::RootHasParent => f.write_str("root node must not have a parent"),
            Self::Orphan { node_id } => write!(f, "node {node_id} has no parent"),
            Self::DanglingParent { node_id, parent_id } => {
                write!(f, "node {node_id} refers to missing parent {parent_id}")
            }
            Self::ChildListMismatch { parent_id, node_id } => {
                write!(f, "children of {parent_id} disagree with parent of {node_id}")
            }
            Self::Cycle { node_id } => write!(f, "node {node_id} is not reachable from root"),
            Self::DanglingEdge { edge_id, node_id } => {
                write!(f, "edge {edge_id} refers to missing node {node_id}")
            }
        }
    }
}

impl std::error::Error for InvariantViolation {}
