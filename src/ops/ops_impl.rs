// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Cumulus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Cumulus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

/// Per-operation mutation helpers used by `apply_batch`.
/// Keeps `ops::mod` focused on public op types and orchestration.
fn apply_op(graph: &mut Graph, op: &Op, delta: &mut DeltaBuilder) -> Result<(), ApplyError> {
    match op {
        Op::AddNode { node_id, parent_id, data } => {
            if graph.contains_node(node_id) {
                return Err(already_exists_node(node_id));
            }
            require_node(graph, parent_id)?;
            graph.attach(node_id.clone(), parent_id, data.clone());
            delta.record_added(GraphRef::Node(node_id.clone()));
            Ok(())
        }
        Op::DeleteNode { node_id } => {
            require_node(graph, node_id)?;
            if node_id.is_root() {
                return Err(ApplyError::RootImmutable { op_kind: OpKind::DeleteNode });
            }

            let doomed = graph.subtree(node_id).into_iter().collect::<BTreeSet<_>>();
            for edge_id in graph.edges_touching(&doomed) {
                graph.remove_edge(&edge_id);
                delta.record_removed(GraphRef::Edge(edge_id));
            }
            for removed in graph.detach_subtree(node_id) {
                delta.record_removed(GraphRef::Node(removed));
            }
            Ok(())
        }
        Op::MoveNode { node_id, new_parent_id } => {
            move_node(graph, node_id, new_parent_id, OpKind::MoveNode)?;
            delta.record_updated(GraphRef::Node(node_id.clone()));
            Ok(())
        }
        Op::AddEdge { edge_id, source_id, target_id, label } => {
            if graph.contains_edge(edge_id) {
                return Err(ApplyError::AlreadyExists {
                    kind: ObjectKind::Edge,
                    id: edge_id.to_string(),
                });
            }
            require_node(graph, source_id)?;
            require_node(graph, target_id)?;
            graph.insert_edge(
                edge_id.clone(),
                Edge::new_with(source_id.clone(), target_id.clone(), label.clone()),
            );
            delta.record_added(GraphRef::Edge(edge_id.clone()));
            Ok(())
        }
        Op::DeleteEdge { edge_id } => {
            if graph.remove_edge(edge_id).is_none() {
                return Err(ApplyError::NotFound {
                    kind: ObjectKind::Edge,
                    id: edge_id.to_string(),
                });
            }
            delta.record_removed(GraphRef::Edge(edge_id.clone()));
            Ok(())
        }
        Op::GroupNodes { node_ids, parent_id, group_id, style, icon } => {
            require_node(graph, parent_id)?;
            if graph.contains_node(group_id) {
                return Err(already_exists_node(group_id));
            }

            let mut listed = BTreeSet::new();
            for node_id in node_ids {
                require_node(graph, node_id)?;
                if node_id.is_root() {
                    return Err(ApplyError::RootImmutable { op_kind: OpKind::GroupNodes });
                }
                if !listed.insert(node_id) {
                    return Err(ApplyError::DuplicateGroupMember { node_id: node_id.clone() });
                }
                if !graph.is_ancestor(parent_id, node_id) {
                    return Err(ApplyError::NotUnderParent {
                        node_id: node_id.clone(),
                        parent_id: parent_id.clone(),
                    });
                }
            }

            let data = NodeData::group(style.clone(), icon.clone());
            graph.attach(group_id.clone(), parent_id, data);
            delta.record_added(GraphRef::Node(group_id.clone()));

            for node_id in node_ids {
                move_node(graph, node_id, group_id, OpKind::GroupNodes)?;
                delta.record_updated(GraphRef::Node(node_id.clone()));
            }
            Ok(())
        }
        Op::RemoveGroup { group_id } => {
            let Some(group) = graph.node(group_id) else {
                return Err(not_found_node(group_id));
            };
            if group_id.is_root() {
                return Err(ApplyError::RootImmutable { op_kind: OpKind::RemoveGroup });
            }
            if !group.is_group() {
                return Err(ApplyError::NotAGroup { node_id: group_id.clone() });
            }
            // edges stay as drawn, so a container that is itself an endpoint cannot dissolve
            let container = BTreeSet::from([group_id.clone()]);
            if let Some(edge_id) = graph.edges_touching(&container).into_iter().next() {
                return Err(ApplyError::GroupHasEdges { group_id: group_id.clone(), edge_id });
            }

            let children = group.children().to_vec();
            let Some(parent_id) = group.parent().cloned() else {
                return Err(ApplyError::RootImmutable { op_kind: OpKind::RemoveGroup });
            };
            let mut position = graph
                .node(&parent_id)
                .and_then(|parent| parent.children().iter().position(|id| id == group_id))
                .unwrap_or(0);

            // promoted children take the group's slot, in their original order
            for child_id in children {
                graph.reparent(&child_id, &parent_id, Some(position));
                position += 1;
                delta.record_updated(GraphRef::Node(child_id));
            }

            graph.detach_subtree(group_id);
            delta.record_removed(GraphRef::Node(group_id.clone()));
            Ok(())
        }
    }
}

fn move_node(
    graph: &mut Graph,
    node_id: &NodeId,
    new_parent_id: &NodeId,
    op_kind: OpKind,
) -> Result<(), ApplyError> {
    require_node(graph, node_id)?;
    require_node(graph, new_parent_id)?;
    if node_id.is_root() {
        return Err(ApplyError::RootImmutable { op_kind });
    }
    if node_id == new_parent_id || graph.is_ancestor(node_id, new_parent_id) {
        return Err(ApplyError::Cycle {
            node_id: node_id.clone(),
            new_parent_id: new_parent_id.clone(),
        });
    }
    graph.reparent(node_id, new_parent_id, None);
    Ok(())
}

fn require_node(graph: &Graph, node_id: &NodeId) -> Result<(), ApplyError> {
    if graph.contains_node(node_id) {
        Ok(())
    } else {
        Err(not_found_node(node_id))
    }
}

fn not_found_node(node_id: &NodeId) -> ApplyError {
    ApplyError::NotFound { kind: ObjectKind::Node, id: node_id.to_string() }
}

fn already_exists_node(node_id: &NodeId) -> ApplyError {
    ApplyError::AlreadyExists { kind: ObjectKind::Node, id: node_id.to_string() }
}
