// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Cumulus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Cumulus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Raw `batch_update` arguments → typed [`Op`] batches.
//!
//! Decoding checks shape and id syntax only. Whether a referenced node exists is decided at apply
//! time, because earlier operations in the same batch may create it.

use std::fmt;

use serde_json::Value;

use crate::model::{Id, IdError, NodeData};
use crate::ops::{Op, OpKind};

use super::schema::{WireNodeData, WireOp, BATCH_UPDATE_TOOL};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    UnknownTool { name: String },
    InvalidJson { message: String },
    InvalidShape { message: String },
    MissingOperationName { index: usize },
    UnknownOperation { index: usize, name: String },
    InvalidOperation { index: usize, op_kind: OpKind, message: String },
    InvalidId { index: usize, field: &'static str, value: String, reason: IdError },
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownTool { name } => {
                write!(f, "unknown tool '{name}' (only '{BATCH_UPDATE_TOOL}' is available)")
            }
            Self::InvalidJson { message } => {
                write!(f, "tool arguments are not valid JSON: {message}")
            }
            Self::InvalidShape { message } => {
                write!(f, "tool arguments must be {{\"operations\": [...]}}: {message}")
            }
            Self::MissingOperationName { index } => {
                write!(f, "operation #{index} has no 'name' field")
            }
            Self::UnknownOperation { index, name } => {
                write!(f, "operation #{index} has unknown name '{name}'")
            }
            Self::InvalidOperation { index, op_kind, message } => {
                write!(f, "operation #{index} ({op_kind}) is malformed: {message}")
            }
            Self::InvalidId { index, field, value, reason } => {
                write!(f, "operation #{index} field '{field}' has invalid id '{value}': {reason}")
            }
        }
    }
}

impl std::error::Error for DecodeError {}

/// Decodes one model tool invocation into an operation batch.
pub fn decode_tool_call(tool_name: &str, arguments: &str) -> Result<Vec<Op>, DecodeError> {
    if tool_name != BATCH_UPDATE_TOOL {
        return Err(DecodeError::UnknownTool { name: tool_name.to_owned() });
    }
    decode_batch_update(arguments)
}

/// Decodes the JSON arguments of `batch_update`.
///
/// The whole batch is rejected on the first malformed element.
pub fn decode_batch_update(arguments: &str) -> Result<Vec<Op>, DecodeError> {
    let value: Value = serde_json::from_str(arguments)
        .map_err(|err| DecodeError::InvalidJson { message: err.to_string() })?;

    let mut object = match value {
        Value::Object(object) => object,
        other => {
            return Err(DecodeError::InvalidShape {
                message: format!("expected an object, found {}", json_type_name(&other)),
            })
        }
    };
    let operations = match object.remove("operations") {
        Some(Value::Array(operations)) => operations,
        Some(other) => {
            return Err(DecodeError::InvalidShape {
                message: format!("'operations' must be an array, found {}", json_type_name(&other)),
            })
        }
        None => {
            return Err(DecodeError::InvalidShape {
                message: "missing 'operations' field".to_owned(),
            })
        }
    };

    operations
        .into_iter()
        .enumerate()
        .map(|(index, raw)| decode_operation(index, raw))
        .collect()
}

fn decode_operation(index: usize, raw: Value) -> Result<Op, DecodeError> {
    let op_kind = match raw.get("name") {
        Some(Value::String(name)) => OpKind::from_wire(name)
            .ok_or_else(|| DecodeError::UnknownOperation { index, name: name.clone() })?,
        Some(other) => {
            return Err(DecodeError::UnknownOperation { index, name: other.to_string() })
        }
        None => return Err(DecodeError::MissingOperationName { index }),
    };

    let wire: WireOp = serde_json::from_value(raw).map_err(|err| DecodeError::InvalidOperation {
        index,
        op_kind,
        message: err.to_string(),
    })?;
    wire_op_to_internal(index, &wire)
}

/// Converts a schema-valid wire operation into an [`Op`], validating id syntax.
pub fn wire_op_to_internal(index: usize, op: &WireOp) -> Result<Op, DecodeError> {
    let parse = |field: &'static str, value: &str| parse_id(index, field, value);

    Ok(match op {
        WireOp::AddNode { nodename, parent_id, data } => Op::AddNode {
            node_id: parse("nodename", nodename)?,
            parent_id: parse("parentId", parent_id)?,
            data: node_data(data.clone().unwrap_or_default()),
        },
        WireOp::DeleteNode { node_id } => Op::DeleteNode { node_id: parse("nodeId", node_id)? },
        WireOp::MoveNode { node_id, new_parent_id } => Op::MoveNode {
            node_id: parse("nodeId", node_id)?,
            new_parent_id: parse("newParentId", new_parent_id)?,
        },
        WireOp::AddEdge { edge_id, source_id, target_id, label } => Op::AddEdge {
            edge_id: parse_id(index, "edgeId", edge_id)?,
            source_id: parse("sourceId", source_id)?,
            target_id: parse("targetId", target_id)?,
            label: label.clone(),
        },
        WireOp::DeleteEdge { edge_id } => {
            Op::DeleteEdge { edge_id: parse_id(index, "edgeId", edge_id)? }
        }
        WireOp::GroupNodes { node_ids, parent_id, group_id, style, group_icon_name } => {
            Op::GroupNodes {
                node_ids: node_ids
                    .iter()
                    .map(|node_id| parse("nodeIds", node_id))
                    .collect::<Result<Vec<_>, _>>()?,
                parent_id: parse("parentId", parent_id)?,
                group_id: parse("groupId", group_id)?,
                style: style.clone(),
                icon: group_icon_name.clone(),
            }
        }
        WireOp::RemoveGroup { group_id } => {
            Op::RemoveGroup { group_id: parse("groupId", group_id)? }
        }
    })
}

fn node_data(wire: WireNodeData) -> NodeData {
    let WireNodeData { label, icon, style, is_group, mut extra } = wire;
    // a boolean `group` key is read as the container flag too
    let mut group = is_group;
    if let Some(flag) = extra.get("group").and_then(Value::as_bool) {
        group |= flag;
        extra.remove("group");
    }

    let mut data = NodeData::new(label, icon, style).with_attributes(extra);
    data.set_group(group);
    data
}

fn parse_id<T>(index: usize, field: &'static str, value: &str) -> Result<Id<T>, DecodeError> {
    Id::new(value.to_owned()).map_err(|reason| DecodeError::InvalidId {
        index,
        field,
        value: value.to_owned(),
        reason,
    })
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
