// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Cumulus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Cumulus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The only tool the agent may call.
pub const BATCH_UPDATE_TOOL: &str = "batch_update";

pub const BATCH_UPDATE_DESCRIPTION: &str = "Apply an ordered batch of edits to the architecture \
diagram. The batch is atomic: if any operation fails, nothing is applied. Later operations may \
reference nodes created earlier in the same batch. Node ids are unique across the whole diagram; \
use \"root\" as the parent for top-level nodes. Set `data.isGroup` on nodes meant to contain \
others.";

/// Arguments of `batch_update`: always an array, never a bare operation or graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct BatchUpdateArgs {
    pub operations: Vec<WireOp>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "name", rename_all = "snake_case")]
pub enum WireOp {
    /// Create a node under an existing parent (or `root`).
    #[serde(rename_all = "camelCase")]
    AddNode {
        nodename: String,
        parent_id: String,
        #[serde(default)]
        data: Option<WireNodeData>,
    },
    /// Delete a node, its whole subtree and every edge touching it.
    #[serde(rename_all = "camelCase")]
    DeleteNode { node_id: String },
    /// Re-parent a node (and its subtree) under another node.
    #[serde(rename_all = "camelCase")]
    MoveNode { node_id: String, new_parent_id: String },
    #[serde(rename_all = "camelCase")]
    AddEdge {
        edge_id: String,
        source_id: String,
        target_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    DeleteEdge { edge_id: String },
    /// Create a container under `parentId` and move the listed descendants into it.
    #[serde(rename_all = "camelCase")]
    GroupNodes {
        node_ids: Vec<String>,
        parent_id: String,
        group_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        style: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        group_icon_name: Option<String>,
    },
    /// Dissolve a container, promoting its children to the container's parent.
    #[serde(rename_all = "camelCase")]
    RemoveGroup { group_id: String },
}

/// Node attributes. Keys other than the named ones are kept as given.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct WireNodeData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    /// Marks the node as a container that `remove_group` can dissolve.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_group: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// JSON schema of the `batch_update` parameters, as advertised to the model.
pub fn batch_update_parameters() -> serde_json::Value {
    schemars::schema_for!(BatchUpdateArgs).to_value()
}

#[cfg(test)]
mod tests {
    use super::{batch_update_parameters, BatchUpdateArgs, WireOp};

    #[test]
    fn wire_op_uses_name_tag_and_camel_case_fields() {
        let op = WireOp::MoveNode { node_id: "db".to_owned(), new_parent_id: "vpc".to_owned() };
        let json = serde_json::to_value(&op).expect("json");
        assert_eq!(
            json,
            serde_json::json!({ "name": "move_node", "nodeId": "db", "newParentId": "vpc" })
        );
    }

    #[test]
    fn batch_update_args_parse_group_nodes() {
        let args: BatchUpdateArgs = serde_json::from_value(serde_json::json!({
            "operations": [{
                "name": "group_nodes",
                "nodeIds": ["a", "b"],
                "parentId": "root",
                "groupId": "grp",
                "style": "BLUE",
                "groupIconName": "aws-vpc"
            }]
        }))
        .expect("args");

        assert_eq!(
            args.operations,
            vec![WireOp::GroupNodes {
                node_ids: vec!["a".to_owned(), "b".to_owned()],
                parent_id: "root".to_owned(),
                group_id: "grp".to_owned(),
                style: Some("BLUE".to_owned()),
                group_icon_name: Some("aws-vpc".to_owned()),
            }]
        );
    }

    #[test]
    fn parameters_schema_requires_operations() {
        let schema = batch_update_parameters();
        let required = schema["required"].as_array().expect("required");
        assert!(required.iter().any(|field| field == "operations"));
    }
}
