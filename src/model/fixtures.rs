// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Cumulus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Cumulus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

#![cfg(test)]

use super::graph::{Edge, Graph, NodeData};
use super::ids::{EdgeId, NodeId};

pub(crate) fn nid(value: &str) -> NodeId {
    NodeId::new(value).expect("node id")
}

pub(crate) fn eid(value: &str) -> EdgeId {
    EdgeId::new(value).expect("edge id")
}

fn labelled(label: &str, icon: &str) -> NodeData {
    NodeData::new(Some(label.to_owned()), Some(icon.to_owned()), None)
}

/// `users` at the top level plus a `vpc` group holding `alb -> app -> db`.
pub(crate) fn architecture_graph() -> Graph {
    let mut graph = Graph::new();
    let root = NodeId::root();

    graph.attach(nid("users"), &root, labelled("Users", "users"));
    graph.attach(
        nid("vpc"),
        &root,
        NodeData::group(Some("BLUE".to_owned()), Some("aws-vpc".to_owned())),
    );
    graph.attach(nid("alb"), &nid("vpc"), labelled("Load Balancer", "aws-elb"));
    graph.attach(nid("app"), &nid("vpc"), labelled("App Server", "aws-ec2"));
    graph.attach(nid("db"), &nid("vpc"), labelled("Database", "aws-rds"));

    graph.insert_edge(eid("alb-app"), Edge::new(nid("alb"), nid("app")));
    graph.insert_edge(
        eid("app-db"),
        Edge::new_with(nid("app"), nid("db"), Some("queries".to_owned())),
    );
    graph.insert_edge(eid("users-alb"), Edge::new(nid("users"), nid("alb")));

    graph
}
