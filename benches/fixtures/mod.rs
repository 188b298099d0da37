// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Cumulus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Cumulus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

#![allow(dead_code)]

// Shared deterministic benchmark fixtures (no RNG).

use cumulus::model::{EdgeId, Graph, NodeData, NodeId};
use cumulus::ops::{apply_batch, Op};

const ICONS: [&str; 6] = ["aws-ec2", "aws-rds", "aws-s3", "aws-lambda", "aws-elb", "aws-sqs"];

#[derive(Debug, Clone, Copy)]
pub enum Case {
    /// 4 groups x 5 services.
    Small,
    /// 16 groups x 10 services.
    Medium,
    /// 64 groups x 20 services.
    Large,
}

impl Case {
    pub fn shape(self) -> (usize, usize) {
        match self {
            Self::Small => (4, 5),
            Self::Medium => (16, 10),
            Self::Large => (64, 20),
        }
    }
}

pub fn nid(value: impl Into<String>) -> NodeId {
    NodeId::new(value).expect("node id")
}

pub fn eid(value: impl Into<String>) -> EdgeId {
    EdgeId::new(value).expect("edge id")
}

pub fn group_id(group: usize) -> NodeId {
    nid(format!("region-{group:03}"))
}

pub fn service_id(group: usize, service: usize) -> NodeId {
    nid(format!("svc-{group:03}-{service:03}"))
}

pub fn service_data(group: usize, service: usize) -> NodeData {
    NodeData::new(
        Some(format!("Service {group}.{service}")),
        Some(ICONS[(group + service) % ICONS.len()].to_owned()),
        None,
    )
}

/// Ops that build the fixture: services are created at the top level, grouped per region, then
/// chained inside each region and linked to the next region.
pub fn build_ops(case: Case) -> Vec<Op> {
    let (groups, services) = case.shape();
    let root = NodeId::root();
    let mut ops = Vec::new();

    for group in 0..groups {
        for service in 0..services {
            ops.push(Op::AddNode {
                node_id: service_id(group, service),
                parent_id: root.clone(),
                data: service_data(group, service),
            });
        }
        ops.push(Op::GroupNodes {
            node_ids: (0..services).map(|service| service_id(group, service)).collect(),
            parent_id: root.clone(),
            group_id: group_id(group),
            style: Some("BLUE".to_owned()),
            icon: Some("aws-region".to_owned()),
        });
        for service in 1..services {
            ops.push(Op::AddEdge {
                edge_id: eid(format!("e-{group:03}-{service:03}")),
                source_id: service_id(group, service - 1),
                target_id: service_id(group, service),
                label: None,
            });
        }
        if group > 0 {
            ops.push(Op::AddEdge {
                edge_id: eid(format!("x-{group:03}")),
                source_id: service_id(group - 1, services - 1),
                target_id: service_id(group, 0),
                label: Some("peering".to_owned()),
            });
        }
    }
    ops
}

pub fn fixture(case: Case) -> Graph {
    let mut graph = Graph::new();
    apply_batch(&mut graph, &build_ops(case)).expect("fixture batch");
    graph
}
