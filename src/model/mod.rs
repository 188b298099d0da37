// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Cumulus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Cumulus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Core data model.
//!
//! A session owns one [`Graph`]: a tree of nodes under the synthetic `root` plus a flat edge set.

pub(crate) mod fixtures;
pub mod graph;
pub mod ids;
pub mod snapshot;

pub use graph::{Edge, Graph, InvariantViolation, Node, NodeData};
pub use ids::{EdgeId, Id, IdError, NodeId, ROOT_NODE_ID};
pub use snapshot::{GraphSnapshot, SnapshotEdge, SnapshotError, SnapshotNode, SnapshotNodeData};
