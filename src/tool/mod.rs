// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Cumulus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Cumulus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! The `batch_update` tool: wire schema and decoder.

pub mod decode;
pub mod schema;

pub use decode::{decode_batch_update, decode_tool_call, wire_op_to_internal, DecodeError};
pub use schema::{
    batch_update_parameters, BatchUpdateArgs, WireNodeData, WireOp, BATCH_UPDATE_DESCRIPTION,
    BATCH_UPDATE_TOOL,
};
