// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Cumulus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Cumulus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

fn delta_summary(delta: &Delta) -> DeltaSummary {
    let render =
        |refs: &[GraphRef]| -> Vec<String> { refs.iter().map(ToString::to_string).collect() };
    DeltaSummary {
        added: render(&delta.added),
        removed: render(&delta.removed),
        updated: render(&delta.updated),
    }
}

fn map_decode_error(err: DecodeError) -> ErrorData {
    let data = match &err {
        DecodeError::InvalidId { index, field, value, .. } => {
            Some(serde_json::json!({ "index": index, "field": field, "value": value }))
        }
        DecodeError::InvalidOperation { index, op_kind, .. } => {
            Some(serde_json::json!({ "index": index, "op_kind": op_kind.as_str() }))
        }
        DecodeError::MissingOperationName { index }
        | DecodeError::UnknownOperation { index, .. } => {
            Some(serde_json::json!({ "index": index }))
        }
        DecodeError::UnknownTool { .. }
        | DecodeError::InvalidJson { .. }
        | DecodeError::InvalidShape { .. } => None,
    };
    ErrorData::invalid_params(err.to_string(), data)
}

fn map_batch_error(err: BatchError) -> ErrorData {
    let data = serde_json::json!({
        "index": err.index,
        "op_kind": err.op_kind.as_str(),
    });
    match &err.error {
        ApplyError::NotFound { kind, id } => {
            let mut data = data;
            data["kind"] = serde_json::json!(kind.to_string());
            data["id"] = serde_json::json!(id);
            ErrorData::resource_not_found(err.to_string(), Some(data))
        }
        ApplyError::AlreadyExists { .. }
        | ApplyError::RootImmutable { .. }
        | ApplyError::Cycle { .. }
        | ApplyError::NotUnderParent { .. }
        | ApplyError::DuplicateGroupMember { .. }
        | ApplyError::NotAGroup { .. }
        | ApplyError::GroupHasEdges { .. } => {
            ErrorData::invalid_params(err.to_string(), Some(data))
        }
    }
}
