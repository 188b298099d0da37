// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Cumulus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Cumulus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use memchr::memmem;

const DONE_SENTINEL: &str = "[DONE]";

/// Incremental Server-Sent-Events decoder.
///
/// Bytes arrive in arbitrary chunks; complete frames (terminated by a blank line) are turned into
/// their joined `data:` payload. `event:`/`id:`/comment lines and the `[DONE]` sentinel are
/// dropped.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend(chunk.iter().copied().filter(|byte| *byte != b'\r'));

        let mut payloads = Vec::new();
        let mut consumed = 0;
        while let Some(end) = memmem::find(&self.buffer[consumed..], b"\n\n") {
            let frame = &self.buffer[consumed..consumed + end];
            if let Some(payload) = frame_payload(frame) {
                payloads.push(payload);
            }
            consumed += end + 2;
        }
        self.buffer.drain(..consumed);
        payloads
    }

    /// Flushes a final frame that was not followed by a blank line.
    pub fn finish(&mut self) -> Option<String> {
        let frame = std::mem::take(&mut self.buffer);
        frame_payload(&frame)
    }
}

fn frame_payload(frame: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(frame);
    let mut data: Option<String> = None;
    for line in text.lines() {
        let Some(rest) = line.strip_prefix("data:") else {
            continue;
        };
        let rest = rest.strip_prefix(' ').unwrap_or(rest);
        match data.as_mut() {
            Some(existing) => {
                existing.push('\n');
                existing.push_str(rest);
            }
            None => data = Some(rest.to_owned()),
        }
    }
    data.filter(|payload| payload != DONE_SENTINEL && !payload.trim().is_empty())
}
