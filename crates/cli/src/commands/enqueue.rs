// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use serde_json::Value;

use fieldsync_core::record::validate_payload;
use fieldsync_core::{Category, PendingOperation, PendingOperationInput};

use crate::error::{Error, Result};
use crate::queue::OfflineQueue;

pub fn run(category: Category, payload: &str) -> Result<()> {
    let queue = super::open_queue()?;
    let op = enqueue(&queue, category, payload)?;
    println!("{}", op.local_id);
    Ok(())
}

/// Parse and queue one record. Nothing is stored unless this returns `Ok`.
pub(crate) fn enqueue(
    queue: &OfflineQueue,
    category: Category,
    payload: &str,
) -> Result<PendingOperation> {
    let value: Value =
        serde_json::from_str(payload).map_err(|e| Error::InvalidPayload(e.to_string()))?;
    validate_payload(category, &value)?;
    let input = PendingOperationInput::from_value(category, value)?;
    Ok(queue.enqueue(input)?)
}

#[cfg(test)]
#[path = "enqueue_tests.rs"]
mod tests;
