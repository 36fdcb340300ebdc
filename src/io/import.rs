use anyhow::{Context, Result};
use serde_json::Value;
use std::io::Read;

use crate::relay::RelayMessage;

/// Read a past-orders payload.
///
/// Accepts either the raw API response (`{ "data": [...] }`) or a captured
/// relay delivery (`{ "type": "PAST_ORDERS", "payload": {...} }`), in which
/// case the delivered payload is returned.
pub fn read_payload<R: Read>(reader: R) -> Result<Value> {
    let value: Value = serde_json::from_reader(reader).context("Payload is not valid JSON")?;

    if value.get("type").is_some() && value.get("payload").is_some() {
        if let Ok(message) = serde_json::from_value::<RelayMessage>(value.clone()) {
            if let Some(payload) = message.delivered_payload() {
                return Ok(payload.clone());
            }
        }
    }

    Ok(value)
}
