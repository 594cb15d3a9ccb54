//! Response normalization.
//!
//! The document store adds `createdAt`/`updatedAt` to every object it
//! returns and rejects them when they are sent back on a PUT, so they are
//! dropped before attributes reach an entity. Collection queries wrap their
//! rows in a `results` envelope.

use crate::entity::Attributes;
use serde_json::Value;

pub const CREATED_AT: &str = "createdAt";
pub const UPDATED_AT: &str = "updatedAt";
pub const RESULTS: &str = "results";

/// Fields the server owns and never accepts from clients.
pub const SERVER_MANAGED_FIELDS: [&str; 2] = [CREATED_AT, UPDATED_AT];

/// Removes the server-managed timestamps from an attribute map.
pub fn strip_timestamps_in_place(attributes: &mut Attributes) {
    for field in SERVER_MANAGED_FIELDS {
        attributes.remove(field);
    }
}

/// Entity parse rule: strips timestamps from a flat object. Any other
/// value is returned unchanged.
pub fn strip_timestamps(value: Value) -> Value {
    match value {
        Value::Object(mut map) => {
            strip_timestamps_in_place(&mut map);
            Value::Object(map)
        }
        other => other,
    }
}

/// Unwraps a `{"results": [...]}` envelope. Values without a non-null
/// `results` field are returned unchanged.
pub fn unwrap_results(value: Value) -> Value {
    match value {
        Value::Object(mut map) if map.get(RESULTS).is_some_and(|r| !r.is_null()) => {
            map.remove(RESULTS).unwrap_or(Value::Null)
        }
        other => other,
    }
}
