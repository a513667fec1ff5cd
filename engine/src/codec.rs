//! Storage encoding for the locally persisted favorites list.
//!
//! The device-local store keeps the guest favorites as a JSON array of
//! coupon ids under one fixed key. Ids are the string form of integer
//! primary keys; decoding accepts bare integers as well and stringifies
//! them, since older app builds wrote the raw numeric keys.

use crate::{error::Result, Error, FavoriteSet};
use serde_json::Value;

/// Serialize the set to its stored JSON form, e.g. `["12","45"]`.
pub fn encode_ids(set: &FavoriteSet) -> String {
    // A Vec<String> cannot fail to serialize.
    serde_json::to_string(set.ids()).unwrap_or_else(|_| "[]".to_string())
}

/// Parse a stored JSON value back into a set.
///
/// Duplicates are dropped (first occurrence wins). Anything that is not
/// an array of strings or integers is rejected.
pub fn decode_ids(raw: &str) -> Result<FavoriteSet> {
    let value: Value =
        serde_json::from_str(raw).map_err(|e| Error::InvalidStoredSet(e.to_string()))?;

    let entries = value
        .as_array()
        .ok_or_else(|| Error::InvalidStoredSet(format!("expected a JSON array, got {value}")))?;

    let mut set = FavoriteSet::new();
    for entry in entries {
        match entry {
            Value::String(id) => {
                set.insert(id.clone());
            }
            Value::Number(n) if n.is_i64() || n.is_u64() => {
                set.insert(n.to_string());
            }
            other => {
                return Err(Error::InvalidStoredSet(format!(
                    "expected a string or integer id, got {other}"
                )));
            }
        }
    }

    Ok(set)
}
