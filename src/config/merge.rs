//! Layer merge
//!
//! - Objects: deep-merge by key
//! - Arrays: replace (a transient list in a later layer wins entirely)
//! - Scalars: override

use serde_json::Value;

/// Deep merge `overlay` onto `base`.
///
/// Null in the overlay overrides any base value.
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut base_map), Value::Object(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                let merged = match base_map.remove(&key) {
                    Some(base_value) => deep_merge(base_value, overlay_value),
                    None => overlay_value,
                };
                base_map.insert(key, merged);
            }
            Value::Object(base_map)
        }
        (_, overlay) => overlay,
    }
}

/// Merge layers in order (first is base, last has highest precedence)
pub fn merge_layers(layers: Vec<Value>) -> Value {
    layers.into_iter().fold(Value::Null, deep_merge)
}
