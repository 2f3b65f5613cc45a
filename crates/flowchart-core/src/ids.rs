//! Identifier helpers.

use uuid::Uuid;

#[cfg(not(target_arch = "wasm32"))]
use std::time::{SystemTime, UNIX_EPOCH};
#[cfg(target_arch = "wasm32")]
use web_time::{SystemTime, UNIX_EPOCH};

/// Node identifier.
pub type NodeId = String;
/// Edge identifier.
pub type EdgeId = String;
/// Port identifier, unique within its node.
pub type PortId = String;

/// Generate a fresh random id.
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Milliseconds since the Unix epoch (0 if the clock is before it).
pub fn timestamp_ms() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0)
}

/// Id used for a duplicated element.
pub fn copy_id(id: &str) -> String {
    format!("{id}_copy_{}", timestamp_ms())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_ids_are_unique() {
        assert_ne!(new_id(), new_id());
    }

    #[test]
    fn test_copy_id_format() {
        let id = copy_id("node-1");
        assert!(id.starts_with("node-1_copy_"));
        let suffix = &id["node-1_copy_".len()..];
        assert!(suffix.parse::<u128>().is_ok());
    }
}
