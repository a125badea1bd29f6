//! Common types used throughout the SensorGrid client
//!
//! Shared type aliases so collaborator-facing signatures stay free of
//! any particular serialization library's spelling.

use std::collections::HashMap;

/// JSON value type (re-exported from serde_json)
pub type JsonValue = serde_json::Value;

/// JSON object type
pub type JsonObject = serde_json::Map<String, JsonValue>;

/// Generic key-value map with string keys and values
pub type StringMap = HashMap<String, String>;
