//! Room event record.
//!
//! A plain JSON-serializable record. The server does not produce or
//! consume events yet.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomEvent {
    /// Event body; its shape depends on `event_type`.
    pub content: serde_json::Value,
    pub event_id: String,
    pub room_id: String,
    #[serde(rename = "type")]
    pub event_type: String,
}
