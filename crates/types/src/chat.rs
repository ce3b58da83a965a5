// crates/types/src/chat.rs
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body of `POST /chat/data`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataQuery {
    pub session_id: String,
    pub prompt: String,
}

/// Body of `POST /chat/insight`. `context` is the last data-query answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsightQuery {
    pub session_id: String,
    pub context: String,
}

/// `data` of both chat endpoints; each fills only its own field.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ChatData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insights: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

/// `data` of `GET /chat/sessions/{id}/info`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionInfo {
    pub session_id: String,
    #[serde(default)]
    pub session_info: Value,
}

/// `data` of `DELETE /chat/sessions/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionCleared {
    pub session_id: String,
    #[serde(default)]
    pub cleared: bool,
}
