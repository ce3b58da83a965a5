// crates/types/src/vectors.rs
//! Vector-store payloads: indexing, similarity search and session stats.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Largest `top_k` the backend accepts for a search.
pub const MAX_TOP_K: u32 = 100;

/// Default `top_k` when the caller does not pick one.
pub const DEFAULT_TOP_K: u32 = 8;

/// Body of `POST /vectors/index/{dataset_id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexRequest {
    pub session_id: String,
}

/// Counts reported by a successful indexing run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexingResult {
    /// Older backends report `total_rows`.
    #[serde(alias = "total_rows")]
    pub indexed_rows: u64,
    pub session_id: String,
}

/// Body of `POST /vectors/search`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub session_id: String,
    pub query: String,
    pub top_k: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub text: String,
    #[serde(default)]
    pub metadata: Value,
    #[serde(default)]
    pub similarity_score: f64,
    #[serde(default)]
    pub rank: u32,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SearchResults {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub session_id: String,
    #[serde(default)]
    pub results: Vec<SearchHit>,
    #[serde(default)]
    pub total_results: u64,
}

/// `data` of `GET /vectors/stats/{session_id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VectorStats {
    pub session_id: String,
    #[serde(default)]
    pub exists: bool,
    #[serde(default)]
    pub total_documents: u64,
}

/// `data` of `DELETE /vectors/session/{session_id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VectorSessionDeletion {
    pub session_id: String,
    #[serde(default)]
    pub deleted: bool,
}
