// crates/client/src/backend.rs
//! Backend trait defining every call the front-end makes.

use std::sync::Arc;

use async_trait::async_trait;
use datadesk_types::{
    AnalysisReport, AnalysisRequest, ChatData, CleaningResult, DataQuery, DatasetSummary, Envelope,
    HealthStatus, IndexingResult, InsightQuery, PreviewPayload, SearchQuery, SearchResults,
    SessionCleared, SessionInfo, UploadResult, VectorSessionDeletion, VectorStats,
};

use crate::error::ClientError;

/// A CSV file read into memory, ready for multipart upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvFile {
    pub file_name: String,
    pub content: Vec<u8>,
}

/// Shared handle controllers hold on to.
pub type SharedBackend = Arc<dyn Backend>;

/// Remote data-agent backend.
///
/// Envelope-returning methods hand the raw envelope back: deciding whether a
/// missing `success` or `data` is fatal is the caller's business.
///
/// Implementations:
/// - `HttpBackend`: talks to the FastAPI service over HTTP
/// - test doubles in `datadesk-core` that script responses
#[async_trait]
pub trait Backend: Send + Sync {
    /// `POST /datasets/upload` (multipart, field `file`).
    async fn upload_csv(&self, file: CsvFile) -> Result<Envelope<UploadResult>, ClientError>;

    /// `GET /datasets/{id}/preview?limit=N`.
    async fn preview(
        &self,
        dataset_id: &str,
        limit: usize,
    ) -> Result<Envelope<PreviewPayload>, ClientError>;

    /// `POST /cleaning/run/{id}`.
    async fn run_cleaning(&self, dataset_id: &str)
        -> Result<Envelope<CleaningResult>, ClientError>;

    /// `POST /vectors/index/{id}` with `{session_id}`.
    async fn index_vectors(
        &self,
        dataset_id: &str,
        session_id: &str,
    ) -> Result<Envelope<IndexingResult>, ClientError>;

    /// `POST /chat/data`.
    async fn chat_data(&self, query: &DataQuery) -> Result<Envelope<ChatData>, ClientError>;

    /// `POST /chat/insight`.
    async fn chat_insight(&self, query: &InsightQuery) -> Result<Envelope<ChatData>, ClientError>;

    /// `GET /health`.
    async fn health(&self) -> Result<HealthStatus, ClientError>;

    /// `GET /datasets/`.
    async fn list_datasets(&self) -> Result<Vec<DatasetSummary>, ClientError>;

    /// `POST /vectors/search`.
    async fn search_vectors(
        &self,
        query: &SearchQuery,
    ) -> Result<Envelope<SearchResults>, ClientError>;

    /// `GET /vectors/stats/{session_id}`.
    async fn vector_stats(&self, session_id: &str) -> Result<Envelope<VectorStats>, ClientError>;

    /// `DELETE /vectors/session/{session_id}`.
    async fn delete_vector_session(
        &self,
        session_id: &str,
    ) -> Result<Envelope<VectorSessionDeletion>, ClientError>;

    /// `GET /chat/sessions/{session_id}/info`.
    async fn session_info(&self, session_id: &str) -> Result<Envelope<SessionInfo>, ClientError>;

    /// `DELETE /chat/sessions/{session_id}`.
    async fn clear_session_memory(
        &self,
        session_id: &str,
    ) -> Result<Envelope<SessionCleared>, ClientError>;

    /// `POST /analysis/run` over cleaned datasets.
    async fn run_analysis(
        &self,
        request: &AnalysisRequest,
    ) -> Result<Envelope<AnalysisReport>, ClientError>;
}
