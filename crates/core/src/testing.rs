// crates/core/src/testing.rs
//! Scripted `Backend` used by the controller tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use datadesk_client::{Backend, ClientError, CsvFile};
use datadesk_types::{
    AnalysisReport, AnalysisRequest, ChatData, CleaningResult, DataQuery, DatasetSummary, Envelope,
    HealthStatus, IndexingResult, InsightQuery, PreviewPayload, SearchQuery, SearchResults,
    SessionCleared, SessionInfo, UploadResult, VectorSessionDeletion, VectorStats,
};
use tokio::sync::Semaphore;

/// What a scripted endpoint answers with.
#[derive(Debug, Clone)]
pub(crate) enum Reply<T> {
    Envelope(Envelope<T>),
    /// Non-2xx with a FastAPI `detail`.
    Status(u16, String),
}

impl<T> Reply<T> {
    pub fn ok(data: T) -> Self {
        Self::Envelope(Envelope::ok(data))
    }

    pub fn failed(message: &str) -> Self {
        Self::Envelope(Envelope::failed(message))
    }

    pub fn status(status: u16, detail: &str) -> Self {
        Self::Status(status, detail.to_string())
    }
}

fn answer<T: Clone>(slot: &Mutex<Option<Reply<T>>>) -> Result<Envelope<T>, ClientError> {
    match slot.lock().unwrap().clone() {
        Some(Reply::Envelope(env)) => Ok(env),
        Some(Reply::Status(status, detail)) => Err(ClientError::Status {
            status,
            detail: Some(detail),
        }),
        None => Err(ClientError::Status {
            status: 501,
            detail: Some("not scripted".into()),
        }),
    }
}

/// Every call the fake saw, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    Upload { file_name: String, bytes: usize },
    Preview { dataset_id: String, limit: usize },
    Cleaning { dataset_id: String },
    Index { dataset_id: String, session_id: String },
    ChatData(DataQuery),
    ChatInsight(InsightQuery),
    SessionInfo(String),
    ClearMemory(String),
}

#[derive(Default)]
pub(crate) struct FakeBackend {
    pub upload: Mutex<Option<Reply<UploadResult>>>,
    pub preview: Mutex<Option<Reply<PreviewPayload>>>,
    pub cleaning: Mutex<Option<Reply<CleaningResult>>>,
    pub index: Mutex<Option<Reply<IndexingResult>>>,
    pub chat_data: Mutex<Option<Reply<ChatData>>>,
    pub chat_insight: Mutex<Option<Reply<ChatData>>>,
    pub session_info: Mutex<Option<Reply<SessionInfo>>>,
    pub clear_memory: Mutex<Option<Reply<SessionCleared>>>,
    calls: Mutex<Vec<Call>>,
    gate: Option<Arc<Semaphore>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// A fake whose calls each wait for a permit on the returned semaphore
    /// before answering. It starts with none.
    pub fn gated() -> (Self, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        let fake = Self {
            gate: Some(gate.clone()),
            ..Self::default()
        };
        (fake, gate)
    }

    pub fn script<T>(slot: &Mutex<Option<Reply<T>>>, reply: Reply<T>) {
        *slot.lock().unwrap() = Some(reply);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    async fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }
    }
}

fn unsupported<T>() -> Result<T, ClientError> {
    Err(ClientError::InvalidRequest("not supported by FakeBackend".into()))
}

#[async_trait]
impl Backend for FakeBackend {
    async fn upload_csv(&self, file: CsvFile) -> Result<Envelope<UploadResult>, ClientError> {
        self.record(Call::Upload {
            file_name: file.file_name,
            bytes: file.content.len(),
        })
        .await;
        answer(&self.upload)
    }

    async fn preview(
        &self,
        dataset_id: &str,
        limit: usize,
    ) -> Result<Envelope<PreviewPayload>, ClientError> {
        self.record(Call::Preview {
            dataset_id: dataset_id.to_string(),
            limit,
        })
        .await;
        answer(&self.preview)
    }

    async fn run_cleaning(
        &self,
        dataset_id: &str,
    ) -> Result<Envelope<CleaningResult>, ClientError> {
        self.record(Call::Cleaning {
            dataset_id: dataset_id.to_string(),
        })
        .await;
        answer(&self.cleaning)
    }

    async fn index_vectors(
        &self,
        dataset_id: &str,
        session_id: &str,
    ) -> Result<Envelope<IndexingResult>, ClientError> {
        self.record(Call::Index {
            dataset_id: dataset_id.to_string(),
            session_id: session_id.to_string(),
        })
        .await;
        answer(&self.index)
    }

    async fn chat_data(&self, query: &DataQuery) -> Result<Envelope<ChatData>, ClientError> {
        self.record(Call::ChatData(query.clone())).await;
        answer(&self.chat_data)
    }

    async fn chat_insight(&self, query: &InsightQuery) -> Result<Envelope<ChatData>, ClientError> {
        self.record(Call::ChatInsight(query.clone())).await;
        answer(&self.chat_insight)
    }

    async fn health(&self) -> Result<HealthStatus, ClientError> {
        unsupported()
    }

    async fn list_datasets(&self) -> Result<Vec<DatasetSummary>, ClientError> {
        unsupported()
    }

    async fn search_vectors(
        &self,
        _query: &SearchQuery,
    ) -> Result<Envelope<SearchResults>, ClientError> {
        unsupported()
    }

    async fn vector_stats(&self, _session_id: &str) -> Result<Envelope<VectorStats>, ClientError> {
        unsupported()
    }

    async fn delete_vector_session(
        &self,
        _session_id: &str,
    ) -> Result<Envelope<VectorSessionDeletion>, ClientError> {
        unsupported()
    }

    async fn session_info(&self, session_id: &str) -> Result<Envelope<SessionInfo>, ClientError> {
        self.record(Call::SessionInfo(session_id.to_string())).await;
        answer(&self.session_info)
    }

    async fn clear_session_memory(
        &self,
        session_id: &str,
    ) -> Result<Envelope<SessionCleared>, ClientError> {
        self.record(Call::ClearMemory(session_id.to_string())).await;
        answer(&self.clear_memory)
    }

    async fn run_analysis(
        &self,
        _request: &AnalysisRequest,
    ) -> Result<Envelope<AnalysisReport>, ClientError> {
        unsupported()
    }
}
