// crates/client/src/http.rs
//! `reqwest`-backed implementation of [`Backend`].

use std::time::Instant;

use async_trait::async_trait;
use datadesk_types::{
    AnalysisReport, AnalysisRequest, ChatData, CleaningResult, DataQuery, DatasetList,
    DatasetSummary, Envelope, HealthStatus, IndexRequest, IndexingResult, InsightQuery,
    PreviewPayload, SearchQuery, SearchResults, SessionCleared, SessionInfo, UploadResult,
    VectorSessionDeletion, VectorStats, MAX_TOP_K,
};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;

use crate::backend::{Backend, CsvFile};
use crate::config::ClientConfig;
use crate::error::{extract_detail, ClientError};

const CSV_MIME: &str = "text/csv";

/// HTTP client for the FastAPI backend.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    /// Validated base URL without a trailing slash.
    base_url: String,
}

impl HttpBackend {
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let trimmed = config.base_url.trim().trim_end_matches('/');
        let parsed = Url::parse(trimmed).map_err(|e| ClientError::InvalidBaseUrl {
            url: config.base_url.clone(),
            message: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ClientError::InvalidBaseUrl {
                url: config.base_url.clone(),
                message: format!("unsupported scheme {}", parsed.scheme()),
            });
        }

        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|source| ClientError::Transport {
            url: trimmed.to_string(),
            source,
        })?;

        Ok(Self {
            client,
            base_url: trimmed.to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send a request and decode a JSON body. Non-2xx answers become
    /// [`ClientError::Status`] with FastAPI's `detail` attached.
    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        url: String,
    ) -> Result<T, ClientError> {
        let t0 = Instant::now();
        let response = request.send().await.map_err(|source| {
            tracing::error!(%url, error = %source, "backend request failed");
            ClientError::Transport {
                url: url.clone(),
                source,
            }
        })?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|source| ClientError::Transport {
                url: url.clone(),
                source,
            })?;
        let elapsed_ms = t0.elapsed().as_millis() as u64;

        if !status.is_success() {
            let detail = extract_detail(&body);
            tracing::warn!(%url, status = status.as_u16(), elapsed_ms, detail = ?detail, "backend returned error status");
            return Err(ClientError::Status {
                status: status.as_u16(),
                detail,
            });
        }

        tracing::debug!(%url, status = status.as_u16(), elapsed_ms, bytes = body.len(), "backend responded");
        serde_json::from_slice(&body).map_err(|e| ClientError::Decode {
            url,
            message: e.to_string(),
        })
    }
}

fn segment(raw: &str) -> String {
    urlencoding::encode(raw).into_owned()
}

#[async_trait]
impl Backend for HttpBackend {
    async fn upload_csv(&self, file: CsvFile) -> Result<Envelope<UploadResult>, ClientError> {
        let url = self.url("/datasets/upload");
        tracing::info!(file_name = %file.file_name, bytes = file.content.len(), "uploading CSV");
        let part = Part::bytes(file.content)
            .file_name(file.file_name)
            .mime_str(CSV_MIME)
            .map_err(|e| ClientError::InvalidRequest(e.to_string()))?;
        let form = Form::new().part("file", part);
        self.send_json(self.client.post(&url).multipart(form), url)
            .await
    }

    async fn preview(
        &self,
        dataset_id: &str,
        limit: usize,
    ) -> Result<Envelope<PreviewPayload>, ClientError> {
        let url = self.url(&format!("/datasets/{}/preview", segment(dataset_id)));
        let request = self.client.get(&url).query(&[("limit", limit)]);
        self.send_json(request, url).await
    }

    async fn run_cleaning(
        &self,
        dataset_id: &str,
    ) -> Result<Envelope<CleaningResult>, ClientError> {
        let url = self.url(&format!("/cleaning/run/{}", segment(dataset_id)));
        self.send_json(self.client.post(&url), url).await
    }

    async fn index_vectors(
        &self,
        dataset_id: &str,
        session_id: &str,
    ) -> Result<Envelope<IndexingResult>, ClientError> {
        let url = self.url(&format!("/vectors/index/{}", segment(dataset_id)));
        let body = IndexRequest {
            session_id: session_id.to_string(),
        };
        self.send_json(self.client.post(&url).json(&body), url)
            .await
    }

    async fn chat_data(&self, query: &DataQuery) -> Result<Envelope<ChatData>, ClientError> {
        let url = self.url("/chat/data");
        self.send_json(self.client.post(&url).json(query), url)
            .await
    }

    async fn chat_insight(&self, query: &InsightQuery) -> Result<Envelope<ChatData>, ClientError> {
        let url = self.url("/chat/insight");
        self.send_json(self.client.post(&url).json(query), url)
            .await
    }

    async fn health(&self) -> Result<HealthStatus, ClientError> {
        let url = self.url("/health");
        self.send_json(self.client.get(&url), url).await
    }

    async fn list_datasets(&self) -> Result<Vec<DatasetSummary>, ClientError> {
        let url = self.url("/datasets/");
        let list: DatasetList = self.send_json(self.client.get(&url), url).await?;
        Ok(list.datasets)
    }

    async fn search_vectors(
        &self,
        query: &SearchQuery,
    ) -> Result<Envelope<SearchResults>, ClientError> {
        if query.session_id.trim().is_empty() || query.query.trim().is_empty() {
            return Err(ClientError::InvalidRequest(
                "session_id and query must not be empty".into(),
            ));
        }
        if query.top_k == 0 || query.top_k > MAX_TOP_K {
            return Err(ClientError::InvalidRequest(format!(
                "top_k must be between 1 and {MAX_TOP_K}"
            )));
        }
        let url = self.url("/vectors/search");
        self.send_json(self.client.post(&url).json(query), url)
            .await
    }

    async fn vector_stats(&self, session_id: &str) -> Result<Envelope<VectorStats>, ClientError> {
        let url = self.url(&format!("/vectors/stats/{}", segment(session_id)));
        self.send_json(self.client.get(&url), url).await
    }

    async fn delete_vector_session(
        &self,
        session_id: &str,
    ) -> Result<Envelope<VectorSessionDeletion>, ClientError> {
        let url = self.url(&format!("/vectors/session/{}", segment(session_id)));
        self.send_json(self.client.delete(&url), url).await
    }

    async fn session_info(&self, session_id: &str) -> Result<Envelope<SessionInfo>, ClientError> {
        let url = self.url(&format!("/chat/sessions/{}/info", segment(session_id)));
        self.send_json(self.client.get(&url), url).await
    }

    async fn clear_session_memory(
        &self,
        session_id: &str,
    ) -> Result<Envelope<SessionCleared>, ClientError> {
        let url = self.url(&format!("/chat/sessions/{}", segment(session_id)));
        self.send_json(self.client.delete(&url), url).await
    }

    async fn run_analysis(
        &self,
        request: &AnalysisRequest,
    ) -> Result<Envelope<AnalysisReport>, ClientError> {
        if !request.has_rule_pair() {
            return Err(ClientError::InvalidRequest(
                "analysis needs vendas_id plus estoque_id or precos_id".into(),
            ));
        }
        let url = self.url("/analysis/run");
        tracing::info!(datasets = ?request.datasets, "running analysis");
        self.send_json(self.client.post(&url).json(request), url)
            .await
    }
}
