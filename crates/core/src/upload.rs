// crates/core/src/upload.rs
//! Upload → preview → cleaning → indexing workflow.
//!
//! [`UploadWorkflow`] owns the state one upload screen needs. Each step is
//! an async method; validation failures come back as [`Rejected`] before any
//! backend call, while backend failures land in the error banner
//! (`UploadState::error`) and are reported as [`StepOutcome::Failed`].
//!
//! State lives behind a `std::sync::Mutex` that is only locked between
//! awaits. Every step captures the state's epoch before calling out; a
//! `select_file`, `reset` or finished upload that happens meanwhile bumps
//! the epoch and the late result is dropped instead of landing on the wrong
//! dataset.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use datadesk_client::{ClientError, CsvFile, SharedBackend};
use datadesk_types::{CleaningResult, IndexingResult, PreviewData, UploadResult};

use crate::busy::BusyFlag;
use crate::error::Rejected;
use crate::text;

/// Rows requested for the preview sample.
pub const PREVIEW_LIMIT: usize = 20;

/// Files are typed by extension, the way a browser picks `text/csv`.
const CSV_EXTENSION: &str = "csv";

/// The file picked for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub path: PathBuf,
    pub file_name: String,
    pub size_bytes: u64,
}

impl SelectedFile {
    pub fn size_kb(&self) -> f64 {
        self.size_bytes as f64 / 1024.0
    }
}

/// Where the workflow stands, derived from which results are present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Idle,
    FileSelected,
    Uploaded,
    PreviewLoaded,
    Cleaned,
    Indexed,
}

/// Everything the upload screen shows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UploadState {
    pub selected: Option<SelectedFile>,
    pub upload: Option<UploadResult>,
    pub preview: Option<PreviewData>,
    pub cleaning: Option<CleaningResult>,
    pub indexing: Option<IndexingResult>,
    /// Raw text as typed; trimmed when indexing.
    pub session_id: String,
    pub error: Option<String>,
    epoch: u64,
}

impl UploadState {
    /// Step results only count while an upload is present.
    pub fn stage(&self) -> Stage {
        if self.upload.is_none() {
            return if self.selected.is_some() {
                Stage::FileSelected
            } else {
                Stage::Idle
            };
        }
        if self.indexing.is_some() {
            Stage::Indexed
        } else if self.cleaning.is_some() {
            Stage::Cleaned
        } else if self.preview.is_some() {
            Stage::PreviewLoaded
        } else {
            Stage::Uploaded
        }
    }

    pub fn dataset_id(&self) -> Option<&str> {
        self.upload.as_ref().map(|u| u.dataset_id.as_str())
    }

    /// Drop every step result and move to a new epoch.
    fn discard_results(&mut self) {
        self.upload = None;
        self.preview = None;
        self.cleaning = None;
        self.indexing = None;
        self.epoch += 1;
    }
}

/// Point-in-time copy of the workflow for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadSnapshot {
    pub stage: Stage,
    pub state: UploadState,
    pub is_uploading: bool,
    pub is_cleaning: bool,
    pub is_indexing: bool,
}

impl UploadSnapshot {
    pub fn is_busy(&self) -> bool {
        self.is_uploading || self.is_cleaning || self.is_indexing
    }

    pub fn cleaning_summary(&self) -> Option<String> {
        self.state.cleaning.as_ref().map(text::cleaning_summary)
    }

    pub fn indexing_summary(&self) -> Option<String> {
        self.state.indexing.as_ref().map(text::indexing_summary)
    }
}

/// Result of a step that reached the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Succeeded,
    /// The banner text that was set.
    Failed(String),
    /// State moved on while the call was in flight; the answer was dropped.
    Superseded,
}

impl StepOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded)
    }
}

pub struct UploadWorkflow {
    backend: SharedBackend,
    state: Mutex<UploadState>,
    uploading: BusyFlag,
    cleaning: BusyFlag,
    indexing: BusyFlag,
}

impl UploadWorkflow {
    pub fn new(backend: SharedBackend) -> Self {
        Self {
            backend,
            state: Mutex::new(UploadState::default()),
            uploading: BusyFlag::new(),
            cleaning: BusyFlag::new(),
            indexing: BusyFlag::new(),
        }
    }

    fn state(&self) -> MutexGuard<'_, UploadState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> UploadSnapshot {
        let state = self.state().clone();
        UploadSnapshot {
            stage: state.stage(),
            state,
            is_uploading: self.uploading.is_busy(),
            is_cleaning: self.cleaning.is_busy(),
            is_indexing: self.indexing.is_busy(),
        }
    }

    /// Pick a file for upload. Only CSV files are accepted.
    ///
    /// Accepting clears the banner and discards prior results. Rejecting sets
    /// the banner and clears the selection, leaving results untouched.
    pub fn select_file(&self, path: impl AsRef<Path>) -> Result<(), Rejected> {
        let path = path.as_ref();
        let checked = check_csv(path);

        let mut state = self.state();
        match checked {
            Ok(selected) => {
                tracing::debug!(path = %path.display(), size_bytes = selected.size_bytes, "file selected");
                state.selected = Some(selected);
                state.error = None;
                state.discard_results();
                Ok(())
            }
            Err(rejected) => {
                tracing::info!(path = %path.display(), reason = %rejected, "file rejected");
                state.selected = None;
                state.error = Some(text::INVALID_CSV.to_string());
                Err(rejected)
            }
        }
    }

    pub fn set_session_id(&self, session_id: impl Into<String>) {
        self.state().session_id = session_id.into();
    }

    /// Back to `Idle`: selection, results, session id and banner all go.
    pub fn reset(&self) {
        let mut state = self.state();
        state.discard_results();
        state.selected = None;
        state.session_id.clear();
        state.error = None;
    }

    /// Send the selected file, then fetch its preview.
    pub async fn upload(&self) -> Result<StepOutcome, Rejected> {
        let (selected, epoch) = {
            let state = self.state();
            let selected = state.selected.clone().ok_or(Rejected::NoFileSelected)?;
            (selected, state.epoch)
        };
        let _busy = self.uploading.try_acquire().ok_or(Rejected::Busy)?;
        self.state().error = None;

        let start = Instant::now();
        let result = self.send_file(&selected).await;

        let dataset_id = {
            let mut state = self.state();
            if state.epoch != epoch {
                tracing::debug!("upload finished after the workflow moved on");
                return Ok(StepOutcome::Superseded);
            }
            match result {
                Ok(upload) => {
                    tracing::info!(
                        dataset_id = %upload.dataset_id,
                        row_count = upload.row_count,
                        elapsed_ms = start.elapsed().as_millis() as u64,
                        "dataset uploaded"
                    );
                    let dataset_id = upload.dataset_id.clone();
                    state.discard_results();
                    state.upload = Some(upload);
                    dataset_id
                }
                Err(err) => {
                    tracing::error!(file = %selected.file_name, error = %err, "upload failed");
                    let message = text::step_failed(text::UPLOAD_FAILED, &err);
                    state.discard_results();
                    state.error = Some(message.clone());
                    return Ok(StepOutcome::Failed(message));
                }
            }
        };

        self.fetch_preview(&dataset_id).await;
        Ok(StepOutcome::Succeeded)
    }

    async fn send_file(&self, selected: &SelectedFile) -> Result<UploadResult, ClientError> {
        let content = tokio::fs::read(&selected.path)
            .await
            .map_err(|e| ClientError::io(&selected.path, e))?;
        let envelope = self
            .backend
            .upload_csv(CsvFile {
                file_name: selected.file_name.clone(),
                content,
            })
            .await?;
        Ok(envelope.require_success()?)
    }

    /// Load the preview sample for `dataset_id`.
    ///
    /// Failures are logged and leave the preview empty; the banner is
    /// reserved for the steps the user triggered.
    pub async fn fetch_preview(&self, dataset_id: &str) -> Option<PreviewData> {
        let epoch = self.state().epoch;
        let result = self
            .backend
            .preview(dataset_id, PREVIEW_LIMIT)
            .await
            .and_then(|env| env.require_data().map_err(ClientError::from));

        let mut state = self.state();
        if state.epoch != epoch || state.dataset_id() != Some(dataset_id) {
            tracing::debug!(dataset_id, "preview arrived for a stale dataset");
            return None;
        }
        match result {
            Ok(payload) => {
                let preview = PreviewData::from(payload);
                tracing::debug!(dataset_id, rows = preview.rows.len(), limit = PREVIEW_LIMIT, "preview loaded");
                state.preview = Some(preview.clone());
                Some(preview)
            }
            Err(err) => {
                tracing::warn!(dataset_id, error = %err, "preview fetch failed");
                state.preview = None;
                None
            }
        }
    }

    /// Run server-side cleaning on the uploaded dataset.
    pub async fn run_cleaning(&self) -> Result<StepOutcome, Rejected> {
        let (dataset_id, epoch) = {
            let state = self.state();
            let id = state.dataset_id().ok_or(Rejected::NoDataset)?.to_string();
            (id, state.epoch)
        };
        let _busy = self.cleaning.try_acquire().ok_or(Rejected::Busy)?;
        self.state().error = None;

        let result = self
            .backend
            .run_cleaning(&dataset_id)
            .await
            .and_then(|env| env.require_data().map_err(ClientError::from));

        let mut state = self.state();
        if state.epoch != epoch {
            return Ok(StepOutcome::Superseded);
        }
        match result {
            Ok(cleaning) => {
                tracing::info!(
                    dataset_id = %dataset_id,
                    cleaned_rows = cleaning.cleaned_rows,
                    original_rows = cleaning.original_rows,
                    "dataset cleaned"
                );
                state.cleaning = Some(cleaning);
                Ok(StepOutcome::Succeeded)
            }
            Err(err) => {
                tracing::error!(dataset_id = %dataset_id, error = %err, "cleaning failed");
                let message = text::step_failed(text::CLEANING_FAILED, &err);
                state.cleaning = None;
                state.error = Some(message.clone());
                Ok(StepOutcome::Failed(message))
            }
        }
    }

    /// Index the uploaded dataset into the vector store under the current
    /// session id.
    pub async fn run_indexing(&self) -> Result<StepOutcome, Rejected> {
        let (dataset_id, session_id, epoch) = {
            let mut state = self.state();
            let session_id = state.session_id.trim().to_string();
            let dataset_id = state.dataset_id().map(str::to_string);
            let rejected = match (&dataset_id, session_id.is_empty()) {
                (None, _) => Some(Rejected::NoDataset),
                (Some(_), true) => Some(Rejected::EmptySessionId),
                (Some(_), false) => None,
            };
            if let Some(rejected) = rejected {
                state.error = Some(text::INVALID_SESSION.to_string());
                return Err(rejected);
            }
            (dataset_id.unwrap_or_default(), session_id, state.epoch)
        };
        let _busy = self.indexing.try_acquire().ok_or(Rejected::Busy)?;
        self.state().error = None;

        let start = Instant::now();
        let result = self
            .backend
            .index_vectors(&dataset_id, &session_id)
            .await
            .and_then(|env| env.require_data().map_err(ClientError::from));

        let mut state = self.state();
        if state.epoch != epoch {
            return Ok(StepOutcome::Superseded);
        }
        match result {
            Ok(indexing) => {
                tracing::info!(
                    dataset_id = %dataset_id,
                    session_id = %session_id,
                    indexed_rows = indexing.indexed_rows,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "dataset indexed"
                );
                state.indexing = Some(indexing);
                Ok(StepOutcome::Succeeded)
            }
            Err(err) => {
                tracing::error!(dataset_id = %dataset_id, session_id = %session_id, error = %err, "indexing failed");
                let message = text::step_failed(text::INDEXING_FAILED, &err);
                state.indexing = None;
                state.error = Some(message.clone());
                Ok(StepOutcome::Failed(message))
            }
        }
    }
}

fn check_csv(path: &Path) -> Result<SelectedFile, Rejected> {
    let is_csv = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(CSV_EXTENSION));
    if !is_csv {
        return Err(Rejected::NotCsv {
            path: path.to_path_buf(),
        });
    }

    let unreadable = |reason: String| Rejected::FileUnreadable {
        path: path.to_path_buf(),
        reason,
    };
    let metadata = std::fs::metadata(path).map_err(|e| unreadable(e.to_string()))?;
    if !metadata.is_file() {
        return Err(unreadable("not a regular file".into()));
    }

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "dataset.csv".to_string());
    Ok(SelectedFile {
        path: path.to_path_buf(),
        file_name,
        size_bytes: metadata.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Call, FakeBackend, Reply};
    use datadesk_types::{PreviewPayload, PreviewRows};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn csv_fixture(dir: &TempDir, name: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, "nome,idade\nAna,31\nBia,28\n").unwrap();
        path
    }

    fn uploaded(id: &str) -> UploadResult {
        UploadResult {
            dataset_id: id.into(),
            row_count: 2,
            columns: vec!["nome".into(), "idade".into()],
        }
    }

    fn preview_payload() -> PreviewPayload {
        PreviewPayload {
            columns: vec!["nome".into(), "idade".into()],
            preview: PreviewRows::Rows(vec![
                vec![Some(json!("Ana")), Some(json!(31))],
                vec![Some(json!("Bia")), Some(json!(28))],
            ]),
        }
    }

    fn workflow(fake: FakeBackend) -> (UploadWorkflow, Arc<FakeBackend>) {
        let fake = Arc::new(fake);
        (UploadWorkflow::new(fake.clone()), fake)
    }

    async fn uploaded_workflow(dir: &TempDir) -> (UploadWorkflow, Arc<FakeBackend>) {
        let fake = FakeBackend::new();
        FakeBackend::script(&fake.upload, Reply::ok(uploaded("ds-1")));
        FakeBackend::script(&fake.preview, Reply::ok(preview_payload()));
        let (wf, fake) = workflow(fake);
        wf.select_file(csv_fixture(dir, "vendas.csv")).unwrap();
        assert_eq!(wf.upload().await, Ok(StepOutcome::Succeeded));
        (wf, fake)
    }

    #[test]
    fn test_non_csv_is_rejected_with_banner() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("planilha.xlsx");
        std::fs::write(&path, b"PK").unwrap();

        let (wf, fake) = workflow(FakeBackend::new());
        let err = wf.select_file(&path).unwrap_err();
        assert!(matches!(err, Rejected::NotCsv { .. }));

        let snap = wf.snapshot();
        assert_eq!(snap.state.selected, None);
        assert_eq!(snap.state.error.as_deref(), Some(text::INVALID_CSV));
        assert_eq!(snap.stage, Stage::Idle);
        assert!(fake.calls().is_empty());
    }

    #[test]
    fn test_missing_csv_is_rejected() {
        let dir = TempDir::new().unwrap();
        let (wf, _) = workflow(FakeBackend::new());
        let err = wf.select_file(dir.path().join("nao_existe.csv")).unwrap_err();
        assert!(matches!(err, Rejected::FileUnreadable { .. }));
        assert_eq!(wf.snapshot().state.error.as_deref(), Some(text::INVALID_CSV));
    }

    #[test]
    fn test_valid_select_clears_error() {
        let dir = TempDir::new().unwrap();
        let (wf, _) = workflow(FakeBackend::new());
        let _ = wf.select_file(dir.path().join("x.txt"));
        assert!(wf.snapshot().state.error.is_some());

        wf.select_file(csv_fixture(&dir, "dados.csv")).unwrap();
        let snap = wf.snapshot();
        assert_eq!(snap.state.error, None);
        assert_eq!(snap.stage, Stage::FileSelected);
        let selected = snap.state.selected.unwrap();
        assert_eq!(selected.file_name, "dados.csv");
        assert!(selected.size_bytes > 0);
    }

    #[tokio::test]
    async fn test_upload_without_selection_is_rejected() {
        let (wf, fake) = workflow(FakeBackend::new());
        assert_eq!(wf.upload().await, Err(Rejected::NoFileSelected));
        assert!(fake.calls().is_empty());
    }

    #[tokio::test]
    async fn test_upload_chains_exactly_one_preview() {
        let dir = TempDir::new().unwrap();
        let (wf, fake) = uploaded_workflow(&dir).await;

        let calls = fake.calls();
        assert_eq!(calls.len(), 2);
        assert!(matches!(&calls[0], Call::Upload { file_name, bytes } if file_name == "vendas.csv" && *bytes > 0));
        assert_eq!(
            calls[1],
            Call::Preview {
                dataset_id: "ds-1".into(),
                limit: 20
            }
        );

        let snap = wf.snapshot();
        assert_eq!(snap.stage, Stage::PreviewLoaded);
        assert_eq!(snap.state.dataset_id(), Some("ds-1"));
        assert_eq!(snap.state.preview.unwrap().rows.len(), 2);
        assert!(!snap.is_uploading);
    }

    #[tokio::test]
    async fn test_upload_failure_sets_banner() {
        let dir = TempDir::new().unwrap();
        let fake = FakeBackend::new();
        FakeBackend::script(&fake.upload, Reply::status(400, "Apenas arquivos CSV são aceitos"));
        let (wf, fake) = workflow(fake);
        wf.select_file(csv_fixture(&dir, "a.csv")).unwrap();

        let outcome = wf.upload().await.unwrap();
        let expected = "Erro no upload: Apenas arquivos CSV são aceitos";
        assert_eq!(outcome, StepOutcome::Failed(expected.into()));

        let snap = wf.snapshot();
        assert_eq!(snap.state.error.as_deref(), Some(expected));
        assert_eq!(snap.state.upload, None);
        // no preview after a failed upload
        assert_eq!(fake.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_upload_without_success_flag_is_invalid_response() {
        let dir = TempDir::new().unwrap();
        let fake = FakeBackend::new();
        FakeBackend::script(
            &fake.upload,
            Reply::Envelope(datadesk_types::Envelope {
                success: None,
                message: None,
                data: Some(uploaded("ds-1")),
            }),
        );
        let (wf, _) = workflow(fake);
        wf.select_file(csv_fixture(&dir, "a.csv")).unwrap();
        wf.upload().await.unwrap();
        assert_eq!(
            wf.snapshot().state.error.as_deref(),
            Some("Erro no upload: Resposta inválida do servidor")
        );
    }

    #[tokio::test]
    async fn test_preview_failure_is_silent() {
        let dir = TempDir::new().unwrap();
        let fake = FakeBackend::new();
        FakeBackend::script(&fake.upload, Reply::ok(uploaded("ds-9")));
        FakeBackend::script(&fake.preview, Reply::status(500, "boom"));
        let (wf, _) = workflow(fake);
        wf.select_file(csv_fixture(&dir, "a.csv")).unwrap();

        assert_eq!(wf.upload().await, Ok(StepOutcome::Succeeded));
        let snap = wf.snapshot();
        assert_eq!(snap.state.error, None);
        assert_eq!(snap.state.preview, None);
        assert_eq!(snap.stage, Stage::Uploaded);
    }

    #[tokio::test]
    async fn test_cleaning_requires_dataset() {
        let (wf, fake) = workflow(FakeBackend::new());
        assert_eq!(wf.run_cleaning().await, Err(Rejected::NoDataset));
        assert!(fake.calls().is_empty());
    }

    #[tokio::test]
    async fn test_cleaning_success_and_failure() {
        let dir = TempDir::new().unwrap();
        let (wf, fake) = uploaded_workflow(&dir).await;

        FakeBackend::script(
            &fake.cleaning,
            Reply::ok(CleaningResult {
                cleaned_rows: 2,
                original_rows: 2,
            }),
        );
        assert_eq!(wf.run_cleaning().await, Ok(StepOutcome::Succeeded));
        let snap = wf.snapshot();
        assert_eq!(snap.stage, Stage::Cleaned);
        assert_eq!(
            snap.cleaning_summary().as_deref(),
            Some("Limpeza concluída! 2 de 2 registros processados.")
        );

        FakeBackend::script(&fake.cleaning, Reply::failed("dataset corrompido"));
        let outcome = wf.run_cleaning().await.unwrap();
        assert_eq!(outcome, StepOutcome::Failed("Erro na limpeza: Resposta inválida do servidor".into()));
        let snap = wf.snapshot();
        assert_eq!(snap.state.cleaning, None);
        assert_eq!(snap.stage, Stage::PreviewLoaded);
    }

    #[tokio::test]
    async fn test_indexing_blocked_on_blank_session() {
        let dir = TempDir::new().unwrap();
        let (wf, fake) = uploaded_workflow(&dir).await;
        let before = fake.calls().len();

        for session in ["", "   ", "\t\n"] {
            wf.set_session_id(session);
            assert_eq!(wf.run_indexing().await, Err(Rejected::EmptySessionId));
            assert_eq!(wf.snapshot().state.error.as_deref(), Some(text::INVALID_SESSION));
        }
        assert_eq!(fake.calls().len(), before);
    }

    #[tokio::test]
    async fn test_indexing_without_dataset_sets_banner() {
        let (wf, fake) = workflow(FakeBackend::new());
        wf.set_session_id("sessao_001");
        assert_eq!(wf.run_indexing().await, Err(Rejected::NoDataset));
        assert_eq!(wf.snapshot().state.error.as_deref(), Some(text::INVALID_SESSION));
        assert!(fake.calls().is_empty());
    }

    #[tokio::test]
    async fn test_indexing_success_confirmation() {
        let dir = TempDir::new().unwrap();
        let (wf, fake) = uploaded_workflow(&dir).await;
        FakeBackend::script(
            &fake.index,
            Reply::ok(IndexingResult {
                indexed_rows: 42,
                session_id: "sessao_001".into(),
            }),
        );
        wf.set_session_id("  sessao_001 ");

        assert_eq!(wf.run_indexing().await, Ok(StepOutcome::Succeeded));
        assert_eq!(
            fake.calls().last(),
            Some(&Call::Index {
                dataset_id: "ds-1".into(),
                session_id: "sessao_001".into()
            })
        );
        let snap = wf.snapshot();
        assert_eq!(snap.stage, Stage::Indexed);
        let summary = snap.indexing_summary().unwrap();
        assert!(summary.contains("42"));
        assert!(summary.contains("sessao_001"));
    }

    #[tokio::test]
    async fn test_indexing_failure_sets_banner() {
        let dir = TempDir::new().unwrap();
        let (wf, fake) = uploaded_workflow(&dir).await;
        FakeBackend::script(&fake.index, Reply::status(404, "Dataset não encontrado"));
        wf.set_session_id("s1");

        let outcome = wf.run_indexing().await.unwrap();
        assert_eq!(
            outcome,
            StepOutcome::Failed("Erro na indexação: Dataset não encontrado".into())
        );
        assert_eq!(wf.snapshot().state.indexing, None);
    }

    #[tokio::test]
    async fn test_reset_returns_to_idle() {
        let dir = TempDir::new().unwrap();
        let (wf, _) = uploaded_workflow(&dir).await;
        wf.set_session_id("s1");

        wf.reset();
        let snap = wf.snapshot();
        assert_eq!(snap.stage, Stage::Idle);
        assert_eq!(snap.state.session_id, "");
        assert_eq!(snap.state.error, None);
        assert_eq!(snap.state.upload, None);
        assert_eq!(snap.state.preview, None);
    }

    #[tokio::test]
    async fn test_new_selection_discards_results() {
        let dir = TempDir::new().unwrap();
        let (wf, _) = uploaded_workflow(&dir).await;
        wf.select_file(csv_fixture(&dir, "outro.csv")).unwrap();
        let snap = wf.snapshot();
        assert_eq!(snap.stage, Stage::FileSelected);
        assert_eq!(snap.state.upload, None);
    }

    #[tokio::test]
    async fn test_second_upload_while_busy_is_rejected() {
        let dir = TempDir::new().unwrap();
        let (fake, gate) = FakeBackend::gated();
        FakeBackend::script(&fake.upload, Reply::ok(uploaded("ds-1")));
        FakeBackend::script(&fake.preview, Reply::ok(preview_payload()));
        let (wf, fake) = workflow(fake);
        wf.select_file(csv_fixture(&dir, "a.csv")).unwrap();

        let first = wf.upload();
        let second = async {
            tokio::task::yield_now().await;
            assert!(wf.snapshot().is_uploading);
            let second = wf.upload().await;
            // release the upload and the chained preview
            gate.add_permits(2);
            second
        };
        let (first, second) = tokio::join!(first, second);

        assert_eq!(first, Ok(StepOutcome::Succeeded));
        assert_eq!(second, Err(Rejected::Busy));
        assert_eq!(fake.calls().len(), 2);
        assert!(!wf.snapshot().is_uploading);
    }

    #[tokio::test]
    async fn test_reset_during_upload_drops_late_result() {
        let dir = TempDir::new().unwrap();
        let (fake, gate) = FakeBackend::gated();
        FakeBackend::script(&fake.upload, Reply::ok(uploaded("ds-1")));
        let (wf, _) = workflow(fake);
        wf.select_file(csv_fixture(&dir, "a.csv")).unwrap();

        let first = wf.upload();
        let interrupt = async {
            tokio::task::yield_now().await;
            wf.reset();
            gate.add_permits(1);
        };
        let (outcome, ()) = tokio::join!(first, interrupt);

        assert_eq!(outcome, Ok(StepOutcome::Superseded));
        assert_eq!(wf.snapshot().stage, Stage::Idle);
    }

    #[test]
    fn test_stage_ignores_results_without_upload() {
        let state = UploadState {
            cleaning: Some(CleaningResult {
                cleaned_rows: 1,
                original_rows: 1,
            }),
            ..UploadState::default()
        };
        assert_eq!(state.stage(), Stage::Idle);
    }

    #[tokio::test]
    async fn test_failed_reupload_drops_earlier_results() {
        let dir = TempDir::new().unwrap();
        let (wf, fake) = uploaded_workflow(&dir).await;
        FakeBackend::script(
            &fake.cleaning,
            Reply::ok(CleaningResult {
                cleaned_rows: 2,
                original_rows: 2,
            }),
        );
        wf.run_cleaning().await.unwrap();
        assert_eq!(wf.snapshot().stage, Stage::Cleaned);

        FakeBackend::script(&fake.upload, Reply::status(500, "disco cheio"));
        let outcome = wf.upload().await.unwrap();
        assert_eq!(outcome, StepOutcome::Failed("Erro no upload: disco cheio".into()));

        let snap = wf.snapshot();
        assert_eq!(snap.stage, Stage::FileSelected);
        assert_eq!(snap.state.dataset_id(), None);
        assert_eq!(snap.state.preview, None);
        assert_eq!(snap.state.cleaning, None);
    }

    #[tokio::test]
    async fn test_cleaning_for_replaced_dataset_is_dropped() {
        let dir = TempDir::new().unwrap();
        let (fake, gate) = FakeBackend::gated();
        FakeBackend::script(&fake.upload, Reply::ok(uploaded("ds-1")));
        FakeBackend::script(&fake.preview, Reply::ok(preview_payload()));
        FakeBackend::script(
            &fake.cleaning,
            Reply::ok(CleaningResult {
                cleaned_rows: 1,
                original_rows: 1,
            }),
        );
        let (wf, fake) = workflow(fake);
        wf.select_file(csv_fixture(&dir, "a.csv")).unwrap();
        gate.add_permits(2);
        assert_eq!(wf.upload().await, Ok(StepOutcome::Succeeded));

        FakeBackend::script(&fake.upload, Reply::ok(uploaded("ds-2")));
        let wait_for_calls = |n: usize| {
            let fake = fake.clone();
            async move {
                while fake.calls().len() < n {
                    tokio::task::yield_now().await;
                }
            }
        };

        let reupload = wf.upload();
        let cleaning = async {
            // dispatched for ds-1 after the re-upload is already in flight
            wait_for_calls(3).await;
            wf.run_cleaning().await
        };
        let driver = async {
            wait_for_calls(4).await;
            gate.add_permits(1);
            // the ds-2 preview queues behind the cleaning call
            wait_for_calls(5).await;
            gate.add_permits(2);
        };
        let (reupload, cleaning, ()) = tokio::join!(reupload, cleaning, driver);

        assert_eq!(reupload, Ok(StepOutcome::Succeeded));
        assert_eq!(cleaning, Ok(StepOutcome::Superseded));
        let calls = fake.calls();
        assert!(matches!(&calls[2], Call::Upload { .. }));
        assert_eq!(
            calls[3..],
            [
                Call::Cleaning {
                    dataset_id: "ds-1".into()
                },
                Call::Preview {
                    dataset_id: "ds-2".into(),
                    limit: 20
                },
            ]
        );
        let snap = wf.snapshot();
        assert_eq!(snap.state.dataset_id(), Some("ds-2"));
        assert_eq!(snap.state.cleaning, None);
        assert_eq!(snap.stage, Stage::PreviewLoaded);
    }
}
