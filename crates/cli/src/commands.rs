// crates/cli/src/commands.rs
//! One function per subcommand. Output goes to `out`; anything that should
//! fail the process comes back as an error.

use std::io::Write;
use std::path::Path;

use anyhow::{bail, Result};
use datadesk_client::SharedBackend;
use datadesk_core::text;
use datadesk_core::{
    DataTable, FinancePage, LandingPage, Rejected, StepOutcome, UploadWorkflow, PREVIEW_LIMIT,
};
use datadesk_types::{cell_text, AnalysisRequest, PreviewData, SearchQuery, MISSING_CELL};
use serde_json::Value;
use tokio::io::{AsyncBufRead, Lines};

use crate::pager;
use crate::spinner::spin;

/// Options for the `upload` command.
#[derive(Debug, Clone, Default)]
pub struct UploadOptions {
    pub clean: bool,
    pub session: Option<String>,
    pub browse: bool,
    pub page_size: usize,
}

fn ensure_succeeded(outcome: StepOutcome) -> Result<()> {
    match outcome {
        StepOutcome::Succeeded => Ok(()),
        StepOutcome::Failed(banner) => bail!(banner),
        StepOutcome::Superseded => bail!("{}", text::INVALID_RESPONSE),
    }
}

async fn show_table<R, W>(
    data: PreviewData,
    page_size: usize,
    browse: bool,
    input: &mut Lines<R>,
    out: &mut W,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut table = DataTable::with_page_size(data, page_size);
    if browse {
        pager::browse(&mut table, input, out).await
    } else {
        writeln!(out, "{}", table.render())?;
        Ok(())
    }
}

pub fn home<W: Write>(out: &mut W) -> Result<()> {
    write!(out, "{}", LandingPage.render())?;
    Ok(())
}

pub async fn health<W: Write>(backend: &SharedBackend, out: &mut W) -> Result<()> {
    let status = spin("Verificando API...", backend.health()).await?;
    if status.is_ok() {
        writeln!(out, "API Online")?;
        Ok(())
    } else {
        bail!("API respondeu com status {:?}", status.status)
    }
}

pub async fn datasets<W: Write>(backend: &SharedBackend, out: &mut W) -> Result<()> {
    let datasets = spin("Carregando datasets...", backend.list_datasets()).await?;
    if datasets.is_empty() {
        writeln!(out, "{}", text::NO_DATA)?;
        return Ok(());
    }
    for ds in &datasets {
        writeln!(
            out,
            "{}  {}  {} linhas  {}",
            ds.id,
            ds.name.as_deref().unwrap_or(datadesk_types::MISSING_CELL),
            ds.row_count
                .map(|n| n.to_string())
                .unwrap_or_else(|| datadesk_types::MISSING_CELL.to_string()),
            ds.uploaded_at.as_deref().unwrap_or(""),
        )?;
    }
    Ok(())
}

/// Full upload flow: select, upload, preview, then optional cleaning and
/// indexing.
pub async fn upload<R, W>(
    backend: SharedBackend,
    file: &Path,
    options: UploadOptions,
    input: &mut Lines<R>,
    out: &mut W,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let workflow = UploadWorkflow::new(backend);
    if let Err(rejected) = workflow.select_file(file) {
        tracing::debug!(reason = %rejected, "selection rejected");
        let banner = workflow.snapshot().state.error;
        bail!(banner.unwrap_or_else(|| rejected.to_string()));
    }
    if let Some(selected) = workflow.snapshot().state.selected {
        writeln!(out, "Arquivo: {} ({:.1} KB)", selected.file_name, selected.size_kb())?;
    }

    ensure_succeeded(spin("Enviando arquivo...", workflow.upload()).await?)?;
    let snapshot = workflow.snapshot();
    if let Some(upload) = &snapshot.state.upload {
        writeln!(
            out,
            "Dataset {}: {} linhas, {} colunas",
            upload.dataset_id,
            upload.row_count,
            upload.columns.len()
        )?;
    }
    if let Some(preview) = snapshot.state.preview {
        show_table(preview, options.page_size, options.browse, input, out).await?;
    }

    if options.clean {
        ensure_succeeded(spin("Limpando dados...", workflow.run_cleaning()).await?)?;
        if let Some(summary) = workflow.snapshot().cleaning_summary() {
            writeln!(out, "{summary}")?;
        }
    }

    if let Some(session) = options.session {
        workflow.set_session_id(session);
        let outcome = match spin("Indexando vetores...", workflow.run_indexing()).await {
            Ok(outcome) => outcome,
            Err(Rejected::EmptySessionId) => bail!(text::INVALID_SESSION),
            Err(other) => return Err(other.into()),
        };
        ensure_succeeded(outcome)?;
        if let Some(summary) = workflow.snapshot().indexing_summary() {
            writeln!(out, "{summary}")?;
        }
    }
    Ok(())
}

pub async fn preview<R, W>(
    backend: &SharedBackend,
    dataset_id: &str,
    page_size: usize,
    browse: bool,
    input: &mut Lines<R>,
    out: &mut W,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let payload = spin("Carregando preview...", backend.preview(dataset_id, PREVIEW_LIMIT))
        .await?
        .require_data()?;
    show_table(PreviewData::from(payload), page_size, browse, input, out).await
}

pub async fn clean<W: Write>(backend: &SharedBackend, dataset_id: &str, out: &mut W) -> Result<()> {
    let result = spin("Limpando dados...", backend.run_cleaning(dataset_id))
        .await
        .and_then(|env| Ok(env.require_data()?));
    match result {
        Ok(cleaning) => {
            writeln!(out, "{}", text::cleaning_summary(&cleaning))?;
            Ok(())
        }
        Err(err) => bail!(text::step_failed(text::CLEANING_FAILED, &err)),
    }
}

pub async fn index<W: Write>(
    backend: &SharedBackend,
    dataset_id: &str,
    session_id: &str,
    out: &mut W,
) -> Result<()> {
    let session_id = session_id.trim();
    if session_id.is_empty() {
        bail!(text::INVALID_SESSION);
    }
    let result = spin(
        "Indexando vetores...",
        backend.index_vectors(dataset_id, session_id),
    )
    .await
    .and_then(|env| Ok(env.require_data()?));
    match result {
        Ok(indexing) => {
            writeln!(out, "{}", text::indexing_summary(&indexing))?;
            Ok(())
        }
        Err(err) => bail!(text::step_failed(text::INDEXING_FAILED, &err)),
    }
}

pub async fn search<W: Write>(
    backend: &SharedBackend,
    session_id: &str,
    query: &str,
    top_k: u32,
    out: &mut W,
) -> Result<()> {
    let query = SearchQuery {
        session_id: session_id.trim().to_string(),
        query: query.to_string(),
        top_k,
    };
    let results = spin("Buscando...", backend.search_vectors(&query))
        .await?
        .require_success()?;
    if results.results.is_empty() {
        writeln!(out, "{}", text::NO_DATA)?;
        return Ok(());
    }
    for hit in &results.results {
        writeln!(out, "#{} ({:.3}) {}", hit.rank, hit.similarity_score, hit.text)?;
    }
    writeln!(out, "{} resultado(s)", results.total_results)?;
    Ok(())
}

pub async fn stats<W: Write>(backend: &SharedBackend, session_id: &str, out: &mut W) -> Result<()> {
    let stats = backend.vector_stats(session_id).await?.require_success()?;
    if stats.exists {
        writeln!(
            out,
            "Sessão {}: {} documentos indexados",
            stats.session_id, stats.total_documents
        )?;
    } else {
        writeln!(out, "Sessão {} não possui vetores", stats.session_id)?;
    }
    Ok(())
}

pub async fn forget_vectors<W: Write>(
    backend: &SharedBackend,
    session_id: &str,
    out: &mut W,
) -> Result<()> {
    let deletion = backend
        .delete_vector_session(session_id)
        .await?
        .require_success()?;
    if deletion.deleted {
        writeln!(out, "Vetores da sessão {} removidos", deletion.session_id)?;
    } else {
        writeln!(out, "Sessão {} não possui vetores", deletion.session_id)?;
    }
    Ok(())
}

/// Run the cross-dataset rules and print the summary plus the top scores.
pub async fn analyze<W: Write>(
    backend: &SharedBackend,
    request: &AnalysisRequest,
    out: &mut W,
) -> Result<()> {
    if !request.has_rule_pair() {
        bail!(text::ANALYSIS_PAIR_REQUIRED);
    }
    let result = spin("Executando análise...", backend.run_analysis(request))
        .await
        .and_then(|env| Ok(env.require_success()?));
    let report = match result {
        Ok(report) => report,
        Err(err) => bail!(text::step_failed(text::ANALYSIS_FAILED, &err)),
    };

    writeln!(out, "{}", text::analysis_summary(&report))?;
    for (rule, count) in &report.summary.contagem_por_regra {
        writeln!(out, "  {rule}: {count}")?;
    }
    if report.summary.top_10_scores.is_empty() {
        return Ok(());
    }
    let top = PreviewData {
        columns: ["regra", "sku", "data", "score", "flag"]
            .map(String::from)
            .to_vec(),
        rows: report
            .summary
            .top_10_scores
            .iter()
            .map(|f| {
                let sku = cell_text(Some(&f.sku)).unwrap_or_else(|| MISSING_CELL.to_string());
                let flag = if f.flag { "sim" } else { "não" };
                vec![
                    Some(Value::from(f.regra.as_str())),
                    Some(Value::from(sku)),
                    Some(Value::from(f.data.as_str())),
                    Some(Value::from(format!("{:.2}", f.score))),
                    Some(Value::from(flag)),
                ]
            })
            .collect(),
    };
    writeln!(out, "{}", DataTable::new(top).render())?;
    Ok(())
}

pub async fn finance<W: Write>(tickers: &str, out: &mut W) -> Result<()> {
    let page = FinancePage::new();
    let notice = spin("⏳ Consultando...", page.consult(tickers)).await?;
    writeln!(out, "{}: {}", FinancePage::TITLE, notice.tickers.join(", "))?;
    writeln!(out, "{}", notice.message)?;
    Ok(())
}
