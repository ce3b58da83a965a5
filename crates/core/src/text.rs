// crates/core/src/text.rs
//! User-visible strings (pt-BR) and the small formatters built on them.

use datadesk_client::ClientError;
use datadesk_types::{AnalysisReport, CleaningResult, IndexingResult};

pub const INVALID_CSV: &str = "Por favor, selecione um arquivo CSV válido.";
pub const INVALID_SESSION: &str = "Por favor, insira um Session ID válido.";
pub const INVALID_RESPONSE: &str = "Resposta inválida do servidor";

pub const UPLOAD_FAILED: &str = "Erro no upload";
pub const CLEANING_FAILED: &str = "Erro na limpeza";
pub const INDEXING_FAILED: &str = "Erro na indexação";
pub const ANALYSIS_FAILED: &str = "Erro na análise";

pub const ANALYSIS_PAIR_REQUIRED: &str =
    "Informe o dataset de vendas junto com o de estoque ou o de preços.";

/// Prefix every chat error message starts with.
pub const ERROR_MARK: &str = "❌";
pub const CHAT_QUERY_FAILED: &str = "❌ Erro ao processar a solicitação. Tente novamente.";
pub const CHAT_QUERY_ERROR: &str = "❌ Erro";
pub const INSIGHTS_FAILED: &str = "❌ Erro ao gerar insights. Tente novamente.";
pub const INSIGHTS_ERROR: &str = "❌ Erro ao gerar insights";
pub const INSIGHTS_HEADING: &str = "## 💡 Insights Gerados";

pub const NO_DATA: &str = "Nenhum dado disponível";

pub const FINANCE_NOT_READY: &str =
    "Funcionalidade de consulta financeira será implementada no próximo prompt!";

/// Message text for a failed backend call.
///
/// Responses that decoded but broke the contract all read as
/// [`INVALID_RESPONSE`]; everything else uses the backend's own wording.
pub fn failure_text(err: &ClientError) -> String {
    match err {
        ClientError::Envelope(_) | ClientError::Decode { .. } => INVALID_RESPONSE.to_string(),
        other => other.user_message(),
    }
}

/// `"<prefix>: <reason>"`, the banner shape for a failed workflow step.
pub fn step_failed(prefix: &str, err: &ClientError) -> String {
    format!("{prefix}: {}", failure_text(err))
}

pub fn cleaning_summary(result: &CleaningResult) -> String {
    format!(
        "Limpeza concluída! {} de {} registros processados.",
        result.cleaned_rows, result.original_rows
    )
}

pub fn indexing_summary(result: &IndexingResult) -> String {
    format!(
        "Indexação concluída! {} registros indexados para sessão {}.",
        result.indexed_rows, result.session_id
    )
}

pub fn analysis_summary(report: &AnalysisReport) -> String {
    format!(
        "Análise concluída! {} registros processados, {} sinalizados.",
        report.summary.total_registros,
        report.flagged()
    )
}

pub fn insights_message(insights: &str) -> String {
    format!("{INSIGHTS_HEADING}\n\n{insights}")
}
