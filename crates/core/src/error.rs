// crates/core/src/error.rs
use std::path::PathBuf;

use thiserror::Error;

use crate::text;

/// Client-side validation failures. Returning one of these guarantees no
/// backend call was made.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejected {
    #[error("{}", text::INVALID_CSV)]
    NotCsv { path: PathBuf },

    #[error("Não foi possível ler o arquivo {path}: {reason}")]
    FileUnreadable { path: PathBuf, reason: String },

    #[error("Nenhum arquivo selecionado.")]
    NoFileSelected,

    #[error("Nenhum dataset carregado.")]
    NoDataset,

    #[error("{}", text::INVALID_SESSION)]
    EmptySessionId,

    #[error("Digite uma pergunta antes de enviar.")]
    EmptyPrompt,

    #[error("Faça uma consulta de dados antes de gerar insights.")]
    NoDataResponse,

    #[error("Aguarde a operação em andamento terminar.")]
    Busy,

    #[error("Sessão {session_id} já está ativa. Saia do chat para trocar de sessão.")]
    SessionActive { session_id: String },

    #[error("Informe ao menos um ticker.")]
    NoTickers,
}

impl Rejected {
    /// `true` for the one rejection that is about timing, not input.
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Busy)
    }
}
