// crates/core/src/pages.rs
//! Page shells: landing, chat entry and the financial-query placeholder.

use std::time::Duration;

use datadesk_client::SharedBackend;

use crate::busy::BusyFlag;
use crate::chat::ChatSession;
use crate::error::Rejected;
use crate::text;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureCard {
    pub icon: &'static str,
    pub title: &'static str,
    pub description: &'static str,
}

/// Static landing page. Makes no network calls.
#[derive(Debug, Clone, Copy, Default)]
pub struct LandingPage;

impl LandingPage {
    pub const TITLE: &'static str = "Bem-vindo ao Projeto Agente IA";
    pub const DESCRIPTION: &'static str = "Uma plataforma completa para análise de dados, chat com IA e upload de arquivos. Explore as funcionalidades através do menu de navegação.";

    pub const FEATURES: [FeatureCard; 3] = [
        FeatureCard {
            icon: "💬",
            title: "Chat com IA",
            description: "Converse com nossa IA para obter insights e respostas inteligentes.",
        },
        FeatureCard {
            icon: "📁",
            title: "Upload de Arquivos",
            description: "Faça upload de documentos para análise e processamento.",
        },
        FeatureCard {
            icon: "📊",
            title: "Análise Financeira",
            description: "Visualize e analise dados financeiros de forma intuitiva.",
        },
    ];

    pub fn render(&self) -> String {
        let mut out = format!("{}\n\n{}\n", Self::TITLE, Self::DESCRIPTION);
        for card in &Self::FEATURES {
            out.push_str(&format!(
                "\n{} {}\n   {}\n",
                card.icon, card.title, card.description
            ));
        }
        out
    }
}

/// Session-id entry in front of the chat. Changing sessions means
/// [`leave`](ChatPage::leave) and [`start`](ChatPage::start) again.
pub struct ChatPage {
    backend: SharedBackend,
    session_input: String,
    session: Option<ChatSession>,
}

impl ChatPage {
    pub const TITLE: &'static str = "Chat com Agentes IA";
    pub const HINT: &'static str =
        "Este ID deve ser o mesmo usado ao indexar seus dados em vetores.";

    pub fn new(backend: SharedBackend) -> Self {
        Self {
            backend,
            session_input: String::new(),
            session: None,
        }
    }

    pub fn set_session_input(&mut self, input: impl Into<String>) {
        self.session_input = input.into();
    }

    pub fn session_input(&self) -> &str {
        &self.session_input
    }

    /// Whether the start action is enabled.
    pub fn can_start(&self) -> bool {
        !self.session_input.trim().is_empty()
    }

    /// Open the chat for the typed session id. The id is fixed while the
    /// chat is open; switching sessions goes through [`ChatPage::leave`].
    pub fn start(&mut self) -> Result<&ChatSession, Rejected> {
        if let Some(active) = &self.session {
            return Err(Rejected::SessionActive {
                session_id: active.session_id().to_string(),
            });
        }
        let session = ChatSession::new(self.backend.clone(), &self.session_input)?;
        tracing::info!(session_id = %session.session_id(), "chat session started");
        Ok(&*self.session.insert(session))
    }

    pub fn session(&self) -> Option<&ChatSession> {
        self.session.as_ref()
    }

    pub fn is_started(&self) -> bool {
        self.session.is_some()
    }

    /// Drop the active chat and clear the id field.
    pub fn leave(&mut self) {
        if let Some(session) = self.session.take() {
            tracing::info!(session_id = %session.session_id(), "chat session closed");
        }
        self.session_input.clear();
    }
}

/// What the financial-query page shows after a consult.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinanceNotice {
    pub tickers: Vec<String>,
    pub message: &'static str,
}

/// Financial-query placeholder: validates tickers, waits, and reports that
/// the feature is not available yet.
#[derive(Debug)]
pub struct FinancePage {
    delay: Duration,
    busy: BusyFlag,
}

impl FinancePage {
    pub const TITLE: &'static str = "Consulta Financeira";
    pub const DEFAULT_DELAY: Duration = Duration::from_secs(2);

    pub const PLANNED: [&'static str; 6] = [
        "Consulta de preços em tempo real",
        "Histórico de preços e volumes",
        "Indicadores técnicos",
        "Análise de tendências",
        "Comparação entre ações",
        "Alertas de preço",
    ];

    pub fn new() -> Self {
        Self::with_delay(Self::DEFAULT_DELAY)
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            busy: BusyFlag::new(),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.busy.is_busy()
    }

    pub async fn consult(&self, input: &str) -> Result<FinanceNotice, Rejected> {
        let tickers = parse_tickers(input);
        if tickers.is_empty() {
            return Err(Rejected::NoTickers);
        }
        let _busy = self.busy.try_acquire().ok_or(Rejected::Busy)?;
        tracing::debug!(?tickers, "finance consult");
        tokio::time::sleep(self.delay).await;
        Ok(FinanceNotice {
            tickers,
            message: text::FINANCE_NOT_READY,
        })
    }
}

impl Default for FinancePage {
    fn default() -> Self {
        Self::new()
    }
}

/// Comma-separated tickers, trimmed and upper-cased, blanks dropped.
pub fn parse_tickers(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_uppercase)
        .collect()
}
