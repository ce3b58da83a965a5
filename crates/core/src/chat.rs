// crates/core/src/chat.rs
//! Conversational session bound to one session id.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use datadesk_client::{ClientError, SharedBackend};
use datadesk_types::{ChatData, DataQuery, Envelope, InsightQuery, SessionInfo};

use crate::busy::BusyFlag;
use crate::error::Rejected;
use crate::message::{Message, MessageLog, Role};
use crate::text;

/// How a request that reached the backend ended. Either way the carried
/// message is already in the transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatOutcome {
    Answered(Message),
    Failed(Message),
}

impl ChatOutcome {
    pub fn message(&self) -> &Message {
        match self {
            Self::Answered(m) | Self::Failed(m) => m,
        }
    }

    pub fn is_answered(&self) -> bool {
        matches!(self, Self::Answered(_))
    }
}

#[derive(Debug, Default)]
struct ChatState {
    log: MessageLog,
    last_data_response: Option<String>,
}

pub struct ChatSession {
    backend: SharedBackend,
    session_id: String,
    state: Mutex<ChatState>,
    busy: BusyFlag,
}

impl ChatSession {
    /// Open a session. The id is trimmed and must not be blank.
    pub fn new(backend: SharedBackend, session_id: &str) -> Result<Self, Rejected> {
        let session_id = session_id.trim();
        if session_id.is_empty() {
            return Err(Rejected::EmptySessionId);
        }
        Ok(Self {
            backend,
            session_id: session_id.to_string(),
            state: Mutex::new(ChatState::default()),
            busy: BusyFlag::new(),
        })
    }

    fn state(&self) -> MutexGuard<'_, ChatState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn append(&self, role: Role, content: impl Into<String>) -> Message {
        self.state().log.push(role, content)
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn messages(&self) -> Vec<Message> {
        self.state().log.messages().to_vec()
    }

    pub fn last_data_response(&self) -> Option<String> {
        self.state().last_data_response.clone()
    }

    pub fn can_generate_insights(&self) -> bool {
        self.state().last_data_response.is_some() && !self.busy.is_busy()
    }

    pub fn is_busy(&self) -> bool {
        self.busy.is_busy()
    }

    /// Ask the data agent a question.
    pub async fn send_prompt(&self, prompt: &str) -> Result<ChatOutcome, Rejected> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(Rejected::EmptyPrompt);
        }
        let _busy = self.busy.try_acquire().ok_or(Rejected::Busy)?;
        self.append(Role::User, prompt);

        let query = DataQuery {
            session_id: self.session_id.clone(),
            prompt: prompt.to_string(),
        };
        let start = Instant::now();
        let result = self.backend.chat_data(&query).await;
        let elapsed_ms = start.elapsed().as_millis() as u64;

        let outcome = match answer_text(result, |d| d.response) {
            Answer::Text(response) => {
                tracing::info!(session_id = %self.session_id, elapsed_ms, "data query answered");
                let message = {
                    let mut state = self.state();
                    state.last_data_response = Some(response.clone());
                    state.log.push(Role::Assistant, response)
                };
                ChatOutcome::Answered(message)
            }
            Answer::Refused => {
                tracing::warn!(session_id = %self.session_id, elapsed_ms, "data query not successful");
                ChatOutcome::Failed(self.append(Role::Assistant, text::CHAT_QUERY_FAILED))
            }
            Answer::Error(err) => {
                tracing::error!(session_id = %self.session_id, error = %err, "data query failed");
                let content = format!("{}: {}", text::CHAT_QUERY_ERROR, err.user_message());
                ChatOutcome::Failed(self.append(Role::Assistant, content))
            }
        };
        Ok(outcome)
    }

    /// Ask the insight agent to expand on the last data answer.
    pub async fn generate_insights(&self) -> Result<ChatOutcome, Rejected> {
        let context = self.last_data_response().ok_or(Rejected::NoDataResponse)?;
        let _busy = self.busy.try_acquire().ok_or(Rejected::Busy)?;

        let query = InsightQuery {
            session_id: self.session_id.clone(),
            context,
        };
        let result = self.backend.chat_insight(&query).await;

        let outcome = match answer_text(result, |d| d.insights) {
            Answer::Text(insights) => {
                tracing::info!(session_id = %self.session_id, "insights generated");
                ChatOutcome::Answered(
                    self.append(Role::Assistant, text::insights_message(&insights)),
                )
            }
            Answer::Refused => {
                tracing::warn!(session_id = %self.session_id, "insight request not successful");
                ChatOutcome::Failed(self.append(Role::Assistant, text::INSIGHTS_FAILED))
            }
            Answer::Error(err) => {
                tracing::error!(session_id = %self.session_id, error = %err, "insight request failed");
                let content = format!("{}: {}", text::INSIGHTS_ERROR, err.user_message());
                ChatOutcome::Failed(self.append(Role::Assistant, content))
            }
        };
        Ok(outcome)
    }

    /// Empty the transcript. The session id stays.
    pub fn clear(&self) {
        let mut state = self.state();
        state.log.clear();
        state.last_data_response = None;
    }

    /// Drop the agent's server-side conversation memory for this session.
    pub async fn forget_remote_memory(&self) -> Result<bool, ClientError> {
        let cleared = self
            .backend
            .clear_session_memory(&self.session_id)
            .await?
            .require_success()?;
        tracing::info!(session_id = %self.session_id, cleared = cleared.cleared, "remote memory cleared");
        Ok(cleared.cleared)
    }

    /// What the backend knows about this session.
    pub async fn remote_info(&self) -> Result<SessionInfo, ClientError> {
        Ok(self
            .backend
            .session_info(&self.session_id)
            .await?
            .require_success()?)
    }
}

enum Answer {
    Text(String),
    /// The backend answered but without `success` and a non-empty payload.
    Refused,
    Error(ClientError),
}

fn answer_text(
    result: Result<Envelope<ChatData>, ClientError>,
    pick: impl FnOnce(ChatData) -> Option<String>,
) -> Answer {
    match result {
        Ok(env) if env.is_success() => env
            .data
            .and_then(pick)
            .filter(|text| !text.is_empty())
            .map_or(Answer::Refused, Answer::Text),
        Ok(_) => Answer::Refused,
        Err(err) => Answer::Error(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Call, FakeBackend, Reply};
    use datadesk_types::SessionCleared;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn session(fake: FakeBackend) -> (ChatSession, Arc<FakeBackend>) {
        let fake = Arc::new(fake);
        (ChatSession::new(fake.clone(), "sessao_001").unwrap(), fake)
    }

    fn response(text: &str) -> ChatData {
        ChatData {
            response: Some(text.into()),
            ..ChatData::default()
        }
    }

    fn insights(text: &str) -> ChatData {
        ChatData {
            insights: Some(text.into()),
            ..ChatData::default()
        }
    }

    #[test]
    fn test_blank_session_id_is_rejected() {
        let fake: SharedBackend = Arc::new(FakeBackend::new());
        assert!(matches!(
            ChatSession::new(fake.clone(), "   "),
            Err(Rejected::EmptySessionId)
        ));
        let ok = ChatSession::new(fake, "  abc ").unwrap();
        assert_eq!(ok.session_id(), "abc");
    }

    #[tokio::test]
    async fn test_successful_query_records_answer() {
        let fake = FakeBackend::new();
        FakeBackend::script(&fake.chat_data, Reply::ok(response("A média é 42.")));
        let (chat, fake) = session(fake);

        let outcome = chat.send_prompt("qual a média?").await.unwrap();
        assert!(outcome.is_answered());
        assert_eq!(outcome.message().content, "A média é 42.");

        let messages = chat.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[0].content, "qual a média?");
        assert_eq!(messages[1].role, Role::Assistant);
        assert_eq!(chat.last_data_response().as_deref(), Some("A média é 42."));
        assert_eq!(
            fake.calls(),
            vec![Call::ChatData(DataQuery {
                session_id: "sessao_001".into(),
                prompt: "qual a média?".into(),
            })]
        );
    }

    #[tokio::test]
    async fn test_prompt_is_trimmed_before_logging_and_sending() {
        let fake = FakeBackend::new();
        FakeBackend::script(&fake.chat_data, Reply::ok(response("ok")));
        let (chat, fake) = session(fake);

        chat.send_prompt("  total por região?\n").await.unwrap();
        assert_eq!(chat.messages()[0].content, "total por região?");
        assert_eq!(
            fake.calls(),
            vec![Call::ChatData(DataQuery {
                session_id: "sessao_001".into(),
                prompt: "total por região?".into(),
            })]
        );
    }

    #[tokio::test]
    async fn test_empty_prompt_appends_nothing() {
        let (chat, fake) = session(FakeBackend::new());
        assert_eq!(chat.send_prompt("  \n").await, Err(Rejected::EmptyPrompt));
        assert!(chat.messages().is_empty());
        assert!(fake.calls().is_empty());
    }

    #[tokio::test]
    async fn test_unsuccessful_query_appends_one_error_message() {
        let fake = FakeBackend::new();
        FakeBackend::script(&fake.chat_data, Reply::failed("agent error"));
        let (chat, _) = session(fake);

        let outcome = chat.send_prompt("x").await.unwrap();
        assert!(!outcome.is_answered());

        let assistant: Vec<Message> = chat
            .messages()
            .into_iter()
            .filter(|m| m.role == Role::Assistant)
            .collect();
        assert_eq!(assistant.len(), 1);
        assert!(assistant[0].content.starts_with("❌"));
        assert_eq!(assistant[0].content, text::CHAT_QUERY_FAILED);
        assert_eq!(chat.last_data_response(), None);
    }

    #[tokio::test]
    async fn test_empty_response_counts_as_failure() {
        let fake = FakeBackend::new();
        FakeBackend::script(&fake.chat_data, Reply::ok(response("")));
        let (chat, _) = session(fake);
        let outcome = chat.send_prompt("x").await.unwrap();
        assert_eq!(outcome.message().content, text::CHAT_QUERY_FAILED);
    }

    #[tokio::test]
    async fn test_transport_failure_shows_reason() {
        let fake = FakeBackend::new();
        FakeBackend::script(&fake.chat_data, Reply::status(500, "Erro interno: timeout"));
        let (chat, _) = session(fake);
        let outcome = chat.send_prompt("x").await.unwrap();
        assert_eq!(outcome.message().content, "❌ Erro: Erro interno: timeout");
        assert!(outcome.message().is_error());
    }

    #[tokio::test]
    async fn test_insights_require_prior_answer() {
        let (chat, fake) = session(FakeBackend::new());
        assert!(!chat.can_generate_insights());
        assert_eq!(chat.generate_insights().await, Err(Rejected::NoDataResponse));
        assert!(fake.calls().is_empty());
        assert!(chat.messages().is_empty());
    }

    #[tokio::test]
    async fn test_insights_use_last_response_as_context() {
        let fake = FakeBackend::new();
        FakeBackend::script(&fake.chat_data, Reply::ok(response("vendas subiram 10%")));
        FakeBackend::script(&fake.chat_insight, Reply::ok(insights("- tendência positiva")));
        let (chat, fake) = session(fake);

        chat.send_prompt("como foram as vendas?").await.unwrap();
        assert!(chat.can_generate_insights());
        let outcome = chat.generate_insights().await.unwrap();

        assert_eq!(
            outcome.message().content,
            "## 💡 Insights Gerados\n\n- tendência positiva"
        );
        assert_eq!(
            fake.calls().last(),
            Some(&Call::ChatInsight(InsightQuery {
                session_id: "sessao_001".into(),
                context: "vendas subiram 10%".into(),
            }))
        );
    }

    #[tokio::test]
    async fn test_insight_failures() {
        let fake = FakeBackend::new();
        FakeBackend::script(&fake.chat_data, Reply::ok(response("r")));
        FakeBackend::script(&fake.chat_insight, Reply::failed("nope"));
        let (chat, fake) = session(fake);
        chat.send_prompt("p").await.unwrap();

        let outcome = chat.generate_insights().await.unwrap();
        assert_eq!(outcome.message().content, text::INSIGHTS_FAILED);

        FakeBackend::script(&fake.chat_insight, Reply::status(503, "indisponível"));
        let outcome = chat.generate_insights().await.unwrap();
        assert_eq!(
            outcome.message().content,
            "❌ Erro ao gerar insights: indisponível"
        );
    }

    #[tokio::test]
    async fn test_clear_keeps_session_id() {
        let fake = FakeBackend::new();
        FakeBackend::script(&fake.chat_data, Reply::ok(response("r")));
        let (chat, _) = session(fake);
        chat.send_prompt("p").await.unwrap();

        chat.clear();
        assert!(chat.messages().is_empty());
        assert_eq!(chat.last_data_response(), None);
        assert_eq!(chat.session_id(), "sessao_001");
        assert!(!chat.can_generate_insights());
    }

    #[tokio::test]
    async fn test_second_prompt_while_busy_is_rejected() {
        let (fake, gate) = FakeBackend::gated();
        FakeBackend::script(&fake.chat_data, Reply::ok(response("r")));
        let (chat, fake) = session(fake);

        let first = chat.send_prompt("um");
        let second = async {
            tokio::task::yield_now().await;
            assert!(chat.is_busy());
            let rejected = chat.send_prompt("dois").await;
            let insights = chat.generate_insights().await;
            gate.add_permits(1);
            (rejected, insights)
        };
        let (first, (rejected, insights)) = tokio::join!(first, second);

        assert!(first.unwrap().is_answered());
        assert_eq!(rejected, Err(Rejected::Busy));
        assert_eq!(insights, Err(Rejected::NoDataResponse));
        assert_eq!(fake.calls().len(), 1);
        assert_eq!(chat.messages().len(), 2);
        assert!(!chat.is_busy());
    }

    #[tokio::test]
    async fn test_forget_remote_memory() {
        let fake = FakeBackend::new();
        FakeBackend::script(
            &fake.clear_memory,
            Reply::ok(SessionCleared {
                session_id: "sessao_001".into(),
                cleared: true,
            }),
        );
        let (chat, fake) = session(fake);
        assert!(chat.forget_remote_memory().await.unwrap());
        assert_eq!(fake.calls(), vec![Call::ClearMemory("sessao_001".into())]);
    }

    #[tokio::test]
    async fn test_remote_info_propagates_errors() {
        let fake = FakeBackend::new();
        FakeBackend::script(&fake.session_info, Reply::status(404, "Sessão não encontrada"));
        let (chat, _) = session(fake);
        let err = chat.remote_info().await.unwrap_err();
        assert_eq!(err.status(), Some(404));
        assert_eq!(err.user_message(), "Sessão não encontrada");
    }
}
