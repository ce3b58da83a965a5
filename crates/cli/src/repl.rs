// crates/cli/src/repl.rs
//! Line-oriented chat loop on top of [`ChatPage`].

use std::io::Write;

use datadesk_core::{ChatOutcome, ChatPage, ChatSession, Message};
use tokio::io::{AsyncBufRead, Lines};

use crate::spinner::spin;

const HELP: &str = "Comandos: /insights  /clear  /forget  /info  /new  /help  /quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Prompt(String),
    Insights,
    Clear,
    Forget,
    Info,
    New,
    Help,
    Quit,
    Unknown(String),
}

impl ReplCommand {
    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        if !trimmed.starts_with('/') {
            return Self::Prompt(line.to_string());
        }
        match trimmed {
            "/insights" => Self::Insights,
            "/clear" => Self::Clear,
            "/forget" => Self::Forget,
            "/info" => Self::Info,
            "/new" => Self::New,
            "/help" | "/?" => Self::Help,
            "/quit" | "/exit" | "/q" => Self::Quit,
            other => Self::Unknown(other.to_string()),
        }
    }
}

fn print_message<W: Write>(out: &mut W, message: &Message) -> std::io::Result<()> {
    writeln!(out, "{}: {}\n", message.role.label(), message.content)
}

fn print_outcome<W: Write>(out: &mut W, outcome: &ChatOutcome) -> std::io::Result<()> {
    print_message(out, outcome.message())
}

/// Run the chat until `/quit` or end of input. `initial` is tried as the
/// first session id; when absent or blank the id is asked for.
pub async fn chat_loop<R, W>(
    page: &mut ChatPage,
    mut initial: Option<String>,
    input: &mut Lines<R>,
    out: &mut W,
) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    loop {
        if !page.is_started() {
            let id = match initial.take() {
                Some(id) => id,
                None => {
                    write!(out, "Session ID: ")?;
                    out.flush()?;
                    match input.next_line().await? {
                        Some(line) => line,
                        None => return Ok(()),
                    }
                }
            };
            page.set_session_input(id);
            match page.start() {
                Ok(session) => {
                    writeln!(out, "{}\nSessão: {}\n{HELP}\n", ChatPage::TITLE, session.session_id())?;
                }
                Err(rejected) => {
                    writeln!(out, "{rejected}")?;
                    continue;
                }
            }
        }

        let Some(session) = page.session() else {
            continue;
        };
        write!(out, "> ")?;
        out.flush()?;
        let Some(line) = input.next_line().await? else {
            return Ok(());
        };

        match ReplCommand::parse(&line) {
            ReplCommand::Quit => return Ok(()),
            ReplCommand::New => {
                page.leave();
            }
            ReplCommand::Help => writeln!(out, "{HELP}")?,
            ReplCommand::Unknown(cmd) => writeln!(out, "Comando desconhecido: {cmd}\n{HELP}")?,
            ReplCommand::Clear => {
                session.clear();
                writeln!(out, "Conversa limpa.")?;
            }
            ReplCommand::Forget => forget(session, out).await?,
            ReplCommand::Info => info(session, out).await?,
            ReplCommand::Insights => {
                match spin("Gerando insights...", session.generate_insights()).await {
                    Ok(outcome) => print_outcome(out, &outcome)?,
                    Err(rejected) => writeln!(out, "{rejected}")?,
                }
            }
            ReplCommand::Prompt(prompt) => {
                match spin("Processando...", session.send_prompt(&prompt)).await {
                    Ok(outcome) => print_outcome(out, &outcome)?,
                    // blank lines are just ignored
                    Err(datadesk_core::Rejected::EmptyPrompt) => {}
                    Err(rejected) => writeln!(out, "{rejected}")?,
                }
            }
        }
    }
}

async fn forget<W: Write>(session: &ChatSession, out: &mut W) -> anyhow::Result<()> {
    session.clear();
    match session.forget_remote_memory().await {
        Ok(true) => writeln!(out, "Memória da sessão {} apagada.", session.session_id())?,
        Ok(false) => writeln!(out, "Sessão {} não tinha memória no servidor.", session.session_id())?,
        Err(err) => writeln!(out, "{}: {}", datadesk_core::text::CHAT_QUERY_ERROR, err.user_message())?,
    }
    Ok(())
}

async fn info<W: Write>(session: &ChatSession, out: &mut W) -> anyhow::Result<()> {
    match session.remote_info().await {
        Ok(info) => writeln!(out, "{}", serde_json::to_string_pretty(&info.session_info)?)?,
        Err(err) => writeln!(out, "{}: {}", datadesk_core::text::CHAT_QUERY_ERROR, err.user_message())?,
    }
    Ok(())
}
