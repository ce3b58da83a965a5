// crates/cli/src/main.rs
//! datadesk binary.
//!
//! Terminal rendition of the data-agent front-end: upload and inspect CSV
//! datasets, clean and index them, then chat with the agents over the
//! indexed session.

mod args;
mod commands;
mod pager;
mod repl;
mod spinner;

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use datadesk_client::{ClientConfig, HttpBackend, SharedBackend};
use datadesk_core::ChatPage;
use datadesk_types::AnalysisRequest;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::args::{Cli, Command};
use crate::commands::UploadOptions;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _log_guard = datadesk_observability::init_tracing(&cli.log_config())?;

    let config = cli.client_config(ClientConfig::from_env());
    tracing::debug!(base_url = %config.base_url, timeout = ?config.timeout, "client configured");
    let backend: SharedBackend = Arc::new(HttpBackend::new(&config)?);

    let mut input = BufReader::new(tokio::io::stdin()).lines();
    let mut out = std::io::stdout();

    match cli.command {
        Command::Home => commands::home(&mut out),
        Command::Health => commands::health(&backend, &mut out).await,
        Command::Datasets => commands::datasets(&backend, &mut out).await,
        Command::Upload {
            file,
            clean,
            session,
            browse,
            page_size,
        } => {
            let options = UploadOptions {
                clean,
                session,
                browse,
                page_size,
            };
            commands::upload(backend, &file, options, &mut input, &mut out).await
        }
        Command::Preview {
            dataset_id,
            browse,
            page_size,
        } => {
            commands::preview(&backend, &dataset_id, page_size, browse, &mut input, &mut out).await
        }
        Command::Clean { dataset_id } => commands::clean(&backend, &dataset_id, &mut out).await,
        Command::Index {
            dataset_id,
            session,
        } => commands::index(&backend, &dataset_id, &session, &mut out).await,
        Command::Chat { session } => {
            let mut page = ChatPage::new(backend);
            repl::chat_loop(&mut page, session, &mut input, &mut out).await
        }
        Command::Search {
            session,
            query,
            top_k,
        } => commands::search(&backend, &session, &query, top_k, &mut out).await,
        Command::Stats { session } => commands::stats(&backend, &session, &mut out).await,
        Command::ForgetVectors { session } => {
            commands::forget_vectors(&backend, &session, &mut out).await
        }
        Command::Analyze {
            estoque,
            vendas,
            precos,
        } => {
            let request = AnalysisRequest::new(
                estoque.as_deref(),
                vendas.as_deref(),
                precos.as_deref(),
            );
            commands::analyze(&backend, &request, &mut out).await
        }
        Command::Finance { tickers } => commands::finance(&tickers, &mut out).await,
    }
}
