// crates/cli/src/args.rs
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use datadesk_client::ClientConfig;
use datadesk_core::DEFAULT_PAGE_SIZE;
use datadesk_observability::LogConfig;
use datadesk_types::DEFAULT_TOP_K;

#[derive(Debug, Parser)]
#[command(name = "datadesk", version, about = "Terminal front-end for the data-agent backend")]
pub struct Cli {
    /// Backend base URL [env: DATADESK_API_URL] [default: http://localhost:8000]
    #[arg(long, global = true, value_name = "URL")]
    pub api_url: Option<String>,

    /// Per-request timeout in seconds, 0 for none [env: DATADESK_TIMEOUT_SECS]
    #[arg(long, global = true, value_name = "SECS")]
    pub timeout_secs: Option<u64>,

    /// Debug logging for datadesk crates
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Also write logs to a daily-rolling file in DIR
    #[arg(long, global = true, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show the welcome page
    Home,
    /// Check that the backend is up
    Health,
    /// List uploaded datasets
    Datasets,
    /// Upload a CSV, show its preview and optionally clean and index it
    Upload {
        file: PathBuf,
        /// Run cleaning after the upload
        #[arg(long)]
        clean: bool,
        /// Index into this session after the upload (and cleaning)
        #[arg(long, value_name = "SESSION_ID")]
        session: Option<String>,
        /// Page through the preview interactively
        #[arg(long)]
        browse: bool,
        #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
        page_size: usize,
    },
    /// Show the preview sample of a dataset
    Preview {
        dataset_id: String,
        #[arg(long)]
        browse: bool,
        #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
        page_size: usize,
    },
    /// Run cleaning on a dataset
    Clean { dataset_id: String },
    /// Index a dataset into a vector session
    Index {
        dataset_id: String,
        #[arg(long, value_name = "SESSION_ID")]
        session: String,
    },
    /// Chat with the data agents of a session
    Chat {
        /// Asked for interactively when omitted
        #[arg(long, value_name = "SESSION_ID")]
        session: Option<String>,
    },
    /// Semantic search over a session's vectors
    Search {
        #[arg(long, value_name = "SESSION_ID")]
        session: String,
        query: String,
        #[arg(long, default_value_t = DEFAULT_TOP_K)]
        top_k: u32,
    },
    /// Vector store statistics for a session
    Stats { session: String },
    /// Delete every vector indexed under a session
    ForgetVectors { session: String },
    /// Cross-check cleaned datasets: stock vs sales, price divergence
    Analyze {
        /// Stock dataset id
        #[arg(long, value_name = "DATASET_ID")]
        estoque: Option<String>,
        /// Sales dataset id, required by both rules
        #[arg(long, value_name = "DATASET_ID")]
        vendas: Option<String>,
        /// Price-list dataset id
        #[arg(long, value_name = "DATASET_ID")]
        precos: Option<String>,
    },
    /// Financial query (not available yet)
    Finance {
        /// Comma-separated tickers, e.g. "AAPL, MSFT"
        tickers: String,
    },
}

impl Cli {
    /// Environment first, flags on top.
    pub fn client_config(&self, env: ClientConfig) -> ClientConfig {
        let mut config = env;
        if let Some(url) = &self.api_url {
            config = config.with_base_url(url.clone());
        }
        if let Some(secs) = self.timeout_secs {
            config = config.with_timeout((secs > 0).then(|| Duration::from_secs(secs)));
        }
        config
    }

    pub fn log_config(&self) -> LogConfig {
        LogConfig {
            verbose: self.verbose,
            log_dir: self.log_dir.clone(),
            ..LogConfig::default()
        }
    }
}
