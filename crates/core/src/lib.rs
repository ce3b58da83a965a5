// crates/core/src/lib.rs
pub mod busy;
pub mod chat;
pub mod error;
pub mod message;
pub mod pages;
pub mod table;
pub mod text;
pub mod upload;

#[cfg(test)]
mod testing;

pub use chat::{ChatOutcome, ChatSession};
pub use error::Rejected;
pub use message::{Message, Role};
pub use pages::{parse_tickers, ChatPage, FeatureCard, FinanceNotice, FinancePage, LandingPage};
pub use table::{DataTable, DEFAULT_PAGE_SIZE};
pub use upload::{
    SelectedFile, Stage, StepOutcome, UploadSnapshot, UploadState, UploadWorkflow, PREVIEW_LIMIT,
};
