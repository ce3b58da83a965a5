// crates/types/src/lib.rs
//! Wire and data-model types shared by the datadesk crates.
//!
//! Every backend response is wrapped in an [`Envelope`]; the payload types in
//! [`dataset`], [`chat`] and [`vectors`] describe what sits inside `data`.

pub mod analysis;
pub mod chat;
pub mod dataset;
pub mod envelope;
pub mod system;
pub mod vectors;

pub use analysis::*;
pub use chat::*;
pub use dataset::*;
pub use envelope::*;
pub use system::*;
pub use vectors::*;
