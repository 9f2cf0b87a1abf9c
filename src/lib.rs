//! Itemizes photographed receipts with a vision language model and appends the line items to a
//! CSV expense ledger.
//!
//! Each image is sent to an OpenAI-compatible chat completions endpoint together with a single
//! function tool, `itemize_receipt`. When the model calls the tool, its arguments are decoded as a
//! `model::ReceiptExtraction` and every line item becomes a `model::LedgerRow`. When it answers
//! with text instead, nothing is written.

pub mod api;
pub mod args;
mod backup;
pub mod commands;
mod config;
mod error;
pub mod extract;
pub mod image;
pub mod model;
mod utils;


pub use api::Mode;
pub use backup::Backup;
pub use config::Config;
pub use error::{Error, ErrorType, Result};
