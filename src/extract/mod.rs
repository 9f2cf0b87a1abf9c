//! Turns an encoded receipt image into a `ReceiptExtraction` by way of the `itemize_receipt` tool.

mod client;
mod interpret;
mod schema;

pub use client::{ExtractionClient, SYSTEM_PROMPT, TEMPERATURE};
pub use interpret::{interpret, Interpretation};
pub use schema::{itemize_receipt_tool, ITEMIZE_RECEIPT, REQUIRED_FIELDS};
