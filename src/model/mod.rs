//! Types that represent the core data model, such as `ReceiptExtraction` and `Ledger`.
mod amount;
mod ledger;
mod receipt;

pub use amount::{Amount, AmountError};
pub use ledger::{Ledger, LedgerColumn, LedgerRow, UNCATEGORIZED, UNKNOWN_PAYMENT};
pub use receipt::{Category, LineItem, PaymentMethod, ReceiptExtraction};
