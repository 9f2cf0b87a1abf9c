//! The structured data that a model returns when it itemizes a receipt.

use crate::model::{Amount, LedgerRow};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;

/// The arguments of an `itemize_receipt` tool call.
///
/// `items` must be present. Every other field may be missing, in which case a default is
/// applied when the receipt is expanded into ledger rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ReceiptExtraction {
    pub(crate) vendor: Option<String>,
    pub(crate) date: Option<NaiveDate>,
    pub(crate) items: Vec<LineItem>,
    pub(crate) payment_method: Option<PaymentMethod>,
}

impl ReceiptExtraction {
    pub fn vendor(&self) -> Option<&str> {
        self.vendor.as_deref()
    }

    pub fn date(&self) -> Option<NaiveDate> {
        self.date
    }

    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    pub fn payment_method(&self) -> Option<PaymentMethod> {
        self.payment_method
    }

    /// Consumes the receipt and produces one ledger row per item, in the order the items were
    /// extracted. `today` is used when the receipt has no date.
    pub fn into_rows(self, today: NaiveDate) -> Vec<LedgerRow> {
        let date = self.date.unwrap_or(today);
        let vendor = self.vendor.unwrap_or_default();
        let payment_method = self.payment_method;
        self.items
            .into_iter()
            .map(|item| LedgerRow {
                date,
                vendor: vendor.clone(),
                name: item.name.unwrap_or_default(),
                quantity: item.quantity.map_or(DEFAULT_QUANTITY, NonZeroU32::get),
                price: item.price.unwrap_or(Amount::ZERO),
                category: item.category,
                payment_method,
            })
            .collect()
    }
}

const DEFAULT_QUANTITY: u32 = 1;

/// A single purchased item on a receipt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LineItem {
    pub(crate) name: Option<String>,
    pub(crate) price: Option<Amount>,
    /// Zero, negative and fractional quantities fail to decode.
    pub(crate) quantity: Option<NonZeroU32>,
    pub(crate) category: Option<Category>,
}

impl LineItem {
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn price(&self) -> Option<Amount> {
        self.price
    }

    pub fn quantity(&self) -> Option<u32> {
        self.quantity.map(NonZeroU32::get)
    }

    pub fn category(&self) -> Option<Category> {
        self.category
    }
}

/// The closed set of categories a model may assign to a line item.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    TakeOut,
    Meal,
    Groceries,
    Clothing,
    Electronics,
    Supplies,
    Other,
}

serde_plain::derive_display_from_serialize!(Category);
serde_plain::derive_fromstr_from_deserialize!(Category);

impl Category {
    pub const ALL: [Category; 7] = [
        Category::TakeOut,
        Category::Meal,
        Category::Groceries,
        Category::Clothing,
        Category::Electronics,
        Category::Supplies,
        Category::Other,
    ];
}

/// The closed set of payment methods a model may report.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Credit,
    Debit,
    Mobile,
    Other,
}

serde_plain::derive_display_from_serialize!(PaymentMethod);
serde_plain::derive_fromstr_from_deserialize!(PaymentMethod);

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 5] = [
        PaymentMethod::Cash,
        PaymentMethod::Credit,
        PaymentMethod::Debit,
        PaymentMethod::Mobile,
        PaymentMethod::Other,
    ];
}
