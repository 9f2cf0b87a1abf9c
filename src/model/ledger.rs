//! The expense ledger: a CSV table that receipt rows are appended to.

use crate::error::Res;
use crate::model::{Amount, Category, PaymentMethod};
use crate::utils;
use anyhow::{bail, Context};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::Cursor;
use std::path::Path;
use tracing::debug;

/// Written in the Category column when the model did not categorize an item.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Written in the Payment method column when the model did not report one.
pub const UNKNOWN_PAYMENT: &str = "Unknown";

/// One normalized row of the ledger, produced from one receipt line item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LedgerRow {
    pub(crate) date: NaiveDate,
    pub(crate) vendor: String,
    pub(crate) name: String,
    pub(crate) quantity: u32,
    pub(crate) price: Amount,
    pub(crate) category: Option<Category>,
    pub(crate) payment_method: Option<PaymentMethod>,
}

impl LedgerRow {
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn vendor(&self) -> &str {
        &self.vendor
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn price(&self) -> Amount {
        self.price
    }

    pub fn category(&self) -> Option<Category> {
        self.category
    }

    pub fn payment_method(&self) -> Option<PaymentMethod> {
        self.payment_method
    }

    /// The text written to the ledger for `column`.
    pub fn cell(&self, column: LedgerColumn) -> String {
        match column {
            LedgerColumn::Date => self.date.format("%Y-%m-%d").to_string(),
            LedgerColumn::Vendor => self.vendor.clone(),
            LedgerColumn::Name => self.name.clone(),
            LedgerColumn::Quantity => self.quantity.to_string(),
            LedgerColumn::Price => self.price.to_string(),
            LedgerColumn::Category => self
                .category
                .map(|c| c.to_string())
                .unwrap_or_else(|| UNCATEGORIZED.to_string()),
            LedgerColumn::PaymentMethod => self
                .payment_method
                .map(|p| p.to_string())
                .unwrap_or_else(|| UNKNOWN_PAYMENT.to_string()),
        }
    }

    /// All cells in `LedgerColumn::ALL` order.
    pub fn cells(&self) -> Vec<String> {
        LedgerColumn::ALL.iter().map(|&c| self.cell(c)).collect()
    }
}

/// The columns that receipt rows populate, named by their header text.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub enum LedgerColumn {
    Date,
    Vendor,
    Name,
    Quantity,
    Price,
    Category,
    #[serde(rename = "Payment method")]
    PaymentMethod,
}

serde_plain::derive_display_from_serialize!(LedgerColumn);
serde_plain::derive_fromstr_from_deserialize!(LedgerColumn);

impl LedgerColumn {
    pub const ALL: [LedgerColumn; 7] = [
        LedgerColumn::Date,
        LedgerColumn::Vendor,
        LedgerColumn::Name,
        LedgerColumn::Quantity,
        LedgerColumn::Price,
        LedgerColumn::Category,
        LedgerColumn::PaymentMethod,
    ];

    /// The header row of a ledger created by this program.
    pub fn headers() -> Vec<String> {
        Self::ALL.iter().map(|c| c.to_string()).collect()
    }
}

/// The ledger table. Existing rows are treated as opaque text; new rows are only ever appended.
#[derive(Debug, Default, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Ledger {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Ledger {
    /// Creates a ledger from a header row and data rows. Rows shorter than the header are padded
    /// with empty cells.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Res<Self> {
        let len = headers.len();
        let mut padded = Vec::with_capacity(rows.len());
        for (ix, mut row) in rows.into_iter().enumerate() {
            if row.len() > len {
                bail!(
                    "A row longer than the headers list was encountered at row {}",
                    ix + 2
                );
            }
            row.resize(len, String::new());
            padded.push(row);
        }
        Ok(Self {
            headers,
            rows: padded,
        })
    }

    /// Reads the ledger at `path`. A missing or empty file is an empty ledger.
    pub async fn load(path: &Path) -> Res<Self> {
        if !path.exists() {
            debug!("No ledger at {}, starting an empty one", path.display());
            return Ok(Self::default());
        }
        let content = utils::read_bytes(path).await?;
        Self::from_csv(&content).with_context(|| format!("Unable to parse {}", path.display()))
    }

    /// Overwrites `path` with the full contents of the ledger.
    pub async fn save(&self, path: &Path) -> Res<()> {
        let data = self.to_csv()?;
        utils::write(path, data).await
    }

    /// Appends `rows` after the existing rows, preserving their order. Cells are placed by
    /// header name. Ledger columns missing from the header are added to the end of it.
    pub fn append_rows(&mut self, rows: impl IntoIterator<Item = LedgerRow>) -> usize {
        let index = self.ensure_columns();
        let width = self.headers.len();
        let mut count = 0;
        for row in rows {
            let mut cells = vec![String::new(); width];
            for column in LedgerColumn::ALL {
                if let Some(&ix) = index.get(&column) {
                    cells[ix] = row.cell(column);
                }
            }
            self.rows.push(cells);
            count += 1;
        }
        count
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Makes sure every `LedgerColumn` has a header and returns where each one lives.
    fn ensure_columns(&mut self) -> HashMap<LedgerColumn, usize> {
        let mut index = HashMap::new();
        for column in LedgerColumn::ALL {
            let header = column.to_string();
            let ix = match self.headers.iter().position(|h| h.trim() == header) {
                Some(ix) => ix,
                None => {
                    self.headers.push(header);
                    for row in self.rows.iter_mut() {
                        row.push(String::new());
                    }
                    self.headers.len() - 1
                }
            };
            index.insert(column, ix);
        }
        index
    }

    fn from_csv(data: &[u8]) -> Res<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(Cursor::new(data));

        let mut records = rdr.records();
        let headers: Vec<String> = match records.next() {
            Some(record) => record?.iter().map(|s| s.to_string()).collect(),
            None => return Ok(Self::default()),
        };

        let mut rows = Vec::new();
        for result in records {
            let record = result?;
            rows.push(record.iter().map(|s| s.to_string()).collect());
        }
        Self::new(headers, rows)
    }

    fn to_csv(&self) -> Res<Vec<u8>> {
        let mut wtr = csv::WriterBuilder::new().from_writer(Vec::new());
        if self.headers.is_empty() {
            wtr.write_record(LedgerColumn::headers())?;
        } else {
            wtr.write_record(&self.headers)?;
        }
        for row in &self.rows {
            wtr.write_record(row)?;
        }
        wtr.into_inner()
            .map_err(|e| anyhow::anyhow!("Unable to flush the ledger CSV writer: {}", e.error()))
    }
}
