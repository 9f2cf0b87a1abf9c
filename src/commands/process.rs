//! The `process` command: itemize receipt images and append their line items to the ledger.

use crate::api::{chat_model, Mode};
use crate::args::ProcessArgs;
use crate::commands::Out;
use crate::error::{Error, ErrorType, IntoResult, Res};
use crate::extract::{interpret, ExtractionClient, Interpretation};
use crate::image::{encode_image, ImageMime};
use crate::model::Ledger;
use crate::{utils, Config, Result};
use anyhow::anyhow;
use chrono::{Local, NaiveDate};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// What happened to one receipt.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ReceiptStatus {
    /// The receipt was itemized and `rows` rows were appended to the ledger.
    Appended { rows: usize },
    /// The model did not itemize the image. `message` is whatever it said instead.
    Refused { message: String },
    /// The receipt could not be processed. Only produced by the batch.
    Failed {
        error_type: ErrorType,
        message: String,
    },
}

/// The status of one image in a batch.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct ReceiptOutcome {
    image: PathBuf,
    #[serde(flatten)]
    status: ReceiptStatus,
}

impl ReceiptOutcome {
    pub fn image(&self) -> &Path {
        &self.image
    }

    pub fn status(&self) -> &ReceiptStatus {
        &self.status
    }
}

/// The structured output of the `process` command.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct ProcessSummary {
    ledger: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    backup: Option<PathBuf>,
    rows_appended: usize,
    receipts: Vec<ReceiptOutcome>,
}

impl ProcessSummary {
    pub fn ledger(&self) -> &Path {
        &self.ledger
    }

    /// The copy of the ledger taken before it was overwritten, if there was one.
    pub fn backup(&self) -> Option<&Path> {
        self.backup.as_deref()
    }

    pub fn rows_appended(&self) -> usize {
        self.rows_appended
    }

    pub fn receipts(&self) -> &[ReceiptOutcome] {
        &self.receipts
    }

    /// An error typed after the first failed receipt, if any receipt failed.
    fn failure_error(&self) -> Option<Error> {
        let failures: Vec<(&Path, ErrorType)> = self
            .receipts
            .iter()
            .filter_map(|outcome| match outcome.status {
                ReceiptStatus::Failed { error_type, .. } => {
                    Some((outcome.image.as_path(), error_type))
                }
                _ => None,
            })
            .collect();
        let (first, error_type) = failures.first()?;
        Some(Error::new(
            *error_type,
            anyhow!(
                "{} of {} receipts could not be processed, the first was {}",
                failures.len(),
                self.receipts.len(),
                first.display()
            ),
        ))
    }
}

/// Itemizes the receipt at `image_path` and appends one row per line item to `ledger`.
///
/// The image is labeled with `mime` when given, otherwise its format is detected. `today` is the
/// date used for a receipt that has none.
///
/// On any error `ledger` is left exactly as it was.
///
/// # Errors
/// - `ErrorType::NotFound` if the image cannot be read.
/// - `ErrorType::NoResponse` if the model returned nothing.
/// - `ErrorType::Transport` if the request failed.
/// - `ErrorType::MalformedExtraction` if the tool call arguments do not decode.
pub async fn process_receipt(
    client: &mut ExtractionClient,
    ledger: &mut Ledger,
    image_path: &Path,
    mime: Option<ImageMime>,
    today: NaiveDate,
) -> Result<ReceiptStatus> {
    let image = encode_image(image_path, mime).await?;
    let response = client.extract(&image).await?;

    match interpret(&response)? {
        Interpretation::Extracted(receipt) => {
            let rows = receipt.into_rows(today);
            let count = if rows.is_empty() {
                0
            } else {
                ledger.append_rows(rows)
            };
            info!("Itemized {}: {count} rows", image_path.display());
            Ok(ReceiptStatus::Appended { rows: count })
        }
        Interpretation::Refusal(message) => {
            warn!(
                "The model did not itemize {}: {}",
                image_path.display(),
                message
            );
            Ok(ReceiptStatus::Refused { message })
        }
    }
}

/// Processes `args.images()` in order against one ledger, then saves the ledger if anything was
/// appended. The existing ledger file is backed up before it is overwritten.
///
/// A receipt that fails is recorded and the rest are still processed.
///
/// # Errors
/// - Returns an error if the config, model client, or ledger cannot be set up or saved.
/// - Returns an error after saving if any receipt failed. Its type is that of the first failure.
pub async fn process(config: Config, mode: Mode, args: ProcessArgs) -> Result<Out<ProcessSummary>> {
    let ledger_path = args
        .ledger()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| config.ledger_path());
    let mime = args.mime().or(config.image_mime());

    let model = chat_model(&config, mode)?;
    let mut client = ExtractionClient::new(model, config.model(), config.retry());
    let mut ledger = Ledger::load(&ledger_path)
        .await
        .pub_result(ErrorType::Ledger)?;
    let today = Local::now().date_naive();

    let mut receipts = Vec::with_capacity(args.images().len());
    for image in args.images() {
        let status = match process_receipt(&mut client, &mut ledger, image, mime, today).await {
            Ok(status) => status,
            Err(e) => {
                error!("Unable to process {}: {e}", image.display());
                ReceiptStatus::Failed {
                    error_type: e.error_type(),
                    message: e.to_string(),
                }
            }
        };
        receipts.push(ReceiptOutcome {
            image: image.clone(),
            status,
        });
    }

    let rows_appended = receipts
        .iter()
        .map(|outcome| match outcome.status {
            ReceiptStatus::Appended { rows } => rows,
            _ => 0,
        })
        .sum::<usize>();

    let backup = if rows_appended > 0 {
        save_ledger(&config, &ledger, &ledger_path)
            .await
            .pub_result(ErrorType::Ledger)?
    } else {
        None
    };

    let summary = ProcessSummary {
        ledger: ledger_path,
        backup,
        rows_appended,
        receipts,
    };

    let total = summary.receipts.len();
    if let Some(e) = summary.failure_error() {
        return Err(e);
    }

    let message = format!(
        "Appended {} rows from {} receipts to {}",
        summary.rows_appended,
        total,
        summary.ledger.display()
    );
    Ok(Out::new(message, summary))
}

/// Backs up the current ledger file, if there is one, and overwrites it.
async fn save_ledger(
    config: &Config,
    ledger: &Ledger,
    ledger_path: &Path,
) -> Res<Option<PathBuf>> {
    let backup = if ledger_path.is_file() {
        Some(config.backup().copy_ledger(ledger_path).await?)
    } else {
        if let Some(parent) = ledger_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            utils::make_dir(parent).await?;
        }
        None
    };
    ledger.save(ledger_path).await?;
    info!("Saved {} rows to {}", ledger.len(), ledger_path.display());
    Ok(backup)
}
