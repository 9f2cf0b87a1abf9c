//! These structs provide the CLI interface for the receipts CLI.

use crate::image::ImageMime;
use clap::{Parser, Subcommand};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::error;
use tracing_subscriber::filter::LevelFilter;

/// receipts: A command-line tool for itemizing receipts into an expense ledger.
///
/// Each photographed receipt is sent to a vision language model, which is asked to call the
/// itemize_receipt tool with the vendor, date, payment method and line items it can read. Every
/// line item becomes a row in a CSV ledger.
///
/// The API key is read from the environment variable named in config.json, OPENAI_API_KEY by
/// default.
#[derive(Debug, Parser, Clone)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn new(common: Common, command: Command) -> Self {
        Self { common, command }
    }

    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create the home directory and initialize the configuration file.
    ///
    /// This is the first command you should run. By default the home directory is
    /// $HOME/receipts and the ledger is expenses.csv inside of it.
    Init(InitArgs),
    /// Itemize one or more receipt images and append the line items to the ledger.
    ///
    /// Images are processed one at a time in the order given. A receipt that fails does not stop
    /// the others, but the command exits with an error after the ledger has been saved.
    Process(ProcessArgs),
    /// Print the itemize_receipt tool declaration that is sent to the model.
    Schema,
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The directory where the configuration and, by default, the ledger are held. Defaults to
    /// ~/receipts
    #[arg(long, env = "RECEIPTS_HOME", default_value_t = default_receipts_home())]
    receipts_home: DisplayPath,
}

impl Common {
    pub fn new(log_level: LevelFilter, receipts_home: PathBuf) -> Self {
        Self {
            log_level,
            receipts_home: receipts_home.into(),
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn receipts_home(&self) -> &DisplayPath {
        &self.receipts_home
    }
}

/// (Not shown): Args for the `receipts init` command.
#[derive(Debug, Parser, Clone)]
pub struct InitArgs {
    /// Where the ledger CSV should live. Relative paths are relative to the home directory.
    #[arg(long)]
    ledger: Option<PathBuf>,

    /// The model to request, e.g. gpt-4o
    #[arg(long)]
    model: Option<String>,
}

impl InitArgs {
    pub fn new(ledger: Option<PathBuf>, model: Option<String>) -> Self {
        Self { ledger, model }
    }

    pub fn ledger(&self) -> Option<&Path> {
        self.ledger.as_deref()
    }

    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }
}

/// (Not shown): Args for the `receipts process` command.
#[derive(Debug, Parser, Clone)]
pub struct ProcessArgs {
    /// The receipt images to itemize, in the order their rows should be appended.
    #[arg(required = true)]
    images: Vec<PathBuf>,

    /// Append to this ledger instead of the one in config.json.
    #[arg(long)]
    ledger: Option<PathBuf>,

    /// Label every image with this format instead of detecting it.
    #[arg(long, value_enum)]
    mime: Option<ImageMime>,
}

impl ProcessArgs {
    pub fn new(images: Vec<PathBuf>, ledger: Option<PathBuf>, mime: Option<ImageMime>) -> Self {
        Self {
            images,
            ledger,
            mime,
        }
    }

    pub fn images(&self) -> &[PathBuf] {
        &self.images
    }

    pub fn ledger(&self) -> Option<&Path> {
        self.ledger.as_deref()
    }

    pub fn mime(&self) -> Option<ImageMime> {
        self.mime
    }
}

fn default_receipts_home() -> DisplayPath {
    DisplayPath(match dirs::home_dir() {
        Some(home) => home.join("receipts"),
        None => {
            error!(
                "There was an error when trying to get your home directory. You can get around \
                this by providing --receipts-home or RECEIPTS_HOME instead of relying on the \
                default receipts home directory. If you continue using the program right now, \
                you may have problems!",
            );
            PathBuf::from("receipts")
        }
    })
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DisplayPath(PathBuf);

impl From<PathBuf> for DisplayPath {
    fn from(value: PathBuf) -> Self {
        DisplayPath(value)
    }
}

impl Deref for DisplayPath {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<Path> for DisplayPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Display for DisplayPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_string_lossy())
    }
}

impl FromStr for DisplayPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(PathBuf::from(s)))
    }
}

impl DisplayPath {
    pub fn new(path: PathBuf) -> Self {
        Self(path)
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}
