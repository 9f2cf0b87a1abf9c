//! Configuration file handling.
//!
//! The configuration file is stored at `$RECEIPTS_HOME/config.json` and contains the model
//! settings, the name of the environment variable holding the API key, backup settings and the
//! location of the ledger.

use crate::api::RetryPolicy;
use crate::backup::Backup;
use crate::error::{ErrorType, IntoResult, Res};
use crate::image::ImageMime;
use crate::{utils, Result};
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

const APP_NAME: &str = "receipts";
const CONFIG_VERSION: u8 = 1;
const BACKUP_COPIES: u32 = 5;
const BACKUPS: &str = ".backups";
const CONFIG_JSON: &str = "config.json";

/// The file name of the ledger when `ledger_path` is not configured.
pub const LEDGER_CSV: &str = "expenses.csv";
pub const DEFAULT_MODEL: &str = "gpt-4o";
pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_API_KEY_ENV: &str = "OPENAI_API_KEY";

/// The `Config` object represents the configuration of the app. You instantiate it by providing
/// the path to `$RECEIPTS_HOME` and from there it loads `$RECEIPTS_HOME/config.json`. It provides
/// paths to other items that are either configurable or are expected in a certain location within
/// the home directory.
#[derive(Debug, Clone)]
pub struct Config {
    root: PathBuf,
    backups: PathBuf,
    config_path: PathBuf,
    config_file: ConfigFile,
    endpoint: Url,
}

impl Config {
    /// Creates the home directory, its backups subdirectory and an initial `config.json`.
    ///
    /// # Arguments
    /// - `dir` - The directory that will be the home directory, e.g. `$HOME/receipts`
    /// - `ledger` - Where the ledger CSV lives. Relative paths are resolved against the home
    ///   directory. Defaults to `expenses.csv` in the home directory.
    /// - `model` - The model name to request. Defaults to `gpt-4o`.
    ///
    /// # Errors
    /// - Returns a `Config` error if any file operations fail.
    pub async fn create(
        dir: impl Into<PathBuf>,
        ledger: Option<&Path>,
        model: Option<&str>,
    ) -> Result<Self> {
        Self::create_home(dir.into(), ledger, model)
            .await
            .pub_result(ErrorType::Config)
    }

    async fn create_home(
        maybe_relative: PathBuf,
        ledger: Option<&Path>,
        model: Option<&str>,
    ) -> Res<Self> {
        utils::make_dir(&maybe_relative)
            .await
            .context("Unable to create the receipts home directory")?;
        let root = utils::canonicalize(&maybe_relative).await?;

        let backups = root.join(BACKUPS);
        utils::make_dir(&backups).await?;
        let config_path = root.join(CONFIG_JSON);

        let mut config_file = ConfigFile {
            ledger_path: ledger.map(Path::to_path_buf),
            ..ConfigFile::default()
        };
        if let Some(model) = model {
            config_file.model = model.to_string();
        }
        let endpoint = config_file.endpoint()?;
        config_file.save(&config_path).await?;

        Ok(Self {
            root,
            backups,
            config_path,
            config_file,
            endpoint,
        })
    }

    /// This will
    /// - validate that the home directory exists and that the config file exists
    /// - load and validate the config file
    /// - validate that the backups directory exists
    /// - return the loaded configuration object
    pub async fn load(receipts_home: impl Into<PathBuf>) -> Result<Self> {
        Self::load_home(receipts_home.into())
            .await
            .pub_result(ErrorType::Config)
    }

    async fn load_home(maybe_relative: PathBuf) -> Res<Self> {
        let root = utils::canonicalize(&maybe_relative)
            .await
            .context("The receipts home directory is missing, run 'receipts init' first")?;

        let config_path = root.join(CONFIG_JSON);
        if !config_path.is_file() {
            bail!("The config file is missing '{}'", config_path.display())
        }
        let config_file = ConfigFile::load(&config_path).await?;
        let endpoint = config_file.endpoint()?;

        let config = Self {
            root: root.clone(),
            backups: root.join(BACKUPS),
            config_path,
            config_file,
            endpoint,
        };
        if !config.backups.is_dir() {
            bail!(
                "The backups directory is missing '{}'",
                config.backups.display()
            )
        }
        Ok(config)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn backups(&self) -> &Path {
        &self.backups
    }

    pub fn backup_copies(&self) -> u32 {
        self.config_file.backup_copies
    }

    /// Creates a new `Backup` instance for managing backup files.
    pub fn backup(&self) -> Backup {
        Backup::new(self)
    }

    /// Returns the configured ledger path if it is absolute, otherwise resolves it against the
    /// home directory.
    pub fn ledger_path(&self) -> PathBuf {
        match &self.config_file.ledger_path {
            Some(p) if p.is_absolute() => p.clone(),
            Some(p) => self.root.join(p),
            None => self.root.join(LEDGER_CSV),
        }
    }

    pub fn model(&self) -> &str {
        &self.config_file.model
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// The name of the environment variable that holds the API key.
    pub fn api_key_env(&self) -> &str {
        &self.config_file.api_key_env
    }

    /// Reads the API key from the environment variable named by `api_key_env`.
    pub(crate) fn api_key(&self) -> Res<String> {
        let name = self.api_key_env();
        let key = std::env::var(name)
            .with_context(|| format!("The API key environment variable {name} is not set"))?;
        if key.trim().is_empty() {
            bail!("The API key environment variable {name} is empty")
        }
        Ok(key)
    }

    pub fn retry(&self) -> RetryPolicy {
        self.config_file.retry
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.config_file.timeout_secs.map(Duration::from_secs)
    }

    /// The image format to assume for every image instead of sniffing it, if configured.
    pub fn image_mime(&self) -> Option<ImageMime> {
        self.config_file.image_mime
    }
}

/// Represents the serialization and deserialization format of the configuration file.
///
/// Example configuration:
/// ```json
/// {
///   "app_name": "receipts",
///   "config_version": 1,
///   "model": "gpt-4o",
///   "endpoint": "https://api.openai.com/v1/chat/completions",
///   "api_key_env": "OPENAI_API_KEY",
///   "backup_copies": 5,
///   "ledger_path": "expenses.csv",
///   "retry": { "max_attempts": 1, "backoff_ms": 1000 },
///   "timeout_secs": 60,
///   "image_mime": "png"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
struct ConfigFile {
    /// Application name, should always be "receipts"
    app_name: String,

    /// Configuration file version
    config_version: u8,

    /// The model to request, e.g. "gpt-4o"
    #[serde(default = "default_model")]
    model: String,

    /// The chat completions endpoint
    #[serde(default = "default_endpoint")]
    endpoint: String,

    /// The name of the environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    api_key_env: String,

    /// Number of backup copies to keep
    #[serde(default = "default_backup_copies")]
    backup_copies: u32,

    /// Path to the ledger CSV (optional, relative to the home directory or absolute).
    /// Defaults to $RECEIPTS_HOME/expenses.csv if not specified
    #[serde(skip_serializing_if = "Option::is_none")]
    ledger_path: Option<PathBuf>,

    #[serde(default)]
    retry: RetryPolicy,

    /// HTTP request timeout in seconds. No timeout if not specified
    #[serde(skip_serializing_if = "Option::is_none")]
    timeout_secs: Option<u64>,

    /// Skips format detection and labels every image with this format
    #[serde(skip_serializing_if = "Option::is_none")]
    image_mime: Option<ImageMime>,
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_api_key_env() -> String {
    DEFAULT_API_KEY_ENV.to_string()
}

fn default_backup_copies() -> u32 {
    BACKUP_COPIES
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            model: default_model(),
            endpoint: default_endpoint(),
            api_key_env: default_api_key_env(),
            backup_copies: BACKUP_COPIES,
            ledger_path: None,
            retry: RetryPolicy::default(),
            timeout_secs: None,
            image_mime: None,
        }
    }
}

impl ConfigFile {
    /// Loads a ConfigFile asynchronously from the specified path.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed
    async fn load(path: &Path) -> Res<Self> {
        let config: ConfigFile = utils::deserialize(path)
            .await
            .with_context(|| format!("Failed to parse config file at {}", path.display()))?;

        anyhow::ensure!(
            config.app_name == APP_NAME,
            "Invalid app_name in config file: expected '{}', got '{}'",
            APP_NAME,
            config.app_name
        );

        Ok(config)
    }

    /// Saves the ConfigFile to the specified path.
    async fn save(&self, path: &Path) -> Res<()> {
        let data = serde_json::to_string_pretty(self).context("Unable to serialize config")?;
        utils::write(path, data)
            .await
            .context("Unable to write config file")
    }

    /// Parses and validates the endpoint URL.
    fn endpoint(&self) -> Res<Url> {
        let url = Url::parse(&self.endpoint)
            .with_context(|| format!("Invalid endpoint URL '{}'", self.endpoint))?;
        if url.scheme() != "https" && url.scheme() != "http" {
            bail!("The endpoint URL must be http or https, got '{}'", url)
        }
        Ok(url)
    }
}
