//! Error types for the public interface of the library.
//!
//! Internally, functions return `Res<T>` which is an `anyhow::Result`. Functions that are exposed
//! to callers return `Result<T>`, whose `Error` carries an `ErrorType` so that a caller can tell
//! a missing image from a refused request from a model that returned garbage.

use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Display, Formatter};

/// The internal result type.
pub(crate) type Res<T> = anyhow::Result<T>;

/// The public result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Classifies the failures that a caller may want to handle differently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorType {
    /// The image path does not exist or could not be read.
    NotFound,
    /// The model endpoint returned nothing.
    NoResponse,
    /// The `itemize_receipt` arguments could not be decoded as a receipt.
    MalformedExtraction,
    /// The request to the model endpoint failed (network, auth, rate limit, bad status).
    Transport,
    /// The configuration or home directory is missing or invalid.
    Config,
    /// The ledger file could not be read or written.
    Ledger,
    /// Anything else.
    Internal,
}

serde_plain::derive_display_from_serialize!(ErrorType);
serde_plain::derive_fromstr_from_deserialize!(ErrorType);

/// The public error type: an `ErrorType` and the chain of errors that caused it.
pub struct Error {
    error_type: ErrorType,
    inner: anyhow::Error,
}

impl Error {
    pub fn new(error_type: ErrorType, inner: impl Into<anyhow::Error>) -> Self {
        Self {
            error_type,
            inner: inner.into(),
        }
    }

    pub fn error_type(&self) -> ErrorType {
        self.error_type
    }

    /// Looks for an error of type `E` anywhere in the chain, e.g. the `reqwest::Error` that
    /// caused a `Transport` failure or the `std::io::Error` behind `NotFound`.
    pub fn downcast_ref<E>(&self) -> Option<&E>
    where
        E: Display + Debug + Send + Sync + 'static,
    {
        self.inner.downcast_ref::<E>()
    }
}

impl Debug for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} error: {:?}", self.error_type, self.inner)
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#}", self.inner)
    }
}

impl std::error::Error for Error {}

impl From<anyhow::Error> for Error {
    fn from(e: anyhow::Error) -> Self {
        Self::new(ErrorType::Internal, e)
    }
}

/// Converts an internal result into a public `Result` with the given `ErrorType`.
pub(crate) trait IntoResult<T> {
    fn pub_result(self, error_type: ErrorType) -> Result<T>;
}

impl<T, E> IntoResult<T> for std::result::Result<T, E>
where
    E: Into<anyhow::Error>,
{
    fn pub_result(self, error_type: ErrorType) -> Result<T> {
        self.map_err(|e| Error::new(error_type, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_error_type_display() {
        assert_eq!(ErrorType::MalformedExtraction.to_string(), "malformed_extraction");
        assert_eq!(ErrorType::NoResponse.to_string(), "no_response");
    }

    #[test]
    fn test_pub_result_keeps_type_and_message() {
        let res: Res<()> = Err(anyhow::anyhow!("boom"));
        let err = res.pub_result(ErrorType::NoResponse).unwrap_err();
        assert_eq!(err.error_type(), ErrorType::NoResponse);
        assert_eq!(err.to_string(), "boom");
    }

    #[test]
    fn test_display_includes_context_chain() {
        let res: Res<()> = Err(anyhow::anyhow!("inner")).context("outer");
        let err = res.pub_result(ErrorType::Ledger).unwrap_err();
        assert_eq!(err.to_string(), "outer: inner");
    }

    #[test]
    fn test_root_cause_is_kept() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let res: std::result::Result<(), std::io::Error> = Err(io);
        let err = res
            .context("Unable to read image")
            .pub_result(ErrorType::NotFound)
            .unwrap_err();
        let io = err.downcast_ref::<std::io::Error>().unwrap();
        assert_eq!(io.kind(), std::io::ErrorKind::NotFound);
    }

    #[test]
    fn test_from_anyhow_is_internal() {
        let err: Error = anyhow::anyhow!("x").into();
        assert_eq!(err.error_type(), ErrorType::Internal);
    }
}
