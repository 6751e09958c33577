//! Error types for the fileconvert library.
//!
//! Two distinct error types reflect two distinct audiences:
//!
//! * [`ConvertError`] — returned by the controller, configuration and input
//!   layers. Every variant carries a message fit for the person using the
//!   tool. Workflow failures are recovered inside the controller; the error
//!   value is the notice, not a crash.
//!
//! * [`ServiceError`] — returned by a [`crate::service::ConversionService`].
//!   It keeps the real cause (HTTP status, transport failure) for logs. The
//!   controller never shows it to the user verbatim; it is replaced by
//!   [`GENERIC_FAILURE_MESSAGE`].

use std::path::PathBuf;
use thiserror::Error;

/// The only text a user sees when the remote conversion fails.
pub const GENERIC_FAILURE_MESSAGE: &str = "An error occurred during conversion. Please try again.";

/// Notice emitted when a download is requested before anything was converted.
pub const NOTHING_CONVERTED_MESSAGE: &str = "No file has been converted yet.";

/// Notice emitted when a conversion is requested without a file.
pub const NO_FILE_MESSAGE: &str = "Please choose a file to convert.";

/// All errors surfaced by the fileconvert library.
#[derive(Debug, Error)]
pub enum ConvertError {
    // ── Workflow errors ───────────────────────────────────────────────────
    /// A conversion was requested with no file selected.
    #[error("{}", NO_FILE_MESSAGE)]
    NoFileSelected,

    /// A conversion is already outstanding on this controller.
    #[error("A conversion is already in progress.")]
    ConversionInProgress,

    /// The remote service failed. `message` is the generic user-facing text.
    #[error("{message}")]
    ServiceFailed { message: String },

    /// A different file was selected while the conversion was running; its
    /// outcome was discarded.
    #[error("The selected file changed during conversion; the outcome was discarded.")]
    Superseded,

    /// A download was requested with no conversion result present.
    #[error("{}", NOTHING_CONVERTED_MESSAGE)]
    NothingConverted,

    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("File not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The path exists but could not be read (a directory, an I/O fault).
    #[error("Failed to read '{path}': {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// HTTP download of an input file or a converted artifact failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    // ── Output errors ─────────────────────────────────────────────────────
    /// Could not create or write the downloaded artifact.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// No API secret was supplied.
    #[error("ConvertAPI secret is not configured.\nSet CONVERT_API_SECRET or pass --secret.")]
    MissingSecret,

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A failure reported by the external conversion service.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ServiceError {
    /// Connection, DNS or TLS failure.
    #[error("network error: {0}")]
    Network(String),

    /// The request exceeded the configured API timeout.
    #[error("request timed out after {secs}s")]
    Timeout { secs: u64 },

    /// HTTP 401/403: the secret was rejected.
    #[error("authentication failed (HTTP {status}): {detail}")]
    Auth { status: u16, detail: String },

    /// The service cannot convert between the requested formats.
    #[error("unsupported conversion {source_format} -> {target_format}")]
    UnsupportedFormat {
        source_format: String,
        target_format: String,
    },

    /// Any other non-success HTTP status.
    #[error("service rejected the request (HTTP {status}): {message}")]
    Rejected { status: u16, message: String },

    /// The body could not be decoded or contained no files.
    #[error("invalid response from service: {0}")]
    InvalidResponse(String),
}
