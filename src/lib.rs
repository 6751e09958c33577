//! # fileconvert
//!
//! Convert DWG, PDF, PNG and XLS files by delegating to the
//! [ConvertAPI](https://www.convertapi.com) web service.
//!
//! The crate contains no conversion logic of its own. What it does own is
//! the session workflow around the one remote call:
//!
//! ```text
//!  select file ─▶ pick formats ─▶ convert (one outstanding call) ─▶ download ─▶ reset
//!                                      │
//!                                      └─ failure: generic message, retry any time
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use fileconvert::{load_file, ConversionController, FormatChoice, ServiceConfig};
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Secret read from CONVERT_API_SECRET
//!     let config = ServiceConfig::from_env()?;
//!     let timeout = config.download_timeout_secs;
//!     let controller = ConversionController::from_config(config)?;
//!
//!     controller.select_file(load_file("drawing.dwg", timeout).await?);
//!     controller.set_source_format(FormatChoice::Dwg);
//!     controller.set_target_format(FormatChoice::Pdf);
//!
//!     let result = controller.request_conversion().await?;
//!     eprintln!("converted: {}", result.url);
//!
//!     let saved = controller.download_result(Path::new(".")).await?;
//!     eprintln!("saved to {}", saved.display());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `fileconvert` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod controller;
pub mod error;
pub mod format;
pub mod input;
pub mod observer;
pub mod service;
pub mod state;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ServiceConfig, ServiceConfigBuilder};
pub use controller::ConversionController;
pub use error::{
    ConvertError, ServiceError, GENERIC_FAILURE_MESSAGE, NOTHING_CONVERTED_MESSAGE, NO_FILE_MESSAGE,
};
pub use format::{FormatChoice, UnknownFormat};
pub use input::load_file;
pub use observer::{NoopObserver, Observer, WorkflowObserver};
pub use service::{ConversionService, ConvertApiClient};
pub use state::{ConversionResult, SelectedFile, WorkflowPhase, WorkflowState, WorkflowStatus};
