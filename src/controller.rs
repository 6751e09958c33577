//! The conversion workflow controller.
//!
//! [`ConversionController`] owns one session's [`WorkflowState`], applies the
//! user's operations to it, and performs the single external call. The state
//! sits behind a `Mutex` that is never held across an `.await`, so the
//! Idle → Converting check-and-set is atomic: two overlapping
//! [`request_conversion`] calls on one controller reach the service at most
//! once.
//!
//! [`request_conversion`]: ConversionController::request_conversion

use crate::config::ServiceConfig;
use crate::error::{
    ConvertError, GENERIC_FAILURE_MESSAGE, NOTHING_CONVERTED_MESSAGE, NO_FILE_MESSAGE,
};
use crate::format::FormatChoice;
use crate::input::file_name_from_url;
use crate::observer::{NoopObserver, Observer};
use crate::service::{ConversionService, ConvertApiClient};
use crate::state::{ConversionResult, SelectedFile, WorkflowPhase, WorkflowState, WorkflowStatus};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, error, info, warn};

/// Mediates between user operations and a [`ConversionService`].
pub struct ConversionController {
    service: Arc<dyn ConversionService>,
    observer: Observer,
    state: Mutex<WorkflowState>,
}

impl ConversionController {
    /// Create a controller in its initial state around an existing service.
    pub fn new(service: Arc<dyn ConversionService>) -> Self {
        Self {
            service,
            observer: Arc::new(NoopObserver),
            state: Mutex::new(WorkflowState::default()),
        }
    }

    /// Create a controller backed by a [`ConvertApiClient`].
    pub fn from_config(config: ServiceConfig) -> Result<Self, ConvertError> {
        let client = ConvertApiClient::new(config)
            .map_err(|e| ConvertError::Internal(format!("HTTP client: {e}")))?;
        Ok(Self::new(Arc::new(client)))
    }

    pub fn with_observer(mut self, observer: Observer) -> Self {
        self.observer = observer;
        self
    }

    fn state(&self) -> MutexGuard<'_, WorkflowState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// A copy of the current state record.
    pub fn snapshot(&self) -> WorkflowState {
        self.state().clone()
    }

    pub fn status(&self) -> WorkflowStatus {
        self.state().status()
    }

    pub fn phase(&self) -> WorkflowPhase {
        self.state().phase()
    }

    /// Select a new input file, dropping any previous result or error.
    pub fn select_file(&self, file: SelectedFile) {
        debug!("Selected '{}' ({} bytes)", file.name, file.len());
        self.state().select_file(file);
    }

    pub fn set_source_format(&self, format: FormatChoice) {
        self.state().set_source_format(format);
    }

    pub fn set_target_format(&self, format: FormatChoice) {
        self.state().set_target_format(format);
    }

    /// Return to the initial defaults without downloading anything.
    pub fn reset(&self) {
        self.state().reset();
    }

    /// Convert the selected file through the service.
    ///
    /// # Errors
    /// - [`ConvertError::NoFileSelected`] — nothing selected; the service is
    ///   not called and a notice is emitted.
    /// - [`ConvertError::ConversionInProgress`] — another request is still
    ///   outstanding; the service is not called.
    /// - [`ConvertError::ServiceFailed`] — the service failed; the state now
    ///   shows the generic error message.
    /// - [`ConvertError::Superseded`] — a new file was selected meanwhile.
    pub async fn request_conversion(&self) -> Result<ConversionResult, ConvertError> {
        let begun = self.state().begin_conversion();
        let ticket = match begun {
            Ok(ticket) => ticket,
            Err(ConvertError::NoFileSelected) => {
                self.observer.on_notice(NO_FILE_MESSAGE);
                return Err(ConvertError::NoFileSelected);
            }
            Err(e) => {
                warn!("Conversion request ignored: {}", e);
                return Err(e);
            }
        };

        if ticket.source == ticket.target {
            warn!(
                "Source and target format are both {}; passing through to the service",
                ticket.source
            );
        }

        let guard = SettleGuard {
            state: &self.state,
            armed: true,
        };

        info!(
            "Converting '{}' {} → {}",
            ticket.file.name, ticket.source, ticket.target
        );
        self.observer
            .on_conversion_start(&ticket.file.name, ticket.source, ticket.target);

        let outcome = self
            .service
            .convert(ticket.source.as_tag(), ticket.target.as_tag(), &ticket.file)
            .await;
        guard.disarm();

        match outcome {
            Ok(result) => {
                let applied = self.state().complete_success(&ticket, result.clone());
                if !applied {
                    info!("Discarding result for '{}': file changed", ticket.file.name);
                    return Err(ConvertError::Superseded);
                }
                info!("Conversion complete: {}", result.url);
                self.observer.on_conversion_complete(&result);
                Ok(result)
            }
            Err(e) => {
                error!("Conversion error: {}", e);
                let applied = self.state().complete_failure(&ticket, GENERIC_FAILURE_MESSAGE);
                if !applied {
                    return Err(ConvertError::Superseded);
                }
                self.observer.on_conversion_error(GENERIC_FAILURE_MESSAGE);
                Err(ConvertError::ServiceFailed {
                    message: GENERIC_FAILURE_MESSAGE.to_string(),
                })
            }
        }
    }

    /// Fetch the converted artifact into `dest_dir`, then reset the session.
    ///
    /// Returns the path written. With no result present a notice is emitted,
    /// nothing changes, and [`ConvertError::NothingConverted`] is returned.
    /// If the fetch or the write fails the result is kept for a retry.
    pub async fn download_result(&self, dest_dir: &Path) -> Result<PathBuf, ConvertError> {
        let pending = {
            let s = self.state();
            s.result
                .clone()
                .map(|r| (r, s.file.as_ref().map(|f| f.stem().to_string()), s.target))
        };
        let Some((result, stem, target)) = pending else {
            self.observer.on_notice(NOTHING_CONVERTED_MESSAGE);
            return Err(ConvertError::NothingConverted);
        };

        let bytes = self.service.fetch(&result).await.map_err(|e| {
            error!("Artifact download error: {}", e);
            ConvertError::DownloadFailed {
                url: result.url.clone(),
                reason: e.to_string(),
            }
        })?;

        let name = artifact_file_name(&result, stem.as_deref(), target);
        let path = write_atomic(dest_dir, &name, bytes).await?;
        info!("Saved {}", path.display());

        {
            let mut s = self.state();
            if s.result.as_ref() == Some(&result) {
                s.finish_download()?;
            } else {
                debug!("State changed during download; not resetting");
            }
        }
        self.observer.on_download_complete(&path);
        Ok(path)
    }
}

/// Clears the loading flag if the conversion future is dropped before the
/// service settles, so the controller does not stay Converting forever.
///
/// The generation is not checked: `select_file` and `reset` bump it while
/// keeping the flag set, and `begin_conversion` admits only one outstanding
/// ticket, so an armed guard always owns the flag.
struct SettleGuard<'a> {
    state: &'a Mutex<WorkflowState>,
    armed: bool,
}

impl SettleGuard<'_> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for SettleGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.state
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .loading = false;
        }
    }
}

/// Pick a local file name for a converted artifact.
///
/// Preference: the name the service reported, the last URL segment, then
/// `<input stem>.<target tag>`.
fn artifact_file_name(result: &ConversionResult, stem: Option<&str>, target: FormatChoice) -> String {
    result
        .file_name
        .as_deref()
        .and_then(|n| Path::new(n).file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .or_else(|| file_name_from_url(&result.url))
        .unwrap_or_else(|| format!("{}.{}", stem.unwrap_or("converted"), target.as_tag()))
}

/// Upper bound on ` (n)` suffixes tried before giving up on a free name.
const MAX_NAME_ATTEMPTS: u32 = 1000;

/// `name` with ` (n)` inserted before the extension; `n == 0` is `name` itself.
fn numbered_name(name: &str, n: u32) -> String {
    if n == 0 {
        return name.to_string();
    }
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{stem} ({n}).{ext}"),
        _ => format!("{name} ({n})"),
    }
}

/// Write `bytes` into `dir` via a temp file in the same directory.
///
/// Existing files are never replaced: when `dir/name` is taken the artifact
/// is saved as `name (1).ext`, `name (2).ext`, and so on. Returns the path
/// actually written.
async fn write_atomic(dir: &Path, name: &str, bytes: Vec<u8>) -> Result<PathBuf, ConvertError> {
    let path = dir.join(name);
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| ConvertError::OutputWriteFailed {
            path: path.clone(),
            source: e,
        })?;

    let dir = dir.to_path_buf();
    let name = name.to_string();
    tokio::task::spawn_blocking(move || -> std::io::Result<PathBuf> {
        let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
        tmp.write_all(&bytes)?;
        for n in 0..MAX_NAME_ATTEMPTS {
            let dest = dir.join(numbered_name(&name, n));
            match tmp.persist_noclobber(&dest) {
                Ok(_) => return Ok(dest),
                Err(e) if e.error.kind() == std::io::ErrorKind::AlreadyExists => {
                    debug!("{} exists, trying the next name", dest.display());
                    tmp = e.file;
                }
                Err(e) => return Err(e.error),
            }
        }
        Err(std::io::Error::new(
            std::io::ErrorKind::AlreadyExists,
            format!("no free file name for '{name}' after {MAX_NAME_ATTEMPTS} attempts"),
        ))
    })
    .await
    .map_err(|e| ConvertError::Internal(format!("write task failed: {e}")))?
    .map_err(|e| ConvertError::OutputWriteFailed { path, source: e })
}
