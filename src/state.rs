//! The conversion session state record and its pure transitions.
//!
//! [`WorkflowState`] holds the five pieces of session state (file, source
//! format, target format, result, error) plus the loading flag. Every user
//! operation maps to exactly one method here; none of them perform I/O, so
//! the whole state machine is testable without a network or a terminal.
//!
//! ```text
//!             select_file                begin_conversion
//!  NoFile ───────────────▶ FileSelected ──────────────────▶ Converting
//!    ▲                          ▲                            │      │
//!    │ finish_download          │ select_file       success  │      │ failure
//!    │                          │                            ▼      ▼
//!    └──────────────────── ResultReady              ErrorShown
//! ```

use crate::error::ConvertError;
use crate::format::FormatChoice;
use serde::{Deserialize, Serialize};

/// A user-chosen input file: name plus raw bytes.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedFile {
    pub name: String,
    #[serde(with = "base64_bytes")]
    pub bytes: Vec<u8>,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// File name without its last extension.
    pub fn stem(&self) -> &str {
        match self.name.rsplit_once('.') {
            Some((stem, _)) if !stem.is_empty() => stem,
            _ => &self.name,
        }
    }
}

// Payloads can be megabytes; keep them out of log lines.
impl std::fmt::Debug for SelectedFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SelectedFile")
            .field("name", &self.name)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Reference to a converted artifact held by the remote service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionResult {
    /// Download URL of the converted file.
    pub url: String,
    /// File name reported by the service, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    /// Size in bytes reported by the service, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,
}

impl ConversionResult {
    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            file_name: None,
            file_size: None,
        }
    }
}

/// Whether a conversion request is outstanding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkflowStatus {
    Idle,
    Converting,
}

/// The observable states of the workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkflowPhase {
    /// Initial state: nothing selected.
    NoFile,
    /// A file is selected and no result or error is shown.
    FileSelected,
    /// One conversion request is outstanding.
    Converting,
    /// The last conversion succeeded; a result is ready for download.
    ResultReady,
    /// The last conversion failed; an error message is shown.
    ErrorShown,
}

/// Handle for one outstanding conversion, returned by
/// [`WorkflowState::begin_conversion`].
///
/// The settlement is only applied if no new file was selected meanwhile.
#[derive(Debug, Clone)]
pub struct ConversionTicket {
    pub generation: u64,
    pub file: SelectedFile,
    pub source: FormatChoice,
    pub target: FormatChoice,
}

/// The conversion session state record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowState {
    pub file: Option<SelectedFile>,
    pub source: FormatChoice,
    pub target: FormatChoice,
    pub result: Option<ConversionResult>,
    pub error: Option<String>,
    pub loading: bool,
    /// Bumped on every file selection; stale settlements are discarded.
    #[serde(default)]
    pub generation: u64,
}

impl Default for WorkflowState {
    fn default() -> Self {
        Self {
            file: None,
            source: FormatChoice::DEFAULT_SOURCE,
            target: FormatChoice::DEFAULT_TARGET,
            result: None,
            error: None,
            loading: false,
            generation: 0,
        }
    }
}

impl WorkflowState {
    pub fn status(&self) -> WorkflowStatus {
        if self.loading {
            WorkflowStatus::Converting
        } else {
            WorkflowStatus::Idle
        }
    }

    pub fn phase(&self) -> WorkflowPhase {
        if self.loading {
            WorkflowPhase::Converting
        } else if self.result.is_some() {
            WorkflowPhase::ResultReady
        } else if self.error.is_some() {
            WorkflowPhase::ErrorShown
        } else if self.file.is_some() {
            WorkflowPhase::FileSelected
        } else {
            WorkflowPhase::NoFile
        }
    }

    /// Store a new file and drop any result or error from the previous one.
    ///
    /// The loading flag is left alone: a request already in flight still
    /// occupies the controller, but its settlement will be discarded.
    pub fn select_file(&mut self, file: SelectedFile) {
        self.file = Some(file);
        self.result = None;
        self.error = None;
        self.generation = self.generation.wrapping_add(1);
    }

    pub fn set_source_format(&mut self, format: FormatChoice) {
        self.source = format;
    }

    pub fn set_target_format(&mut self, format: FormatChoice) {
        self.target = format;
    }

    /// Move from Idle to Converting.
    ///
    /// Fails without touching the state when a request is already
    /// outstanding or no file is selected.
    pub fn begin_conversion(&mut self) -> Result<ConversionTicket, ConvertError> {
        if self.loading {
            return Err(ConvertError::ConversionInProgress);
        }
        let file = self.file.clone().ok_or(ConvertError::NoFileSelected)?;

        self.result = None;
        self.error = None;
        self.loading = true;

        Ok(ConversionTicket {
            generation: self.generation,
            file,
            source: self.source,
            target: self.target,
        })
    }

    /// Record a successful settlement. Returns `false` if the ticket is
    /// stale (a different file was selected while converting).
    pub fn complete_success(&mut self, ticket: &ConversionTicket, result: ConversionResult) -> bool {
        self.loading = false;
        if ticket.generation != self.generation {
            return false;
        }
        self.result = Some(result);
        self.error = None;
        true
    }

    /// Record a failed settlement with a user-facing message. Returns
    /// `false` if the ticket is stale.
    pub fn complete_failure(&mut self, ticket: &ConversionTicket, message: impl Into<String>) -> bool {
        self.loading = false;
        if ticket.generation != self.generation {
            return false;
        }
        self.result = None;
        self.error = Some(message.into());
        true
    }

    /// Reset after the result was delivered. Fails, leaving the state
    /// unchanged, when there is nothing to deliver.
    pub fn finish_download(&mut self) -> Result<(), ConvertError> {
        if self.result.is_none() {
            return Err(ConvertError::NothingConverted);
        }
        self.reset();
        Ok(())
    }

    /// Back to the initial defaults. The generation keeps counting so a
    /// request still in flight cannot settle into the fresh state.
    pub fn reset(&mut self) {
        let generation = self.generation.wrapping_add(1);
        let loading = self.loading;
        *self = Self {
            generation,
            loading,
            ..Self::default()
        };
    }
}

mod base64_bytes {
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        STANDARD.decode(s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drawing() -> SelectedFile {
        SelectedFile::new("drawing.dwg", b"AC1032".to_vec())
    }

    #[test]
    fn initial_state_is_no_file_with_defaults() {
        let s = WorkflowState::default();
        assert_eq!(s.phase(), WorkflowPhase::NoFile);
        assert_eq!(s.status(), WorkflowStatus::Idle);
        assert_eq!(s.source, FormatChoice::Dwg);
        assert_eq!(s.target, FormatChoice::Pdf);
    }

    #[test]
    fn select_file_clears_result_and_error() {
        let mut s = WorkflowState::default();
        s.select_file(drawing());
        let t = s.begin_conversion().unwrap();
        s.complete_success(&t, ConversionResult::from_url("https://x/y.pdf"));
        assert_eq!(s.phase(), WorkflowPhase::ResultReady);

        s.select_file(SelectedFile::new("other.dwg", vec![1, 2]));
        assert!(s.result.is_none());
        assert!(s.error.is_none());
        assert_eq!(s.phase(), WorkflowPhase::FileSelected);

        let t = s.begin_conversion().unwrap();
        s.complete_failure(&t, "boom");
        assert_eq!(s.phase(), WorkflowPhase::ErrorShown);

        s.select_file(drawing());
        assert!(s.result.is_none());
        assert!(s.error.is_none());
    }

    #[test]
    fn begin_without_file_leaves_state_untouched() {
        let mut s = WorkflowState::default();
        let before = s.clone();
        assert!(matches!(
            s.begin_conversion(),
            Err(ConvertError::NoFileSelected)
        ));
        assert_eq!(s, before);
    }

    #[test]
    fn begin_while_converting_is_rejected() {
        let mut s = WorkflowState::default();
        s.select_file(drawing());
        s.begin_conversion().unwrap();
        let before = s.clone();
        assert!(matches!(
            s.begin_conversion(),
            Err(ConvertError::ConversionInProgress)
        ));
        assert_eq!(s, before);
    }

    #[test]
    fn ticket_captures_current_selection() {
        let mut s = WorkflowState::default();
        s.select_file(drawing());
        s.set_source_format(FormatChoice::Png);
        s.set_target_format(FormatChoice::Png);
        let t = s.begin_conversion().unwrap();
        assert_eq!(t.source, FormatChoice::Png);
        assert_eq!(t.target, FormatChoice::Png);
        assert_eq!(t.file.name, "drawing.dwg");
    }

    #[test]
    fn result_and_error_never_coexist() {
        let mut s = WorkflowState::default();
        s.select_file(drawing());

        let t = s.begin_conversion().unwrap();
        s.complete_failure(&t, "failed");
        assert!(s.result.is_none() && s.error.is_some());

        let t = s.begin_conversion().unwrap();
        assert!(s.result.is_none() && s.error.is_none());
        s.complete_success(&t, ConversionResult::from_url("https://x/y.pdf"));
        assert!(s.result.is_some() && s.error.is_none());
    }

    #[test]
    fn stale_settlement_is_discarded() {
        let mut s = WorkflowState::default();
        s.select_file(drawing());
        let t = s.begin_conversion().unwrap();

        s.select_file(SelectedFile::new("plan.dwg", vec![9]));
        assert_eq!(s.phase(), WorkflowPhase::Converting);

        let applied = s.complete_success(&t, ConversionResult::from_url("https://x/old.pdf"));
        assert!(!applied);
        assert!(s.result.is_none());
        assert_eq!(s.phase(), WorkflowPhase::FileSelected);
    }

    #[test]
    fn finish_download_resets_to_defaults() {
        let mut s = WorkflowState::default();
        s.select_file(drawing());
        s.set_source_format(FormatChoice::Xls);
        s.set_target_format(FormatChoice::Png);
        let t = s.begin_conversion().unwrap();
        s.complete_success(&t, ConversionResult::from_url("https://x/y.png"));

        s.finish_download().unwrap();
        assert_eq!(s.phase(), WorkflowPhase::NoFile);
        assert_eq!(s.source, FormatChoice::Dwg);
        assert_eq!(s.target, FormatChoice::Pdf);
        assert!(s.file.is_none());
    }

    #[test]
    fn finish_download_without_result_changes_nothing() {
        let mut s = WorkflowState::default();
        s.select_file(drawing());
        s.set_target_format(FormatChoice::Xls);
        let before = s.clone();
        assert!(matches!(
            s.finish_download(),
            Err(ConvertError::NothingConverted)
        ));
        assert_eq!(s, before);
    }

    #[test]
    fn stem_strips_last_extension() {
        assert_eq!(SelectedFile::new("drawing.dwg", vec![]).stem(), "drawing");
        assert_eq!(SelectedFile::new("a.b.xls", vec![]).stem(), "a.b");
        assert_eq!(SelectedFile::new("README", vec![]).stem(), "README");
        assert_eq!(SelectedFile::new(".hidden", vec![]).stem(), ".hidden");
    }

    #[test]
    fn state_round_trips_through_json() {
        let mut s = WorkflowState::default();
        s.select_file(SelectedFile::new("drawing.dwg", vec![0, 159, 146, 150]));
        let json = serde_json::to_string(&s).unwrap();
        assert!(json.contains("\"DWG\""));
        let back: WorkflowState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, s);
    }
}
