//! Observer trait for user-facing workflow events.
//!
//! Inject an [`Arc<dyn WorkflowObserver>`] via
//! [`crate::controller::ConversionController::with_observer`] to receive
//! notices and state changes as the controller runs. The CLI uses this to
//! drive its spinner and print notices; a GUI would update widgets.
//!
//! # Example
//!
//! ```rust
//! use fileconvert::WorkflowObserver;
//! use std::sync::Mutex;
//!
//! #[derive(Default)]
//! struct NoticeLog {
//!     notices: Mutex<Vec<String>>,
//! }
//!
//! impl WorkflowObserver for NoticeLog {
//!     fn on_notice(&self, message: &str) {
//!         self.notices.lock().unwrap().push(message.to_string());
//!     }
//! }
//!
//! let log = NoticeLog::default();
//! log.on_notice("No file has been converted yet.");
//! assert_eq!(log.notices.lock().unwrap().len(), 1);
//! ```

use crate::format::FormatChoice;
use crate::state::ConversionResult;
use std::path::Path;
use std::sync::Arc;

/// Called by the controller as the workflow moves between states.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Methods are called without the controller's state
/// lock held.
pub trait WorkflowObserver: Send + Sync {
    /// A message the user should see (validation failures, empty downloads).
    fn on_notice(&self, message: &str) {
        let _ = message;
    }

    /// The controller entered Converting.
    fn on_conversion_start(&self, file_name: &str, source: FormatChoice, target: FormatChoice) {
        let _ = (file_name, source, target);
    }

    /// The conversion succeeded.
    fn on_conversion_complete(&self, result: &ConversionResult) {
        let _ = result;
    }

    /// The conversion failed; `message` is the generic user-facing text.
    fn on_conversion_error(&self, message: &str) {
        let _ = message;
    }

    /// The artifact was written to `path` and the controller reset.
    fn on_download_complete(&self, path: &Path) {
        let _ = path;
    }
}

/// An observer that ignores every event. This is the default.
pub struct NoopObserver;

impl WorkflowObserver for NoopObserver {}

/// Convenience alias for the shared observer handle.
pub type Observer = Arc<dyn WorkflowObserver>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingObserver {
        starts: AtomicUsize,
        completes: AtomicUsize,
        errors: AtomicUsize,
    }

    impl WorkflowObserver for CountingObserver {
        fn on_conversion_start(&self, _: &str, _: FormatChoice, _: FormatChoice) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_conversion_complete(&self, _: &ConversionResult) {
            self.completes.fetch_add(1, Ordering::SeqCst);
        }

        fn on_conversion_error(&self, _: &str) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_observer_does_not_panic() {
        let o = NoopObserver;
        o.on_notice("hello");
        o.on_conversion_start("a.dwg", FormatChoice::Dwg, FormatChoice::Pdf);
        o.on_conversion_complete(&ConversionResult::from_url("https://x/y.pdf"));
        o.on_conversion_error("failed");
        o.on_download_complete(Path::new("/tmp/y.pdf"));
    }

    #[test]
    fn overridden_methods_receive_events() {
        let o = CountingObserver::default();
        o.on_conversion_start("a.dwg", FormatChoice::Dwg, FormatChoice::Pdf);
        o.on_conversion_complete(&ConversionResult::from_url("https://x/y.pdf"));
        o.on_conversion_start("a.dwg", FormatChoice::Dwg, FormatChoice::Pdf);
        o.on_conversion_error("failed");
        // Not overridden: falls through to the default.
        o.on_notice("ignored");

        assert_eq!(o.starts.load(Ordering::SeqCst), 2);
        assert_eq!(o.completes.load(Ordering::SeqCst), 1);
        assert_eq!(o.errors.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn arc_dyn_observer_works() {
        let o: Observer = Arc::new(NoopObserver);
        o.on_notice("hi");
    }
}
