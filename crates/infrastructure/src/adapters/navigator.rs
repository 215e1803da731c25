//! Navigator for hosts without a router.

use parking_lot::Mutex;
use tolk_application::ports::Navigator;

/// Logs every redirect and remembers the latest one.
///
/// Suitable for command-line hosts, which have no location to change and
/// only report where the user would have been sent.
#[derive(Debug, Default)]
pub struct LoggingNavigator {
    last: Mutex<Option<String>>,
}

impl LoggingNavigator {
    /// Creates a navigator that has not redirected yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the most recent redirect target.
    #[must_use]
    pub fn last_redirect(&self) -> Option<String> {
        self.last.lock().clone()
    }
}

impl Navigator for LoggingNavigator {
    fn redirect_to(&self, path: &str) {
        tracing::info!(path, "redirect");
        *self.last.lock() = Some(path.to_string());
    }
}
