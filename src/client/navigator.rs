//! Navigation hook used when the client gives up on the local session.

use std::fmt;
use std::sync::Mutex;

use tracing::info;

/// Receives "send the user to this entry point" requests from the client.
///
/// A browser host would perform a full-page navigation; a CLI prints a hint.
pub trait Navigator: Send + Sync + fmt::Debug {
    fn redirect(&self, path: &str);
}

/// Logs redirects and does nothing else.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNavigator;

impl Navigator for TracingNavigator {
    fn redirect(&self, path: &str) {
        info!(path, "Redirect requested");
    }
}

/// Records every redirect so the host can act on it after the call returns.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    visits: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All redirect targets, oldest first.
    pub fn visits(&self) -> Vec<String> {
        self.visits.lock().map(|v| v.clone()).unwrap_or_default()
    }

    /// Most recent redirect target.
    pub fn last(&self) -> Option<String> {
        self.visits.lock().ok().and_then(|v| v.last().cloned())
    }
}

impl Navigator for RecordingNavigator {
    fn redirect(&self, path: &str) {
        info!(path, "Redirect requested");
        if let Ok(mut visits) = self.visits.lock() {
            visits.push(path.to_owned());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_navigator_keeps_order() {
        let nav = RecordingNavigator::new();
        assert!(nav.last().is_none());
        nav.redirect("/login");
        nav.redirect("/cart");
        assert_eq!(nav.visits(), vec!["/login", "/cart"]);
        assert_eq!(nav.last().as_deref(), Some("/cart"));
    }
}
