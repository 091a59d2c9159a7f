//! Notifier that remembers what it was told

use parking_lot::Mutex;

use super::traits::Notifier;

/// Keeps every success message in order
///
/// # Example
///
/// ```
/// use dashboard_core::notify::{Notifier, RecordingNotifier};
///
/// let notifier = RecordingNotifier::new();
/// notifier.notify_success("saved");
/// assert_eq!(notifier.messages(), vec!["saved".to_string()]);
/// ```
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// All messages received so far
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().clone()
    }

    /// Most recent message, if any
    pub fn last(&self) -> Option<String> {
        self.messages.lock().last().cloned()
    }

    pub fn clear(&self) {
        self.messages.lock().clear();
    }
}

impl Notifier for RecordingNotifier {
    fn notify_success(&self, message: &str) {
        self.messages.lock().push(message.to_string());
    }
}
