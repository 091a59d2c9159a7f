//! Notifier trait definition

use std::sync::Arc;

/// Sink for user-visible notifications (toast, banner, status line)
pub trait Notifier: Send + Sync {
    /// Report a successful operation
    fn notify_success(&self, message: &str);
}

/// Type alias for an Arc-wrapped notifier
pub type SharedNotifier = Arc<dyn Notifier>;

/// Notifier that discards every message
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpNotifier;

impl Notifier for NoOpNotifier {
    fn notify_success(&self, _message: &str) {}
}
