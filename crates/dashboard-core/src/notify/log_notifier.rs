//! Notifier that forwards to a logger

use crate::logging::SharedLogger;

use super::traits::Notifier;

/// Writes success notifications as info lines
///
/// Useful for headless hosts (CLI, server-side rendering) that have no UI to
/// show a toast in.
pub struct LogNotifier {
    logger: SharedLogger,
}

impl LogNotifier {
    pub fn new(logger: SharedLogger) -> Self {
        Self { logger }
    }
}

impl Notifier for LogNotifier {
    fn notify_success(&self, message: &str) {
        self.logger.info(message);
    }
}
