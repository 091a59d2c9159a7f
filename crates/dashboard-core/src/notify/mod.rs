//! User-visible notifications
//!
//! Store mutations report success through a `Notifier`. Delivery is
//! fire-and-forget: nothing the notifier does can fail the mutation.

mod traits;
mod log_notifier;
mod recording;

pub use traits::{Notifier, NoOpNotifier, SharedNotifier};
pub use log_notifier::LogNotifier;
pub use recording::RecordingNotifier;
