//! Dashboard settings
//!
//! Supports multiple settings sources:
//! - `MemorySettingsProvider`: In-memory for testing and embedding
//! - `FileSettingsProvider`: YAML file-based (user/workspace level) with
//!   environment overrides

mod traits;
mod settings;
mod memory;
mod file;

pub use traits::{SettingsProvider, ConfigError, ConfigResult};
pub use settings::{DashboardSettings, ApiSettings, ProviderTypeSettings, apply_env_overrides};
pub use memory::MemorySettingsProvider;
pub use file::{FileSettingsProvider, ConfigLevel};
