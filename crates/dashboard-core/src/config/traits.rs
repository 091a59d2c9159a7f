//! Settings provider trait

use async_trait::async_trait;

use super::settings::DashboardSettings;

/// Source of dashboard settings
///
/// Implementations:
/// - `MemorySettingsProvider`: In-memory for testing
/// - `FileSettingsProvider`: YAML file (~/.config/dashboard/settings.yaml)
#[async_trait]
pub trait SettingsProvider: Send + Sync {
    /// Load the current settings
    async fn load_settings(&self) -> ConfigResult<DashboardSettings>;

    /// Replace the stored settings
    async fn save_settings(&self, settings: &DashboardSettings) -> ConfigResult<()>;
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid setting {field}: {message}")]
    Invalid { field: &'static str, message: String },
}

impl ConfigError {
    pub fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            message: message.into(),
        }
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;
