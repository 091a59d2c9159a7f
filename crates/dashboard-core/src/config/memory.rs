//! In-memory settings provider

use async_trait::async_trait;
use parking_lot::RwLock;

use super::settings::DashboardSettings;
use super::traits::{ConfigResult, SettingsProvider};

/// Settings held in memory; saving validates and replaces them
#[derive(Debug, Default)]
pub struct MemorySettingsProvider {
    settings: RwLock<DashboardSettings>,
}

impl MemorySettingsProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: DashboardSettings) -> Self {
        Self {
            settings: RwLock::new(settings),
        }
    }

    /// Modify settings in place (useful for testing)
    pub fn update(&self, f: impl FnOnce(&mut DashboardSettings)) {
        f(&mut *self.settings.write());
    }
}

#[async_trait]
impl SettingsProvider for MemorySettingsProvider {
    async fn load_settings(&self) -> ConfigResult<DashboardSettings> {
        Ok(self.settings.read().clone())
    }

    async fn save_settings(&self, settings: &DashboardSettings) -> ConfigResult<()> {
        settings.validate()?;
        *self.settings.write() = settings.clone();
        Ok(())
    }
}
