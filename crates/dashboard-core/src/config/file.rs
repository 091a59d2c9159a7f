//! File-based settings provider (YAML)
//!
//! Supports user-level (~/.config/dashboard/settings.yaml) and workspace-level
//! (.config/dashboard/settings.yaml) settings.

use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::RwLock;

use super::settings::{apply_env_overrides, DashboardSettings};
use super::traits::{ConfigResult, SettingsProvider};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigLevel {
    /// User-level settings (~/.config/dashboard/settings.yaml)
    User,
    /// Workspace-level settings (.config/dashboard/settings.yaml in workspace root)
    Workspace,
}

impl ConfigLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigLevel::User => "user",
            ConfigLevel::Workspace => "workspace",
        }
    }
}

/// File-based settings provider
///
/// Reads and writes settings from a YAML file. A missing file yields the
/// defaults. Environment overrides are applied on load and never written back.
///
/// # Example
///
/// ```no_run
/// use dashboard_core::config::FileSettingsProvider;
///
/// let user = FileSettingsProvider::user();
/// let workspace = FileSettingsProvider::workspace("/path/to/workspace");
/// ```
pub struct FileSettingsProvider {
    path: PathBuf,
    level: ConfigLevel,
    use_env: bool,
    cache: RwLock<Option<DashboardSettings>>,
}

impl FileSettingsProvider {
    pub fn new(path: impl Into<PathBuf>, level: ConfigLevel) -> Self {
        Self {
            path: path.into(),
            level,
            use_env: true,
            cache: RwLock::new(None),
        }
    }

    /// User-level provider (~/.config/dashboard/settings.yaml)
    pub fn user() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")).join(".config"));
        Self::new(config_dir.join("dashboard").join("settings.yaml"), ConfigLevel::User)
    }

    /// Workspace-level provider (.config/dashboard/settings.yaml)
    pub fn workspace(workspace_root: impl AsRef<Path>) -> Self {
        let path = workspace_root
            .as_ref()
            .join(".config")
            .join("dashboard")
            .join("settings.yaml");
        Self::new(path, ConfigLevel::Workspace)
    }

    /// Ignore `DASHBOARD_*` environment variables
    pub fn without_env(mut self) -> Self {
        self.use_env = false;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn level(&self) -> ConfigLevel {
        self.level
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    fn read_file(&self) -> ConfigResult<DashboardSettings> {
        if !self.path.exists() {
            return Ok(DashboardSettings::default());
        }

        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(DashboardSettings::default());
        }
        Ok(serde_yaml::from_str(&content)?)
    }

    fn write_file(&self, settings: &DashboardSettings) -> ConfigResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_yaml::to_string(settings)?)?;
        *self.cache.write() = Some(settings.clone());
        Ok(())
    }

    /// Cached file contents, read on first use
    fn cached(&self) -> ConfigResult<DashboardSettings> {
        if let Some(settings) = self.cache.read().as_ref() {
            return Ok(settings.clone());
        }

        let settings = self.read_file()?;
        *self.cache.write() = Some(settings.clone());
        Ok(settings)
    }

    /// Re-read the file, dropping the cache
    pub fn reload(&self) -> ConfigResult<DashboardSettings> {
        let settings = self.read_file()?;
        *self.cache.write() = Some(settings.clone());
        Ok(settings)
    }
}

impl std::fmt::Debug for FileSettingsProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileSettingsProvider")
            .field("path", &self.path)
            .field("level", &self.level)
            .field("exists", &self.exists())
            .finish()
    }
}

#[async_trait]
impl SettingsProvider for FileSettingsProvider {
    async fn load_settings(&self) -> ConfigResult<DashboardSettings> {
        let mut settings = self.cached()?;
        if self.use_env {
            apply_env_overrides(&mut settings, |k| std::env::var(k).ok());
        }
        settings.validate()?;
        Ok(settings)
    }

    async fn save_settings(&self, settings: &DashboardSettings) -> ConfigResult<()> {
        settings.validate()?;
        self.write_file(settings)
    }
}
