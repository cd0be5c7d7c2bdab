use anyhow::{Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
    time::Duration,
};

use crate::catalog::DEFAULT_CATALOG_URL;

pub const CATALOG_URL_ENV: &str = "BREWFLOW_CATALOG_URL";
pub const MUTE_ENV: &str = "BREWFLOW_MUTE";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AlertSettings {
    pub enabled: bool,
    pub volume: f32,
}

impl Default for AlertSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            volume: 0.8,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BrewSettings {
    pub catalog_url: String,
    pub request_timeout_secs: u64,
    pub alert: AlertSettings,
}

impl Default for BrewSettings {
    fn default() -> Self {
        Self {
            catalog_url: DEFAULT_CATALOG_URL.into(),
            request_timeout_secs: 15,
            alert: AlertSettings::default(),
        }
    }
}

impl BrewSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {}", path.display()))?;
        Ok(serde_json::from_str(&contents).unwrap_or_else(|err| {
            warn!("Ignoring malformed settings in {}: {err}", path.display());
            Self::default()
        }))
    }
}

/// `BREWFLOW_CATALOG_URL` and `BREWFLOW_MUTE`, captured once at startup.
///
/// Overrides only shape the effective settings; they are never written back.
#[derive(Debug, Clone, Default, PartialEq)]
struct EnvOverrides {
    catalog_url: Option<String>,
    muted: bool,
}

impl EnvOverrides {
    fn capture(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let catalog_url = lookup(CATALOG_URL_ENV).filter(|url| !url.trim().is_empty());
        let muted = lookup(MUTE_ENV)
            .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        Self { catalog_url, muted }
    }

    fn apply(&self, settings: &mut BrewSettings) {
        if let Some(url) = &self.catalog_url {
            settings.catalog_url = url.clone();
        }
        if self.muted {
            settings.alert.enabled = false;
        }
    }
}

/// Settings as stored on disk plus the environment overrides layered on top.
pub struct SettingsStore {
    path: PathBuf,
    file: RwLock<BrewSettings>,
    overrides: EnvOverrides,
}

impl SettingsStore {
    /// Loads settings from `path`, falling back to defaults when the file is
    /// missing or unreadable as JSON. Environment overrides are applied on top.
    pub fn new(path: PathBuf) -> Result<Self> {
        Self::with_env(path, |key| std::env::var(key).ok())
    }

    fn with_env(path: PathBuf, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let file = BrewSettings::from_file(&path)?;

        Ok(Self {
            path,
            file: RwLock::new(file),
            overrides: EnvOverrides::capture(lookup),
        })
    }

    fn read(&self) -> RwLockReadGuard<'_, BrewSettings> {
        match self.file.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, BrewSettings> {
        match self.file.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Effective settings: the file values with overrides applied.
    pub fn settings(&self) -> BrewSettings {
        let mut settings = self.read().clone();
        self.overrides.apply(&mut settings);
        settings
    }

    pub fn alert(&self) -> AlertSettings {
        self.settings().alert
    }

    /// Stores `alert` in the file. A mute override keeps the effective alert
    /// disabled regardless.
    pub fn update_alert(&self, alert: AlertSettings) -> Result<()> {
        let mut guard = self.write();
        guard.alert = alert;
        self.persist(&guard)
    }

    /// Re-reads the file. Overrides captured at startup stay in effect.
    pub fn reload(&self) -> Result<()> {
        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read settings from {}", self.path.display()))?;
        let data: BrewSettings = serde_json::from_str(&contents)
            .with_context(|| format!("Malformed settings in {}", self.path.display()))?;
        *self.write() = data;
        Ok(())
    }

    fn persist(&self, data: &BrewSettings) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}
