use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::PathBuf,
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
    time::Duration,
};

use crate::pointer::{EngineConfig, ScreenSize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserSettings {
    pub head_tracking_enabled: bool,
    pub pointer_size_px: f32,
    pub dwell_time_ms: u64,
    pub screen: ScreenSize,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            head_tracking_enabled: true,
            pointer_size_px: 40.0,
            dwell_time_ms: 1_000,
            screen: ScreenSize::default(),
        }
    }
}

impl UserSettings {
    pub fn dwell_time(&self) -> Duration {
        Duration::from_millis(self.dwell_time_ms)
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            screen: self.screen,
            pointer_size: self.pointer_size_px,
            head_tracking_enabled: self.head_tracking_enabled,
        }
    }
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<UserSettings>,
}

impl SettingsStore {
    /// Loads settings from `path`, falling back to defaults when the file is
    /// missing or does not parse.
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_else(|err| {
                log::warn!("Ignoring unreadable settings at {}: {}", path.display(), err);
                UserSettings::default()
            })
        } else {
            UserSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn current(&self) -> Result<UserSettings> {
        Ok(self.read()?.clone())
    }

    pub fn set_head_tracking_enabled(&self, enabled: bool) -> Result<()> {
        self.update(|settings| settings.head_tracking_enabled = enabled)
    }

    pub fn set_pointer_size(&self, size_px: f32) -> Result<()> {
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(anyhow!("pointer size must be positive, got {size_px}"));
        }
        self.update(|settings| settings.pointer_size_px = size_px)
    }

    pub fn set_dwell_time(&self, dwell: Duration) -> Result<()> {
        let millis = u64::try_from(dwell.as_millis()).context("dwell time out of range")?;
        self.update(|settings| settings.dwell_time_ms = millis)
    }

    pub fn set_screen(&self, screen: ScreenSize) -> Result<()> {
        self.update(|settings| settings.screen = screen)
    }

    pub fn reload(&self) -> Result<()> {
        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read settings from {}", self.path.display()))?;
        let data: UserSettings = serde_json::from_str(&contents)?;
        *self.write()? = data;
        Ok(())
    }

    fn update(&self, apply: impl FnOnce(&mut UserSettings)) -> Result<()> {
        let mut guard = self.write()?;
        apply(&mut guard);
        self.persist(&guard)
    }

    fn persist(&self, data: &UserSettings) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, UserSettings>> {
        self.data.read().map_err(|_| anyhow!("settings lock poisoned"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, UserSettings>> {
        self.data.write().map_err(|_| anyhow!("settings lock poisoned"))
    }
}
