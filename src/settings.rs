use anyhow::{Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::PathBuf,
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use crate::i18n::Language;
use crate::timer::SessionConfig;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct UserSettings {
    pub session: SessionConfig,
    pub muted: bool,
    pub language: Language,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            session: SessionConfig::default(),
            muted: false,
            language: Language::En,
        }
    }
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<UserSettings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_else(|err| {
                warn!("Ignoring unreadable settings at {}: {}", path.display(), err);
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

    pub fn snapshot(&self) -> UserSettings {
        self.read().clone()
    }

    /// Session timing; falls back to defaults if the stored values are invalid.
    pub fn session_config(&self) -> SessionConfig {
        let config = self.read().session;
        match config.validate() {
            Ok(()) => config,
            Err(err) => {
                warn!("Stored session config rejected ({err}); using defaults");
                SessionConfig::default()
            }
        }
    }

    pub fn update_session_config(&self, config: SessionConfig) -> Result<()> {
        config.validate()?;
        self.update(|settings| settings.session = config)
    }

    pub fn set_muted(&self, muted: bool) -> Result<()> {
        self.update(|settings| settings.muted = muted)
    }

    pub fn set_language(&self, language: Language) -> Result<()> {
        self.update(|settings| settings.language = language)
    }

    fn update(&self, apply: impl FnOnce(&mut UserSettings)) -> Result<()> {
        let mut guard = self.write();
        apply(&mut guard);
        self.persist(&guard)
    }

    fn persist(&self, data: &UserSettings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }

    fn read(&self) -> RwLockReadGuard<'_, UserSettings> {
        match self.data.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, UserSettings> {
        match self.data.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
