use anyhow::{Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::PathBuf,
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use crate::{breathing::BreathingPattern, timer::state::is_supported_duration};

pub const DEFAULT_QUOTES_URL: &str = "https://api.quotable.io/quotes/random?limit=50";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct ProbeSettings {
    pub host: String,
    pub port: u16,
    pub interval_secs: u64,
    pub timeout_ms: u64,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            host: "1.1.1.1".into(),
            port: 443,
            interval_secs: 5,
            timeout_ms: 1500,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct SanctuarySettings {
    pub default_timer_minutes: u32,
    pub breathing_pattern: BreathingPattern,
    /// Slider position, 0..=100.
    pub initial_volume: f32,
    pub quote_source_url: String,
    pub probe: ProbeSettings,
}

impl Default for SanctuarySettings {
    fn default() -> Self {
        Self {
            default_timer_minutes: 5,
            breathing_pattern: BreathingPattern::Box,
            initial_volume: 50.0,
            quote_source_url: DEFAULT_QUOTES_URL.into(),
            probe: ProbeSettings::default(),
        }
    }
}

impl SanctuarySettings {
    /// Replace out-of-range values with their defaults.
    pub fn validated(mut self) -> Self {
        let defaults = Self::default();

        if !is_supported_duration(self.default_timer_minutes) {
            warn!(
                "Ignoring unsupported default timer duration {}",
                self.default_timer_minutes
            );
            self.default_timer_minutes = defaults.default_timer_minutes;
        }
        if !self.initial_volume.is_finite() {
            self.initial_volume = defaults.initial_volume;
        }
        self.initial_volume = self.initial_volume.clamp(0.0, 100.0);
        if self.quote_source_url.trim().is_empty() {
            self.quote_source_url = defaults.quote_source_url;
        }
        if self.probe.host.trim().is_empty() {
            self.probe.host = defaults.probe.host;
        }
        if self.probe.interval_secs == 0 {
            self.probe.interval_secs = defaults.probe.interval_secs;
        }
        if self.probe.timeout_ms == 0 {
            self.probe.timeout_ms = defaults.probe.timeout_ms;
        }

        self
    }
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<SanctuarySettings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str::<SanctuarySettings>(&contents).unwrap_or_else(|err| {
                warn!("Settings at {} are unreadable ({err}); using defaults", path.display());
                SanctuarySettings::default()
            })
        } else {
            SanctuarySettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data.validated()),
        })
    }

    fn read(&self) -> RwLockReadGuard<'_, SanctuarySettings> {
        self.data.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, SanctuarySettings> {
        self.data.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn get(&self) -> SanctuarySettings {
        self.read().clone()
    }

    pub fn update_breathing_pattern(&self, pattern: BreathingPattern) -> Result<()> {
        let mut guard = self.write();
        guard.breathing_pattern = pattern;
        self.persist(&guard)
    }

    fn persist(&self, data: &SanctuarySettings) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.json")).unwrap();

        assert_eq!(store.get(), SanctuarySettings::default());
    }

    #[test]
    fn unreadable_json_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ not json").unwrap();

        let store = SettingsStore::new(path).unwrap();
        assert_eq!(store.get(), SanctuarySettings::default());
    }

    #[test]
    fn partial_file_fills_in_defaults_and_fixes_invalid_values() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(
            &path,
            r#"{ "defaultTimerMinutes": 7, "initialVolume": 180, "probe": { "intervalSecs": 0 } }"#,
        )
        .unwrap();

        let settings = SettingsStore::new(path).unwrap().get();
        assert_eq!(settings.default_timer_minutes, 5);
        assert_eq!(settings.initial_volume, 100.0);
        assert_eq!(settings.probe.interval_secs, 5);
        assert_eq!(settings.probe.host, "1.1.1.1");
        assert_eq!(settings.quote_source_url, DEFAULT_QUOTES_URL);
    }

    #[test]
    fn pattern_update_is_persisted() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");

        SettingsStore::new(path.clone())
            .unwrap()
            .update_breathing_pattern(BreathingPattern::ShortHold)
            .unwrap();

        let reloaded = SettingsStore::new(path).unwrap();
        assert_eq!(reloaded.get().breathing_pattern, BreathingPattern::ShortHold);
    }
}
