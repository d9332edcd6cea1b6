use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    env, fs,
    path::{Path, PathBuf},
    sync::RwLock,
    time::Duration,
};

use crate::timeline::DEFAULT_TICK_INTERVAL;

pub const SETTINGS_PATH_ENV: &str = "SHOWCASE_SETTINGS";
pub const DEFAULT_SETTINGS_FILE: &str = "showcase-settings.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CarouselSettings {
    pub segment_duration_ms: u64,
    pub tick_interval_ms: u64,
    /// Close the carousel once the last item has been shown.
    pub dismiss_on_finish: bool,
    #[serde(skip)]
    pub debug: bool,
}

impl Default for CarouselSettings {
    fn default() -> Self {
        Self {
            segment_duration_ms: 5_000,
            tick_interval_ms: DEFAULT_TICK_INTERVAL.as_millis() as u64,
            dismiss_on_finish: true,
            debug: false,
        }
    }
}

impl CarouselSettings {
    pub fn segment_duration(&self) -> Duration {
        Duration::from_millis(self.segment_duration_ms)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.segment_duration_ms == 0 {
            bail!("segment_duration_ms must be greater than zero");
        }
        if self.tick_interval_ms == 0 {
            bail!("tick_interval_ms must be greater than zero");
        }
        if self.tick_interval_ms > self.segment_duration_ms {
            bail!(
                "tick_interval_ms ({}) must not exceed segment_duration_ms ({})",
                self.tick_interval_ms,
                self.segment_duration_ms
            );
        }
        Ok(())
    }

    /// Applies `SHOWCASE_SEGMENT_MS`, `SHOWCASE_TICK_MS` and `SHOWCASE_DEBUG`.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|key| env::var(key).ok())
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(raw) = lookup("SHOWCASE_SEGMENT_MS") {
            self.segment_duration_ms = raw
                .trim()
                .parse()
                .with_context(|| format!("SHOWCASE_SEGMENT_MS is not a number: {raw:?}"))?;
        }
        if let Some(raw) = lookup("SHOWCASE_TICK_MS") {
            self.tick_interval_ms = raw
                .trim()
                .parse()
                .with_context(|| format!("SHOWCASE_TICK_MS is not a number: {raw:?}"))?;
        }
        if let Some(raw) = lookup("SHOWCASE_DEBUG") {
            self.debug = raw == "1" || raw.eq_ignore_ascii_case("true");
        }
        Ok(())
    }
}

pub fn settings_path() -> PathBuf {
    env::var(SETTINGS_PATH_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_SETTINGS_FILE))
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<CarouselSettings>,
}

impl SettingsStore {
    /// Missing file means defaults; a file that exists but doesn't parse or
    /// validate is an error.
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            read_settings(&path)?
        } else {
            CarouselSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn carousel(&self) -> CarouselSettings {
        self.data
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn update_carousel(&self, settings: CarouselSettings) -> Result<()> {
        settings.validate()?;
        let mut guard = self
            .data
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = settings;
        self.persist(&guard)
    }

    pub fn reload(&self) -> Result<()> {
        let data = read_settings(&self.path)?;
        let mut guard = self
            .data
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = data;
        Ok(())
    }

    fn persist(&self, data: &CarouselSettings) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}

fn read_settings(path: &Path) -> Result<CarouselSettings> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read settings from {}", path.display()))?;
    let settings: CarouselSettings = serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse settings in {}", path.display()))?;
    settings
        .validate()
        .with_context(|| format!("Invalid settings in {}", path.display()))?;
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.json")).unwrap();
        let settings = store.carousel();
        assert_eq!(settings, CarouselSettings::default());
        assert_eq!(settings.segment_duration(), Duration::from_secs(5));
        assert_eq!(settings.tick_interval(), Duration::from_millis(10));
    }

    #[test]
    fn update_persists_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let store = SettingsStore::new(path.clone()).unwrap();

        let updated = CarouselSettings {
            segment_duration_ms: 3_000,
            dismiss_on_finish: false,
            ..CarouselSettings::default()
        };
        store.update_carousel(updated.clone()).unwrap();

        let reopened = SettingsStore::new(path).unwrap();
        assert_eq!(reopened.carousel(), updated);

        fs::write(
            reopened.path(),
            r#"{ "segment_duration_ms": 1200, "tick_interval_ms": 20 }"#,
        )
        .unwrap();
        reopened.reload().unwrap();
        let reloaded = reopened.carousel();
        assert_eq!(reloaded.segment_duration_ms, 1_200);
        assert_eq!(reloaded.tick_interval_ms, 20);
        assert!(reloaded.dismiss_on_finish);
    }

    #[test]
    fn zero_duration_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{ "segment_duration_ms": 0 }"#).unwrap();
        assert!(SettingsStore::new(path.clone()).is_err());

        fs::write(&path, "not json").unwrap();
        assert!(SettingsStore::new(path).is_err());

        let store = SettingsStore::new(dir.path().join("other.json")).unwrap();
        let bad = CarouselSettings {
            tick_interval_ms: 0,
            ..CarouselSettings::default()
        };
        assert!(store.update_carousel(bad).is_err());
        assert_eq!(store.carousel(), CarouselSettings::default());
    }

    #[test]
    fn overrides_replace_file_values() {
        let vars: HashMap<&str, &str> = [
            ("SHOWCASE_SEGMENT_MS", "2500"),
            ("SHOWCASE_TICK_MS", " 16 "),
            ("SHOWCASE_DEBUG", "TRUE"),
        ]
        .into_iter()
        .collect();

        let mut settings = CarouselSettings::default();
        settings
            .apply_overrides(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(settings.segment_duration_ms, 2_500);
        assert_eq!(settings.tick_interval_ms, 16);
        assert!(settings.debug);

        let mut settings = CarouselSettings::default();
        let err = settings
            .apply_overrides(|key| (key == "SHOWCASE_SEGMENT_MS").then(|| "soon".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains("SHOWCASE_SEGMENT_MS"));
    }
}
