//! Per-user icon display settings.
//!
//! Settings live in a small key/value store supplied by the host (the
//! browser's local storage in the web shell, a file or an in-memory map
//! elsewhere). Values are validated on load; anything missing or out of
//! range falls back to the server-provided defaults.

use std::str::FromStr;

use crate::{core::config::IconDefaults, prelude::HashMap};

const KEY_ICON_SCALE: &str = "icon_scale";
const KEY_ICON_TYPE: &str = "icon_type";
const KEY_ICON_SIZE: &str = "icon_size";

/// Allowed icon scale range
const ICON_SCALE_RANGE: std::ops::RangeInclusive<f64> = 0.5..=4.0;

/// Allowed PNG icon sizes
const ICON_SIZES: [u32; 4] = [32, 64, 128, 256];

/// Key/value persistence for per-user display preferences
pub trait SettingsStore {
    fn read(&self, key: &str) -> Option<String>;
    fn write(&mut self, key: &str, value: &str);
    fn remove(&mut self, key: &str);
}

/// In-memory store used by tests and headless hosts
#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    values: HashMap<String, String>,
}

impl SettingsStore for MemorySettingsStore {
    fn read(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn write(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
    }

    fn remove(&mut self, key: &str) {
        self.values.remove(key);
    }
}

/// Icon rendering format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IconType {
    #[default]
    Svg,
    Png,
}

impl FromStr for IconType {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, ()> {
        match s {
            "svg" => Ok(IconType::Svg),
            "png" => Ok(IconType::Png),
            _ => Err(()),
        }
    }
}

impl IconType {
    pub fn as_str(&self) -> &'static str {
        match self {
            IconType::Svg => "svg",
            IconType::Png => "png",
        }
    }
}

/// Validated icon display settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IconSettings {
    pub icon_scale: f64,
    pub icon_type: IconType,
    pub icon_size: u32,
}

impl Default for IconSettings {
    fn default() -> Self {
        Self::from_defaults(&IconDefaults::default())
    }
}

impl IconSettings {
    /// Settings straight from the server defaults. An invalid server
    /// icon type degrades to svg rather than failing startup.
    pub fn from_defaults(defaults: &IconDefaults) -> Self {
        Self {
            icon_scale: defaults.icon_scale,
            icon_type: defaults.icon_type.parse().unwrap_or_default(),
            icon_size: defaults.icon_size,
        }
    }

    /// Reads settings from the store, validating each entry and falling
    /// back to the server defaults for missing or invalid values
    pub fn load(store: &dyn SettingsStore, defaults: &IconDefaults) -> Self {
        let base = Self::from_defaults(defaults);

        let icon_scale = store
            .read(KEY_ICON_SCALE)
            .and_then(|v| v.parse::<f64>().ok())
            .filter(|v| ICON_SCALE_RANGE.contains(v))
            .unwrap_or(base.icon_scale);

        let icon_type = store
            .read(KEY_ICON_TYPE)
            .and_then(|v| v.parse::<IconType>().ok())
            .unwrap_or(base.icon_type);

        let icon_size = store
            .read(KEY_ICON_SIZE)
            .and_then(|v| v.parse::<u32>().ok())
            .filter(|v| ICON_SIZES.contains(v))
            .unwrap_or(base.icon_size);

        Self {
            icon_scale,
            icon_type,
            icon_size,
        }
    }

    /// Writes the current settings into the store
    pub fn save(&self, store: &mut dyn SettingsStore) {
        store.write(KEY_ICON_SCALE, &self.icon_scale.to_string());
        store.write(KEY_ICON_TYPE, self.icon_type.as_str());
        store.write(KEY_ICON_SIZE, &self.icon_size.to_string());
    }

    /// Clears persisted settings and returns the server defaults
    pub fn reset(store: &mut dyn SettingsStore, defaults: &IconDefaults) -> Self {
        store.remove(KEY_ICON_SCALE);
        store.remove(KEY_ICON_TYPE);
        store.remove(KEY_ICON_SIZE);
        Self::from_defaults(defaults)
    }
}
