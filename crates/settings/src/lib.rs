//! Persisted homepage configuration: one [`HomepageData`] record per profile
//! name, wrapped in a schema-versioned [`HomepageSettings`] document.

use std::{collections::BTreeMap, time::Duration};

use serde::{Deserialize, Serialize};
use shared::domain::{Kind, OpenMode, ViewPreference};
use thiserror::Error;

mod migrate;
mod store;

pub use migrate::{from_json, migrate_v2};
pub use store::{load, JsonFileStore, MemorySettingsStore, SettingsStore};

pub const SCHEMA_VERSION: u32 = 3;
pub const DEFAULT_PROFILE: &str = "Main Homepage";
pub const MOBILE_PROFILE: &str = "Mobile Homepage";
pub const DEFAULT_VALUE: &str = "Home";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to access settings file '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("malformed settings document: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unknown homepage profile '{0}'")]
    UnknownProfile(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Desktop,
    Mobile,
}

/// A single homepage profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HomepageData {
    pub value: String,
    pub kind: Kind,
    pub open_on_startup: bool,
    pub open_mode: OpenMode,
    pub manual_open_mode: OpenMode,
    pub view: ViewPreference,
    pub revert_view: bool,
    pub open_when_empty: bool,
    #[serde(rename = "refreshDataview")]
    pub refresh_index: bool,
    pub auto_create: bool,
    pub auto_scroll: bool,
    pub pin: bool,
    pub commands: Vec<String>,
    pub always_apply: bool,
    pub hide_release_notes: bool,
}

impl Default for HomepageData {
    fn default() -> Self {
        Self {
            value: DEFAULT_VALUE.into(),
            kind: Kind::File,
            open_on_startup: true,
            open_mode: OpenMode::ReplaceAll,
            manual_open_mode: OpenMode::Retain,
            view: ViewPreference::Default,
            revert_view: true,
            open_when_empty: false,
            refresh_index: false,
            auto_create: true,
            auto_scroll: false,
            pin: false,
            commands: Vec::new(),
            always_apply: false,
            hide_release_notes: false,
        }
    }
}

impl HomepageData {
    /// Stores a user-entered note path, falling back to the default value for
    /// blank input.
    pub fn set_value(&mut self, raw: &str) {
        self.value = sanitize_note(raw).unwrap_or_else(|| DEFAULT_VALUE.to_string());
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HomepageSettings {
    pub version: u32,
    pub homepages: BTreeMap<String, HomepageData>,
    pub separate_mobile: bool,
    /// Idle threshold in minutes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval_time: Option<u32>,
}

impl Default for HomepageSettings {
    fn default() -> Self {
        let mut homepages = BTreeMap::new();
        homepages.insert(DEFAULT_PROFILE.to_string(), HomepageData::default());
        Self {
            version: SCHEMA_VERSION,
            homepages,
            separate_mobile: false,
            interval_time: None,
        }
    }
}

impl HomepageSettings {
    pub fn profile_name(&self, platform: Platform) -> &'static str {
        if self.separate_mobile && platform == Platform::Mobile {
            MOBILE_PROFILE
        } else {
            DEFAULT_PROFILE
        }
    }

    /// Returns the profile name for `platform`, creating the record on first
    /// use. The mobile profile starts as a copy of the main one.
    pub fn ensure_profile(&mut self, platform: Platform) -> &'static str {
        let name = self.profile_name(platform);
        if !self.homepages.contains_key(name) {
            let seed = self
                .homepages
                .get(DEFAULT_PROFILE)
                .cloned()
                .unwrap_or_default();
            tracing::info!(profile = name, "settings: creating homepage profile");
            self.homepages.insert(name.to_string(), seed);
        }
        name
    }

    pub fn profile(&self, name: &str) -> Result<&HomepageData, SettingsError> {
        self.homepages
            .get(name)
            .ok_or_else(|| SettingsError::UnknownProfile(name.to_string()))
    }

    pub fn profile_mut(&mut self, name: &str) -> Result<&mut HomepageData, SettingsError> {
        self.homepages
            .get_mut(name)
            .ok_or_else(|| SettingsError::UnknownProfile(name.to_string()))
    }

    pub fn remove_profile(&mut self, name: &str) -> Option<HomepageData> {
        self.homepages.remove(name)
    }

    /// `None` when the idle timer is disabled.
    pub fn idle_threshold(&self) -> Option<Duration> {
        self.interval_time
            .filter(|minutes| *minutes > 0)
            .map(|minutes| Duration::from_secs(u64::from(minutes) * 60))
    }
}

/// Normalizes a vault-relative note path. Returns `None` for blank input.
pub fn sanitize_note(raw: &str) -> Option<String> {
    if raw.trim().is_empty() {
        return None;
    }

    let replaced: String = raw
        .chars()
        .map(|c| match c {
            '\\' => '/',
            '\u{00A0}' | '\u{202F}' => ' ',
            other => other,
        })
        .collect();

    let joined = replaced
        .split('/')
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("/");

    if joined.is_empty() {
        Some("/".to_string())
    } else {
        Some(joined)
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
