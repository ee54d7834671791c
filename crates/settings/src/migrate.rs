use serde_json::{Map, Value};
use shared::domain::Kind;
use tracing::info;

use crate::{HomepageData, HomepageSettings, SettingsError, DEFAULT_PROFILE, SCHEMA_VERSION};

const LEGACY_VERSION: u64 = 2;
const LEGACY_INTERVAL_MINUTES: u32 = 5;
const LEGACY_KEYS: [&str; 5] = [
    "workspace",
    "momentFormat",
    "defaultNote",
    "useMoment",
    "workspaceEnabled",
];

/// Decodes a stored settings document, upgrading the flat v2 schema when
/// needed. A missing document yields the defaults.
pub fn from_json(raw: Option<Value>) -> Result<HomepageSettings, SettingsError> {
    let Some(raw) = raw.filter(|value| !value.is_null()) else {
        return Ok(HomepageSettings::default());
    };

    match raw {
        Value::Object(map) if map.get("version").and_then(Value::as_u64) == Some(LEGACY_VERSION) => {
            migrate_v2(map)
        }
        other => Ok(serde_json::from_value(other)?),
    }
}

/// Folds the v2 boolean toggles into a single [`Kind`] and moves the flat
/// record under the main profile.
pub fn migrate_v2(mut data: Map<String, Value>) -> Result<HomepageSettings, SettingsError> {
    let flag = |data: &Map<String, Value>, key: &str| {
        data.get(key).and_then(Value::as_bool).unwrap_or(false)
    };
    let text = |data: &Map<String, Value>, key: &str| data.get(key).cloned().unwrap_or(Value::Null);

    let (kind, value) = if flag(&data, "workspaceEnabled") {
        (Kind::Workspace, text(&data, "workspace"))
    } else if flag(&data, "useMoment") {
        (Kind::MomentDate, text(&data, "momentFormat"))
    } else {
        (Kind::File, text(&data, "defaultNote"))
    };

    for key in LEGACY_KEYS {
        data.remove(key);
    }
    data.remove("version");
    data.insert("kind".into(), serde_json::to_value(kind)?);
    if value.is_string() {
        data.insert("value".into(), value);
    }
    data.insert("commands".into(), Value::Array(Vec::new()));

    let profile: HomepageData = serde_json::from_value(Value::Object(data))?;
    info!(kind = %profile.kind, value = %profile.value, "settings: migrated v2 homepage settings");

    let mut settings = HomepageSettings {
        version: SCHEMA_VERSION,
        separate_mobile: false,
        interval_time: Some(LEGACY_INTERVAL_MINUTES),
        ..HomepageSettings::default()
    };
    settings.homepages.clear();
    settings.homepages.insert(DEFAULT_PROFILE.to_string(), profile);
    Ok(settings)
}
