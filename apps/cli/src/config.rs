use std::{fs, path::Path, path::PathBuf};

use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliConfig {
    pub settings_path: PathBuf,
    pub log_filter: String,
    pub mobile: bool,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            settings_path: PathBuf::from(".obsidian/plugins/homepage/data.json"),
            log_filter: "info".into(),
            mobile: false,
        }
    }
}

/// Defaults, then `path` if it exists, then environment overrides.
pub fn load_config(path: &Path) -> CliConfig {
    let mut config = CliConfig::default();

    if let Ok(raw) = fs::read_to_string(path) {
        apply_file(&mut config, &raw);
    }
    apply_env(&mut config, |key| std::env::var(key).ok());

    config
}

fn apply_file(config: &mut CliConfig, raw: &str) {
    let table = match raw.parse::<toml::Table>() {
        Ok(table) => table,
        Err(err) => {
            warn!("config: ignoring malformed config file: {err}");
            return;
        }
    };

    if let Some(v) = table.get("settings_path").and_then(toml::Value::as_str) {
        config.settings_path = PathBuf::from(v);
    }
    if let Some(v) = table.get("log_filter").and_then(toml::Value::as_str) {
        config.log_filter = v.to_string();
    }
    if let Some(v) = table.get("mobile").and_then(toml::Value::as_bool) {
        config.mobile = v;
    }
}

fn apply_env(config: &mut CliConfig, var: impl Fn(&str) -> Option<String>) {
    if let Some(v) = var("HOMEPAGE_SETTINGS") {
        config.settings_path = PathBuf::from(v);
    }
    if let Some(v) = var("APP__SETTINGS_PATH") {
        config.settings_path = PathBuf::from(v);
    }

    if let Some(v) = var("HOMEPAGE_LOG") {
        config.log_filter = v;
    }
    if let Some(v) = var("APP__LOG_FILTER") {
        config.log_filter = v;
    }

    if let Some(v) = var("APP__MOBILE") {
        if let Ok(parsed) = v.parse::<bool>() {
            config.mobile = parsed;
        }
    }
}
