use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::debug;

use crate::{migrate::from_json, HomepageSettings, SettingsError};

/// Backing storage for the settings document.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Returns the raw stored document, or `None` if nothing was saved yet.
    async fn load_raw(&self) -> Result<Option<Value>, SettingsError>;
    async fn save(&self, settings: &HomepageSettings) -> Result<(), SettingsError>;
}

/// Loads and, if needed, upgrades the stored settings.
pub async fn load(store: &dyn SettingsStore) -> Result<HomepageSettings, SettingsError> {
    from_json(store.load_raw().await?)
}

pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> SettingsError {
        SettingsError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }
}

#[async_trait]
impl SettingsStore for JsonFileStore {
    async fn load_raw(&self) -> Result<Option<Value>, SettingsError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(self.io_error(err)),
        }
    }

    async fn save(&self, settings: &HomepageSettings) -> Result<(), SettingsError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|err| self.io_error(err))?;
        }
        let body = serde_json::to_string_pretty(settings)?;
        tokio::fs::write(&self.path, body)
            .await
            .map_err(|err| self.io_error(err))?;
        debug!(path = %self.path.display(), "settings: saved");
        Ok(())
    }
}

/// Keeps the document in memory; used by tests and the simulator.
#[derive(Default)]
pub struct MemorySettingsStore {
    document: Mutex<Option<Value>>,
    saves: Mutex<usize>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(document: Value) -> Self {
        Self {
            document: Mutex::new(Some(document)),
            saves: Mutex::new(0),
        }
    }

    pub async fn document(&self) -> Option<Value> {
        self.document.lock().await.clone()
    }

    pub async fn save_count(&self) -> usize {
        *self.saves.lock().await
    }
}

#[async_trait]
impl SettingsStore for MemorySettingsStore {
    async fn load_raw(&self) -> Result<Option<Value>, SettingsError> {
        Ok(self.document.lock().await.clone())
    }

    async fn save(&self, settings: &HomepageSettings) -> Result<(), SettingsError> {
        *self.document.lock().await = Some(serde_json::to_value(settings)?);
        *self.saves.lock().await += 1;
        Ok(())
    }
}
