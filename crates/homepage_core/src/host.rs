//! Contracts for the host application the engine drives.
//!
//! Every collaborator is injected as an `Arc<dyn Trait>` through [`Host`].
//! Optional subsystems default to `Missing*` stand-ins that report themselves
//! unavailable instead of failing loudly.

use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shared::domain::{DocumentMode, DocumentState, HostFeature, PaneId, PaneState, Periodicity};
use tokio::sync::broadcast;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkspaceEvent {
    LayoutReady,
    LayoutChange,
    ActivePaneChange(Option<PaneId>),
    EditorChange(PaneId),
    PaneClosed(PaneId),
}

/// Global editor defaults configured in the vault.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultConfig {
    pub default_view_mode: Option<DocumentMode>,
    pub live_preview: Option<bool>,
}

impl VaultConfig {
    pub fn default_document_state(&self) -> DocumentState {
        DocumentState {
            mode: self.default_view_mode.unwrap_or(DocumentMode::Source),
            source: self.live_preview.map(|live| !live).unwrap_or(false),
        }
    }
}

#[async_trait]
pub trait Workspace: Send + Sync {
    async fn is_layout_ready(&self) -> bool;
    async fn panes_of_type(&self, view_type: &str) -> Vec<PaneId>;
    async fn active_pane(&self) -> Option<PaneId>;
    async fn set_active_pane(&self, pane: PaneId) -> Result<()>;
    async fn pane_state(&self, pane: PaneId) -> Option<PaneState>;
    /// Number of children in the split that contains `pane`, itself included.
    async fn sibling_count(&self, pane: PaneId) -> usize;
    /// Returns a pane to open content in: a fresh tab when `new_tab` is set,
    /// otherwise the most recent unpinned pane.
    async fn acquire_pane(&self, new_tab: bool) -> Result<PaneId>;
    async fn close_panes_of_type(&self, view_type: &str) -> Result<()>;
    async fn open_file(&self, pane: PaneId, path: &str) -> Result<()>;
    async fn set_pinned(&self, pane: PaneId, pinned: bool) -> Result<()>;
    async fn set_document_state(&self, pane: PaneId, state: DocumentState) -> Result<()>;
    async fn line_count(&self, pane: PaneId) -> Result<usize>;
    /// Moves the editing cursor to `line` and focuses the editor.
    async fn set_cursor(&self, pane: PaneId, line: usize) -> Result<()>;
    /// Scrolls rendered content so that `line` is in view.
    async fn apply_scroll(&self, pane: PaneId, line: usize) -> Result<()>;
    fn subscribe(&self) -> broadcast::Receiver<WorkspaceEvent>;
}

#[async_trait]
pub trait Vault: Send + Sync {
    /// Resolves a link text (with or without extension) to an existing path.
    async fn resolve_link(&self, link: &str) -> Option<String>;
    async fn create_file(&self, path: &str, contents: &str) -> Result<String>;
    async fn list_files(&self) -> Vec<String>;
    async fn config(&self) -> VaultConfig;
}

#[async_trait]
pub trait PeriodicNotes: Send + Sync {
    async fn is_available(&self, periodicity: Periodicity) -> bool;
    async fn note_path(&self, periodicity: Periodicity) -> Result<String>;
    /// Whether the subsystem opens its own note when the application starts.
    async fn opens_on_startup(&self) -> bool;
}

#[async_trait]
pub trait SavedLayouts: Send + Sync {
    async fn names(&self) -> Vec<String>;
    async fn load(&self, name: &str) -> Result<()>;
}

#[async_trait]
pub trait Commands: Send + Sync {
    async fn execute(&self, id: &str) -> Result<()>;
}

#[async_trait]
pub trait ContentIndex: Send + Sync {
    async fn invalidate(&self, path: &str) -> Result<()>;
}

pub trait HostFeatures: Send + Sync {
    fn is_enabled(&self, feature: HostFeature) -> bool;
}

pub trait Notifier: Send + Sync {
    fn notice(&self, message: &str);
}

pub struct MissingPeriodicNotes;

#[async_trait]
impl PeriodicNotes for MissingPeriodicNotes {
    async fn is_available(&self, _periodicity: Periodicity) -> bool {
        false
    }

    async fn note_path(&self, periodicity: Periodicity) -> Result<String> {
        Err(anyhow!("periodic notes unavailable for {periodicity} notes"))
    }

    async fn opens_on_startup(&self) -> bool {
        false
    }
}

pub struct MissingSavedLayouts;

#[async_trait]
impl SavedLayouts for MissingSavedLayouts {
    async fn names(&self) -> Vec<String> {
        Vec::new()
    }

    async fn load(&self, name: &str) -> Result<()> {
        Err(anyhow!("saved layouts unavailable, cannot load '{name}'"))
    }
}

pub struct MissingContentIndex;

#[async_trait]
impl ContentIndex for MissingContentIndex {
    async fn invalidate(&self, _path: &str) -> Result<()> {
        Ok(())
    }
}

/// Reports notices through the log only.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notice(&self, message: &str) {
        info!(notice = message, "host: notice shown");
    }
}

#[derive(Clone)]
pub struct Host {
    pub workspace: Arc<dyn Workspace>,
    pub vault: Arc<dyn Vault>,
    pub commands: Arc<dyn Commands>,
    pub features: Arc<dyn HostFeatures>,
    pub periodic: Arc<dyn PeriodicNotes>,
    pub layouts: Arc<dyn SavedLayouts>,
    pub index: Arc<dyn ContentIndex>,
    pub notifier: Arc<dyn Notifier>,
}

impl Host {
    pub fn new(
        workspace: Arc<dyn Workspace>,
        vault: Arc<dyn Vault>,
        commands: Arc<dyn Commands>,
        features: Arc<dyn HostFeatures>,
    ) -> Self {
        Self {
            workspace,
            vault,
            commands,
            features,
            periodic: Arc::new(MissingPeriodicNotes),
            layouts: Arc::new(MissingSavedLayouts),
            index: Arc::new(MissingContentIndex),
            notifier: Arc::new(LogNotifier),
        }
    }

    pub fn with_periodic_notes(mut self, periodic: Arc<dyn PeriodicNotes>) -> Self {
        self.periodic = periodic;
        self
    }

    pub fn with_saved_layouts(mut self, layouts: Arc<dyn SavedLayouts>) -> Self {
        self.layouts = layouts;
        self
    }

    pub fn with_content_index(mut self, index: Arc<dyn ContentIndex>) -> Self {
        self.index = index;
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn notify(&self, message: &str) {
        self.notifier.notice(message);
    }
}
