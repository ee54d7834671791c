//! In-process host used by the CLI simulator and the test suites. Panes live
//! in a flat list grouped by split; every mutation is broadcast as a
//! [`WorkspaceEvent`] the way a real workspace would report it.

use std::{
    collections::{BTreeMap, HashMap, HashSet},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use shared::domain::{
    trim_file, untrim_name, DocumentState, HostFeature, PaneId, PaneState, Periodicity, SplitId,
    ViewId, CANVAS_VIEW, EMPTY_VIEW, GRAPH_OPEN_COMMAND, GRAPH_VIEW, MARKDOWN_VIEW,
    RELEASE_NOTES_VIEW,
};
use tokio::sync::broadcast;
use tracing::debug;

use crate::host::{
    Commands, ContentIndex, Host, HostFeatures, Notifier, PeriodicNotes, SavedLayouts, Vault,
    VaultConfig, Workspace, WorkspaceEvent,
};

const EVENT_CAPACITY: usize = 256;
const ROOT_SPLIT: SplitId = SplitId(0);

#[derive(Debug, Clone)]
struct Pane {
    id: PaneId,
    view: ViewId,
    split: SplitId,
    view_type: String,
    file: Option<String>,
    document: DocumentState,
    pinned: bool,
    cursor: Option<usize>,
    scroll: Option<usize>,
}

impl Pane {
    fn snapshot(&self) -> PaneState {
        PaneState {
            pane_id: self.id,
            view_id: self.view,
            view_type: self.view_type.clone(),
            file: self.file.clone(),
            document: self.document,
            pinned: self.pinned,
        }
    }
}

#[derive(Default)]
struct State {
    next_id: i64,
    panes: Vec<Pane>,
    active: Option<PaneId>,
    layout_ready: bool,
    files: BTreeMap<String, String>,
    layouts: BTreeMap<String, Vec<String>>,
    loaded_layout: Option<String>,
    features: HashSet<HostFeature>,
    periodic: HashMap<Periodicity, String>,
    periodic_autorun: bool,
    config: VaultConfig,
    failing_commands: HashSet<String>,
    executed: Vec<String>,
    notices: Vec<String>,
    invalidated: Vec<String>,
}

impl State {
    fn next(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn pane(&self, id: PaneId) -> Option<&Pane> {
        self.panes.iter().find(|pane| pane.id == id)
    }

    fn pane_mut(&mut self, id: PaneId) -> Result<&mut Pane> {
        self.panes
            .iter_mut()
            .find(|pane| pane.id == id)
            .ok_or_else(|| anyhow!("unknown pane {}", id.0))
    }

    fn active_split(&self) -> SplitId {
        self.active
            .and_then(|id| self.pane(id))
            .map(|pane| pane.split)
            .unwrap_or(ROOT_SPLIT)
    }

    fn create_pane(&mut self, split: SplitId, view_type: &str) -> PaneId {
        let id = PaneId(self.next());
        let view = ViewId(self.next());
        self.panes.push(Pane {
            id,
            view,
            split,
            view_type: view_type.to_string(),
            file: None,
            document: self.config.default_document_state(),
            pinned: false,
            cursor: None,
            scroll: None,
        });
        id
    }

    fn show_file(&mut self, id: PaneId, path: &str) -> Result<()> {
        let view_type = if path.ends_with(".canvas") {
            CANVAS_VIEW
        } else {
            MARKDOWN_VIEW
        };
        let fresh_view = ViewId(self.next());
        let defaults = self.config.default_document_state();
        let pane = self.pane_mut(id)?;

        if !(pane.view_type == MARKDOWN_VIEW && view_type == MARKDOWN_VIEW) {
            pane.view = fresh_view;
            pane.document = defaults;
        }
        pane.view_type = view_type.to_string();
        pane.file = Some(path.to_string());
        pane.cursor = None;
        pane.scroll = None;
        Ok(())
    }

    fn show_view(&mut self, id: PaneId, view_type: &str) -> Result<()> {
        let fresh_view = ViewId(self.next());
        let defaults = self.config.default_document_state();
        let pane = self.pane_mut(id)?;
        pane.view = fresh_view;
        pane.view_type = view_type.to_string();
        pane.file = None;
        pane.document = defaults;
        Ok(())
    }

    /// Removes panes matching `filter`, keeping at least one empty pane in
    /// the workspace. Returns the closed ids.
    fn close_where(&mut self, filter: impl Fn(&Pane) -> bool) -> Vec<PaneId> {
        let closed: Vec<PaneId> = self
            .panes
            .iter()
            .filter(|pane| filter(pane))
            .map(|pane| pane.id)
            .collect();
        self.panes.retain(|pane| !closed.contains(&pane.id));

        if self.active.is_some_and(|active| closed.contains(&active)) {
            self.active = self.panes.last().map(|pane| pane.id);
        }
        if self.panes.is_empty() {
            let id = self.create_pane(ROOT_SPLIT, EMPTY_VIEW);
            self.active = Some(id);
        }
        closed
    }

    fn resolve(&self, link: &str) -> Option<String> {
        if self.files.contains_key(link) {
            return Some(link.to_string());
        }
        let with_extension = untrim_name(link);
        if self.files.contains_key(&with_extension) {
            return Some(with_extension);
        }
        let wanted = trim_file(link).to_lowercase();
        self.files
            .keys()
            .find(|path| trim_file(path).to_lowercase() == wanted)
            .cloned()
    }
}

pub struct MemoryHost {
    state: Mutex<State>,
    events: broadcast::Sender<WorkspaceEvent>,
}

impl MemoryHost {
    /// A workspace holding a single empty pane, with graph and saved layouts
    /// enabled.
    pub fn new() -> Arc<Self> {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let mut state = State::default();
        state.features.insert(HostFeature::Graph);
        state.features.insert(HostFeature::SavedLayouts);
        let id = state.create_pane(ROOT_SPLIT, EMPTY_VIEW);
        state.active = Some(id);

        Arc::new(Self {
            state: Mutex::new(state),
            events,
        })
    }

    /// Bundles this host into the collaborator set the engine consumes.
    pub fn host(self: &Arc<Self>) -> Host {
        Host::new(self.clone(), self.clone(), self.clone(), self.clone())
            .with_periodic_notes(self.clone())
            .with_saved_layouts(self.clone())
            .with_content_index(self.clone())
            .with_notifier(self.clone())
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, events: impl IntoIterator<Item = WorkspaceEvent>) {
        for event in events {
            // No subscribers is fine.
            let _ = self.events.send(event);
        }
    }

    pub fn add_file(&self, path: &str, contents: &str) {
        self.state()
            .files
            .insert(path.to_string(), contents.to_string());
    }

    pub fn add_layout(&self, name: &str, files: &[&str]) {
        self.state().layouts.insert(
            name.to_string(),
            files.iter().map(|file| file.to_string()).collect(),
        );
    }

    pub fn enable_feature(&self, feature: HostFeature) {
        self.state().features.insert(feature);
    }

    pub fn disable_feature(&self, feature: HostFeature) {
        self.state().features.remove(&feature);
    }

    /// Makes `periodicity` available, resolving to `path` (created if absent).
    pub fn set_periodic_note(&self, periodicity: Periodicity, path: &str) {
        let mut state = self.state();
        state.periodic.insert(periodicity, path.to_string());
        state.files.entry(path.to_string()).or_default();
    }

    pub fn set_periodic_autorun(&self, enabled: bool) {
        self.state().periodic_autorun = enabled;
    }

    pub fn set_vault_config(&self, config: VaultConfig) {
        self.state().config = config;
    }

    pub fn fail_command(&self, id: &str) {
        self.state().failing_commands.insert(id.to_string());
    }

    pub fn set_layout_ready(&self) {
        self.state().layout_ready = true;
        self.emit([WorkspaceEvent::LayoutReady]);
    }

    /// Opens `path` in a new tab of the active split and focuses it.
    pub fn open_pane(&self, path: &str) -> PaneId {
        let id = {
            let mut state = self.state();
            let split = state.active_split();
            let id = state.create_pane(split, EMPTY_VIEW);
            // The pane was just created, so showing the file cannot fail.
            let _ = state.show_file(id, path);
            state.active = Some(id);
            id
        };
        self.emit([
            WorkspaceEvent::LayoutChange,
            WorkspaceEvent::ActivePaneChange(Some(id)),
        ]);
        id
    }

    /// Splits the workspace and focuses a new empty pane that is alone in
    /// its split.
    pub fn open_empty_split(&self) -> PaneId {
        let id = {
            let mut state = self.state();
            let split = SplitId(state.next());
            let id = state.create_pane(split, EMPTY_VIEW);
            state.active = Some(id);
            id
        };
        self.emit([
            WorkspaceEvent::LayoutChange,
            WorkspaceEvent::ActivePaneChange(Some(id)),
        ]);
        id
    }

    pub fn open_release_notes(&self) -> PaneId {
        let id = {
            let mut state = self.state();
            let split = state.active_split();
            state.create_pane(split, RELEASE_NOTES_VIEW)
        };
        self.emit([WorkspaceEvent::LayoutChange]);
        id
    }

    /// User navigation inside an existing pane.
    pub fn navigate(&self, pane: PaneId, path: &str) -> Result<()> {
        {
            let mut state = self.state();
            state.show_file(pane, path)?;
            state.active = Some(pane);
        }
        self.emit([
            WorkspaceEvent::LayoutChange,
            WorkspaceEvent::ActivePaneChange(Some(pane)),
        ]);
        Ok(())
    }

    pub fn activate(&self, pane: PaneId) {
        self.state().active = Some(pane);
        self.emit([WorkspaceEvent::ActivePaneChange(Some(pane))]);
    }

    pub fn edit(&self, pane: PaneId) {
        self.emit([WorkspaceEvent::EditorChange(pane)]);
    }

    pub fn close_pane(&self, pane: PaneId) {
        let closed = self.state().close_where(|candidate| candidate.id == pane);
        self.emit(closed.into_iter().map(WorkspaceEvent::PaneClosed));
        self.emit([WorkspaceEvent::LayoutChange]);
    }

    pub fn panes(&self) -> Vec<PaneState> {
        self.state().panes.iter().map(Pane::snapshot).collect()
    }

    pub fn pane(&self, id: PaneId) -> Option<PaneState> {
        self.state().pane(id).map(Pane::snapshot)
    }

    pub fn active(&self) -> Option<PaneId> {
        self.state().active
    }

    pub fn cursor(&self, id: PaneId) -> Option<usize> {
        self.state().pane(id).and_then(|pane| pane.cursor)
    }

    pub fn scroll(&self, id: PaneId) -> Option<usize> {
        self.state().pane(id).and_then(|pane| pane.scroll)
    }

    pub fn files(&self) -> Vec<String> {
        self.state().files.keys().cloned().collect()
    }

    pub fn notices(&self) -> Vec<String> {
        self.state().notices.clone()
    }

    pub fn executed_commands(&self) -> Vec<String> {
        self.state().executed.clone()
    }

    pub fn loaded_layout(&self) -> Option<String> {
        self.state().loaded_layout.clone()
    }

    pub fn invalidated(&self) -> Vec<String> {
        self.state().invalidated.clone()
    }
}

#[async_trait]
impl Workspace for MemoryHost {
    async fn is_layout_ready(&self) -> bool {
        self.state().layout_ready
    }

    async fn panes_of_type(&self, view_type: &str) -> Vec<PaneId> {
        self.state()
            .panes
            .iter()
            .filter(|pane| pane.view_type == view_type)
            .map(|pane| pane.id)
            .collect()
    }

    async fn active_pane(&self) -> Option<PaneId> {
        self.state().active
    }

    async fn set_active_pane(&self, pane: PaneId) -> Result<()> {
        let changed = {
            let mut state = self.state();
            state.pane_mut(pane)?;
            state.active.replace(pane) != Some(pane)
        };
        if changed {
            self.emit([WorkspaceEvent::ActivePaneChange(Some(pane))]);
        }
        Ok(())
    }

    async fn pane_state(&self, pane: PaneId) -> Option<PaneState> {
        self.pane(pane)
    }

    async fn sibling_count(&self, pane: PaneId) -> usize {
        let state = self.state();
        match state.pane(pane) {
            Some(target) => state
                .panes
                .iter()
                .filter(|candidate| candidate.split == target.split)
                .count(),
            None => 0,
        }
    }

    async fn acquire_pane(&self, new_tab: bool) -> Result<PaneId> {
        let (id, created) = {
            let mut state = self.state();
            let reusable = state
                .active
                .and_then(|id| state.pane(id))
                .filter(|pane| !pane.pinned)
                .map(|pane| pane.id);
            match reusable {
                Some(id) if !new_tab => (id, false),
                _ => {
                    let split = state.active_split();
                    (state.create_pane(split, EMPTY_VIEW), true)
                }
            }
        };
        if created {
            self.emit([WorkspaceEvent::LayoutChange]);
        }
        Ok(id)
    }

    async fn close_panes_of_type(&self, view_type: &str) -> Result<()> {
        let closed = self
            .state()
            .close_where(|pane| pane.view_type == view_type);
        if !closed.is_empty() {
            debug!(view_type, count = closed.len(), "memory: closed panes");
            self.emit(closed.into_iter().map(WorkspaceEvent::PaneClosed));
            self.emit([WorkspaceEvent::LayoutChange]);
        }
        Ok(())
    }

    async fn open_file(&self, pane: PaneId, path: &str) -> Result<()> {
        {
            let mut state = self.state();
            if !state.files.contains_key(path) {
                bail!("file '{path}' does not exist");
            }
            state.show_file(pane, path)?;
        }
        self.emit([WorkspaceEvent::LayoutChange]);
        Ok(())
    }

    async fn set_pinned(&self, pane: PaneId, pinned: bool) -> Result<()> {
        self.state().pane_mut(pane)?.pinned = pinned;
        Ok(())
    }

    async fn set_document_state(&self, pane: PaneId, document: DocumentState) -> Result<()> {
        self.state().pane_mut(pane)?.document = document;
        self.emit([WorkspaceEvent::LayoutChange]);
        Ok(())
    }

    async fn line_count(&self, pane: PaneId) -> Result<usize> {
        let state = self.state();
        let file = state
            .pane(pane)
            .ok_or_else(|| anyhow!("unknown pane {}", pane.0))?
            .file
            .clone();
        Ok(file
            .and_then(|path| state.files.get(&path))
            .map(|contents| contents.lines().count())
            .unwrap_or(0))
    }

    async fn set_cursor(&self, pane: PaneId, line: usize) -> Result<()> {
        let mut state = self.state();
        state.pane_mut(pane)?.cursor = Some(line);
        state.active = Some(pane);
        Ok(())
    }

    async fn apply_scroll(&self, pane: PaneId, line: usize) -> Result<()> {
        self.state().pane_mut(pane)?.scroll = Some(line);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<WorkspaceEvent> {
        self.events.subscribe()
    }
}

#[async_trait]
impl Vault for MemoryHost {
    async fn resolve_link(&self, link: &str) -> Option<String> {
        self.state().resolve(link)
    }

    async fn create_file(&self, path: &str, contents: &str) -> Result<String> {
        let mut state = self.state();
        if state.files.contains_key(path) {
            bail!("file '{path}' already exists");
        }
        state.files.insert(path.to_string(), contents.to_string());
        Ok(path.to_string())
    }

    async fn list_files(&self) -> Vec<String> {
        self.files()
    }

    async fn config(&self) -> VaultConfig {
        self.state().config
    }
}

#[async_trait]
impl PeriodicNotes for MemoryHost {
    async fn is_available(&self, periodicity: Periodicity) -> bool {
        self.state().periodic.contains_key(&periodicity)
    }

    async fn note_path(&self, periodicity: Periodicity) -> Result<String> {
        self.state()
            .periodic
            .get(&periodicity)
            .cloned()
            .ok_or_else(|| anyhow!("{periodicity} notes are not enabled"))
    }

    async fn opens_on_startup(&self) -> bool {
        self.state().periodic_autorun
    }
}

#[async_trait]
impl SavedLayouts for MemoryHost {
    async fn names(&self) -> Vec<String> {
        self.state().layouts.keys().cloned().collect()
    }

    async fn load(&self, name: &str) -> Result<()> {
        let closed = {
            let mut state = self.state();
            let files = state
                .layouts
                .get(name)
                .cloned()
                .ok_or_else(|| anyhow!("no saved layout named '{name}'"))?;

            let closed: Vec<PaneId> = state.panes.drain(..).map(|pane| pane.id).collect();
            state.active = None;
            for file in &files {
                let id = state.create_pane(ROOT_SPLIT, EMPTY_VIEW);
                state.show_file(id, file)?;
                state.active = Some(id);
            }
            if state.panes.is_empty() {
                let id = state.create_pane(ROOT_SPLIT, EMPTY_VIEW);
                state.active = Some(id);
            }
            state.loaded_layout = Some(name.to_string());
            closed
        };
        self.emit(closed.into_iter().map(WorkspaceEvent::PaneClosed));
        self.emit([WorkspaceEvent::LayoutChange]);
        Ok(())
    }
}

#[async_trait]
impl Commands for MemoryHost {
    async fn execute(&self, id: &str) -> Result<()> {
        let opened = {
            let mut state = self.state();
            state.executed.push(id.to_string());
            if state.failing_commands.contains(id) {
                bail!("command '{id}' failed");
            }
            if id != GRAPH_OPEN_COMMAND {
                return Ok(());
            }
            if !state.features.contains(&HostFeature::Graph) {
                bail!("graph view is disabled");
            }

            let reusable = state
                .active
                .and_then(|active| state.pane(active))
                .filter(|pane| !pane.pinned)
                .map(|pane| pane.id);
            let pane = match reusable {
                Some(pane) => pane,
                None => {
                    let split = state.active_split();
                    state.create_pane(split, EMPTY_VIEW)
                }
            };
            state.show_view(pane, GRAPH_VIEW)?;
            state.active = Some(pane);
            pane
        };
        self.emit([
            WorkspaceEvent::LayoutChange,
            WorkspaceEvent::ActivePaneChange(Some(opened)),
        ]);
        Ok(())
    }
}

#[async_trait]
impl ContentIndex for MemoryHost {
    async fn invalidate(&self, path: &str) -> Result<()> {
        self.state().invalidated.push(path.to_string());
        Ok(())
    }
}

impl HostFeatures for MemoryHost {
    fn is_enabled(&self, feature: HostFeature) -> bool {
        self.state().features.contains(&feature)
    }
}

impl Notifier for MemoryHost {
    fn notice(&self, message: &str) {
        debug!(notice = message, "memory: notice");
        self.state().notices.push(message.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn closing_every_pane_leaves_an_empty_one() {
        let host = MemoryHost::new();
        host.add_file("Home.md", "# Home");
        let pane = host.open_pane("Home.md");

        host.close_panes_of_type(MARKDOWN_VIEW)
            .await
            .expect("close markdown panes");
        host.close_panes_of_type(EMPTY_VIEW)
            .await
            .expect("close empty panes");

        let panes = host.panes();
        assert_eq!(panes.len(), 1);
        assert!(panes[0].is_empty());
        assert_ne!(panes[0].pane_id, pane);
        assert_eq!(host.active(), Some(panes[0].pane_id));
    }

    #[tokio::test]
    async fn markdown_navigation_keeps_the_view() {
        let host = MemoryHost::new();
        host.add_file("A.md", "");
        host.add_file("B.canvas", "");
        let pane = host.open_pane("A.md");
        let before = host.pane(pane).expect("pane").view_id;

        host.navigate(pane, "C.md").expect("navigate");
        assert_eq!(host.pane(pane).expect("pane").view_id, before);

        host.navigate(pane, "B.canvas").expect("navigate");
        let after = host.pane(pane).expect("pane");
        assert_ne!(after.view_id, before);
        assert_eq!(after.view_type, CANVAS_VIEW);
    }

    #[tokio::test]
    async fn links_resolve_with_or_without_extension() {
        let host = MemoryHost::new();
        host.add_file("Notes/Home.md", "");
        assert_eq!(
            host.resolve_link("Notes/Home").await.as_deref(),
            Some("Notes/Home.md")
        );
        assert_eq!(
            host.resolve_link("notes/home").await.as_deref(),
            Some("Notes/Home.md")
        );
        assert_eq!(host.resolve_link("Elsewhere").await, None);
    }

    #[tokio::test]
    async fn mutations_are_broadcast() {
        let host = MemoryHost::new();
        let mut events = host.subscribe();
        host.add_file("Home.md", "");

        let pane = host.open_pane("Home.md");
        assert_eq!(events.recv().await.expect("event"), WorkspaceEvent::LayoutChange);
        assert_eq!(
            events.recv().await.expect("event"),
            WorkspaceEvent::ActivePaneChange(Some(pane))
        );

        host.close_pane(pane);
        assert_eq!(
            events.recv().await.expect("event"),
            WorkspaceEvent::PaneClosed(pane)
        );
    }
}
