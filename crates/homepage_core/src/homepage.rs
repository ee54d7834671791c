//! The `Homepage` facade: owns the active profile, the launch gate and the
//! presentation bookkeeping, and runs the resolve → place → reconcile
//! pipeline for every trigger.

use std::sync::Arc;

use settings::{HomepageData, HomepageSettings, Platform, SettingsError, SettingsStore};
use shared::{
    domain::{same_target, trim_file, OpenMode, PaneId, RELEASE_NOTES_VIEW},
    error::HomepageError,
};
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};

use crate::{
    gate::{LaunchGate, LaunchToken},
    host::Host,
    placement::{self, host_err},
    reconcile::{self, Presentation, ViewKey},
    resolver::{self, Target},
};

pub const STARTUP_CONFLICT_WARNING: &str = "This setting has been disabled, as it isn't compatible with Daily Notes' \"Open daily note on startup\" functionality. To use it, disable the Daily Notes setting.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    NotLoaded,
    Loaded,
}

/// What asked for the homepage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Startup,
    Manual,
    EmptyPane,
    Idle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenRequest {
    pub trigger: Trigger,
    /// Modifier-click or equivalent: forces the homepage into a new pane.
    pub alternate: bool,
}

impl OpenRequest {
    pub fn new(trigger: Trigger) -> Self {
        Self {
            trigger,
            alternate: false,
        }
    }

    pub fn manual(alternate: bool) -> Self {
        Self {
            trigger: Trigger::Manual,
            alternate,
        }
    }

    pub fn mode(&self, data: &HomepageData) -> OpenMode {
        if self.alternate {
            return OpenMode::Retain;
        }
        match self.trigger {
            Trigger::Startup | Trigger::Idle => data.open_mode,
            Trigger::Manual => data.manual_open_mode,
            Trigger::EmptyPane => OpenMode::Retain,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    InFlight,
    NotLoaded,
}

#[derive(Debug)]
pub enum LaunchOutcome {
    Opened(PaneId),
    LayoutLoaded(String),
    Nothing,
    Skipped(SkipReason),
    Aborted(HomepageError),
}

impl LaunchOutcome {
    pub fn pane(&self) -> Option<PaneId> {
        match self {
            LaunchOutcome::Opened(pane) => Some(*pane),
            _ => None,
        }
    }

    pub fn is_aborted(&self) -> bool {
        matches!(self, LaunchOutcome::Aborted(_))
    }
}

pub struct Homepage {
    name: &'static str,
    host: Host,
    store: Arc<dyn SettingsStore>,
    settings: Mutex<HomepageSettings>,
    presentation: Mutex<Presentation>,
    gate: LaunchGate,
    lifecycle: watch::Sender<Lifecycle>,
}

impl Homepage {
    /// Loads settings from `store` and selects the profile for `platform`,
    /// persisting the document when a profile had to be created.
    pub async fn load(
        host: Host,
        store: Arc<dyn SettingsStore>,
        platform: Platform,
    ) -> Result<Arc<Self>, SettingsError> {
        let mut settings = settings::load(store.as_ref()).await?;
        let existed = settings
            .homepages
            .contains_key(settings.profile_name(platform));
        let name = settings.ensure_profile(platform);
        if !existed {
            store.save(&settings).await?;
        }

        info!(profile = name, "homepage: settings loaded");
        Ok(Arc::new(Self::with_settings(host, store, settings, name)))
    }

    pub fn with_settings(
        host: Host,
        store: Arc<dyn SettingsStore>,
        settings: HomepageSettings,
        name: &'static str,
    ) -> Self {
        let (lifecycle, _) = watch::channel(Lifecycle::NotLoaded);
        Self {
            name,
            host,
            store,
            settings: Mutex::new(settings),
            presentation: Mutex::new(Presentation::default()),
            gate: LaunchGate::new(),
            lifecycle,
        }
    }

    pub fn name(&self) -> &str {
        self.name
    }

    pub fn host(&self) -> &Host {
        &self.host
    }

    /// Snapshot of the active profile.
    pub async fn data(&self) -> HomepageData {
        let settings = self.settings.lock().await;
        settings.homepages.get(self.name).cloned().unwrap_or_default()
    }

    pub async fn settings(&self) -> HomepageSettings {
        self.settings.lock().await.clone()
    }

    /// Mutates the active profile and persists the whole document.
    pub async fn update<F>(&self, mutate: F) -> Result<(), SettingsError>
    where
        F: FnOnce(&mut HomepageData),
    {
        let snapshot = {
            let mut settings = self.settings.lock().await;
            mutate(settings.profile_mut(self.name)?);
            settings.clone()
        };
        self.store.save(&snapshot).await
    }

    pub async fn update_settings<F>(&self, mutate: F) -> Result<(), SettingsError>
    where
        F: FnOnce(&mut HomepageSettings),
    {
        let snapshot = {
            let mut settings = self.settings.lock().await;
            mutate(&mut settings);
            settings.clone()
        };
        self.store.save(&snapshot).await
    }

    pub async fn save(&self) -> Result<(), SettingsError> {
        let snapshot = self.settings.lock().await.clone();
        self.store.save(&snapshot).await
    }

    pub fn is_loaded(&self) -> bool {
        *self.lifecycle.borrow() == Lifecycle::Loaded
    }

    pub fn mark_loaded(&self) {
        if self.lifecycle.send_replace(Lifecycle::Loaded) == Lifecycle::NotLoaded {
            debug!(profile = self.name, "homepage: loaded");
        }
    }

    pub fn lifecycle(&self) -> watch::Receiver<Lifecycle> {
        self.lifecycle.subscribe()
    }

    /// True while a launch holds the gate. Host adapters use this to hold
    /// back their own new-tab handling until the homepage is placed.
    pub fn in_flight(&self) -> bool {
        self.gate.in_flight()
    }

    pub async fn idle_threshold(&self) -> Option<std::time::Duration> {
        self.settings.lock().await.idle_threshold()
    }

    pub async fn has_required_feature(&self) -> bool {
        let kind = self.data().await.kind;
        resolver::has_required_feature(kind, &self.host).await
    }

    pub async fn compute_value(&self) -> Result<String, HomepageError> {
        let data = self.data().await;
        resolver::compute_value(&data, &self.host).await
    }

    /// Panes currently showing the homepage target.
    pub async fn opened_panes(&self) -> Result<Vec<PaneId>, HomepageError> {
        let data = self.data().await;
        let target = Target::resolve(&data, &self.host).await?;
        Ok(placement::opened_panes(&self.host, &target).await)
    }

    /// Warning for the settings surface when the periodic-notes subsystem
    /// opens its own note on startup and the startup open is suppressed.
    pub async fn startup_warning(&self) -> Option<&'static str> {
        if self.host.periodic.opens_on_startup().await {
            Some(STARTUP_CONFLICT_WARNING)
        } else {
            None
        }
    }

    pub async fn open(&self, request: OpenRequest) -> LaunchOutcome {
        if request.trigger != Trigger::Startup && !self.is_loaded() {
            debug!(trigger = ?request.trigger, "homepage: not loaded yet, skipping");
            return LaunchOutcome::Skipped(SkipReason::NotLoaded);
        }
        let Some(token) = self.gate.try_begin() else {
            info!(trigger = ?request.trigger, "homepage: launch already in flight, skipping");
            return LaunchOutcome::Skipped(SkipReason::InFlight);
        };

        let data = self.data().await;
        let mode = request.mode(&data);
        info!(
            profile = self.name,
            trigger = ?request.trigger,
            kind = %data.kind,
            %mode,
            "homepage: launch started"
        );

        let outcome = match self.launch(&data, mode, &token).await {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(
                    profile = self.name,
                    kind = %data.kind,
                    workspace_touched = !err.is_pre_placement(),
                    "homepage: launch aborted: {err}"
                );
                self.host.notify(&err.notice());
                return LaunchOutcome::Aborted(err);
            }
        };

        for command in &data.commands {
            if let Err(err) = self.host.commands.execute(command).await {
                warn!(command = %command, "homepage: post-open command failed: {err:#}");
            }
        }

        outcome
    }

    async fn launch(
        &self,
        data: &HomepageData,
        mode: OpenMode,
        token: &LaunchToken,
    ) -> Result<LaunchOutcome, HomepageError> {
        if !resolver::has_required_feature(data.kind, &self.host).await {
            return Err(HomepageError::Unavailable { kind: data.kind });
        }

        if data.hide_release_notes {
            self.host
                .workspace
                .close_panes_of_type(RELEASE_NOTES_VIEW)
                .await
                .map_err(host_err("close release notes"))?;
        }

        let target = Target::resolve(data, &self.host).await?;
        self.presentation.lock().await.computed_value = Some(match &target {
            Target::File(path) => path.clone(),
            Target::Layout(name) => name.clone(),
            Target::Graph | Target::Nothing => data.value.clone(),
        });

        match target {
            Target::Nothing => Ok(LaunchOutcome::Nothing),
            Target::Layout(name) => {
                placement::place_layout(&self.host, &name).await?;
                Ok(LaunchOutcome::LayoutLoaded(name))
            }
            target => {
                let placed = placement::place(&self.host, data, &target, mode, token).await?;
                let Some(pane) = placed else {
                    return Ok(LaunchOutcome::Nothing);
                };
                reconcile::configure(
                    &self.host,
                    data,
                    &self.presentation,
                    pane,
                    self.is_loaded(),
                    token,
                )
                .await?;
                Ok(LaunchOutcome::Opened(pane))
            }
        }
    }

    /// Restores the default view once the last homepage view shows something
    /// else.
    pub async fn revert_view(&self) -> Result<bool, HomepageError> {
        let data = self.data().await;
        reconcile::revert(&self.host, &data, &self.presentation).await
    }

    /// Opens the homepage into a sole empty pane. Returns `None` when the
    /// workspace does not qualify.
    pub async fn open_when_empty(&self) -> Option<LaunchOutcome> {
        if !self.is_loaded() || self.gate.in_flight() {
            return None;
        }

        let workspace = &self.host.workspace;
        let pane = workspace.active_pane().await?;
        let state = workspace.pane_state(pane).await?;
        if !state.is_empty() || workspace.sibling_count(pane).await != 1 {
            return None;
        }

        debug!(pane = pane.0, "homepage: sole empty pane, opening homepage");
        Some(self.open(OpenRequest::new(Trigger::EmptyPane)).await)
    }

    /// Reconciles the active pane when the user navigates to the homepage
    /// target by other means. Returns whether the pane was reconciled.
    pub async fn apply(&self) -> Result<bool, HomepageError> {
        let workspace = &self.host.workspace;
        let Some(pane) = workspace.active_pane().await else {
            return Ok(false);
        };
        let Some(state) = workspace.pane_state(pane).await else {
            return Ok(false);
        };
        let Some(file) = state.file.clone() else {
            return Ok(false);
        };

        let key = ViewKey::of(&state);
        {
            let mut presentation = self.presentation.lock().await;
            if presentation.applied.is_current(key, trim_file(&file)) {
                return Ok(false);
            }
            presentation.applied.record(key, trim_file(&file));
        }

        let data = self.data().await;
        let value = resolver::compute_value(&data, &self.host).await?;
        if !same_target(&file, &value) || !self.is_loaded() {
            return Ok(false);
        }
        let Some(token) = self.gate.try_begin() else {
            return Ok(false);
        };
        self.presentation.lock().await.computed_value = Some(value);

        debug!(pane = pane.0, file = %file, "homepage: applying settings to navigated homepage");
        reconcile::configure(&self.host, &data, &self.presentation, pane, true, &token).await?;
        Ok(true)
    }

    pub async fn forget_pane(&self, pane: PaneId) {
        self.presentation.lock().await.forget_pane(pane);
    }

    pub async fn applied_entries(&self) -> usize {
        self.presentation.lock().await.applied.len()
    }
}

#[cfg(test)]
#[path = "tests/homepage_tests.rs"]
mod tests;
