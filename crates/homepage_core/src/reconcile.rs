//! Post-open presentation: view mode, pin, scroll and index refresh, plus the
//! bookkeeping that lets a homepage pane fall back to the default view once
//! the user navigates away from it.

use std::collections::HashMap;

use settings::HomepageData;
use shared::{
    domain::{
        same_target_caseless, trim_file, DocumentMode, HostFeature, PaneId, PaneState, ViewId,
        ViewPreference,
    },
    error::HomepageError,
};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::{gate::LaunchToken, host::Host, placement::host_err};

/// Lines kept below the viewport when scrolling rendered content to the end.
const SCROLL_MARGIN: usize = 4;

/// Identity of a view inside a pane. A pane that switches to a different view
/// type gets a new `ViewId`, which invalidates any key built from the old one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ViewKey {
    pub pane: PaneId,
    pub view: ViewId,
}

impl ViewKey {
    pub fn of(state: &PaneState) -> Self {
        Self {
            pane: state.pane_id,
            view: state.view_id,
        }
    }
}

/// Last value each view was reconciled against.
#[derive(Debug, Default)]
pub struct AppliedCache {
    entries: HashMap<ViewKey, String>,
}

impl AppliedCache {
    pub fn is_current(&self, key: ViewKey, value: &str) -> bool {
        self.entries.get(&key).is_some_and(|seen| seen == value)
    }

    pub fn record(&mut self, key: ViewKey, value: impl Into<String>) {
        self.entries.insert(key, value.into());
    }

    pub fn forget_pane(&mut self, pane: PaneId) {
        self.entries.retain(|key, _| key.pane != pane);
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

#[derive(Debug, Default)]
pub(crate) struct Presentation {
    pub reversion: Option<ViewKey>,
    pub applied: AppliedCache,
    pub computed_value: Option<String>,
}

impl Presentation {
    pub fn forget_pane(&mut self, pane: PaneId) {
        self.applied.forget_pane(pane);
        if self.reversion.is_some_and(|key| key.pane == pane) {
            self.reversion = None;
        }
    }
}

pub(crate) async fn configure(
    host: &Host,
    data: &HomepageData,
    presentation: &Mutex<Presentation>,
    pane: PaneId,
    loaded: bool,
    _token: &LaunchToken,
) -> Result<(), HomepageError> {
    let workspace = &host.workspace;
    let Some(state) = workspace.pane_state(pane).await else {
        debug!(pane = pane.0, "reconcile: pane vanished before configuration");
        return Ok(());
    };

    if !state.is_markdown() {
        if data.pin {
            workspace
                .set_pinned(pane, true)
                .await
                .map_err(host_err("pin pane"))?;
        }
        return Ok(());
    }

    {
        let key = ViewKey::of(&state);
        let mut presentation = presentation.lock().await;
        if data.revert_view {
            presentation.reversion = Some(key);
        }
        if let Some(file) = &state.file {
            presentation.applied.record(key, trim_file(file));
        }
    }

    if data.auto_scroll {
        let count = workspace
            .line_count(pane)
            .await
            .map_err(host_err("count lines"))?;
        let scrolled = match state.document.mode {
            DocumentMode::Preview => {
                workspace
                    .apply_scroll(pane, count.saturating_sub(SCROLL_MARGIN))
                    .await
            }
            DocumentMode::Source => workspace.set_cursor(pane, count.saturating_sub(1)).await,
        };
        scrolled.map_err(host_err("scroll to end"))?;
    }

    if data.pin {
        workspace
            .set_pinned(pane, true)
            .await
            .map_err(host_err("pin pane"))?;
    }

    if data.view == ViewPreference::Default {
        return Ok(());
    }

    let desired = data.view.apply_to(state.document);
    workspace
        .set_document_state(pane, desired)
        .await
        .map_err(host_err("set view mode"))?;
    debug!(pane = pane.0, view = %data.view, "reconcile: view mode applied");

    if loaded && data.refresh_index && host.features.is_enabled(HostFeature::ContentIndex) {
        if let Some(file) = &state.file {
            if let Err(err) = host.index.invalidate(file).await {
                warn!(file = %file, "reconcile: content index refresh failed: {err:#}");
            }
        }
    }

    Ok(())
}

/// Restores the global default view on the last homepage view once it shows
/// something else. Returns whether the view was changed.
pub(crate) async fn revert(
    host: &Host,
    data: &HomepageData,
    presentation: &Mutex<Presentation>,
) -> Result<bool, HomepageError> {
    if data.view == ViewPreference::Default {
        return Ok(false);
    }

    let (key, computed) = {
        let presentation = presentation.lock().await;
        match presentation.reversion {
            Some(key) => (key, presentation.computed_value.clone()),
            None => return Ok(false),
        }
    };

    let live = host
        .workspace
        .pane_state(key.pane)
        .await
        .filter(|state| state.view_id == key.view);
    let Some(state) = live else {
        presentation.lock().await.reversion = None;
        return Ok(false);
    };

    let still_home = match (&state.file, &computed) {
        (Some(file), Some(value)) => same_target_caseless(file, value),
        _ => false,
    };
    if still_home {
        return Ok(false);
    }

    presentation.lock().await.reversion = None;

    let defaults = host.vault.config().await.default_document_state();
    if !state.is_markdown() || state.document == defaults {
        return Ok(false);
    }

    host.workspace
        .set_document_state(key.pane, defaults)
        .await
        .map_err(host_err("restore default view"))?;
    info!(pane = key.pane.0, "reconcile: restored default view after leaving homepage");
    Ok(true)
}

#[cfg(test)]
#[path = "tests/reconcile_tests.rs"]
mod tests;
