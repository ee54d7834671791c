//! Decides where a resolved target lands in the workspace and performs the
//! pane operations to put it there.

use anyhow::Error;
use settings::HomepageData;
use shared::{
    domain::{
        same_target, untrim_name, OpenMode, PaneId, GRAPH_OPEN_COMMAND, GRAPH_VIEW, LEAF_TYPES,
    },
    error::HomepageError,
};
use tracing::{debug, info};

use crate::{gate::LaunchToken, host::Host, resolver::Target};

pub(crate) fn host_err(operation: &'static str) -> impl FnOnce(Error) -> HomepageError {
    move |source| HomepageError::host(operation, source)
}

/// Panes that already show `target`.
pub async fn opened_panes(host: &Host, target: &Target) -> Vec<PaneId> {
    match target {
        Target::Graph => host.workspace.panes_of_type(GRAPH_VIEW).await,
        Target::File(value) => {
            let mut opened = Vec::new();
            for view_type in LEAF_TYPES {
                for pane in host.workspace.panes_of_type(view_type).await {
                    let shows_target = host
                        .workspace
                        .pane_state(pane)
                        .await
                        .and_then(|state| state.file)
                        .is_some_and(|file| same_target(&file, value));
                    if shows_target {
                        opened.push(pane);
                    }
                }
            }
            opened
        }
        Target::Layout(_) | Target::Nothing => Vec::new(),
    }
}

/// Places a file or graph target and returns the pane now showing it.
///
/// A missing file is detected (or created) before any pane is touched. Once
/// pane mutation starts there is no rollback: a host failure leaves the
/// workspace as it is.
pub(crate) async fn place(
    host: &Host,
    data: &HomepageData,
    target: &Target,
    mode: OpenMode,
    _token: &LaunchToken,
) -> Result<Option<PaneId>, HomepageError> {
    let file = match target {
        Target::File(value) => Some(ensure_file(host, data, value).await?),
        Target::Graph => None,
        Target::Layout(_) | Target::Nothing => return Ok(None),
    };

    let workspace = &host.workspace;
    let mut mode = mode;

    if mode != OpenMode::ReplaceAll {
        if let Some(&pane) = opened_panes(host, target).await.first() {
            debug!(pane = pane.0, "placement: reusing pane already showing the homepage");
            workspace
                .set_active_pane(pane)
                .await
                .map_err(host_err("activate pane"))?;
            return Ok(Some(pane));
        }
        if mode == OpenMode::Retain && active_is_empty(host).await {
            mode = OpenMode::ReplaceLast;
        }
    }

    if mode != OpenMode::Retain {
        if let Some(active) = workspace.active_pane().await {
            workspace
                .set_pinned(active, false)
                .await
                .map_err(host_err("unpin active pane"))?;
        }
    }

    if mode == OpenMode::ReplaceAll {
        for view_type in LEAF_TYPES {
            workspace
                .close_panes_of_type(view_type)
                .await
                .map_err(host_err("close panes"))?;
        }
        // The host materializes its replacement empty pane on the next turn.
        tokio::task::yield_now().await;
    }

    match file {
        Some(path) => open_note(host, &path, mode).await.map(Some),
        None => open_graph(host, mode).await,
    }
}

pub(crate) async fn place_layout(host: &Host, name: &str) -> Result<(), HomepageError> {
    if !host.layouts.names().await.iter().any(|known| known == name) {
        return Err(HomepageError::MissingLayout {
            name: name.to_string(),
        });
    }

    host.layouts
        .load(name)
        .await
        .map_err(host_err("load saved layout"))?;
    info!(layout = name, "placement: loaded saved layout");
    Ok(())
}

async fn ensure_file(host: &Host, data: &HomepageData, value: &str) -> Result<String, HomepageError> {
    if let Some(path) = host.vault.resolve_link(value).await {
        return Ok(path);
    }

    if !data.auto_create {
        return Err(HomepageError::MissingFile {
            target: value.to_string(),
        });
    }

    let path = untrim_name(value);
    info!(path = %path, "placement: creating missing homepage file");
    host.vault
        .create_file(&path, "")
        .await
        .map_err(host_err("create homepage file"))
}

async fn open_note(host: &Host, path: &str, mode: OpenMode) -> Result<PaneId, HomepageError> {
    let workspace = &host.workspace;
    let pane = workspace
        .acquire_pane(mode == OpenMode::Retain)
        .await
        .map_err(host_err("acquire pane"))?;
    workspace
        .open_file(pane, path)
        .await
        .map_err(host_err("open homepage file"))?;
    workspace
        .set_active_pane(pane)
        .await
        .map_err(host_err("activate pane"))?;
    debug!(pane = pane.0, path, %mode, "placement: homepage file opened");
    Ok(pane)
}

async fn open_graph(host: &Host, mode: OpenMode) -> Result<Option<PaneId>, HomepageError> {
    let workspace = &host.workspace;
    if mode == OpenMode::Retain {
        let pane = workspace
            .acquire_pane(true)
            .await
            .map_err(host_err("acquire pane"))?;
        workspace
            .set_active_pane(pane)
            .await
            .map_err(host_err("activate pane"))?;
    }

    host.commands
        .execute(GRAPH_OPEN_COMMAND)
        .await
        .map_err(host_err("open graph view"))?;
    Ok(workspace.active_pane().await)
}

async fn active_is_empty(host: &Host) -> bool {
    match host.workspace.active_pane().await {
        Some(pane) => host
            .workspace
            .pane_state(pane)
            .await
            .is_some_and(|state| state.is_empty()),
        None => false,
    }
}

#[cfg(test)]
#[path = "tests/placement_tests.rs"]
mod tests;
