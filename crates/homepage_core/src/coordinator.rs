//! Single task that owns the host event subscription and decides when the
//! homepage opens: once at startup, on manual request, into a sole empty
//! pane, and after the idle threshold.

use std::{collections::BTreeMap, sync::Arc};

use anyhow::{anyhow, Context, Result};
use tokio::{
    sync::{broadcast, broadcast::error::RecvError, mpsc, oneshot},
    task::JoinHandle,
    time::{sleep_until, Instant},
};
use tracing::{debug, info, warn};

use crate::{
    homepage::{Homepage, LaunchOutcome, OpenRequest, Trigger},
    host::WorkspaceEvent,
    idle::IdleTimer,
};

const REQUEST_QUEUE: usize = 16;

/// An action URL the application was launched with.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlAction {
    pub action: String,
    pub params: BTreeMap<String, String>,
}

impl UrlAction {
    /// Whether the URL asks the application to show specific content, which
    /// takes precedence over the startup homepage.
    pub fn targets_content(&self) -> bool {
        matches!(self.action.as_str(), "open" | "advanced-uri")
            && ["file", "filepath", "workspace"]
                .iter()
                .any(|key| self.params.contains_key(*key))
    }
}

/// How the application was started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchContext {
    pub cold_start: bool,
    pub url_action: Option<UrlAction>,
}

impl LaunchContext {
    pub fn cold_start() -> Self {
        Self {
            cold_start: true,
            url_action: None,
        }
    }

    /// Plugin reload or settings change while the application is running.
    pub fn warm() -> Self {
        Self {
            cold_start: false,
            url_action: None,
        }
    }

    pub fn with_url_action(mut self, action: UrlAction) -> Self {
        self.url_action = Some(action);
        self
    }

    fn allows_startup_open(&self) -> bool {
        self.cold_start
            && !self
                .url_action
                .as_ref()
                .is_some_and(UrlAction::targets_content)
    }
}

enum Request {
    Open {
        alternate: bool,
        reply: oneshot::Sender<LaunchOutcome>,
    },
}

pub struct CoordinatorHandle {
    requests: mpsc::Sender<Request>,
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl CoordinatorHandle {
    /// Manual open, as from the ribbon or a command. `alternate` forces the
    /// homepage into a new pane.
    pub async fn open(&self, alternate: bool) -> Result<LaunchOutcome> {
        let (reply, outcome) = oneshot::channel();
        self.requests
            .send(Request::Open { alternate, reply })
            .await
            .map_err(|_| anyhow!("homepage coordinator has stopped"))?;
        outcome
            .await
            .context("homepage coordinator dropped the open request")
    }

    /// Stops the loop and waits for it to release the host subscription.
    pub async fn shutdown(self) -> Result<()> {
        let _ = self.shutdown.send(());
        self.task
            .await
            .context("homepage coordinator task failed")
    }
}

pub struct Coordinator {
    homepage: Arc<Homepage>,
    context: LaunchContext,
    events: broadcast::Receiver<WorkspaceEvent>,
    requests: mpsc::Receiver<Request>,
    shutdown: oneshot::Receiver<()>,
    idle: IdleTimer,
    started: bool,
}

impl Coordinator {
    pub fn spawn(homepage: Arc<Homepage>, context: LaunchContext) -> CoordinatorHandle {
        // Subscribe before the task starts so no event emitted after spawn is missed.
        let events = homepage.host().workspace.subscribe();
        let (requests_tx, requests) = mpsc::channel(REQUEST_QUEUE);
        let (shutdown_tx, shutdown) = oneshot::channel();

        let coordinator = Self {
            homepage,
            context,
            events,
            requests,
            shutdown,
            idle: IdleTimer::new(),
            started: false,
        };
        let task = tokio::spawn(coordinator.run());

        CoordinatorHandle {
            requests: requests_tx,
            shutdown: shutdown_tx,
            task,
        }
    }

    async fn run(mut self) {
        if self.homepage.host().workspace.is_layout_ready().await {
            self.on_layout_ready().await;
        }

        loop {
            let threshold = if self.homepage.is_loaded() {
                self.homepage.idle_threshold().await
            } else {
                None
            };
            let deadline = threshold.map(|threshold| self.idle.deadline(threshold));

            tokio::select! {
                biased;

                _ = &mut self.shutdown => {
                    info!("coordinator: shutting down");
                    break;
                }

                Some(request) = self.requests.recv() => self.on_request(request).await,

                event = self.events.recv() => match event {
                    Ok(event) => self.on_event(event).await,
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "coordinator: fell behind host events");
                    }
                    Err(RecvError::Closed) => {
                        info!("coordinator: host event stream closed");
                        break;
                    }
                },

                _ = idle_deadline(deadline) => self.on_idle().await,
            }
        }
    }

    async fn on_request(&mut self, request: Request) {
        match request {
            Request::Open { alternate, reply } => {
                let outcome = self.homepage.open(OpenRequest::manual(alternate)).await;
                log_outcome(Trigger::Manual, &outcome);
                if reply.send(outcome).is_err() {
                    debug!("coordinator: open requester went away");
                }
            }
        }
    }

    async fn on_event(&mut self, event: WorkspaceEvent) {
        match event {
            WorkspaceEvent::LayoutReady => self.on_layout_ready().await,
            WorkspaceEvent::LayoutChange => self.on_layout_change().await,
            WorkspaceEvent::ActivePaneChange(_) | WorkspaceEvent::EditorChange(_) => {
                self.idle.touch();
            }
            WorkspaceEvent::PaneClosed(pane) => self.homepage.forget_pane(pane).await,
        }
    }

    async fn on_layout_ready(&mut self) {
        if self.started {
            return;
        }
        self.started = true;

        let data = self.homepage.data().await;
        info!(
            profile = self.homepage.name(),
            value = %data.value,
            method = %data.open_mode,
            view = %data.view,
            kind = %data.kind,
            "coordinator: homepage configured"
        );

        if data.open_on_startup {
            if let Some(warning) = self.homepage.startup_warning().await {
                warn!("coordinator: startup open skipped: {warning}");
            } else if !self.context.allows_startup_open() {
                debug!(context = ?self.context, "coordinator: not a plain cold start, skipping startup open");
            } else {
                let outcome = self.homepage.open(OpenRequest::new(Trigger::Startup)).await;
                log_outcome(Trigger::Startup, &outcome);
            }
        }

        self.homepage.mark_loaded();
        self.idle.touch();
    }

    async fn on_layout_change(&mut self) {
        let data = self.homepage.data().await;

        if data.revert_view {
            if let Err(err) = self.homepage.revert_view().await {
                warn!("coordinator: view reversion failed: {err}");
            }
        }

        if data.open_when_empty {
            if let Some(outcome) = self.homepage.open_when_empty().await {
                log_outcome(Trigger::EmptyPane, &outcome);
            }
        }

        if data.always_apply {
            if let Err(err) = self.homepage.apply().await {
                warn!("coordinator: applying homepage settings failed: {err}");
            }
        }
    }

    async fn on_idle(&mut self) {
        info!("coordinator: idle threshold reached, opening homepage");
        let outcome = self.homepage.open(OpenRequest::new(Trigger::Idle)).await;
        log_outcome(Trigger::Idle, &outcome);
        self.idle.touch();
    }
}

async fn idle_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

fn log_outcome(trigger: Trigger, outcome: &LaunchOutcome) {
    match outcome {
        LaunchOutcome::Opened(pane) => {
            info!(?trigger, pane = pane.0, "coordinator: homepage opened");
        }
        LaunchOutcome::Aborted(_) => {}
        other => debug!(?trigger, outcome = ?other, "coordinator: launch finished"),
    }
}

#[cfg(test)]
#[path = "tests/coordinator_tests.rs"]
mod tests;
