use crate::reconcile::SyncOutcome;
use crate::sanitize::{Draft, Rejected};
use panelkit_core::wire::{DeleteEntry, OutboundRequest, SelectEntry};
use panelkit_core::{NewsSnapshot, ResearchSnapshot};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

/// Outbound half of the remote state channel.
pub trait RequestSink {
    fn send(&mut self, request: OutboundRequest);
}

impl RequestSink for Vec<OutboundRequest> {
    fn send(&mut self, request: OutboundRequest) {
        self.push(request);
    }
}

impl<S: RequestSink + ?Sized> RequestSink for &mut S {
    fn send(&mut self, request: OutboundRequest) {
        (**self).send(request);
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ChangeSummary {
    pub created: usize,
    pub removed: usize,
    pub refreshed: usize,
}

impl ChangeSummary {
    pub fn is_empty(&self) -> bool {
        self.created == 0 && self.removed == 0 && self.refreshed == 0
    }
}

impl std::ops::Add for ChangeSummary {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            created: self.created + other.created,
            removed: self.removed + other.removed,
            refreshed: self.refreshed + other.refreshed,
        }
    }
}

/// View changes handed to the rendering boundary.
pub trait ViewDelta {
    fn summary(&self) -> ChangeSummary;
}

impl<K, E> ViewDelta for SyncOutcome<K, E> {
    fn summary(&self) -> ChangeSummary {
        ChangeSummary {
            created: self.created.len(),
            removed: self.removed.len(),
            refreshed: self.refreshed.len(),
        }
    }
}

/// Panel-specific view state driven by a [`PanelSession`].
pub trait Panel {
    type Snapshot;
    type Changes: ViewDelta;

    fn kind(&self) -> &'static str;

    /// Builds the initial view state when the session opens.
    fn reset(&mut self);

    fn apply_snapshot(&mut self, snapshot: Self::Snapshot) -> Self::Changes;

    /// Destroys every entry. Called once, on close.
    fn teardown(&mut self) -> Self::Changes;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SessionState {
    #[default]
    Closed,
    Open,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("session is already open")]
    AlreadyOpen,
    #[error("session was closed and cannot be reopened")]
    Retired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    Sent,
    Rejected(Rejected),
    /// The session is not open; nothing was sent.
    Discarded,
}

/// Host-delivered events, queued and handled one at a time on the UI thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum PanelEvent {
    Open,
    Close,
    NewsSnapshot(NewsSnapshot),
    ResearchSnapshot(ResearchSnapshot),
    Submit(Draft),
    Delete(DeleteEntry),
    Select(SelectEntry),
    ServerMenu,
}

impl PanelEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Close => "close",
            Self::NewsSnapshot(_) => "news_snapshot",
            Self::ResearchSnapshot(_) => "research_snapshot",
            Self::Submit(_) => "submit",
            Self::Delete(_) => "delete",
            Self::Select(_) => "select",
            Self::ServerMenu => "server_menu",
        }
    }
}

impl From<panelkit_core::wire::InboundMsg> for PanelEvent {
    fn from(msg: panelkit_core::wire::InboundMsg) -> Self {
        use panelkit_core::wire::InboundMsg;
        match msg {
            InboundMsg::NewsSnapshot(snapshot) => Self::NewsSnapshot(snapshot),
            InboundMsg::ResearchSnapshot(snapshot) => Self::ResearchSnapshot(snapshot),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handled {
    Opened,
    Refused(SessionError),
    Closed(ChangeSummary),
    Reconciled(ChangeSummary),
    Action(ActionOutcome),
    /// Arrived while the session was not open.
    Discarded,
    /// Not meaningful for this panel kind.
    Ignored(&'static str),
}

/// Object-safe entry point for a host that keeps sessions of mixed kinds.
pub trait EventTarget {
    fn panel_id(&self) -> &str;
    fn state(&self) -> SessionState;
    fn handle(&mut self, event: PanelEvent) -> Handled;
}

/// Lifecycle controller for one open panel: `Closed -> Open -> Closed`,
/// where the second close is terminal.
pub struct PanelSession<P, S> {
    pub(crate) panel_id: String,
    pub(crate) state: SessionState,
    pub(crate) retired: bool,
    pub(crate) panel: P,
    pub(crate) sink: S,
}

impl<P: Panel, S: RequestSink> PanelSession<P, S> {
    pub fn new(panel_id: impl Into<String>, panel: P, sink: S) -> Self {
        Self {
            panel_id: panel_id.into(),
            state: SessionState::Closed,
            retired: false,
            panel,
            sink,
        }
    }

    pub fn panel_id(&self) -> &str {
        &self.panel_id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == SessionState::Open
    }

    pub fn panel(&self) -> &P {
        &self.panel
    }

    pub fn panel_mut(&mut self) -> &mut P {
        &mut self.panel
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn open(&mut self) -> Result<(), SessionError> {
        if self.is_open() {
            return Err(SessionError::AlreadyOpen);
        }
        if self.retired {
            return Err(SessionError::Retired);
        }
        self.panel.reset();
        self.state = SessionState::Open;
        info!(event = "panel_open", panel_id = %self.panel_id, kind = self.panel.kind());
        self.send(OutboundRequest::RequestInitialState);
        Ok(())
    }

    /// Returns the destroyed entries, or `None` if the session was not open.
    pub fn close(&mut self) -> Option<P::Changes> {
        if !self.is_open() {
            return None;
        }
        let changes = self.panel.teardown();
        self.state = SessionState::Closed;
        self.retired = true;
        info!(
            event = "panel_close",
            panel_id = %self.panel_id,
            destroyed = changes.summary().removed
        );
        Some(changes)
    }

    pub fn apply_snapshot(&mut self, snapshot: P::Snapshot) -> Option<P::Changes> {
        if !self.is_open() {
            debug!(event = "snapshot_discarded", panel_id = %self.panel_id);
            return None;
        }
        let changes = self.panel.apply_snapshot(snapshot);
        let summary = changes.summary();
        debug!(
            event = "snapshot_applied",
            panel_id = %self.panel_id,
            created = summary.created,
            removed = summary.removed,
            refreshed = summary.refreshed
        );
        Some(changes)
    }

    pub(crate) fn send(&mut self, request: OutboundRequest) -> ActionOutcome {
        if !self.is_open() {
            debug!(event = "request_discarded", panel_id = %self.panel_id, kind = request.kind());
            return ActionOutcome::Discarded;
        }
        debug!(event = "request_sent", panel_id = %self.panel_id, kind = request.kind());
        self.sink.send(request);
        ActionOutcome::Sent
    }

    /// Handles the events every panel understands. Anything else is handed
    /// back for the panel-specific dispatcher.
    pub(crate) fn handle_lifecycle(&mut self, event: PanelEvent) -> Result<Handled, PanelEvent> {
        match event {
            PanelEvent::Open => Ok(match self.open() {
                Ok(()) => Handled::Opened,
                Err(err) => Handled::Refused(err),
            }),
            PanelEvent::Close => Ok(self
                .close()
                .map(|changes| Handled::Closed(changes.summary()))
                .unwrap_or(Handled::Discarded)),
            other => Err(other),
        }
    }

    pub(crate) fn handle_snapshot(&mut self, snapshot: P::Snapshot) -> Handled {
        self.apply_snapshot(snapshot)
            .map(|changes| Handled::Reconciled(changes.summary()))
            .unwrap_or(Handled::Discarded)
    }
}
