use panelkit_core::catalog::StaticCatalog;
use panelkit_core::config::PanelConfig;
use panelkit_core::wire::{encode_frame, OutboundRequest, PanelEnvelope, ProtocolVersion};
use panelkit_view::{
    EventTarget, Handled, NewsPanel, PanelEvent, PanelSession, RequestSink, ResearchPanel,
};
use serde::Deserialize;
use std::cell::RefCell;
use std::collections::HashMap;
use std::io::Write;
use std::rc::Rc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PanelKind {
    News,
    Research,
}

/// One line from the host process. `kind` is only read when an `open`
/// creates a new session.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HostLine {
    #[serde(default)]
    pub version: ProtocolVersion,
    pub panel_id: String,
    #[serde(default)]
    pub kind: Option<PanelKind>,
    #[serde(flatten)]
    pub event: PanelEvent,
}

/// Writes outbound requests as NDJSON envelopes to a shared writer.
pub struct FrameWriter<W> {
    panel_id: String,
    max_frame_bytes: usize,
    out: Rc<RefCell<W>>,
}

impl<W: Write> FrameWriter<W> {
    pub fn new(panel_id: impl Into<String>, max_frame_bytes: usize, out: Rc<RefCell<W>>) -> Self {
        Self {
            panel_id: panel_id.into(),
            max_frame_bytes,
            out,
        }
    }
}

impl<W: Write> RequestSink for FrameWriter<W> {
    fn send(&mut self, request: OutboundRequest) {
        let kind = request.kind();
        let envelope = PanelEnvelope::new(self.panel_id.clone(), request);
        let frame = match encode_frame(&envelope, self.max_frame_bytes) {
            Ok(frame) => frame,
            Err(err) => {
                warn!(event = "request_encode_error", panel_id = %self.panel_id, kind, error = %err);
                return;
            }
        };
        let mut out = self.out.borrow_mut();
        if let Err(err) = out.write_all(&frame).and_then(|_| out.flush()) {
            warn!(event = "request_write_error", panel_id = %self.panel_id, kind, error = %err);
        }
    }
}

/// Routes host lines to panel sessions keyed by panel id.
pub struct Host<W> {
    config: PanelConfig,
    catalog: Rc<StaticCatalog>,
    allow_research: bool,
    max_frame_bytes: usize,
    out: Rc<RefCell<W>>,
    sessions: HashMap<String, Box<dyn EventTarget>>,
}

impl<W: Write + 'static> Host<W> {
    pub fn new(
        config: PanelConfig,
        catalog: Rc<StaticCatalog>,
        allow_research: bool,
        max_frame_bytes: usize,
        out: W,
    ) -> Self {
        Self {
            config,
            catalog,
            allow_research,
            max_frame_bytes,
            out: Rc::new(RefCell::new(out)),
            sessions: HashMap::new(),
        }
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn output(&self) -> std::cell::Ref<'_, W> {
        self.out.borrow()
    }

    pub fn dispatch(&mut self, line: HostLine) -> Option<Handled> {
        if line.version != ProtocolVersion::CURRENT {
            warn!(
                event = "protocol_version_mismatch",
                panel_id = %line.panel_id,
                version = line.version.0
            );
        }

        let HostLine {
            panel_id,
            kind,
            event,
            ..
        } = line;

        if !self.sessions.contains_key(&panel_id) {
            if !matches!(event, PanelEvent::Open) {
                debug!(event = "unknown_panel", panel_id = %panel_id, kind = event.kind());
                return None;
            }
            let Some(kind) = kind else {
                warn!(event = "missing_panel_kind", panel_id = %panel_id);
                return None;
            };
            let session = self.build_session(&panel_id, kind);
            self.sessions.insert(panel_id.clone(), session);
        }

        let session = self.sessions.get_mut(&panel_id)?;
        let handled = session.handle(event);
        log_handled(&panel_id, &handled);

        if matches!(handled, Handled::Closed(_)) {
            self.sessions.remove(&panel_id);
        }
        Some(handled)
    }

    fn build_session(&self, panel_id: &str, kind: PanelKind) -> Box<dyn EventTarget> {
        let sink = FrameWriter::new(panel_id, self.max_frame_bytes, Rc::clone(&self.out));
        match kind {
            PanelKind::News => Box::new(PanelSession::new(
                panel_id,
                NewsPanel::new(self.config.news),
                sink,
            )),
            PanelKind::Research => {
                let allowed = self.allow_research;
                Box::new(PanelSession::new(
                    panel_id,
                    ResearchPanel::new(Rc::clone(&self.catalog), move || allowed),
                    sink,
                ))
            }
        }
    }
}

fn log_handled(panel_id: &str, handled: &Handled) {
    match handled {
        Handled::Reconciled(summary) | Handled::Closed(summary) if !summary.is_empty() => info!(
            event = "view_changed",
            panel_id,
            created = summary.created,
            removed = summary.removed,
            refreshed = summary.refreshed
        ),
        Handled::Refused(err) => warn!(event = "open_refused", panel_id, error = %err),
        Handled::Ignored(kind) => debug!(event = "event_ignored", panel_id, kind = *kind),
        other => debug!(event = "event_handled", panel_id, outcome = ?other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use panelkit_core::wire::{decode_frame, DEFAULT_MAX_FRAME_BYTES};
    use panelkit_core::{Technology, TechnologyId};
    use panelkit_view::ActionOutcome;

    fn host(allow_research: bool) -> Host<Vec<u8>> {
        let catalog = StaticCatalog::from_technologies([Technology {
            id: TechnologyId::from("Drones"),
            name: "Drones".to_string(),
            tier: 2,
            discipline: "Industrial".to_string(),
            cost: 10_000,
        }]);
        Host::new(
            PanelConfig::default(),
            Rc::new(catalog),
            allow_research,
            DEFAULT_MAX_FRAME_BYTES,
            Vec::new(),
        )
    }

    fn line(raw: &str) -> HostLine {
        serde_json::from_str(raw).expect("parse host line")
    }

    fn requests(host: &Host<Vec<u8>>) -> Vec<PanelEnvelope<OutboundRequest>> {
        host.output()
            .split_inclusive(|b| *b == b'\n')
            .map(|frame| decode_frame(frame, DEFAULT_MAX_FRAME_BYTES).expect("decode request"))
            .collect()
    }

    #[test]
    fn open_creates_session_and_requests_state() {
        let mut host = host(true);
        let handled = host.dispatch(line(r#"{"panel_id":"news-1","kind":"news","type":"open"}"#));
        assert_eq!(handled, Some(Handled::Opened));
        assert_eq!(host.session_count(), 1);

        let sent = requests(&host);
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].panel_id, "news-1");
        assert_eq!(sent[0].msg, OutboundRequest::RequestInitialState);
    }

    #[test]
    fn events_for_unknown_panels_are_dropped() {
        let mut host = host(true);
        assert!(host
            .dispatch(line(r#"{"panel_id":"x","type":"delete","payload":{"index":1}}"#))
            .is_none());
        assert!(host.dispatch(line(r#"{"panel_id":"x","type":"open"}"#)).is_none());
        assert_eq!(host.session_count(), 0);
        assert!(host.output().is_empty());
    }

    #[test]
    fn research_flow_reaches_the_writer() {
        let mut host = host(false);
        host.dispatch(line(r#"{"panel_id":"rd","kind":"research","type":"open"}"#));
        let handled = host.dispatch(line(
            r#"{"panel_id":"rd","type":"research_snapshot","payload":{"points":5,"available":["Drones","Ghost"],"unlocked":[]}}"#,
        ));
        assert!(matches!(handled, Some(Handled::Reconciled(summary)) if summary.created == 1));

        let handled = host.dispatch(line(
            r#"{"panel_id":"rd","type":"select","payload":{"key":"Drones"}}"#,
        ));
        assert_eq!(handled, Some(Handled::Action(ActionOutcome::Sent)));
        let sent = requests(&host);
        assert_eq!(sent.last().map(|envelope| envelope.msg.kind()), Some("select_entry"));
    }

    #[test]
    fn close_removes_the_session() {
        let mut host = host(true);
        host.dispatch(line(r#"{"panel_id":"news-1","kind":"news","type":"open"}"#));
        host.dispatch(line(
            r#"{"panel_id":"news-1","type":"news_snapshot","payload":{"items":[{"title":"a","content":"b"}]}}"#,
        ));
        let handled = host.dispatch(line(r#"{"panel_id":"news-1","type":"close"}"#));
        assert!(matches!(handled, Some(Handled::Closed(summary)) if summary.removed == 1));
        assert_eq!(host.session_count(), 0);
    }
}
