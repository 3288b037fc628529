use crate::reconcile::{SyncOutcome, ViewList};
use crate::session::{
    ActionOutcome, ChangeSummary, EventTarget, Handled, Panel, PanelEvent, PanelSession,
    RequestSink, SessionState, ViewDelta,
};
use panelkit_core::catalog::TechnologyCatalog;
use panelkit_core::wire::{OutboundRequest, SelectEntry};
use panelkit_core::{ResearchSnapshot, Technology, TechnologyId};
use tracing::{debug, warn};

/// Local access predicate. Only decides how card affordances are shown; the
/// simulation re-validates every selection.
pub trait AccessCheck {
    fn is_allowed(&self) -> bool;
}

impl<F: Fn() -> bool> AccessCheck for F {
    fn is_allowed(&self) -> bool {
        self()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailableCard {
    pub technology: Technology,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnlockedCard {
    pub technology: Technology,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TechCard {
    Available(AvailableCard),
    Unlocked(UnlockedCard),
}

impl TechCard {
    pub fn technology(&self) -> &Technology {
        match self {
            Self::Available(card) => &card.technology,
            Self::Unlocked(card) => &card.technology,
        }
    }

    pub fn id(&self) -> &TechnologyId {
        &self.technology().id
    }
}

pub fn describe_technology(technology: &Technology, include_tier: bool) -> String {
    let mut lines = Vec::with_capacity(3);
    if include_tier {
        lines.push(format!("Tier {} {}", technology.tier, technology.discipline));
    } else if !technology.discipline.is_empty() {
        lines.push(technology.discipline.clone());
    }
    lines.push(format!("Cost: {} points", technology.cost));
    lines.join("\n")
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResearchChanges {
    pub available: SyncOutcome<TechnologyId, TechCard>,
    pub unlocked: SyncOutcome<TechnologyId, TechCard>,
}

impl ViewDelta for ResearchChanges {
    fn summary(&self) -> ChangeSummary {
        self.available.summary() + self.unlocked.summary()
    }
}

pub struct ResearchPanel<C> {
    catalog: C,
    access: Box<dyn AccessCheck>,
    available: ViewList<TechnologyId, TechCard>,
    unlocked: ViewList<TechnologyId, TechCard>,
    points: i64,
    has_access: bool,
}

impl<C: TechnologyCatalog> ResearchPanel<C> {
    pub fn new(catalog: C, access: impl AccessCheck + 'static) -> Self {
        Self {
            catalog,
            access: Box::new(access),
            available: ViewList::new(),
            unlocked: ViewList::new(),
            points: 0,
            has_access: false,
        }
    }

    pub fn points(&self) -> i64 {
        self.points
    }

    /// Cached result of the access predicate from the last snapshot.
    pub fn cards_enabled(&self) -> bool {
        self.has_access
    }

    pub fn available(&self) -> impl Iterator<Item = &TechCard> {
        self.available.iter().map(|(_, card)| card)
    }

    pub fn unlocked(&self) -> impl Iterator<Item = &TechCard> {
        self.unlocked.iter().map(|(_, card)| card)
    }

    fn resolve(&self, ids: Vec<TechnologyId>, partition: &'static str) -> Vec<Technology> {
        ids.into_iter()
            .filter_map(|id| match self.catalog.technology(&id) {
                Some(technology) => Some(technology.clone()),
                None => {
                    warn!(event = "unknown_technology", partition, id = %id);
                    None
                }
            })
            .collect()
    }
}

impl<C: TechnologyCatalog> Panel for ResearchPanel<C> {
    type Snapshot = ResearchSnapshot;
    type Changes = ResearchChanges;

    fn kind(&self) -> &'static str {
        "research"
    }

    fn reset(&mut self) {
        self.points = 0;
        self.has_access = self.access.is_allowed();
    }

    fn apply_snapshot(&mut self, snapshot: ResearchSnapshot) -> ResearchChanges {
        self.points = snapshot.points;
        self.has_access = self.access.is_allowed();

        let available = self.resolve(snapshot.available, "available");
        let unlocked = self.resolve(snapshot.unlocked, "unlocked");

        ResearchChanges {
            available: self.available.sync(
                available,
                |technology| technology.id.clone(),
                |technology| {
                    TechCard::Available(AvailableCard {
                        description: describe_technology(&technology, true),
                        technology,
                    })
                },
            ),
            unlocked: self.unlocked.sync(
                unlocked,
                |technology| technology.id.clone(),
                |technology| TechCard::Unlocked(UnlockedCard { technology }),
            ),
        }
    }

    fn teardown(&mut self) -> ResearchChanges {
        ResearchChanges {
            available: SyncOutcome {
                removed: self.available.drain(),
                ..SyncOutcome::default()
            },
            unlocked: SyncOutcome {
                removed: self.unlocked.drain(),
                ..SyncOutcome::default()
            },
        }
    }
}

impl<C: TechnologyCatalog, S: RequestSink> PanelSession<ResearchPanel<C>, S> {
    pub fn select(&mut self, key: TechnologyId) -> ActionOutcome {
        if self.is_open() && !self.panel.has_access {
            debug!(event = "select_without_access", panel_id = %self.panel_id, key = %key);
        }
        self.send(OutboundRequest::SelectEntry(SelectEntry { key }))
    }

    pub fn open_server_menu(&mut self) -> ActionOutcome {
        self.send(OutboundRequest::OpenServerMenu)
    }
}

impl<C: TechnologyCatalog, S: RequestSink> EventTarget for PanelSession<ResearchPanel<C>, S> {
    fn panel_id(&self) -> &str {
        &self.panel_id
    }

    fn state(&self) -> SessionState {
        self.state
    }

    fn handle(&mut self, event: PanelEvent) -> Handled {
        let event = match self.handle_lifecycle(event) {
            Ok(handled) => return handled,
            Err(event) => event,
        };
        match event {
            PanelEvent::ResearchSnapshot(snapshot) => self.handle_snapshot(snapshot),
            PanelEvent::Select(SelectEntry { key }) => Handled::Action(self.select(key)),
            PanelEvent::ServerMenu => Handled::Action(self.open_server_menu()),
            other => Handled::Ignored(other.kind()),
        }
    }
}
