//! Client-side view state for simulation-backed panels: keyed list
//! reconciliation, outbound text sanitizing, and the open/close session
//! that ties them to a remote state channel.

pub mod news;
pub mod reconcile;
pub mod research;
pub mod sanitize;
pub mod session;

pub use news::{ArticleEntry, NewsChanges, NewsPanel};
pub use reconcile::{reconcile, ReconcilePlan, SyncOutcome, ViewList};
pub use research::{
    describe_technology, AccessCheck, AvailableCard, ResearchChanges, ResearchPanel, TechCard,
    UnlockedCard,
};
pub use sanitize::{clamp_text, sanitize, Draft, Rejected, TRUNCATION_MARKER};
pub use session::{
    ActionOutcome, ChangeSummary, EventTarget, Handled, Panel, PanelEvent, PanelSession,
    RequestSink, SessionError, SessionState, ViewDelta,
};
