use crate::reconcile::{SyncOutcome, ViewList};
use crate::sanitize::Draft;
use crate::session::{
    ActionOutcome, EventTarget, Handled, Panel, PanelEvent, PanelSession, RequestSink,
    SessionState,
};
use panelkit_core::config::TextLimits;
use panelkit_core::wire::{DeleteEntry, OutboundRequest};
use panelkit_core::{Article, NewsSnapshot};
use tracing::debug;

pub const DEFAULT_WINDOW_TITLE: &str = "News Terminal";

/// One rendered article, addressed by its position in the feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleEntry {
    pub index: usize,
    pub article: Article,
}

pub type NewsChanges = SyncOutcome<usize, ArticleEntry>;

pub struct NewsPanel {
    limits: TextLimits,
    title: String,
    articles: ViewList<usize, ArticleEntry>,
    can_share: bool,
    draft: Draft,
}

impl NewsPanel {
    pub fn new(limits: TextLimits) -> Self {
        Self {
            limits,
            title: DEFAULT_WINDOW_TITLE.to_string(),
            articles: ViewList::new(),
            can_share: false,
            draft: Draft::default(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn limits(&self) -> &TextLimits {
        &self.limits
    }

    pub fn articles(&self) -> impl Iterator<Item = &ArticleEntry> {
        self.articles.iter().map(|(_, entry)| entry)
    }

    pub fn article_count(&self) -> usize {
        self.articles.len()
    }

    /// Whether the share affordance should be shown as enabled.
    pub fn can_share(&self) -> bool {
        self.can_share
    }

    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut Draft {
        &mut self.draft
    }
}

impl Panel for NewsPanel {
    type Snapshot = NewsSnapshot;
    type Changes = NewsChanges;

    fn kind(&self) -> &'static str {
        "news"
    }

    fn reset(&mut self) {
        self.can_share = false;
        self.draft.clear();
    }

    fn apply_snapshot(&mut self, snapshot: NewsSnapshot) -> NewsChanges {
        self.can_share = snapshot.can_share_now();
        self.articles.sync_with(
            snapshot.items.into_iter().enumerate(),
            |(index, _): &(usize, Article)| *index,
            |(index, article)| ArticleEntry { index, article },
            |entry, (_, article)| {
                if entry.article == article {
                    return false;
                }
                entry.article = article;
                true
            },
        )
    }

    fn teardown(&mut self) -> NewsChanges {
        self.can_share = false;
        SyncOutcome {
            removed: self.articles.drain(),
            ..SyncOutcome::default()
        }
    }
}

impl<S: RequestSink> PanelSession<NewsPanel, S> {
    /// Sends the current draft. A rejected draft sends nothing and stays in
    /// the input fields.
    pub fn submit(&mut self) -> ActionOutcome {
        if !self.is_open() {
            return ActionOutcome::Discarded;
        }
        let limits = self.panel.limits;
        match self.panel.draft.take_submission(&limits) {
            Ok(entry) => self.send(OutboundRequest::SubmitEntry(entry)),
            Err(rejected) => {
                debug!(event = "submit_rejected", panel_id = %self.panel_id, reason = %rejected);
                ActionOutcome::Rejected(rejected)
            }
        }
    }

    /// Always forwarded; the simulation decides whether the index exists.
    pub fn delete(&mut self, index: i32) -> ActionOutcome {
        self.send(OutboundRequest::DeleteEntry(DeleteEntry { index }))
    }
}

impl<S: RequestSink> EventTarget for PanelSession<NewsPanel, S> {
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
            PanelEvent::NewsSnapshot(snapshot) => self.handle_snapshot(snapshot),
            PanelEvent::Submit(draft) => {
                if self.is_open() {
                    self.panel.draft = draft;
                }
                Handled::Action(self.submit())
            }
            PanelEvent::Delete(DeleteEntry { index }) => Handled::Action(self.delete(index)),
            other => Handled::Ignored(other.kind()),
        }
    }
}
