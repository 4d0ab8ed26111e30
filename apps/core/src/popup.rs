use tracing::{debug, warn};

use crate::action_dispatcher::{dispatch, Action, ActionError, ActionOutcome};
use crate::aggregate::{build_view, ResultView, Sources};
use crate::config::Config;
use crate::fetch::{fetch_bookmarks, fetch_closed_tabs, fetch_history, fetch_open_tabs};
use crate::filter::{FilterKind, FilterState};
use crate::host::{BrowserHost, TabChangeStream};
use crate::keyboard::{KeyChord, KeyCommand, KeyOutcome, KeyboardRouter};
use crate::matcher::QueryMatcher;
use crate::model::TabId;

/// All state of one open popup. Created when the popup opens, dropped when
/// it closes; the tab-change subscription lives exactly as long.
pub struct SearchTabsPopup<H: BrowserHost, M: QueryMatcher> {
    host: H,
    matcher: M,
    config: Config,
    sources: Sources,
    filter: FilterState,
    query: String,
    keyboard: KeyboardRouter,
    subscription: Option<TabChangeStream>,
    last_action_error: Option<String>,
}

impl<H: BrowserHost, M: QueryMatcher> SearchTabsPopup<H, M> {
    pub fn new(host: H, matcher: M, config: Config) -> Self {
        Self {
            host,
            matcher,
            config,
            sources: Sources::default(),
            filter: FilterState::default(),
            query: String::new(),
            keyboard: KeyboardRouter::default(),
            subscription: None,
            last_action_error: None,
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn sources(&self) -> &Sources {
        &self.sources
    }

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn keyboard(&self) -> &KeyboardRouter {
        &self.keyboard
    }

    pub fn closed_tabs_error(&self) -> Option<&str> {
        self.sources.closed.error.as_deref()
    }

    pub fn last_action_error(&self) -> Option<&str> {
        self.last_action_error.as_deref()
    }

    pub fn is_mounted(&self) -> bool {
        self.subscription.is_some()
    }

    /// Subscribes to tab changes and loads every source.
    pub async fn mount(&mut self) {
        if self.subscription.is_none() {
            self.subscription = Some(self.host.subscribe_tab_changes());
        }
        self.refresh_all().await;
    }

    pub fn unmount(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            self.host.unsubscribe_tab_changes(subscription.id);
            debug!(id = subscription.id, "tab change subscription released");
        }
    }

    pub async fn refresh_all(&mut self) {
        let (open_tabs, closed, history, bookmarks) = futures::join!(
            fetch_open_tabs(&self.host),
            fetch_closed_tabs(&self.host, &self.config),
            fetch_history(&self.host, &self.query, &self.config),
            fetch_bookmarks(&self.host, &self.query, &self.config),
        );
        self.sources.open_tabs = open_tabs;
        self.sources.closed = closed;
        self.sources.history = history;
        self.sources.bookmarks = bookmarks;
    }

    pub async fn refresh_tabs(&mut self) {
        let (open_tabs, closed) = futures::join!(
            fetch_open_tabs(&self.host),
            fetch_closed_tabs(&self.host, &self.config),
        );
        self.sources.open_tabs = open_tabs;
        self.sources.closed = closed;
    }

    pub async fn refresh_open_tabs(&mut self) {
        self.sources.open_tabs = fetch_open_tabs(&self.host).await;
    }

    /// Applies pending tab-change notifications. Returns whether any arrived.
    pub async fn process_tab_changes(&mut self) -> bool {
        let pending = match self.subscription.as_mut() {
            Some(subscription) => subscription.drain_pending(),
            None => return false,
        };
        if pending.is_empty() {
            return false;
        }
        debug!(changes = pending.len(), "tab changes received");
        self.refresh_tabs().await;
        true
    }

    /// Stores the new query, resets the list scroll and re-reads the
    /// query-driven sources.
    pub async fn set_query(&mut self, query: &str) {
        if self.query == query {
            return;
        }
        self.query = query.to_string();
        self.keyboard.on_query_changed();
        let (history, bookmarks) = futures::join!(
            fetch_history(&self.host, &self.query, &self.config),
            fetch_bookmarks(&self.host, &self.query, &self.config),
        );
        self.sources.history = history;
        self.sources.bookmarks = bookmarks;
    }

    pub fn toggle_filter(&mut self, kind: FilterKind) {
        self.filter.toggle(kind);
    }

    pub fn view(&self) -> ResultView {
        build_view(
            &self.sources,
            &self.filter,
            &self.query,
            &self.matcher,
            &self.config,
        )
    }

    pub fn scroll_to(&mut self, offset: usize) {
        self.keyboard.scroll_to(offset);
    }

    pub async fn handle_key(&mut self, chord: &KeyChord) -> KeyOutcome {
        let outcome = self.keyboard.route(chord, &self.query);
        if let KeyOutcome::Consumed(Some(command)) = &outcome {
            match command {
                KeyCommand::ToggleFilter(kind) => self.toggle_filter(*kind),
                KeyCommand::WebSearch(query) => {
                    self.perform(Action::WebSearch(query.clone())).await;
                }
                KeyCommand::Navigate(query) => {
                    self.perform(Action::Navigate(query.clone())).await;
                }
                KeyCommand::OpenSubmenu | KeyCommand::CloseSubmenu => {}
            }
        }
        outcome
    }

    /// Runs the primary action of the item with `item_id` in the current view.
    pub async fn select(&mut self, item_id: &str) -> Option<ActionOutcome> {
        let action = self
            .view()
            .find(item_id)
            .filter(|item| item.is_actionable())
            .and_then(|item| item.action.clone())?;
        self.perform(action).await
    }

    pub async fn toggle_mute(&mut self, tab_id: TabId) -> Option<ActionOutcome> {
        let muted = self
            .sources
            .open_tabs
            .iter()
            .find(|tab| tab.id == Some(tab_id))?
            .muted;
        self.perform(Action::ToggleMute { tab_id, muted }).await
    }

    pub async fn close_tab(&mut self, tab_id: TabId) -> Option<ActionOutcome> {
        self.perform(Action::CloseTab(tab_id)).await
    }

    /// Dispatches `action`. Failures are logged and kept as a transient error
    /// instead of closing the popup.
    pub async fn perform(&mut self, action: Action) -> Option<ActionOutcome> {
        match dispatch(&self.host, &action, &self.config).await {
            Ok(outcome) => {
                self.last_action_error = None;
                if outcome.refetch_tabs {
                    self.refresh_open_tabs().await;
                }
                if outcome.close_popup {
                    self.unmount();
                }
                Some(outcome)
            }
            Err(error) => {
                self.record_action_error(&action, error);
                None
            }
        }
    }

    fn record_action_error(&mut self, action: &Action, error: ActionError) {
        warn!(?action, %error, "action failed");
        self.last_action_error = Some(error.to_string());
    }
}

impl<H: BrowserHost, M: QueryMatcher> Drop for SearchTabsPopup<H, M> {
    fn drop(&mut self) {
        self.unmount();
    }
}
