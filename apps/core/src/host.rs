use std::cell::RefCell;
use std::collections::BTreeSet;

use futures::channel::mpsc::{self, UnboundedReceiver, UnboundedSender};
use serde::{Deserialize, Serialize};

use crate::model::{
    BookmarkRecord, ClosedSession, HistoryQuery, HistoryRecord, TabId, TabRecord, WindowId,
};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HostError {
    #[error("{0} is unavailable")]
    Unavailable(String),
    #[error("no tab with id {0}")]
    NotFound(TabId),
    #[error("host rejected the call: {0}")]
    Rejected(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TabUpdate {
    pub active: Option<bool>,
    pub muted: Option<bool>,
}

impl TabUpdate {
    pub fn activate() -> Self {
        Self {
            active: Some(true),
            muted: None,
        }
    }

    pub fn muted(muted: bool) -> Self {
        Self {
            active: None,
            muted: Some(muted),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabChange {
    Created(TabId),
    Removed(TabId),
    Updated(TabId),
}

pub type SubscriptionId = u64;

/// Receiving half of a tab-change subscription. Hand it back through
/// [`BrowserHost::unsubscribe_tab_changes`] when the popup goes away.
pub struct TabChangeStream {
    pub id: SubscriptionId,
    pub receiver: UnboundedReceiver<TabChange>,
}

impl TabChangeStream {
    /// Drains every notification already delivered without waiting.
    pub fn drain_pending(&mut self) -> Vec<TabChange> {
        let mut pending = Vec::new();
        while let Ok(change) = self.receiver.try_recv() {
            pending.push(change);
        }
        pending
    }
}

/// The browser-extension API surface the popup consumes. Every call that
/// reaches the browser is asynchronous; subscription bookkeeping and closing
/// the popup are synchronous.
#[allow(async_fn_in_trait)]
pub trait BrowserHost {
    async fn query_tabs(&self) -> Result<Vec<TabRecord>, HostError>;
    async fn update_tab(&self, tab_id: TabId, update: TabUpdate) -> Result<(), HostError>;
    async fn remove_tab(&self, tab_id: TabId) -> Result<(), HostError>;
    async fn create_tab(&self, url: &str) -> Result<(), HostError>;
    async fn current_window(&self) -> Result<WindowId, HostError>;
    async fn focus_window(&self, window_id: WindowId) -> Result<(), HostError>;

    /// Whether the sessions capability (and its permission) is present.
    fn sessions_available(&self) -> bool;
    async fn recently_closed(&self, max_results: usize) -> Result<Vec<ClosedSession>, HostError>;

    async fn search_history(&self, query: &HistoryQuery) -> Result<Vec<HistoryRecord>, HostError>;
    async fn recent_bookmarks(&self, count: usize) -> Result<Vec<BookmarkRecord>, HostError>;
    async fn search_bookmarks(&self, query: &str) -> Result<Vec<BookmarkRecord>, HostError>;

    fn subscribe_tab_changes(&self) -> TabChangeStream;
    fn unsubscribe_tab_changes(&self, id: SubscriptionId);

    fn close_popup(&self);
}

impl<H: BrowserHost + ?Sized> BrowserHost for &H {
    async fn query_tabs(&self) -> Result<Vec<TabRecord>, HostError> {
        (**self).query_tabs().await
    }

    async fn update_tab(&self, tab_id: TabId, update: TabUpdate) -> Result<(), HostError> {
        (**self).update_tab(tab_id, update).await
    }

    async fn remove_tab(&self, tab_id: TabId) -> Result<(), HostError> {
        (**self).remove_tab(tab_id).await
    }

    async fn create_tab(&self, url: &str) -> Result<(), HostError> {
        (**self).create_tab(url).await
    }

    async fn current_window(&self) -> Result<WindowId, HostError> {
        (**self).current_window().await
    }

    async fn focus_window(&self, window_id: WindowId) -> Result<(), HostError> {
        (**self).focus_window(window_id).await
    }

    fn sessions_available(&self) -> bool {
        (**self).sessions_available()
    }

    async fn recently_closed(&self, max_results: usize) -> Result<Vec<ClosedSession>, HostError> {
        (**self).recently_closed(max_results).await
    }

    async fn search_history(&self, query: &HistoryQuery) -> Result<Vec<HistoryRecord>, HostError> {
        (**self).search_history(query).await
    }

    async fn recent_bookmarks(&self, count: usize) -> Result<Vec<BookmarkRecord>, HostError> {
        (**self).recent_bookmarks(count).await
    }

    async fn search_bookmarks(&self, query: &str) -> Result<Vec<BookmarkRecord>, HostError> {
        (**self).search_bookmarks(query).await
    }

    fn subscribe_tab_changes(&self) -> TabChangeStream {
        (**self).subscribe_tab_changes()
    }

    fn unsubscribe_tab_changes(&self, id: SubscriptionId) {
        (**self).unsubscribe_tab_changes(id)
    }

    fn close_popup(&self) {
        (**self).close_popup()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum HostSource {
    Tabs,
    Sessions,
    History,
    Bookmarks,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum HostCall {
    UpdateTab { tab_id: TabId, update: TabUpdate },
    RemoveTab { tab_id: TabId },
    CreateTab { url: String },
    FocusWindow { window_id: WindowId },
    ClosePopup,
}

/// Serialisable browser state used to seed [`MockBrowserHost`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HostFixture {
    pub window_id: WindowId,
    pub tabs: Vec<TabRecord>,
    pub closed: Vec<ClosedSession>,
    pub history: Vec<HistoryRecord>,
    pub bookmarks: Vec<BookmarkRecord>,
    pub sessions_unavailable: bool,
}

#[derive(Default)]
struct MockState {
    fixture: HostFixture,
    next_tab_id: TabId,
    next_subscription: SubscriptionId,
    subscribers: Vec<(SubscriptionId, UnboundedSender<TabChange>)>,
    failing: BTreeSet<HostSource>,
    withdrawn: BTreeSet<HostSource>,
    reject_actions: bool,
    calls: Vec<HostCall>,
    popup_closed: bool,
}

impl MockState {
    fn notify(&mut self, change: TabChange) {
        self.subscribers
            .retain(|(_, sender)| sender.unbounded_send(change).is_ok());
    }

    fn check(&self, source: HostSource) -> Result<(), HostError> {
        if self.withdrawn.contains(&source) {
            return Err(HostError::Unavailable(format!("{source:?} API")));
        }
        if self.failing.contains(&source) {
            return Err(HostError::Rejected(format!("{source:?} query failed")));
        }
        Ok(())
    }

    fn check_action(&self) -> Result<(), HostError> {
        if self.reject_actions {
            return Err(HostError::Rejected("action rejected".into()));
        }
        Ok(())
    }

    fn tab_mut(&mut self, tab_id: TabId) -> Result<&mut TabRecord, HostError> {
        self.fixture
            .tabs
            .iter_mut()
            .find(|tab| tab.id == Some(tab_id))
            .ok_or(HostError::NotFound(tab_id))
    }
}

/// In-memory host that behaves like a single browser window and records the
/// mutations it receives.
#[derive(Default)]
pub struct MockBrowserHost {
    state: RefCell<MockState>,
}

impl MockBrowserHost {
    pub fn new(fixture: HostFixture) -> Self {
        let next_tab_id = fixture
            .tabs
            .iter()
            .filter_map(|tab| tab.id)
            .max()
            .unwrap_or(0)
            + 1;
        Self {
            state: RefCell::new(MockState {
                fixture,
                next_tab_id,
                next_subscription: 1,
                ..MockState::default()
            }),
        }
    }

    pub fn from_json(payload: &str) -> Result<Self, serde_json::Error> {
        Ok(Self::new(serde_json::from_str(payload)?))
    }

    pub fn calls(&self) -> Vec<HostCall> {
        self.state.borrow().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.borrow_mut().calls.clear();
    }

    pub fn subscriber_count(&self) -> usize {
        self.state.borrow().subscribers.len()
    }

    pub fn popup_closed(&self) -> bool {
        self.state.borrow().popup_closed
    }

    pub fn tabs(&self) -> Vec<TabRecord> {
        self.state.borrow().fixture.tabs.clone()
    }

    pub fn fail_source(&self, source: HostSource) {
        self.state.borrow_mut().failing.insert(source);
    }

    pub fn restore_source(&self, source: HostSource) {
        self.state.borrow_mut().failing.remove(&source);
    }

    /// Makes `source` answer as if its API went away after the capability
    /// check passed.
    pub fn withdraw_source(&self, source: HostSource) {
        self.state.borrow_mut().withdrawn.insert(source);
    }

    pub fn reject_actions(&self, reject: bool) {
        self.state.borrow_mut().reject_actions = reject;
    }

    /// Simulates a page starting or stopping playback.
    pub fn set_audible(&self, tab_id: TabId, audible: bool) -> Result<(), HostError> {
        let mut state = self.state.borrow_mut();
        state.tab_mut(tab_id)?.audible = audible;
        state.notify(TabChange::Updated(tab_id));
        Ok(())
    }

    pub fn push_closed(&self, session: ClosedSession) {
        self.state.borrow_mut().fixture.closed.insert(0, session);
    }
}

impl BrowserHost for MockBrowserHost {
    async fn query_tabs(&self) -> Result<Vec<TabRecord>, HostError> {
        let state = self.state.borrow();
        state.check(HostSource::Tabs)?;
        let window = state.fixture.window_id;
        Ok(state
            .fixture
            .tabs
            .iter()
            .filter(|tab| tab.window_id.map_or(true, |id| id == window))
            .cloned()
            .collect())
    }

    async fn update_tab(&self, tab_id: TabId, update: TabUpdate) -> Result<(), HostError> {
        let mut state = self.state.borrow_mut();
        state.check_action()?;
        state.calls.push(HostCall::UpdateTab { tab_id, update });
        state.tab_mut(tab_id)?;
        if update.active == Some(true) {
            for tab in state.fixture.tabs.iter_mut() {
                tab.active = tab.id == Some(tab_id);
            }
        }
        if let Some(muted) = update.muted {
            state.tab_mut(tab_id)?.muted = muted;
        }
        state.notify(TabChange::Updated(tab_id));
        Ok(())
    }

    async fn remove_tab(&self, tab_id: TabId) -> Result<(), HostError> {
        let mut state = self.state.borrow_mut();
        state.check_action()?;
        state.calls.push(HostCall::RemoveTab { tab_id });
        let index = state
            .fixture
            .tabs
            .iter()
            .position(|tab| tab.id == Some(tab_id))
            .ok_or(HostError::NotFound(tab_id))?;
        let mut removed = state.fixture.tabs.remove(index);
        removed.id = None;
        state.fixture.closed.insert(0, ClosedSession::from_tab(removed));
        state.notify(TabChange::Removed(tab_id));
        Ok(())
    }

    async fn create_tab(&self, url: &str) -> Result<(), HostError> {
        let mut state = self.state.borrow_mut();
        state.check_action()?;
        state.calls.push(HostCall::CreateTab {
            url: url.to_string(),
        });
        let id = state.next_tab_id;
        state.next_tab_id += 1;
        let window = state.fixture.window_id;
        state.fixture.tabs.push(TabRecord {
            window_id: Some(window),
            ..TabRecord::new(id, "", url)
        });
        state.notify(TabChange::Created(id));
        Ok(())
    }

    async fn current_window(&self) -> Result<WindowId, HostError> {
        Ok(self.state.borrow().fixture.window_id)
    }

    async fn focus_window(&self, window_id: WindowId) -> Result<(), HostError> {
        let mut state = self.state.borrow_mut();
        state.check_action()?;
        state.calls.push(HostCall::FocusWindow { window_id });
        Ok(())
    }

    fn sessions_available(&self) -> bool {
        !self.state.borrow().fixture.sessions_unavailable
    }

    async fn recently_closed(&self, max_results: usize) -> Result<Vec<ClosedSession>, HostError> {
        let state = self.state.borrow();
        if state.fixture.sessions_unavailable {
            return Err(HostError::Unavailable("sessions API".into()));
        }
        state.check(HostSource::Sessions)?;
        Ok(state
            .fixture
            .closed
            .iter()
            .take(max_results)
            .cloned()
            .collect())
    }

    async fn search_history(&self, query: &HistoryQuery) -> Result<Vec<HistoryRecord>, HostError> {
        let state = self.state.borrow();
        state.check(HostSource::History)?;
        let needle = query.text.trim().to_lowercase();
        Ok(state
            .fixture
            .history
            .iter()
            .filter(|entry| entry.last_visit_time.unwrap_or(0) >= query.start_time)
            .filter(|entry| {
                needle.is_empty()
                    || [entry.title.as_deref(), entry.url.as_deref()]
                        .into_iter()
                        .flatten()
                        .any(|text| text.to_lowercase().contains(&needle))
            })
            .take(query.max_results)
            .cloned()
            .collect())
    }

    async fn recent_bookmarks(&self, count: usize) -> Result<Vec<BookmarkRecord>, HostError> {
        let state = self.state.borrow();
        state.check(HostSource::Bookmarks)?;
        let mut recent = state.fixture.bookmarks.clone();
        recent.sort_by_key(|bookmark| std::cmp::Reverse(bookmark.date_added.unwrap_or(0)));
        recent.truncate(count);
        Ok(recent)
    }

    async fn search_bookmarks(&self, query: &str) -> Result<Vec<BookmarkRecord>, HostError> {
        let state = self.state.borrow();
        state.check(HostSource::Bookmarks)?;
        let needle = query.trim().to_lowercase();
        Ok(state
            .fixture
            .bookmarks
            .iter()
            .filter(|bookmark| {
                bookmark.title.to_lowercase().contains(&needle)
                    || bookmark
                        .url
                        .as_deref()
                        .is_some_and(|url| url.to_lowercase().contains(&needle))
            })
            .cloned()
            .collect())
    }

    fn subscribe_tab_changes(&self) -> TabChangeStream {
        let mut state = self.state.borrow_mut();
        let id = state.next_subscription;
        state.next_subscription += 1;
        let (sender, receiver) = mpsc::unbounded();
        state.subscribers.push((id, sender));
        TabChangeStream { id, receiver }
    }

    fn unsubscribe_tab_changes(&self, id: SubscriptionId) {
        self.state
            .borrow_mut()
            .subscribers
            .retain(|(subscriber, _)| *subscriber != id);
    }

    fn close_popup(&self) {
        let mut state = self.state.borrow_mut();
        state.calls.push(HostCall::ClosePopup);
        state.popup_closed = true;
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;

    use super::{BrowserHost, HostError, HostFixture, MockBrowserHost, TabChange, TabUpdate};
    use crate::model::TabRecord;

    fn host_with_tabs() -> MockBrowserHost {
        MockBrowserHost::new(HostFixture {
            window_id: 1,
            tabs: vec![
                TabRecord::new(1, "One", "https://one.example"),
                TabRecord::new(2, "Two", "https://two.example"),
            ],
            ..HostFixture::default()
        })
    }

    #[test]
    fn subscribers_receive_changes_until_unsubscribed() {
        let host = host_with_tabs();
        let mut stream = host.subscribe_tab_changes();
        block_on(host.update_tab(1, TabUpdate::muted(true))).unwrap();
        assert_eq!(stream.drain_pending(), vec![TabChange::Updated(1)]);

        host.unsubscribe_tab_changes(stream.id);
        assert_eq!(host.subscriber_count(), 0);
        block_on(host.remove_tab(2)).unwrap();
        assert!(stream.drain_pending().is_empty());
    }

    #[test]
    fn removed_tab_moves_to_recently_closed() {
        let host = host_with_tabs();
        block_on(host.remove_tab(2)).unwrap();
        let closed = block_on(host.recently_closed(25)).unwrap();
        assert_eq!(closed.len(), 1);
        assert_eq!(closed[0].tab.as_ref().unwrap().url, "https://two.example");
    }

    #[test]
    fn removing_missing_tab_is_not_found() {
        let host = host_with_tabs();
        assert_eq!(block_on(host.remove_tab(9)), Err(HostError::NotFound(9)));
    }

    #[test]
    fn unavailable_sessions_report_error() {
        let host = MockBrowserHost::new(HostFixture {
            sessions_unavailable: true,
            ..HostFixture::default()
        });
        assert!(!host.sessions_available());
        assert!(matches!(
            block_on(host.recently_closed(5)),
            Err(HostError::Unavailable(_))
        ));
    }
}
