use serde::Serialize;

use crate::action_dispatcher::Action;
use crate::config::Config;
use crate::domain::extract_domain;
use crate::fetch::ClosedTabs;
use crate::filter::FilterState;
use crate::matcher::QueryMatcher;
use crate::model::{display_title, BookmarkRecord, HistoryRecord, TabId, TabRecord};
use crate::quick_actions::quick_actions;

pub const NO_RESULTS: &str = "No results found.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupKind {
    QuickActions,
    MediaTabs,
    OpenedTabs,
    ClosedTabs,
    Bookmarks,
    History,
}

impl GroupKind {
    pub fn heading(self) -> &'static str {
        match self {
            Self::QuickActions => "Quick Actions",
            Self::MediaTabs => "Media Tabs",
            Self::OpenedTabs => "Opened Tabs",
            Self::ClosedTabs => "Recently Closed Tabs",
            Self::Bookmarks => "Bookmarks",
            Self::History => "History",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MediaState {
    pub audible: bool,
    pub muted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultItem {
    pub id: String,
    pub title: String,
    pub subtitle: String,
    pub icon: Option<String>,
    /// Strings the matcher may find this item by.
    pub keywords: Vec<String>,
    pub action: Option<Action>,
    /// Open tab behind the item, for the mute and close controls.
    pub tab_id: Option<TabId>,
    pub media: Option<MediaState>,
    pub disabled: bool,
}

impl ResultItem {
    pub fn action(id: &str, title: &str, subtitle: &str, action: Action) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            subtitle: subtitle.to_string(),
            icon: None,
            keywords: Vec::new(),
            action: Some(action),
            tab_id: None,
            media: None,
            disabled: false,
        }
    }

    fn for_url(id: String, title: &str, url: &str, action: Action) -> Self {
        let domain = extract_domain(url);
        Self {
            id,
            title: display_title(title, url).to_string(),
            keywords: vec![display_title(title, url).to_string(), domain.clone(), url.to_string()],
            subtitle: domain,
            icon: None,
            action: Some(action),
            tab_id: None,
            media: None,
            disabled: false,
        }
    }

    fn notice(id: &str, message: &str) -> Self {
        Self {
            id: id.to_string(),
            title: message.to_string(),
            subtitle: String::new(),
            icon: None,
            keywords: Vec::new(),
            action: None,
            tab_id: None,
            media: None,
            disabled: true,
        }
    }

    pub fn is_actionable(&self) -> bool {
        !self.disabled && self.action.is_some()
    }

    fn candidates(&self) -> Vec<&str> {
        self.keywords.iter().map(String::as_str).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultGroup {
    pub kind: GroupKind,
    pub heading: &'static str,
    pub items: Vec<ResultItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultView {
    pub groups: Vec<ResultGroup>,
    /// Set instead of any group when nothing matched.
    pub empty_message: Option<&'static str>,
}

impl ResultView {
    pub fn group(&self, kind: GroupKind) -> Option<&ResultGroup> {
        self.groups.iter().find(|group| group.kind == kind)
    }

    pub fn items(&self) -> impl Iterator<Item = &ResultItem> {
        self.groups.iter().flat_map(|group| group.items.iter())
    }

    pub fn find(&self, id: &str) -> Option<&ResultItem> {
        self.items().find(|item| item.id == id)
    }
}

/// Last fetched state of the four data sources.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sources {
    pub open_tabs: Vec<TabRecord>,
    pub closed: ClosedTabs,
    pub history: Vec<HistoryRecord>,
    pub bookmarks: Vec<BookmarkRecord>,
}

pub fn build_view<M>(
    sources: &Sources,
    filter: &FilterState,
    query: &str,
    matcher: &M,
    cfg: &Config,
) -> ResultView
where
    M: QueryMatcher + ?Sized,
{
    let query = query.trim();
    let mut groups = Vec::new();

    push_group(&mut groups, GroupKind::QuickActions, quick_actions(query, cfg));

    if filter.shows_tabs() {
        let (media, opened): (Vec<(usize, &TabRecord)>, Vec<(usize, &TabRecord)>) = sources
            .open_tabs
            .iter()
            .enumerate()
            .partition(|(_, tab)| tab.is_media());
        let opened = opened.into_iter().filter(|(_, tab)| !tab.active);

        push_group(
            &mut groups,
            GroupKind::MediaTabs,
            ranked(
                media.into_iter().map(|(position, tab)| open_tab_item(position, tab)).collect(),
                query,
                matcher,
            ),
        );
        push_group(
            &mut groups,
            GroupKind::OpenedTabs,
            ranked(
                opened.map(|(position, tab)| open_tab_item(position, tab)).collect(),
                query,
                matcher,
            ),
        );

        match &sources.closed.error {
            Some(message) => push_group(
                &mut groups,
                GroupKind::ClosedTabs,
                vec![ResultItem::notice("closed:unavailable", message)],
            ),
            None => push_group(
                &mut groups,
                GroupKind::ClosedTabs,
                ranked(
                    sources
                        .closed
                        .tabs
                        .iter()
                        .enumerate()
                        .map(|(index, tab)| closed_tab_item(index, tab))
                        .collect(),
                    query,
                    matcher,
                ),
            ),
        }
    }

    if filter.shows_bookmarks() {
        push_group(
            &mut groups,
            GroupKind::Bookmarks,
            ranked(
                sources.bookmarks.iter().filter_map(bookmark_item).collect(),
                query,
                matcher,
            ),
        );
    }

    if filter.shows_history() {
        push_group(
            &mut groups,
            GroupKind::History,
            ranked(
                sources.history.iter().filter_map(history_item).collect(),
                query,
                matcher,
            ),
        );
    }

    let empty_message = groups.is_empty().then_some(NO_RESULTS);
    ResultView {
        groups,
        empty_message,
    }
}

fn push_group(groups: &mut Vec<ResultGroup>, kind: GroupKind, items: Vec<ResultItem>) {
    if items.is_empty() {
        return;
    }
    groups.push(ResultGroup {
        kind,
        heading: kind.heading(),
        items,
    });
}

fn ranked<M>(items: Vec<ResultItem>, query: &str, matcher: &M) -> Vec<ResultItem>
where
    M: QueryMatcher + ?Sized,
{
    if query.is_empty() || items.is_empty() {
        return items;
    }

    let order = {
        let candidates: Vec<Vec<&str>> = items.iter().map(ResultItem::candidates).collect();
        matcher.rank(query, &candidates)
    };
    let mut slots: Vec<Option<ResultItem>> = items.into_iter().map(Some).collect();
    order
        .into_iter()
        .filter_map(|index| slots.get_mut(index).and_then(Option::take))
        .collect()
}

/// `position` is the tab's index in the fetched list; it keeps ids unique
/// for id-less tabs sharing a url.
fn open_tab_item(position: usize, tab: &TabRecord) -> ResultItem {
    let id = tab
        .id
        .map(|id| format!("tab:{id}"))
        .unwrap_or_else(|| format!("tab:{}#{position}", tab.url));
    let action = match tab.id {
        Some(tab_id) => Action::SwitchToTab {
            tab_id,
            window_id: tab.window_id,
        },
        None => Action::ReopenUrl(tab.url.clone()),
    };
    let mut item = ResultItem::for_url(id, &tab.title, &tab.url, action);
    item.icon = tab.fav_icon_url.clone();
    item.tab_id = tab.id;
    if tab.is_media() {
        item.media = Some(MediaState {
            audible: tab.audible,
            muted: tab.muted,
        });
    }
    item
}

fn closed_tab_item(index: usize, tab: &TabRecord) -> ResultItem {
    let mut item = ResultItem::for_url(
        format!("closed:{index}"),
        &tab.title,
        &tab.url,
        Action::ReopenUrl(tab.url.clone()),
    );
    item.icon = tab.fav_icon_url.clone();
    item
}

fn bookmark_item(bookmark: &BookmarkRecord) -> Option<ResultItem> {
    let url = bookmark.url.as_deref().filter(|url| !url.is_empty())?;
    Some(ResultItem::for_url(
        format!("bookmark:{}", bookmark.id),
        &bookmark.title,
        url,
        Action::ReopenUrl(url.to_string()),
    ))
}

fn history_item(entry: &HistoryRecord) -> Option<ResultItem> {
    let url = entry.url.as_deref().filter(|url| !url.is_empty())?;
    Some(ResultItem::for_url(
        format!("history:{}", entry.id),
        entry.title.as_deref().unwrap_or_default(),
        url,
        Action::ReopenUrl(url.to_string()),
    ))
}
