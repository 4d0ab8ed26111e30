use serde::{Deserialize, Serialize};

pub type TabId = i64;
pub type WindowId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TabRecord {
    pub id: Option<TabId>,
    pub window_id: Option<WindowId>,
    pub title: String,
    pub url: String,
    pub fav_icon_url: Option<String>,
    pub last_accessed: Option<i64>,
    pub active: bool,
    pub audible: bool,
    pub muted: bool,
}

impl TabRecord {
    pub fn new(id: TabId, title: &str, url: &str) -> Self {
        Self {
            id: Some(id),
            title: title.to_string(),
            url: url.to_string(),
            ..Self::default()
        }
    }

    /// Audible and muted tabs are grouped together as media tabs.
    pub fn is_media(&self) -> bool {
        self.audible || self.muted
    }

    pub fn display_title(&self) -> &str {
        display_title(&self.title, &self.url)
    }
}

/// A recently closed session entry. Browsers report either a single tab or a
/// whole window; only tabs are surfaced.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClosedSession {
    pub last_modified: Option<i64>,
    pub tab: Option<TabRecord>,
    pub window_tab_count: Option<usize>,
}

impl ClosedSession {
    pub fn from_tab(tab: TabRecord) -> Self {
        Self {
            last_modified: tab.last_accessed,
            tab: Some(tab),
            window_tab_count: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HistoryRecord {
    pub id: String,
    pub url: Option<String>,
    pub title: Option<String>,
    pub last_visit_time: Option<i64>,
    pub visit_count: Option<u32>,
    pub typed_count: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BookmarkRecord {
    pub id: String,
    pub url: Option<String>,
    pub title: String,
    pub date_added: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryQuery {
    pub text: String,
    pub max_results: usize,
    pub start_time: i64,
}

impl HistoryQuery {
    pub fn new(text: &str, max_results: usize) -> Self {
        Self {
            text: text.to_string(),
            max_results,
            start_time: 0,
        }
    }
}

pub fn display_title<'a>(title: &'a str, url: &'a str) -> &'a str {
    if title.trim().is_empty() {
        url
    } else {
        title
    }
}

pub fn normalize_for_search(input: &str) -> String {
    input
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(|c| c.to_lowercase())
        .collect()
}
