use tracing::{debug, warn};

use crate::config::Config;
use crate::host::{BrowserHost, HostError};
use crate::model::{BookmarkRecord, HistoryQuery, HistoryRecord, TabRecord};

pub const CLOSED_TABS_UNAVAILABLE: &str =
    "Recently closed tabs are unavailable: the sessions permission is missing.";

/// Result of reading recently closed tabs. `error` is set when the sessions
/// capability is missing or the source reports itself unavailable; the tabs
/// are then empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClosedTabs {
    pub tabs: Vec<TabRecord>,
    pub error: Option<String>,
}

pub async fn fetch_open_tabs<H: BrowserHost>(host: &H) -> Vec<TabRecord> {
    match host.query_tabs().await {
        Ok(mut tabs) => {
            tabs.sort_by_key(|tab| std::cmp::Reverse(tab.last_accessed.unwrap_or(0)));
            debug!(count = tabs.len(), "fetched open tabs");
            tabs
        }
        Err(error) => {
            warn!(%error, "failed to query open tabs");
            Vec::new()
        }
    }
}

pub async fn fetch_closed_tabs<H: BrowserHost>(host: &H, cfg: &Config) -> ClosedTabs {
    if !host.sessions_available() {
        warn!("sessions capability missing; closed tabs suppressed");
        return ClosedTabs {
            tabs: Vec::new(),
            error: Some(CLOSED_TABS_UNAVAILABLE.to_string()),
        };
    }

    match host.recently_closed(cfg.closed_tabs_max).await {
        Ok(sessions) => {
            let tabs: Vec<TabRecord> = sessions
                .into_iter()
                .filter_map(|session| session.tab)
                .filter(|tab| !tab.url.trim().is_empty())
                .collect();
            debug!(count = tabs.len(), "fetched recently closed tabs");
            ClosedTabs { tabs, error: None }
        }
        Err(HostError::Unavailable(capability)) => {
            warn!(%capability, "recently closed tabs unavailable");
            ClosedTabs {
                tabs: Vec::new(),
                error: Some(format!("Recently closed tabs are unavailable: {capability}.")),
            }
        }
        Err(error) => {
            warn!(%error, "failed to query recently closed tabs");
            ClosedTabs::default()
        }
    }
}

pub async fn fetch_history<H: BrowserHost>(
    host: &H,
    query: &str,
    cfg: &Config,
) -> Vec<HistoryRecord> {
    let request = HistoryQuery::new(query.trim(), cfg.history_max_results);
    match host.search_history(&request).await {
        Ok(entries) => {
            debug!(count = entries.len(), query = %request.text, "fetched history");
            entries
        }
        Err(error) => {
            warn!(%error, "failed to search history");
            Vec::new()
        }
    }
}

/// Recent bookmarks for a blank query, matching bookmarks otherwise. Folders
/// (entries without a url) are dropped.
pub async fn fetch_bookmarks<H: BrowserHost>(
    host: &H,
    query: &str,
    cfg: &Config,
) -> Vec<BookmarkRecord> {
    let trimmed = query.trim();
    let result = if trimmed.is_empty() {
        host.recent_bookmarks(cfg.recent_bookmarks).await
    } else {
        host.search_bookmarks(trimmed).await
    };

    match result {
        Ok(bookmarks) => {
            let bookmarks: Vec<BookmarkRecord> = bookmarks
                .into_iter()
                .filter(|bookmark| bookmark.url.as_deref().is_some_and(|url| !url.is_empty()))
                .collect();
            debug!(count = bookmarks.len(), "fetched bookmarks");
            bookmarks
        }
        Err(error) => {
            warn!(%error, "failed to read bookmarks");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;

    use super::{fetch_bookmarks, fetch_closed_tabs, fetch_open_tabs, CLOSED_TABS_UNAVAILABLE};
    use crate::config::Config;
    use crate::host::{BrowserHost, HostFixture, HostSource, MockBrowserHost};
    use crate::model::{BookmarkRecord, ClosedSession, TabRecord};

    fn tab(id: i64, last_accessed: Option<i64>) -> TabRecord {
        TabRecord {
            last_accessed,
            ..TabRecord::new(id, &format!("Tab {id}"), &format!("https://t{id}.example"))
        }
    }

    #[test]
    fn open_tabs_sorted_by_recency_with_missing_last() {
        let host = MockBrowserHost::new(HostFixture {
            tabs: vec![tab(1, Some(10)), tab(2, None), tab(3, Some(30))],
            ..HostFixture::default()
        });
        let ids: Vec<_> = block_on(fetch_open_tabs(&host))
            .into_iter()
            .map(|tab| tab.id)
            .collect();
        assert_eq!(ids, vec![Some(3), Some(1), Some(2)]);
    }

    #[test]
    fn failing_source_degrades_to_empty() {
        let host = MockBrowserHost::new(HostFixture {
            tabs: vec![tab(1, Some(1))],
            ..HostFixture::default()
        });
        host.fail_source(HostSource::Tabs);
        assert!(block_on(fetch_open_tabs(&host)).is_empty());
    }

    #[test]
    fn missing_sessions_capability_records_error() {
        let host = MockBrowserHost::new(HostFixture {
            sessions_unavailable: true,
            ..HostFixture::default()
        });
        let closed = block_on(fetch_closed_tabs(&host, &Config::default()));
        assert!(closed.tabs.is_empty());
        assert_eq!(closed.error.as_deref(), Some(CLOSED_TABS_UNAVAILABLE));
    }

    #[test]
    fn unavailable_source_after_capability_check_records_error() {
        let host = MockBrowserHost::new(HostFixture {
            closed: vec![ClosedSession::from_tab(tab(4, Some(1)))],
            ..HostFixture::default()
        });
        host.withdraw_source(HostSource::Sessions);
        assert!(host.sessions_available());

        let closed = block_on(fetch_closed_tabs(&host, &Config::default()));
        assert!(closed.tabs.is_empty());
        assert_eq!(
            closed.error.as_deref(),
            Some("Recently closed tabs are unavailable: Sessions API.")
        );
    }

    #[test]
    fn other_closed_tab_failures_stay_silent() {
        let host = MockBrowserHost::new(HostFixture::default());
        host.fail_source(HostSource::Sessions);
        let closed = block_on(fetch_closed_tabs(&host, &Config::default()));
        assert_eq!(closed, super::ClosedTabs::default());
    }

    #[test]
    fn closed_windows_are_skipped() {
        let host = MockBrowserHost::new(HostFixture {
            closed: vec![
                ClosedSession {
                    window_tab_count: Some(3),
                    ..ClosedSession::default()
                },
                ClosedSession::from_tab(tab(4, Some(1))),
            ],
            ..HostFixture::default()
        });
        let closed = block_on(fetch_closed_tabs(&host, &Config::default()));
        assert_eq!(closed.tabs.len(), 1);
        assert!(closed.error.is_none());
    }

    #[test]
    fn bookmark_folders_are_dropped() {
        let host = MockBrowserHost::new(HostFixture {
            bookmarks: vec![
                BookmarkRecord {
                    id: "f".into(),
                    title: "Folder".into(),
                    ..BookmarkRecord::default()
                },
                BookmarkRecord {
                    id: "b".into(),
                    title: "Rust Book".into(),
                    url: Some("https://doc.rust-lang.org/book/".into()),
                    date_added: Some(5),
                },
            ],
            ..HostFixture::default()
        });
        let cfg = Config::default();
        let recent = block_on(fetch_bookmarks(&host, "", &cfg));
        assert_eq!(recent.len(), 1);
        let matching = block_on(fetch_bookmarks(&host, "folder", &cfg));
        assert!(matching.is_empty());
    }
}
