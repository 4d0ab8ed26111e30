use serde::Serialize;
use tracing::info;

use crate::config::Config;
use crate::domain::{is_navigable_url, navigation_url, web_search_url};
use crate::host::{BrowserHost, HostError, TabUpdate};
use crate::model::{TabId, WindowId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "payload", rename_all = "snake_case")]
pub enum Action {
    SwitchToTab {
        tab_id: TabId,
        window_id: Option<WindowId>,
    },
    ReopenUrl(String),
    /// Flips the tab's mute state; `muted` is the state before the flip.
    ToggleMute {
        tab_id: TabId,
        muted: bool,
    },
    CloseTab(TabId),
    WebSearch(String),
    Navigate(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    #[error("nothing to search for")]
    EmptyQuery,
    #[error("'{0}' does not look like an address")]
    NotNavigable(String),
    #[error("custom search template is missing {{query}}")]
    InvalidSearchTemplate,
    #[error(transparent)]
    Host(#[from] HostError),
}

/// What the popup does after the host call went through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ActionOutcome {
    pub close_popup: bool,
    pub refetch_tabs: bool,
}

impl ActionOutcome {
    fn close() -> Self {
        Self {
            close_popup: true,
            refetch_tabs: false,
        }
    }

    fn refetch() -> Self {
        Self {
            close_popup: false,
            refetch_tabs: true,
        }
    }
}

/// Performs the single host call behind `action` and, when the action calls
/// for it, closes the popup.
pub async fn dispatch<H: BrowserHost>(
    host: &H,
    action: &Action,
    cfg: &Config,
) -> Result<ActionOutcome, ActionError> {
    let outcome = match action {
        Action::SwitchToTab { tab_id, window_id } => {
            host.update_tab(*tab_id, TabUpdate::activate()).await?;
            let window = match window_id {
                Some(window) => *window,
                None => host.current_window().await?,
            };
            host.focus_window(window).await?;
            info!(tab_id, window, "switched to tab");
            ActionOutcome::close()
        }
        Action::ReopenUrl(url) => {
            host.create_tab(url).await?;
            info!(%url, "reopened url");
            ActionOutcome::close()
        }
        Action::ToggleMute { tab_id, muted } => {
            host.update_tab(*tab_id, TabUpdate::muted(!muted)).await?;
            info!(tab_id, muted = !muted, "toggled mute");
            ActionOutcome::refetch()
        }
        Action::CloseTab(tab_id) => {
            host.remove_tab(*tab_id).await?;
            info!(tab_id, "closed tab");
            // the host's removal notification drives the refetch
            ActionOutcome::default()
        }
        Action::WebSearch(query) => {
            if query.trim().is_empty() {
                return Err(ActionError::EmptyQuery);
            }
            let url = web_search_url(cfg, query).ok_or(ActionError::InvalidSearchTemplate)?;
            host.create_tab(&url).await?;
            info!(%url, "opened web search");
            ActionOutcome::close()
        }
        Action::Navigate(query) => {
            if !is_navigable_url(query) {
                return Err(ActionError::NotNavigable(query.clone()));
            }
            let url = navigation_url(query);
            host.create_tab(&url).await?;
            info!(%url, "navigated to address");
            ActionOutcome::close()
        }
    };

    if outcome.close_popup {
        host.close_popup();
    }
    Ok(outcome)
}
