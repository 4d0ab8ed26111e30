use crate::action_dispatcher::Action;
use crate::aggregate::ResultItem;
use crate::config::Config;
use crate::domain::{is_navigable_url, navigation_url};

pub const ACTION_WEB_SEARCH_ID: &str = "action:web-search";
pub const ACTION_NAVIGATE_ID: &str = "action:navigate";

/// Actions offered for the raw query text. Empty for a blank query; the
/// navigate entry only appears when the query looks like an address.
pub fn quick_actions(query: &str, cfg: &Config) -> Vec<ResultItem> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }

    let mut out = vec![ResultItem::action(
        ACTION_WEB_SEARCH_ID,
        &format!("Search {}", cfg.search_engine.label()),
        trimmed,
        Action::WebSearch(trimmed.to_string()),
    )];

    if is_navigable_url(trimmed) {
        let target = navigation_url(trimmed);
        out.push(ResultItem::action(
            ACTION_NAVIGATE_ID,
            "Navigate to",
            &target,
            Action::Navigate(trimmed.to_string()),
        ));
    }

    out
}
