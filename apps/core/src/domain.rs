use std::sync::OnceLock;

use regex::Regex;
use url::Url;

use crate::config::{Config, SearchEngine};

static URL_SHAPE: OnceLock<Option<Regex>> = OnceLock::new();

fn url_shape() -> Option<&'static Regex> {
    URL_SHAPE
        .get_or_init(|| {
            Regex::new(
                r"^(?:[A-Za-z][A-Za-z0-9+.\-]*://)?(?:[A-Za-z0-9](?:[A-Za-z0-9\-]*[A-Za-z0-9])?\.)+[A-Za-z]{2,63}(?::\d{1,5})?(?:[/?#]\S*)?$",
            )
            .ok()
        })
        .as_ref()
}

/// Hostname shown next to an item. Unparseable input comes back unchanged and
/// non-http schemes show their scheme prefix (`chrome://`, `about:`).
pub fn extract_domain(raw: &str) -> String {
    let Ok(parsed) = Url::parse(raw) else {
        return raw.to_string();
    };

    match parsed.scheme() {
        "http" | "https" => parsed
            .host_str()
            .map(str::to_string)
            .unwrap_or_else(|| raw.to_string()),
        scheme => {
            let authority_prefix = format!("{scheme}://");
            if raw
                .trim_start()
                .to_ascii_lowercase()
                .starts_with(&authority_prefix)
            {
                format!("{scheme}://")
            } else {
                format!("{scheme}:")
            }
        }
    }
}

/// Heuristic check for `scheme?://host.tld/path`. Whitespace or a missing
/// TLD-looking suffix means the query is treated as search text.
pub fn is_navigable_url(query: &str) -> bool {
    let trimmed = query.trim();
    if trimmed.is_empty() || trimmed.chars().any(char::is_whitespace) {
        return false;
    }
    url_shape().is_some_and(|re| re.is_match(trimmed))
}

pub fn navigation_url(query: &str) -> String {
    let trimmed = query.trim();
    if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    }
}

pub fn web_search_url(cfg: &Config, query: &str) -> Option<String> {
    let encoded = urlencoding::encode(query.trim());
    let url = match cfg.search_engine {
        SearchEngine::Google => format!("https://www.google.com/search?q={encoded}"),
        SearchEngine::Duckduckgo => format!("https://duckduckgo.com/?q={encoded}"),
        SearchEngine::Bing => format!("https://www.bing.com/search?q={encoded}"),
        SearchEngine::Brave => format!("https://search.brave.com/search?q={encoded}"),
        SearchEngine::Ecosia => format!("https://www.ecosia.org/search?q={encoded}"),
        SearchEngine::Custom => {
            let template = cfg.search_template.trim();
            if !template.contains("{query}") {
                return None;
            }
            template.replace("{query}", &encoded)
        }
    };
    Some(url)
}

#[cfg(test)]
mod tests {
    use super::{extract_domain, is_navigable_url, navigation_url, web_search_url};
    use crate::config::{Config, SearchEngine};

    #[test]
    fn extracts_hostname_for_web_urls() {
        assert_eq!(
            extract_domain("https://docs.rs/regex/latest/regex/"),
            "docs.rs"
        );
        assert_eq!(extract_domain("http://localhost:8080/x"), "localhost");
    }

    #[test]
    fn unparseable_urls_come_back_unchanged() {
        for raw in ["", "not a url", "example.com/path", "://missing-scheme"] {
            assert_eq!(extract_domain(raw), raw);
        }
    }

    #[test]
    fn other_schemes_show_prefix() {
        assert_eq!(extract_domain("chrome://extensions/"), "chrome://");
        assert_eq!(extract_domain("about:blank"), "about:");
    }

    #[test]
    fn url_shape_heuristic() {
        assert!(is_navigable_url("https://example.com"));
        assert!(is_navigable_url("example.com/path?q=1"));
        assert!(is_navigable_url("sub.example.co.uk:8443/"));
        assert!(!is_navigable_url("test"));
        assert!(!is_navigable_url("rust async book"));
        assert!(!is_navigable_url("example.c"));
        assert!(!is_navigable_url("https://example.com and more"));
    }

    #[test]
    fn navigation_adds_https_when_scheme_missing() {
        assert_eq!(navigation_url("example.com"), "https://example.com");
        assert_eq!(navigation_url("http://example.com"), "http://example.com");
    }

    #[test]
    fn google_search_url_is_percent_encoded() {
        let cfg = Config::default();
        assert_eq!(
            web_search_url(&cfg, "https://example.com").as_deref(),
            Some("https://www.google.com/search?q=https%3A%2F%2Fexample.com")
        );
    }

    #[test]
    fn custom_template_substitutes_query() {
        let cfg = Config {
            search_engine: SearchEngine::Custom,
            search_template: "https://search.example/?term={query}".into(),
            ..Default::default()
        };
        assert_eq!(
            web_search_url(&cfg, "a b").as_deref(),
            Some("https://search.example/?term=a%20b")
        );
    }
}
