use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Browser session APIs never return more than this many closed entries.
pub const MAX_CLOSED_SESSIONS: usize = 25;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid TOML config: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid JSON5 config: {0}")]
    Json5(#[from] json5::Error),
    #[error("{0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchEngine {
    #[default]
    Google,
    Duckduckgo,
    Bing,
    Brave,
    Ecosia,
    Custom,
}

impl SearchEngine {
    pub fn label(self) -> &'static str {
        match self {
            Self::Google => "google",
            Self::Duckduckgo => "duckduckgo",
            Self::Bing => "bing",
            Self::Brave => "brave",
            Self::Ecosia => "ecosia",
            Self::Custom => "web",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatcherKind {
    #[default]
    Skim,
    Subsequence,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub search_engine: SearchEngine,
    pub search_template: String,
    pub history_max_results: usize,
    pub closed_tabs_max: usize,
    pub recent_bookmarks: usize,
    pub matcher: MatcherKind,
    pub debug_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            search_engine: SearchEngine::Google,
            search_template: String::new(),
            history_max_results: 100,
            closed_tabs_max: MAX_CLOSED_SESSIONS,
            recent_bookmarks: 20,
            matcher: MatcherKind::Skim,
            debug_logging: false,
        }
    }
}

pub fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if !(1..=1000).contains(&cfg.history_max_results) {
        return Err(ConfigError::Invalid(
            "history_max_results must be between 1 and 1000".into(),
        ));
    }

    if !(1..=MAX_CLOSED_SESSIONS).contains(&cfg.closed_tabs_max) {
        return Err(ConfigError::Invalid(format!(
            "closed_tabs_max must be between 1 and {MAX_CLOSED_SESSIONS}"
        )));
    }

    if !(1..=100).contains(&cfg.recent_bookmarks) {
        return Err(ConfigError::Invalid(
            "recent_bookmarks must be between 1 and 100".into(),
        ));
    }

    if cfg.search_engine == SearchEngine::Custom && !cfg.search_template.contains("{query}") {
        return Err(ConfigError::Invalid(
            "search_template must contain {query} when search_engine is custom".into(),
        ));
    }

    Ok(())
}

/// Loads a config file, picking the parser from the extension. `None` yields
/// the defaults.
pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
    let Some(path) = path else {
        return Ok(Config::default());
    };

    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let cfg = parse(&raw, path)?;
    validate(&cfg)?;
    Ok(cfg)
}

fn parse(raw: &str, path: &Path) -> Result<Config, ConfigError> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "toml" => Ok(toml::from_str(raw)?),
        "json" | "json5" => Ok(json5::from_str(raw)?),
        other => Err(ConfigError::Invalid(format!(
            "unsupported config extension '{other}'; use .toml, .json or .json5"
        ))),
    }
}
