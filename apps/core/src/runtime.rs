use std::path::PathBuf;

use futures::executor::block_on;
use serde::Serialize;
use tracing::info;

use crate::aggregate::ResultView;
use crate::config::{self, Config, ConfigError};
use crate::filter::FilterState;
use crate::host::{HostCall, MockBrowserHost};
use crate::keyboard::{parse_chord, KeyChord};
use crate::matcher::matcher_for;
use crate::model::TabId;
use crate::popup::SearchTabsPopup;

pub const USAGE: &str = "usage: searchtabs-core --fixture <state.json> [--config <file>] \
[--query <text>] [--key <chord>] [--select <item-id>] [--mute <tab-id>] [--close <tab-id>] \
[--scroll <offset>] [--debug]";

#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to read fixture {path}: {source}")]
    Fixture {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("fixture or report JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// One popup interaction, replayed in command-line order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Query(String),
    Key(KeyChord),
    Select(String),
    Mute(TabId),
    Close(TabId),
    Scroll(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeOptions {
    pub fixture: PathBuf,
    pub config: Option<PathBuf>,
    pub debug: bool,
    pub steps: Vec<Step>,
}

pub fn parse_cli_args(args: &[String]) -> Result<RuntimeOptions, String> {
    let mut fixture = None;
    let mut config = None;
    let mut debug = false;
    let mut steps = Vec::new();

    let mut iter = args.iter();
    while let Some(flag) = iter.next() {
        if flag == "--debug" {
            debug = true;
            continue;
        }

        let value = iter
            .next()
            .ok_or_else(|| format!("missing value for {flag}"))?;
        match flag.as_str() {
            "--fixture" => fixture = Some(PathBuf::from(value)),
            "--config" => config = Some(PathBuf::from(value)),
            "--query" => steps.push(Step::Query(value.clone())),
            "--key" => steps.push(Step::Key(parse_chord(value)?)),
            "--select" => steps.push(Step::Select(value.clone())),
            "--mute" => steps.push(Step::Mute(parse_number(flag, value)?)),
            "--close" => steps.push(Step::Close(parse_number(flag, value)?)),
            "--scroll" => steps.push(Step::Scroll(parse_number(flag, value)?)),
            _ => return Err(format!("unknown argument: {flag}")),
        }
    }

    Ok(RuntimeOptions {
        fixture: fixture.ok_or_else(|| "--fixture is required".to_string())?,
        config,
        debug,
        steps,
    })
}

fn parse_number<T: std::str::FromStr>(flag: &str, value: &str) -> Result<T, String> {
    value
        .parse()
        .map_err(|_| format!("{flag} expects a number, got '{value}'"))
}

/// State of the popup after all steps ran.
#[derive(Debug, Clone, Serialize)]
pub struct SessionReport {
    pub query: String,
    pub filter: FilterState,
    pub scroll_top: usize,
    pub submenu_open: bool,
    pub view: ResultView,
    pub calls: Vec<HostCall>,
    pub popup_closed: bool,
    pub closed_tabs_error: Option<String>,
    pub last_action_error: Option<String>,
}

pub fn run_with_options(options: RuntimeOptions) -> Result<(), RuntimeError> {
    let cfg = config::load(options.config.as_deref())?;
    crate::logging::init(options.debug || cfg.debug_logging);

    let payload = std::fs::read_to_string(&options.fixture).map_err(|source| {
        RuntimeError::Fixture {
            path: options.fixture.clone(),
            source,
        }
    })?;
    let host = MockBrowserHost::from_json(&payload)?;
    info!(fixture = %options.fixture.display(), steps = options.steps.len(), "replaying session");

    let report = run_session(host, cfg, &options.steps);
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

/// Opens a popup over `host`, replays `steps` and reports the end state.
/// Steps after the popup closed are skipped.
pub fn run_session(host: MockBrowserHost, cfg: Config, steps: &[Step]) -> SessionReport {
    let matcher = matcher_for(cfg.matcher);
    let mut popup = SearchTabsPopup::new(host, matcher, cfg);

    block_on(async {
        popup.mount().await;
        for step in steps {
            if popup.host().popup_closed() {
                break;
            }
            match step {
                Step::Query(query) => popup.set_query(query).await,
                Step::Key(chord) => {
                    popup.handle_key(chord).await;
                }
                Step::Select(item_id) => {
                    popup.select(item_id).await;
                }
                Step::Mute(tab_id) => {
                    popup.toggle_mute(*tab_id).await;
                }
                Step::Close(tab_id) => {
                    popup.close_tab(*tab_id).await;
                }
                Step::Scroll(offset) => popup.scroll_to(*offset),
            }
            popup.process_tab_changes().await;
        }
    });

    SessionReport {
        query: popup.query().to_string(),
        filter: *popup.filter(),
        scroll_top: popup.keyboard().scroll_top(),
        submenu_open: popup.keyboard().submenu_open(),
        view: popup.view(),
        calls: popup.host().calls(),
        popup_closed: popup.host().popup_closed(),
        closed_tabs_error: popup.closed_tabs_error().map(str::to_string),
        last_action_error: popup.last_action_error().map(str::to_string),
    }
}
