pub mod action_dispatcher;
pub mod aggregate;
pub mod config;
pub mod domain;
pub mod fetch;
pub mod filter;
pub mod host;
pub mod keyboard;
pub mod logging;
pub mod matcher;
pub mod model;
pub mod popup;
pub mod quick_actions;
pub mod runtime;
