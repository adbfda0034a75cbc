///
/// @package lxpanel-rs
///
/// @file Logger functions
/// @copyright 2025-present Christoph Kappel <christoph@unexist.dev>
/// @version $Id$
///
/// This program can be distributed under the terms of the GNU GPLv3.
/// See the file LICENSE for details.
///

use log::{debug, LevelFilter};
use anyhow::Result;
use stdext::function_name;
use crate::config::Config;

/// Module that traces events and X errors
const EVENT_MODULE: &str = concat!(env!("CARGO_CRATE_NAME"), "::event");

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub(crate) enum LogLevel {
    None,
    Info,
    Warnings,
    Error,
    /// Trace every received event
    Events,
    /// Trace X protocol errors
    XError,
    Debug
}

impl From<&str> for LogLevel {
    fn from(level: &str) -> Self {
        match level.to_lowercase().as_str() {
            "none" => LogLevel::None,
            "warnings" => LogLevel::Warnings,
            "errors" => LogLevel::Error,
            "events" => LogLevel::Events,
            "xerror" => LogLevel::XError,
            "debug" => LogLevel::Debug,
            _ => LogLevel::Info,
        }
    }
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::None => LevelFilter::Off,
            LogLevel::Info | LogLevel::Events | LogLevel::XError => LevelFilter::Info,
            LogLevel::Warnings => LevelFilter::Warn,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Debug => LevelFilter::Debug,
        }
    }
}

/// Set up `env_logger` from `--level` and `--debug`
///
/// # Arguments
///
/// * `config` - Config values read either from args or config file
///
/// # Returns
///
/// A [`Result`] with either [`unit`] on success or otherwise [`anyhow::Error`]
pub(crate) fn init(config: &Config) -> Result<()> {
    let level = if config.debug {
        LogLevel::Debug
    } else {
        LogLevel::from(config.loglevel.as_str())
    };

    let mut builder = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));

    builder.filter_level(LevelFilter::from(level));

    // Event traces are noisy, keep them to the loop
    if matches!(level, LogLevel::Events | LogLevel::XError) {
        builder.filter_module(EVENT_MODULE, LevelFilter::Trace);
    }

    builder.try_init()?;

    debug!("{}: level={:?}", function_name!(), level);

    Ok(())
}
