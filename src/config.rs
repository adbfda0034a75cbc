///
/// @package lxpanel-rs
///
/// @file Config functions
/// @copyright 2025-present Christoph Kappel <christoph@unexist.dev>
/// @version $Id$
///
/// This program can be distributed under the terms of the GNU GPLv3.
/// See the file LICENSE for details.
///

use std::collections::HashMap;
use clap_config_file::ClapConfigFile;
use serde::{Deserialize, Serialize};

/// Value of the `panel` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub(crate) enum MixedConfigVal {
    B(bool),
    I(i32),
    S(String),
}

#[derive(ClapConfigFile)]
#[config_file_name = "lxpanel"]
#[config_file_formats = "yaml,toml,json"]
pub(crate) struct Config {
    /// Connect to DISPLAY
    #[config_arg(short = 'd', default_value = ":0", accept_from = "cli_only")]
    pub(crate) display: String,

    /// Set logging level LEVEL
    #[config_arg(short = 'l', name = "level", default_value = "", accept_from = "cli_only")]
    pub(crate) loglevel: String,

    /// Print debugging messages
    #[config_arg(short = 'D', default_value = false, accept_from = "cli_only")]
    pub(crate) debug: bool,

    /// Send COMMAND to a running panel and exit
    #[config_arg(short = 'x', name = "command", default_value = "", accept_from = "cli_only")]
    pub(crate) command: String,

    /// Placement, size and features like `edge: top` or `tray: false`
    #[config_arg(multi_value_behavior = "extend", accept_from = "config_only")]
    pub(crate) panel: HashMap<String, MixedConfigVal>,
}
