///
/// @package lxpanel-rs
///
/// @file Main functions
/// @copyright 2025-present Christoph Kappel <christoph@unexist.dev>
/// @version $Id$
///
/// This program can be distributed under the terms of the GNU GPLv3.
/// See the file LICENSE for details.
///

mod lxpanel;
mod display;
mod event;
mod ewmh;
mod client;
mod desktop;
mod tracker;
mod message;
mod geometry;
mod strut;
mod panel;
mod tray;
mod balloon;
mod command;
mod rect;
mod logger;
mod config;

#[cfg(test)]
mod tests;

use std::env;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use anyhow::{anyhow, Context as _, Result};
use log::{debug, error, info};
use signal_hook::consts::{SIGINT, SIGTERM};
use crate::command::ControlMessage;
use crate::config::Config;
use crate::geometry::PanelConfig;
use crate::lxpanel::{Context, Flags, LxPanel};

fn install_signal_handler(shutdown: &Arc<AtomicBool>) -> Result<()> {
    for signal in [SIGINT, SIGTERM] {
        signal_hook::flag::register(signal, Arc::clone(shutdown))
            .with_context(|| format!("Failed to install handler for signal {}", signal))?;
    }

    Ok(())
}

fn print_version() {
    info!("{} {} - Copyright (c) 2025-present {}",
        env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"), env!("CARGO_PKG_AUTHORS"));
    info!("Released under the GNU Public License");
    info!("Compiled for X11");
}

/// Hand a command to the running panel
fn send_command(config: &Config) -> Result<()> {
    let msg = ControlMessage::parse(&config.command)?;

    let conn = display::init(config)?;
    let atoms = ewmh::init(conn.connection())?;

    command::send(&conn, atoms._LXPANEL_CMD, &msg)?;

    info!("Sent command `{}'", msg);

    Ok(())
}

fn restart() -> Result<()> {
    let exe = env::current_exe()?;
    let args = env::args().skip(1).collect::<Vec<_>>();

    info!("Restarting {:?}", exe);

    let err = exec::Command::new(&exe).args(&args).exec();

    Err(anyhow!("Failed to restart {:?}: {}", exe, err))
}

fn main() -> Result<()> {
    // Load config
    let (config, path, _format) = Config::parse_info();

    logger::init(&config)?;

    if !config.command.is_empty() {
        return send_command(&config);
    }

    info!("Reading file `{:?}'", path.unwrap_or_default());

    print_version();

    let panel_config = PanelConfig::try_from(&config.panel)?;

    debug!("Panel config: {}", panel_config);

    let conn = display::init(&config)?;
    let atoms = ewmh::init(conn.connection())?;
    let ctx = Context::new(conn, atoms);

    install_signal_handler(&ctx.shutdown)?;

    drop(config);

    let mut lxpanel = LxPanel::new(ctx, panel_config)?;

    // Run event handler
    if let Err(e) = event::handle_requests(&mut lxpanel) {
        error!("Error: {}", e);
    }

    lxpanel.finish()?;

    if lxpanel.flags.contains(Flags::RESTART) {
        drop(lxpanel);

        return restart();
    }

    info!("Exit");

    Ok(())
}
