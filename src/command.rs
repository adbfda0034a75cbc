///
/// @package lxpanel-rs
///
/// @file Control command functions
/// @copyright 2025-present Christoph Kappel <christoph@unexist.dev>
/// @version $Id$
///
/// This program can be distributed under the terms of the GNU GPLv3.
/// See the file LICENSE for details.
///

use std::fmt;
use anyhow::{anyhow, Context, Result};
use itertools::Itertools;
use log::debug;
use strum_macros::FromRepr;
use stdext::function_name;
use x11rb::protocol::xproto::{Atom, ClientMessageEvent, EventMask, Window};
use crate::display::XConn;
use crate::ewmh::{WindowState, ALL_DESKTOPS};

/// Size of the data of a format 8 client message
pub(crate) const MESSAGE_SIZE: usize = 20;

/// Payload bytes after command byte and padding, one byte is kept for NUL
pub(crate) const PAYLOAD_SIZE: usize = MESSAGE_SIZE - 3;

/// Commands understood via `_LXPANEL_CMD`
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, FromRepr)]
pub(crate) enum PanelCommand {
    None = 0,
    SysMenu = 1,
    Run = 2,
    Config = 3,
    Restart = 4,
    Exit = 5,
    Command = 6,
}

impl PanelCommand {
    pub(crate) fn from_name(name: &str) -> Option<Self> {
        match name {
            "menu" => Some(PanelCommand::SysMenu),
            "run" => Some(PanelCommand::Run),
            "config" => Some(PanelCommand::Config),
            "restart" => Some(PanelCommand::Restart),
            "exit" => Some(PanelCommand::Exit),
            "command" => Some(PanelCommand::Command),
            _ => None,
        }
    }

    pub(crate) fn name(self) -> &'static str {
        match self {
            PanelCommand::None => "none",
            PanelCommand::SysMenu => "menu",
            PanelCommand::Run => "run",
            PanelCommand::Config => "config",
            PanelCommand::Restart => "restart",
            PanelCommand::Exit => "exit",
            PanelCommand::Command => "command",
        }
    }
}

/// Built-in actions of [`PanelCommand::Command`]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum PanelAction {
    /// Switch to desktop
    Desktop(u32),
    /// Close via `WM_DELETE_WINDOW`
    Close(Window),
    /// Close via the window manager
    WmClose(Window),
    Raise(Window),
    /// Toggle a single state like shaded or sticky
    Toggle(Window, WindowState),
    /// Move to desktop or [`ALL_DESKTOPS`]
    Move(Window, u32),
}

fn parse_window(value: &str) -> Result<Window> {
    let win = match value.strip_prefix("0x") {
        Some(hex) => Window::from_str_radix(hex, 16),
        None => value.parse::<Window>(),
    };

    win.with_context(|| format!("Invalid window `{}'", value))
}

fn parse_number<T: std::str::FromStr>(value: &str) -> Result<T> {
    value.parse::<T>().map_err(|_| anyhow!("Invalid number `{}'", value))
}

/// Desktop index, `-1` or `all` stand for every desktop
fn parse_desktop(value: &str) -> Result<u32> {
    match value {
        "-1" | "all" => Ok(ALL_DESKTOPS),
        _ => parse_number(value),
    }
}

impl TryFrom<&str> for PanelAction {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let words = value.split_whitespace().collect::<Vec<_>>();

        match words.as_slice() {
            ["desktop", idx] => Ok(PanelAction::Desktop(parse_number(idx)?)),
            ["close", win] => Ok(PanelAction::Close(parse_window(win)?)),
            ["wmclose", win] => Ok(PanelAction::WmClose(parse_window(win)?)),
            ["raise", win] => Ok(PanelAction::Raise(parse_window(win)?)),
            ["shade", win] => Ok(PanelAction::Toggle(parse_window(win)?, WindowState::SHADED)),
            ["stick", win] => Ok(PanelAction::Toggle(parse_window(win)?, WindowState::STICKY)),
            ["move", win, desktop] => Ok(PanelAction::Move(parse_window(win)?, parse_desktop(desktop)?)),
            _ => Err(anyhow!("Unknown action `{}'", value)),
        }
    }
}

/// Content of a `_LXPANEL_CMD` client message
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct ControlMessage {
    pub(crate) command: PanelCommand,
    pub(crate) payload: String,
}

impl ControlMessage {
    /// Parse a command line like `restart` or `command desktop 2`
    ///
    /// Known actions can also be given without the leading `command`.
    ///
    /// # Arguments
    ///
    /// * `line` - Command line
    ///
    /// # Returns
    ///
    /// A [`Result`] with either [`ControlMessage`] on success or otherwise [`anyhow::Error`]
    pub(crate) fn parse(line: &str) -> Result<Self> {
        let mut words = line.split_whitespace();

        let first = words.next()
            .ok_or_else(|| anyhow!("Empty command"))?;

        let msg = match PanelCommand::from_name(first) {
            Some(command) => Self {
                command,
                payload: words.join(" "),
            },
            None => Self {
                command: PanelCommand::Command,
                payload: line.split_whitespace().join(" "),
            },
        };

        if PanelCommand::Command == msg.command {
            msg.action()?;
        }

        if PAYLOAD_SIZE < msg.payload.len() {
            return Err(anyhow!("Command `{}' exceeds {} bytes", msg.payload, PAYLOAD_SIZE));
        }

        Ok(msg)
    }

    pub(crate) fn action(&self) -> Result<PanelAction> {
        PanelAction::try_from(self.payload.as_str())
    }

    /// Pack into the data of a format 8 client message
    pub(crate) fn encode(&self) -> [u8; MESSAGE_SIZE] {
        let mut data = [0u8; MESSAGE_SIZE];

        data[0] = self.command as u8;

        let payload = self.payload.as_bytes();
        let len = payload.len().min(PAYLOAD_SIZE);

        data[2..2 + len].copy_from_slice(&payload[..len]);

        data
    }

    /// Unpack from the data of a format 8 client message
    pub(crate) fn decode(data: &[u8; MESSAGE_SIZE]) -> Option<Self> {
        let command = PanelCommand::from_repr(data[0])?;

        let payload = data[2..].split(|b| 0 == *b)
            .next()
            .map(|bytes| String::from_utf8_lossy(bytes).to_string())
            .unwrap_or_default();

        Some(Self {
            command,
            payload,
        })
    }
}

impl fmt::Display for ControlMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.payload.is_empty() {
            write!(f, "{}", self.command.name())
        } else {
            write!(f, "{} {}", self.command.name(), self.payload)
        }
    }
}

/// Send a command to the running panel
///
/// # Arguments
///
/// * `conn` - Connection to use
/// * `atom` - The `_LXPANEL_CMD` atom
/// * `msg` - Message to send
///
/// # Returns
///
/// A [`Result`] with either [`unit`] on success or otherwise [`anyhow::Error`]
pub(crate) fn send<C: XConn>(conn: &C, atom: Atom, msg: &ControlMessage) -> Result<()> {
    let event = ClientMessageEvent::new(8, conn.root(), atom, msg.encode());

    conn.send_event(conn.root(), EventMask::SUBSTRUCTURE_NOTIFY | EventMask::SUBSTRUCTURE_REDIRECT, event)?;
    conn.flush()?;

    debug!("{}: msg={}", function_name!(), msg);

    Ok(())
}
