///
/// @package lxpanel-rs
///
/// @file Ewmh functions
/// @copyright 2025-present Christoph Kappel <christoph@unexist.dev>
/// @version $Id$
///
/// This program can be distributed under the terms of the GNU GPLv3.
/// See the file LICENSE for details.
///

use anyhow::{Context, Result};
use bitflags::bitflags;
use log::debug;
use stdext::function_name;
use strum_macros::FromRepr;
use x11rb::protocol::xproto::{Atom, ClientMessageEvent, EventMask, Window};
use x11rb::rust_connection::RustConnection;
use crate::display::XConn;

x11rb::atom_manager! {
    pub Atoms: AtomsCookie {
        // ICCCM
        WM_NAME, WM_STATE, WM_PROTOCOLS, WM_DELETE_WINDOW, WM_HINTS,

        // EWMH
        _NET_CLIENT_LIST, _NET_CLIENT_LIST_STACKING, _NET_NUMBER_OF_DESKTOPS,
        _NET_DESKTOP_NAMES, _NET_CURRENT_DESKTOP, _NET_ACTIVE_WINDOW, _NET_WORKAREA,

        // Client
        _NET_CLOSE_WINDOW, _NET_WM_NAME, _NET_WM_VISIBLE_NAME, _NET_WM_DESKTOP,
        _NET_WM_STRUT, _NET_WM_STRUT_PARTIAL,

        // Types
        _NET_WM_WINDOW_TYPE, _NET_WM_WINDOW_TYPE_DESKTOP, _NET_WM_WINDOW_TYPE_DOCK,
        _NET_WM_WINDOW_TYPE_TOOLBAR, _NET_WM_WINDOW_TYPE_MENU, _NET_WM_WINDOW_TYPE_UTILITY,
        _NET_WM_WINDOW_TYPE_SPLASH, _NET_WM_WINDOW_TYPE_DIALOG, _NET_WM_WINDOW_TYPE_NORMAL,

        // States
        _NET_WM_STATE, _NET_WM_STATE_HIDDEN, _NET_WM_STATE_SHADED,
        _NET_WM_STATE_SKIP_TASKBAR, _NET_WM_STATE_SKIP_PAGER, _NET_WM_STATE_STICKY,
        _NET_WM_STATE_DEMANDS_ATTENTION,

        // Tray
        _NET_SYSTEM_TRAY_OPCODE, _NET_SYSTEM_TRAY_MESSAGE_DATA, _NET_SYSTEM_TRAY_ORIENTATION,

        // Misc
        UTF8_STRING, MANAGER, CARDINAL, WINDOW, ATOM, STRING,

        // XEmbed
        _XEMBED, _XEMBED_INFO,

        // lxpanel
        _LXPANEL_CMD,
    }
}

/// Desktop value of windows visible on all desktops
pub(crate) const ALL_DESKTOPS: u32 = 0xFFFF_FFFF;

/// Urgency bit of `WM_HINTS` flags
const WM_HINTS_URGENCY: u32 = 1 << 8;

#[repr(u32)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, FromRepr)]
pub(crate) enum WMState {
    Withdrawn = 0,
    Normal = 1,
    Iconic = 3,
}

bitflags! {
    /// Cached `_NET_WM_STATE` of a window
    #[derive(Default, Debug, Copy, Clone, PartialEq, Eq)]
    pub(crate) struct WindowState: u32 {
        const HIDDEN = 1 << 0;
        const SHADED = 1 << 1;
        const SKIP_TASKBAR = 1 << 2;
        const SKIP_PAGER = 1 << 3;
        const STICKY = 1 << 4;
        const DEMANDS_ATTENTION = 1 << 5;
    }
}

impl WindowState {
    /// Map state atoms to flags, unknown atoms are ignored
    pub(crate) fn from_atoms(atoms: &Atoms, values: &[u32]) -> Self {
        values.iter().fold(Self::empty(), |state, atom| {
            state | Self::from_atom(atoms, *atom).unwrap_or_default()
        })
    }

    pub(crate) fn from_atom(atoms: &Atoms, atom: Atom) -> Option<Self> {
        match atom {
            a if a == atoms._NET_WM_STATE_HIDDEN => Some(Self::HIDDEN),
            a if a == atoms._NET_WM_STATE_SHADED => Some(Self::SHADED),
            a if a == atoms._NET_WM_STATE_SKIP_TASKBAR => Some(Self::SKIP_TASKBAR),
            a if a == atoms._NET_WM_STATE_SKIP_PAGER => Some(Self::SKIP_PAGER),
            a if a == atoms._NET_WM_STATE_STICKY => Some(Self::STICKY),
            a if a == atoms._NET_WM_STATE_DEMANDS_ATTENTION => Some(Self::DEMANDS_ATTENTION),
            _ => None,
        }
    }

    /// Atom of a single flag
    pub(crate) fn to_atom(self, atoms: &Atoms) -> Option<Atom> {
        [
            (Self::HIDDEN, atoms._NET_WM_STATE_HIDDEN),
            (Self::SHADED, atoms._NET_WM_STATE_SHADED),
            (Self::SKIP_TASKBAR, atoms._NET_WM_STATE_SKIP_TASKBAR),
            (Self::SKIP_PAGER, atoms._NET_WM_STATE_SKIP_PAGER),
            (Self::STICKY, atoms._NET_WM_STATE_STICKY),
            (Self::DEMANDS_ATTENTION, atoms._NET_WM_STATE_DEMANDS_ATTENTION),
        ].into_iter()
            .find(|(flag, _)| *flag == self)
            .map(|(_, atom)| atom)
    }
}

#[derive(Default, Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum WindowType {
    Desktop,
    Dock,
    Toolbar,
    Menu,
    Utility,
    Splash,
    Dialog,
    #[default]
    Normal,
}

impl WindowType {
    /// Pick the first known type; the list is ordered by preference
    pub(crate) fn from_atoms(atoms: &Atoms, values: &[u32]) -> Self {
        values.iter()
            .find_map(|atom| match *atom {
                a if a == atoms._NET_WM_WINDOW_TYPE_DESKTOP => Some(Self::Desktop),
                a if a == atoms._NET_WM_WINDOW_TYPE_DOCK => Some(Self::Dock),
                a if a == atoms._NET_WM_WINDOW_TYPE_TOOLBAR => Some(Self::Toolbar),
                a if a == atoms._NET_WM_WINDOW_TYPE_MENU => Some(Self::Menu),
                a if a == atoms._NET_WM_WINDOW_TYPE_UTILITY => Some(Self::Utility),
                a if a == atoms._NET_WM_WINDOW_TYPE_SPLASH => Some(Self::Splash),
                a if a == atoms._NET_WM_WINDOW_TYPE_DIALOG => Some(Self::Dialog),
                a if a == atoms._NET_WM_WINDOW_TYPE_NORMAL => Some(Self::Normal),
                _ => None,
            })
            .unwrap_or_default()
    }
}

/// Check urgency flag of `WM_HINTS`
pub(crate) fn is_urgent_hint(hints: &[u32]) -> bool {
    hints.first().is_some_and(|flags| 0 != flags & WM_HINTS_URGENCY)
}

/// Decode a string property, trailing NULs are dropped
pub(crate) fn parse_string(value: &[u8]) -> String {
    String::from_utf8_lossy(value).trim_end_matches('\0').to_string()
}

/// Decode a list of NUL separated strings like `_NET_DESKTOP_NAMES`
pub(crate) fn parse_string_list(value: &[u8]) -> Vec<String> {
    let mut list: Vec<String> = value.split(|b| 0 == *b)
        .map(|chunk| String::from_utf8_lossy(chunk).to_string())
        .collect();

    // Last entry is usually terminated as well
    if list.last().is_some_and(String::is_empty) {
        list.pop();
    }

    list
}

/// Resolve all atoms in one go
///
/// # Arguments
///
/// * `conn` - Connection to the X server
///
/// # Returns
///
/// A [`Result`] with either [`Atoms`] on success or otherwise [`anyhow::Error`]
pub(crate) fn init(conn: &RustConnection) -> Result<Atoms> {
    let atoms = Atoms::new(conn)
        .context("Failed to intern atoms")?
        .reply()
        .context("Failed to resolve atoms")?;

    debug!("{}", function_name!());

    Ok(atoms)
}

/// Send a 32-bit client message
///
/// # Arguments
///
/// * `conn` - Connection to the X server
/// * `dest` - Window the event is sent to
/// * `win` - Window the message is about
/// * `message_type` - Message type atom
/// * `data` - Message data
/// * `mask` - Event mask for the receivers
///
/// # Returns
///
/// A [`Result`] with either [`unit`] on success or otherwise [`anyhow::Error`]
pub(crate) fn send_message(conn: &impl XConn, dest: Window, win: Window, message_type: Atom,
                           data: [u32; 5], mask: EventMask) -> Result<()>
{
    let event = ClientMessageEvent::new(32, win, message_type, data);

    conn.send_event(dest, mask, event)?;
    conn.flush()?;

    debug!("{}: dest={}, win={}, type={}, data={:?}", function_name!(), dest, win, message_type, data);

    Ok(())
}
