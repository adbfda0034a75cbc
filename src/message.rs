///
/// @package lxpanel-rs
///
/// @file Message functions
/// @copyright 2025-present Christoph Kappel <christoph@unexist.dev>
/// @version $Id$
///
/// This program can be distributed under the terms of the GNU GPLv3.
/// See the file LICENSE for details.
///

// Nothing here waits for an answer, the effect of a request becomes visible
// once the window manager updates its properties and the tracker picks it up

use anyhow::{anyhow, Result};
use log::debug;
use stdext::function_name;
use x11rb::CURRENT_TIME;
use x11rb::protocol::xproto::{Atom, EventMask, Timestamp, Window};
use crate::display::XConn;
use crate::ewmh;
use crate::lxpanel::Context;
use crate::tracker::WindowTracker;

/// Source indication for pagers and taskbars
const SOURCE_PAGER: u32 = 2;

/// Action codes of `_NET_WM_STATE` messages
#[repr(u32)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum StateAction {
    Remove = 0,
    Add = 1,
    Toggle = 2,
}

fn root_mask() -> EventMask {
    EventMask::SUBSTRUCTURE_NOTIFY | EventMask::SUBSTRUCTURE_REDIRECT
}

fn send_to_root<C: XConn>(ctx: &Context<C>, win: Window, message_type: Atom, data: [u32; 5]) -> Result<()> {
    ewmh::send_message(&ctx.conn, ctx.root, win, message_type, data, root_mask())
}

/// Ask the window manager to switch to desktop `index`
pub(crate) fn request_desktop_change<C: XConn>(ctx: &Context<C>, index: u32) -> Result<()> {
    debug!("{}: index={}", function_name!(), index);

    send_to_root(ctx, ctx.root, ctx.atoms._NET_CURRENT_DESKTOP, [index, CURRENT_TIME, 0, 0, 0])
}

/// Ask the window to close itself via `WM_DELETE_WINDOW`
pub(crate) fn request_window_close<C: XConn>(ctx: &Context<C>, win: Window) -> Result<()> {
    debug!("{}: win={}", function_name!(), win);

    // See ICCCM 4.2.8.1
    ewmh::send_message(&ctx.conn, win, win, ctx.atoms.WM_PROTOCOLS,
                       [ctx.atoms.WM_DELETE_WINDOW, CURRENT_TIME, 0, 0, 0], EventMask::NO_EVENT)
}

/// Ask the window manager to close the window via `_NET_CLOSE_WINDOW`
pub(crate) fn request_net_close<C: XConn>(ctx: &Context<C>, win: Window) -> Result<()> {
    debug!("{}: win={}", function_name!(), win);

    send_to_root(ctx, win, ctx.atoms._NET_CLOSE_WINDOW, [CURRENT_TIME, SOURCE_PAGER, 0, 0, 0])
}

/// Ask the window manager to add, remove or toggle a `_NET_WM_STATE` atom
///
/// # Arguments
///
/// * `ctx` - Global context
/// * `win` - Client window
/// * `state` - State atom like `_NET_WM_STATE_SHADED`
/// * `action` - Action code
///
/// # Returns
///
/// A [`Result`] with either [`unit`] on success or otherwise [`anyhow::Error`]
pub(crate) fn request_state_change<C: XConn>(ctx: &Context<C>, win: Window, state: Atom,
                                             action: StateAction) -> Result<()>
{
    debug!("{}: win={}, state={}, action={:?}", function_name!(), win, state, action);

    send_to_root(ctx, win, ctx.atoms._NET_WM_STATE, [action as u32, state, 0, SOURCE_PAGER, 0])
}

/// Ask the window manager to activate the window
pub(crate) fn request_activate<C: XConn>(ctx: &Context<C>, win: Window, timestamp: Timestamp) -> Result<()> {
    debug!("{}: win={}, time={}", function_name!(), win, timestamp);

    send_to_root(ctx, win, ctx.atoms._NET_ACTIVE_WINDOW, [SOURCE_PAGER, timestamp, 0, 0, 0])
}

/// Ask the window manager to move the window to `desktop`, [`ewmh::ALL_DESKTOPS`] makes it sticky
pub(crate) fn request_move_to_desktop<C: XConn>(ctx: &Context<C>, win: Window, desktop: u32) -> Result<()> {
    debug!("{}: win={}, desktop={}", function_name!(), win, desktop);

    send_to_root(ctx, win, ctx.atoms._NET_WM_DESKTOP, [desktop, SOURCE_PAGER, 0, 0, 0])
}

/// Bring a tracked window to front, switching desktops first when it lives elsewhere
///
/// # Arguments
///
/// * `ctx` - Global context
/// * `tracker` - Current window manager state
/// * `win` - Client window
/// * `timestamp` - Time of the triggering user action
///
/// # Returns
///
/// A [`Result`] with either [`unit`] on success or otherwise [`anyhow::Error`]
pub(crate) fn request_raise<C: XConn>(ctx: &Context<C>, tracker: &WindowTracker, win: Window,
                                      timestamp: Timestamp) -> Result<()>
{
    let window = tracker.get(win)
        .ok_or_else(|| anyhow!("Unknown window {}", win))?;

    let current = tracker.desktops().current();

    if !window.is_on_desktop(current) {
        request_desktop_change(ctx, window.desktop)?;
    }

    request_activate(ctx, win, timestamp)
}
