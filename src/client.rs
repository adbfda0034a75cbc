///
/// @package lxpanel-rs
///
/// @file Client functions
/// @copyright 2025-present Christoph Kappel <christoph@unexist.dev>
/// @version $Id$
///
/// This program can be distributed under the terms of the GNU GPLv3.
/// See the file LICENSE for details.
///

use std::fmt;
use anyhow::Result;
use log::debug;
use stdext::function_name;
use x11rb::protocol::xproto::{AtomEnum, Window};
use crate::display::XConn;
use crate::ewmh;
use crate::ewmh::{WindowState, WindowType, WMState, ALL_DESKTOPS};
use crate::lxpanel::Context;
use crate::rect::Rect;

/// Top-level window managed by the window manager
#[derive(Default, Debug, Clone)]
pub(crate) struct ManagedWindow {
    /// Window owned by the window manager
    pub(crate) win: Window,
    pub(crate) title: String,
    /// Desktop index or [`ALL_DESKTOPS`]
    pub(crate) desktop: u32,
    pub(crate) state: WindowState,
    pub(crate) window_type: WindowType,
    pub(crate) geom: Rect,
    /// `WM_STATE` is iconic
    pub(crate) iconic: bool,
    /// Urgency flag of `WM_HINTS`
    pub(crate) urgent_hint: bool,
    /// Found during the current client list pass
    pub(crate) seen: bool,
}

fn update_field<T: PartialEq>(field: &mut T, value: T) -> bool {
    if *field == value {
        return false;
    }

    *field = value;

    true
}

impl ManagedWindow {
    /// Create a new instance and query all state
    ///
    /// # Arguments
    ///
    /// * `ctx` - Global context
    /// * `win` - Client window
    ///
    /// # Returns
    ///
    /// A [`Result`] with either [`ManagedWindow`] on success or otherwise [`anyhow::Error`]
    pub(crate) fn new<C: XConn>(ctx: &Context<C>, win: Window) -> Result<Self> {
        let mut window = Self {
            win,
            ..Self::default()
        };

        window.geom = ctx.conn.window_geometry(win)?;
        window.update_desktop(ctx)?;
        window.update_state(ctx)?;
        window.update_type(ctx)?;
        window.update_title(ctx)?;
        window.update_wm_state(ctx)?;
        window.update_hints(ctx)?;

        debug!("{}: window={}", function_name!(), window);

        Ok(window)
    }

    pub(crate) fn is_iconified(&self) -> bool {
        self.iconic || self.state.contains(WindowState::HIDDEN)
    }

    pub(crate) fn is_shaded(&self) -> bool {
        self.state.contains(WindowState::SHADED)
    }

    pub(crate) fn is_sticky(&self) -> bool {
        ALL_DESKTOPS == self.desktop || self.state.contains(WindowState::STICKY)
    }

    pub(crate) fn is_urgent(&self) -> bool {
        self.urgent_hint || self.state.contains(WindowState::DEMANDS_ATTENTION)
    }

    pub(crate) fn is_on_desktop(&self, desktop: u32) -> bool {
        self.is_sticky() || self.desktop == desktop
    }

    /// Re-read `_NET_WM_DESKTOP`, unset means first desktop
    pub(crate) fn update_desktop<C: XConn>(&mut self, ctx: &Context<C>) -> Result<bool> {
        let desktop = ctx.get_property32(self.win, ctx.atoms._NET_WM_DESKTOP, ctx.atoms.CARDINAL)?
            .and_then(|values| values.first().copied())
            .unwrap_or_default();

        Ok(update_field(&mut self.desktop, desktop))
    }

    pub(crate) fn update_state<C: XConn>(&mut self, ctx: &Context<C>) -> Result<bool> {
        let state = ctx.get_property32(self.win, ctx.atoms._NET_WM_STATE, ctx.atoms.ATOM)?
            .map(|values| WindowState::from_atoms(&ctx.atoms, &values))
            .unwrap_or_default();

        Ok(update_field(&mut self.state, state))
    }

    pub(crate) fn update_type<C: XConn>(&mut self, ctx: &Context<C>) -> Result<bool> {
        let window_type = ctx.get_property32(self.win, ctx.atoms._NET_WM_WINDOW_TYPE, ctx.atoms.ATOM)?
            .map(|values| WindowType::from_atoms(&ctx.atoms, &values))
            .unwrap_or_default();

        Ok(update_field(&mut self.window_type, window_type))
    }

    /// Re-read title, preferring the visible name over the EWMH and ICCCM ones
    pub(crate) fn update_title<C: XConn>(&mut self, ctx: &Context<C>) -> Result<bool> {
        let candidates = [
            (ctx.atoms._NET_WM_VISIBLE_NAME, ctx.atoms.UTF8_STRING),
            (ctx.atoms._NET_WM_NAME, ctx.atoms.UTF8_STRING),
            (ctx.atoms.WM_NAME, AtomEnum::ANY.into()),
        ];

        let mut title = String::new();

        for (prop, type_) in candidates {
            if let Some(value) = ctx.get_string(self.win, prop, type_)?.filter(|value| !value.is_empty()) {
                title = value;

                break;
            }
        }

        Ok(update_field(&mut self.title, title))
    }

    pub(crate) fn update_wm_state<C: XConn>(&mut self, ctx: &Context<C>) -> Result<bool> {
        let iconic = ctx.get_property32(self.win, ctx.atoms.WM_STATE, ctx.atoms.WM_STATE)?
            .and_then(|values| values.first().copied())
            .and_then(WMState::from_repr)
            .is_some_and(|state| WMState::Iconic == state);

        Ok(update_field(&mut self.iconic, iconic))
    }

    pub(crate) fn update_hints<C: XConn>(&mut self, ctx: &Context<C>) -> Result<bool> {
        let urgent = ctx.get_property32(self.win, ctx.atoms.WM_HINTS, ctx.atoms.WM_HINTS)?
            .is_some_and(|values| ewmh::is_urgent_hint(&values));

        Ok(update_field(&mut self.urgent_hint, urgent))
    }

    pub(crate) fn update_geometry(&mut self, geom: Rect) -> bool {
        update_field(&mut self.geom, geom)
    }
}

impl fmt::Display for ManagedWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "win={}, title={}, desktop={}, state={:?}, type={:?}, geom={}",
               self.win, self.title, self.desktop, self.state, self.window_type, self.geom)
    }
}

impl PartialEq for ManagedWindow {
    fn eq(&self, other: &Self) -> bool {
        self.win == other.win
    }
}
