///
/// @package lxpanel-rs
///
/// @file Tracker functions
/// @copyright 2025-present Christoph Kappel <christoph@unexist.dev>
/// @version $Id$
///
/// This program can be distributed under the terms of the GNU GPLv3.
/// See the file LICENSE for details.
///

use anyhow::Result;
use log::debug;
use stdext::function_name;
use x11rb::NONE;
use x11rb::protocol::xproto::{Atom, EventMask, Window};
use crate::client::ManagedWindow;
use crate::desktop::DesktopSet;
use crate::display::XConn;
use crate::ewmh;
use crate::lxpanel::Context;
use crate::rect::Rect;

/// Part of a window that changed
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum Change {
    Desktop,
    State,
    Type,
    Title,
    Geometry,
}

/// Notifications about changes of the cached state
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum TrackerEvent {
    WindowAdded(Window),
    WindowRemoved(Window),
    WindowChanged(Window, Change),
    CurrentDesktop(u32),
    DesktopCount(u32),
    DesktopNames,
    ActiveWindow(Option<Window>),
    Stacking,
    Workarea,
}

/// Local cache of the state the window manager publishes
#[derive(Default, Debug)]
pub(crate) struct WindowTracker {
    /// Windows in client list order
    windows: Vec<ManagedWindow>,
    /// Tracked windows from bottom to top
    stacking: Vec<Window>,
    desktops: DesktopSet,
    active: Option<Window>,
    /// Work area per desktop
    workarea: Vec<Rect>,
    /// Windows of the panel itself
    own_windows: Vec<Window>,
}

fn client_event_mask() -> EventMask {
    EventMask::PROPERTY_CHANGE | EventMask::STRUCTURE_NOTIFY
}

impl WindowTracker {
    /// Exclude a window of the panel from tracking
    pub(crate) fn add_own_window(&mut self, win: Window) {
        if NONE != win && !self.own_windows.contains(&win) {
            self.own_windows.push(win);
        }
    }

    pub(crate) fn is_own_window(&self, win: Window) -> bool {
        self.own_windows.contains(&win)
    }

    pub(crate) fn windows(&self) -> &[ManagedWindow] {
        &self.windows
    }

    pub(crate) fn get(&self, win: Window) -> Option<&ManagedWindow> {
        self.windows.iter().find(|window| window.win == win)
    }

    pub(crate) fn contains(&self, win: Window) -> bool {
        self.get(win).is_some()
    }

    pub(crate) fn desktops(&self) -> &DesktopSet {
        &self.desktops
    }

    pub(crate) fn active(&self) -> Option<Window> {
        self.active
    }

    pub(crate) fn stacking(&self) -> &[Window] {
        &self.stacking
    }

    pub(crate) fn workarea(&self, desktop: u32) -> Option<&Rect> {
        self.workarea.get(desktop as usize)
    }

    /// Read everything from scratch
    ///
    /// # Arguments
    ///
    /// * `ctx` - Global context
    ///
    /// # Returns
    ///
    /// A [`Result`] with either a [`Vec`] of [`TrackerEvent`] on success or otherwise [`anyhow::Error`]
    pub(crate) fn refresh_all<C: XConn>(&mut self, ctx: &Context<C>) -> Result<Vec<TrackerEvent>> {
        let mut events = self.update_desktop_count(ctx)?;

        events.extend(self.update_current_desktop(ctx)?);
        events.extend(self.update_desktop_names(ctx)?);
        events.extend(self.update_workarea(ctx)?);
        events.extend(self.refresh_client_list(ctx)?);
        events.extend(self.refresh_stacking(ctx)?);
        events.extend(self.update_active_window(ctx)?);

        debug!("{}: nwindows={}, desktops={}", function_name!(), self.windows.len(), self.desktops);

        Ok(events)
    }

    /// Dispatch a property change of the root window
    ///
    /// # Arguments
    ///
    /// * `ctx` - Global context
    /// * `atom` - Changed property
    ///
    /// # Returns
    ///
    /// A [`Result`] with either a [`Vec`] of [`TrackerEvent`] on success or otherwise [`anyhow::Error`]
    pub(crate) fn handle_root_property<C: XConn>(&mut self, ctx: &Context<C>, atom: Atom) -> Result<Vec<TrackerEvent>> {
        let atoms = &ctx.atoms;

        match atom {
            a if a == atoms._NET_CLIENT_LIST => self.refresh_client_list(ctx),
            a if a == atoms._NET_CLIENT_LIST_STACKING => {
                let mut events = self.refresh_client_list(ctx)?;

                events.extend(self.refresh_stacking(ctx)?);

                Ok(events)
            },
            a if a == atoms._NET_CURRENT_DESKTOP => self.update_current_desktop(ctx),
            a if a == atoms._NET_NUMBER_OF_DESKTOPS => self.update_desktop_count(ctx),
            a if a == atoms._NET_DESKTOP_NAMES => self.update_desktop_names(ctx),
            a if a == atoms._NET_ACTIVE_WINDOW => self.update_active_window(ctx),
            a if a == atoms._NET_WORKAREA => self.update_workarea(ctx),
            _ => Ok(Vec::new()),
        }
    }

    /// Sync tracked windows with `_NET_CLIENT_LIST`
    ///
    /// Every listed window is either kept or created, everything else is dropped.
    /// Windows that vanish while being queried are skipped.
    ///
    /// # Arguments
    ///
    /// * `ctx` - Global context
    ///
    /// # Returns
    ///
    /// A [`Result`] with either a [`Vec`] of [`TrackerEvent`] on success or otherwise [`anyhow::Error`]
    pub(crate) fn refresh_client_list<C: XConn>(&mut self, ctx: &Context<C>) -> Result<Vec<TrackerEvent>> {
        let ids = ctx.get_property32(ctx.root, ctx.atoms._NET_CLIENT_LIST, ctx.atoms.WINDOW)?
            .unwrap_or_default();

        let mut events = Vec::new();
        let mut order: Vec<Window> = Vec::with_capacity(ids.len());

        // Mark
        for window in &mut self.windows {
            window.seen = false;
        }

        for win in ids {
            if NONE == win || self.is_own_window(win) || order.contains(&win) {
                continue;
            }

            if let Some(window) = self.windows.iter_mut().find(|window| window.win == win) {
                window.seen = true;
                order.push(win);

                continue;
            }

            match ManagedWindow::new(ctx, win)
                .and_then(|window| ctx.conn.select_input(win, client_event_mask()).map(|()| window))
            {
                Ok(mut window) => {
                    window.seen = true;

                    self.windows.push(window);
                    order.push(win);
                    events.push(TrackerEvent::WindowAdded(win));
                },
                Err(err) => debug!("{}: skipping win={}: {}", function_name!(), win, err),
            }
        }

        // Sweep
        let (mut kept, removed): (Vec<ManagedWindow>, Vec<ManagedWindow>) = self.windows.drain(..)
            .partition(|window| window.seen);

        for window in removed {
            // Might be gone already
            if let Err(err) = ctx.conn.select_input(window.win, EventMask::NO_EVENT) {
                debug!("{}: win={}: {}", function_name!(), window.win, err);
            }

            events.push(TrackerEvent::WindowRemoved(window.win));
        }

        kept.sort_by_key(|window| order.iter().position(|win| *win == window.win));

        self.windows = kept;
        self.forget_stale();

        debug!("{}: nwindows={}, nevents={}", function_name!(), self.windows.len(), events.len());

        Ok(events)
    }

    /// Read stacking order of the tracked windows
    pub(crate) fn refresh_stacking<C: XConn>(&mut self, ctx: &Context<C>) -> Result<Vec<TrackerEvent>> {
        let stacking: Vec<Window> = ctx.get_property32(ctx.root, ctx.atoms._NET_CLIENT_LIST_STACKING,
                                                       ctx.atoms.WINDOW)?
            .unwrap_or_default()
            .into_iter()
            .filter(|win| self.contains(*win))
            .collect();

        if stacking == self.stacking {
            return Ok(Vec::new());
        }

        self.stacking = stacking;

        Ok(vec![TrackerEvent::Stacking])
    }

    /// Read `_NET_CURRENT_DESKTOP`, clamped to the known desktops
    pub(crate) fn update_current_desktop<C: XConn>(&mut self, ctx: &Context<C>) -> Result<Vec<TrackerEvent>> {
        let current = ctx.get_cardinal(ctx.root, ctx.atoms._NET_CURRENT_DESKTOP)?.unwrap_or_default();

        if self.desktops.set_current(current) {
            return Ok(vec![TrackerEvent::CurrentDesktop(self.desktops.current())]);
        }

        Ok(Vec::new())
    }

    pub(crate) fn update_desktop_count<C: XConn>(&mut self, ctx: &Context<C>) -> Result<Vec<TrackerEvent>> {
        let count = ctx.get_cardinal(ctx.root, ctx.atoms._NET_NUMBER_OF_DESKTOPS)?.unwrap_or(1);
        let current = self.desktops.current();

        let mut events = Vec::new();

        if self.desktops.set_count(count) {
            events.push(TrackerEvent::DesktopCount(self.desktops.count()));

            // Current desktop may have been announced before the count grew
            if let Some(announced) = ctx.get_cardinal(ctx.root, ctx.atoms._NET_CURRENT_DESKTOP)? {
                self.desktops.set_current(announced);
            }
        }

        if current != self.desktops.current() {
            events.push(TrackerEvent::CurrentDesktop(self.desktops.current()));
        }

        Ok(events)
    }

    pub(crate) fn update_desktop_names<C: XConn>(&mut self, ctx: &Context<C>) -> Result<Vec<TrackerEvent>> {
        let names = ctx.conn.get_property(ctx.root, ctx.atoms._NET_DESKTOP_NAMES, ctx.atoms.UTF8_STRING)?
            .map(|prop| ewmh::parse_string_list(&prop.value))
            .unwrap_or_default();

        if self.desktops.set_names(names) {
            return Ok(vec![TrackerEvent::DesktopNames]);
        }

        Ok(Vec::new())
    }

    /// Read `_NET_ACTIVE_WINDOW`, own windows never count as active
    pub(crate) fn update_active_window<C: XConn>(&mut self, ctx: &Context<C>) -> Result<Vec<TrackerEvent>> {
        let active = ctx.get_property32(ctx.root, ctx.atoms._NET_ACTIVE_WINDOW, ctx.atoms.WINDOW)?
            .and_then(|values| values.first().copied())
            .filter(|win| NONE != *win);

        // Focus on the panel keeps the last client active
        if active.is_some_and(|win| self.is_own_window(win)) || active == self.active {
            return Ok(Vec::new());
        }

        self.active = active;

        Ok(vec![TrackerEvent::ActiveWindow(active)])
    }

    pub(crate) fn update_workarea<C: XConn>(&mut self, ctx: &Context<C>) -> Result<Vec<TrackerEvent>> {
        let workarea: Vec<Rect> = ctx.get_property32(ctx.root, ctx.atoms._NET_WORKAREA, ctx.atoms.CARDINAL)?
            .unwrap_or_default()
            .chunks_exact(4)
            .map(Rect::from)
            .collect();

        if workarea == self.workarea {
            return Ok(Vec::new());
        }

        self.workarea = workarea;

        Ok(vec![TrackerEvent::Workarea])
    }

    /// Update the single field of a tracked window that belongs to the changed property
    ///
    /// # Arguments
    ///
    /// * `ctx` - Global context
    /// * `win` - Window of the property
    /// * `atom` - Changed property
    ///
    /// # Returns
    ///
    /// A [`Vec`] of [`TrackerEvent`], empty for unknown windows or properties
    pub(crate) fn handle_window_property<C: XConn>(&mut self, ctx: &Context<C>, win: Window, atom: Atom) -> Vec<TrackerEvent> {
        let atoms = &ctx.atoms;

        let Some(window) = self.windows.iter_mut().find(|window| window.win == win) else {
            return Vec::new();
        };

        let (change, result) = match atom {
            a if a == atoms._NET_WM_DESKTOP => (Change::Desktop, window.update_desktop(ctx)),
            a if a == atoms._NET_WM_STATE => (Change::State, window.update_state(ctx)),
            a if a == atoms.WM_STATE => (Change::State, window.update_wm_state(ctx)),
            a if a == atoms.WM_HINTS => (Change::State, window.update_hints(ctx)),
            a if a == atoms._NET_WM_WINDOW_TYPE => (Change::Type, window.update_type(ctx)),
            a if a == atoms._NET_WM_NAME || a == atoms._NET_WM_VISIBLE_NAME || a == atoms.WM_NAME => {
                (Change::Title, window.update_title(ctx))
            },
            _ => return Vec::new(),
        };

        match result {
            Ok(true) => {
                debug!("{}: change={:?}, window={}", function_name!(), change, window);

                vec![TrackerEvent::WindowChanged(win, change)]
            },
            Ok(false) => Vec::new(),
            Err(err) => {
                debug!("{}: win={}: {}", function_name!(), win, err);

                Vec::new()
            },
        }
    }

    pub(crate) fn handle_configure(&mut self, win: Window, geom: Rect) -> Vec<TrackerEvent> {
        let Some(window) = self.windows.iter_mut().find(|window| window.win == win) else {
            return Vec::new();
        };

        if window.update_geometry(geom) {
            vec![TrackerEvent::WindowChanged(win, Change::Geometry)]
        } else {
            Vec::new()
        }
    }

    /// Drop a destroyed window right away instead of waiting for the next client list
    pub(crate) fn handle_destroy(&mut self, win: Window) -> Vec<TrackerEvent> {
        if !self.contains(win) {
            return Vec::new();
        }

        self.windows.retain(|window| window.win != win);
        self.forget_stale();

        vec![TrackerEvent::WindowRemoved(win)]
    }

    fn forget_stale(&mut self) {
        let windows = &self.windows;

        self.stacking.retain(|win| windows.iter().any(|window| window.win == *win));
    }
}
