///
/// @package lxpanel-rs
///
/// @file Tray functions
/// @copyright (c) 2025-present Christoph Kappel <christoph@unexist.dev>
/// @version $Id$
///
/// This program can be distributed under the terms of the GNU GPLv3.
/// See the file LICENSE for details.
///

use std::fmt;
use std::time::Instant;
use anyhow::Result;
use bitflags::bitflags;
use easy_min_max::{max, min};
use log::{debug, info, warn};
use stdext::function_name;
use strum_macros::FromRepr;
use x11rb::{CURRENT_TIME, NONE};
use x11rb::protocol::xproto::{Atom, AtomEnum, ClientMessageEvent, EventMask, Window};
use crate::balloon::{BalloonMessage, BalloonQueue};
use crate::display::XConn;
use crate::ewmh;
use crate::lxpanel::Context;
use crate::rect::Rect;

bitflags! {
    /// State-flags for [`TrayIcon`]
    #[derive(Default, Debug, Copy, Clone, PartialEq)]
    pub(crate) struct TrayFlags: u32 {
        /// Ignore next unmap
        const UNMAP = 1 << 0;
        /// Client wants to be visible
        const MAPPED = 1 << 1;
    }
}

/// Opcodes of `_NET_SYSTEM_TRAY_OPCODE` messages
#[repr(u32)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, FromRepr)]
pub(crate) enum TrayOpcode {
    RequestDock = 0,
    BeginMessage = 1,
    CancelMessage = 2,
}

#[repr(u32)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum XEmbed {
    /// Start embedding
    EmbeddedNotify = 0,
    /// Tray has focus
    WindowActivate = 1,
    /// Tray has no focus
    WindowDeactivate = 2,
}

#[repr(u32)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum TrayOrientation {
    Horizontal = 0,
    Vertical = 1,
}

impl TrayOrientation {
    /// Icons run along the longer side of the area
    pub(crate) fn from_area(area: &Rect) -> Self {
        if area.width >= area.height {
            Self::Horizontal
        } else {
            Self::Vertical
        }
    }
}

/// Client is mapped
const XEMBED_MAPPED: u32 = 1 << 0;

/// Highest protocol version we speak
const XEMBED_VERSION: u32 = 0;

/// Foreign window embedded into the tray
#[derive(Default, Debug)]
pub(crate) struct TrayIcon {
    pub(crate) flags: TrayFlags,
    /// Window owned by the client application
    pub(crate) win: Window,
    /// Layout slot, stable while the icon lives
    pub(crate) slot: usize,
    /// Negotiated XEmbed version
    pub(crate) version: u32,
}

impl fmt::Display for TrayIcon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "win={}, slot={}, version={}, flags={:?}", self.win, self.slot, self.version, self.flags)
    }
}

impl PartialEq for TrayIcon {
    fn eq(&self, other: &Self) -> bool {
        self.win == other.win
    }
}

/// Read `_XEMBED_INFO` of a client
///
/// # Returns
///
/// A [`Result`] with either version and mapped flag or [`None`] when unset, or otherwise [`anyhow::Error`]
fn read_xembed_info<C: XConn>(ctx: &Context<C>, win: Window) -> Result<Option<(u32, bool)>> {
    let info = ctx.get_property32(win, ctx.atoms._XEMBED_INFO, AtomEnum::ANY.into())?;

    Ok(info.filter(|values| 2 <= values.len())
        .map(|values| (values[0], 0 != values[1] & XEMBED_MAPPED)))
}

/// System tray manager of one screen
#[derive(Debug)]
pub(crate) struct TrayManager {
    /// `_NET_SYSTEM_TRAY_S<n>`
    pub(crate) selection: Atom,
    /// Selection owner
    pub(crate) manager_win: Window,
    /// Parent of all icons
    pub(crate) container: Window,
    /// Icons sorted by window
    icons: Vec<TrayIcon>,
    balloons: BalloonQueue,
    icon_size: u16,
    orientation: TrayOrientation,
    /// Size of the area the container is placed in
    area: Rect,
    active: bool,
}

impl TrayManager {
    /// Create a new instance and try to become the tray of the screen
    ///
    /// Another running tray is no error, the instance just stays inactive.
    ///
    /// # Arguments
    ///
    /// * `ctx` - Global context
    /// * `parent` - Window hosting the icons
    /// * `area` - Geometry of the parent
    /// * `icon_size` - Edge length of icons
    /// * `background` - Background pixel of the container
    ///
    /// # Returns
    ///
    /// A [`Result`] with either [`TrayManager`] on success or otherwise [`anyhow::Error`]
    pub(crate) fn new<C: XConn>(ctx: &Context<C>, parent: Window, area: Rect, icon_size: u16,
                                background: u32) -> Result<Self>
    {
        let selection = ctx.conn.intern_atom(&format!("_NET_SYSTEM_TRAY_S{}", ctx.screen_num))?;

        let orientation = TrayOrientation::from_area(&area);

        let mut tray = Self {
            selection,
            manager_win: NONE,
            container: NONE,
            icons: Vec::new(),
            balloons: BalloonQueue::default(),
            icon_size: max!(1, icon_size),
            orientation,
            area,
            active: false,
        };

        let owner = ctx.conn.selection_owner(selection)?;

        if NONE != owner {
            warn!("Another system tray is running on screen {} (owner={}), tray disabled", ctx.screen_num, owner);

            return Ok(tray);
        }

        tray.manager_win = ctx.conn.create_window(ctx.root, &Rect::from((-1, -1, 1, 1)), 0, true,
                                                  EventMask::PROPERTY_CHANGE | EventMask::STRUCTURE_NOTIFY)?;

        ctx.conn.change_property32(tray.manager_win, ctx.atoms._NET_SYSTEM_TRAY_ORIENTATION,
                                   ctx.atoms.CARDINAL, &[orientation as u32])?;
        ctx.conn.set_selection_owner(tray.manager_win, selection, CURRENT_TIME)?;

        // Someone else might have been faster
        if ctx.conn.selection_owner(selection)? != tray.manager_win {
            warn!("Failed to claim system tray selection on screen {}, tray disabled", ctx.screen_num);

            ctx.conn.destroy_window(tray.manager_win)?;
            tray.manager_win = NONE;

            return Ok(tray);
        }

        tray.container = ctx.conn.create_window(parent, &tray.container_geometry(), background,
                                                false, EventMask::NO_EVENT)?;
        ctx.conn.map_window(tray.container)?;

        // Announce new manager
        ewmh::send_message(&ctx.conn, ctx.root, ctx.root, ctx.atoms.MANAGER,
                           [CURRENT_TIME, selection, tray.manager_win, 0, 0], EventMask::STRUCTURE_NOTIFY)?;

        tray.active = true;

        info!("Claimed system tray on screen {}", ctx.screen_num);
        debug!("{}: tray={}", function_name!(), tray);

        Ok(tray)
    }

    pub(crate) fn is_active(&self) -> bool {
        self.active
    }

    #[cfg(test)]
    pub(crate) fn icons(&self) -> &[TrayIcon] {
        &self.icons
    }

    pub(crate) fn get(&self, win: Window) -> Option<&TrayIcon> {
        self.icons.iter().find(|icon| icon.win == win)
    }

    pub(crate) fn contains(&self, win: Window) -> bool {
        self.get(win).is_some()
    }

    #[cfg(test)]
    pub(crate) fn balloons(&self) -> &BalloonQueue {
        &self.balloons
    }

    /// Time the balloon on display expires
    pub(crate) fn next_deadline(&self) -> Option<Instant> {
        self.balloons.next_deadline()
    }

    /// Dispatch tray protocol messages
    ///
    /// # Arguments
    ///
    /// * `ctx` - Global context
    /// * `event` - Received client message
    ///
    /// # Returns
    ///
    /// Either `true` when the message belonged to the tray or otherwise `false`
    pub(crate) fn handle_client_message<C: XConn>(&mut self, ctx: &Context<C>, event: &ClientMessageEvent) -> bool {
        if !self.active {
            return false;
        }

        if ctx.atoms._NET_SYSTEM_TRAY_OPCODE == event.type_ {
            let data = event.data.as_data32();

            match TrayOpcode::from_repr(data[1]) {
                Some(TrayOpcode::RequestDock) if event.window == self.manager_win => self.dock(ctx, data[2]),
                Some(TrayOpcode::BeginMessage) => {
                    self.begin_message(BalloonMessage::new(event.window, data[2], data[3], data[4]));
                },
                Some(TrayOpcode::CancelMessage) => self.cancel_message(event.window, data[2]),
                _ => debug!("{}: ignoring opcode={}, win={}", function_name!(), data[1], event.window),
            }

            return true;
        }

        if ctx.atoms._NET_SYSTEM_TRAY_MESSAGE_DATA == event.type_ {
            let docked = self.contains(event.window);

            if self.balloons.append(event.window, &event.data.as_data8(), docked, Instant::now()) {
                self.show_balloon();
            }

            return true;
        }

        false
    }

    /// Embed a foreign window
    ///
    /// Failures are logged, the request is dropped then.
    pub(crate) fn dock<C: XConn>(&mut self, ctx: &Context<C>, win: Window) {
        if NONE == win || self.contains(win) {
            debug!("{}: ignoring dock request for win={}", function_name!(), win);

            return;
        }

        match self.embed(ctx, win) {
            Ok(icon) => {
                info!("Docked tray icon ({})", icon);

                let idx = self.icons.partition_point(|other| other.win < win);

                self.icons.insert(idx, icon);
                self.arrange_logged(ctx);
            },
            Err(err) => warn!("Failed to dock tray icon win={}: {}", win, err),
        }
    }

    fn embed<C: XConn>(&self, ctx: &Context<C>, win: Window) -> Result<TrayIcon> {
        let (version, mapped) = match read_xembed_info(ctx, win)? {
            Some((version, mapped)) => (min!(version, XEMBED_VERSION), mapped),
            None => {
                debug!("{}: win={} has no _XEMBED_INFO", function_name!(), win);

                (XEMBED_VERSION, true)
            },
        };

        let mut icon = TrayIcon {
            win,
            slot: self.free_slot(),
            version,
            ..TrayIcon::default()
        };

        // Reparenting a mapped window unmaps it
        if ctx.conn.is_mapped(win)? {
            icon.flags.insert(TrayFlags::UNMAP);
        }

        ctx.conn.add_to_save_set(win)?;
        ctx.conn.select_input(win, EventMask::STRUCTURE_NOTIFY | EventMask::PROPERTY_CHANGE)?;

        let geom = self.slot_geometry(icon.slot);

        ctx.conn.reparent_window(win, self.container, geom.x, geom.y)?;
        ctx.conn.configure_window(win, &geom)?;

        // Start embedding life cycle
        ewmh::send_message(&ctx.conn, win, win, ctx.atoms._XEMBED,
                           [CURRENT_TIME, XEmbed::EmbeddedNotify as u32, 0, self.container, version],
                           EventMask::NO_EVENT)?;

        if mapped {
            icon.flags.insert(TrayFlags::MAPPED);

            ctx.conn.map_window(win)?;

            ewmh::send_message(&ctx.conn, win, win, ctx.atoms._XEMBED,
                               [CURRENT_TIME, XEmbed::WindowActivate as u32, 0, 0, 0], EventMask::NO_EVENT)?;
        }

        Ok(icon)
    }

    /// Forget an icon and its balloons
    fn remove(&mut self, win: Window) -> Option<TrayIcon> {
        let idx = self.icons.iter().position(|icon| icon.win == win)?;
        let icon = self.icons.remove(idx);

        if self.balloons.remove_window(win, Instant::now()) {
            self.show_balloon();
        }

        info!("Removed tray icon ({})", icon);

        Some(icon)
    }

    /// Hand the icon back to the root window
    fn release<C: XConn>(ctx: &Context<C>, icon: &TrayIcon) -> Result<()> {
        ctx.conn.select_input(icon.win, EventMask::NO_EVENT)?;
        ctx.conn.unmap_window(icon.win)?;
        ctx.conn.reparent_window(icon.win, ctx.root, 0, 0)?;
        ctx.conn.map_window(icon.win)?;

        debug!("{}: icon={}", function_name!(), icon);

        Ok(())
    }

    /// Move a withdrawn icon out of the container and leave it unmapped
    fn drop_withdrawn<C: XConn>(ctx: &Context<C>, icon: &TrayIcon) -> Result<()> {
        ctx.conn.select_input(icon.win, EventMask::NO_EVENT)?;
        ctx.conn.reparent_window(icon.win, ctx.root, 0, 0)?;

        debug!("{}: icon={}", function_name!(), icon);

        Ok(())
    }

    pub(crate) fn handle_destroy<C: XConn>(&mut self, ctx: &Context<C>, win: Window) -> bool {
        if self.remove(win).is_none() {
            return false;
        }

        self.arrange_logged(ctx);

        true
    }

    /// Client unmapped itself or we did
    pub(crate) fn handle_unmap<C: XConn>(&mut self, ctx: &Context<C>, win: Window) -> bool {
        let Some(icon) = self.icons.iter_mut().find(|icon| icon.win == win) else {
            return false;
        };

        if icon.flags.contains(TrayFlags::UNMAP) {
            icon.flags.remove(TrayFlags::UNMAP);

            return true;
        }

        if let Some(icon) = self.remove(win) {
            // Window is probably alive still
            if let Err(err) = Self::drop_withdrawn(ctx, &icon) {
                debug!("{}: win={}: {}", function_name!(), win, err);
            }
        }

        self.arrange_logged(ctx);

        true
    }

    /// Client was moved somewhere else
    pub(crate) fn handle_reparent<C: XConn>(&mut self, ctx: &Context<C>, win: Window, parent: Window) -> bool {
        if parent == self.container || self.remove(win).is_none() {
            return false;
        }

        if let Err(err) = ctx.conn.select_input(win, EventMask::NO_EVENT) {
            debug!("{}: win={}: {}", function_name!(), win, err);
        }

        self.arrange_logged(ctx);

        true
    }

    /// Follow mapped flag of `_XEMBED_INFO`
    pub(crate) fn handle_property<C: XConn>(&mut self, ctx: &Context<C>, win: Window, atom: Atom) -> Result<bool> {
        if ctx.atoms._XEMBED_INFO != atom || !self.contains(win) {
            return Ok(false);
        }

        let mapped = read_xembed_info(ctx, win)?.is_none_or(|(_, mapped)| mapped);

        let Some(icon) = self.icons.iter_mut().find(|icon| icon.win == win) else {
            return Ok(false);
        };

        if mapped == icon.flags.contains(TrayFlags::MAPPED) {
            return Ok(true);
        }

        icon.flags.set(TrayFlags::MAPPED, mapped);

        let opcode = if mapped {
            ctx.conn.map_window(win)?;

            XEmbed::WindowActivate
        } else {
            icon.flags.insert(TrayFlags::UNMAP);

            ctx.conn.unmap_window(win)?;

            XEmbed::WindowDeactivate
        };

        ewmh::send_message(&ctx.conn, win, win, ctx.atoms._XEMBED,
                           [CURRENT_TIME, opcode as u32, 0, 0, 0], EventMask::NO_EVENT)?;

        debug!("{}: icon={}", function_name!(), icon);

        Ok(true)
    }

    /// Somebody else took the selection
    pub(crate) fn handle_selection_clear<C: XConn>(&mut self, ctx: &Context<C>, selection: Atom) -> bool {
        if !self.active || selection != self.selection {
            return false;
        }

        warn!("Lost system tray selection on screen {}", ctx.screen_num);

        self.unmanage(ctx);

        true
    }

    fn begin_message(&mut self, msg: BalloonMessage) {
        if !self.contains(msg.win) {
            return;
        }

        if self.balloons.begin(msg, Instant::now()) {
            self.show_balloon();
        }

        debug!("{}: npending={}, nqueued={}", function_name!(), self.balloons.pending(), self.balloons.len());
    }

    fn cancel_message(&mut self, win: Window, id: u32) {
        if self.balloons.cancel(win, id, Instant::now()) {
            self.show_balloon();
        }
    }

    /// Advance balloons whose time is up
    pub(crate) fn expire(&mut self, now: Instant) {
        if self.balloons.expire(now) {
            self.show_balloon();
        }
    }

    fn show_balloon(&self) {
        if let Some(msg) = self.balloons.current() {
            info!("Balloon message from tray icon {} ({} waiting): {}", msg.win,
                  self.balloons.len() - 1, msg.text());
        }
    }

    /// Smallest slot no icon uses
    fn free_slot(&self) -> usize {
        (0..).find(|slot| !self.icons.iter().any(|icon| icon.slot == *slot))
            .unwrap_or_default()
    }

    fn slot_geometry(&self, slot: usize) -> Rect {
        let offset = (slot * usize::from(self.icon_size)) as i16;

        match self.orientation {
            TrayOrientation::Horizontal => Rect::from((offset, 0, self.icon_size, self.icon_size)),
            TrayOrientation::Vertical => Rect::from((0, offset, self.icon_size, self.icon_size)),
        }
    }

    /// Container at the far end of the parent, sized to fit all slots
    fn container_geometry(&self) -> Rect {
        let slots = self.icons.iter().map(|icon| icon.slot + 1).max().unwrap_or_default();
        let length = (slots * usize::from(self.icon_size)) as u16;

        match self.orientation {
            TrayOrientation::Horizontal => Rect {
                x: max!(0, i32::from(self.area.width) - i32::from(length)) as i16,
                y: max!(0, (i32::from(self.area.height) - i32::from(self.icon_size)) / 2) as i16,
                width: max!(1, length),
                height: self.icon_size,
            },
            TrayOrientation::Vertical => Rect {
                x: max!(0, (i32::from(self.area.width) - i32::from(self.icon_size)) / 2) as i16,
                y: max!(0, i32::from(self.area.height) - i32::from(length)) as i16,
                width: self.icon_size,
                height: max!(1, length),
            },
        }
    }

    /// Move and resize the container to the current icons
    pub(crate) fn arrange<C: XConn>(&self, ctx: &Context<C>) -> Result<()> {
        if NONE == self.container {
            return Ok(());
        }

        let geom = self.container_geometry();

        ctx.conn.configure_window(self.container, &geom)?;
        ctx.conn.flush()?;

        debug!("{}: nicons={}, geom={}", function_name!(), self.icons.len(), geom);

        Ok(())
    }

    fn arrange_logged<C: XConn>(&self, ctx: &Context<C>) {
        if let Err(err) = self.arrange(ctx) {
            warn!("Failed to arrange tray: {}", err);
        }
    }

    /// Follow changes of the parent and the panel config
    ///
    /// Orientation is derived from the area again and republished to clients
    /// when it flips; every docked icon is moved to its new slot.
    ///
    /// # Arguments
    ///
    /// * `ctx` - Global context
    /// * `area` - Geometry of the parent
    /// * `icon_size` - Edge length of icons
    /// * `background` - Background pixel of the container
    ///
    /// # Returns
    ///
    /// A [`Result`] with either [`unit`] on success or otherwise [`anyhow::Error`]
    pub(crate) fn reconfigure<C: XConn>(&mut self, ctx: &Context<C>, area: Rect, icon_size: u16,
                                        background: u32) -> Result<()>
    {
        let orientation = TrayOrientation::from_area(&area);

        if self.active && orientation != self.orientation {
            ctx.conn.change_property32(self.manager_win, ctx.atoms._NET_SYSTEM_TRAY_ORIENTATION,
                                       ctx.atoms.CARDINAL, &[orientation as u32])?;

            info!("Tray orientation changed to {:?}", orientation);
        }

        self.area = area;
        self.orientation = orientation;
        self.icon_size = max!(1, icon_size);

        if NONE != self.container {
            ctx.conn.set_background(self.container, background)?;
        }

        for icon in &self.icons {
            if let Err(err) = ctx.conn.configure_window(icon.win, &self.slot_geometry(icon.slot)) {
                debug!("{}: icon={}: {}", function_name!(), icon, err);
            }
        }

        debug!("{}: tray={}, orientation={:?}, icon_size={}", function_name!(), self,
               self.orientation, self.icon_size);

        self.arrange(ctx)
    }

    /// Give back all icons and stop being the tray
    pub(crate) fn unmanage<C: XConn>(&mut self, ctx: &Context<C>) {
        for icon in self.icons.drain(..) {
            if let Err(err) = Self::release(ctx, &icon) {
                debug!("{}: icon={}: {}", function_name!(), icon, err);
            }
        }

        self.balloons.clear();

        if NONE != self.manager_win {
            if let Err(err) = ctx.conn.destroy_window(self.manager_win) {
                debug!("{}: {}", function_name!(), err);
            }

            self.manager_win = NONE;
        }

        self.active = false;

        self.arrange_logged(ctx);
    }

    /// Release the selection and all windows
    ///
    /// # Arguments
    ///
    /// * `ctx` - Global context
    ///
    /// # Returns
    ///
    /// A [`Result`] with either [`unit`] on success or otherwise [`anyhow::Error`]
    pub(crate) fn finish<C: XConn>(&mut self, ctx: &Context<C>) -> Result<()> {
        if self.active && ctx.conn.selection_owner(self.selection)? == self.manager_win {
            ctx.conn.set_selection_owner(NONE, self.selection, CURRENT_TIME)?;
        }

        self.unmanage(ctx);

        if NONE != self.container {
            ctx.conn.destroy_window(self.container)?;

            self.container = NONE;
        }

        debug!("{}", function_name!());

        Ok(())
    }
}

impl fmt::Display for TrayManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "selection={}, manager={}, container={}, active={}, nicons={}",
               self.selection, self.manager_win, self.container, self.active, self.icons.len())
    }
}
