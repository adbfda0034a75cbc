///
/// @package lxpanel-rs
///
/// @file Panel state functions
/// @copyright 2025-present Christoph Kappel <christoph@unexist.dev>
/// @version $Id$
///
/// This program can be distributed under the terms of the GNU GPLv3.
/// See the file LICENSE for details.
///

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use anyhow::Result;
use bitflags::bitflags;
use log::{debug, info, warn};
use stdext::function_name;
use x11rb::protocol::xproto::{Atom, EventMask, Window};
use crate::display::XConn;
use crate::ewmh;
use crate::ewmh::Atoms;
use crate::geometry::PanelConfig;
use crate::panel::Panel;
use crate::tracker::{Change, TrackerEvent, WindowTracker};
use crate::tray::TrayManager;

bitflags! {
    #[derive(Default, Debug, Copy, Clone, PartialEq)]
    pub(crate) struct Flags: u32 {
        const RESTART = 1 << 0; // Restart after exit
        const RELOAD = 1 << 1; // Reload config
    }
}

/// Everything that stays the same for the lifetime of the connection
pub(crate) struct Context<C: XConn> {
    pub(crate) conn: C,
    pub(crate) atoms: Atoms,
    pub(crate) root: Window,
    pub(crate) screen_num: usize,
    /// Set to leave the event loop
    pub(crate) shutdown: Arc<AtomicBool>,
}

impl<C: XConn> Context<C> {
    pub(crate) fn new(conn: C, atoms: Atoms) -> Self {
        Self {
            root: conn.root(),
            screen_num: conn.screen_num(),
            conn,
            atoms,
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    pub(crate) fn request_shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }

    pub(crate) fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    /// Read a 32-bit property
    ///
    /// # Arguments
    ///
    /// * `win` - Window of the property
    /// * `prop` - Property atom
    /// * `type_` - Expected type
    ///
    /// # Returns
    ///
    /// A [`Result`] with either [`Option`] of values or otherwise [`anyhow::Error`]
    pub(crate) fn get_property32(&self, win: Window, prop: Atom, type_: Atom) -> Result<Option<Vec<u32>>> {
        Ok(self.conn.get_property(win, prop, type_)?
            .map(|prop| prop.value32()))
    }

    /// Read first value of a `CARDINAL` property
    pub(crate) fn get_cardinal(&self, win: Window, prop: Atom) -> Result<Option<u32>> {
        Ok(self.get_property32(win, prop, self.atoms.CARDINAL)?
            .and_then(|values| values.first().copied()))
    }

    pub(crate) fn get_string(&self, win: Window, prop: Atom, type_: Atom) -> Result<Option<String>> {
        Ok(self.conn.get_property(win, prop, type_)?
            .map(|prop| ewmh::parse_string(&prop.value)))
    }
}

/// State of a running panel
pub(crate) struct LxPanel<C: XConn> {
    pub(crate) flags: Flags,
    pub(crate) ctx: Context<C>,
    pub(crate) panel: Panel,
    pub(crate) tracker: WindowTracker,
    pub(crate) tray: Option<TrayManager>,
}

impl<C: XConn> LxPanel<C> {
    /// Create the panel and read the current window manager state
    ///
    /// # Arguments
    ///
    /// * `ctx` - Global context
    /// * `config` - Panel config
    ///
    /// # Returns
    ///
    /// A [`Result`] with either [`LxPanel`] on success or otherwise [`anyhow::Error`]
    pub(crate) fn new(ctx: Context<C>, config: PanelConfig) -> Result<Self> {
        ctx.conn.select_input(ctx.root, EventMask::PROPERTY_CHANGE
            | EventMask::STRUCTURE_NOTIFY
            | EventMask::SUBSTRUCTURE_NOTIFY)?;

        let mut panel = Panel::new(&ctx, config)?;

        panel.configure(&ctx)?;

        let mut tracker = WindowTracker::default();

        tracker.add_own_window(panel.win);

        let tray = if config.tray {
            Self::create_tray(&ctx, &panel)
        } else {
            None
        };

        let mut lxpanel = Self {
            flags: Flags::empty(),
            ctx,
            panel,
            tracker,
            tray,
        };

        let events = lxpanel.tracker.refresh_all(&lxpanel.ctx)?;

        lxpanel.publish(&events);
        lxpanel.ctx.conn.flush()?;

        info!("Tracking {} windows on {} desktops", lxpanel.tracker.windows().len(),
              lxpanel.tracker.desktops().count());

        lxpanel.log_strut();

        Ok(lxpanel)
    }

    /// Become the system tray, an inactive tray is dropped right away
    fn create_tray(ctx: &Context<C>, panel: &Panel) -> Option<TrayManager> {
        match TrayManager::new(ctx, panel.win, panel.local_area(), panel.config.icon_size, panel.config.background) {
            Ok(tray) if tray.is_active() => Some(tray),
            Ok(_) => None,
            Err(err) => {
                warn!("Failed to create system tray: {}", err);

                None
            },
        }
    }

    fn log_strut(&self) {
        match self.panel.strut() {
            Some(strut) if 0 < strut.size => info!("Reserved {} pixel at {:?} edge", strut.size, strut.edge),
            _ => info!("No space reserved at the screen edge"),
        }
    }

    /// Hand tracker changes to interested parts
    pub(crate) fn publish(&self, events: &[TrackerEvent]) {
        for event in events {
            match event {
                TrackerEvent::CurrentDesktop(idx) => {
                    info!("Switched to desktop {} ({})", idx,
                          self.tracker.desktops().name(*idx).unwrap_or("unnamed"));
                },
                TrackerEvent::ActiveWindow(_) => {
                    match self.tracker.active().and_then(|win| self.tracker.get(win)) {
                        Some(window) => debug!("{}: active={}", function_name!(), window),
                        None => debug!("{}: no active window", function_name!()),
                    }
                },
                TrackerEvent::WindowChanged(win, Change::State) => {
                    let Some(window) = self.tracker.get(*win) else {
                        continue;
                    };

                    debug!("{}: win={}, iconified={}, shaded={}, urgent={}", function_name!(), win,
                           window.is_iconified(), window.is_shaded(), window.is_urgent());

                    if window.is_urgent() {
                        info!("Window `{}' demands attention", window.title);
                    }
                },
                TrackerEvent::Stacking => {
                    debug!("{}: nstacked={}, top={:?}", function_name!(), self.tracker.stacking().len(),
                           self.tracker.stacking().last());
                },
                TrackerEvent::Workarea => {
                    let current = self.tracker.desktops().current();

                    if let Some(area) = self.tracker.workarea(current) {
                        debug!("{}: desktop={}, workarea={}", function_name!(), current, area);
                    }
                },
                _ => debug!("{}: event={:?}", function_name!(), event),
            }
        }
    }

    /// Apply a new panel config
    pub(crate) fn reconfigure(&mut self, config: PanelConfig) -> Result<()> {
        self.panel.set_config(&self.ctx, config)?;

        match (config.tray, self.tray.take()) {
            (true, None) => self.tray = Self::create_tray(&self.ctx, &self.panel),
            (false, Some(mut tray)) => {
                tray.finish(&self.ctx)?;

                info!("System tray disabled");
            },
            (_, tray) => self.tray = tray,
        }

        self.log_strut();

        self.place_tray()
    }

    /// Follow a resized screen
    pub(crate) fn set_screen_size(&mut self, width: u16, height: u16) -> Result<()> {
        self.panel.set_screen_size(&self.ctx, width, height)?;

        self.place_tray()
    }

    fn place_tray(&mut self) -> Result<()> {
        if let Some(tray) = self.tray.as_mut() {
            tray.reconfigure(&self.ctx, self.panel.local_area(), self.panel.config.icon_size,
                             self.panel.config.background)?;
        }

        Ok(())
    }

    /// Release everything we own on the server
    pub(crate) fn finish(&mut self) -> Result<()> {
        if let Some(tray) = self.tray.as_mut() {
            tray.finish(&self.ctx)?;
        }

        self.panel.finish(&self.ctx)?;
        self.ctx.conn.flush()?;

        debug!("{}", function_name!());

        Ok(())
    }
}
