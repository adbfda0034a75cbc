///
/// @package lxpanel-rs
///
/// @file Panel functions
/// @copyright 2025-present Christoph Kappel <christoph@unexist.dev>
/// @version $Id$
///
/// This program can be distributed under the terms of the GNU GPLv3.
/// See the file LICENSE for details.
///

use std::fmt;
use anyhow::Result;
use log::{debug, info};
use stdext::function_name;
use x11rb::protocol::xproto::{EventMask, Window};
use crate::display::XConn;
use crate::ewmh::ALL_DESKTOPS;
use crate::geometry;
use crate::geometry::PanelConfig;
use crate::lxpanel::Context;
use crate::rect::Rect;
use crate::strut::PanelStrut;

const PANEL_NAME: &str = "lxpanel";

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum PanelState {
    Unconfigured,
    GeometryComputed,
    StrutPublished,
}

/// Dock window at one screen edge
#[derive(Debug)]
pub(crate) struct Panel {
    pub(crate) win: Window,
    pub(crate) config: PanelConfig,
    /// Absolute geometry
    pub(crate) geom: Rect,
    pub(crate) state: PanelState,
    screen_width: u16,
    screen_height: u16,
    /// Last published strut
    strut: Option<PanelStrut>,
}

impl Panel {
    /// Create the panel window
    ///
    /// # Arguments
    ///
    /// * `ctx` - Global context
    /// * `config` - Panel config
    ///
    /// # Returns
    ///
    /// A [`Result`] with either [`Panel`] on success or otherwise [`anyhow::Error`]
    pub(crate) fn new<C: XConn>(ctx: &Context<C>, config: PanelConfig) -> Result<Self> {
        let win = ctx.conn.create_window(ctx.root, &Rect::from((0, 0, 1, 1)), config.background,
                                         false, EventMask::STRUCTURE_NOTIFY)?;

        let atoms = &ctx.atoms;

        ctx.conn.change_property32(win, atoms._NET_WM_WINDOW_TYPE, atoms.ATOM,
                                   &[atoms._NET_WM_WINDOW_TYPE_DOCK])?;
        ctx.conn.change_property32(win, atoms._NET_WM_DESKTOP, atoms.CARDINAL, &[ALL_DESKTOPS])?;
        ctx.conn.change_property32(win, atoms._NET_WM_STATE, atoms.ATOM, &[
            atoms._NET_WM_STATE_SKIP_PAGER,
            atoms._NET_WM_STATE_SKIP_TASKBAR,
            atoms._NET_WM_STATE_STICKY,
        ])?;
        ctx.conn.change_property8(win, atoms._NET_WM_NAME, atoms.UTF8_STRING, PANEL_NAME.as_bytes())?;
        ctx.conn.change_property8(win, atoms.WM_NAME, atoms.STRING, PANEL_NAME.as_bytes())?;

        let (screen_width, screen_height) = ctx.conn.screen_size();

        let panel = Self {
            win,
            config,
            geom: Rect::default(),
            state: PanelState::Unconfigured,
            screen_width,
            screen_height,
            strut: None,
        };

        debug!("{}: panel={}", function_name!(), panel);

        Ok(panel)
    }

    /// Geometry relative to the panel window
    pub(crate) fn local_area(&self) -> Rect {
        Rect::from((0, 0, self.geom.width, self.geom.height))
    }

    pub(crate) fn strut(&self) -> Option<&PanelStrut> {
        self.strut.as_ref()
    }

    /// Compute geometry, place window and publish strut
    ///
    /// # Arguments
    ///
    /// * `ctx` - Global context
    ///
    /// # Returns
    ///
    /// A [`Result`] with either [`unit`] on success or otherwise [`anyhow::Error`]
    pub(crate) fn configure<C: XConn>(&mut self, ctx: &Context<C>) -> Result<()> {
        self.geom = geometry::calculate(&self.config, self.screen_width, self.screen_height);
        self.state = PanelState::GeometryComputed;

        ctx.conn.configure_window(self.win, &self.geom)?;
        ctx.conn.map_window(self.win)?;

        self.publish_strut(ctx)?;
        self.state = PanelState::StrutPublished;

        ctx.conn.flush()?;

        info!("Panel placed at {}", self.geom);

        Ok(())
    }

    fn desired_strut(&self) -> PanelStrut {
        if self.config.strut {
            PanelStrut::new(self.config.edge, &self.geom, self.screen_width, self.screen_height)
        } else {
            PanelStrut {
                edge: self.config.edge,
                ..PanelStrut::default()
            }
        }
    }

    /// Publish strut unless it is unchanged
    ///
    /// # Returns
    ///
    /// A [`Result`] with either `true` when properties were written or otherwise [`anyhow::Error`]
    fn publish_strut<C: XConn>(&mut self, ctx: &Context<C>) -> Result<bool> {
        let strut = self.desired_strut();

        if Some(strut) == self.strut {
            return Ok(false);
        }

        strut.publish(ctx, self.win)?;

        self.strut = Some(strut);

        Ok(true)
    }

    pub(crate) fn set_config<C: XConn>(&mut self, ctx: &Context<C>, config: PanelConfig) -> Result<()> {
        if config == self.config {
            return Ok(());
        }

        if config.background != self.config.background {
            ctx.conn.set_background(self.win, config.background)?;
        }

        self.config = config;

        self.configure(ctx)
    }

    pub(crate) fn set_screen_size<C: XConn>(&mut self, ctx: &Context<C>, width: u16, height: u16) -> Result<()> {
        if (width, height) == (self.screen_width, self.screen_height) {
            return Ok(());
        }

        self.screen_width = width;
        self.screen_height = height;

        self.configure(ctx)
    }

    pub(crate) fn finish<C: XConn>(&self, ctx: &Context<C>) -> Result<()> {
        ctx.conn.destroy_window(self.win)?;

        debug!("{}: panel={}", function_name!(), self);

        Ok(())
    }
}

impl fmt::Display for Panel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "win={}, state={:?}, geom={}, screen={}x{}",
               self.win, self.state, self.geom, self.screen_width, self.screen_height)
    }
}
