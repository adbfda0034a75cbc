///
/// @package lxpanel-rs
///
/// @file Strut functions
/// @copyright 2025-present Christoph Kappel <christoph@unexist.dev>
/// @version $Id$
///
/// This program can be distributed under the terms of the GNU GPLv3.
/// See the file LICENSE for details.
///

use std::fmt;
use anyhow::Result;
use easy_min_max::max;
use log::debug;
use stdext::function_name;
use x11rb::protocol::xproto::Window;
use crate::display::XConn;
use crate::geometry::Edge;
use crate::lxpanel::Context;
use crate::rect::Rect;

/// Space reserved at exactly one screen edge
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) struct PanelStrut {
    pub(crate) edge: Edge,
    /// Distance from the edge
    pub(crate) size: u32,
    /// First pixel along the edge
    pub(crate) start: u32,
    /// Last pixel along the edge, exclusive
    pub(crate) end: u32,
}

impl PanelStrut {
    /// Reserve the space covered by the panel at its edge
    ///
    /// # Arguments
    ///
    /// * `edge` - Edge of the panel
    /// * `geom` - Absolute panel geometry
    /// * `screen_width` - Width of the screen
    /// * `screen_height` - Height of the screen
    ///
    /// # Returns
    ///
    /// A new [`PanelStrut`]
    pub(crate) fn new(edge: Edge, geom: &Rect, screen_width: u16, screen_height: u16) -> Self {
        let size = match edge {
            Edge::Left => geom.end_x(),
            Edge::Right => i32::from(screen_width) - i32::from(geom.x),
            Edge::Top => geom.end_y(),
            Edge::Bottom => i32::from(screen_height) - i32::from(geom.y),
        };

        let (start, end) = if edge.is_horizontal() {
            (i32::from(geom.x), geom.end_x())
        } else {
            (i32::from(geom.y), geom.end_y())
        };

        Self {
            edge,
            size: max!(0, size) as u32,
            start: max!(0, start) as u32,
            end: max!(0, end) as u32,
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        0 == self.size
    }

    /// Encode as `_NET_WM_STRUT_PARTIAL`
    pub(crate) fn to_partial(&self) -> [u32; 12] {
        let mut values = [0u32; 12];

        if !self.is_empty() {
            let idx = self.edge.strut_index();

            values[idx] = self.size;
            values[4 + idx * 2] = self.start;
            values[5 + idx * 2] = self.end.saturating_sub(1);
        }

        values
    }

    /// Encode as legacy `_NET_WM_STRUT`
    pub(crate) fn to_legacy(&self) -> [u32; 4] {
        let partial = self.to_partial();

        [partial[0], partial[1], partial[2], partial[3]]
    }

    /// Set or remove strut properties of the window
    ///
    /// # Arguments
    ///
    /// * `ctx` - Global context
    /// * `win` - Panel window
    ///
    /// # Returns
    ///
    /// A [`Result`] with either [`unit`] on success or otherwise [`anyhow::Error`]
    pub(crate) fn publish<C: XConn>(&self, ctx: &Context<C>, win: Window) -> Result<()> {
        // Window managers supporting the partial variant ignore the legacy one
        if self.is_empty() {
            ctx.conn.delete_property(win, ctx.atoms._NET_WM_STRUT)?;
            ctx.conn.delete_property(win, ctx.atoms._NET_WM_STRUT_PARTIAL)?;
        } else {
            ctx.conn.change_property32(win, ctx.atoms._NET_WM_STRUT_PARTIAL,
                                       ctx.atoms.CARDINAL, &self.to_partial())?;
            ctx.conn.change_property32(win, ctx.atoms._NET_WM_STRUT,
                                       ctx.atoms.CARDINAL, &self.to_legacy())?;
        }

        debug!("{}: win={}, strut={}", function_name!(), win, self);

        Ok(())
    }
}

impl fmt::Display for PanelStrut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(edge={:?}, size={}, start={}, end={})", self.edge, self.size, self.start, self.end)
    }
}
