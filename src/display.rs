///
/// @package lxpanel-rs
///
/// @file Display functions
/// @copyright 2025-present Christoph Kappel <christoph@unexist.dev>
/// @version $Id$
///
/// This program can be distributed under the terms of the GNU GPLv3.
/// See the file LICENSE for details.
///

use std::os::unix::io::{AsRawFd, RawFd};
use anyhow::{Context, Result};
use easy_min_max::max;
use log::{debug, info};
use x11rb::{COPY_DEPTH_FROM_PARENT, COPY_FROM_PARENT, NONE};
use x11rb::connection::Connection;
use x11rb::protocol::Event;
use x11rb::protocol::xproto::{Atom, ChangeWindowAttributesAux, ClientMessageEvent, ConfigureWindowAux,
                              ConnectionExt, CreateWindowAux, EventMask, MapState, PropMode, SetMode,
                              Timestamp, Window, WindowClass};
use x11rb::rust_connection::RustConnection;
use x11rb::wrapper::ConnectionExt as ConnectionExtWrapper;
use crate::config::Config;
use crate::rect::Rect;

/// Raw property as returned by the server
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Property {
    /// Type atom of the value
    pub(crate) type_: Atom,
    /// Either 8, 16 or 32
    pub(crate) format: u8,
    /// Value bytes in native byte order
    pub(crate) value: Vec<u8>,
}

impl Property {
    /// Interpret value as list of 32-bit items
    ///
    /// # Returns
    ///
    /// Values of the property or an empty [`Vec`] for other formats
    pub(crate) fn value32(&self) -> Vec<u32> {
        if 32 != self.format {
            return Vec::new();
        }

        self.value.chunks_exact(4)
            .map(|chunk| u32::from_ne_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect()
    }
}

/// Everything the panel needs from the X server
///
/// All calls are fire-and-forget except the ones returning data; errors of
/// requests are reported either directly or later as error events.
pub(crate) trait XConn {
    /// Root window of the used screen
    fn root(&self) -> Window;

    /// Number of the used screen
    fn screen_num(&self) -> usize;

    /// Size of the used screen in pixel
    fn screen_size(&self) -> (u16, u16);

    fn intern_atom(&self, name: &str) -> Result<Atom>;

    /// Read a property of any format
    ///
    /// # Returns
    ///
    /// A [`Result`] with either [`Option`] of [`Property`], [`None`] when unset, or
    /// otherwise [`anyhow::Error`] when the window is gone
    fn get_property(&self, win: Window, prop: Atom, type_: Atom) -> Result<Option<Property>>;

    fn change_property32(&self, win: Window, prop: Atom, type_: Atom, data: &[u32]) -> Result<()>;

    fn change_property8(&self, win: Window, prop: Atom, type_: Atom, data: &[u8]) -> Result<()>;

    fn delete_property(&self, win: Window, prop: Atom) -> Result<()>;

    /// Replace the event mask of our client on the window
    fn select_input(&self, win: Window, mask: EventMask) -> Result<()>;

    fn send_event(&self, dest: Window, mask: EventMask, event: ClientMessageEvent) -> Result<()>;

    fn selection_owner(&self, selection: Atom) -> Result<Window>;

    fn set_selection_owner(&self, owner: Window, selection: Atom, time: Timestamp) -> Result<()>;

    fn create_window(&self, parent: Window, geom: &Rect, background: u32,
                     override_redirect: bool, mask: EventMask) -> Result<Window>;

    fn destroy_window(&self, win: Window) -> Result<()>;

    /// Change background pixel and repaint the window
    fn set_background(&self, win: Window, background: u32) -> Result<()>;

    fn map_window(&self, win: Window) -> Result<()>;

    fn unmap_window(&self, win: Window) -> Result<()>;

    /// Check whether the window is mapped
    fn is_mapped(&self, win: Window) -> Result<bool>;

    fn reparent_window(&self, win: Window, parent: Window, x: i16, y: i16) -> Result<()>;

    fn configure_window(&self, win: Window, geom: &Rect) -> Result<()>;

    fn window_geometry(&self, win: Window) -> Result<Rect>;

    /// Add window to our save-set, so it survives when we die
    fn add_to_save_set(&self, win: Window) -> Result<()>;

    fn flush(&self) -> Result<()>;
}

/// Connection to a real X server
pub(crate) struct X11Conn {
    conn: RustConnection,
    screen_num: usize,
}

impl X11Conn {
    /// Underlying connection
    pub(crate) fn connection(&self) -> &RustConnection {
        &self.conn
    }

    /// Fd of the connection, to wait for readable data
    pub(crate) fn raw_fd(&self) -> RawFd {
        self.conn.stream().as_raw_fd()
    }

    /// Fetch next queued event without blocking
    pub(crate) fn poll_for_event(&self) -> Result<Option<Event>> {
        Ok(self.conn.poll_for_event()?)
    }
}

impl XConn for X11Conn {
    fn root(&self) -> Window {
        self.conn.setup().roots[self.screen_num].root
    }

    fn screen_num(&self) -> usize {
        self.screen_num
    }

    fn screen_size(&self) -> (u16, u16) {
        let screen = &self.conn.setup().roots[self.screen_num];

        (screen.width_in_pixels, screen.height_in_pixels)
    }

    fn intern_atom(&self, name: &str) -> Result<Atom> {
        Ok(self.conn.intern_atom(false, name.as_bytes())?.reply()?.atom)
    }

    fn get_property(&self, win: Window, prop: Atom, type_: Atom) -> Result<Option<Property>> {
        let reply = self.conn.get_property(false, win, prop, type_, 0, u32::MAX)?.reply()?;

        if NONE == reply.type_ {
            return Ok(None);
        }

        Ok(Some(Property {
            type_: reply.type_,
            format: reply.format,
            value: reply.value,
        }))
    }

    fn change_property32(&self, win: Window, prop: Atom, type_: Atom, data: &[u32]) -> Result<()> {
        self.conn.change_property32(PropMode::REPLACE, win, prop, type_, data)?;

        Ok(())
    }

    fn change_property8(&self, win: Window, prop: Atom, type_: Atom, data: &[u8]) -> Result<()> {
        self.conn.change_property8(PropMode::REPLACE, win, prop, type_, data)?;

        Ok(())
    }

    fn delete_property(&self, win: Window, prop: Atom) -> Result<()> {
        self.conn.delete_property(win, prop)?;

        Ok(())
    }

    fn select_input(&self, win: Window, mask: EventMask) -> Result<()> {
        self.conn.change_window_attributes(win, &ChangeWindowAttributesAux::default()
            .event_mask(mask))?;

        Ok(())
    }

    fn send_event(&self, dest: Window, mask: EventMask, event: ClientMessageEvent) -> Result<()> {
        self.conn.send_event(false, dest, mask, event)?;

        Ok(())
    }

    fn selection_owner(&self, selection: Atom) -> Result<Window> {
        Ok(self.conn.get_selection_owner(selection)?.reply()?.owner)
    }

    fn set_selection_owner(&self, owner: Window, selection: Atom, time: Timestamp) -> Result<()> {
        self.conn.set_selection_owner(owner, selection, time)?;

        Ok(())
    }

    fn create_window(&self, parent: Window, geom: &Rect, background: u32,
                     override_redirect: bool, mask: EventMask) -> Result<Window>
    {
        let win = self.conn.generate_id()?;

        let aux = CreateWindowAux::default()
            .background_pixel(background)
            .event_mask(mask)
            .override_redirect(u32::from(override_redirect));

        self.conn.create_window(COPY_DEPTH_FROM_PARENT, win, parent,
                                geom.x, geom.y, max!(1, geom.width), max!(1, geom.height), 0,
                                WindowClass::INPUT_OUTPUT, COPY_FROM_PARENT, &aux)?;

        Ok(win)
    }

    fn destroy_window(&self, win: Window) -> Result<()> {
        self.conn.destroy_window(win)?;

        Ok(())
    }

    fn set_background(&self, win: Window, background: u32) -> Result<()> {
        self.conn.change_window_attributes(win, &ChangeWindowAttributesAux::default()
            .background_pixel(background))?;
        self.conn.clear_area(true, win, 0, 0, 0, 0)?;

        Ok(())
    }

    fn map_window(&self, win: Window) -> Result<()> {
        self.conn.map_window(win)?;

        Ok(())
    }

    fn unmap_window(&self, win: Window) -> Result<()> {
        self.conn.unmap_window(win)?;

        Ok(())
    }

    fn is_mapped(&self, win: Window) -> Result<bool> {
        let attrs = self.conn.get_window_attributes(win)?.reply()?;

        Ok(MapState::UNMAPPED != attrs.map_state)
    }

    fn reparent_window(&self, win: Window, parent: Window, x: i16, y: i16) -> Result<()> {
        self.conn.reparent_window(win, parent, x, y)?;

        Ok(())
    }

    fn configure_window(&self, win: Window, geom: &Rect) -> Result<()> {
        let aux = ConfigureWindowAux::default()
            .x(i32::from(geom.x))
            .y(i32::from(geom.y))
            .width(u32::from(max!(1, geom.width)))
            .height(u32::from(max!(1, geom.height)));

        self.conn.configure_window(win, &aux)?;

        Ok(())
    }

    fn window_geometry(&self, win: Window) -> Result<Rect> {
        let reply = self.conn.get_geometry(win)?.reply()?;

        Ok(Rect::from((reply.x, reply.y, reply.width, reply.height)))
    }

    fn add_to_save_set(&self, win: Window) -> Result<()> {
        self.conn.change_save_set(SetMode::INSERT, win)?;

        Ok(())
    }

    fn flush(&self) -> Result<()> {
        self.conn.flush()?;

        Ok(())
    }
}

/// Open the display
///
/// # Arguments
///
/// * `config` - Config values read either from args or config file
///
/// # Returns
///
/// A [`Result`] with either [`X11Conn`] on success or otherwise [`anyhow::Error`]
pub(crate) fn init(config: &Config) -> Result<X11Conn> {
    let (conn, screen_num) = x11rb::connect(Some(&*config.display))
        .with_context(|| format!("Failed to open display `{}'", config.display))?;

    let conn = X11Conn {
        conn,
        screen_num,
    };

    let (width, height) = conn.screen_size();

    info!("Display ({}) is {}x{}", config.display, width, height);
    debug!("Screen {} with root={}", screen_num, conn.root());

    Ok(conn)
}
