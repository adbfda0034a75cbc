///
/// @package lxpanel-rs
///
/// @file Event functions
/// @copyright 2025-present Christoph Kappel <christoph@unexist.dev>
/// @version $Id$
///
/// This program can be distributed under the terms of the GNU GPLv3.
/// See the file LICENSE for details.
///

use std::io;
use std::time::{Duration, Instant};
use anyhow::{anyhow, Result};
use log::{debug, info, trace, warn};
use mio::{Events, Interest, Poll, Token};
use mio::unix::SourceFd;
use stdext::function_name;
use x11rb::CURRENT_TIME;
use x11rb::protocol::Event;
use x11rb::protocol::xproto::{ClientMessageEvent, ConfigureNotifyEvent, DestroyNotifyEvent,
                              PropertyNotifyEvent, ReparentNotifyEvent, SelectionClearEvent,
                              UnmapNotifyEvent};
use crate::command::{ControlMessage, PanelAction, PanelCommand, MESSAGE_SIZE};
use crate::config::Config;
use crate::display::{X11Conn, XConn};
use crate::geometry::PanelConfig;
use crate::lxpanel::{Flags, LxPanel};
use crate::message;
use crate::message::StateAction;
use crate::rect::Rect;

const X11_TOKEN: Token = Token(0);

/// Upper bound for a single wait
const MAX_WAIT: Duration = Duration::from_millis(500);

fn handle_property<C: XConn>(lxpanel: &mut LxPanel<C>, event: PropertyNotifyEvent) -> Result<()> {
    if event.window == lxpanel.ctx.root {
        let events = lxpanel.tracker.handle_root_property(&lxpanel.ctx, event.atom)?;

        lxpanel.publish(&events);

        return Ok(());
    }

    if let Some(tray) = lxpanel.tray.as_mut() {
        match tray.handle_property(&lxpanel.ctx, event.window, event.atom) {
            Ok(true) => return Ok(()),
            Ok(false) => {},
            Err(err) => {
                debug!("{}: win={}: {}", function_name!(), event.window, err);

                return Ok(());
            },
        }
    }

    let events = lxpanel.tracker.handle_window_property(&lxpanel.ctx, event.window, event.atom);

    lxpanel.publish(&events);

    Ok(())
}

fn handle_client_message<C: XConn>(lxpanel: &mut LxPanel<C>, event: &ClientMessageEvent) -> Result<()> {
    if lxpanel.ctx.atoms._LXPANEL_CMD == event.type_ {
        if 8 != event.format {
            debug!("{}: ignoring command with format={}", function_name!(), event.format);

            return Ok(());
        }

        let data: [u8; MESSAGE_SIZE] = event.data.as_data8();

        match ControlMessage::decode(&data) {
            Some(msg) => handle_command(lxpanel, &msg),
            None => warn!("Unknown panel command {}", data[0]),
        }

        return Ok(());
    }

    let handled = lxpanel.tray.as_mut()
        .is_some_and(|tray| tray.handle_client_message(&lxpanel.ctx, event));

    if !handled {
        trace!("{}: unhandled type={}, win={}", function_name!(), event.type_, event.window);
    }

    Ok(())
}

/// Execute a `_LXPANEL_CMD` message
///
/// # Arguments
///
/// * `lxpanel` - Panel state
/// * `msg` - Decoded message
pub(crate) fn handle_command<C: XConn>(lxpanel: &mut LxPanel<C>, msg: &ControlMessage) {
    info!("Received command `{}'", msg);

    match msg.command {
        PanelCommand::Exit => lxpanel.ctx.request_shutdown(),
        PanelCommand::Restart => {
            lxpanel.flags.insert(Flags::RESTART);
            lxpanel.ctx.request_shutdown();
        },
        PanelCommand::Config => lxpanel.flags.insert(Flags::RELOAD),
        PanelCommand::Command => {
            let result = msg.action()
                .and_then(|action| perform_action(lxpanel, action));

            if let Err(err) = result {
                warn!("Failed to run command `{}': {}", msg.payload, err);
            }
        },
        PanelCommand::SysMenu | PanelCommand::Run | PanelCommand::None => {
            info!("Ignoring command `{}', no menu available", msg.command.name());
        },
    }
}

fn perform_action<C: XConn>(lxpanel: &LxPanel<C>, action: PanelAction) -> Result<()> {
    let ctx = &lxpanel.ctx;

    match action {
        PanelAction::Desktop(idx) => message::request_desktop_change(ctx, idx),
        PanelAction::Close(win) => message::request_window_close(ctx, win),
        PanelAction::WmClose(win) => message::request_net_close(ctx, win),
        PanelAction::Raise(win) => message::request_raise(ctx, &lxpanel.tracker, win, CURRENT_TIME),
        PanelAction::Toggle(win, state) => {
            let atom = state.to_atom(&ctx.atoms)
                .ok_or_else(|| anyhow!("Unknown state {:?}", state))?;

            // Explicit request when the current state is known
            let action = match lxpanel.tracker.get(win) {
                Some(window) if window.state.contains(state) => StateAction::Remove,
                Some(_) => StateAction::Add,
                None => StateAction::Toggle,
            };

            message::request_state_change(ctx, win, atom, action)
        },
        PanelAction::Move(win, desktop) => message::request_move_to_desktop(ctx, win, desktop),
    }
}

fn handle_destroy<C: XConn>(lxpanel: &mut LxPanel<C>, event: DestroyNotifyEvent) {
    if lxpanel.tray.as_mut().is_some_and(|tray| tray.handle_destroy(&lxpanel.ctx, event.window)) {
        return;
    }

    let events = lxpanel.tracker.handle_destroy(event.window);

    lxpanel.publish(&events);
}

fn handle_unmap<C: XConn>(lxpanel: &mut LxPanel<C>, event: UnmapNotifyEvent) {
    // Same unmap is reported to the parent as well
    if event.event != event.window {
        return;
    }

    if let Some(tray) = lxpanel.tray.as_mut() {
        tray.handle_unmap(&lxpanel.ctx, event.window);
    }
}

fn handle_reparent<C: XConn>(lxpanel: &mut LxPanel<C>, event: ReparentNotifyEvent) {
    if event.event != event.window {
        return;
    }

    if let Some(tray) = lxpanel.tray.as_mut() {
        tray.handle_reparent(&lxpanel.ctx, event.window, event.parent);
    }
}

fn handle_configure<C: XConn>(lxpanel: &mut LxPanel<C>, event: ConfigureNotifyEvent) -> Result<()> {
    if event.window == lxpanel.ctx.root {
        info!("Screen resized to {}x{}", event.width, event.height);

        return lxpanel.set_screen_size(event.width, event.height);
    }

    if event.event != event.window {
        return Ok(());
    }

    let geom = Rect::from((event.x, event.y, event.width, event.height));
    let events = lxpanel.tracker.handle_configure(event.window, geom);

    lxpanel.publish(&events);

    Ok(())
}

fn handle_selection_clear<C: XConn>(lxpanel: &mut LxPanel<C>, event: SelectionClearEvent) {
    if let Some(tray) = lxpanel.tray.as_mut() {
        tray.handle_selection_clear(&lxpanel.ctx, event.selection);
    }
}

/// Dispatch a single event
///
/// # Arguments
///
/// * `lxpanel` - Panel state
/// * `event` - Event to handle
///
/// # Returns
///
/// A [`Result`] with either [`unit`] on success or otherwise [`anyhow::Error`]
pub(crate) fn handle_event<C: XConn>(lxpanel: &mut LxPanel<C>, event: Event) -> Result<()> {
    match event {
        Event::PropertyNotify(evt) => handle_property(lxpanel, evt)?,
        Event::ClientMessage(evt) => handle_client_message(lxpanel, &evt)?,
        Event::DestroyNotify(evt) => handle_destroy(lxpanel, evt),
        Event::UnmapNotify(evt) => handle_unmap(lxpanel, evt),
        Event::ReparentNotify(evt) => handle_reparent(lxpanel, evt),
        Event::ConfigureNotify(evt) => handle_configure(lxpanel, evt)?,
        Event::SelectionClear(evt) => handle_selection_clear(lxpanel, evt),
        Event::Error(err) => trace!("{}: X error: {:?}", function_name!(), err),
        _ => trace!("Unhandled event: {:?}", event),
    }

    Ok(())
}

/// Time until the next timer expires
pub(crate) fn next_timeout<C: XConn>(lxpanel: &LxPanel<C>, now: Instant) -> Duration {
    lxpanel.tray.as_ref()
        .and_then(|tray| tray.next_deadline())
        .map_or(MAX_WAIT, |deadline| deadline.saturating_duration_since(now).min(MAX_WAIT))
}

/// Run timers that are due
pub(crate) fn expire_timers<C: XConn>(lxpanel: &mut LxPanel<C>, now: Instant) {
    if let Some(tray) = lxpanel.tray.as_mut() {
        tray.expire(now);
    }
}

fn reload(lxpanel: &mut LxPanel<X11Conn>) {
    lxpanel.flags.remove(Flags::RELOAD);

    let (config, path, _format) = Config::parse_info();

    info!("Reloading file `{:?}'", path.unwrap_or_default());

    let result = PanelConfig::try_from(&config.panel)
        .and_then(|panel_config| lxpanel.reconfigure(panel_config));

    if let Err(err) = result {
        warn!("Failed to reload config: {}", err);
    }
}

/// Wait for and handle events until shutdown is requested
///
/// # Arguments
///
/// * `lxpanel` - Panel state
///
/// # Returns
///
/// A [`Result`] with either [`unit`] on success or otherwise [`anyhow::Error`]
pub(crate) fn handle_requests(lxpanel: &mut LxPanel<X11Conn>) -> Result<()> {
    let mut poll = Poll::new()?;
    let mut events = Events::with_capacity(8);
    let fd = lxpanel.ctx.conn.raw_fd();

    poll.registry().register(&mut SourceFd(&fd), X11_TOKEN, Interest::READABLE)?;

    while !lxpanel.ctx.is_shutdown() {
        if lxpanel.flags.contains(Flags::RELOAD) {
            reload(lxpanel);
        }

        expire_timers(lxpanel, Instant::now());

        while let Some(event) = lxpanel.ctx.conn.poll_for_event()? {
            handle_event(lxpanel, event)?;
        }

        lxpanel.ctx.conn.flush()?;

        // Interrupted by signals
        if let Err(err) = poll.poll(&mut events, Some(next_timeout(lxpanel, Instant::now()))) {
            if io::ErrorKind::Interrupted != err.kind() {
                return Err(err.into());
            }
        }
    }

    debug!("{}: leaving", function_name!());

    Ok(())
}
