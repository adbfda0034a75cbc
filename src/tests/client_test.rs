///
/// @package lxpanel-rs
///
/// @file Client tests
/// @copyright 2025-present Christoph Kappel <christoph@unexist.dev>
/// @version $Id$
///
/// This program can be distributed under the terms of the GNU GPLv3.
/// See the file LICENSE for details.
///

use crate::client::ManagedWindow;
use crate::display::XConn;
use crate::ewmh::{WindowState, WindowType, ALL_DESKTOPS};
use crate::tests::fake;

#[test]
fn should_read_window_properties() {
    let ctx = fake::context();
    let atoms = &ctx.atoms;
    let win = 0x0040_0001;

    fake::add_client(&ctx, win, "Terminal", 2);

    ctx.conn.set_property32(win, atoms._NET_WM_STATE, atoms.ATOM, &[atoms._NET_WM_STATE_SHADED]);
    ctx.conn.set_property32(win, atoms._NET_WM_WINDOW_TYPE, atoms.ATOM, &[atoms._NET_WM_WINDOW_TYPE_DIALOG]);
    ctx.conn.set_property32(win, atoms.WM_HINTS, atoms.WM_HINTS, &[1 << 8, 0, 0, 0, 0, 0, 0, 0, 0]);

    let window = ManagedWindow::new(&ctx, win).unwrap();

    assert_eq!(window.title, "Terminal");
    assert_eq!(window.desktop, 2);
    assert_eq!(window.state, WindowState::SHADED);
    assert_eq!(window.window_type, WindowType::Dialog);
    assert!(window.is_shaded());
    assert!(window.is_urgent());
    assert!(!window.is_iconified());
    assert!(window.is_on_desktop(2));
    assert!(!window.is_on_desktop(0));
}

#[test]
fn should_fail_for_vanished_window() {
    let ctx = fake::context();

    assert!(ManagedWindow::new(&ctx, 0x0040_0001).is_err());
}

#[test]
fn should_prefer_visible_name() {
    let ctx = fake::context();
    let atoms = &ctx.atoms;
    let win = 0x0040_0001;

    fake::add_client(&ctx, win, "Name", 0);

    ctx.conn.set_property8(win, atoms.WM_NAME, atoms.STRING, b"Legacy");
    ctx.conn.set_property8(win, atoms._NET_WM_VISIBLE_NAME, atoms.UTF8_STRING, b"Visible");

    let mut window = ManagedWindow::new(&ctx, win).unwrap();

    assert_eq!(window.title, "Visible");

    ctx.conn.delete_property(win, atoms._NET_WM_VISIBLE_NAME).unwrap();
    ctx.conn.delete_property(win, atoms._NET_WM_NAME).unwrap();

    assert!(window.update_title(&ctx).unwrap());
    assert_eq!(window.title, "Legacy");
}

#[test]
fn should_treat_all_desktops_as_sticky() {
    let ctx = fake::context();
    let win = 0x0040_0001;

    fake::add_client(&ctx, win, "Sticky", ALL_DESKTOPS);

    let window = ManagedWindow::new(&ctx, win).unwrap();

    assert_eq!(window.desktop, ALL_DESKTOPS);
    assert!(window.is_sticky());
    assert!(window.is_on_desktop(7));
}

#[test]
fn should_detect_iconic_wm_state() {
    let ctx = fake::context();
    let atoms = &ctx.atoms;
    let win = 0x0040_0001;

    fake::add_client(&ctx, win, "Iconic", 0);

    ctx.conn.set_property32(win, atoms.WM_STATE, atoms.WM_STATE, &[3, 0]);

    let mut window = ManagedWindow::new(&ctx, win).unwrap();

    assert!(window.is_iconified());

    ctx.conn.set_property32(win, atoms.WM_STATE, atoms.WM_STATE, &[1, 0]);

    assert!(window.update_wm_state(&ctx).unwrap());
    assert!(!window.is_iconified());
    assert!(!window.update_wm_state(&ctx).unwrap());
}
