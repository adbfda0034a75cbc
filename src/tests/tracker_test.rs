///
/// @package lxpanel-rs
///
/// @file Tracker tests
/// @copyright 2025-present Christoph Kappel <christoph@unexist.dev>
/// @version $Id$
///
/// This program can be distributed under the terms of the GNU GPLv3.
/// See the file LICENSE for details.
///

use proptest::prelude::*;
use x11rb::protocol::xproto::{EventMask, Window};
use crate::ewmh::WindowState;
use crate::message;
use crate::message::StateAction;
use crate::rect::Rect;
use crate::tests::fake;
use crate::tracker::{Change, TrackerEvent, WindowTracker};

const WIN_BASE: Window = 0x0040_0000;

fn tracked(tracker: &WindowTracker) -> Vec<Window> {
    let mut wins: Vec<Window> = tracker.windows().iter().map(|window| window.win).collect();

    wins.sort_unstable();

    wins
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(5))]
    #[test]
    fn should_track_exactly_listed_windows(lists in prop::collection::vec(
        prop::collection::vec(0u32..8, 0..8), 1..5))
    {
        let ctx = fake::context();
        let mut tracker = WindowTracker::default();

        for idx in 0..8 {
            fake::add_client(&ctx, WIN_BASE + idx, &format!("win{}", idx), 0);
        }

        for list in lists {
            let wins: Vec<Window> = list.iter().map(|idx| WIN_BASE + idx).collect();

            fake::set_client_list(&ctx, &wins);
            tracker.refresh_client_list(&ctx).unwrap();

            let mut expected = wins.clone();

            expected.sort_unstable();
            expected.dedup();

            prop_assert_eq!(tracked(&tracker), expected);
        }
    }
}

#[test]
fn should_not_emit_events_for_unchanged_list() {
    let ctx = fake::context();
    let mut tracker = WindowTracker::default();

    fake::add_client(&ctx, WIN_BASE + 1, "one", 0);
    fake::add_client(&ctx, WIN_BASE + 2, "two", 0);
    fake::set_client_list(&ctx, &[WIN_BASE + 1, WIN_BASE + 2]);

    let events = tracker.refresh_client_list(&ctx).unwrap();

    assert_eq!(events, vec![TrackerEvent::WindowAdded(WIN_BASE + 1), TrackerEvent::WindowAdded(WIN_BASE + 2)]);
    assert!(tracker.refresh_client_list(&ctx).unwrap().is_empty());
}

#[test]
fn should_keep_client_list_order() {
    let ctx = fake::context();
    let mut tracker = WindowTracker::default();

    for idx in 1..=3 {
        fake::add_client(&ctx, WIN_BASE + idx, "win", 0);
    }

    fake::set_client_list(&ctx, &[WIN_BASE + 3, WIN_BASE + 1, WIN_BASE + 2]);
    tracker.refresh_client_list(&ctx).unwrap();

    let order: Vec<Window> = tracker.windows().iter().map(|window| window.win).collect();

    assert_eq!(order, vec![WIN_BASE + 3, WIN_BASE + 1, WIN_BASE + 2]);
}

#[test]
fn should_remove_dropped_windows() {
    let ctx = fake::context();
    let mut tracker = WindowTracker::default();

    fake::add_client(&ctx, WIN_BASE + 1, "one", 0);
    fake::add_client(&ctx, WIN_BASE + 2, "two", 0);
    fake::set_client_list(&ctx, &[WIN_BASE + 1, WIN_BASE + 2]);
    tracker.refresh_client_list(&ctx).unwrap();

    fake::set_client_list(&ctx, &[WIN_BASE + 2]);

    let events = tracker.refresh_client_list(&ctx).unwrap();

    assert_eq!(events, vec![TrackerEvent::WindowRemoved(WIN_BASE + 1)]);
    assert_eq!(tracked(&tracker), vec![WIN_BASE + 2]);

    // Released windows get no more events from us
    assert_eq!(ctx.conn.window(WIN_BASE + 1).unwrap().mask, u32::from(EventMask::NO_EVENT));
    assert_eq!(ctx.conn.window(WIN_BASE + 2).unwrap().mask,
               u32::from(EventMask::PROPERTY_CHANGE | EventMask::STRUCTURE_NOTIFY));
}

#[test]
fn should_skip_vanished_windows() {
    let ctx = fake::context();
    let mut tracker = WindowTracker::default();

    fake::add_client(&ctx, WIN_BASE + 1, "one", 0);
    fake::set_client_list(&ctx, &[WIN_BASE + 1, WIN_BASE + 2]);

    let events = tracker.refresh_client_list(&ctx).unwrap();

    assert_eq!(events, vec![TrackerEvent::WindowAdded(WIN_BASE + 1)]);
    assert_eq!(tracked(&tracker), vec![WIN_BASE + 1]);
}

#[test]
fn should_skip_own_windows() {
    let ctx = fake::context();
    let mut tracker = WindowTracker::default();

    fake::add_client(&ctx, WIN_BASE + 1, "panel", 0);
    fake::add_client(&ctx, WIN_BASE + 2, "client", 0);
    fake::set_client_list(&ctx, &[WIN_BASE + 1, WIN_BASE + 2]);

    tracker.add_own_window(WIN_BASE + 1);
    tracker.refresh_client_list(&ctx).unwrap();

    assert!(tracker.is_own_window(WIN_BASE + 1));
    assert_eq!(tracked(&tracker), vec![WIN_BASE + 2]);
}

#[test]
fn should_clamp_published_desktops() {
    let ctx = fake::context();
    let atoms = &ctx.atoms;
    let mut tracker = WindowTracker::default();

    ctx.conn.set_property32(ctx.root, atoms._NET_NUMBER_OF_DESKTOPS, atoms.CARDINAL, &[4]);
    ctx.conn.set_property32(ctx.root, atoms._NET_CURRENT_DESKTOP, atoms.CARDINAL, &[2]);
    ctx.conn.set_property8(ctx.root, atoms._NET_DESKTOP_NAMES, atoms.UTF8_STRING, b"one\0two\0");

    tracker.refresh_all(&ctx).unwrap();

    assert_eq!(tracker.desktops().count(), 4);
    assert_eq!(tracker.desktops().current(), 2);
    assert_eq!(tracker.desktops().name(1), Some("two"));

    ctx.conn.set_property32(ctx.root, atoms._NET_CURRENT_DESKTOP, atoms.CARDINAL, &[9]);

    let events = tracker.handle_root_property(&ctx, atoms._NET_CURRENT_DESKTOP).unwrap();

    assert_eq!(events, vec![TrackerEvent::CurrentDesktop(0)]);
    assert_eq!(tracker.desktops().current(), 0);
}

#[test]
fn should_pick_up_current_desktop_announced_before_count() {
    let ctx = fake::context();
    let atoms = &ctx.atoms;
    let mut tracker = WindowTracker::default();

    ctx.conn.set_property32(ctx.root, atoms._NET_NUMBER_OF_DESKTOPS, atoms.CARDINAL, &[2]);
    ctx.conn.set_property32(ctx.root, atoms._NET_CURRENT_DESKTOP, atoms.CARDINAL, &[0]);

    tracker.refresh_all(&ctx).unwrap();

    // Window manager switches to a new desktop before growing the count
    ctx.conn.set_property32(ctx.root, atoms._NET_CURRENT_DESKTOP, atoms.CARDINAL, &[3]);

    assert!(tracker.handle_root_property(&ctx, atoms._NET_CURRENT_DESKTOP).unwrap().is_empty());
    assert_eq!(tracker.desktops().current(), 0);

    ctx.conn.set_property32(ctx.root, atoms._NET_NUMBER_OF_DESKTOPS, atoms.CARDINAL, &[4]);

    let events = tracker.handle_root_property(&ctx, atoms._NET_NUMBER_OF_DESKTOPS).unwrap();

    assert_eq!(events, vec![TrackerEvent::DesktopCount(4), TrackerEvent::CurrentDesktop(3)]);
    assert_eq!(tracker.desktops().current(), 3);
}

#[test]
fn should_follow_active_window_and_stacking() {
    let ctx = fake::context();
    let atoms = &ctx.atoms;
    let mut tracker = WindowTracker::default();

    fake::add_client(&ctx, WIN_BASE + 1, "one", 0);
    fake::add_client(&ctx, WIN_BASE + 2, "two", 0);
    fake::set_client_list(&ctx, &[WIN_BASE + 1, WIN_BASE + 2]);

    tracker.add_own_window(WIN_BASE + 9);
    tracker.refresh_all(&ctx).unwrap();

    ctx.conn.set_property32(ctx.root, atoms._NET_ACTIVE_WINDOW, atoms.WINDOW, &[WIN_BASE + 2]);

    assert_eq!(tracker.handle_root_property(&ctx, atoms._NET_ACTIVE_WINDOW).unwrap(),
               vec![TrackerEvent::ActiveWindow(Some(WIN_BASE + 2))]);

    // Panel got focus
    ctx.conn.set_property32(ctx.root, atoms._NET_ACTIVE_WINDOW, atoms.WINDOW, &[WIN_BASE + 9]);

    assert!(tracker.handle_root_property(&ctx, atoms._NET_ACTIVE_WINDOW).unwrap().is_empty());
    assert_eq!(tracker.active(), Some(WIN_BASE + 2));

    ctx.conn.set_property32(ctx.root, atoms._NET_CLIENT_LIST_STACKING, atoms.WINDOW,
                            &[WIN_BASE + 2, WIN_BASE + 7, WIN_BASE + 1]);

    assert_eq!(tracker.handle_root_property(&ctx, atoms._NET_CLIENT_LIST_STACKING).unwrap(),
               vec![TrackerEvent::Stacking]);
    assert_eq!(tracker.stacking(), &[WIN_BASE + 2, WIN_BASE + 1]);
}

#[test]
fn should_read_workarea() {
    let ctx = fake::context();
    let atoms = &ctx.atoms;
    let mut tracker = WindowTracker::default();

    ctx.conn.set_property32(ctx.root, atoms._NET_WORKAREA, atoms.CARDINAL, &[0, 0, 1000, 774, 0, 26, 1000, 774]);

    assert_eq!(tracker.update_workarea(&ctx).unwrap(), vec![TrackerEvent::Workarea]);
    assert_eq!(tracker.workarea(1), Some(&Rect::from((0, 26, 1000, 774))));
    assert_eq!(tracker.workarea(2), None);
}

#[test]
fn should_update_shaded_state_after_toggle() {
    let ctx = fake::context();
    let atoms = &ctx.atoms;
    let mut tracker = WindowTracker::default();
    let win = WIN_BASE + 1;

    fake::add_client(&ctx, win, "one", 0);
    fake::set_client_list(&ctx, &[win]);
    tracker.refresh_client_list(&ctx).unwrap();

    assert!(!tracker.get(win).unwrap().is_shaded());

    message::request_state_change(&ctx, win, atoms._NET_WM_STATE_SHADED, StateAction::Toggle).unwrap();

    // Request alone changes nothing
    assert!(!tracker.get(win).unwrap().is_shaded());

    // Window manager applies the toggle
    ctx.conn.set_property32(win, atoms._NET_WM_STATE, atoms.ATOM, &[atoms._NET_WM_STATE_SHADED]);

    let events = tracker.handle_window_property(&ctx, win, atoms._NET_WM_STATE);

    assert_eq!(events, vec![TrackerEvent::WindowChanged(win, Change::State)]);
    assert!(tracker.get(win).unwrap().is_shaded());
    assert_eq!(tracker.get(win).unwrap().state, WindowState::SHADED);
}

#[test]
fn should_update_single_fields() {
    let ctx = fake::context();
    let atoms = &ctx.atoms;
    let mut tracker = WindowTracker::default();
    let win = WIN_BASE + 1;

    fake::add_client(&ctx, win, "one", 0);
    fake::set_client_list(&ctx, &[win]);
    tracker.refresh_client_list(&ctx).unwrap();

    ctx.conn.set_property8(win, atoms._NET_WM_NAME, atoms.UTF8_STRING, b"renamed");
    ctx.conn.set_property32(win, atoms._NET_WM_DESKTOP, atoms.CARDINAL, &[3]);

    assert_eq!(tracker.handle_window_property(&ctx, win, atoms._NET_WM_NAME),
               vec![TrackerEvent::WindowChanged(win, Change::Title)]);
    assert_eq!(tracker.handle_window_property(&ctx, win, atoms._NET_WM_DESKTOP),
               vec![TrackerEvent::WindowChanged(win, Change::Desktop)]);
    assert!(tracker.handle_window_property(&ctx, win, atoms._NET_WM_DESKTOP).is_empty());
    assert!(tracker.handle_window_property(&ctx, win, atoms._XEMBED).is_empty());

    assert_eq!(tracker.get(win).unwrap().title, "renamed");
    assert_eq!(tracker.get(win).unwrap().desktop, 3);
}

#[test]
fn should_ignore_property_of_vanished_window() {
    let ctx = fake::context();
    let atoms = &ctx.atoms;
    let mut tracker = WindowTracker::default();
    let win = WIN_BASE + 1;

    fake::add_client(&ctx, win, "one", 0);
    fake::set_client_list(&ctx, &[win]);
    tracker.refresh_client_list(&ctx).unwrap();

    ctx.conn.kill_window(win);

    assert!(tracker.handle_window_property(&ctx, win, atoms._NET_WM_NAME).is_empty());
    assert_eq!(tracker.handle_destroy(win), vec![TrackerEvent::WindowRemoved(win)]);
    assert!(tracker.handle_destroy(win).is_empty());
    assert!(tracker.windows().is_empty());
}

#[test]
fn should_follow_geometry() {
    let ctx = fake::context();
    let mut tracker = WindowTracker::default();
    let win = WIN_BASE + 1;

    fake::add_client(&ctx, win, "one", 0);
    fake::set_client_list(&ctx, &[win]);
    tracker.refresh_client_list(&ctx).unwrap();

    let geom = Rect::from((50, 60, 70, 80));

    assert_eq!(tracker.handle_configure(win, geom), vec![TrackerEvent::WindowChanged(win, Change::Geometry)]);
    assert!(tracker.handle_configure(win, geom).is_empty());
    assert_eq!(tracker.get(win).unwrap().geom, geom);
}
