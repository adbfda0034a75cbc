///
/// @package lxpanel-rs
///
/// @file Panel tests
/// @copyright 2025-present Christoph Kappel <christoph@unexist.dev>
/// @version $Id$
///
/// This program can be distributed under the terms of the GNU GPLv3.
/// See the file LICENSE for details.
///

use crate::ewmh::ALL_DESKTOPS;
use crate::geometry::{Edge, PanelConfig, PanelConfigBuilder};
use crate::panel::{Panel, PanelState};
use crate::rect::Rect;
use crate::tests::fake;

#[test]
fn should_create_dock_window() {
    let ctx = fake::context();
    let atoms = &ctx.atoms;

    let panel = Panel::new(&ctx, PanelConfig::default()).unwrap();

    assert_eq!(panel.state, PanelState::Unconfigured);
    assert_eq!(ctx.conn.property32(panel.win, atoms._NET_WM_WINDOW_TYPE),
               Some(vec![atoms._NET_WM_WINDOW_TYPE_DOCK]));
    assert_eq!(ctx.conn.property32(panel.win, atoms._NET_WM_DESKTOP), Some(vec![ALL_DESKTOPS]));
    assert_eq!(ctx.conn.property8(panel.win, atoms._NET_WM_NAME), Some(b"lxpanel".to_vec()));

    let state = ctx.conn.property32(panel.win, atoms._NET_WM_STATE).unwrap();

    assert!(state.contains(&atoms._NET_WM_STATE_SKIP_TASKBAR));
    assert!(state.contains(&atoms._NET_WM_STATE_STICKY));
}

#[test]
fn should_place_panel_and_publish_strut() {
    let ctx = fake::context();
    let atoms = &ctx.atoms;

    let mut panel = Panel::new(&ctx, PanelConfig::default()).unwrap();

    panel.configure(&ctx).unwrap();

    let window = ctx.conn.window(panel.win).unwrap();

    assert_eq!(panel.state, PanelState::StrutPublished);
    assert_eq!(panel.geom, Rect::from((0, 774, 1000, 26)));
    assert_eq!(window.geom, panel.geom);
    assert!(window.mapped);
    assert_eq!(ctx.conn.property32(panel.win, atoms._NET_WM_STRUT), Some(vec![0, 0, 0, 26]));
    assert_eq!(panel.local_area(), Rect::from((0, 0, 1000, 26)));
}

#[test]
fn should_republish_strut_on_config_change() {
    let ctx = fake::context();
    let atoms = &ctx.atoms;

    let mut panel = Panel::new(&ctx, PanelConfig::default()).unwrap();

    panel.configure(&ctx).unwrap();

    let config = PanelConfigBuilder::default()
        .edge(Edge::Top)
        .height(30)
        .build()
        .unwrap();

    panel.set_config(&ctx, config).unwrap();

    assert_eq!(panel.geom, Rect::from((0, 0, 1000, 30)));
    assert_eq!(ctx.conn.property32(panel.win, atoms._NET_WM_STRUT), Some(vec![0, 0, 30, 0]));
    assert_eq!(panel.strut().map(|strut| strut.edge), Some(Edge::Top));
}

#[test]
fn should_remove_strut_when_disabled() {
    let ctx = fake::context();
    let atoms = &ctx.atoms;

    let mut panel = Panel::new(&ctx, PanelConfig::default()).unwrap();

    panel.configure(&ctx).unwrap();

    let config = PanelConfigBuilder::default()
        .strut(false)
        .build()
        .unwrap();

    panel.set_config(&ctx, config).unwrap();

    assert!(ctx.conn.property32(panel.win, atoms._NET_WM_STRUT_PARTIAL).is_none());
    assert!(panel.strut().is_some_and(|strut| strut.is_empty()));
}

#[test]
fn should_follow_screen_size() {
    let ctx = fake::context();

    let mut panel = Panel::new(&ctx, PanelConfig::default()).unwrap();

    panel.configure(&ctx).unwrap();
    panel.set_screen_size(&ctx, 1280, 1024).unwrap();

    assert_eq!(panel.geom, Rect::from((0, 998, 1280, 26)));
    assert_eq!(ctx.conn.window(panel.win).unwrap().geom, panel.geom);
}

#[test]
fn should_destroy_window_on_finish() {
    let ctx = fake::context();

    let panel = Panel::new(&ctx, PanelConfig::default()).unwrap();

    panel.finish(&ctx).unwrap();

    assert!(ctx.conn.window(panel.win).is_none());
}
