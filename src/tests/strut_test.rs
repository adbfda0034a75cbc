///
/// @package lxpanel-rs
///
/// @file Strut tests
/// @copyright 2025-present Christoph Kappel <christoph@unexist.dev>
/// @version $Id$
///
/// This program can be distributed under the terms of the GNU GPLv3.
/// See the file LICENSE for details.
///

use proptest::prelude::*;
use crate::geometry::Edge;
use crate::rect::Rect;
use crate::strut::PanelStrut;
use crate::tests::fake;

#[test]
fn should_reserve_bottom_edge() {
    let strut = PanelStrut::new(Edge::Bottom, &Rect::from((0, 774, 1000, 26)), 1000, 800);

    assert_eq!(strut.size, 26);
    assert_eq!(strut.to_partial(), [0, 0, 0, 26, 0, 0, 0, 0, 0, 0, 0, 999]);
    assert_eq!(strut.to_legacy(), [0, 0, 0, 26]);
}

#[test]
fn should_reserve_partial_top_edge() {
    let strut = PanelStrut::new(Edge::Top, &Rect::from((10, 0, 500, 26)), 1000, 800);

    assert_eq!(strut.to_partial(), [0, 0, 26, 0, 0, 0, 0, 0, 10, 509, 0, 0]);
}

#[test]
fn should_reserve_vertical_edges() {
    let left = PanelStrut::new(Edge::Left, &Rect::from((0, 100, 30, 600)), 1000, 800);
    let right = PanelStrut::new(Edge::Right, &Rect::from((970, 0, 30, 800)), 1000, 800);

    assert_eq!(left.to_partial(), [30, 0, 0, 0, 100, 699, 0, 0, 0, 0, 0, 0]);
    assert_eq!(right.to_partial(), [0, 30, 0, 0, 0, 0, 0, 799, 0, 0, 0, 0]);
}

#[test]
fn should_encode_empty_strut_as_zeros() {
    let strut = PanelStrut {
        edge: Edge::Top,
        ..PanelStrut::default()
    };

    assert!(strut.is_empty());
    assert_eq!(strut.to_partial(), [0; 12]);
}

#[test]
fn should_publish_and_remove_properties() {
    let ctx = fake::context();
    let win = 0x0040_0001;

    ctx.conn.add_window(win, Rect::from((0, 774, 1000, 26)));

    let strut = PanelStrut::new(Edge::Bottom, &Rect::from((0, 774, 1000, 26)), 1000, 800);

    strut.publish(&ctx, win).unwrap();

    assert_eq!(ctx.conn.property32(win, ctx.atoms._NET_WM_STRUT_PARTIAL),
               Some(strut.to_partial().to_vec()));
    assert_eq!(ctx.conn.property32(win, ctx.atoms._NET_WM_STRUT), Some(vec![0, 0, 0, 26]));

    PanelStrut::default().publish(&ctx, win).unwrap();

    assert!(ctx.conn.property32(win, ctx.atoms._NET_WM_STRUT_PARTIAL).is_none());
    assert!(ctx.conn.property32(win, ctx.atoms._NET_WM_STRUT).is_none());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(5))]
    #[test]
    fn should_set_only_own_edge(x in 0i16..500, width in 1u16..500, height in 16u16..200, edge_idx in 0usize..4) {
        let edge = [Edge::Left, Edge::Right, Edge::Top, Edge::Bottom][edge_idx];
        let geom = if edge.is_horizontal() {
            Rect::from((x, 0, width, height))
        } else {
            Rect::from((0, x, height, width))
        };

        let partial = PanelStrut::new(edge, &geom, 1000, 1000).to_partial();

        for idx in 0..4 {
            if idx == edge.strut_index() {
                prop_assert!(0 < partial[idx]);
                prop_assert!(partial[4 + idx * 2] <= partial[5 + idx * 2]);
            } else {
                prop_assert_eq!(partial[idx], 0);
                prop_assert_eq!(partial[4 + idx * 2], 0);
                prop_assert_eq!(partial[5 + idx * 2], 0);
            }
        }
    }
}
