///
/// @package lxpanel-rs
///
/// @file Command tests
/// @copyright 2025-present Christoph Kappel <christoph@unexist.dev>
/// @version $Id$
///
/// This program can be distributed under the terms of the GNU GPLv3.
/// See the file LICENSE for details.
///

use proptest::prelude::*;
use x11rb::protocol::xproto::EventMask;
use crate::command;
use crate::command::{ControlMessage, PanelAction, PanelCommand, MESSAGE_SIZE, PAYLOAD_SIZE};
use crate::ewmh::{WindowState, ALL_DESKTOPS};
use crate::tests::fake;

#[test]
fn should_parse_plain_commands() {
    let msg = ControlMessage::parse("restart").unwrap();

    assert_eq!(msg.command, PanelCommand::Restart);
    assert!(msg.payload.is_empty());
    assert_eq!(msg.to_string(), "restart");

    assert_eq!(ControlMessage::parse("  exit ").unwrap().command, PanelCommand::Exit);
    assert_eq!(ControlMessage::parse("menu").unwrap().command, PanelCommand::SysMenu);
    assert_eq!(ControlMessage::parse("config").unwrap().command, PanelCommand::Config);
}

#[test]
fn should_parse_actions_with_and_without_prefix() {
    let prefixed = ControlMessage::parse("command desktop 2").unwrap();
    let bare = ControlMessage::parse("desktop   2").unwrap();

    assert_eq!(prefixed, bare);
    assert_eq!(bare.command, PanelCommand::Command);
    assert_eq!(bare.payload, "desktop 2");
    assert_eq!(bare.to_string(), "command desktop 2");
    assert_eq!(bare.action().unwrap(), PanelAction::Desktop(2));
}

#[test]
fn should_parse_window_ids() {
    assert_eq!(PanelAction::try_from("raise 0x1A").unwrap(), PanelAction::Raise(26));
    assert_eq!(PanelAction::try_from("close 4194305").unwrap(), PanelAction::Close(0x0040_0001));
    assert_eq!(PanelAction::try_from("wmclose 0x10").unwrap(), PanelAction::WmClose(16));
    assert_eq!(PanelAction::try_from("shade 7").unwrap(), PanelAction::Toggle(7, WindowState::SHADED));
    assert_eq!(PanelAction::try_from("stick 7").unwrap(), PanelAction::Toggle(7, WindowState::STICKY));
    assert_eq!(PanelAction::try_from("move 7 -1").unwrap(), PanelAction::Move(7, ALL_DESKTOPS));
    assert_eq!(PanelAction::try_from("move 7 all").unwrap(), PanelAction::Move(7, ALL_DESKTOPS));
    assert_eq!(PanelAction::try_from("move 7 2").unwrap(), PanelAction::Move(7, 2));
}

#[test]
fn should_reject_invalid_commands() {
    assert!(ControlMessage::parse("").is_err());
    assert!(ControlMessage::parse("dance").is_err());
    assert!(ControlMessage::parse("close xyz").is_err());
    assert!(ControlMessage::parse("desktop -2").is_err());
    assert!(ControlMessage::parse("raise").is_err());

    // Does not fit into a single message
    assert!(ControlMessage::parse("move 0x00400001 -1").is_err());
}

#[test]
fn should_encode_into_message_data() {
    let msg = ControlMessage::parse("desktop 2").unwrap();
    let data = msg.encode();

    assert_eq!(data[0], PanelCommand::Command as u8);
    assert_eq!(data[1], 0);
    assert_eq!(&data[2..11], b"desktop 2");
    assert!(data[11..].iter().all(|b| 0 == *b));

    assert_eq!(ControlMessage::decode(&data), Some(msg));
}

#[test]
fn should_ignore_unknown_command_byte() {
    let mut data = [0u8; MESSAGE_SIZE];

    data[0] = 42;

    assert!(ControlMessage::decode(&data).is_none());
}

#[test]
fn should_send_to_root_window() {
    let ctx = fake::context();
    let msg = ControlMessage::parse("exit").unwrap();

    command::send(&ctx.conn, ctx.atoms._LXPANEL_CMD, &msg).unwrap();

    let sent = ctx.conn.sent_of_type(ctx.atoms._LXPANEL_CMD);

    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].dest, ctx.root);
    assert_eq!(sent[0].mask, u32::from(EventMask::SUBSTRUCTURE_NOTIFY | EventMask::SUBSTRUCTURE_REDIRECT));
    assert_eq!(sent[0].event.format, 8);
    assert_eq!(sent[0].event.data.as_data8(), msg.encode());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(5))]

    #[test]
    fn should_keep_desktop_through_message(idx in 0u32..99_999) {
        let msg = ControlMessage::parse(&format!("desktop {}", idx)).unwrap();

        prop_assert!(msg.payload.len() <= PAYLOAD_SIZE);

        let decoded = ControlMessage::decode(&msg.encode()).unwrap();

        prop_assert_eq!(decoded.action().unwrap(), PanelAction::Desktop(idx));
    }
}
