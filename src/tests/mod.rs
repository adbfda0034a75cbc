///
/// @package lxpanel-rs
///
/// @file Tests
/// @copyright (c) 2025-present Christoph Kappel <christoph@unexist.dev>
/// @version $Id$
///
/// This program can be distributed under the terms of the GNU GPLv3.
/// See the file LICENSE for details.
///

mod strut_test;
mod client_test;
mod tracker_test;
mod panel_test;
mod command_test;
