///
/// @package lxpanel-rs
///
/// @file Rect functions
/// @copyright 2025-present Christoph Kappel <christoph@unexist.dev>
/// @version $Id$
///
/// This program can be distributed under the terms of the GNU GPLv3.
/// See the file LICENSE for details.
///

use std::fmt;

#[derive(Default, Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) struct Rect {
    pub x: i16,
    pub y: i16,
    pub width: u16,
    pub height: u16,
}

impl Rect {
    /// Right edge, exclusive
    pub(crate) fn end_x(&self) -> i32 {
        i32::from(self.x) + i32::from(self.width)
    }

    /// Bottom edge, exclusive
    pub(crate) fn end_y(&self) -> i32 {
        i32::from(self.y) + i32::from(self.height)
    }
}

impl fmt::Display for Rect {
    /// Geometry string like `xwininfo` prints it
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}{:+}{:+}", self.width, self.height, self.x, self.y)
    }
}

impl From<(i16, i16, u16, u16)> for Rect {
    fn from((x, y, width, height): (i16, i16, u16, u16)) -> Self {
        Self { x, y, width, height }
    }
}

impl From<&[u32]> for Rect {
    /// Read a `_NET_WORKAREA` style quadruple, missing values are zero
    fn from(values: &[u32]) -> Self {
        let value = |idx: usize| values.get(idx).copied().unwrap_or_default();

        Self {
            x: value(0) as i16,
            y: value(1) as i16,
            width: value(2) as u16,
            height: value(3) as u16,
        }
    }
}
