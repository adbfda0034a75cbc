///
/// @package lxpanel-rs
///
/// @file Desktop functions
/// @copyright 2025-present Christoph Kappel <christoph@unexist.dev>
/// @version $Id$
///
/// This program can be distributed under the terms of the GNU GPLv3.
/// See the file LICENSE for details.
///

use std::fmt;
use easy_min_max::{clamp, max, min};
use itertools::Itertools;

/// Upper bound of desktops we keep track of
pub(crate) const MAX_DESKTOPS: u32 = 20;

/// Virtual desktops as published by the window manager
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DesktopSet {
    count: u32,
    current: u32,
    names: Vec<String>,
}

impl DesktopSet {
    pub(crate) fn count(&self) -> u32 {
        self.count
    }

    /// Index of the current desktop, always below [`DesktopSet::count`]
    pub(crate) fn current(&self) -> u32 {
        self.current
    }

    /// Name of the desktop if the window manager published a non-empty one
    pub(crate) fn name(&self, idx: u32) -> Option<&str> {
        self.names.get(idx as usize)
            .map(String::as_str)
            .filter(|name| !name.is_empty())
    }

    /// Set number of desktops
    ///
    /// # Arguments
    ///
    /// * `count` - Number of desktops, clamped to `[1, MAX_DESKTOPS]`
    ///
    /// # Returns
    ///
    /// Either `true` when anything changed or otherwise `false`
    pub(crate) fn set_count(&mut self, count: u32) -> bool {
        let count = clamp!(count, 1, MAX_DESKTOPS);
        let changed = count != self.count;

        self.count = count;

        // Keep current index valid
        if self.current >= self.count {
            self.current = 0;
        }

        changed
    }

    /// Set current desktop; out of range values select the first desktop
    pub(crate) fn set_current(&mut self, current: u32) -> bool {
        let current = if current < self.count { current } else { 0 };
        let changed = current != self.current;

        self.current = current;

        changed
    }

    pub(crate) fn set_names(&mut self, names: Vec<String>) -> bool {
        let changed = names != self.names;

        self.names = names;

        changed
    }
}

impl Default for DesktopSet {
    fn default() -> Self {
        Self {
            count: 1,
            current: 0,
            names: Vec::new(),
        }
    }
}

impl fmt::Display for DesktopSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "count={}, current={}, names=[{}]", self.count, self.current, self.names.iter().join(", "))
    }
}
