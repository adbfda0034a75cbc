///
/// @package lxpanel-rs
///
/// @file Balloon functions
/// @copyright 2025-present Christoph Kappel <christoph@unexist.dev>
/// @version $Id$
///
/// This program can be distributed under the terms of the GNU GPLv3.
/// See the file LICENSE for details.
///

use std::collections::VecDeque;
use std::fmt;
use std::time::{Duration, Instant};
use easy_min_max::min;
use log::debug;
use stdext::function_name;
use x11rb::protocol::xproto::Window;

/// Payload of a single `_NET_SYSTEM_TRAY_MESSAGE_DATA` event
pub(crate) const CHUNK_SIZE: usize = 20;

/// Initial buffer size, senders might announce silly lengths
const PREALLOC_LIMIT: usize = 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct BalloonMessage {
    /// Tray icon that sent the message
    pub(crate) win: Window,
    pub(crate) id: u32,
    /// Display time, zero for no timeout
    pub(crate) timeout: Duration,
    length: usize,
    remaining: usize,
    text: Vec<u8>,
}

impl BalloonMessage {
    pub(crate) fn new(win: Window, timeout_ms: u32, length: u32, id: u32) -> Self {
        Self {
            win,
            id,
            timeout: Duration::from_millis(u64::from(timeout_ms)),
            length: length as usize,
            remaining: length as usize,
            text: Vec::with_capacity(min!(length as usize, PREALLOC_LIMIT)),
        }
    }

    pub(crate) fn is_complete(&self) -> bool {
        0 == self.remaining
    }

    pub(crate) fn text(&self) -> String {
        String::from_utf8_lossy(&self.text).to_string()
    }

    /// Append the next chunk
    fn append(&mut self, chunk: &[u8]) {
        let len = min!(min!(self.remaining, CHUNK_SIZE), chunk.len());

        self.text.extend_from_slice(&chunk[..len]);
        self.remaining -= len;
    }
}

impl fmt::Display for BalloonMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "win={}, id={}, timeout={:?}, length={}, remaining={}",
               self.win, self.id, self.timeout, self.length, self.remaining)
    }
}

/// Balloon messages waiting for data and waiting for display
///
/// The head of the queue is the message on display. All methods that may
/// change the head return `true` when a new message is on display.
#[derive(Default, Debug)]
pub(crate) struct BalloonQueue {
    incomplete: Vec<BalloonMessage>,
    queue: VecDeque<BalloonMessage>,
    deadline: Option<Instant>,
}

impl BalloonQueue {
    /// Message on display
    pub(crate) fn current(&self) -> Option<&BalloonMessage> {
        self.queue.front()
    }

    pub(crate) fn len(&self) -> usize {
        self.queue.len()
    }

    pub(crate) fn pending(&self) -> usize {
        self.incomplete.len()
    }

    /// Time when the message on display expires
    pub(crate) fn next_deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Start a new message, an unfinished one with the same id is replaced
    ///
    /// # Arguments
    ///
    /// * `msg` - New message
    /// * `now` - Current time
    ///
    /// # Returns
    ///
    /// Either `true` when the message went on display or otherwise `false`
    pub(crate) fn begin(&mut self, msg: BalloonMessage, now: Instant) -> bool {
        self.incomplete.retain(|pending| !(pending.win == msg.win && pending.id == msg.id));

        debug!("{}: msg={}", function_name!(), msg);

        // Nothing follows for empty messages
        if msg.is_complete() {
            return self.push(msg, now);
        }

        self.incomplete.push(msg);

        false
    }

    /// Add data to the unfinished message of the window
    ///
    /// # Arguments
    ///
    /// * `win` - Sender of the data
    /// * `chunk` - Data of the event
    /// * `docked` - Whether the sender is still docked
    /// * `now` - Current time
    ///
    /// # Returns
    ///
    /// Either `true` when the finished message went on display or otherwise `false`
    pub(crate) fn append(&mut self, win: Window, chunk: &[u8], docked: bool, now: Instant) -> bool {
        let Some(idx) = self.incomplete.iter().position(|msg| msg.win == win) else {
            return false;
        };

        self.incomplete[idx].append(chunk);

        if !self.incomplete[idx].is_complete() {
            return false;
        }

        let msg = self.incomplete.remove(idx);

        // Sender left while sending
        if !docked {
            return false;
        }

        self.push(msg, now)
    }

    /// Drop every unfinished message of the window and the queued ones with that id
    pub(crate) fn cancel(&mut self, win: Window, id: u32, now: Instant) -> bool {
        self.incomplete.retain(|msg| msg.win != win);

        self.remove_queued(|msg| msg.win == win && msg.id == id, now)
    }

    /// Drop all messages of a window
    pub(crate) fn remove_window(&mut self, win: Window, now: Instant) -> bool {
        self.incomplete.retain(|msg| msg.win != win);

        self.remove_queued(|msg| msg.win == win, now)
    }

    /// Advance when the message on display timed out
    pub(crate) fn expire(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if deadline <= now => {
                self.queue.pop_front();

                self.show(now)
            },
            _ => false,
        }
    }

    pub(crate) fn clear(&mut self) {
        self.incomplete.clear();
        self.queue.clear();
        self.deadline = None;
    }

    fn push(&mut self, msg: BalloonMessage, now: Instant) -> bool {
        self.queue.push_back(msg);

        if 1 == self.queue.len() {
            return self.show(now);
        }

        false
    }

    fn remove_queued(&mut self, pred: impl Fn(&BalloonMessage) -> bool, now: Instant) -> bool {
        let head_removed = self.queue.front().is_some_and(&pred);

        self.queue.retain(|msg| !pred(msg));

        if head_removed {
            return self.show(now);
        }

        false
    }

    /// Arm the timeout of the new head
    fn show(&mut self, now: Instant) -> bool {
        self.deadline = self.queue.front()
            .filter(|msg| !msg.timeout.is_zero())
            .map(|msg| now + msg.timeout);

        self.queue.front().is_some()
    }
}
