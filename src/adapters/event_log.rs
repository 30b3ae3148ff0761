//! In-memory event history.
//!
//! Keeps the last [`EVENT_LOG_CAPACITY`] events with their uptime stamp;
//! the oldest entry is dropped when full.  Rendering the history as text
//! is left to the console side.

use heapless::Deque;

use crate::app::events::SystemEvent;
use crate::app::ports::{EventSink, TimePort};

pub const EVENT_LOG_CAPACITY: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogEntry {
    pub uptime_ms: u64,
    pub event: SystemEvent,
}

pub struct EventLog<T: TimePort> {
    clock: T,
    entries: Deque<LogEntry, EVENT_LOG_CAPACITY>,
    dropped: u32,
}

impl<T: TimePort> EventLog<T> {
    pub fn new(clock: T) -> Self {
        Self {
            clock,
            entries: Deque::new(),
            dropped: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    pub fn latest(&self) -> Option<&LogEntry> {
        self.entries.back()
    }

    /// Entries discarded to make room since the last [`clear`](Self::clear).
    pub fn dropped(&self) -> u32 {
        self.dropped
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.dropped = 0;
    }
}

impl<T: TimePort> EventSink for EventLog<T> {
    fn notify(&mut self, event: &SystemEvent) {
        let entry = LogEntry {
            uptime_ms: self.clock.uptime_ms(),
            event: *event,
        };
        if self.entries.is_full() {
            self.entries.pop_front();
            self.dropped = self.dropped.saturating_add(1);
        }
        // Cannot fail: a slot was freed above when full.
        let _ = self.entries.push_back(entry);
    }
}
