//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing every [`SystemEvent`] to the
//! logger (UART / USB-CDC in production).  [`Tee`] fans one event out to
//! two sinks so the log and the stored event history both see it.

use log::{info, warn};

use crate::app::events::SystemEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`SystemEvent`] to the serial console.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn notify(&mut self, event: &SystemEvent) {
        match event {
            SystemEvent::Started => info!("EVENT | {}", event.name()),
            SystemEvent::ElementChanged { on: true, .. } => warn!("EVENT | {}", event.name()),
            SystemEvent::ElementChanged { on: false, .. } => info!("EVENT | {}", event.name()),
            SystemEvent::WifiStateChanged(state) => {
                info!("EVENT | {} ({:?})", event.name(), state);
            }
        }
    }
}

/// Delivers each event to `A`, then `B`.
pub struct Tee<A, B>(pub A, pub B);

impl<A: EventSink, B: EventSink> EventSink for Tee<A, B> {
    fn notify(&mut self, event: &SystemEvent) {
        self.0.notify(event);
        self.1.notify(event);
    }
}
