//! Placeholder data-exchange layer that only reports link lifecycle.
//!
//! Stands in for a real protocol until one is attached; it lets the Wi-Fi
//! bring-up reach and stay in its steady state.

use log::info;

use crate::app::ports::CommLayer;
use crate::error::Result;

#[derive(Debug, Default)]
pub struct LoggingComm {
    active: bool,
    uptime_ms: u64,
}

impl LoggingComm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Time spent with the link up since the last `init`.
    pub fn link_uptime_ms(&self) -> u64 {
        self.uptime_ms
    }
}

impl CommLayer for LoggingComm {
    fn init(&mut self, ip: &str) -> Result<()> {
        info!("comm: link up, station address {}", ip);
        self.active = true;
        self.uptime_ms = 0;
        Ok(())
    }

    fn update(&mut self, elapsed_ms: u32) {
        self.uptime_ms = self.uptime_ms.saturating_add(u64::from(elapsed_ms));
    }

    fn shutdown(&mut self) {
        if self.active {
            info!("comm: link down after {} ms", self.uptime_ms);
        }
        self.active = false;
    }
}
