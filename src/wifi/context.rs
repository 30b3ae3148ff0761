//! Session record threaded through every Wi-Fi state handler.
//!
//! The manager writes `elapsed_ms` before each tick; handlers own every
//! other field.  Timers and flags are re-armed by state entry so a
//! re-entered state never resumes stale work.

use crate::app::ports::{CommLayer, SerialPort};
use crate::config::{PASSWORD_MAX_LEN, SSID_MAX_LEN, SystemConfig};
use crate::tick::Delay;

use super::module::{IpString, JoinError, WifiModule};

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WifiSettings {
    pub ssid: heapless::String<SSID_MAX_LEN>,
    pub password: heapless::String<PASSWORD_MAX_LEN>,
    /// Wait between reset attempts and between AP join attempts.
    pub retry_backoff_ms: u32,
    /// How often `CommunicationUpdate` re-queries the station address.
    pub link_check_interval_ms: u32,
}

impl From<&SystemConfig> for WifiSettings {
    fn from(cfg: &SystemConfig) -> Self {
        Self {
            ssid: cfg.wifi_ssid.clone(),
            password: cfg.wifi_password.clone(),
            retry_backoff_ms: cfg.wifi_retry_backoff_ms,
            link_check_interval_ms: cfg.wifi_link_check_interval_ms,
        }
    }
}

// ---------------------------------------------------------------------------
// Context
// ---------------------------------------------------------------------------

pub struct WifiContext<S: SerialPort, L: CommLayer> {
    pub module: WifiModule<S>,
    pub comm: L,
    pub settings: WifiSettings,

    /// Time charged to this tick.
    pub elapsed_ms: u32,

    /// Backoff for reset and join retries.
    pub retry: Delay,
    /// Period of the link supervision query.
    pub link_check: Delay,

    pub reset_sent: bool,
    pub join_sent: bool,
    pub link_check_pending: bool,
    pub comm_ready: bool,

    /// Station address once associated.
    pub ip: Option<IpString>,
    pub last_join_error: Option<JoinError>,
    pub join_attempts: u32,

    /// Reason recorded by the handler that routed to `Fault`.
    pub fault: Option<&'static str>,
}

impl<S: SerialPort, L: CommLayer> WifiContext<S, L> {
    pub fn new(module: WifiModule<S>, comm: L, settings: WifiSettings) -> Self {
        let retry = Delay::new(settings.retry_backoff_ms);
        let link_check = Delay::new(settings.link_check_interval_ms);
        Self {
            module,
            comm,
            settings,
            elapsed_ms: 0,
            retry,
            link_check,
            reset_sent: false,
            join_sent: false,
            link_check_pending: false,
            comm_ready: false,
            ip: None,
            last_join_error: None,
            join_attempts: 0,
            fault: None,
        }
    }

    /// Forget everything learned about the link; used whenever the module
    /// has to be re-detected.
    pub fn forget_link(&mut self) {
        self.ip = None;
        self.last_join_error = None;
        self.join_attempts = 0;
        self.reset_sent = false;
        self.join_sent = false;
        self.link_check_pending = false;
    }
}
