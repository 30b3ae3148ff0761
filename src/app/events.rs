//! Outbound application events.
//!
//! The [`AppService`](super::service::AppService) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Events are pure data; the
//! adapters on the other side decide whether to log, store or transmit
//! them.

use crate::wifi::states::WifiState;

/// Alarm-node element whose on/off state is reported on change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Element {
    Alarm,
    GasDetector,
    OverTemp,
    IncorrectCodeLed,
    SystemBlockedLed,
}

/// Number of reported elements.
pub const ELEMENT_COUNT: usize = 5;

impl Element {
    pub const ALL: [Element; ELEMENT_COUNT] = [
        Self::Alarm,
        Self::GasDetector,
        Self::OverTemp,
        Self::IncorrectCodeLed,
        Self::SystemBlockedLed,
    ];

    fn on_name(self) -> &'static str {
        match self {
            Self::Alarm => "ALARM_ON",
            Self::GasDetector => "GAS_DET_ON",
            Self::OverTemp => "OVER_TEMP_ON",
            Self::IncorrectCodeLed => "LED_IC_ON",
            Self::SystemBlockedLed => "LED_SB_ON",
        }
    }

    fn off_name(self) -> &'static str {
        match self {
            Self::Alarm => "ALARM_OFF",
            Self::GasDetector => "GAS_DET_OFF",
            Self::OverTemp => "OVER_TEMP_OFF",
            Self::IncorrectCodeLed => "LED_IC_OFF",
            Self::SystemBlockedLed => "LED_SB_OFF",
        }
    }
}

/// Structured events emitted by the application core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemEvent {
    /// The service has started.
    Started,

    /// An element changed between on and off.
    ElementChanged { element: Element, on: bool },

    /// The Wi-Fi bring-up machine entered a new state.
    WifiStateChanged(WifiState),
}

impl SystemEvent {
    /// Stable event name, e.g. `ALARM_ON`, `GAS_DET_OFF`,
    /// `WIFI_MODULE_INIT`.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Started => "SYSTEM_START",
            Self::ElementChanged { element, on: true } => element.on_name(),
            Self::ElementChanged { element, on: false } => element.off_name(),
            Self::WifiStateChanged(state) => state.event_name(),
        }
    }
}

impl core::fmt::Display for SystemEvent {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}
