//! Inbound commands to the application service.
//!
//! These are the requests a console (serial line, remote client) may make.
//! Parsing and rendering stay on the adapter side; the
//! [`AppService`](super::service::AppService) only answers through the
//! alarm's public accessors.

use crate::alarm::CodeCheck;
use crate::alarm::code::CodeBuffer;
use crate::wifi::module::IpString;
use crate::wifi::states::WifiState;

/// Commands that external adapters can send into the application core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppCommand {
    ReadAlarm,
    ReadGasDetector,
    ReadOverTemp,
    ReadTemperature,
    /// Compare a code entered on the console.
    SubmitCode(CodeBuffer),
    /// Replace the deactivation code (persisted on the next auto-save).
    WriteCode(CodeBuffer),
    /// Clear lockout and the incorrect-code indicator.
    AdminReset,
    ReadWifiState,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CommandResponse {
    Alarm { active: bool, locked_out: bool },
    GasDetector(bool),
    OverTemp(bool),
    Temperature { celsius: f32, fahrenheit: f32 },
    Code(CodeCheck),
    Done,
    Wifi { state: WifiState, ip: Option<IpString> },
    /// No Wi-Fi module is attached.
    WifiAbsent,
}
