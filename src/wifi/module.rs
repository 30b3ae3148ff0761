//! ESP8266 request layer: typed requests and classified responses on top
//! of the AT exchange engine.
//!
//! | Request   | Command                      | Success pattern | Other outcomes                  |
//! |-----------|------------------------------|-----------------|---------------------------------|
//! | Detect    | `AT`                         | `OK`            | timeout → not detected          |
//! | Reset     | `AT+RST`                     | `ready`         | timeout → not detected          |
//! | Init      | `AT+CWMODE=1`                | `OK`            | timeout → not detected          |
//! | ApStatus  | `AT+CIFSR`                   | `OK` + STAIP    | `ERROR` / `0.0.0.0` → not conn. |
//! | JoinAp    | `AT+CWJAP="ssid","pass"`     | `OK`, then IP   | `FAIL` + `+CWJAP:n` → error     |
//!
//! A timeout with *no bytes at all* from the module is always reported as
//! [`ModuleResponse::NotDetected`]; a timeout after a partial answer is a
//! request-level failure.

use core::fmt::Write as _;

use log::{info, warn};

use crate::app::ports::SerialPort;
use crate::at::{AtEngine, ExchangeHandle, ExchangeStatus};
use crate::error::AtError;

/// Dotted-quad IPv4 address as reported by the module.
pub type IpString = heapless::String<15>;

const CMD_CAPACITY: usize = 224;

const OK: &[u8] = b"OK\r\n";
const ERROR: &[u8] = b"ERROR\r\n";
const FAIL: &[u8] = b"FAIL\r\n";
const READY: &[u8] = b"ready\r\n";

/// Per-request time budgets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AtTimeouts {
    pub detect_ms: u32,
    pub reset_ms: u32,
    pub init_ms: u32,
    pub status_ms: u32,
    pub join_ms: u32,
}

impl From<&crate::config::SystemConfig> for AtTimeouts {
    fn from(cfg: &crate::config::SystemConfig) -> Self {
        Self {
            detect_ms: cfg.at_detect_timeout_ms,
            reset_ms: cfg.at_reset_timeout_ms,
            init_ms: cfg.at_init_timeout_ms,
            status_ms: cfg.at_status_timeout_ms,
            join_ms: cfg.at_join_timeout_ms,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request<'a> {
    Detect,
    Reset,
    Init,
    ApStatus,
    JoinAp { ssid: &'a str, password: &'a str },
}

/// Why an AP join attempt failed (`+CWJAP:<n>`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinError {
    Timeout,
    WrongPassword,
    ApNotFound,
    ConnectionFailed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleResponse {
    Pending,
    Detected,
    NotDetected,
    ResetComplete,
    InitComplete,
    Connected(IpString),
    NotConnected,
    JoinFailed(JoinError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outstanding {
    Detect,
    Reset,
    Init,
    ApStatus,
    Join,
    /// Join accepted; fetching the address with `AT+CIFSR`.
    JoinAddress,
}

pub struct WifiModule<S: SerialPort> {
    at: AtEngine<S>,
    timeouts: AtTimeouts,
    outstanding: Option<(Outstanding, ExchangeHandle)>,
}

impl<S: SerialPort> WifiModule<S> {
    pub fn new(at: AtEngine<S>, timeouts: AtTimeouts) -> Self {
        Self {
            at,
            timeouts,
            outstanding: None,
        }
    }

    /// Transmit a request.  Fails with [`AtError::Busy`] while another is
    /// outstanding.
    pub fn send(&mut self, request: Request<'_>) -> Result<(), AtError> {
        if self.outstanding.is_some() {
            return Err(AtError::Busy);
        }
        let t = self.timeouts;
        let (kind, handle) = match request {
            Request::Detect => (
                Outstanding::Detect,
                self.at.start(b"AT\r\n", OK, t.detect_ms)?,
            ),
            Request::Reset => (
                Outstanding::Reset,
                self.at.start(b"AT+RST\r\n", READY, t.reset_ms)?,
            ),
            Request::Init => (
                Outstanding::Init,
                self.at.start(b"AT+CWMODE=1\r\n", OK, t.init_ms)?,
            ),
            Request::ApStatus => (Outstanding::ApStatus, self.start_status()?),
            Request::JoinAp { ssid, password } => {
                let cmd = join_command(ssid, password)?;
                info!("wifi: joining '{}'", ssid);
                (
                    Outstanding::Join,
                    self.at.start_any(cmd.as_bytes(), &[OK, FAIL, ERROR], t.join_ms)?,
                )
            }
        };
        self.outstanding = Some((kind, handle));
        Ok(())
    }

    /// Poll the outstanding request.  [`AtError::StaleHandle`] means nothing
    /// was outstanding.
    pub fn poll(&mut self, elapsed_ms: u32) -> Result<ModuleResponse, AtError> {
        let Some((kind, handle)) = self.outstanding else {
            return Err(AtError::StaleHandle);
        };
        let status = self.at.poll(handle, elapsed_ms)?;
        if status == ExchangeStatus::Pending {
            return Ok(ModuleResponse::Pending);
        }
        self.outstanding = None;
        let silent = self.at.bytes_received() == 0;

        let response = match (kind, status) {
            (_, ExchangeStatus::Pending) => ModuleResponse::Pending,
            (_, ExchangeStatus::TimedOut) if silent => ModuleResponse::NotDetected,

            (Outstanding::Detect, ExchangeStatus::Matched { .. }) => ModuleResponse::Detected,
            (Outstanding::Reset, ExchangeStatus::Matched { .. }) => ModuleResponse::ResetComplete,
            (Outstanding::Init, ExchangeStatus::Matched { .. }) => ModuleResponse::InitComplete,
            (Outstanding::Detect | Outstanding::Reset | Outstanding::Init, ExchangeStatus::TimedOut) => {
                ModuleResponse::NotDetected
            }

            (Outstanding::ApStatus, ExchangeStatus::Matched { pattern: 0 }) => {
                match parse_station_ip(self.at.response()) {
                    Some(ip) => ModuleResponse::Connected(ip),
                    None => ModuleResponse::NotConnected,
                }
            }
            (Outstanding::ApStatus, _) => ModuleResponse::NotConnected,

            (Outstanding::Join, ExchangeStatus::Matched { pattern: 0 }) => {
                let handle = self.start_status()?;
                self.outstanding = Some((Outstanding::JoinAddress, handle));
                ModuleResponse::Pending
            }
            (Outstanding::Join, ExchangeStatus::Matched { .. }) => {
                ModuleResponse::JoinFailed(parse_join_failure(self.at.response()))
            }
            (Outstanding::Join, ExchangeStatus::TimedOut) => {
                ModuleResponse::JoinFailed(JoinError::Timeout)
            }

            (Outstanding::JoinAddress, ExchangeStatus::Matched { pattern: 0 }) => {
                match parse_station_ip(self.at.response()) {
                    Some(ip) => ModuleResponse::Connected(ip),
                    None => ModuleResponse::JoinFailed(JoinError::ConnectionFailed),
                }
            }
            (Outstanding::JoinAddress, _) => {
                ModuleResponse::JoinFailed(JoinError::ConnectionFailed)
            }
        };
        Ok(response)
    }

    /// Abandon the outstanding request and flush the transport.
    pub fn reset(&mut self) {
        self.outstanding = None;
        self.at.reset();
    }

    pub fn is_busy(&self) -> bool {
        self.outstanding.is_some()
    }

    pub fn at(&self) -> &AtEngine<S> {
        &self.at
    }

    pub fn at_mut(&mut self) -> &mut AtEngine<S> {
        &mut self.at
    }

    fn start_status(&mut self) -> Result<ExchangeHandle, AtError> {
        self.at
            .start_any(b"AT+CIFSR\r\n", &[OK, ERROR], self.timeouts.status_ms)
    }
}

/// Build `AT+CWJAP="ssid","password"\r\n`, escaping `"`, `,` and `\`.
fn join_command(ssid: &str, password: &str) -> Result<heapless::String<CMD_CAPACITY>, AtError> {
    let mut cmd = heapless::String::new();
    cmd.push_str("AT+CWJAP=\"").map_err(|()| AtError::TooLong)?;
    push_escaped(&mut cmd, ssid)?;
    cmd.push_str("\",\"").map_err(|()| AtError::TooLong)?;
    push_escaped(&mut cmd, password)?;
    cmd.push_str("\"\r\n").map_err(|()| AtError::TooLong)?;
    Ok(cmd)
}

fn push_escaped(out: &mut heapless::String<CMD_CAPACITY>, s: &str) -> Result<(), AtError> {
    for c in s.chars() {
        if matches!(c, '"' | ',' | '\\') {
            out.push('\\').map_err(|()| AtError::TooLong)?;
        }
        out.push(c).map_err(|()| AtError::TooLong)?;
    }
    Ok(())
}

/// Extract the station address from a `+CIFSR:STAIP,"a.b.c.d"` line.
/// `0.0.0.0` (not associated) and malformed addresses yield `None`.
pub fn parse_station_ip(response: &[u8]) -> Option<IpString> {
    const TAG: &[u8] = b"STAIP,\"";
    let start = response
        .windows(TAG.len())
        .position(|w| w == TAG)?
        + TAG.len();
    let rest = &response[start..];
    let end = rest.iter().position(|&b| b == b'"')?;
    let ip = core::str::from_utf8(&rest[..end]).ok()?;

    if ip == "0.0.0.0" || !is_dotted_quad(ip) {
        return None;
    }
    let mut out = IpString::new();
    write!(out, "{ip}").ok()?;
    Some(out)
}

fn is_dotted_quad(s: &str) -> bool {
    let mut parts = 0;
    for part in s.split('.') {
        parts += 1;
        if part.is_empty() || part.len() > 3 || part.parse::<u8>().is_err() {
            return false;
        }
    }
    parts == 4
}

/// Classify a failed join from its `+CWJAP:<n>` line.
pub fn parse_join_failure(response: &[u8]) -> JoinError {
    const TAG: &[u8] = b"+CWJAP:";
    let code = response
        .windows(TAG.len())
        .position(|w| w == TAG)
        .and_then(|p| response.get(p + TAG.len()).copied());
    match code {
        Some(b'1') => JoinError::Timeout,
        Some(b'2') => JoinError::WrongPassword,
        Some(b'3') => JoinError::ApNotFound,
        other => {
            if other.is_none() {
                warn!("wifi: join failed without a reason code");
            }
            JoinError::ConnectionFailed
        }
    }
}
