//! AT exchange engine: send a command, match the reply, never block.
//!
//! ```text
//!  start(cmd, pattern, timeout) ──▶ UART TX
//!                                      ·
//!  poll(handle, elapsed) ◀── UART RX ──┘   (≤ byte budget per call)
//!        │
//!        ├── Pending    (no full match yet, time left)
//!        ├── Matched    (contiguous run equal to a pattern)
//!        └── TimedOut   (accumulated time ≥ timeout)
//! ```
//!
//! One exchange may be outstanding per transport.  Starting another while
//! one is pending is rejected with [`AtError::Busy`]; a caller that wants
//! to abandon an exchange calls [`AtEngine::reset`], which also discards
//! any unread input so a late reply cannot satisfy the next exchange.
//!
//! Matching is strictly contiguous: a byte that breaks a partial match
//! resets the matched length to zero and is not reconsidered, so
//! `"OOK\r\n"` does not match `"OK\r\n"`.

use log::{debug, warn};

use crate::app::ports::SerialPort;
use crate::error::AtError;
use crate::tick::Timer;

/// Longest expected pattern.
pub const MAX_PATTERN_LEN: usize = 32;
/// Alternative patterns per exchange (e.g. `OK` / `FAIL`).
pub const MAX_PATTERNS: usize = 3;
/// Response bytes retained for parsing after the exchange ends.
pub const CAPTURE_LEN: usize = 256;

// ───────────────────────────────────────────────────────────────
// Pattern matcher
// ───────────────────────────────────────────────────────────────

/// Incremental contiguous-run matcher for one byte pattern.
#[derive(Debug, Clone)]
pub struct PatternMatcher {
    pattern: heapless::Vec<u8, MAX_PATTERN_LEN>,
    matched: usize,
}

impl PatternMatcher {
    pub fn new(pattern: &[u8]) -> Result<Self, AtError> {
        if pattern.is_empty() {
            return Err(AtError::EmptyPattern);
        }
        let pattern = heapless::Vec::from_slice(pattern).map_err(|()| AtError::TooLong)?;
        Ok(Self {
            pattern,
            matched: 0,
        })
    }

    /// Feed one received byte.  Returns `true` when the pattern completes.
    pub fn feed(&mut self, byte: u8) -> bool {
        if byte == self.pattern[self.matched] {
            self.matched += 1;
        } else {
            self.matched = 0;
        }
        if self.matched == self.pattern.len() {
            self.matched = 0;
            return true;
        }
        false
    }

    pub fn matched_len(&self) -> usize {
        self.matched
    }

    pub fn reset(&mut self) {
        self.matched = 0;
    }
}

// ───────────────────────────────────────────────────────────────
// Exchange
// ───────────────────────────────────────────────────────────────

/// Result of polling an exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeStatus {
    Pending,
    /// Index of the pattern that matched, in the order given at start.
    Matched { pattern: usize },
    TimedOut,
}

/// Opaque ticket for the outstanding exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExchangeHandle(u32);

/// One request's matching state and time budget.
#[derive(Debug, Clone)]
pub struct Exchange {
    matchers: heapless::Vec<PatternMatcher, MAX_PATTERNS>,
    timer: Timer,
    timeout_ms: u32,
}

impl Exchange {
    pub fn new(patterns: &[&[u8]], timeout_ms: u32) -> Result<Self, AtError> {
        if patterns.is_empty() {
            return Err(AtError::EmptyPattern);
        }
        let mut matchers = heapless::Vec::new();
        for p in patterns {
            matchers
                .push(PatternMatcher::new(p)?)
                .map_err(|_| AtError::TooLong)?;
        }
        Ok(Self {
            matchers,
            timer: Timer::new(),
            timeout_ms,
        })
    }

    /// Offer one byte to every pattern; first completion wins.
    pub fn feed(&mut self, byte: u8) -> Option<usize> {
        let mut hit = None;
        for (i, m) in self.matchers.iter_mut().enumerate() {
            if m.feed(byte) && hit.is_none() {
                hit = Some(i);
            }
        }
        hit
    }

    /// Charge elapsed time.  Returns `true` once the budget is spent.
    pub fn advance(&mut self, elapsed_ms: u32) -> bool {
        self.timer.accumulate(elapsed_ms);
        self.timer.reached(self.timeout_ms)
    }

    /// Single-byte poll: the byte (if any) is matched before time is charged.
    pub fn poll(&mut self, byte: Option<u8>, elapsed_ms: u32) -> ExchangeStatus {
        if let Some(pattern) = byte.and_then(|b| self.feed(b)) {
            return ExchangeStatus::Matched { pattern };
        }
        if self.advance(elapsed_ms) {
            ExchangeStatus::TimedOut
        } else {
            ExchangeStatus::Pending
        }
    }

    pub fn longest_partial_match(&self) -> usize {
        self.matchers
            .iter()
            .map(PatternMatcher::matched_len)
            .max()
            .unwrap_or(0)
    }
}

// ───────────────────────────────────────────────────────────────
// Engine
// ───────────────────────────────────────────────────────────────

/// Owns the serial transport and at most one outstanding [`Exchange`].
pub struct AtEngine<S: SerialPort> {
    port: S,
    active: Option<(ExchangeHandle, Exchange)>,
    next_id: u32,
    capture: heapless::Vec<u8, CAPTURE_LEN>,
    bytes_received: usize,
    bytes_per_poll: usize,
}

impl<S: SerialPort> AtEngine<S> {
    pub fn new(port: S, bytes_per_poll: u16) -> Self {
        Self {
            port,
            active: None,
            next_id: 1,
            capture: heapless::Vec::new(),
            bytes_received: 0,
            bytes_per_poll: usize::from(bytes_per_poll.max(1)),
        }
    }

    /// Transmit `command` and wait for `pattern`.
    pub fn start(
        &mut self,
        command: &[u8],
        pattern: &[u8],
        timeout_ms: u32,
    ) -> Result<ExchangeHandle, AtError> {
        self.start_any(command, &[pattern], timeout_ms)
    }

    /// Transmit `command` and wait for whichever of `patterns` arrives first.
    pub fn start_any(
        &mut self,
        command: &[u8],
        patterns: &[&[u8]],
        timeout_ms: u32,
    ) -> Result<ExchangeHandle, AtError> {
        if self.active.is_some() {
            return Err(AtError::Busy);
        }
        let exchange = Exchange::new(patterns, timeout_ms)?;
        let handle = ExchangeHandle(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);

        self.capture.clear();
        self.bytes_received = 0;
        self.port.write(command);
        debug!("AT >> {}", Printable(command));

        self.active = Some((handle, exchange));
        Ok(handle)
    }

    /// Drain up to the per-poll byte budget, then charge `elapsed_ms`.
    /// A terminal status ends the exchange.
    pub fn poll(
        &mut self,
        handle: ExchangeHandle,
        elapsed_ms: u32,
    ) -> Result<ExchangeStatus, AtError> {
        let Some((active, exchange)) = self.active.as_mut() else {
            return Err(AtError::StaleHandle);
        };
        if *active != handle {
            return Err(AtError::StaleHandle);
        }

        for _ in 0..self.bytes_per_poll {
            let Some(byte) = self.port.try_read_byte() else {
                break;
            };
            self.bytes_received += 1;
            // Capture overflow only truncates what parsers can see.
            let _ = self.capture.push(byte);
            if let Some(pattern) = exchange.feed(byte) {
                debug!("AT << {}", Printable(&self.capture));
                self.active = None;
                return Ok(ExchangeStatus::Matched { pattern });
            }
        }

        if exchange.advance(elapsed_ms) {
            debug!(
                "AT timeout after {} bytes: {}",
                self.bytes_received,
                Printable(&self.capture)
            );
            self.active = None;
            return Ok(ExchangeStatus::TimedOut);
        }
        Ok(ExchangeStatus::Pending)
    }

    /// Abandon any outstanding exchange and discard unread input.
    pub fn reset(&mut self) {
        if self.active.take().is_some() {
            debug!("AT exchange abandoned");
        }
        let mut flushed = 0usize;
        while self.port.try_read_byte().is_some() {
            flushed += 1;
            if flushed >= CAPTURE_LEN {
                warn!("AT reset: RX still streaming after {} bytes", flushed);
                break;
            }
        }
        self.capture.clear();
        self.bytes_received = 0;
    }

    pub fn is_busy(&self) -> bool {
        self.active.is_some()
    }

    /// Bytes seen by the current (or most recent) exchange.
    pub fn response(&self) -> &[u8] {
        &self.capture
    }

    /// Bytes received since the current (or most recent) exchange started.
    pub fn bytes_received(&self) -> usize {
        self.bytes_received
    }

    pub fn port(&self) -> &S {
        &self.port
    }

    pub fn port_mut(&mut self) -> &mut S {
        &mut self.port
    }
}

/// Log helper: renders bytes with control characters escaped.
struct Printable<'a>(&'a [u8]);

impl core::fmt::Display for Printable<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        for &b in self.0 {
            match b {
                b'\r' => f.write_str("\\r")?,
                b'\n' => f.write_str("\\n")?,
                0x20..=0x7e => write!(f, "{}", b as char)?,
                _ => write!(f, "\\x{b:02x}")?,
            }
        }
        Ok(())
    }
}
