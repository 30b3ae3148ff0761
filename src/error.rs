//! Unified error types for the alarm node.
//!
//! A single `Error` enum that every subsystem converts into, keeping the
//! top-level loop's error handling uniform.  All variants are `Copy` so
//! they pass through the FSM contexts without allocation.
//!
//! Note that protocol timeouts are *not* errors here: the AT engine reports
//! them as [`ExchangeStatus::TimedOut`](crate::at::ExchangeStatus) and the
//! Wi-Fi FSM treats them as ordinary transition triggers.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The AT exchange engine rejected a request.
    At(AtError),
    /// An access code could not be parsed or stored.
    Code(CodeError),
    /// Peripheral initialisation failed.
    Init(&'static str),
    /// Configuration is invalid or could not be loaded.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::At(e) => write!(f, "at: {e}"),
            Self::Code(e) => write!(f, "code: {e}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl core::error::Error for Error {}

// ---------------------------------------------------------------------------
// AT exchange errors
// ---------------------------------------------------------------------------

/// Caller errors raised by [`AtEngine`](crate::at::AtEngine).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AtError {
    /// An exchange is already outstanding on this transport.
    Busy,
    /// The handle does not refer to the outstanding exchange.
    StaleHandle,
    /// The command or pattern does not fit the engine's fixed buffers.
    TooLong,
    /// An expected pattern was empty.
    EmptyPattern,
}

impl fmt::Display for AtError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Busy => write!(f, "exchange already pending"),
            Self::StaleHandle => write!(f, "stale exchange handle"),
            Self::TooLong => write!(f, "command or pattern too long"),
            Self::EmptyPattern => write!(f, "empty response pattern"),
        }
    }
}

impl From<AtError> for Error {
    fn from(e: AtError) -> Self {
        Self::At(e)
    }
}

// ---------------------------------------------------------------------------
// Code errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeError {
    /// Input was not exactly four characters long.
    WrongLength,
    /// A character is not a keypad digit.
    NotADigit,
}

impl fmt::Display for CodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WrongLength => write!(f, "code must be 4 digits"),
            Self::NotADigit => write!(f, "code contains a non-digit"),
        }
    }
}

impl From<CodeError> for Error {
    fn from(e: CodeError) -> Self {
        Self::Code(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
