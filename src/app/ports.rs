//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ AppService (domain)
//! ```
//!
//! Driven adapters (sensors, indicator LEDs, the serial link to the Wi-Fi
//! module, event sinks, storage) implement these traits.  The
//! [`AppService`](super::service::AppService) consumes them via generics, so
//! the domain core never touches hardware directly.

use crate::config::SystemConfig;
use crate::drivers::keypad::KeyScanner;
use crate::sensors::SensorSnapshot;

use super::events::SystemEvent;

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Pull-based sensor conditions.  The alarm never reads devices itself.
pub trait SensorPort {
    /// Advance sampling by `elapsed_ms` and return the current conditions.
    fn read_all(&mut self, elapsed_ms: u32) -> SensorSnapshot;
}

// ───────────────────────────────────────────────────────────────
// Input port (driven adapter: keypad matrix + enter button → domain)
// ───────────────────────────────────────────────────────────────

/// Operator inputs.  The keypad is scanned raw and decoded by the domain;
/// the enter button is debounced by the adapter that owns its pin.
pub trait InputPort: KeyScanner {
    /// Advance the enter button's debouncer by `elapsed_ms`; `true` on a
    /// confirmed release.
    fn enter_released(&mut self, elapsed_ms: u32) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Serial port (driven adapter: domain ↔ Wi-Fi module UART)
// ───────────────────────────────────────────────────────────────

/// Byte-oriented, non-blocking transport to the AT-command module.
pub trait SerialPort {
    /// Next received byte, or `None` when nothing is waiting.
    fn try_read_byte(&mut self) -> Option<u8>;

    /// Queue `bytes` for transmission.  Must not block the tick.
    fn write(&mut self, bytes: &[u8]);
}

// ───────────────────────────────────────────────────────────────
// Indicator port (driven adapter: domain → LEDs)
// ───────────────────────────────────────────────────────────────

pub trait IndicatorPort {
    fn set_alarm(&mut self, on: bool);

    fn set_incorrect_code(&mut self, on: bool);

    fn set_system_blocked(&mut self, on: bool);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / storage)
// ───────────────────────────────────────────────────────────────

/// Receives named state-change events.  Delivery is best-effort and must
/// return promptly.
pub trait EventSink {
    fn notify(&mut self, event: &SystemEvent);
}

// ───────────────────────────────────────────────────────────────
// Communication layer (driven adapter: steady-state data exchange)
// ───────────────────────────────────────────────────────────────

/// Data-exchange collaborator brought up once the module has an address.
pub trait CommLayer {
    /// Prepare the layer for `ip`.  Called again only after `shutdown`.
    fn init(&mut self, ip: &str) -> crate::error::Result<()>;

    /// One cooperative pass while the link is up.
    fn update(&mut self, elapsed_ms: u32);

    /// The link went away.
    fn shutdown(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Time port (driven adapter: system timer → domain)
// ───────────────────────────────────────────────────────────────

/// Monotonic uptime, used to timestamp stored events.
pub trait TimePort {
    fn uptime_ms(&self) -> u64;
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists system configuration.
///
/// Implementations MUST run [`SystemConfig::validate`] before persisting
/// and reject invalid values with [`ConfigError::ValidationFailed`] rather
/// than clamping them.
pub trait ConfigPort {
    /// Load configuration from persistent storage.
    /// Returns [`SystemConfig::default()`] if no stored config exists.
    fn load(&self) -> Result<SystemConfig, ConfigError>;

    /// Validate and persist configuration.
    fn save(&self, config: &SystemConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Stored config failed deserialization.
    Corrupted,
    /// A config field failed range validation.
    /// The `&'static str` names the field and the constraint.
    ValidationFailed(&'static str),
    /// Generic I/O error from the storage backend.
    IoError,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl From<ConfigError> for crate::error::Error {
    fn from(e: ConfigError) -> Self {
        match e {
            ConfigError::Corrupted => Self::Config("stored config corrupted"),
            ConfigError::ValidationFailed(msg) => Self::Config(msg),
            ConfigError::IoError => Self::Config("config storage I/O error"),
        }
    }
}
