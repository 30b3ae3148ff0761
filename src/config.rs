//! System configuration parameters
//!
//! All tunable parameters for the alarm node.
//! Values can be overridden via NVS (non-volatile storage); the stored blob
//! is range-checked with [`SystemConfig::validate`] before use.

use serde::{Deserialize, Serialize};

use crate::app::ports::ConfigError;
use crate::alarm::code::CodeBuffer;

/// Maximum SSID length accepted by the ESP8266 `AT+CWJAP` command.
pub const SSID_MAX_LEN: usize = 32;
/// Maximum WPA2 passphrase length.
pub const PASSWORD_MAX_LEN: usize = 64;
/// Upper bound for the temperature moving-average window.
pub const MAX_AVERAGE_WINDOW: usize = 32;

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Timing ---
    /// Scheduling pass period (milliseconds)
    pub tick_period_ms: u32,
    /// Debounce threshold for buttons and keypad keys (milliseconds)
    pub debounce_ms: u32,

    // --- Alarm ---
    /// Indicator blink period when gas and over-temperature are both latched
    pub blink_gas_and_over_temp_ms: u32,
    /// Indicator blink period for gas alone
    pub blink_gas_ms: u32,
    /// Indicator blink period for over-temperature alone
    pub blink_over_temp_ms: u32,
    /// Incorrect code submissions before permanent lockout
    pub max_incorrect_codes: u8,
    /// Four-digit deactivation code
    pub alarm_code: heapless::String<4>,

    // --- Temperature ---
    /// Over-temperature level (Celsius)
    pub over_temp_threshold_c: f32,
    /// Temperature sample interval (milliseconds)
    pub temp_sample_interval_ms: u32,
    /// Number of samples in the moving average
    pub temp_average_window: u8,

    // --- Wi-Fi ---
    pub wifi_ssid: heapless::String<SSID_MAX_LEN>,
    pub wifi_password: heapless::String<PASSWORD_MAX_LEN>,
    /// Wait between detection / AP-join retries (milliseconds)
    pub wifi_retry_backoff_ms: u32,
    /// Interval between link checks once communication is up (milliseconds)
    pub wifi_link_check_interval_ms: u32,

    // --- AT exchange ---
    /// `AT` probe timeout (milliseconds)
    pub at_detect_timeout_ms: u32,
    /// `AT+RST` timeout, waiting for the module's `ready` banner
    pub at_reset_timeout_ms: u32,
    /// `AT+CWMODE` timeout
    pub at_init_timeout_ms: u32,
    /// `AT+CIFSR` timeout
    pub at_status_timeout_ms: u32,
    /// `AT+CWJAP` timeout
    pub at_join_timeout_ms: u32,
    /// Bytes drained from the UART per scheduling pass
    pub at_bytes_per_tick: u16,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // Timing
            tick_period_ms: 10,
            debounce_ms: 40,

            // Alarm
            blink_gas_and_over_temp_ms: 100,
            blink_gas_ms: 1000,
            blink_over_temp_ms: 500,
            max_incorrect_codes: 5,
            alarm_code: bounded("1805"),

            // Temperature
            over_temp_threshold_c: 50.0,
            temp_sample_interval_ms: 100, // 10 Hz
            temp_average_window: 10,

            // Wi-Fi
            wifi_ssid: heapless::String::new(),
            wifi_password: heapless::String::new(),
            wifi_retry_backoff_ms: 10_000,
            wifi_link_check_interval_ms: 30_000,

            // AT exchange
            at_detect_timeout_ms: 50,
            at_reset_timeout_ms: 5_000,
            at_init_timeout_ms: 500,
            at_status_timeout_ms: 1_000,
            at_join_timeout_ms: 15_000,
            at_bytes_per_tick: 64,
        }
    }
}

impl SystemConfig {
    /// Range-check every field.  Invalid values are rejected, never clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=100).contains(&self.tick_period_ms) {
            return Err(ConfigError::ValidationFailed(
                "tick_period_ms must be 1–100",
            ));
        }
        if self.debounce_ms < self.tick_period_ms || self.debounce_ms > 500 {
            return Err(ConfigError::ValidationFailed(
                "debounce_ms must be tick_period_ms–500",
            ));
        }
        for period in [
            self.blink_gas_and_over_temp_ms,
            self.blink_gas_ms,
            self.blink_over_temp_ms,
        ] {
            if period < self.tick_period_ms {
                return Err(ConfigError::ValidationFailed(
                    "blink periods must be at least one tick",
                ));
            }
        }
        if self.max_incorrect_codes == 0 {
            return Err(ConfigError::ValidationFailed(
                "max_incorrect_codes must be at least 1",
            ));
        }
        if CodeBuffer::parse(&self.alarm_code).is_err() {
            return Err(ConfigError::ValidationFailed(
                "alarm_code must be 4 digits",
            ));
        }
        if !(0.0..=150.0).contains(&self.over_temp_threshold_c) {
            return Err(ConfigError::ValidationFailed(
                "over_temp_threshold_c must be 0.0–150.0",
            ));
        }
        if self.temp_sample_interval_ms == 0 {
            return Err(ConfigError::ValidationFailed(
                "temp_sample_interval_ms must be non-zero",
            ));
        }
        if self.temp_average_window == 0 || usize::from(self.temp_average_window) > MAX_AVERAGE_WINDOW {
            return Err(ConfigError::ValidationFailed(
                "temp_average_window must be 1–32",
            ));
        }
        if !(1_000..=600_000).contains(&self.wifi_retry_backoff_ms) {
            return Err(ConfigError::ValidationFailed(
                "wifi_retry_backoff_ms must be 1000–600000",
            ));
        }
        if self.at_detect_timeout_ms == 0 || self.at_join_timeout_ms == 0 {
            return Err(ConfigError::ValidationFailed(
                "AT timeouts must be non-zero",
            ));
        }
        if self.at_bytes_per_tick == 0 {
            return Err(ConfigError::ValidationFailed(
                "at_bytes_per_tick must be non-zero",
            ));
        }
        Ok(())
    }
}

/// Build a fixed-capacity string, dropping whatever does not fit.
pub fn bounded<const N: usize>(s: &str) -> heapless::String<N> {
    let mut out = heapless::String::new();
    for c in s.chars() {
        if out.push(c).is_err() {
            break;
        }
    }
    out
}
