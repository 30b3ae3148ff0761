//! AlarmNode firmware library.
//!
//! Gas / over-temperature alarm with keypad disarm and an ESP8266 Wi-Fi
//! bring-up, built from cooperative state machines advanced by a fixed
//! tick.  Exposes the pure-logic modules for integration testing; all
//! ESP-IDF-specific code is guarded by `#[cfg(target_os = "espidf")]`
//! within each module.

#![deny(unused_must_use)]

pub mod alarm;
pub mod app;
pub mod at;
pub mod config;
pub mod error;
pub mod fsm;
pub mod pins;
pub mod tick;
pub mod wifi;

pub mod adapters;
pub mod drivers;
pub mod sensors;
