//! Application core: pure domain orchestration, zero I/O.
//!
//! The service runs the keypad decoder, alarm FSM and Wi-Fi bring-up once
//! per tick.  All interaction with hardware happens through **port
//! traits** defined in [`ports`], keeping this layer fully testable
//! without real peripherals.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
