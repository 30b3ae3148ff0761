//! Application service: the hexagonal core.
//!
//! [`AppService`] owns every state machine on the node and runs one
//! cooperative pass per tick.  All I/O flows through port traits injected
//! at call sites, making the whole pass testable with mock adapters.
//!
//! ```text
//!  SensorPort ──▶ ┌──────────────────────────────┐ ──▶ IndicatorPort
//!   InputPort ──▶ │          AppService          │ ──▶ EventSink
//!                 │ keypad · alarm · Wi-Fi FSM   │
//!  SerialPort ◀──▶└──────────────────────────────┘
//! ```
//!
//! Per tick: sensors → enter button → keypad decode → alarm → indicators
//! → element events → Wi-Fi.  Everything a stage produces is visible to
//! the later stages of the same tick.

use log::{info, warn};

use crate::alarm::code::CodeBuffer;
use crate::alarm::{Alarm, AlarmSettings, SUBMIT_KEY};
use crate::config::{SystemConfig, bounded};
use crate::drivers::keypad::Keypad;
use crate::error::Result;
use crate::sensors::SensorSnapshot;
use crate::sensors::temperature::celsius_to_fahrenheit;
use crate::tick::TimeBase;
use crate::wifi::WifiManager;

use super::commands::{AppCommand, CommandResponse};
use super::events::{ELEMENT_COUNT, Element, SystemEvent};
use super::ports::{CommLayer, ConfigPort, EventSink, IndicatorPort, InputPort, SensorPort, SerialPort};

/// Quiet time after the last config change before it is persisted.
const AUTO_SAVE_DELAY_MS: u64 = 5_000;

// ───────────────────────────────────────────────────────────────
// AppService
// ───────────────────────────────────────────────────────────────

pub struct AppService<S: SerialPort, L: CommLayer> {
    config: SystemConfig,
    time: TimeBase,
    alarm: Alarm,
    keypad: Keypad,
    wifi: Option<WifiManager<S, L>>,
    /// Enter-button release waiting for a tick without a keypad key.
    pending_submit: bool,
    /// Last reported on/off level per [`Element::ALL`] entry.
    elements: [bool; ELEMENT_COUNT],
    sensors: SensorSnapshot,
    tick_count: u64,
    config_dirty: bool,
    dirty_since_tick: u64,
}

impl<S: SerialPort, L: CommLayer> AppService<S, L> {
    /// Construct the service from a validated configuration.
    ///
    /// Does **not** start anything.  Attach Wi-Fi with [`with_wifi`]
    /// if present, then call [`start`].
    ///
    /// [`with_wifi`]: Self::with_wifi
    /// [`start`]: Self::start
    pub fn new(config: SystemConfig) -> Result<Self> {
        config.validate()?;
        let code = CodeBuffer::parse(&config.alarm_code)?;
        let alarm = Alarm::new(code, AlarmSettings::from(&config));

        Ok(Self {
            time: TimeBase::new(config.tick_period_ms),
            keypad: Keypad::new(config.debounce_ms),
            alarm,
            wifi: None,
            pending_submit: false,
            elements: [false; ELEMENT_COUNT],
            sensors: SensorSnapshot::default(),
            tick_count: 0,
            config_dirty: false,
            dirty_since_tick: 0,
            config,
        })
    }

    /// Attach the Wi-Fi bring-up machine.
    #[must_use]
    pub fn with_wifi(mut self, wifi: WifiManager<S, L>) -> Self {
        self.wifi = Some(wifi);
        self
    }

    // ── Lifecycle ─────────────────────────────────────────────

    pub fn start(&mut self, sink: &mut impl EventSink) {
        sink.notify(&SystemEvent::Started);
        if let Some(wifi) = self.wifi.as_mut() {
            wifi.start();
            sink.notify(&SystemEvent::WifiStateChanged(wifi.state()));
        }
        info!(
            "AppService started, tick {} ms, wifi {}",
            self.time.period_ms(),
            if self.wifi.is_some() { "attached" } else { "absent" }
        );
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one scheduling pass.
    ///
    /// `hw` satisfies every hardware port at once.
    pub fn tick(
        &mut self,
        hw: &mut (impl SensorPort + InputPort + IndicatorPort),
        sink: &mut impl EventSink,
    ) {
        self.tick_count += 1;
        let elapsed = self.time.advance();

        // 1. Sensor conditions
        self.sensors = hw.read_all(elapsed);

        // 2. Enter button, then keypad decode
        if hw.enter_released(elapsed) {
            self.pending_submit = true;
        }
        let key = match self.keypad.update(&mut *hw, elapsed) {
            Some(key) => Some(key),
            None if self.pending_submit => {
                self.pending_submit = false;
                Some(SUBMIT_KEY)
            }
            None => None,
        };

        // 3. Alarm FSM
        self.alarm.update(&self.sensors, key, elapsed);

        // 4. Indicators and element events
        hw.set_alarm(self.alarm.alarm_led());
        hw.set_incorrect_code(self.alarm.incorrect_code());
        hw.set_system_blocked(self.alarm.locked_out());
        self.publish_element_changes(sink);

        // 5. Wi-Fi bring-up
        if let Some(wifi) = self.wifi.as_mut() {
            if let Some(state) = wifi.update(elapsed) {
                sink.notify(&SystemEvent::WifiStateChanged(state));
            }
        }
    }

    // ── Command handling ──────────────────────────────────────

    /// Answer a console request.
    pub fn handle_command(&mut self, cmd: AppCommand, sink: &mut impl EventSink) -> CommandResponse {
        let response = match cmd {
            AppCommand::ReadAlarm => CommandResponse::Alarm {
                active: self.alarm.is_active(),
                locked_out: self.alarm.locked_out(),
            },
            AppCommand::ReadGasDetector => CommandResponse::GasDetector(self.alarm.gas_detected()),
            AppCommand::ReadOverTemp => CommandResponse::OverTemp(self.alarm.over_temp_detected()),
            AppCommand::ReadTemperature => CommandResponse::Temperature {
                celsius: self.sensors.temperature_c,
                fahrenheit: celsius_to_fahrenheit(self.sensors.temperature_c),
            },
            AppCommand::SubmitCode(code) => CommandResponse::Code(self.alarm.submit_code(&code)),
            AppCommand::WriteCode(code) => {
                self.alarm.write_code(code);
                self.config.alarm_code = bounded(&code.to_string());
                self.mark_config_dirty();
                CommandResponse::Done
            }
            AppCommand::AdminReset => {
                self.alarm.admin_reset();
                CommandResponse::Done
            }
            AppCommand::ReadWifiState => match self.wifi.as_ref() {
                Some(wifi) => CommandResponse::Wifi {
                    state: wifi.state(),
                    ip: wifi.ip().cloned(),
                },
                None => CommandResponse::WifiAbsent,
            },
        };
        self.publish_element_changes(sink);
        response
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn alarm(&self) -> &Alarm {
        &self.alarm
    }

    pub fn wifi(&self) -> Option<&WifiManager<S, L>> {
        self.wifi.as_ref()
    }

    pub fn wifi_mut(&mut self) -> Option<&mut WifiManager<S, L>> {
        self.wifi.as_mut()
    }

    /// Latest sensor conditions.
    pub fn sensors(&self) -> &SensorSnapshot {
        &self.sensors
    }

    /// Milliseconds of scheduled time since start (wrapping).
    pub fn uptime_ms(&self) -> u32 {
        self.time.now_ms()
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn config(&self) -> &SystemConfig {
        &self.config
    }

    // ── Internal ──────────────────────────────────────────────

    fn element_levels(&self) -> [bool; ELEMENT_COUNT] {
        Element::ALL.map(|element| match element {
            Element::Alarm => self.alarm.is_active(),
            Element::GasDetector => self.alarm.gas_detected(),
            Element::OverTemp => self.alarm.over_temp_detected(),
            Element::IncorrectCodeLed => self.alarm.incorrect_code(),
            Element::SystemBlockedLed => self.alarm.locked_out(),
        })
    }

    fn publish_element_changes(&mut self, sink: &mut impl EventSink) {
        let now = self.element_levels();
        for (i, element) in Element::ALL.iter().enumerate() {
            if now[i] != self.elements[i] {
                sink.notify(&SystemEvent::ElementChanged {
                    element: *element,
                    on: now[i],
                });
            }
        }
        self.elements = now;
    }

    // ── Config dirty-flag management ──────────────────────────

    pub fn mark_config_dirty(&mut self) {
        if !self.config_dirty {
            self.config_dirty = true;
            self.dirty_since_tick = self.tick_count;
        }
    }

    /// Persist the config once it has been left alone for five seconds.
    /// Returns `true` if the config was saved.
    pub fn auto_save_if_needed(&mut self, storage: &impl ConfigPort) -> bool {
        if !self.config_dirty {
            return false;
        }
        let ticks_since_dirty = self.tick_count.saturating_sub(self.dirty_since_tick);
        if ticks_since_dirty * u64::from(self.time.period_ms()) < AUTO_SAVE_DELAY_MS {
            return false;
        }
        match storage.save(&self.config) {
            Ok(()) => {
                self.config_dirty = false;
                info!("Config auto-saved");
                true
            }
            Err(e) => {
                warn!("Config auto-save failed: {}", e);
                false
            }
        }
    }

    pub fn is_config_dirty(&self) -> bool {
        self.config_dirty
    }
}
