//! Alarm FSM: sensor-triggered activation and keypad-coded deactivation.
//!
//! Two sub-protocols share one [`AlarmRecord`] and run back to back each
//! tick:
//!
//! ```text
//!   SensorSnapshot ──▶ activation ──┐
//!                                   ├──▶ AlarmRecord ──▶ indicators
//!   key release ────▶ deactivation ─┘
//! ```
//!
//! ## Activation
//!
//! Sensor flags are OR'd into the alarm and latch their detector flag for
//! as long as the alarm stays on.  The alarm LED blinks at a period picked
//! by priority:
//!
//! | Latched detectors   | Period (default) |
//! |---------------------|------------------|
//! | gas + over-temp     | 100 ms           |
//! | gas                 | 1000 ms          |
//! | over-temp           | 500 ms           |
//! | none                | steady off       |
//!
//! ## Deactivation
//!
//! Every non-`#` key lands in the entry buffer at a circular index
//! (`index = (index + 1) % 4` after each write).  `#` submits.  While the
//! incorrect-code indicator is lit, two consecutive `#` acknowledge it and
//! rewind the index instead.  Reaching the incorrect-code limit locks the
//! keypad out until [`Alarm::admin_reset`].

pub mod code;

use log::{error, info, warn};

use crate::config::SystemConfig;
use crate::sensors::SensorSnapshot;
use crate::tick::Timer;
use code::{CODE_LEN, CodeBuffer};

/// Key that submits the entered code.
pub const SUBMIT_KEY: char = '#';

/// Tunables lifted from [`SystemConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlarmSettings {
    pub blink_both_ms: u32,
    pub blink_gas_ms: u32,
    pub blink_over_temp_ms: u32,
    pub max_incorrect_codes: u8,
}

impl From<&SystemConfig> for AlarmSettings {
    fn from(cfg: &SystemConfig) -> Self {
        Self {
            blink_both_ms: cfg.blink_gas_and_over_temp_ms,
            blink_gas_ms: cfg.blink_gas_ms,
            blink_over_temp_ms: cfg.blink_over_temp_ms,
            max_incorrect_codes: cfg.max_incorrect_codes,
        }
    }
}

/// All alarm state, owned by the scheduler and read through accessors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlarmRecord {
    pub armed_or_triggered: bool,
    pub gas: bool,
    pub over_temp: bool,
    pub incorrect_code: bool,
    pub incorrect_attempts: u8,
    pub locked_out: bool,
    pub entry_index: usize,
    pub entered: CodeBuffer,
}

/// Outcome of a code submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeCheck {
    /// Code matched; the alarm is off and the attempt counter cleared.
    Accepted,
    /// Mismatch; carries the attempts used so far.
    Rejected { attempts: u8 },
    /// Mismatch that exhausted the allowance.
    LockedOut,
    /// Submission ignored (keypad locked, or alarm not triggered).
    Ignored,
}

pub struct Alarm {
    record: AlarmRecord,
    code: CodeBuffer,
    settings: AlarmSettings,
    blink: Timer,
    blink_on: bool,
    submit_presses: u8,
}

impl Alarm {
    pub fn new(code: CodeBuffer, settings: AlarmSettings) -> Self {
        Self {
            record: AlarmRecord::default(),
            code,
            settings,
            blink: Timer::new(),
            blink_on: false,
            submit_presses: 0,
        }
    }

    /// One tick: activation first, then deactivation with this tick's key.
    pub fn update(&mut self, sensors: &SensorSnapshot, key: Option<char>, elapsed_ms: u32) {
        self.update_activation(sensors, elapsed_ms);
        self.update_deactivation(key);
    }

    // ── Activation ────────────────────────────────────────────

    fn update_activation(&mut self, sensors: &SensorSnapshot, elapsed_ms: u32) {
        let r = &mut self.record;
        if sensors.gas_detected {
            r.gas = true;
            r.armed_or_triggered = true;
        }
        if sensors.over_temperature {
            r.over_temp = true;
            r.armed_or_triggered = true;
        }
        if !r.armed_or_triggered {
            r.gas = false;
            r.over_temp = false;
        }

        match self.blink_period() {
            Some(period) => {
                self.blink.accumulate(elapsed_ms);
                if self.blink.reached(period) {
                    self.blink.reset();
                    self.blink_on = !self.blink_on;
                }
            }
            None => {
                self.blink.reset();
                self.blink_on = false;
            }
        }
    }

    /// Blink period for the latched detectors, `None` for steady off.
    pub fn blink_period(&self) -> Option<u32> {
        if !self.record.armed_or_triggered {
            return None;
        }
        match (self.record.gas, self.record.over_temp) {
            (true, true) => Some(self.settings.blink_both_ms),
            (true, false) => Some(self.settings.blink_gas_ms),
            (false, true) => Some(self.settings.blink_over_temp_ms),
            (false, false) => None,
        }
    }

    // ── Deactivation ──────────────────────────────────────────

    fn update_deactivation(&mut self, key: Option<char>) {
        if self.record.locked_out {
            return;
        }
        let Some(key) = key else {
            return;
        };

        if key != SUBMIT_KEY {
            let r = &mut self.record;
            r.entered.set(r.entry_index, key);
            r.entry_index = (r.entry_index + 1) % CODE_LEN;
            self.submit_presses = 0;
            return;
        }

        if self.record.incorrect_code {
            self.submit_presses += 1;
            if self.submit_presses >= 2 {
                self.submit_presses = 0;
                self.record.entry_index = 0;
                self.record.incorrect_code = false;
                info!("alarm: incorrect-code acknowledged");
            }
        } else if self.record.armed_or_triggered {
            let entered = self.record.entered;
            self.check(&entered);
        }
    }

    fn check(&mut self, candidate: &CodeBuffer) -> CodeCheck {
        let r = &mut self.record;
        if *candidate == self.code {
            r.armed_or_triggered = false;
            r.incorrect_code = false;
            r.incorrect_attempts = 0;
            r.entry_index = 0;
            info!("alarm: correct code, deactivated");
            return CodeCheck::Accepted;
        }

        r.incorrect_code = true;
        r.incorrect_attempts = r.incorrect_attempts.saturating_add(1);
        // Acknowledgement starts over for every fresh rejection.
        self.submit_presses = 0;
        if r.incorrect_attempts >= self.settings.max_incorrect_codes {
            r.locked_out = true;
            error!(
                "alarm: {} incorrect codes, keypad locked out",
                r.incorrect_attempts
            );
            CodeCheck::LockedOut
        } else {
            warn!(
                "alarm: incorrect code ({}/{})",
                r.incorrect_attempts, self.settings.max_incorrect_codes
            );
            CodeCheck::Rejected {
                attempts: r.incorrect_attempts,
            }
        }
    }

    // ── Accessors (console boundary) ──────────────────────────

    pub fn record(&self) -> &AlarmRecord {
        &self.record
    }

    pub fn is_active(&self) -> bool {
        self.record.armed_or_triggered
    }

    pub fn gas_detected(&self) -> bool {
        self.record.gas
    }

    pub fn over_temp_detected(&self) -> bool {
        self.record.over_temp
    }

    pub fn incorrect_code(&self) -> bool {
        self.record.incorrect_code
    }

    pub fn locked_out(&self) -> bool {
        self.record.locked_out
    }

    pub fn incorrect_attempts(&self) -> u8 {
        self.record.incorrect_attempts
    }

    /// Current alarm LED level (blinking while active).
    pub fn alarm_led(&self) -> bool {
        self.blink_on
    }

    /// Compare an externally entered code.  Same counting rules as the
    /// keypad path; ignored once locked out.
    pub fn submit_code(&mut self, candidate: &CodeBuffer) -> CodeCheck {
        if self.record.locked_out {
            return CodeCheck::Ignored;
        }
        self.check(candidate)
    }

    /// Replace the stored deactivation code.
    pub fn write_code(&mut self, code: CodeBuffer) {
        self.code = code;
        info!("alarm: new code configured");
    }

    /// Clear lockout and the incorrect-code state.  The alarm itself stays
    /// as it is.
    pub fn admin_reset(&mut self) {
        let r = &mut self.record;
        r.locked_out = false;
        r.incorrect_code = false;
        r.incorrect_attempts = 0;
        r.entry_index = 0;
        self.submit_presses = 0;
        info!("alarm: administrative reset");
    }
}
