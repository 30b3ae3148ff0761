//! Discrete indicator LEDs: alarm, incorrect code, system blocked.
//!
//! Plain GPIO outputs behind embedded-hal, so the same driver runs on the
//! ESP32 pins and on host mocks.  The last commanded level is cached and
//! a pin is only written when the level changes.

use embedded_hal::digital::OutputPin;
use log::warn;

use crate::app::ports::IndicatorPort;

struct Led<P: OutputPin> {
    pin: P,
    on: bool,
}

impl<P: OutputPin> Led<P> {
    fn new(mut pin: P) -> Self {
        if let Err(e) = pin.set_low() {
            warn!("indicator: initial off failed: {:?}", e);
        }
        Self { pin, on: false }
    }

    fn set(&mut self, on: bool) {
        if on == self.on {
            return;
        }
        let result = if on {
            self.pin.set_high()
        } else {
            self.pin.set_low()
        };
        match result {
            Ok(()) => self.on = on,
            Err(e) => warn!("indicator: write failed: {:?}", e),
        }
    }
}

pub struct IndicatorLeds<P: OutputPin> {
    alarm: Led<P>,
    incorrect_code: Led<P>,
    system_blocked: Led<P>,
}

impl<P: OutputPin> IndicatorLeds<P> {
    pub fn new(alarm: P, incorrect_code: P, system_blocked: P) -> Self {
        Self {
            alarm: Led::new(alarm),
            incorrect_code: Led::new(incorrect_code),
            system_blocked: Led::new(system_blocked),
        }
    }

    pub fn alarm_on(&self) -> bool {
        self.alarm.on
    }

    pub fn incorrect_code_on(&self) -> bool {
        self.incorrect_code.on
    }

    pub fn system_blocked_on(&self) -> bool {
        self.system_blocked.on
    }
}

impl<P: OutputPin> IndicatorPort for IndicatorLeds<P> {
    fn set_alarm(&mut self, on: bool) {
        self.alarm.set(on);
    }

    fn set_incorrect_code(&mut self, on: bool) {
        self.incorrect_code.set(on);
    }

    fn set_system_blocked(&mut self, on: bool) {
        self.system_blocked.set(on);
    }
}
