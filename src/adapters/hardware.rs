//! Hardware adapter: bridges real peripherals to the domain port traits.
//!
//! Owns the [`SensorHub`], the keypad matrix, the enter button and the
//! indicator LEDs, exposing them through [`SensorPort`], [`InputPort`]
//! and [`IndicatorPort`].  It is generic over embedded-hal pins, so the
//! same adapter drives ESP-IDF `PinDriver`s on target and mock pins in
//! host tests.

use embedded_hal::digital::{InputPin, OutputPin};

use crate::app::ports::{IndicatorPort, InputPort, SensorPort};
use crate::drivers::debounce::{DebouncedInput, Edge};
use crate::drivers::indicators::IndicatorLeds;
use crate::drivers::keypad::{KeyScanner, MatrixKeypad};
use crate::sensors::temperature::AnalogSource;
use crate::sensors::{SensorHub, SensorSnapshot};

/// Concrete adapter that combines all local I/O behind port traits.
pub struct HardwareAdapter<A, G, R, C, E, L>
where
    A: AnalogSource,
    G: InputPin,
    R: OutputPin,
    C: InputPin,
    E: InputPin,
    L: OutputPin,
{
    sensors: SensorHub<A, G>,
    keypad: MatrixKeypad<R, C>,
    enter: DebouncedInput<E>,
    leds: IndicatorLeds<L>,
}

impl<A, G, R, C, E, L> HardwareAdapter<A, G, R, C, E, L>
where
    A: AnalogSource,
    G: InputPin,
    R: OutputPin,
    C: InputPin,
    E: InputPin,
    L: OutputPin,
{
    pub fn new(
        sensors: SensorHub<A, G>,
        keypad: MatrixKeypad<R, C>,
        enter: DebouncedInput<E>,
        leds: IndicatorLeds<L>,
    ) -> Self {
        Self {
            sensors,
            keypad,
            enter,
            leds,
        }
    }

    pub fn sensors(&self) -> &SensorHub<A, G> {
        &self.sensors
    }

    pub fn leds(&self) -> &IndicatorLeds<L> {
        &self.leds
    }
}

// ── SensorPort ────────────────────────────────────────────────

impl<A, G, R, C, E, L> SensorPort for HardwareAdapter<A, G, R, C, E, L>
where
    A: AnalogSource,
    G: InputPin,
    R: OutputPin,
    C: InputPin,
    E: InputPin,
    L: OutputPin,
{
    fn read_all(&mut self, elapsed_ms: u32) -> SensorSnapshot {
        self.sensors.read_all(elapsed_ms)
    }
}

// ── InputPort ─────────────────────────────────────────────────

impl<A, G, R, C, E, L> KeyScanner for HardwareAdapter<A, G, R, C, E, L>
where
    A: AnalogSource,
    G: InputPin,
    R: OutputPin,
    C: InputPin,
    E: InputPin,
    L: OutputPin,
{
    fn scan(&mut self) -> Option<char> {
        self.keypad.scan()
    }
}

impl<A, G, R, C, E, L> InputPort for HardwareAdapter<A, G, R, C, E, L>
where
    A: AnalogSource,
    G: InputPin,
    R: OutputPin,
    C: InputPin,
    E: InputPin,
    L: OutputPin,
{
    fn enter_released(&mut self, elapsed_ms: u32) -> bool {
        matches!(self.enter.update(elapsed_ms), Some(Edge::Released))
    }
}

// ── IndicatorPort ─────────────────────────────────────────────

impl<A, G, R, C, E, L> IndicatorPort for HardwareAdapter<A, G, R, C, E, L>
where
    A: AnalogSource,
    G: InputPin,
    R: OutputPin,
    C: InputPin,
    E: InputPin,
    L: OutputPin,
{
    fn set_alarm(&mut self, on: bool) {
        self.leds.set_alarm(on);
    }

    fn set_incorrect_code(&mut self, on: bool) {
        self.leds.set_incorrect_code(on);
    }

    fn set_system_blocked(&mut self, on: bool) {
        self.leds.set_system_blocked(on);
    }
}
