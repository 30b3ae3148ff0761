//! Sensor subsystem: individual drivers and the aggregating [`SensorHub`].
//!
//! The hub owns every sensor driver and produces a [`SensorSnapshot`] each
//! tick.  The alarm FSM only ever sees the snapshot.

pub mod gas;
pub mod temperature;

use embedded_hal::digital::InputPin;

use crate::app::ports::SensorPort;
use gas::GasDetector;
use temperature::{AnalogSource, TemperatureSensor};

/// A point-in-time view of every alarm input.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SensorSnapshot {
    /// Gas detector output is asserted.
    pub gas_detected: bool,
    /// Averaged temperature is above the configured level.
    pub over_temperature: bool,
    /// Averaged temperature (°C).
    pub temperature_c: f32,
}

/// Aggregates all sensor drivers and produces a unified snapshot.
pub struct SensorHub<A: AnalogSource, P: InputPin> {
    pub temperature: TemperatureSensor<A>,
    pub gas: GasDetector<P>,
}

impl<A: AnalogSource, P: InputPin> SensorHub<A, P> {
    pub fn new(temperature: TemperatureSensor<A>, gas: GasDetector<P>) -> Self {
        Self { temperature, gas }
    }
}

impl<A: AnalogSource, P: InputPin> SensorPort for SensorHub<A, P> {
    fn read_all(&mut self, elapsed_ms: u32) -> SensorSnapshot {
        let temp = self.temperature.update(elapsed_ms);
        SensorSnapshot {
            gas_detected: self.gas.read(),
            over_temperature: temp.over_temp,
            temperature_c: temp.celsius,
        }
    }
}
