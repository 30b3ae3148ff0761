//! Digital gas detector (MQ-series module comparator output).

use embedded_hal::digital::InputPin;
use log::warn;

pub struct GasDetector<P: InputPin> {
    pin: P,
    active_low: bool,
    last: bool,
}

impl<P: InputPin> GasDetector<P> {
    /// `active_low` for modules whose D0 pulls low on detection.
    pub fn new(pin: P, active_low: bool) -> Self {
        Self {
            pin,
            active_low,
            last: false,
        }
    }

    /// Current detection level.  On a read error the previous level is kept.
    pub fn read(&mut self) -> bool {
        let level = if self.active_low {
            self.pin.is_low()
        } else {
            self.pin.is_high()
        };
        match level {
            Ok(v) => self.last = v,
            Err(e) => warn!("gas: pin read failed: {:?}", e),
        }
        self.last
    }
}
