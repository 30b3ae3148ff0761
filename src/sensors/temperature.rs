//! LM35 analog temperature sensor with a moving-average filter.
//!
//! The LM35 outputs 10 mV/°C.  With a 3.3 V ADC reference a normalised
//! reading `f` (0.0–1.0) maps to `f × 3.3 / 0.01` °C.
//!
//! A sample is taken every `temp_sample_interval_ms` of accumulated tick
//! time and pushed into a ring of `temp_average_window` samples; the
//! reported value is the mean of the samples collected so far.

use log::warn;

use crate::config::{MAX_AVERAGE_WINDOW, SystemConfig};
use crate::tick::Delay;

const V_REF: f32 = 3.3;
const LM35_VOLTS_PER_DEGREE: f32 = 0.01;

/// Normalised analog input (0.0 = ground, 1.0 = reference).
pub trait AnalogSource {
    /// `None` when the conversion failed.
    fn read_normalised(&mut self) -> Option<f32>;
}

pub fn lm35_to_celsius(normalised: f32) -> f32 {
    normalised * V_REF / LM35_VOLTS_PER_DEGREE
}

pub fn celsius_to_fahrenheit(c: f32) -> f32 {
    c * 9.0 / 5.0 + 32.0
}

#[derive(Debug, Clone, Copy)]
pub struct TemperatureReading {
    pub celsius: f32,
    pub over_temp: bool,
}

pub struct TemperatureSensor<A: AnalogSource> {
    adc: A,
    samples: [f32; MAX_AVERAGE_WINDOW],
    window: usize,
    filled: usize,
    next: usize,
    sample_delay: Delay,
    threshold_c: f32,
}

impl<A: AnalogSource> TemperatureSensor<A> {
    pub fn new(adc: A, cfg: &SystemConfig) -> Self {
        Self {
            adc,
            samples: [0.0; MAX_AVERAGE_WINDOW],
            window: usize::from(cfg.temp_average_window).clamp(1, MAX_AVERAGE_WINDOW),
            filled: 0,
            next: 0,
            sample_delay: Delay::new(cfg.temp_sample_interval_ms),
            threshold_c: cfg.over_temp_threshold_c,
        }
    }

    /// Accumulate tick time and sample when the interval elapses.
    pub fn update(&mut self, elapsed_ms: u32) -> TemperatureReading {
        if self.sample_delay.update(elapsed_ms) {
            match self.adc.read_normalised() {
                Some(n) => self.push(lm35_to_celsius(n)),
                None => warn!("temperature: ADC read failed, keeping average"),
            }
        }
        self.read()
    }

    pub fn read(&self) -> TemperatureReading {
        let celsius = self.celsius();
        TemperatureReading {
            celsius,
            over_temp: celsius > self.threshold_c,
        }
    }

    pub fn celsius(&self) -> f32 {
        if self.filled == 0 {
            return 0.0;
        }
        self.samples[..self.filled].iter().sum::<f32>() / self.filled as f32
    }

    pub fn fahrenheit(&self) -> f32 {
        celsius_to_fahrenheit(self.celsius())
    }

    fn push(&mut self, celsius: f32) {
        self.samples[self.next] = celsius;
        self.next = (self.next + 1) % self.window;
        self.filled = (self.filled + 1).min(self.window);
    }
}
