//! Polled debounce engine for noisy digital inputs.
//!
//! ## Hardware
//!
//! Momentary switches (the "enter" push-button, gas detector output, any
//! monitored contact).  The line is sampled once per control tick and the
//! raw level is fed to [`DebounceChannel::update`] together with the
//! elapsed milliseconds.  No interrupt is involved.
//!
//! ## State machine
//!
//! ```text
//!        raw=1                   t≥T & raw=1
//!   Up ────────▶ FallingCandidate ──────────▶ Down
//!   ▲                │ t≥T & raw=0              │ raw=0
//!   │◀───────────────┘                          ▼
//!   │        t≥T & raw=0  (emit Released)  RisingCandidate
//!   └───────────────────────────────────────────┤
//!                          t≥T & raw=1  ──▶ Down
//! ```
//!
//! | Transition                   | Edge emitted                      |
//! |------------------------------|-----------------------------------|
//! | `RisingCandidate → Up`       | `Released` (full press cycle)     |
//! | `FallingCandidate → Down`    | `Pressed`, only if opted in       |
//! | anything else                | none                              |

use embedded_hal::digital::InputPin;
use log::warn;

use crate::tick::Timer;

/// Confirmed transition of a digital input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Pressed,
    Released,
}

/// Debounce states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebounceState {
    Up,
    FallingCandidate,
    Down,
    RisingCandidate,
}

/// One debounced input line.
#[derive(Debug, Clone)]
pub struct DebounceChannel {
    state: DebounceState,
    timer: Timer,
    threshold_ms: u32,
    report_press: bool,
}

impl DebounceChannel {
    /// Create a channel seeded from the input's current level so a switch
    /// held at boot does not produce a phantom release.
    pub fn new(initial_level: bool, threshold_ms: u32) -> Self {
        Self {
            state: if initial_level {
                DebounceState::Down
            } else {
                DebounceState::Up
            },
            timer: Timer::new(),
            threshold_ms,
            report_press: false,
        }
    }

    /// Also emit [`Edge::Pressed`] at `FallingCandidate → Down`.
    #[must_use]
    pub fn with_press_events(mut self) -> Self {
        self.report_press = true;
        self
    }

    pub fn state(&self) -> DebounceState {
        self.state
    }

    /// Debounced level: `true` while the input is considered asserted.
    pub fn is_down(&self) -> bool {
        matches!(
            self.state,
            DebounceState::Down | DebounceState::RisingCandidate
        )
    }

    /// Feed one raw sample.  Call exactly once per tick.
    pub fn update(&mut self, raw_level: bool, elapsed_ms: u32) -> Option<Edge> {
        match self.state {
            DebounceState::Up => {
                if raw_level {
                    self.timer.reset();
                    self.state = DebounceState::FallingCandidate;
                }
                None
            }

            DebounceState::FallingCandidate => {
                self.timer.accumulate(elapsed_ms);
                if !self.timer.reached(self.threshold_ms) {
                    return None;
                }
                if raw_level {
                    self.state = DebounceState::Down;
                    self.report_press.then_some(Edge::Pressed)
                } else {
                    self.state = DebounceState::Up;
                    None
                }
            }

            DebounceState::Down => {
                if !raw_level {
                    self.timer.reset();
                    self.state = DebounceState::RisingCandidate;
                }
                None
            }

            DebounceState::RisingCandidate => {
                self.timer.accumulate(elapsed_ms);
                if !self.timer.reached(self.threshold_ms) {
                    return None;
                }
                if raw_level {
                    self.state = DebounceState::Down;
                    None
                } else {
                    self.state = DebounceState::Up;
                    Some(Edge::Released)
                }
            }
        }
    }
}

/// A debounced GPIO: owns the pin and its channel.
pub struct DebouncedInput<P: InputPin> {
    pin: P,
    active_low: bool,
    channel: DebounceChannel,
}

impl<P: InputPin> DebouncedInput<P> {
    /// `active_low` selects pull-up wiring where a closed contact reads low.
    pub fn new(mut pin: P, active_low: bool, threshold_ms: u32) -> Self {
        let initial = Self::sample(&mut pin, active_low);
        Self {
            pin,
            active_low,
            channel: DebounceChannel::new(initial, threshold_ms),
        }
    }

    /// Sample the pin and advance the channel.  A failed read counts as
    /// "not asserted" so a flaky line can never fake a press.
    pub fn update(&mut self, elapsed_ms: u32) -> Option<Edge> {
        let level = Self::sample(&mut self.pin, self.active_low);
        self.channel.update(level, elapsed_ms)
    }

    pub fn is_down(&self) -> bool {
        self.channel.is_down()
    }

    fn sample(pin: &mut P, active_low: bool) -> bool {
        let raw = if active_low {
            pin.is_low()
        } else {
            pin.is_high()
        };
        raw.unwrap_or_else(|e| {
            warn!("debounce: pin read failed: {:?}", e);
            false
        })
    }
}
