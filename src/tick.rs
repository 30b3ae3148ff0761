//! Tick source and accumulated-time helpers.
//!
//! Every timer in the firmware is "accumulated time ≥ threshold".  The
//! main loop advances a [`TimeBase`] once per scheduling pass and hands
//! the elapsed milliseconds down to every FSM, which feeds them into its
//! own [`Timer`] / [`Delay`] and resets them on state changes.
//!
//! ```text
//!  TimeBase::advance() ──elapsed_ms──▶ debounce ─▶ keypad ─▶ alarm ─▶ wifi
//!                                          │           │        │        │
//!                                        Timer       Timer    Timer    Delay
//! ```
//!
//! The millisecond counter is a `u32` and wraps after ~49.7 days.  Timers
//! only ever see per-pass elapsed time, so wrap is harmless.

/// Monotonic millisecond counter advanced by a fixed period.
#[derive(Debug, Clone, Copy)]
pub struct TimeBase {
    now_ms: u32,
    period_ms: u32,
}

impl TimeBase {
    pub fn new(period_ms: u32) -> Self {
        Self { now_ms: 0, period_ms }
    }

    /// Advance by one period.  Returns the elapsed milliseconds for this pass.
    pub fn advance(&mut self) -> u32 {
        self.now_ms = self.now_ms.wrapping_add(self.period_ms);
        self.period_ms
    }

    pub fn now_ms(&self) -> u32 {
        self.now_ms
    }

    pub fn period_ms(&self) -> u32 {
        self.period_ms
    }
}

/// Accumulates elapsed time until explicitly reset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Timer {
    elapsed_ms: u32,
}

impl Timer {
    pub const fn new() -> Self {
        Self { elapsed_ms: 0 }
    }

    /// Add one pass worth of elapsed time.  Saturates instead of wrapping so
    /// a long-idle timer never appears fresh again.
    pub fn accumulate(&mut self, elapsed_ms: u32) {
        self.elapsed_ms = self.elapsed_ms.saturating_add(elapsed_ms);
    }

    pub fn elapsed_ms(&self) -> u32 {
        self.elapsed_ms
    }

    pub fn reached(&self, threshold_ms: u32) -> bool {
        self.elapsed_ms >= threshold_ms
    }

    pub fn reset(&mut self) {
        self.elapsed_ms = 0;
    }
}

/// Periodic delay: fires once every `duration_ms` of accumulated time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delay {
    timer: Timer,
    duration_ms: u32,
}

impl Delay {
    pub const fn new(duration_ms: u32) -> Self {
        Self {
            timer: Timer::new(),
            duration_ms,
        }
    }

    /// Accumulate `elapsed_ms`; returns `true` (and restarts) once the
    /// duration has been reached.
    pub fn update(&mut self, elapsed_ms: u32) -> bool {
        self.timer.accumulate(elapsed_ms);
        if self.timer.reached(self.duration_ms) {
            self.timer.reset();
            true
        } else {
            false
        }
    }

    pub fn restart(&mut self) {
        self.timer.reset();
    }

    pub fn set_duration(&mut self, duration_ms: u32) {
        self.duration_ms = duration_ms;
        self.timer.reset();
    }

    pub fn duration_ms(&self) -> u32 {
        self.duration_ms
    }
}
