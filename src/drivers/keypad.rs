//! 4×4 matrix keypad: pin-level scanner plus the debounce/decode FSM.
//!
//! ## Hardware
//!
//! Rows are push-pull outputs, columns are inputs with pull-ups.  A scan
//! drives every row high, then pulls one row low at a time and reads the
//! columns; a pressed key shorts its column to the low row.
//!
//! ```text
//!          C0   C1   C2   C3
//!   R0 ──  1    2    3    A
//!   R1 ──  4    5    6    B
//!   R2 ──  7    8    9    C
//!   R3 ──  *    0    #    D
//! ```
//!
//! ## Decode FSM
//!
//! ```text
//!  Scanning ──[key seen]──▶ DebounceHold ──[t≥T, same key]──▶ KeyHeld
//!     ▲                          │ [t≥T, other/none]              │
//!     │◀─────────────────────────┘                                │
//!     └────────────[other/none, emit held key]────────────────────┘
//! ```
//!
//! A key is reported once, on release, so holding a key never repeats.

use embedded_hal::digital::{InputPin, OutputPin};
use log::warn;

use crate::tick::Timer;

/// Row-major key legend.
pub const KEY_MAP: [[char; 4]; 4] = [
    ['1', '2', '3', 'A'],
    ['4', '5', '6', 'B'],
    ['7', '8', '9', 'C'],
    ['*', '0', '#', 'D'],
];

/// Anything that can report which key is down right now (no debouncing).
pub trait KeyScanner {
    fn scan(&mut self) -> Option<char>;
}

// ───────────────────────────────────────────────────────────────
// Pin-level scanner
// ───────────────────────────────────────────────────────────────

/// Row/column sweep over embedded-hal pins.
pub struct MatrixKeypad<R: OutputPin, C: InputPin> {
    rows: [R; 4],
    cols: [C; 4],
}

impl<R: OutputPin, C: InputPin> MatrixKeypad<R, C> {
    pub fn new(rows: [R; 4], cols: [C; 4]) -> Self {
        Self { rows, cols }
    }

    fn release_all_rows(&mut self) {
        for row in &mut self.rows {
            if let Err(e) = row.set_high() {
                warn!("keypad: row release failed: {:?}", e);
            }
        }
    }
}

impl<R: OutputPin, C: InputPin> KeyScanner for MatrixKeypad<R, C> {
    /// Pin errors are logged and read as "no key".
    fn scan(&mut self) -> Option<char> {
        self.release_all_rows();

        for r in 0..4 {
            if let Err(e) = self.rows[r].set_low() {
                warn!("keypad: row {} drive failed: {:?}", r, e);
                continue;
            }
            let hit = self
                .cols
                .iter_mut()
                .position(|col| col.is_low().unwrap_or(false));
            if let Err(e) = self.rows[r].set_high() {
                warn!("keypad: row {} release failed: {:?}", r, e);
            }
            if let Some(c) = hit {
                return Some(KEY_MAP[r][c]);
            }
        }
        None
    }
}

// ───────────────────────────────────────────────────────────────
// Decode FSM
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeypadState {
    Scanning,
    DebounceHold,
    KeyHeld,
}

/// Debounced key decoder.  Owns no pins; the scanner is passed per call.
#[derive(Debug, Clone)]
pub struct Keypad {
    state: KeypadState,
    last_key: Option<char>,
    timer: Timer,
    threshold_ms: u32,
}

impl Keypad {
    pub fn new(threshold_ms: u32) -> Self {
        Self {
            state: KeypadState::Scanning,
            last_key: None,
            timer: Timer::new(),
            threshold_ms,
        }
    }

    pub fn state(&self) -> KeypadState {
        self.state
    }

    /// Advance the decoder by one tick.  Returns the released key, if any.
    pub fn update(&mut self, scanner: &mut impl KeyScanner, elapsed_ms: u32) -> Option<char> {
        match self.state {
            KeypadState::Scanning => {
                if let Some(key) = scanner.scan() {
                    self.last_key = Some(key);
                    self.timer.reset();
                    self.state = KeypadState::DebounceHold;
                }
                None
            }

            KeypadState::DebounceHold => {
                self.timer.accumulate(elapsed_ms);
                if self.timer.reached(self.threshold_ms) {
                    self.state = if scanner.scan() == self.last_key {
                        KeypadState::KeyHeld
                    } else {
                        KeypadState::Scanning
                    };
                }
                None
            }

            KeypadState::KeyHeld => {
                if scanner.scan() == self.last_key {
                    return None;
                }
                self.state = KeypadState::Scanning;
                self.last_key.take()
            }
        }
    }
}
