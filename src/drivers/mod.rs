//! Input and indicator drivers: debounced lines, matrix keypad, LEDs.

pub mod debounce;
pub mod indicators;
pub mod keypad;
