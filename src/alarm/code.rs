//! Four-key code buffer.

use core::fmt;

use crate::error::CodeError;

/// Keys per code.
pub const CODE_LEN: usize = 4;

/// Exactly four keypad characters, compared positionally.
///
/// Stored codes are always digits (enforced by [`CodeBuffer::parse`]);
/// the entry buffer takes any key the keypad produces, so a stray letter
/// simply never matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodeBuffer {
    keys: [char; CODE_LEN],
}

impl Default for CodeBuffer {
    fn default() -> Self {
        Self {
            keys: ['0'; CODE_LEN],
        }
    }
}

impl CodeBuffer {
    /// Parse a four-digit code such as `"1805"`.
    pub fn parse(s: &str) -> Result<Self, CodeError> {
        let mut keys = ['0'; CODE_LEN];
        let mut len = 0;
        for c in s.chars() {
            if len == CODE_LEN {
                return Err(CodeError::WrongLength);
            }
            if !c.is_ascii_digit() {
                return Err(CodeError::NotADigit);
            }
            keys[len] = c;
            len += 1;
        }
        if len != CODE_LEN {
            return Err(CodeError::WrongLength);
        }
        Ok(Self { keys })
    }

    /// Overwrite one slot.  `index` is taken modulo the code length.
    pub fn set(&mut self, index: usize, key: char) {
        self.keys[index % CODE_LEN] = key;
    }

    pub fn keys(&self) -> &[char; CODE_LEN] {
        &self.keys
    }
}

impl fmt::Display for CodeBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for k in self.keys {
            write!(f, "{k}")?;
        }
        Ok(())
    }
}
