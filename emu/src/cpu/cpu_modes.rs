//! # Operating Modes
//!
//! ```text
//! ┌────────────┬───────┬──────────────────────────┬──────┐
//! │ Mode       │ Bits  │ Banked registers         │ SPSR │
//! ├────────────┼───────┼──────────────────────────┼──────┤
//! │ User       │ 10000 │ none (owns the R8-R14)   │  no  │
//! │ FIQ        │ 10001 │ R8-R14                   │ yes  │
//! │ IRQ        │ 10010 │ R13-R14                  │ yes  │
//! │ Supervisor │ 10011 │ R13-R14                  │ yes  │
//! │ Abort      │ 10111 │ R13-R14                  │ yes  │
//! │ Undefined  │ 11011 │ R13-R14                  │ yes  │
//! │ System     │ 11111 │ shares User registers    │  no  │
//! └────────────┴───────┴──────────────────────────┴──────┘
//! ```

use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::error::CpuError;

#[derive(Debug, Default, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub enum Mode {
    /// The normal program execution state.
    User = 0b10000,

    /// Designed to support a data transfer or channel process.
    Fiq = 0b10001,

    /// Used for general-purpose interrupt handling.
    Irq = 0b10010,

    /// Protected mode for the operating system.
    #[default]
    Supervisor = 0b10011,

    /// Entered after a data or instruction prefetch abort.
    Abort = 0b10111,

    /// Entered when an undefined instruction is executed.
    Undefined = 0b11011,

    /// A privileged user mode for the operating system.
    System = 0b11111,
}

impl Mode {
    /// User and System have no saved status register.
    #[must_use]
    pub const fn has_spsr(self) -> bool {
        !matches!(self, Self::User | Self::System)
    }

    #[must_use]
    pub const fn is_privileged(self) -> bool {
        !matches!(self, Self::User)
    }
}

impl From<Mode> for u32 {
    fn from(m: Mode) -> Self {
        m as Self
    }
}

impl TryFrom<u32> for Mode {
    type Error = CpuError;

    fn try_from(n: u32) -> Result<Self, Self::Error> {
        match n {
            0b10000 => Ok(Self::User),
            0b10001 => Ok(Self::Fiq),
            0b10010 => Ok(Self::Irq),
            0b10011 => Ok(Self::Supervisor),
            0b10111 => Ok(Self::Abort),
            0b11011 => Ok(Self::Undefined),
            0b11111 => Ok(Self::System),
            _ => Err(CpuError::InvalidMode(n)),
        }
    }
}

impl Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::User => "usr",
            Self::Fiq => "fiq",
            Self::Irq => "irq",
            Self::Supervisor => "svc",
            Self::Abort => "abt",
            Self::Undefined => "und",
            Self::System => "sys",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn check_mode_round_trip() {
        for mode in [
            Mode::User,
            Mode::Fiq,
            Mode::Irq,
            Mode::Supervisor,
            Mode::Abort,
            Mode::Undefined,
            Mode::System,
        ] {
            assert_eq!(Mode::try_from(u32::from(mode)), Ok(mode));
        }
    }

    #[test]
    fn check_invalid_modes() {
        let valid = [0x10, 0x11, 0x12, 0x13, 0x17, 0x1B, 0x1F];
        for bits in 0..32 {
            if !valid.contains(&bits) {
                assert_eq!(Mode::try_from(bits), Err(CpuError::InvalidMode(bits)));
            }
        }
    }

    #[test]
    fn check_spsr_presence() {
        assert!(!Mode::User.has_spsr());
        assert!(!Mode::System.has_spsr());
        assert!(Mode::Fiq.has_spsr());
        assert!(Mode::Undefined.has_spsr());
        assert!(!Mode::User.is_privileged());
        assert!(Mode::System.is_privileged());
    }
}
