//! # Program Status Registers (CPSR and SPSR)
//!
//! ```text
//! 31 30 29 28 27       8 7 6 5 4   0
//! ┌──┬──┬──┬──┬─────────┬─┬─┬─┬─────┐
//! │N │Z │C │V │Reserved │I│F│T│Mode │
//! └──┴──┴──┴──┴─────────┴─┴─┴─┴─────┘
//! ```
//!
//! - **Flags (28-31)**: tested by [`condition`](super::condition)
//! - **I/F bits (7-6)**: IRQ/FIQ disable
//! - **T bit (5)**: instruction set select, ARM (0) or Thumb (1)
//! - **Mode (0-4)**: see [`cpu_modes`](super::cpu_modes)
//!
//! The CPSR mode field always holds one of the seven valid modes: every
//! write that could change it goes through a validated mode switch.
//! An SPSR is raw storage and may hold anything a program wrote to it.

use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::bitwise::Bits;
use crate::cpu::alu::ArithmeticOpResult;
use crate::cpu::{condition::Condition, cpu_modes::Mode};
use crate::error::CpuError;

/// Bits an unprivileged write is allowed to touch.
pub const FLAGS_MASK: u32 = 0xF000_0000;

/// Control byte: mode, T, F and I.
pub const CONTROL_MASK: u32 = 0x0000_00FF;

/// Program Status Register (CPSR or SPSR).
///
/// # Example
///
/// ```
/// use emu::cpu::psr::Psr;
///
/// let mut cpsr = Psr::default();
/// cpsr.set_zero_flag(true);
/// assert!(cpsr.zero_flag());
/// ```
#[derive(Default, Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Psr(u32);

impl Psr {
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    #[must_use]
    pub fn can_execute(self, cond: Condition) -> bool {
        use Condition::{AL, CC, CS, EQ, GE, GT, HI, LE, LS, LT, MI, NE, NV, PL, VC, VS};
        match cond {
            EQ => self.zero_flag(),
            NE => !self.zero_flag(),
            CS => self.carry_flag(),
            CC => !self.carry_flag(),
            MI => self.sign_flag(),
            PL => !self.sign_flag(),
            VS => self.overflow_flag(),
            VC => !self.overflow_flag(),
            HI => self.carry_flag() && !self.zero_flag(),
            LS => !self.carry_flag() || self.zero_flag(),
            GE => self.sign_flag() == self.overflow_flag(),
            LT => self.sign_flag() != self.overflow_flag(),
            GT => !self.zero_flag() && (self.sign_flag() == self.overflow_flag()),
            LE => self.zero_flag() || (self.sign_flag() != self.overflow_flag()),
            AL => true,
            // Reserved on ARMv4, never executes.
            NV => false,
        }
    }

    /// N => Bit 31
    #[must_use]
    pub fn sign_flag(self) -> bool {
        self.0.get_bit(31)
    }

    /// Z => Bit 30
    #[must_use]
    pub fn zero_flag(self) -> bool {
        self.0.get_bit(30)
    }

    /// C => Bit 29, (0=Borrow/No Carry, 1=Carry/No Borrow)
    #[must_use]
    pub fn carry_flag(self) -> bool {
        self.0.get_bit(29)
    }

    /// V => Bit 28
    #[must_use]
    pub fn overflow_flag(self) -> bool {
        self.0.get_bit(28)
    }

    /// I => Bit 7, (0=Enable, 1=Disable)
    #[must_use]
    pub fn irq_disable(self) -> bool {
        self.0.get_bit(7)
    }

    /// F => Bit 6, (0=Enable, 1=Disable)
    #[must_use]
    pub fn fiq_disable(self) -> bool {
        self.0.get_bit(6)
    }

    /// T => Bit 5, (0=ARM, 1=THUMB)
    #[must_use]
    pub fn state_bit(self) -> bool {
        self.0.get_bit(5)
    }

    #[must_use]
    pub const fn mode_bits(self) -> u32 {
        self.0 & 0b11111
    }

    /// Decodes the mode field.
    ///
    /// # Errors
    ///
    /// Fails when the field holds none of the seven defined modes, which
    /// can only happen for an SPSR.
    pub fn try_mode(self) -> Result<Mode, CpuError> {
        Mode::try_from(self.mode_bits())
    }

    /// The mode of a CPSR. Falls back to Supervisor for an invalid field,
    /// which a CPSR never holds.
    #[must_use]
    pub fn mode(self) -> Mode {
        self.try_mode().unwrap_or_else(|err| {
            tracing::warn!("{err} in PSR=0x{:08X}, reading as Supervisor", self.0);
            Mode::Supervisor
        })
    }

    pub fn set_sign_flag(&mut self, value: bool) {
        self.0.set_bit(31, value);
    }

    pub fn set_zero_flag(&mut self, value: bool) {
        self.0.set_bit(30, value);
    }

    pub fn set_carry_flag(&mut self, value: bool) {
        self.0.set_bit(29, value);
    }

    pub fn set_overflow_flag(&mut self, value: bool) {
        self.0.set_bit(28, value);
    }

    /// Sets N and Z from a result, leaving C and V alone.
    pub fn set_nz(&mut self, result: u32) {
        self.set_sign_flag(result.get_bit(31));
        self.set_zero_flag(result == 0);
    }

    /// Sets N and Z from a 64-bit result of a long multiply.
    pub fn set_nz_long(&mut self, result: u64) {
        self.set_sign_flag(result.get_bit(63));
        self.set_zero_flag(result == 0);
    }

    pub fn set_flags(&mut self, op_result: &ArithmeticOpResult) {
        self.set_carry_flag(op_result.carry);
        self.set_zero_flag(op_result.zero);
        self.set_sign_flag(op_result.sign);
        self.set_overflow_flag(op_result.overflow);
    }

    pub fn set_irq_disable(&mut self, value: bool) {
        self.0.set_bit(7, value);
    }

    pub fn set_fiq_disable(&mut self, value: bool) {
        self.0.set_bit(6, value);
    }

    pub fn set_state_bit(&mut self, value: bool) {
        self.0.set_bit(5, value);
    }

    /// Writes the mode field without validation. Only meant for an SPSR or for
    /// callers that already performed the bank switch.
    pub const fn set_mode_raw(&mut self, m: u32) {
        self.0 = (self.0 & !0b11111) | (m & 0b11111);
    }

    pub const fn set_mode(&mut self, m: Mode) {
        self.0 = (self.0 & !0b11111) | m as u32;
    }

    #[must_use]
    pub fn cpu_state(self) -> CpuState {
        self.state_bit().into()
    }

    pub fn set_cpu_state(&mut self, state: CpuState) {
        self.set_state_bit(state.into());
    }

    /// Replaces the bits selected by `mask` with the ones from `value`.
    pub const fn write_masked(&mut self, value: u32, mask: u32) {
        self.0 = (self.0 & !mask) | (value & mask);
    }
}

impl From<Mode> for Psr {
    fn from(m: Mode) -> Self {
        let mut s = Self(0);
        s.set_mode(m);
        s
    }
}

impl From<Psr> for u32 {
    fn from(p: Psr) -> Self {
        p.0
    }
}

impl Display for Psr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let flag = |on: bool, c: char| if on { c } else { '-' };
        write!(
            f,
            "{}{}{}{} {}{}{} {:05b} ({:08X})",
            flag(self.sign_flag(), 'N'),
            flag(self.zero_flag(), 'Z'),
            flag(self.carry_flag(), 'C'),
            flag(self.overflow_flag(), 'V'),
            flag(self.irq_disable(), 'I'),
            flag(self.fiq_disable(), 'F'),
            flag(self.state_bit(), 'T'),
            self.mode_bits(),
            self.0,
        )
    }
}

/// The instruction set the CPU is decoding, selected by the T bit.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum CpuState {
    /// 16-bit instructions.
    Thumb,
    /// 32-bit instructions.
    Arm,
}

impl CpuState {
    /// Width in bytes of one instruction.
    #[must_use]
    pub const fn instruction_size(self) -> u32 {
        match self {
            Self::Arm => 4,
            Self::Thumb => 2,
        }
    }
}

impl From<CpuState> for bool {
    fn from(state: CpuState) -> Self {
        match state {
            CpuState::Arm => false,
            CpuState::Thumb => true,
        }
    }
}

impl From<bool> for CpuState {
    fn from(state: bool) -> Self {
        if state { Self::Thumb } else { Self::Arm }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn check_flags() {
        let mut cpsr = Psr(0);
        cpsr.set_sign_flag(true);
        cpsr.set_overflow_flag(true);
        assert!(cpsr.sign_flag());
        assert!(!cpsr.zero_flag());
        assert!(!cpsr.carry_flag());
        assert!(cpsr.overflow_flag());
        assert_eq!(u32::from(cpsr), 0x9000_0000);
    }

    #[test]
    fn check_control_bits() {
        let mut cpsr = Psr(0);
        cpsr.set_irq_disable(true);
        cpsr.set_fiq_disable(true);
        cpsr.set_cpu_state(CpuState::Thumb);
        assert_eq!(u32::from(cpsr), 0xE0);
        assert_eq!(cpsr.cpu_state(), CpuState::Thumb);
    }

    #[test]
    fn check_set_nz() {
        let mut cpsr = Psr(0);
        cpsr.set_carry_flag(true);
        cpsr.set_nz(0);
        assert!(cpsr.zero_flag());
        assert!(cpsr.carry_flag());
        cpsr.set_nz(0x8000_0000);
        assert!(cpsr.sign_flag());
        assert!(!cpsr.zero_flag());
    }

    #[test]
    fn check_modes() {
        let mut cpsr = Psr(0xF000_00FF);
        cpsr.set_mode(Mode::Irq);
        assert_eq!(cpsr.mode(), Mode::Irq);
        assert_eq!(u32::from(cpsr), 0xF000_00F2);

        let spsr = Psr(0x0000_0003);
        assert_eq!(spsr.try_mode(), Err(CpuError::InvalidMode(3)));
        assert_eq!(spsr.mode(), Mode::Supervisor);
    }

    #[test]
    fn check_can_execute() {
        let mut cpsr = Psr(0);
        assert!(cpsr.can_execute(Condition::AL));
        assert!(!cpsr.can_execute(Condition::NV));
        assert!(cpsr.can_execute(Condition::NE));

        cpsr.set_zero_flag(true);
        assert!(cpsr.can_execute(Condition::EQ));
        assert!(cpsr.can_execute(Condition::LE));
        assert!(!cpsr.can_execute(Condition::GT));

        cpsr.set_zero_flag(false);
        cpsr.set_sign_flag(true);
        assert!(cpsr.can_execute(Condition::LT));
        cpsr.set_overflow_flag(true);
        assert!(cpsr.can_execute(Condition::GE));
        assert!(cpsr.can_execute(Condition::GT));

        cpsr.set_carry_flag(true);
        assert!(cpsr.can_execute(Condition::HI));
        assert!(!cpsr.can_execute(Condition::LS));
    }

    #[test]
    fn check_write_masked() {
        let mut cpsr = Psr::from(Mode::User);
        cpsr.write_masked(0xA000_001F, FLAGS_MASK);
        assert_eq!(u32::from(cpsr), 0xA000_0010);
    }
}
