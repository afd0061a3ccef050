//! # Banked Registers
//!
//! Shadow storage for the registers each mode swaps in. See
//! [`cpu_modes`](super::cpu_modes) for the banking table.
//!
//! The shape of a bank depends on the mode: FIQ shadows R8-R14, the four
//! other exception modes shadow only R13-R14, and User/System own the base
//! copy of R8-R14 and have no SPSR. [`Shadow`] makes that a property of the
//! type instead of an indexing convention.

use serde::{Deserialize, Serialize};

use crate::cpu::cpu_modes::Mode;
use crate::cpu::psr::Psr;
use crate::cpu::registers::Registers;

#[derive(Default, Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct FiqBank {
    /// R8-R14.
    pub registers: [u32; 7],
    pub spsr: Psr,
}

#[derive(Default, Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct ExceptionBank {
    /// R13-R14.
    pub registers: [u32; 2],
    pub spsr: Psr,
}

/// A mutable view on the shadow registers of one mode.
pub enum Shadow<'a> {
    /// User and System: the base R8-R14, no SPSR.
    Base(&'a mut [u32; 7]),

    /// FIQ: its own R8-R14 and SPSR.
    Fiq {
        registers: &'a mut [u32; 7],
        spsr: &'a mut Psr,
    },

    /// Supervisor, Abort, IRQ and Undefined: R13-R14 and SPSR.
    Exception {
        registers: &'a mut [u32; 2],
        spsr: &'a mut Psr,
    },
}

/// Registers not currently live in the [`Registers`] file.
#[derive(Default, Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct RegisterBank {
    /// R8-R14 of User and System mode.
    pub user: [u32; 7],
    pub fiq: FiqBank,
    pub supervisor: ExceptionBank,
    pub abort: ExceptionBank,
    pub irq: ExceptionBank,
    pub undefined: ExceptionBank,
}

impl RegisterBank {
    pub fn shadow_mut(&mut self, mode: Mode) -> Shadow<'_> {
        let bank = match mode {
            Mode::User | Mode::System => return Shadow::Base(&mut self.user),
            Mode::Fiq => {
                return Shadow::Fiq {
                    registers: &mut self.fiq.registers,
                    spsr: &mut self.fiq.spsr,
                };
            }
            Mode::Supervisor => &mut self.supervisor,
            Mode::Abort => &mut self.abort,
            Mode::Irq => &mut self.irq,
            Mode::Undefined => &mut self.undefined,
        };

        Shadow::Exception {
            registers: &mut bank.registers,
            spsr: &mut bank.spsr,
        }
    }

    /// The saved status register of `mode`, if it has one.
    #[must_use]
    pub const fn spsr(&self, mode: Mode) -> Option<Psr> {
        match mode {
            Mode::User | Mode::System => None,
            Mode::Fiq => Some(self.fiq.spsr),
            Mode::Supervisor => Some(self.supervisor.spsr),
            Mode::Abort => Some(self.abort.spsr),
            Mode::Irq => Some(self.irq.spsr),
            Mode::Undefined => Some(self.undefined.spsr),
        }
    }

    pub fn spsr_mut(&mut self, mode: Mode) -> Option<&mut Psr> {
        match self.shadow_mut(mode) {
            Shadow::Base(_) => None,
            Shadow::Fiq { spsr, .. } | Shadow::Exception { spsr, .. } => Some(spsr),
        }
    }

    /// Exchanges the live R8-R14 of `from` with the shadow copies of `to`.
    /// Doing nothing when both are the same mode.
    pub fn swap(&mut self, live: &mut Registers, from: Mode, to: Mode) {
        if from == to {
            return;
        }

        let outgoing = live.high_registers();
        match self.shadow_mut(from) {
            Shadow::Base(registers) | Shadow::Fiq { registers, .. } => *registers = outgoing,
            Shadow::Exception { registers, .. } => *registers = [outgoing[5], outgoing[6]],
        }

        // Outside FIQ the live R8-R12 are the User ones.
        if from != Mode::Fiq {
            self.user[..5].copy_from_slice(&outgoing[..5]);
        }

        let mut incoming = self.user;
        match self.shadow_mut(to) {
            Shadow::Base(registers) | Shadow::Fiq { registers, .. } => incoming = *registers,
            Shadow::Exception { registers, .. } => {
                incoming[5] = registers[0];
                incoming[6] = registers[1];
            }
        }

        live.set_high_registers(incoming);
    }

    /// Reads register `index` as User mode sees it while `mode` is live.
    #[must_use]
    pub fn user_register(&self, live: &Registers, mode: Mode, index: usize) -> u32 {
        match (mode, index) {
            (Mode::User | Mode::System, _) | (_, 0..=7 | 15) => live.register_at(index),
            (Mode::Fiq, 8..=14) | (_, 13..=14) => self.user[index - 8],
            _ => live.register_at(index),
        }
    }

    /// Writes register `index` as User mode sees it while `mode` is live.
    pub fn set_user_register(&mut self, live: &mut Registers, mode: Mode, index: usize, value: u32) {
        match (mode, index) {
            (Mode::User | Mode::System, _) | (_, 0..=7 | 15) => live.set_register_at(index, value),
            (Mode::Fiq, 8..=14) | (_, 13..=14) => self.user[index - 8] = value,
            _ => live.set_register_at(index, value),
        }
    }
}
