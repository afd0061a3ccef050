//! # Traps
//!
//! Software interrupts, undefined instructions and host interrupts all
//! enter their handler the same way:
//!
//! 1. CPSR is copied to the SPSR of the target mode.
//! 2. The CPU switches to the target mode (banking R13/R14).
//! 3. R14 receives the return address.
//! 4. T is cleared and I is set.
//! 5. PC jumps to the fixed vector.
//!
//! | Trap        | Mode       | Vector | R14                      |
//! |-------------|------------|--------|--------------------------|
//! | SWI         | Supervisor | 0x08   | next instruction         |
//! | Undefined   | Undefined  | 0x04   | next instruction         |
//! | IRQ         | IRQ        | 0x18   | next instruction + 4     |

use std::fmt::Display;

use crate::cpu::arm7tdmi::Arm7tdmi;
use crate::cpu::cpu_modes::Mode;
use crate::cpu::psr::CpuState;
use crate::cpu::registers::REG_LR;
use crate::memory::Bus;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exception {
    SoftwareInterrupt,
    Undefined,
    Irq,
}

impl Exception {
    #[must_use]
    pub const fn vector(self) -> u32 {
        match self {
            Self::Undefined => 0x04,
            Self::SoftwareInterrupt => 0x08,
            Self::Irq => 0x18,
        }
    }

    #[must_use]
    pub const fn target_mode(self) -> Mode {
        match self {
            Self::SoftwareInterrupt => Mode::Supervisor,
            Self::Undefined => Mode::Undefined,
            Self::Irq => Mode::Irq,
        }
    }
}

impl Display for Exception {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SoftwareInterrupt => f.write_str("SWI"),
            Self::Undefined => f.write_str("UND"),
            Self::Irq => f.write_str("IRQ"),
        }
    }
}

impl<B: Bus> Arm7tdmi<B> {
    /// Enters the trap handler without charging the refill. R15 is taken
    /// as the trapping instruction for SWI and UND and as the next
    /// instruction for IRQ.
    pub(crate) fn take_exception(&mut self, kind: Exception) {
        let pc = self.registers.program_counter();
        let return_address = match kind {
            Exception::SoftwareInterrupt | Exception::Undefined => {
                pc.wrapping_add(self.cpsr.cpu_state().instruction_size())
            }
            Exception::Irq => pc.wrapping_add(4),
        };

        let saved = self.cpsr;
        let mode = kind.target_mode();
        self.switch_mode(mode);
        if let Some(spsr) = self.register_bank.spsr_mut(mode) {
            *spsr = saved;
        }

        self.registers.set_register_at(REG_LR, return_address);
        self.cpsr.set_cpu_state(CpuState::Arm);
        self.cpsr.set_irq_disable(true);
        self.branch_to(kind.vector());

        tracing::debug!(
            "{kind} taken at 0x{pc:08X}, return address 0x{return_address:08X}"
        );
    }

    /// Forces a trap from outside instruction execution, as if the
    /// instruction in R15 had raised it, and returns the refill cycles.
    pub fn enter_exception(&mut self, kind: Exception) -> i32 {
        self.take_exception(kind);
        self.flushed = false;
        let cycles = self.refill();
        self.account(0, cycles);
        cycles
    }

    /// Host interrupt line. Ignored while CPSR.I is set; returns the cycles
    /// spent entering the handler, zero when masked.
    pub fn raise_irq(&mut self) -> i32 {
        if self.cpsr.irq_disable() {
            return 0;
        }
        self.enter_exception(Exception::Irq)
    }
}
