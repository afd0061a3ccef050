//! # Pipeline View
//!
//! R15 holds the address of the instruction being executed. The three
//! stage pipeline means a program never sees that address: reads of R15
//! return it plus an offset that depends on the instruction set and on
//! how the register is used.
//!
//! ```text
//!                         ARM          Thumb
//! operand                 PC + 8       PC + 4
//! register-shifted op.    PC + 12      PC + 4
//! stored by STR/STM       PC + 12      PC + 6
//! literal pool base       PC + 8       (PC + 4) & !2
//! ```
//!
//! Timing follows the same view: an instruction pays for the fetch two
//! slots ahead of it, and a write to R15 empties the pipeline so the next
//! two fetches are paid again from the new address.

use crate::cpu::arm7tdmi::Arm7tdmi;
use crate::cpu::psr::CpuState;
use crate::cpu::registers::REG_PROGRAM_COUNTER;
use crate::memory::Bus;

/// How an instruction reads R15.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PcRole {
    Operand,

    /// Rn or Rm of a data-processing instruction whose shift amount comes
    /// from a register. The extra cycle advances the pipeline once more.
    RegisterShiftOperand,

    /// Value written to memory by a store.
    StoreSource,

    /// Base of a relative branch.
    BranchBase,

    /// Word-aligned base of PC-relative loads and address computations.
    LiteralBase,
}

impl<B: Bus> Arm7tdmi<B> {
    /// R15 as seen by the executing instruction.
    #[must_use]
    pub fn effective_pc(&self, role: PcRole) -> u32 {
        let pc = self.registers.program_counter();
        match (self.cpsr.cpu_state(), role) {
            (CpuState::Arm, PcRole::RegisterShiftOperand | PcRole::StoreSource) => {
                pc.wrapping_add(12)
            }
            (CpuState::Arm, _) => pc.wrapping_add(8),
            (CpuState::Thumb, PcRole::StoreSource) => pc.wrapping_add(6),
            (CpuState::Thumb, PcRole::LiteralBase) => pc.wrapping_add(4) & !2,
            (CpuState::Thumb, _) => pc.wrapping_add(4),
        }
    }

    /// Reads a register the way an instruction does.
    pub(crate) fn read_register(&self, index: usize, role: PcRole) -> u32 {
        if index == REG_PROGRAM_COUNTER {
            self.effective_pc(role)
        } else {
            self.registers.register_at(index)
        }
    }

    /// Writes a register the way an instruction does: R15 branches.
    pub(crate) fn write_register(&mut self, index: usize, value: u32) {
        if index == REG_PROGRAM_COUNTER {
            self.branch_to(value);
        } else {
            self.registers.set_register_at(index, value);
        }
    }

    /// Moves execution to `target`, aligned for the current instruction
    /// set, and marks the pipeline for a refill.
    pub(crate) fn branch_to(&mut self, target: u32) {
        let target = match self.cpsr.cpu_state() {
            CpuState::Arm => target & !3,
            CpuState::Thumb => target & !1,
        };
        self.registers.set_program_counter(target);
        self.flushed = true;
    }

    /// Charges the fetch of the prefetch slot of the instruction at `pc`.
    pub(crate) fn charge_code_fetch(&mut self, pc: u32, width: u32) {
        let address = pc.wrapping_add(2 * width);
        let sequential =
            !self.fetch_non_sequential && self.last_code_fetch == Some(address.wrapping_sub(width));
        self.cycles += self.bus.access_cycles(sequential, width == 4, address);
        self.last_code_fetch = Some(address);
    }

    /// Cycles to refill the pipeline at the current PC: one
    /// non-sequential and one sequential fetch.
    pub(crate) fn refill(&mut self) -> i32 {
        let width = self.cpsr.cpu_state().instruction_size();
        let target = self.registers.program_counter();
        let next = target.wrapping_add(width);

        let cycles = self.bus.access_cycles(false, width == 4, target)
            + self.bus.access_cycles(true, width == 4, next);
        self.last_code_fetch = Some(next);
        cycles
    }

    pub(crate) fn charge_data_access(&mut self, sequential: bool, is_32bit: bool, address: u32) {
        self.cycles += self.bus.access_cycles(sequential, is_32bit, address);
    }

    pub(crate) fn charge_internal(&mut self, cycles: i32) {
        self.cycles += cycles;
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::config::CpuConfig;
    use crate::memory::test_memory::TestMemory;

    fn cpu() -> Arm7tdmi<TestMemory> {
        Arm7tdmi::new(TestMemory::default(), CpuConfig::default())
    }

    #[test]
    fn check_arm_pc_offsets() {
        let mut cpu = cpu();
        cpu.registers.set_program_counter(0x100);
        assert_eq!(cpu.effective_pc(PcRole::Operand), 0x108);
        assert_eq!(cpu.effective_pc(PcRole::BranchBase), 0x108);
        assert_eq!(cpu.effective_pc(PcRole::RegisterShiftOperand), 0x10C);
        assert_eq!(cpu.effective_pc(PcRole::StoreSource), 0x10C);
        assert_eq!(cpu.effective_pc(PcRole::LiteralBase), 0x108);
    }

    #[test]
    fn check_thumb_pc_offsets() {
        let mut cpu = cpu();
        cpu.cpsr.set_cpu_state(CpuState::Thumb);
        cpu.registers.set_program_counter(0x102);
        assert_eq!(cpu.effective_pc(PcRole::Operand), 0x106);
        assert_eq!(cpu.effective_pc(PcRole::StoreSource), 0x108);
        assert_eq!(cpu.effective_pc(PcRole::LiteralBase), 0x104);
        cpu.registers.set_program_counter(0x100);
        assert_eq!(cpu.effective_pc(PcRole::LiteralBase), 0x104);
    }

    #[test]
    fn check_branch_aligns_for_state() {
        let mut cpu = cpu();
        cpu.branch_to(0x203);
        assert_eq!(cpu.registers.program_counter(), 0x200);
        cpu.cpsr.set_cpu_state(CpuState::Thumb);
        cpu.branch_to(0x203);
        assert_eq!(cpu.registers.program_counter(), 0x202);
    }

    #[test]
    fn check_sequential_code_fetches() {
        let mut memory = TestMemory::default();
        memory.sequential_cycles = 1;
        memory.non_sequential_cycles = 3;
        let mut cpu = Arm7tdmi::new(memory, CpuConfig::default());

        cpu.charge_code_fetch(0, 4);
        assert_eq!(cpu.cycles, 3);
        cpu.charge_code_fetch(4, 4);
        assert_eq!(cpu.cycles, 4);
        cpu.charge_code_fetch(0x40, 4);
        assert_eq!(cpu.cycles, 7);

        cpu.registers.set_program_counter(0x80);
        assert_eq!(cpu.refill(), 4);
        assert_eq!(cpu.last_code_fetch, Some(0x84));
    }
}
