//! # ARM7TDMI Core
//!
//! The host drives the core with [`Arm7tdmi::execute`], handing it a cycle
//! budget and getting back what is left (negative when the last
//! instruction overran it). Control returns at instruction boundaries only.
//!
//! Each instruction set has its own dispatch loop. An instruction that flips
//! the T bit ends its loop with the already debited budget and the
//! trampoline in `execute` enters the other loop, so the budget is never
//! checked twice nor debited twice for one instruction.
//!
//! ```text
//!            ┌──────────────┐  T set   ┌────────────────┐
//! execute ──►│   run_arm    │─────────►│   run_thumb    │
//!            │ fetch/decode │◄─────────│ fetch/decode   │
//!            └──────┬───────┘  T clear └───────┬────────┘
//!                   │ budget <= 0, break,      │
//!                   ▼ breakpoint               ▼
//!                residual                   residual
//! ```

use serde::{Deserialize, Serialize};

use crate::bitwise::Bits;
use crate::config::CpuConfig;
use crate::cpu::arm::mode::ArmModeOpcode;
use crate::cpu::cpu_modes::Mode;
use crate::cpu::psr::{CpuState, Psr};
use crate::cpu::register_bank::RegisterBank;
use crate::cpu::registers::Registers;
use crate::cpu::thumb::mode::ThumbModeOpcode;
use crate::error::CpuError;
use crate::memory::Bus;

/// Predicate consulted before every instruction with the address about to
/// execute.
pub type BreakpointHook = Box<dyn FnMut(u32) -> bool>;

/// Why a dispatch loop returned to the trampoline.
enum Exit {
    /// The T bit changed; continue in the other loop with this budget.
    Switch(i32),
    Done(i32),
}

/// Architectural state needed to resume execution elsewhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CpuSnapshot {
    pub registers: Registers,
    pub cpsr: Psr,
    pub register_bank: RegisterBank,
}

pub struct Arm7tdmi<B: Bus> {
    pub bus: B,

    pub cpsr: Psr,
    pub registers: Registers,
    pub register_bank: RegisterBank,

    config: CpuConfig,

    /// Address of the last code fetch that was charged.
    pub(crate) last_code_fetch: Option<u32>,

    break_requested: bool,
    breakpoint_hook: Option<BreakpointHook>,

    /// Address of the breakpoint the last `execute` stopped on, executed
    /// without consulting the hook on the next call.
    resume_from_breakpoint: Option<u32>,

    diagnostic: Option<CpuError>,

    instructions_executed: u64,
    cycles_consumed: u64,

    /// Cycles of the instruction being executed.
    pub(crate) cycles: i32,

    /// R15 was written by the instruction being executed.
    pub(crate) flushed: bool,

    /// The prefetch of the instruction being executed is non-sequential.
    pub(crate) fetch_non_sequential: bool,
}

impl<B: Bus> Arm7tdmi<B> {
    pub fn new(bus: B, config: CpuConfig) -> Self {
        let mut cpu = Self {
            bus,
            cpsr: Psr::default(),
            registers: Registers::default(),
            register_bank: RegisterBank::default(),
            config,
            last_code_fetch: None,
            break_requested: false,
            breakpoint_hook: None,
            resume_from_breakpoint: None,
            diagnostic: None,
            instructions_executed: 0,
            cycles_consumed: 0,
            cycles: 0,
            flushed: false,
            fetch_non_sequential: false,
        };
        cpu.reset();
        cpu
    }

    /// Puts the core in its reset state. The bus and the breakpoint hook
    /// are kept.
    pub fn reset(&mut self) {
        let mut cpsr = Psr::from(self.config.reset_mode);
        cpsr.set_irq_disable(self.config.irq_disabled_at_reset);
        cpsr.set_fiq_disable(self.config.fiq_disabled_at_reset);
        cpsr.set_cpu_state(self.config.start_in_thumb.into());

        self.cpsr = cpsr;
        self.registers = Registers::default();
        self.register_bank = RegisterBank::default();
        self.branch_to(self.config.reset_vector);

        self.last_code_fetch = None;
        self.break_requested = false;
        self.resume_from_breakpoint = None;
        self.diagnostic = None;
        self.instructions_executed = 0;
        self.cycles_consumed = 0;
        self.cycles = 0;
        self.flushed = false;
        self.fetch_non_sequential = false;

        tracing::debug!("reset to 0x{:08X} in {}", self.registers.program_counter(), self.cpsr);
    }

    #[must_use]
    pub const fn config(&self) -> &CpuConfig {
        &self.config
    }

    /// Runs instructions until `budget` is spent, a break is requested or a
    /// breakpoint is hit. Returns the budget left, which is negative when
    /// the last instruction cost more than what remained.
    pub fn execute(&mut self, budget: i32) -> i32 {
        let mut budget = budget;
        loop {
            let exit = match self.cpsr.cpu_state() {
                CpuState::Arm => self.run_arm(budget),
                CpuState::Thumb => self.run_thumb(budget),
            };

            match exit {
                Exit::Switch(remaining) => budget = remaining,
                Exit::Done(remaining) => return remaining,
            }
        }
    }

    fn run_arm(&mut self, mut budget: i32) -> Exit {
        while budget > 0 {
            if self.should_stop() {
                return Exit::Done(budget);
            }

            budget -= self.step_arm();

            if self.cpsr.cpu_state() != CpuState::Arm {
                return Exit::Switch(budget);
            }
        }

        Exit::Done(budget)
    }

    fn run_thumb(&mut self, mut budget: i32) -> Exit {
        while budget > 0 {
            if self.should_stop() {
                return Exit::Done(budget);
            }

            budget -= self.step_thumb();

            if self.cpsr.cpu_state() != CpuState::Thumb {
                return Exit::Switch(budget);
            }
        }

        Exit::Done(budget)
    }

    /// Executes exactly one instruction, ignoring breaks and breakpoints,
    /// and returns its cycles.
    pub fn step(&mut self) -> i32 {
        self.resume_from_breakpoint = None;
        match self.cpsr.cpu_state() {
            CpuState::Arm => self.step_arm(),
            CpuState::Thumb => self.step_thumb(),
        }
    }

    fn should_stop(&mut self) -> bool {
        if self.break_requested {
            self.break_requested = false;
            tracing::debug!("break at 0x{:08X}", self.registers.program_counter());
            return true;
        }

        if self.config.halt_on_invalid_mode && self.diagnostic.is_some() {
            return true;
        }

        let pc = self.registers.program_counter();
        if self.resume_from_breakpoint.take() == Some(pc) {
            return false;
        }

        let hit = self.breakpoint_hook.as_mut().is_some_and(|hook| hook(pc));
        if hit {
            tracing::debug!("breakpoint at 0x{pc:08X}");
            self.resume_from_breakpoint = Some(pc);
        }
        hit
    }

    fn begin_instruction(&mut self, width: u32) -> u32 {
        self.cycles = 0;
        self.flushed = false;
        self.fetch_non_sequential = false;

        let pc = self.registers.program_counter() & !(width - 1);
        self.registers.set_program_counter(pc);
        pc
    }

    fn finish_instruction(&mut self, pc: u32, width: u32) -> i32 {
        self.charge_code_fetch(pc, width);

        if self.flushed {
            let refill = self.refill();
            self.cycles += refill;
        } else {
            self.registers.advance_program_counter(width);
        }

        let cycles = self.cycles;
        self.account(1, cycles);
        cycles
    }

    fn step_arm(&mut self) -> i32 {
        let pc = self.begin_instruction(4);
        let opcode = ArmModeOpcode::from(self.bus.read_word(pc));
        tracing::trace!("0x{pc:08X}: {opcode}");

        if self.cpsr.can_execute(opcode.condition) {
            self.execute_arm(opcode);
        }

        self.finish_instruction(pc, 4)
    }

    fn step_thumb(&mut self) -> i32 {
        let pc = self.begin_instruction(2);
        let opcode = ThumbModeOpcode::from(self.bus.read_half_word(pc));
        tracing::trace!("0x{pc:08X}: {opcode}");

        self.execute_thumb(opcode);

        self.finish_instruction(pc, 2)
    }

    pub(crate) fn account(&mut self, instructions: u64, cycles: i32) {
        self.instructions_executed += instructions;
        self.cycles_consumed += u64::from(cycles.unsigned_abs());
    }

    /// Makes the current `execute` call return before the next instruction.
    pub const fn request_break(&mut self) {
        self.break_requested = true;
    }

    pub fn set_breakpoint_hook(&mut self, hook: BreakpointHook) {
        self.breakpoint_hook = Some(hook);
    }

    pub fn clear_breakpoint_hook(&mut self) {
        self.breakpoint_hook = None;
        self.resume_from_breakpoint = None;
    }

    /// Asks the breakpoint hook about `address`. Always false without a hook.
    pub fn is_breakpoint(&mut self, address: u32) -> bool {
        self.breakpoint_hook
            .as_mut()
            .is_some_and(|hook| hook(address))
    }

    /// Switches to the mode encoded by `bits`, banking registers.
    ///
    /// # Errors
    ///
    /// Returns [`CpuError::InvalidMode`] and leaves every register untouched
    /// when `bits` is not a defined mode.
    pub fn change_mode(&mut self, bits: u32) -> Result<(), CpuError> {
        let mode = Mode::try_from(bits)?;
        self.switch_mode(mode);
        Ok(())
    }

    /// Switches to `mode`, banking registers. Does nothing for the current mode.
    pub fn switch_mode(&mut self, mode: Mode) {
        let current = self.cpsr.mode();
        if current == mode {
            return;
        }

        self.register_bank.swap(&mut self.registers, current, mode);
        self.cpsr.set_mode(mode);
        tracing::debug!("mode {current} -> {mode}");
    }

    /// Replaces the whole CPSR, switching banks for its mode.
    ///
    /// # Errors
    ///
    /// Fails without changing anything when the mode field is invalid.
    pub fn write_status(&mut self, psr: Psr) -> Result<(), CpuError> {
        let mode = psr.try_mode()?;
        self.switch_mode(mode);
        self.cpsr = psr;
        Ok(())
    }

    #[must_use]
    pub const fn read_status(&self) -> Psr {
        self.cpsr
    }

    /// SPSR of the current mode, `None` in User and System.
    #[must_use]
    pub fn spsr(&self) -> Option<Psr> {
        self.register_bank.spsr(self.cpsr.mode())
    }

    /// Register `index` of the current mode. R15 reads as the address of
    /// the next instruction to execute.
    #[must_use]
    pub const fn read(&self, index: usize) -> u32 {
        self.registers.register_at(index)
    }

    pub const fn write(&mut self, index: usize, value: u32) {
        self.registers.set_register_at(index, value);
    }

    /// CPSR = SPSR of the current mode, used by exception returns.
    pub(crate) fn restore_cpsr_from_spsr(&mut self) {
        let Some(spsr) = self.spsr() else {
            return;
        };

        if let Err(err) = self.write_status(spsr) {
            self.report(err);
        }
    }

    pub(crate) fn report(&mut self, err: CpuError) {
        tracing::warn!("{err} at 0x{:08X}", self.registers.program_counter());
        self.diagnostic = Some(err);
    }

    /// The last diagnostic raised during execution, if any. Taking it lets
    /// a core configured to halt on invalid modes run again.
    pub const fn take_diagnostic(&mut self) -> Option<CpuError> {
        self.diagnostic.take()
    }

    #[must_use]
    pub const fn instructions_executed(&self) -> u64 {
        self.instructions_executed
    }

    #[must_use]
    pub const fn cycles_consumed(&self) -> u64 {
        self.cycles_consumed
    }

    #[must_use]
    pub const fn snapshot(&self) -> CpuSnapshot {
        CpuSnapshot {
            registers: self.registers,
            cpsr: self.cpsr,
            register_bank: self.register_bank,
        }
    }

    /// Loads a snapshot. The pipeline restarts at its R15.
    ///
    /// # Errors
    ///
    /// Fails without changing anything when the CPSR has an invalid mode.
    pub fn restore(&mut self, snapshot: CpuSnapshot) -> Result<(), CpuError> {
        snapshot.cpsr.try_mode()?;
        self.registers = snapshot.registers;
        self.cpsr = snapshot.cpsr;
        self.register_bank = snapshot.register_bank;
        self.last_code_fetch = None;
        self.resume_from_breakpoint = None;
        Ok(())
    }
}

/// Rotation applied by a misaligned word load.
#[must_use]
pub(crate) fn rotate_misaligned(value: u32, address: u32) -> u32 {
    value.rotate_right(8 * address.get_bits(0..=1))
}

// Data accesses. Addresses reach the bus aligned to the access width.
impl<B: Bus> Arm7tdmi<B> {
    pub(crate) fn load_word(&mut self, address: u32, sequential: bool) -> u32 {
        self.charge_data_access(sequential, true, address);
        let value = self.bus.read_word(address & !3);
        rotate_misaligned(value, address)
    }

    /// Word load of LDM: the low address bits are dropped, no rotation.
    pub(crate) fn load_word_aligned(&mut self, address: u32, sequential: bool) -> u32 {
        self.charge_data_access(sequential, true, address);
        self.bus.read_word(address & !3)
    }

    pub(crate) fn load_half_word(&mut self, address: u32) -> u32 {
        self.charge_data_access(false, false, address);
        let value = u32::from(self.bus.read_half_word(address & !1));
        value.rotate_right(8 * (address & 1))
    }

    /// Odd addresses load a sign-extended byte.
    pub(crate) fn load_signed_half_word(&mut self, address: u32) -> u32 {
        if address.get_bit(0) {
            return self.load_signed_byte(address);
        }
        self.charge_data_access(false, false, address);
        u32::from(self.bus.read_half_word(address)).sign_extended(16)
    }

    pub(crate) fn load_byte(&mut self, address: u32) -> u32 {
        self.charge_data_access(false, false, address);
        u32::from(self.bus.read_byte(address))
    }

    pub(crate) fn load_signed_byte(&mut self, address: u32) -> u32 {
        self.load_byte(address).sign_extended(8)
    }

    pub(crate) fn store_word(&mut self, address: u32, value: u32, sequential: bool) {
        self.charge_data_access(sequential, true, address);
        self.bus.write_word(address & !3, value);
    }

    pub(crate) fn store_half_word(&mut self, address: u32, value: u16) {
        self.charge_data_access(false, false, address);
        self.bus.write_half_word(address & !1, value);
    }

    pub(crate) fn store_byte(&mut self, address: u32, value: u8) {
        self.charge_data_access(false, false, address);
        self.bus.write_byte(address, value);
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use pretty_assertions::assert_eq;
    use rand::Rng;

    use super::*;
    use crate::cpu::registers::{REG_LR, REG_SP};
    use crate::memory::test_memory::TestMemory;

    // MOV R0, #1
    const MOV_R0_1: u32 = 0xE3A0_0001;
    // ADD R0, R0, #1
    const ADD_R0_1: u32 = 0xE280_0001;
    // B . (branch to itself)
    const LOOP: u32 = 0xEAFF_FFFE;

    fn cpu_with(program: &[u32]) -> Arm7tdmi<TestMemory> {
        Arm7tdmi::new(TestMemory::with_arm_program(0, program), CpuConfig::default())
    }

    #[test]
    fn check_reset_state() {
        let config = CpuConfig {
            reset_vector: 0x0800_0001,
            reset_mode: Mode::System,
            start_in_thumb: true,
            irq_disabled_at_reset: false,
            ..CpuConfig::default()
        };
        let cpu = Arm7tdmi::new(TestMemory::default(), config);
        assert_eq!(cpu.cpsr.mode(), Mode::System);
        assert_eq!(cpu.cpsr.cpu_state(), CpuState::Thumb);
        assert!(!cpu.cpsr.irq_disable());
        assert!(cpu.cpsr.fiq_disable());
        assert_eq!(cpu.registers.program_counter(), 0x0800_0000);
    }

    #[test]
    fn check_single_instruction_exact_budget() {
        let mut cpu = cpu_with(&[MOV_R0_1]);
        assert_eq!(cpu.execute(1), 0);
        assert_eq!(cpu.registers.register_at(0), 1);
        assert_eq!(cpu.registers.program_counter(), 4);
        assert_eq!(cpu.instructions_executed(), 1);
    }

    #[test]
    fn check_single_thumb_instruction_exact_budget() {
        let memory = TestMemory::with_thumb_program(0, &[0x2005]); // MOV R0, #5
        let config = CpuConfig {
            start_in_thumb: true,
            ..CpuConfig::default()
        };
        let mut cpu = Arm7tdmi::new(memory, config);
        assert_eq!(cpu.execute(1), 0);
        assert_eq!(cpu.registers.register_at(0), 5);
        assert_eq!(cpu.registers.program_counter(), 2);
    }

    #[test]
    fn check_execute_zero_budget() {
        let mut cpu = cpu_with(&[MOV_R0_1]);
        cpu.request_break();
        let before = cpu.snapshot();
        assert_eq!(cpu.execute(0), 0);
        assert_eq!(cpu.execute(-3), -3);
        assert_eq!(cpu.snapshot(), before);
        assert_eq!(cpu.instructions_executed(), 0);
        // The pending break survives.
        assert_eq!(cpu.execute(10), 10);
    }

    #[test]
    fn check_execute_zero_budget_leaves_memory() {
        // STR R0, [R1]
        let mut cpu = cpu_with(&[0xE581_0000]);
        cpu.registers.set_register_at(0, 0xDEAD_BEEF);
        cpu.registers.set_register_at(1, 0x100);
        let before = cpu.snapshot();

        assert_eq!(cpu.execute(0), 0);
        assert_eq!(cpu.snapshot(), before);
        assert!(cpu.bus.writes.is_empty());
        assert_eq!(cpu.bus.peek_word(0x100), 0);

        // The same store does land once there is budget for it.
        assert!(cpu.execute(1) <= 0);
        assert_eq!(cpu.bus.peek_word(0x100), 0xDEAD_BEEF);
    }

    #[test]
    fn check_budget_overrun_is_negative() {
        let mut memory = TestMemory::with_arm_program(0, &[LOOP]);
        memory.non_sequential_cycles = 4;
        let mut cpu = Arm7tdmi::new(memory, CpuConfig::default());
        // Fetch N (4) + refill N (4) + S (1).
        assert_eq!(cpu.execute(2), -7);
        assert_eq!(cpu.registers.program_counter(), 0);
        assert_eq!(cpu.cycles_consumed(), 9);
    }

    #[test]
    fn check_sequential_run() {
        let mut memory = TestMemory::with_arm_program(0, &[ADD_R0_1; 8]);
        memory.non_sequential_cycles = 3;
        let mut cpu = Arm7tdmi::new(memory, CpuConfig::default());
        // One N fetch and three S fetches.
        assert_eq!(cpu.execute(6), 0);
        assert_eq!(cpu.registers.register_at(0), 4);
    }

    #[test]
    fn check_request_break() {
        let mut cpu = cpu_with(&[ADD_R0_1; 8]);
        cpu.request_break();
        assert_eq!(cpu.execute(100), 100);
        assert_eq!(cpu.registers.register_at(0), 0);
        assert_eq!(cpu.execute(3), 0);
        assert_eq!(cpu.registers.register_at(0), 3);
    }

    #[test]
    fn check_breakpoint_steps_over_once() {
        let mut cpu = cpu_with(&[ADD_R0_1, ADD_R0_1, 0xEAFF_FFFC]);
        let hits = Rc::new(RefCell::new(Vec::new()));
        let log = Rc::clone(&hits);
        cpu.set_breakpoint_hook(Box::new(move |address| {
            log.borrow_mut().push(address);
            address == 4
        }));

        assert_eq!(cpu.execute(100), 99);
        assert_eq!(cpu.registers.program_counter(), 4);
        assert_eq!(cpu.registers.register_at(0), 1);

        // Resuming executes the instruction at the breakpoint, then stops
        // on it again once the loop comes back.
        let left = cpu.execute(100);
        assert!(left > 0);
        assert_eq!(cpu.registers.program_counter(), 4);
        assert_eq!(cpu.registers.register_at(0), 3);
        assert_eq!(hits.borrow().as_slice(), [0, 4, 8, 0, 4]);

        assert!(cpu.is_breakpoint(4));
        cpu.clear_breakpoint_hook();
        assert!(!cpu.is_breakpoint(4));
    }

    #[test]
    fn check_step_ignores_break() {
        let mut cpu = cpu_with(&[MOV_R0_1]);
        cpu.request_break();
        assert_eq!(cpu.step(), 1);
        assert_eq!(cpu.registers.register_at(0), 1);
    }

    #[test]
    fn check_change_mode_rejects_invalid_bits() {
        let mut cpu = cpu_with(&[]);
        cpu.registers.set_register_at(REG_SP, 0x1234);
        let before = cpu.snapshot();
        assert_eq!(cpu.change_mode(0b10100), Err(CpuError::InvalidMode(0b10100)));
        assert_eq!(cpu.snapshot(), before);
        assert!(cpu.change_mode(0b10011).is_ok());
        assert_eq!(cpu.snapshot(), before);
    }

    #[test]
    fn check_mode_round_trip_random() {
        const MODES: [Mode; 7] = [
            Mode::User,
            Mode::Fiq,
            Mode::Irq,
            Mode::Supervisor,
            Mode::Abort,
            Mode::Undefined,
            Mode::System,
        ];

        let mut rng = rand::thread_rng();
        for _ in 0..500 {
            let mut cpu = cpu_with(&[]);
            let from = MODES[rng.gen_range(0..MODES.len())];
            let to = MODES[rng.gen_range(0..MODES.len())];
            cpu.switch_mode(from);
            for i in 0..15 {
                cpu.registers.set_register_at(i, rng.r#gen());
            }
            let before = cpu.registers;

            cpu.change_mode(u32::from(to)).unwrap();
            for i in 0..8 {
                assert_eq!(cpu.registers.register_at(i), before.register_at(i));
            }
            cpu.change_mode(u32::from(from)).unwrap();

            assert_eq!(cpu.registers, before, "{from} -> {to} -> {from}");
            assert_eq!(cpu.cpsr.mode(), from);
        }
    }

    #[test]
    fn check_write_status_banks_registers() {
        let mut cpu = cpu_with(&[]);
        cpu.registers.set_register_at(REG_LR, 0x5555);
        cpu.write_status(Psr::new(0x8000_0012)).unwrap();
        assert_eq!(cpu.read_status().mode(), Mode::Irq);
        assert!(cpu.cpsr.sign_flag());
        assert_eq!(cpu.read(REG_LR), 0);

        assert_eq!(
            cpu.write_status(Psr::new(0x0000_0000)),
            Err(CpuError::InvalidMode(0))
        );
        assert_eq!(cpu.read_status().mode(), Mode::Irq);
    }

    #[test]
    fn check_snapshot_restore() {
        let mut cpu = cpu_with(&[ADD_R0_1; 4]);
        cpu.execute(2);
        let snapshot = cpu.snapshot();
        let json = serde_json::to_string(&snapshot).unwrap();

        let mut other = cpu_with(&[ADD_R0_1; 4]);
        other.restore(serde_json::from_str(&json).unwrap()).unwrap();
        assert_eq!(other.registers.register_at(0), 2);
        assert_eq!(other.registers.program_counter(), 8);
        other.execute(2);
        assert_eq!(other.registers.register_at(0), 4);

        let mut bad = snapshot;
        bad.cpsr = Psr::new(0x1);
        assert!(other.restore(bad).is_err());
    }

    #[test]
    fn check_misaligned_rotation() {
        assert_eq!(rotate_misaligned(0x1122_3344, 0), 0x1122_3344);
        assert_eq!(rotate_misaligned(0x1122_3344, 1), 0x4411_2233);
        assert_eq!(rotate_misaligned(0x1122_3344, 3), 0x2233_4411);
    }

    #[test]
    fn check_signed_loads() {
        let mut memory = TestMemory::default();
        memory.poke_word(0x100, 0x0080_8001);
        let mut cpu = Arm7tdmi::new(memory, CpuConfig::default());
        assert_eq!(cpu.load_signed_half_word(0x100), 0xFFFF_8001);
        assert_eq!(cpu.load_signed_half_word(0x101), 0xFFFF_FF80);
        assert_eq!(cpu.load_signed_byte(0x102), 0xFFFF_FF80);
        assert_eq!(cpu.load_half_word(0x101), 0x0100_0080);
    }
}
