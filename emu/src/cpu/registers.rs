//! # Register File
//!
//! The 16 registers visible in the current mode.
//!
//! - **R0-R12**: general purpose (R8-R12 banked for FIQ)
//! - **R13 (SP)**: stack pointer
//! - **R14 (LR)**: link register
//! - **R15 (PC)**: holds the address of the instruction being executed.
//!   Reads by instructions go through the pipeline offset helper, never
//!   straight to this slot.

use serde::{Deserialize, Serialize};

/// Stack Pointer register index.
pub const REG_SP: usize = 0xD;

/// Link Register index.
pub const REG_LR: usize = 0xE;

/// Program Counter register index.
pub const REG_PROGRAM_COUNTER: usize = 0xF;

#[derive(Default, Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Registers([u32; 16]);

impl Registers {
    #[must_use]
    pub const fn program_counter(&self) -> u32 {
        self.0[REG_PROGRAM_COUNTER]
    }

    pub const fn set_program_counter(&mut self, new_value: u32) {
        self.0[REG_PROGRAM_COUNTER] = new_value;
    }

    pub const fn advance_program_counter(&mut self, bytes: u32) {
        self.0[REG_PROGRAM_COUNTER] = self.0[REG_PROGRAM_COUNTER].wrapping_add(bytes);
    }

    pub const fn set_register_at(&mut self, reg: usize, new_value: u32) {
        self.0[reg] = new_value;
    }

    #[must_use]
    pub const fn register_at(&self, reg: usize) -> u32 {
        self.0[reg]
    }

    /// R8-R14, the slots any mode may bank.
    #[must_use]
    pub fn high_registers(&self) -> [u32; 7] {
        let mut high = [0; 7];
        high.copy_from_slice(&self.0[8..=14]);
        high
    }

    pub fn set_high_registers(&mut self, high: [u32; 7]) {
        self.0[8..=14].copy_from_slice(&high);
    }

    #[must_use]
    pub const fn as_array(&self) -> &[u32; 16] {
        &self.0
    }
}

impl From<[u32; 16]> for Registers {
    fn from(values: [u32; 16]) -> Self {
        Self(values)
    }
}
