//! # ARM Instruction Set (32-bit)
//!
//! Every instruction carries a condition and executes only when CPSR
//! satisfies it.
//!
//! ## Format
//!
//! ```text
//! 31-28   27-25   24-0
//! [Cond] [Format] [Instruction-specific]
//! ```
//!
//! - **Condition (bits 28-31)**: See [`condition`](super::condition)
//! - **Format (bits 25-27)**: Determines instruction category
//!
//! ## Instruction Categories
//!
//! | Bits 27-25 | Category                   | Examples                    |
//! |------------|----------------------------|-----------------------------|
//! | 00x        | Data Processing, PSR       | AND, ADD, CMP, MOV, MRS     |
//! | 000        | Multiply/Swap/BX/Halfword  | MUL, UMULL, SWP, BX, LDRH   |
//! | 01x        | Single Data Transfer       | LDR, STR                    |
//! | 100        | Block Data Transfer        | LDM, STM                    |
//! | 101        | Branch                     | B, BL                       |
//! | 110, 1110  | Coprocessor (traps)        | LDC, CDP                    |
//! | 1111       | Software Interrupt         | SWI                         |
//!
//! ## Submodules
//!
//! - [`instructions`] - Decoding (`From<u32>`) and disassembly
//! - [`operations`] - Execution
//! - [`alu_instruction`] - Operand 2 and PSR transfer operands
//! - [`mode`] - Decoded opcode with its condition

#[allow(clippy::cast_possible_truncation)]
pub mod alu_instruction;

#[allow(clippy::cast_possible_truncation)]
#[allow(clippy::similar_names)]
pub mod instructions;

#[allow(clippy::cast_possible_truncation)]
pub mod mode;

#[allow(clippy::cast_possible_truncation)]
#[allow(clippy::cast_sign_loss)]
#[allow(clippy::cast_possible_wrap)]
#[allow(clippy::cast_lossless)]
#[allow(clippy::similar_names)]
pub mod operations;
