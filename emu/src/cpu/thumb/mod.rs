//! # Thumb Instruction Set (16-bit)
//!
//! A compressed encoding of a subset of the ARM instructions. Only the
//! conditional branch is conditional; everything else always executes.
//!
//! - [`instruction`] - Decoding (`From<u16>`) and disassembly
//! - [`operations`] - Execution
//! - [`alu_instructions`] - Operation fields of formats 3, 4 and 5
//! - [`mode`] - Decoded opcode

pub mod alu_instructions;

#[allow(clippy::cast_possible_truncation)]
#[allow(clippy::cast_possible_wrap)]
#[allow(clippy::cast_lossless)]
pub mod instruction;

pub mod mode;

#[allow(clippy::cast_possible_truncation)]
#[allow(clippy::cast_sign_loss)]
#[allow(clippy::cast_possible_wrap)]
#[allow(clippy::cast_lossless)]
pub mod operations;
