//! Cycle-counting interpreter for the ARM7TDMI.
//!
//! [`cpu::arm7tdmi::Arm7tdmi`] runs ARM and Thumb code against any
//! [`memory::Bus`] and reports the cycles it consumed. [`memory::SystemBus`]
//! is a ready-made bus with a handheld-style memory map and wait states.

#[allow(clippy::cast_possible_truncation)]
#[allow(clippy::cast_sign_loss)]
#[allow(clippy::cast_possible_wrap)]
mod bitwise;

pub mod config;
pub mod cpu;
pub mod error;
pub mod memory;

pub use config::CpuConfig;
pub use cpu::arm7tdmi::{Arm7tdmi, CpuSnapshot};
pub use error::{CpuError, LoadError};
