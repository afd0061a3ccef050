use std::fmt::Display;

use crate::bitwise::Bits;
use crate::cpu::flags::ShiftKind;

/// Where a register operand takes its shift amount from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShiftOperator {
    Immediate(u32),
    Register(usize),
}

/// Operand 2 of a data-processing instruction, still to be run through
/// the barrel shifter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AluSecondOperandInfo {
    Register {
        shift_op: ShiftOperator,
        shift_kind: ShiftKind,
        register: usize,
    },
    /// The raw 12-bit field: 8-bit base and 4-bit rotate.
    Immediate { field: u32 },
}

impl AluSecondOperandInfo {
    #[must_use]
    pub fn decode(op_code: u32) -> Self {
        if op_code.get_bit(25) {
            return Self::Immediate {
                field: op_code.get_bits(0..=11),
            };
        }

        let shift_op = if op_code.get_bit(4) {
            ShiftOperator::Register(op_code.get_bits(8..=11) as usize)
        } else {
            ShiftOperator::Immediate(op_code.get_bits(7..=11))
        };

        Self::Register {
            shift_op,
            shift_kind: ShiftKind::from(op_code.get_bits(5..=6)),
            register: op_code.get_bits(0..=3) as usize,
        }
    }
}

impl Display for AluSecondOperandInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Immediate { field } => {
                let value = field.get_bits(0..=7).rotate_right(field.get_bits(8..=11) * 2);
                write!(f, "#0x{value:X}")
            }
            Self::Register {
                shift_op: ShiftOperator::Immediate(0),
                shift_kind: ShiftKind::Lsl,
                register,
            } => write!(f, "R{register}"),
            Self::Register {
                shift_op: ShiftOperator::Immediate(0),
                shift_kind: ShiftKind::Ror,
                register,
            } => write!(f, "R{register}, RRX"),
            Self::Register {
                shift_op: ShiftOperator::Immediate(amount),
                shift_kind,
                register,
            } => {
                // LSR and ASR encode #32 as #0.
                let amount = if *amount == 0 { 32 } else { *amount };
                write!(f, "R{register}, {shift_kind} #{amount}")
            }
            Self::Register {
                shift_op: ShiftOperator::Register(rs),
                shift_kind,
                register,
            } => write!(f, "R{register}, {shift_kind} R{rs}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PsrKind {
    Cpsr,
    Spsr,
}

impl From<bool> for PsrKind {
    fn from(spsr: bool) -> Self {
        if spsr { Self::Spsr } else { Self::Cpsr }
    }
}

impl Display for PsrKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cpsr => f.write_str("CPSR"),
            Self::Spsr => f.write_str("SPSR"),
        }
    }
}

/// Source of an MSR write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PsrOperand {
    Register(usize),
    Immediate { field: u32 },
}

impl Display for PsrOperand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Register(register) => write!(f, "R{register}"),
            Self::Immediate { field } => {
                let value = field.get_bits(0..=7).rotate_right(field.get_bits(8..=11) * 2);
                write!(f, "#0x{value:X}")
            }
        }
    }
}
