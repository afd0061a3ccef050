//! # Barrel Shifter
//!
//! Produces the second operand of data processing and the register offset
//! of single transfers. The same four shifts behave differently for amount
//! zero and amounts of 32 or more, depending on where the amount came from:
//!
//! | Context              | Amount 0                   | Amount >= 32                 |
//! |----------------------|----------------------------|------------------------------|
//! | rotated immediate    | value and carry unchanged  | as shift-by-register         |
//! | shift by immediate   | LSL: unchanged, LSR/ASR: 32, ROR: RRX | as shift-by-register |
//! | shift by register    | value and carry unchanged  | LSL/LSR give 0, ASR fills sign, ROR wraps |

use crate::bitwise::Bits;
use crate::cpu::flags::ShiftKind;

/// Where the shift amount was encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShiftContext {
    /// 8-bit immediate rotated right by twice the 4-bit rotate field.
    RotatedImmediate,

    /// 5-bit amount in the opcode.
    ShiftByImmediate,

    /// Bottom byte of a register.
    ShiftByRegister,
}

/// A shifted operand and the shifter carry-out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Operand2 {
    pub value: u32,
    pub carry: bool,
}

impl Operand2 {
    #[must_use]
    pub const fn new(value: u32, carry: bool) -> Self {
        Self { value, carry }
    }
}

#[must_use]
pub fn shift(kind: ShiftKind, context: ShiftContext, value: u32, amount: u32, carry: bool) -> Operand2 {
    if amount == 0 {
        return match (context, kind) {
            (ShiftContext::ShiftByImmediate, ShiftKind::Lsr) => Operand2::new(0, value.get_bit(31)),
            (ShiftContext::ShiftByImmediate, ShiftKind::Asr) => {
                let sign = value.get_bit(31);
                Operand2::new(if sign { u32::MAX } else { 0 }, sign)
            }
            // RRX
            (ShiftContext::ShiftByImmediate, ShiftKind::Ror) => {
                Operand2::new((u32::from(carry) << 31) | (value >> 1), value.get_bit(0))
            }
            _ => Operand2::new(value, carry),
        };
    }

    match kind {
        ShiftKind::Lsl => match amount {
            1..=31 => Operand2::new(value << amount, value.get_bit((32 - amount) as u8)),
            32 => Operand2::new(0, value.get_bit(0)),
            _ => Operand2::new(0, false),
        },
        ShiftKind::Lsr => match amount {
            1..=31 => Operand2::new(value >> amount, value.get_bit((amount - 1) as u8)),
            32 => Operand2::new(0, value.get_bit(31)),
            _ => Operand2::new(0, false),
        },
        ShiftKind::Asr => match amount {
            1..=31 => Operand2::new(
                ((value as i32) >> amount) as u32,
                value.get_bit((amount - 1) as u8),
            ),
            _ => {
                let sign = value.get_bit(31);
                Operand2::new(if sign { u32::MAX } else { 0 }, sign)
            }
        },
        ShiftKind::Ror => {
            let rotation = amount & 31;
            if rotation == 0 {
                Operand2::new(value, value.get_bit(31))
            } else {
                let result = value.rotate_right(rotation);
                Operand2::new(result, result.get_bit(31))
            }
        }
    }
}

/// Expands the 12-bit immediate field of data processing and MSR.
#[must_use]
pub fn rotated_immediate(field: u32, carry: bool) -> Operand2 {
    let imm = field.get_bits(0..=7);
    let rotate = field.get_bits(8..=11) * 2;
    shift(ShiftKind::Ror, ShiftContext::RotatedImmediate, imm, rotate, carry)
}
