//! # Data-Processing Engine
//!
//! The sixteen two-operand operations shared by both instruction sets.
//! Arithmetic is done on a 64-bit accumulator so the carry is bit 32 of
//! the sum. Subtraction is addition of the one's complement plus a carry,
//! which makes C mean "no borrow".

use std::fmt::Display;

use crate::bitwise::Bits;
use crate::cpu::barrel_shifter::Operand2;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ArithmeticOpResult {
    pub result: u32,
    pub carry: bool,
    pub overflow: bool,
    pub sign: bool,
    pub zero: bool,
}

/// `a + b + carry_in` with NZCV.
#[must_use]
pub fn add_with_carry(a: u32, b: u32, carry_in: bool) -> ArithmeticOpResult {
    let wide = u64::from(a) + u64::from(b) + u64::from(carry_in);
    let result = wide as u32;

    ArithmeticOpResult {
        result,
        carry: wide > u64::from(u32::MAX),
        // Both operands share a sign and the result does not.
        overflow: ((a ^ result) & (b ^ result)).get_bit(31),
        sign: result.get_bit(31),
        zero: result == 0,
    }
}

/// `a - b - !carry_in` with NZCV.
#[must_use]
pub fn sub_with_carry(a: u32, b: u32, carry_in: bool) -> ArithmeticOpResult {
    add_with_carry(a, !b, carry_in)
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum AluInstruction {
    And = 0x0,
    Eor = 0x1,
    Sub = 0x2,
    Rsb = 0x3,
    Add = 0x4,
    Adc = 0x5,
    Sbc = 0x6,
    Rsc = 0x7,
    Tst = 0x8,
    Teq = 0x9,
    Cmp = 0xA,
    Cmn = 0xB,
    Orr = 0xC,
    Mov = 0xD,
    Bic = 0xE,
    Mvn = 0xF,
}

#[derive(Eq, PartialEq, Debug)]
pub enum AluInstructionKind {
    Logical,
    Arithmetic,
}

impl AluInstruction {
    #[must_use]
    pub const fn kind(self) -> AluInstructionKind {
        use AluInstruction::{
            Adc, Add, And, Bic, Cmn, Cmp, Eor, Mov, Mvn, Orr, Rsb, Rsc, Sbc, Sub, Teq, Tst,
        };
        match self {
            And | Eor | Tst | Teq | Orr | Mov | Bic | Mvn => AluInstructionKind::Logical,
            Sub | Rsb | Add | Adc | Sbc | Rsc | Cmp | Cmn => AluInstructionKind::Arithmetic,
        }
    }

    /// TST, TEQ, CMP and CMN only set flags and write no register.
    #[must_use]
    pub const fn is_test(self) -> bool {
        matches!(self, Self::Tst | Self::Teq | Self::Cmp | Self::Cmn)
    }

    /// MOV and MVN ignore the first operand.
    #[must_use]
    pub const fn is_move(self) -> bool {
        matches!(self, Self::Mov | Self::Mvn)
    }
}

impl From<u32> for AluInstruction {
    fn from(alu_op_code: u32) -> Self {
        use AluInstruction::{
            Adc, Add, And, Bic, Cmn, Cmp, Eor, Mov, Mvn, Orr, Rsb, Rsc, Sbc, Sub, Teq, Tst,
        };
        match alu_op_code & 0xF {
            0x0 => And,
            0x1 => Eor,
            0x2 => Sub,
            0x3 => Rsb,
            0x4 => Add,
            0x5 => Adc,
            0x6 => Sbc,
            0x7 => Rsc,
            0x8 => Tst,
            0x9 => Teq,
            0xA => Cmp,
            0xB => Cmn,
            0xC => Orr,
            0xD => Mov,
            0xE => Bic,
            _ => Mvn,
        }
    }
}

impl Display for AluInstruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::And => "AND",
            Self::Eor => "EOR",
            Self::Sub => "SUB",
            Self::Rsb => "RSB",
            Self::Add => "ADD",
            Self::Adc => "ADC",
            Self::Sbc => "SBC",
            Self::Rsc => "RSC",
            Self::Tst => "TST",
            Self::Teq => "TEQ",
            Self::Cmp => "CMP",
            Self::Cmn => "CMN",
            Self::Orr => "ORR",
            Self::Mov => "MOV",
            Self::Bic => "BIC",
            Self::Mvn => "MVN",
        };
        f.write_str(name)
    }
}

/// Runs one operation. `carry` and `overflow` are the current flags: the
/// former feeds ADC/SBC/RSC, the latter is kept by logical operations.
/// The returned flags are the ones a flag-setting form would write.
#[must_use]
pub fn compute(
    op: AluInstruction,
    rn: u32,
    op2: Operand2,
    carry: bool,
    overflow: bool,
) -> ArithmeticOpResult {
    let logical = |result: u32| ArithmeticOpResult {
        result,
        carry: op2.carry,
        overflow,
        sign: result.get_bit(31),
        zero: result == 0,
    };
    let operand = op2.value;

    match op {
        AluInstruction::And | AluInstruction::Tst => logical(rn & operand),
        AluInstruction::Eor | AluInstruction::Teq => logical(rn ^ operand),
        AluInstruction::Orr => logical(rn | operand),
        AluInstruction::Mov => logical(operand),
        AluInstruction::Bic => logical(rn & !operand),
        AluInstruction::Mvn => logical(!operand),
        AluInstruction::Sub | AluInstruction::Cmp => sub_with_carry(rn, operand, true),
        AluInstruction::Rsb => sub_with_carry(operand, rn, true),
        AluInstruction::Add | AluInstruction::Cmn => add_with_carry(rn, operand, false),
        AluInstruction::Adc => add_with_carry(rn, operand, carry),
        AluInstruction::Sbc => sub_with_carry(rn, operand, carry),
        AluInstruction::Rsc => sub_with_carry(operand, rn, carry),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rand::Rng;

    use super::*;

    const EDGES: [u32; 6] = [0, 1, u32::MAX, 0x8000_0000, 0x7FFF_FFFF, 0x1234_5678];

    fn all_ops() -> impl Iterator<Item = AluInstruction> {
        (0..16).map(AluInstruction::from)
    }

    #[test]
    fn check_logical_instruction() {
        assert_eq!(AluInstruction::from(9).kind(), AluInstructionKind::Logical);
        assert_eq!(AluInstruction::from(2).kind(), AluInstructionKind::Arithmetic);
        assert!(AluInstruction::Cmn.is_test());
        assert!(!AluInstruction::Mov.is_test());
    }

    #[test]
    fn check_zero_and_sign_for_every_operation() {
        for op in all_ops() {
            for a in EDGES {
                for b in EDGES {
                    for carry in [false, true] {
                        let res = compute(op, a, Operand2::new(b, carry), carry, false);
                        assert_eq!(res.zero, res.result == 0, "{op} {a:#x} {b:#x}");
                        assert_eq!(res.sign, res.result.get_bit(31), "{op} {a:#x} {b:#x}");
                    }
                }
            }
        }
    }

    #[test]
    fn check_logical_operations_keep_overflow() {
        for op in all_ops().filter(|op| op.kind() == AluInstructionKind::Logical) {
            let res = compute(op, 0x8000_0000, Operand2::new(0x8000_0000, true), false, true);
            assert!(res.overflow, "{op}");
            assert!(res.carry, "{op}");
        }
    }

    #[test]
    fn check_add_carry_bit() {
        let res = add_with_carry(u32::MAX, 1, false);
        assert_eq!(res.result, 0);
        assert!(res.carry);
        assert!(res.zero);
        assert!(!res.overflow);
    }

    #[test]
    fn check_sub_borrow() {
        // 1 - 2 borrows, so C is clear.
        let res = sub_with_carry(1, 2, true);
        assert_eq!(res.result, u32::MAX);
        assert!(!res.carry);
        assert!(res.sign);

        // 2 - 1 does not borrow.
        let res = sub_with_carry(2, 1, true);
        assert_eq!(res.result, 1);
        assert!(res.carry);

        // Equal operands: zero with carry set.
        let res = sub_with_carry(5, 5, true);
        assert!(res.zero);
        assert!(res.carry);
    }

    #[test]
    fn check_sbc_and_rsc_fold_carry() {
        let res = compute(AluInstruction::Sbc, 10, Operand2::new(3, false), false, false);
        assert_eq!(res.result, 6);
        let res = compute(AluInstruction::Sbc, 10, Operand2::new(3, false), true, false);
        assert_eq!(res.result, 7);
        let res = compute(AluInstruction::Rsc, 3, Operand2::new(10, false), false, false);
        assert_eq!(res.result, 6);
        let res = compute(AluInstruction::Adc, u32::MAX, Operand2::new(0, false), true, false);
        assert_eq!(res.result, 0);
        assert!(res.carry);
    }

    #[test]
    fn check_sbc_zero_minus_zero_without_carry() {
        // 0 - 0 - 1 borrows.
        let res = sub_with_carry(0, 0, false);
        assert_eq!(res.result, u32::MAX);
        assert!(!res.carry);
    }

    #[test]
    fn check_overflow_edges() {
        assert!(add_with_carry(0x7FFF_FFFF, 1, false).overflow);
        assert!(add_with_carry(0x8000_0000, 0x8000_0000, false).overflow);
        assert!(sub_with_carry(0x8000_0000, 1, true).overflow);
        assert!(sub_with_carry(0x7FFF_FFFF, 0xFFFF_FFFF, true).overflow);
        assert!(!sub_with_carry(0, 0x8000_0000, true).carry);
        assert!(sub_with_carry(0, 0x8000_0000, true).overflow);
    }

    #[test]
    fn check_overflow_properties_random() {
        let mut rng = rand::thread_rng();
        for _ in 0..2000 {
            let a: u32 = rng.r#gen();
            let b: u32 = rng.r#gen();
            let (sa, sb) = (a.get_bit(31), b.get_bit(31));

            let sum = add_with_carry(a, b, false);
            if sa == sb {
                assert_eq!(sum.overflow, sum.result.get_bit(31) != sa, "{a:#x} + {b:#x}");
            } else {
                assert!(!sum.overflow, "{a:#x} + {b:#x}");
            }

            let diff = sub_with_carry(a, b, true);
            let expected = (a as i32).checked_sub(b as i32).is_none();
            assert_eq!(diff.overflow, expected, "{a:#x} - {b:#x}");
            assert_eq!(diff.carry, a >= b, "{a:#x} - {b:#x}");
        }
    }
}
