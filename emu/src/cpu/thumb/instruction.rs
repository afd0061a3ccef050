//! # Thumb Instruction Decoding
//!
//! Thumb instructions are grouped into 19 formats. The high byte alone
//! selects the format:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Thumb Instruction Formats                            │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │  Format 1:  000 xx          Move shifted register           0x00-0x17   │
//! │  Format 2:  00011           Add/subtract                    0x18-0x1F   │
//! │  Format 3:  001 xx          Move/compare/add/subtract imm   0x20-0x3F   │
//! │  Format 4:  010000          ALU operations                  0x40-0x43   │
//! │  Format 5:  010001          Hi register operations / BX     0x44-0x47   │
//! │  Format 6:  01001           PC-relative load                0x48-0x4F   │
//! │  Format 7:  0101 xx0        Load/store with register offset 0x50-0x5F   │
//! │  Format 8:  0101 xx1        Load/store sign-extended        0x50-0x5F   │
//! │  Format 9:  011 xx          Load/store with immediate       0x60-0x7F   │
//! │  Format 10: 1000 x          Load/store halfword             0x80-0x8F   │
//! │  Format 11: 1001 x          SP-relative load/store          0x90-0x9F   │
//! │  Format 12: 1010 x          Load address                    0xA0-0xAF   │
//! │  Format 13: 10110000        Add offset to stack pointer     0xB0        │
//! │  Format 14: 1011 x10x       Push/pop registers              0xB4-0xBD   │
//! │  Format 15: 1100 x          Multiple load/store             0xC0-0xCF   │
//! │  Format 16: 1101 xxxx       Conditional branch              0xD0-0xDD   │
//! │  Format 17: 11011111        Software interrupt              0xDF        │
//! │  Format 18: 11100           Unconditional branch            0xE0-0xE7   │
//! │  Format 19: 1111 x          Long branch with link           0xF0-0xFF   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every other high byte (the gaps around formats 13 and 14, condition
//! 0xE and 0xE8-0xEF) is undefined and traps.
//!
//! ## Register Restrictions
//!
//! Most Thumb instructions can only access R0-R7. To access R8-R15:
//! - Format 5 (Hi register ops): ADD, CMP, MOV with high registers
//! - BX: Can branch to any register
//! - PUSH/POP: Can include LR/PC via special bit
//!
//! ## Long Branch (BL)
//!
//! BL spans ±4MB but takes two 16-bit instructions:
//!
//! ```text
//! First:  1111 0xxx xxxx xxxx  ; LR = PC + 4 + (offset_hi << 12)
//! Second: 1111 1xxx xxxx xxxx  ; PC = LR + (offset_lo << 1), LR = next | 1
//! ```

use std::fmt::Display;

use crate::bitwise::Bits;
use crate::cpu::condition::Condition;
use crate::cpu::flags::{LoadStoreKind, OperandKind, ReadWriteKind, ShiftKind};
use crate::cpu::thumb::alu_instructions::{
    ThumbHighRegisterOperation, ThumbImmediateOperation, ThumbModeAluInstruction,
};

/// Format 8 transfers, selected by the H and S bits.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum SignExtendedTransfer {
    StoreHalfword,
    LoadHalfword,
    LoadSignedByte,
    LoadSignedHalfword,
}

impl Display for SignExtendedTransfer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StoreHalfword => f.write_str("STRH"),
            Self::LoadHalfword => f.write_str("LDRH"),
            Self::LoadSignedByte => f.write_str("LDSB"),
            Self::LoadSignedHalfword => f.write_str("LDSH"),
        }
    }
}

/// Offsets are decoded to bytes: scaled immediates are already shifted and
/// branch offsets already sign-extended.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum ThumbModeInstruction {
    MoveShiftedRegister {
        shift_operation: ShiftKind,
        offset5: u32,
        source_register: usize,
        destination_register: usize,
    },
    AddSubtract {
        operation_kind: OperandKind,
        subtract: bool,
        /// Register index or 3-bit immediate, depending on `operation_kind`.
        rn_offset3: u32,
        source_register: usize,
        destination_register: usize,
    },
    MoveCompareAddSubtractImm {
        operation: ThumbImmediateOperation,
        destination_register: usize,
        offset: u32,
    },
    AluOp {
        alu_operation: ThumbModeAluInstruction,
        source_register: usize,
        destination_register: usize,
    },
    HiRegisterOpBX {
        register_operation: ThumbHighRegisterOperation,
        source_register: usize,
        destination_register: usize,
    },
    PCRelativeLoad {
        destination_register: usize,
        offset: u32,
    },
    LoadStoreRegisterOffset {
        load_store: LoadStoreKind,
        byte_word: ReadWriteKind,
        offset_register: usize,
        base_register: usize,
        destination_register: usize,
    },
    LoadStoreSignExtByteHalfword {
        transfer: SignExtendedTransfer,
        offset_register: usize,
        base_register: usize,
        destination_register: usize,
    },
    LoadStoreImmOffset {
        load_store: LoadStoreKind,
        byte_word: ReadWriteKind,
        offset: u32,
        base_register: usize,
        destination_register: usize,
    },
    LoadStoreHalfword {
        load_store: LoadStoreKind,
        offset: u32,
        base_register: usize,
        destination_register: usize,
    },
    SPRelativeLoadStore {
        load_store: LoadStoreKind,
        destination_register: usize,
        offset: u32,
    },
    LoadAddress {
        sp: bool,
        destination_register: usize,
        offset: u32,
    },
    AddOffsetSP {
        subtract: bool,
        offset: u32,
    },
    PushPopReg {
        load_store: LoadStoreKind,
        /// LR for PUSH, PC for POP.
        pc_lr: bool,
        register_list: u16,
    },
    MultipleLoadStore {
        load_store: LoadStoreKind,
        base_register: usize,
        register_list: u16,
    },
    CondBranch {
        condition: Condition,
        offset: u32,
    },
    Swi {
        comment: u8,
    },
    UncondBranch {
        offset: u32,
    },
    LongBranchLink {
        second_half: bool,
        offset: u32,
    },
    Undefined,
}

impl From<u16> for ThumbModeInstruction {
    #[allow(clippy::too_many_lines)]
    fn from(op_code: u16) -> Self {
        use ThumbModeInstruction::{
            AddOffsetSP, AddSubtract, AluOp, CondBranch, HiRegisterOpBX, LoadAddress,
            LoadStoreHalfword, LoadStoreImmOffset, LoadStoreRegisterOffset,
            LoadStoreSignExtByteHalfword, LongBranchLink, MoveCompareAddSubtractImm,
            MoveShiftedRegister, MultipleLoadStore, PCRelativeLoad, PushPopReg,
            SPRelativeLoadStore, Swi, UncondBranch, Undefined,
        };

        let rd = op_code.get_bits(0..=2) as usize;
        let rs = op_code.get_bits(3..=5) as usize;
        let offset5 = u32::from(op_code.get_bits(6..=10));
        let word8 = u32::from(op_code.get_bits(0..=7)) << 2;

        match op_code.get_bits(8..=15) {
            0x00..=0x17 => MoveShiftedRegister {
                shift_operation: u32::from(op_code.get_bits(11..=12)).into(),
                offset5,
                source_register: rs,
                destination_register: rd,
            },
            0x18..=0x1F => AddSubtract {
                operation_kind: op_code.get_bit(10).into(),
                subtract: op_code.get_bit(9),
                rn_offset3: u32::from(op_code.get_bits(6..=8)),
                source_register: rs,
                destination_register: rd,
            },
            0x20..=0x3F => MoveCompareAddSubtractImm {
                operation: op_code.get_bits(11..=12).into(),
                destination_register: op_code.get_bits(8..=10) as usize,
                offset: u32::from(op_code.get_bits(0..=7)),
            },
            0x40..=0x43 => AluOp {
                alu_operation: op_code.get_bits(6..=9).into(),
                source_register: rs,
                destination_register: rd,
            },
            0x44..=0x47 => {
                let high = |bit: u8, low: usize| if op_code.get_bit(bit) { low | 8 } else { low };
                HiRegisterOpBX {
                    register_operation: op_code.get_bits(8..=9).into(),
                    source_register: high(6, rs),
                    destination_register: high(7, rd),
                }
            }
            0x48..=0x4F => PCRelativeLoad {
                destination_register: op_code.get_bits(8..=10) as usize,
                offset: word8,
            },
            0x50..=0x5F if op_code.get_bit(9) => LoadStoreSignExtByteHalfword {
                transfer: match (op_code.get_bit(10), op_code.get_bit(11)) {
                    (false, false) => SignExtendedTransfer::StoreHalfword,
                    (false, true) => SignExtendedTransfer::LoadHalfword,
                    (true, false) => SignExtendedTransfer::LoadSignedByte,
                    (true, true) => SignExtendedTransfer::LoadSignedHalfword,
                },
                offset_register: op_code.get_bits(6..=8) as usize,
                base_register: rs,
                destination_register: rd,
            },
            0x50..=0x5F => LoadStoreRegisterOffset {
                load_store: op_code.get_bit(11).into(),
                byte_word: op_code.get_bit(10).into(),
                offset_register: op_code.get_bits(6..=8) as usize,
                base_register: rs,
                destination_register: rd,
            },
            0x60..=0x7F => {
                let byte_word: ReadWriteKind = op_code.get_bit(12).into();
                LoadStoreImmOffset {
                    load_store: op_code.get_bit(11).into(),
                    byte_word,
                    offset: match byte_word {
                        ReadWriteKind::Word => offset5 << 2,
                        ReadWriteKind::Byte => offset5,
                    },
                    base_register: rs,
                    destination_register: rd,
                }
            }
            0x80..=0x8F => LoadStoreHalfword {
                load_store: op_code.get_bit(11).into(),
                offset: offset5 << 1,
                base_register: rs,
                destination_register: rd,
            },
            0x90..=0x9F => SPRelativeLoadStore {
                load_store: op_code.get_bit(11).into(),
                destination_register: op_code.get_bits(8..=10) as usize,
                offset: word8,
            },
            0xA0..=0xAF => LoadAddress {
                sp: op_code.get_bit(11),
                destination_register: op_code.get_bits(8..=10) as usize,
                offset: word8,
            },
            0xB0 => AddOffsetSP {
                subtract: op_code.get_bit(7),
                offset: u32::from(op_code.get_bits(0..=6)) << 2,
            },
            0xB4 | 0xB5 | 0xBC | 0xBD => PushPopReg {
                load_store: op_code.get_bit(11).into(),
                pc_lr: op_code.get_bit(8),
                register_list: op_code.get_bits(0..=7),
            },
            0xC0..=0xCF => MultipleLoadStore {
                load_store: op_code.get_bit(11).into(),
                base_register: op_code.get_bits(8..=10) as usize,
                register_list: op_code.get_bits(0..=7),
            },
            0xD0..=0xDD => CondBranch {
                condition: Condition::from(op_code.get_bits(8..=11) as u8),
                offset: (u32::from(op_code.get_bits(0..=7)) << 1).sign_extended(9),
            },
            0xDF => Swi {
                comment: op_code.get_bits(0..=7) as u8,
            },
            0xE0..=0xE7 => UncondBranch {
                offset: (u32::from(op_code.get_bits(0..=10)) << 1).sign_extended(12),
            },
            0xF0..=0xFF => LongBranchLink {
                second_half: op_code.get_bit(11),
                offset: u32::from(op_code.get_bits(0..=10)),
            },
            _ => Undefined,
        }
    }
}

fn register_list_string(register_list: u16, extra: Option<&str>) -> String {
    let mut registers = (0..8)
        .filter(|r| register_list.get_bit(*r))
        .map(|r| format!("R{r}"))
        .collect::<Vec<_>>();
    if let Some(extra) = extra {
        registers.push(extra.to_string());
    }
    format!("{{{}}}", registers.join(", "))
}

fn transfer_name(load_store: LoadStoreKind, byte_word: ReadWriteKind) -> &'static str {
    match (load_store, byte_word) {
        (LoadStoreKind::Load, ReadWriteKind::Byte) => "LDRB",
        (LoadStoreKind::Load, ReadWriteKind::Word) => "LDR",
        (LoadStoreKind::Store, ReadWriteKind::Byte) => "STRB",
        (LoadStoreKind::Store, ReadWriteKind::Word) => "STR",
    }
}

impl Display for ThumbModeInstruction {
    #[allow(clippy::too_many_lines)]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MoveShiftedRegister {
                shift_operation,
                offset5,
                source_register,
                destination_register,
            } => write!(
                f,
                "{shift_operation} R{destination_register}, R{source_register}, #{offset5}"
            ),
            Self::AddSubtract {
                operation_kind,
                subtract,
                rn_offset3,
                source_register,
                destination_register,
            } => {
                let op = if *subtract { "SUB" } else { "ADD" };
                let operand = match operation_kind {
                    OperandKind::Immediate => format!("#{rn_offset3}"),
                    OperandKind::Register => format!("R{rn_offset3}"),
                };
                write!(f, "{op} R{destination_register}, R{source_register}, {operand}")
            }
            Self::MoveCompareAddSubtractImm {
                operation,
                destination_register,
                offset,
            } => write!(f, "{operation} R{destination_register}, #{offset}"),
            Self::AluOp {
                alu_operation,
                source_register,
                destination_register,
            } => write!(f, "{alu_operation} R{destination_register}, R{source_register}"),
            Self::HiRegisterOpBX {
                register_operation: ThumbHighRegisterOperation::Bx,
                source_register,
                ..
            } => write!(f, "BX R{source_register}"),
            Self::HiRegisterOpBX {
                register_operation,
                source_register,
                destination_register,
            } => write!(f, "{register_operation} R{destination_register}, R{source_register}"),
            Self::PCRelativeLoad {
                destination_register,
                offset,
            } => write!(f, "LDR R{destination_register}, [PC, #{offset}]"),
            Self::LoadStoreRegisterOffset {
                load_store,
                byte_word,
                offset_register,
                base_register,
                destination_register,
            } => write!(
                f,
                "{} R{destination_register}, [R{base_register}, R{offset_register}]",
                transfer_name(*load_store, *byte_word)
            ),
            Self::LoadStoreSignExtByteHalfword {
                transfer,
                offset_register,
                base_register,
                destination_register,
            } => write!(
                f,
                "{transfer} R{destination_register}, [R{base_register}, R{offset_register}]"
            ),
            Self::LoadStoreImmOffset {
                load_store,
                byte_word,
                offset,
                base_register,
                destination_register,
            } => write!(
                f,
                "{} R{destination_register}, [R{base_register}, #{offset}]",
                transfer_name(*load_store, *byte_word)
            ),
            Self::LoadStoreHalfword {
                load_store,
                offset,
                base_register,
                destination_register,
            } => {
                let name = match load_store {
                    LoadStoreKind::Load => "LDRH",
                    LoadStoreKind::Store => "STRH",
                };
                write!(f, "{name} R{destination_register}, [R{base_register}, #{offset}]")
            }
            Self::SPRelativeLoadStore {
                load_store,
                destination_register,
                offset,
            } => write!(
                f,
                "{} R{destination_register}, [SP, #{offset}]",
                transfer_name(*load_store, ReadWriteKind::Word)
            ),
            Self::LoadAddress {
                sp,
                destination_register,
                offset,
            } => {
                let source = if *sp { "SP" } else { "PC" };
                write!(f, "ADD R{destination_register}, {source}, #{offset}")
            }
            Self::AddOffsetSP { subtract, offset } => {
                let sign = if *subtract { "-" } else { "" };
                write!(f, "ADD SP, #{sign}{offset}")
            }
            Self::PushPopReg {
                load_store,
                pc_lr,
                register_list,
            } => {
                let (name, extra) = match load_store {
                    LoadStoreKind::Load => ("POP", "PC"),
                    LoadStoreKind::Store => ("PUSH", "LR"),
                };
                let extra = pc_lr.then_some(extra);
                write!(f, "{name} {}", register_list_string(*register_list, extra))
            }
            Self::MultipleLoadStore {
                load_store,
                base_register,
                register_list,
            } => {
                let name = match load_store {
                    LoadStoreKind::Load => "LDMIA",
                    LoadStoreKind::Store => "STMIA",
                };
                write!(
                    f,
                    "{name} R{base_register}!, {}",
                    register_list_string(*register_list, None)
                )
            }
            Self::CondBranch { condition, offset } => {
                write!(f, "B{condition} #{}", (*offset as i32).wrapping_add(4))
            }
            Self::Swi { comment } => write!(f, "SWI #0x{comment:X}"),
            Self::UncondBranch { offset } => write!(f, "B #{}", (*offset as i32).wrapping_add(4)),
            Self::LongBranchLink {
                second_half,
                offset,
            } => {
                let half = if *second_half { "L" } else { "H" };
                write!(f, "BL{half} #0x{offset:X}")
            }
            Self::Undefined => f.write_str("UND"),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn decode(op_code: u16) -> ThumbModeInstruction {
        ThumbModeInstruction::from(op_code)
    }

    #[test]
    fn decode_move_shifted_register() {
        let output = decode(0b000_01_00011_010_001);
        assert_eq!(
            output,
            ThumbModeInstruction::MoveShiftedRegister {
                shift_operation: ShiftKind::Lsr,
                offset5: 3,
                source_register: 2,
                destination_register: 1,
            }
        );
        assert_eq!(output.to_string(), "LSR R1, R2, #3");
    }

    #[test]
    fn decode_add_subtract() {
        let output = decode(0b00011_1_1_101_000_011);
        assert_eq!(
            output,
            ThumbModeInstruction::AddSubtract {
                operation_kind: OperandKind::Immediate,
                subtract: true,
                rn_offset3: 5,
                source_register: 0,
                destination_register: 3,
            }
        );
        assert_eq!(output.to_string(), "SUB R3, R0, #5");
        assert_eq!(decode(0b00011_0_0_101_000_011).to_string(), "ADD R3, R0, R5");
    }

    #[test]
    fn decode_multiple_load_store() {
        let output = decode(0b1100_1001_1010_0000);
        assert_eq!(
            output,
            ThumbModeInstruction::MultipleLoadStore {
                load_store: LoadStoreKind::Load,
                base_register: 1,
                register_list: 0b1010_0000,
            }
        );
        assert_eq!(output.to_string(), "LDMIA R1!, {R5, R7}");
    }

    #[test]
    fn decode_pc_relative_load() {
        let output = decode(0b0100_1001_0101_1000);
        assert_eq!(
            output,
            ThumbModeInstruction::PCRelativeLoad {
                destination_register: 1,
                offset: 352,
            }
        );
        assert_eq!(output.to_string(), "LDR R1, [PC, #352]");
    }

    #[test]
    fn decode_load_store_register_offset() {
        let output = decode(0b0101_00_0_000_001_010);
        assert_eq!(
            output,
            ThumbModeInstruction::LoadStoreRegisterOffset {
                load_store: LoadStoreKind::Store,
                byte_word: ReadWriteKind::Word,
                offset_register: 0,
                base_register: 1,
                destination_register: 2,
            }
        );
        assert_eq!(output.to_string(), "STR R2, [R1, R0]");
    }

    #[test]
    fn decode_sign_extended_transfers() {
        assert_eq!(decode(0b0101_001_000_001_010).to_string(), "STRH R2, [R1, R0]");
        assert_eq!(decode(0b0101_101_000_001_010).to_string(), "LDRH R2, [R1, R0]");
        assert_eq!(decode(0b0101_011_000_001_010).to_string(), "LDSB R2, [R1, R0]");
        assert_eq!(decode(0b0101_111_000_001_010).to_string(), "LDSH R2, [R1, R0]");
    }

    #[test]
    fn decode_immediate_offsets_are_scaled() {
        assert_eq!(decode(0b011_0_1_00011_001_010).to_string(), "LDR R2, [R1, #12]");
        assert_eq!(decode(0b011_1_1_00011_001_010).to_string(), "LDRB R2, [R1, #3]");
        assert_eq!(decode(0b1000_0_00011_001_010).to_string(), "STRH R2, [R1, #6]");
        assert_eq!(decode(0b1001_1_010_0000_0011).to_string(), "LDR R2, [SP, #12]");
        assert_eq!(decode(0b1010_1_010_0000_0011).to_string(), "ADD R2, SP, #12");
        assert_eq!(decode(0b1011_0000_1_000_0011).to_string(), "ADD SP, #-12");
    }

    #[test]
    fn decode_branches() {
        let output = decode(0b1110_0111_1111_1110);
        assert_eq!(output, ThumbModeInstruction::UncondBranch { offset: (-4_i32) as u32 });
        assert_eq!(output.to_string(), "B #0");

        let output = decode(0b1101_0001_0000_0010);
        assert_eq!(
            output,
            ThumbModeInstruction::CondBranch {
                condition: Condition::NE,
                offset: 4,
            }
        );
        assert_eq!(output.to_string(), "BNE #8");

        assert_eq!(
            decode(0xF7FF),
            ThumbModeInstruction::LongBranchLink {
                second_half: false,
                offset: 0x7FF,
            }
        );
    }

    #[test]
    fn decode_hi_reg_operation() {
        let output = decode(0b0100_0111_0111_0000);
        assert_eq!(
            output,
            ThumbModeInstruction::HiRegisterOpBX {
                register_operation: ThumbHighRegisterOperation::Bx,
                source_register: 14,
                destination_register: 0,
            }
        );
        assert_eq!(output.to_string(), "BX R14");

        let output = decode(0b010001_00_0_1_000_001);
        assert_eq!(
            output,
            ThumbModeInstruction::HiRegisterOpBX {
                register_operation: ThumbHighRegisterOperation::Add,
                source_register: 8,
                destination_register: 1,
            }
        );
        assert_eq!(output.to_string(), "ADD R1, R8");
    }

    #[test]
    fn decode_push_pop_register() {
        let output = decode(0b1011_0101_1111_0000);
        assert_eq!(
            output,
            ThumbModeInstruction::PushPopReg {
                load_store: LoadStoreKind::Store,
                pc_lr: true,
                register_list: 0b1111_0000,
            }
        );
        assert_eq!(output.to_string(), "PUSH {R4, R5, R6, R7, LR}");
        assert_eq!(decode(0b1011_1101_0000_0001).to_string(), "POP {R0, PC}");
    }

    #[test]
    fn decode_alu_operation() {
        let output = decode(0b0100_0011_0110_0000);
        assert_eq!(
            output,
            ThumbModeInstruction::AluOp {
                alu_operation: ThumbModeAluInstruction::Mul,
                source_register: 4,
                destination_register: 0,
            }
        );
        assert_eq!(output.to_string(), "MUL R0, R4");
        assert_eq!(decode(0b0100_0010_0011_1110).to_string(), "TST R6, R7");
    }

    #[test]
    fn decode_swi_and_undefined() {
        assert_eq!(decode(0xDF2A), ThumbModeInstruction::Swi { comment: 0x2A });
        for op_code in [0xB100, 0xB200, 0xB600, 0xBA00, 0xBE00, 0xDE00, 0xE800, 0xEFFF] {
            assert_eq!(decode(op_code), ThumbModeInstruction::Undefined, "{op_code:04X}");
        }
    }
}
