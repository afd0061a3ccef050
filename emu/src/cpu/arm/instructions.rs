//! # ARM Instruction Decoding
//!
//! 32-bit ARM instructions are sorted by bits 27-25 first, then by the
//! few extra bits each family needs to tell its members apart:
//!
//! ```text
//! ┌───────┬──────────────────────────────────────────────────────────────┐
//! │ 27-25 │ Family                                                       │
//! ├───────┼──────────────────────────────────────────────────────────────┤
//! │  000  │ data processing (register), multiply, swap, BX, halfword     │
//! │       │ transfers, MRS/MSR (register)                                │
//! │  001  │ data processing (immediate), MSR (immediate)                 │
//! │  010  │ LDR/STR, immediate offset                                    │
//! │  011  │ LDR/STR, register offset (bit 4 set: undefined)              │
//! │  100  │ LDM/STM                                                      │
//! │  101  │ B/BL                                                         │
//! │  110  │ coprocessor data transfer                                    │
//! │  111  │ coprocessor operation or register transfer, SWI (bit 24)     │
//! └───────┴──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Reserved encodings inside a family (for example a multiply with bit 22
//! set, or a store with signed transfer bits) decode to
//! [`ArmModeInstruction::Undefined`] and take the undefined trap.
//!
//! ## Example: `ADDS R0, R1, #0xFF000000`
//!
//! ```text
//! 1110 00 1 0100 1 0001 0000 0100 11111111
//! Cond    I Op   S Rn   Rd   Rot  Imm
//! AL      1 ADD  1 R1   R0   4    0xFF   (0xFF rotated right by 8)
//! ```

use std::fmt::Display;

use crate::bitwise::Bits;
use crate::cpu::alu::AluInstruction;
use crate::cpu::arm::alu_instruction::{AluSecondOperandInfo, PsrKind, PsrOperand};
use crate::cpu::condition::Condition;
use crate::cpu::flags::{
    HalfwordTransferKind, Indexing, LoadStoreKind, Offsetting, ReadWriteKind, ShiftKind,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SingleDataTransferOffsetInfo {
    Immediate {
        offset: u32,
    },
    RegisterImmediate {
        shift_amount: u32,
        shift_kind: ShiftKind,
        register: usize,
    },
}

impl Display for SingleDataTransferOffsetInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Immediate { offset } => write!(f, "#{offset}"),
            Self::RegisterImmediate {
                shift_amount: 0,
                shift_kind: ShiftKind::Lsl,
                register,
            } => write!(f, "R{register}"),
            Self::RegisterImmediate {
                shift_amount: 0,
                shift_kind: ShiftKind::Ror,
                register,
            } => write!(f, "R{register}, RRX"),
            Self::RegisterImmediate {
                shift_amount,
                shift_kind,
                register,
            } => {
                let amount = if *shift_amount == 0 { 32 } else { *shift_amount };
                write!(f, "R{register}, {shift_kind} #{amount}")
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HalfwordTransferOffset {
    Immediate(u32),
    Register(usize),
}

impl Display for HalfwordTransferOffset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Immediate(offset) => write!(f, "#{offset}"),
            Self::Register(register) => write!(f, "R{register}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArmModeMultiplyVariant {
    Mul,
    Mla,
}

impl Display for ArmModeMultiplyVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Mul => f.write_str("MUL"),
            Self::Mla => f.write_str("MLA"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArmModeMultiplyLongVariant {
    Umull,
    Umlal,
    Smull,
    Smlal,
}

impl ArmModeMultiplyLongVariant {
    #[must_use]
    pub const fn is_signed(self) -> bool {
        matches!(self, Self::Smull | Self::Smlal)
    }

    #[must_use]
    pub const fn accumulates(self) -> bool {
        matches!(self, Self::Umlal | Self::Smlal)
    }
}

impl Display for ArmModeMultiplyLongVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Umull => f.write_str("UMULL"),
            Self::Umlal => f.write_str("UMLAL"),
            Self::Smull => f.write_str("SMULL"),
            Self::Smlal => f.write_str("SMLAL"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArmModeInstruction {
    DataProcessing {
        alu_instruction: AluInstruction,
        set_conditions: bool,
        rn: usize,
        destination: usize,
        op2: AluSecondOperandInfo,
    },
    MoveFromStatus {
        psr_kind: PsrKind,
        destination: usize,
    },
    MoveToStatus {
        psr_kind: PsrKind,
        /// Byte mask built from the control and flags field bits.
        field_mask: u32,
        operand: PsrOperand,
    },
    Multiply {
        variant: ArmModeMultiplyVariant,
        set_conditions: bool,
        destination: usize,
        rn: usize,
        rs: usize,
        rm: usize,
    },
    MultiplyLong {
        variant: ArmModeMultiplyLongVariant,
        set_conditions: bool,
        rd_hi: usize,
        rd_lo: usize,
        rs: usize,
        rm: usize,
    },
    SingleDataSwap {
        quantity: ReadWriteKind,
        rn: usize,
        destination: usize,
        rm: usize,
    },
    BranchAndExchange {
        register: usize,
    },
    HalfwordDataTransfer {
        indexing: Indexing,
        offsetting: Offsetting,
        write_back: bool,
        load_store: LoadStoreKind,
        transfer_kind: HalfwordTransferKind,
        rn: usize,
        rd: usize,
        offset: HalfwordTransferOffset,
    },
    SingleDataTransfer {
        load_store: LoadStoreKind,
        quantity: ReadWriteKind,
        write_back: bool,
        indexing: Indexing,
        offsetting: Offsetting,
        rn: usize,
        rd: usize,
        offset_info: SingleDataTransferOffsetInfo,
    },
    BlockDataTransfer {
        indexing: Indexing,
        offsetting: Offsetting,
        load_psr: bool,
        write_back: bool,
        load_store: LoadStoreKind,
        rn: usize,
        register_list: u16,
    },
    Branch {
        link: bool,
        /// Sign-extended byte offset from the pipelined PC.
        offset: u32,
    },
    /// No coprocessor is attached: every coprocessor instruction traps.
    Coprocessor,
    SoftwareInterrupt {
        comment: u32,
    },
    Undefined,
}

impl From<u32> for ArmModeInstruction {
    fn from(op_code: u32) -> Self {
        match op_code.get_bits(25..=27) {
            0b000 => decode_family_zero(op_code),
            0b001 => {
                if op_code.get_bits(23..=24) == 0b10 && !op_code.get_bit(20) {
                    if op_code.get_bit(21) {
                        decode_move_to_status(
                            op_code,
                            PsrOperand::Immediate {
                                field: op_code.get_bits(0..=11),
                            },
                        )
                    } else {
                        Self::Undefined
                    }
                } else {
                    decode_data_processing(op_code)
                }
            }
            0b010 => decode_single_data_transfer(op_code),
            0b011 if op_code.get_bit(4) => Self::Undefined,
            0b011 => decode_single_data_transfer(op_code),
            0b100 => Self::BlockDataTransfer {
                indexing: op_code.get_bit(24).into(),
                offsetting: op_code.get_bit(23).into(),
                load_psr: op_code.get_bit(22),
                write_back: op_code.get_bit(21),
                load_store: op_code.get_bit(20).into(),
                rn: op_code.get_bits(16..=19) as usize,
                register_list: op_code.get_bits(0..=15) as u16,
            },
            0b101 => Self::Branch {
                link: op_code.get_bit(24),
                offset: (op_code.get_bits(0..=23) << 2).sign_extended(26),
            },
            0b110 => Self::Coprocessor,
            _ => {
                if op_code.get_bit(24) {
                    Self::SoftwareInterrupt {
                        comment: op_code.get_bits(0..=23),
                    }
                } else {
                    Self::Coprocessor
                }
            }
        }
    }
}

fn decode_family_zero(op_code: u32) -> ArmModeInstruction {
    if op_code.get_bits(4..=7) == 0b1001 {
        return decode_multiply_or_swap(op_code);
    }

    if op_code.get_bit(7) && op_code.get_bit(4) {
        return decode_halfword_transfer(op_code);
    }

    if op_code.get_bits(23..=24) == 0b10 && !op_code.get_bit(20) {
        return decode_miscellaneous(op_code);
    }

    decode_data_processing(op_code)
}

fn decode_multiply_or_swap(op_code: u32) -> ArmModeInstruction {
    let rm = op_code.get_bits(0..=3) as usize;
    let rs = op_code.get_bits(8..=11) as usize;
    let set_conditions = op_code.get_bit(20);

    match op_code.get_bits(23..=27) {
        0b00000 if op_code.get_bit(22) => ArmModeInstruction::Undefined,
        0b00000 => ArmModeInstruction::Multiply {
            variant: if op_code.get_bit(21) {
                ArmModeMultiplyVariant::Mla
            } else {
                ArmModeMultiplyVariant::Mul
            },
            set_conditions,
            destination: op_code.get_bits(16..=19) as usize,
            rn: op_code.get_bits(12..=15) as usize,
            rs,
            rm,
        },
        0b00001 => ArmModeInstruction::MultiplyLong {
            variant: match (op_code.get_bit(22), op_code.get_bit(21)) {
                (false, false) => ArmModeMultiplyLongVariant::Umull,
                (false, true) => ArmModeMultiplyLongVariant::Umlal,
                (true, false) => ArmModeMultiplyLongVariant::Smull,
                (true, true) => ArmModeMultiplyLongVariant::Smlal,
            },
            set_conditions,
            rd_hi: op_code.get_bits(16..=19) as usize,
            rd_lo: op_code.get_bits(12..=15) as usize,
            rs,
            rm,
        },
        0b00010 if op_code.get_bits(20..=21) == 0 && op_code.get_bits(8..=11) == 0 => {
            ArmModeInstruction::SingleDataSwap {
                quantity: op_code.get_bit(22).into(),
                rn: op_code.get_bits(16..=19) as usize,
                destination: op_code.get_bits(12..=15) as usize,
                rm,
            }
        }
        _ => ArmModeInstruction::Undefined,
    }
}

fn decode_halfword_transfer(op_code: u32) -> ArmModeInstruction {
    let load_store = LoadStoreKind::from(op_code.get_bit(20));
    let transfer_kind = match (op_code.get_bit(6), op_code.get_bit(5)) {
        (false, true) => HalfwordTransferKind::UnsignedHalfwords,
        (true, false) => HalfwordTransferKind::SignedByte,
        (true, true) => HalfwordTransferKind::SignedHalfwords,
        (false, false) => return ArmModeInstruction::Undefined,
    };

    // Signed stores are reserved.
    if load_store == LoadStoreKind::Store && transfer_kind != HalfwordTransferKind::UnsignedHalfwords {
        return ArmModeInstruction::Undefined;
    }

    let offset = if op_code.get_bit(22) {
        HalfwordTransferOffset::Immediate((op_code.get_bits(8..=11) << 4) | op_code.get_bits(0..=3))
    } else {
        HalfwordTransferOffset::Register(op_code.get_bits(0..=3) as usize)
    };

    ArmModeInstruction::HalfwordDataTransfer {
        indexing: op_code.get_bit(24).into(),
        offsetting: op_code.get_bit(23).into(),
        write_back: op_code.get_bit(21),
        load_store,
        transfer_kind,
        rn: op_code.get_bits(16..=19) as usize,
        rd: op_code.get_bits(12..=15) as usize,
        offset,
    }
}

/// TST/TEQ/CMP/CMN space with S clear: status transfers and BX.
fn decode_miscellaneous(op_code: u32) -> ArmModeInstruction {
    match op_code.get_bits(4..=7) {
        0b0000 if op_code.get_bit(21) => decode_move_to_status(
            op_code,
            PsrOperand::Register(op_code.get_bits(0..=3) as usize),
        ),
        0b0000 => ArmModeInstruction::MoveFromStatus {
            psr_kind: op_code.get_bit(22).into(),
            destination: op_code.get_bits(12..=15) as usize,
        },
        0b0001 if op_code.get_bits(21..=22) == 0b01 && op_code.get_bits(8..=19) == 0xFFF => {
            ArmModeInstruction::BranchAndExchange {
                register: op_code.get_bits(0..=3) as usize,
            }
        }
        _ => ArmModeInstruction::Undefined,
    }
}

fn decode_move_to_status(op_code: u32, operand: PsrOperand) -> ArmModeInstruction {
    let mut field_mask = 0;
    if op_code.get_bit(16) {
        field_mask |= 0x0000_00FF;
    }
    if op_code.get_bit(19) {
        field_mask |= 0xFF00_0000;
    }

    ArmModeInstruction::MoveToStatus {
        psr_kind: op_code.get_bit(22).into(),
        field_mask,
        operand,
    }
}

fn decode_data_processing(op_code: u32) -> ArmModeInstruction {
    ArmModeInstruction::DataProcessing {
        alu_instruction: AluInstruction::from(op_code.get_bits(21..=24)),
        set_conditions: op_code.get_bit(20),
        rn: op_code.get_bits(16..=19) as usize,
        destination: op_code.get_bits(12..=15) as usize,
        op2: AluSecondOperandInfo::decode(op_code),
    }
}

fn decode_single_data_transfer(op_code: u32) -> ArmModeInstruction {
    let offset_info = if op_code.get_bit(25) {
        SingleDataTransferOffsetInfo::RegisterImmediate {
            shift_amount: op_code.get_bits(7..=11),
            shift_kind: ShiftKind::from(op_code.get_bits(5..=6)),
            register: op_code.get_bits(0..=3) as usize,
        }
    } else {
        SingleDataTransferOffsetInfo::Immediate {
            offset: op_code.get_bits(0..=11),
        }
    };

    ArmModeInstruction::SingleDataTransfer {
        load_store: op_code.get_bit(20).into(),
        quantity: op_code.get_bit(22).into(),
        write_back: op_code.get_bit(21),
        indexing: op_code.get_bit(24).into(),
        offsetting: op_code.get_bit(23).into(),
        rn: op_code.get_bits(16..=19) as usize,
        rd: op_code.get_bits(12..=15) as usize,
        offset_info,
    }
}

fn register_list_string(register_list: u16) -> String {
    let registers = (0..16)
        .filter(|r| register_list.get_bit(*r))
        .map(|r| format!("R{r}"))
        .collect::<Vec<_>>();
    format!("{{{}}}", registers.join(", "))
}

fn address_string(
    rn: usize,
    indexing: Indexing,
    offsetting: Offsetting,
    write_back: bool,
    offset: &str,
) -> String {
    let sign = if offsetting == Offsetting::Down { "-" } else { "" };
    match indexing {
        Indexing::Pre => {
            let bang = if write_back { "!" } else { "" };
            format!("[R{rn}, {sign}{offset}]{bang}")
        }
        Indexing::Post => format!("[R{rn}], {sign}{offset}"),
    }
}

impl ArmModeInstruction {
    /// Renders the instruction in assembler syntax.
    #[must_use]
    pub fn disassembler(&self, condition: Condition) -> String {
        match self {
            Self::DataProcessing {
                alu_instruction,
                set_conditions,
                rn,
                destination,
                op2,
            } => {
                if alu_instruction.is_test() {
                    format!("{alu_instruction}{condition} R{rn}, {op2}")
                } else {
                    let set_string = if *set_conditions { "S" } else { "" };
                    if alu_instruction.is_move() {
                        format!("{alu_instruction}{condition}{set_string} R{destination}, {op2}")
                    } else {
                        format!(
                            "{alu_instruction}{condition}{set_string} R{destination}, R{rn}, {op2}"
                        )
                    }
                }
            }
            Self::MoveFromStatus {
                psr_kind,
                destination,
            } => format!("MRS{condition} R{destination}, {psr_kind}"),
            Self::MoveToStatus {
                psr_kind,
                field_mask,
                operand,
            } => {
                let mut fields = String::new();
                if field_mask & 0xFF != 0 {
                    fields.push('c');
                }
                if field_mask & 0xFF00_0000 != 0 {
                    fields.push('f');
                }
                format!("MSR{condition} {psr_kind}_{fields}, {operand}")
            }
            Self::Multiply {
                variant,
                set_conditions,
                destination,
                rn,
                rs,
                rm,
            } => {
                let set_string = if *set_conditions { "S" } else { "" };
                match variant {
                    ArmModeMultiplyVariant::Mul => {
                        format!("MUL{condition}{set_string} R{destination}, R{rm}, R{rs}")
                    }
                    ArmModeMultiplyVariant::Mla => {
                        format!("MLA{condition}{set_string} R{destination}, R{rm}, R{rs}, R{rn}")
                    }
                }
            }
            Self::MultiplyLong {
                variant,
                set_conditions,
                rd_hi,
                rd_lo,
                rs,
                rm,
            } => {
                let set_string = if *set_conditions { "S" } else { "" };
                format!("{variant}{condition}{set_string} R{rd_lo}, R{rd_hi}, R{rm}, R{rs}")
            }
            Self::SingleDataSwap {
                quantity,
                rn,
                destination,
                rm,
            } => {
                let b = if *quantity == ReadWriteKind::Byte { "B" } else { "" };
                format!("SWP{condition}{b} R{destination}, R{rm}, [R{rn}]")
            }
            Self::BranchAndExchange { register } => format!("BX{condition} R{register}"),
            Self::HalfwordDataTransfer {
                indexing,
                offsetting,
                write_back,
                load_store,
                transfer_kind,
                rn,
                rd,
                offset,
            } => {
                let name = match load_store {
                    LoadStoreKind::Load => "LDR",
                    LoadStoreKind::Store => "STR",
                };
                let address = address_string(
                    *rn,
                    *indexing,
                    *offsetting,
                    *write_back,
                    &offset.to_string(),
                );
                format!("{name}{condition}{transfer_kind} R{rd}, {address}")
            }
            Self::SingleDataTransfer {
                load_store,
                quantity,
                write_back,
                indexing,
                offsetting,
                rn,
                rd,
                offset_info,
            } => {
                let name = match load_store {
                    LoadStoreKind::Load => "LDR",
                    LoadStoreKind::Store => "STR",
                };
                let b = if *quantity == ReadWriteKind::Byte { "B" } else { "" };
                let t = if *indexing == Indexing::Post && *write_back { "T" } else { "" };
                let address = address_string(
                    *rn,
                    *indexing,
                    *offsetting,
                    *write_back,
                    &offset_info.to_string(),
                );
                format!("{name}{condition}{b}{t} R{rd}, {address}")
            }
            Self::BlockDataTransfer {
                indexing,
                offsetting,
                load_psr,
                write_back,
                load_store,
                rn,
                register_list,
            } => {
                let name = match load_store {
                    LoadStoreKind::Load => "LDM",
                    LoadStoreKind::Store => "STM",
                };
                let suffix = match (offsetting, indexing) {
                    (Offsetting::Up, Indexing::Post) => "IA",
                    (Offsetting::Up, Indexing::Pre) => "IB",
                    (Offsetting::Down, Indexing::Post) => "DA",
                    (Offsetting::Down, Indexing::Pre) => "DB",
                };
                let bang = if *write_back { "!" } else { "" };
                let hat = if *load_psr { "^" } else { "" };
                let list = register_list_string(*register_list);
                format!("{name}{condition}{suffix} R{rn}{bang}, {list}{hat}")
            }
            Self::Branch { link, offset } => {
                let l = if *link { "L" } else { "" };
                format!("B{l}{condition} #{}", (*offset as i32).wrapping_add(8))
            }
            Self::Coprocessor => format!("CDP{condition}"),
            Self::SoftwareInterrupt { comment } => format!("SWI{condition} #0x{comment:X}"),
            Self::Undefined => "UND".to_string(),
        }
    }
}

impl Display for ArmModeInstruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.disassembler(Condition::AL))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::cpu::arm::alu_instruction::ShiftOperator;

    fn decode(op_code: u32) -> ArmModeInstruction {
        ArmModeInstruction::from(op_code)
    }

    #[test]
    fn decode_data_processing_immediate() {
        let instruction = decode(0xE291_04FF);
        assert_eq!(
            instruction,
            ArmModeInstruction::DataProcessing {
                alu_instruction: AluInstruction::Add,
                set_conditions: true,
                rn: 1,
                destination: 0,
                op2: AluSecondOperandInfo::Immediate { field: 0x4FF },
            }
        );
        assert_eq!(instruction.to_string(), "ADDS R0, R1, #0xFF000000");
    }

    #[test]
    fn decode_data_processing_register_shift() {
        let instruction = decode(0x01A0_0312);
        assert_eq!(
            instruction,
            ArmModeInstruction::DataProcessing {
                alu_instruction: AluInstruction::Mov,
                set_conditions: false,
                rn: 0,
                destination: 0,
                op2: AluSecondOperandInfo::Register {
                    shift_op: ShiftOperator::Register(3),
                    shift_kind: ShiftKind::Lsl,
                    register: 2,
                },
            }
        );
        assert_eq!(instruction.disassembler(Condition::EQ), "MOVEQ R0, R2, LSL R3");
    }

    #[test]
    fn decode_test_instructions() {
        assert_eq!(decode(0xE35C_0001).to_string(), "CMP R12, #0x1");
        assert_eq!(decode(0xE13C_0001).to_string(), "TEQ R12, R1");
    }

    #[test]
    fn decode_psr_transfers() {
        assert_eq!(
            decode(0xE10F_0000),
            ArmModeInstruction::MoveFromStatus {
                psr_kind: PsrKind::Cpsr,
                destination: 0,
            }
        );
        assert_eq!(
            decode(0xE14F_3000),
            ArmModeInstruction::MoveFromStatus {
                psr_kind: PsrKind::Spsr,
                destination: 3,
            }
        );
        assert_eq!(
            decode(0xE129_F001),
            ArmModeInstruction::MoveToStatus {
                psr_kind: PsrKind::Cpsr,
                field_mask: 0xFF00_00FF,
                operand: PsrOperand::Register(1),
            }
        );
        assert_eq!(
            decode(0xE328_F20F),
            ArmModeInstruction::MoveToStatus {
                psr_kind: PsrKind::Cpsr,
                field_mask: 0xFF00_0000,
                operand: PsrOperand::Immediate { field: 0x20F },
            }
        );
        assert_eq!(decode(0xE169_F001).to_string(), "MSR SPSR_cf, R1");
    }

    #[test]
    fn decode_branch_and_exchange() {
        assert_eq!(
            decode(0xE12F_FF11),
            ArmModeInstruction::BranchAndExchange { register: 1 }
        );
        // Wrong SBO bits.
        assert_eq!(decode(0xE12F_0F11), ArmModeInstruction::Undefined);
    }

    #[test]
    fn decode_multiply() {
        assert_eq!(
            decode(0xE023_4192),
            ArmModeInstruction::Multiply {
                variant: ArmModeMultiplyVariant::Mla,
                set_conditions: false,
                destination: 3,
                rn: 4,
                rs: 1,
                rm: 2,
            }
        );
        assert_eq!(decode(0xE023_4192).to_string(), "MLA R3, R2, R1, R4");
        assert_eq!(
            decode(0xE0D1_0392),
            ArmModeInstruction::MultiplyLong {
                variant: ArmModeMultiplyLongVariant::Smull,
                set_conditions: true,
                rd_hi: 1,
                rd_lo: 0,
                rs: 3,
                rm: 2,
            }
        );
        assert_eq!(decode(0xE0D1_0392).to_string(), "SMULLS R0, R1, R2, R3");
    }

    #[test]
    fn decode_swap() {
        assert_eq!(
            decode(0xE142_1093),
            ArmModeInstruction::SingleDataSwap {
                quantity: ReadWriteKind::Byte,
                rn: 2,
                destination: 1,
                rm: 3,
            }
        );
        assert_eq!(decode(0xE142_1093).to_string(), "SWPB R1, R3, [R2]");
    }

    #[test]
    fn decode_halfword_transfers() {
        assert_eq!(
            decode(0xE1D1_00B2),
            ArmModeInstruction::HalfwordDataTransfer {
                indexing: Indexing::Pre,
                offsetting: Offsetting::Up,
                write_back: false,
                load_store: LoadStoreKind::Load,
                transfer_kind: HalfwordTransferKind::UnsignedHalfwords,
                rn: 1,
                rd: 0,
                offset: HalfwordTransferOffset::Immediate(2),
            }
        );
        assert_eq!(decode(0xE1D1_00B2).to_string(), "LDRH R0, [R1, #2]");
        assert_eq!(decode(0xE011_00F2).to_string(), "LDRSH R0, [R1], -R2");
    }

    #[test]
    fn decode_single_data_transfer() {
        assert_eq!(
            decode(0xE5B1_0004),
            ArmModeInstruction::SingleDataTransfer {
                load_store: LoadStoreKind::Load,
                quantity: ReadWriteKind::Word,
                write_back: true,
                indexing: Indexing::Pre,
                offsetting: Offsetting::Up,
                rn: 1,
                rd: 0,
                offset_info: SingleDataTransferOffsetInfo::Immediate { offset: 4 },
            }
        );
        assert_eq!(decode(0xE5B1_0004).to_string(), "LDR R0, [R1, #4]!");
        assert_eq!(decode(0xE7C1_0102).to_string(), "STRB R0, [R1, R2, LSL #2]");
    }

    #[test]
    fn decode_block_transfer() {
        assert_eq!(
            decode(0xE92D_4003).to_string(),
            "STMDB R13!, {R0, R1, R14}"
        );
        assert_eq!(decode(0xE8FD_8000).to_string(), "LDMIA R13!, {R15}^");
    }

    #[test]
    fn decode_branch() {
        assert_eq!(
            decode(0xEAFF_FFFE),
            ArmModeInstruction::Branch {
                link: false,
                offset: (-8_i32) as u32,
            }
        );
        assert_eq!(decode(0xEAFF_FFFE).to_string(), "B #0");
        assert_eq!(decode(0xEB00_0002).disassembler(Condition::NE), "BLNE #16");
    }

    #[test]
    fn decode_swi_and_coprocessor() {
        assert_eq!(
            decode(0xEF00_0012),
            ArmModeInstruction::SoftwareInterrupt { comment: 0x12 }
        );
        assert_eq!(decode(0xEE01_0F10), ArmModeInstruction::Coprocessor);
        assert_eq!(decode(0xED91_0100), ArmModeInstruction::Coprocessor);
    }

    #[test]
    fn decode_reserved_patterns_as_undefined() {
        for op_code in [
            // LDR/STR register offset with bit 4 set.
            0xE791_0012,
            // MUL with bit 22 set.
            0xE043_0192,
            // SWP with bits 20-21 set.
            0xE112_1093,
            // Signed halfword store.
            0xE1C1_00D2,
            // MSR immediate space with bit 21 clear.
            0xE308_F001,
            // Misc space, bits 7-4 neither 0000 nor 0001.
            0xE120_0070,
            // Multiply space with bits 23-27 past the swap family.
            0xE1A0_0090,
        ] {
            assert_eq!(decode(op_code), ArmModeInstruction::Undefined, "{op_code:#010x}");
        }
    }
}
