use crate::bitwise::Bits;
use crate::cpu::alu::{compute, AluInstruction, ArithmeticOpResult};
use crate::cpu::arm::operations::multiplier_cycles;
use crate::cpu::arm7tdmi::Arm7tdmi;
use crate::cpu::barrel_shifter::{shift, Operand2, ShiftContext};
use crate::cpu::condition::Condition;
use crate::cpu::exception::Exception;
use crate::cpu::flags::{Indexing, LoadStoreKind, Offsetting, OperandKind, ReadWriteKind, ShiftKind};
use crate::cpu::pipeline::PcRole;
use crate::cpu::psr::CpuState;
use crate::cpu::registers::{REG_LR, REG_PROGRAM_COUNTER, REG_SP};
use crate::cpu::thumb::alu_instructions::{
    ThumbHighRegisterOperation, ThumbImmediateOperation, ThumbModeAluInstruction,
};
use crate::cpu::thumb::instruction::{SignExtendedTransfer, ThumbModeInstruction};
use crate::cpu::thumb::mode::ThumbModeOpcode;
use crate::memory::Bus;

impl<B: Bus> Arm7tdmi<B> {
    #[allow(clippy::too_many_lines)]
    pub(crate) fn execute_thumb(&mut self, op_code: ThumbModeOpcode) {
        use ThumbModeInstruction::{
            AddOffsetSP, AddSubtract, AluOp, CondBranch, HiRegisterOpBX, LoadAddress,
            LoadStoreHalfword, LoadStoreImmOffset, LoadStoreRegisterOffset,
            LoadStoreSignExtByteHalfword, LongBranchLink, MoveCompareAddSubtractImm,
            MoveShiftedRegister, MultipleLoadStore, PCRelativeLoad, PushPopReg,
            SPRelativeLoadStore, Swi, UncondBranch, Undefined,
        };

        match op_code.instruction {
            MoveShiftedRegister {
                shift_operation,
                offset5,
                source_register,
                destination_register,
            } => self.move_shifted_reg(
                shift_operation,
                offset5,
                source_register,
                destination_register,
            ),
            AddSubtract {
                operation_kind,
                subtract,
                rn_offset3,
                source_register,
                destination_register,
            } => self.add_subtract(
                operation_kind,
                subtract,
                rn_offset3,
                source_register,
                destination_register,
            ),
            MoveCompareAddSubtractImm {
                operation,
                destination_register,
                offset,
            } => self.move_compare_add_sub_imm(operation, destination_register, offset),
            AluOp {
                alu_operation,
                source_register,
                destination_register,
            } => self.alu_op(alu_operation, source_register, destination_register),
            HiRegisterOpBX {
                register_operation,
                source_register,
                destination_register,
            } => self.hi_reg_operation_branch_ex(
                register_operation,
                source_register,
                destination_register,
            ),
            PCRelativeLoad {
                destination_register,
                offset,
            } => {
                let address = self.effective_pc(PcRole::LiteralBase).wrapping_add(offset);
                self.word_or_byte_transfer(
                    LoadStoreKind::Load,
                    ReadWriteKind::Word,
                    address,
                    destination_register,
                );
            }
            LoadStoreRegisterOffset {
                load_store,
                byte_word,
                offset_register,
                base_register,
                destination_register,
            } => {
                let address = self
                    .registers
                    .register_at(base_register)
                    .wrapping_add(self.registers.register_at(offset_register));
                self.word_or_byte_transfer(load_store, byte_word, address, destination_register);
            }
            LoadStoreSignExtByteHalfword {
                transfer,
                offset_register,
                base_register,
                destination_register,
            } => {
                let address = self
                    .registers
                    .register_at(base_register)
                    .wrapping_add(self.registers.register_at(offset_register));
                self.halfword_transfer(transfer, address, destination_register);
            }
            LoadStoreImmOffset {
                load_store,
                byte_word,
                offset,
                base_register,
                destination_register,
            } => {
                let address = self.registers.register_at(base_register).wrapping_add(offset);
                self.word_or_byte_transfer(load_store, byte_word, address, destination_register);
            }
            LoadStoreHalfword {
                load_store,
                offset,
                base_register,
                destination_register,
            } => {
                let address = self.registers.register_at(base_register).wrapping_add(offset);
                let transfer = match load_store {
                    LoadStoreKind::Load => SignExtendedTransfer::LoadHalfword,
                    LoadStoreKind::Store => SignExtendedTransfer::StoreHalfword,
                };
                self.halfword_transfer(transfer, address, destination_register);
            }
            SPRelativeLoadStore {
                load_store,
                destination_register,
                offset,
            } => {
                let address = self.registers.register_at(REG_SP).wrapping_add(offset);
                self.word_or_byte_transfer(
                    load_store,
                    ReadWriteKind::Word,
                    address,
                    destination_register,
                );
            }
            LoadAddress {
                sp,
                destination_register,
                offset,
            } => {
                let base = if sp {
                    self.registers.register_at(REG_SP)
                } else {
                    self.effective_pc(PcRole::LiteralBase)
                };
                self.registers
                    .set_register_at(destination_register, base.wrapping_add(offset));
            }
            AddOffsetSP { subtract, offset } => {
                let sp = self.registers.register_at(REG_SP);
                let sp = if subtract {
                    sp.wrapping_sub(offset)
                } else {
                    sp.wrapping_add(offset)
                };
                self.registers.set_register_at(REG_SP, sp);
            }
            PushPopReg {
                load_store,
                pc_lr,
                register_list,
            } => self.push_pop_register(load_store, pc_lr, register_list),
            MultipleLoadStore {
                load_store,
                base_register,
                register_list,
            } => self.block_data_transfer(
                Indexing::Post,
                Offsetting::Up,
                false,
                true,
                load_store,
                base_register,
                register_list,
            ),
            CondBranch { condition, offset } => self.cond_branch(condition, offset),
            UncondBranch { offset } => {
                let target = self.effective_pc(PcRole::BranchBase).wrapping_add(offset);
                self.branch_to(target);
            }
            LongBranchLink {
                second_half,
                offset,
            } => self.long_branch_link(second_half, offset),
            Swi { .. } => self.take_exception(Exception::SoftwareInterrupt),
            Undefined => {
                tracing::warn!(
                    "undefined instruction 0x{:04X} at 0x{:08X}",
                    op_code.raw,
                    self.registers.program_counter()
                );
                self.take_exception(Exception::Undefined);
            }
        }
    }

    pub fn move_shifted_reg(&mut self, op: ShiftKind, offset5: u32, rs: usize, rd: usize) {
        let source = self.registers.register_at(rs);
        let r = shift(
            op,
            ShiftContext::ShiftByImmediate,
            source,
            offset5,
            self.cpsr.carry_flag(),
        );
        self.registers.set_register_at(rd, r.value);

        self.cpsr.set_nz(r.value);
        self.cpsr.set_carry_flag(r.carry);
    }

    pub fn add_subtract(
        &mut self,
        operation_kind: OperandKind,
        subtract: bool,
        rn_offset3: u32,
        rs: usize,
        rd: usize,
    ) {
        let offset = match operation_kind {
            OperandKind::Immediate => rn_offset3,
            OperandKind::Register => self.registers.register_at(rn_offset3 as usize),
        };
        let op = if subtract {
            AluInstruction::Sub
        } else {
            AluInstruction::Add
        };

        let result = self.thumb_compute(op, self.registers.register_at(rs), offset);
        self.registers.set_register_at(rd, result.result);
        self.cpsr.set_flags(&result);
    }

    pub fn move_compare_add_sub_imm(
        &mut self,
        op: ThumbImmediateOperation,
        rd: usize,
        offset: u32,
    ) {
        let op = match op {
            // Only N and Z are affected.
            ThumbImmediateOperation::Mov => {
                self.registers.set_register_at(rd, offset);
                self.cpsr.set_nz(offset);
                return;
            }
            ThumbImmediateOperation::Cmp => AluInstruction::Cmp,
            ThumbImmediateOperation::Add => AluInstruction::Add,
            ThumbImmediateOperation::Sub => AluInstruction::Sub,
        };

        let result = self.thumb_compute(op, self.registers.register_at(rd), offset);
        if !op.is_test() {
            self.registers.set_register_at(rd, result.result);
        }
        self.cpsr.set_flags(&result);
    }

    pub fn alu_op(&mut self, op: ThumbModeAluInstruction, rs: usize, rd: usize) {
        let rd_value = self.registers.register_at(rd);
        let rs_value = self.registers.register_at(rs);

        match op {
            ThumbModeAluInstruction::Lsl
            | ThumbModeAluInstruction::Lsr
            | ThumbModeAluInstruction::Asr
            | ThumbModeAluInstruction::Ror => {
                let kind = match op {
                    ThumbModeAluInstruction::Lsl => ShiftKind::Lsl,
                    ThumbModeAluInstruction::Lsr => ShiftKind::Lsr,
                    ThumbModeAluInstruction::Asr => ShiftKind::Asr,
                    _ => ShiftKind::Ror,
                };
                let r = shift(
                    kind,
                    ShiftContext::ShiftByRegister,
                    rd_value,
                    rs_value & 0xFF,
                    self.cpsr.carry_flag(),
                );
                self.charge_internal(1);
                self.registers.set_register_at(rd, r.value);
                self.cpsr.set_nz(r.value);
                self.cpsr.set_carry_flag(r.carry);
            }
            ThumbModeAluInstruction::Neg => {
                let result = self.thumb_compute(AluInstruction::Rsb, rs_value, 0);
                self.registers.set_register_at(rd, result.result);
                self.cpsr.set_flags(&result);
            }
            // C is left unchanged.
            ThumbModeAluInstruction::Mul => {
                let result = rd_value.wrapping_mul(rs_value);
                self.charge_internal(multiplier_cycles(rd_value, true));
                self.registers.set_register_at(rd, result);
                self.cpsr.set_nz(result);
            }
            _ => {
                if let Some(alu) = op.data_processing() {
                    let result = self.thumb_compute(alu, rd_value, rs_value);
                    if !alu.is_test() {
                        self.registers.set_register_at(rd, result.result);
                    }
                    self.cpsr.set_flags(&result);
                }
            }
        }
    }

    /// `rn op operand` with the current flags and an unshifted operand.
    fn thumb_compute(&self, op: AluInstruction, rn: u32, operand: u32) -> ArithmeticOpResult {
        let carry = self.cpsr.carry_flag();
        compute(
            op,
            rn,
            Operand2::new(operand, carry),
            carry,
            self.cpsr.overflow_flag(),
        )
    }

    pub fn hi_reg_operation_branch_ex(
        &mut self,
        op: ThumbHighRegisterOperation,
        rs: usize,
        rd: usize,
    ) {
        let source = self.read_register(rs, PcRole::Operand);

        match op {
            ThumbHighRegisterOperation::Add => {
                let value = self.read_register(rd, PcRole::Operand).wrapping_add(source);
                self.write_register(rd, value);
            }
            ThumbHighRegisterOperation::Cmp => {
                let destination = self.read_register(rd, PcRole::Operand);
                let result = self.thumb_compute(AluInstruction::Cmp, destination, source);
                self.cpsr.set_flags(&result);
            }
            ThumbHighRegisterOperation::Mov => self.write_register(rd, source),
            ThumbHighRegisterOperation::Bx => {
                let state = CpuState::from(source.get_bit(0));
                if state != CpuState::Thumb {
                    tracing::debug!("BX to 0x{source:08X} switches to {state:?}");
                }
                self.cpsr.set_cpu_state(state);
                self.branch_to(source);
            }
        }
    }

    fn word_or_byte_transfer(
        &mut self,
        load_store: LoadStoreKind,
        byte_word: ReadWriteKind,
        address: u32,
        rd: usize,
    ) {
        match load_store {
            LoadStoreKind::Load => {
                let value = match byte_word {
                    ReadWriteKind::Word => self.load_word(address, false),
                    ReadWriteKind::Byte => self.load_byte(address),
                };
                self.charge_internal(1);
                self.registers.set_register_at(rd, value);
            }
            LoadStoreKind::Store => {
                let value = self.registers.register_at(rd);
                match byte_word {
                    ReadWriteKind::Word => self.store_word(address, value, false),
                    ReadWriteKind::Byte => self.store_byte(address, value as u8),
                }
                self.fetch_non_sequential = true;
            }
        }
    }

    fn halfword_transfer(&mut self, transfer: SignExtendedTransfer, address: u32, rd: usize) {
        let value = match transfer {
            SignExtendedTransfer::StoreHalfword => {
                let value = self.registers.register_at(rd);
                self.store_half_word(address, value as u16);
                self.fetch_non_sequential = true;
                return;
            }
            SignExtendedTransfer::LoadHalfword => self.load_half_word(address),
            SignExtendedTransfer::LoadSignedByte => self.load_signed_byte(address),
            SignExtendedTransfer::LoadSignedHalfword => self.load_signed_half_word(address),
        };
        self.charge_internal(1);
        self.registers.set_register_at(rd, value);
    }

    /// PUSH is STMDB SP! and POP is LDMIA SP!. Popping PC keeps the state.
    pub fn push_pop_register(&mut self, load_store: LoadStoreKind, pc_lr: bool, register_list: u16) {
        match load_store {
            LoadStoreKind::Store => {
                let mut list = register_list;
                list.set_bit(REG_LR as u8, pc_lr);
                self.block_data_transfer(
                    Indexing::Pre,
                    Offsetting::Down,
                    false,
                    true,
                    load_store,
                    REG_SP,
                    list,
                );
            }
            LoadStoreKind::Load => {
                let mut list = register_list;
                list.set_bit(REG_PROGRAM_COUNTER as u8, pc_lr);
                self.block_data_transfer(
                    Indexing::Post,
                    Offsetting::Up,
                    false,
                    true,
                    load_store,
                    REG_SP,
                    list,
                );
            }
        }
    }

    pub fn cond_branch(&mut self, condition: Condition, offset: u32) {
        if self.cpsr.can_execute(condition) {
            let target = self.effective_pc(PcRole::BranchBase).wrapping_add(offset);
            self.branch_to(target);
        }
    }

    pub fn long_branch_link(&mut self, second_half: bool, offset: u32) {
        if second_half {
            let target = self
                .registers
                .register_at(REG_LR)
                .wrapping_add(offset << 1);
            let next = self.registers.program_counter().wrapping_add(2);
            self.registers.set_register_at(REG_LR, next | 1);
            self.branch_to(target);
        } else {
            let high = offset.sign_extended(11) << 12;
            let lr = self.effective_pc(PcRole::BranchBase).wrapping_add(high);
            self.registers.set_register_at(REG_LR, lr);
        }
    }
}
