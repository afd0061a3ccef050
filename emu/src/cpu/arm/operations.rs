use crate::bitwise::Bits;
use crate::cpu::alu::{compute, AluInstruction};
use crate::cpu::arm::alu_instruction::{
    AluSecondOperandInfo, PsrKind, PsrOperand, ShiftOperator,
};
use crate::cpu::arm::instructions::{
    ArmModeInstruction, ArmModeMultiplyLongVariant, ArmModeMultiplyVariant,
    HalfwordTransferOffset, SingleDataTransferOffsetInfo,
};
use crate::cpu::arm::mode::ArmModeOpcode;
use crate::cpu::arm7tdmi::Arm7tdmi;
use crate::cpu::barrel_shifter::{rotated_immediate, shift, Operand2, ShiftContext};
use crate::cpu::exception::Exception;
use crate::cpu::flags::{
    HalfwordTransferKind, Indexing, LoadStoreKind, Offsetting, ReadWriteKind,
};
use crate::cpu::pipeline::PcRole;
use crate::cpu::psr::{CpuState, FLAGS_MASK};
use crate::cpu::registers::{REG_LR, REG_PROGRAM_COUNTER};
use crate::memory::Bus;

/// Internal cycles of the multiplier for a given Rs: one per significant
/// byte beyond the first. Signed forms also stop early on leading ones.
pub(crate) fn multiplier_cycles(rs: u32, signed: bool) -> i32 {
    let settled = |mask: u32| rs & mask == 0 || (signed && rs & mask == mask);
    if settled(0xFFFF_FF00) {
        1
    } else if settled(0xFFFF_0000) {
        2
    } else if settled(0xFF00_0000) {
        3
    } else {
        4
    }
}

/// First address and written-back base of a block transfer of `count`
/// words.
pub(crate) fn block_addresses(
    base: u32,
    count: u32,
    indexing: Indexing,
    offsetting: Offsetting,
) -> (u32, u32) {
    let size = count * 4;
    match (offsetting, indexing) {
        (Offsetting::Up, Indexing::Post) => (base, base.wrapping_add(size)),
        (Offsetting::Up, Indexing::Pre) => (base.wrapping_add(4), base.wrapping_add(size)),
        (Offsetting::Down, Indexing::Post) => {
            let new_base = base.wrapping_sub(size);
            (new_base.wrapping_add(4), new_base)
        }
        (Offsetting::Down, Indexing::Pre) => {
            let new_base = base.wrapping_sub(size);
            (new_base, new_base)
        }
    }
}

impl<B: Bus> Arm7tdmi<B> {
    pub(crate) fn execute_arm(&mut self, op_code: ArmModeOpcode) {
        use ArmModeInstruction::{
            BlockDataTransfer, Branch, BranchAndExchange, Coprocessor, DataProcessing,
            HalfwordDataTransfer, MoveFromStatus, MoveToStatus, Multiply, MultiplyLong,
            SingleDataSwap, SingleDataTransfer, SoftwareInterrupt, Undefined,
        };

        match op_code.instruction {
            DataProcessing {
                alu_instruction,
                set_conditions,
                rn,
                destination,
                op2,
            } => self.data_processing(alu_instruction, set_conditions, rn, destination, op2),
            MoveFromStatus {
                psr_kind,
                destination,
            } => self.move_from_status(psr_kind, destination),
            MoveToStatus {
                psr_kind,
                field_mask,
                operand,
            } => self.move_to_status(psr_kind, field_mask, operand),
            Multiply {
                variant,
                set_conditions,
                destination,
                rn,
                rs,
                rm,
            } => self.multiply(variant, set_conditions, destination, rn, rs, rm),
            MultiplyLong {
                variant,
                set_conditions,
                rd_hi,
                rd_lo,
                rs,
                rm,
            } => self.multiply_long(variant, set_conditions, rd_hi, rd_lo, rs, rm),
            SingleDataSwap {
                quantity,
                rn,
                destination,
                rm,
            } => self.single_data_swap(quantity, rn, destination, rm),
            BranchAndExchange { register } => self.branch_and_exchange(register),
            HalfwordDataTransfer {
                indexing,
                offsetting,
                write_back,
                load_store,
                transfer_kind,
                rn,
                rd,
                offset,
            } => self.halfword_data_transfer(
                indexing,
                offsetting,
                write_back,
                load_store,
                transfer_kind,
                rn,
                rd,
                offset,
            ),
            SingleDataTransfer {
                load_store,
                quantity,
                write_back,
                indexing,
                offsetting,
                rn,
                rd,
                offset_info,
            } => self.single_data_transfer(
                load_store,
                quantity,
                write_back,
                indexing,
                offsetting,
                rn,
                rd,
                offset_info,
            ),
            BlockDataTransfer {
                indexing,
                offsetting,
                load_psr,
                write_back,
                load_store,
                rn,
                register_list,
            } => self.block_data_transfer(
                indexing,
                offsetting,
                load_psr,
                write_back,
                load_store,
                rn,
                register_list,
            ),
            Branch { link, offset } => self.branch(link, offset),
            Coprocessor | Undefined => {
                tracing::warn!(
                    "undefined instruction 0x{:08X} at 0x{:08X}",
                    op_code.raw,
                    self.registers.program_counter()
                );
                self.take_exception(Exception::Undefined);
            }
            SoftwareInterrupt { .. } => self.take_exception(Exception::SoftwareInterrupt),
        }
    }

    /// Operand 2 and whether it was shifted by a register.
    fn operand2(&mut self, op2: AluSecondOperandInfo) -> (Operand2, bool) {
        let carry = self.cpsr.carry_flag();
        match op2 {
            AluSecondOperandInfo::Immediate { field } => (rotated_immediate(field, carry), false),
            AluSecondOperandInfo::Register {
                shift_op: ShiftOperator::Immediate(amount),
                shift_kind,
                register,
            } => {
                let value = self.read_register(register, PcRole::Operand);
                (
                    shift(shift_kind, ShiftContext::ShiftByImmediate, value, amount, carry),
                    false,
                )
            }
            AluSecondOperandInfo::Register {
                shift_op: ShiftOperator::Register(rs),
                shift_kind,
                register,
            } => {
                let value = self.read_register(register, PcRole::RegisterShiftOperand);
                let amount = self.read_register(rs, PcRole::RegisterShiftOperand) & 0xFF;
                self.charge_internal(1);
                (
                    shift(shift_kind, ShiftContext::ShiftByRegister, value, amount, carry),
                    true,
                )
            }
        }
    }

    pub fn data_processing(
        &mut self,
        alu_instruction: AluInstruction,
        set_conditions: bool,
        rn: usize,
        destination: usize,
        op2: AluSecondOperandInfo,
    ) {
        let (operand, register_shift) = self.operand2(op2);
        let rn_role = if register_shift {
            PcRole::RegisterShiftOperand
        } else {
            PcRole::Operand
        };
        let op1 = self.read_register(rn, rn_role);

        let result = compute(
            alu_instruction,
            op1,
            operand,
            self.cpsr.carry_flag(),
            self.cpsr.overflow_flag(),
        );

        if !alu_instruction.is_test() && destination == REG_PROGRAM_COUNTER {
            // Exception return: the flags come from the SPSR.
            if set_conditions && self.cpsr.mode().has_spsr() {
                self.restore_cpsr_from_spsr();
            } else if set_conditions {
                self.cpsr.set_flags(&result);
            }
            self.branch_to(result.result);
            return;
        }

        if !alu_instruction.is_test() {
            self.registers.set_register_at(destination, result.result);
        }

        if set_conditions {
            self.cpsr.set_flags(&result);
        }
    }

    pub fn move_from_status(&mut self, psr_kind: PsrKind, destination: usize) {
        let psr = match psr_kind {
            PsrKind::Cpsr => self.cpsr,
            // User and System read their CPSR.
            PsrKind::Spsr => self.spsr().unwrap_or(self.cpsr),
        };
        self.write_register(destination, psr.into());
    }

    pub fn move_to_status(&mut self, psr_kind: PsrKind, field_mask: u32, operand: PsrOperand) {
        let value = match operand {
            PsrOperand::Register(register) => self.read_register(register, PcRole::Operand),
            PsrOperand::Immediate { field } => {
                rotated_immediate(field, self.cpsr.carry_flag()).value
            }
        };

        let mode = self.cpsr.mode();
        match psr_kind {
            PsrKind::Cpsr => {
                let mask = if mode.is_privileged() {
                    field_mask
                } else {
                    field_mask & FLAGS_MASK
                };

                let mut psr = self.cpsr;
                // Bit 4 of the mode field reads as one whatever is written.
                psr.write_masked(value | 0x10, mask);

                if psr.state_bit() != self.cpsr.state_bit() {
                    tracing::debug!("MSR changes T to {}", psr.state_bit());
                }

                if let Err(err) = self.write_status(psr) {
                    self.report(err);
                }
            }
            PsrKind::Spsr => match self.register_bank.spsr_mut(mode) {
                Some(spsr) => spsr.write_masked(value, field_mask),
                None => tracing::debug!("MSR to SPSR ignored in {mode}"),
            },
        }
    }

    pub fn multiply(
        &mut self,
        variant: ArmModeMultiplyVariant,
        set_conditions: bool,
        destination: usize,
        rn: usize,
        rs: usize,
        rm: usize,
    ) {
        let rs_value = self.registers.register_at(rs);
        let mut result = self.registers.register_at(rm).wrapping_mul(rs_value);
        self.charge_internal(multiplier_cycles(rs_value, true));

        if variant == ArmModeMultiplyVariant::Mla {
            result = result.wrapping_add(self.registers.register_at(rn));
            self.charge_internal(1);
        }

        self.write_register(destination, result);

        if set_conditions {
            self.cpsr.set_nz(result);
        }
    }

    pub fn multiply_long(
        &mut self,
        variant: ArmModeMultiplyLongVariant,
        set_conditions: bool,
        rd_hi: usize,
        rd_lo: usize,
        rs: usize,
        rm: usize,
    ) {
        let rs_value = self.registers.register_at(rs);
        let rm_value = self.registers.register_at(rm);

        let mut result = if variant.is_signed() {
            (i64::from(rm_value as i32) * i64::from(rs_value as i32)) as u64
        } else {
            u64::from(rm_value) * u64::from(rs_value)
        };
        self.charge_internal(multiplier_cycles(rs_value, variant.is_signed()) + 1);

        if variant.accumulates() {
            let accumulator = (u64::from(self.registers.register_at(rd_hi)) << 32)
                | u64::from(self.registers.register_at(rd_lo));
            result = result.wrapping_add(accumulator);
            self.charge_internal(1);
        }

        self.write_register(rd_lo, result as u32);
        self.write_register(rd_hi, (result >> 32) as u32);

        if set_conditions {
            self.cpsr.set_nz_long(result);
        }
    }

    pub fn single_data_swap(
        &mut self,
        quantity: ReadWriteKind,
        rn: usize,
        destination: usize,
        rm: usize,
    ) {
        let address = self.read_register(rn, PcRole::Operand);
        let source = self.read_register(rm, PcRole::Operand);

        let old = match quantity {
            ReadWriteKind::Word => {
                let old = self.load_word(address, false);
                self.store_word(address, source, false);
                old
            }
            ReadWriteKind::Byte => {
                let old = self.load_byte(address);
                self.store_byte(address, source as u8);
                old
            }
        };
        self.charge_internal(1);

        self.write_register(destination, old);
    }

    pub fn branch_and_exchange(&mut self, register: usize) {
        let target = self.read_register(register, PcRole::Operand);
        let state = CpuState::from(target.get_bit(0));
        if state != self.cpsr.cpu_state() {
            tracing::debug!("BX to 0x{target:08X} switches to {state:?}");
        }
        self.cpsr.set_cpu_state(state);
        self.branch_to(target);
    }

    #[allow(clippy::too_many_arguments)]
    pub fn halfword_data_transfer(
        &mut self,
        indexing: Indexing,
        offsetting: Offsetting,
        write_back: bool,
        load_store: LoadStoreKind,
        transfer_kind: HalfwordTransferKind,
        rn: usize,
        rd: usize,
        offset: HalfwordTransferOffset,
    ) {
        let base = self.read_register(rn, PcRole::Operand);
        let offset = match offset {
            HalfwordTransferOffset::Immediate(value) => value,
            HalfwordTransferOffset::Register(register) => {
                self.read_register(register, PcRole::Operand)
            }
        };
        let offset_address = offsetting.apply(base, offset);
        let address = match indexing {
            Indexing::Pre => offset_address,
            Indexing::Post => base,
        };
        let write_back = write_back || indexing == Indexing::Post;

        match load_store {
            LoadStoreKind::Load => {
                let value = match transfer_kind {
                    HalfwordTransferKind::UnsignedHalfwords => self.load_half_word(address),
                    HalfwordTransferKind::SignedByte => self.load_signed_byte(address),
                    HalfwordTransferKind::SignedHalfwords => self.load_signed_half_word(address),
                };
                self.charge_internal(1);

                if write_back {
                    self.write_back_base(rn, offset_address);
                }
                self.write_register(rd, value);
            }
            LoadStoreKind::Store => {
                let value = self.read_register(rd, PcRole::StoreSource);
                self.store_half_word(address, value as u16);
                self.fetch_non_sequential = true;

                if write_back {
                    self.write_back_base(rn, offset_address);
                }
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn single_data_transfer(
        &mut self,
        load_store: LoadStoreKind,
        quantity: ReadWriteKind,
        write_back: bool,
        indexing: Indexing,
        offsetting: Offsetting,
        rn: usize,
        rd: usize,
        offset_info: SingleDataTransferOffsetInfo,
    ) {
        let offset = match offset_info {
            SingleDataTransferOffsetInfo::Immediate { offset } => offset,
            SingleDataTransferOffsetInfo::RegisterImmediate {
                shift_amount,
                shift_kind,
                register,
            } => {
                let value = self.read_register(register, PcRole::Operand);
                shift(
                    shift_kind,
                    ShiftContext::ShiftByImmediate,
                    value,
                    shift_amount,
                    self.cpsr.carry_flag(),
                )
                .value
            }
        };

        let base = self.read_register(rn, PcRole::Operand);
        let offset_address = offsetting.apply(base, offset);
        let address = match indexing {
            Indexing::Pre => offset_address,
            Indexing::Post => base,
        };
        let write_back = write_back || indexing == Indexing::Post;

        match load_store {
            LoadStoreKind::Load => {
                let value = match quantity {
                    ReadWriteKind::Word => self.load_word(address, false),
                    ReadWriteKind::Byte => self.load_byte(address),
                };
                self.charge_internal(1);

                // The loaded value wins over the written-back base.
                if write_back {
                    self.write_back_base(rn, offset_address);
                }
                self.write_register(rd, value);
            }
            LoadStoreKind::Store => {
                let value = self.read_register(rd, PcRole::StoreSource);
                match quantity {
                    ReadWriteKind::Word => self.store_word(address, value, false),
                    ReadWriteKind::Byte => self.store_byte(address, value as u8),
                }
                self.fetch_non_sequential = true;

                if write_back {
                    self.write_back_base(rn, offset_address);
                }
            }
        }
    }

    fn write_back_base(&mut self, rn: usize, value: u32) {
        if rn == REG_PROGRAM_COUNTER {
            tracing::debug!("write-back to R15 ignored");
            return;
        }
        self.registers.set_register_at(rn, value);
    }

    #[allow(clippy::too_many_arguments)]
    pub fn block_data_transfer(
        &mut self,
        indexing: Indexing,
        offsetting: Offsetting,
        load_psr: bool,
        write_back: bool,
        load_store: LoadStoreKind,
        rn: usize,
        register_list: u16,
    ) {
        let base = self.registers.register_at(rn);

        // An empty list transfers R15 and moves the base as for sixteen words.
        let (register_list, count) = if register_list == 0 {
            (1 << REG_PROGRAM_COUNTER, 16)
        } else {
            (register_list, register_list.count_ones())
        };
        let (start, new_base) = block_addresses(base, count, indexing, offsetting);

        let loads_pc = register_list.get_bit(15);
        let user_bank = load_psr && !(load_store == LoadStoreKind::Load && loads_pc);
        let mode = self.cpsr.mode();
        let registers = (0..16).filter(|r| register_list.get_bit(*r as u8));

        match load_store {
            LoadStoreKind::Store => {
                for (n, register) in registers.enumerate() {
                    let address = start.wrapping_add(4 * n as u32);
                    let value = if register == REG_PROGRAM_COUNTER {
                        self.effective_pc(PcRole::StoreSource)
                    } else if user_bank {
                        self.register_bank
                            .user_register(&self.registers, mode, register)
                    } else if register == rn && write_back && n > 0 {
                        // The base is written back after the first transfer.
                        new_base
                    } else {
                        self.registers.register_at(register)
                    };
                    self.store_word(address, value, n > 0);
                }
                self.fetch_non_sequential = true;

                if write_back {
                    self.write_back_base(rn, new_base);
                }
            }
            LoadStoreKind::Load => {
                // Loaded values win over the written-back base.
                if write_back && !register_list.get_bit(rn as u8) {
                    self.write_back_base(rn, new_base);
                }

                for (n, register) in registers.enumerate() {
                    let address = start.wrapping_add(4 * n as u32);
                    let value = self.load_word_aligned(address, n > 0);

                    if register == REG_PROGRAM_COUNTER {
                        if load_psr {
                            self.restore_cpsr_from_spsr();
                        }
                        self.branch_to(value);
                    } else if user_bank {
                        self.register_bank.set_user_register(
                            &mut self.registers,
                            mode,
                            register,
                            value,
                        );
                    } else {
                        self.registers.set_register_at(register, value);
                    }
                }
                self.charge_internal(1);
            }
        }
    }

    pub fn branch(&mut self, link: bool, offset: u32) {
        let pc = self.registers.program_counter();
        if link {
            self.registers.set_register_at(REG_LR, pc.wrapping_add(4));
        }
        let target = self.effective_pc(PcRole::BranchBase).wrapping_add(offset);
        self.branch_to(target);
    }
}
