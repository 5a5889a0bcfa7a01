use crate::cpu::RegFile;
use super::Effect;
use crate::isa::{RvInstr, bits, bits_signed};
use crate::memory::{FULL_MASK, Memory};

const WORD_ALIGN: u32 = !0b11;

/// Execute one RV32I instruction fetched at `pc`.
pub fn execute(regs: &RegFile, mem: &mut dyn Memory, instr: &RvInstr, pc: u32) -> Effect {
    let next_pc = pc.wrapping_add(4);
    let x = |reg: u8| regs.read(reg);

    match *instr {
        // ========== R-type 算术/逻辑指令 ==========
        RvInstr::Add { rd, rs1, rs2 } => Effect::write_back(rd, x(rs1).wrapping_add(x(rs2)), next_pc),
        RvInstr::Sub { rd, rs1, rs2 } => Effect::write_back(rd, x(rs1).wrapping_sub(x(rs2)), next_pc),
        RvInstr::And { rd, rs1, rs2 } => Effect::write_back(rd, x(rs1) & x(rs2), next_pc),
        RvInstr::Or { rd, rs1, rs2 } => Effect::write_back(rd, x(rs1) | x(rs2), next_pc),
        RvInstr::Xor { rd, rs1, rs2 } => Effect::write_back(rd, x(rs1) ^ x(rs2), next_pc),
        RvInstr::Slt { rd, rs1, rs2 } => {
            let result = ((x(rs1) as i32) < (x(rs2) as i32)) as u32;
            Effect::write_back(rd, result, next_pc)
        }
        RvInstr::Sltu { rd, rs1, rs2 } => Effect::write_back(rd, (x(rs1) < x(rs2)) as u32, next_pc),
        RvInstr::Sll { rd, rs1, rs2 } => Effect::write_back(rd, x(rs1) << (x(rs2) & 0x1F), next_pc),
        RvInstr::Srl { rd, rs1, rs2 } => Effect::write_back(rd, x(rs1) >> (x(rs2) & 0x1F), next_pc),
        RvInstr::Sra { rd, rs1, rs2 } => {
            let result = ((x(rs1) as i32) >> (x(rs2) & 0x1F)) as u32;
            Effect::write_back(rd, result, next_pc)
        }

        // ========== I-type 立即数算术/逻辑指令 ==========
        RvInstr::Addi { rd, rs1, imm } => Effect::write_back(rd, x(rs1).wrapping_add(imm as u32), next_pc),
        RvInstr::Andi { rd, rs1, imm } => Effect::write_back(rd, x(rs1) & (imm as u32), next_pc),
        RvInstr::Ori { rd, rs1, imm } => Effect::write_back(rd, x(rs1) | (imm as u32), next_pc),
        RvInstr::Xori { rd, rs1, imm } => Effect::write_back(rd, x(rs1) ^ (imm as u32), next_pc),
        RvInstr::Slti { rd, rs1, imm } => Effect::write_back(rd, ((x(rs1) as i32) < imm) as u32, next_pc),
        RvInstr::Sltiu { rd, rs1, imm } => Effect::write_back(rd, (x(rs1) < imm as u32) as u32, next_pc),
        RvInstr::Slli { rd, rs1, shamt } => Effect::write_back(rd, x(rs1) << (shamt & 0x1F), next_pc),
        RvInstr::Srli { rd, rs1, shamt } => Effect::write_back(rd, x(rs1) >> (shamt & 0x1F), next_pc),
        RvInstr::Srai { rd, rs1, shamt } => {
            let result = ((x(rs1) as i32) >> (shamt & 0x1F)) as u32;
            Effect::write_back(rd, result, next_pc)
        }

        // ========== Load 指令：读出包含目标字节的对齐字，再按字节通道截取 ==========
        RvInstr::Lb { rd, rs1, offset } => {
            let addr = x(rs1).wrapping_add(offset as u32);
            let lane = (addr & 0b11) * 8;
            let value = bits_signed(mem.read(addr & WORD_ALIGN), lane + 7, lane) as u32;
            Effect::write_back(rd, value, next_pc)
        }
        RvInstr::Lh { rd, rs1, offset } => {
            let addr = x(rs1).wrapping_add(offset as u32);
            let lane = (addr & 0b10) * 8;
            let value = bits_signed(mem.read(addr & WORD_ALIGN), lane + 15, lane) as u32;
            Effect::write_back(rd, value, next_pc)
        }
        RvInstr::Lw { rd, rs1, offset } => {
            let addr = x(rs1).wrapping_add(offset as u32);
            Effect::write_back(rd, mem.read(addr & WORD_ALIGN), next_pc)
        }
        RvInstr::Lbu { rd, rs1, offset } => {
            let addr = x(rs1).wrapping_add(offset as u32);
            let lane = (addr & 0b11) * 8;
            let value = bits(mem.read(addr & WORD_ALIGN), lane + 7, lane);
            Effect::write_back(rd, value, next_pc)
        }
        RvInstr::Lhu { rd, rs1, offset } => {
            let addr = x(rs1).wrapping_add(offset as u32);
            let lane = (addr & 0b10) * 8;
            let value = bits(mem.read(addr & WORD_ALIGN), lane + 15, lane);
            Effect::write_back(rd, value, next_pc)
        }

        // ========== Store 指令：数据移到字节通道，配合掩码写入对齐字 ==========
        RvInstr::Sb { rs1, rs2, offset } => {
            let addr = x(rs1).wrapping_add(offset as u32);
            let lane = addr & 0b11;
            mem.write(addr & WORD_ALIGN, (x(rs2) & 0xFF) << (lane * 8), 0b0001 << lane);
            Effect::advance(next_pc)
        }
        RvInstr::Sh { rs1, rs2, offset } => {
            let addr = x(rs1).wrapping_add(offset as u32);
            let lane = addr & 0b10;
            mem.write(addr & WORD_ALIGN, (x(rs2) & 0xFFFF) << (lane * 8), 0b0011 << lane);
            Effect::advance(next_pc)
        }
        RvInstr::Sw { rs1, rs2, offset } => {
            let addr = x(rs1).wrapping_add(offset as u32);
            mem.write(addr & WORD_ALIGN, x(rs2), FULL_MASK);
            Effect::advance(next_pc)
        }

        // ========== U-type 指令 ==========
        RvInstr::Lui { rd, imm } => Effect::write_back(rd, imm as u32, next_pc),
        RvInstr::Auipc { rd, imm } => Effect::write_back(rd, pc.wrapping_add(imm as u32), next_pc),

        // ========== 控制流指令 ==========
        RvInstr::Jal { rd, offset } => {
            let target = pc.wrapping_add(offset as u32) & !1;
            Effect::write_back(rd, next_pc, target)
        }
        RvInstr::Jalr { rd, rs1, offset } => {
            let target = x(rs1).wrapping_add(offset as u32) & !1;
            Effect::write_back(rd, next_pc, target)
        }
        RvInstr::Beq { rs1, rs2, offset } => branch(x(rs1) == x(rs2), pc, offset),
        RvInstr::Bne { rs1, rs2, offset } => branch(x(rs1) != x(rs2), pc, offset),
        RvInstr::Blt { rs1, rs2, offset } => branch((x(rs1) as i32) < (x(rs2) as i32), pc, offset),
        RvInstr::Bge { rs1, rs2, offset } => branch((x(rs1) as i32) >= (x(rs2) as i32), pc, offset),
        RvInstr::Bltu { rs1, rs2, offset } => branch(x(rs1) < x(rs2), pc, offset),
        RvInstr::Bgeu { rs1, rs2, offset } => branch(x(rs1) >= x(rs2), pc, offset),

        // ========== 系统指令 ==========
        RvInstr::Ebreak => Effect::halt(pc),
        RvInstr::Reserved { .. } => Effect::advance(next_pc),
    }
}

#[inline]
fn branch(taken: bool, pc: u32, offset: i32) -> Effect {
    if taken {
        Effect::advance(pc.wrapping_add(offset as u32))
    } else {
        Effect::advance(pc.wrapping_add(4))
    }
}
