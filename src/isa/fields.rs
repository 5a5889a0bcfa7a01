//! 指令字段提取辅助函数
//!
//! 提供从 32-bit 指令字中提取各字段的工具函数。
//! 所有位运算都在 `u32` 上完成，掩码之后才重新解释为 `i32`。

/// 提取 `value[hi:lo]`，零扩展
#[inline]
pub const fn bits(value: u32, hi: u32, lo: u32) -> u32 {
    let width = hi - lo + 1;
    (value >> lo) & (u32::MAX >> (32 - width))
}

/// 提取 `value[hi:lo]`，并以 `value[hi]` 为符号位扩展到 32 位
#[inline]
pub const fn bits_signed(value: u32, hi: u32, lo: u32) -> i32 {
    let pad = 32 - (hi - lo + 1);
    ((bits(value, hi, lo) << pad) as i32) >> pad
}

/// 提取 opcode 字段 [6:0]
#[inline]
pub fn opcode(raw: u32) -> u32 {
    bits(raw, 6, 0)
}

/// 提取 rd 字段 [11:7]
#[inline]
pub fn rd(raw: u32) -> u8 {
    bits(raw, 11, 7) as u8
}

/// 提取 funct3 字段 [14:12]
#[inline]
pub fn funct3(raw: u32) -> u32 {
    bits(raw, 14, 12)
}

/// 提取 rs1 字段 [19:15]
#[inline]
pub fn rs1(raw: u32) -> u8 {
    bits(raw, 19, 15) as u8
}

/// 提取 rs2 字段 [24:20]
#[inline]
pub fn rs2(raw: u32) -> u8 {
    bits(raw, 24, 20) as u8
}

/// 提取 funct7 字段 [31:25]
#[inline]
pub fn funct7(raw: u32) -> u32 {
    bits(raw, 31, 25)
}

/// 提取 I-type 立即数并符号扩展
/// imm[11:0] = raw[31:20]
#[inline]
pub fn imm_i(raw: u32) -> i32 {
    bits_signed(raw, 31, 20)
}

/// 提取 S-type 立即数并符号扩展
/// imm[11:5] = raw[31:25], imm[4:0] = raw[11:7]
#[inline]
pub fn imm_s(raw: u32) -> i32 {
    (bits_signed(raw, 31, 25) << 5) | bits(raw, 11, 7) as i32
}

/// 提取 B-type 立即数并符号扩展
/// imm[12] = raw[31], imm[11] = raw[7], imm[10:5] = raw[30:25], imm[4:1] = raw[11:8]
#[inline]
pub fn imm_b(raw: u32) -> i32 {
    (bits_signed(raw, 31, 31) << 12)
        | (bits(raw, 7, 7) << 11) as i32
        | (bits(raw, 30, 25) << 5) as i32
        | (bits(raw, 11, 8) << 1) as i32
}

/// 提取 U-type 立即数
/// imm[31:12] = raw[31:12], imm[11:0] = 0，不做扩展
#[inline]
pub fn imm_u(raw: u32) -> i32 {
    (bits(raw, 31, 12) << 12) as i32
}

/// 提取 J-type 立即数并符号扩展
/// imm[20] = raw[31], imm[19:12] = raw[19:12], imm[11] = raw[20], imm[10:1] = raw[30:21]
#[inline]
pub fn imm_j(raw: u32) -> i32 {
    (bits_signed(raw, 31, 31) << 20)
        | (bits(raw, 19, 12) << 12) as i32
        | (bits(raw, 20, 20) << 11) as i32
        | (bits(raw, 30, 21) << 1) as i32
}

/// 提取移位量 shamt [24:20]，即 I-type 立即数的低 5 位
#[inline]
pub fn shamt(raw: u32) -> u8 {
    bits(raw, 24, 20) as u8
}

// ========== Opcode 常量 ==========
pub const OP_LUI: u32 = 0b0110111;
pub const OP_AUIPC: u32 = 0b0010111;
pub const OP_JAL: u32 = 0b1101111;
pub const OP_JALR: u32 = 0b1100111;
pub const OP_BRANCH: u32 = 0b1100011;
pub const OP_LOAD: u32 = 0b0000011;
pub const OP_STORE: u32 = 0b0100011;
pub const OP_IMM: u32 = 0b0010011;
pub const OP_REG: u32 = 0b0110011;
pub const OP_SYSTEM: u32 = 0b1110011;
