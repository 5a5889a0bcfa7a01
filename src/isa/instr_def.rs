//! 指令定义结构
//!
//! 统一的指令定义，同时用于解码和冲突检测

use super::instr::{DecodedInstr, InstrFields, RvInstr};

/// 指令定义
///
/// 一处定义，两处使用：
/// - 解码：通过 mask/match 匹配后调用 decode 函数
/// - 冲突检测：通过 mask/match 判断两条指令是否可能冲突
#[derive(Clone)]
pub struct InstrDef {
    /// 指令名称（用于调试和冲突报告）
    pub name: &'static str,
    /// 匹配掩码：哪些位需要检查
    pub mask: u32,
    /// 匹配值：这些位应该是什么
    pub match_val: u32,
    /// 解码函数：从原始编码提取字段并构造 RvInstr
    pub decode: fn(u32) -> RvInstr,
}

impl InstrDef {
    /// 创建新的指令定义
    pub const fn new(
        name: &'static str,
        mask: u32,
        match_val: u32,
        decode: fn(u32) -> RvInstr,
    ) -> Self {
        Self {
            name,
            mask,
            match_val,
            decode,
        }
    }

    /// 检查指令是否匹配此定义
    #[inline]
    pub fn matches(&self, raw: u32) -> bool {
        (raw & self.mask) == self.match_val
    }

    /// 解码指令
    #[inline]
    pub fn decode_instr(&self, raw: u32) -> DecodedInstr {
        DecodedInstr {
            raw,
            fields: InstrFields::from_raw(raw),
            instr: (self.decode)(raw),
        }
    }

    /// 检查两个指令定义是否冲突
    ///
    /// 两个定义冲突当且仅当存在某个指令字同时匹配两者
    pub fn conflicts_with(&self, other: &InstrDef) -> bool {
        let common_mask = self.mask & other.mask;
        (self.match_val & common_mask) == (other.match_val & common_mask)
    }
}

impl std::fmt::Debug for InstrDef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstrDef")
            .field("name", &self.name)
            .field("mask", &format_args!("0x{:08X}", self.mask))
            .field("match_val", &format_args!("0x{:08X}", self.match_val))
            .finish()
    }
}

// ========== 类型掩码常量 ==========

/// R-type 指令的 mask（检查 opcode + funct3 + funct7）
pub const R_TYPE_MASK: u32 = 0xFE00707F;

/// I-type 指令的 mask（检查 opcode + funct3）
pub const I_TYPE_MASK: u32 = 0x707F;

/// S-type 指令的 mask（检查 opcode + funct3）
pub const S_TYPE_MASK: u32 = 0x707F;

/// B-type 指令的 mask（检查 opcode + funct3）
pub const B_TYPE_MASK: u32 = 0x707F;

/// U-type 指令的 mask（只检查 opcode）
pub const U_TYPE_MASK: u32 = 0x7F;

/// J-type 指令的 mask（只检查 opcode）
pub const J_TYPE_MASK: u32 = 0x7F;

/// RV32 移位立即数的 mask：imm[11:5] 占据 funct7 的位置，shamt 只有 5 位
pub const SHIFT_IMM_MASK: u32 = 0xFE00707F;

/// 精确匹配整个指令
pub const EXACT_MASK: u32 = 0xFFFFFFFF;

// ========== 辅助函数：构造 match 值 ==========

/// 构造 R-type 的 match 值
#[inline]
pub const fn r_match(funct7: u32, funct3: u32, opcode: u32) -> u32 {
    (funct7 << 25) | (funct3 << 12) | opcode
}

/// 构造 I-type 的 match 值
#[inline]
pub const fn i_match(funct3: u32, opcode: u32) -> u32 {
    (funct3 << 12) | opcode
}

/// 构造移位立即数的 match 值
///
/// `imm_hi` 是 imm[11:5]；SRAI 的选择位是 imm[10]，对应指令字第 30 位。
#[inline]
pub const fn shift_match(imm_hi: u32, funct3: u32, opcode: u32) -> u32 {
    (imm_hi << 25) | (funct3 << 12) | opcode
}
