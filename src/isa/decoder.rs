//! 解码器框架
//!
//! 表驱动解码：先用 opcode 判断指令组是否受支持，
//! 再在定义表中按 mask/match 查找具体指令。

use thiserror::Error;

use super::fields;
use super::instr::{DecodedInstr, InstrFields, RvInstr};
use super::instr_def::InstrDef;

/// 解码错误
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// opcode 不属于任何受支持的指令组
    #[error("unknown opcode 0x{opcode:02x} in instruction 0x{raw:08x}")]
    UnknownOpcode { opcode: u8, raw: u32 },
}

/// 表驱动解码器
///
/// 通用解码器，使用 InstrDef 数组进行解码
#[derive(Clone, Copy)]
pub struct TableDrivenDecoder {
    /// 解码器名称
    name: &'static str,
    /// 指令定义表
    instrs: &'static [InstrDef],
    /// 受支持的 opcode 组
    opcodes: &'static [u32],
}

impl TableDrivenDecoder {
    /// 创建新的表驱动解码器
    pub const fn new(name: &'static str, instrs: &'static [InstrDef], opcodes: &'static [u32]) -> Self {
        Self { name, instrs, opcodes }
    }

    /// 解码器名称
    pub fn name(&self) -> &str {
        self.name
    }

    /// 获取指令定义表
    pub fn instrs(&self) -> &'static [InstrDef] {
        self.instrs
    }

    /// 判断 opcode 是否属于受支持的指令组
    pub fn handles_opcode(&self, opcode: u32) -> bool {
        self.opcodes.contains(&opcode)
    }

    /// 解码指令
    ///
    /// - opcode 不受支持：返回 `DecodeError::UnknownOpcode`
    /// - opcode 受支持但 funct3/funct7 组合未定义：返回 `RvInstr::Reserved`
    pub fn decode(&self, raw: u32) -> Result<DecodedInstr, DecodeError> {
        let opcode = fields::opcode(raw);
        if !self.handles_opcode(opcode) {
            return Err(DecodeError::UnknownOpcode {
                opcode: opcode as u8,
                raw,
            });
        }

        Ok(self
            .instrs
            .iter()
            .find(|def| def.matches(raw))
            .map(|def| def.decode_instr(raw))
            .unwrap_or_else(|| DecodedInstr {
                raw,
                fields: InstrFields::from_raw(raw),
                instr: RvInstr::Reserved { raw },
            }))
    }
}

impl std::fmt::Debug for TableDrivenDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableDrivenDecoder")
            .field("name", &self.name)
            .field("instrs", &self.instrs.len())
            .finish()
    }
}
