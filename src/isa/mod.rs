//! RISC-V ISA 抽象与解码
//!
//! 本模块提供 RV32I 指令解码：
//! - `fields`: 位段提取与五种立即数格式
//! - `RvInstr`: 指令的语义表示
//! - `InstrDef`: 统一的指令定义，同时用于解码和冲突检测
//! - `TableDrivenDecoder`: 基于定义表的解码器

mod decoder;
mod fields;
mod instr;
mod instr_def;
mod rv32i;

pub use decoder::{DecodeError, TableDrivenDecoder};
pub use fields::*;
pub use instr::{DecodedInstr, InstrFields, RvInstr};
pub use instr_def::InstrDef;
pub use rv32i::{RV32I_DECODER, RV32I_INSTRS, RV32I_OPCODES};

/// 便捷函数：使用默认 RV32I 解码器解码指令
pub fn decode(raw: u32) -> Result<DecodedInstr, DecodeError> {
    RV32I_DECODER.decode(raw)
}

#[cfg(test)]
mod tests;
