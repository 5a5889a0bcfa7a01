//! 定义指令的语义表达式，用于解码和执行阶段

use super::fields;

/// RV32I 指令的语义化表示
///
/// 使用枚举来表示已解码的指令，每个变体包含该指令所需的所有操作数。
/// 解码阶段一次性做完字段提取与符号扩展，执行阶段只做运算。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RvInstr {
    // ========== R-type 算术/逻辑指令 ==========
    /// ADD: rd = rs1 + rs2
    Add { rd: u8, rs1: u8, rs2: u8 },
    /// SUB: rd = rs1 - rs2
    Sub { rd: u8, rs1: u8, rs2: u8 },
    /// AND: rd = rs1 & rs2
    And { rd: u8, rs1: u8, rs2: u8 },
    /// OR: rd = rs1 | rs2
    Or { rd: u8, rs1: u8, rs2: u8 },
    /// XOR: rd = rs1 ^ rs2
    Xor { rd: u8, rs1: u8, rs2: u8 },
    /// SLT: rd = (rs1 < rs2) ? 1 : 0 (有符号比较)
    Slt { rd: u8, rs1: u8, rs2: u8 },
    /// SLTU: rd = (rs1 < rs2) ? 1 : 0 (无符号比较)
    Sltu { rd: u8, rs1: u8, rs2: u8 },
    /// SLL: rd = rs1 << rs2[4:0]
    Sll { rd: u8, rs1: u8, rs2: u8 },
    /// SRL: rd = rs1 >> rs2[4:0] (逻辑右移)
    Srl { rd: u8, rs1: u8, rs2: u8 },
    /// SRA: rd = rs1 >> rs2[4:0] (算术右移)
    Sra { rd: u8, rs1: u8, rs2: u8 },

    // ========== I-type 立即数算术/逻辑指令 ==========
    /// ADDI: rd = rs1 + imm
    Addi { rd: u8, rs1: u8, imm: i32 },
    /// ANDI: rd = rs1 & imm
    Andi { rd: u8, rs1: u8, imm: i32 },
    /// ORI: rd = rs1 | imm
    Ori { rd: u8, rs1: u8, imm: i32 },
    /// XORI: rd = rs1 ^ imm
    Xori { rd: u8, rs1: u8, imm: i32 },
    /// SLTI: rd = (rs1 < imm) ? 1 : 0 (有符号比较)
    Slti { rd: u8, rs1: u8, imm: i32 },
    /// SLTIU: rd = (rs1 < imm) ? 1 : 0 (无符号比较)
    Sltiu { rd: u8, rs1: u8, imm: i32 },
    /// SLLI: rd = rs1 << shamt
    Slli { rd: u8, rs1: u8, shamt: u8 },
    /// SRLI: rd = rs1 >> shamt (逻辑右移)
    Srli { rd: u8, rs1: u8, shamt: u8 },
    /// SRAI: rd = rs1 >> shamt (算术右移)
    Srai { rd: u8, rs1: u8, shamt: u8 },

    // ========== Load 指令 ==========
    /// LB: rd = sign_extend(mem[rs1 + offset][7:0])
    Lb { rd: u8, rs1: u8, offset: i32 },
    /// LH: rd = sign_extend(mem[rs1 + offset][15:0])
    Lh { rd: u8, rs1: u8, offset: i32 },
    /// LW: rd = mem[rs1 + offset]
    Lw { rd: u8, rs1: u8, offset: i32 },
    /// LBU: rd = zero_extend(mem[rs1 + offset][7:0])
    Lbu { rd: u8, rs1: u8, offset: i32 },
    /// LHU: rd = zero_extend(mem[rs1 + offset][15:0])
    Lhu { rd: u8, rs1: u8, offset: i32 },

    // ========== Store 指令 ==========
    /// SB: mem[rs1 + offset] = rs2[7:0]
    Sb { rs1: u8, rs2: u8, offset: i32 },
    /// SH: mem[rs1 + offset] = rs2[15:0]
    Sh { rs1: u8, rs2: u8, offset: i32 },
    /// SW: mem[rs1 + offset] = rs2
    Sw { rs1: u8, rs2: u8, offset: i32 },

    // ========== U-type 指令 ==========
    /// LUI: rd = imm (低 12 位为 0)
    Lui { rd: u8, imm: i32 },
    /// AUIPC: rd = pc + imm
    Auipc { rd: u8, imm: i32 },

    // ========== 控制流指令 ==========
    /// JAL: rd = pc + 4; pc = (pc + offset) & !1
    Jal { rd: u8, offset: i32 },
    /// JALR: rd = pc + 4; pc = (rs1 + offset) & !1
    Jalr { rd: u8, rs1: u8, offset: i32 },
    /// BEQ: if (rs1 == rs2) pc = pc + offset
    Beq { rs1: u8, rs2: u8, offset: i32 },
    /// BNE: if (rs1 != rs2) pc = pc + offset
    Bne { rs1: u8, rs2: u8, offset: i32 },
    /// BLT: if (rs1 < rs2) pc = pc + offset (有符号)
    Blt { rs1: u8, rs2: u8, offset: i32 },
    /// BGE: if (rs1 >= rs2) pc = pc + offset (有符号)
    Bge { rs1: u8, rs2: u8, offset: i32 },
    /// BLTU: if (rs1 < rs2) pc = pc + offset (无符号)
    Bltu { rs1: u8, rs2: u8, offset: i32 },
    /// BGEU: if (rs1 >= rs2) pc = pc + offset (无符号)
    Bgeu { rs1: u8, rs2: u8, offset: i32 },

    // ========== 系统指令 ==========
    /// EBREAK: 断点，停止仿真
    Ebreak,

    /// opcode 合法但 funct3/funct7 组合未定义的编码，按空操作执行
    Reserved { raw: u32 },
}

impl RvInstr {
    /// 助记符，用于日志与调试器输出
    pub fn mnemonic(&self) -> &'static str {
        match self {
            RvInstr::Add { .. } => "add",
            RvInstr::Sub { .. } => "sub",
            RvInstr::And { .. } => "and",
            RvInstr::Or { .. } => "or",
            RvInstr::Xor { .. } => "xor",
            RvInstr::Slt { .. } => "slt",
            RvInstr::Sltu { .. } => "sltu",
            RvInstr::Sll { .. } => "sll",
            RvInstr::Srl { .. } => "srl",
            RvInstr::Sra { .. } => "sra",
            RvInstr::Addi { .. } => "addi",
            RvInstr::Andi { .. } => "andi",
            RvInstr::Ori { .. } => "ori",
            RvInstr::Xori { .. } => "xori",
            RvInstr::Slti { .. } => "slti",
            RvInstr::Sltiu { .. } => "sltiu",
            RvInstr::Slli { .. } => "slli",
            RvInstr::Srli { .. } => "srli",
            RvInstr::Srai { .. } => "srai",
            RvInstr::Lb { .. } => "lb",
            RvInstr::Lh { .. } => "lh",
            RvInstr::Lw { .. } => "lw",
            RvInstr::Lbu { .. } => "lbu",
            RvInstr::Lhu { .. } => "lhu",
            RvInstr::Sb { .. } => "sb",
            RvInstr::Sh { .. } => "sh",
            RvInstr::Sw { .. } => "sw",
            RvInstr::Lui { .. } => "lui",
            RvInstr::Auipc { .. } => "auipc",
            RvInstr::Jal { .. } => "jal",
            RvInstr::Jalr { .. } => "jalr",
            RvInstr::Beq { .. } => "beq",
            RvInstr::Bne { .. } => "bne",
            RvInstr::Blt { .. } => "blt",
            RvInstr::Bge { .. } => "bge",
            RvInstr::Bltu { .. } => "bltu",
            RvInstr::Bgeu { .. } => "bgeu",
            RvInstr::Ebreak => "ebreak",
            RvInstr::Reserved { .. } => "reserved",
        }
    }
}

/// 从指令字按固定位置切出的全部字段
///
/// 每次取指后整体重算，与具体指令无关：五种立即数格式都会被计算，
/// 执行阶段使用 `RvInstr`，这里的字段供日志与检查使用。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InstrFields {
    pub opcode: u8,
    pub funct3: u8,
    pub funct7: u8,
    pub rs1: u8,
    pub rs2: u8,
    pub rd: u8,
    pub imm_i: i32,
    pub imm_s: i32,
    pub imm_u: i32,
    pub imm_j: i32,
    pub imm_b: i32,
}

impl InstrFields {
    /// 切分指令字
    pub fn from_raw(raw: u32) -> Self {
        InstrFields {
            opcode: fields::opcode(raw) as u8,
            funct3: fields::funct3(raw) as u8,
            funct7: fields::funct7(raw) as u8,
            rs1: fields::rs1(raw),
            rs2: fields::rs2(raw),
            rd: fields::rd(raw),
            imm_i: fields::imm_i(raw),
            imm_s: fields::imm_s(raw),
            imm_u: fields::imm_u(raw),
            imm_j: fields::imm_j(raw),
            imm_b: fields::imm_b(raw),
        }
    }
}

/// 解码结果：原始编码、字段切分与语义指令
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedInstr {
    pub raw: u32,
    pub fields: InstrFields,
    pub instr: RvInstr,
}
