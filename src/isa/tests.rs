//! ISA 模块测试

use super::*;
use proptest::prelude::*;

// ========== 编码辅助函数 ==========

fn r_type(opcode: u32, rd: u32, funct3: u32, rs1: u32, rs2: u32, funct7: u32) -> u32 {
    (funct7 & 0x7F) << 25
        | (rs2 & 0x1F) << 20
        | (rs1 & 0x1F) << 15
        | (funct3 & 0x7) << 12
        | (rd & 0x1F) << 7
        | (opcode & 0x7F)
}

fn i_type(opcode: u32, rd: u32, funct3: u32, rs1: u32, imm: i32) -> u32 {
    let imm_bits = (imm as u32) & 0xFFF;
    imm_bits << 20 | (rs1 & 0x1F) << 15 | (funct3 & 0x7) << 12 | (rd & 0x1F) << 7 | (opcode & 0x7F)
}

fn s_type(opcode: u32, funct3: u32, rs1: u32, rs2: u32, imm: i32) -> u32 {
    let v = imm as u32;
    ((v >> 5) & 0x7F) << 25
        | (rs2 & 0x1F) << 20
        | (rs1 & 0x1F) << 15
        | (funct3 & 0x7) << 12
        | (v & 0x1F) << 7
        | (opcode & 0x7F)
}

fn b_type(funct3: u32, rs1: u32, rs2: u32, imm: i32) -> u32 {
    let v = imm as u32;
    ((v >> 12) & 1) << 31
        | ((v >> 5) & 0x3F) << 25
        | (rs2 & 0x1F) << 20
        | (rs1 & 0x1F) << 15
        | (funct3 & 0x7) << 12
        | ((v >> 1) & 0xF) << 8
        | ((v >> 11) & 1) << 7
        | OP_BRANCH
}

fn u_type(opcode: u32, rd: u32, imm20: u32) -> u32 {
    (imm20 & 0xFFFFF) << 12 | (rd & 0x1F) << 7 | (opcode & 0x7F)
}

fn j_type(rd: u32, imm: i32) -> u32 {
    let v = imm as u32;
    ((v >> 20) & 1) << 31
        | ((v >> 1) & 0x3FF) << 21
        | ((v >> 11) & 1) << 20
        | ((v >> 12) & 0xFF) << 12
        | (rd & 0x1F) << 7
        | OP_JAL
}

fn decode_ok(raw: u32) -> RvInstr {
    decode(raw).expect("opcode should be recognized").instr
}

// ========== 具体指令 ==========

#[test]
fn test_decode_addi() {
    let raw = 0x02A00093; // addi x1, x0, 42
    assert_eq!(
        decode_ok(raw),
        RvInstr::Addi {
            rd: 1,
            rs1: 0,
            imm: 42
        }
    );
}

#[test]
fn test_decode_addi_negative() {
    let raw = 0xFFF00113; // addi x2, x0, -1
    assert_eq!(
        decode_ok(raw),
        RvInstr::Addi {
            rd: 2,
            rs1: 0,
            imm: -1
        }
    );
}

#[test]
fn test_decode_add_sub() {
    assert_eq!(decode_ok(0x002081B3), RvInstr::Add { rd: 3, rs1: 1, rs2: 2 }); // add x3, x1, x2
    assert_eq!(decode_ok(0x402081B3), RvInstr::Sub { rd: 3, rs1: 1, rs2: 2 }); // sub x3, x1, x2
}

#[test]
fn test_decode_lw_sw() {
    assert_eq!(
        decode_ok(0x00412083), // lw x1, 4(x2)
        RvInstr::Lw {
            rd: 1,
            rs1: 2,
            offset: 4
        }
    );
    assert_eq!(
        decode_ok(0x00112423), // sw x1, 8(x2)
        RvInstr::Sw {
            rs1: 2,
            rs2: 1,
            offset: 8
        }
    );
}

#[test]
fn test_decode_beq() {
    let raw = 0x00208463; // beq x1, x2, 8
    assert_eq!(
        decode_ok(raw),
        RvInstr::Beq {
            rs1: 1,
            rs2: 2,
            offset: 8
        }
    );
}

#[test]
fn test_decode_jal() {
    let raw = 0x000000EF; // jal x1, 0
    assert_eq!(decode_ok(raw), RvInstr::Jal { rd: 1, offset: 0 });
}

#[test]
fn test_decode_lui() {
    let raw = 0x123450B7; // lui x1, 0x12345
    assert_eq!(
        decode_ok(raw),
        RvInstr::Lui {
            rd: 1,
            imm: 0x12345000_u32 as i32
        }
    );
}

#[test]
fn test_decode_shift_immediates() {
    let slli = i_type(OP_IMM, 1, 0b001, 2, 31);
    let srli = i_type(OP_IMM, 1, 0b101, 2, 7);
    // SRAI 的选择位是 imm[10]
    let srai = i_type(OP_IMM, 1, 0b101, 2, 0x400 | 7);

    assert_eq!(decode_ok(slli), RvInstr::Slli { rd: 1, rs1: 2, shamt: 31 });
    assert_eq!(decode_ok(srli), RvInstr::Srli { rd: 1, rs1: 2, shamt: 7 });
    assert_eq!(decode_ok(srai), RvInstr::Srai { rd: 1, rs1: 2, shamt: 7 });
    assert_eq!(srai, 0x40715093);
}

#[test]
fn test_decode_shift_with_stray_high_bits_is_reserved() {
    let raw = i_type(OP_IMM, 1, 0b101, 2, 0x020 | 3);
    assert!(matches!(decode_ok(raw), RvInstr::Reserved { .. }));
}

#[test]
fn test_decode_ebreak() {
    assert_eq!(decode_ok(0x00100073), RvInstr::Ebreak);
    assert_eq!(decode_ok(0x02000073), RvInstr::Ebreak);
}

#[test]
fn test_other_system_encodings_are_reserved() {
    // ecall / csrrw 等都不支持，按空操作处理
    assert_eq!(decode_ok(0x00000073), RvInstr::Reserved { raw: 0x00000073 });
    assert!(matches!(decode_ok(0x30529073), RvInstr::Reserved { .. }));
}

#[test]
fn test_undefined_subop_is_reserved() {
    // funct3 = 3 的 load（RV64 的 LD）
    let ld = i_type(OP_LOAD, 1, 0b011, 2, 0);
    assert!(matches!(decode_ok(ld), RvInstr::Reserved { .. }));

    // M 扩展的 MUL：funct7 = 1
    let mul = r_type(OP_REG, 3, 0b000, 1, 2, 0b0000001);
    assert!(matches!(decode_ok(mul), RvInstr::Reserved { .. }));

    let branch = b_type(0b010, 1, 2, 8);
    assert!(matches!(decode_ok(branch), RvInstr::Reserved { .. }));
}

#[test]
fn test_unknown_opcode() {
    assert_eq!(
        decode(0x00000000),
        Err(DecodeError::UnknownOpcode { opcode: 0, raw: 0 })
    );

    // FENCE 不在受支持的指令组中
    assert!(matches!(
        decode(0x0FF0000F),
        Err(DecodeError::UnknownOpcode { opcode: 0x0F, .. })
    ));
}

#[test]
fn test_fields_are_always_extracted() {
    let raw = s_type(OP_STORE, 0b010, 5, 6, -4);
    let decoded = decode(raw).unwrap();

    assert_eq!(decoded.raw, raw);
    assert_eq!(decoded.fields.opcode as u32, OP_STORE);
    assert_eq!(decoded.fields.rs1, 5);
    assert_eq!(decoded.fields.rs2, 6);
    assert_eq!(decoded.fields.imm_s, -4);
    assert_eq!(decoded.instr.mnemonic(), "sw");
}

// ========== 立即数边界 ==========

#[test]
fn test_immediate_extremes() {
    assert_eq!(imm_i(i_type(OP_IMM, 1, 0, 0, -2048)), -2048);
    assert_eq!(imm_i(i_type(OP_IMM, 1, 0, 0, 2047)), 2047);

    assert_eq!(imm_s(s_type(OP_STORE, 2, 1, 2, -2048)), -2048);
    assert_eq!(imm_s(s_type(OP_STORE, 2, 1, 2, 2047)), 2047);

    assert_eq!(imm_b(b_type(0, 1, 2, -4096)), -4096);
    assert_eq!(imm_b(b_type(0, 1, 2, 4094)), 4094);

    assert_eq!(imm_j(j_type(1, -(1 << 20))), -(1 << 20));
    assert_eq!(imm_j(j_type(1, (1 << 20) - 2)), (1 << 20) - 2);

    assert_eq!(imm_u(u_type(OP_LUI, 1, 0xFFFFF)) as u32, 0xFFFFF000);
    assert_eq!(imm_u(u_type(OP_LUI, 1, 0x80000)) as u32, 0x80000000);
    assert_eq!(imm_u(u_type(OP_LUI, 1, 0x7FFFF)), 0x7FFFF000);
}

proptest! {
    #[test]
    fn prop_imm_i_round_trip(imm in -2048i32..=2047, rd in 0u32..32, rs1 in 0u32..32) {
        let raw = i_type(OP_IMM, rd, 0, rs1, imm);
        prop_assert_eq!(decode_ok(raw), RvInstr::Addi { rd: rd as u8, rs1: rs1 as u8, imm });
    }

    #[test]
    fn prop_imm_s_round_trip(imm in -2048i32..=2047) {
        prop_assert_eq!(imm_s(s_type(OP_STORE, 0b000, 3, 4, imm)), imm);
    }

    #[test]
    fn prop_imm_b_round_trip(half in -2048i32..=2047) {
        let imm = half * 2;
        let raw = b_type(0b100, 1, 2, imm);
        prop_assert_eq!(decode_ok(raw), RvInstr::Blt { rs1: 1, rs2: 2, offset: imm });
    }

    #[test]
    fn prop_imm_j_round_trip(half in -(1i32 << 19)..(1i32 << 19)) {
        let imm = half * 2;
        prop_assert_eq!(decode_ok(j_type(1, imm)), RvInstr::Jal { rd: 1, offset: imm });
    }

    #[test]
    fn prop_imm_u_round_trip(imm20 in 0u32..(1 << 20)) {
        prop_assert_eq!(imm_u(u_type(OP_AUIPC, 2, imm20)) as u32, imm20 << 12);
    }
}
