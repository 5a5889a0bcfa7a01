//! Execution units split by ISA modules
//!
//! An execution unit never mutates the core directly: it reads the register
//! file and reports an [`Effect`] which `CpuCore::tick` commits. Stores are the
//! only side effect performed during execution.

pub mod rv32i;

/// Architectural effect of one executed instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Effect {
    /// Destination register and value to write back, if any.
    pub rd_write: Option<(u8, u32)>,
    /// PC of the next instruction to fetch.
    pub next_pc: u32,
    /// Set by EBREAK; the core halts and keeps its PC.
    pub halt: bool,
}

impl Effect {
    /// Fall through to `next_pc` without writing a register.
    pub fn advance(next_pc: u32) -> Self {
        Effect {
            rd_write: None,
            next_pc,
            halt: false,
        }
    }

    /// Write `value` to `rd`, then fall through to `next_pc`.
    pub fn write_back(rd: u8, value: u32, next_pc: u32) -> Self {
        Effect {
            rd_write: Some((rd, value)),
            next_pc,
            halt: false,
        }
    }

    /// Halt at `pc`.
    pub fn halt(pc: u32) -> Self {
        Effect {
            rd_write: None,
            next_pc: pc,
            halt: true,
        }
    }
}
