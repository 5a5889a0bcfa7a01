//! CPU 核心与执行引擎
//!
//! 本模块定义了单线程 RV32I CPU 核心 `CpuCore`，
//! 包含寄存器文件、程序计数器、指令寄存器以及取指/解码/执行/提交的单步流程。

use log::{debug, trace};
use thiserror::Error;

use crate::isa::{self, DecodeError, RvInstr};
use crate::memory::Memory;

mod dump;
mod exu;
mod regfile;

pub use dump::{RegView, RegisterDump};
pub use regfile::{ABI_NAMES, NUM_REGS, RegFile};

/// CPU 执行状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CpuState {
    /// 正常运行中
    Running,
    /// 执行了 EBREAK，核心停机，PC 停在断点指令上
    Breakpoint,
}

impl CpuState {
    /// 数值状态码：0 表示继续运行，-1 表示遇到断点
    pub fn code(self) -> i32 {
        match self {
            CpuState::Running => 0,
            CpuState::Breakpoint => -1,
        }
    }

    pub fn is_halted(self) -> bool {
        self != CpuState::Running
    }
}

/// 不可恢复的执行错误
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CpuError {
    #[error("illegal opcode 0x{opcode:02x} (instruction 0x{raw:08x}) at PC 0x{pc:08x}")]
    IllegalOpcode { opcode: u8, raw: u32, pc: u32 },
}

/// 单线程 CPU 核心
///
/// 包含 RV32I 的最小状态：
/// - 32 个 32-bit 通用寄存器 x0..x31（x0 恒为 0）
/// - 32-bit 程序计数器
/// - 最近一次取到的指令字 IR
///
/// 设计约定：
/// - x0 永远为 0，写入时丢弃
/// - PC 为字节地址，取指时不检查对齐
/// - 内存不归核心所有，每次 `tick` 由调用方传入
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CpuCore {
    regs: RegFile,
    pc: u32,
    ir: u32,
    state: CpuState,
}

impl CpuCore {
    /// 创建一个新的 CPU 核心
    ///
    /// # 示例
    ///
    /// ```
    /// use polaris_sim::cpu::CpuCore;
    ///
    /// let cpu = CpuCore::new(0x1000);
    /// assert_eq!(cpu.pc(), 0x1000);
    /// ```
    pub fn new(entry_pc: u32) -> Self {
        CpuCore {
            regs: RegFile::new(),
            pc: entry_pc,
            ir: 0,
            state: CpuState::Running,
        }
    }

    /// 复位：寄存器清零，IR 清零，PC 设为入口地址，回到运行态
    pub fn reset(&mut self, entry_pc: u32) {
        debug!("core reset, entry PC 0x{entry_pc:08x}");
        self.regs.clear();
        self.pc = entry_pc;
        self.ir = 0;
        self.state = CpuState::Running;
    }

    /// 获取当前程序计数器值
    pub fn pc(&self) -> u32 {
        self.pc
    }

    /// 最近一次取到的指令字
    pub fn ir(&self) -> u32 {
        self.ir
    }

    pub fn state(&self) -> CpuState {
        self.state
    }

    /// 读取 x0 总是返回 0
    pub fn read_reg(&self, reg: u8) -> u32 {
        self.regs.read(reg)
    }

    pub fn write_reg(&mut self, reg: u8, value: u32) {
        self.regs.write(reg, value)
    }

    /// 获取所有寄存器的快照
    pub fn regs(&self) -> &[u32; NUM_REGS] {
        self.regs.snapshot()
    }

    /// 生成寄存器视图，用 `Display` 输出
    pub fn dump(&self, view: RegView) -> RegisterDump {
        RegisterDump {
            view,
            pc: self.pc,
            ir: self.ir,
            regs: *self.regs.snapshot(),
        }
    }

    /// 执行单步指令
    ///
    /// # 流程
    ///
    /// 1. 从 PC 处取指，写入 IR
    /// 2. 解码指令，未知 opcode 返回 `CpuError`，核心状态不变
    /// 3. 执行指令，得到写回值与下一 PC
    /// 4. 提交：写回 rd，更新 PC；遇到 EBREAK 时 PC 保持不变
    ///
    /// 已停机的核心不再取指，直接返回当前状态。
    pub fn tick(&mut self, mem: &mut dyn Memory) -> Result<CpuState, CpuError> {
        if self.state.is_halted() {
            return Ok(self.state);
        }

        let pc = self.pc;
        let raw = mem.read(pc);
        let decoded = isa::decode(raw).map_err(|err| match err {
            DecodeError::UnknownOpcode { opcode, raw } => CpuError::IllegalOpcode { opcode, raw, pc },
        })?;
        self.ir = raw;

        trace!("0x{pc:08x}: 0x{raw:08x}  {}", decoded.instr.mnemonic());
        if let RvInstr::Reserved { raw } = decoded.instr {
            debug!("reserved encoding 0x{raw:08x} at 0x{pc:08x}, ignored");
        }

        let effect = exu::rv32i::execute(&self.regs, mem, &decoded.instr, pc);

        if let Some((rd, value)) = effect.rd_write {
            self.regs.write(rd, value);
        }
        self.pc = effect.next_pc;
        if effect.halt {
            debug!("breakpoint at 0x{pc:08x}");
            self.state = CpuState::Breakpoint;
        }

        Ok(self.state)
    }

    /// 运行多条指令
    ///
    /// 最多执行 `max_instructions` 次 `tick`，遇到断点提前返回。
    ///
    /// # 返回
    ///
    /// 执行的指令数量和最终 CPU 状态
    pub fn run(&mut self, mem: &mut dyn Memory, max_instructions: u64) -> Result<(u64, CpuState), CpuError> {
        let mut executed = 0;
        while executed < max_instructions && !self.state.is_halted() {
            self.tick(mem)?;
            executed += 1;
        }
        Ok((executed, self.state))
    }
}

impl Default for CpuCore {
    fn default() -> Self {
        Self::new(0)
    }
}
