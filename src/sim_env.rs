//! 仿真环境初始化模块
//!
//! 本模块负责：
//! - 读取并校验仿真配置
//! - 初始化 CPU 和内存
//! - 将程序加载到内存（hex 或 ELF）
//! - 驱动单步/连续运行与复位
//!
//! # 示例
//!
//! ```no_run
//! use polaris_sim::sim_env::{SimConfig, SimEnv};
//!
//! let config = SimConfig::default()
//!     .with_program("program.hex")
//!     .with_memory_size(64 * 1024);
//!
//! let mut env = SimEnv::from_config(config).expect("Failed to create sim env");
//! env.run_until_halt().expect("illegal instruction");
//! ```

use std::path::PathBuf;

use log::debug;
use thiserror::Error;

use crate::cpu::{CpuCore, CpuError, CpuState};
use crate::loader::{self, LoadError};
use crate::memory::{FlatMemory, MemError, WORD_BYTES};

/// 默认内存大小（字节）
pub const DEFAULT_MEMORY_SIZE: usize = 1024;

/// 仿真错误
#[derive(Debug, Error)]
pub enum SimError {
    /// 配置错误
    #[error("config error: {0}")]
    Config(String),
    #[error(transparent)]
    Memory(#[from] MemError),
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Cpu(#[from] CpuError),
}

/// 仿真配置
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// 程序映像路径（hex 或 ELF）
    pub program: Option<PathBuf>,
    /// 内存大小（字节），必须是 4 的非零倍数
    pub memory_size: usize,
    /// 内存基地址
    pub memory_base: u32,
    /// 入口点 PC；未指定时依次使用 ELF 入口、内存基地址
    pub entry_pc: Option<u32>,
    /// 最大执行指令数（0 表示无限制）
    pub max_instructions: u64,
    /// 调试器单步后输出完整寄存器视图
    pub verbose: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            program: None,
            memory_size: DEFAULT_MEMORY_SIZE,
            memory_base: 0,
            entry_pc: None,
            max_instructions: 0,
            verbose: false,
        }
    }
}

impl SimConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置程序映像路径
    pub fn with_program(mut self, path: impl Into<PathBuf>) -> Self {
        self.program = Some(path.into());
        self
    }

    pub fn with_memory_size(mut self, size: usize) -> Self {
        self.memory_size = size;
        self
    }

    pub fn with_memory_base(mut self, base: u32) -> Self {
        self.memory_base = base;
        self
    }

    pub fn with_entry_pc(mut self, pc: u32) -> Self {
        self.entry_pc = Some(pc);
        self
    }

    pub fn with_max_instructions(mut self, max: u64) -> Self {
        self.max_instructions = max;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// 校验配置
    pub fn validate(&self) -> Result<(), SimError> {
        if self.memory_size == 0 || !self.memory_size.is_multiple_of(WORD_BYTES) {
            return Err(SimError::Config(format!(
                "memory size {} must be a non-zero multiple of {}",
                self.memory_size, WORD_BYTES
            )));
        }
        let last = (self.memory_size - 1) as u64;
        if self.memory_base as u64 + last > u32::MAX as u64 {
            return Err(SimError::Config(format!(
                "memory region 0x{:08x} + 0x{:x} exceeds the 32-bit address space",
                self.memory_base, self.memory_size
            )));
        }
        Ok(())
    }
}

/// 仿真环境
///
/// 封装了 CPU、内存和仿真配置，提供统一的仿真接口
pub struct SimEnv {
    /// CPU 核心
    pub cpu: CpuCore,
    /// 主内存
    pub memory: FlatMemory,
    /// 配置
    pub config: SimConfig,
    /// 自上次复位以来执行的指令数
    pub instructions_executed: u64,
    /// 解析后的入口 PC
    entry_pc: u32,
}

impl SimEnv {
    /// 从配置创建仿真环境
    pub fn from_config(config: SimConfig) -> Result<Self, SimError> {
        config.validate()?;
        let (memory, entry_pc) = Self::build_memory(&config)?;
        debug!(
            "memory 0x{:08x}..+0x{:x}, entry PC 0x{:08x}",
            config.memory_base, config.memory_size, entry_pc
        );

        Ok(SimEnv {
            cpu: CpuCore::new(entry_pc),
            memory,
            config,
            instructions_executed: 0,
            entry_pc,
        })
    }

    /// 创建内存并加载程序，返回内存和入口 PC
    fn build_memory(config: &SimConfig) -> Result<(FlatMemory, u32), SimError> {
        let mut memory = FlatMemory::with_base(config.memory_size, config.memory_base)?;

        let mut image_entry = None;
        if let Some(path) = &config.program {
            image_entry = loader::load_file(path, &mut memory)?.entry;
        }

        let entry_pc = config.entry_pc.or(image_entry).unwrap_or(config.memory_base);
        Ok((memory, entry_pc))
    }

    /// 入口 PC
    pub fn entry_pc(&self) -> u32 {
        self.entry_pc
    }

    /// 执行单步
    pub fn step(&mut self) -> Result<CpuState, SimError> {
        if self.cpu.state().is_halted() {
            return Ok(self.cpu.state());
        }
        let state = self.cpu.tick(&mut self.memory)?;
        self.instructions_executed += 1;
        Ok(state)
    }

    /// 运行指定数量的指令
    pub fn run(&mut self, max_instructions: u64) -> Result<(u64, CpuState), SimError> {
        let mut executed = 0;
        while executed < max_instructions && !self.cpu.state().is_halted() {
            self.step()?;
            executed += 1;
        }
        Ok((executed, self.cpu.state()))
    }

    /// 运行直到停止条件
    ///
    /// 停止条件：
    /// - 达到配置的最大指令数
    /// - 遇到 EBREAK
    /// - 遇到非法 opcode（返回错误）
    pub fn run_until_halt(&mut self) -> Result<(u64, CpuState), SimError> {
        let max = if self.config.max_instructions > 0 {
            self.config.max_instructions
        } else {
            u64::MAX
        };

        self.run(max)
    }

    /// 获取 CPU 引用
    pub fn cpu(&self) -> &CpuCore {
        &self.cpu
    }

    /// 获取 CPU 可变引用
    pub fn cpu_mut(&mut self) -> &mut CpuCore {
        &mut self.cpu
    }

    /// 获取内存引用
    pub fn memory(&self) -> &FlatMemory {
        &self.memory
    }

    /// 获取内存可变引用
    pub fn memory_mut(&mut self) -> &mut FlatMemory {
        &mut self.memory
    }

    /// 重置仿真环境：重新加载程序，CPU 回到入口 PC
    pub fn reset(&mut self) -> Result<(), SimError> {
        let (memory, entry_pc) = Self::build_memory(&self.config)?;
        self.memory = memory;
        self.entry_pc = entry_pc;
        self.cpu.reset(entry_pc);
        self.instructions_executed = 0;
        Ok(())
    }
}
