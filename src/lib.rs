//! polaris_sim: RV32I 单线程指令级仿真库
//!
//! 本库实现一个逐条执行的 RV32I 仿真引擎：每次 `tick` 完成一次
//! 取指、译码、执行、提交，直到遇到 EBREAK 或非法 opcode。
//!
//! # 模块结构
//!
//! - `memory`: 字节寻址内存，按字对齐读、按字节掩码写
//! - `isa`: 字段提取、立即数译码与表驱动解码器
//! - `cpu`: CPU 核心、执行单元与寄存器转储
//! - `loader`: hex 文本镜像与 ELF 加载
//! - `sim_env`: 仿真环境（配置、加载、运行）
//! - `debugger`: 交互式单步调试器

pub mod cpu;
pub mod debugger;
pub mod isa;
pub mod loader;
pub mod memory;
pub mod sim_env;
