//! 交互式调试器
//!
//! 按行读取命令驱动 `SimEnv`，输入输出流由调用方提供，
//! 命令行前端传入 stdin/stdout，测试中使用内存缓冲区。

use std::io::{self, BufRead, Write};

use thiserror::Error;

use crate::cpu::{CpuState, RegView};
use crate::sim_env::{SimEnv, SimError};

const PROMPT: &str = "polaris> ";

/// 默认内存清单长度（字）
const DEFAULT_DUMP_WORDS: usize = 8;

const HELP: &str = "\
Commands:
 h, help               Show this help message
 q, quit               Leave the debugger
 s, step [N]           Execute N instructions (default 1)
 c, continue           Run until breakpoint or instruction limit
 ir, reg               Show all registers
 m, mem [ADDR] [WORDS] Show WORDS words of memory starting at ADDR
 reset                 Reload the program and reset the core
";

#[derive(Debug, Error)]
pub enum DebugError {
    #[error("debugger I/O error: {0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Sim(#[from] SimError),
}

/// 调试器退出原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebugExit {
    /// 用户退出或输入结束
    Quit,
    /// CPU 停机
    Halted(CpuState),
}

/// 解析十进制或 `0x` 前缀的十六进制数
pub fn parse_number(text: &str) -> Result<u32, String> {
    let text = text.trim();
    let parsed = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => text.parse::<u32>(),
    };
    parsed.map_err(|err| format!("invalid number `{text}`: {err}"))
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Help,
    Quit,
    Step(u32),
    Continue,
    Regs,
    Mem { addr: Option<u32>, words: Option<u32> },
    Reset,
    Empty,
    Invalid(String),
    Unknown(String),
}

impl Command {
    fn parse(line: &str) -> Self {
        let mut parts = line.split_whitespace();
        let Some(name) = parts.next() else {
            return Command::Empty;
        };
        const KNOWN: &[&str] = &[
            "h", "help", "q", "quit", "s", "step", "c", "continue", "ir", "reg", "m", "mem", "reset",
        ];
        if !KNOWN.contains(&name) {
            return Command::Unknown(line.to_string());
        }

        let numbers = match parts.map(parse_number).collect::<Result<Vec<_>, _>>() {
            Ok(numbers) => numbers,
            Err(msg) => return Command::Invalid(msg),
        };

        match (name, numbers.as_slice()) {
            ("h" | "help", []) => Command::Help,
            ("q" | "quit", []) => Command::Quit,
            ("s" | "step", []) => Command::Step(1),
            ("s" | "step", [n]) => Command::Step(*n),
            ("c" | "continue", []) => Command::Continue,
            ("ir" | "reg", []) => Command::Regs,
            ("m" | "mem", []) => Command::Mem { addr: None, words: None },
            ("m" | "mem", [addr]) => Command::Mem {
                addr: Some(*addr),
                words: None,
            },
            ("m" | "mem", [addr, words]) => Command::Mem {
                addr: Some(*addr),
                words: Some(*words),
            },
            ("reset", []) => Command::Reset,
            _ => Command::Invalid(format!("wrong number of arguments for `{name}`")),
        }
    }
}

/// 交互式调试器
pub struct Debugger<'a> {
    env: &'a mut SimEnv,
    verbose: bool,
}

impl<'a> Debugger<'a> {
    pub fn new(env: &'a mut SimEnv) -> Self {
        let verbose = env.config.verbose;
        Debugger { env, verbose }
    }

    fn step_view(&self) -> RegView {
        if self.verbose { RegView::Full } else { RegView::Mini }
    }

    /// 读取并执行命令，直到退出、输入结束或 CPU 停机
    pub fn run<R: BufRead, W: Write>(&mut self, mut input: R, mut out: W) -> Result<DebugExit, DebugError> {
        let mut line = String::new();
        loop {
            write!(out, "{PROMPT}")?;
            out.flush()?;

            line.clear();
            if input.read_line(&mut line)? == 0 {
                writeln!(out)?;
                return Ok(DebugExit::Quit);
            }

            if let Some(exit) = self.execute(Command::parse(line.trim()), &mut out)? {
                return Ok(exit);
            }
        }
    }

    fn execute<W: Write>(&mut self, cmd: Command, out: &mut W) -> Result<Option<DebugExit>, DebugError> {
        match cmd {
            Command::Empty => {}
            Command::Help => write!(out, "{HELP}")?,
            Command::Quit => return Ok(Some(DebugExit::Quit)),
            Command::Step(count) => {
                for _ in 0..count {
                    let state = self.env.step()?;
                    write!(out, "{}", self.env.cpu.dump(self.step_view()))?;
                    if state.is_halted() {
                        return Ok(Some(DebugExit::Halted(state)));
                    }
                }
            }
            Command::Continue => {
                let (executed, state) = self.env.run_until_halt()?;
                if state.is_halted() {
                    return Ok(Some(DebugExit::Halted(state)));
                }
                writeln!(out, "Instruction limit reached after {executed} instructions")?;
                write!(out, "{}", self.env.cpu.dump(RegView::Mini))?;
            }
            Command::Regs => write!(out, "{}", self.env.cpu.dump(RegView::Full))?,
            Command::Mem { addr, words } => {
                let addr = addr.unwrap_or(self.env.memory.base_addr());
                let words = words.map_or(DEFAULT_DUMP_WORDS, |w| w as usize);
                write!(out, "{}", self.env.memory.dump(addr, words))?;
            }
            Command::Reset => {
                self.env.reset()?;
                writeln!(out, "Reset to PC: 0x{:08x}", self.env.cpu.pc())?;
            }
            Command::Invalid(msg) => writeln!(out, "{msg}")?,
            Command::Unknown(cmd) => writeln!(out, "Unknown command: {cmd}")?,
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::CpuError;
    use crate::memory::{FULL_MASK, Memory};
    use crate::sim_env::SimConfig;

    fn env_with(program: &[u32]) -> SimEnv {
        let mut env = SimEnv::from_config(SimConfig::new()).unwrap();
        for (i, &word) in program.iter().enumerate() {
            env.memory.write((i * 4) as u32, word, FULL_MASK);
        }
        env
    }

    fn session(env: &mut SimEnv, script: &str) -> (Result<DebugExit, DebugError>, String) {
        let mut out = Vec::new();
        let result = Debugger::new(env).run(script.as_bytes(), &mut out);
        (result, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("42"), Ok(42));
        assert_eq!(parse_number("0x2A"), Ok(42));
        assert_eq!(parse_number("0XFF"), Ok(255));
        assert!(parse_number("zz").is_err());
        assert!(parse_number("0x").is_err());
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse("s"), Command::Step(1));
        assert_eq!(Command::parse("step 0x10"), Command::Step(16));
        assert_eq!(Command::parse("mem 0x20 4"), Command::Mem { addr: Some(0x20), words: Some(4) });
        assert_eq!(Command::parse(""), Command::Empty);
        assert_eq!(Command::parse("frobnicate"), Command::Unknown("frobnicate".into()));
        assert!(matches!(Command::parse("s x"), Command::Invalid(_)));
        assert!(matches!(Command::parse("q 1"), Command::Invalid(_)));
    }

    #[test]
    fn test_quit_and_eof() {
        let mut env = env_with(&[]);

        let (result, out) = session(&mut env, "help\nq\n");
        assert_eq!(result.unwrap(), DebugExit::Quit);
        assert!(out.starts_with(PROMPT));
        assert!(out.contains("Commands:"));

        let (result, _) = session(&mut env, "");
        assert_eq!(result.unwrap(), DebugExit::Quit);
    }

    #[test]
    fn test_step_prints_mini_view() {
        let mut env = env_with(&[0x02A00093]); // addi x1, x0, 42

        let (result, out) = session(&mut env, "  s  \nquit\n");

        assert_eq!(result.unwrap(), DebugExit::Quit);
        assert!(out.contains("PC: 0x00000004    IR: 0x02a00093"));
        assert_eq!(env.cpu.read_reg(1), 42);
    }

    #[test]
    fn test_step_until_breakpoint_leaves() {
        let mut env = env_with(&[
            0x00000013, // nop
            0x00100073, // ebreak
            0x00000013, // nop
        ]);

        let (result, _) = session(&mut env, "step 5\nq\n");

        assert_eq!(result.unwrap(), DebugExit::Halted(CpuState::Breakpoint));
        assert_eq!(env.cpu.pc(), 4);
        assert_eq!(env.instructions_executed, 2);
    }

    #[test]
    fn test_verbose_step_prints_full_view() {
        let mut env = SimEnv::from_config(SimConfig::new().with_verbose(true)).unwrap();
        env.memory.write(0, 0x00000013, FULL_MASK);

        let (_, out) = session(&mut env, "s\nq\n");

        assert!(out.contains("x31 (t6)"));
    }

    #[test]
    fn test_continue_and_registers() {
        let mut env = env_with(&[
            0x00700293, // addi x5, x0, 7
            0x00100073, // ebreak
        ]);

        let (result, _) = session(&mut env, "c\n");
        assert_eq!(result.unwrap(), DebugExit::Halted(CpuState::Breakpoint));

        let (_, out) = session(&mut env, "reg\nq\n");
        assert!(out.contains("x5  (t0)   : 0x00000007"));
    }

    #[test]
    fn test_continue_hits_instruction_limit() {
        let mut env = SimEnv::from_config(SimConfig::new().with_max_instructions(10)).unwrap();
        env.memory.write(0, 0x0000006F, FULL_MASK); // jal x0, 0

        let (result, out) = session(&mut env, "c\nq\n");

        assert_eq!(result.unwrap(), DebugExit::Quit);
        assert!(out.contains("Instruction limit reached after 10 instructions"));
    }

    #[test]
    fn test_memory_listing() {
        let mut env = env_with(&[0xDEADBEEF]);

        let (_, out) = session(&mut env, "m\nmem 0x4 2\nq\n");

        assert!(out.contains("0x00000000: 0xdeadbeef"));
        assert!(out.contains("0x0000001c: 0x00000000"));
        assert_eq!(out.matches("0x00000004: ").count(), 2);
        assert_eq!(out.matches("0x00000008: ").count(), 2);
        assert_eq!(out.matches("0x0000000c: ").count(), 1);
    }

    #[test]
    fn test_unknown_command() {
        let mut env = env_with(&[]);

        let (_, out) = session(&mut env, "launch rockets\nq\n");

        assert!(out.contains("Unknown command: launch rockets"));
    }

    #[test]
    fn test_reset_command() {
        let mut env = env_with(&[0x02A00093]);
        env.step().unwrap();

        let (_, out) = session(&mut env, "reset\nq\n");

        assert!(out.contains("Reset to PC: 0x00000000"));
        assert_eq!(env.cpu.read_reg(1), 0);
        assert_eq!(env.instructions_executed, 0);
    }

    #[test]
    fn test_illegal_opcode_propagates() {
        let mut env = env_with(&[0xFFFF_FFFF]);

        let (result, _) = session(&mut env, "s\n");

        assert!(matches!(
            result,
            Err(DebugError::Sim(SimError::Cpu(CpuError::IllegalOpcode { pc: 0, .. })))
        ));
    }
}
