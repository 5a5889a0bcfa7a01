//! polaris 命令行入口
//!
//! 加载程序映像后直接运行到停机，或进入交互式调试器。
//!
//! 退出码：
//! - 0：遇到 EBREAK，或达到指令数上限
//! - 1：非法 opcode
//! - 2：加载或配置错误

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::LevelFilter;

use polaris_sim::cpu::{CpuState, RegView};
use polaris_sim::debugger::{DebugError, DebugExit, Debugger, parse_number};
use polaris_sim::sim_env::{DEFAULT_MEMORY_SIZE, SimConfig, SimEnv, SimError};

const BANNER: &str = r" _____      _            _
|  __ \    | |          (_)
| |__) |__ | | __ _ _ __ _ ___
|  ___/ _ \| |/ _` | '__| / __|
| |  | (_) | | (_| | |  | \__ \
|_|   \___/|_|\__,_|_|  |_|___/
==================================
 RISC-V ISA Simulator  (v1.0)
==================================";

#[derive(Parser, Debug)]
#[command(name = "polaris", version, about = "RV32I instruction-level simulator")]
struct Cli {
    /// Program image (hex text or ELF)
    program: PathBuf,

    /// Start the interactive debugger
    #[arg(short, long)]
    debug: bool,

    /// Debug-level logging and full register dump after each step
    #[arg(short, long)]
    verbose: bool,

    /// Memory size in bytes
    #[arg(long, default_value_t = DEFAULT_MEMORY_SIZE, value_parser = parse_size)]
    mem_size: usize,

    /// Memory base address
    #[arg(long, default_value = "0", value_parser = parse_number)]
    mem_base: u32,

    /// Entry PC (defaults to the ELF entry or the memory base)
    #[arg(long, value_parser = parse_number)]
    entry: Option<u32>,

    /// Stop after this many instructions (0 = unlimited)
    #[arg(long, default_value_t = 0)]
    max_instructions: u64,
}

fn parse_size(text: &str) -> Result<usize, String> {
    parse_number(text).map(|n| n as usize)
}

fn init_logging(verbose: bool) {
    let default = if verbose { LevelFilter::Debug } else { LevelFilter::Warn };
    env_logger::Builder::new()
        .filter_level(default)
        .parse_default_env()
        .init();
}

fn report_halt(env: &SimEnv, state: CpuState) {
    if state == CpuState::Breakpoint {
        println!("EBREAK encountered at PC: 0x{:08x}", env.cpu.pc());
    }
}

fn run(cli: &Cli, env: &mut SimEnv) -> Result<(), SimError> {
    if cli.debug {
        let outcome = Debugger::new(env).run(io::stdin().lock(), io::stdout());
        match outcome {
            Ok(DebugExit::Halted(state)) => report_halt(env, state),
            Ok(DebugExit::Quit) => {}
            Err(DebugError::Sim(err)) => return Err(err),
            Err(DebugError::Io(err)) => log::error!("{err}"),
        }
        return Ok(());
    }

    let (executed, state) = env.run_until_halt()?;
    if state.is_halted() {
        report_halt(env, state);
    } else {
        println!("Instruction limit reached after {executed} instructions");
        print!("{}", env.cpu.dump(RegView::Mini));
    }
    if cli.verbose {
        print!("{}", env.cpu.dump(RegView::Full));
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    println!("{BANNER}");

    let mut config = SimConfig::new()
        .with_program(cli.program.clone())
        .with_memory_size(cli.mem_size)
        .with_memory_base(cli.mem_base)
        .with_max_instructions(cli.max_instructions)
        .with_verbose(cli.verbose);
    if let Some(entry) = cli.entry {
        config = config.with_entry_pc(entry);
    }

    let mut env = match SimEnv::from_config(config) {
        Ok(env) => env,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::from(2);
        }
    };

    match run(&cli, &mut env) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err @ SimError::Cpu(_)) => {
            eprintln!("error: {err}");
            ExitCode::from(1)
        }
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from(2)
        }
    }
}
