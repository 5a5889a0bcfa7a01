//! 程序映像加载
//!
//! 支持两种格式：
//! - hex 文本：每行一个 32 位十六进制字，`@ADDR` 重设加载地址
//! - ELF：32 位小端 RISC-V 可执行文件，按 `PT_LOAD` 段拷贝
//!
//! 格式通过文件头的 `\x7fELF` 魔数自动判断。所有写入都走 `FlatMemory`
//! 的检查接口，放不下的程序直接报错，不会静默截断。

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use elf::ElfBytes;
use elf::abi::{EM_RISCV, PF_W, PF_X, PT_LOAD};
use elf::endian::AnyEndian;
use elf::file::Class;
use log::debug;
use thiserror::Error;

use crate::memory::{FULL_MASK, FlatMemory, MemError, WORD_BYTES};

const ELF_MAGIC: &[u8; 4] = b"\x7fELF";

/// 程序加载错误
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// hex 文件中无法解析的行（行号从 1 开始）
    #[error("line {line}: malformed hex entry `{text}`")]
    MalformedHex { line: usize, text: String },
    /// hex 文件中的字无法放入内存
    #[error("line {line}: {source}")]
    HexPlacement {
        line: usize,
        #[source]
        source: MemError,
    },
    #[error("ELF parse error: {0}")]
    ElfParse(#[from] elf::ParseError),
    #[error("unsupported ELF: {0}")]
    UnsupportedElf(String),
    #[error(transparent)]
    Memory(#[from] MemError),
}

/// 程序映像格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgramFormat {
    Hex,
    Elf,
}

impl ProgramFormat {
    /// 根据文件头判断格式
    pub fn sniff(data: &[u8]) -> Self {
        if data.starts_with(ELF_MAGIC) {
            ProgramFormat::Elf
        } else {
            ProgramFormat::Hex
        }
    }
}

/// 加载结果摘要
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedProgram {
    pub format: ProgramFormat,
    /// ELF 入口点；hex 映像没有入口信息
    pub entry: Option<u32>,
    /// 写入内存的字节数（不含 BSS 清零）
    pub bytes_loaded: usize,
}

/// 从文件加载程序到内存
pub fn load_file<P: AsRef<Path>>(path: P, memory: &mut FlatMemory) -> Result<LoadedProgram, LoadError> {
    let path = path.as_ref();
    let data = fs::read(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let loaded = match ProgramFormat::sniff(&data) {
        ProgramFormat::Elf => load_elf(&data, memory)?,
        ProgramFormat::Hex => {
            let text = String::from_utf8_lossy(&data);
            load_hex(&text, memory)?
        }
    };

    debug!(
        "loaded {:?} image {} ({} bytes, entry {:?})",
        loaded.format,
        path.display(),
        loaded.bytes_loaded,
        loaded.entry
    );
    Ok(loaded)
}

/// 去掉 `#` 和 `//` 之后的注释
fn strip_comment(line: &str) -> &str {
    let end = [line.find('#'), line.find("//")]
        .into_iter()
        .flatten()
        .min()
        .unwrap_or(line.len());
    line[..end].trim()
}

fn parse_hex_u32(text: &str) -> Option<u32> {
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    if digits.is_empty() {
        return None;
    }
    u32::from_str_radix(digits, 16).ok()
}

/// 加载 hex 文本映像
///
/// 加载地址从 0 开始，每写入一个字前进 4；`@ADDR` 把加载地址设为 ADDR。
pub fn load_hex(text: &str, memory: &mut FlatMemory) -> Result<LoadedProgram, LoadError> {
    let mut cursor: u32 = 0;
    let mut words = 0usize;

    for (index, raw_line) in text.lines().enumerate() {
        let line_no = index + 1;
        let line = strip_comment(raw_line);
        if line.is_empty() {
            continue;
        }

        let malformed = || LoadError::MalformedHex {
            line: line_no,
            text: raw_line.trim().to_string(),
        };

        if let Some(addr) = line.strip_prefix('@') {
            cursor = parse_hex_u32(addr.trim()).ok_or_else(malformed)?;
            continue;
        }

        let word = parse_hex_u32(line).ok_or_else(malformed)?;
        memory
            .try_write(cursor, word, FULL_MASK)
            .map_err(|source| LoadError::HexPlacement { line: line_no, source })?;
        cursor = cursor.wrapping_add(WORD_BYTES as u32);
        words += 1;
    }

    Ok(LoadedProgram {
        format: ProgramFormat::Hex,
        entry: None,
        bytes_loaded: words * WORD_BYTES,
    })
}

/// ELF 程序段信息
#[derive(Debug, Clone)]
pub struct ElfSegment {
    pub vaddr: u32,
    pub file_size: usize,
    pub mem_size: usize,
    pub data: Vec<u8>,
    pub executable: bool,
    pub writable: bool,
}

/// ELF 文件解析结果
#[derive(Debug, Clone)]
pub struct ElfInfo {
    /// 入口点地址
    pub entry: u32,
    /// 可加载段
    pub segments: Vec<ElfSegment>,
}

impl ElfInfo {
    /// 从字节数组解析 ELF（使用 elf crate）
    pub fn parse_bytes(data: &[u8]) -> Result<Self, LoadError> {
        let elf_file = ElfBytes::<AnyEndian>::minimal_parse(data)?;
        let header = &elf_file.ehdr;

        if header.e_machine != EM_RISCV {
            return Err(LoadError::UnsupportedElf(format!(
                "not a RISC-V ELF (machine type 0x{:x}, expected 0x{:x})",
                header.e_machine, EM_RISCV
            )));
        }
        if header.class != Class::ELF32 {
            return Err(LoadError::UnsupportedElf("only 32-bit ELF is supported".into()));
        }
        if header.endianness != AnyEndian::Little {
            return Err(LoadError::UnsupportedElf("only little-endian ELF is supported".into()));
        }

        let mut segments = Vec::new();
        if let Some(phdrs) = elf_file.segments() {
            for phdr in phdrs.iter().filter(|p| p.p_type == PT_LOAD) {
                let data = elf_file.segment_data(&phdr)?.to_vec();
                segments.push(ElfSegment {
                    vaddr: phdr.p_vaddr as u32,
                    file_size: phdr.p_filesz as usize,
                    mem_size: phdr.p_memsz as usize,
                    data,
                    executable: phdr.p_flags & PF_X != 0,
                    writable: phdr.p_flags & PF_W != 0,
                });
            }
        }

        Ok(ElfInfo {
            entry: header.e_entry as u32,
            segments,
        })
    }
}

/// 加载 ELF 映像：拷贝每个 `PT_LOAD` 段并清零 BSS
pub fn load_elf(data: &[u8], memory: &mut FlatMemory) -> Result<LoadedProgram, LoadError> {
    let elf = ElfInfo::parse_bytes(data)?;
    let mut bytes_loaded = 0;

    for (i, seg) in elf.segments.iter().enumerate() {
        debug!(
            "segment {}: vaddr=0x{:08x} filesz=0x{:x} memsz=0x{:x} flags={}{}",
            i,
            seg.vaddr,
            seg.file_size,
            seg.mem_size,
            if seg.executable { "X" } else { "-" },
            if seg.writable { "W" } else { "R" },
        );

        memory.write_bytes(seg.vaddr, &seg.data)?;
        bytes_loaded += seg.data.len();

        if seg.mem_size > seg.data.len() {
            let bss_start = seg.vaddr.wrapping_add(seg.data.len() as u32);
            memory.fill_bytes(bss_start, seg.mem_size - seg.data.len(), 0)?;
        }
    }

    Ok(LoadedProgram {
        format: ProgramFormat::Elf,
        entry: Some(elf.entry),
        bytes_loaded,
    })
}
