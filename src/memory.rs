//! 内存抽象层
//!
//! 本模块定义了 CPU 访存使用的统一接口 `Memory` trait，
//! 以及基于连续字节数组的实现 `FlatMemory`。
//!
//! 访存分两层：
//! - `try_*` 系列返回 `MemResult`，供加载器等需要感知错误的调用方使用
//! - 软失败系列（`read` / `write` / `fill` / `dump`）在出错时记录日志，
//!   读返回 0、写不生效，仿真继续运行

use std::fmt::Write as _;

use log::error;
use thiserror::Error;

/// 字长（字节）
pub const WORD_BYTES: usize = 4;

/// 写满整个字的掩码
pub const FULL_MASK: u8 = 0b1111;

/// 内存访问错误
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MemError {
    /// 地址未按字对齐
    #[error("unaligned access at 0x{addr:08x}: address must be a multiple of 4")]
    Unaligned { addr: u32 },
    /// 地址或访问区间越界
    #[error("out-of-range access at 0x{addr:08x} (len={len}, region base=0x{base:08x} size={size})")]
    OutOfRange {
        addr: u32,
        len: usize,
        base: u32,
        size: usize,
    },
    /// 构造时的容量不是 4 的非零倍数
    #[error("invalid memory size {size}: must be a non-zero multiple of 4")]
    InvalidSize { size: usize },
}

pub type MemResult<T> = Result<T, MemError>;

/// CPU 侧看到的内存接口
///
/// 只有两个原语：对齐字读取与掩码写入。子字访问由 CPU 计算字节通道
/// 后转换为对齐地址上的掩码写，内存本身不区分 byte/half/word。
pub trait Memory {
    /// 读取 `addr` 处的小端 32 位字；非法地址返回 0
    fn read(&self, addr: u32) -> u32;

    /// 向对齐地址 `addr` 写入 `value` 中被 `mask` 选中的字节
    ///
    /// `mask` 的第 i 位置 1 表示把 `value` 的第 i 个字节写到 `addr + i`。
    /// 非法地址时不写入任何字节。
    fn write(&mut self, addr: u32, value: u32, mask: u8);
}

/// 简单线性内存实现
///
/// 使用 `Vec<u8>` 存储一段从 `base_addr` 开始的地址空间，
/// 构造后大小固定。
#[derive(Debug, Clone)]
pub struct FlatMemory {
    /// 内存数据存储
    data: Vec<u8>,
    /// 内存映射起始地址
    base_addr: u32,
}

impl FlatMemory {
    /// 创建一个从地址 0 开始、大小为 `size` 字节的内存
    ///
    /// # 示例
    ///
    /// ```
    /// use polaris_sim::memory::FlatMemory;
    ///
    /// let mem = FlatMemory::new(1024).unwrap();
    /// assert_eq!(mem.size(), 1024);
    /// assert!(FlatMemory::new(1022).is_err());
    /// ```
    pub fn new(size: usize) -> MemResult<Self> {
        Self::with_base(size, 0)
    }

    /// 创建一个映射在 `base_addr` 处的内存
    pub fn with_base(size: usize, base_addr: u32) -> MemResult<Self> {
        if size == 0 || !size.is_multiple_of(WORD_BYTES) {
            return Err(MemError::InvalidSize { size });
        }
        Ok(FlatMemory {
            data: vec![0; size],
            base_addr,
        })
    }

    /// 获取内存的基地址
    pub fn base_addr(&self) -> u32 {
        self.base_addr
    }

    /// 获取内存的大小
    pub fn size(&self) -> usize {
        self.data.len()
    }

    fn ensure_aligned(addr: u32) -> MemResult<()> {
        if addr.is_multiple_of(WORD_BYTES as u32) {
            Ok(())
        } else {
            Err(MemError::Unaligned { addr })
        }
    }

    fn out_of_range(&self, addr: u32, len: usize) -> MemError {
        MemError::OutOfRange {
            addr,
            len,
            base: self.base_addr,
            size: self.data.len(),
        }
    }

    fn bounds_check(&self, addr: u32, len: usize) -> MemResult<usize> {
        let relative = addr
            .checked_sub(self.base_addr)
            .ok_or_else(|| self.out_of_range(addr, len))? as usize;

        let end = relative
            .checked_add(len)
            .ok_or_else(|| self.out_of_range(addr, len))?;

        if end > self.data.len() {
            return Err(self.out_of_range(addr, len));
        }

        Ok(relative)
    }

    /// 校验 `word_count` 个连续字的区间，返回起始下标
    fn span_check(&self, addr: u32, word_count: usize) -> MemResult<usize> {
        Self::ensure_aligned(addr)?;
        let start = self.bounds_check(addr, WORD_BYTES)?;
        let len = word_count
            .checked_mul(WORD_BYTES)
            .ok_or_else(|| self.out_of_range(addr, usize::MAX))?;
        self.bounds_check(addr, len)?;
        Ok(start)
    }

    /// 读取对齐字，出错时返回错误
    pub fn try_read(&self, addr: u32) -> MemResult<u32> {
        Self::ensure_aligned(addr)?;
        let idx = self.bounds_check(addr, WORD_BYTES)?;
        Ok(u32::from_le_bytes([
            self.data[idx],
            self.data[idx + 1],
            self.data[idx + 2],
            self.data[idx + 3],
        ]))
    }

    /// 掩码写入对齐字，出错时返回错误且不修改任何字节
    pub fn try_write(&mut self, addr: u32, value: u32, mask: u8) -> MemResult<()> {
        Self::ensure_aligned(addr)?;
        let idx = self.bounds_check(addr, WORD_BYTES)?;
        let bytes = value.to_le_bytes();
        for (lane, byte) in bytes.iter().enumerate() {
            if mask & (1 << lane) != 0 {
                self.data[idx + lane] = *byte;
            }
        }
        Ok(())
    }

    /// 将 `word_count` 个连续字填充为 `value`
    pub fn try_fill(&mut self, addr: u32, word_count: usize, value: u32) -> MemResult<()> {
        let start = self.span_check(addr, word_count)?;
        let bytes = value.to_le_bytes();
        for word in self.data[start..start + word_count * WORD_BYTES].chunks_exact_mut(WORD_BYTES) {
            word.copy_from_slice(&bytes);
        }
        Ok(())
    }

    /// 读取 `word_count` 个连续字
    pub fn try_words(&self, addr: u32, word_count: usize) -> MemResult<Vec<u32>> {
        let start = self.span_check(addr, word_count)?;
        Ok(self.data[start..start + word_count * WORD_BYTES]
            .chunks_exact(WORD_BYTES)
            .map(|w| u32::from_le_bytes([w[0], w[1], w[2], w[3]]))
            .collect())
    }

    /// 填充连续字；越界或未对齐时记录错误并忽略
    pub fn fill(&mut self, addr: u32, word_count: usize, value: u32) {
        if let Err(err) = self.try_fill(addr, word_count, value) {
            error!("fill of {word_count} words rejected: {err}");
        }
    }

    /// 生成 `word_count` 个连续字的可读清单，每行 `0xADDR: 0xWORD`
    ///
    /// 越界或未对齐时记录错误并返回空字符串。
    pub fn dump(&self, addr: u32, word_count: usize) -> String {
        match self.try_words(addr, word_count) {
            Ok(words) => {
                let mut out = String::new();
                for (i, word) in words.iter().enumerate() {
                    let at = addr.wrapping_add((i * WORD_BYTES) as u32);
                    let _ = writeln!(out, "0x{at:08x}: 0x{word:08x}");
                }
                out
            }
            Err(err) => {
                error!("dump of {word_count} words rejected: {err}");
                String::new()
            }
        }
    }

    /// 批量写入字节，供程序加载使用
    pub fn write_bytes(&mut self, addr: u32, data: &[u8]) -> MemResult<()> {
        if data.is_empty() {
            return Ok(());
        }
        let start = self.bounds_check(addr, data.len())?;
        self.data[start..start + data.len()].copy_from_slice(data);
        Ok(())
    }

    /// 批量读取字节
    pub fn read_bytes(&self, addr: u32, len: usize) -> MemResult<Vec<u8>> {
        if len == 0 {
            return Ok(Vec::new());
        }
        let start = self.bounds_check(addr, len)?;
        Ok(self.data[start..start + len].to_vec())
    }

    /// 将字节区间填充为固定值（用于清零 BSS）
    pub fn fill_bytes(&mut self, addr: u32, len: usize, value: u8) -> MemResult<()> {
        if len == 0 {
            return Ok(());
        }
        let start = self.bounds_check(addr, len)?;
        self.data[start..start + len].fill(value);
        Ok(())
    }
}

impl Memory for FlatMemory {
    fn read(&self, addr: u32) -> u32 {
        self.try_read(addr).unwrap_or_else(|err| {
            error!("read: {err}");
            0
        })
    }

    fn write(&mut self, addr: u32, value: u32, mask: u8) {
        if let Err(err) = self.try_write(addr, value, mask) {
            error!("write: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_must_be_word_multiple() {
        assert_eq!(
            FlatMemory::new(1022).unwrap_err(),
            MemError::InvalidSize { size: 1022 }
        );
        assert!(FlatMemory::new(0).is_err());
        assert!(FlatMemory::new(1024).is_ok());
    }

    #[test]
    fn test_word_read_write_little_endian() {
        let mut mem = FlatMemory::new(64).unwrap();
        mem.write(4, 0x78ABCDEF, FULL_MASK);

        assert_eq!(mem.read(4), 0x78ABCDEF);
        assert_eq!(mem.read_bytes(4, 4).unwrap(), vec![0xEF, 0xCD, 0xAB, 0x78]);
    }

    #[test]
    fn test_masked_byte_write_touches_one_lane() {
        let mut mem = FlatMemory::new(64).unwrap();
        mem.write(8, 0x11223344, FULL_MASK);

        // 字节通道 1：数据已移位到 [15:8]
        mem.write(8, 0x42 << 8, 0b0010);

        assert_eq!(mem.read(8), 0x11224244);
    }

    #[test]
    fn test_masked_halfword_write_upper_lanes() {
        let mut mem = FlatMemory::new(64).unwrap();
        mem.write(0, 0xAAAAAAAA, FULL_MASK);
        mem.write(0, 0xBEEF << 16, 0b1100);

        assert_eq!(mem.read(0), 0xBEEFAAAA);
    }

    #[test]
    fn test_zero_mask_is_noop() {
        let mut mem = FlatMemory::new(64).unwrap();
        mem.write(0, 0x12345678, FULL_MASK);
        mem.write(0, 0xFFFFFFFF, 0);
        assert_eq!(mem.read(0), 0x12345678);
    }

    #[test]
    fn test_unaligned_read_soft_fails() {
        let mut mem = FlatMemory::new(64).unwrap();
        mem.write(0, 0xDEADBEEF, FULL_MASK);

        assert_eq!(mem.read(2), 0);
        assert_eq!(mem.try_read(2).unwrap_err(), MemError::Unaligned { addr: 2 });
    }

    #[test]
    fn test_unaligned_write_is_dropped() {
        let mut mem = FlatMemory::new(64).unwrap();
        mem.write(2, 0x12345678, FULL_MASK);

        assert_eq!(mem.read(0), 0);
        assert_eq!(mem.read(4), 0);
    }

    #[test]
    fn test_out_of_bounds() {
        let mut mem = FlatMemory::new(64).unwrap();
        assert_eq!(mem.read(64), 0);
        assert!(matches!(
            mem.try_read(64).unwrap_err(),
            MemError::OutOfRange { addr: 64, .. }
        ));

        mem.write(64, 0xFFFFFFFF, FULL_MASK);
        assert_eq!(mem.try_words(0, 16).unwrap(), vec![0; 16]);
    }

    #[test]
    fn test_fill_then_words_round_trip() {
        let mut mem = FlatMemory::new(64).unwrap();
        mem.fill(8, 4, 0xFFFFFFFE);

        assert_eq!(mem.try_words(8, 4).unwrap(), vec![0xFFFFFFFE; 4]);
        assert_eq!(mem.read(4), 0);
        assert_eq!(mem.read(24), 0);
    }

    #[test]
    fn test_dump_listing() {
        let mut mem = FlatMemory::new(64).unwrap();
        mem.fill(0, 2, 0xCAFEF00D);

        assert_eq!(mem.dump(0, 2), "0x00000000: 0xcafef00d\n0x00000004: 0xcafef00d\n");
    }

    #[test]
    fn test_fill_exceeding_bounds_is_rejected_whole() {
        let mut mem = FlatMemory::new(16).unwrap();
        mem.fill(8, 3, 0x55555555);

        assert_eq!(mem.try_words(0, 4).unwrap(), vec![0; 4]);
        assert!(mem.try_fill(8, 3, 1).is_err());
        assert!(mem.try_fill(8, 2, 1).is_ok());
    }

    #[test]
    fn test_dump_rejects_bad_span() {
        let mem = FlatMemory::new(16).unwrap();
        assert_eq!(mem.dump(2, 1), "");
        assert_eq!(mem.dump(16, 1), "");
        assert_eq!(mem.dump(12, 2), "");
        assert!(mem.try_words(0, usize::MAX).is_err());
    }

    #[test]
    fn test_with_base_addr() {
        let mut mem = FlatMemory::with_base(1024, 0x1000).unwrap();

        mem.write(0x1000, 0xDEADBEEF, FULL_MASK);
        assert_eq!(mem.read(0x1000), 0xDEADBEEF);
        assert_eq!(mem.read(0x0FFC), 0);
        assert!(mem.try_read(0x1400).is_err());
    }

    #[test]
    fn test_write_bytes() {
        let mut mem = FlatMemory::new(1024).unwrap();
        mem.write_bytes(0, &[0x01, 0x02, 0x03, 0x04]).unwrap();

        assert_eq!(mem.read(0), 0x04030201);
        assert!(mem.write_bytes(1022, &[0; 4]).is_err());
    }

    #[test]
    fn test_fill_bytes() {
        let mut mem = FlatMemory::new(16).unwrap();
        mem.fill(0, 4, 0xFFFFFFFF);
        mem.fill_bytes(2, 4, 0).unwrap();

        assert_eq!(mem.read(0), 0x0000FFFF);
        assert_eq!(mem.read(4), 0xFFFF0000);
    }
}
