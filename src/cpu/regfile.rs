//! Integer register file x0..x31.

/// Number of general purpose registers.
pub const NUM_REGS: usize = 32;

/// ABI names, indexed by register number.
pub const ABI_NAMES: [&str; NUM_REGS] = [
    "zero", "ra", "sp", "gp", "tp", "t0", "t1", "t2", "s0/fp", "s1", "a0", "a1", "a2", "a3", "a4",
    "a5", "a6", "a7", "s2", "s3", "s4", "s5", "s6", "s7", "s8", "s9", "s10", "s11", "t3", "t4",
    "t5", "t6",
];

/// RV32I register file. x0 is hard-wired to zero: writes to it are discarded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegFile {
    regs: [u32; NUM_REGS],
}

impl RegFile {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn read(&self, reg: u8) -> u32 {
        self.regs[reg as usize]
    }

    #[inline]
    pub fn write(&mut self, reg: u8, value: u32) {
        if reg == 0 {
            return;
        }
        self.regs[reg as usize] = value;
    }

    /// Zero every register.
    pub fn clear(&mut self) {
        self.regs = [0; NUM_REGS];
    }

    pub fn snapshot(&self) -> &[u32; NUM_REGS] {
        &self.regs
    }
}
