//! 寄存器状态格式化输出

use std::fmt;

use super::regfile::{ABI_NAMES, NUM_REGS};

const SEPARATOR: &str = "═══════════════════════════════════════════════════════";

/// 寄存器视图
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RegView {
    /// 只显示 PC 和当前指令字
    #[default]
    Mini,
    /// PC、指令字以及全部 32 个整数寄存器
    Full,
}

/// `CpuCore::dump` 的结果，通过 `Display` 输出
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterDump {
    pub view: RegView,
    pub pc: u32,
    pub ir: u32,
    pub regs: [u32; NUM_REGS],
}

fn reg_label(reg: usize) -> String {
    format!("x{:<3}({})", reg, ABI_NAMES[reg])
}

impl fmt::Display for RegisterDump {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.view == RegView::Mini {
            return writeln!(f, "PC: 0x{:08x}    IR: 0x{:08x}", self.pc, self.ir);
        }

        writeln!(f, "{SEPARATOR}")?;
        writeln!(f, "PC: 0x{:08x}    IR: 0x{:08x}", self.pc, self.ir)?;
        writeln!(f, "{SEPARATOR}")?;

        // 左列 x0..x15，右列 x16..x31
        let half = NUM_REGS / 2;
        for low in 0..half {
            let high = low + half;
            writeln!(
                f,
                "{:<11}: 0x{:08x}    {:<11}: 0x{:08x}",
                reg_label(low),
                self.regs[low],
                reg_label(high),
                self.regs[high]
            )?;
        }
        Ok(())
    }
}
