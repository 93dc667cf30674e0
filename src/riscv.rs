//! RISC-V integer registers

use anyhow::{Result, anyhow, bail};
use std::fmt;
use std::str::FromStr;

/// ABI names, indexed by register number.
static ABI_NAMES: [&str; 32] = [
    "zero", "ra", "sp", "gp", "tp", "t0", "t1", "t2", "s0", "s1", "a0", "a1", "a2", "a3", "a4",
    "a5", "a6", "a7", "s2", "s3", "s4", "s5", "s6", "s7", "s8", "s9", "s10", "s11", "t3", "t4",
    "t5", "t6",
];

/// One of the 32 integer registers `x0`..`x31`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Register(u8);

impl Register {
    pub const ZERO: Register = Register(0);
    pub const RA: Register = Register(1);
    pub const SP: Register = Register(2);
    pub const A0: Register = Register(10);
    pub const T6: Register = Register(31);

    /// Number of integer registers.
    pub const COUNT: usize = 32;

    /// Returns the register `x<index>`.
    pub fn new(index: u8) -> Result<Register> {
        if (index as usize) < Self::COUNT {
            Ok(Register(index))
        } else {
            Err(anyhow!(
                "register index {index} is out of range, expected 0..={}",
                Self::COUNT - 1
            ))
        }
    }

    pub fn index(self) -> u8 {
        self.0
    }

    /// The ABI mnemonic, such as `a0` or `sp`.
    pub fn abi_name(self) -> &'static str {
        ABI_NAMES[self.0 as usize]
    }

    /// The numeric name, such as `x10`.
    pub fn numeric_name(self) -> String {
        format!("x{}", self.0)
    }

    /// Whether LLVM accepts the register as an explicit `asm!` operand.
    ///
    /// `x0` is hardwired, `sp`, `gp` and `tp` are never allocatable, and `s0`/`s1` are reserved
    /// as frame and base pointers.
    pub fn is_asm_operand(self) -> bool {
        !matches!(self.0, 0 | 2 | 3 | 4 | 8 | 9)
    }
}

impl FromStr for Register {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let name = s.trim();
        if let Some(digits) = name.strip_prefix('x')
            && !digits.is_empty()
            && digits.bytes().all(|b| b.is_ascii_digit())
        {
            let index = digits
                .parse::<u8>()
                .map_err(|_| anyhow!("Unknown register: {name}"))?;
            return Register::new(index);
        }
        if name == "fp" {
            return Ok(Register(8));
        }
        match ABI_NAMES.iter().position(|abi| *abi == name) {
            Some(index) => Ok(Register(index as u8)),
            None => bail!("Unknown register: {name}"),
        }
    }
}

/// Registers print with their ABI name.
impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.abi_name())
    }
}

// ————————————————————————————————— Tests —————————————————————————————————— //
