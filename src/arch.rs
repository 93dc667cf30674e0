//! Abstraction over the calling convention and the assembly dialect

use crate::emit::Instr;
use crate::label::Label;
use crate::riscv::Register;
use anyhow::{Result, bail};
use std::fmt;
use std::str::FromStr;

// ——————————————————————————— Calling Convention ——————————————————————————— //

/// Which register a call sequence uses to hold its return address and branch target.
///
/// The two conventions emit the same instructions up to the name of the scratch register. They
/// are not interchangeable: code around a call must not keep a live value in the scratch
/// register, and a callee may rely on it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Convention {
    #[default]
    A0,
    T6,
}

impl Convention {
    pub const ALL: [Convention; 2] = [Convention::A0, Convention::T6];

    /// The register clobbered by every call.
    pub fn scratch(self) -> Register {
        match self {
            Convention::A0 => Register::A0,
            Convention::T6 => Register::T6,
        }
    }
}

impl FromStr for Convention {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "a0" | "x10" => Ok(Convention::A0),
            "t6" | "x31" => Ok(Convention::T6),
            other => bail!("Unsupported scratch register '{other}', expected 'a0' or 't6'"),
        }
    }
}

impl fmt::Display for Convention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.scratch())
    }
}

// ———————————————————————————————— Dialects ———————————————————————————————— //

/// The syntax an instruction template is rendered in.
pub trait Dialect {
    /// Text that defines `label` at the current position.
    fn label_def(label: Label) -> String;

    /// Text that refers to `label` from an instruction emitted before it.
    fn label_ref(label: Label) -> String;

    /// Placeholder for the `index`-th operand of the block (outputs first, then inputs).
    fn operand(index: usize) -> String;

    /// Renders one instruction. Pseudo-instructions the dialect lacks may take several lines.
    fn emit_instr(instr: &Instr) -> Vec<String>;
}

/// GCC extended inline assembly for the jump-table target, byte-for-byte what the C header
/// produces.
pub struct Gcc;

impl Dialect for Gcc {
    fn label_def(label: Label) -> String {
        format!("{label}:")
    }

    fn label_ref(label: Label) -> String {
        label.to_string()
    }

    fn operand(index: usize) -> String {
        format!("%{index}")
    }

    fn emit_instr(instr: &Instr) -> Vec<String> {
        let line = match instr {
            Instr::LoadLabel { rd, label } => format!("li {rd},{}", Self::label_ref(*label)),
            Instr::AddImm { rd, rs, imm } => format!("addi {rd},{rs},{imm}"),
            Instr::StoreWord { rs, base, offset } => format!("sw {rs},{offset}({base})"),
            Instr::LoadSlot { rd, slot } => format!("li {rd},[{slot}]"),
            Instr::JumpReg { rs } => format!("jr {rs}"),
            Instr::MoveIn { rd, operand } => {
                format!("mv {},{}", rd.numeric_name(), Self::operand(*operand))
            }
            Instr::MoveOut { operand, rs } => {
                format!("mv {},{}", Self::operand(*operand), rs.numeric_name())
            }
        };
        vec![line]
    }
}

/// Templates for Rust's `core::arch::asm!` on RISC-V.
///
/// Return labels become numeric local labels, which may be defined any number of times in one
/// object file. `asm!` blocks get duplicated when inlined, so named labels are not an option.
pub struct Rust;

impl Dialect for Rust {
    fn label_def(label: Label) -> String {
        format!("{}:", label.id())
    }

    fn label_ref(label: Label) -> String {
        format!("{}f", label.id())
    }

    fn operand(index: usize) -> String {
        format!("{{{index}}}")
    }

    fn emit_instr(instr: &Instr) -> Vec<String> {
        match instr {
            Instr::LoadLabel { rd, label } => {
                let label = Self::label_ref(*label);
                vec![format!("la {rd}, {label}")]
            }
            Instr::AddImm { rd, rs, imm } => vec![format!("addi {rd}, {rs}, {imm}")],
            Instr::StoreWord { rs, base, offset } => vec![format!("sw {rs}, {offset}({base})")],
            // No memory-indirect immediate load: materialize the slot address, then dereference.
            Instr::LoadSlot { rd, slot } => {
                vec![format!("li {rd}, {slot}"), format!("lw {rd}, 0({rd})")]
            }
            Instr::JumpReg { rs } => vec![format!("jr {rs}")],
            Instr::MoveIn { rd, operand } => {
                let operand = Self::operand(*operand);
                vec![format!("mv {}, {operand}", rd.numeric_name())]
            }
            Instr::MoveOut { operand, rs } => {
                let operand = Self::operand(*operand);
                vec![format!("mv {operand}, {}", rs.numeric_name())]
            }
        }
    }
}

// ————————————————————————————————— Tests —————————————————————————————————— //
