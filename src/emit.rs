//! Call-site emission
//!
//! The three building blocks of the jump-table calling convention:
//!
//! - [call_block]: push the address of a fresh return label, load the routine address stored
//!   in a jump-table slot and branch to it. The callee pops the return address and jumps back.
//! - [parameter_block]: place a value in argument register `x<i>`.
//! - [ret_block]: copy return register `x<i>` into a variable.
//!
//! Blocks are plain data; a [Dialect] turns them into template lines.

use crate::arch::{Convention, Dialect};
use crate::label::{Label, LabelGenerator};
use crate::riscv::Register;
use anyhow::{Context, Result};
use std::fmt;

/// Size of a return address on the stack, in bytes.
pub const WORD_SIZE: i32 = 4;

// ————————————————————————————— Emitted Code —————————————————————————————— //

/// A jump-table slot reference, substituted verbatim into the emitted text.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Slot(String);

impl Slot {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Slot {
    fn from(value: &str) -> Self {
        Slot(value.trim().to_string())
    }
}

impl From<String> for Slot {
    fn from(value: String) -> Self {
        Slot(value.trim().to_string())
    }
}

/// Numeric slots are written the way jump-table addresses usually are, `0x%08X`.
impl From<u32> for Slot {
    fn from(value: u32) -> Self {
        Slot(format!("0x{value:08X}"))
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Instr {
    /// Materialize the address of a label.
    LoadLabel { rd: Register, label: Label },
    /// `rd = rs + imm`
    AddImm {
        rd: Register,
        rs: Register,
        imm: i32,
    },
    /// Store the word in `rs` at `offset(base)`.
    StoreWord {
        rs: Register,
        base: Register,
        offset: i32,
    },
    /// Load the address held in a jump-table slot.
    LoadSlot { rd: Register, slot: Slot },
    /// Unconditional branch to the address in `rs`.
    JumpReg { rs: Register },
    /// Copy block operand `operand` into `rd`.
    MoveIn { rd: Register, operand: usize },
    /// Copy `rs` into block operand `operand`.
    MoveOut { operand: usize, rs: Register },
}

impl Instr {
    /// The register written by this instruction, if any.
    pub fn def(&self) -> Option<Register> {
        match self {
            Instr::LoadLabel { rd, .. }
            | Instr::AddImm { rd, .. }
            | Instr::LoadSlot { rd, .. }
            | Instr::MoveIn { rd, .. } => Some(*rd),
            Instr::StoreWord { .. } | Instr::JumpReg { .. } | Instr::MoveOut { .. } => None,
        }
    }

    /// The registers read by this instruction.
    pub fn uses(&self) -> Vec<Register> {
        match self {
            Instr::AddImm { rs, .. } => vec![*rs],
            Instr::StoreWord { rs, base, .. } => vec![*rs, *base],
            Instr::JumpReg { rs } => vec![*rs],
            Instr::MoveOut { rs, .. } => vec![*rs],
            Instr::LoadLabel { .. } | Instr::LoadSlot { .. } | Instr::MoveIn { .. } => vec![],
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Stmt {
    Instr(Instr),
    Label(Label),
}

/// A register the block overwrites without producing a value for the caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Clobber {
    pub reg: Register,
    /// Spell the register `x<i>` rather than by its ABI name.
    pub numeric: bool,
}

impl Clobber {
    pub fn name(&self) -> String {
        if self.numeric {
            self.reg.numeric_name()
        } else {
            self.reg.abi_name().to_string()
        }
    }
}

/// One inline assembly statement: its instructions, its operands and what it clobbers.
///
/// Operands are numbered outputs first, then inputs, as in GCC extended assembly.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct AsmBlock {
    pub stmts: Vec<Stmt>,
    pub outputs: Vec<String>,
    pub inputs: Vec<String>,
    pub clobbers: Vec<Clobber>,
}

impl AsmBlock {
    /// Renders the template lines of the block in the given dialect.
    pub fn template<D: Dialect>(&self) -> Vec<String> {
        let mut lines = Vec::with_capacity(self.stmts.len());
        for stmt in &self.stmts {
            match stmt {
                Stmt::Instr(instr) => lines.extend(D::emit_instr(instr)),
                Stmt::Label(label) => lines.push(D::label_def(*label)),
            }
        }
        lines
    }

    pub fn instrs(&self) -> impl Iterator<Item = &Instr> {
        self.stmts.iter().filter_map(|stmt| match stmt {
            Stmt::Instr(instr) => Some(instr),
            Stmt::Label(_) => None,
        })
    }

    /// Labels defined by the block.
    pub fn labels(&self) -> impl Iterator<Item = Label> + '_ {
        self.stmts.iter().filter_map(|stmt| match stmt {
            Stmt::Label(label) => Some(*label),
            Stmt::Instr(_) => None,
        })
    }

    /// Registers written by the block's instructions, in order.
    pub fn defs(&self) -> Vec<Register> {
        self.instrs().filter_map(Instr::def).collect()
    }

    /// Registers read by the block's instructions, in order.
    pub fn uses(&self) -> Vec<Register> {
        self.instrs().flat_map(Instr::uses).collect()
    }
}

// —————————————————————————————— Builders ——————————————————————————————— //

/// Emits the indirect call through `slot`, returning to `label`.
pub fn call_block(convention: Convention, label: Label, slot: Slot) -> AsmBlock {
    let scratch = convention.scratch();
    log::debug!("Emitting call through [{slot}] with scratch {scratch}, returning to {label}");

    AsmBlock {
        stmts: vec![
            Stmt::Instr(Instr::LoadLabel { rd: scratch, label }),
            Stmt::Instr(Instr::AddImm {
                rd: Register::SP,
                rs: Register::SP,
                imm: -WORD_SIZE,
            }),
            Stmt::Instr(Instr::StoreWord {
                rs: scratch,
                base: Register::SP,
                offset: 0,
            }),
            Stmt::Instr(Instr::LoadSlot { rd: scratch, slot }),
            Stmt::Instr(Instr::JumpReg { rs: scratch }),
            Stmt::Label(label),
        ],
        outputs: vec![],
        inputs: vec![],
        clobbers: vec![Clobber {
            reg: scratch,
            numeric: false,
        }],
    }
}

/// Emits the move of `value` into argument register `x<index>`.
pub fn parameter_block(index: u8, value: impl Into<String>) -> Result<AsmBlock> {
    let reg = Register::new(index).context("Invalid parameter register")?;
    Ok(AsmBlock {
        stmts: vec![Stmt::Instr(Instr::MoveIn {
            rd: reg,
            operand: 0,
        })],
        outputs: vec![],
        inputs: vec![value.into()],
        clobbers: vec![Clobber { reg, numeric: true }],
    })
}

/// Emits the copy of return register `x<index>` into `var`.
///
/// The register is listed as clobbered, mirroring the C header.
pub fn ret_block(index: u8, var: impl Into<String>) -> Result<AsmBlock> {
    let reg = Register::new(index).context("Invalid return register")?;
    Ok(AsmBlock {
        stmts: vec![Stmt::Instr(Instr::MoveOut {
            operand: 0,
            rs: reg,
        })],
        outputs: vec![var.into()],
        inputs: vec![],
        clobbers: vec![Clobber { reg, numeric: true }],
    })
}

/// Emits call sites for one compilation unit.
///
/// The emitter owns the unit's label counter, so every [Emitter::call] gets its own return
/// label.
#[derive(Debug, Clone)]
pub struct Emitter {
    convention: Convention,
    labels: LabelGenerator,
}

impl Emitter {
    pub fn new(convention: Convention) -> Self {
        Emitter {
            convention,
            labels: LabelGenerator::new(),
        }
    }

    pub fn with_labels(convention: Convention, labels: LabelGenerator) -> Self {
        Emitter { convention, labels }
    }

    pub fn convention(&self) -> Convention {
        self.convention
    }

    /// `call(jt_addr)`
    pub fn call(&mut self, jt_addr: impl Into<Slot>) -> AsmBlock {
        let label = self.labels.next_label();
        call_block(self.convention, label, jt_addr.into())
    }

    /// `parameter(i, p)`
    pub fn parameter(&self, index: u8, value: impl Into<String>) -> Result<AsmBlock> {
        parameter_block(index, value)
    }

    /// `ret(i, var)`
    pub fn ret(&self, index: u8, var: impl Into<String>) -> Result<AsmBlock> {
        ret_block(index, var)
    }
}

// ————————————————————————————————— Tests —————————————————————————————————— //

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arch::{Gcc, Rust};

    #[test]
    fn call_template() {
        let mut emitter = Emitter::new(Convention::A0);
        let block = emitter.call(42u32);
        assert_eq!(
            block.template::<Gcc>(),
            vec![
                "li a0,ret_0",
                "addi sp,sp,-4",
                "sw a0,0(sp)",
                "li a0,[0x0000002A]",
                "jr a0",
                "ret_0:",
            ]
        );

        let block = emitter.call("jump_table + 8");
        assert_eq!(
            block.template::<Rust>(),
            vec![
                "la a0, 1f",
                "addi sp, sp, -4",
                "sw a0, 0(sp)",
                "li a0, jump_table + 8",
                "lw a0, 0(a0)",
                "jr a0",
                "1:",
            ]
        );
        assert_eq!(block.labels().collect::<Vec<_>>(), vec![Label::new(1)]);
    }

    #[test]
    fn call_registers() {
        let block = call_block(Convention::T6, Label::new(0), "0x10".into());
        assert_eq!(
            block.defs(),
            vec![Register::T6, Register::SP, Register::T6]
        );
        assert_eq!(
            block.uses(),
            vec![Register::SP, Register::T6, Register::SP, Register::T6]
        );
        assert_eq!(block.clobbers.len(), 1);
        assert_eq!(block.clobbers[0].name(), "t6");
        assert!(block.inputs.is_empty() && block.outputs.is_empty());
    }

    #[test]
    fn parameter_template() {
        let block = parameter_block(5, "color").unwrap();
        assert_eq!(block.template::<Gcc>(), vec!["mv x5,%0"]);
        assert_eq!(block.inputs, vec!["color"]);
        assert_eq!(block.clobbers[0].name(), "x5");
        assert!(parameter_block(32, "color").is_err());
    }

    #[test]
    fn ret_template() {
        let block = ret_block(1, "result_1").unwrap();
        assert_eq!(block.template::<Gcc>(), vec!["mv %0,x1"]);
        assert_eq!(block.outputs, vec!["result_1"]);
        assert!(block.defs().is_empty());
        assert_eq!(block.uses(), vec![Register::RA]);
        assert!(ret_block(40, "result").is_err());
    }

    #[test]
    fn slot_text() {
        assert_eq!(Slot::from(0xF0042000u32).as_str(), "0xF0042000");
        assert_eq!(Slot::from(" SLOT ").as_str(), "SLOT");
        assert_eq!(Slot::from(String::from("42")).to_string(), "42");
    }
}
