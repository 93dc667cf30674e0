//! Call-shape verification
//!
//! Checks that a rendered template is exactly one jump-table call:
//!
//! ```text
//! li   s, <label>      (or `la s, <label>`)
//! addi sp, sp, -4
//! sw   s, 0(sp)
//! li   s, [<slot>]     (or `li s, <slot>` followed by `lw s, 0(s)`)
//! jr   s
//! <label>:
//! ```
//!
//! where `s` is the scratch register of the convention.

use crate::asm_parser::{self, AsmLine, Instr, into_immediate_offset, parse_integer};
use crate::emit::WORD_SIZE;
use crate::riscv::Register;
use anyhow::{Context, Result, anyhow, bail};

/// What a well-formed call sequence refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallShape {
    /// The label definition closing the sequence, without the colon.
    pub return_label: String,
    /// The jump-table slot, as written in the template.
    pub slot: String,
}

/// Verifies that `template` is a single call through `scratch`.
pub fn check_call(template: &[String], scratch: Register) -> Result<CallShape> {
    let lines = asm_parser::parse_instructions(template)?;
    let mut lines = lines.iter();
    let mut next = |what: &str| {
        lines
            .next()
            .ok_or_else(|| anyhow!("Call sequence ends early, expected {what}"))
    };

    // Push the return address
    let instr = expect_instr(next("the return address load")?, &["li", "la"], 2)?;
    expect_reg(&instr.operands[0], scratch)?;
    let label_ref = instr.operands[1].clone();

    let instr = expect_instr(next("the stack adjustment")?, &["addi"], 3)?;
    expect_reg(&instr.operands[0], Register::SP)?;
    expect_reg(&instr.operands[1], Register::SP)?;
    let imm = parse_integer(&instr.operands[2]).context("Invalid stack adjustment")?;
    if imm != -i64::from(WORD_SIZE) {
        bail!("Stack pointer must move by exactly -{WORD_SIZE}, got {imm}");
    }

    let instr = expect_instr(next("the return address store")?, &["sw"], 2)?;
    expect_reg(&instr.operands[0], scratch)?;
    let (offset, base) = into_immediate_offset(&instr.operands[1])?;
    expect_reg(base, Register::SP)?;
    if offset != 0 {
        bail!("Return address must be stored at 0(sp), got {offset}({base})");
    }

    // Load the routine address from the jump table
    let instr = expect_instr(next("the jump-table load")?, &["li"], 2)?;
    expect_reg(&instr.operands[0], scratch)?;
    let slot = match instr.operands[1]
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
    {
        Some(slot) => slot.trim().to_string(),
        None => {
            let slot = instr.operands[1].clone();
            let instr = expect_instr(next("the jump-table dereference")?, &["lw"], 2)?;
            expect_reg(&instr.operands[0], scratch)?;
            let (offset, base) = into_immediate_offset(&instr.operands[1])?;
            expect_reg(base, scratch)?;
            if offset != 0 {
                bail!("Jump-table slot must be read at offset 0, got {offset}");
            }
            slot
        }
    };

    let instr = expect_instr(next("the indirect branch")?, &["jr"], 1)?;
    expect_reg(&instr.operands[0], scratch)?;

    // Land right after the branch
    let return_label = match next("the return label")? {
        AsmLine::Label(label) => label.clone(),
        AsmLine::Instr(instr) => bail!("Expected the return label, got '{}'", instr.mnemonic),
    };
    if !refers_to(&label_ref, &return_label) {
        bail!("Return address '{label_ref}' does not refer to the return label '{return_label}'");
    }

    if let Some(extra) = lines.next() {
        bail!("Unexpected line after the return label: {extra:?}");
    }

    log::trace!("Verified call through [{slot}] returning to {return_label}");
    Ok(CallShape { return_label, slot })
}

fn expect_instr<'a>(line: &'a AsmLine, mnemonics: &[&str], nb_ops: usize) -> Result<&'a Instr> {
    let AsmLine::Instr(instr) = line else {
        bail!("Expected one of {mnemonics:?}, got label {line:?}");
    };
    if !mnemonics.contains(&instr.mnemonic.as_str()) {
        bail!("Expected one of {mnemonics:?}, got '{}'", instr.mnemonic);
    }
    let m = instr.operands.len();
    if m != nb_ops {
        let s = if nb_ops > 1 { "s" } else { "" };
        bail!("'{}' expects {nb_ops} operand{s}, got {m}", instr.mnemonic);
    }
    Ok(instr)
}

fn expect_reg(operand: &str, expected: Register) -> Result<()> {
    let reg = operand.parse::<Register>()?;
    if reg != expected {
        bail!("Expected register {expected}, got {operand}");
    }
    Ok(())
}

/// Whether `reference` names `label`, either directly or as a forward numeric local label.
fn refers_to(reference: &str, label: &str) -> bool {
    reference == label
        || (label.bytes().all(|b| b.is_ascii_digit()) && reference.strip_suffix('f') == Some(label))
}

// ————————————————————————————————— Tests —————————————————————————————————— //
