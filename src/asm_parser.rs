//! Assembly Parser
//!
//! This module reads back instruction templates, such as the ones produced by the call-site
//! builders, so that their shape can be checked independently of how they were produced.
//!
//! We use [Pest](https://pest.rs) to generate a parser that produces un-typed nodes from the
//! grammar in `asm_parser.pest`. The output of the Pest parser is then turned into a small typed
//! AST.

use anyhow::{Result, anyhow};
use pest::Parser;
use pest::iterators::Pair;
use pest_derive::Parser;

// —————————————————————————————— Pest Parser ——————————————————————————————— //

#[derive(Parser)]
#[grammar = "asm_parser.pest"]
struct PestParser;

// ——————————————————————————— Typed Assembly AST ——————————————————————————— //

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AsmLine {
    Instr(Instr),
    Label(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Instr {
    pub mnemonic: String,
    pub operands: Vec<String>,
}

// ——————————————————————————————— Public API ——————————————————————————————— //

/// Parses a list of assembly lines. Directives and empty lines are dropped.
///
/// Each template item may itself span several lines.
pub fn parse_instructions(assembly_template: &[String]) -> Result<Vec<AsmLine>> {
    let asm_text = assembly_template.join("\n");
    let mut result = Vec::new();

    for line in asm_text.lines() {
        let pair = PestParser::parse(Rule::asm_line, line.trim())
            .map_err(|err| anyhow!("Could not parse assembly line '{}': {err}", line.trim()))?
            .next()
            .ok_or_else(|| anyhow!("Empty parse for assembly line '{}'", line.trim()))?;
        if let Some(asm_line) = parse_assembly_line(pair)? {
            result.push(asm_line);
        }
    }

    Ok(result)
}

/// Parses an immediate offset, such as `0(sp)`, into the offset and the base register.
pub fn into_immediate_offset(input: &str) -> Result<(i64, &'_ str)> {
    let pair = PestParser::parse(Rule::imm_off, input.trim())
        .map_err(|err| anyhow!("Invalid immediate offset '{input}': {err}"))?
        .next()
        .ok_or_else(|| anyhow!("Invalid immediate offset '{input}'"))?;
    parse_immediate_offset(pair)
}

/// Parses an integer literal, in decimal or `0x` hexadecimal, with an optional minus sign.
pub fn parse_integer(input: &str) -> Result<i64> {
    let input = input.trim();
    let (negative, digits) = match input.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, input),
    };
    let value = match digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        Some(hex) => i64::from_str_radix(hex, 16)?,
        None => digits.parse::<i64>()?,
    };
    Ok(if negative { -value } else { value })
}

// —————————————————————————————— Typed Parser —————————————————————————————— //

fn parse_assembly_line(pair: Pair<Rule>) -> Result<Option<AsmLine>> {
    let Some(inner) = pair.into_inner().next() else {
        return Err(anyhow!("Empty assembly line"));
    };
    match inner.as_rule() {
        Rule::asm_instr => Ok(Some(AsmLine::Instr(parse_asm_instr(inner)?))),
        Rule::asm_label => Ok(Some(AsmLine::Label(parse_asm_label(inner)?))),
        Rule::directive | Rule::empty_line => Ok(None),
        // The end of input marker is the only other possible child
        Rule::EOI => Ok(None),
        _ => Err(anyhow!(
            "Could not parse assembly line, got: {:?}",
            inner.as_rule()
        )),
    }
}

fn parse_asm_label(pair: Pair<Rule>) -> Result<String> {
    let inner = pair
        .into_inner()
        .next()
        .ok_or_else(|| anyhow!("Missing label name"))?;
    match inner.as_rule() {
        Rule::label_id => Ok(inner.as_str().to_string()),
        _ => Err(anyhow!("Expected a label, got: {:?}", inner.as_rule())),
    }
}

fn parse_asm_instr(pair: Pair<Rule>) -> Result<Instr> {
    let mut pairs = match pair.as_rule() {
        Rule::asm_instr => pair.into_inner(),
        _ => return Err(anyhow!("Expected an asm_instr, got: {:?}", pair.as_rule())),
    };
    let mnemonic = pairs
        .next()
        .ok_or_else(|| anyhow!("Missing mnemonic"))?
        .as_str()
        .to_string();

    let mut operands = Vec::new();
    for pair in pairs {
        match pair.as_rule() {
            Rule::operand => operands.push(pair.as_str().trim().to_string()),
            _ => return Err(anyhow!("Invalid asm instruction: {:?}", pair)),
        }
    }

    Ok(Instr { mnemonic, operands })
}

fn parse_immediate_offset(pair: Pair<'_, Rule>) -> Result<(i64, &'_ str)> {
    let mut offset = 0;
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::number => offset = parse_integer(inner.as_str())?,
            Rule::any_reg => return Ok((offset, inner.as_str())),
            _ => return Err(anyhow!("Unexpected token in offset: {:?}", inner.as_rule())),
        }
    }
    Err(anyhow!("Missing base register"))
}

// ————————————————————————————————— Tests —————————————————————————————————— //
