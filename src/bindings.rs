//! C bindings for jump-table routines
//!
//! Each routine reachable through a jump-table slot gets a `static inline` C wrapper that moves
//! its arguments into their registers, performs the indirect call and reads the results back:
//!
//! ```c
//! static inline unsigned int random_range(
//!     unsigned int minimum,
//!     unsigned int maximum
//! ) {
//!     unsigned int result_0;
//!     parameter(1, minimum);
//!     parameter(2, maximum);
//!     call(0xF0049004);
//!     ret(0, result_0);
//!     return result_0;
//! }
//! ```

use crate::emit::{AsmBlock, Emitter};
use crate::riscv::Register;
use anyhow::{Context, Result, anyhow, bail};
use regex::Regex;
use std::fmt::{self, Display};
use std::sync::LazyLock;

/// Register slots available to parameters and to results.
pub const SLOTS: usize = Register::COUNT;

static C_IDENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

/// Rejects names that cannot be used as C identifiers.
pub fn check_identifier(name: &str) -> Result<()> {
    if C_IDENT.is_match(name) {
        Ok(())
    } else {
        Err(anyhow!("'{name}' is not a valid C identifier"))
    }
}

// ————————————————————————————————— Types —————————————————————————————————— //

/// A C type, by name.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Type(String);

impl Type {
    pub fn new(name: impl Into<String>) -> Self {
        Type(name.into())
    }

    pub fn void() -> Self {
        Type::new("void")
    }

    pub fn byte() -> Self {
        Type::new("unsigned char")
    }

    pub fn ibyte() -> Self {
        Type::new("signed char")
    }

    pub fn half() -> Self {
        Type::new("unsigned short")
    }

    pub fn ihalf() -> Self {
        Type::new("signed short")
    }

    pub fn word() -> Self {
        Type::new("unsigned int")
    }

    pub fn iword() -> Self {
        Type::new("signed int")
    }

    /// A pointer to this type.
    pub fn pointer(&self) -> Self {
        Type(format!("{}*", self.0))
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Variable {
    pub ty: Type,
    pub name: String,
}

// ——————————————————————————————— Functions ———————————————————————————————— //

/// A routine behind one jump-table slot.
///
/// Parameters and results are indexed by the register that carries them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Function {
    address: u32,
    name: String,
    parameters: Vec<Option<Variable>>,
    returns: Vec<Option<Variable>>,
}

impl Function {
    pub fn new(address: u32, name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        check_identifier(&name).context("Invalid function name")?;
        Ok(Function {
            address,
            name,
            parameters: vec![None; SLOTS],
            returns: vec![None; SLOTS],
        })
    }

    pub fn address(&self) -> u32 {
        self.address
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Adds a parameter in the first free register.
    pub fn parameter(&mut self, ty: Type, name: impl Into<String>) -> Result<&mut Self> {
        let index = first_free(&self.parameters)
            .ok_or_else(|| anyhow!("'{}': no free parameter register", self.name))?;
        self.parameter_at(index, ty, name)
    }

    /// Adds a parameter passed in register `x<index>`.
    pub fn parameter_at(
        &mut self,
        index: usize,
        ty: Type,
        name: impl Into<String>,
    ) -> Result<&mut Self> {
        let name = name.into();
        check_identifier(&name).with_context(|| format!("'{}': bad parameter name", self.name))?;
        if self.parameters.iter().flatten().any(|var| var.name == name) {
            bail!("'{}': duplicate parameter '{name}'", self.name);
        }
        claim(&mut self.parameters, index, Variable { ty, name })
            .with_context(|| format!("'{}': cannot add parameter", self.name))?;
        Ok(self)
    }

    /// Adds a result read from the first free register.
    pub fn returns(&mut self, ty: Type) -> Result<&mut Self> {
        let index = first_free(&self.returns)
            .ok_or_else(|| anyhow!("'{}': no free return register", self.name))?;
        self.returns_at(index, ty)
    }

    /// Adds a result read from register `x<index>`, stored in `result_<index>`.
    pub fn returns_at(&mut self, index: usize, ty: Type) -> Result<&mut Self> {
        let name = format!("result_{index}");
        claim(&mut self.returns, index, Variable { ty, name })
            .with_context(|| format!("'{}': cannot add result", self.name))?;
        Ok(self)
    }

    /// Parameters with their register index, in register order.
    pub fn inputs(&self) -> impl Iterator<Item = (usize, &Variable)> {
        indexed(&self.parameters)
    }

    /// Results with their register index, in register order.
    pub fn outputs(&self) -> impl Iterator<Item = (usize, &Variable)> {
        indexed(&self.returns)
    }

    /// Expands the body of the wrapper the way the macro header does.
    pub fn expand(&self, emitter: &mut Emitter) -> Result<Vec<AsmBlock>> {
        let mut blocks = Vec::new();
        for (index, var) in self.inputs() {
            blocks.push(emitter.parameter(index as u8, var.name.clone())?);
        }
        blocks.push(emitter.call(self.address));
        for (index, var) in self.outputs() {
            blocks.push(emitter.ret(index as u8, var.name.clone())?);
        }
        Ok(blocks)
    }
}

fn first_free(slots: &[Option<Variable>]) -> Option<usize> {
    slots.iter().position(Option::is_none)
}

fn claim(slots: &mut [Option<Variable>], index: usize, var: Variable) -> Result<()> {
    let Some(slot) = slots.get_mut(index) else {
        bail!("register index {index} is out of range, expected 0..{SLOTS}");
    };
    if let Some(previous) = slot {
        bail!("register x{index} is already used by '{}'", previous.name);
    }
    *slot = Some(var);
    Ok(())
}

fn indexed(slots: &[Option<Variable>]) -> impl Iterator<Item = (usize, &Variable)> {
    slots
        .iter()
        .enumerate()
        .filter_map(|(index, var)| var.as_ref().map(|var| (index, var)))
}

impl Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inputs: Vec<_> = self.inputs().collect();
        let outputs: Vec<_> = self.outputs().collect();
        let result = outputs.first().map(|(_, var)| var);

        // Signature
        let return_type = result.map_or_else(Type::void, |var| var.ty.clone());
        write!(f, "static inline {return_type} {}(", self.name)?;
        if inputs.is_empty() {
            writeln!(f, "{}) {{", Type::void())?;
        } else {
            writeln!(f)?;
            let params: Vec<String> = inputs
                .iter()
                .map(|(_, var)| format!("    {} {}", var.ty, var.name))
                .collect();
            writeln!(f, "{}", params.join(",\n"))?;
            writeln!(f, ") {{")?;
        }

        // Body
        for (_, var) in &outputs {
            writeln!(f, "    {} {};", var.ty, var.name)?;
        }
        for (index, var) in &inputs {
            writeln!(f, "    parameter({index}, {});", var.name)?;
        }
        writeln!(f, "    call(0x{:08X});", self.address)?;
        for (index, var) in &outputs {
            writeln!(f, "    ret({index}, {});", var.name)?;
        }
        if let Some(var) = result {
            writeln!(f, "    return {};", var.name)?;
        }

        writeln!(f, "}}")
    }
}

// ————————————————————————————————— Tests —————————————————————————————————— //
