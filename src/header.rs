//! C headers
//!
//! Two headers are produced: the macro header defining `call`, `parameter` and `ret` for one
//! scratch register, and binding headers made of jump-table wrappers built on top of it.

use crate::arch::Convention;
use crate::bindings::{Function, check_identifier};
use crate::emit::{AsmBlock, Emitter};
use anyhow::{Context, Result};
use std::fmt::{self, Display};

/// Default file name of the macro header.
pub const CALL_HEADER: &str = "call.h";

/// Column of the line continuations in the `_call2` macro.
const CONTINUATION_COLUMN: usize = 37;

// —————————————————————————————— Macro Header —————————————————————————————— //

/// The macro header for one calling convention.
///
/// Both conventions render the same text up to the scratch register name.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CallHeader {
    pub convention: Convention,
}

impl CallHeader {
    pub fn new(convention: Convention) -> Self {
        CallHeader { convention }
    }
}

impl Display for CallHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = self.convention.scratch();

        writeln!(f, "#pragma once")?;
        writeln!(f)?;
        writeln!(f, "#define STR2(x) #x")?;
        writeln!(f, "#define STR(x) STR2(x)")?;
        writeln!(f)?;

        let call = [
            "#define _call2(c, jt_addr)".to_string(),
            format!("    asm(\"li {s},ret_\" #c \"\\n\""),
            "        \"addi sp,sp,-4\\n\"".to_string(),
            format!("        \"sw {s},0(sp)\\n\""),
            format!("        \"li {s},[\" STR(jt_addr) \"]\\n\""),
            format!("        \"jr {s}\\n\""),
            "        \"ret_\" #c \":\"".to_string(),
            format!("        ::: \"{s}\""),
        ];
        for line in call {
            writeln!(f, "{line:<width$}\\", width = CONTINUATION_COLUMN)?;
        }
        writeln!(f, "    );")?;

        writeln!(f, "#define _call(c, jt_addr) _call2(c, jt_addr)")?;
        writeln!(f, "#define call(jt_addr) _call(__COUNTER__, jt_addr)")?;
        writeln!(f)?;
        writeln!(
            f,
            "#define parameter(i, p) asm(\"mv x\" #i \",%0\" :: \"r\" (p) : \"x\" #i)"
        )?;
        writeln!(f)?;
        writeln!(
            f,
            "#define ret(i, var) asm(\"mv %0,x\" #i : \"=r\" (var) :: \"x\" #i)"
        )
    }
}

// ————————————————————————————— Binding Header ————————————————————————————— //

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Item {
    Comment(String),
    Constant { name: String, value: u32 },
    Function(Function),
}

/// A header of jump-table wrappers, comments and constants, in definition order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Header {
    include: String,
    items: Vec<Item>,
}

impl Default for Header {
    fn default() -> Self {
        Header::new(CALL_HEADER)
    }
}

impl Header {
    /// An empty header that includes the macro header `include`.
    pub fn new(include: impl Into<String>) -> Self {
        Header {
            include: include.into(),
            items: Vec::new(),
        }
    }

    pub fn include(&self) -> &str {
        &self.include
    }

    pub fn set_include(&mut self, include: impl Into<String>) {
        self.include = include.into();
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn functions(&self) -> impl Iterator<Item = &Function> {
        self.items.iter().filter_map(|item| match item {
            Item::Function(function) => Some(function),
            _ => None,
        })
    }

    pub fn comment(&mut self, text: impl Into<String>) -> &mut Self {
        self.items.push(Item::Comment(text.into()));
        self
    }

    pub fn constant(&mut self, name: impl Into<String>, value: u32) -> Result<&mut Self> {
        let name = name.into();
        check_identifier(&name).context("Invalid constant name")?;
        self.items.push(Item::Constant { name, value });
        Ok(self)
    }

    /// Defines the wrapper for the routine at `address`, described by `block`.
    pub fn define<F>(&mut self, address: u32, name: &str, block: F) -> Result<&mut Self>
    where
        F: FnOnce(&mut Function) -> Result<()>,
    {
        let mut function = Function::new(address, name)?;
        block(&mut function).with_context(|| format!("Failed to define '{name}'"))?;
        log::debug!("Defined {name} at 0x{address:08X}");
        self.items.push(Item::Function(function));
        Ok(self)
    }

    /// Expands every wrapper as one compilation unit, sharing a single label counter.
    pub fn expand(&self, convention: Convention) -> Result<Vec<(&str, Vec<AsmBlock>)>> {
        let mut emitter = Emitter::new(convention);
        self.functions()
            .map(|function| {
                let blocks = function.expand(&mut emitter)?;
                Ok::<_, anyhow::Error>((function.name(), blocks))
            })
            .collect()
    }
}

impl Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "#pragma once")?;
        writeln!(f)?;
        writeln!(f, "#include \"{}\"", self.include)?;
        writeln!(f)?;

        for item in &self.items {
            match item {
                Item::Comment(text) => writeln!(f, "// {text}\n")?,
                Item::Constant { name, value } => writeln!(f, "#define {name} 0x{value:08X}\n")?,
                Item::Function(function) => writeln!(f, "{function}")?,
            }
        }

        // Headers end with an empty line
        writeln!(f)
    }
}

// ————————————————————————————————— Tests —————————————————————————————————— //

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bindings::Type;

    const A0_CALL_HEADER: &str = r#"#pragma once

#define STR2(x) #x
#define STR(x) STR2(x)

#define _call2(c, jt_addr)           \
    asm("li a0,ret_" #c "\n"         \
        "addi sp,sp,-4\n"            \
        "sw a0,0(sp)\n"              \
        "li a0,[" STR(jt_addr) "]\n" \
        "jr a0\n"                    \
        "ret_" #c ":"                \
        ::: "a0"                     \
    );
#define _call(c, jt_addr) _call2(c, jt_addr)
#define call(jt_addr) _call(__COUNTER__, jt_addr)

#define parameter(i, p) asm("mv x" #i ",%0" :: "r" (p) : "x" #i)

#define ret(i, var) asm("mv %0,x" #i : "=r" (var) :: "x" #i)
"#;

    #[test]
    fn call_header_a0() {
        assert_eq!(
            CallHeader::new(Convention::A0).to_string(),
            A0_CALL_HEADER
        );
    }

    #[test]
    fn call_header_t6() {
        let t6 = CallHeader::new(Convention::T6).to_string();
        assert_eq!(t6, A0_CALL_HEADER.replace("a0", "t6"));
    }

    #[test]
    fn binding_header() {
        let mut header = Header::default();
        header.comment("random number jump table");
        header
            .define(0xF0049000, "random", |f| {
                f.returns(Type::word())?;
                Ok(())
            })
            .unwrap();
        header.constant("KEY_CTRL", 0x1D).unwrap();

        assert_eq!(
            header.to_string(),
            r#"#pragma once

#include "call.h"

// random number jump table

static inline unsigned int random(void) {
    unsigned int result_0;
    call(0xF0049000);
    ret(0, result_0);
    return result_0;
}

#define KEY_CTRL 0x0000001D


"#
        );
    }

    #[test]
    fn failed_definitions() {
        let mut header = Header::new("call_t6.h");
        assert!(
            header
                .define(0, "broken", |f| {
                    f.parameter_at(40, Type::word(), "x")?;
                    Ok(())
                })
                .is_err()
        );
        assert!(header.constant("NOT A NAME", 1).is_err());
        assert!(header.items().is_empty());
        assert!(header.to_string().contains("#include \"call_t6.h\""));
    }

    #[test]
    fn expansion_shares_labels() {
        let mut header = Header::default();
        header.define(0x10, "first", |_| Ok(())).unwrap();
        header.define(0x14, "second", |_| Ok(())).unwrap();

        let expanded = header.expand(Convention::T6).unwrap();
        let labels: Vec<usize> = expanded
            .iter()
            .flat_map(|(_, blocks)| blocks.iter().flat_map(|b| b.labels()))
            .map(|label| label.id())
            .collect();
        assert_eq!(labels, vec![0, 1]);
        assert_eq!(expanded[1].0, "second");
    }
}
