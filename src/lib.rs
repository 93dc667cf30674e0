//! Indirect calls through a jump table
//!
//! The targets served here lack an indirect call instruction. A call is emitted as a short inline
//! assembly sequence instead: the address of a fresh return label is pushed on the stack, the
//! routine address is loaded from its jump-table slot, and control branches there through a
//! scratch register (`a0` or `t6`). The callee pops the return address to come back.
//!
//! This crate builds those sequences and renders them as GCC extended assembly, as the C macro
//! header `call.h`, as C binding headers for whole jump tables, or as `asm!` templates (see the
//! `jtcall-macro` crate).

pub mod arch;
pub mod asm_parser;
pub mod bindings;
pub mod display;
pub mod emit;
pub mod fox32;
pub mod header;
pub mod label;
pub mod riscv;
pub mod verify;

pub use arch::{Convention, Dialect, Gcc, Rust};
pub use bindings::{Function, Type, Variable};
pub use display::GccStatement;
pub use emit::{AsmBlock, Emitter, Slot, call_block, parameter_block, ret_block};
pub use header::{CALL_HEADER, CallHeader, Header};
pub use label::{Label, LabelGenerator};
pub use riscv::Register;
pub use verify::{CallShape, check_call};
