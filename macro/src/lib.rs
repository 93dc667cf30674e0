//! Jump-table calls as Rust inline assembly
//!
//! ```ignore
//! use jtcall_macro::{call, parameter, ret};
//!
//! let (minimum, maximum) = (1u32, 6u32);
//! let roll: u32;
//! unsafe {
//!     parameter!(1, minimum);
//!     parameter!(2, maximum);
//!     call!(0xF0049004);
//!     ret!(0, roll);
//! }
//! ```
//!
//! Each macro expands to a single `core::arch::asm!` statement and must be used in an `unsafe`
//! context. `call!` clobbers its scratch register, `a0` unless `scratch = t6` is given.
//!
//! The compiler does not preserve registers between `asm!` statements. `parameter!` declares
//! `x<i>` clobbered and `ret!` reads `x<i>` without declaring it as an input, so nothing stops
//! the compiler from reusing those registers between the statements of one call. The sequence
//! only works when nothing in between needs a register, as with the C macros it mirrors. Keep the
//! statements adjacent and check the generated code.

mod macro_parser;

use jtcall::arch::{Convention, Rust};
use jtcall::emit::{AsmBlock, Slot, call_block, parameter_block, ret_block};
use jtcall::label::Label;
use jtcall::riscv::Register;
use macro_parser::{CallInput, RegisterInput};
use proc_macro::TokenStream;
use proc_macro2::{Span, TokenStream as TokenStream2};
use quote::quote;
use std::sync::atomic::{AtomicUsize, Ordering};
use syn::{Expr, ExprLit, Lit, LitInt, parse_macro_input};

/// Return labels handed out by this compiler process.
static NEXT_LABEL: AtomicUsize = AtomicUsize::new(0);

/// Name of the operand holding a non-literal jump-table slot.
const SLOT_OPERAND: &str = "jt";

// ————————————————————————————— Macro Entries —————————————————————————————— //

/// `call!(jt_addr)`: calls the routine whose address is stored at `jt_addr`.
#[proc_macro]
pub fn call(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as CallInput);
    into_output(expand_call(input, next_label()))
}

/// `parameter!(i, p)`: moves `p` into argument register `x<i>`.
#[proc_macro]
pub fn parameter(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as RegisterInput);
    into_output(expand_parameter(input))
}

/// `ret!(i, var)`: copies return register `x<i>` into `var`.
#[proc_macro]
pub fn ret(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as RegisterInput);
    into_output(expand_ret(input))
}

/// A return label no earlier expansion in this compiler process received.
fn next_label() -> Label {
    Label::new(NEXT_LABEL.fetch_add(1, Ordering::Relaxed))
}

fn into_output(expansion: syn::Result<TokenStream2>) -> TokenStream {
    match expansion {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

// ——————————————————————————————— Expansion ———————————————————————————————— //

fn expand_call(input: CallInput, label: Label) -> syn::Result<TokenStream2> {
    let convention = match &input.scratch {
        Some(ident) => ident
            .to_string()
            .parse::<Convention>()
            .map_err(|err| syn::Error::new(ident.span(), err))?,
        None => Convention::default(),
    };

    // Integer literals are written into the template, anything else goes through a const operand
    let (slot, operand) = match &input.jt_addr {
        Expr::Lit(ExprLit {
            lit: Lit::Int(lit), ..
        }) => (Slot::from(lit.base10_parse::<u32>()?), None),
        expr => {
            let name = syn::Ident::new(SLOT_OPERAND, Span::call_site());
            (
                Slot::from(format!("{{{SLOT_OPERAND}}}")),
                Some(quote! { #name = const #expr }),
            )
        }
    };

    let block = call_block(convention, label, slot);
    Ok(emit_asm(&block, operand.into_iter().collect()))
}

fn expand_parameter(input: RegisterInput) -> syn::Result<TokenStream2> {
    let index = register_index(&input.index)?;
    let span = input.index.span();
    let block = parameter_block(index, "").map_err(|err| syn::Error::new(span, err))?;
    let expr = &input.expr;
    Ok(emit_asm(&block, vec![quote! { in(reg) #expr }]))
}

fn expand_ret(input: RegisterInput) -> syn::Result<TokenStream2> {
    let index = register_index(&input.index)?;
    let span = input.index.span();
    let block = ret_block(index, "").map_err(|err| syn::Error::new(span, err))?;
    let expr = &input.expr;
    Ok(emit_asm(&block, vec![quote! { out(reg) #expr }]))
}

/// Validates a register index: `x<i>` must exist and be usable as an `asm!` operand.
fn register_index(lit: &LitInt) -> syn::Result<u8> {
    let index = lit.base10_parse::<u8>()?;
    let reg = Register::new(index).map_err(|err| syn::Error::new(lit.span(), err))?;
    if !reg.is_asm_operand() {
        return Err(syn::Error::new(
            lit.span(),
            format!(
                "Register x{index} ({}) is reserved and cannot be used by inline assembly",
                reg.abi_name()
            ),
        ));
    }
    Ok(index)
}

/// Builds the `asm!` invocation: template lines, then `operands`, then one discarded output per
/// clobbered register.
fn emit_asm(block: &AsmBlock, operands: Vec<TokenStream2>) -> TokenStream2 {
    let lines = block.template::<Rust>();
    let clobbers = block.clobbers.iter().map(|clobber| {
        let name = clobber.name();
        quote! { out(#name) _ }
    });

    let args = lines
        .iter()
        .map(|line| quote! { #line })
        .chain(operands)
        .chain(clobbers);

    quote! {
        ::core::arch::asm!(#(#args),*)
    }
}

// ————————————————————————————————— Tests —————————————————————————————————— //

#[cfg(test)]
mod tests {
    use super::*;

    fn call_tokens(tokens: TokenStream2, label: usize) -> syn::Result<String> {
        let input = syn::parse2::<CallInput>(tokens)?;
        expand_call(input, Label::new(label)).map(|tokens| tokens.to_string())
    }

    fn parameter_tokens(tokens: TokenStream2) -> syn::Result<String> {
        expand_parameter(syn::parse2(tokens)?).map(|tokens| tokens.to_string())
    }

    fn ret_tokens(tokens: TokenStream2) -> syn::Result<String> {
        expand_ret(syn::parse2(tokens)?).map(|tokens| tokens.to_string())
    }

    #[test]
    fn literal_call() {
        let expected = quote! {
            ::core::arch::asm!(
                "la a0, 4f",
                "addi sp, sp, -4",
                "sw a0, 0(sp)",
                "li a0, 0xF0040000",
                "lw a0, 0(a0)",
                "jr a0",
                "4:",
                out("a0") _
            )
        };
        assert_eq!(
            call_tokens(quote! { 0xF0040000 }, 4).unwrap(),
            expected.to_string()
        );
    }

    #[test]
    fn const_call() {
        let expected = quote! {
            ::core::arch::asm!(
                "la t6, 0f",
                "addi sp, sp, -4",
                "sw t6, 0(sp)",
                "li t6, {jt}",
                "lw t6, 0(t6)",
                "jr t6",
                "0:",
                jt = const JUMP_TABLE + 4,
                out("t6") _
            )
        };
        assert_eq!(
            call_tokens(quote! { JUMP_TABLE + 4, scratch = t6 }, 0).unwrap(),
            expected.to_string()
        );
    }

    #[test]
    fn calls_get_fresh_labels() {
        let first = next_label();
        let second = next_label();
        assert!(second.id() > first.id());

        let expand = |label: Label| {
            let tokens = call_tokens(quote! { 0xF0040000 }, label.id()).unwrap();
            assert!(tokens.contains(&format!("\"la a0, {}f\"", label.id())));
            assert!(tokens.contains(&format!("\"{}:\"", label.id())));
            tokens
        };
        assert_ne!(expand(first), expand(second));
    }

    #[test]
    fn invalid_call() {
        assert!(call_tokens(quote! { 42, scratch = t5 }, 0).is_err());
        assert!(call_tokens(quote! { 0x1_0000_0000 }, 0).is_err());
    }

    #[test]
    fn parameter_expansion() {
        let expected = quote! {
            ::core::arch::asm!("mv x11, {0}", in(reg) color, out("x11") _)
        };
        assert_eq!(
            parameter_tokens(quote! { 11, color }).unwrap(),
            expected.to_string()
        );
    }

    #[test]
    fn ret_expansion() {
        let expected = quote! {
            ::core::arch::asm!("mv {0}, x1", out(reg) result, out("x1") _)
        };
        assert_eq!(
            ret_tokens(quote! { 1, result }).unwrap(),
            expected.to_string()
        );
    }

    #[test]
    fn reserved_registers() {
        for index in [0, 2, 3, 4, 8, 9] {
            let index = proc_macro2::Literal::u8_unsuffixed(index);
            assert!(parameter_tokens(quote! { #index, value }).is_err());
            assert!(ret_tokens(quote! { #index, value }).is_err());
        }
        assert!(parameter_tokens(quote! { 32, value }).is_err());
        assert!(ret_tokens(quote! { 300, value }).is_err());
        assert!(parameter_tokens(quote! { 31, value }).is_ok());
    }
}
