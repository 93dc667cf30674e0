//! Procedural Macro Parser

use syn::{
    Expr, Ident, LitInt, Token,
    parse::{Parse, ParseStream, Result},
};

// ———————————————————————— Macro Syntax Definition ————————————————————————— //

/// `call!(jt_addr)` or `call!(jt_addr, scratch = t6)`
pub struct CallInput {
    pub jt_addr: Expr,
    pub scratch: Option<Ident>,
}

/// `parameter!(i, p)` and `ret!(i, var)`
pub struct RegisterInput {
    pub index: LitInt,
    pub expr: Expr,
}

// —————————————————————————————— Macro Parser —————————————————————————————— //

impl Parse for CallInput {
    fn parse(input: ParseStream) -> Result<Self> {
        let jt_addr = input.parse::<Expr>()?;
        let mut scratch = None;

        if input.peek(Token![,]) {
            input.parse::<Token![,]>()?;
            if !input.is_empty() {
                let key = input.parse::<Ident>()?;
                if key != "scratch" {
                    return Err(syn::Error::new(
                        key.span(),
                        format!("Unknown argument '{key}', expected 'scratch'"),
                    ));
                }
                input.parse::<Token![=]>()?;
                scratch = Some(input.parse::<Ident>()?);
                parse_trailing_comma(input)?;
            }
        }

        if !input.is_empty() {
            return Err(input.error("Unexpected tokens after the call arguments"));
        }
        Ok(CallInput { jt_addr, scratch })
    }
}

impl Parse for RegisterInput {
    fn parse(input: ParseStream) -> Result<Self> {
        let index = input.parse::<LitInt>()?;
        input.parse::<Token![,]>()?;
        let expr = input.parse::<Expr>()?;
        parse_trailing_comma(input)?;

        if !input.is_empty() {
            return Err(input.error("Expected a register index and an expression"));
        }
        Ok(RegisterInput { index, expr })
    }
}

fn parse_trailing_comma(input: ParseStream) -> Result<()> {
    if input.peek(Token![,]) {
        input.parse::<Token![,]>()?;
    }
    Ok(())
}

// ————————————————————————————————— Tests —————————————————————————————————— //
