use bpaf::{OptionParser, Parser, construct};
use jtcall::{CALL_HEADER, Convention};
use std::path::PathBuf;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Emit {
    /// The `call`, `parameter` and `ret` macro header
    CallHeader,
    /// The fox32 jump-table wrappers
    Bindings,
}

/// The options given by the user.
#[derive(Debug)]
pub struct Options {
    /// The register every call clobbers
    pub scratch: Convention,
    /// Which header to generate
    pub emit: Emit,
    /// The macro header included by the binding header
    pub include: String,
    /// Whether to verify every expanded call sequence before writing
    pub check: bool,
    /// Whether or not to run the logging in verbose mode
    pub verbose: bool,
    /// The file to output results to, stdout if absent
    pub output: Option<PathBuf>,
}

pub fn options() -> OptionParser<Options> {
    let scratch = scratch();
    let emit = emit();
    let include = include();
    let check = check();
    let verbose = verbose();
    let output = output();

    construct!(Options {
        scratch,
        emit,
        include,
        check,
        verbose,
        output,
    })
    .to_options()
    .descr("C header generator for jump-table calls")
    .version(VERSION)
    .usage("Usage: jtcall-gen [options]")
}

fn scratch() -> impl Parser<Convention> {
    bpaf::long("scratch")
        .short('s')
        .help("the scratch register clobbered by calls, either 'a0' or 't6'")
        .argument::<Convention>("REG")
        .fallback(Convention::A0)
}

fn emit() -> impl Parser<Emit> {
    bpaf::long("emit")
        .short('e')
        .help("the header to emit, either 'call-header' or 'bindings'")
        .argument::<String>("HEADER")
        .guard(
            |emit| emit == "call-header" || emit == "bindings",
            "header must be one of 'call-header', 'bindings'",
        )
        .map(|emit| match emit.as_str() {
            "call-header" => Emit::CallHeader,
            _ => Emit::Bindings,
        })
        .fallback(Emit::Bindings)
}

fn include() -> impl Parser<String> {
    bpaf::long("include")
        .help("the macro header the bindings include")
        .argument::<String>("NAME")
        .fallback(CALL_HEADER.to_string())
}

fn check() -> impl Parser<bool> {
    bpaf::long("check")
        .help("verify the shape and labels of every call before writing")
        .flag(true, false)
}

fn verbose() -> impl Parser<bool> {
    bpaf::long("verbose")
        .short('v')
        .help("enable verbose output")
        .flag(true, false)
}

fn output() -> impl Parser<Option<PathBuf>> {
    bpaf::long("output")
        .short('o')
        .help("the file to output to")
        .argument::<PathBuf>("FILE")
        .optional()
}
