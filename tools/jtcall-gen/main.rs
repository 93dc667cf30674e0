mod options;

use anyhow::{Context, Result, bail};
use jtcall::{CallHeader, Convention, Gcc, Header, check_call, fox32};
use log::{LevelFilter, Metadata, Record};
use options::{Emit, Options};
use std::collections::HashSet;
use std::fs;
use std::io::{self, Write};

// ———————————————————————————————— Logging ————————————————————————————————— //

struct StderrLogger;

static LOGGER: StderrLogger = StderrLogger;

impl log::Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            eprintln!("[{}] {}", record.level(), record.args());
        }
    }

    fn flush(&self) {}
}

fn init_logging(verbose: bool) {
    // Only fails if a logger is already installed
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(if verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Warn
        });
    }
}

// ————————————————————————————————— Driver ————————————————————————————————— //

fn main() -> Result<()> {
    let options = options::options().run();
    init_logging(options.verbose);

    let text = generate(&options)?;
    if let Some(path) = &options.output {
        fs::write(path, text).with_context(|| format!("Failed to write '{}'", path.display()))?;
    } else {
        io::stdout().write_all(text.as_bytes()).context("Failed to write to stdout")?;
    }
    Ok(())
}

fn generate(options: &Options) -> Result<String> {
    log::info!("Generating {:?} with scratch {}", options.emit, options.scratch);
    match options.emit {
        Emit::CallHeader => Ok(CallHeader::new(options.scratch).to_string()),
        Emit::Bindings => {
            let mut header = fox32::bindings()?;
            header.set_include(options.include.clone());
            if options.check {
                check_header(&header, options.scratch)?;
            }
            Ok(header.to_string())
        }
    }
}

/// Expands every wrapper and verifies each call sequence and the uniqueness of return labels.
fn check_header(header: &Header, convention: Convention) -> Result<()> {
    let mut labels = HashSet::new();
    let mut calls = 0;

    for (name, blocks) in header.expand(convention)? {
        for block in blocks.iter().filter(|block| block.labels().next().is_some()) {
            let shape = check_call(&block.template::<Gcc>(), convention.scratch())
                .with_context(|| format!("Malformed call in '{name}'"))?;
            if !labels.insert(shape.return_label.clone()) {
                bail!("Return label '{}' is defined twice", shape.return_label);
            }
            calls += 1;
        }
    }

    log::info!("Checked {calls} calls");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(emit: Emit, scratch: Convention) -> Options {
        Options {
            scratch,
            emit,
            include: "call_t6.h".to_string(),
            check: true,
            verbose: false,
            output: None,
        }
    }

    #[test]
    fn call_headers() {
        let text = generate(&options(Emit::CallHeader, Convention::T6)).unwrap();
        assert!(text.contains("::: \"t6\""));
        assert!(!text.contains("a0"));
    }

    #[test]
    fn checked_bindings() {
        for convention in Convention::ALL {
            let text = generate(&options(Emit::Bindings, convention)).unwrap();
            assert!(text.contains("#include \"call_t6.h\""));
        }
        let header = fox32::bindings().unwrap();
        check_header(&header, Convention::A0).unwrap();
    }
}
