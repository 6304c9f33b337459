//! `guppy`: a driver for the function-body compiler pipeline.
//!
//! The real surface parser is out of scope, so every subcommand reads a
//! pre-parsed function body from a JSON fixture (see [`fixture`]) rather
//! than a `.py` source file.

mod fixture;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use guppy_compiler::compile_options::CompileOptions;
use guppy_compiler::pipeline::compile_function_body;
use guppy_core::diagnostics::DiagnosticsPrinter;
use guppy_core::{Error, Globals};

use fixture::FunctionFixture;

#[derive(Parser)]
#[command(name = "guppy", about = "Function-body compiler pipeline driver", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Increase log verbosity (-v, -vv). Overridden by `GUPPY_LOG` if set.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// Type-check and linearity-check a function fixture; silent on success.
    Check {
        fixture: PathBuf,
    },
    /// Compile a function fixture all the way to dataflow IR and print it.
    EmitIr {
        fixture: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let (path, emit_ir) = match &cli.command {
        Command::Check { fixture } => (fixture, false),
        Command::EmitIr { fixture } => (fixture, true),
    };

    match run(path, emit_ir) {
        Ok(()) => ExitCode::SUCCESS,
        Err(msg) => {
            eprintln!("{msg}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: u8) {
    use tracing_subscriber::EnvFilter;

    let default_level = match verbose {
        0 => "warn",
        1 => "guppy_compiler=info,guppy_cli=info",
        _ => "guppy_compiler=debug,guppy_cli=debug",
    };
    let filter = EnvFilter::try_from_env("GUPPY_LOG").unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}

fn run(path: &PathBuf, emit_ir: bool) -> Result<(), String> {
    let text = std::fs::read_to_string(path).map_err(|e| format!("error: reading {}: {e}", path.display()))?;
    let fixture: FunctionFixture = serde_json::from_str(&text).map_err(|e| format!("error: parsing {}: {e}", path.display()))?;

    let globals = Globals::prelude();
    let lowered = fixture::lower_fixture(fixture, &globals).map_err(|e| format!("error: {e}"))?;

    let options = CompileOptions::default();
    let result = compile_function_body(&lowered.body, lowered.return_arity, lowered.params, &globals, &options);

    let (compiled, diags) = match result {
        Ok(pair) => pair,
        Err(Error::CompileFailed(diags)) => {
            eprint!("{}", DiagnosticsPrinter::new(&diags).format());
            return Err(format!("error: compilation failed with {} error(s)", diags.error_count()));
        }
        Err(e) => return Err(format!("error: {e}")),
    };

    if !diags.is_empty() {
        eprint!("{}", DiagnosticsPrinter::new(&diags).format());
    }

    if emit_ir {
        tracing::info!(blocks = compiled.regions.len(), "lowering complete");
        let mut ids: Vec<_> = compiled.regions.keys().copied().collect();
        ids.sort_by_key(|b| b.0);
        for bb in ids {
            println!("block {}:", bb.0);
            print!("{}", compiled.regions[&bb].dump());
            println!();
        }
    }

    Ok(())
}
