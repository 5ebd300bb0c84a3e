//! minic - semantic checker for a small C-like language
//!
//! Usage: minic [OPTIONS] <input>

use anyhow::Context;
use clap::Parser as ClapParser;
use minic::sema::DEFAULT_MAX_DEPTH;
use minic::{CheckConfig, Driver, SemaConfig};
use std::io;
use std::path::PathBuf;
use std::process;

#[derive(ClapParser, Debug)]
#[command(name = "minic")]
#[command(version)]
#[command(about = "Semantic checker for a small C-like language", long_about = None)]
struct Args {
    /// Input source file (.mini)
    #[arg(required = true)]
    input: PathBuf,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Dump tokens (for debugging)
    #[arg(long)]
    dump_tokens: bool,

    /// Dump the type-annotated AST after analysis
    #[arg(long)]
    dump_ast: bool,

    /// Deepest statement/expression nesting analyzed
    #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
    max_depth: usize,

    /// Accept int values where float is expected
    #[arg(long)]
    widen_int_to_float: bool,
}

fn main() {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    if let Err(e) = run(&args) {
        eprintln!("error: {:#}", e);
        process::exit(1);
    }
}

fn run(args: &Args) -> anyhow::Result<()> {
    let config = CheckConfig {
        dump_tokens: args.dump_tokens,
        dump_ast: args.dump_ast,
        verbose: args.verbose,
        sema: SemaConfig {
            max_depth: args.max_depth,
            widen_int_to_float: args.widen_int_to_float,
        },
    };

    if args.verbose {
        eprintln!("Checking {}", args.input.display());
    }

    let mut driver = Driver::new(config);
    driver
        .check_file(&args.input, &mut io::stderr())
        .with_context(|| format!("{} failed to check", args.input.display()))?;

    if args.verbose {
        eprintln!("{}: no errors", args.input.display());
    }

    Ok(())
}
