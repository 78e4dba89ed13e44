// ABOUTME: Command-line driver: evaluate a source file or compile it to Rust

use std::error::Error;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;
use log::{error, info, Level};

use rustle::compile::compile_source;
use rustle::interp::eval_program;

/// Interpreter and compiler for a small Scheme-flavored dialect.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Source file to evaluate or compile
    #[arg(short, long)]
    file: PathBuf,

    /// Print the final value to stdout
    #[arg(short = 'e', long = "show-result")]
    show_result: bool,

    /// Compile to Rust source at this path instead of evaluating
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let args = Cli::parse();
    let level = match args.verbose {
        0 => Level::Warn,
        1 => Level::Info,
        2 => Level::Debug,
        _ => Level::Trace,
    };
    simple_logger::init_with_level(level).unwrap();

    let file = args.file.display().to_string();
    let source = match fs::read_to_string(&args.file) {
        Ok(source) => source,
        Err(err) => {
            error!("failed to read {file}: {err}");
            process::exit(1);
        }
    };

    let result = match &args.output {
        Some(output) => compile(&file, &source, output),
        None => run(&file, &source, args.show_result),
    };
    if let Err(err) = result {
        eprintln!("{err}");
        process::exit(1);
    }
}

fn run(file: &str, source: &str, show_result: bool) -> Result<(), Box<dyn Error>> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let value = eval_program(file, source, &mut out)?;
    if show_result {
        writeln!(out, "{value}")?;
    }
    Ok(())
}

fn compile(file: &str, source: &str, output: &Path) -> Result<(), Box<dyn Error>> {
    let code = compile_source(file, source)?;
    fs::write(output, code)?;
    info!("wrote {}", output.display());
    Ok(())
}
