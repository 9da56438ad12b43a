//! pyscope CLI - build a cscope database from Python source.
//!
//! Indexes the given files and directories (the current directory by default)
//! and writes `cscope.out` next to them.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use colored::Colorize;
use pyscope::IndexOptions;
use pyscope::config::DEFAULT_OUTPUT;
use tracing_subscriber::EnvFilter;

mod cli;

/// pyscope: generate a cscope database for Python source.
#[derive(Parser)]
#[command(name = "pyscope")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Recurse into subdirectories of directory inputs
    #[arg(short = 'R')]
    recurse: bool,

    /// Number of worker threads
    #[arg(short = 't', value_name = "N", default_value_t = 1,
          value_parser = clap::value_parser!(u16).range(1..))]
    workers: u16,

    /// Database file name, relative to the current directory
    #[arg(short = 'f', value_name = "FILE", default_value = DEFAULT_OUTPUT)]
    output: PathBuf,

    /// Read further inputs from FILE, one per line
    #[arg(short = 'i', value_name = "FILE")]
    source_list: Option<PathBuf>,

    /// Print each file's lowered syntax tree as JSON
    #[arg(short = 'D')]
    dump_tree: bool,

    /// Skip files that break a translation contract instead of failing
    #[arg(long)]
    keep_going: bool,

    /// Verbose output (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Files and directories to index (defaults to the current directory)
    inputs: Vec<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let base = match std::env::current_dir() {
        Ok(dir) => dir,
        Err(e) => {
            eprintln!(
                "{}: failed to get current directory: {e}",
                "error".red().bold()
            );
            return ExitCode::FAILURE;
        }
    };

    let mut options = IndexOptions::new(base);
    options.inputs = cli.inputs;
    options.recurse = cli.recurse;
    options.workers = usize::from(cli.workers);
    options.output = cli.output;
    options.source_list = cli.source_list;
    options.dump_tree = cli.dump_tree;
    options.keep_going = cli.keep_going;

    match cli::index::run(options) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}: {e}", "error".red().bold());
            // Show cause chain for nested errors
            let mut source = std::error::Error::source(&e);
            while let Some(cause) = source {
                eprintln!("  {}: {cause}", "caused by".dimmed());
                source = std::error::Error::source(cause);
            }
            ExitCode::FAILURE
        }
    }
}
