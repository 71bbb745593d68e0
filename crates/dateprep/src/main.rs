use std::io::ErrorKind;
use std::process;

use clap::Parser;
use cli::{Args, Command};
use error::{DateprepError, DateprepResult};
use jemallocator::Jemalloc;
use polars::error::PolarsError;

mod assembler;
mod cli;
mod commands;
mod config;
mod document;
mod dv;
mod error;
mod features;
mod metadata;
mod prelude;
mod progress;
mod project;
mod store;

#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

fn run(args: Args) -> DateprepResult<()> {
    let store = args.store;

    match args.cmd {
        Command::Assemble(cmd) => cmd.execute(&store),
        Command::Collections(cmd) => cmd.execute(&store),
        Command::Completions(cmd) => cmd.execute(),
        Command::Config(cmd) => cmd.execute(),
        Command::Dv(cmd) => cmd.execute(&store),
        Command::Import(cmd) => cmd.execute(&store),
        Command::Summary(cmd) => cmd.execute(&store),
    }
}

fn main() {
    let env = env_logger::Env::default().default_filter_or("warn");
    env_logger::Builder::from_env(env).init();

    let args = Args::parse();

    match run(args) {
        Ok(()) => process::exit(0),
        Err(DateprepError::IO(e)) if e.kind() == ErrorKind::BrokenPipe => {
            process::exit(0)
        }
        Err(DateprepError::Polars(PolarsError::IO { error, .. }))
            if error.kind() == ErrorKind::BrokenPipe =>
        {
            process::exit(0);
        }
        Err(e) => {
            eprintln!("error: {e:#}");
            process::exit(1);
        }
    }
}
