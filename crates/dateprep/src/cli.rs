use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};

use crate::commands::*;

#[derive(Debug, Parser)]
#[command(version, about, long_about = None, max_term_width = 72)]
pub(crate) struct Args {
    #[command(flatten)]
    pub(crate) store: StoreArgs,

    #[command(subcommand)]
    pub(crate) cmd: Command,
}

/// Options to locate the document store. They take precedence over the
/// project config.
#[derive(Debug, Default, ClapArgs)]
pub(crate) struct StoreArgs {
    /// The path of the document store. If this option isn't set, the
    /// `store.path` of the project config (`dateprep.toml`) is used.
    #[arg(
        long,
        global = true,
        env = "DATEPREP_STORE",
        hide_env_values = true,
        value_name = "filename"
    )]
    pub(crate) store: Option<PathBuf>,

    /// The logical database, which holds the collections (default:
    /// `HTRC`).
    #[arg(
        long,
        global = true,
        env = "DATEPREP_DATABASE",
        hide_env_values = true,
        value_name = "name"
    )]
    pub(crate) database: Option<String>,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Command {
    Assemble(Assemble),
    Collections(Collections),
    Completions(Completions),
    Config(Config),
    Dv(Dv),
    Import(Import),
    Summary(Summary),
}
