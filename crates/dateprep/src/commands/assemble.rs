use std::ffi::OsStr;
use std::fs::File;
use std::io::stdout;
use std::path::{Path, PathBuf};

use clap::Parser;
use polars::prelude::*;

use crate::assembler::Assembler;
use crate::cli::StoreArgs;
use crate::config::Features;
use crate::prelude::*;

/// Assemble the dataset of the text-dating classifier.
///
/// The dataset consists of all documents with a date distribution,
/// which are present in every joined feature collection. Unless a
/// stage is selected explicitly, the date, nllr and kld features are
/// joined.
#[derive(Debug, Default, Parser)]
pub(crate) struct Assemble {
    /// Run verbosely. Print the size of the dataset after each stage
    /// to the standard error stream. This option conflicts with the
    /// `--quiet` option.
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Operate quietly; do not print a summary. This option conflicts
    /// with the `--verbose` option.
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Join the date distribution and first-era features.
    #[arg(long)]
    date: bool,

    /// Join the configured nllr feature collections.
    #[arg(long)]
    nllr: bool,

    /// Join the configured kld feature collections.
    #[arg(long)]
    kld: bool,

    /// Join the feature collection `name`. This option can be given
    /// multiple times; the collections are joined in the given order
    /// after all other stages.
    #[arg(long = "with", value_name = "name")]
    with: Vec<String>,

    /// If set, the dataset will be written in CSV format to the
    /// standard output (stdout).
    #[arg(long, conflicts_with = "output")]
    stdout: bool,

    /// Write the dataset into `filename`. If the filename ends with
    /// `.csv`, the dataset is written in CSV format, otherwise in IPC
    /// format. By default (if `--stdout` isn't set), the dataset will
    /// be written to `dataset.ipc` into the root directory.
    #[arg(short, long, value_name = "filename")]
    output: Option<PathBuf>,
}

fn write_dataset(df: &mut DataFrame, path: &Path) -> DateprepResult<()> {
    match path.extension().and_then(OsStr::to_str) {
        Some("csv") => {
            let mut writer = CsvWriter::new(File::create(path)?);
            writer.finish(df)?;
        }
        _ => {
            let mut writer = IpcWriter::new(File::create(path)?)
                .with_compression(Some(IpcCompression::ZSTD));
            writer.finish(df)?;
        }
    }

    Ok(())
}

impl Assemble {
    pub(crate) fn execute(self, args: &StoreArgs) -> DateprepResult<()> {
        let project = Project::discover()?;
        let store = project.open_store_read_only(args)?;
        let features = project.config().features.clone();

        let mut df = self.assemble(&store, features)?;

        match self.output {
            Some(ref path) => write_dataset(&mut df, path)?,
            None if self.stdout => {
                let mut writer = CsvWriter::new(stdout().lock());
                writer.finish(&mut df)?;
            }
            None => write_dataset(
                &mut df,
                &project.base_dir().join(Project::DATASET),
            )?,
        }

        if !self.quiet && !self.stdout {
            eprintln!(
                "dataset: {} documents, {} columns.",
                df.height(),
                df.width()
            );
        }

        Ok(())
    }

    /// Whether no stage is selected explicitly.
    fn all_stages(&self) -> bool {
        !(self.date || self.nllr || self.kld || !self.with.is_empty())
    }

    fn assemble<S: Store>(
        &self,
        store: &S,
        features: Features,
    ) -> DateprepResult<DataFrame> {
        let all = self.all_stages();
        let mut assembler = Assembler::new(store, features, &self.with)?;
        self.report(&assembler);

        if all || self.date {
            assembler.add_date_features()?;
            self.report(&assembler);
        }

        if all || self.nllr {
            assembler.add_nllr_features()?;
            self.report(&assembler);
        }

        if all || self.kld {
            assembler.add_kld_features()?;
            self.report(&assembler);
        }

        if !self.with.is_empty() {
            assembler.add_text_features(&self.with)?;
            self.report(&assembler);
        }

        Ok(assembler.finish())
    }

    fn report<S: Store>(&self, assembler: &Assembler<'_, S>) {
        if self.verbose {
            let data = assembler.data();
            eprintln!(
                "{}: {} rows, {} columns",
                assembler.stage(),
                data.height(),
                data.width()
            );
        }
    }
}
