use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;

use clap::Parser;
use indicatif::ProgressIterator;
use serde_json::Value;

use crate::cli::StoreArgs;
use crate::prelude::*;

const PBAR_IMPORT: &str = "Reading documents: {human_pos} | \
        elapsed: {elapsed_precise}{msg}";

/// Import documents into a collection.
///
/// The documents are read in JSON Lines format; each line holds one
/// JSON object with an `_id` field. Documents, which already exist in
/// the collection, are replaced.
#[derive(Debug, Parser)]
pub(crate) struct Import {
    /// Run verbosely. Print additional progress information to the
    /// standard error stream. This option conflicts with the
    /// `--quiet` option.
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Operate quietly; do not show progress. This option conflicts
    /// with the `--verbose` option.
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// The name of the collection.
    collection: String,

    /// The path to the JSON Lines file.
    path: PathBuf,
}

fn read_documents<R: BufRead>(
    reader: R,
    quiet: bool,
) -> DateprepResult<Vec<Document>> {
    let pbar = ProgressBarBuilder::new(PBAR_IMPORT, quiet).build();
    let mut docs = vec![];

    for (idx, line) in reader.lines().enumerate().progress_with(pbar) {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let doc = serde_json::from_str::<Value>(&line)
            .map_err(DateprepError::from)
            .and_then(Document::try_from)
            .map_err(|e| {
                DateprepError::other(format!(
                    "invalid document on line {}: {e}",
                    idx + 1
                ))
            })?;

        docs.push(doc);
    }

    Ok(docs)
}

impl Import {
    pub(crate) fn execute(self, args: &StoreArgs) -> DateprepResult<()> {
        let project = Project::discover()?;
        let mut store = project.open_store(args)?;

        let reader = BufReader::new(File::open(&self.path)?);
        let docs = read_documents(reader, self.quiet)?;
        let count = store.upsert(&self.collection, &docs)?;

        if self.verbose {
            eprintln!(
                "imported {count} documents into '{}' ({} database).",
                self.collection,
                store.database()
            );
        }

        Ok(())
    }
}
