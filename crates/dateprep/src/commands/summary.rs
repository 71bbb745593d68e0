use clap::Parser;

use crate::cli::StoreArgs;
use crate::dv::{DV, Diagnostics};
use crate::prelude::*;

/// Print the counts of empty, missing, erroneous and valid dates of
/// the derived dependent variable.
#[derive(Debug, Default, Parser)]
pub(crate) struct Summary {}

fn summarize<S: Store>(store: &S) -> DateprepResult<Diagnostics> {
    if !store.has_collection(DV)? {
        return Err(DateprepError::UnknownCollection {
            database: store.database().into(),
            collection: DV.into(),
        });
    }

    Diagnostics::from_store(store)
}

impl Summary {
    pub(crate) fn execute(self, args: &StoreArgs) -> DateprepResult<()> {
        let project = Project::discover()?;
        let store = project.open_store_read_only(args)?;

        println!("{}", summarize(&store)?);
        Ok(())
    }
}
