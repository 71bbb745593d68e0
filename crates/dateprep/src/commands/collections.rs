use clap::Parser;
use comfy_table::{Row, Table, presets};

use crate::cli::StoreArgs;
use crate::prelude::*;

/// List the collections of the store.
#[derive(Debug, Default, Parser)]
pub(crate) struct Collections {}

fn collections_table<S: Store>(store: &S) -> DateprepResult<Table> {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_header(Row::from(vec!["collection", "docs"]));

    for name in store.collection_names()? {
        let count = store.count(&name)?;
        table.add_row(vec![name, count.to_string()]);
    }

    Ok(table)
}

impl Collections {
    pub(crate) fn execute(self, args: &StoreArgs) -> DateprepResult<()> {
        let project = Project::discover()?;
        let store = project.open_store_read_only(args)?;

        eprintln!(
            "store '{}', database '{}'.\n",
            store.location().display(),
            store.database()
        );

        println!("{}", collections_table(&store)?);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    type TestResult = anyhow::Result<()>;

    #[test]
    fn collections_table_counts() -> TestResult {
        let store = MemoryStore::new("HTRC")
            .with("nllr_1", vec![Document::new("a"), Document::new("b")])
            .with("date", vec![Document::new("a")]);

        let table = collections_table(&store)?;
        assert_eq!(table.row_iter().count(), 2);

        let output = table.to_string();
        assert!(output.find("date").unwrap() < output.find("nllr_1").unwrap());

        Ok(())
    }
}
