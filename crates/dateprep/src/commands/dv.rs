use std::ffi::OsStr;
use std::path::PathBuf;

use clap::Parser;

use crate::cli::StoreArgs;
use crate::dv::{self, DV, Diagnostics, METADATA};
use crate::metadata;
use crate::prelude::*;

/// Derive the dependent variable (publication year) from an XML
/// metadata file.
///
/// The metadata is ingested into the `metadata` collection, unless it
/// already exists. The normalized dates are written into the `dv`
/// collection, unless it's already complete. Only metadata records in
/// the configured language (`dv.language`, default: `eng`) are used.
#[derive(Debug, Default, Parser)]
pub(crate) struct Dv {
    /// Use only metadata records in the language `code` instead of
    /// the configured one.
    #[arg(long, value_name = "code", conflicts_with = "all_languages")]
    language: Option<String>,

    /// Use the metadata records of all languages.
    #[arg(long)]
    all_languages: bool,

    /// The path to the XML metadata file.
    path: PathBuf,
}

/// The steps taken to derive the dependent variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Plan {
    Skip,
    Derive,
    IngestAndDerive,
}

impl Dv {
    pub(crate) fn execute(self, args: &StoreArgs) -> DateprepResult<()> {
        self.check_path()?;

        let project = Project::discover()?;
        let language = if self.all_languages {
            None
        } else {
            self.language
                .as_deref()
                .or_else(|| project.config().dv.language())
        };

        let mut store = project.open_store(args)?;
        let diagnostics = self.run(&mut store, language, false)?;

        println!("{diagnostics}");
        Ok(())
    }

    fn check_path(&self) -> DateprepResult<()> {
        if self.path.extension().and_then(OsStr::to_str) != Some("xml") {
            bail!(
                "invalid XML metadata filename '{}'",
                self.path.display()
            );
        }

        Ok(())
    }

    fn plan<S: Store>(
        store: &S,
        language: Option<&str>,
    ) -> DateprepResult<Plan> {
        Ok(if dv::is_derived(store, language)? {
            Plan::Skip
        } else if store.has_collection(METADATA)? {
            Plan::Derive
        } else {
            Plan::IngestAndDerive
        })
    }

    fn run<S: Store>(
        &self,
        store: &mut S,
        language: Option<&str>,
        quiet: bool,
    ) -> DateprepResult<Diagnostics> {
        let database = store.database().to_string();

        match Self::plan(store, language)? {
            Plan::Skip => {
                println!(
                    "Collection '{DV}' already exists in '{database}' \
                    database."
                );
            }
            Plan::Derive => {
                println!(
                    "Collection '{METADATA}' already exists in \
                    '{database}' database. Start generating '{DV}' \
                    using existing '{METADATA}' collection."
                );

                self.derive(store, language, quiet)?;
            }
            Plan::IngestAndDerive => {
                let records = metadata::read_file(&self.path)?;
                let count = store.upsert(METADATA, &records)?;
                println!(
                    "Collection '{METADATA}' ({count} records) is \
                    successfully inserted into '{database}' database."
                );

                self.derive(store, language, quiet)?;
            }
        }

        Diagnostics::from_store(store)
    }

    fn derive<S: Store>(
        &self,
        store: &mut S,
        language: Option<&str>,
        quiet: bool,
    ) -> DateprepResult<()> {
        let count = dv::derive(store, language, quiet)?;
        println!(
            "Collection '{DV}' ({count} records) is successfully \
            inserted into '{}' database.",
            store.database()
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::store::{MemoryStore, SqliteStore};

    type TestResult = anyhow::Result<()>;

    const METADATA_XML: &str = r#"<?xml version="1.0"?>
<collection>
  <record><id>a</id><date>c.1920 [maybe]</date></record>
  <record><id>b</id><date>unknown</date></record>
  <record><id>c</id><title>Untitled</title></record>
  <record><id>d</id><date></date></record>
  <record><id>e</id><date>[1887]</date></record>
</collection>
"#;

    #[test]
    fn dv_check_path() {
        let dv = Dv {
            path: "metadata.xml".into(),
            ..Default::default()
        };
        assert!(dv.check_path().is_ok());

        let dv = Dv {
            path: "metadata.json".into(),
            ..Default::default()
        };
        assert!(dv.check_path().is_err());

        let dv = Dv {
            path: "xml".into(),
            ..Default::default()
        };
        assert!(dv.check_path().is_err());
    }

    #[test]
    fn dv_ingest_and_derive() -> TestResult {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("metadata.xml");
        fs::write(&path, METADATA_XML)?;

        let mut store = SqliteStore::open(dir.path().join("s.db"), "HTRC")?;
        let dv = Dv {
            path,
            ..Default::default()
        };

        assert_eq!(Dv::plan(&store, None)?, Plan::IngestAndDerive);
        let diagnostics = dv.run(&mut store, None, true)?;

        assert_eq!(store.count(METADATA)?, 5);
        assert_eq!(store.count(DV)?, 5);
        assert_eq!(
            diagnostics,
            Diagnostics {
                empty: 0,
                missing: 1,
                erroneous: 2,
                valid: 2,
            }
        );

        assert_eq!(Dv::plan(&store, None)?, Plan::Skip);
        assert_eq!(dv.run(&mut store, None, true)?, diagnostics);

        Ok(())
    }

    #[test]
    fn dv_selects_language() -> TestResult {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("metadata.xml");
        fs::write(
            &path,
            r#"<collection>
  <record id="a"><date>1850</date><language>eng</language></record>
  <record id="b"><date>1851</date><language>ger</language></record>
  <record id="c"><date>s.a.</date><language>eng</language></record>
</collection>"#,
        )?;

        let mut store = MemoryStore::new("HTRC");
        let dv = Dv {
            path,
            ..Default::default()
        };

        let diagnostics = dv.run(&mut store, Some("eng"), true)?;
        assert_eq!(store.count(METADATA)?, 3);
        assert_eq!(store.count(DV)?, 2);
        assert_eq!(diagnostics.valid, 1);
        assert_eq!(diagnostics.erroneous, 1);

        let ids: Vec<_> = store
            .find(DV)?
            .iter()
            .map(|doc| doc.id().to_string())
            .collect();
        assert_eq!(ids, ["a", "c"]);
        assert_eq!(Dv::plan(&store, Some("eng"))?, Plan::Skip);

        Ok(())
    }

    #[test]
    fn dv_derive_existing_metadata() -> TestResult {
        let mut store = MemoryStore::new("HTRC").with(
            METADATA,
            vec![
                Document::new("a").with("date", "1850"),
                Document::new("b").with("date", ""),
            ],
        );

        let dv = Dv {
            path: "missing.xml".into(),
            ..Default::default()
        };

        assert_eq!(Dv::plan(&store, None)?, Plan::Derive);
        let diagnostics = dv.run(&mut store, None, true)?;
        assert_eq!(diagnostics.valid, 1);
        assert_eq!(diagnostics.erroneous, 1);

        Ok(())
    }

    #[test]
    fn dv_resumes_incomplete_derivation() -> TestResult {
        let mut store = MemoryStore::new("HTRC")
            .with(
                METADATA,
                vec![
                    Document::new("a").with("date", "1850"),
                    Document::new("b").with("date", "1851"),
                ],
            )
            .with(DV, vec![Document::new("a").with("date", "1850")]);

        assert_eq!(Dv::plan(&store, None)?, Plan::Derive);

        let dv = Dv {
            path: "missing.xml".into(),
            ..Default::default()
        };
        let diagnostics = dv.run(&mut store, None, true)?;
        assert_eq!(diagnostics.valid, 2);
        assert_eq!(Dv::plan(&store, None)?, Plan::Skip);

        Ok(())
    }

    #[test]
    fn dv_missing_metadata_file() {
        let mut store = MemoryStore::new("HTRC");
        let dv = Dv {
            path: "/nonexistent/metadata.xml".into(),
            ..Default::default()
        };

        assert!(dv.run(&mut store, None, true).is_err());
        assert!(store.collection_names().unwrap().is_empty());
    }
}
