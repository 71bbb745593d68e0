use std::path::{Path, PathBuf};
use std::{env, fs};

use crate::cli::StoreArgs;
use crate::config::Config;
use crate::error::DateprepResult;
use crate::store::SqliteStore;

pub(crate) struct Project {
    /// The root directory of the project.
    root_dir: PathBuf,

    config: Config,
}

impl Project {
    pub(crate) const CONFIG: &'static str = "dateprep.toml";
    pub(crate) const DATASET: &'static str = "dataset.ipc";

    /// Discovers the root of the project.
    ///
    /// The root is the first directory, starting from the current
    /// directory and going upwards, which contains a [Config]. If there
    /// is none, the current directory is used with a default config.
    pub(crate) fn discover() -> DateprepResult<Self> {
        let current_dir = env::current_dir()?;
        Self::discover_from(current_dir)
    }

    fn discover_from(start: PathBuf) -> DateprepResult<Self> {
        let mut root_dir = start.clone();

        loop {
            if let Ok(metadata) = fs::metadata(root_dir.join(Self::CONFIG))
            {
                if metadata.is_file() {
                    let config =
                        Config::from_path(root_dir.join(Self::CONFIG))?;
                    return Ok(Self { root_dir, config });
                }
            }

            if !root_dir.pop() {
                let config = Config::create(start.join(Self::CONFIG));
                return Ok(Self {
                    root_dir: start,
                    config,
                });
            }
        }
    }

    /// Returns the config associated with the project.
    #[inline]
    pub(crate) fn config(&self) -> &Config {
        &self.config
    }

    #[inline]
    pub(crate) fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    /// Returns the base directory of the project.
    #[inline]
    pub(crate) fn base_dir(&self) -> &PathBuf {
        &self.root_dir
    }

    /// Returns the location of the store, giving precedence to the
    /// command line over the config.
    pub(crate) fn store_path(&self, args: &StoreArgs) -> PathBuf {
        let path: &Path = match args.store {
            Some(ref path) => path.as_path(),
            None => self.config.store.path.as_path(),
        };

        if path.is_absolute() || args.store.is_some() {
            path.into()
        } else {
            self.root_dir.join(path)
        }
    }

    pub(crate) fn database(&self, args: &StoreArgs) -> String {
        args.database
            .clone()
            .unwrap_or_else(|| self.config.store.database.clone())
    }

    /// Opens the store for reading and writing; a missing store file
    /// is created.
    pub(crate) fn open_store(
        &self,
        args: &StoreArgs,
    ) -> DateprepResult<SqliteStore> {
        SqliteStore::open(self.store_path(args), self.database(args))
    }

    /// Opens an existing store for reading.
    pub(crate) fn open_store_read_only(
        &self,
        args: &StoreArgs,
    ) -> DateprepResult<SqliteStore> {
        SqliteStore::open_read_only(
            self.store_path(args),
            self.database(args),
        )
    }
}
