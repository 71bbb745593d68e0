use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::DateprepResult;

/// Project config (`dateprep.toml`).
#[derive(Debug, Default, Serialize, Deserialize)]
pub(crate) struct Config {
    /// The path of the config.
    #[serde(skip)]
    path: PathBuf,

    /// Location of the document store.
    #[serde(default)]
    pub(crate) store: StoreConfig,

    /// Names of the text feature collections.
    #[serde(default)]
    pub(crate) features: Features,

    /// Derivation of the dependent variable.
    #[serde(default)]
    pub(crate) dv: DvConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct StoreConfig {
    /// Path of the store file. Relative paths are resolved against the
    /// directory containing the config.
    pub(crate) path: PathBuf,

    /// The logical database, which holds the collections.
    pub(crate) database: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("htrc.db"),
            database: "HTRC".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct Features {
    /// Collections holding normalized log-likelihood-ratio features.
    #[serde(default)]
    pub(crate) nllr: Vec<String>,

    /// Collections holding KL-divergence features.
    #[serde(default)]
    pub(crate) kld: Vec<String>,
}

impl Default for Features {
    fn default() -> Self {
        Self {
            nllr: vec!["nllr_1".into(), "nllr_2".into(), "nllr_3".into()],
            kld: vec!["kld_1".into(), "kld_2".into(), "kld_3".into()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct DvConfig {
    /// Only metadata records in this language are used. An empty
    /// value selects all records.
    pub(crate) language: String,
}

impl Default for DvConfig {
    fn default() -> Self {
        Self {
            language: "eng".into(),
        }
    }
}

impl DvConfig {
    #[inline]
    pub(crate) fn language(&self) -> Option<&str> {
        if self.language.is_empty() {
            None
        } else {
            Some(self.language.as_str())
        }
    }
}

impl Features {
    /// Returns all feature collections, nllr first.
    pub(crate) fn collections(&self) -> impl Iterator<Item = &str> {
        self.nllr.iter().chain(self.kld.iter()).map(String::as_str)
    }
}

impl Config {
    /// Creates a new default config and sets the file location.
    pub(crate) fn create<P>(path: P) -> Self
    where
        P: AsRef<Path>,
    {
        Self {
            path: path.as_ref().into(),
            ..Default::default()
        }
    }

    /// Loads an existing config from a path.
    pub(crate) fn from_path<P>(path: P) -> DateprepResult<Self>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref().into();
        let content = fs::read_to_string(&path)?;
        let mut config: Self = toml::from_str(&content)?;
        config.path = path;

        Ok(config)
    }

    /// Saves the config.
    pub(crate) fn save(&self) -> DateprepResult<()> {
        let content = toml::to_string(self)?;
        let mut out = File::create(&self.path)?;
        out.write_all(content.as_bytes())?;
        Ok(())
    }
}
