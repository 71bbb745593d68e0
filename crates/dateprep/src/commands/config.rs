use std::path::PathBuf;

use clap::Parser;

use crate::config::{DvConfig, Features, StoreConfig};
use crate::error::{DateprepError, DateprepResult, bail};
use crate::project::Project;

/// Get and set project options.
///
/// Supported keys are `store.path`, `store.database`, `features.nllr`,
/// `features.kld` and `dv.language`. The feature keys take a
/// comma-separated list of collection names; an empty `dv.language`
/// selects the metadata records of all languages.
#[derive(Debug, Parser)]
pub(crate) struct Config {
    /// Get the value for the given key.
    #[arg(long, conflicts_with_all = ["value", "unset", "set"])]
    get: bool,

    /// Remove the key from the config.
    #[arg(long, conflicts_with_all = ["value", "get", "set"])]
    unset: bool,

    /// Set the value for the given key.
    #[arg(long, requires = "value", conflicts_with_all = ["get", "unset"])]
    set: bool,

    key: String,

    #[arg(conflicts_with_all = ["get", "unset"])]
    value: Option<String>,
}

#[inline]
fn split_names(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(String::from)
        .collect()
}

impl Config {
    pub(crate) fn execute(self) -> DateprepResult<()> {
        let mut project = Project::discover()?;
        let config = project.config_mut();
        let key = self.key.as_str();

        if let Some(value) = self.value {
            match key {
                "store.path" => config.store.path = PathBuf::from(value),
                "store.database" => config.store.database = value,
                "features.nllr" => config.features.nllr = split_names(&value),
                "features.kld" => config.features.kld = split_names(&value),
                "dv.language" => config.dv.language = value,
                _ => bail!("unknown or unsupported config option `{key}`"),
            }

            config.save()?;
        } else if self.get || (!self.unset && !self.set) {
            let value = match key {
                "store.path" => config.store.path.display().to_string(),
                "store.database" => config.store.database.clone(),
                "features.nllr" => config.features.nllr.join(","),
                "features.kld" => config.features.kld.join(","),
                "dv.language" => config.dv.language.clone(),
                _ => bail!("unknown or unsupported config option `{key}`"),
            };

            println!("{key} = {value}");
        } else if self.unset {
            let store = StoreConfig::default();
            let features = Features::default();
            let dv = DvConfig::default();
            match key {
                "store.path" => config.store.path = store.path,
                "store.database" => config.store.database = store.database,
                "features.nllr" => config.features.nllr = features.nllr,
                "features.kld" => config.features.kld = features.kld,
                "dv.language" => config.dv.language = dv.language,
                _ => bail!("unknown or unsupported config option `{key}`"),
            }

            config.save()?;
        } else {
            unreachable!()
        }

        Ok(())
    }
}
