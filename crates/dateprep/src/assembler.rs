//! Assembly of the feature matrix.

use std::collections::BTreeSet;
use std::fmt::{self, Display};

use polars::prelude::*;

use crate::config::Features;
use crate::features::date::{self, DATE};
use crate::features::{inner_join, join};
use crate::prelude::*;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Stage {
    Initialized,
    BaseLoaded,
    DateFeaturesAdded,
    TextFeaturesAdded(Vec<String>),
    Ready,
}

impl Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Initialized => write!(f, "initialized"),
            Self::BaseLoaded => write!(f, "base loaded"),
            Self::DateFeaturesAdded => write!(f, "date features added"),
            Self::TextFeaturesAdded(names) => {
                write!(f, "text features added ({})", names.join(", "))
            }
            Self::Ready => write!(f, "ready"),
        }
    }
}

/// Assembles the dataset stage by stage.
///
/// The assembler starts with the base set (every document of the
/// `date` collection with a distribution). Each stage joins further
/// features onto the current dataset and keeps only those documents
/// which have the features. A failed stage leaves the dataset
/// unchanged.
pub(crate) struct Assembler<'a, S: Store> {
    store: &'a S,
    features: Features,
    data: DataFrame,
    stage: Stage,
    joined: BTreeSet<String>,
}

impl<'a, S: Store> Assembler<'a, S> {
    /// Creates an assembler and loads the base set. The `extra`
    /// collections are those to be joined besides the configured ones.
    ///
    /// Fails, if the `date` collection or any of the configured or
    /// extra collections doesn't exist. All absent collections are
    /// reported at once, before any stage runs.
    pub(crate) fn new<N: AsRef<str>>(
        store: &'a S,
        features: Features,
        extra: &[N],
    ) -> DateprepResult<Self> {
        let mut assembler = Self {
            store,
            features,
            data: DataFrame::empty(),
            stage: Stage::Initialized,
            joined: BTreeSet::new(),
        };

        let required: Vec<&str> = std::iter::once(DATE)
            .chain(assembler.features.collections())
            .chain(extra.iter().map(AsRef::as_ref))
            .collect();
        store.require(required)?;

        let docs = store.find(DATE)?;
        assembler.data = date::base_frame(&docs)?;
        assembler.advance(Stage::BaseLoaded);

        Ok(assembler)
    }

    fn advance(&mut self, stage: Stage) {
        log::info!(
            "{stage}: {} rows, {} columns",
            self.data.height(),
            self.data.width()
        );

        self.stage = stage;
    }

    /// Returns the current dataset.
    #[inline]
    pub(crate) fn data(&self) -> &DataFrame {
        &self.data
    }

    #[inline]
    pub(crate) fn stage(&self) -> &Stage {
        &self.stage
    }

    /// Joins the flattened date distributions and the first-era
    /// labels.
    pub(crate) fn add_date_features(&mut self) -> DateprepResult<()> {
        if !self.joined.insert(DATE.into()) {
            bail!("date features have already been added");
        }

        let result = self
            .store
            .find(DATE)
            .and_then(|docs| Ok(date::date_features(&docs)?))
            .and_then(|df| Ok(inner_join(self.data.clone(), df)?));

        match result {
            Ok(data) => {
                self.data = data;
                self.advance(Stage::DateFeaturesAdded);
                Ok(())
            }
            Err(e) => {
                self.joined.remove(DATE);
                Err(e)
            }
        }
    }

    /// Joins the named feature collections in the given order.
    pub(crate) fn add_text_features<N: AsRef<str>>(
        &mut self,
        collections: &[N],
    ) -> DateprepResult<()> {
        let names: Vec<String> = collections
            .iter()
            .map(|name| name.as_ref().to_string())
            .collect();

        let mut seen = BTreeSet::new();
        for name in names.iter() {
            if self.joined.contains(name) || !seen.insert(name) {
                bail!("collection '{name}' has already been joined");
            }
        }

        self.data = join::join(self.data.clone(), self.store, &names)?;
        self.joined.extend(names.iter().cloned());
        self.advance(Stage::TextFeaturesAdded(names));

        Ok(())
    }

    /// Joins the configured normalized log-likelihood-ratio features.
    pub(crate) fn add_nllr_features(&mut self) -> DateprepResult<()> {
        let names = self.features.nllr.clone();
        self.add_text_features(&names)
    }

    /// Joins the configured KL-divergence features.
    pub(crate) fn add_kld_features(&mut self) -> DateprepResult<()> {
        let names = self.features.kld.clone();
        self.add_text_features(&names)
    }

    /// Finishes the assembly and returns the dataset.
    pub(crate) fn finish(mut self) -> DataFrame {
        self.advance(Stage::Ready);
        self.data
    }
}
