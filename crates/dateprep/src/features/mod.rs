//! Conversion of sparse, per-document features into data frames.
//!
//! The columns of a feature set are discovered from the documents: the
//! union of all feature names is collected first, the missing cells are
//! filled afterwards.

use std::collections::{BTreeMap, BTreeSet};

use polars::prelude::*;

use crate::document::ID;

pub(crate) mod date;
pub(crate) mod join;

/// Feature cells keyed by document and feature name.
#[derive(Debug)]
pub(crate) struct SparseTable<T> {
    ids: Vec<String>,
    rows: Vec<BTreeMap<String, T>>,
    names: BTreeSet<String>,
}

impl<T> Default for SparseTable<T> {
    fn default() -> Self {
        Self {
            ids: vec![],
            rows: vec![],
            names: BTreeSet::new(),
        }
    }
}

impl<T: Clone> SparseTable<T> {
    pub(crate) fn push<S: Into<String>>(
        &mut self,
        id: S,
        row: BTreeMap<String, T>,
    ) {
        self.names.extend(row.keys().cloned());
        self.ids.push(id.into());
        self.rows.push(row);
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.ids.len()
    }

    #[inline]
    pub(crate) fn names(&self) -> &BTreeSet<String> {
        &self.names
    }

    /// Returns the identifier column.
    pub(crate) fn id_column(&self) -> Column {
        Column::new(ID.into(), self.ids.clone())
    }

    /// Returns the values of a feature; missing cells are `None`.
    pub(crate) fn values(&self, name: &str) -> Vec<Option<T>> {
        self.rows.iter().map(|row| row.get(name).cloned()).collect()
    }

    /// Returns the values of a feature; missing cells are `default`.
    pub(crate) fn values_or(&self, name: &str, default: T) -> Vec<T> {
        self.rows
            .iter()
            .map(|row| row.get(name).cloned().unwrap_or(default.clone()))
            .collect()
    }
}

/// Inner join of two frames on the document identifier. The result is
/// ordered by identifier.
pub(crate) fn inner_join(
    left: DataFrame,
    right: DataFrame,
) -> PolarsResult<DataFrame> {
    left.lazy()
        .join(
            right.lazy(),
            [col(ID)],
            [col(ID)],
            JoinArgs::new(JoinType::Inner),
        )
        .sort([ID], SortMultipleOptions::default())
        .collect()
}
