use std::collections::BTreeMap;

use polars::prelude::*;
use serde_json::Value;

use super::{SparseTable, inner_join};
use crate::prelude::*;

/// Returns the name of a feature after joining `collection`.
#[inline]
pub(crate) fn suffixed(feature: &str, collection: &str) -> String {
    format!("{feature}-{collection}")
}

/// Builds the frame of a feature collection. Every feature is renamed
/// to `<feature>-<collection>`; a feature missing for a document is
/// null. Booleans count as 0/1, other non-numeric values are skipped.
pub(crate) fn feature_frame(
    collection: &str,
    docs: &[Document],
) -> PolarsResult<DataFrame> {
    let mut table: SparseTable<f64> = SparseTable::default();

    for doc in docs {
        let mut row = BTreeMap::new();

        for (name, value) in doc.fields() {
            let value = match value {
                Value::Number(n) => n.as_f64(),
                Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
                _ => None,
            };

            match value {
                Some(value) => {
                    row.insert(suffixed(name, collection), value);
                }
                None => log::warn!(
                    "skip non-numeric feature '{name}' of '{collection}' \
                    (id = {})",
                    doc.id()
                ),
            }
        }

        table.push(doc.id(), row);
    }

    let mut columns = vec![table.id_column()];
    for name in table.names() {
        columns.push(Column::new(name.as_str().into(), table.values(name)));
    }

    DataFrame::new(columns)
}

/// Joins the named feature collections, in the given order, onto
/// `base`. Only the documents present in `base` and in every
/// collection are kept.
///
/// Fails, if a collection doesn't exist.
pub(crate) fn join<S, N>(
    base: DataFrame,
    store: &S,
    collections: &[N],
) -> DateprepResult<DataFrame>
where
    S: Store,
    N: AsRef<str>,
{
    let mut data = base;

    for collection in collections.iter().map(AsRef::as_ref) {
        if !store.has_collection(collection)? {
            return Err(DateprepError::UnknownCollection {
                database: store.database().into(),
                collection: collection.into(),
            });
        }

        let docs = store.find(collection)?;
        let features = feature_frame(collection, &docs)?;
        let width = features.width() - 1;

        data = inner_join(data, features)?;

        log::info!(
            "joined '{collection}' ({} documents, {width} features): \
            {} rows",
            docs.len(),
            data.height()
        );
    }

    Ok(data)
}
